//! Normalized record of one attempted on-chain action.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Serialize, Serializer};

use crate::blockchain::types::Confirmation;

/// Networks that have no public block explorer.
const LOCAL_NETWORKS: [&str; 2] = ["localhost", "hardhat"];

/// Fallback reason when a transaction was accepted but never confirmed.
pub const NOT_CONFIRMED_REASON: &str = "transaction was not confirmed";

/// Explorer link for a confirmed transaction, or `""` on local networks.
pub fn explorer_url(network: &str, confirmation: Option<&Confirmation>) -> String {
    match confirmation {
        Some(confirmation) if !LOCAL_NETWORKS.contains(&network) => format!(
            "https://{}.etherscan.io/tx/{}",
            network, confirmation.tx_hash
        ),
        _ => String::new(),
    }
}

/// Which executor produced a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    #[serde(rename = "mint")]
    Mint,
    #[serde(rename = "delegate")]
    Delegate,
    #[serde(rename = "newBallot")]
    NewBallot,
    #[serde(rename = "setTargetBlockNumber")]
    SetTargetBlock,
    #[serde(rename = "vote")]
    Vote,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Mint => "mint",
            Action::Delegate => "delegate",
            Action::NewBallot => "newBallot",
            Action::SetTargetBlock => "setTargetBlockNumber",
            Action::Vote => "vote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Failed => "FAILED",
        }
    }
}

fn decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Proposal a vote was cast for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalRef {
    pub name: String,
    pub index: u64,
}

/// Action-specific parameters recorded in a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionParams {
    Mint {
        account: Address,
        #[serde(serialize_with = "decimal")]
        amount: U256,
    },
    Delegate {
        account: Address,
    },
    NewBallot {
        name: String,
        proposals: Vec<String>,
    },
    SetTargetBlock {
        name: String,
        #[serde(rename = "blockNumber")]
        block_number: u64,
    },
    Vote {
        name: String,
        #[serde(serialize_with = "decimal")]
        amount: U256,
        #[serde(skip_serializing_if = "Option::is_none")]
        proposal: Option<ProposalRef>,
    },
}

/// Outcome of an action. SUCCESS always carries transaction evidence and
/// FAILED always carries a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum Outcome {
    #[serde(rename = "SUCCESS")]
    Success {
        hash: TxHash,
        #[serde(rename = "blockNumber")]
        block_number: u64,
        #[serde(rename = "explorerURL")]
        explorer_url: String,
    },
    #[serde(rename = "FAILED")]
    Failed { reason: String },
}

/// Record of one attempted on-chain action. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    #[serde(rename = "name")]
    pub action: Action,
    pub from: Address,
    pub to: Address,
    pub params: ActionParams,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Receipt {
    pub fn succeeded(
        action: Action,
        from: Address,
        to: Address,
        params: ActionParams,
        network: &str,
        confirmation: Confirmation,
    ) -> Self {
        Self {
            action,
            from,
            to,
            params,
            outcome: Outcome::Success {
                hash: confirmation.tx_hash,
                block_number: confirmation.block_number,
                explorer_url: explorer_url(network, Some(&confirmation)),
            },
        }
    }

    pub fn failed(
        action: Action,
        from: Address,
        to: Address,
        params: ActionParams,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action,
            from,
            to,
            params,
            outcome: Outcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn status(&self) -> Status {
        match self.outcome {
            Outcome::Success { .. } => Status::Success,
            Outcome::Failed { .. } => Status::Failed,
        }
    }

    pub fn hash(&self) -> Option<TxHash> {
        match self.outcome {
            Outcome::Success { hash, .. } => Some(hash),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { .. } => None,
            Outcome::Failed { reason } => Some(reason),
        }
    }
}

/// Winning proposal summary, using `"none"`/`"-1"`/`"0"` when there is no winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinnerSummary {
    pub name: String,
    pub index: String,
    #[serde(rename = "totalVote")]
    pub total_vote: String,
}

impl WinnerSummary {
    pub fn none() -> Self {
        Self {
            name: "none".to_string(),
            index: "-1".to_string(),
            total_vote: "0".to_string(),
        }
    }

    pub fn proposal(name: String, index: u64, total_vote: U256) -> Self {
        Self {
            name,
            index: index.to_string(),
            total_vote: total_vote.to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.index == "-1"
    }
}

impl Default for WinnerSummary {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn confirmation() -> Confirmation {
        Confirmation {
            tx_hash: TxHash::repeat_byte(0xaa),
            block_number: 7,
        }
    }

    #[test]
    fn test_explorer_url_local_networks() {
        assert_eq!(explorer_url("localhost", Some(&confirmation())), "");
        assert_eq!(explorer_url("hardhat", Some(&confirmation())), "");
        assert_eq!(explorer_url("hardhat", None), "");
    }

    #[test]
    fn test_explorer_url_public_network() {
        let url = explorer_url("sepolia", Some(&confirmation()));
        assert!(url.starts_with("https://sepolia.etherscan.io/tx/"));
        assert!(url.ends_with(&confirmation().tx_hash.to_string()));
        assert_eq!(explorer_url("sepolia", None), "");
    }

    #[test]
    fn test_success_receipt_json() {
        let receipt = Receipt::succeeded(
            Action::Mint,
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            ActionParams::Mint {
                account: Address::repeat_byte(1),
                amount: U256::from(10).pow(U256::from(18)),
            },
            "sepolia",
            confirmation(),
        );

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["name"], "mint");
        assert_eq!(value["status"], "SUCCESS");
        assert_eq!(value["blockNumber"], 7);
        assert_eq!(value["params"]["amount"], "1000000000000000000");
        assert!(value["explorerURL"].as_str().unwrap().contains("sepolia"));
        assert!(value.get("reason").is_none());
        assert_eq!(receipt.status(), Status::Success);
        assert!(receipt.hash().is_some());
    }

    #[test]
    fn test_failed_receipt_json() {
        let receipt = Receipt::failed(
            Action::Vote,
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            ActionParams::Vote {
                name: "ANIMAL".to_string(),
                amount: U256::from(5),
                proposal: Some(ProposalRef {
                    name: "CAT".to_string(),
                    index: 0,
                }),
            },
            "Ballot: trying to vote more than allowed",
        );

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["params"]["proposal"], json!({ "name": "CAT", "index": 0 }));
        assert!(value.get("hash").is_none());
        assert_eq!(receipt.status(), Status::Failed);
        assert!(receipt.hash().is_none());
        assert_eq!(receipt.reason(), Some("Ballot: trying to vote more than allowed"));
    }

    #[test]
    fn test_winner_sentinel() {
        let winner = WinnerSummary::none();
        assert!(winner.is_none());
        assert_eq!(
            serde_json::to_value(&winner).unwrap(),
            json!({ "name": "none", "index": "-1", "totalVote": "0" })
        );
    }
}
