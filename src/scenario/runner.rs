//! End-to-end demonstration scenario.
//!
//! # Sequence
//! ```text
//! deploy Token → deploy Ballot(token)
//!     → mint to the first three identities
//!     → each delegates to itself; identity 2 then delegates to identity 3
//!     → identity 1 creates the ANIMAL ballot (CAT, FISH, DOG)
//!     → identity 1 spreads random amounts over all proposals
//!     → identity 3 splits its power evenly
//!     → identity 2 over-votes and is rejected
//!     → winner query → ScenarioRecord
//! ```

use alloy::primitives::{Address, U256};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::actions::{
    DelegateArgs, MintArgs, NewBallotArgs, Receipt, Session, VoteArgs, WinnerSummary,
};
use crate::blockchain::{Ledger, LedgerError};
use crate::contracts::{BALLOT_CONTRACT, TOKEN_CONTRACT};
use crate::deploy::{DeployError, Deployer};
use crate::scenario::record::ScenarioRecord;

/// Ballot group name.
pub const GROUP_ID: &str = "ANIMAL";

/// Proposal names, in index order.
pub const PROPOSALS: [&str; 3] = ["CAT", "FISH", "DOG"];

/// Tokens minted to each identity (1 token with 18 decimals).
pub const MINT_VALUE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Identities taking part in the scenario.
const MAX_ACCOUNTS: usize = 3;

/// Vote budget in per-mille of voting power, and the largest single draw.
const BUDGET_PER_MILLE: u64 = 1000;
const MAX_DRAW_PER_MILLE: u64 = 500;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize records: {0}")]
    Serialize(serde_json::Error),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Split `voting_power` into `parts` random amounts whose sum never exceeds it.
pub fn split_budget<R: Rng>(rng: &mut R, voting_power: U256, parts: usize) -> Vec<U256> {
    let mut remaining = BUDGET_PER_MILLE;
    (0..parts)
        .map(|_| {
            let draw = rng.gen_range(0..=remaining.min(MAX_DRAW_PER_MILLE));
            remaining -= draw;
            U256::from(draw) * voting_power / U256::from(BUDGET_PER_MILLE)
        })
        .collect()
}

/// Runs the fixed demonstration against one ledger.
pub struct ScenarioRunner<'a, L, R = StdRng> {
    session: Session<'a, L>,
    deployer: Deployer<'a, L>,
    rng: R,
}

impl<'a, L: Ledger> ScenarioRunner<'a, L, StdRng> {
    pub fn new(session: Session<'a, L>, deployer: Deployer<'a, L>) -> Self {
        Self {
            session,
            deployer,
            rng: StdRng::from_entropy(),
        }
    }
}

impl<'a, L: Ledger, R: Rng> ScenarioRunner<'a, L, R> {
    /// Replace the random source used for vote amounts.
    pub fn with_rng<R2: Rng>(self, rng: R2) -> ScenarioRunner<'a, L, R2> {
        ScenarioRunner {
            session: self.session,
            deployer: self.deployer,
            rng,
        }
    }

    /// Run the scenario and write its record to `path`.
    pub async fn run_and_persist(&mut self, path: &Path) -> ScenarioResult<ScenarioRecord> {
        let record = self.run().await?;
        record.write_to(path)?;
        Ok(record)
    }

    /// Run the scenario.
    pub async fn run(&mut self) -> ScenarioResult<ScenarioRecord> {
        let span = tracing::info_span!("scenario", run_id = %Uuid::new_v4());
        self.run_steps().instrument(span).await
    }

    async fn run_steps(&mut self) -> ScenarioResult<ScenarioRecord> {
        let pool = self.session.accounts().await?;
        let accounts: Vec<Address> = pool.addresses().iter().take(MAX_ACCOUNTS).copied().collect();
        let Some(&owner) = accounts.first() else {
            return Err(LedgerError::NoSignersAvailable.into());
        };
        let second = accounts.get(1).copied();
        let third = accounts.get(2).copied();

        let network = self.session.network().name.clone();
        tracing::info!(network = %network, accounts = accounts.len(), "Running scenario");
        tracing::info!(deployer = %owner, account1 = ?second, account2 = ?third, "Participants");

        let mut receipts: Vec<Receipt> = Vec::new();

        let token = self.deployer.deploy(TOKEN_CONTRACT, &Map::new()).await?.address;
        let mut ballot_params = Map::new();
        ballot_params.insert("token".to_string(), Value::String(token.to_string()));
        let ballot = self.deployer.deploy(BALLOT_CONTRACT, &ballot_params).await?.address;

        for account in &accounts {
            let receipt = self
                .session
                .mint(MintArgs {
                    signer: Some(owner),
                    contract: token,
                    recipient: Some(account.to_string()),
                    amount: MINT_VALUE,
                })
                .await;
            receipts.push(receipt);
        }

        for account in &accounts {
            let receipt = self
                .session
                .delegate(DelegateArgs {
                    signer: Some(*account),
                    contract: token,
                    delegatee: Some(account.to_string()),
                })
                .await;
            receipts.push(receipt);
        }

        if let (Some(second), Some(third)) = (second, third) {
            let receipt = self
                .session
                .delegate(DelegateArgs {
                    signer: Some(second),
                    contract: token,
                    delegatee: Some(third.to_string()),
                })
                .await;
            receipts.push(receipt);
        }

        let receipt = self
            .session
            .new_ballot(NewBallotArgs {
                signer: Some(owner),
                contract: ballot,
                name: GROUP_ID.to_string(),
                proposals: PROPOSALS.iter().map(|p| p.to_string()).collect(),
            })
            .await;
        receipts.push(receipt);

        let owner_power = self.power_of(ballot, owner).await;
        let amounts = split_budget(&mut self.rng, owner_power, PROPOSALS.len());
        for (index, amount) in amounts.into_iter().enumerate() {
            let receipt = self.vote(ballot, owner, index as u64, amount).await;
            receipts.push(receipt);
        }

        if let Some(third) = third {
            let amount = self.power_of(ballot, third).await / U256::from(PROPOSALS.len());
            for index in 0..PROPOSALS.len() {
                let receipt = self.vote(ballot, third, index as u64, amount).await;
                receipts.push(receipt);
            }
        }

        if let Some(second) = second {
            // Always above the remaining power, so the ballot rejects it.
            let amount = self.power_of(ballot, second).await + MINT_VALUE;
            let index = self.rng.gen_range(0..PROPOSALS.len()) as u64;
            let receipt = self.vote(ballot, second, index, amount).await;
            receipts.push(receipt);
        }

        let winner = match self.session.winning_proposal(ballot, GROUP_ID).await {
            Ok(winner) => winner,
            Err(e) => {
                tracing::warn!(error = %e, "Winner query failed, recording no winner");
                WinnerSummary::none()
            }
        };

        Ok(ScenarioRecord {
            network,
            receipts,
            winner,
        })
    }

    async fn power_of(&self, ballot: Address, account: Address) -> U256 {
        match self.session.voting_power(ballot, GROUP_ID, account).await {
            Ok(power) => power,
            Err(e) => {
                tracing::warn!(account = %account, error = %e, "Voting power query failed");
                U256::ZERO
            }
        }
    }

    async fn vote(&self, ballot: Address, signer: Address, proposal: u64, amount: U256) -> Receipt {
        self.session
            .vote(VoteArgs {
                signer: Some(signer),
                contract: ballot,
                ballot: GROUP_ID.to_string(),
                proposal,
                amount,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_value_is_one_token() {
        assert_eq!(MINT_VALUE, U256::from(10).pow(U256::from(18)));
    }

    #[test]
    fn test_split_budget_never_exceeds_power() {
        let power = MINT_VALUE;
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let amounts = split_budget(&mut rng, power, PROPOSALS.len());
            assert_eq!(amounts.len(), 3);
            let total = amounts.iter().fold(U256::ZERO, |acc, a| acc + a);
            assert!(total <= power, "seed {} spent {}", seed, total);
            assert!(amounts.iter().all(|a| *a <= power / U256::from(2)));
        }
    }

    #[test]
    fn test_split_budget_zero_power() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(split_budget(&mut rng, U256::ZERO, 3).iter().all(|a| a.is_zero()));
    }
}
