//! Governance token executors: mint and delegate.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use std::time::Instant;

use crate::actions::receipt::{Action, ActionParams, Receipt};
use crate::actions::Session;
use crate::blockchain::Ledger;
use crate::contracts::IVotesToken;

#[derive(Debug, Clone)]
pub struct MintArgs {
    /// Requested signer; the default identity is used when absent or unknown.
    pub signer: Option<Address>,
    /// Token contract.
    pub contract: Address,
    /// Recipient as given; missing, malformed or zero means the signer.
    pub recipient: Option<String>,
    pub amount: U256,
}

#[derive(Debug, Clone)]
pub struct DelegateArgs {
    pub signer: Option<Address>,
    pub contract: Address,
    /// Delegatee as given; missing, malformed or zero means the signer.
    pub delegatee: Option<String>,
}

/// Parse a user-supplied address, substituting `signer` for anything unusable.
pub fn resolve_recipient(raw: Option<&str>, signer: Address) -> Address {
    raw.and_then(|s| s.trim().parse::<Address>().ok())
        .filter(|addr| !addr.is_zero())
        .unwrap_or(signer)
}

fn requested_recipient(raw: Option<&str>) -> Address {
    resolve_recipient(raw, Address::ZERO)
}

impl<'a, L: Ledger> Session<'a, L> {
    /// Mint `amount` tokens to the recipient.
    pub async fn mint(&self, args: MintArgs) -> Receipt {
        let started = Instant::now();
        let recipient = args.recipient.as_deref();

        let signer = match self.resolve_signer(args.signer).await {
            Ok(signer) => signer,
            Err(e) => {
                let params = ActionParams::Mint {
                    account: requested_recipient(recipient),
                    amount: args.amount,
                };
                let from = args.signer.unwrap_or_default();
                let receipt = Receipt::failed(Action::Mint, from, args.contract, params, e.to_string());
                return self.finish(receipt, started);
            }
        };

        let account = resolve_recipient(recipient, signer);
        let params = ActionParams::Mint {
            account,
            amount: args.amount,
        };

        tracing::info!(token = %args.contract, "Start minting...");
        let input = IVotesToken::mintCall {
            to: account,
            amount: args.amount,
        }
        .abi_encode();

        let receipt = self
            .submit(Action::Mint, signer, args.contract, params, input, started)
            .await;
        if receipt.hash().is_some() {
            tracing::info!("Minted {} to {}.", args.amount, account);
        }
        receipt
    }

    /// Delegate the signer's voting power.
    pub async fn delegate(&self, args: DelegateArgs) -> Receipt {
        let started = Instant::now();
        let delegatee = args.delegatee.as_deref();

        let signer = match self.resolve_signer(args.signer).await {
            Ok(signer) => signer,
            Err(e) => {
                let params = ActionParams::Delegate {
                    account: requested_recipient(delegatee),
                };
                let from = args.signer.unwrap_or_default();
                let receipt =
                    Receipt::failed(Action::Delegate, from, args.contract, params, e.to_string());
                return self.finish(receipt, started);
            }
        };

        let account = resolve_recipient(delegatee, signer);
        let params = ActionParams::Delegate { account };

        tracing::info!(token = %args.contract, "Delegating...");
        let input = IVotesToken::delegateCall { delegatee: account }.abi_encode();

        let receipt = self
            .submit(Action::Delegate, signer, args.contract, params, input, started)
            .await;
        if receipt.hash().is_some() {
            if signer == account {
                tracing::info!("{} is delegated.", account);
            } else {
                tracing::info!("{} is delegated to {}.", signer, account);
            }
        }
        receipt
    }
}
