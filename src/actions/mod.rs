//! Contract action executors.
//!
//! # Protocol
//! ```text
//! resolve signer → normalize inputs → submit call → await confirmation
//!     → Receipt::succeeded (hash, block, explorer URL)
//!     → Receipt::failed (reason) on any error before confirmation
//! ```
//!
//! State-changing executors always return a [`Receipt`]; errors never escape
//! them. Read-only queries return `Result` instead.

pub mod ballot;
pub mod receipt;
pub mod token;

use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use std::time::Instant;
use thiserror::Error;

use crate::blockchain::{ContractCall, Ledger, LedgerError, LedgerResult, NetworkInfo, SignerPool};
use crate::contracts::NameError;
use crate::observability::metrics;

pub use ballot::{NewBallotArgs, SetTargetBlockArgs, VoteArgs};
pub use receipt::{
    explorer_url, Action, ActionParams, Outcome, ProposalRef, Receipt, Status, WinnerSummary,
};
pub use token::{DelegateArgs, MintArgs};

/// Errors from read-only queries.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error("failed to decode contract response: {0}")]
    Decode(#[from] alloy::sol_types::Error),

    #[error("proposal index {0} is out of range")]
    IndexOutOfRange(String),
}

pub type ActionResult<T> = Result<T, ActionError>;

/// Executes contract actions against one ledger on one network.
pub struct Session<'a, L> {
    ledger: &'a L,
    network: NetworkInfo,
    confirmations: u64,
}

impl<'a, L: Ledger> Session<'a, L> {
    pub fn new(ledger: &'a L, network: NetworkInfo, confirmations: u64) -> Self {
        Self {
            ledger,
            network,
            confirmations,
        }
    }

    /// Look up the network identity once and open a session on it.
    pub async fn connect(ledger: &'a L, confirmations: u64) -> LedgerResult<Self> {
        let network = ledger.network().await?;
        Ok(Self::new(ledger, network, confirmations))
    }

    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    pub fn ledger(&self) -> &'a L {
        self.ledger
    }

    /// The signing identities available to this session.
    pub async fn accounts(&self) -> LedgerResult<SignerPool> {
        self.ledger.signers().await
    }

    async fn resolve_signer(&self, requested: Option<Address>) -> LedgerResult<Address> {
        self.ledger.signers().await?.resolve(requested)
    }

    /// Submit `input` to `to` as `from` and turn the outcome into a receipt.
    async fn submit(
        &self,
        action: Action,
        from: Address,
        to: Address,
        params: ActionParams,
        input: Vec<u8>,
        started: Instant,
    ) -> Receipt {
        let call = ContractCall::new(from, to, input);
        let receipt = match self.ledger.send(call, self.confirmations).await {
            Ok(Some(confirmation)) => Receipt::succeeded(
                action,
                from,
                to,
                params,
                &self.network.name,
                confirmation,
            ),
            Ok(None) => Receipt::failed(action, from, to, params, receipt::NOT_CONFIRMED_REASON),
            Err(e) => Receipt::failed(action, from, to, params, e.to_string()),
        };
        self.finish(receipt, started)
    }

    /// Log and count a finished action.
    fn finish(&self, receipt: Receipt, started: Instant) -> Receipt {
        match &receipt.outcome {
            Outcome::Success {
                hash,
                block_number,
                explorer_url,
            } => {
                tracing::info!(
                    action = receipt.action.as_str(),
                    from = %receipt.from,
                    tx_hash = %hash,
                    block = block_number,
                    "Action confirmed"
                );
                if !explorer_url.is_empty() {
                    tracing::info!("{}", explorer_url);
                }
            }
            Outcome::Failed { reason } => tracing::warn!(
                action = receipt.action.as_str(),
                from = %receipt.from,
                reason = %reason,
                "Action failed"
            ),
        }

        metrics::record_action(
            receipt.action.as_str(),
            receipt.status() == Status::Success,
            started.elapsed(),
        );
        receipt
    }

    /// Read contract state through a typed call.
    async fn query<C: SolCall>(&self, to: Address, call: C) -> ActionResult<C::Return> {
        let output = self.ledger.read(to, call.abi_encode().into()).await?;
        Ok(C::abi_decode_returns(&output)?)
    }
}
