//! Transaction building and confirmation monitoring.
//!
//! # Responsibilities
//! - Build call and contract-creation requests
//! - Monitor confirmations until the required block depth is reached
//!
//! Submissions are never retried: a second broadcast of the same call would
//! mint or vote twice.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{
    Confirmation, ConfirmationStatus, ContractCall, LedgerError, LedgerResult,
};

/// Build the request for a state-changing contract call.
pub fn call_request(call: &ContractCall) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(call.from)
        .with_to(call.to)
        .with_input(call.input.clone())
}

/// Build the request for a read-only `eth_call`.
pub fn read_request(to: Address, input: Bytes) -> TransactionRequest {
    TransactionRequest::default().with_to(to).with_input(input)
}

/// Build a contract-creation request.
pub fn deploy_request(from: Address, init_code: Bytes) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(from)
        .with_deploy_code(init_code)
}

/// Classify a transaction given its receipt state and the chain head.
///
/// A transaction mined in the head block has one confirmation.
pub fn confirmation_status(
    succeeded: bool,
    mined_in: Option<u64>,
    current_block: u64,
    required: u64,
) -> ConfirmationStatus {
    if !succeeded {
        return ConfirmationStatus::Failed("Transaction reverted".to_string());
    }

    let Some(mined) = mined_in else {
        return ConfirmationStatus::Pending;
    };

    let confirmations = current_block.saturating_sub(mined) + 1;
    if confirmations >= required {
        ConfirmationStatus::Confirmed {
            block_number: mined,
        }
    } else {
        ConfirmationStatus::Confirming {
            current: confirmations,
            required,
        }
    }
}

/// Polls the chain until a transaction reaches the required depth.
pub struct ConfirmationMonitor<'a> {
    client: &'a BlockchainClient,
    poll_interval: Duration,
    timeout: Duration,
}

impl<'a> ConfirmationMonitor<'a> {
    pub fn new(client: &'a BlockchainClient, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            client,
            poll_interval,
            timeout,
        }
    }

    /// Wait for `required` confirmations of `tx_hash`.
    ///
    /// Returns `Ok(None)` when no receipt appeared before the deadline.
    pub async fn wait(&self, tx_hash: TxHash, required: u64) -> LedgerResult<Option<Confirmation>> {
        let mut seen_receipt = false;

        let result = timeout(self.timeout, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };
                seen_receipt = true;

                let current_block = self.client.get_block_number().await?;
                match confirmation_status(
                    receipt.status(),
                    receipt.block_number,
                    current_block,
                    required,
                ) {
                    ConfirmationStatus::Confirmed { block_number } => {
                        return Ok(Confirmation {
                            tx_hash,
                            block_number,
                        });
                    }
                    ConfirmationStatus::Failed(_) => {
                        return Err(LedgerError::Reverted(tx_hash.to_string()));
                    }
                    ConfirmationStatus::Confirming { current, required } => {
                        tracing::debug!(
                            tx_hash = %tx_hash,
                            confirmations = current,
                            required = required,
                            "Waiting for confirmations"
                        );
                    }
                    ConfirmationStatus::Pending => {
                        tracing::debug!(tx_hash = %tx_hash, "Receipt has no block yet");
                    }
                }
            }
        })
        .await;

        match result {
            Ok(confirmation) => confirmation.map(Some),
            Err(_) if !seen_receipt => {
                tracing::warn!(tx_hash = %tx_hash, "No receipt before confirmation deadline");
                Ok(None)
            }
            Err(_) => Err(LedgerError::ConfirmationTimeout(required)),
        }
    }
}
