//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash};
use serde::Serialize;
use thiserror::Error;

// Re-export NetworkConfig from config module to avoid duplication
pub use crate::config::schema::NetworkConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl ChainId {
    /// Conventional network name for well-known chain IDs.
    pub fn network_name(self) -> String {
        match self.0 {
            1 => "mainnet".to_string(),
            11155111 => "sepolia".to_string(),
            17000 => "holesky".to_string(),
            31337 => "localhost".to_string(),
            id => format!("chain-{}", id),
        }
    }
}

/// Identity of the network the ledger is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    /// Network name used for explorer links and records (e.g. "sepolia").
    pub name: String,
    /// Chain ID reported by the node.
    pub chain_id: ChainId,
}

impl NetworkInfo {
    /// Use the configured name, or the well-known name of `chain_id` when none is set.
    pub fn resolve(configured: &str, chain_id: ChainId) -> Self {
        let name = if configured.is_empty() {
            chain_id.network_name()
        } else {
            configured.to_string()
        };
        Self { name, chain_id }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within expected time.
    #[error("Transaction not confirmed after {0} blocks")]
    ConfirmationTimeout(u64),

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The signer pool is empty.
    #[error("No signers available")]
    NoSignersAvailable,

    /// A deployment receipt did not carry a contract address.
    #[error("Deployment of {0} produced no contract address")]
    MissingContractAddress(TxHash),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in mempool.
    Pending,
    /// Transaction has been mined but not enough confirmations.
    Confirming { current: u64, required: u64 },
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction failed or was dropped.
    Failed(String),
}

/// Evidence that a submitted transaction reached the required depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// A confirmed contract creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// A state-changing contract call submitted by `from`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
}

impl ContractCall {
    pub fn new(from: Address, to: Address, input: impl Into<Bytes>) -> Self {
        Self {
            from,
            to,
            input: input.into(),
        }
    }
}
