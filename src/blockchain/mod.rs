//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private keys) + [network] config
//!     → wallet.rs (key loading, signer pool)
//!     → client.rs (RPC connection with timeouts, implements Ledger)
//!     → transaction.rs (build, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - State-changing calls are submitted once and never retried

pub mod client;
pub mod ledger;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use ledger::Ledger;
pub use types::{
    ChainId, Confirmation, ContractCall, Deployment, LedgerError, LedgerResult, NetworkInfo,
};
pub use wallet::SignerPool;
