//! Deploy and drive token-weighted ballot contracts on EVM networks.

pub mod actions;
pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod deploy;
pub mod observability;
pub mod scenario;

pub use actions::{Receipt, Session, WinnerSummary};
pub use blockchain::{BlockchainClient, Ledger};
pub use config::schema::BallotConfig;
pub use deploy::Deployer;
pub use scenario::{ScenarioRecord, ScenarioRunner};
