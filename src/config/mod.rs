//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ballot.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BallotConfig (validated, immutable)
//!     → CLI overrides (network name, RPC URL)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a local dev node needs no file at all
//! - Secrets (private keys, explorer API key) come from the environment only
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ArtifactsConfig, BallotConfig, NetworkConfig, ObservabilityConfig, VerificationConfig,
};
