//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file targets a local dev node.

use serde::{Deserialize, Serialize};

/// Root configuration for the toolkit.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BallotConfig {
    /// Network connection settings.
    pub network: NetworkConfig,

    /// Compiled contract artifacts.
    pub artifacts: ArtifactsConfig,

    /// Source verification service.
    pub verification: VerificationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network name used in records and explorer links.
    /// Empty means derive it from the chain ID.
    pub name: String,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs (read-only queries only).
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Expected chain ID (e.g., 11155111 for Sepolia, 31337 for a local node).
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Confirmations awaited for every action.
    pub confirmation_blocks: u64,

    /// Confirmations awaited before submitting source verification.
    pub verify_confirmation_blocks: u64,

    /// Maximum time to wait for confirmations, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            verify_confirmation_blocks: 5,
            confirmation_timeout_secs: 300,
            poll_interval_ms: 500,
        }
    }
}

/// Compiled artifact location and the optional compile step.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Artifact root (Hardhat `artifacts/` or Foundry `out/`).
    pub dir: String,

    /// Command run before deploying, e.g. `["npx", "hardhat", "compile"]`.
    /// Empty skips compilation.
    pub compile_command: Vec<String>,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "artifacts".to_string(),
            compile_command: Vec::new(),
        }
    }
}

/// Etherscan-compatible verification API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// API endpoint.
    pub api_url: String,

    /// Interval between verification status checks, in seconds.
    pub poll_interval_secs: u64,

    /// Number of status checks before giving up.
    pub max_polls: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.etherscan.io/v2/api".to_string(),
            poll_interval_secs: 5,
            max_polls: 12,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus textfile written at exit (node_exporter textfile collector).
    pub metrics_textfile: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_textfile: None,
        }
    }
}
