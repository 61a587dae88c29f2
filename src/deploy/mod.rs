//! Deployment subsystem.
//!
//! # Data Flow
//! ```text
//! contract name + constructor params (ordered JSON object)
//!     → artifacts (compile step, ABI + bytecode)
//!     → deployer.rs (encode, instantiate from the default identity, confirm)
//!     → verify.rs (optional: wait for depth, submit source)
//! ```

pub mod deployer;
pub mod verify;

pub use deployer::{flatten_params, DeployError, DeployedContract, Deployer, VerifiedDeployment};
pub use verify::{EtherscanVerifier, SourceVerifier, VerificationRequest, VerificationStatus, VerifyError};
