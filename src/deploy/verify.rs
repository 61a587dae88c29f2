//! Source verification against an Etherscan-compatible API.
//!
//! # Flow
//! ```text
//! verifysourcecode (standard JSON input) → guid
//!     → checkverifystatus every poll interval
//!     → "Pass - Verified" | "Already Verified" | failure reason
//! ```

use alloy::primitives::{hex, Address, Bytes};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use crate::config::VerificationConfig;

/// Environment variable holding the explorer API key.
pub const API_KEY_ENV_VAR: &str = "ETHERSCAN_API_KEY";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("environment variable {0} not set")]
    MissingApiKey(&'static str),

    #[error("deployment did not reach {0} confirmations")]
    NotConfirmed(u64),

    #[error("waiting for confirmations failed: {0}")]
    Confirmation(String),

    #[error("build info unavailable: {0}")]
    BuildInfo(String),

    #[error("verification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("verification rejected: {0}")]
    Rejected(String),

    #[error("verification still pending after {0} checks")]
    Timeout(u32),
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// What the verification service needs to match deployed bytecode to source.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub address: Address,
    /// Fully qualified name, e.g. `contracts/Ballot.sol:Ballot`.
    pub contract_name: String,
    /// Compiler version as the explorer expects it, e.g. `v0.8.24+commit.e11b9ed9`.
    pub compiler_version: String,
    /// Standard JSON compiler input.
    pub source: String,
    pub constructor_args: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Verified,
    AlreadyVerified,
}

/// A public source verification service.
#[allow(async_fn_in_trait)]
pub trait SourceVerifier {
    async fn verify(&self, request: &VerificationRequest) -> VerifyResult<VerificationStatus>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    result: String,
}

/// Interpretation of one API answer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ApiState {
    Accepted(String),
    Pending,
    Done(VerificationStatus),
    Rejected(String),
}

fn interpret(response: &ApiResponse) -> ApiState {
    let result = response.result.trim();
    let lower = result.to_lowercase();

    if lower.contains("already verified") {
        ApiState::Done(VerificationStatus::AlreadyVerified)
    } else if lower.starts_with("pass") {
        ApiState::Done(VerificationStatus::Verified)
    } else if lower.contains("pending") || lower.contains("in queue") {
        ApiState::Pending
    } else if response.status == "1" {
        ApiState::Accepted(result.to_string())
    } else {
        ApiState::Rejected(result.to_string())
    }
}

/// Etherscan (v2 multichain) verification client.
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    chain_id: u64,
    poll_interval: Duration,
    max_polls: u32,
}

impl EtherscanVerifier {
    pub fn new(config: &VerificationConfig, api_key: String, chain_id: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key,
            chain_id,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_polls: config.max_polls,
        }
    }

    /// Build a verifier with the API key from `ETHERSCAN_API_KEY`.
    pub fn from_env(config: &VerificationConfig, chain_id: u64) -> VerifyResult<Self> {
        let api_key = std::env::var(API_KEY_ENV_VAR)
            .map_err(|_| VerifyError::MissingApiKey(API_KEY_ENV_VAR))?;
        Ok(Self::new(config, api_key, chain_id))
    }

    async fn submit(&self, request: &VerificationRequest) -> VerifyResult<ApiResponse> {
        let address = request.address.to_string();
        let constructor_args = hex::encode(&request.constructor_args);
        let form = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", address.as_str()),
            ("sourceCode", request.source.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("contractname", request.contract_name.as_str()),
            ("compilerversion", request.compiler_version.as_str()),
            // Field name misspelled by the API itself.
            ("constructorArguements", constructor_args.as_str()),
        ];

        let response = self
            .http
            .post(&self.api_url)
            .query(&[("chainid", self.chain_id)])
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    async fn check(&self, guid: &str) -> VerifyResult<ApiResponse> {
        let chain_id = self.chain_id.to_string();
        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

impl SourceVerifier for EtherscanVerifier {
    async fn verify(&self, request: &VerificationRequest) -> VerifyResult<VerificationStatus> {
        tracing::info!(
            address = %request.address,
            contract = %request.contract_name,
            "Submitting source for verification"
        );

        let guid = match interpret(&self.submit(request).await?) {
            ApiState::Accepted(guid) => guid,
            ApiState::Done(status) => return Ok(status),
            ApiState::Pending => {
                return Err(VerifyError::Rejected("no verification id returned".to_string()))
            }
            ApiState::Rejected(reason) => return Err(VerifyError::Rejected(reason)),
        };

        for attempt in 1..=self.max_polls {
            sleep(self.poll_interval).await;
            match interpret(&self.check(&guid).await?) {
                ApiState::Done(status) => return Ok(status),
                ApiState::Pending | ApiState::Accepted(_) => {
                    tracing::debug!(guid = %guid, attempt, "Verification pending");
                }
                ApiState::Rejected(reason) => return Err(VerifyError::Rejected(reason)),
            }
        }
        Err(VerifyError::Timeout(self.max_polls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: &str, result: &str) -> ApiResponse {
        ApiResponse {
            status: status.to_string(),
            result: result.to_string(),
        }
    }

    #[test]
    fn test_interpret_submission() {
        assert_eq!(
            interpret(&response("1", "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn")),
            ApiState::Accepted("ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".to_string())
        );
        assert_eq!(
            interpret(&response("0", "Contract source code already verified")),
            ApiState::Done(VerificationStatus::AlreadyVerified)
        );
        assert_eq!(
            interpret(&response("0", "Invalid API Key")),
            ApiState::Rejected("Invalid API Key".to_string())
        );
    }

    #[test]
    fn test_interpret_status_checks() {
        assert_eq!(interpret(&response("0", "Pending in queue")), ApiState::Pending);
        assert_eq!(
            interpret(&response("1", "Pass - Verified")),
            ApiState::Done(VerificationStatus::Verified)
        );
        assert_eq!(
            interpret(&response("0", "Fail - Unable to verify")),
            ApiState::Rejected("Fail - Unable to verify".to_string())
        );
    }

    #[test]
    fn test_api_response_parsing() {
        let parsed: ApiResponse =
            serde_json::from_str(r#"{"status":"1","message":"OK","result":"abc"}"#).unwrap();
        assert_eq!(parsed.status, "1");
        assert_eq!(parsed.result, "abc");
    }
}
