//! Contract deployment orchestration.

use alloy::primitives::{Address, Bytes, TxHash};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::blockchain::{Ledger, LedgerError};
use crate::contracts::artifacts::{Artifact, ArtifactError, ArtifactStore};
use crate::deploy::verify::{
    SourceVerifier, VerificationRequest, VerificationStatus, VerifyError, VerifyResult,
};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("deployment failed: {0}")]
    Ledger(#[from] LedgerError),
}

pub type DeployResult<T> = Result<T, DeployError>;

/// A confirmed deployment and the parameters it was created with.
#[derive(Debug, Clone)]
pub struct DeployedContract {
    pub name: String,
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// Constructor parameters in positional order.
    pub params: Vec<Value>,
    /// ABI-encoded constructor arguments.
    pub constructor_args: Bytes,
    artifact: Artifact,
}

impl DeployedContract {
    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }
}

/// Deployment result plus the independently reported verification outcome.
#[derive(Debug)]
pub struct VerifiedDeployment {
    pub contract: DeployedContract,
    pub verification: VerifyResult<VerificationStatus>,
}

/// Flatten named constructor parameters into positional order.
///
/// Order is the map's insertion order, i.e. the order the parameters were
/// written in.
pub fn flatten_params(params: &Map<String, Value>) -> Vec<Value> {
    params.values().cloned().collect()
}

/// Compiles, instantiates and optionally verifies contracts.
pub struct Deployer<'a, L> {
    ledger: &'a L,
    artifacts: ArtifactStore,
    confirmations: u64,
}

impl<'a, L: Ledger> Deployer<'a, L> {
    pub fn new(ledger: &'a L, artifacts: ArtifactStore, confirmations: u64) -> Self {
        Self {
            ledger,
            artifacts,
            confirmations,
        }
    }

    /// Deploy `name` from the default identity with the given constructor parameters.
    pub async fn deploy(&self, name: &str, params: &Map<String, Value>) -> DeployResult<DeployedContract> {
        let result = self.deploy_inner(name, params).await;
        metrics::record_deployment(name, result.is_ok());
        if let Err(e) = &result {
            tracing::error!(contract = name, error = %e, "Deployment failed");
        }
        result
    }

    async fn deploy_inner(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> DeployResult<DeployedContract> {
        self.artifacts.compile().await?;

        let artifact = self.artifacts.load(name)?;
        let params = flatten_params(params);
        let constructor_args = artifact.encode_constructor_args(&params)?;
        let deployer = self.ledger.signers().await?.resolve(None)?;

        tracing::info!(contract = name, deployer = %deployer, "Deploying {} contract...", name.to_lowercase());
        let deployment = self
            .ledger
            .deploy(deployer, artifact.init_code(&constructor_args), self.confirmations)
            .await?;
        tracing::info!(
            contract = name,
            address = %deployment.address,
            tx_hash = %deployment.tx_hash,
            "Contract is deployed at {}.",
            deployment.address
        );

        Ok(DeployedContract {
            name: name.to_string(),
            address: deployment.address,
            tx_hash: deployment.tx_hash,
            block_number: deployment.block_number,
            params,
            constructor_args,
            artifact,
        })
    }

    /// Deploy, wait for `verify_confirmations`, then submit the source for verification.
    ///
    /// A verification failure does not undo the deployment; it is reported in
    /// [`VerifiedDeployment::verification`].
    pub async fn deploy_and_verify<V: SourceVerifier>(
        &self,
        name: &str,
        params: &Map<String, Value>,
        verifier: &V,
        verify_confirmations: u64,
    ) -> DeployResult<VerifiedDeployment> {
        let contract = self.deploy(name, params).await?;
        let verification = self
            .verify(&contract, verifier, verify_confirmations)
            .await;

        metrics::record_verification(verification.is_ok());
        match &verification {
            Ok(status) => tracing::info!(contract = name, status = ?status, "Verified"),
            Err(e) => tracing::error!(contract = name, error = %e, "Verification failed"),
        }
        Ok(VerifiedDeployment {
            contract,
            verification,
        })
    }

    async fn verify<V: SourceVerifier>(
        &self,
        contract: &DeployedContract,
        verifier: &V,
        verify_confirmations: u64,
    ) -> VerifyResult<VerificationStatus> {
        tracing::info!("Waiting for block confirmations...");
        let confirmed = self
            .ledger
            .wait_for_confirmations(contract.tx_hash, verify_confirmations)
            .await
            .map_err(|e| VerifyError::Confirmation(e.to_string()))?;
        if confirmed.is_none() {
            return Err(VerifyError::NotConfirmed(verify_confirmations));
        }
        tracing::info!("Confirmed!");

        let build_info = contract
            .artifact
            .build_info()
            .map_err(|e| VerifyError::BuildInfo(e.to_string()))?;
        let request = VerificationRequest {
            address: contract.address,
            contract_name: contract.artifact.qualified_name(),
            compiler_version: format!("v{}", build_info.solc_long_version),
            source: build_info.input,
            constructor_args: contract.constructor_args.clone(),
        };

        tracing::info!("Verifying {} contract...", contract.name.to_lowercase());
        verifier.verify(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_params_keeps_insertion_order() {
        let params: Map<String, Value> =
            serde_json::from_str(r#"{"token":"0x01","quorum":5,"admin":"0x02"}"#).unwrap();
        assert_eq!(
            flatten_params(&params),
            vec![json!("0x01"), json!(5), json!("0x02")]
        );
    }

    #[test]
    fn test_flatten_empty_params() {
        assert!(flatten_params(&Map::new()).is_empty());
    }
}
