//! JSON-RPC ledger client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint (plus read-only failovers)
//! - Sign locally with configured keys, or let the node sign for its accounts
//! - Submit calls and contract creations, then monitor confirmations
//! - Handle timeouts and network errors gracefully

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::ledger::Ledger;
use crate::blockchain::transaction::{
    call_request, deploy_request, read_request, ConfirmationMonitor,
};
use crate::blockchain::types::{
    ChainId, Confirmation, ContractCall, Deployment, LedgerError, LedgerResult, NetworkConfig,
    NetworkInfo,
};
use crate::blockchain::wallet::{build_wallet, SignerPool};

/// Ledger client backed by one or more JSON-RPC providers.
#[derive(Clone)]
pub struct BlockchainClient {
    /// Providers (primary first, then read-only failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Addresses of locally held keys; empty when the node signs.
    local_signers: Vec<Address>,
    config: NetworkConfig,
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new client.
    ///
    /// With `keys`, transactions are signed locally and the signer pool is
    /// exactly those keys in order. Without keys, the node's accounts are used.
    pub async fn new(config: NetworkConfig, keys: Vec<PrivateKeySigner>) -> LedgerResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let local_signers: Vec<Address> = keys.iter().map(|k| k.address()).collect();
        let wallet = build_wallet(&keys);

        let mut providers = Vec::new();
        let mut urls = vec![config.rpc_url.clone()];
        urls.extend(config.failover_urls.iter().cloned());

        for (i, url_str) in urls.iter().enumerate() {
            let url: url::Url = match url_str.parse() {
                Ok(url) => url,
                Err(e) if i == 0 => {
                    return Err(LedgerError::Rpc(format!(
                        "Invalid RPC URL '{}': {}",
                        url_str, e
                    )));
                }
                Err(_) => {
                    tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
                    continue;
                }
            };

            let provider: Arc<dyn Provider + Send + Sync> = match &wallet {
                Some(wallet) => Arc::new(ProviderBuilder::new().wallet(wallet.clone()).connect_http(url)),
                None => Arc::new(ProviderBuilder::new().connect_http(url)),
            };
            providers.push(provider);
        }

        let client = Self {
            providers,
            local_signers,
            config: config.clone(),
            timeout_duration,
        };

        match client.network().await {
            Ok(network) => tracing::info!(
                rpc_url = %config.rpc_url,
                network = %network.name,
                chain_id = network.chain_id.0,
                "Ledger client initialized"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "Ledger client initialized but network lookup failed"
            ),
        }

        Ok(client)
    }

    /// Run a read-only RPC against each provider in turn until one answers.
    async fn read_with_failover<T, F, Fut, E>(&self, what: &str, f: F) -> LedgerResult<T>
    where
        F: Fn(Arc<dyn Provider + Send + Sync>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut last_error = None;
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error, trying next provider");
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout, trying next provider");
                    last_error = Some(format!("timeout after {}s", self.config.rpc_timeout_secs));
                }
            }
        }
        Err(LedgerError::Rpc(format!(
            "All RPC providers failed to {}: {}",
            what,
            last_error.unwrap_or_default()
        )))
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> LedgerResult<ChainId> {
        self.read_with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> LedgerResult<u64> {
        self.read_with_failover("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> LedgerResult<Option<TransactionReceipt>> {
        self.read_with_failover("get receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Broadcast a transaction through the primary provider only.
    async fn submit(&self, request: TransactionRequest) -> LedgerResult<TxHash> {
        let pending = timeout(self.timeout_duration, self.provider().send_transaction(request))
            .await
            .map_err(|_| LedgerError::Timeout(self.config.rpc_timeout_secs))?
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        tracing::debug!(tx_hash = %tx_hash, "Transaction submitted");
        Ok(tx_hash)
    }

    fn monitor(&self) -> ConfirmationMonitor<'_> {
        ConfirmationMonitor::new(
            self,
            Duration::from_millis(self.config.poll_interval_ms),
            Duration::from_secs(self.config.confirmation_timeout_secs),
        )
    }

    /// Get the underlying primary provider.
    pub fn provider(&self) -> &(dyn Provider + Send + Sync) {
        self.providers[0].as_ref()
    }

    /// Get the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
}

impl Ledger for BlockchainClient {
    async fn network(&self) -> LedgerResult<NetworkInfo> {
        let chain_id = self.get_chain_id().await?;
        if let Some(expected) = self.config.chain_id {
            if expected != chain_id.0 {
                return Err(LedgerError::ChainMismatch {
                    expected,
                    actual: chain_id.0,
                });
            }
        }

        Ok(NetworkInfo::resolve(&self.config.name, chain_id))
    }

    async fn signers(&self) -> LedgerResult<SignerPool> {
        if !self.local_signers.is_empty() {
            return Ok(SignerPool::new(self.local_signers.clone()));
        }

        self.read_with_failover("list accounts", |p| async move { p.get_accounts().await })
            .await
            .map(SignerPool::new)
    }

    async fn deploy(
        &self,
        from: Address,
        init_code: Bytes,
        confirmations: u64,
    ) -> LedgerResult<Deployment> {
        let tx_hash = self.submit(deploy_request(from, init_code)).await?;
        let confirmation = self
            .monitor()
            .wait(tx_hash, confirmations)
            .await?
            .ok_or(LedgerError::ConfirmationTimeout(confirmations))?;

        let receipt = self
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or(LedgerError::MissingContractAddress(tx_hash))?;
        let address = receipt
            .contract_address
            .ok_or(LedgerError::MissingContractAddress(tx_hash))?;

        Ok(Deployment {
            address,
            tx_hash,
            block_number: confirmation.block_number,
        })
    }

    async fn send(
        &self,
        call: ContractCall,
        confirmations: u64,
    ) -> LedgerResult<Option<Confirmation>> {
        let tx_hash = self.submit(call_request(&call)).await?;
        self.monitor().wait(tx_hash, confirmations).await
    }

    async fn read(&self, to: Address, input: Bytes) -> LedgerResult<Bytes> {
        self.read_with_failover("call contract", |p| {
            let request = read_request(to, input.clone());
            async move { p.call(request).await }
        })
        .await
    }

    async fn wait_for_confirmations(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> LedgerResult<Option<Confirmation>> {
        self.monitor().wait(tx_hash, confirmations).await
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("network", &self.config.name)
            .field("local_signers", &self.local_signers.len())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
