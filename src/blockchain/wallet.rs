//! Signing identities.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::Serialize;

use crate::blockchain::types::{LedgerError, LedgerResult};

/// Environment variable holding comma-separated private keys.
pub const PRIVATE_KEYS_ENV_VAR: &str = "BALLOT_PRIVATE_KEYS";

/// Ordered pool of signing identities for the active session.
///
/// The first identity is the default (deployer) identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SignerPool(Vec<Address>);

impl SignerPool {
    pub fn new(addresses: Vec<Address>) -> Self {
        Self(addresses)
    }

    /// Pick the identity matching `requested`, falling back to the first one.
    pub fn resolve(&self, requested: Option<Address>) -> LedgerResult<Address> {
        let default = *self.0.first().ok_or(LedgerError::NoSignersAvailable)?;

        Ok(requested
            .and_then(|wanted| self.0.iter().copied().find(|addr| *addr == wanted))
            .unwrap_or(default))
    }

    pub fn addresses(&self) -> &[Address] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<Address> {
        self.0.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse one hex-encoded private key (with or without 0x prefix).
///
/// The key is never logged, only the derived address.
pub fn parse_private_key(private_key_hex: &str) -> LedgerResult<PrivateKeySigner> {
    let key_hex = private_key_hex
        .trim()
        .strip_prefix("0x")
        .unwrap_or(private_key_hex.trim());

    key_hex
        .parse()
        .map_err(|e| LedgerError::Wallet(format!("Invalid private key format: {}", e)))
}

/// Parse a comma-separated list of private keys, preserving order.
pub fn parse_private_keys(raw: &str) -> LedgerResult<Vec<PrivateKeySigner>> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_private_key)
        .collect()
}

/// Load signing keys from `BALLOT_PRIVATE_KEYS`.
///
/// An unset variable is not an error: the node's own accounts are used then.
pub fn keys_from_env() -> LedgerResult<Vec<PrivateKeySigner>> {
    match std::env::var(PRIVATE_KEYS_ENV_VAR) {
        Ok(raw) => parse_private_keys(&raw),
        Err(_) => Ok(Vec::new()),
    }
}

/// Build a wallet that can sign for every key, with the first as default.
pub fn build_wallet(keys: &[PrivateKeySigner]) -> Option<EthereumWallet> {
    let (first, rest) = keys.split_first()?;
    let mut wallet = EthereumWallet::from(first.clone());
    for key in rest {
        wallet.register_signer(key.clone());
    }

    tracing::info!(
        signers = keys.len(),
        default = %first.address(),
        "Local wallet initialized"
    );
    Some(wallet)
}
