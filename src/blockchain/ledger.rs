//! The capability set every ledger client must provide.
//!
//! Executors, the deployer and the scenario runner only talk to the chain
//! through this trait, so the JSON-RPC client and the in-memory test ledger
//! are interchangeable.

use alloy::primitives::{Address, Bytes, TxHash};

use crate::blockchain::types::{
    Confirmation, ContractCall, Deployment, LedgerResult, NetworkInfo,
};
use crate::blockchain::wallet::SignerPool;

#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// Identity of the connected network.
    async fn network(&self) -> LedgerResult<NetworkInfo>;

    /// Signing identities available to this session, in pool order.
    async fn signers(&self) -> LedgerResult<SignerPool>;

    /// Submit contract creation code from `from` and wait for it to be mined.
    async fn deploy(
        &self,
        from: Address,
        init_code: Bytes,
        confirmations: u64,
    ) -> LedgerResult<Deployment>;

    /// Submit a state-changing call and wait for `confirmations` blocks.
    ///
    /// `Ok(None)` means the transaction was accepted but no confirmation
    /// could be obtained for it.
    async fn send(
        &self,
        call: ContractCall,
        confirmations: u64,
    ) -> LedgerResult<Option<Confirmation>>;

    /// Read contract state (`eth_call`).
    async fn read(&self, to: Address, input: Bytes) -> LedgerResult<Bytes>;

    /// Wait until an already-submitted transaction has `confirmations` blocks.
    async fn wait_for_confirmations(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> LedgerResult<Option<Confirmation>>;
}
