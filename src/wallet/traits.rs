use crate::{
    error::Result,
    models::{TransactionReceipt, TransactionRequest},
};
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use tokio::sync::watch;

/// The connected wallet: account access, network selection and signing.
///
/// Account-level failures are reported as `MintError::Wallet`; network,
/// signing and transaction failures as `MintError::Chain`.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Asks the wallet to expose its accounts, prompting the user if needed.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    async fn chain_id(&self) -> Result<u64>;

    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// Signs and broadcasts `tx`, returning its hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;

    /// Read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Currently selected account; updated whenever the wallet reports a change.
    /// Each call returns a fresh subscription.
    fn account_changes(&self) -> watch::Receiver<Option<Address>>;
}
