use crate::{
    config::ChainConfig,
    error::{MintError, Result},
    models::{RpcErrorObject, RpcRequest, RpcResponse, TransactionReceipt, TransactionRequest},
    wallet::traits::Wallet,
};
use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};

enum RpcFailure {
    Transport(String),
    Rpc(RpcErrorObject),
    Decode(String),
}

impl RpcFailure {
    fn describe(&self, method: &str) -> String {
        match self {
            RpcFailure::Transport(e) => format!("{} failed: {}", method, e),
            RpcFailure::Rpc(e) => format!("{} returned {} ({})", method, e.message, e.code),
            RpcFailure::Decode(e) => format!("{} returned an unexpected result: {}", method, e),
        }
    }
}

/// Wallet reached through its EIP-1193 request methods over JSON-RPC/HTTP,
/// e.g. a local signer node or a wallet bridge.
pub struct JsonRpcWallet {
    client: Client,
    url: String,
    next_id: AtomicU64,
    account: watch::Sender<Option<Address>>,
}

impl JsonRpcWallet {
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let url = config
            .rpc_url
            .clone()
            .ok_or_else(|| MintError::Config("wallet RPC URL is required".into()))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MintError::Config(format!("failed to build HTTP client: {}", e)))?;

        let (account, _) = watch::channel(None);

        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
            account,
        })
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> std::result::Result<T, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::trace!("→ {} #{}", method, id);

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| RpcFailure::Decode(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(RpcFailure::Rpc(error));
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null))
            .map_err(|e| RpcFailure::Decode(e.to_string()))
    }

    fn publish_account(&self, account: Option<Address>) {
        self.account.send_if_modified(|current| {
            if *current == account {
                return false;
            }
            match account {
                Some(address) => log::info!("👛 Active account: {}", address),
                None => log::warn!("👛 Wallet has no exposed accounts"),
            }
            *current = account;
            true
        });
    }

    /// Re-reads the exposed accounts without prompting and publishes any change.
    pub async fn refresh_accounts(&self) -> Result<Option<Address>> {
        let accounts: Vec<Address> = self
            .rpc("eth_accounts", json!([]))
            .await
            .map_err(|e| MintError::Wallet(e.describe("eth_accounts")))?;
        let account = accounts.first().copied();
        self.publish_account(account);
        Ok(account)
    }
}

/// Polls the wallet for account changes until the returned task is aborted.
pub fn spawn_account_watcher(wallet: Arc<JsonRpcWallet>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = wallet.refresh_accounts().await {
                log::debug!("Account refresh failed: {}", e);
            }
        }
    })
}

#[async_trait]
impl Wallet for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts: Vec<Address> = self
            .rpc("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| match e {
                RpcFailure::Rpc(ref obj) if obj.is_user_rejection() => {
                    MintError::Wallet("account access rejected by user".into())
                }
                other => MintError::Wallet(other.describe("eth_requestAccounts")),
            })?;
        self.publish_account(accounts.first().copied());
        Ok(accounts)
    }

    async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self
            .rpc("eth_chainId", json!([]))
            .await
            .map_err(|e| MintError::Chain(e.describe("eth_chainId")))?;
        Ok(id.to::<u64>())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        let params = json!([{ "chainId": format!("{:#x}", chain_id) }]);
        let _: Value = self
            .rpc("wallet_switchEthereumChain", params)
            .await
            .map_err(|e| MintError::Chain(e.describe("wallet_switchEthereumChain")))?;
        Ok(())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        self.rpc("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| match e {
                RpcFailure::Rpc(ref obj) if obj.is_user_rejection() => {
                    MintError::Chain("transaction rejected by user".into())
                }
                RpcFailure::Rpc(ref obj) if obj.is_unauthorized() => {
                    MintError::Wallet(format!("account {} is not authorized", tx.from))
                }
                other => MintError::Chain(other.describe("eth_sendTransaction")),
            })
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.rpc("eth_getTransactionReceipt", json!([hash]))
            .await
            .map_err(|e| MintError::Chain(e.describe("eth_getTransactionReceipt")))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.rpc("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
            .map_err(|e| MintError::Chain(e.describe("eth_call")))
    }

    fn account_changes(&self) -> watch::Receiver<Option<Address>> {
        self.account.subscribe()
    }
}
