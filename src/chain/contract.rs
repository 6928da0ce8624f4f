use crate::{
    config::ChainConfig,
    error::{MintError, Result},
    models::{MintResult, TransactionReceipt, TransactionRequest},
    wallet::Wallet,
};
use alloy_primitives::{utils::parse_ether, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use std::sync::Arc;
use std::time::Duration;

sol! {
    function mint(string tokenURI) external payable;
    function balanceOf(address owner) external view returns (uint256);
}

pub fn encode_mint(token_uri: &str) -> Bytes {
    mintCall {
        tokenURI: token_uri.to_string(),
    }
    .abi_encode()
    .into()
}

/// Decodes `mint(string)` calldata back into its token URI.
pub fn decode_mint(data: &[u8]) -> Result<String> {
    mintCall::abi_decode(data, true)
        .map(|call| call.tokenURI)
        .map_err(|e| MintError::Chain(format!("not a mint call: {}", e)))
}

/// The deployed minting contract, reached through the connected wallet.
#[derive(Clone)]
pub struct NftContract {
    wallet: Arc<dyn Wallet>,
    address: Address,
    chain_id: u64,
    mint_price: U256,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl NftContract {
    pub fn new(config: &ChainConfig, wallet: Arc<dyn Wallet>) -> Result<Self> {
        let address = config
            .contract_address
            .as_deref()
            .ok_or_else(|| MintError::Config("contract address is required".into()))?
            .parse::<Address>()
            .map_err(|e| MintError::Config(format!("invalid contract address: {}", e)))?;

        let mint_price = parse_ether(&config.mint_price).map_err(|e| {
            MintError::Config(format!("invalid mint price {}: {}", config.mint_price, e))
        })?;

        Ok(Self {
            wallet,
            address,
            chain_id: config.chain_id,
            mint_price,
            confirmation_timeout: config.confirmation_timeout,
            poll_interval: config.poll_interval,
        })
    }

    pub fn mint_price(&self) -> U256 {
        self.mint_price
    }

    /// Makes sure the wallet is on the contract's network, asking it to switch once.
    pub async fn ensure_network(&self) -> Result<()> {
        let current = self.wallet.chain_id().await?;
        if current == self.chain_id {
            return Ok(());
        }

        log::warn!(
            "🔀 Wallet is on chain {}, switching to {}",
            current,
            self.chain_id
        );
        self.wallet.switch_chain(self.chain_id).await?;

        let current = self.wallet.chain_id().await?;
        if current != self.chain_id {
            return Err(MintError::Chain(format!(
                "wrong network: wallet is on chain {}, expected {}",
                current, self.chain_id
            )));
        }
        Ok(())
    }

    /// Checks the network, then sends the paid `mint(tokenURI)` call from `account`.
    pub async fn send_mint(&self, account: Address, token_uri: &str) -> Result<B256> {
        self.ensure_network().await?;

        let tx = TransactionRequest {
            from: account,
            to: self.address,
            value: Some(self.mint_price),
            data: encode_mint(token_uri),
        };

        log::info!("⛓️  Sending mint from {} to {}", account, self.address);
        let hash = self.wallet.send_transaction(tx).await?;
        log::info!("📨 Mint transaction sent: {}", hash);
        Ok(hash)
    }

    /// Waits for one confirmation of a sent mint and rejects a reverted one.
    pub async fn confirm_mint(
        &self,
        account: Address,
        token_uri: &str,
        hash: B256,
    ) -> Result<MintResult> {
        let receipt = self.wait_for_receipt(hash).await?;
        if !receipt.succeeded() {
            return Err(MintError::Chain(format!("mint transaction {} reverted", hash)));
        }

        Ok(MintResult {
            transaction_hash: hash,
            confirmed: true,
            token_uri: token_uri.to_string(),
            account,
            block_number: receipt.block(),
        })
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        let poll = async {
            loop {
                if let Some(receipt) = self.wallet.transaction_receipt(hash).await? {
                    if receipt.block_number.is_some() {
                        return Ok::<_, MintError>(receipt);
                    }
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(self.confirmation_timeout, poll)
            .await
            .map_err(|_| {
                MintError::Chain(format!(
                    "transaction {} not confirmed within {}s",
                    hash,
                    self.confirmation_timeout.as_secs()
                ))
            })?
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        let data: Bytes = balanceOfCall { owner }.abi_encode().into();
        let output = self.wallet.call(self.address, data).await?;
        let decoded = balanceOfCall::abi_decode_returns(&output, true)
            .map_err(|e| MintError::Chain(format!("invalid balanceOf result: {}", e)))?;
        Ok(decoded._0)
    }
}
