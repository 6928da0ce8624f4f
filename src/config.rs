use crate::error::{MintError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_GENERATOR_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-2-1";
pub const DEFAULT_STORAGE_API: &str = "https://api.nft.storage";
pub const DEFAULT_GATEWAY: &str = "ipfs.io";
/// Goerli, the network the minting contract was deployed to.
pub const DEFAULT_CHAIN_ID: u64 = 5;
pub const DEFAULT_MINT_PRICE: &str = "0.5";
pub const DEFAULT_PORT: u16 = 8080;

fn env_secs(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            endpoint: DEFAULT_GENERATOR_ENDPOINT.to_string(),
            api_key: None,
            // wait_for_model can hold the request open while the model loads
            timeout: Duration::from_secs(120),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        GeneratorConfig {
            endpoint: env::var("HUGGING_FACE_MODEL_URL").unwrap_or(defaults.endpoint),
            api_key: env::var("HUGGING_FACE_API_KEY").ok(),
            timeout: env_secs("GENERATION_TIMEOUT_SECS", defaults.timeout.as_secs()),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub gateway: String,
    pub timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            api_url: DEFAULT_STORAGE_API.to_string(),
            token: None,
            gateway: DEFAULT_GATEWAY.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        StorageConfig {
            api_url: env::var("NFT_STORAGE_URL").unwrap_or(defaults.api_url),
            token: env::var("NFT_STORAGE_API_KEY").ok(),
            gateway: env::var("IPFS_GATEWAY").unwrap_or(defaults.gateway),
            timeout: env_secs("STORAGE_TIMEOUT_SECS", defaults.timeout.as_secs()),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub chain_id: u64,
    /// Decimal ether amount sent with every mint call.
    pub mint_price: String,
    pub request_timeout: Duration,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            rpc_url: None,
            contract_address: None,
            chain_id: DEFAULT_CHAIN_ID,
            mint_price: DEFAULT_MINT_PRICE.to_string(),
            request_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl ChainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        ChainConfig {
            rpc_url: env::var("WALLET_RPC_URL").ok(),
            contract_address: env::var("NFT_CONTRACT_ADDRESS").ok(),
            chain_id: env::var("CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.chain_id),
            mint_price: env::var("MINT_PRICE_ETH").unwrap_or(defaults.mint_price),
            request_timeout: env_secs(
                "WALLET_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            ),
            confirmation_timeout: env_secs(
                "CONFIRMATION_TIMEOUT_SECS",
                defaults.confirmation_timeout.as_secs(),
            ),
            poll_interval: defaults.poll_interval,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    pub fn with_contract(mut self, address: impl Into<String>, chain_id: u64) -> Self {
        self.contract_address = Some(address.into());
        self.chain_id = chain_id;
        self
    }

    pub fn with_mint_price(mut self, ether: impl Into<String>) -> Self {
        self.mint_price = ether.into();
        self
    }

    pub fn with_confirmation(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub port: Option<u16>,
    pub generator: GeneratorConfig,
    pub storage: StorageConfig,
    pub chain: ChainConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT").ok().and_then(|port| port.parse().ok()),
            generator: GeneratorConfig::from_env(),
            storage: StorageConfig::from_env(),
            chain: ChainConfig::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Port for the HTTP API, from `PORT` or 8080.
    pub fn listen_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn with_generator(mut self, config: GeneratorConfig) -> Self {
        self.generator = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn with_chain(mut self, config: ChainConfig) -> Self {
        self.chain = config;
        self
    }

    /// Checks that every credential the production collaborators need is present.
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("HUGGING_FACE_API_KEY", self.generator.api_key.is_none()),
            ("NFT_STORAGE_API_KEY", self.storage.token.is_none()),
            ("WALLET_RPC_URL", self.chain.rpc_url.is_none()),
            ("NFT_CONTRACT_ADDRESS", self.chain.contract_address.is_none()),
        ]
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MintError::Config(format!(
                "missing settings: {}",
                missing.join(", ")
            )))
        }
    }
}
