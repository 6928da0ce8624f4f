pub mod chain;
pub mod config;
pub mod error;
pub mod generation;
pub mod logger;
pub mod models;
pub mod orchestrator;
#[cfg(feature = "server")]
pub mod server;
pub mod storage;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::NftContract;
pub use config::{ChainConfig, Config, GeneratorConfig, StorageConfig};
pub use error::{ErrorKind, MintError, Result};
pub use generation::{HuggingFaceClient, ImageGenerator};
pub use models::{GeneratedImage, MintRequest, MintResult, MintState, StorageReceipt};
pub use orchestrator::MintOrchestrator;
pub use storage::{ContentStore, NftStorageClient};
pub use wallet::{JsonRpcWallet, Wallet};
