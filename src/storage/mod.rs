pub mod nft_storage;
pub mod traits;

pub use nft_storage::NftStorageClient;
pub use traits::ContentStore;
