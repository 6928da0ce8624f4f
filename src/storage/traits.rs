use crate::{
    error::Result,
    models::{GeneratedImage, MintRequest, StorageReceipt},
};
use async_trait::async_trait;

/// Content-addressed storage for an image and its token metadata.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Pins `image` with `{ name, description }` metadata and returns the
    /// gateway URI of the metadata document.
    async fn store(&self, image: &GeneratedImage, request: &MintRequest) -> Result<StorageReceipt>;
}
