pub mod huggingface;

use crate::{error::Result, models::GeneratedImage};
use async_trait::async_trait;

pub use huggingface::HuggingFaceClient;

/// Renders an image from a text prompt. One attempt per call, no retries.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;
}
