use crate::{
    config::StorageConfig,
    error::{MintError, Result},
    models::{GeneratedImage, MintRequest, StorageReceipt, StoreResponse, TokenMetadata},
    storage::traits::ContentStore,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};

const SERVICE: &str = "nft.storage";

/// Pins an image together with its ERC-721 metadata through the NFT.Storage
/// `/store` endpoint.
pub struct NftStorageClient {
    client: Client,
    base_url: String,
    token: String,
    gateway: String,
}

impl NftStorageClient {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let token = config
            .token
            .ok_or_else(|| MintError::Config("NFT.Storage API token is required".into()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MintError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token,
            gateway: config.gateway,
        })
    }

    fn build_form(&self, image: &GeneratedImage, request: &MintRequest) -> Result<Form> {
        let meta = TokenMetadata {
            name: request.name.clone(),
            description: request.description.clone(),
            image: None,
        };
        let meta_json = serde_json::to_string(&meta)?;

        let image_part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name())
            .mime_str(&image.content_type)
            .map_err(|e| {
                MintError::upstream(
                    SERVICE,
                    format!("invalid image content type {}: {}", image.content_type, e),
                )
            })?;

        Ok(Form::new().text("meta", meta_json).part("image", image_part))
    }
}

#[async_trait]
impl ContentStore for NftStorageClient {
    async fn store(&self, image: &GeneratedImage, request: &MintRequest) -> Result<StorageReceipt> {
        let form = self.build_form(image, request)?;

        log::info!(
            "📦 Pinning {} ({} bytes) with metadata for '{}'",
            image.file_name(),
            image.len(),
            request.name
        );

        let response = self
            .client
            .post(format!("{}/store", self.base_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MintError::upstream(SERVICE, "request timed out")
                } else {
                    MintError::upstream(SERVICE, format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MintError::upstream(SERVICE, format!("failed to read body: {}", e)))?;

        let parsed: StoreResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(MintError::upstream(
                    SERVICE,
                    format!("{}: {}", status, body),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        if !status.is_success() || !parsed.ok {
            let message = parsed
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            return Err(MintError::upstream(
                SERVICE,
                format!("store rejected: {}", message),
            ));
        }

        let value = parsed
            .value
            .ok_or_else(|| MintError::upstream(SERVICE, "response has no content identifier"))?;

        if let Some(url) = &value.url {
            log::debug!("Pinned metadata at {}", url);
        }

        Ok(StorageReceipt::new(&self.gateway, value.ipnft))
    }
}
