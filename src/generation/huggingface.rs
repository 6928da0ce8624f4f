use crate::{
    config::GeneratorConfig,
    error::{MintError, Result},
    generation::ImageGenerator,
    models::{GeneratedImage, GenerationPayload, InferenceErrorBody, DEFAULT_IMAGE_CONTENT_TYPE},
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};

const SERVICE: &str = "huggingface";

/// Text-to-image client for the Hugging Face inference API.
#[derive(Clone)]
pub struct HuggingFaceClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HuggingFaceClient {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| MintError::Config("Hugging Face API key is required".into()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MintError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key,
        })
    }

    /// Model id taken from the endpoint path, e.g. `stabilityai/stable-diffusion-2-1`.
    pub fn model_id(&self) -> &str {
        self.endpoint
            .split_once("/models/")
            .map(|(_, model)| model.trim_end_matches('/'))
            .unwrap_or(&self.endpoint)
    }
}

fn media_type(raw: Option<&str>) -> String {
    raw.and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string())
}

fn error_detail(body: &[u8]) -> String {
    match serde_json::from_slice::<InferenceErrorBody>(body) {
        Ok(parsed) => match parsed.estimated_time {
            Some(eta) => format!("{} (estimated time {:.0}s)", parsed.error, eta),
            None => parsed.error,
        },
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

#[async_trait]
impl ImageGenerator for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        log::info!("🎨 Generating image with model: {}", self.model_id());
        log::debug!("Generation prompt: {}", prompt);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&GenerationPayload::new(prompt))
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
        let content_type = media_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        let body = response
            .bytes()
            .await
            .map_err(|e| MintError::upstream(SERVICE, format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(MintError::upstream(
                SERVICE,
                format!("{}: {}", status, error_detail(&body)),
            ));
        }

        // A 200 with a JSON body is still an error report, not an image.
        if content_type == "application/json" {
            return Err(MintError::upstream(SERVICE, error_detail(&body)));
        }

        if body.is_empty() {
            return Err(MintError::upstream(SERVICE, "no image data returned"));
        }

        log::debug!("Received {} bytes of {}", body.len(), content_type);
        Ok(GeneratedImage::new(body.to_vec(), content_type))
    }
}
