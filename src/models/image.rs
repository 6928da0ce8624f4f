use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Body of a text-to-image inference call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationPayload {
    pub inputs: String,
    pub options: GenerationOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    pub wait_for_model: bool,
}

impl GenerationPayload {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            inputs: prompt.into(),
            options: GenerationOptions {
                wait_for_model: true,
            },
        }
    }
}

/// Error body the inference API returns instead of image bytes.
#[derive(Debug, Deserialize)]
pub struct InferenceErrorBody {
    pub error: String,
    pub estimated_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name used when the image is pinned, e.g. `image.png`.
    pub fn file_name(&self) -> String {
        let extension = match self.content_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpeg",
        };
        format!("image.{}", extension)
    }

    /// Inline `data:` URL for previews.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = serde_json::to_value(GenerationPayload::new("a red fox")).unwrap();
        assert_eq!(
            payload,
            serde_json::json!({
                "inputs": "a red fox",
                "options": { "wait_for_model": true }
            })
        );
    }

    #[test]
    fn test_data_url() {
        let image = GeneratedImage::new(vec![0xff, 0xd8, 0xff], "image/jpeg");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_file_name_follows_content_type() {
        assert_eq!(GeneratedImage::new(vec![1], "image/png").file_name(), "image.png");
        assert_eq!(
            GeneratedImage::new(vec![1], "application/octet-stream").file_name(),
            "image.jpeg"
        );
    }
}
