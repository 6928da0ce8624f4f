use serde::{Deserialize, Serialize};

/// Handle to pinned image + metadata, produced by the storage step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageReceipt {
    pub token_uri: String,
    pub cid: String,
}

impl StorageReceipt {
    pub fn new(gateway: &str, cid: impl Into<String>) -> Self {
        let cid = cid.into();
        Self {
            token_uri: token_uri(gateway, &cid),
            cid,
        }
    }
}

/// `https://<gateway>/ipfs/<cid>/metadata.json`
pub fn token_uri(gateway: &str, cid: &str) -> String {
    let host = gateway
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{}/ipfs/{}/metadata.json", host, cid)
}

/// The `meta` part of a store request. The image slot is filled in by the
/// pinning service with an `ipfs://` link to the uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoreResponse {
    pub ok: bool,
    pub value: Option<StoreValue>,
    pub error: Option<StoreErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct StoreValue {
    pub ipnft: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoreErrorBody {
    pub name: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_uri() {
        assert_eq!(
            token_uri("ipfs.io", "bafyreib"),
            "https://ipfs.io/ipfs/bafyreib/metadata.json"
        );
        assert_eq!(
            token_uri("https://nftstorage.link/", "bafyreib"),
            "https://nftstorage.link/ipfs/bafyreib/metadata.json"
        );
    }

    #[test]
    fn test_store_response_parsing() {
        let body = r#"{"ok":true,"value":{"ipnft":"bafyreiabc","url":"ipfs://bafyreiabc/metadata.json","data":{}}}"#;
        let parsed: StoreResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.ok);
        assert_eq!(parsed.value.unwrap().ipnft, "bafyreiabc");

        let body = r#"{"ok":false,"error":{"name":"HTTPError","message":"Unauthorized"}}"#;
        let parsed: StoreResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert_eq!(parsed.error.unwrap().message, "Unauthorized");
    }
}
