use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MintError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Upstream error from {service}: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
    #[error("Wallet error: {0}")]
    Wallet(String),
    #[error("Chain error: {0}")]
    Chain(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("A mint sequence is already in flight")]
    Busy,
    #[error("Mint sequence cancelled")]
    Cancelled,
}

/// Coarse classification reported to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Upstream,
    Wallet,
    Chain,
    Config,
    Cancelled,
    Busy,
}

impl MintError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        MintError::Upstream {
            service,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MintError::Validation(_) => ErrorKind::Validation,
            MintError::Upstream { .. } => ErrorKind::Upstream,
            MintError::Wallet(_) => ErrorKind::Wallet,
            MintError::Chain(_) => ErrorKind::Chain,
            MintError::Config(_) => ErrorKind::Config,
            // Undecodable upstream payloads surface as upstream failures.
            MintError::Serialization(_) => ErrorKind::Upstream,
            MintError::Busy => ErrorKind::Busy,
            MintError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<serde_json::Error> for MintError {
    fn from(e: serde_json::Error) -> Self {
        MintError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MintError>;
