use crate::error::{MintError, Result};
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// User input for one mint sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub name: String,
    pub description: String,
}

impl MintRequest {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Whitespace-only fields count as empty.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MintError::Validation("name must not be empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(MintError::Validation(
                "description must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintResult {
    pub transaction_hash: B256,
    pub confirmed: bool,
    pub token_uri: String,
    pub account: Address,
    pub block_number: Option<u64>,
}
