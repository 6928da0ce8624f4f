use super::mint::MintResult;
use crate::error::{ErrorKind, MintError};
use serde::Serialize;

/// Progress of the current mint sequence, as observed by the presentation layer.
///
/// The sequence only ever moves forward:
/// `Idle -> Validating -> Generating -> Uploading -> Minting -> Confirmed`.
/// `Failed` can be entered from any active state and is absorbing; the only
/// way out of `Confirmed` or `Failed` is back to `Idle` when the user starts a
/// fresh attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MintState {
    Idle,
    Validating,
    Generating,
    Uploading,
    Minting { token_uri: String },
    Confirmed(MintResult),
    Failed { kind: ErrorKind, reason: String },
}

impl Default for MintState {
    fn default() -> Self {
        MintState::Idle
    }
}

impl MintState {
    pub fn failed(error: &MintError) -> Self {
        MintState::Failed {
            kind: error.kind(),
            reason: error.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MintState::Idle => "idle",
            MintState::Validating => "validating",
            MintState::Generating => "generating",
            MintState::Uploading => "uploading",
            MintState::Minting { .. } => "minting",
            MintState::Confirmed(_) => "confirmed",
            MintState::Failed { .. } => "failed",
        }
    }

    /// A sequence is running.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            MintState::Validating
                | MintState::Generating
                | MintState::Uploading
                | MintState::Minting { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MintState::Confirmed(_) | MintState::Failed { .. })
    }

    pub fn can_transition_to(&self, next: &MintState) -> bool {
        use MintState::*;
        match (self, next) {
            (Idle, Validating)
            | (Validating, Generating)
            | (Generating, Uploading)
            | (Uploading, Minting { .. })
            | (Minting { .. }, Confirmed(_)) => true,
            (current, Failed { .. }) => current.is_active(),
            (current, Idle) => current.is_terminal(),
            _ => false,
        }
    }
}
