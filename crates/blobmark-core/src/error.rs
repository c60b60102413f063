use thiserror::Error;

/// Failures inside blobmark.
///
/// None of these ever reach the page: hosts log and suppress them, since
/// line selection only decorates content that must keep rendering.
#[derive(Debug, Error)]
pub enum BlobmarkError {
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
    #[error("failed to parse config JSON: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("theme storage {operation} failed: {reason}")]
    Storage {
        operation: &'static str,
        reason: String,
    },
    #[error("host {operation} failed: {reason}")]
    Host {
        operation: &'static str,
        reason: String,
    },
}

impl BlobmarkError {
    pub fn host(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Host {
            operation,
            reason: reason.into(),
        }
    }

    pub fn storage(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BlobmarkError>;
