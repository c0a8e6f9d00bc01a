//! Error types for the herostory pipeline.
//!
//! Failures of individual generative calls are typed as [`GenerationError`]
//! so the stage ledger can record *which kind* of failure happened. Everything
//! that can abort a caller-facing operation is folded into [`HeroStoryError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The main error type for herostory operations.
#[derive(Debug, Error)]
pub enum HeroStoryError {
    /// A generation failure surfaced to the caller (validation, or a failure
    /// outside the stage ledger such as intake composition).
    #[error("{0}")]
    Generation(#[from] GenerationError),

    /// Configuration could not be loaded or is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The blob store failed.
    #[error("{0}")]
    Blob(#[from] BlobError),

    /// Document assembly failed.
    #[error("{0}")]
    Document(#[from] DocumentError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HeroStoryError {
    /// Returns true if this is a caller input validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Generation(GenerationError::Validation { .. }))
    }
}

/// The kind of failure recorded against a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The stage deadline elapsed.
    Timeout,
    /// Transport, auth or quota error from an external service.
    Provider,
    /// The service answered successfully but with an empty payload.
    NoContent,
    /// The caller supplied invalid input.
    Validation,
    /// The unit of work failed for any other reason.
    Work,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Provider => write!(f, "provider"),
            Self::NoContent => write!(f, "no_content"),
            Self::Validation => write!(f, "validation"),
            Self::Work => write!(f, "work"),
        }
    }
}

/// Failure of a single generative call or stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The deadline elapsed before the work finished.
    #[error("Deadline of {}ms exceeded", deadline.as_millis())]
    Timeout {
        /// The deadline that was exceeded.
        deadline: Duration,
    },

    /// Transport/auth/quota error, or a non-success HTTP status.
    #[error("Provider '{provider}' failed: {message}")]
    Provider {
        /// The provider name.
        provider: String,
        /// HTTP status, when the failure came with one.
        status: Option<u16>,
        /// Error detail (response body for status failures).
        message: String,
    },

    /// Successful response that carried no usable payload.
    #[error("Provider '{provider}' returned no content: {detail}")]
    NoContent {
        /// The provider name.
        provider: String,
        /// What was missing.
        detail: String,
    },

    /// Caller supplied empty or malformed input.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// The offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Any other failure raised by the unit of work.
    #[error("Work failed: {0}")]
    Work(String),
}

impl GenerationError {
    /// Creates a provider error without a status.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Creates a provider error for a non-success HTTP status.
    #[must_use]
    pub fn provider_status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: Some(status),
            message: format!("HTTP {status}: {}", body.into()),
        }
    }

    /// Creates a no-content error.
    #[must_use]
    pub fn no_content(provider: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::NoContent {
            provider: provider.into(),
            detail: detail.into(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a generic work error.
    #[must_use]
    pub fn work(message: impl Into<String>) -> Self {
        Self::Work(message.into())
    }

    /// Returns the failure kind.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Provider { .. } => FailureKind::Provider,
            Self::NoContent { .. } => FailureKind::NoContent,
            Self::Validation { .. } => FailureKind::Validation,
            Self::Work(_) => FailureKind::Work,
        }
    }

    /// Returns true for deadline failures.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<BlobError> for GenerationError {
    fn from(err: BlobError) -> Self {
        Self::Work(err.to_string())
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by a blob store.
#[derive(Debug, Error)]
pub enum BlobError {
    /// No blob exists under the reference.
    #[error("Blob not found: {reference}")]
    NotFound {
        /// The reference that was looked up.
        reference: String,
    },

    /// The reference is not one this store could have produced.
    #[error("Invalid blob reference: {reference}")]
    InvalidReference {
        /// The rejected reference.
        reference: String,
    },

    /// Underlying storage failed.
    #[error("Blob storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(reference: impl Into<String>) -> Self {
        Self::NotFound {
            reference: reference.into(),
        }
    }
}

/// Errors raised while assembling a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The PDF writer failed.
    #[error("PDF encoding failed: {0}")]
    Pdf(String),

    /// The payload is unusable (e.g. nothing to render).
    #[error("Invalid document payload: {0}")]
    InvalidPayload(String),

    /// The render worker failed or exceeded its deadline.
    #[error("Document render failed: {0}")]
    Render(String),
}

impl From<lopdf::Error> for DocumentError {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf(err.to_string())
    }
}
