//! Error types for the refresh-credential lifecycle.

use std::fmt;

/// Errors raised while issuing or rotating credentials.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request is malformed (for example an unparseable user id).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// No refresh credential was presented.
    #[error("Missing refresh credential")]
    MissingCredential,

    /// The presented secret matches no active record.
    ///
    /// Unknown, wrong and revoked secrets are indistinguishable.
    #[error("Invalid refresh credential")]
    InvalidCredential,

    /// The presented secret matched a record older than the refresh lifetime.
    #[error("Refresh credential expired")]
    ExpiredCredential,

    /// Another request revoked the matched record first.
    #[error("Refresh credential already rotated")]
    ConcurrentRotationLost,

    /// Signing, secret generation, hashing or persistence of a new pair failed.
    #[error("Issuance failed: {message}")]
    IssuanceFailed {
        /// Description of the failure.
        message: String,
    },

    /// An error occurred while storing or retrieving records.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `IssuanceFailed` error.
    #[must_use]
    pub fn issuance_failed(message: impl Into<String>) -> Self {
        Self::IssuanceFailed {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. }) || self.is_credential_error()
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::IssuanceFailed { .. }
                | Self::Storage { .. }
                | Self::Configuration { .. }
                | Self::Internal { .. }
        )
    }

    /// Returns `true` if the presented refresh credential was rejected.
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::InvalidCredential
                | Self::ExpiredCredential
                | Self::ConcurrentRotationLost
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::MissingCredential
            | Self::InvalidCredential
            | Self::ExpiredCredential
            | Self::ConcurrentRotationLost => ErrorCategory::Credential,
            Self::IssuanceFailed { .. } | Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request validation errors.
    Validation,
    /// Rejected refresh credentials.
    Credential,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Credential => write!(f, "credential"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
