//! Unified error types for the case and billing core.
//!
//! Every failure carries a stable machine-readable [`ErrorKind`] plus a
//! human-readable message. Internal failures (database, I/O, configuration)
//! are collapsed into [`ErrorKind::Internal`] when rendered for callers so
//! that no storage detail or secret material leaks outside development.

use crate::config::Environment;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// All errors produced by the library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read, parsed, or validated
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A referenced case or payment does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up (e.g. "Case")
        entity: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// The actor's role or relationship does not permit the operation
    #[error("{message}")]
    Forbidden {
        /// Why access was refused
        message: String,
    },

    /// A state precondition was violated by a concurrent or duplicate action
    #[error("{message}")]
    Conflict {
        /// Which precondition failed
        message: String,
    },

    /// Malformed input (unknown status, bad signature, empty title, ...)
    #[error("{message}")]
    InvalidArgument {
        /// What was wrong with the input
        message: String,
    },

    /// A money amount that is zero, negative, or too large
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// The payment gateway is unreachable or not configured
    #[error("Payment gateway unavailable: {message}")]
    ServiceUnavailable {
        /// Reason reported by the adapter
        message: String,
    },

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

/// Stable classification of an [`Error`], independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced record does not exist
    NotFound,
    /// Actor is not authorized
    Forbidden,
    /// State precondition violated
    Conflict,
    /// Malformed input
    InvalidArgument,
    /// External gateway unavailable or misconfigured
    ServiceUnavailable,
    /// Anything the caller cannot act upon
    Internal,
}

impl ErrorKind {
    /// Machine-readable code for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::InvalidArgument => "invalid_argument",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Internal => "internal",
        }
    }
}

/// Caller-facing rendering of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable error code
    pub kind: ErrorKind,
    /// Human-readable message, safe to show to end users
    pub message: String,
    /// Full internal description, only populated in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Error {
    /// Returns the stable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidArgument { .. } | Self::InvalidAmount { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::EnvVar(_) => ErrorKind::Internal,
        }
    }

    /// Renders the error for a caller, hiding internals outside development.
    #[must_use]
    pub fn to_body(&self, environment: Environment) -> ErrorBody {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::Internal => "Internal Server Error".to_string(),
            _ => self.to_string(),
        };
        let detail = match environment {
            Environment::Development => Some(format!("{self:?}")),
            Environment::Production => None,
        };

        ErrorBody {
            kind,
            message,
            detail,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(Error::not_found("Case", 7).kind().as_str(), "not_found");
        assert_eq!(Error::forbidden("no").kind().as_str(), "forbidden");
        assert_eq!(Error::conflict("no").kind().as_str(), "conflict");
        assert_eq!(Error::invalid("no").kind().as_str(), "invalid_argument");
        assert_eq!(
            Error::InvalidAmount {
                amount: Decimal::NEGATIVE_ONE
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            Error::unavailable("down").kind().as_str(),
            "service_unavailable"
        );
        assert_eq!(
            Error::Config {
                message: "bad".to_string()
            }
            .kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_internal_errors_are_masked_in_production() {
        let error = Error::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));

        let body = error.to_body(Environment::Production);
        assert_eq!(body.kind, ErrorKind::Internal);
        assert_eq!(body.message, "Internal Server Error");
        assert!(body.detail.is_none());

        let body = error.to_body(Environment::Development);
        assert!(body.detail.unwrap().contains("disk on fire"));
    }

    #[test]
    fn test_domain_errors_keep_their_message() {
        let body = Error::conflict("Only pending cases can be accepted")
            .to_body(Environment::Production);
        assert_eq!(body.kind, ErrorKind::Conflict);
        assert_eq!(body.message, "Only pending cases can be accepted");
    }
}
