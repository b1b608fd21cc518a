//! Error types for the console client

use chargeops_core::RecordId;
use thiserror::Error;

/// Result type alias for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the backend services
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network failure, timeout or unreadable body
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Server-provided message, or a generic line
        message: String,
    },

    /// The backend rejected the session token
    #[error("Session expired or invalid, please log in again")]
    Unauthorized,

    /// No session token is stored
    #[error("Not logged in")]
    MissingCredential,

    /// Token could not be decoded or carried no user id
    #[error("Invalid token: {reason}")]
    InvalidToken {
        /// What was wrong with the token
        reason: String,
    },

    /// Logged-in user may not use the console
    #[error("Access denied: only admin or operator can log in (role: {role})")]
    AccessDenied {
        /// Role the backend reported
        role: String,
    },

    /// Record rejected before dispatch
    #[error("{message}")]
    Validation {
        /// Field at fault
        field: String,
        /// Human-readable reason
        message: String,
    },

    /// A command for this charger is still outstanding
    #[error("A command for charger {id} is already in progress")]
    CommandInFlight {
        /// Target charger
        id: RecordId,
    },

    /// Record is not in the screen's collection
    #[error("Record {id} not found")]
    NotFound {
        /// Requested id
        id: RecordId,
    },

    /// Body could not be (de)serialized
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Error from the core crate
    #[error(transparent)]
    Core(chargeops_core::Error),

    /// Failure persisting the session token
    #[error("Credential storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// Create a status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid token error
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Create an access denied error
    pub fn access_denied(role: impl Into<String>) -> Self {
        Self::AccessDenied { role: role.into() }
    }

    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(id: impl Into<RecordId>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Text suitable for a toast
    ///
    /// Server text is shown verbatim when the backend sent one.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Network error".to_string(),
            Self::Status { message, .. } | Self::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Check if the failure is likely temporary
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the operator must log in again
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::MissingCredential | Self::InvalidToken { .. }
        )
    }
}

impl From<chargeops_core::Error> for ClientError {
    fn from(err: chargeops_core::Error) -> Self {
        match err {
            chargeops_core::Error::Validation { field, message } => {
                Self::Validation { field, message }
            }
            other => Self::Core(other),
        }
    }
}
