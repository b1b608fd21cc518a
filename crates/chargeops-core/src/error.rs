//! Error types for the `ChargeOps` core

use std::{error::Error as StdError, fmt};

/// Errors raised by core parsing, configuration and logging setup
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be loaded or is inconsistent
    Configuration {
        /// What is wrong
        message: String,
        /// Underlying loader error
        source: Option<config::ConfigError>,
    },

    /// A user-supplied value was rejected
    Validation {
        /// Field that failed
        field: String,
        /// Message suitable for display
        message: String,
    },

    /// The global tracing subscriber could not be installed
    Logging(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error for a single field
    #[must_use]
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error without an underlying cause
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Field name of a validation error
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message, .. } => write!(f, "Configuration error: {message}"),
            Self::Validation { message, .. } => f.write_str(message),
            Self::Logging(msg) => write!(f, "Failed to initialize logging: {msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Configuration {
                source: Some(err), ..
            } => Some(err),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
