//! Error types surfaced by fixture generation.

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the crate
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Everything that can go wrong while describing or generating a fixture
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FixtureError {
    /// The type cannot be described, or has no strategy to draw from
    #[error("Unsupported type: {type_name}")]
    UnsupportedType { type_name: String },

    /// An override or declared domain does not fit the target
    #[error("Configuration error: {message}{}", field_suffix(.field))]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Nested generation went deeper than the configured limit
    #[error("Recursion limit of {limit} exceeded while generating {type_name}")]
    RecursionLimit { type_name: String, limit: usize },

    /// A required field has no domain and nothing resolved a value for it
    #[error("Validation error: no value source for field `{field}` of {type_name}")]
    Validation { type_name: String, field: String },

    /// Candidates kept being rejected until the attempt budget ran out
    #[error("Generation exhausted for {target} after {attempts} attempts")]
    GenerationExhausted { target: String, attempts: usize },
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|name| format!(" (field: {})", name))
        .unwrap_or_default()
}

impl FixtureError {
    /// Create an unsupported type error
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Create a configuration error that is not tied to a field
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error for a specific field
    pub fn configuration_for_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a validation error for a field without any value source
    pub fn validation(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Create a generation exhausted error
    pub fn exhausted(target: impl Into<String>, attempts: usize) -> Self {
        Self::GenerationExhausted {
            target: target.into(),
            attempts,
        }
    }

    /// Attach a field name to a configuration error that has none yet
    pub(crate) fn in_field(self, name: &str) -> Self {
        match self {
            Self::Configuration {
                message,
                field: None,
            } => Self::Configuration {
                message,
                field: Some(name.to_string()),
            },
            other => other,
        }
    }
}

impl From<ConfigError> for FixtureError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}
