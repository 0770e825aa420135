//! Error types for wardend

use thiserror::Error;

/// Shared error type for wardend utility operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WardenError {
    #[error("Invalid hour window '{value}': {message}")]
    InvalidHourWindow { value: String, message: String },

    #[error("Invalid duration '{value}': {message}")]
    InvalidDuration { value: String, message: String },

    #[error("Invalid rule spec '{value}': {message}")]
    InvalidRuleSpec { value: String, message: String },
}

impl WardenError {
    pub fn hour_window(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHourWindow {
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn duration(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn rule_spec(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRuleSpec {
            value: value.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WardenError>;
