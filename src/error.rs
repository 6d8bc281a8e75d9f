//! Error handling module for TechServe
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Module-level errors (`SelectionError`, `NavigationError`, `ServiceError`,
//! `SubmissionError`) convert into [`TechServeError`] at the crate boundary.

use thiserror::Error;

/// Main error type for TechServe
#[derive(Error, Debug)]
pub enum TechServeError {
    /// IO errors (config files, order drafts)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Customer field validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Selection consistency errors (duplicate OS, missing version)
    #[error("Selection error: {0}")]
    Selection(String),

    /// Wizard step transition errors
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Transport or backend errors
    #[error("Service error: {0}")]
    Service(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for TechServe operations
pub type Result<T> = std::result::Result<T, TechServeError>;

// Convenient error constructors
impl TechServeError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a selection error
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Create a navigation error
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    /// Create a service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Returns true for errors the user can fix and retry without losing input.
    ///
    /// Every error the wizard produces is recoverable; only configuration and
    /// IO failures at startup are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Config(_))
    }
}
