//! Error types for the resilience layer

/// Errors that can occur in the resilience layer
#[derive(Debug, thiserror::Error)]
pub enum ResilienceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Activation(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("{0} is already installed")]
    AlreadyInstalled(&'static str),
}

/// Result type alias for resilience operations
pub type Result<T> = std::result::Result<T, ResilienceError>;
