use thiserror::Error;

/// Errors produced by the screen, the bridge and the content surfaces
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The content engine could not be started
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Could not attach to an already running content engine
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Loading or moving through history failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Tab creation or lookup failed
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// A script run inside the embedded document failed
    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    /// The surface variant has no way to perform the operation
    #[error("{operation} is not supported by the {surface} surface")]
    Unsupported {
        surface: &'static str,
        operation: &'static str,
    },

    /// The configured trusted origin is not a concrete origin
    #[error("Invalid trusted origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// The startup address could not be decoded
    #[error("Invalid deep link: {0}")]
    InvalidDeepLink(String),

    /// An operation needed a mounted content surface
    #[error("No content surface is mounted")]
    NotMounted,

    /// Handing the address to the platform failed
    #[error("Failed to open externally: {0}")]
    ExternalOpenFailed(String),

    /// Encoding a bridge message failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, BridgeError>;
