use thiserror::Error;

/// Failures crossing a port boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export disabled: {0}")]
    ExportDisabled(&'static str),
}

/// What a user sees when an extraction does not go through. The underlying
/// cause is logged, never shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Please enter some text before extracting!")]
    EmptyInput,

    #[error("Unable to extract phrases. Please try again.")]
    Unavailable,
}
