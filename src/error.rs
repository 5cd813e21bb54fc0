use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketFilterError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization failed: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure to retrieve one source document. Produced at the fetch boundary
/// and carried as a value; it never escapes a run as an `Err`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("malformed body: {0}")]
    Body(String),

    #[error("cannot read {path}: {message}")]
    File { path: String, message: String },
}

impl FetchError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Status { .. } => "status",
            FetchError::Transport(_) => "transport",
            FetchError::Body(_) => "body",
            FetchError::File { .. } => "file",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketFilterError>;
