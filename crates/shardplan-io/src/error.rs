use thiserror::Error;

/// Result type local to shardplan-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid uri '{0}'")]
    Uri(String),

    #[error("no file input registered for scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("unsupported compression: {0}")]
    UnsupportedCompression(String),

    #[error("invalid reader configuration: {0}")]
    Config(String),
}
