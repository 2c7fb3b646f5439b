use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading or decrypting a source's store.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("store not found: {0}")]
    MissingStore(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// Failure while serializing or persisting a source.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("empty filename")]
    EmptyFilename,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encode error: {0}")]
    Csv(#[from] csv::Error),
}
