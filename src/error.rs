//! Error taxonomy for the analyzer, store, and query engine.
//!
//! Kinds are surfaced to callers and transports; stack detail stays in the
//! message. Extractor parse failures are recovered per file and never reach
//! this level as hard errors.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A requested path does not exist or is not readable.
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// A source file could not be parsed. Non-fatal at build level; the
    /// driver logs and skips the file.
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// Two distinct entities produced the same stable ID within one build.
    /// Always fatal: it is evidence of a bug, never silently merged.
    #[error("identifier collision on {id}: {first} vs {second}")]
    IdentifierCollision {
        id: String,
        first: String,
        second: String,
    },

    /// The build was cancelled through its cancellation token.
    #[error("build cancelled")]
    Cancelled,

    /// A store write failed; any in-progress batch was rolled back. For the
    /// in-memory back-end `dirty` reports whether unflushed state remains.
    #[error("store write failed ({context}, dirty={dirty})")]
    StoreWrite { context: String, dirty: bool },

    /// A store read failed and the query surfaces the error.
    #[error("store read failed: {0}")]
    StoreRead(String),

    /// A transport request that names no known operation.
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// Stable kind tag used in transport error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            GraphError::InvalidPath(_) => "invalid-path",
            GraphError::Parse { .. } => "parse-error",
            GraphError::IdentifierCollision { .. } => "identifier-collision",
            GraphError::Cancelled => "cancelled",
            GraphError::StoreWrite { .. } => "store-write",
            GraphError::InvalidRequest(_) => "invalid-request",
            GraphError::Sqlite(_) | GraphError::StoreRead(_) => "store-read",
            GraphError::Io(_) => "io",
            GraphError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
