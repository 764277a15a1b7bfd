//! Error types for loading declaration files into a store.

use std::path::PathBuf;

/// Errors that can occur when loading declarations into an [`InMemoryStore`](crate::InMemoryStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The declarations file could not be read.
    #[error("failed to read declarations from {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The declarations could not be parsed.
    #[error("failed to parse declarations: {0}")]
    Parse(String),

    /// Two declarations share a qualified type name.
    #[error("type '{0}' is declared more than once")]
    DuplicateType(String),
}
