//! Error types for greenroom_core.

use thiserror::Error;

/// Result type alias using greenroom_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No metadata record exists for the given asset id.
    #[error("Asset not found: {id}")]
    AssetNotFound { id: String },

    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The catalog document failed to parse or serialize.
    #[error("Catalog document error: {source}")]
    Document {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create an AssetNotFound error.
    pub fn asset_not_found(id: impl Into<String>) -> Self {
        Error::AssetNotFound { id: id.into() }
    }

    /// Create an Io error for a blob key that is not a single path component.
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Error::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid blob key: {}", key.into()),
            ),
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_not_found_display() {
        let err = Error::asset_not_found("abc123.png");
        assert_eq!(err.to_string(), "Asset not found: abc123.png");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_invalid_key_is_io_kind() {
        let err = Error::invalid_key("../escape");
        match err {
            Error::Io { source } => {
                assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
            }
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
