//! Error types for the store and its decryption collaborator.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`Store`](crate::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid tenant id {0:?}: must be a single non-empty path segment")]
    InvalidTenant(String),

    #[error("key {key:?} resolves to unusable path segment {segment:?}")]
    InvalidKey { key: String, segment: String },

    #[error("store is in read-only mode")]
    ReadOnly,

    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decrypt into {}: {source}", .path.display())]
    Decrypt {
        path: PathBuf,
        #[source]
        source: DecryptError,
    },
}

impl StoreError {
    /// Wrap an I/O error, keeping `NotFound` distinguishable.
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound { path }
        } else {
            StoreError::Io { op, path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Errors surfaced by a [`CopyDecrypt`](crate::CopyDecrypt) primitive.
#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("ciphertext is shorter than its {0}-byte nonce header")]
    TruncatedHeader(usize),

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguished() {
        let err = StoreError::io(
            "open",
            "/tmp/missing",
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());

        let err = StoreError::io(
            "open",
            "/tmp/locked",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("failed to open /tmp/locked"));
    }

    #[test]
    fn test_decrypt_error_display() {
        let err = DecryptError::InvalidKeyLength {
            expected: 32,
            actual: 3,
        };
        assert_eq!(err.to_string(), "invalid key length: expected 32 bytes, got 3");
    }
}
