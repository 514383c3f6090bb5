//! Error types for sift3d

use std::collections::TryReserveError;

use thiserror::Error;

/// Main error type for sift3d operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Image decode error: {0}")]
    Image(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_error_conversion() {
        let mut buf: Vec<u64> = Vec::new();
        let err = buf.try_reserve_exact(usize::MAX).unwrap_err();
        let err: Error = err.into();
        assert!(matches!(err, Error::Allocation(_)));
        assert!(err.to_string().starts_with("Allocation failed"));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: missing");
    }
}
