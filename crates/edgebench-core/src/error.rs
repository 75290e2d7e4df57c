//! Error types for edgebench-core operations.
//!
//! # Overview
//!
//! The [`CoreError`] enum covers failures that can occur while:
//! - Decoding an input file into a [`crate::HostImage`]
//! - Encoding a filtered buffer back to disk
//! - Wrapping raw pixel buffers with mismatched sizes
//!
//! # Usage
//!
//! ```rust
//! use edgebench_core::{CoreError, CoreResult, HostImage};
//!
//! fn wrap(data: Vec<u8>) -> CoreResult<HostImage> {
//!     HostImage::from_rgba8(2, 2, data)
//! }
//!
//! assert!(matches!(wrap(vec![0; 3]), Err(CoreError::BufferSizeMismatch { .. })));
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`CoreError`] as the error type.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors produced by host image handling.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The codec could not decode the input file.
    #[error("failed to decode {path}: {source}")]
    Decode {
        /// File that failed to decode
        path: PathBuf,
        /// Underlying codec error
        #[source]
        source: ::image::ImageError,
    },

    /// The codec could not encode or write the output file.
    #[error("failed to encode {path}: {source}")]
    Encode {
        /// File that failed to encode
        path: PathBuf,
        /// Underlying codec error
        #[source]
        source: ::image::ImageError,
    },

    /// Pixel buffer length does not match `width * height * 4`.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Zero or overflowing dimensions.
    #[error("invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    /// I/O error outside the codec.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mentions_sizes() {
        let err = CoreError::BufferSizeMismatch { expected: 16, actual: 12 };
        let msg = err.to_string();
        assert!(msg.contains("16"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CoreError = io.into();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
