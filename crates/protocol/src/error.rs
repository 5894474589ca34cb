//! Protocol error types
//!
//! Errors that can occur when framing, encoding or decoding records.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Record could not be encoded
    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Record payload could not be decoded
    #[error("failed to decode record: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// Encoded record does not fit the length field
    #[error("record too large: {size} bytes exceeds maximum {max}")]
    RecordTooLarge { size: usize, max: usize },

    /// Decoding did not consume the whole payload
    #[error("trailing bytes after record: consumed {consumed} of {len}")]
    TrailingBytes { consumed: usize, len: usize },

    /// Input ended inside a frame
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
}

impl ProtocolError {
    /// Create a record too large error
    #[inline]
    pub fn too_large(size: usize) -> Self {
        Self::RecordTooLarge {
            size,
            max: crate::MAX_RECORD_SIZE,
        }
    }

    /// Create a truncated frame error
    #[inline]
    pub fn truncated(expected: usize, actual: usize) -> Self {
        Self::Truncated { expected, actual }
    }

    /// Check if the record itself was at fault (as opposed to the stream)
    pub fn is_record_error(&self) -> bool {
        matches!(self, Self::Encode(_) | Self::RecordTooLarge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        let err = ProtocolError::too_large(10);
        assert!(err.to_string().contains("record too large"));
        assert!(err.to_string().contains("10 bytes"));
        assert!(err.is_record_error());
    }

    #[test]
    fn test_truncated_message() {
        let err = ProtocolError::truncated(8, 3);
        assert!(err.to_string().contains("expected 8"));
        assert!(err.to_string().contains("got 3"));
        assert!(!err.is_record_error());
    }

    #[test]
    fn test_trailing_bytes_message() {
        let err = ProtocolError::TrailingBytes {
            consumed: 2,
            len: 5,
        };
        assert!(err.to_string().contains("consumed 2 of 5"));
    }
}
