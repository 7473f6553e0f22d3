//! Protocol error types.
//!
//! Errors raised while decoding or encoding data-channel envelopes. Decode
//! errors are recovered by the receiver (the payload is dropped), so variants
//! carry enough context for a useful log line and nothing more.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced by the data-channel codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload bytes are not valid UTF-8.
    #[error("payload is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the longest valid UTF-8 prefix.
        valid_up_to: usize,
    },

    /// Payload is not parseable JSON.
    #[error("payload is not valid JSON: {0}")]
    Json(String),

    /// Payload is JSON but has no string `type` discriminator.
    #[error("envelope has no string `type` field")]
    MissingType,

    /// Envelope says `chat` but its fields do not match the chat schema.
    #[error("malformed chat envelope: {0}")]
    MalformedChat(String),

    /// Envelope could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

impl ProtocolError {
    /// Returns true if the payload was well-formed JSON that this client does
    /// not understand, as opposed to corrupt bytes.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::MissingType | Self::MalformedChat(_))
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_classification() {
        assert!(ProtocolError::MissingType.is_schema_mismatch());
        assert!(ProtocolError::MalformedChat("text".into()).is_schema_mismatch());
        assert!(!ProtocolError::InvalidUtf8 { valid_up_to: 3 }.is_schema_mismatch());
        assert!(!ProtocolError::Json("eof".into()).is_schema_mismatch());
    }
}
