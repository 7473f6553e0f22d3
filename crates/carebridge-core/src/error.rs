//! Error types for the session core.
//!
//! Strongly-typed errors for the connection state machine and for composing
//! outgoing chat. Incoming decode failures are not errors at this layer; the
//! transcript reports them as a [`crate::ReceiveOutcome`].

use carebridge_proto::ProtocolError;
use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors that can occur during session state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: String,
    },

    /// Outgoing envelope could not be encoded
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ConnectionError {
    /// Returns true if the error indicates a caller bug (an operation issued
    /// in a state that does not allow it) rather than bad data.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}
