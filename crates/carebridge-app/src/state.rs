//! Observable screen state.

use carebridge_core::ConnectionState;

/// Alert shown when no credential could be obtained.
pub const JOIN_FAILED_ALERT: &str = "Failed to join session";

/// Alert shown when the media room refused the connection.
pub const CONNECT_FAILED_ALERT: &str = "Failed to connect";

/// Alert shown when a chat message could not be published.
pub const SEND_FAILED_ALERT: &str = "Could not send message";

/// Coarse progress of the session screen, for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not mounted yet.
    Idle,
    /// Waiting for the media credential.
    Joining,
    /// Credential in hand, media link coming up.
    Connecting,
    /// In the call.
    Live,
    /// Session over; the screen is leaving.
    Ended,
}

impl Phase {
    /// Derive the phase from the screen flags and the connection state.
    pub(crate) fn derive(mounted: bool, exited: bool, connection: ConnectionState) -> Self {
        if exited || connection.is_terminal() {
            return Self::Ended;
        }
        match connection {
            ConnectionState::Idle if mounted => Self::Joining,
            ConnectionState::Idle => Self::Idle,
            ConnectionState::Connecting => Self::Connecting,
            ConnectionState::Connected => Self::Live,
            ConnectionState::Failed | ConnectionState::Disconnected => Self::Ended,
        }
    }

    /// Short label for the status line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Joining => "joining",
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Ended => "ended",
        }
    }
}
