//! Media room naming.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every session room.
pub const SESSION_ROOM_PREFIX: &str = "session-";

/// Name of the media room a session's participants join.
///
/// Derived deterministically from the session ID so both sides of a session
/// request credentials for the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// Room for the given session: `session-<id>`.
    pub fn for_session(session_id: &str) -> Self {
        Self(format!("{SESSION_ROOM_PREFIX}{session_id}"))
    }

    /// Session ID this room was derived from. `None` for foreign rooms.
    pub fn session_id(&self) -> Option<&str> {
        self.0.strip_prefix(SESSION_ROOM_PREFIX)
    }

    /// Room name as sent to the backend.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
