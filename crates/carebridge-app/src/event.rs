//! Application input events.
//!
//! This module defines [`AppEvent`], the inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from three sources:
//! - User interactions (keys, resize) and periodic ticks, from the driver.
//! - Results of I/O the runtime performed on the app's behalf (credential
//!   fetch, connect, publish).
//! - Media room notifications (data packets, participant changes, link loss).

use carebridge_client::SessionCredential;
use carebridge_core::Participant;

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// The credential fetch succeeded.
    CredentialFetched(SessionCredential),

    /// The credential fetch failed.
    CredentialFailed {
        /// Error description, for logs.
        reason: String,
    },

    /// The media room connected.
    Connected {
        /// Identity the server assigned to the local participant.
        identity: Option<String>,
    },

    /// The media room failed to connect.
    ConnectFailed {
        /// Error description, for logs.
        reason: String,
    },

    /// Data-channel payload arrived.
    DataReceived {
        /// Raw payload bytes.
        payload: Vec<u8>,
        /// Transport-level sender identity, if known.
        from: Option<String>,
    },

    /// Remote participants or their publications changed.
    ParticipantsChanged(Vec<Participant>),

    /// The media link dropped.
    LinkLost {
        /// Error description, for logs.
        reason: String,
    },

    /// A chat message was published.
    MessageSent {
        /// Trimmed text that went out.
        text: String,
    },

    /// Publishing a chat message failed.
    MessageSendFailed {
        /// Error description, for logs.
        reason: String,
    },
}
