//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use carebridge_client::SessionCredential;

/// Actions produced by the App state machine.
#[derive(Debug)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Request a fresh media credential for the session.
    FetchCredential {
        /// Session to join.
        session_id: String,
    },

    /// Join the media room.
    Connect {
        /// Single-use credential, consumed by the room.
        credential: SessionCredential,
    },

    /// Publish or mute the local camera.
    SetCamera(bool),

    /// Publish or mute the local microphone.
    SetMicrophone(bool),

    /// Start routing data-channel payloads to the app.
    RegisterDataHandler,

    /// Stop routing data-channel payloads.
    UnregisterDataHandler,

    /// Publish a chat envelope reliably.
    PublishChat {
        /// Trimmed text, echoed locally once the publish succeeds.
        text: String,
        /// Encoded envelope.
        payload: Vec<u8>,
    },

    /// Leave the media room.
    Disconnect,

    /// Show a blocking notice to the user.
    Alert(String),

    /// Leave the session screen.
    Exit,
}
