//! In-process media room.
//!
//! `LoopbackRoom` stands in for a real media server: connecting validates the
//! credential's URL scheme, a single echo peer joins with its camera on, and
//! every chat message published is answered by the peer with the same text.
//! A [`LoopbackPeer`] handle lets callers inject messages or drop the link.

use carebridge_core::{Participant, TrackKind};
use carebridge_proto::{ChatPayload, DataMessage, DeliveryMode, ProtocolError};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    credential::SessionCredential,
    room::{MediaRoom, RoomEvent},
};

/// Identity of the echo peer.
pub const ECHO_PEER_IDENTITY: &str = "echo";

/// Loopback room errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoopbackError {
    /// Server URL is not a `ws://` or `wss://` URL.
    #[error("unsupported media server URL: {0}")]
    InvalidUrl(String),

    /// Operation requires a connected room.
    #[error("room is not connected")]
    NotConnected,

    /// `connect` called twice.
    #[error("room is already connected")]
    AlreadyConnected,

    /// Echo reply could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Handle for injecting events into a [`LoopbackRoom`] from outside.
#[derive(Debug, Clone)]
pub struct LoopbackPeer {
    events: mpsc::UnboundedSender<RoomEvent>,
}

impl LoopbackPeer {
    /// Deliver a chat message from the echo peer.
    pub fn send_chat(&self, text: &str) -> Result<(), LoopbackError> {
        let payload = ChatPayload::new(ECHO_PEER_IDENTITY, text).encode()?;
        self.send_raw(payload);
        Ok(())
    }

    /// Deliver arbitrary bytes from the echo peer.
    pub fn send_raw(&self, payload: Vec<u8>) {
        let _ = self
            .events
            .send(RoomEvent::Data { payload, from: Some(ECHO_PEER_IDENTITY.to_string()) });
    }

    /// Simulate the server dropping the link.
    pub fn drop_link(&self, reason: &str) {
        let _ = self.events.send(RoomEvent::Disconnected { reason: reason.to_string() });
    }
}

/// In-process room with one echo peer.
#[derive(Debug)]
pub struct LoopbackRoom {
    local_identity: String,
    connected: bool,
    closed: bool,
    handler_registered: bool,
    camera: bool,
    microphone: bool,
    events_tx: mpsc::UnboundedSender<RoomEvent>,
    events_rx: mpsc::UnboundedReceiver<RoomEvent>,
}

impl LoopbackRoom {
    /// Room in which the local participant will be known as `local_identity`.
    pub fn new(local_identity: impl Into<String>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            local_identity: local_identity.into(),
            connected: false,
            closed: false,
            handler_registered: false,
            camera: false,
            microphone: false,
            events_tx,
            events_rx,
        }
    }

    /// Handle for injecting peer events.
    pub fn peer(&self) -> LoopbackPeer {
        LoopbackPeer { events: self.events_tx.clone() }
    }

    /// Whether the local camera is published.
    pub fn camera_enabled(&self) -> bool {
        self.camera
    }

    /// Whether the local microphone is published.
    pub fn microphone_enabled(&self) -> bool {
        self.microphone
    }

    /// Whether a data handler is registered.
    pub fn has_data_handler(&self) -> bool {
        self.handler_registered
    }

    fn echo_peer() -> Participant {
        Participant::new(ECHO_PEER_IDENTITY)
            .with_track("TR_echo_mic", TrackKind::Audio, true)
            .with_track("TR_echo_cam", TrackKind::Video, true)
    }

    fn require_connected(&self) -> Result<(), LoopbackError> {
        if self.connected { Ok(()) } else { Err(LoopbackError::NotConnected) }
    }
}

impl MediaRoom for LoopbackRoom {
    type Error = LoopbackError;

    async fn connect(&mut self, credential: SessionCredential) -> Result<(), LoopbackError> {
        if self.connected || self.closed {
            return Err(LoopbackError::AlreadyConnected);
        }

        let url = credential.server_url();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(LoopbackError::InvalidUrl(url.to_string()));
        }

        self.connected = true;
        tracing::info!(server_url = %url, identity = %self.local_identity, "loopback room connected");

        let _ = self.events_tx.send(RoomEvent::ParticipantsChanged(vec![Self::echo_peer()]));
        Ok(())
    }

    fn local_identity(&self) -> Option<String> {
        self.connected.then(|| self.local_identity.clone())
    }

    async fn set_camera_enabled(&mut self, enabled: bool) -> Result<(), LoopbackError> {
        self.require_connected()?;
        self.camera = enabled;
        Ok(())
    }

    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<(), LoopbackError> {
        self.require_connected()?;
        self.microphone = enabled;
        Ok(())
    }

    async fn publish_data(
        &mut self,
        payload: Vec<u8>,
        _mode: DeliveryMode,
    ) -> Result<(), LoopbackError> {
        self.require_connected()?;

        // The peer only answers chat it can read.
        if let Ok(DataMessage::Chat(chat)) = DataMessage::decode(&payload) {
            self.peer().send_chat(&chat.text)?;
        }
        Ok(())
    }

    fn register_data_handler(&mut self) {
        self.handler_registered = true;
    }

    fn unregister_data_handler(&mut self) {
        self.handler_registered = false;
    }

    async fn next_event(&mut self) -> Option<RoomEvent> {
        loop {
            if self.closed {
                return None;
            }

            let event = self.events_rx.recv().await?;
            match event {
                RoomEvent::Data { .. } if !self.handler_registered => {
                    tracing::debug!("dropping data packet, no handler registered");
                },
                RoomEvent::Disconnected { .. } => {
                    self.connected = false;
                    self.closed = true;
                    return Some(event);
                },
                _ => return Some(event),
            }
        }
    }

    async fn disconnect(&mut self) {
        if self.connected {
            tracing::info!("loopback room disconnected");
        }
        self.connected = false;
        self.closed = true;
        self.camera = false;
        self.microphone = false;
    }
}
