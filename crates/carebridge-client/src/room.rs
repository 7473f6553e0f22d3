//! Media room abstraction.
//!
//! The [`MediaRoom`] trait is the seam between the session screen and the
//! media SDK. Codec negotiation, signalling and track transport live behind
//! it. Implementations:
//!
//! - [`LiveKitRoom`](crate::LiveKitRoom): a LiveKit server
//! - [`LoopbackRoom`](crate::LoopbackRoom): in-process room with an echo peer
//! - the harness's `SimRoom`: scriptable failures and call counters

use std::future::Future;

use carebridge_core::Participant;
use carebridge_proto::DeliveryMode;

use crate::credential::SessionCredential;

/// Event surfaced by a connected room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// Payload received on the data channel. Only delivered while a data
    /// handler is registered.
    Data {
        /// Raw payload bytes.
        payload: Vec<u8>,
        /// Identity of the sending participant, if known.
        from: Option<String>,
    },

    /// Remote participant list or their publications changed. Carries the
    /// full current list in room order.
    ParticipantsChanged(Vec<Participant>),

    /// The link dropped without a local disconnect.
    Disconnected {
        /// Human-readable cause.
        reason: String,
    },
}

/// Connection to a media room.
pub trait MediaRoom: Send {
    /// Room-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Join the room, consuming the credential.
    fn connect(
        &mut self,
        credential: SessionCredential,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Identity the server assigned to the local participant. `None` before
    /// connect.
    fn local_identity(&self) -> Option<String>;

    /// Publish or mute the local camera track.
    fn set_camera_enabled(
        &mut self,
        enabled: bool,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Publish or mute the local microphone track.
    fn set_microphone_enabled(
        &mut self,
        enabled: bool,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a payload to every participant.
    fn publish_data(
        &mut self,
        payload: Vec<u8>,
        mode: DeliveryMode,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Start delivering [`RoomEvent::Data`].
    fn register_data_handler(&mut self);

    /// Stop delivering [`RoomEvent::Data`].
    fn unregister_data_handler(&mut self);

    /// Wait for the next room event. `None` once the room is closed.
    ///
    /// Must be cancel-safe: it is polled inside `tokio::select!`.
    fn next_event(&mut self) -> impl Future<Output = Option<RoomEvent>> + Send;

    /// Leave the room and release the link.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;
}
