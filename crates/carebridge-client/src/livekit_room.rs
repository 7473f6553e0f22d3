//! LiveKit media room.
//!
//! [`LiveKitRoom`] joins a LiveKit server with the session credential and
//! translates the SDK's room events into [`RoomEvent`]s. Remote participants
//! are reported in the order they joined; their publications are sorted by
//! track sid so snapshots are stable between events.
//!
//! The terminal has no capture devices, so the client never publishes local
//! tracks of its own. Camera and microphone toggles mute or unmute a local
//! publication when one exists and report [`LiveKitError::NoLocalTrack`]
//! otherwise.

use std::fmt;

use carebridge_core::{Participant, TrackKind, TrackPublication};
use carebridge_proto::DeliveryMode;
use livekit::{
    DataPacket, Room, RoomError, RoomOptions, id::ParticipantIdentity,
    participant::RemoteParticipant, track::TrackKind as SdkTrackKind,
};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    credential::SessionCredential,
    room::{MediaRoom, RoomEvent},
};

/// LiveKit room errors.
#[derive(Debug, Error)]
pub enum LiveKitError {
    /// The SDK rejected the join or a room operation.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Operation requires a connected room.
    #[error("room is not connected")]
    NotConnected,

    /// `connect` called twice.
    #[error("room is already connected")]
    AlreadyConnected,

    /// No local track of this kind is published.
    #[error("no local {0:?} track is published")]
    NoLocalTrack(TrackKind),
}

/// Remote identities in join order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Roster {
    order: Vec<String>,
}

impl Roster {
    /// Seed from participants already in the room. The SDK hands them over
    /// unordered, so they are sorted by identity.
    fn seed(&mut self, identities: impl IntoIterator<Item = String>) {
        let mut identities: Vec<String> = identities.into_iter().collect();
        identities.sort();
        for identity in identities {
            self.join(identity);
        }
    }

    fn join(&mut self, identity: String) {
        if !self.order.contains(&identity) {
            self.order.push(identity);
        }
    }

    fn leave(&mut self, identity: &str) {
        self.order.retain(|known| known != identity);
    }

    fn identities(&self) -> &[String] {
        &self.order
    }
}

/// Media room backed by a LiveKit server.
pub struct LiveKitRoom {
    room: Option<Room>,
    events: Option<mpsc::UnboundedReceiver<livekit::RoomEvent>>,
    roster: Roster,
    handler_registered: bool,
    closed: bool,
}

impl LiveKitRoom {
    /// Create a room that has not joined yet.
    pub fn new() -> Self {
        Self {
            room: None,
            events: None,
            roster: Roster::default(),
            handler_registered: false,
            closed: false,
        }
    }

    fn connected(&self) -> Result<&Room, LiveKitError> {
        self.room.as_ref().ok_or(LiveKitError::NotConnected)
    }

    /// Mute or unmute the first local publication of `kind`.
    fn set_local_track(&self, kind: TrackKind, enabled: bool) -> Result<(), LiveKitError> {
        let room = self.connected()?;
        let publication = room
            .local_participant()
            .track_publications()
            .into_values()
            .find(|publication| track_kind(publication.kind()) == kind)
            .ok_or(LiveKitError::NoLocalTrack(kind))?;

        if enabled {
            publication.unmute();
        } else {
            publication.mute();
        }
        Ok(())
    }

    /// Current remote participants in roster order.
    fn snapshot(&self, room: &Room) -> Vec<Participant> {
        let remotes = room.remote_participants();
        self.roster
            .identities()
            .iter()
            .filter_map(|identity| remotes.get(&ParticipantIdentity(identity.clone())))
            .map(participant)
            .collect()
    }

    /// Translate one SDK event. `None` for events the session screen does
    /// not care about.
    fn translate(&mut self, event: livekit::RoomEvent) -> Option<RoomEvent> {
        match event {
            livekit::RoomEvent::DataReceived { payload, participant, .. } => {
                if !self.handler_registered {
                    return None;
                }
                let from = participant.map(|sender| sender.identity().0);
                Some(RoomEvent::Data { payload: payload.to_vec(), from })
            },
            livekit::RoomEvent::ParticipantConnected(remote) => {
                self.roster.join(remote.identity().0);
                self.participants_changed()
            },
            livekit::RoomEvent::ParticipantDisconnected(remote) => {
                self.roster.leave(&remote.identity().0);
                self.participants_changed()
            },
            livekit::RoomEvent::TrackPublished { .. }
            | livekit::RoomEvent::TrackUnpublished { .. }
            | livekit::RoomEvent::TrackSubscribed { .. }
            | livekit::RoomEvent::TrackUnsubscribed { .. } => self.participants_changed(),
            livekit::RoomEvent::Disconnected { reason } => {
                self.closed = true;
                Some(RoomEvent::Disconnected { reason: format!("{reason:?}") })
            },
            _ => None,
        }
    }

    fn participants_changed(&self) -> Option<RoomEvent> {
        let room = self.room.as_ref()?;
        Some(RoomEvent::ParticipantsChanged(self.snapshot(room)))
    }
}

impl fmt::Debug for LiveKitRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitRoom")
            .field("connected", &self.room.is_some())
            .field("roster", &self.roster)
            .field("handler_registered", &self.handler_registered)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Default for LiveKitRoom {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaRoom for LiveKitRoom {
    type Error = LiveKitError;

    async fn connect(&mut self, credential: SessionCredential) -> Result<(), Self::Error> {
        if self.room.is_some() || self.closed {
            return Err(LiveKitError::AlreadyConnected);
        }

        let (room, events) =
            Room::connect(credential.server_url(), credential.token(), RoomOptions::default())
                .await?;

        self.roster.seed(room.remote_participants().into_keys().map(|identity| identity.0));
        tracing::info!(
            room = %room.name(),
            remote_participants = self.roster.identities().len(),
            "joined media room"
        );

        self.room = Some(room);
        self.events = Some(events);
        Ok(())
    }

    fn local_identity(&self) -> Option<String> {
        self.room.as_ref().map(|room| room.local_participant().identity().0)
    }

    async fn set_camera_enabled(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.set_local_track(TrackKind::Video, enabled)
    }

    async fn set_microphone_enabled(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.set_local_track(TrackKind::Audio, enabled)
    }

    async fn publish_data(
        &mut self,
        payload: Vec<u8>,
        mode: DeliveryMode,
    ) -> Result<(), Self::Error> {
        let packet = DataPacket {
            payload,
            reliable: mode == DeliveryMode::Reliable,
            ..DataPacket::default()
        };
        self.connected()?.local_participant().publish_data(packet).await?;
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
            let event = self.events.as_mut()?.recv().await?;
            if let Some(event) = self.translate(event) {
                return Some(event);
            }
        }
    }

    async fn disconnect(&mut self) {
        self.events = None;
        self.closed = true;
        let Some(room) = self.room.take() else {
            return;
        };
        if let Err(e) = room.close().await {
            tracing::warn!(error = %e, "media room did not close cleanly");
        }
    }
}

fn participant(remote: &RemoteParticipant) -> Participant {
    let mut publications: Vec<TrackPublication> = remote
        .track_publications()
        .into_values()
        .map(|publication| TrackPublication {
            sid: publication.sid().to_string(),
            kind: track_kind(publication.kind()),
            subscribed: publication.is_subscribed(),
        })
        .collect();
    sort_publications(&mut publications);

    Participant { identity: remote.identity().0, publications }
}

fn sort_publications(publications: &mut [TrackPublication]) {
    publications.sort_by(|a, b| a.sid.cmp(&b.sid));
}

fn track_kind(kind: SdkTrackKind) -> TrackKind {
    match kind {
        SdkTrackKind::Audio => TrackKind::Audio,
        SdkTrackKind::Video => TrackKind::Video,
    }
}
