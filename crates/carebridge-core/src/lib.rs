//! Carebridge session core
//!
//! Sans-IO state machines for a live session: the media connection lifecycle,
//! local track publishing, the chat transcript, and the participant
//! projection. Every method takes its inputs (time, payload bytes) as
//! arguments and returns actions for a driver to execute, so the same logic
//! runs against a real media room and in deterministic tests.
//!
//! # Components
//!
//! - [`SessionConnection`]: connect / publish / release lifecycle
//! - [`MediaPublisher`]: microphone and camera toggles
//! - [`Transcript`]: validated, arrival-ordered chat history
//! - [`participant::project`]: participant list to view tiles
//! - [`env::Environment`]: clock abstraction

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod env;
pub mod error;
pub mod media;
pub mod participant;
pub mod transcript;

pub use connection::{ConnectionAction, ConnectionState, SessionConnection};
pub use error::ConnectionError;
pub use media::{MediaAction, MediaPublisher};
pub use participant::{Participant, ParticipantView, TrackKind, TrackPublication};
pub use transcript::{ChatMessage, LOCAL_SENDER, OutgoingChat, ReceiveOutcome, Transcript};
