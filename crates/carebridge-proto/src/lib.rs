//! Carebridge wire types
//!
//! Everything that crosses a process boundary: the JSON envelopes carried on
//! the media session's data channel, and the REST request/response bodies the
//! session client exchanges with the backend.
//!
//! # Components
//!
//! - [`DataMessage`]: tagged union decoded from data-channel bytes
//! - [`ChatPayload`]: the only message kind this client sends
//! - [`RoomName`]: media room derived from a session ID
//! - [`api`]: REST payloads (credentials, auth, sessions, demo minutes)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod data;
pub mod errors;
pub mod room;

pub use data::{CHAT_KIND, ChatPayload, DataMessage, DeliveryMode, UNKNOWN_SENDER};
pub use errors::ProtocolError;
pub use room::RoomName;
