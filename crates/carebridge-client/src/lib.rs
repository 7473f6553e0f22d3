//! Carebridge session client I/O
//!
//! Everything that touches the network or the disk on behalf of the session
//! screen. The state machines in `carebridge-core` decide what to do; this
//! crate does it.
//!
//! # Components
//!
//! - [`ApiClient`]: REST client with bearer auth and `401` invalidation
//! - [`AuthSession`]: explicitly injected login state over a [`TokenStore`]
//! - [`CredentialFetcher`]: single-use media credentials per join
//! - [`MediaRoom`]: seam to the media SDK; [`LiveKitRoom`] joins a LiveKit
//!   server, [`LoopbackRoom`] stays in-process
//! - [`ClientConfig`]: backend and media URLs, timeouts
//! - [`SystemEnv`]: production clocks

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod auth;
pub mod config;
pub mod credential;
pub mod error;
pub mod livekit_room;
pub mod loopback;
pub mod room;
pub mod system_env;

pub use api::ApiClient;
pub use auth::{AuthSession, AuthState, FileTokenStore, MemoryTokenStore, TokenStore};
pub use config::ClientConfig;
pub use credential::{CredentialFetcher, HttpCredentialFetcher, SessionCredential};
pub use error::ClientError;
pub use livekit_room::{LiveKitError, LiveKitRoom};
pub use loopback::{LoopbackError, LoopbackPeer, LoopbackRoom};
pub use room::{MediaRoom, RoomEvent};
pub use system_env::SystemEnv;
