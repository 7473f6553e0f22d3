//! Deterministic simulation harness for the Carebridge session screen.
//!
//! Test doubles for every seam the [`carebridge_app::Runtime`] talks
//! through, so full sessions run in-process with virtual time and exact call
//! accounting:
//!
//! - [`SimEnv`]: manually advanced clock
//! - [`SimFetcher`]: fixed credential outcome, call counter
//! - [`SimRoom`]: scriptable failures and queued room events, call log
//! - [`SimDriver`]: scripted input, recorded renders, alerts and exits
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties every finished run must satisfy
//! (one exit, link released exactly once, echo only after publish). Use
//! [`InvariantRegistry::standard()`] after each scenario.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_fetcher;
pub mod sim_room;

pub use invariants::{
    EchoMatchesPublish, ExitOnce, Invariant, InvariantRegistry, InvariantResult, LinkReleased,
    SessionSnapshot, Violation,
};
pub use sim_driver::{RenderedScreen, SimDriver, SimDriverError, Step};
pub use sim_env::{SIM_EPOCH_MILLIS, SimEnv};
pub use sim_fetcher::{SIM_SERVER_URL, SimFetcher};
pub use sim_room::{RoomLog, SIM_LOCAL_IDENTITY, SimRoom, SimRoomError};
