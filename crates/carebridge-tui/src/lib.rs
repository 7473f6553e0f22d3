//! Terminal client for Carebridge sessions
//!
//! A thin shell over [`carebridge_app::Driver`] that provides terminal
//! specific I/O. All orchestration lives in the generic
//! [`carebridge_app::Runtime`].
//!
//! This crate handles terminal rendering, log setup and the offline
//! credential source used with the loopback room.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod logging;
pub mod offline;
pub mod terminal;
pub mod ui;

pub use carebridge_app::{App, AppAction, AppEvent, Driver, KeyInput, Runtime};
pub use offline::{LOOPBACK_SERVER_URL, OfflineFetcher};
pub use terminal::{TerminalDriver, TerminalError};
