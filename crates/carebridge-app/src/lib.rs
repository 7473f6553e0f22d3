//! Session screen for Carebridge
//!
//! Pure state machine and generic runtime for the live session screen,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: screen state machine (join flow, media toggles, chat, teardown)
//! - [`Driver`]: trait for platform-specific UI I/O
//! - [`Runtime`]: generic orchestration loop over a driver, a credential
//!   fetcher and a media room

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::{Composer, KeyInput};
pub use runtime::Runtime;
pub use state::{CONNECT_FAILED_ALERT, JOIN_FAILED_ALERT, Phase, SEND_FAILED_ALERT};
