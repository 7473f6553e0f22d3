//! Driver trait for abstracting UI I/O.
//!
//! The [`Driver`] trait decouples the session runtime from a specific front
//! end. Each front end implements the trait to provide input, rendering and
//! navigation, while the generic [`crate::Runtime`] handles all orchestration.
//! Network and media I/O are not the driver's concern: they go through
//! [`CredentialFetcher`](carebridge_client::CredentialFetcher) and
//! [`MediaRoom`](carebridge_client::MediaRoom).

use std::future::Future;

use carebridge_core::env::Environment;

use crate::{App, AppEvent};

/// Abstracts UI I/O for the session runtime.
///
/// # Implementations
///
/// - **TUI**: crossterm for input, ratatui for rendering
/// - **Simulation**: scripted input, recorded alerts and exits
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input event.
    ///
    /// Returns `None` when the wait ended without input (e.g. a poll
    /// timeout). Must be cancel-safe: it is raced against room events.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render<E: Environment>(&mut self, app: &App<E>) -> Result<(), Self::Error>;

    /// Show a notice the user must see.
    ///
    /// # Errors
    ///
    /// Returns an error if the notice cannot be shown.
    fn alert(&mut self, message: &str) -> Result<(), Self::Error>;

    /// Leave the session screen.
    fn exit(&mut self);
}
