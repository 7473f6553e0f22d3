//! Media session lifecycle state machine.
//!
//! Owns the connection state of a single session screen. Uses the action
//! pattern: methods take time as input and return actions for the driver to
//! execute against the media room. The machine itself performs no I/O.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐  begin_connect  ┌────────────┐  handle_connected  ┌───────────┐
//! │ Idle │────────────────>│ Connecting │───────────────────>│ Connected │
//! └──────┘                 └────────────┘                    └───────────┘
//!                                │                                 │
//!                                │ handle_connect_failed           │ teardown / link lost
//!                                ↓                                 ↓
//!                           ┌────────┐                     ┌──────────────┐
//!                           │ Failed │                     │ Disconnected │
//!                           └────────┘                     └──────────────┘
//! ```
//!
//! `Failed` and `Disconnected` are terminal: there is no reconnection. A new
//! join attempt needs a new machine and a fresh credential.
//!
//! # Release Guarantee
//!
//! Over the machine's lifetime, [`ConnectionAction::UnregisterDataHandler`]
//! and [`ConnectionAction::Terminate`] are each emitted at most once, and
//! exactly once for any connection that reached the transport. Teardown
//! requested while a connect is still in flight is deferred: when the connect
//! resolves, the link is terminated immediately instead of being published.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use crate::error::ConnectionError;

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open the media link using the session credential.
    Connect,
    /// Start publishing the local camera.
    EnableCamera,
    /// Start routing data-channel payloads to the transcript.
    RegisterDataHandler,
    /// Tell the user the session could not continue.
    ReportFailure {
        /// Human-readable cause.
        reason: String,
    },
    /// Stop routing data-channel payloads.
    UnregisterDataHandler,
    /// Close the media link.
    Terminate,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connect attempted yet
    Idle,
    /// Connect in flight
    Connecting,
    /// Link established, camera published, chat handler registered
    Connected,
    /// Connect failed (terminal)
    Failed,
    /// Link released after being established, or torn down before it was
    /// (terminal)
    Disconnected,
}

impl ConnectionState {
    /// Returns true for states that admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Disconnected)
    }
}

/// Connection state machine
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct SessionConnection<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Current state
    state: ConnectionState,
    /// When the connect began. `None` before `begin_connect`.
    connect_started: Option<I>,
    /// When the link came up. `None` if it never did.
    connected_at: Option<I>,
    /// Transport holds a live link that still needs terminating
    link_open: bool,
    /// Data handler is registered and still needs unregistering
    handler_registered: bool,
    /// Teardown arrived while the connect was in flight
    teardown_pending: bool,
    /// Why the session ended. `None` while not terminal.
    end_reason: Option<String>,
}

impl<I> Default for SessionConnection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I> SessionConnection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a new connection in [`ConnectionState::Idle`] state
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            connect_started: None,
            connected_at: None,
            link_open: false,
            handler_registered: false,
            teardown_pending: false,
            end_reason: None,
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the link is up and usable for publishing.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Whether teardown was requested while the connect was in flight.
    #[must_use]
    pub fn is_teardown_pending(&self) -> bool {
        self.teardown_pending
    }

    /// Why the session ended. `None` while not terminal.
    #[must_use]
    pub fn end_reason(&self) -> Option<&str> {
        self.end_reason.as_deref()
    }

    /// Time the link has been up. `None` if never connected.
    #[must_use]
    pub fn connected_for(&self, now: I) -> Option<Duration> {
        self.connected_at.map(|at| now - at)
    }

    /// Start connecting.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in Idle state
    pub fn begin_connect(&mut self, now: I) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Idle {
            return Err(self.invalid("begin_connect"));
        }

        self.state = ConnectionState::Connecting;
        self.connect_started = Some(now);

        Ok(vec![ConnectionAction::Connect])
    }

    /// The transport reports the link is up.
    ///
    /// Returns the post-connect actions (publish camera, register the chat
    /// handler), or a lone `Terminate` if teardown was requested meanwhile.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in Connecting state
    pub fn handle_connected(&mut self, now: I) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(self.invalid("handle_connected"));
        }

        if let Some(started) = self.connect_started {
            tracing::info!(elapsed = ?(now - started), "media link established");
        }

        if self.teardown_pending {
            tracing::debug!("connect resolved after teardown; releasing link");
            self.state = ConnectionState::Disconnected;
            return Ok(vec![ConnectionAction::Terminate]);
        }

        self.state = ConnectionState::Connected;
        self.connected_at = Some(now);
        self.link_open = true;
        self.handler_registered = true;

        Ok(vec![ConnectionAction::EnableCamera, ConnectionAction::RegisterDataHandler])
    }

    /// The transport reports the connect attempt failed.
    ///
    /// The failure is reported once. If teardown already happened there is
    /// nobody left to report to, so no action is returned.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in Connecting state
    pub fn handle_connect_failed(
        &mut self,
        reason: impl Into<String>,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(self.invalid("handle_connect_failed"));
        }

        let reason = reason.into();
        tracing::warn!(%reason, "media connect failed");

        self.state = ConnectionState::Failed;
        self.end_reason = Some(reason.clone());

        if self.teardown_pending {
            return Ok(vec![]);
        }

        Ok(vec![ConnectionAction::ReportFailure { reason }])
    }

    /// The transport dropped an established link.
    ///
    /// There is no reconnection: the session fails closed, releasing its
    /// resources and reporting the loss. Ignored outside Connected.
    pub fn handle_link_lost(&mut self, reason: impl Into<String>) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Connected {
            return vec![];
        }

        let reason = reason.into();
        tracing::warn!(%reason, "media link lost");

        let mut actions = self.release();
        self.state = ConnectionState::Disconnected;
        self.end_reason = Some(reason.clone());
        actions.push(ConnectionAction::ReportFailure { reason });
        actions
    }

    /// Tear the session down (user hang-up, screen teardown, navigation).
    ///
    /// Safe to call from any state and any number of times; release actions
    /// are emitted at most once.
    pub fn teardown(&mut self, reason: impl Into<String>) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Idle => {
                self.state = ConnectionState::Disconnected;
                self.end_reason = Some(reason.into());
                vec![]
            },
            ConnectionState::Connecting => {
                // Connect cannot be aborted; release happens when it resolves.
                self.teardown_pending = true;
                self.end_reason = Some(reason.into());
                vec![]
            },
            ConnectionState::Connected => {
                let actions = self.release();
                self.state = ConnectionState::Disconnected;
                self.end_reason = Some(reason.into());
                actions
            },
            ConnectionState::Failed | ConnectionState::Disconnected => vec![],
        }
    }

    /// Emit the outstanding release actions, each at most once.
    fn release(&mut self) -> Vec<ConnectionAction> {
        let mut actions = Vec::with_capacity(2);

        if self.handler_registered {
            self.handler_registered = false;
            actions.push(ConnectionAction::UnregisterDataHandler);
        }

        if self.link_open {
            self.link_open = false;
            actions.push(ConnectionAction::Terminate);
        }

        actions
    }

    fn invalid(&self, operation: &str) -> ConnectionError {
        ConnectionError::InvalidState { state: self.state, operation: operation.to_string() }
    }
}
