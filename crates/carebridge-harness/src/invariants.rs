//! Invariant checking for session simulations.
//!
//! Invariants are properties that must hold at the end of every run,
//! whatever the script. A [`SessionSnapshot`] is taken from the room log, the
//! driver and the app, then every registered [`Invariant`] is checked
//! against it.

use carebridge_app::App;
use carebridge_core::{ConnectionState, env::Environment};

use crate::{RoomLog, SimDriver};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// Observable outcome of a finished run.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Calls the room saw.
    pub room: RoomLog,
    /// Exit calls the driver saw.
    pub exits: usize,
    /// Final connection state.
    pub connection: ConnectionState,
    /// Transcript entries echoed locally.
    pub local_messages: usize,
    /// Whether a publish was still unresolved.
    pub sending: bool,
}

impl SessionSnapshot {
    /// Capture the outcome of a run.
    pub fn capture<E: Environment>(room: RoomLog, driver: &SimDriver, app: &App<E>) -> Self {
        Self {
            room,
            exits: driver.exits(),
            connection: app.connection_state(),
            local_messages: app.transcript().messages().iter().filter(|m| m.is_local()).count(),
            sending: app.is_sending(),
        }
    }
}

/// A property every finished run must satisfy.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// The screen leaves exactly once.
pub struct ExitOnce;

impl Invariant for ExitOnce {
    fn name(&self) -> &'static str {
        "exit_once"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.exits == 1 {
            return Ok(());
        }
        Err(Violation { invariant: self.name(), message: format!("{} exits", state.exits) })
    }
}

/// A link that came up is released exactly once, handler first.
pub struct LinkReleased;

impl Invariant for LinkReleased {
    fn name(&self) -> &'static str {
        "link_released"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let log = &state.room;
        let expected = usize::from(log.connects > 0);

        if log.disconnects != expected {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} connects, {} disconnects", log.connects, log.disconnects),
            });
        }
        if log.unregisters != log.registers || log.registers > 1 {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} registers, {} unregisters", log.registers, log.unregisters),
            });
        }
        if !state.connection.is_terminal() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("run ended in {:?}", state.connection),
            });
        }
        Ok(())
    }
}

/// Every local echo corresponds to a successful publish.
pub struct EchoMatchesPublish;

impl Invariant for EchoMatchesPublish {
    fn name(&self) -> &'static str {
        "echo_matches_publish"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let published = state.room.published.len();
        if state.local_messages == published && !state.sending {
            return Ok(());
        }
        Err(Violation {
            invariant: self.name(),
            message: format!(
                "{} published, {} echoed, sending={}",
                published, state.local_messages, state.sending
            ),
        })
    }
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Registry with [`ExitOnce`], [`LinkReleased`] and [`EchoMatchesPublish`].
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ExitOnce);
        registry.add(LinkReleased);
        registry.add(EchoMatchesPublish);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants, collecting every violation.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            room: RoomLog {
                connects: 1,
                registers: 1,
                unregisters: 1,
                disconnects: 1,
                ..RoomLog::default()
            },
            exits: 1,
            connection: ConnectionState::Disconnected,
            local_messages: 0,
            sending: false,
        }
    }

    #[test]
    fn standard_registry_has_invariants() {
        assert_eq!(InvariantRegistry::standard().len(), 3);
    }

    #[test]
    fn clean_run_passes() {
        assert!(InvariantRegistry::standard().check_all(&clean_snapshot()).is_ok());
    }

    #[test]
    fn double_disconnect_is_flagged() {
        let mut snapshot = clean_snapshot();
        snapshot.room.disconnects = 2;
        snapshot.exits = 0;

        let violations = InvariantRegistry::standard().check_all(&snapshot).unwrap_err();
        let names: Vec<_> = violations.iter().map(|v| v.invariant).collect();
        assert_eq!(names, vec!["exit_once", "link_released"]);
    }
}
