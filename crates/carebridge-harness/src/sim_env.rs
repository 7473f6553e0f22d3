//! Virtual-time environment.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use carebridge_core::env::Environment;

/// Unix time the simulated wall clock starts at (2026-01-01T00:00:00Z).
pub const SIM_EPOCH_MILLIS: u64 = 1_767_225_600_000;

/// Environment whose clock only moves when told to.
///
/// Instants are the virtual time elapsed since creation. Clones share the
/// clock, so a test can advance time while the runtime owns another clone.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    elapsed_nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.elapsed_nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }

    fn wall_clock_millis(&self) -> u64 {
        SIM_EPOCH_MILLIS + self.now().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        env.advance(Duration::from_millis(1500));

        assert_eq!(other.now(), Duration::from_millis(1500));
        assert_eq!(other.wall_clock_millis(), SIM_EPOCH_MILLIS + 1500);
    }
}
