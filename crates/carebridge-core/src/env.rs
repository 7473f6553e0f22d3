//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system clocks. Production uses the real
//! monotonic and wall clocks; simulation supplies a manually advanced clock so
//! transcript timestamps and connect latencies are reproducible.

use std::time::Duration;

/// Abstract environment providing time.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `wall_clock_millis()` is milliseconds since the Unix epoch
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - Subsequent calls must return times >= previous calls.
    fn now(&self) -> Self::Instant;

    /// Wall-clock time in Unix milliseconds.
    ///
    /// Used to stamp transcript entries on arrival. Not monotonic and not
    /// synchronized with any peer.
    fn wall_clock_millis(&self) -> u64;
}
