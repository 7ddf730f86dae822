//! Monotonic time abstractions shared by firmware and host targets.
//!
//! The firmware wraps Embassy's instant; the emulator and tests use
//! [`TickInstant`] driven by a [`SimulatedClock`].

use core::{fmt, ops::Add, time::Duration};

use crate::io::Clock;

/// Monotonic timestamp consumed by the gate, debouncer and control loop.
pub trait ControllerInstant: Copy + Ord + Add<Duration, Output = Self> {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Microseconds since an arbitrary epoch (boot, or the start of a simulation).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TickInstant(u64);

impl TickInstant {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000))
    }

    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0 / 1_000
    }
}

impl Add<Duration> for TickInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(micros))
    }
}

impl ControllerInstant for TickInstant {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for TickInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0 / 1_000;
        write!(f, "{}.{:03}s", millis / 1_000, millis % 1_000)
    }
}

/// Clock whose time only moves when told to.
///
/// `block_for` advances the clock instead of spinning, so a blocking
/// button hold costs nothing on the host.
#[derive(Clone, Debug, Default)]
pub struct SimulatedClock {
    now: TickInstant,
    blocked: Duration,
}

impl SimulatedClock {
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(TickInstant::ZERO)
    }

    #[must_use]
    pub const fn starting_at(now: TickInstant) -> Self {
        Self {
            now,
            blocked: Duration::ZERO,
        }
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, by: Duration) {
        self.now = self.now + by;
    }

    /// Jumps to `instant` if it lies in the future.
    pub fn advance_to(&mut self, instant: TickInstant) {
        if instant > self.now {
            self.now = instant;
        }
    }

    /// Total time spent inside `block_for`.
    #[must_use]
    pub const fn total_blocked(&self) -> Duration {
        self.blocked
    }
}

impl Clock for SimulatedClock {
    type Instant = TickInstant;

    fn now(&self) -> TickInstant {
        self.now
    }

    fn block_for(&mut self, duration: Duration) {
        self.blocked = self.blocked.saturating_add(duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_instant_arithmetic_saturates() {
        let start = TickInstant::from_millis(250);
        assert_eq!(start.as_micros(), 250_000);
        assert_eq!((start + Duration::from_millis(10)).as_millis(), 260);
        assert_eq!(
            TickInstant::ZERO.saturating_duration_since(start),
            Duration::ZERO
        );
        assert_eq!(
            TickInstant::from_micros(u64::MAX) + Duration::from_secs(1),
            TickInstant::from_micros(u64::MAX)
        );
    }

    #[test]
    fn simulated_clock_advances_while_blocked() {
        let mut clock = SimulatedClock::new();
        clock.block_for(Duration::from_millis(250));
        assert_eq!(clock.now(), TickInstant::from_millis(250));
        assert_eq!(clock.total_blocked(), Duration::from_millis(250));

        clock.advance_to(TickInstant::from_millis(100));
        assert_eq!(clock.now(), TickInstant::from_millis(250));
        clock.advance_to(TickInstant::from_millis(1_000));
        assert_eq!(clock.now(), TickInstant::from_millis(1_000));
    }

    #[test]
    fn display_renders_seconds_with_millis() {
        extern crate std;
        use std::string::ToString;

        assert_eq!(TickInstant::from_millis(10_250).to_string(), "10.250s");
    }
}
