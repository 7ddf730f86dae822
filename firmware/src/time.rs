//! Embassy-backed instants for the shared control logic.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::fmt;
use core::ops::Add;

use embassy_time::{Duration, Instant};
use parrot_core::time::ControllerInstant;

/// Newtype over [`embassy_time::Instant`] that speaks `core::time::Duration`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct FirmwareInstant(Instant);

impl FirmwareInstant {
    #[cfg(test)]
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(Instant::from_micros(micros))
    }

    #[must_use]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    #[must_use]
    pub fn as_micros(self) -> u64 {
        self.0.as_micros()
    }

    #[must_use]
    pub fn as_millis(self) -> u64 {
        self.0.as_millis()
    }
}

impl From<Instant> for FirmwareInstant {
    fn from(value: Instant) -> Self {
        Self(value)
    }
}

impl Add<core::time::Duration> for FirmwareInstant {
    type Output = Self;

    fn add(self, rhs: core::time::Duration) -> Self {
        let micros = self.0.as_micros().saturating_add(saturating_micros(rhs));
        Self(Instant::from_micros(micros))
    }
}

impl ControllerInstant for FirmwareInstant {
    fn saturating_duration_since(&self, earlier: Self) -> core::time::Duration {
        core::time::Duration::from_micros(self.0.saturating_duration_since(earlier.0).as_micros())
    }
}

impl fmt::Display for FirmwareInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.as_millis();
        write!(f, "{}.{:03}s", millis / 1_000, millis % 1_000)
    }
}

/// Converts a `core` duration into Embassy ticks, saturating on overflow.
#[must_use]
pub fn to_embassy(duration: core::time::Duration) -> Duration {
    Duration::from_micros(saturating_micros(duration))
}

fn saturating_micros(duration: core::time::Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
