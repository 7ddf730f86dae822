//! Per-tick motion handling: gate check, pick, press, restart the idle window.

use core::time::Duration;

use crate::config::{ConfigError, TriggerConfig};
use crate::gate::CooldownGate;
use crate::io::{ActuatorBank, Clock};
use crate::scheduler::{BatchReport, ShuffleScheduler, UniformSource};
use crate::time::ControllerInstant;

/// A completed button press.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Actuation<I> {
    pub index: usize,
    pub started_at: I,
    pub released_at: I,
    /// Present when this press consumed the first index of a fresh batch.
    pub batch: Option<BatchReport>,
}

/// Result of a single control tick.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TickOutcome<I> {
    /// Sensor not asserted; nothing happened.
    NoMotion,
    /// Motion seen while the idle window is still open.
    CoolingDown { remaining: Duration },
    Fired(Actuation<I>),
}

impl<I> TickOutcome<I> {
    #[must_use]
    pub const fn fired(&self) -> Option<&Actuation<I>> {
        match self {
            TickOutcome::Fired(actuation) => Some(actuation),
            _ => None,
        }
    }
}

/// Couples the shuffle scheduler with the cooldown gate.
pub struct MotionTriggerLoop<R, I, const N: usize> {
    scheduler: ShuffleScheduler<R, N>,
    gate: CooldownGate<I>,
    hold: Duration,
    presses: u32,
}

impl<R, I, const N: usize> MotionTriggerLoop<R, I, N>
where
    R: UniformSource,
    I: ControllerInstant,
{
    /// Builds the loop from a randomness source and timing configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigError`] from the scheduler when `N` is out of range.
    pub fn new(source: R, config: &TriggerConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_parts(
            ShuffleScheduler::new(source)?,
            CooldownGate::new(config.idle),
            config.hold,
        ))
    }

    pub const fn from_parts(
        scheduler: ShuffleScheduler<R, N>,
        gate: CooldownGate<I>,
        hold: Duration,
    ) -> Self {
        Self {
            scheduler,
            gate,
            hold,
            presses: 0,
        }
    }

    /// Runs one tick.
    ///
    /// With no motion, or motion inside the idle window, nothing is mutated.
    /// Otherwise the next index is pressed for the hold duration and the idle
    /// window restarts from the release instant.
    pub fn tick<B, C>(
        &mut self,
        motion: bool,
        now: I,
        bank: &mut B,
        clock: &mut C,
    ) -> TickOutcome<I>
    where
        B: ActuatorBank,
        C: Clock<Instant = I>,
    {
        if !motion {
            return TickOutcome::NoMotion;
        }
        if !self.gate.is_eligible(now) {
            return TickOutcome::CoolingDown {
                remaining: self.gate.remaining(now),
            };
        }

        let index = self.scheduler.next();
        let batch = self.scheduler.take_batch_report();
        let released_at = bank.press(index, self.hold, clock);
        self.gate.mark_triggered(released_at);
        self.presses = self.presses.wrapping_add(1);

        TickOutcome::Fired(Actuation {
            index,
            started_at: now,
            released_at,
            batch,
        })
    }

    #[must_use]
    pub const fn gate(&self) -> &CooldownGate<I> {
        &self.gate
    }

    #[must_use]
    pub const fn scheduler(&self) -> &ShuffleScheduler<R, N> {
        &self.scheduler
    }

    #[must_use]
    pub const fn hold(&self) -> Duration {
        self.hold
    }

    /// Total presses since boot.
    #[must_use]
    pub const fn presses(&self) -> u32 {
        self.presses
    }
}
