//! Hardware seams between the control logic and the board.
//!
//! The scheduler and gate never touch pins directly. Firmware implements these
//! traits over Embassy GPIO; the emulator implements them over in-memory state.

use core::time::Duration;

use crate::config::BUTTON_COUNT;
use crate::time::ControllerInstant;

/// Binary presence input (the PIR sensor).
pub trait PresenceSensor {
    /// Returns `true` while the sensor reports a presence.
    fn is_asserted(&mut self) -> bool;
}

/// Monotonic time source with a blocking delay.
pub trait Clock {
    type Instant: ControllerInstant;

    /// Current instant.
    fn now(&self) -> Self::Instant;

    /// Blocks the caller for `duration`. Nothing else runs on the control
    /// thread until it returns.
    fn block_for(&mut self, duration: Duration);
}

/// Fixed-size bank of binary outputs addressed by index.
pub trait ActuatorBank {
    /// Number of actuators; indices run over `0..count()`.
    fn count(&self) -> usize;

    /// Drives the actuator to its active level.
    fn assert(&mut self, index: usize);

    /// Returns the actuator to its idle level.
    fn release(&mut self, index: usize);

    /// Returns every actuator to its idle level.
    fn release_all(&mut self) {
        for index in 0..self.count() {
            self.release(index);
        }
    }

    /// Presses a button: assert, block for `hold`, release.
    ///
    /// Returns the instant the actuator was released.
    fn press<C: Clock>(&mut self, index: usize, hold: Duration, clock: &mut C) -> C::Instant {
        self.assert(index);
        clock.block_for(hold);
        self.release(index);
        clock.now()
    }
}

/// Source of raw remote-control codes, polled once per tick.
pub trait IrReceiver {
    /// Returns the next received code, if one arrived since the last poll.
    fn try_receive(&mut self) -> Option<u16>;
}

/// Sensor that never reports presence.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPresenceSensor;

impl PresenceSensor for NoopPresenceSensor {
    fn is_asserted(&mut self) -> bool {
        false
    }
}

/// Receiver that never yields a code; used on boards without an IR module.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopIrReceiver;

impl IrReceiver for NoopIrReceiver {
    fn try_receive(&mut self) -> Option<u16> {
        None
    }
}

/// Actuator bank that performs no hardware interaction.
#[derive(Copy, Clone, Debug)]
pub struct NoopActuatorBank {
    count: usize,
}

impl NoopActuatorBank {
    #[must_use]
    pub const fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Default for NoopActuatorBank {
    fn default() -> Self {
        Self::new(BUTTON_COUNT)
    }
}

impl ActuatorBank for NoopActuatorBank {
    fn count(&self) -> usize {
        self.count
    }

    fn assert(&mut self, _: usize) {}

    fn release(&mut self, _: usize) {}
}

/// Output polarity as wired on the relay module.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputPolarity {
    ActiveLow,
    ActiveHigh,
}

impl OutputPolarity {
    /// Pin level (`true` == high) that corresponds to the requested logical state.
    #[must_use]
    pub const fn level_for(self, asserted: bool) -> bool {
        match self {
            OutputPolarity::ActiveLow => !asserted,
            OutputPolarity::ActiveHigh => asserted,
        }
    }
}

/// Metadata describing how an actuator is routed on the board.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ActuatorLine {
    pub index: usize,
    pub name: &'static str,
    pub mcu_pin: &'static str,
    pub polarity: OutputPolarity,
}

impl ActuatorLine {
    pub const fn new(
        index: usize,
        name: &'static str,
        mcu_pin: &'static str,
        polarity: OutputPolarity,
    ) -> Self {
        Self {
            index,
            name,
            mcu_pin,
            polarity,
        }
    }
}

/// Compile-time catalog of the relay lines driving the remote's phrase buttons.
pub const ALL_ACTUATORS: [ActuatorLine; BUTTON_COUNT] = [
    ActuatorLine::new(0, "PHRASE-1", "PA4", OutputPolarity::ActiveLow),
    ActuatorLine::new(1, "PHRASE-2", "PA5", OutputPolarity::ActiveLow),
    ActuatorLine::new(2, "PHRASE-3", "PA6", OutputPolarity::ActiveLow),
    ActuatorLine::new(3, "PHRASE-4", "PA7", OutputPolarity::ActiveLow),
    ActuatorLine::new(4, "PHRASE-5", "PB0", OutputPolarity::ActiveLow),
    ActuatorLine::new(5, "PHRASE-6", "PB1", OutputPolarity::ActiveLow),
];

/// Retrieve actuator metadata by index.
#[must_use]
pub fn actuator_by_index(index: usize) -> Option<ActuatorLine> {
    ALL_ACTUATORS.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimulatedClock;

    #[derive(Default)]
    struct TraceBank {
        asserted: [bool; 2],
        transitions: u8,
    }

    impl ActuatorBank for TraceBank {
        fn count(&self) -> usize {
            2
        }

        fn assert(&mut self, index: usize) {
            self.asserted[index] = true;
            self.transitions += 1;
        }

        fn release(&mut self, index: usize) {
            self.asserted[index] = false;
            self.transitions += 1;
        }
    }

    #[test]
    fn press_releases_after_hold() {
        let mut bank = TraceBank::default();
        let mut clock = SimulatedClock::new();

        let released_at = bank.press(1, Duration::from_millis(250), &mut clock);

        assert_eq!(released_at.as_millis(), 250);
        assert_eq!(bank.asserted, [false, false]);
        assert_eq!(bank.transitions, 2);
    }

    #[test]
    fn relay_catalog_is_active_low_and_indexed() {
        for (position, line) in ALL_ACTUATORS.iter().enumerate() {
            assert_eq!(line.index, position);
            assert_eq!(line.polarity, OutputPolarity::ActiveLow);
        }
        assert_eq!(actuator_by_index(4).map(|line| line.mcu_pin), Some("PB0"));
        assert!(actuator_by_index(BUTTON_COUNT).is_none());
        assert!(!OutputPolarity::ActiveLow.level_for(true));
        assert!(OutputPolarity::ActiveHigh.level_for(true));
    }
}
