//! Board wiring: relay outputs, PIR input and the blocking clock.
//!
//! Pin assignments mirror [`parrot_core::io::ALL_ACTUATORS`]. The relay board
//! is active-low, so every output boots high and is only pulled low for the
//! duration of a press.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

pub mod entropy;

use core::time::Duration;

use parrot_core::io::Clock;
#[cfg(target_os = "none")]
use parrot_core::{
    config::BUTTON_COUNT,
    io::{ALL_ACTUATORS, ActuatorBank, PresenceSensor},
};

#[cfg(target_os = "none")]
use embassy_stm32::gpio::{Input, Output};

use crate::time::{FirmwareInstant, to_embassy};

/// MCU pin wired to the PIR sensor output.
pub const PIR_PIN: &str = "PA0";

/// MCU pin wired to the IR receiver module (EXTI line 1).
pub const IR_PIN: &str = "PA1";

/// Relay outputs indexed in actuator order.
#[cfg(target_os = "none")]
pub struct RelayBank<'d> {
    relays: [Output<'d>; BUTTON_COUNT],
}

#[cfg(target_os = "none")]
impl<'d> RelayBank<'d> {
    pub fn new(relays: [Output<'d>; BUTTON_COUNT]) -> Self {
        let mut bank = Self { relays };
        bank.release_all();
        bank
    }

    fn drive(&mut self, index: usize, asserted: bool) {
        let Some(line) = ALL_ACTUATORS.get(index) else {
            return;
        };
        let relay = &mut self.relays[index];
        if line.polarity.level_for(asserted) {
            relay.set_high();
        } else {
            relay.set_low();
        }
    }
}

#[cfg(target_os = "none")]
impl ActuatorBank for RelayBank<'_> {
    fn count(&self) -> usize {
        self.relays.len()
    }

    fn assert(&mut self, index: usize) {
        self.drive(index, true);
        log_relay(index, true);
    }

    fn release(&mut self, index: usize) {
        self.drive(index, false);
        log_relay(index, false);
    }
}

/// HC-SR501 style PIR output; high while motion is detected.
#[cfg(target_os = "none")]
pub struct PirSensor<'d> {
    input: Input<'d>,
}

#[cfg(target_os = "none")]
impl<'d> PirSensor<'d> {
    pub fn new(input: Input<'d>) -> Self {
        Self { input }
    }
}

#[cfg(target_os = "none")]
impl PresenceSensor for PirSensor<'_> {
    fn is_asserted(&mut self) -> bool {
        self.input.is_high()
    }
}

/// Clock that busy-waits on the Embassy time driver.
///
/// Blocking keeps the press atomic with respect to the control loop; nothing
/// else on the thread executor runs until the relay is released.
#[derive(Copy, Clone, Debug, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    type Instant = FirmwareInstant;

    fn now(&self) -> FirmwareInstant {
        FirmwareInstant::now()
    }

    fn block_for(&mut self, duration: Duration) {
        embassy_time::block_for(to_embassy(duration));
    }
}

#[cfg(target_os = "none")]
fn log_relay(index: usize, asserted: bool) {
    if let Some(line) = ALL_ACTUATORS.get(index) {
        defmt::debug!(
            "relays:{} {} pin={}",
            line.name,
            if asserted { "assert" } else { "release" },
            line.mcu_pin
        );
    }
}
