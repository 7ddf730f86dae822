//! Build-time configuration shared by every target.
//!
//! The controller has no runtime configuration surface: idle window, button
//! hold, actuator count and IR debounce are fixed when the firmware is
//! compiled. Cargo features select between the bench and deployment values.

use core::{fmt, time::Duration};

/// Number of phrase buttons wired to relays on the remote.
pub const BUTTON_COUNT: usize = 6;

/// Upper bound on actuators a scheduler will manage.
pub const MAX_ACTUATORS: usize = 16;

/// Idle window enforced after a button press before motion is honoured again.
#[cfg(not(feature = "idle-one-hour"))]
pub const IDLE_TIME: Duration = Duration::from_secs(10);
/// Idle window enforced after a button press before motion is honoured again.
#[cfg(feature = "idle-one-hour")]
pub const IDLE_TIME: Duration = Duration::from_secs(3_600);

/// Duration a relay stays closed to mimic a button press on the remote.
pub const BUTTON_HOLD: Duration = Duration::from_millis(250);

/// Window during which receiver auto-repeat codes are discarded.
pub const IR_DEBOUNCE: Duration = Duration::from_millis(120);

/// Cadence of the control loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Timing parameters consumed by the control loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TriggerConfig {
    pub idle: Duration,
    pub hold: Duration,
    pub ir_debounce: Duration,
}

impl TriggerConfig {
    /// Bundle of the compiled-in constants.
    pub const DEFAULT: Self = Self::new(IDLE_TIME, BUTTON_HOLD, IR_DEBOUNCE);

    pub const fn new(idle: Duration, hold: Duration, ir_debounce: Duration) -> Self {
        Self {
            idle,
            hold,
            ir_debounce,
        }
    }

    /// Time between two presses as perceived by someone in front of the sensor.
    #[must_use]
    pub fn perceived_idle(&self) -> Duration {
        self.idle.saturating_add(self.hold)
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Errors raised while assembling the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Fewer than two actuators make the no-repeat rule unsatisfiable.
    InvalidConfiguration { actuators: usize },
    /// More actuators than [`MAX_ACTUATORS`].
    TooManyActuators { actuators: usize },
    /// The actuator bank does not expose the scheduler's actuator count.
    ActuatorCountMismatch { scheduler: usize, bank: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidConfiguration { actuators } => {
                write!(f, "invalid configuration: {actuators} actuator(s), need at least 2")
            }
            ConfigError::TooManyActuators { actuators } => {
                write!(f, "{actuators} actuators exceeds the limit of {MAX_ACTUATORS}")
            }
            ConfigError::ActuatorCountMismatch { scheduler, bank } => {
                write!(f, "scheduler expects {scheduler} actuators but bank drives {bank}")
            }
        }
    }
}

/// Validates an actuator count against the scheduler limits.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidConfiguration`] below two actuators and
/// [`ConfigError::TooManyActuators`] above [`MAX_ACTUATORS`].
pub const fn validate_actuator_count(actuators: usize) -> Result<(), ConfigError> {
    if actuators < 2 {
        Err(ConfigError::InvalidConfiguration { actuators })
    } else if actuators > MAX_ACTUATORS {
        Err(ConfigError::TooManyActuators { actuators })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_bench_constants() {
        let config = TriggerConfig::default();
        assert_eq!(config.hold, Duration::from_millis(250));
        assert_eq!(config.ir_debounce, Duration::from_millis(120));
        #[cfg(not(feature = "idle-one-hour"))]
        assert_eq!(config.idle, Duration::from_secs(10));
        #[cfg(not(feature = "idle-one-hour"))]
        assert_eq!(config.perceived_idle(), Duration::from_millis(10_250));
    }

    #[test]
    fn actuator_count_bounds() {
        assert_eq!(
            validate_actuator_count(1),
            Err(ConfigError::InvalidConfiguration { actuators: 1 })
        );
        assert_eq!(
            validate_actuator_count(0),
            Err(ConfigError::InvalidConfiguration { actuators: 0 })
        );
        assert!(validate_actuator_count(2).is_ok());
        assert!(validate_actuator_count(BUTTON_COUNT).is_ok());
        assert_eq!(
            validate_actuator_count(MAX_ACTUATORS + 1),
            Err(ConfigError::TooManyActuators {
                actuators: MAX_ACTUATORS + 1
            })
        );
    }
}
