//! One pass of the controller's main loop.
//!
//! [`ControlLoop`] owns every peripheral seam and runs the same sequence on
//! each poll: drain one remote code, then sample the PIR and fire if the idle
//! window has elapsed. Results are handed to a [`DiagnosticSink`].

use core::time::Duration;

use crate::config::{ConfigError, TriggerConfig};
use crate::io::{ActuatorBank, Clock, IrReceiver, PresenceSensor};
use crate::ir::{IrKeyDecoder, IrKeyPress};
use crate::scheduler::UniformSource;
use crate::telemetry::{DiagnosticEvent, DiagnosticSink};
use crate::trigger::{MotionTriggerLoop, TickOutcome};

/// What a single poll did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PollReport<I> {
    pub ir: Option<IrKeyPress<I>>,
    pub motion: TickOutcome<I>,
}

impl<I> PollReport<I> {
    /// Index pressed during this poll, if any.
    #[must_use]
    pub fn pressed(&self) -> Option<usize> {
        self.motion.fired().map(|actuation| actuation.index)
    }
}

pub struct ControlLoop<S, B, C, IR, R, const N: usize>
where
    C: Clock,
{
    sensor: S,
    bank: B,
    clock: C,
    receiver: IR,
    trigger: MotionTriggerLoop<R, C::Instant, N>,
    ir: IrKeyDecoder<C::Instant>,
    polls: u64,
}

impl<S, B, C, IR, R, const N: usize> ControlLoop<S, B, C, IR, R, N>
where
    S: PresenceSensor,
    B: ActuatorBank,
    C: Clock,
    IR: IrReceiver,
    R: UniformSource,
{
    /// Wires the peripherals together and releases every actuator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ActuatorCountMismatch`] when the bank does not
    /// expose exactly `N` outputs, or any error raised by the scheduler.
    pub fn new(
        sensor: S,
        mut bank: B,
        clock: C,
        receiver: IR,
        source: R,
        config: &TriggerConfig,
    ) -> Result<Self, ConfigError> {
        if bank.count() != N {
            return Err(ConfigError::ActuatorCountMismatch {
                scheduler: N,
                bank: bank.count(),
            });
        }
        let trigger = MotionTriggerLoop::new(source, config)?;
        bank.release_all();

        Ok(Self {
            sensor,
            bank,
            clock,
            receiver,
            trigger,
            ir: IrKeyDecoder::new(config.ir_debounce),
            polls: 0,
        })
    }

    /// Runs one iteration of the main loop.
    ///
    /// A fired press blocks for the hold duration inside this call; the remote
    /// is not serviced again until the next poll.
    pub fn poll_once<K>(&mut self, sink: &mut K) -> PollReport<C::Instant>
    where
        K: DiagnosticSink<C::Instant> + ?Sized,
    {
        self.polls = self.polls.wrapping_add(1);

        let ir = self
            .receiver
            .try_receive()
            .and_then(|code| self.ir.receive(code, self.clock.now()));
        if let Some(press) = ir {
            sink.record(&DiagnosticEvent::IrKey(press));
        }

        let motion = self.sensor.is_asserted();
        let now = self.clock.now();
        let outcome = self
            .trigger
            .tick(motion, now, &mut self.bank, &mut self.clock);

        if let TickOutcome::Fired(actuation) = &outcome {
            if let Some(report) = &actuation.batch {
                sink.record(&DiagnosticEvent::BatchLoaded {
                    at: actuation.started_at,
                    report: report.clone(),
                });
            }
            sink.record(&DiagnosticEvent::ButtonPressed {
                index: actuation.index,
                started_at: actuation.started_at,
                released_at: actuation.released_at,
            });
        }

        PollReport {
            ir,
            motion: outcome,
        }
    }

    /// Time left before motion can fire again.
    #[must_use]
    pub fn cooldown_remaining(&self) -> Duration {
        self.trigger.gate().remaining(self.clock.now())
    }

    #[must_use]
    pub const fn trigger(&self) -> &MotionTriggerLoop<R, C::Instant, N> {
        &self.trigger
    }

    #[must_use]
    pub const fn ir_decoder(&self) -> &IrKeyDecoder<C::Instant> {
        &self.ir
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub const fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[must_use]
    pub const fn sensor(&self) -> &S {
        &self.sensor
    }

    pub const fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub const fn receiver_mut(&mut self) -> &mut IR {
        &mut self.receiver
    }

    #[must_use]
    pub const fn bank(&self) -> &B {
        &self.bank
    }

    pub const fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    /// Polls executed since construction.
    #[must_use]
    pub const fn polls(&self) -> u64 {
        self.polls
    }
}
