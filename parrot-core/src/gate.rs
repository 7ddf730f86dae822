//! Idle window enforced between button presses.

use core::time::Duration;

use crate::time::ControllerInstant;

/// Tracks when the last press finished and whether a new one may start.
///
/// A fresh gate has no recorded trigger, which behaves like a trigger
/// backdated by the full idle window: the first motion event is eligible.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CooldownGate<I> {
    idle: Duration,
    last_trigger: Option<I>,
}

impl<I: ControllerInstant> CooldownGate<I> {
    #[must_use]
    pub const fn new(idle: Duration) -> Self {
        Self {
            idle,
            last_trigger: None,
        }
    }

    /// Returns `true` iff `now >= last_trigger + idle`.
    #[must_use]
    pub fn is_eligible(&self, now: I) -> bool {
        match self.next_eligible_at() {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// Starts a new idle window at `now`.
    pub fn mark_triggered(&mut self, now: I) {
        self.last_trigger = Some(now);
    }

    /// Instant from which a new trigger is allowed, if a window is recorded.
    #[must_use]
    pub fn next_eligible_at(&self) -> Option<I> {
        self.last_trigger.map(|last| last + self.idle)
    }

    /// Time left in the idle window at `now` (zero once eligible).
    #[must_use]
    pub fn remaining(&self, now: I) -> Duration {
        self.next_eligible_at()
            .map_or(Duration::ZERO, |deadline| deadline.saturating_duration_since(now))
    }

    #[must_use]
    pub const fn last_trigger(&self) -> Option<I> {
        self.last_trigger
    }

    #[must_use]
    pub const fn idle(&self) -> Duration {
        self.idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TickInstant;

    #[test]
    fn fresh_gate_is_eligible_immediately() {
        let gate = CooldownGate::<TickInstant>::new(Duration::from_secs(10));
        assert!(gate.is_eligible(TickInstant::ZERO));
        assert_eq!(gate.remaining(TickInstant::ZERO), Duration::ZERO);
        assert!(gate.next_eligible_at().is_none());
    }

    #[test]
    fn window_is_half_open() {
        let mut gate = CooldownGate::new(Duration::from_secs(10));
        let last = TickInstant::from_millis(250);
        gate.mark_triggered(last);

        assert!(!gate.is_eligible(last));
        assert!(!gate.is_eligible(TickInstant::from_millis(5_000)));
        assert!(!gate.is_eligible(TickInstant::from_micros(10_249_999)));
        assert!(gate.is_eligible(TickInstant::from_millis(10_250)));
        assert!(gate.is_eligible(TickInstant::from_millis(60_000)));
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let mut gate = CooldownGate::new(Duration::from_secs(10));
        gate.mark_triggered(TickInstant::from_millis(1_000));

        assert_eq!(
            gate.remaining(TickInstant::from_millis(4_000)),
            Duration::from_secs(7)
        );
        assert_eq!(
            gate.remaining(TickInstant::from_millis(20_000)),
            Duration::ZERO
        );
        assert_eq!(
            gate.next_eligible_at(),
            Some(TickInstant::from_millis(11_000))
        );
    }
}
