//! Non-repeating shuffle of actuator indices.
//!
//! The scheduler dispenses indices in batches. Each batch is a permutation of
//! `0..N` built by rejection sampling, and the first index of a batch never
//! equals the last index of the batch before it, so the dispensed stream never
//! repeats a value back to back.
//!
//! Draws are capped per slot. When a slot exhausts [`MAX_DRAWS_PER_SLOT`] the
//! scheduler picks uniformly among the values still allowed, which keeps the
//! permutation and no-repeat guarantees while bounding the work per batch.

use core::{fmt, iter};

use heapless::Vec;
use rand::{Rng, RngCore};

use crate::config::{ConfigError, MAX_ACTUATORS, validate_actuator_count};

/// Draw budget for a single batch slot before falling back.
pub const MAX_DRAWS_PER_SLOT: u16 = 255;

/// Uniform integer generator over `0..upper`.
pub trait UniformSource {
    /// Returns a value in `0..upper`. `upper` is never zero.
    fn draw(&mut self, upper: usize) -> usize;
}

impl<R: RngCore> UniformSource for R {
    fn draw(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }
}

/// How a drawn candidate was handled while filling a batch.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DrawOutcome {
    Accepted,
    /// Repeated the previous batch's tail or a value already placed.
    Rejected,
    /// Chosen among the remaining values after the draw budget ran out.
    Fallback,
}

/// One candidate drawn during batch generation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Draw {
    pub value: usize,
    pub outcome: DrawOutcome,
}

/// Draws spent on one batch slot.
///
/// Rejections are tallied per value rather than kept in draw order. A slot
/// draws at most [`MAX_DRAWS_PER_SLOT`] times, so each tally fits a `u8` and
/// the record has a fixed size for any actuator count.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SlotRecord {
    rejections: [u8; MAX_ACTUATORS],
    out_of_range: u8,
    placed: usize,
    fallback: bool,
}

impl SlotRecord {
    const fn new() -> Self {
        Self {
            rejections: [0; MAX_ACTUATORS],
            out_of_range: 0,
            placed: 0,
            fallback: false,
        }
    }

    fn reject(&mut self, value: usize) {
        let tally = self
            .rejections
            .get_mut(value)
            .unwrap_or(&mut self.out_of_range);
        *tally = tally.saturating_add(1);
    }

    /// Value placed in the slot.
    #[must_use]
    pub const fn placed(&self) -> usize {
        self.placed
    }

    /// `true` when the slot was filled by the fallback pick.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Times `value` was drawn and rejected for this slot.
    #[must_use]
    pub fn rejections_of(&self, value: usize) -> u8 {
        self.rejections.get(value).copied().unwrap_or(0)
    }

    /// Rejected draws too large to tally by value.
    #[must_use]
    pub const fn out_of_range(&self) -> u8 {
        self.out_of_range
    }

    /// Rejected draws in ascending value order, then the placed value.
    pub fn draws(&self) -> impl Iterator<Item = Draw> + '_ {
        let placed = Draw {
            value: self.placed,
            outcome: if self.fallback {
                DrawOutcome::Fallback
            } else {
                DrawOutcome::Accepted
            },
        };
        self.rejections
            .iter()
            .enumerate()
            .flat_map(|(value, &count)| {
                iter::repeat_n(
                    Draw {
                        value,
                        outcome: DrawOutcome::Rejected,
                    },
                    usize::from(count),
                )
            })
            .chain(iter::once(placed))
    }
}

/// Record of a batch regeneration, used for diagnostics.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatchReport {
    slots: Vec<SlotRecord, MAX_ACTUATORS>,
    rejected: usize,
    fallbacks: usize,
}

impl BatchReport {
    fn push_slot(&mut self, slot: SlotRecord) {
        self.rejected += slot
            .rejections
            .iter()
            .map(|&count| usize::from(count))
            .sum::<usize>()
            + usize::from(slot.out_of_range);
        if slot.fallback {
            self.fallbacks += 1;
        }
        let pushed = self.slots.push(slot);
        debug_assert!(pushed.is_ok(), "batch longer than MAX_ACTUATORS");
    }

    /// Per-slot draw records in batch order.
    #[must_use]
    pub fn slots(&self) -> &[SlotRecord] {
        &self.slots
    }

    /// Every in-range draw, slot by slot.
    pub fn draws(&self) -> impl Iterator<Item = Draw> + '_ {
        self.slots.iter().flat_map(SlotRecord::draws)
    }

    /// The generated permutation.
    pub fn batch(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.slots.iter().map(SlotRecord::placed)
    }

    /// Number of rejected draws.
    #[must_use]
    pub const fn rejected(&self) -> usize {
        self.rejected
    }

    /// Number of slots filled by the fallback path.
    #[must_use]
    pub const fn fallbacks(&self) -> usize {
        self.fallbacks
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Loading presses:")?;
        for slot in &self.slots {
            for _ in 0..slot.out_of_range {
                f.write_str(" ?\u{2190}")?;
            }
            for draw in slot.draws() {
                match draw.outcome {
                    DrawOutcome::Accepted => write!(f, " {}", draw.value)?,
                    DrawOutcome::Rejected => write!(f, " {}\u{2190}", draw.value)?,
                    DrawOutcome::Fallback => write!(f, " {}*", draw.value)?,
                }
            }
        }
        Ok(())
    }
}

/// Dispenses actuator indices in shuffled batches without immediate repeats.
pub struct ShuffleScheduler<R, const N: usize> {
    source: R,
    batch: [usize; N],
    cursor: usize,
    previous_tail: Option<usize>,
    last_dispensed: Option<usize>,
    batches_generated: u32,
    pending_report: Option<BatchReport>,
}

impl<R: UniformSource, const N: usize> ShuffleScheduler<R, N> {
    /// Creates a scheduler whose first call to [`next`](Self::next) generates a batch.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfiguration`] when `N < 2`, since a
    /// single actuator cannot avoid repeating itself, and
    /// [`ConfigError::TooManyActuators`] above [`MAX_ACTUATORS`].
    pub fn new(source: R) -> Result<Self, ConfigError> {
        validate_actuator_count(N)?;
        Ok(Self {
            source,
            batch: [0; N],
            cursor: N,
            previous_tail: None,
            last_dispensed: None,
            batches_generated: 0,
            pending_report: None,
        })
    }

    /// Returns the next actuator index to fire.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> usize {
        if self.cursor >= N {
            self.regenerate();
        }

        let index = self.batch[self.cursor];
        self.cursor += 1;
        self.last_dispensed = Some(index);
        index
    }

    /// Actuator count managed by the scheduler.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Always `false`; construction rejects empty schedulers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Indices still queued in the current batch.
    #[must_use]
    pub fn remaining(&self) -> &[usize] {
        if self.cursor >= N {
            &[]
        } else {
            &self.batch[self.cursor..]
        }
    }

    /// The most recently dispensed index.
    #[must_use]
    pub const fn last_dispensed(&self) -> Option<usize> {
        self.last_dispensed
    }

    /// Last value of the most recent batch, which the next batch may not start with.
    #[must_use]
    pub const fn previous_tail(&self) -> Option<usize> {
        self.previous_tail
    }

    /// Number of batches generated so far.
    #[must_use]
    pub const fn batches_generated(&self) -> u32 {
        self.batches_generated
    }

    /// Takes the report of the most recent regeneration, if not yet taken.
    pub fn take_batch_report(&mut self) -> Option<BatchReport> {
        self.pending_report.take()
    }

    fn regenerate(&mut self) {
        let mut report = BatchReport::default();

        for slot in 0..N {
            let record = self.fill_slot(slot);
            self.batch[slot] = record.placed;
            report.push_slot(record);
        }

        self.previous_tail = Some(self.batch[N - 1]);
        self.cursor = 0;
        self.batches_generated = self.batches_generated.wrapping_add(1);
        self.pending_report = Some(report);
    }

    fn fill_slot(&mut self, slot: usize) -> SlotRecord {
        let mut record = SlotRecord::new();
        for _ in 0..MAX_DRAWS_PER_SLOT {
            let candidate = self.source.draw(N);
            if self.is_allowed(slot, candidate) {
                record.placed = candidate;
                return record;
            }
            record.reject(candidate);
        }

        let candidates: Vec<usize, MAX_ACTUATORS> = (0..N)
            .filter(|&candidate| self.is_allowed(slot, candidate))
            .collect();
        // At least one value is always allowed: N >= 2 leaves one choice for
        // slot 0, and slot i has N - i unused values.
        record.placed = candidates[self.source.draw(candidates.len()) % candidates.len()];
        record.fallback = true;
        record
    }

    fn is_allowed(&self, slot: usize, candidate: usize) -> bool {
        if candidate >= N {
            return false;
        }
        if slot == 0 && self.previous_tail == Some(candidate) {
            return false;
        }
        !self.batch[..slot].contains(&candidate)
    }
}
