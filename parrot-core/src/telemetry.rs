//! Diagnostic events emitted by the control loop.
//!
//! Events render as the human-readable console lines the controller has always
//! printed (`Loading presses: ...`, `Button: n`, `68 PLAY/PAUSE`). Targets route
//! them through a [`DiagnosticSink`]; [`DiagnosticLog`] keeps a compact,
//! fixed-capacity history for status queries.

use core::fmt;

use heapless::{HistoryBuf, OldestOrdered};

use crate::ir::IrKeyPress;
use crate::scheduler::BatchReport;

/// Identifier assigned to recorded diagnostics.
pub type EventId = u32;

/// Number of records retained by [`DiagnosticLog`].
pub const DIAGNOSTIC_RING_CAPACITY: usize = 32;

/// Something worth reporting on the diagnostics console.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DiagnosticEvent<I> {
    /// A new batch was shuffled.
    BatchLoaded { at: I, report: BatchReport },
    /// A relay was pulsed.
    ButtonPressed {
        index: usize,
        started_at: I,
        released_at: I,
    },
    /// A remote code passed the debounce filter.
    IrKey(IrKeyPress<I>),
}

impl<I: Copy> DiagnosticEvent<I> {
    /// Instant the event is attributed to.
    #[must_use]
    pub fn timestamp(&self) -> I {
        match self {
            DiagnosticEvent::BatchLoaded { at, .. } => *at,
            DiagnosticEvent::ButtonPressed { started_at, .. } => *started_at,
            DiagnosticEvent::IrKey(press) => press.received_at,
        }
    }

    /// Compact form stored in the history ring.
    #[must_use]
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            DiagnosticEvent::BatchLoaded { report, .. } => DiagnosticKind::BatchLoaded {
                rejected: saturate(report.rejected()),
                fallbacks: saturate(report.fallbacks()),
            },
            DiagnosticEvent::ButtonPressed { index, .. } => DiagnosticKind::ButtonPressed {
                index: saturate(*index),
            },
            DiagnosticEvent::IrKey(press) => DiagnosticKind::IrKey { code: press.code },
        }
    }
}

impl<I> fmt::Display for DiagnosticEvent<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::BatchLoaded { report, .. } => write!(f, "{report}"),
            DiagnosticEvent::ButtonPressed { index, .. } => write!(f, "Button: {index}"),
            DiagnosticEvent::IrKey(press) => match press.key {
                Some(key) => write!(f, "{} {key}", press.code),
                None => write!(f, "{}", press.code),
            },
        }
    }
}

/// Fixed-size summary of a [`DiagnosticEvent`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DiagnosticKind {
    BatchLoaded { rejected: u8, fallbacks: u8 },
    ButtonPressed { index: u8 },
    IrKey { code: u16 },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::BatchLoaded {
                rejected,
                fallbacks,
            } => write!(f, "batch-loaded rejected={rejected} fallbacks={fallbacks}"),
            DiagnosticKind::ButtonPressed { index } => write!(f, "button-pressed {index}"),
            DiagnosticKind::IrKey { code } => {
                write!(f, "ir-key {code:#04x} {}", crate::ir::decode(*code))
            }
        }
    }
}

/// Entry stored in the history ring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DiagnosticRecord<I> {
    pub id: EventId,
    pub timestamp: I,
    pub kind: DiagnosticKind,
}

/// Destination for diagnostic events.
pub trait DiagnosticSink<I> {
    fn record(&mut self, event: &DiagnosticEvent<I>);
}

/// Sink that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl<I> DiagnosticSink<I> for NoopSink {
    fn record(&mut self, _: &DiagnosticEvent<I>) {}
}

impl<I, S: DiagnosticSink<I> + ?Sized> DiagnosticSink<I> for &mut S {
    fn record(&mut self, event: &DiagnosticEvent<I>) {
        (**self).record(event);
    }
}

/// Records diagnostics into a fixed-size ring buffer.
pub struct DiagnosticLog<I, const CAPACITY: usize = DIAGNOSTIC_RING_CAPACITY>
where
    I: Copy,
{
    ring: HistoryBuf<DiagnosticRecord<I>, CAPACITY>,
    next_event_id: EventId,
    presses: u32,
    batches: u32,
    ir_keys: u32,
    last_press: Option<u8>,
}

impl<I: Copy, const CAPACITY: usize> DiagnosticLog<I, CAPACITY> {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            next_event_id: 0,
            presses: 0,
            batches: 0,
            ir_keys: 0,
            last_press: None,
        }
    }

    /// Returns an iterator over the retained records in chronological order.
    #[must_use]
    pub fn oldest_first(&self) -> OldestOrdered<'_, DiagnosticRecord<I>> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&DiagnosticRecord<I>> {
        self.ring.recent()
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Button presses recorded since boot.
    #[must_use]
    pub const fn presses(&self) -> u32 {
        self.presses
    }

    /// Batches recorded since boot.
    #[must_use]
    pub const fn batches(&self) -> u32 {
        self.batches
    }

    /// Remote keys recorded since boot.
    #[must_use]
    pub const fn ir_keys(&self) -> u32 {
        self.ir_keys
    }

    /// Most recently pressed actuator index.
    #[must_use]
    pub const fn last_press(&self) -> Option<u8> {
        self.last_press
    }
}

impl<I: Copy, const CAPACITY: usize> Default for DiagnosticLog<I, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Copy, const CAPACITY: usize> DiagnosticSink<I> for DiagnosticLog<I, CAPACITY> {
    fn record(&mut self, event: &DiagnosticEvent<I>) {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        let kind = event.kind();
        match kind {
            DiagnosticKind::BatchLoaded { .. } => self.batches = self.batches.wrapping_add(1),
            DiagnosticKind::ButtonPressed { index } => {
                self.presses = self.presses.wrapping_add(1);
                self.last_press = Some(index);
            }
            DiagnosticKind::IrKey { .. } => self.ir_keys = self.ir_keys.wrapping_add(1),
        }

        self.ring.write(DiagnosticRecord {
            id,
            timestamp: event.timestamp(),
            kind,
        });
    }
}

fn saturate(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;
    use crate::ir::{IrKeyPress, RemoteKey};
    use crate::time::TickInstant;

    fn ir_event(code: u16, millis: u64) -> DiagnosticEvent<TickInstant> {
        DiagnosticEvent::IrKey(IrKeyPress {
            code,
            key: RemoteKey::from_code(code),
            received_at: TickInstant::from_millis(millis),
        })
    }

    #[test]
    fn renders_console_lines() {
        let press = DiagnosticEvent::ButtonPressed {
            index: 4,
            started_at: TickInstant::ZERO,
            released_at: TickInstant::from_millis(250),
        };
        assert_eq!(press.to_string(), "Button: 4");
        assert_eq!(ir_event(0x44, 0).to_string(), "68 PLAY/PAUSE");
        assert_eq!(ir_event(0x99, 0).to_string(), "153");
    }

    #[test]
    fn ring_keeps_latest_records_and_counters() {
        let mut log = DiagnosticLog::<TickInstant, 2>::new();
        log.record(&ir_event(0x45, 10));
        log.record(&DiagnosticEvent::ButtonPressed {
            index: 3,
            started_at: TickInstant::from_millis(20),
            released_at: TickInstant::from_millis(270),
        });
        log.record(&ir_event(0x46, 300));

        assert_eq!(log.len(), 2);
        assert_eq!(log.ir_keys(), 2);
        assert_eq!(log.presses(), 1);
        assert_eq!(log.last_press(), Some(3));

        let latest = log.latest().copied().expect("latest record");
        assert_eq!(latest.id, 2);
        assert_eq!(latest.timestamp, TickInstant::from_millis(300));
        assert_eq!(latest.kind, DiagnosticKind::IrKey { code: 0x46 });
        assert_eq!(latest.kind.to_string(), "ir-key 0x46 MODE");
    }
}
