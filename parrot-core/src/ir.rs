//! Remote-control key table and receiver auto-repeat filter.
//!
//! Raw codes are the NEC command byte reported by the receiver. Decoding is
//! only used for diagnostics; nothing in the trigger path depends on it.

use core::{fmt, time::Duration};

use crate::time::ControllerInstant;

/// Label reported for codes missing from the table.
pub const ERROR_LABEL: &str = "ERROR";

/// Keys on the 21-button remote shipped with the receiver module.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RemoteKey {
    Digit(u8),
    Plus,
    Minus,
    Eq,
    UsbSd,
    Cycle,
    PlayPause,
    Forward,
    Backward,
    Power,
    Mute,
    Mode,
}

/// Raw code to key mapping.
pub const KEY_TABLE: [(u16, RemoteKey); 21] = [
    (0x16, RemoteKey::Digit(0)),
    (0x0C, RemoteKey::Digit(1)),
    (0x18, RemoteKey::Digit(2)),
    (0x5E, RemoteKey::Digit(3)),
    (0x08, RemoteKey::Digit(4)),
    (0x1C, RemoteKey::Digit(5)),
    (0x5A, RemoteKey::Digit(6)),
    (0x42, RemoteKey::Digit(7)),
    (0x52, RemoteKey::Digit(8)),
    (0x4A, RemoteKey::Digit(9)),
    (0x09, RemoteKey::Plus),
    (0x15, RemoteKey::Minus),
    (0x07, RemoteKey::Eq),
    (0x0D, RemoteKey::UsbSd),
    (0x19, RemoteKey::Cycle),
    (0x44, RemoteKey::PlayPause),
    (0x43, RemoteKey::Forward),
    (0x40, RemoteKey::Backward),
    (0x45, RemoteKey::Power),
    (0x47, RemoteKey::Mute),
    (0x46, RemoteKey::Mode),
];

impl RemoteKey {
    /// Looks up the key for a raw code.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        KEY_TABLE
            .iter()
            .find(|(raw, _)| *raw == code)
            .map(|(_, key)| *key)
    }

    /// Raw code emitted by the remote for this key.
    #[must_use]
    pub fn code(self) -> u16 {
        KEY_TABLE
            .iter()
            .find(|(_, key)| *key == self)
            .map_or(0, |(raw, _)| *raw)
    }

    /// Label printed in diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RemoteKey::Digit(digit) => match digit {
                0 => "0",
                1 => "1",
                2 => "2",
                3 => "3",
                4 => "4",
                5 => "5",
                6 => "6",
                7 => "7",
                8 => "8",
                9 => "9",
                _ => ERROR_LABEL,
            },
            RemoteKey::Plus => "+",
            RemoteKey::Minus => "-",
            RemoteKey::Eq => "EQ",
            RemoteKey::UsbSd => "U/SD",
            RemoteKey::Cycle => "CYCLE",
            RemoteKey::PlayPause => "PLAY/PAUSE",
            RemoteKey::Forward => "FORWARD",
            RemoteKey::Backward => "BACKWARD",
            RemoteKey::Power => "POWER",
            RemoteKey::Mute => "MUTE",
            RemoteKey::Mode => "MODE",
        }
    }
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a raw code to its label, or [`ERROR_LABEL`] when unknown.
#[must_use]
pub fn decode(code: u16) -> &'static str {
    RemoteKey::from_code(code).map_or(ERROR_LABEL, RemoteKey::label)
}

/// Drops codes that arrive within the debounce window of the last accepted one.
///
/// This absorbs the receiver's auto-repeat while a button is held. It does not
/// compare code values: two different keys pressed quickly are also merged.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IrDebouncer<I> {
    window: Duration,
    last_accepted: Option<I>,
}

impl<I: ControllerInstant> IrDebouncer<I> {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Returns `true` when a code received at `now` should be forwarded.
    ///
    /// The window must be strictly exceeded.
    pub fn accept(&mut self, now: I) -> bool {
        let accepted = match self.last_accepted {
            Some(previous) => now.saturating_duration_since(previous) > self.window,
            None => true,
        };
        if accepted {
            self.last_accepted = Some(now);
        }
        accepted
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

/// A code that passed the debounce filter.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IrKeyPress<I> {
    pub code: u16,
    pub key: Option<RemoteKey>,
    pub received_at: I,
}

impl<I> IrKeyPress<I> {
    /// Decoded label, or [`ERROR_LABEL`].
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.key.map_or(ERROR_LABEL, RemoteKey::label)
    }
}

/// Debounce filter plus key table.
#[derive(Copy, Clone, Debug)]
pub struct IrKeyDecoder<I> {
    debouncer: IrDebouncer<I>,
    suppressed: u32,
}

impl<I: ControllerInstant> IrKeyDecoder<I> {
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            debouncer: IrDebouncer::new(window),
            suppressed: 0,
        }
    }

    /// Filters and decodes a freshly received code.
    pub fn receive(&mut self, code: u16, now: I) -> Option<IrKeyPress<I>> {
        if !self.debouncer.accept(now) {
            self.suppressed = self.suppressed.wrapping_add(1);
            return None;
        }
        Some(IrKeyPress {
            code,
            key: RemoteKey::from_code(code),
            received_at: now,
        })
    }

    /// Codes dropped by the debounce filter since boot.
    #[must_use]
    pub const fn suppressed(&self) -> u32 {
        self.suppressed
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.debouncer.window()
    }
}
