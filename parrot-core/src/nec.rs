//! NEC infrared frame decoder.
//!
//! Fed with the width of each mark (carrier on) and space (carrier off) as
//! measured by the receiver pin. A frame is a 9 ms leader mark, a 4.5 ms
//! space, 32 data bits sent LSB first (address, address or its inverse,
//! command, inverted command) and a trailing stop mark. Holding a button sends
//! repeat frames: a leader mark, a 2.25 ms space and a stop mark.

use core::{fmt, time::Duration};

const LEADER_MARK_US: u32 = 9_000;
const LEADER_SPACE_US: u32 = 4_500;
const REPEAT_SPACE_US: u32 = 2_250;
const BIT_MARK_US: u32 = 562;
const ZERO_SPACE_US: u32 = 562;
const ONE_SPACE_US: u32 = 1_687;

/// Data bits carried by a full frame.
pub const FRAME_BITS: u8 = 32;

/// Decoded NEC event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NecEvent {
    Frame(NecFrame),
    /// The button is still held.
    Repeat,
}

/// Address and command carried by a full frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NecFrame {
    /// 8-bit address, or 16-bit for extended NEC remotes.
    pub address: u16,
    pub command: u8,
}

impl NecFrame {
    /// Splits the 32 received bits, validating the inverted command byte.
    ///
    /// # Errors
    ///
    /// Returns [`NecError::CommandParity`] when the command and its inverse disagree.
    pub fn from_raw(raw: u32) -> Result<Self, NecError> {
        let [address_lo, address_hi, command, command_inv] = raw.to_le_bytes();
        if command != !command_inv {
            return Err(NecError::CommandParity { raw });
        }
        let address = if address_lo == !address_hi {
            u16::from(address_lo)
        } else {
            u16::from_le_bytes([address_lo, address_hi])
        };
        Ok(Self { address, command })
    }
}

/// Reasons a frame in progress was discarded.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NecError {
    /// A pulse did not match the expected width for the current state.
    UnexpectedPulse { mark: bool, width_us: u32 },
    /// Command byte did not match its inverse.
    CommandParity { raw: u32 },
}

impl fmt::Display for NecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NecError::UnexpectedPulse { mark, width_us } => {
                let kind = if *mark { "mark" } else { "space" };
                write!(f, "unexpected {kind} of {width_us}us")
            }
            NecError::CommandParity { raw } => write!(f, "command parity mismatch in {raw:#010x}"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    Idle,
    LeaderSpace,
    BitMark { bits: u8, value: u32 },
    BitSpace { bits: u8, value: u32 },
    StopMark { value: u32 },
    RepeatStop,
}

/// Pulse-width state machine producing [`NecEvent`]s.
#[derive(Copy, Clone, Debug)]
pub struct NecDecoder {
    state: State,
}

impl Default for NecDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl NecDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// `true` while no frame is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Consumes one pulse. `mark` is `true` for carrier-on periods.
    ///
    /// Returns `Ok(Some(event))` when a frame or repeat completes and
    /// `Ok(None)` while more pulses are needed. Gaps between frames are long
    /// spaces and are ignored while idle.
    ///
    /// # Errors
    ///
    /// Returns [`NecError`] when the pulse breaks the frame in progress; the
    /// decoder is back in its idle state afterwards.
    pub fn feed(&mut self, mark: bool, width: Duration) -> Result<Option<NecEvent>, NecError> {
        let width_us = u32::try_from(width.as_micros()).unwrap_or(u32::MAX);
        let unexpected = NecError::UnexpectedPulse { mark, width_us };

        let (next, result) = match (self.state, mark) {
            (State::Idle, true) if matches_width(width_us, LEADER_MARK_US) => {
                (State::LeaderSpace, Ok(None))
            }
            (State::Idle, _) => (State::Idle, Ok(None)),
            (State::LeaderSpace, false) if matches_width(width_us, LEADER_SPACE_US) => (
                State::BitMark { bits: 0, value: 0 },
                Ok(None),
            ),
            (State::LeaderSpace, false) if matches_width(width_us, REPEAT_SPACE_US) => {
                (State::RepeatStop, Ok(None))
            }
            (State::BitMark { bits, value }, true) if matches_width(width_us, BIT_MARK_US) => {
                (State::BitSpace { bits, value }, Ok(None))
            }
            (State::BitSpace { bits, value }, false) => {
                let bit = if matches_width(width_us, ZERO_SPACE_US) {
                    Some(0_u32)
                } else if matches_width(width_us, ONE_SPACE_US) {
                    Some(1_u32)
                } else {
                    None
                };
                match bit {
                    Some(bit) => {
                        let value = value | (bit << bits);
                        let bits = bits + 1;
                        if bits == FRAME_BITS {
                            (State::StopMark { value }, Ok(None))
                        } else {
                            (State::BitMark { bits, value }, Ok(None))
                        }
                    }
                    None => (State::Idle, Err(unexpected)),
                }
            }
            (State::StopMark { value }, true) if matches_width(width_us, BIT_MARK_US) => (
                State::Idle,
                NecFrame::from_raw(value).map(|frame| Some(NecEvent::Frame(frame))),
            ),
            (State::RepeatStop, true) if matches_width(width_us, BIT_MARK_US) => {
                (State::Idle, Ok(Some(NecEvent::Repeat)))
            }
            // A leader mark restarts the frame even mid-way through another.
            (_, true) if matches_width(width_us, LEADER_MARK_US) => {
                (State::LeaderSpace, Err(unexpected))
            }
            _ => (State::Idle, Err(unexpected)),
        };

        self.state = next;
        result
    }
}

/// Accepts widths within ±25 % of nominal.
fn matches_width(width_us: u32, nominal_us: u32) -> bool {
    let slack = nominal_us / 4;
    width_us >= nominal_us - slack && width_us <= nominal_us + slack
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us(value: u32) -> Duration {
        Duration::from_micros(u64::from(value))
    }

    fn frame_pulses(raw: u32, mut sink: impl FnMut(bool, Duration)) {
        sink(true, us(LEADER_MARK_US));
        sink(false, us(LEADER_SPACE_US));
        for bit in 0..FRAME_BITS {
            sink(true, us(BIT_MARK_US));
            let space = if (raw >> bit) & 1 == 1 {
                ONE_SPACE_US
            } else {
                ZERO_SPACE_US
            };
            sink(false, us(space));
        }
        sink(true, us(BIT_MARK_US));
    }

    fn raw_frame(address: u8, command: u8) -> u32 {
        u32::from_le_bytes([address, !address, command, !command])
    }

    #[test]
    fn decodes_full_frame() {
        let mut decoder = NecDecoder::new();
        let mut events = heapless::Vec::<NecEvent, 4>::new();

        frame_pulses(raw_frame(0x00, 0x45), |mark, width| {
            if let Some(event) = decoder.feed(mark, width).expect("valid pulse") {
                events.push(event).expect("room for event");
            }
        });

        assert_eq!(
            events.as_slice(),
            &[NecEvent::Frame(NecFrame {
                address: 0x00,
                command: 0x45
            })]
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn tolerates_receiver_jitter() {
        let mut decoder = NecDecoder::new();
        assert_eq!(decoder.feed(true, us(8_200)), Ok(None));
        assert_eq!(decoder.feed(false, us(2_500)), Ok(None));
        assert_eq!(decoder.feed(true, us(650)), Ok(Some(NecEvent::Repeat)));
    }

    #[test]
    fn extended_address_is_kept_whole() {
        let raw = u32::from_le_bytes([0x12, 0x34, 0x44, !0x44]);
        assert_eq!(
            NecFrame::from_raw(raw),
            Ok(NecFrame {
                address: 0x3412,
                command: 0x44
            })
        );
    }

    #[test]
    fn parity_mismatch_is_reported() {
        let raw = u32::from_le_bytes([0x00, 0xFF, 0x44, 0x44]);
        assert_eq!(NecFrame::from_raw(raw), Err(NecError::CommandParity { raw }));
    }

    #[test]
    fn malformed_bit_resets_decoder() {
        let mut decoder = NecDecoder::new();
        decoder.feed(true, us(LEADER_MARK_US)).expect("leader");
        decoder.feed(false, us(LEADER_SPACE_US)).expect("space");
        decoder.feed(true, us(BIT_MARK_US)).expect("bit mark");

        let err = decoder.feed(false, us(3_000)).expect_err("bad bit space");
        assert_eq!(
            err,
            NecError::UnexpectedPulse {
                mark: false,
                width_us: 3_000
            }
        );
        assert!(decoder.is_idle());
    }

    #[test]
    fn idle_gaps_are_ignored() {
        let mut decoder = NecDecoder::new();
        assert_eq!(decoder.feed(false, Duration::from_millis(40)), Ok(None));
        assert_eq!(decoder.feed(true, us(300)), Ok(None));
        assert!(decoder.is_idle());
    }
}
