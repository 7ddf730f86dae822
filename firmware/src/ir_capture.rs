//! Edge timing to remote codes.
//!
//! The IR receiver module demodulates the 38 kHz carrier and drives its
//! output low while the carrier is present. The capture task timestamps every
//! edge on that pin and hands the width of the level that just ended to
//! [`IrFrontEnd`], which turns NEC frames into command codes for the control
//! loop.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::time::Duration;

#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use parrot_core::io::IrReceiver;
use parrot_core::nec::{NecDecoder, NecError, NecEvent};

/// Codes buffered between the capture task and the control loop.
pub const IR_QUEUE_DEPTH: usize = 8;

#[cfg(target_os = "none")]
type IrMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type IrMutex = NoopRawMutex;

pub type IrCodeQueue = Channel<IrMutex, u16, IR_QUEUE_DEPTH>;
pub type IrCodeSender<'a> = Sender<'a, IrMutex, u16, IR_QUEUE_DEPTH>;
pub type IrCodeReceiver<'a> = Receiver<'a, IrMutex, u16, IR_QUEUE_DEPTH>;

/// Pulse decoder plus repeat handling.
#[derive(Copy, Clone, Debug, Default)]
pub struct IrFrontEnd {
    decoder: NecDecoder,
    last_command: Option<u16>,
    errors: u32,
}

impl IrFrontEnd {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoder: NecDecoder::new(),
            last_command: None,
            errors: 0,
        }
    }

    /// Handles one edge. `level_high` is the pin level after the edge and
    /// `elapsed` the time since the previous edge.
    ///
    /// Returns the command byte of a completed frame. A repeat frame yields
    /// the previous command again, leaving the debounce filter to collapse it.
    pub fn on_edge(&mut self, level_high: bool, elapsed: Duration) -> Option<u16> {
        // The receiver output is active-low: rising edges end a mark.
        let mark = level_high;
        match self.decoder.feed(mark, elapsed) {
            Ok(Some(NecEvent::Frame(frame))) => {
                let code = u16::from(frame.command);
                self.last_command = Some(code);
                Some(code)
            }
            Ok(Some(NecEvent::Repeat)) => self.last_command,
            Ok(None) => None,
            Err(error) => {
                self.errors = self.errors.wrapping_add(1);
                log_decode_error(error);
                None
            }
        }
    }

    /// Frames discarded since boot.
    #[must_use]
    pub const fn errors(&self) -> u32 {
        self.errors
    }
}

/// [`IrReceiver`] fed from the capture task's queue.
pub struct QueuedIrReceiver<'a> {
    receiver: IrCodeReceiver<'a>,
}

impl<'a> QueuedIrReceiver<'a> {
    pub fn new(receiver: IrCodeReceiver<'a>) -> Self {
        Self { receiver }
    }
}

impl IrReceiver for QueuedIrReceiver<'_> {
    fn try_receive(&mut self) -> Option<u16> {
        self.receiver.try_receive().ok()
    }
}

#[cfg(target_os = "none")]
fn log_decode_error(error: NecError) {
    match error {
        NecError::UnexpectedPulse { mark, width_us } => defmt::debug!(
            "ir: dropped frame at {} of {=u32}us",
            if mark { "mark" } else { "space" },
            width_us
        ),
        NecError::CommandParity { raw } => {
            defmt::debug!("ir: command parity mismatch raw={=u32:#x}", raw);
        }
    }
}

#[cfg(not(target_os = "none"))]
fn log_decode_error(error: NecError) {
    println!("ir: {error}");
}
