#![no_std]

// Shared logic for the motion-triggered parrot controller.
//
// Everything here builds without the Rust standard library so the firmware
// and the host emulator drive the exact same scheduling, cooldown and IR
// decoding code.

pub mod config;
pub mod gate;
pub mod io;
pub mod ir;
pub mod nec;
pub mod runtime;
pub mod scheduler;
pub mod telemetry;
pub mod time;
pub mod trigger;
