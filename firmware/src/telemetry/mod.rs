//! Diagnostic console for the firmware.
//!
//! Every event is kept in a [`DiagnosticLog`] and mirrored to defmt on the
//! target (stdout on the host) using the same lines the controller has always
//! printed on its serial console.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use parrot_core::telemetry::{DiagnosticEvent, DiagnosticLog, DiagnosticSink};

use crate::time::FirmwareInstant;

/// Diagnostic sink handed to the control loop.
pub struct TelemetryRecorder {
    log: DiagnosticLog<FirmwareInstant>,
}

impl TelemetryRecorder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            log: DiagnosticLog::new(),
        }
    }

    #[must_use]
    pub const fn log(&self) -> &DiagnosticLog<FirmwareInstant> {
        &self.log
    }
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink<FirmwareInstant> for TelemetryRecorder {
    fn record(&mut self, event: &DiagnosticEvent<FirmwareInstant>) {
        self.log.record(event);
        emit_log(event);
    }
}

#[cfg(target_os = "none")]
fn emit_log(event: &DiagnosticEvent<FirmwareInstant>) {
    let timestamp_ms = event.timestamp().as_millis();
    match event {
        DiagnosticEvent::BatchLoaded { report, .. } => defmt::info!(
            "t={}ms {} (rejected={} fallbacks={})",
            timestamp_ms,
            defmt::Display2Format(report),
            report.rejected(),
            report.fallbacks()
        ),
        DiagnosticEvent::ButtonPressed { released_at, .. } => defmt::info!(
            "t={}ms {} released t={}ms",
            timestamp_ms,
            defmt::Display2Format(event),
            released_at.as_millis()
        ),
        DiagnosticEvent::IrKey(_) => {
            defmt::info!("t={}ms {}", timestamp_ms, defmt::Display2Format(event));
        }
    }
}

#[cfg(not(target_os = "none"))]
fn emit_log(event: &DiagnosticEvent<FirmwareInstant>) {
    println!("t={} {event}", event.timestamp());
}
