use core::time::Duration;

use parrot_core::config::TriggerConfig;
use parrot_core::io::{IrReceiver, NoopActuatorBank, NoopPresenceSensor};
use parrot_core::ir::{ERROR_LABEL, IrKeyDecoder, KEY_TABLE, RemoteKey, decode};
use parrot_core::nec::{NecDecoder, NecEvent, NecFrame};
use parrot_core::runtime::ControlLoop;
use parrot_core::telemetry::{DiagnosticKind, DiagnosticLog};
use parrot_core::time::{SimulatedClock, TickInstant};
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[test]
fn key_table_matches_remote_labels() {
    let expected = [
        (0x16, "0"),
        (0x0C, "1"),
        (0x18, "2"),
        (0x5E, "3"),
        (0x08, "4"),
        (0x1C, "5"),
        (0x5A, "6"),
        (0x42, "7"),
        (0x52, "8"),
        (0x4A, "9"),
        (0x09, "+"),
        (0x15, "-"),
        (0x07, "EQ"),
        (0x0D, "U/SD"),
        (0x19, "CYCLE"),
        (0x44, "PLAY/PAUSE"),
        (0x43, "FORWARD"),
        (0x40, "BACKWARD"),
        (0x45, "POWER"),
        (0x47, "MUTE"),
        (0x46, "MODE"),
    ];
    assert_eq!(KEY_TABLE.len(), expected.len());
    for (code, label) in expected {
        assert_eq!(decode(code), label, "code {code:#04x}");
    }
    assert_eq!(decode(0x00), ERROR_LABEL);
    assert_eq!(decode(0xFFFF), ERROR_LABEL);
}

#[test]
fn held_button_is_reported_once_per_window() {
    let mut decoder = IrKeyDecoder::new(Duration::from_millis(120));

    let first = decoder.receive(0x44, TickInstant::ZERO);
    let repeat = decoder.receive(0x44, TickInstant::from_millis(50));
    let later = decoder.receive(0x44, TickInstant::from_millis(250));

    assert_eq!(first.map(|press| press.key), Some(Some(RemoteKey::PlayPause)));
    assert!(repeat.is_none());
    assert_eq!(
        later.map(|press| press.received_at),
        Some(TickInstant::from_millis(250))
    );
    assert_eq!(decoder.suppressed(), 1);
}

#[test]
fn held_button_repeats_surface_every_other_frame() {
    // NEC repeat frames arrive every 108 ms while a key is held. Only accepted
    // codes restart the window, so every second repeat clears it.
    let mut decoder = IrKeyDecoder::new(Duration::from_millis(120));

    let forwarded: Vec<u64> = (0..8u64)
        .map(|frame| TickInstant::from_millis(frame * 108))
        .filter_map(|at| decoder.receive(0x44, at))
        .map(|press| press.received_at.as_millis())
        .collect();

    assert_eq!(forwarded, [0, 216, 432, 648]);
    assert_eq!(decoder.suppressed(), 4);
}

#[test]
fn window_edge_is_suppressed() {
    let mut decoder = IrKeyDecoder::new(Duration::from_millis(120));
    assert!(decoder.receive(0x45, TickInstant::ZERO).is_some());
    assert!(decoder.receive(0x45, TickInstant::from_millis(120)).is_none());
    assert!(decoder.receive(0x45, TickInstant::from_millis(241)).is_some());
}

#[test]
fn unknown_code_renders_raw_value() {
    let mut decoder = IrKeyDecoder::new(Duration::from_millis(120));
    let press = decoder
        .receive(0x99, TickInstant::ZERO)
        .expect("first code accepted");
    assert_eq!(press.key, None);
    assert_eq!(press.label(), ERROR_LABEL);
}

fn pulses_for(address: u8, command: u8) -> Vec<(bool, Duration)> {
    let raw = u32::from_le_bytes([address, !address, command, !command]);
    let mut pulses = vec![
        (true, Duration::from_micros(9_000)),
        (false, Duration::from_micros(4_500)),
    ];
    for bit in 0..32 {
        pulses.push((true, Duration::from_micros(560)));
        let space = if (raw >> bit) & 1 == 1 { 1_690 } else { 560 };
        pulses.push((false, Duration::from_micros(space)));
    }
    pulses.push((true, Duration::from_micros(560)));
    pulses
}

#[test]
fn nec_pulses_decode_to_table_entry() {
    let mut decoder = NecDecoder::new();
    let mut frames = Vec::new();
    for (mark, width) in pulses_for(0x00, 0x44) {
        if let Some(event) = decoder.feed(mark, width).expect("well-formed pulse") {
            frames.push(event);
        }
    }

    assert_eq!(
        frames,
        vec![NecEvent::Frame(NecFrame {
            address: 0x00,
            command: 0x44
        })]
    );
    assert_eq!(decode(0x44), "PLAY/PAUSE");
}

struct Burst(Vec<u16>);

impl IrReceiver for Burst {
    fn try_receive(&mut self) -> Option<u16> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.remove(0))
        }
    }
}

#[test]
fn remote_keys_reach_the_diagnostic_log() {
    let config = TriggerConfig::new(
        Duration::from_secs(10),
        Duration::from_millis(250),
        Duration::from_millis(120),
    );
    let mut control = ControlLoop::<_, _, _, _, _, 6>::new(
        NoopPresenceSensor,
        NoopActuatorBank::new(6),
        SimulatedClock::new(),
        Burst(vec![0x44, 0x44, 0x44]),
        SmallRng::seed_from_u64(1),
        &config,
    )
    .expect("valid wiring");
    let mut log = DiagnosticLog::<TickInstant>::new();

    for step in [0, 50, 250] {
        control
            .clock_mut()
            .advance_to(TickInstant::from_millis(step));
        let report = control.poll_once(&mut log);
        assert!(report.pressed().is_none());
    }

    let kinds: Vec<_> = log.oldest_first().map(|record| record.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::IrKey { code: 0x44 },
            DiagnosticKind::IrKey { code: 0x44 }
        ]
    );
    assert_eq!(control.ir_decoder().suppressed(), 1);
}
