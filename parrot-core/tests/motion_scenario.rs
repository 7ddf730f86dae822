use core::time::Duration;

use parrot_core::config::TriggerConfig;
use parrot_core::io::{ActuatorBank, Clock, IrReceiver, NoopIrReceiver, PresenceSensor};
use parrot_core::runtime::ControlLoop;
use parrot_core::telemetry::{DiagnosticEvent, DiagnosticSink};
use parrot_core::time::{SimulatedClock, TickInstant};
use parrot_core::trigger::TickOutcome;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    Assert(usize),
    Release(usize),
}

#[derive(Default)]
struct RecordingBank {
    levels: [bool; 6],
    edges: Vec<Edge>,
}

impl ActuatorBank for RecordingBank {
    fn count(&self) -> usize {
        self.levels.len()
    }

    fn assert(&mut self, index: usize) {
        assert!(
            self.levels.iter().all(|asserted| !asserted),
            "two relays asserted at once"
        );
        self.levels[index] = true;
        self.edges.push(Edge::Assert(index));
    }

    fn release(&mut self, index: usize) {
        if self.levels[index] {
            self.edges.push(Edge::Release(index));
        }
        self.levels[index] = false;
    }
}

#[derive(Default)]
struct Pir(bool);

impl PresenceSensor for Pir {
    fn is_asserted(&mut self) -> bool {
        self.0
    }
}

#[derive(Default)]
struct Transcript(Vec<String>);

impl DiagnosticSink<TickInstant> for Transcript {
    fn record(&mut self, event: &DiagnosticEvent<TickInstant>) {
        if !matches!(event, DiagnosticEvent::BatchLoaded { .. }) {
            self.0.push(event.to_string());
        }
    }
}

type Controller<IR> = ControlLoop<Pir, RecordingBank, SimulatedClock, IR, SmallRng, 6>;

fn controller<IR: IrReceiver>(receiver: IR) -> Controller<IR> {
    let config = TriggerConfig::new(
        Duration::from_secs(10),
        Duration::from_millis(250),
        Duration::from_millis(120),
    );
    ControlLoop::new(
        Pir::default(),
        RecordingBank::default(),
        SimulatedClock::new(),
        receiver,
        SmallRng::seed_from_u64(2024),
        &config,
    )
    .expect("six relays")
}

fn motion_at<IR: IrReceiver>(
    control: &mut Controller<IR>,
    sink: &mut Transcript,
    millis: u64,
) -> TickOutcome<TickInstant> {
    control
        .clock_mut()
        .advance_to(TickInstant::from_millis(millis));
    control.sensor_mut().0 = true;
    let report = control.poll_once(sink);
    control.sensor_mut().0 = false;
    report.motion
}

#[test]
fn motion_inside_idle_window_is_ignored() {
    let mut control = controller(NoopIrReceiver);
    let mut sink = Transcript::default();

    let first = motion_at(&mut control, &mut sink, 0);
    let pressed = first.fired().expect("first motion fires").index;
    assert_eq!(control.clock().now(), TickInstant::from_millis(250));

    let second = motion_at(&mut control, &mut sink, 5_000);
    assert_eq!(
        second,
        TickOutcome::CoolingDown {
            remaining: Duration::from_millis(5_250)
        }
    );

    let third = motion_at(&mut control, &mut sink, 10_250);
    let next = third.fired().expect("idle window elapsed").index;
    assert_ne!(next, pressed);

    assert_eq!(
        control.bank().edges,
        vec![
            Edge::Assert(pressed),
            Edge::Release(pressed),
            Edge::Assert(next),
            Edge::Release(next),
        ]
    );
    assert_eq!(
        sink.0,
        vec![format!("Button: {pressed}"), format!("Button: {next}")]
    );
}

#[test]
fn idle_window_is_measured_from_release() {
    let mut control = controller(NoopIrReceiver);
    let mut sink = Transcript::default();

    motion_at(&mut control, &mut sink, 0)
        .fired()
        .expect("first motion fires");
    let early = motion_at(&mut control, &mut sink, 10_249);
    assert!(matches!(early, TickOutcome::CoolingDown { .. }));
    assert_eq!(control.cooldown_remaining(), Duration::from_millis(1));
}

#[test]
fn continuous_motion_presses_once_per_window() {
    let mut control = controller(NoopIrReceiver);
    let mut sink = Transcript::default();
    control.sensor_mut().0 = true;

    let mut pressed = Vec::new();
    while control.clock().now() < TickInstant::from_millis(60_000) {
        if let Some(index) = control.poll_once(&mut sink).pressed() {
            pressed.push(index);
        }
        control.clock_mut().advance(Duration::from_millis(10));
    }

    assert_eq!(pressed.len(), 6);
    for pair in pressed.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }
    let mut sorted = pressed.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(control.trigger().presses(), 6);
}

#[test]
fn hold_blocks_the_whole_loop() {
    let mut control = controller(NoopIrReceiver);
    let mut sink = Transcript::default();

    motion_at(&mut control, &mut sink, 1_000);

    assert_eq!(control.clock().total_blocked(), Duration::from_millis(250));
    assert_eq!(control.clock().now(), TickInstant::from_millis(1_250));
}
