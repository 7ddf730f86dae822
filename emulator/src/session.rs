use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use parrot_core::config::{BUTTON_COUNT, POLL_INTERVAL, TriggerConfig};
use parrot_core::io::{ALL_ACTUATORS, ActuatorBank, Clock, IrReceiver, PresenceSensor};
use parrot_core::runtime::{ControlLoop, PollReport};
use parrot_core::telemetry::{DiagnosticEvent, DiagnosticLog, DiagnosticSink};
use parrot_core::time::{ControllerInstant, SimulatedClock, TickInstant};
use parrot_core::trigger::TickOutcome;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use winnow::ascii::{Caseless, digit1, hex_digit1, space0, space1};
use winnow::combinator::{alt, eof, opt, preceded, terminated};
use winnow::prelude::*;
use winnow::token::take_while;

pub const DEFAULT_SEED: u64 = 0x5EED;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "motion",
        "motion [on|off]              - pulse the PIR, or hold it high/low",
    ),
    (
        "wait",
        "wait <n>ms|<n>s              - advance simulated time, polling every 10ms",
    ),
    (
        "ir",
        "ir <code>                    - deliver a remote code (decimal or 0x hex)",
    ),
    (
        "status",
        "status                       - show counters, cooldown and batch state",
    ),
    (
        "help",
        "help [topic]                 - show help for a command",
    ),
];

/// Canned scenarios replayed by `capture_transcripts`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    MotionCooldown,
    IrDebounce,
}

impl TranscriptProfile {
    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::MotionCooldown => "transcripts/emulator-motion.log",
            TranscriptProfile::IrDebounce => "transcripts/emulator-ir.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::MotionCooldown => "Parrot emulator motion cooldown transcript",
            TranscriptProfile::IrDebounce => "Parrot emulator remote debounce transcript",
        }
    }
}

/// A parsed script line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command<'a> {
    /// `None` pulses the sensor for a single poll.
    Motion(Option<bool>),
    Wait(Duration),
    Ir(u16),
    Status,
    Help(Option<&'a str>),
}

pub fn parse_command(line: &str) -> Result<Command<'_>, String> {
    command.parse(line.trim()).map_err(|err| err.to_string())
}

fn command<'a>(input: &mut &'a str) -> ModalResult<Command<'a>> {
    terminated(
        alt((
            preceded(Caseless("motion"), opt(preceded(space1, on_off))).map(Command::Motion),
            preceded((Caseless("wait"), space1), duration).map(Command::Wait),
            preceded((Caseless("ir"), space1), ir_code).map(Command::Ir),
            Caseless("status").value(Command::Status),
            preceded(Caseless("help"), opt(preceded(space1, topic))).map(Command::Help),
        )),
        (space0, eof),
    )
    .parse_next(input)
}

fn on_off(input: &mut &str) -> ModalResult<bool> {
    alt((Caseless("on").value(true), Caseless("off").value(false))).parse_next(input)
}

fn duration(input: &mut &str) -> ModalResult<Duration> {
    (
        digit1.try_map(str::parse::<u64>),
        alt((Caseless("ms").value(1_u64), Caseless("s").value(1_000_u64))),
    )
        .map(|(count, scale)| Duration::from_millis(count.saturating_mul(scale)))
        .parse_next(input)
}

fn ir_code(input: &mut &str) -> ModalResult<u16> {
    alt((
        preceded(
            Caseless("0x"),
            hex_digit1.try_map(|digits| u16::from_str_radix(digits, 16)),
        ),
        digit1.try_map(str::parse::<u16>),
    ))
    .parse_next(input)
}

fn topic<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric()).parse_next(input)
}

type EmulatedControl =
    ControlLoop<ScriptedPir, RecordingBank, SimulatedClock, ScriptedRemote, SmallRng, BUTTON_COUNT>;

pub struct Session {
    control: EmulatedControl,
    log: DiagnosticLog<TickInstant>,
    transcript: Option<TranscriptLogger>,
    seed: u64,
}

impl Session {
    pub fn new(seed: u64) -> io::Result<Self> {
        let control = ControlLoop::new(
            ScriptedPir::default(),
            RecordingBank::default(),
            SimulatedClock::new(),
            ScriptedRemote::default(),
            SmallRng::seed_from_u64(seed),
            &TriggerConfig::DEFAULT,
        )
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

        Ok(Self {
            control,
            log: DiagnosticLog::new(),
            transcript: None,
            seed,
        })
    }

    /// Session whose exchanges are written to the profile's transcript file.
    pub fn recording(profile: TranscriptProfile, seed: u64) -> io::Result<Self> {
        let mut session = Self::new(seed)?;
        let header = format!("{} seed={seed}", profile.header());
        session.transcript = Some(TranscriptLogger::create(
            Path::new(profile.log_path()),
            &header,
        )?);
        Ok(session)
    }

    /// Appends every exchange to `path`.
    pub fn attach_transcript(&mut self, path: &Path) -> io::Result<()> {
        let header = format!("Parrot emulator session seed={}", self.seed);
        self.transcript = Some(TranscriptLogger::append(path, &header)?);
        Ok(())
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let now = self.now();
        if let Some(transcript) = &mut self.transcript {
            transcript.append_line(now, TranscriptRole::Host, trimmed)?;
        }

        let lines = match parse_command(trimmed) {
            Ok(Command::Motion(None)) => self.pulse_motion(),
            Ok(Command::Motion(Some(level))) => {
                self.control.sensor_mut().asserted = level;
                let mut lines = vec![format!(
                    "PIR held {}",
                    if level { "high" } else { "low" }
                )];
                if level {
                    lines.extend(self.poll());
                }
                lines
            }
            Ok(Command::Wait(duration)) => self.wait(duration),
            Ok(Command::Ir(code)) => {
                self.control.receiver_mut().push(code);
                self.poll()
            }
            Ok(Command::Status) => self.status(),
            Ok(Command::Help(topic)) => help(topic),
            Err(err) => vec![format!("ERR syntax {}", err.trim_end())],
        };

        self.record_output(&lines)?;
        Ok(lines)
    }

    pub fn now(&self) -> TickInstant {
        self.control.clock().now()
    }

    pub fn log(&self) -> &DiagnosticLog<TickInstant> {
        &self.log
    }

    fn pulse_motion(&mut self) -> Vec<String> {
        let held = self.control.sensor_mut().asserted;
        self.control.sensor_mut().asserted = true;
        let lines = self.poll();
        self.control.sensor_mut().asserted = held;
        lines
    }

    /// Advances simulated time, polling at the loop cadence. A press that
    /// blocks past the deadline ends the wait late, like the real loop.
    fn wait(&mut self, duration: Duration) -> Vec<String> {
        let deadline = self.now() + duration;
        let mut lines = Vec::new();
        while self.now() < deadline {
            lines.extend(self.poll_quiet());
            let now = self.now();
            if now < deadline {
                let step = deadline.saturating_duration_since(now).min(POLL_INTERVAL);
                self.control.clock_mut().advance(step);
            }
        }
        lines.push(format!("now {}", self.now()));
        lines
    }

    fn poll(&mut self) -> Vec<String> {
        let (report, mut lines) = self.poll_once();
        match report.motion {
            TickOutcome::NoMotion if report.ir.is_none() => lines.push("idle".to_string()),
            TickOutcome::CoolingDown { remaining } => {
                lines.push(format!(
                    "motion ignored, cooling down {} more",
                    format_duration_short(remaining)
                ));
            }
            _ => {}
        }
        lines
    }

    /// Poll used while waiting; motion inside the idle window is not narrated.
    fn poll_quiet(&mut self) -> Vec<String> {
        self.poll_once().1
    }

    fn poll_once(&mut self) -> (PollReport<TickInstant>, Vec<String>) {
        let mut console = ConsoleSink {
            log: &mut self.log,
            lines: Vec::new(),
        };
        let report = self.control.poll_once(&mut console);
        let mut lines = console.lines;
        lines.extend(
            self.control
                .bank_mut()
                .drain_edges()
                .map(|(index, asserted)| describe_edge(index, asserted)),
        );
        (report, lines)
    }

    fn status(&self) -> Vec<String> {
        let trigger = self.control.trigger();
        let scheduler = trigger.scheduler();
        let remaining = self.control.cooldown_remaining();

        let mut lines = vec![
            format!(
                "time={} pir={} seed={}",
                self.now(),
                if self.control.sensor().asserted {
                    "high"
                } else {
                    "low"
                },
                self.seed
            ),
            format!(
                "presses={} batches={} ir-keys={} ir-suppressed={} ir-window={} polls={}",
                self.log.presses(),
                self.log.batches(),
                self.log.ir_keys(),
                self.control.ir_decoder().suppressed(),
                format_duration_short(self.control.ir_decoder().window()),
                self.control.polls()
            ),
        ];

        if remaining.is_zero() {
            lines.push("cooldown=ready".to_string());
        } else {
            lines.push(format!(
                "cooldown={} remaining (idle={})",
                format_duration_short(remaining),
                format_duration_short(trigger.gate().idle())
            ));
        }

        let queued: Vec<String> = scheduler.remaining().iter().map(usize::to_string).collect();
        lines.push(if queued.is_empty() {
            "batch exhausted, next motion reshuffles".to_string()
        } else {
            format!("batch remaining: {}", queued.join(" "))
        });

        if let Some(last) = self.log.last_press() {
            lines.push(format!("last press: {last}"));
        }

        let relays: Vec<String> = ALL_ACTUATORS
            .iter()
            .map(|line| {
                let asserted = self.control.bank().is_asserted(line.index);
                let level = if line.polarity.level_for(asserted) {
                    "high"
                } else {
                    "low"
                };
                format!("{}={level}", line.name)
            })
            .collect();
        lines.push(format!("relays: {}", relays.join(" ")));
        lines
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        let now = self.now();
        if let Some(transcript) = &mut self.transcript {
            for line in lines {
                transcript.append_line(now, TranscriptRole::Emulator, line)?;
            }
        }
        Ok(())
    }
}

fn help(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Mirrors diagnostics into the session log and the console.
struct ConsoleSink<'a> {
    log: &'a mut DiagnosticLog<TickInstant>,
    lines: Vec<String>,
}

impl DiagnosticSink<TickInstant> for ConsoleSink<'_> {
    fn record(&mut self, event: &DiagnosticEvent<TickInstant>) {
        self.log.record(event);
        let timestamp = event.timestamp().to_string();
        self.lines.push(format!("[{timestamp:>9}] {event}"));
    }
}

#[derive(Debug, Default)]
struct ScriptedPir {
    asserted: bool,
}

impl PresenceSensor for ScriptedPir {
    fn is_asserted(&mut self) -> bool {
        self.asserted
    }
}

#[derive(Debug, Default)]
struct ScriptedRemote {
    codes: VecDeque<u16>,
}

impl ScriptedRemote {
    fn push(&mut self, code: u16) {
        self.codes.push_back(code);
    }
}

impl IrReceiver for ScriptedRemote {
    fn try_receive(&mut self) -> Option<u16> {
        self.codes.pop_front()
    }
}

/// In-memory relays that remember every edge until drained.
#[derive(Debug, Default)]
struct RecordingBank {
    asserted: [bool; BUTTON_COUNT],
    edges: Vec<(usize, bool)>,
}

impl RecordingBank {
    fn is_asserted(&self, index: usize) -> bool {
        self.asserted.get(index).copied().unwrap_or(false)
    }

    fn drain_edges(&mut self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.edges.drain(..)
    }

    fn set(&mut self, index: usize, asserted: bool) {
        let Some(slot) = self.asserted.get_mut(index) else {
            return;
        };
        if *slot != asserted {
            *slot = asserted;
            self.edges.push((index, asserted));
        }
    }
}

impl ActuatorBank for RecordingBank {
    fn count(&self) -> usize {
        BUTTON_COUNT
    }

    fn assert(&mut self, index: usize) {
        self.set(index, true);
    }

    fn release(&mut self, index: usize) {
        self.set(index, false);
    }
}

fn describe_edge(index: usize, asserted: bool) -> String {
    match ALL_ACTUATORS.get(index) {
        Some(line) => format!(
            "  relay {} pin={} {} ({})",
            line.name,
            line.mcu_pin,
            if line.polarity.level_for(asserted) {
                "high"
            } else {
                "low"
            },
            if asserted { "asserted" } else { "released" }
        ),
        None => format!("  relay #{index} {}", if asserted { "asserted" } else { "released" }),
    }
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn create(path: &Path, header: &str) -> io::Result<Self> {
        Self::open(path, header, false)
    }

    fn append(path: &Path, header: &str) -> io::Result<Self> {
        Self::open(path, header, true)
    }

    fn open(path: &Path, header: &str, append: bool) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(self.writer, "# Timestamps are simulated controller time")?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, now: TickInstant, role: TranscriptRole, line: &str) -> io::Result<()> {
        let timestamp = now.to_string();
        writeln!(self.writer, "[{timestamp:>9}] {} {line}", role.prefix())?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
