#[allow(dead_code)]
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use session::{DEFAULT_SEED, Session};

const USAGE: &str = "Usage: parrot-emulator [--seed <u64>] [--transcript <path>]";

#[derive(Debug, Default)]
struct Options {
    seed: Option<u64>,
    transcript: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(options.seed.unwrap_or(DEFAULT_SEED))?;
    if let Some(path) = &options.transcript {
        session.attach_transcript(path)?;
    }
    let mut line = String::new();

    writeln!(
        writer,
        "Parrot Controller Emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };
        let mut value = |name: &str| {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Expected value after {name}"))
        };

        match flag.as_str() {
            "--seed" => {
                let raw = value("--seed")?;
                let seed = parse_seed(&raw).ok_or_else(|| format!("Invalid seed `{raw}`"))?;
                options.seed = Some(seed);
            }
            "--transcript" => options.transcript = Some(PathBuf::from(value("--transcript")?)),
            other => return Err(format!("Unknown argument `{other}`")),
        }
    }

    Ok(options)
}

fn parse_seed(raw: &str) -> Option<u64> {
    match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}
