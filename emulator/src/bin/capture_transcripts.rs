use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{DEFAULT_SEED, Session, TranscriptProfile};

fn main() -> io::Result<()> {
    record_profile(TranscriptProfile::MotionCooldown)?;
    record_profile(TranscriptProfile::IrDebounce)?;
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::recording(profile, DEFAULT_SEED)?;
    match profile {
        TranscriptProfile::MotionCooldown => record_motion(&mut session),
        TranscriptProfile::IrDebounce => record_ir(&mut session),
    }
}

fn record_motion(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("motion")?;
    let _ = session.handle_command("wait 4750ms")?;
    let _ = session.handle_command("motion")?;
    let _ = session.handle_command("wait 5250ms")?;
    let _ = session.handle_command("motion")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("motion on")?;
    let _ = session.handle_command("wait 60s")?;
    let _ = session.handle_command("motion off")?;
    let _ = session.handle_command("status")?;
    Ok(())
}

fn record_ir(session: &mut Session) -> io::Result<()> {
    let _ = session.handle_command("ir 0x44")?;
    let _ = session.handle_command("wait 50ms")?;
    let _ = session.handle_command("ir 0x44")?;
    let _ = session.handle_command("wait 200ms")?;
    let _ = session.handle_command("ir 0x44")?;
    let _ = session.handle_command("wait 300ms")?;
    let _ = session.handle_command("ir 0x99")?;
    let _ = session.handle_command("wait 300ms")?;
    let _ = session.handle_command("ir 22")?;
    let _ = session.handle_command("status")?;
    Ok(())
}
