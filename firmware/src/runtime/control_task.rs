use embassy_time::Ticker;
use parrot_core::config::{BUTTON_COUNT, POLL_INTERVAL};
use parrot_core::runtime::ControlLoop;
use rand::rngs::SmallRng;

use crate::hw::{EmbassyClock, PirSensor, RelayBank};
use crate::ir_capture::QueuedIrReceiver;
use crate::telemetry::TelemetryRecorder;
use crate::time::to_embassy;

pub type Controller = ControlLoop<
    PirSensor<'static>,
    RelayBank<'static>,
    EmbassyClock,
    QueuedIrReceiver<'static>,
    SmallRng,
    BUTTON_COUNT,
>;

#[embassy_executor::task]
pub async fn run(mut control: Controller, mut telemetry: TelemetryRecorder) -> ! {
    let idle = control.trigger().gate().idle();
    defmt::info!(
        "parrot: ready, {=usize} buttons, idle={=u64}s hold={=u64}ms",
        BUTTON_COUNT,
        idle.as_secs(),
        u64::try_from(control.trigger().hold().as_millis()).unwrap_or(u64::MAX)
    );

    let mut ticker = Ticker::every(to_embassy(POLL_INTERVAL));
    loop {
        if control.poll_once(&mut telemetry).pressed().is_some() {
            defmt::debug!("parrot: {=u32} presses since boot", telemetry.log().presses());
        }
        ticker.next().await;
    }
}
