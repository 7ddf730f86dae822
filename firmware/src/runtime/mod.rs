use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::hw::entropy::VrefintNoise;
use crate::hw::{EmbassyClock, IR_PIN, PIR_PIN, PirSensor, RelayBank};
use crate::ir_capture::{IrCodeQueue, QueuedIrReceiver};
use crate::telemetry::TelemetryRecorder;
use parrot_core::config::TriggerConfig;
use parrot_core::runtime::ControlLoop;

mod control_task;
mod ir_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

pub(super) static IR_QUEUE: IrCodeQueue = IrCodeQueue::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let hal::Peripherals {
        PA0,
        PA1,
        PA4,
        PA5,
        PA6,
        PA7,
        PB0,
        PB1,
        EXTI1,
        ADC1,
        ..
    } = hal::init(config);

    // Relays are active-low; start released.
    let relays = RelayBank::new([
        Output::new(PA4, Level::High, Speed::Low),
        Output::new(PA5, Level::High, Speed::Low),
        Output::new(PA6, Level::High, Speed::Low),
        Output::new(PA7, Level::High, Speed::Low),
        Output::new(PB0, Level::High, Speed::Low),
        Output::new(PB1, Level::High, Speed::Low),
    ]);
    let pir = PirSensor::new(Input::new(PA0, Pull::Down));
    let ir_pin = ExtiInput::new(PA1, EXTI1, Pull::Up);

    let seed = VrefintNoise::new(ADC1).seed();
    defmt::info!(
        "parrot: boot seed={=u64:#x} pir={=str} ir={=str}",
        seed,
        PIR_PIN,
        IR_PIN
    );

    let control = match ControlLoop::new(
        pir,
        relays,
        EmbassyClock,
        QueuedIrReceiver::new(IR_QUEUE.receiver()),
        SmallRng::seed_from_u64(seed),
        &TriggerConfig::DEFAULT,
    ) {
        Ok(control) => control,
        Err(error) => {
            defmt::error!("parrot: invalid wiring: {}", defmt::Display2Format(&error));
            loop {
                core::future::pending::<()>().await;
            }
        }
    };

    spawner
        .spawn(ir_task::run(ir_pin, IR_QUEUE.sender()))
        .expect("failed to spawn IR capture task");

    spawner
        .spawn(control_task::run(control, TelemetryRecorder::new()))
        .expect("failed to spawn control task");

    core::future::pending::<()>().await;
}
