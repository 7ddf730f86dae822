use embassy_stm32::exti::ExtiInput;
use parrot_core::time::ControllerInstant;

use crate::ir_capture::{IrCodeSender, IrFrontEnd};
use crate::time::FirmwareInstant;

#[embassy_executor::task]
pub async fn run(mut pin: ExtiInput<'static>, codes: IrCodeSender<'static>) -> ! {
    let mut front_end = IrFrontEnd::new();
    let mut last_edge = FirmwareInstant::now();

    loop {
        pin.wait_for_any_edge().await;
        let now = FirmwareInstant::now();
        let elapsed = now.saturating_duration_since(last_edge);
        last_edge = now;

        let Some(code) = front_end.on_edge(pin.is_high(), elapsed) else {
            continue;
        };
        if codes.try_send(code).is_err() {
            defmt::warn!(
                "ir: queue full, dropped code {=u16} ({=u32} bad frames so far)",
                code,
                front_end.errors()
            );
        }
    }
}
