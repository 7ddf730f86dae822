//! Boot-time seed for the shuffle RNG.
//!
//! The G0 has no hardware RNG. The low bits of repeated VREFINT conversions
//! jitter from sample to sample; folding them together with the boot
//! timestamp gives every power cycle a different press order.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

/// Number of conversions folded into the seed.
pub const SEED_SAMPLES: usize = 64;

/// Mixes ADC readings into a 64-bit seed.
#[must_use]
pub fn fold_samples(samples: impl IntoIterator<Item = u16>, salt: u64) -> u64 {
    let mut state = salt ^ 0x9E37_79B9_7F4A_7C15;
    for sample in samples {
        state = state.rotate_left(5) ^ u64::from(sample);
        state = state.wrapping_mul(0x0100_0000_01B3);
    }
    state
}

#[cfg(target_os = "none")]
mod adc {
    use embassy_stm32::Peri;
    use embassy_stm32::adc::{Adc, SampleTime, VrefInt};
    use embassy_stm32::peripherals::ADC1;

    use super::{SEED_SAMPLES, fold_samples};
    use crate::time::FirmwareInstant;

    /// Embassy ADC wrapper that samples the internal reference.
    pub struct VrefintNoise<'d> {
        adc: Adc<'d, ADC1>,
        channel: VrefInt,
    }

    impl<'d> VrefintNoise<'d> {
        pub fn new(adc: Peri<'d, ADC1>) -> Self {
            let mut adc = Adc::new(adc);
            // Short sample time keeps the conversion noisy.
            adc.set_sample_time(SampleTime::CYCLES1_5);
            let channel = adc.enable_vrefint();
            Self { adc, channel }
        }

        fn read_once(&mut self) -> u16 {
            self.adc.blocking_read(&mut self.channel)
        }

        /// Produces a seed and releases the ADC.
        pub fn seed(mut self) -> u64 {
            // First conversion after enabling VREFINT is unsettled.
            let _ = self.read_once();
            let mut samples = [0_u16; SEED_SAMPLES];
            for sample in &mut samples {
                *sample = self.read_once();
            }
            fold_samples(samples, FirmwareInstant::now().as_micros())
        }
    }
}

#[cfg(target_os = "none")]
pub use adc::VrefintNoise;
