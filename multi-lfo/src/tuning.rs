//! Control-reading → oscillator parameter math.
//!
//! The DDS tuning word is the fraction of a period advanced per tick scaled to
//! the accumulator's full range: `round(2^32 * freq / tick_rate)`. Arithmetic
//! is done in `f64` because the control loop runs at ~10 Hz, and a 32-bit word
//! carries more precision than `f32` can represent.

use crate::constants::{CONTROL_MAX, DEFAULT_MAX_FREQ_HZ, DEFAULT_MIN_FREQ_HZ, DEPTH_UNITY};

/// Phase wheel size: the accumulator's full range.
const PHASE_RANGE: f64 = 4_294_967_296.0;

/// Frequency span a potentiometer sweeps, in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrequencyRange {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl FrequencyRange {
    pub const fn new(min_hz: f32, max_hz: f32) -> Self {
        FrequencyRange { min_hz, max_hz }
    }

    /// Finite, non-negative, and `min <= max`.
    pub fn is_valid(&self) -> bool {
        self.min_hz.is_finite()
            && self.max_hz.is_finite()
            && self.min_hz >= 0.0
            && self.min_hz <= self.max_hz
    }

    /// Linear map of a control reading in `[0, 1023]` onto the range.
    ///
    /// Readings above [`CONTROL_MAX`] are clamped. A full-scale reading yields
    /// exactly `max_hz`.
    pub fn frequency_at(&self, reading: u16) -> f64 {
        if reading >= CONTROL_MAX {
            return self.max_hz as f64;
        }
        let t = reading as f64 / CONTROL_MAX as f64;
        self.min_hz as f64 + t * (self.max_hz as f64 - self.min_hz as f64)
    }

    /// Tuning word for a control reading at the given tick rate.
    pub fn tuning_word_at(&self, reading: u16, tick_rate_hz: f32) -> u32 {
        tuning_word(self.frequency_at(reading), tick_rate_hz)
    }
}

impl Default for FrequencyRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_FREQ_HZ, DEFAULT_MAX_FREQ_HZ)
    }
}

/// `round(2^32 * freq / tick_rate)`, saturating at both ends of `u32`.
///
/// `tick_rate_hz` must be positive; [`LfoConfig::validate`](crate::config::LfoConfig::validate)
/// rejects configurations where it is not.
pub fn tuning_word(freq_hz: f64, tick_rate_hz: f32) -> u32 {
    let word = libm::round(PHASE_RANGE * freq_hz / tick_rate_hz as f64);
    if !(word > 0.0) {
        0
    } else if word >= u32::MAX as f64 {
        u32::MAX
    } else {
        word as u32
    }
}

/// Frequency produced by a tuning word at the given tick rate.
pub fn frequency_of(word: u32, tick_rate_hz: f32) -> f64 {
    word as f64 * tick_rate_hz as f64 / PHASE_RANGE
}

/// Depth for a control reading: `0 → 0`, `1023 → 1024`, linear in between.
pub fn depth_from_reading(reading: u16) -> u16 {
    let r = if reading > CONTROL_MAX { CONTROL_MAX } else { reading };
    ((r as u32 * DEPTH_UNITY as u32) / CONTROL_MAX as u32) as u16
}
