//! Per-channel DDS oscillator state.
//!
//! A [`DdsChannel`] is shared between the tick interrupt (which advances the
//! phase and reads the parameters) and the polling control loop (which
//! publishes parameters and resets the phase on sync). Every field is an
//! atomic, so the struct is `Sync` and can sit in a `static` without locks.
//!
//! ## Field ownership
//!
//! | Field | Writer | Reader |
//! |-------|--------|--------|
//! | `accumulator` | tick ISR (advance), sync handler (reset) | tick ISR |
//! | `tuning_word` | parameter controller | tick ISR |
//! | `waveform` | parameter controller | tick ISR |
//! | `depth` | parameter controller | tick ISR |
//!
//! Parameter fields are independently valid, so a tick that observes a new
//! tuning word alongside an old waveform is harmless. All accesses use
//! `Relaxed` ordering for that reason.

use core::sync::atomic::{AtomicU16, AtomicU32, AtomicU8, Ordering};

use crate::constants::{DEPTH_UNITY, PHASE_INDEX_SHIFT};
use crate::wavetables::{self, Waveform};

/// One oscillator: phase accumulator, tuning word, waveform and depth.
pub struct DdsChannel {
    /// Phase accumulator (wraps naturally at 32 bits = one period).
    accumulator: AtomicU32,
    /// Phase increment per tick: `freq / TICK_RATE * 2^32`.
    tuning_word: AtomicU32,
    /// Active waveform as its library index.
    waveform: AtomicU8,
    /// Output scale in `[0, DEPTH_UNITY]`.
    depth: AtomicU16,
}

impl DdsChannel {
    /// A silent (zero tuning word) sine channel at full depth.
    pub const fn new() -> Self {
        DdsChannel {
            accumulator: AtomicU32::new(0),
            tuning_word: AtomicU32::new(0),
            waveform: AtomicU8::new(Waveform::Sine as u8),
            depth: AtomicU16::new(DEPTH_UNITY),
        }
    }

    /// Advance the phase by one tick and return the output sample.
    ///
    /// Called only from the tick interrupt. The load/store pair is not an
    /// atomic read-modify-write: the polling context never preempts the
    /// interrupt, and its only accumulator write is a single atomic store.
    #[inline(always)]
    pub fn advance(&self) -> u8 {
        let phase = self
            .accumulator
            .load(Ordering::Relaxed)
            .wrapping_add(self.tuning_word.load(Ordering::Relaxed));
        self.accumulator.store(phase, Ordering::Relaxed);

        let offset = (phase >> PHASE_INDEX_SHIFT) as u8;
        let sample = wavetables::sample(self.waveform(), offset);
        scale_by_depth(sample, self.depth.load(Ordering::Relaxed))
    }

    /// Advance the phase by `ticks` ticks at once without producing output.
    ///
    /// Test helper: a load-add-store from outside the tick context would race
    /// the interrupt's own update.
    #[cfg(test)]
    pub(crate) fn advance_by(&self, ticks: u32) {
        let inc = self.tuning_word.load(Ordering::Relaxed).wrapping_mul(ticks);
        let phase = self.accumulator.load(Ordering::Relaxed).wrapping_add(inc);
        self.accumulator.store(phase, Ordering::Relaxed);
    }

    /// Force the phase back to the start of the period.
    #[inline]
    pub fn reset_phase(&self) {
        self.accumulator.store(0, Ordering::Relaxed);
    }

    /// Current phase accumulator value.
    pub fn accumulator(&self) -> u32 {
        self.accumulator.load(Ordering::Relaxed)
    }

    /// Set the phase directly (startup phase offsets, tests).
    pub fn set_accumulator(&self, phase: u32) {
        self.accumulator.store(phase, Ordering::Relaxed);
    }

    /// Phase increment added per tick.
    pub fn tuning_word(&self) -> u32 {
        self.tuning_word.load(Ordering::Relaxed)
    }

    /// Publish a new phase increment; the next tick picks it up.
    pub fn set_tuning_word(&self, word: u32) {
        self.tuning_word.store(word, Ordering::Relaxed);
    }

    /// The wavetable this channel currently reads.
    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed) as usize)
    }

    /// Switch wavetables without touching the phase.
    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform as u8, Ordering::Relaxed);
    }

    /// Output depth in [`DEPTH_UNITY`] units.
    pub fn depth(&self) -> u16 {
        self.depth.load(Ordering::Relaxed)
    }

    /// Set the output depth, clamped to [`DEPTH_UNITY`].
    pub fn set_depth(&self, depth: u16) {
        let clamped = if depth > DEPTH_UNITY { DEPTH_UNITY } else { depth };
        self.depth.store(clamped, Ordering::Relaxed);
    }
}

impl Default for DdsChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// `floor(sample * depth / 1024)`; never exceeds `sample` for `depth <= 1024`.
#[inline(always)]
pub fn scale_by_depth(sample: u8, depth: u16) -> u8 {
    ((sample as u32 * depth as u32) >> 10) as u8
}
