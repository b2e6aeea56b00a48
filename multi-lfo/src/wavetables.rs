//! Wavetable library: one period of each waveform as 256 unsigned 8-bit samples.
//!
//! Tables are built at compile time and live in flash. The DDS engine indexes
//! them with the top 8 bits of a channel's phase accumulator, so every offset
//! is in range by construction and lookup has no error path.

use core::fmt;

use crate::constants::WAVETABLE_LEN;

/// Number of waveforms in the library.
pub const NUM_WAVES: usize = 9;

/// Selectable waveform, in wave-advance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Waveform {
    Sine = 0,
    /// Rising ramp, 0 → 255.
    Ramp = 1,
    /// Falling sawtooth, 255 → 0.
    Sawtooth = 2,
    Triangle = 3,
    /// Pulse, high for the first 12.5 % of the period.
    Pulse12 = 4,
    /// Pulse, high for the first 25 % of the period.
    Pulse25 = 5,
    /// Pulse, high for the first 75 % of the period.
    Pulse75 = 6,
    Square = 7,
    /// One period of pseudo-random steps (repeats every cycle).
    Noise = 8,
}

impl Waveform {
    /// All waveforms in library order.
    pub const ALL: [Waveform; NUM_WAVES] = [
        Waveform::Sine,
        Waveform::Ramp,
        Waveform::Sawtooth,
        Waveform::Triangle,
        Waveform::Pulse12,
        Waveform::Pulse25,
        Waveform::Pulse75,
        Waveform::Square,
        Waveform::Noise,
    ];

    /// Waveform at `index`, wrapping modulo [`NUM_WAVES`].
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % NUM_WAVES]
    }

    /// Position of this waveform in the library.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The waveform a wave-advance press selects after this one.
    pub const fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// The one-period sample table for this waveform.
    #[inline(always)]
    pub fn table(self) -> &'static [u8; WAVETABLE_LEN] {
        &WAVETABLES[self as usize]
    }

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Ramp => "ramp",
            Waveform::Sawtooth => "saw",
            Waveform::Triangle => "tri",
            Waveform::Pulse12 => "pulse12",
            Waveform::Pulse25 => "pulse25",
            Waveform::Pulse75 => "pulse75",
            Waveform::Square => "square",
            Waveform::Noise => "noise",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read one sample. `offset` covers the whole table, so this never fails.
#[inline(always)]
pub fn sample(waveform: Waveform, offset: u8) -> u8 {
    WAVETABLES[waveform as usize][offset as usize]
}

// ── Table generators ───────────────────────────────────────────────────────

const fn ramp() -> [u8; WAVETABLE_LEN] {
    let mut table = [0u8; WAVETABLE_LEN];
    let mut i = 0;
    while i < WAVETABLE_LEN {
        table[i] = i as u8;
        i += 1;
    }
    table
}

const fn sawtooth() -> [u8; WAVETABLE_LEN] {
    let mut table = [0u8; WAVETABLE_LEN];
    let mut i = 0;
    while i < WAVETABLE_LEN {
        table[i] = 255 - i as u8;
        i += 1;
    }
    table
}

const fn triangle() -> [u8; WAVETABLE_LEN] {
    let mut table = [0u8; WAVETABLE_LEN];
    let mut i = 0;
    while i < WAVETABLE_LEN {
        table[i] = if i < WAVETABLE_LEN / 2 {
            (i * 2) as u8
        } else {
            ((WAVETABLE_LEN - 1 - i) * 2 + 1) as u8
        };
        i += 1;
    }
    table
}

/// High (255) for the first `high` entries, low (0) afterwards.
const fn pulse(high: usize) -> [u8; WAVETABLE_LEN] {
    let mut table = [0u8; WAVETABLE_LEN];
    let mut i = 0;
    while i < high {
        table[i] = 255;
        i += 1;
    }
    table
}

/// 16-bit Galois LFSR (taps 0xB400), upper byte of each state.
const fn noise() -> [u8; WAVETABLE_LEN] {
    let mut table = [0u8; WAVETABLE_LEN];
    let mut lfsr: u16 = 0xACE1;
    let mut i = 0;
    while i < WAVETABLE_LEN {
        // Eight shifts per entry so neighbouring samples are decorrelated.
        let mut bit = 0;
        while bit < 8 {
            let lsb = lfsr & 1;
            lfsr >>= 1;
            if lsb != 0 {
                lfsr ^= 0xB400;
            }
            bit += 1;
        }
        table[i] = (lfsr >> 8) as u8;
        i += 1;
    }
    table
}

/// `round(127.5 + 127.5 · sin(2π·i/256))`.
#[rustfmt::skip]
const SINE: [u8; WAVETABLE_LEN] = [
    128, 131, 134, 137, 140, 143, 146, 149, 152, 155, 158, 162, 165, 167, 170, 173,
    176, 179, 182, 185, 188, 190, 193, 196, 198, 201, 203, 206, 208, 211, 213, 215,
    218, 220, 222, 224, 226, 228, 230, 232, 234, 235, 237, 238, 240, 241, 243, 244,
    245, 246, 248, 249, 250, 250, 251, 252, 253, 253, 254, 254, 254, 255, 255, 255,
    255, 255, 255, 255, 254, 254, 254, 253, 253, 252, 251, 250, 250, 249, 248, 246,
    245, 244, 243, 241, 240, 238, 237, 235, 234, 232, 230, 228, 226, 224, 222, 220,
    218, 215, 213, 211, 208, 206, 203, 201, 198, 196, 193, 190, 188, 185, 182, 179,
    176, 173, 170, 167, 165, 162, 158, 155, 152, 149, 146, 143, 140, 137, 134, 131,
    128, 124, 121, 118, 115, 112, 109, 106, 103, 100,  97,  93,  90,  88,  85,  82,
     79,  76,  73,  70,  67,  65,  62,  59,  57,  54,  52,  49,  47,  44,  42,  40,
     37,  35,  33,  31,  29,  27,  25,  23,  21,  20,  18,  17,  15,  14,  12,  11,
     10,   9,   7,   6,   5,   5,   4,   3,   2,   2,   1,   1,   1,   0,   0,   0,
      0,   0,   0,   0,   1,   1,   1,   2,   2,   3,   4,   5,   5,   6,   7,   9,
     10,  11,  12,  14,  15,  17,  18,  20,  21,  23,  25,  27,  29,  31,  33,  35,
     37,  40,  42,  44,  47,  49,  52,  54,  57,  59,  62,  65,  67,  70,  73,  76,
     79,  82,  85,  88,  90,  93,  97, 100, 103, 106, 109, 112, 115, 118, 121, 124,
];

/// All waveform tables, indexed by [`Waveform`] discriminant.
pub static WAVETABLES: [[u8; WAVETABLE_LEN]; NUM_WAVES] = [
    SINE,
    ramp(),
    sawtooth(),
    triangle(),
    pulse(WAVETABLE_LEN / 8),
    pulse(WAVETABLE_LEN / 4),
    pulse(WAVETABLE_LEN * 3 / 4),
    pulse(WAVETABLE_LEN / 2),
    noise(),
];
