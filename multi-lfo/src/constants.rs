/// Oscillator clock feeding the tick timer, in Hz.
pub const TIMER_CLOCK_HZ: u32 = 16_000_000;

/// Timer divisor: 8-bit phase-correct PWM counts up and down (2 × 255).
pub const TIMER_DIVISOR: u32 = 510;

/// Exact tick (interrupt) rate in Hz: `16 MHz / 510 ≈ 31 372.549 Hz`.
pub const TICK_RATE_HZ: f32 = TIMER_CLOCK_HZ as f32 / TIMER_DIVISOR as f32;

/// Ticks per slow tick (~4 ms at the default tick rate).
pub const TICKS_PER_SLOW_TICK: u8 = 125;

/// Slow ticks per control-cadence period (~100 ms at the default tick rate).
pub const SLOW_TICKS_PER_CONTROL: u32 = 25;

/// Maximum number of oscillator channels.
pub const MAX_CHANNELS: usize = 4;

/// Number of entries in one wavetable (addressed by the top 8 accumulator bits).
pub const WAVETABLE_LEN: usize = 256;

/// Right shift turning a 32-bit phase into a wavetable offset.
pub const PHASE_INDEX_SHIFT: u32 = 24;

/// Largest stable reading returned by a control potentiometer.
pub const CONTROL_MAX: u16 = 1023;

/// Depth value that leaves samples unscaled.
pub const DEPTH_UNITY: u16 = 1024;

/// Largest duty value written to a PWM output (8-bit compare register).
pub const DUTY_MAX: u16 = 255;

/// Default lower frequency bound in Hz.
pub const DEFAULT_MIN_FREQ_HZ: f32 = 0.1;

/// Default upper frequency bound in Hz.
pub const DEFAULT_MAX_FREQ_HZ: f32 = 10.0;
