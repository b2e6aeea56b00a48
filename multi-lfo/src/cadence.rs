//! Tick and slow-tick counters, and the control-side boundary detector.
//!
//! [`Cadence`] is advanced once per tick by the scheduler: every
//! [`TICKS_PER_SLOW_TICK`] ticks it bumps a slow-tick counter (~4 ms at the
//! default tick rate). The control loop never writes it; a [`ControlClock`]
//! owned by the loop compares the slow-tick count against the last boundary it
//! saw to decide when the ~100 ms control cadence has elapsed.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::constants::TICKS_PER_SLOW_TICK;

/// Tick counters written by the tick interrupt.
pub struct Cadence {
    /// Ticks since the last slow tick, in `[0, TICKS_PER_SLOW_TICK)`.
    tick: AtomicU8,
    /// Slow ticks since startup (wrapping).
    slow_ticks: AtomicU32,
}

impl Cadence {
    /// Both counters at zero.
    pub const fn new() -> Self {
        Cadence {
            tick: AtomicU8::new(0),
            slow_ticks: AtomicU32::new(0),
        }
    }

    /// Count one tick. Returns `true` when this tick completed a slow tick.
    ///
    /// Only the tick interrupt calls this.
    #[inline(always)]
    pub fn advance(&self) -> bool {
        let next = self.tick.load(Ordering::Relaxed) + 1;
        if next >= TICKS_PER_SLOW_TICK {
            self.tick.store(0, Ordering::Relaxed);
            let slow = self.slow_ticks.load(Ordering::Relaxed).wrapping_add(1);
            self.slow_ticks.store(slow, Ordering::Relaxed);
            true
        } else {
            self.tick.store(next, Ordering::Relaxed);
            false
        }
    }

    /// Ticks counted towards the next slow tick.
    pub fn tick(&self) -> u8 {
        self.tick.load(Ordering::Relaxed)
    }

    /// Slow ticks since startup.
    pub fn slow_ticks(&self) -> u32 {
        self.slow_ticks.load(Ordering::Relaxed)
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new()
    }
}

/// Detects control-cadence boundaries from the shared slow-tick counter.
///
/// Owned by the polling context. Missed boundaries are not queued: if the
/// loop falls several periods behind, the next [`poll`](Self::poll) fires
/// once and re-synchronises to the current count.
#[derive(Debug, Clone, Copy)]
pub struct ControlClock {
    period: u32,
    last_boundary: u32,
}

impl ControlClock {
    /// A clock firing every `period` slow ticks (values below 1 act as 1).
    pub const fn new(period: u32) -> Self {
        ControlClock {
            period: if period == 0 { 1 } else { period },
            last_boundary: 0,
        }
    }

    /// Returns `true` once per elapsed control period.
    pub fn poll(&mut self, cadence: &Cadence) -> bool {
        let now = cadence.slow_ticks();
        if now.wrapping_sub(self.last_boundary) >= self.period {
            self.last_boundary = now;
            true
        } else {
            false
        }
    }

    /// Slow ticks between control boundaries.
    pub fn period(&self) -> u32 {
        self.period
    }
}
