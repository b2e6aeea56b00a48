//! Front-panel control interfaces and reference implementations.
//!
//! The oscillator core only consumes already-conditioned readings:
//!
//! - [`DebouncedButton`] — stable pressed state plus a latched "changed" flag
//! - [`Potentiometer`] — stable integer reading in `[0, 1023]`
//!
//! [`Debouncer`] and [`SmoothedPot`] are ready-made implementations over an
//! [`embedded_hal::digital::InputPin`] and any raw analog source; boards with
//! their own conditioning can implement the traits directly.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::constants::CONTROL_MAX;

/// A debounced momentary switch.
pub trait DebouncedButton {
    /// Error from the underlying input.
    type Error;

    /// Sample the raw input. Called on every control-loop iteration.
    fn update(&mut self) -> Result<(), Self::Error>;

    /// Current debounced state.
    fn is_pressed(&self) -> bool;

    /// Whether the debounced state changed since the last call. Reading the
    /// flag clears it.
    fn changed(&mut self) -> bool;
}

/// An analog control reduced to a stable reading in `[0, CONTROL_MAX]`.
pub trait Potentiometer {
    /// Error from the underlying converter.
    type Error;

    fn read(&mut self) -> Result<u16, Self::Error>;
}

/// Errors from [`Debouncer::wait_until_stable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebounceError<E> {
    /// Reading the pin failed.
    Pin(E),
    /// The input never held one level for long enough.
    Timeout,
}

impl<E: fmt::Debug> fmt::Display for DebounceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebounceError::Pin(e) => write!(f, "switch input read failed: {e:?}"),
            DebounceError::Timeout => f.write_str("switch input did not settle"),
        }
    }
}

// ── Debouncer ──────────────────────────────────────────────────────────────

/// Poll-count debouncer over a digital input pin.
///
/// The debounced state flips only after the raw level has disagreed with it
/// for `stable_polls` consecutive [`update`](DebouncedButton::update) calls;
/// any read agreeing with the current state restarts the count.
pub struct Debouncer<P> {
    pin: P,
    /// Pressed reads low (switch to ground with pull-up).
    active_low: bool,
    /// Consecutive disagreeing reads needed to accept a change.
    stable_polls: u8,
    /// Disagreeing reads seen so far.
    count: u8,
    pressed: bool,
    changed: bool,
}

impl<P: InputPin> Debouncer<P> {
    /// Default number of consecutive disagreeing reads before a change is accepted.
    pub const DEFAULT_STABLE_POLLS: u8 = 8;

    /// Debouncer for a switch that pulls the pin low when pressed.
    pub fn new(pin: P) -> Self {
        Self::with_polarity(pin, true, Self::DEFAULT_STABLE_POLLS)
    }

    /// Debouncer with explicit polarity and settle count (clamped to at least 1).
    pub fn with_polarity(pin: P, active_low: bool, stable_polls: u8) -> Self {
        Debouncer {
            pin,
            active_low,
            stable_polls: if stable_polls == 0 { 1 } else { stable_polls },
            count: 0,
            pressed: false,
            changed: false,
        }
    }

    fn read_pressed(&mut self) -> Result<bool, P::Error> {
        Ok(self.pin.is_high()? != self.active_low)
    }

    /// Block until the input holds one level for `stable_polls` consecutive
    /// reads, polling every `interval_us` microseconds.
    ///
    /// Gives up with [`DebounceError::Timeout`] after `max_polls` reads. On
    /// success the debounced state is set to the settled level without
    /// raising the changed flag, and that level is returned. This is the only
    /// spin-wait in the system and runs once per switch at startup.
    pub fn wait_until_stable<D: DelayNs>(
        &mut self,
        delay: &mut D,
        interval_us: u32,
        max_polls: u32,
    ) -> Result<bool, DebounceError<P::Error>> {
        let mut last = self.read_pressed().map_err(DebounceError::Pin)?;
        let mut run: u8 = 1;
        let mut polls: u32 = 1;

        while run < self.stable_polls {
            if polls >= max_polls {
                warn!("switch did not settle after {=u32} polls", polls);
                return Err(DebounceError::Timeout);
            }
            delay.delay_us(interval_us);
            let level = self.read_pressed().map_err(DebounceError::Pin)?;
            polls += 1;
            if level == last {
                run += 1;
            } else {
                last = level;
                run = 1;
            }
        }

        self.pressed = last;
        self.changed = false;
        self.count = 0;
        Ok(last)
    }

    /// Give back the pin.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> DebouncedButton for Debouncer<P> {
    type Error = P::Error;

    fn update(&mut self) -> Result<(), Self::Error> {
        let raw = self.read_pressed()?;
        if raw == self.pressed {
            self.count = 0;
        } else {
            self.count += 1;
            if self.count >= self.stable_polls {
                self.pressed = raw;
                self.changed = true;
                self.count = 0;
            }
        }
        Ok(())
    }

    fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn changed(&mut self) -> bool {
        core::mem::replace(&mut self.changed, false)
    }
}

// ── SmoothedPot ────────────────────────────────────────────────────────────

/// Hysteresis filter over a noisy potentiometer.
///
/// The reported value moves only when the raw reading leaves a window of
/// `threshold` counts around it, except that the end stops are always
/// reachable. Readings are clamped to `[0, CONTROL_MAX]`.
pub struct SmoothedPot<A> {
    inner: A,
    threshold: u16,
    value: Option<u16>,
}

impl<A: Potentiometer> SmoothedPot<A> {
    pub const DEFAULT_THRESHOLD: u16 = 4;

    /// Filter with [`Self::DEFAULT_THRESHOLD`].
    pub fn new(inner: A) -> Self {
        Self::with_threshold(inner, Self::DEFAULT_THRESHOLD)
    }

    /// Filter that ignores moves of up to `threshold` counts away from the ends of travel.
    pub fn with_threshold(inner: A, threshold: u16) -> Self {
        SmoothedPot {
            inner,
            threshold,
            value: None,
        }
    }

    /// Last reported value, if any read has succeeded.
    pub fn value(&self) -> Option<u16> {
        self.value
    }

    /// Give the wrapped potentiometer back.
    pub fn release(self) -> A {
        self.inner
    }
}

impl<A: Potentiometer> Potentiometer for SmoothedPot<A> {
    type Error = A::Error;

    fn read(&mut self) -> Result<u16, Self::Error> {
        let raw = self.inner.read()?;
        let raw = if raw > CONTROL_MAX { CONTROL_MAX } else { raw };
        let next = match self.value {
            Some(v) if raw != 0 && raw != CONTROL_MAX && raw.abs_diff(v) <= self.threshold => v,
            _ => raw,
        };
        self.value = Some(next);
        Ok(next)
    }
}
