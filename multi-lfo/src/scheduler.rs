//! Tick scheduler: the fixed-rate interrupt body.
//!
//! One [`TickScheduler::tick`] per timer interrupt advances every channel's
//! phase in channel order, writes each sample to that channel's PWM output,
//! and then counts the tick towards the slow-tick cadence. The work is a
//! fixed number of loads, stores and table lookups per channel: nothing here
//! allocates, blocks or logs.

use embedded_hal::pwm::SetDutyCycle;

use crate::constants::DUTY_MAX;
use crate::engine::LfoCore;

/// Drives `N` PWM outputs from the first `N` channels of an [`LfoCore`].
pub struct TickScheduler<'a, P, const N: usize> {
    core: &'a LfoCore,
    outputs: [P; N],
}

impl<'a, P: SetDutyCycle, const N: usize> TickScheduler<'a, P, N> {
    /// `N` must not exceed [`MAX_CHANNELS`](crate::constants::MAX_CHANNELS);
    /// extra outputs are never written.
    pub fn new(core: &'a LfoCore, outputs: [P; N]) -> Self {
        TickScheduler { core, outputs }
    }

    /// Run one tick. Returns `Ok(true)` when this tick completed a slow tick.
    ///
    /// A failing output does not stop the remaining channels or the cadence
    /// count; the first error is returned once the tick is complete.
    #[inline]
    pub fn tick(&mut self) -> Result<bool, P::Error> {
        let mut first_error = None;

        for (output, channel) in self.outputs.iter_mut().zip(self.core.channels()) {
            let sample = channel.advance();
            // 8-bit sample onto the output's duty range (identity at 255).
            if let Err(e) = output.set_duty_cycle_fraction(sample as u16, DUTY_MAX) {
                first_error.get_or_insert(e);
            }
        }

        let slow_tick = self.core.cadence().advance();

        match first_error {
            Some(e) => Err(e),
            None => Ok(slow_tick),
        }
    }

    /// The PWM outputs, in channel order.
    pub fn outputs(&self) -> &[P; N] {
        &self.outputs
    }

    /// Mutable access to the PWM outputs.
    pub fn outputs_mut(&mut self) -> &mut [P; N] {
        &mut self.outputs
    }

    /// Give the PWM outputs back.
    pub fn release(self) -> [P; N] {
        self.outputs
    }
}
