//! Parameter controller: turns front-panel readings into oscillator parameters.
//!
//! Runs in the polling context. [`ParameterController::poll_buttons`] samples
//! the wave-select switches on every loop iteration and latches press edges;
//! once per control cadence [`ParameterController::update`] applies them and re-reads
//! the potentiometers, publishing a new waveform, tuning word and depth to
//! each channel.

use core::fmt;

use crate::channel::DdsChannel;
use crate::config::{ChannelConfig, LfoConfig};
use crate::constants::DEPTH_UNITY;
use crate::controls::{DebouncedButton, Potentiometer};
use crate::tuning::{depth_from_reading, FrequencyRange};
use crate::wavetables::{Waveform, NUM_WAVES};

/// Error reading a channel's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError<B, A> {
    Button { channel: usize, error: B },
    Potentiometer { channel: usize, error: A },
}

impl<B: fmt::Debug, A: fmt::Debug> fmt::Display for ControlError<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::Button { channel, error } => {
                write!(f, "channel {channel}: wave-select read failed: {error:?}")
            }
            ControlError::Potentiometer { channel, error } => {
                write!(f, "channel {channel}: potentiometer read failed: {error:?}")
            }
        }
    }
}

/// Controls and control-side state for one channel.
pub struct ChannelControls<B, A> {
    button: B,
    frequency: A,
    depth: Option<A>,
    range: FrequencyRange,
    /// Index of the selected waveform; advanced on each debounced press.
    wave_index: usize,
    /// Press edges seen by `poll_buttons` since the last control update.
    pending_presses: u8,
}

impl<B: DebouncedButton, A: Potentiometer> ChannelControls<B, A> {
    /// Controls starting on the sine wave with the default range and no depth pot.
    pub fn new(button: B, frequency: A) -> Self {
        ChannelControls {
            button,
            frequency,
            depth: None,
            range: FrequencyRange::default(),
            wave_index: 0,
            pending_presses: 0,
        }
    }

    /// Controls set up from a channel's configuration. `depth` is dropped
    /// when the channel has depth control disabled.
    pub fn from_config(button: B, frequency: A, depth: Option<A>, config: &ChannelConfig) -> Self {
        ChannelControls {
            button,
            frequency,
            depth: if config.depth_enabled { depth } else { None },
            range: config.range,
            wave_index: config.initial_waveform.index(),
            pending_presses: 0,
        }
    }

    /// Attach a depth potentiometer.
    pub fn with_depth(mut self, depth: A) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Override the frequency range.
    pub fn with_range(mut self, range: FrequencyRange) -> Self {
        self.range = range;
        self
    }

    /// Override the starting waveform.
    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.wave_index = waveform.index();
        self
    }

    /// Currently selected waveform.
    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.wave_index)
    }

    /// Frequency span of the frequency pot.
    pub fn range(&self) -> FrequencyRange {
        self.range
    }

    /// Whether this channel has a depth pot.
    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    /// Press edges latched but not yet applied.
    pub fn pending_presses(&self) -> u8 {
        self.pending_presses
    }

    /// Direct access to the wave-select switch.
    pub fn button_mut(&mut self) -> &mut B {
        &mut self.button
    }

    /// Sample the switch and latch a press edge, so a tap that is released
    /// before the next control update still counts.
    fn sample_button(&mut self) -> Result<(), B::Error> {
        self.button.update()?;
        self.latch_press();
        Ok(())
    }

    fn latch_press(&mut self) {
        if self.button.changed() && self.button.is_pressed() {
            self.pending_presses = self.pending_presses.saturating_add(1);
        }
    }

    /// Apply every latched press edge. Returns the newly selected waveform.
    fn take_wave_advance(&mut self) -> Option<Waveform> {
        self.latch_press();
        let presses = core::mem::replace(&mut self.pending_presses, 0);
        if presses == 0 {
            return None;
        }
        self.wave_index = (self.wave_index + presses as usize) % NUM_WAVES;
        Some(self.waveform())
    }

    /// Read the pots and publish tuning word and depth.
    fn publish_analog(
        &mut self,
        index: usize,
        channel: &DdsChannel,
        tick_rate_hz: f32,
    ) -> Result<(), ControlError<B::Error, A::Error>> {
        let reading = self
            .frequency
            .read()
            .map_err(|error| ControlError::Potentiometer { channel: index, error })?;
        channel.set_tuning_word(self.range.tuning_word_at(reading, tick_rate_hz));

        match self.depth.as_mut() {
            Some(pot) => {
                let reading = pot
                    .read()
                    .map_err(|error| ControlError::Potentiometer { channel: index, error })?;
                channel.set_depth(depth_from_reading(reading));
            }
            None => channel.set_depth(DEPTH_UNITY),
        }
        Ok(())
    }
}

/// Control-rate updater for `N` channels.
pub struct ParameterController<B, A, const N: usize> {
    controls: [ChannelControls<B, A>; N],
    tick_rate_hz: f32,
}

impl<B: DebouncedButton, A: Potentiometer, const N: usize> ParameterController<B, A, N> {
    /// Controller over `controls`, computing tuning words for `tick_rate_hz`.
    pub fn new(controls: [ChannelControls<B, A>; N], tick_rate_hz: f32) -> Self {
        ParameterController {
            controls,
            tick_rate_hz,
        }
    }

    /// Controller using the tick rate from `config`.
    pub fn from_config(controls: [ChannelControls<B, A>; N], config: &LfoConfig) -> Self {
        Self::new(controls, config.tick_rate_hz)
    }

    /// Sample every wave-select switch and latch press edges. Call on each
    /// control-loop iteration so presses between control updates are not lost.
    pub fn poll_buttons(&mut self) -> Result<(), ControlError<B::Error, A::Error>> {
        let mut first_error = None;
        for (channel, controls) in self.controls.iter_mut().enumerate() {
            if let Err(error) = controls.sample_button() {
                first_error.get_or_insert(ControlError::Button { channel, error });
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Publish the configured starting state without consuming switch events.
    pub fn prime(&mut self, channels: &[DdsChannel]) -> Result<(), ControlError<B::Error, A::Error>> {
        let tick_rate_hz = self.tick_rate_hz;
        let mut first_error = None;
        for (index, (controls, channel)) in self.controls.iter_mut().zip(channels).enumerate() {
            channel.set_waveform(controls.waveform());
            if let Err(e) = controls.publish_analog(index, channel, tick_rate_hz) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// One control-cadence update of every channel.
    ///
    /// Iterates exactly `min(N, channels.len())` channels. A failing pot
    /// leaves that channel's previous parameters in place and is reported
    /// after the remaining channels have been updated.
    pub fn update(&mut self, channels: &[DdsChannel]) -> Result<(), ControlError<B::Error, A::Error>> {
        let tick_rate_hz = self.tick_rate_hz;
        let mut first_error = None;

        for (index, (controls, channel)) in self.controls.iter_mut().zip(channels).enumerate() {
            if let Some(waveform) = controls.take_wave_advance() {
                channel.set_waveform(waveform);
                debug!("channel {=usize}: waveform {}", index, waveform);
            }

            if let Err(e) = controls.publish_analog(index, channel, tick_rate_hz) {
                warn!("channel {=usize}: control read failed", index);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Per-channel controls, in channel order.
    pub fn controls(&self) -> &[ChannelControls<B, A>; N] {
        &self.controls
    }

    /// Mutable per-channel controls, in channel order.
    pub fn controls_mut(&mut self) -> &mut [ChannelControls<B, A>; N] {
        &mut self.controls
    }

    /// Tick rate used for tuning-word math.
    pub fn tick_rate_hz(&self) -> f32 {
        self.tick_rate_hz
    }
}
