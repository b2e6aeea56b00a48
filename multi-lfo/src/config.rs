//! Startup configuration.
//!
//! Channel count and per-channel capabilities (depth control, sync trigger,
//! trigger sharing) are plain data resolved once at startup, so the two- and
//! four-channel module variants run the same code. [`LfoConfig::validate`]
//! rejects every configuration the oscillator math cannot handle; nothing
//! downstream re-checks.

use core::fmt;

use crate::constants::{
    DEFAULT_MAX_FREQ_HZ, DEFAULT_MIN_FREQ_HZ, MAX_CHANNELS, SLOW_TICKS_PER_CONTROL, TICK_RATE_HZ,
};
use crate::sync::TriggerPolarity;
use crate::tuning::FrequencyRange;
use crate::wavetables::Waveform;

/// Trigger input assignment for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncConfig {
    pub polarity: TriggerPolarity,
    /// Trigger input index. Channels with the same group share one input.
    pub group: u8,
}

/// Per-channel configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub range: FrequencyRange,
    /// Channel has a depth potentiometer.
    pub depth_enabled: bool,
    pub initial_waveform: Waveform,
    /// `None` = channel is never phase-reset.
    pub sync: Option<SyncConfig>,
}

impl ChannelConfig {
    pub const fn new() -> Self {
        ChannelConfig {
            range: FrequencyRange::new(DEFAULT_MIN_FREQ_HZ, DEFAULT_MAX_FREQ_HZ),
            depth_enabled: false,
            initial_waveform: Waveform::Sine,
            sync: None,
        }
    }

    pub const fn range(mut self, min_hz: f32, max_hz: f32) -> Self {
        self.range = FrequencyRange::new(min_hz, max_hz);
        self
    }

    pub const fn depth(mut self, enabled: bool) -> Self {
        self.depth_enabled = enabled;
        self
    }

    pub const fn waveform(mut self, waveform: Waveform) -> Self {
        self.initial_waveform = waveform;
        self
    }

    pub const fn sync(mut self, polarity: TriggerPolarity, group: u8) -> Self {
        self.sync = Some(SyncConfig { polarity, group });
        self
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole-module configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LfoConfig {
    /// Tick interrupt rate in Hz.
    pub tick_rate_hz: f32,
    /// Active channels, `1..=MAX_CHANNELS`.
    pub channel_count: usize,
    /// Slow ticks between control updates.
    pub slow_ticks_per_control: u32,
    /// Poll trigger inputs at all.
    pub sync_enabled: bool,
    /// Drive the status display at the control cadence.
    pub display_enabled: bool,
    pub channels: [ChannelConfig; MAX_CHANNELS],
}

/// Configuration rejected by [`LfoConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    NoChannels,
    TooManyChannels,
    /// Tick rate is zero, negative or not finite.
    InvalidTickRate,
    /// Range bounds are negative, not finite, or `min > max`.
    InvalidRange { channel: usize },
    /// `max_hz` would take more than half a period per tick.
    FrequencyAboveNyquist { channel: usize },
    /// Control cadence of zero slow ticks.
    InvalidCadence,
    /// Sync group index cannot address a trigger input.
    SyncGroupOutOfRange { channel: usize },
    /// Wired controls or outputs do not match `channel_count`.
    ChannelCountMismatch { expected: usize, found: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoChannels => f.write_str("no channels configured"),
            ConfigError::TooManyChannels => {
                write!(f, "more than {MAX_CHANNELS} channels configured")
            }
            ConfigError::InvalidTickRate => f.write_str("tick rate must be positive and finite"),
            ConfigError::InvalidRange { channel } => {
                write!(f, "channel {channel}: invalid frequency range")
            }
            ConfigError::FrequencyAboveNyquist { channel } => {
                write!(f, "channel {channel}: max frequency above half the tick rate")
            }
            ConfigError::InvalidCadence => f.write_str("control cadence must be at least one slow tick"),
            ConfigError::SyncGroupOutOfRange { channel } => {
                write!(f, "channel {channel}: sync group out of range")
            }
            ConfigError::ChannelCountMismatch { expected, found } => {
                write!(f, "{found} channels wired, {expected} configured")
            }
        }
    }
}

impl LfoConfig {
    /// `channel_count` default channels at the default tick rate, no sync.
    pub const fn new(channel_count: usize) -> Self {
        LfoConfig {
            tick_rate_hz: TICK_RATE_HZ,
            channel_count,
            slow_ticks_per_control: SLOW_TICKS_PER_CONTROL,
            sync_enabled: false,
            display_enabled: false,
            channels: [ChannelConfig::new(); MAX_CHANNELS],
        }
    }

    /// Two channels with depth control and one rising-edge trigger each.
    pub const fn dual() -> Self {
        let mut config = Self::new(2);
        config.sync_enabled = true;
        config.channels[0] = ChannelConfig::new()
            .depth(true)
            .sync(TriggerPolarity::Rising, 0);
        config.channels[1] = ChannelConfig::new()
            .depth(true)
            .sync(TriggerPolarity::Rising, 1);
        config
    }

    /// Four channels without depth; channels 0+1 and 2+3 share a trigger.
    pub const fn quad() -> Self {
        let mut config = Self::new(4);
        config.sync_enabled = true;
        config.channels[0] = ChannelConfig::new().sync(TriggerPolarity::Rising, 0);
        config.channels[1] = ChannelConfig::new().sync(TriggerPolarity::Rising, 0);
        config.channels[2] = ChannelConfig::new().sync(TriggerPolarity::Rising, 1);
        config.channels[3] = ChannelConfig::new().sync(TriggerPolarity::Rising, 1);
        config
    }

    pub const fn tick_rate(mut self, hz: f32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    pub const fn control_period(mut self, slow_ticks: u32) -> Self {
        self.slow_ticks_per_control = slow_ticks;
        self
    }

    pub const fn display(mut self, enabled: bool) -> Self {
        self.display_enabled = enabled;
        self
    }

    pub const fn channel(mut self, index: usize, channel: ChannelConfig) -> Self {
        self.channels[index] = channel;
        self
    }

    /// The configured channels (`channel_count` is clamped to `MAX_CHANNELS`).
    pub fn active_channels(&self) -> &[ChannelConfig] {
        let n = if self.channel_count > MAX_CHANNELS { MAX_CHANNELS } else { self.channel_count };
        &self.channels[..n]
    }

    /// Channel mask (bit `i` = channel `i`) reset by trigger `group`.
    ///
    /// Empty when sync is disabled.
    pub fn sync_targets(&self, group: u8) -> u8 {
        if !self.sync_enabled {
            return 0;
        }
        self.active_channels()
            .iter()
            .enumerate()
            .filter(|(_, ch)| matches!(ch.sync, Some(s) if s.group == group))
            .fold(0u8, |mask, (i, _)| mask | (1 << i))
    }

    /// Check every startup precondition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_count == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.channel_count > MAX_CHANNELS {
            return Err(ConfigError::TooManyChannels);
        }
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return Err(ConfigError::InvalidTickRate);
        }
        if self.slow_ticks_per_control == 0 {
            return Err(ConfigError::InvalidCadence);
        }
        for (channel, ch) in self.active_channels().iter().enumerate() {
            if !ch.range.is_valid() {
                return Err(ConfigError::InvalidRange { channel });
            }
            if ch.range.max_hz >= self.tick_rate_hz / 2.0 {
                return Err(ConfigError::FrequencyAboveNyquist { channel });
            }
            if let Some(sync) = ch.sync {
                if sync.group as usize >= MAX_CHANNELS {
                    return Err(ConfigError::SyncGroupOutOfRange { channel });
                }
            }
        }
        info!(
            "config ok: {=usize} channels, control every {=u32} slow ticks",
            self.channel_count,
            self.slow_ticks_per_control
        );
        Ok(())
    }
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self::dual()
    }
}
