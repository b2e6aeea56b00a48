//! Engine: the shared oscillator core and the polling control loop.
//!
//! [`LfoCore`] is the state shared between the two execution contexts. It is
//! built from atomics only, so it can live in a `static` and be borrowed by
//! both the [`TickScheduler`](crate::scheduler::TickScheduler) (tick
//! interrupt) and the [`ControlLoop`] (main loop).
//!
//! ## Control loop iteration
//!
//! | Step | Runs | Work |
//! |------|------|------|
//! | Sync | every iteration | trigger edge detection, phase reset |
//! | Buttons | every iteration | debounce sampling |
//! | Controls | control cadence | waveform, tuning word, depth |
//! | Display | control cadence, if enabled | status redraw |
//!
//! ```ignore
//! static CORE: LfoCore = LfoCore::new();
//!
//! // tick interrupt
//! scheduler.tick().ok();
//!
//! // main
//! let mut control = ControlLoop::new(&CORE, LfoConfig::dual(), controller, Some(sync), NoDisplay)?;
//! control.start()?;
//! loop {
//!     control.poll()?;
//! }
//! ```

use core::fmt;

use crate::cadence::{Cadence, ControlClock};
use crate::channel::DdsChannel;
use crate::config::{ConfigError, LfoConfig};
use crate::constants::{DEPTH_UNITY, MAX_CHANNELS};
use crate::controller::{ControlError, ParameterController};
use crate::controls::{DebouncedButton, Potentiometer};
use crate::display::{ChannelStatus, StatusDisplay};
use crate::sync::{SyncError, SyncHandler};

use embedded_hal::digital::InputPin;

#[cfg(test)]
mod integration_tests;

/// Oscillator bank plus tick cadence.
pub struct LfoCore {
    channels: [DdsChannel; MAX_CHANNELS],
    cadence: Cadence,
}

impl LfoCore {
    #[allow(clippy::declare_interior_mutable_const)]
    pub const fn new() -> Self {
        const IDLE: DdsChannel = DdsChannel::new();
        LfoCore {
            channels: [IDLE; MAX_CHANNELS],
            cadence: Cadence::new(),
        }
    }

    /// All channel slots, active or not.
    pub fn channels(&self) -> &[DdsChannel; MAX_CHANNELS] {
        &self.channels
    }

    /// The first `count` channels (clamped to [`MAX_CHANNELS`]).
    pub fn active(&self, count: usize) -> &[DdsChannel] {
        &self.channels[..count.min(MAX_CHANNELS)]
    }

    /// Tick counters advanced by the scheduler.
    pub fn cadence(&self) -> &Cadence {
        &self.cadence
    }

    /// Put every channel into its configured starting state: phase zero,
    /// configured waveform, full depth. Channels beyond `channel_count` are
    /// silenced.
    pub fn apply_config(&self, config: &LfoConfig) {
        for (i, channel) in self.channels.iter().enumerate() {
            channel.reset_phase();
            channel.set_depth(DEPTH_UNITY);
            if i < config.channel_count {
                channel.set_waveform(config.channels[i].initial_waveform);
            } else {
                channel.set_tuning_word(0);
            }
        }
    }
}

impl Default for LfoCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Error from one control-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopError<B, A, S, D> {
    Control(ControlError<B, A>),
    Sync(SyncError<S>),
    Display(D),
}

impl<B: fmt::Debug, A: fmt::Debug, S: fmt::Debug, D: fmt::Debug> fmt::Display
    for LoopError<B, A, S, D>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopError::Control(e) => write!(f, "{e}"),
            LoopError::Sync(e) => write!(f, "{e}"),
            LoopError::Display(e) => write!(f, "display update failed: {e:?}"),
        }
    }
}

type Error<B, A, P, D> = LoopError<
    <B as DebouncedButton>::Error,
    <A as Potentiometer>::Error,
    <P as embedded_hal::digital::ErrorType>::Error,
    <D as StatusDisplay>::Error,
>;

/// The polling context: sync, switch sampling, and control-rate updates.
///
/// `N` is the number of wired channels and must equal the configuration's
/// `channel_count`; `G` is the number of trigger inputs.
pub struct ControlLoop<'a, B, A, P, D, const N: usize, const G: usize> {
    core: &'a LfoCore,
    config: LfoConfig,
    clock: ControlClock,
    controller: ParameterController<B, A, N>,
    sync: Option<SyncHandler<P, G>>,
    display: D,
}

impl<'a, B, A, P, D, const N: usize, const G: usize> ControlLoop<'a, B, A, P, D, N, G>
where
    B: DebouncedButton,
    A: Potentiometer,
    P: InputPin,
    D: StatusDisplay,
{
    /// Validate `config` against the wired controls.
    ///
    /// `sync` is dropped when the configuration has sync disabled. With sync
    /// wired, every channel's sync group must name one of the `G` inputs.
    pub fn new(
        core: &'a LfoCore,
        config: LfoConfig,
        controller: ParameterController<B, A, N>,
        sync: Option<SyncHandler<P, G>>,
        display: D,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if N != config.channel_count {
            return Err(ConfigError::ChannelCountMismatch {
                expected: config.channel_count,
                found: N,
            });
        }
        if config.sync_enabled && sync.is_some() {
            // Every sync group must have a wired trigger input.
            for (channel, ch) in config.active_channels().iter().enumerate() {
                if matches!(ch.sync, Some(s) if s.group as usize >= G) {
                    return Err(ConfigError::SyncGroupOutOfRange { channel });
                }
            }
        }
        Ok(ControlLoop {
            core,
            clock: ControlClock::new(config.slow_ticks_per_control),
            controller,
            sync: if config.sync_enabled { sync } else { None },
            display,
            config,
        })
    }

    /// Load the starting state into the core and run the first control
    /// update, so the first ticks already run at the configured parameters.
    pub fn start(&mut self) -> Result<(), Error<B, A, P, D>> {
        let shared = self.core;
        shared.apply_config(&self.config);
        let channels = shared.active(self.config.channel_count);
        self.controller.prime(channels).map_err(LoopError::Control)?;
        info!("lfo started with {=usize} channels", self.config.channel_count);
        self.refresh_display()
    }

    /// One control-loop iteration. Returns `Ok(true)` when this iteration
    /// crossed a control-cadence boundary and updated the parameters.
    ///
    /// Every step runs even if an earlier one fails; the first error is
    /// returned.
    pub fn poll(&mut self) -> Result<bool, Error<B, A, P, D>> {
        let shared = self.core;
        let channels = shared.active(self.config.channel_count);
        let mut first_error = None;

        if let Some(sync) = self.sync.as_mut() {
            if let Err(e) = sync.poll(channels) {
                first_error.get_or_insert(LoopError::Sync(e));
            }
        }

        if let Err(e) = self.controller.poll_buttons() {
            first_error.get_or_insert(LoopError::Control(e));
        }

        let boundary = self.clock.poll(shared.cadence());
        if boundary {
            if let Err(e) = self.controller.update(channels) {
                first_error.get_or_insert(LoopError::Control(e));
            }
            if let Err(e) = self.refresh_display() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(boundary),
        }
    }

    /// Status of every active channel.
    pub fn status(&self) -> [Option<ChannelStatus>; MAX_CHANNELS] {
        let channels = self.core.channels();
        core::array::from_fn(|i| {
            (i < self.config.channel_count)
                .then(|| ChannelStatus::capture(&channels[i], self.config.tick_rate_hz))
        })
    }

    fn refresh_display(&mut self) -> Result<(), Error<B, A, P, D>> {
        if !self.config.display_enabled {
            return Ok(());
        }
        let channels = self.core.channels();
        let tick_rate_hz = self.config.tick_rate_hz;
        let status: [ChannelStatus; MAX_CHANNELS] =
            core::array::from_fn(|i| ChannelStatus::capture(&channels[i], tick_rate_hz));
        self.display
            .update(&status[..self.config.channel_count])
            .map_err(LoopError::Display)
    }

    /// The validated configuration.
    pub fn config(&self) -> &LfoConfig {
        &self.config
    }

    /// The shared core this loop drives.
    pub fn core(&self) -> &'a LfoCore {
        self.core
    }

    /// The per-channel controls.
    pub fn controller(&self) -> &ParameterController<B, A, N> {
        &self.controller
    }

    /// Mutable access to the per-channel controls.
    pub fn controller_mut(&mut self) -> &mut ParameterController<B, A, N> {
        &mut self.controller
    }

    /// The sync handler, `None` when sync is disabled or unwired.
    pub fn sync(&self) -> Option<&SyncHandler<P, G>> {
        self.sync.as_ref()
    }

    /// The status display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Mutable access to the status display.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }
}
