//! # multi-lfo
//!
//! A `no_std`, zero-allocation engine for a multi-channel low-frequency
//! oscillator module. Each channel is a direct digital synthesis (DDS)
//! oscillator: a 32-bit phase accumulator whose top 8 bits index a 256-entry
//! wavetable, producing one 8-bit PWM duty value per timer tick.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Data | [`wavetables`] | Nine 256-entry waveform tables built at compile time |
//! | State | [`channel`] / [`cadence`] | Lock-free per-channel state and tick counters |
//! | Interrupt | [`scheduler`] | Per-tick phase advance and PWM output |
//! | Control | [`controller`] / [`tuning`] | Pot readings → tuning word, depth; wave-select |
//! | Control | [`sync`] | Trigger-edge phase reset, shared triggers |
//! | Inputs | [`controls`] | Debounced switch and potentiometer interfaces |
//! | Glue | [`engine`] / [`config`] | Static core, control loop, startup configuration |
//! | Output | [`display`] | Optional status display interface |
//!
//! ## Quick start
//!
//! ```ignore
//! use multi_lfo::prelude::*;
//!
//! static CORE: LfoCore = LfoCore::new();
//!
//! let config = LfoConfig::dual();
//!
//! // Startup: wait (bounded) for each wave-select switch to settle.
//! let mut sw0 = Debouncer::new(sw0_pin);
//! let mut sw1 = Debouncer::new(sw1_pin);
//! sw0.wait_until_stable(&mut delay, 1_000, 500)?;
//! sw1.wait_until_stable(&mut delay, 1_000, 500)?;
//!
//! let controller = ParameterController::from_config(
//!     [
//!         ChannelControls::from_config(sw0, pot0, Some(depth0), &config.channels[0]),
//!         ChannelControls::from_config(sw1, pot1, Some(depth1), &config.channels[1]),
//!     ],
//!     &config,
//! );
//! let sync = SyncHandler::from_config([trig0, trig1], &config);
//!
//! let mut control = ControlLoop::new(&CORE, config, controller, Some(sync), NoDisplay)?;
//! control.start()?;
//!
//! // Timer interrupt at TICK_RATE_HZ, with `scheduler = TickScheduler::new(&CORE, [pwm0, pwm1])`:
//! scheduler.tick().ok();
//!
//! // Main loop:
//! loop {
//!     control.poll().ok();
//! }
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `defmt` | no | Logging through `defmt`, `defmt::Format` on public types |
//!
//! ## Timing parameters
//!
//! - **Tick rate:** 31 372.549 Hz ([`constants::TICK_RATE_HZ`])
//! - **Slow tick:** every 125 ticks ([`constants::TICKS_PER_SLOW_TICK`])
//! - **Control cadence:** every 25 slow ticks, ~100 ms ([`constants::SLOW_TICKS_PER_CONTROL`])
//! - **Channels:** up to 4 ([`constants::MAX_CHANNELS`])

#![no_std]

#[macro_use]
mod fmt;

pub mod constants;
pub mod wavetables;
pub mod channel;
pub mod cadence;
pub mod tuning;
pub mod scheduler;
pub mod controls;
pub mod controller;
pub mod sync;
pub mod config;
pub mod display;
pub mod engine;

/// Everything needed to wire up an engine.
pub mod prelude {
    pub use crate::config::{ChannelConfig, ConfigError, LfoConfig, SyncConfig};
    pub use crate::controller::{ChannelControls, ControlError, ParameterController};
    pub use crate::controls::{DebouncedButton, Debouncer, Potentiometer, SmoothedPot};
    pub use crate::display::{ChannelStatus, NoDisplay, StatusDisplay};
    pub use crate::engine::{ControlLoop, LfoCore, LoopError};
    pub use crate::scheduler::TickScheduler;
    pub use crate::sync::{SyncHandler, SyncInput, TriggerPolarity};
    pub use crate::tuning::FrequencyRange;
    pub use crate::wavetables::Waveform;
}
