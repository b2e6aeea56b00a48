//! Sync/reset: zero channel phases on trigger-input edges.
//!
//! Each [`SyncInput`] watches one digital pin and resets the accumulators of
//! every channel in its `targets` mask when the pin moves into its trigger
//! level. Several channels sharing one mask bit-set share one trigger.
//!
//! Detection is a level compare against the last polled level, not an
//! interrupt: a pulse shorter than the control-loop iteration time can be
//! missed. [`SyncHandler::poll`] therefore runs on every loop iteration, not
//! only at the control cadence.

use core::fmt;

use embedded_hal::digital::InputPin;

use crate::channel::DdsChannel;
use crate::config::LfoConfig;
use crate::constants::MAX_CHANNELS;

/// Which edge of the trigger input resets the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerPolarity {
    /// Reset when the input goes high.
    Rising,
    /// Reset when the input goes low.
    Falling,
}

impl TriggerPolarity {
    /// Pin level (high = `true`) that fires the trigger.
    pub const fn trigger_level(self) -> bool {
        matches!(self, TriggerPolarity::Rising)
    }
}

/// Error reading a trigger input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SyncError<E> {
    /// Index of the failing input within the handler.
    pub input: usize,
    pub error: E,
}

impl<E: fmt::Debug> fmt::Display for SyncError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sync input {} read failed: {:?}", self.input, self.error)
    }
}

/// One trigger input and the channels it resets.
pub struct SyncInput<P> {
    pin: P,
    polarity: TriggerPolarity,
    /// Bit `i` set = resets channel `i`.
    targets: u8,
    /// Level seen on the previous poll.
    last_level: bool,
}

impl<P: InputPin> SyncInput<P> {
    /// `targets` bits beyond [`MAX_CHANNELS`] are ignored.
    pub fn new(pin: P, polarity: TriggerPolarity, targets: u8) -> Self {
        SyncInput {
            pin,
            polarity,
            targets: targets & ((1 << MAX_CHANNELS) - 1),
            last_level: false,
        }
    }

    /// Sample the pin; returns the target mask if this poll saw a trigger edge.
    pub fn poll(&mut self) -> Result<Option<u8>, P::Error> {
        let level = self.pin.is_high()?;
        if level == self.last_level {
            return Ok(None);
        }
        self.last_level = level;
        if level == self.polarity.trigger_level() {
            Ok(Some(self.targets))
        } else {
            Ok(None)
        }
    }

    /// Bitmask of the channels this input resets.
    pub fn targets(&self) -> u8 {
        self.targets
    }

    /// Which edge counts as a trigger.
    pub fn polarity(&self) -> TriggerPolarity {
        self.polarity
    }

    /// Give the pin back.
    pub fn release(self) -> P {
        self.pin
    }
}

/// Edge detector over `G` trigger inputs.
pub struct SyncHandler<P, const G: usize> {
    inputs: [SyncInput<P>; G],
}

impl<P: InputPin, const G: usize> SyncHandler<P, G> {
    /// Wrap already-built inputs; see [`SyncHandler::from_config`] for the usual path.
    pub fn new(inputs: [SyncInput<P>; G]) -> Self {
        SyncHandler { inputs }
    }

    /// One input per sync group: pin `g` resets every channel configured
    /// with group `g`, on the edge of the first such channel's polarity.
    /// Groups with no channels get an empty mask.
    pub fn from_config(pins: [P; G], config: &LfoConfig) -> Self {
        let mut group = 0u8;
        let inputs = pins.map(|pin| {
            let polarity = config
                .active_channels()
                .iter()
                .filter_map(|ch| ch.sync)
                .find(|s| s.group == group)
                .map_or(TriggerPolarity::Rising, |s| s.polarity);
            let input = SyncInput::new(pin, polarity, config.sync_targets(group));
            group += 1;
            input
        });
        SyncHandler { inputs }
    }

    /// Poll every input once and reset targeted channels.
    ///
    /// Returns the mask of channels reset by this poll. Channels beyond
    /// `channels.len()` are never touched. A failing input is reported after
    /// all other inputs have been polled.
    pub fn poll(&mut self, channels: &[DdsChannel]) -> Result<u8, SyncError<P::Error>> {
        let mut reset = 0u8;
        let mut first_error = None;

        for (i, input) in self.inputs.iter_mut().enumerate() {
            match input.poll() {
                Ok(Some(mask)) => reset |= mask,
                Ok(None) => {}
                Err(error) => {
                    if first_error.is_none() {
                        first_error = Some(SyncError { input: i, error });
                    }
                }
            }
        }

        for (i, channel) in channels.iter().enumerate() {
            if reset & (1 << i) != 0 {
                channel.reset_phase();
            }
        }

        if reset != 0 {
            debug!("sync reset mask {=u8:b}", reset);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(reset),
        }
    }

    /// The trigger inputs, indexed by sync group.
    pub fn inputs(&self) -> &[SyncInput<P>] {
        &self.inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Pin whose level is set by the test through a shared cell.
    struct LevelPin<'a> {
        level: &'a Cell<bool>,
    }

    impl ErrorType for LevelPin<'_> {
        type Error = ErrorKind;
    }

    impl InputPin for LevelPin<'_> {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.level.get())
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.level.get())
        }
    }

    /// Pin that always fails.
    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl InputPin for BrokenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    fn running_channels() -> [DdsChannel; MAX_CHANNELS] {
        let channels: [DdsChannel; MAX_CHANNELS] = core::array::from_fn(|_| DdsChannel::new());
        for (i, ch) in channels.iter().enumerate() {
            ch.set_tuning_word(0x0101_0101 * (i as u32 + 1));
            ch.advance_by(1000);
        }
        channels
    }

    #[test]
    fn rising_edge_resets_target() {
        let level = Cell::new(false);
        let mut sync = SyncHandler::new([SyncInput::new(
            LevelPin { level: &level },
            TriggerPolarity::Rising,
            0b0001,
        )]);
        let channels = running_channels();

        assert_eq!(sync.poll(&channels), Ok(0));
        assert_ne!(channels[0].accumulator(), 0);

        level.set(true);
        assert_eq!(sync.poll(&channels), Ok(0b0001));
        assert_eq!(channels[0].accumulator(), 0);
        assert_ne!(channels[1].accumulator(), 0);
    }

    #[test]
    fn held_level_does_not_retrigger() {
        let level = Cell::new(false);
        let mut sync = SyncHandler::new([SyncInput::new(
            LevelPin { level: &level },
            TriggerPolarity::Rising,
            0b0001,
        )]);
        let channels = running_channels();

        level.set(true);
        assert_eq!(sync.poll(&channels), Ok(0b0001));
        channels[0].advance_by(10);
        assert_eq!(sync.poll(&channels), Ok(0));
        assert_ne!(channels[0].accumulator(), 0);
    }

    #[test]
    fn falling_polarity_ignores_rising_edge() {
        let level = Cell::new(false);
        let mut sync = SyncHandler::new([SyncInput::new(
            LevelPin { level: &level },
            TriggerPolarity::Falling,
            0b0010,
        )]);
        let channels = running_channels();

        level.set(true);
        assert_eq!(sync.poll(&channels), Ok(0));
        assert_ne!(channels[1].accumulator(), 0);

        level.set(false);
        assert_eq!(sync.poll(&channels), Ok(0b0010));
        assert_eq!(channels[1].accumulator(), 0);
    }

    #[test]
    fn shared_trigger_resets_both_channels() {
        let level = Cell::new(false);
        let mut sync = SyncHandler::new([SyncInput::new(
            LevelPin { level: &level },
            TriggerPolarity::Rising,
            0b0011,
        )]);
        let channels = running_channels();

        level.set(true);
        assert_eq!(sync.poll(&channels), Ok(0b0011));
        assert_eq!(channels[0].accumulator(), 0);
        assert_eq!(channels[1].accumulator(), 0);
        assert_ne!(channels[2].accumulator(), 0);
    }

    #[test]
    fn reset_is_exact_from_any_phase() {
        let level = Cell::new(false);
        let mut sync = SyncHandler::new([SyncInput::new(
            LevelPin { level: &level },
            TriggerPolarity::Rising,
            0b0001,
        )]);
        let channels = running_channels();
        for phase in [1u32, 0x7FFF_FFFF, 0x8000_0000, u32::MAX] {
            channels[0].set_accumulator(phase);
            level.set(true);
            sync.poll(&channels).unwrap();
            assert_eq!(channels[0].accumulator(), 0);
            level.set(false);
            sync.poll(&channels).unwrap();
        }
    }

    #[test]
    fn targets_beyond_slice_are_skipped() {
        let level = Cell::new(false);
        let mut sync = SyncHandler::new([SyncInput::new(
            LevelPin { level: &level },
            TriggerPolarity::Rising,
            0b1100,
        )]);
        let channels = running_channels();
        level.set(true);
        // Only two channels configured: mask still reported, nothing reset.
        assert_eq!(sync.poll(&channels[..2]), Ok(0b1100));
        assert_ne!(channels[2].accumulator(), 0);
    }

    #[test]
    fn target_mask_is_truncated() {
        let level = Cell::new(false);
        let input = SyncInput::new(LevelPin { level: &level }, TriggerPolarity::Rising, 0xFF);
        assert_eq!(input.targets(), 0x0F);
    }

    #[test]
    fn from_config_maps_groups_to_inputs() {
        use crate::config::ChannelConfig;

        let a = Cell::new(false);
        let b = Cell::new(true);
        let config = LfoConfig::quad()
            .channel(2, ChannelConfig::new().sync(TriggerPolarity::Falling, 1))
            .channel(3, ChannelConfig::new().sync(TriggerPolarity::Falling, 1));
        let mut sync = SyncHandler::from_config(
            [LevelPin { level: &a }, LevelPin { level: &b }],
            &config,
        );
        assert_eq!(sync.inputs()[0].targets(), 0b0011);
        assert_eq!(sync.inputs()[0].polarity(), TriggerPolarity::Rising);
        assert_eq!(sync.inputs()[1].targets(), 0b1100);
        assert_eq!(sync.inputs()[1].polarity(), TriggerPolarity::Falling);

        let channels = running_channels();
        // First poll sees b high (not a trigger for Falling), then b drops.
        assert_eq!(sync.poll(&channels), Ok(0));
        b.set(false);
        assert_eq!(sync.poll(&channels), Ok(0b1100));
        assert_eq!(channels[3].accumulator(), 0);
        assert_ne!(channels[0].accumulator(), 0);
    }

    #[test]
    fn from_config_without_sync_has_empty_masks() {
        let level = Cell::new(false);
        let config = LfoConfig::new(2);
        let sync = SyncHandler::from_config([LevelPin { level: &level }], &config);
        assert_eq!(sync.inputs()[0].targets(), 0);
    }

    #[test]
    fn failing_input_reports_its_index() {
        let channels = running_channels();
        let mut sync = SyncHandler::new([
            SyncInput::new(BrokenPin, TriggerPolarity::Rising, 0b01),
            SyncInput::new(BrokenPin, TriggerPolarity::Rising, 0b10),
        ]);
        assert_eq!(
            sync.poll(&channels),
            Err(SyncError { input: 0, error: ErrorKind::Other })
        );
    }
}
