//! Status display interface.
//!
//! The panel display is driven from the control loop at the control cadence
//! (never from the tick). The crate only defines what is shown; drawing it
//! is up to the implementor.

use core::convert::Infallible;

use crate::channel::DdsChannel;
use crate::tuning::frequency_of;
use crate::wavetables::Waveform;

/// Snapshot of one channel's parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStatus {
    pub waveform: Waveform,
    pub tuning_word: u32,
    /// Output frequency implied by `tuning_word`.
    pub frequency_hz: f32,
    /// Depth in `[0, 1024]`.
    pub depth: u16,
}

impl ChannelStatus {
    /// Snapshot a channel's published parameters.
    pub fn capture(channel: &DdsChannel, tick_rate_hz: f32) -> Self {
        let tuning_word = channel.tuning_word();
        ChannelStatus {
            waveform: channel.waveform(),
            tuning_word,
            frequency_hz: frequency_of(tuning_word, tick_rate_hz) as f32,
            depth: channel.depth(),
        }
    }
}

/// Something that can show channel status.
pub trait StatusDisplay {
    type Error;

    /// Redraw with the current status of every active channel, in channel order.
    fn update(&mut self, status: &[ChannelStatus]) -> Result<(), Self::Error>;
}

/// Display that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl StatusDisplay for NoDisplay {
    type Error = Infallible;

    fn update(&mut self, _status: &[ChannelStatus]) -> Result<(), Infallible> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TICK_RATE_HZ;
    use crate::tuning::tuning_word;

    #[test]
    fn capture_reads_channel() {
        let ch = DdsChannel::new();
        ch.set_waveform(Waveform::Noise);
        ch.set_depth(300);
        ch.set_tuning_word(tuning_word(4.0, TICK_RATE_HZ));

        let status = ChannelStatus::capture(&ch, TICK_RATE_HZ);
        assert_eq!(status.waveform, Waveform::Noise);
        assert_eq!(status.depth, 300);
        assert!((status.frequency_hz - 4.0).abs() < 1e-3);
    }

    #[test]
    fn no_display_accepts_anything() {
        assert_eq!(NoDisplay.update(&[]), Ok(()));
    }
}
