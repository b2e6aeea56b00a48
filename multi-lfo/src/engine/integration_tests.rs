//! Integration tests driving the whole engine in software.
//!
//! A test plays both execution contexts by hand: it calls
//! `TickScheduler::tick` in place of the timer interrupt and
//! `ControlLoop::poll` in place of the main loop, with front-panel inputs
//! backed by `Cell`s the test flips between calls.

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use core::convert::Infallible;

    use embedded_hal::digital::{ErrorType, InputPin};

    use crate::config::{ChannelConfig, ConfigError, LfoConfig};
    use crate::constants::{DEPTH_UNITY, SLOW_TICKS_PER_CONTROL, TICKS_PER_SLOW_TICK, TICK_RATE_HZ};
    use crate::controller::{ChannelControls, ParameterController};
    use crate::controls::{Debouncer, Potentiometer};
    use crate::display::{ChannelStatus, NoDisplay, StatusDisplay};
    use crate::engine::{ControlLoop, LfoCore};
    use crate::scheduler::tests::MockPwm;
    use crate::scheduler::TickScheduler;
    use crate::sync::SyncHandler;
    use crate::tuning::tuning_word;
    use crate::wavetables::{Waveform, WAVETABLES};

    struct LevelPin<'a> {
        level: &'a Cell<bool>,
    }

    impl ErrorType for LevelPin<'_> {
        type Error = Infallible;
    }

    impl InputPin for LevelPin<'_> {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.level.get())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.level.get())
        }
    }

    struct CellPot<'a> {
        reading: &'a Cell<u16>,
    }

    impl Potentiometer for CellPot<'_> {
        type Error = Infallible;

        fn read(&mut self) -> Result<u16, Infallible> {
            Ok(self.reading.get())
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        frames: u32,
        last_len: usize,
        first: Option<ChannelStatus>,
    }

    impl StatusDisplay for RecordingDisplay {
        type Error = Infallible;

        fn update(&mut self, status: &[ChannelStatus]) -> Result<(), Infallible> {
            self.frames += 1;
            self.last_len = status.len();
            self.first = status.first().copied();
            Ok(())
        }
    }

    /// One channel's worth of front-panel inputs.
    struct Panel {
        button: Cell<bool>,
        freq: Cell<u16>,
        depth: Cell<u16>,
    }

    type Controls<'a> = ChannelControls<Debouncer<LevelPin<'a>>, CellPot<'a>>;

    impl Panel {
        fn new(freq: u16) -> Self {
            Panel {
                button: Cell::new(false),
                freq: Cell::new(freq),
                depth: Cell::new(1023),
            }
        }

        fn controls(&self, config: &ChannelConfig) -> Controls<'_> {
            ChannelControls::from_config(
                Debouncer::with_polarity(LevelPin { level: &self.button }, false, 2),
                CellPot { reading: &self.freq },
                Some(CellPot { reading: &self.depth }),
                config,
            )
        }
    }

    const TICKS_PER_CONTROL: u32 = TICKS_PER_SLOW_TICK as u32 * SLOW_TICKS_PER_CONTROL;

    fn run_ticks<const N: usize>(sched: &mut TickScheduler<'_, MockPwm, N>, ticks: u32) {
        for _ in 0..ticks {
            sched.tick().unwrap();
        }
    }

    fn controller<'a, const N: usize>(
        panels: &'a [Panel; N],
        config: &LfoConfig,
    ) -> ParameterController<Debouncer<LevelPin<'a>>, CellPot<'a>, N> {
        let controls = core::array::from_fn(|i| panels[i].controls(&config.channels[i]));
        ParameterController::from_config(controls, config)
    }

    // ── DDS core ──────────────────────────────────────────────────────────

    #[test]
    fn one_entry_per_tick_reproduces_sine_table() {
        let core = LfoCore::new();
        let ch = &core.channels()[0];
        ch.set_tuning_word(1 << 24);
        // One step before zero, so the first tick lands on entry 0.
        ch.set_accumulator(0u32.wrapping_sub(1 << 24));
        let mut sched = TickScheduler::new(&core, [MockPwm::default()]);

        for k in 0..256 {
            sched.tick().unwrap();
            assert_eq!(sched.outputs()[0].duty, WAVETABLES[Waveform::Sine.index()][k] as u16);
        }
        assert_eq!(ch.accumulator(), 0u32.wrapping_sub(1 << 24));
    }

    // ── Parameter controller ──────────────────────────────────────────────

    #[test]
    fn full_scale_reading_gives_ten_hz_word() {
        let core = LfoCore::new();
        let config = LfoConfig::dual();
        let panels = [Panel::new(1023), Panel::new(0)];
        let sync: Option<SyncHandler<LevelPin<'_>, 0>> = None;
        let mut control =
            ControlLoop::new(&core, config, controller(&panels, &config), sync, NoDisplay).unwrap();
        control.start().unwrap();

        let word = core.channels()[0].tuning_word();
        assert!((word as i64 - 1_369_021).abs() <= 1, "word = {word}");
        assert_eq!(core.channels()[1].tuning_word(), tuning_word(0.1f32 as f64, TICK_RATE_HZ));
    }

    #[test]
    fn parameters_follow_control_cadence() {
        let core = LfoCore::new();
        let config = LfoConfig::dual();
        let panels = [Panel::new(0), Panel::new(0)];
        let sync: Option<SyncHandler<LevelPin<'_>, 0>> = None;
        let mut control =
            ControlLoop::new(&core, config, controller(&panels, &config), sync, NoDisplay).unwrap();
        let mut sched = TickScheduler::new(&core, [MockPwm::default(), MockPwm::default()]);
        control.start().unwrap();
        let slow_word = core.channels()[0].tuning_word();

        panels[0].freq.set(1023);
        panels[0].depth.set(0);
        run_ticks(&mut sched, TICKS_PER_CONTROL - 1);
        assert_eq!(control.poll(), Ok(false));
        assert_eq!(core.channels()[0].tuning_word(), slow_word);
        assert_eq!(core.channels()[0].depth(), DEPTH_UNITY);

        run_ticks(&mut sched, 1);
        assert_eq!(control.poll(), Ok(true));
        assert_eq!(core.channels()[0].tuning_word(), tuning_word(10.0, TICK_RATE_HZ));
        assert_eq!(core.channels()[0].depth(), 0);

        // Depth zero silences the output.
        run_ticks(&mut sched, 3);
        assert_eq!(sched.outputs()[0].duty, 0);
        assert_ne!(sched.outputs()[1].duty, 0);
    }

    #[test]
    fn press_between_updates_advances_waveform_once() {
        let core = LfoCore::new();
        let config = LfoConfig::dual();
        let panels = [Panel::new(512), Panel::new(512)];
        let sync: Option<SyncHandler<LevelPin<'_>, 0>> = None;
        let mut control =
            ControlLoop::new(&core, config, controller(&panels, &config), sync, NoDisplay).unwrap();
        let mut sched = TickScheduler::new(&core, [MockPwm::default(), MockPwm::default()]);
        control.start().unwrap();

        // Pressed (and debounced) well inside one control period.
        panels[1].button.set(true);
        for _ in 0..3 {
            control.poll().unwrap();
        }
        assert_eq!(core.channels()[1].waveform(), Waveform::Sine);

        run_ticks(&mut sched, TICKS_PER_CONTROL);
        assert_eq!(control.poll(), Ok(true));
        assert_eq!(core.channels()[1].waveform(), Waveform::Ramp);
        assert_eq!(core.channels()[0].waveform(), Waveform::Sine);

        // Still held: next boundary changes nothing.
        run_ticks(&mut sched, TICKS_PER_CONTROL);
        assert_eq!(control.poll(), Ok(true));
        assert_eq!(core.channels()[1].waveform(), Waveform::Ramp);
    }

    #[test]
    fn quick_tap_between_updates_advances_waveform() {
        let core = LfoCore::new();
        let config = LfoConfig::dual();
        let panels = [Panel::new(512), Panel::new(512)];
        let sync: Option<SyncHandler<LevelPin<'_>, 0>> = None;
        let mut control =
            ControlLoop::new(&core, config, controller(&panels, &config), sync, NoDisplay).unwrap();
        let mut sched = TickScheduler::new(&core, [MockPwm::default(), MockPwm::default()]);
        control.start().unwrap();

        // Pressed and released before the control boundary.
        panels[0].button.set(true);
        for _ in 0..3 {
            control.poll().unwrap();
        }
        panels[0].button.set(false);
        for _ in 0..3 {
            control.poll().unwrap();
        }
        assert_eq!(core.channels()[0].waveform(), Waveform::Sine);

        run_ticks(&mut sched, TICKS_PER_CONTROL);
        assert_eq!(control.poll(), Ok(true));
        assert_eq!(core.channels()[0].waveform(), Waveform::Ramp);
        assert_eq!(core.channels()[1].waveform(), Waveform::Sine);
    }

    // ── Sync ──────────────────────────────────────────────────────────────

    #[test]
    fn shared_trigger_resets_both_channels_in_same_poll() {
        let core = LfoCore::new();
        let config = LfoConfig::quad();
        let panels = [Panel::new(100), Panel::new(600), Panel::new(900), Panel::new(1023)];
        let triggers = [Cell::new(false), Cell::new(false)];
        let sync = SyncHandler::from_config(
            [LevelPin { level: &triggers[0] }, LevelPin { level: &triggers[1] }],
            &config,
        );
        let mut control =
            ControlLoop::new(&core, config, controller(&panels, &config), Some(sync), NoDisplay)
                .unwrap();
        let mut sched = TickScheduler::new(&core, core::array::from_fn::<_, 4, _>(|_| MockPwm::default()));
        control.start().unwrap();

        run_ticks(&mut sched, 1000);
        control.poll().unwrap();
        for ch in core.channels() {
            assert_ne!(ch.accumulator(), 0);
        }

        triggers[0].set(true);
        control.poll().unwrap();
        assert_eq!(core.channels()[0].accumulator(), 0);
        assert_eq!(core.channels()[1].accumulator(), 0);
        assert_ne!(core.channels()[2].accumulator(), 0);
        assert_ne!(core.channels()[3].accumulator(), 0);

        // Both restart together and stay at their own rates.
        run_ticks(&mut sched, 10);
        assert_eq!(core.channels()[0].accumulator(), 10 * core.channels()[0].tuning_word());
        assert_eq!(core.channels()[1].accumulator(), 10 * core.channels()[1].tuning_word());
    }

    #[test]
    fn sync_group_without_trigger_input_is_rejected() {
        let core = LfoCore::new();
        let config = LfoConfig::dual();
        let panels = [Panel::new(0), Panel::new(0)];
        let trigger = Cell::new(false);
        // Channel 1 uses group 1, but only one trigger input is wired.
        let sync = SyncHandler::from_config([LevelPin { level: &trigger }], &config);
        let result =
            ControlLoop::new(&core, config, controller(&panels, &config), Some(sync), NoDisplay);
        assert!(matches!(result, Err(ConfigError::SyncGroupOutOfRange { channel: 1 })));
    }

    #[test]
    fn sync_disabled_drops_handler() {
        let core = LfoCore::new();
        let mut config = LfoConfig::dual();
        config.sync_enabled = false;
        let panels = [Panel::new(0), Panel::new(0)];
        let trigger = Cell::new(false);
        let sync = SyncHandler::from_config([LevelPin { level: &trigger }], &config);
        let control =
            ControlLoop::new(&core, config, controller(&panels, &config), Some(sync), NoDisplay)
                .unwrap();
        assert!(control.sync().is_none());
    }

    // ── Startup and display ───────────────────────────────────────────────

    #[test]
    fn mismatched_channel_count_is_rejected() {
        let core = LfoCore::new();
        let config = LfoConfig::quad();
        let panels = [Panel::new(0), Panel::new(0)];
        let sync: Option<SyncHandler<LevelPin<'_>, 0>> = None;
        let result = ControlLoop::new(&core, config, controller(&panels, &config), sync, NoDisplay);
        assert!(matches!(
            result,
            Err(ConfigError::ChannelCountMismatch { expected: 4, found: 2 })
        ));
    }

    #[test]
    fn display_refreshes_on_start_and_cadence() {
        let core = LfoCore::new();
        let config = LfoConfig::dual()
            .display(true)
            .channel(0, ChannelConfig::new().depth(true).waveform(Waveform::Triangle));
        let panels = [Panel::new(1023), Panel::new(0)];
        let sync: Option<SyncHandler<LevelPin<'_>, 0>> = None;
        let mut control = ControlLoop::new(
            &core,
            config,
            controller(&panels, &config),
            sync,
            RecordingDisplay::default(),
        )
        .unwrap();
        let mut sched = TickScheduler::new(&core, [MockPwm::default(), MockPwm::default()]);

        control.start().unwrap();
        assert_eq!(control.display().frames, 1);
        assert_eq!(control.display().last_len, 2);
        let first = control.display().first.unwrap();
        assert_eq!(first.waveform, Waveform::Triangle);
        assert!((first.frequency_hz - 10.0).abs() < 1e-3);

        control.poll().unwrap();
        assert_eq!(control.display().frames, 1);
        run_ticks(&mut sched, TICKS_PER_CONTROL);
        control.poll().unwrap();
        assert_eq!(control.display().frames, 2);

        let status = control.status();
        assert!(status[0].is_some() && status[1].is_some());
        assert!(status[2].is_none());
    }
}
