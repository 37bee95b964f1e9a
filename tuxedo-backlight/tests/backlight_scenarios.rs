//! Backlight behaviour across both dialects, driven through the controller

use std::sync::Arc;

use tuxedo_backlight::{
    Backlight, BacklightDefaults, Color, DialectKind, Mode, Power, ZoneColors, MODE_CYCLE,
};
use tuxedo_transport::protocol::method;
use tuxedo_transport::RecordingChannel;

const KINDS: [DialectKind; 2] = [DialectKind::FullColor, DialectKind::EightColor];

fn attached(kind: DialectKind) -> (Arc<RecordingChannel>, Backlight) {
    let channel = Arc::new(RecordingChannel::new());
    let backlight = Backlight::new(kind, channel.clone());
    backlight.init(&BacklightDefaults::default());
    (channel, backlight)
}

#[test]
fn color_survives_custom_replay() {
    for kind in KINDS {
        for left in Color::ALL {
            for right in [Color::Black, Color::Magenta, Color::White] {
                let (_, backlight) = attached(kind);
                let colors = ZoneColors::new(left, Color::Cyan, right);

                backlight.set_color(colors).unwrap();
                backlight.set_mode(Mode::Custom).unwrap();

                assert_eq!(backlight.colors(), colors, "{kind}");
                assert_eq!(backlight.mode(), Mode::Custom);
            }
        }
    }
}

#[test]
fn brightness_is_clamped() {
    for kind in KINDS {
        let (_, backlight) = attached(kind);
        for level in [11, 42, 255, u32::MAX] {
            backlight.set_brightness(level).unwrap();
            assert_eq!(backlight.brightness(), 10, "{kind}");
        }
    }
}

#[test]
fn retry_after_failure_leaves_state_untouched() {
    for kind in KINDS {
        let (channel, backlight) = attached(kind);
        backlight.set_brightness(3).unwrap();
        let before = backlight.snapshot();

        channel.fail_method(method::SET_KB_LED);
        for _ in 0..4 {
            assert!(backlight.set_brightness(8).is_err());
            assert_eq!(backlight.snapshot(), before, "{kind}");
        }

        channel.clear_failures();
        backlight.set_brightness(8).unwrap();
        assert_eq!(backlight.brightness(), 8);
    }
}

#[test]
fn eight_cycle_steps_return_home() {
    for start in MODE_CYCLE {
        let (_, backlight) = attached(DialectKind::FullColor);
        backlight.set_mode(start).unwrap();

        backlight.cycle_mode();
        assert_ne!(backlight.mode(), start);
        for _ in 1..MODE_CYCLE.len() {
            backlight.cycle_mode();
        }
        assert_eq!(backlight.mode(), start);
    }
}

#[test]
fn animation_then_custom_restores_explicit_settings() {
    for kind in KINDS {
        let (_, backlight) = attached(kind);
        let colors = ZoneColors::new(Color::Red, Color::Yellow, Color::Green);
        backlight.set_color(colors).unwrap();
        backlight.set_brightness(4).unwrap();

        backlight.set_mode(Mode::RandomColor).unwrap();
        assert_eq!(backlight.mode(), Mode::RandomColor);
        backlight.set_mode(Mode::Custom).unwrap();

        let state = backlight.snapshot();
        assert_eq!(state.colors, colors, "{kind}");
        assert_eq!(state.brightness, 4);
        assert_eq!(state.mode, Mode::Custom);
    }
}

#[test]
fn toggle_keeps_breathe_on_full_color() {
    let (channel, backlight) = attached(DialectKind::FullColor);
    backlight.set_mode(Mode::Breathe).unwrap();

    backlight.toggle_power();
    assert_eq!(backlight.snapshot().power, Power::Off);
    backlight.toggle_power();

    let state = backlight.snapshot();
    assert_eq!(state.power, Power::On);
    assert_eq!(state.mode, Mode::Breathe);
    assert_eq!(
        channel.args_for(method::SET_KB_LED).last(),
        Some(&tuxedo_backlight::full_color::cmd::STATE_ON)
    );
}

#[test]
fn toggle_replays_mode_on_eight_color() {
    let (channel, backlight) = attached(DialectKind::EightColor);
    backlight.set_mode(Mode::Breathe).unwrap();

    backlight.toggle_power();
    channel.take_calls();
    backlight.toggle_power();

    assert_eq!(backlight.mode(), Mode::Breathe);
    assert_eq!(
        channel.args_for(method::SET_KB_LED),
        vec![
            tuxedo_backlight::eight_color::cmd::RESET,
            tuxedo_backlight::eight_color::cmd::MODE_BREATHE,
        ]
    );
}

#[test]
fn power_off_keeps_custom_configuration() {
    for kind in KINDS {
        let (_, backlight) = attached(kind);
        let colors = ZoneColors::uniform(Color::Magenta);
        backlight.set_color(colors).unwrap();
        backlight.set_brightness(2).unwrap();

        backlight.toggle_power();
        backlight.toggle_power();

        let state = backlight.snapshot();
        assert_eq!(state.colors, colors, "{kind}");
        assert_eq!(state.brightness, 2);
        assert_eq!(state.mode, Mode::Custom);
        assert!(state.is_on());
    }
}
