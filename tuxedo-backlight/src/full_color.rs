//! Full-color (24-bit RGB per zone) dialect

use tracing::debug;
use tuxedo_transport::protocol::method;
use tuxedo_transport::{BoxedChannel, TransportError};

use crate::dialect::{best_effort, merge, Dialect};
use crate::led::{Color, Mode, Power, Zone};
use crate::models::DialectKind;
use crate::state::{clamp_brightness, BacklightDefaults, BacklightState, ZoneColors};

/// Command words for the full-color firmware
pub mod cmd {
    pub const ZONE_LEFT: u32 = 0xF000_0000;
    pub const ZONE_CENTER: u32 = 0xF100_0000;
    pub const ZONE_RIGHT: u32 = 0xF200_0000;
    pub const BRIGHTNESS: u32 = 0xD201_0000;
    pub const RESET: u32 = 0x1000_0000;
    pub const STATE_OFF: u32 = 0xE000_3001;
    pub const STATE_ON: u32 = 0xE007_F001;

    pub const MODE_BREATHE: u32 = 0x1002_A000;
    pub const MODE_CYCLE: u32 = 0x3301_0000;
    pub const MODE_DANCE: u32 = 0x8000_0000;
    pub const MODE_FLASH: u32 = 0xA000_0000;
    pub const MODE_RANDOM_COLOR: u32 = 0x7000_0000;
    pub const MODE_TEMPO: u32 = 0x9000_0000;
    pub const MODE_WAVE: u32 = 0xB000_0000;
}

/// The firmware brightness scale runs backwards
const LEVEL_INVERTER: [u32; 11] = [10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0];

/// Zone tag for a zone command
fn zone_tag(zone: Zone) -> u32 {
    match zone {
        Zone::Left => cmd::ZONE_LEFT,
        Zone::Center => cmd::ZONE_CENTER,
        Zone::Right => cmd::ZONE_RIGHT,
    }
}

/// `tag | B << 16 | R << 8 | G`
pub fn zone_command(zone: Zone, color: Color) -> u32 {
    let rgb = color.rgb();
    zone_tag(zone) | (rgb.b as u32) << 16 | (rgb.r as u32) << 8 | rgb.g as u32
}

/// Brightness word; levels above the maximum encode as the maximum
pub fn brightness_command(level: u8, colors: &ZoneColors) -> u32 {
    let level = clamp_brightness(level as u32);
    cmd::BRIGHTNESS | LEVEL_INVERTER[level as usize] << 12 | colors.packed()
}

/// Animation word for a mode, `None` for `Custom`
pub fn mode_command(mode: Mode) -> Option<u32> {
    match mode {
        Mode::Custom => None,
        Mode::Breathe => Some(cmd::MODE_BREATHE),
        Mode::Cycle => Some(cmd::MODE_CYCLE),
        Mode::Dance => Some(cmd::MODE_DANCE),
        Mode::Flash => Some(cmd::MODE_FLASH),
        Mode::RandomColor => Some(cmd::MODE_RANDOM_COLOR),
        Mode::Tempo => Some(cmd::MODE_TEMPO),
        Mode::Wave => Some(cmd::MODE_WAVE),
    }
}

/// Dialect for keyboards with genuine RGB zones
pub struct FullColor {
    channel: BoxedChannel,
}

impl FullColor {
    pub fn new(channel: BoxedChannel) -> Self {
        Self { channel }
    }

    fn send(&self, word: u32) -> Result<(), TransportError> {
        self.channel.invoke(method::SET_KB_LED, word).map(|_| ())
    }
}

impl Dialect for FullColor {
    fn kind(&self) -> DialectKind {
        DialectKind::FullColor
    }

    fn set_state(&self, state: &mut BacklightState, power: Power) -> Result<(), TransportError> {
        debug!("State: {:?}", power);

        let word = match power {
            Power::Off => cmd::STATE_OFF,
            Power::On => cmd::STATE_ON,
        };
        self.send(word)?;
        state.power = power;
        Ok(())
    }

    fn set_color(
        &self,
        state: &mut BacklightState,
        colors: ZoneColors,
    ) -> Result<(), TransportError> {
        debug!(
            "L: {} | C: {} | R: {}",
            colors.left, colors.center, colors.right
        );

        let mut result = Ok(());
        for zone in Zone::ALL {
            let color = colors.get(zone);
            let sent = self.send(zone_command(zone, color));
            if sent.is_ok() {
                state.colors.set(zone, color);
            }
            result = merge(result, sent);
        }

        state.mode = Mode::Custom;
        result
    }

    fn set_brightness(
        &self,
        state: &mut BacklightState,
        level: u32,
    ) -> Result<(), TransportError> {
        let level = clamp_brightness(level);
        debug!("Brightness: {}", level);

        self.send(brightness_command(level, &state.colors))?;
        state.brightness = level;
        Ok(())
    }

    fn set_mode(&self, state: &mut BacklightState, mode: Mode) -> Result<(), TransportError> {
        debug!("Mode: {}", mode);

        best_effort("reset", self.send(cmd::RESET));

        match mode_command(mode) {
            None => {
                let colors = state.colors;
                let brightness = state.brightness as u32;
                let colored = self.set_color(state, colors);
                merge(colored, self.set_brightness(state, brightness))
            }
            Some(word) => {
                self.send(word)?;
                state.mode = mode;
                Ok(())
            }
        }
    }

    fn init(&self, state: &mut BacklightState, defaults: &BacklightDefaults) {
        debug!("init {:?}", defaults);

        let power = if defaults.off { Power::Off } else { Power::On };
        best_effort("power", self.set_state(state, power));
        best_effort("color", self.set_color(state, defaults.colors));
        best_effort(
            "brightness",
            self.set_brightness(state, defaults.brightness as u32),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tuxedo_transport::RecordingChannel;

    fn dialect() -> (Arc<RecordingChannel>, FullColor) {
        let channel = Arc::new(RecordingChannel::new());
        let dialect = FullColor::new(channel.clone());
        (channel, dialect)
    }

    #[test]
    fn test_zone_command_packs_bgr() {
        assert_eq!(zone_command(Zone::Left, Color::Red), 0xF000_FF00);
        assert_eq!(zone_command(Zone::Center, Color::Blue), 0xF1FF_0000);
        assert_eq!(zone_command(Zone::Right, Color::Green), 0xF200_00FF);
        assert_eq!(zone_command(Zone::Right, Color::White), 0xF2FF_FFFF);
    }

    #[test]
    fn test_brightness_command_is_inverted() {
        let colors = ZoneColors::new(Color::Blue, Color::Red, Color::White);
        assert_eq!(brightness_command(10, &colors), 0xD201_0721);
        assert_eq!(brightness_command(0, &colors), 0xD201_A721);
        assert_eq!(brightness_command(3, &colors), 0xD201_7721);
        assert_eq!(brightness_command(200, &colors), 0xD201_0721);
    }

    #[test]
    fn test_set_color_one_call_per_zone() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState {
            mode: Mode::Wave,
            ..Default::default()
        };

        let colors = ZoneColors::new(Color::Red, Color::Green, Color::Blue);
        dialect.set_color(&mut state, colors).unwrap();

        assert_eq!(
            channel.args_for(method::SET_KB_LED),
            vec![0xF000_FF00, 0xF100_00FF, 0xF2FF_0000]
        );
        assert_eq!(state.colors, colors);
        assert_eq!(state.mode, Mode::Custom);
    }

    #[test]
    fn test_failed_zone_keeps_stale_color() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState::default();
        channel.fail_arg(zone_command(Zone::Center, Color::Green));

        let result = dialect.set_color(
            &mut state,
            ZoneColors::new(Color::Red, Color::Green, Color::Yellow),
        );

        assert!(result.is_err());
        assert_eq!(
            state.colors,
            ZoneColors::new(Color::Red, Color::Blue, Color::Yellow)
        );
    }

    #[test]
    fn test_brightness_clamped_and_failure_keeps_level() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState::default();

        dialect.set_brightness(&mut state, 250).unwrap();
        assert_eq!(state.brightness, 10);

        dialect.set_brightness(&mut state, 4).unwrap();
        assert_eq!(state.brightness, 4);

        channel.fail_method(method::SET_KB_LED);
        for _ in 0..3 {
            assert!(dialect.set_brightness(&mut state, 7).is_err());
            assert_eq!(state.brightness, 4);
        }
    }

    #[test]
    fn test_animation_mode_sends_reset_then_mode() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState::default();

        dialect.set_mode(&mut state, Mode::Breathe).unwrap();

        assert_eq!(
            channel.args_for(method::SET_KB_LED),
            vec![cmd::RESET, cmd::MODE_BREATHE]
        );
        assert_eq!(state.mode, Mode::Breathe);
    }

    #[test]
    fn test_custom_mode_replays_color_and_brightness() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState {
            mode: Mode::Tempo,
            colors: ZoneColors::new(Color::Cyan, Color::Magenta, Color::Yellow),
            brightness: 6,
            ..Default::default()
        };

        dialect.set_mode(&mut state, Mode::Custom).unwrap();

        let words = channel.args_for(method::SET_KB_LED);
        assert_eq!(words.len(), 5);
        assert_eq!(words[0], cmd::RESET);
        assert_eq!(words[1], zone_command(Zone::Left, Color::Cyan));
        assert_eq!(words[4], brightness_command(6, &state.colors));
        assert_eq!(state.mode, Mode::Custom);
    }

    #[test]
    fn test_failed_mode_keeps_previous_mode() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState::default();
        channel.fail_arg(cmd::MODE_WAVE);

        assert!(dialect.set_mode(&mut state, Mode::Wave).is_err());
        assert_eq!(state.mode, Mode::Custom);
    }

    #[test]
    fn test_state_words() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState::default();

        dialect.set_state(&mut state, Power::On).unwrap();
        assert_eq!(state.power, Power::On);
        dialect.set_state(&mut state, Power::Off).unwrap();
        assert_eq!(state.power, Power::Off);

        assert_eq!(
            channel.args_for(method::SET_KB_LED),
            vec![cmd::STATE_ON, cmd::STATE_OFF]
        );
    }

    #[test]
    fn test_init_order() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState::default();
        let defaults = BacklightDefaults {
            colors: ZoneColors::uniform(Color::Red),
            brightness: 5,
            off: false,
        };

        dialect.init(&mut state, &defaults);

        let words = channel.args_for(method::SET_KB_LED);
        assert_eq!(words[0], cmd::STATE_ON);
        assert_eq!(&words[1..4], &[0xF000_FF00, 0xF100_FF00, 0xF200_FF00]);
        assert_eq!(words[4], brightness_command(5, &defaults.colors));
        assert_eq!(state.power, Power::On);
        assert_eq!(state.colors, defaults.colors);
        assert_eq!(state.brightness, 5);
    }

    #[test]
    fn test_init_continues_past_failures() {
        let (channel, dialect) = dialect();
        let mut state = BacklightState::default();
        channel.fail_arg(cmd::STATE_ON);

        dialect.init(&mut state, &BacklightDefaults::default());

        assert_eq!(state.power, Power::Off);
        assert_eq!(channel.args_for(method::SET_KB_LED).len(), 5);
    }
}
