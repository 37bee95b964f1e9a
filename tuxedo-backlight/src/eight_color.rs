//! 8-color dialect
//!
//! Brightness travels inside every color word, so the tracked brightness
//! has to be right before a color is sent. There is no dedicated "on"
//! word: switching on replays the current mode.

use tracing::debug;
use tuxedo_transport::protocol::method;
use tuxedo_transport::{BoxedChannel, TransportError};

use crate::dialect::{best_effort, merge, Dialect};
use crate::led::{Mode, Power};
use crate::models::DialectKind;
use crate::state::{clamp_brightness, BacklightDefaults, BacklightState, ZoneColors};

/// Command words for the 8-color firmware
pub mod cmd {
    pub const COLOR: u32 = 0x0201_0000;
    pub const BRIGHTNESS: u32 = 0xD201_0000;
    pub const RESET: u32 = 0x2000_0000;
    pub const STATE_OFF: u32 = 0x2201_0000;

    pub const MODE_BREATHE: u32 = 0x1201_0000;
    pub const MODE_CYCLE: u32 = 0x3201_0000;
    pub const MODE_DANCE: u32 = 0x8000_0000;
    pub const MODE_FLASH: u32 = 0xA000_0000;
    pub const MODE_RANDOM_COLOR: u32 = 0x7000_0000;
    pub const MODE_TEMPO: u32 = 0x9000_0000;
    pub const MODE_WAVE: u32 = 0xB000_0000;
}

pub fn color_command(brightness: u8, colors: &ZoneColors) -> u32 {
    cmd::COLOR | (brightness as u32) << 12 | colors.packed()
}

pub fn brightness_command(level: u8, colors: &ZoneColors) -> u32 {
    cmd::BRIGHTNESS | (level as u32) << 12 | colors.packed()
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

/// Dialect for the older palette-only keyboards
pub struct EightColor {
    channel: BoxedChannel,
}

impl EightColor {
    pub fn new(channel: BoxedChannel) -> Self {
        Self { channel }
    }

    fn send(&self, word: u32) -> Result<(), TransportError> {
        self.channel.invoke(method::SET_KB_LED, word).map(|_| ())
    }
}

impl Dialect for EightColor {
    fn kind(&self) -> DialectKind {
        DialectKind::EightColor
    }

    fn set_state(&self, state: &mut BacklightState, power: Power) -> Result<(), TransportError> {
        debug!("State: {:?}", power);

        match power {
            Power::Off => self.send(cmd::STATE_OFF)?,
            Power::On => {
                let mode = state.mode;
                self.set_mode(state, mode)?;
            }
        }
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

        let result = self.send(color_command(state.brightness, &colors));
        if result.is_ok() {
            state.colors = colors;
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

        best_effort("power", self.set_state(state, Power::Off));

        state.colors = defaults.colors;
        state.brightness = clamp_brightness(defaults.brightness as u32);
        state.mode = Mode::Custom;

        if !defaults.off {
            best_effort("color", self.set_color(state, defaults.colors));
            best_effort(
                "brightness",
                self.set_brightness(state, defaults.brightness as u32),
            );
            best_effort("power", self.set_state(state, Power::On));
        }
    }
}
