//! Tracked backlight state
//!
//! The firmware has no read-back for any of this, so the record below is
//! the only source of truth. It is updated only with values the firmware
//! accepted.

use crate::led::{Color, Mode, Power, Zone, BRIGHTNESS_DEFAULT, BRIGHTNESS_MAX, COLOR_DEFAULT};

/// Palette index per zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneColors {
    pub left: Color,
    pub center: Color,
    pub right: Color,
}

impl ZoneColors {
    pub const fn new(left: Color, center: Color, right: Color) -> Self {
        Self {
            left,
            center,
            right,
        }
    }

    /// Same color on all three zones
    pub const fn uniform(color: Color) -> Self {
        Self::new(color, color, color)
    }

    pub fn get(&self, zone: Zone) -> Color {
        match zone {
            Zone::Left => self.left,
            Zone::Center => self.center,
            Zone::Right => self.right,
        }
    }

    pub fn set(&mut self, zone: Zone, color: Color) {
        match zone {
            Zone::Left => self.left = color,
            Zone::Center => self.center = color,
            Zone::Right => self.right = color,
        }
    }

    /// Palette indices packed as `right << 8 | center << 4 | left`
    pub fn packed(&self) -> u32 {
        ((self.right.index() as u32) << 8)
            | ((self.center.index() as u32) << 4)
            | self.left.index() as u32
    }
}

impl Default for ZoneColors {
    fn default() -> Self {
        Self::uniform(COLOR_DEFAULT)
    }
}

/// In-memory record of what the keyboard is currently showing
///
/// `colors` and `brightness` describe the display only while `mode` is
/// `Custom`. Switching power off leaves them untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklightState {
    pub power: Power,
    pub colors: ZoneColors,
    pub brightness: u8,
    pub mode: Mode,
}

impl Default for BacklightState {
    fn default() -> Self {
        Self {
            power: Power::Off,
            colors: ZoneColors::default(),
            brightness: BRIGHTNESS_DEFAULT,
            mode: Mode::Custom,
        }
    }
}

impl BacklightState {
    pub fn is_on(&self) -> bool {
        self.power == Power::On
    }

    /// Hotkey brightness steps only act on a lit, static keyboard
    pub fn accepts_brightness_steps(&self) -> bool {
        self.is_on() && self.mode == Mode::Custom
    }
}

/// Startup configuration applied by a dialect's `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacklightDefaults {
    pub colors: ZoneColors,
    pub brightness: u8,
    pub off: bool,
}

impl Default for BacklightDefaults {
    fn default() -> Self {
        Self {
            colors: ZoneColors::default(),
            brightness: BRIGHTNESS_DEFAULT,
            off: false,
        }
    }
}

/// Clamp any requested level into 0..=10
pub fn clamp_brightness(level: u32) -> u8 {
    level.min(BRIGHTNESS_MAX as u32) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_order() {
        let colors = ZoneColors::new(Color::Blue, Color::Red, Color::White);
        assert_eq!(colors.packed(), 0x721);
    }

    #[test]
    fn test_zone_access() {
        let mut colors = ZoneColors::uniform(Color::Green);
        colors.set(Zone::Center, Color::Cyan);
        assert_eq!(colors.get(Zone::Left), Color::Green);
        assert_eq!(colors.get(Zone::Center), Color::Cyan);
        assert_eq!(colors.get(Zone::Right), Color::Green);
    }

    #[test]
    fn test_clamp_brightness() {
        assert_eq!(clamp_brightness(0), 0);
        assert_eq!(clamp_brightness(7), 7);
        assert_eq!(clamp_brightness(11), 10);
        assert_eq!(clamp_brightness(u32::MAX), 10);
    }
}
