//! Palette, zones, modes and brightness limits

use std::fmt;
use std::str::FromStr;

use crate::error::BacklightError;

/// Maximum brightness level (11 levels: 0-10)
pub const BRIGHTNESS_MAX: u8 = 10;

/// Brightness used when nothing is configured
pub const BRIGHTNESS_DEFAULT: u8 = BRIGHTNESS_MAX;

/// Zone color used when nothing is configured
pub const COLOR_DEFAULT: Color = Color::Blue;

/// RGB color value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    /// Unpack from 0xRRGGBB
    pub const fn from_packed(rgb: u32) -> Self {
        Self {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
        }
    }
}

/// Palette entry
///
/// The discriminant is the wire index; the order is fixed by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Red = 2,
    Magenta = 3,
    Green = 4,
    Cyan = 5,
    Yellow = 6,
    White = 7,
}

impl Color {
    /// Palette in wire order
    pub const ALL: [Color; 8] = [
        Color::Black,
        Color::Blue,
        Color::Red,
        Color::Magenta,
        Color::Green,
        Color::Cyan,
        Color::Yellow,
        Color::White,
    ];

    /// Look up a palette entry by wire index
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Look up a palette entry by name; the empty string names black
    pub fn from_name(name: &str) -> Option<Self> {
        if name.is_empty() {
            return Some(Color::Black);
        }
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Wire index
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::Blue => "blue",
            Color::Red => "red",
            Color::Magenta => "magenta",
            Color::Green => "green",
            Color::Cyan => "cyan",
            Color::Yellow => "yellow",
            Color::White => "white",
        }
    }

    /// Packed value used by the full-color dialect
    pub fn rgb(self) -> RgbColor {
        RgbColor::from_packed(match self {
            Color::Black => 0x000000,
            Color::Blue => 0x0000FF,
            Color::Red => 0xFF0000,
            Color::Magenta => 0xFF00FF,
            Color::Green => 0x00FF00,
            Color::Cyan => 0x00FFFF,
            Color::Yellow => 0xFFFF00,
            Color::White => 0xFFFFFF,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = BacklightError;

    /// Accepts a palette name or a wire index
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Color::from_name(&s.to_ascii_lowercase())
            .or_else(|| s.parse::<u8>().ok().and_then(Color::from_index))
            .ok_or_else(|| BacklightError::InvalidParameter(format!("unknown color: \"{s}\"")))
    }
}

/// Independently addressable backlight region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Left,
    Center,
    Right,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Left, Zone::Center, Zone::Right];

    pub fn name(self) -> &'static str {
        match self {
            Zone::Left => "left",
            Zone::Center => "center",
            Zone::Right => "right",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Zone {
    type Err = BacklightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Zone::Left),
            "center" | "centre" | "c" => Ok(Zone::Center),
            "right" | "r" => Ok(Zone::Right),
            other => Err(BacklightError::InvalidParameter(format!(
                "unknown zone: \"{other}\""
            ))),
        }
    }
}

/// Backlight power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Power {
    Off,
    On,
}

impl Power {
    pub fn toggled(self) -> Self {
        match self {
            Power::Off => Power::On,
            Power::On => Power::Off,
        }
    }
}

/// Backlight effect mode
///
/// Only `Custom` shows the per-zone colors and brightness; every other mode
/// is an animation run by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    RandomColor = 0,
    Custom = 1,
    Breathe = 2,
    Cycle = 3,
    Wave = 4,
    Dance = 5,
    Tempo = 6,
    Flash = 7,
}

/// Order in which the mode hotkey walks through the modes
pub const MODE_CYCLE: [Mode; 8] = [
    Mode::RandomColor,
    Mode::Dance,
    Mode::Tempo,
    Mode::Flash,
    Mode::Wave,
    Mode::Breathe,
    Mode::Cycle,
    Mode::Custom,
];

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::RandomColor,
        Mode::Custom,
        Mode::Breathe,
        Mode::Cycle,
        Mode::Wave,
        Mode::Dance,
        Mode::Tempo,
        Mode::Flash,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Mode::RandomColor => "random-color",
            Mode::Custom => "custom",
            Mode::Breathe => "breathe",
            Mode::Cycle => "cycle",
            Mode::Wave => "wave",
            Mode::Dance => "dance",
            Mode::Tempo => "tempo",
            Mode::Flash => "flash",
        }
    }

    /// Successor in [`MODE_CYCLE`]
    ///
    /// # Panics
    /// If the mode is not part of the cycle, which means the tracked state
    /// is corrupt.
    pub fn next(self) -> Mode {
        match MODE_CYCLE.iter().position(|&m| m == self) {
            Some(i) => MODE_CYCLE[(i + 1) % MODE_CYCLE.len()],
            None => panic!("backlight mode {self:?} missing from the cycle order"),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = BacklightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match wanted.as_str() {
            "random" | "randomcolor" => return Ok(Mode::RandomColor),
            "static" => return Ok(Mode::Custom),
            _ => {}
        }
        Mode::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| BacklightError::InvalidParameter(format!("unknown mode: \"{s}\"")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_order_is_wire_order() {
        for (i, color) in Color::ALL.iter().enumerate() {
            assert_eq!(color.index() as usize, i);
            assert_eq!(Color::from_index(i as u8), Some(*color));
        }
        assert_eq!(Color::from_index(8), None);
    }

    #[test]
    fn test_color_names() {
        assert_eq!(Color::from_name("red"), Some(Color::Red));
        assert_eq!(Color::from_name(""), Some(Color::Black));
        assert_eq!(Color::from_name("aqua"), None);
        assert_eq!("Cyan".parse::<Color>().unwrap(), Color::Cyan);
        assert_eq!("7".parse::<Color>().unwrap(), Color::White);
        assert!("9".parse::<Color>().is_err());
    }

    #[test]
    fn test_rgb_values() {
        assert_eq!(Color::Magenta.rgb(), RgbColor { r: 0xFF, g: 0, b: 0xFF });
        assert_eq!(Color::Yellow.rgb(), RgbColor { r: 0xFF, g: 0xFF, b: 0 });
        assert_eq!(Color::Black.rgb(), RgbColor::default());
    }

    #[test]
    fn test_cycle_order() {
        assert_eq!(Mode::RandomColor.next(), Mode::Dance);
        assert_eq!(Mode::Cycle.next(), Mode::Custom);
        assert_eq!(Mode::Custom.next(), Mode::RandomColor);
    }

    #[test]
    fn test_cycle_returns_after_eight_steps() {
        for start in Mode::ALL {
            let mut mode = start;
            for step in 1..=8 {
                mode = mode.next();
                if step < 8 {
                    assert_ne!(mode, start, "{start:?} came back after {step} steps");
                }
            }
            assert_eq!(mode, start);
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("random_color".parse::<Mode>().unwrap(), Mode::RandomColor);
        assert_eq!("Breathe".parse::<Mode>().unwrap(), Mode::Breathe);
        assert_eq!("static".parse::<Mode>().unwrap(), Mode::Custom);
        assert!("rainbow".parse::<Mode>().is_err());
    }

    #[test]
    fn test_zone_parse() {
        assert_eq!("Left".parse::<Zone>().unwrap(), Zone::Left);
        assert_eq!("centre".parse::<Zone>().unwrap(), Zone::Center);
        assert!("middle".parse::<Zone>().is_err());
    }
}
