//! WMI notification decoding
//!
//! The firmware signals every hotkey with the same notification value,
//! 0xD0; the key itself has to be fetched with `GET_EVENT`.

use std::fmt;

use tracing::{error, info};
use tuxedo_transport::protocol::{event, method};
use tuxedo_transport::CommandChannel;

/// Decoded hotkey event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmiEvent {
    AirplaneHotkey,
    BrightnessDown,
    BrightnessUp,
    NextMode,
    TogglePower,
    Unknown(u32),
}

impl WmiEvent {
    pub fn from_code(code: u32) -> Self {
        match code {
            event::AIRPLANE_HOTKEY => WmiEvent::AirplaneHotkey,
            event::BRIGHTNESS_DOWN => WmiEvent::BrightnessDown,
            event::BRIGHTNESS_UP => WmiEvent::BrightnessUp,
            event::NEXT_MODE => WmiEvent::NextMode,
            event::TOGGLE_POWER => WmiEvent::TogglePower,
            other => WmiEvent::Unknown(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            WmiEvent::AirplaneHotkey => event::AIRPLANE_HOTKEY,
            WmiEvent::BrightnessDown => event::BRIGHTNESS_DOWN,
            WmiEvent::BrightnessUp => event::BRIGHTNESS_UP,
            WmiEvent::NextMode => event::NEXT_MODE,
            WmiEvent::TogglePower => event::TOGGLE_POWER,
            WmiEvent::Unknown(code) => code,
        }
    }

    /// Handled by the keyboard backlight
    pub fn is_backlight(self) -> bool {
        matches!(
            self,
            WmiEvent::BrightnessDown
                | WmiEvent::BrightnessUp
                | WmiEvent::NextMode
                | WmiEvent::TogglePower
        )
    }
}

impl fmt::Display for WmiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#04x})", event::name(self.code()), self.code())
    }
}

/// Turn a raw notification value into an event, fetching it from firmware
///
/// Returns `None` for foreign notifications and failed fetches.
pub fn decode(channel: &dyn CommandChannel, value: u32) -> Option<WmiEvent> {
    if value != event::NOTIFY_HOTKEY {
        info!("Unexpected WMI event ({:#06x})", value);
        return None;
    }

    match channel.invoke(method::GET_EVENT, 0) {
        Ok(code) => Some(WmiEvent::from_code(code)),
        Err(e) => {
            error!("Could not fetch WMI event: {e}");
            None
        }
    }
}
