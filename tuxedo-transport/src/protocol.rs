//! Protocol constants for the Clevo WMI interface

/// WMI GUID that delivers hotkey notifications
pub const EVENT_GUID: &str = "ABBC0F6B-8EA1-11D1-00A0-C90629100000";

/// WMI GUID for e-mail LED notifications (unused by the driver, listed for `detect`)
pub const EMAIL_GUID: &str = "ABBC0F6C-8EA1-11D1-00A0-C90629100000";

/// WMI GUID hosting the WMBB control method
pub const GET_GUID: &str = "ABBC0F6D-8EA1-11D1-00A0-C90629100000";

/// Method IDs for the WMBB control method
pub mod method {
    pub const GET_EVENT: u8 = 0x01;
    pub const GET_POWER_STATE_FOR_3G: u8 = 0x0A;
    pub const GET_AP: u8 = 0x46;
    pub const SET_3G: u8 = 0x4C;
    pub const SET_KB_LED: u8 = 0x67;
    pub const TALK_BIOS_3G: u8 = 0x78;

    /// Get human-readable name for a method id
    pub fn name(method: u8) -> &'static str {
        match method {
            GET_EVENT => "GET_EVENT",
            GET_POWER_STATE_FOR_3G => "GET_POWER_STATE_FOR_3G",
            GET_AP => "GET_AP",
            SET_3G => "SET_3G",
            SET_KB_LED => "SET_KB_LED",
            TALK_BIOS_3G => "TALK_BIOS_3G",
            _ => "UNKNOWN",
        }
    }
}

/// Notification values and event codes
pub mod event {
    /// The only notification value carrying a Clevo hotkey event
    pub const NOTIFY_HOTKEY: u32 = 0xD0;

    pub const BRIGHTNESS_DOWN: u32 = 0x81;
    pub const BRIGHTNESS_UP: u32 = 0x82;
    pub const NEXT_MODE: u32 = 0x83;
    pub const TOGGLE_POWER: u32 = 0x9F;
    pub const AIRPLANE_HOTKEY: u32 = 0xF4;

    /// Get human-readable name for an event code
    pub fn name(code: u32) -> &'static str {
        match code {
            BRIGHTNESS_DOWN => "BRIGHTNESS_DOWN",
            BRIGHTNESS_UP => "BRIGHTNESS_UP",
            NEXT_MODE => "NEXT_MODE",
            TOGGLE_POWER => "TOGGLE_POWER",
            AIRPLANE_HOTKEY => "AIRPLANE_HOTKEY",
            _ => "UNKNOWN",
        }
    }
}

/// Embedded controller registers
pub mod ec {
    /// Latched airplane-mode hotkey status
    pub const AIRPLANE_STATUS: u8 = 0xDB;
    /// Airplane-mode indicator LED
    pub const AIRPLANE_LED: u8 = 0xD9;
    /// Bit used by both registers above
    pub const AIRPLANE_BIT: u8 = 0x40;
}
