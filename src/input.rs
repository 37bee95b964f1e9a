//! Virtual airplane-mode key (evdev/uinput)
//!
//! Appears to the rest of the system as a one-key keyboard that only ever
//! sends `KEY_RFKILL`.

use std::io;

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, BusType, EventType, InputEvent, InputId, Key,
};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::hotkey::KeySink;

/// Name shown by `evtest` and friends
pub const DEVICE_NAME: &str = "Clevo Airplane-Mode Hotkey";

/// Errors from virtual key device operations
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to create virtual device: {0}")]
    CreateDevice(#[source] io::Error),
}

/// uinput device carrying the airplane-mode key
pub struct AirplaneKey {
    device: Mutex<VirtualDevice>,
}

impl AirplaneKey {
    pub fn create() -> Result<Self, InputError> {
        let mut keys = AttributeSet::<Key>::new();
        keys.insert(Key::KEY_RFKILL);

        let device = VirtualDeviceBuilder::new()
            .map_err(InputError::CreateDevice)?
            .name(DEVICE_NAME)
            .input_id(InputId::new(BusType::BUS_HOST, 0, 0, 0))
            .with_keys(&keys)
            .map_err(InputError::CreateDevice)?
            .build()
            .map_err(InputError::CreateDevice)?;

        Ok(Self {
            device: Mutex::new(device),
        })
    }

    /// Get the device path (e.g., /dev/input/eventX)
    pub fn device_path(&self) -> Option<std::path::PathBuf> {
        self.device
            .lock()
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }
}

impl KeySink for AirplaneKey {
    fn press_and_release(&self) -> io::Result<()> {
        let code = Key::KEY_RFKILL.code();
        // emit() appends the SYN_REPORT
        self.device.lock().emit(&[
            InputEvent::new(EventType::KEY, code, 1),
            InputEvent::new(EventType::KEY, code, 0),
        ])
    }
}

/// Key sink that only logs, for dry runs
pub struct LogSink;

impl KeySink for LogSink {
    fn press_and_release(&self) -> io::Result<()> {
        info!("{}: KEY_RFKILL", DEVICE_NAME);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires uinput access (run with: cargo test -- --ignored)
    fn test_create_and_press() {
        let key = AirplaneKey::create().unwrap();
        key.press_and_release().unwrap();
    }
}
