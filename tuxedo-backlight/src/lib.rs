//! Keyboard backlight for Clevo/Tuxedo laptops
//!
//! The firmware takes opaque 32-bit words and offers no way to read any of
//! the backlight state back. This crate encodes colors, brightness, modes
//! and power into those words for the two known firmware dialects, and
//! keeps the record of what the keyboard is showing.

pub mod dialect;
pub mod eight_color;
pub mod error;
pub mod full_color;
pub mod keyboard;
pub mod led;
pub mod models;
pub mod state;

pub use dialect::Dialect;
pub use error::BacklightError;
pub use keyboard::Backlight;
pub use led::{Color, Mode, Power, RgbColor, Zone, BRIGHTNESS_MAX, MODE_CYCLE};
pub use models::{DialectKind, DmiIdentity, SupportedModel, DEFAULT_DMI_DIR, SUPPORTED_MODELS};
pub use state::{BacklightDefaults, BacklightState, ZoneColors};
