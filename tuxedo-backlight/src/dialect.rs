//! Backlight command dialects
//!
//! Two firmware encodings exist. Which one a machine speaks is decided once
//! from its DMI identity (see [`crate::models`]) and never changes.
//!
//! Every setter updates the state it is handed only after the firmware
//! accepted the command, so a failed call leaves the record exactly as it
//! was and a retry is always safe.

use tracing::warn;
use tuxedo_transport::{BoxedChannel, TransportError};

use crate::eight_color::EightColor;
use crate::full_color::FullColor;
use crate::led::{Mode, Power};
use crate::models::DialectKind;
use crate::state::{BacklightDefaults, BacklightState, ZoneColors};

/// Operation set shared by both dialects
pub trait Dialect: Send + Sync {
    /// Which encoding this is
    fn kind(&self) -> DialectKind;

    /// Switch the backlight on or off
    fn set_state(&self, state: &mut BacklightState, power: Power) -> Result<(), TransportError>;

    /// Set all three zones; always leaves `mode` at `Custom`
    fn set_color(&self, state: &mut BacklightState, colors: ZoneColors)
        -> Result<(), TransportError>;

    /// Set brightness, clamped to 0..=10
    fn set_brightness(&self, state: &mut BacklightState, level: u32)
        -> Result<(), TransportError>;

    /// Switch mode; `Custom` is rebuilt from the tracked colors and brightness
    fn set_mode(&self, state: &mut BacklightState, mode: Mode) -> Result<(), TransportError>;

    /// Apply the startup configuration
    fn init(&self, state: &mut BacklightState, defaults: &BacklightDefaults);
}

/// Build the dialect for a hardware family
pub fn for_kind(kind: DialectKind, channel: BoxedChannel) -> Box<dyn Dialect> {
    match kind {
        DialectKind::FullColor => Box::new(FullColor::new(channel)),
        DialectKind::EightColor => Box::new(EightColor::new(channel)),
    }
}

/// Keep the first failure of a multi-command operation
pub(crate) fn merge(
    first: Result<(), TransportError>,
    second: Result<(), TransportError>,
) -> Result<(), TransportError> {
    first.and(second)
}

/// Log and drop a failure from an independent best-effort step
pub(crate) fn best_effort(step: &str, result: Result<(), TransportError>) {
    if let Err(e) = result {
        warn!("Backlight {step} not applied: {e}");
    }
}
