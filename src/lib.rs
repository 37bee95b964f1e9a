// Clevo/Tuxedo laptop WMI driver - shared library
// Hotkey debounce, sub-devices, lifecycle, control surface and session helpers

pub mod acpid;
pub mod config;
#[cfg(feature = "dbus")]
pub mod dbus;
pub mod events;
pub mod hotkey;
pub mod idle;
pub mod input;
pub mod led;
pub mod platform;
pub mod rfkill;
pub mod stats;

pub use config::{Config, ConfigError, Overrides, Settings};
pub use events::WmiEvent;
pub use hotkey::{Delivery, Hotkey, KeySink, ReportGate};
pub use idle::IdleDimmer;
pub use platform::{AttachError, Hardware, Platform};
pub use stats::{LoadMonitor, LoadSource, Thresholds};

pub use tuxedo_backlight as backlight;
pub use tuxedo_transport as transport;
