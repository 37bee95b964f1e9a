//! Daemon configuration
//!
//! Read from a TOML file; every key is optional. CLI flags are folded in
//! with [`Config::apply`] before [`Config::resolve`] validates everything
//! and produces the [`Settings`] used at attach.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tuxedo_backlight::led::BRIGHTNESS_MAX;
use tuxedo_backlight::{BacklightDefaults, Color, Zone, ZoneColors, DEFAULT_DMI_DIR};
use tuxedo_transport::{DEFAULT_ACPI_CALL, DEFAULT_EC_IO, DEFAULT_WMBB_METHOD, DEFAULT_WMI_BUS};

use crate::stats::{LoadSource, Thresholds};

/// Default config file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tuxedo-wmi/tuxedo-wmi.toml";

pub const POLL_FREQ_MIN: u32 = 1;
pub const POLL_FREQ_MAX: u32 = 20;
pub const POLL_FREQ_DEFAULT: u32 = 5;

/// Default acpid event socket
pub const DEFAULT_ACPID_SOCKET: &str = "/var/run/acpid.socket";

/// Default procfs mount, read for load statistics
pub const DEFAULT_PROC_DIR: &str = "/proc";

/// Seconds between load samples
pub const STATS_INTERVAL_DEFAULT: u64 = 60;

/// Errors from loading or validating the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("kb_color takes 1 or 3 colors, got {0}")]
    ColorCount(usize),

    #[error("Unknown color: \"{0}\"")]
    UnknownColor(String),

    #[error("kb_brightness {0} out of range (0-{max})", max = BRIGHTNESS_MAX)]
    Brightness(u32),

    #[error("Unknown zone for {source_name} load: \"{zone}\"")]
    UnknownZone { source_name: &'static str, zone: String },

    #[error("Thresholds out of order: green {green} > yellow {yellow}")]
    Thresholds { green: u32, yellow: u32 },
}

/// Filesystem locations of the hardware interfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub acpi_call: PathBuf,
    pub wmbb_method: String,
    pub ec_io: PathBuf,
    pub dmi_dir: PathBuf,
    pub acpid_socket: PathBuf,
    pub wmi_bus: PathBuf,
    pub proc_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            acpi_call: DEFAULT_ACPI_CALL.into(),
            wmbb_method: DEFAULT_WMBB_METHOD.into(),
            ec_io: DEFAULT_EC_IO.into(),
            dmi_dir: DEFAULT_DMI_DIR.into(),
            acpid_socket: DEFAULT_ACPID_SOCKET.into(),
            wmi_bus: DEFAULT_WMI_BUS.into(),
            proc_dir: DEFAULT_PROC_DIR.into(),
        }
    }
}

/// Zones that show system load; unset or empty means not shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    /// Seconds between samples
    pub interval: u64,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub gpu: Option<String>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            interval: STATS_INTERVAL_DEFAULT,
            cpu: None,
            memory: None,
            gpu: None,
        }
    }
}

impl Stats {
    fn zones(&self) -> Result<Vec<(LoadSource, Zone)>, ConfigError> {
        let mut zones = Vec::new();
        for (source, name) in [
            (LoadSource::Cpu, &self.cpu),
            (LoadSource::Memory, &self.memory),
            (LoadSource::Gpu, &self.gpu),
        ] {
            let Some(name) = name.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };
            let zone = Zone::from_str(name).map_err(|_| ConfigError::UnknownZone {
                source_name: source.name(),
                zone: name.to_string(),
            })?;
            zones.push((source, zone));
        }
        Ok(zones)
    }
}

/// Load coloring after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub interval: Duration,
    pub zones: Vec<(LoadSource, Zone)>,
    pub thresholds: Thresholds,
}

impl LoadSettings {
    pub fn is_enabled(&self) -> bool {
        !self.zones.is_empty()
    }
}

/// Raw configuration as written in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Zone colors; none, one (all zones) or three (left, center, right)
    pub kb_color: Vec<String>,
    pub kb_brightness: u32,
    pub kb_off: bool,
    /// Hotkey poll frequency in Hz
    pub poll_freq: u32,
    pub led_invert: bool,
    pub rfkill: bool,
    /// Seconds of session idleness spent dimming before the backlight
    /// goes off; 0 disables idle dimming
    pub dim_delay: u32,
    pub stats: Stats,
    pub thresholds: Thresholds,
    pub paths: Paths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kb_color: Vec::new(),
            kb_brightness: BRIGHTNESS_MAX as u32,
            kb_off: false,
            poll_freq: POLL_FREQ_DEFAULT,
            led_invert: false,
            rfkill: false,
            dim_delay: 0,
            stats: Stats::default(),
            thresholds: Thresholds::default(),
            paths: Paths::default(),
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub kb_color: Option<Vec<String>>,
    pub kb_brightness: Option<u32>,
    pub kb_off: bool,
    pub poll_freq: Option<u32>,
    pub led_invert: bool,
    pub rfkill: bool,
    pub dim_delay: Option<u32>,
}

/// Validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backlight: BacklightDefaults,
    pub poll_freq: u32,
    pub led_invert: bool,
    pub rfkill: bool,
    pub dim_delay: u32,
    pub load: LoadSettings,
    pub paths: Paths,
}

impl Config {
    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Fold command-line values in; boolean flags can only switch on
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(colors) = &overrides.kb_color {
            self.kb_color = colors.clone();
        }
        if let Some(level) = overrides.kb_brightness {
            self.kb_brightness = level;
        }
        if let Some(freq) = overrides.poll_freq {
            self.poll_freq = freq;
        }
        if let Some(delay) = overrides.dim_delay {
            self.dim_delay = delay;
        }
        self.kb_off |= overrides.kb_off;
        self.led_invert |= overrides.led_invert;
        self.rfkill |= overrides.rfkill;
    }

    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        if self.kb_brightness > BRIGHTNESS_MAX as u32 {
            return Err(ConfigError::Brightness(self.kb_brightness));
        }
        let Thresholds { green, yellow } = self.thresholds;
        if green > yellow {
            return Err(ConfigError::Thresholds { green, yellow });
        }

        Ok(Settings {
            backlight: BacklightDefaults {
                colors: parse_colors(&self.kb_color)?,
                brightness: self.kb_brightness as u8,
                off: self.kb_off,
            },
            poll_freq: clamp_poll_freq(self.poll_freq),
            led_invert: self.led_invert,
            rfkill: self.rfkill,
            dim_delay: self.dim_delay,
            load: LoadSettings {
                interval: Duration::from_secs(self.stats.interval.max(1)),
                zones: self.stats.zones()?,
                thresholds: self.thresholds,
            },
            paths: self.paths.clone(),
        })
    }
}

/// Expand 0, 1 or 3 palette names into zone colors
pub fn parse_colors(names: &[String]) -> Result<ZoneColors, ConfigError> {
    let lookup = |name: &String| {
        Color::from_name(name).ok_or_else(|| ConfigError::UnknownColor(name.clone()))
    };

    match names {
        [] => Ok(ZoneColors::default()),
        [all] => Ok(ZoneColors::uniform(lookup(all)?)),
        [left, center, right] => Ok(ZoneColors::new(
            lookup(left)?,
            lookup(center)?,
            lookup(right)?,
        )),
        _ => Err(ConfigError::ColorCount(names.len())),
    }
}

pub fn clamp_poll_freq(freq: u32) -> u32 {
    freq.clamp(POLL_FREQ_MIN, POLL_FREQ_MAX)
}
