// CLI definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tuxedo_wmi::config::{Overrides, DEFAULT_CONFIG_PATH};

#[derive(Parser)]
#[command(name = "tuxedo-wmid")]
#[command(author, version, about = "Clevo/Tuxedo WMI hotkey, backlight and airplane-mode daemon")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Log level (error, warn, info, debug, trace); RUST_LOG wins if set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Values that replace the config file's
#[derive(Args, Default)]
pub struct OverrideArgs {
    /// Keyboard color(s): one for all zones or left,center,right
    #[arg(long, value_delimiter = ',', global = true)]
    pub kb_color: Option<Vec<String>>,

    /// Keyboard brightness (0-10)
    #[arg(long, global = true)]
    pub kb_brightness: Option<u32>,

    /// Start with the keyboard backlight off
    #[arg(long, global = true)]
    pub kb_off: bool,

    /// Hotkey polling frequency in Hz (clamped to 1-20)
    #[arg(long, global = true)]
    pub poll_freq: Option<u32>,

    /// Invert the airplane-mode LED
    #[arg(long, global = true)]
    pub led_invert: bool,

    /// Enable the WWAN kill-switch
    #[arg(long, global = true)]
    pub rfkill: bool,

    /// Seconds of idle-session dimming before the backlight goes off (0 disables)
    #[arg(long, global = true)]
    pub dim_delay: Option<u32>,

    /// Log firmware calls instead of making them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl OverrideArgs {
    pub fn to_overrides(&self) -> Overrides {
        Overrides {
            kb_color: self.kb_color.clone(),
            kb_brightness: self.kb_brightness,
            kb_off: self.kb_off,
            poll_freq: self.poll_freq,
            led_invert: self.led_invert,
            rfkill: self.rfkill,
            dim_delay: self.dim_delay,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Attach to the hardware and serve until Ctrl-C / SIGTERM (default)
    Run,

    /// Show the DMI identity, matched model and WMI GUIDs
    #[command(visible_alias = "d")]
    Detect,

    /// List supported models
    Models,

    /// List palette colors with their indices
    Colors,
}
