//! System load shown as keyboard zone colors
//!
//! Each configured source (CPU, memory, GPU) owns one zone, painted green,
//! yellow or red by its load percentage. Sampling runs on its own thread
//! at the configured interval; stopping it puts the configured colors
//! back.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use tuxedo_backlight::{Color, Zone, ZoneColors};

use crate::config::LoadSettings;
use crate::hotkey::StopSignal;
use crate::platform::Platform;

/// Where a load percentage comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cpu,
    Memory,
    Gpu,
}

impl LoadSource {
    pub fn name(self) -> &'static str {
        match self {
            LoadSource::Cpu => "cpu",
            LoadSource::Memory => "memory",
            LoadSource::Gpu => "gpu",
        }
    }
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Percentages where a zone turns yellow and red
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Green up to and including this load
    pub green: u32,
    /// Red from this load on
    pub yellow: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            green: 40,
            yellow: 60,
        }
    }
}

impl Thresholds {
    pub fn color_for(&self, percent: f64) -> Color {
        if percent <= self.green as f64 {
            Color::Green
        } else if percent < self.yellow as f64 {
            Color::Yellow
        } else {
            Color::Red
        }
    }
}

/// Cumulative jiffies from the `cpu` line of `/proc/stat`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

impl CpuTimes {
    /// Busy share of the time since `earlier`, in percent
    pub fn percent_since(&self, earlier: &CpuTimes) -> f64 {
        let total = self.total.saturating_sub(earlier.total);
        if total == 0 {
            return 0.0;
        }
        let busy = self.busy.saturating_sub(earlier.busy);
        busy as f64 * 100.0 / total as f64
    }
}

pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() < 4 {
        return None;
    }

    // idle + iowait
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    // guest time is already part of user/nice
    let total: u64 = fields.iter().take(8).sum();
    Some(CpuTimes {
        busy: total - idle,
        total,
    })
}

/// Used memory in percent from `/proc/meminfo`
pub fn parse_mem_usage(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find_map(|l| l.strip_prefix(name)?.strip_prefix(':'))?
            .split_whitespace()
            .next()?
            .parse()
            .ok()
    };

    let total = field("MemTotal")?;
    let available = field("MemAvailable").or_else(|| field("MemFree"))?;
    if total == 0 {
        return None;
    }
    Some(total.saturating_sub(available) as f64 * 100.0 / total as f64)
}

/// Highest of utilization and framebuffer use over all GPUs, from
/// `nvidia-smi --query-gpu=utilization.gpu,utilization.memory,memory.used,memory.total`
pub fn parse_gpu_load(csv: &str) -> Option<f64> {
    csv.lines()
        .filter_map(|line| {
            let values: Vec<f64> = line
                .split(',')
                .map(|v| v.trim().parse())
                .collect::<Result<_, _>>()
                .ok()?;
            let &[gpu, mem_util, used, total] = values.as_slice() else {
                return None;
            };
            let fb = if total > 0.0 { used * 100.0 / total } else { 0.0 };
            Some(gpu.max(mem_util).max(fb))
        })
        .reduce(f64::max)
}

/// Reads the load sources; keeps the previous CPU sample for deltas
pub struct LoadReader {
    proc_dir: PathBuf,
    last_cpu: Option<CpuTimes>,
}

impl LoadReader {
    pub fn new(proc_dir: impl AsRef<Path>) -> Self {
        Self {
            proc_dir: proc_dir.as_ref().to_path_buf(),
            last_cpu: None,
        }
    }

    /// Load in percent; a machine without the source reads as idle
    pub fn read(&mut self, source: LoadSource) -> io::Result<f64> {
        match source {
            LoadSource::Cpu => {
                let stat = std::fs::read_to_string(self.proc_dir.join("stat"))?;
                let now = parse_cpu_times(&stat).ok_or_else(|| malformed("stat"))?;
                let earlier = self.last_cpu.replace(now).unwrap_or_default();
                Ok(now.percent_since(&earlier))
            }
            LoadSource::Memory => {
                let meminfo = std::fs::read_to_string(self.proc_dir.join("meminfo"))?;
                parse_mem_usage(&meminfo).ok_or_else(|| malformed("meminfo"))
            }
            LoadSource::Gpu => gpu_load(),
        }
    }
}

fn malformed(file: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("malformed {file}"))
}

fn gpu_load() -> io::Result<f64> {
    let out = match Command::new("nvidia-smi")
        .args([
            "--query-gpu=utilization.gpu,utilization.memory,memory.used,memory.total",
            "--format=csv,noheader,nounits",
        ])
        .output()
    {
        Ok(out) => out,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0.0),
        Err(e) => return Err(e),
    };
    if !out.status.success() {
        return Ok(0.0);
    }
    Ok(parse_gpu_load(&String::from_utf8_lossy(&out.stdout)).unwrap_or(0.0))
}

/// Paint every configured zone once
///
/// Zones already showing the right color are left alone.
pub fn update_zones(platform: &Platform, settings: &LoadSettings, reader: &mut LoadReader) {
    let Some(backlight) = platform.backlight() else {
        return;
    };

    for &(source, zone) in &settings.zones {
        let percent = match reader.read(source) {
            Ok(percent) => percent,
            Err(e) => {
                warn!("Could not read {} load: {e}", source);
                continue;
            }
        };
        let color = settings.thresholds.color_for(percent);
        debug!("{} load {:.0}% -> {} zone {}", source, percent, zone, color);
        if backlight.zone_color(zone) != color {
            backlight.write_zone_color(zone, color);
        }
    }
}

/// Thread repainting zones from system load
pub struct LoadMonitor {
    platform: Arc<Platform>,
    restore: ZoneColors,
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl LoadMonitor {
    /// Start sampling; `restore` is painted back on [`stop`](Self::stop)
    pub fn spawn(
        platform: Arc<Platform>,
        settings: LoadSettings,
        proc_dir: &Path,
        restore: ZoneColors,
    ) -> io::Result<Self> {
        let signal = Arc::new(StopSignal::new());
        let mut reader = LoadReader::new(proc_dir);

        let thread_platform = Arc::clone(&platform);
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name("tuxedo-stats".into())
            .spawn(move || loop {
                update_zones(&thread_platform, &settings, &mut reader);
                if thread_signal.sleep(settings.interval) {
                    break;
                }
            })?;

        info!("Showing system load on the keyboard");
        Ok(Self {
            platform,
            restore,
            signal,
            handle: Some(handle),
        })
    }

    /// Stop sampling and put the configured colors back
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.signal.stop();
        if handle.join().is_err() {
            error!("Load monitor panicked");
        }
        if let Some(backlight) = self.platform.backlight() {
            backlight.write_colors(self.restore);
        }
    }
}

impl Drop for LoadMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
