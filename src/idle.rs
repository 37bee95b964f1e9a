//! Keyboard dimming while the session is idle
//!
//! Once idle, the brightness steps down to `delay`, `delay - 1`, ... 1 at
//! one level per second (levels already below are kept) and the backlight
//! then switches off. When the session is active again the backlight is
//! switched on at the brightness it had when dimming began.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::hotkey::StopSignal;
use crate::platform::Platform;

struct DimRun {
    signal: Arc<StopSignal>,
    handle: JoinHandle<()>,
    brightness: u8,
}

/// Dims the keyboard backlight on session idle
pub struct IdleDimmer {
    platform: Arc<Platform>,
    delay: u32,
    step: Duration,
    run: Mutex<Option<DimRun>>,
}

impl IdleDimmer {
    /// `delay` seconds of dimming before switching off; 0 never dims
    pub fn new(platform: Arc<Platform>, delay: u32) -> Self {
        Self::with_step(platform, delay, Duration::from_secs(1))
    }

    pub fn with_step(platform: Arc<Platform>, delay: u32, step: Duration) -> Self {
        Self {
            platform,
            delay,
            step,
            run: Mutex::new(None),
        }
    }

    pub fn is_dimming(&self) -> bool {
        self.run.lock().is_some()
    }

    /// The session went idle
    pub fn idle(&self) {
        if self.delay == 0 {
            return;
        }
        let Some(backlight) = self.platform.backlight() else {
            return;
        };

        let mut run = self.run.lock();
        if run.is_some() {
            return;
        }
        if backlight.is_off() {
            debug!("Session idle, backlight already off");
            return;
        }

        let brightness = backlight.brightness();
        let signal = Arc::new(StopSignal::new());
        let thread_signal = Arc::clone(&signal);
        let platform = Arc::clone(&self.platform);
        let (delay, step) = (self.delay, self.step);

        match thread::Builder::new()
            .name("tuxedo-dim".into())
            .spawn(move || dim(&platform, delay, step, &thread_signal))
        {
            Ok(handle) => {
                info!("Session idle, dimming keyboard over {}s", delay);
                *run = Some(DimRun {
                    signal,
                    handle,
                    brightness,
                });
            }
            Err(e) => error!("Could not start dimming thread: {e}"),
        }
    }

    /// The session is active again; undoes any dimming
    pub fn active(&self) {
        let Some(brightness) = self.stop() else {
            return;
        };
        info!("Session active, restoring keyboard brightness {}", brightness);

        if let Some(backlight) = self.platform.backlight() {
            backlight.write_off(false);
            if let Err(e) = backlight.write_brightness(brightness) {
                warn!("Could not restore brightness: {e}");
            }
        }
    }

    /// Join a running dimmer; returns the brightness it started from
    fn stop(&self) -> Option<u8> {
        let run = self.run.lock().take()?;
        run.signal.stop();
        if run.handle.join().is_err() {
            error!("Dimming thread panicked");
        }
        Some(run.brightness)
    }
}

impl Drop for IdleDimmer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn dim(platform: &Platform, delay: u32, step: Duration, signal: &StopSignal) {
    let Some(backlight) = platform.backlight() else {
        return;
    };

    for remaining in (1..=delay).rev() {
        let level = remaining.min(u8::MAX as u32) as u8;
        if backlight.brightness() > level {
            if let Err(e) = backlight.write_brightness(level) {
                warn!("Dimming step failed: {e}");
            }
        }
        if signal.sleep(step) {
            return;
        }
    }

    debug!("Idle dimming done, switching backlight off");
    backlight.write_off(true);
}
