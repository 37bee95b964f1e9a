//! D-Bus control surface and resume notifications.
//!
//! Bus name: `org.tuxedo.Wmi1` (system bus)
//! Object path: `/org/tuxedo/Wmi1`
//!
//! Resume is picked up from logind's `PrepareForSleep(false)`, idleness
//! from the `IdleHint` of the session active on `seat0`.

use std::str::FromStr;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};
use tuxedo_backlight::{Backlight, BacklightError, Color, Mode, Zone};
use zbus::{fdo, interface};

use crate::idle::IdleDimmer;
use crate::led;
use crate::platform::Platform;

pub const BUS_NAME: &str = "org.tuxedo.Wmi1";
pub const OBJECT_PATH: &str = "/org/tuxedo/Wmi1";

/// D-Bus interface implementation.
pub struct WmiInterface {
    platform: Arc<Platform>,
}

impl WmiInterface {
    pub fn new(platform: Arc<Platform>) -> Self {
        Self { platform }
    }

    fn backlight(&self) -> fdo::Result<&Backlight> {
        self.platform
            .backlight()
            .ok_or_else(|| fdo::Error::NotSupported("no keyboard backlight on this model".into()))
    }

    /// Run firmware/EC work off the async executor.
    async fn blocking<T, F>(&self, work: F) -> fdo::Result<T>
    where
        F: FnOnce(&Platform) -> T + Send + 'static,
        T: Send + 'static,
    {
        let platform = Arc::clone(&self.platform);
        tokio::task::spawn_blocking(move || work(&platform))
            .await
            .map_err(|e| fdo::Error::Failed(e.to_string()))
    }

    /// Backlight work off the executor; fails up front without a backlight.
    async fn with_backlight<T, F>(&self, work: F) -> fdo::Result<T>
    where
        F: FnOnce(&Backlight) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.backlight()?;
        self.blocking(move |platform| platform.backlight().map(work))
            .await?
            .ok_or_else(|| fdo::Error::NotSupported("no keyboard backlight on this model".into()))
    }
}

fn invalid(e: impl ToString) -> fdo::Error {
    fdo::Error::InvalidArgs(e.to_string())
}

/// Set a zone from a palette index (`0`-`7`) or name
fn write_zone(backlight: &Backlight, zone: Zone, color: &str) -> Result<(), BacklightError> {
    match color.trim().parse::<u8>() {
        Ok(index) => backlight.write_zone_index(zone, index),
        Err(_) => {
            backlight.write_zone_color(zone, Color::from_str(color)?);
            Ok(())
        }
    }
}

fn check_led_value(value: u8) -> fdo::Result<u8> {
    if value > led::MAX_BRIGHTNESS {
        return Err(invalid(format!(
            "LED brightness {value} exceeds {}",
            led::MAX_BRIGHTNESS
        )));
    }
    Ok(value)
}

#[interface(name = "org.tuxedo.Wmi1")]
impl WmiInterface {
    /// Matched model and its dialect, empty when unsupported.
    async fn model(&self) -> String {
        self.platform
            .model()
            .map(|m| format!("{} ({})", m.ident, m.dialect))
            .unwrap_or_default()
    }

    async fn brightness(&self) -> fdo::Result<u8> {
        Ok(self.backlight()?.brightness())
    }

    /// Levels above 10 are rejected; applied only while lit in custom mode.
    async fn set_brightness(&self, level: u8) -> fdo::Result<()> {
        self.with_backlight(move |b| b.write_brightness(level))
            .await?
            .map_err(invalid)
    }

    /// Palette name of a zone (`left`, `center`, `right`).
    async fn zone_color(&self, zone: &str) -> fdo::Result<String> {
        let zone = Zone::from_str(zone).map_err(invalid)?;
        Ok(self.backlight()?.zone_color(zone).name().to_string())
    }

    /// `color` is a palette name or index 0-7.
    async fn set_zone_color(&self, zone: &str, color: &str) -> fdo::Result<()> {
        let zone = Zone::from_str(zone).map_err(invalid)?;
        let color = color.to_string();
        self.with_backlight(move |b| write_zone(b, zone, &color))
            .await?
            .map_err(invalid)
    }

    async fn off(&self) -> fdo::Result<bool> {
        Ok(self.backlight()?.is_off())
    }

    async fn set_off(&self, off: bool) -> fdo::Result<()> {
        self.with_backlight(move |b| b.write_off(off)).await
    }

    async fn mode(&self) -> fdo::Result<String> {
        Ok(self.backlight()?.mode().name().to_string())
    }

    async fn set_mode(&self, mode: &str) -> fdo::Result<()> {
        let mode = Mode::from_str(mode).map_err(invalid)?;
        self.with_backlight(move |b| b.write_mode(mode)).await
    }

    /// Same as the mode hotkey.
    async fn next_mode(&self) -> fdo::Result<()> {
        self.with_backlight(Backlight::cycle_mode).await
    }

    /// Same as the backlight toggle hotkey.
    async fn toggle(&self) -> fdo::Result<()> {
        self.with_backlight(Backlight::toggle_power).await
    }

    async fn airplane_led(&self) -> fdo::Result<u8> {
        self.blocking(Platform::airplane_led)
            .await?
            .ok_or_else(|| fdo::Error::Failed("airplane LED unavailable".into()))
    }

    /// 0 or 1
    async fn set_airplane_led(&self, value: u8) -> fdo::Result<()> {
        let value = check_led_value(value)?;
        if self.platform.set_airplane_led(value) {
            Ok(())
        } else {
            Err(fdo::Error::Failed("airplane LED unavailable".into()))
        }
    }

    async fn wwan_blocked(&self) -> fdo::Result<bool> {
        self.platform
            .wwan_blocked()
            .ok_or_else(|| fdo::Error::NotSupported("WWAN kill-switch disabled".into()))
    }

    async fn set_wwan_blocked(&self, blocked: bool) -> fdo::Result<()> {
        if self.blocking(move |p| p.set_wwan_blocked(blocked)).await? {
            Ok(())
        } else {
            Err(fdo::Error::NotSupported("WWAN kill-switch disabled".into()))
        }
    }
}

#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait Login1Manager {
    #[zbus(signal)]
    fn prepare_for_sleep(&self, start: bool) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.freedesktop.login1.Seat",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1/seat/seat0"
)]
trait Login1Seat {
    #[zbus(property)]
    fn active_session(&self) -> zbus::Result<(String, zbus::zvariant::OwnedObjectPath)>;
}

#[zbus::proxy(
    interface = "org.freedesktop.login1.Session",
    default_service = "org.freedesktop.login1"
)]
trait Login1Session {
    #[zbus(property)]
    fn idle_hint(&self) -> zbus::Result<bool>;
}

/// Publish the control surface on the system bus.
pub async fn serve(platform: Arc<Platform>) -> zbus::Result<zbus::Connection> {
    let conn = zbus::connection::Builder::system()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, WmiInterface::new(platform))?
        .build()
        .await?;

    info!("D-Bus: {} on system bus", BUS_NAME);
    Ok(conn)
}

/// Call [`Platform::resume`] after every system resume; runs until the
/// signal stream ends.
pub async fn watch_resume(conn: zbus::Connection, platform: Arc<Platform>) -> zbus::Result<()> {
    let manager = Login1ManagerProxy::new(&conn).await?;
    let mut signals = manager.receive_prepare_for_sleep().await?;

    while let Some(signal) = signals.next().await {
        let start = match signal.args() {
            Ok(args) => *args.start(),
            Err(e) => {
                warn!("Malformed PrepareForSleep signal: {e}");
                continue;
            }
        };
        debug!("PrepareForSleep({})", start);

        if !start {
            let platform = Arc::clone(&platform);
            if let Err(e) = tokio::task::spawn_blocking(move || platform.resume()).await {
                warn!("Resume task failed: {e}");
            }
        }
    }
    Ok(())
}

/// Dim the keyboard while the active session on `seat0` is idle; runs
/// until the property stream ends
pub async fn watch_idle(conn: zbus::Connection, dimmer: Arc<IdleDimmer>) -> zbus::Result<()> {
    let seat = Login1SeatProxy::new(&conn).await?;
    let (id, path) = seat.active_session().await?;
    info!("Watching idle state of session {}", id);

    let session = Login1SessionProxy::builder(&conn)
        .path(path)?
        .build()
        .await?;
    let mut changes = session.receive_idle_hint_changed().await;

    while let Some(change) = changes.next().await {
        let idle = match change.get().await {
            Ok(idle) => idle,
            Err(e) => {
                warn!("Could not read IdleHint: {e}");
                continue;
            }
        };
        debug!("IdleHint({})", idle);

        let dimmer = Arc::clone(&dimmer);
        let handled = tokio::task::spawn_blocking(move || {
            if idle {
                dimmer.idle();
            } else {
                dimmer.active();
            }
        });
        if let Err(e) = handled.await {
            warn!("Idle task failed: {e}");
        }
    }
    Ok(())
}
