//! Attach, detach and resume
//!
//! [`Platform`] owns everything that lives between attach and detach: the
//! backlight controller (if the machine has a known dialect), the
//! kill-switch, the hotkey and the LED. Notifications, control requests
//! and resume events all arrive through it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use tuxedo_backlight::{Backlight, DmiIdentity, SupportedModel};
use tuxedo_transport::protocol::{method, EVENT_GUID, GET_GUID};
use tuxedo_transport::{
    AcpiCallChannel, BoxedChannel, BoxedEc, DebugfsEc, LoggedChannel, MemoryEc,
    RecordingChannel, SysfsWmiBus, TransportError, WmiBus,
};

use crate::config::{Config, ConfigError, Paths};
use crate::events::{self, WmiEvent};
use crate::hotkey::{self, Hotkey, KeySink};
use crate::input::{AirplaneKey, LogSink};
use crate::led::AirplaneLed;
use crate::rfkill::WwanKillSwitch;

/// Errors that abort attach
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No such device: WMI GUID {0} not present")]
    NoDevice(&'static str),

    #[error("Hardware interface error: {0}")]
    Transport(#[from] TransportError),
}

/// Handles to the hardware a platform attaches to
pub struct Hardware {
    pub channel: BoxedChannel,
    pub ec: BoxedEc,
    pub wmi: Box<dyn WmiBus>,
    pub identity: DmiIdentity,
    /// `None` when no virtual key device could be created
    pub key_sink: Option<Arc<dyn KeySink>>,
}

fn read_identity(paths: &Paths) -> DmiIdentity {
    DmiIdentity::read_from(&paths.dmi_dir).unwrap_or_else(|e| {
        warn!("Could not read DMI identity from {}: {e}", paths.dmi_dir.display());
        DmiIdentity::default()
    })
}

impl Hardware {
    /// Open the real interfaces (acpi_call, ec_sys, sysfs, uinput)
    pub fn open(paths: &Paths) -> Result<Self, AttachError> {
        let acpi = AcpiCallChannel::open(&paths.acpi_call, &paths.wmbb_method)?;
        let ec = DebugfsEc::open(&paths.ec_io)?;

        let key_sink: Option<Arc<dyn KeySink>> = match AirplaneKey::create() {
            Ok(key) => {
                if let Some(node) = key.device_path() {
                    info!("Input device: {}", node.display());
                }
                Some(Arc::new(key))
            }
            Err(e) => {
                error!("Error registering input device: {e}");
                None
            }
        };

        Ok(Self {
            channel: Arc::new(LoggedChannel::wrap(Arc::new(acpi))),
            ec: Arc::new(ec),
            wmi: Box::new(SysfsWmiBus::new(&paths.wmi_bus)),
            identity: read_identity(paths),
            key_sink,
        })
    }

    /// In-memory stand-ins that log instead of touching firmware
    ///
    /// The DMI identity is still read so model detection can be checked.
    pub fn simulated(paths: &Paths) -> Self {
        Self {
            channel: Arc::new(LoggedChannel::wrap(Arc::new(RecordingChannel::new()))),
            ec: Arc::new(MemoryEc::new()),
            wmi: Box::new(vec![EVENT_GUID.to_string(), GET_GUID.to_string()]),
            identity: read_identity(paths),
            key_sink: Some(Arc::new(LogSink)),
        }
    }
}

/// Attached driver instance
pub struct Platform {
    channel: BoxedChannel,
    model: Option<&'static SupportedModel>,
    backlight: Option<Backlight>,
    rfkill: Mutex<Option<WwanKillSwitch>>,
    hotkey: Mutex<Option<Hotkey>>,
    led: Mutex<Option<AirplaneLed>>,
    attached: AtomicBool,
}

impl Platform {
    /// Validate the configuration, identify the machine and bring up
    /// every sub-device
    ///
    /// Only a bad configuration or missing WMI GUIDs fail the attach;
    /// sub-devices that cannot be registered are logged and skipped.
    pub fn attach(config: &Config, hw: Hardware) -> Result<Self, AttachError> {
        let settings = config.resolve()?;

        let model = hw.identity.identify();
        match model {
            Some(model) => info!("Model {} found ({})", model.ident, model.dialect),
            None => info!(
                "No keyboard backlight support for \"{}\"",
                hw.identity
            ),
        }

        for guid in [EVENT_GUID, GET_GUID] {
            if !hw.wmi.has_guid(guid) {
                return Err(AttachError::NoDevice(guid));
            }
        }

        if let Err(e) = hw.channel.invoke(method::GET_AP, 0) {
            error!("Could not enable hotkey notifications: {e}");
        }

        let backlight = model.map(|m| Backlight::new(m.dialect, hw.channel.clone()));
        if let Some(backlight) = &backlight {
            backlight.init(&settings.backlight);
        }

        let rfkill = settings
            .rfkill
            .then(|| WwanKillSwitch::register(hw.channel.clone()));

        let hotkey = hw.key_sink.map(|sink| {
            hotkey::clear_latch(&hw.ec);
            Hotkey::open(sink, hw.ec.clone(), settings.poll_freq)
        });

        let led = match AirplaneLed::register(hw.ec.clone(), settings.led_invert) {
            Ok(led) => Some(led),
            Err(e) => {
                error!("Could not register airplane LED: {e}");
                None
            }
        };

        Ok(Self {
            channel: hw.channel,
            model,
            backlight,
            rfkill: Mutex::new(rfkill),
            hotkey: Mutex::new(hotkey),
            led: Mutex::new(led),
            attached: AtomicBool::new(true),
        })
    }

    pub fn model(&self) -> Option<&'static SupportedModel> {
        self.model
    }

    pub fn backlight(&self) -> Option<&Backlight> {
        self.backlight.as_ref()
    }

    /// Handle a raw WMI notification value
    pub fn notify(&self, value: u32) {
        let Some(event) = events::decode(self.channel.as_ref(), value) else {
            return;
        };
        debug!("WMI event {}", event);

        match event {
            WmiEvent::AirplaneHotkey => match self.hotkey.lock().as_ref() {
                Some(hotkey) => {
                    hotkey.on_notification();
                }
                None => debug!("Airplane-mode key without input device"),
            },
            event if event.is_backlight() => {
                if let Some(backlight) = &self.backlight {
                    backlight.handle_event(event.code());
                }
            }
            event => debug!("Unhandled WMI event {}", event),
        }
    }

    /// Restore firmware state after a system resume
    pub fn resume(&self) {
        info!("Resuming");

        if let Err(e) = self.channel.invoke(method::GET_AP, 0) {
            error!("Could not re-enable hotkey notifications: {e}");
        }
        if let Some(rfkill) = self.rfkill.lock().as_ref() {
            rfkill.refresh();
        }
        if let Some(backlight) = &self.backlight {
            backlight.resume();
        }
    }

    /// Airplane LED state, `None` if the LED is not available
    pub fn airplane_led(&self) -> Option<u8> {
        let led = self.led.lock();
        match led.as_ref()?.get() {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Could not read airplane LED: {e}");
                None
            }
        }
    }

    /// Returns false if the LED is not registered
    pub fn set_airplane_led(&self, value: u8) -> bool {
        match self.led.lock().as_ref() {
            Some(led) => {
                led.set(value);
                true
            }
            None => false,
        }
    }

    /// WWAN soft-block state, `None` when the kill-switch is disabled
    pub fn wwan_blocked(&self) -> Option<bool> {
        self.rfkill.lock().as_ref().map(WwanKillSwitch::is_blocked)
    }

    /// Returns false if the kill-switch is disabled
    pub fn set_wwan_blocked(&self, blocked: bool) -> bool {
        match self.rfkill.lock().as_ref() {
            Some(rfkill) => {
                rfkill.set_block(blocked);
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.hotkey.lock().as_ref().is_some_and(Hotkey::is_polling)
    }

    /// Release all sub-devices: LED, hotkey, kill-switch
    ///
    /// Background threads are joined before this returns. Calling it again
    /// does nothing; dropping the platform detaches it too.
    pub fn detach(&self) {
        if !self.attached.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(led) = self.led.lock().take() {
            led.unregister();
        }
        if let Some(hotkey) = self.hotkey.lock().take() {
            hotkey.close();
        }
        if let Some(rfkill) = self.rfkill.lock().take() {
            rfkill.unregister();
        }
        info!("Detached");
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.detach();
    }
}
