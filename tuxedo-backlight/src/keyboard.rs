//! Backlight controller
//!
//! Owns the single [`BacklightState`] record and the dialect chosen at
//! attach. Every operation takes the state lock for its whole duration,
//! so a hotkey transition and a control-surface write can never interleave
//! their firmware calls.
//!
//! Firmware failures are logged here and never handed to the caller: the
//! tracked state already reflects only what the firmware accepted, and
//! re-issuing any operation is safe.

use parking_lot::Mutex;
use tracing::{debug, error};
use tuxedo_transport::protocol::event;
use tuxedo_transport::{BoxedChannel, TransportError};

use crate::dialect::{self, Dialect};
use crate::error::BacklightError;
use crate::led::{Color, Mode, Power, Zone, BRIGHTNESS_MAX};
use crate::models::DialectKind;
use crate::state::{BacklightDefaults, BacklightState, ZoneColors};

fn report(op: &str, result: Result<(), TransportError>) {
    if let Err(e) = result {
        error!("Backlight {op} failed: {e}");
    }
}

/// Keyboard backlight driven through one dialect
pub struct Backlight {
    state: Mutex<BacklightState>,
    dialect: Box<dyn Dialect>,
}

impl Backlight {
    /// Build the controller for a hardware family
    pub fn new(kind: DialectKind, channel: BoxedChannel) -> Self {
        Self::with_dialect(dialect::for_kind(kind, channel))
    }

    pub fn with_dialect(dialect: Box<dyn Dialect>) -> Self {
        Self {
            state: Mutex::new(BacklightState::default()),
            dialect,
        }
    }

    pub fn kind(&self) -> DialectKind {
        self.dialect.kind()
    }

    /// Copy of the tracked state
    pub fn snapshot(&self) -> BacklightState {
        *self.state.lock()
    }

    /// Apply the startup configuration
    pub fn init(&self, defaults: &BacklightDefaults) {
        let mut state = self.state.lock();
        self.dialect.init(&mut state, defaults);
        debug!("Backlight after init: {:?}", *state);
    }

    // === Hotkey transitions ===

    pub fn decrease_brightness(&self) {
        let mut state = self.state.lock();
        if !state.accepts_brightness_steps() || state.brightness == 0 {
            return;
        }
        let level = state.brightness as u32 - 1;
        report("brightness", self.dialect.set_brightness(&mut state, level));
    }

    /// No upper guard; the dialect clamp turns 10 + 1 into 10
    pub fn increase_brightness(&self) {
        let mut state = self.state.lock();
        if !state.accepts_brightness_steps() {
            return;
        }
        let level = state.brightness as u32 + 1;
        report("brightness", self.dialect.set_brightness(&mut state, level));
    }

    /// Advance to the next mode in the hotkey cycle
    ///
    /// # Panics
    /// If the tracked mode is missing from the cycle order.
    pub fn cycle_mode(&self) {
        let mut state = self.state.lock();
        if !state.is_on() {
            return;
        }
        let next = state.mode.next();
        report("mode", self.dialect.set_mode(&mut state, next));
    }

    pub fn toggle_power(&self) {
        let mut state = self.state.lock();
        let power = state.power.toggled();
        report("state", self.dialect.set_state(&mut state, power));
    }

    /// Dispatch a decoded firmware event; returns false for codes that are
    /// not backlight keys
    pub fn handle_event(&self, code: u32) -> bool {
        match code {
            event::BRIGHTNESS_DOWN => self.decrease_brightness(),
            event::BRIGHTNESS_UP => self.increase_brightness(),
            event::NEXT_MODE => self.cycle_mode(),
            event::TOGGLE_POWER => self.toggle_power(),
            _ => return false,
        }
        true
    }

    /// Re-assert the last mode after a system resume
    pub fn resume(&self) {
        let mut state = self.state.lock();
        if !state.is_on() {
            return;
        }
        let mode = state.mode;
        report("resume", self.dialect.set_mode(&mut state, mode));
    }

    // === Encoder passthroughs ===

    pub fn set_state(&self, power: Power) -> Result<(), TransportError> {
        self.dialect.set_state(&mut self.state.lock(), power)
    }

    pub fn set_color(&self, colors: ZoneColors) -> Result<(), TransportError> {
        self.dialect.set_color(&mut self.state.lock(), colors)
    }

    pub fn set_brightness(&self, level: u32) -> Result<(), TransportError> {
        self.dialect.set_brightness(&mut self.state.lock(), level)
    }

    pub fn set_mode(&self, mode: Mode) -> Result<(), TransportError> {
        self.dialect.set_mode(&mut self.state.lock(), mode)
    }

    // === Control surface ===

    pub fn brightness(&self) -> u8 {
        self.state.lock().brightness
    }

    /// Out-of-range levels are rejected; a valid level only reaches the
    /// firmware while the keyboard is lit and in `Custom`
    pub fn write_brightness(&self, level: u8) -> Result<(), BacklightError> {
        if level > BRIGHTNESS_MAX {
            return Err(BacklightError::InvalidParameter(format!(
                "brightness {level} exceeds {BRIGHTNESS_MAX}"
            )));
        }

        let mut state = self.state.lock();
        if state.accepts_brightness_steps() {
            report(
                "brightness",
                self.dialect.set_brightness(&mut state, level as u32),
            );
        }
        Ok(())
    }

    pub fn colors(&self) -> ZoneColors {
        self.state.lock().colors
    }

    pub fn zone_color(&self, zone: Zone) -> Color {
        self.state.lock().colors.get(zone)
    }

    /// Palette index form of [`write_zone_color`](Self::write_zone_color)
    pub fn write_zone_index(&self, zone: Zone, index: u8) -> Result<(), BacklightError> {
        let color = Color::from_index(index).ok_or_else(|| {
            BacklightError::InvalidParameter(format!("palette index {index} out of range"))
        })?;
        self.write_zone_color(zone, color);
        Ok(())
    }

    /// Store one zone and rebuild `Custom`; ignored unless lit and in `Custom`
    pub fn write_zone_color(&self, zone: Zone, color: Color) {
        let mut state = self.state.lock();
        if !state.accepts_brightness_steps() {
            return;
        }
        state.colors.set(zone, color);
        report("color", self.dialect.set_mode(&mut state, Mode::Custom));
    }

    /// All zones at once, under the same rule as a single zone
    pub fn write_colors(&self, colors: ZoneColors) {
        let mut state = self.state.lock();
        if !state.accepts_brightness_steps() || state.colors == colors {
            return;
        }
        state.colors = colors;
        report("color", self.dialect.set_mode(&mut state, Mode::Custom));
    }

    pub fn is_off(&self) -> bool {
        !self.state.lock().is_on()
    }

    pub fn write_off(&self, off: bool) {
        let power = if off { Power::Off } else { Power::On };
        report("state", self.set_state(power));
    }

    pub fn mode(&self) -> Mode {
        self.state.lock().mode
    }

    pub fn write_mode(&self, mode: Mode) {
        report("mode", self.set_mode(mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tuxedo_transport::protocol::method;
    use tuxedo_transport::RecordingChannel;

    fn lit(kind: DialectKind) -> (Arc<RecordingChannel>, Backlight) {
        let channel = Arc::new(RecordingChannel::new());
        let backlight = Backlight::new(kind, channel.clone());
        backlight.init(&BacklightDefaults {
            colors: ZoneColors::uniform(Color::White),
            brightness: 5,
            off: false,
        });
        channel.take_calls();
        (channel, backlight)
    }

    #[test]
    fn test_brightness_steps() {
        let (_, backlight) = lit(DialectKind::FullColor);

        backlight.increase_brightness();
        assert_eq!(backlight.brightness(), 6);
        backlight.decrease_brightness();
        backlight.decrease_brightness();
        assert_eq!(backlight.brightness(), 4);
    }

    #[test]
    fn test_decrease_stops_at_zero() {
        let (channel, backlight) = lit(DialectKind::EightColor);
        backlight.write_brightness(0).unwrap();
        channel.take_calls();

        backlight.decrease_brightness();

        assert!(channel.calls().is_empty());
        assert_eq!(backlight.brightness(), 0);
    }

    #[test]
    fn test_increase_at_max_reissues_max() {
        let (channel, backlight) = lit(DialectKind::FullColor);
        backlight.write_brightness(10).unwrap();
        let before = backlight.snapshot();
        channel.take_calls();

        backlight.increase_brightness();

        assert_eq!(backlight.snapshot(), before);
        assert_eq!(channel.args_for(method::SET_KB_LED).len(), 1);
    }

    #[test]
    fn test_steps_ignored_when_off_or_animating() {
        let (channel, backlight) = lit(DialectKind::FullColor);

        backlight.write_mode(Mode::Wave);
        channel.take_calls();
        backlight.increase_brightness();
        backlight.decrease_brightness();
        assert!(channel.calls().is_empty());

        backlight.toggle_power();
        channel.take_calls();
        backlight.increase_brightness();
        backlight.cycle_mode();
        assert!(channel.calls().is_empty());
    }

    #[test]
    fn test_cycle_mode_from_custom() {
        let (_, backlight) = lit(DialectKind::FullColor);
        backlight.cycle_mode();
        assert_eq!(backlight.mode(), Mode::RandomColor);
        backlight.cycle_mode();
        assert_eq!(backlight.mode(), Mode::Dance);
    }

    #[test]
    fn test_handle_event() {
        let (_, backlight) = lit(DialectKind::FullColor);

        assert!(backlight.handle_event(event::BRIGHTNESS_UP));
        assert_eq!(backlight.brightness(), 6);
        assert!(backlight.handle_event(event::TOGGLE_POWER));
        assert!(backlight.is_off());
        assert!(!backlight.handle_event(event::AIRPLANE_HOTKEY));
        assert!(!backlight.handle_event(0x42));
    }

    #[test]
    fn test_write_brightness_rejects_out_of_range() {
        let (channel, backlight) = lit(DialectKind::FullColor);
        assert!(matches!(
            backlight.write_brightness(11),
            Err(BacklightError::InvalidParameter(_))
        ));
        assert!(channel.calls().is_empty());
    }

    #[test]
    fn test_write_zone_color_rebuilds_custom() {
        let (channel, backlight) = lit(DialectKind::FullColor);

        backlight.write_zone_color(Zone::Center, Color::Red);

        assert_eq!(
            backlight.colors(),
            ZoneColors::new(Color::White, Color::Red, Color::White)
        );
        // reset, three zones, brightness
        assert_eq!(channel.args_for(method::SET_KB_LED).len(), 5);
    }

    #[test]
    fn test_write_zone_index_validates() {
        let (_, backlight) = lit(DialectKind::EightColor);
        assert!(backlight.write_zone_index(Zone::Left, 8).is_err());
        backlight.write_zone_index(Zone::Left, 2).unwrap();
        assert_eq!(backlight.zone_color(Zone::Left), Color::Red);
    }

    #[test]
    fn test_write_colors() {
        let (channel, backlight) = lit(DialectKind::EightColor);

        backlight.write_colors(ZoneColors::new(Color::Red, Color::Green, Color::Blue));
        assert_eq!(
            backlight.colors(),
            ZoneColors::new(Color::Red, Color::Green, Color::Blue)
        );
        assert!(!channel.take_calls().is_empty());

        // same colors again: nothing to send
        backlight.write_colors(ZoneColors::new(Color::Red, Color::Green, Color::Blue));
        assert!(channel.calls().is_empty());

        backlight.write_off(true);
        backlight.write_colors(ZoneColors::uniform(Color::White));
        assert_eq!(backlight.zone_color(Zone::Left), Color::Red);
    }

    #[test]
    fn test_write_zone_color_ignored_while_animating() {
        let (_, backlight) = lit(DialectKind::FullColor);
        backlight.write_mode(Mode::Flash);

        backlight.write_zone_color(Zone::Right, Color::Green);

        assert_eq!(backlight.zone_color(Zone::Right), Color::White);
        assert_eq!(backlight.mode(), Mode::Flash);
    }

    #[test]
    fn test_resume_reasserts_mode() {
        let (channel, backlight) = lit(DialectKind::FullColor);
        backlight.write_mode(Mode::Tempo);
        channel.take_calls();

        backlight.resume();

        assert_eq!(
            channel.args_for(method::SET_KB_LED),
            vec![
                crate::full_color::cmd::RESET,
                crate::full_color::cmd::MODE_TEMPO
            ]
        );
    }

    #[test]
    fn test_resume_when_off_is_silent() {
        let (channel, backlight) = lit(DialectKind::EightColor);
        backlight.write_off(true);
        channel.take_calls();

        backlight.resume();

        assert!(channel.calls().is_empty());
    }

    #[test]
    fn test_transport_failure_is_swallowed() {
        let (channel, backlight) = lit(DialectKind::FullColor);
        channel.fail_method(method::SET_KB_LED);

        let before = backlight.snapshot();
        backlight.increase_brightness();
        backlight.cycle_mode();
        backlight.toggle_power();

        assert_eq!(backlight.snapshot(), before);
    }
}
