//! WWAN radio kill-switch

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info};
use tuxedo_transport::protocol::method;
use tuxedo_transport::{BoxedChannel, TransportError};

/// Kill-switch name
pub const RFKILL_NAME: &str = "tuxedo-wwan";

/// Soft kill-switch for the WWAN module
///
/// The firmware has to be told that the OS is handling 3G power before
/// the radio answers; that is undone on unregister.
pub struct WwanKillSwitch {
    channel: BoxedChannel,
    soft_blocked: AtomicBool,
}

impl WwanKillSwitch {
    /// Take over 3G power control and mirror the current radio state
    pub fn register(channel: BoxedChannel) -> Self {
        if let Err(e) = channel.invoke(method::TALK_BIOS_3G, 1) {
            error!("Could not take over 3G power control: {e}");
        }

        let switch = Self {
            channel,
            soft_blocked: AtomicBool::new(false),
        };
        switch.refresh();
        info!("Registered {}", RFKILL_NAME);
        switch
    }

    fn query_unblocked(&self) -> Result<bool, TransportError> {
        Ok(self.channel.invoke(method::GET_POWER_STATE_FOR_3G, 0)? != 0)
    }

    /// Re-read the radio power state into the soft-block flag
    pub fn refresh(&self) {
        match self.query_unblocked() {
            Ok(unblocked) => self.soft_blocked.store(!unblocked, Ordering::SeqCst),
            Err(e) => error!("Could not get 3G power state! ({e})"),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.soft_blocked.load(Ordering::SeqCst)
    }

    /// Block or unblock the radio
    ///
    /// The flag follows the request even when the firmware refuses it,
    /// like any soft kill-switch does.
    pub fn set_block(&self, blocked: bool) {
        debug!("blocked={}", blocked);

        if let Err(e) = self.channel.invoke(method::SET_3G, !blocked as u32) {
            error!("Setting 3G power state failed! ({e})");
        }
        self.soft_blocked.store(blocked, Ordering::SeqCst);
    }

    /// Hand 3G power control back to the firmware
    pub fn unregister(self) {
        if let Err(e) = self.channel.invoke(method::TALK_BIOS_3G, 0) {
            error!("Could not release 3G power control: {e}");
        }
        info!("Unregistered {}", RFKILL_NAME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tuxedo_transport::RecordingChannel;

    #[test]
    fn test_register_mirrors_power_state() {
        let channel = Arc::new(RecordingChannel::new());
        channel.set_reply(method::GET_POWER_STATE_FOR_3G, 1);

        let switch = WwanKillSwitch::register(channel.clone());

        assert!(!switch.is_blocked());
        assert_eq!(
            channel.calls(),
            vec![
                (method::TALK_BIOS_3G, 1),
                (method::GET_POWER_STATE_FOR_3G, 0)
            ]
        );
    }

    #[test]
    fn test_powered_down_radio_is_blocked() {
        let channel = Arc::new(RecordingChannel::new());
        let switch = WwanKillSwitch::register(channel);
        assert!(switch.is_blocked());
    }

    #[test]
    fn test_query_failure_keeps_switch() {
        let channel = Arc::new(RecordingChannel::new());
        channel.fail_method(method::GET_POWER_STATE_FOR_3G);

        let switch = WwanKillSwitch::register(channel.clone());
        assert!(!switch.is_blocked());

        switch.set_block(true);
        assert!(channel.calls().contains(&(method::SET_3G, 0)));
    }

    #[test]
    fn test_set_block_sends_inverse() {
        let channel = Arc::new(RecordingChannel::new());
        let switch = WwanKillSwitch::register(channel.clone());
        channel.take_calls();

        switch.set_block(false);
        switch.set_block(true);

        assert_eq!(
            channel.take_calls(),
            vec![(method::SET_3G, 1), (method::SET_3G, 0)]
        );
        assert!(switch.is_blocked());
    }

    #[test]
    fn test_set_block_failure_is_logged_only() {
        let channel = Arc::new(RecordingChannel::new());
        channel.set_reply(method::GET_POWER_STATE_FOR_3G, 1);
        let switch = WwanKillSwitch::register(channel.clone());
        channel.fail_method(method::SET_3G);

        switch.set_block(true);
        assert!(switch.is_blocked());
    }

    #[test]
    fn test_unregister_releases_bios() {
        let channel = Arc::new(RecordingChannel::new());
        let switch = WwanKillSwitch::register(channel.clone());
        channel.take_calls();

        switch.unregister();

        assert_eq!(channel.calls(), vec![(method::TALK_BIOS_3G, 0)]);
    }
}
