//! End-to-end attach scenarios on in-memory hardware

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use tuxedo_wmi::backlight::{Color, DmiIdentity, Mode, ZoneColors};
use tuxedo_wmi::transport::protocol::{ec, event, method, EVENT_GUID, GET_GUID};
use tuxedo_wmi::transport::{MemoryEc, RecordingChannel};
use tuxedo_wmi::{AttachError, Config, ConfigError, Hardware, KeySink, Platform};

#[derive(Default)]
struct Presses(AtomicU64);

impl KeySink for Presses {
    fn press_and_release(&self) -> io::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Machine {
    channel: Arc<RecordingChannel>,
    ec: Arc<MemoryEc>,
    presses: Arc<Presses>,
}

impl Machine {
    fn new() -> Self {
        Self {
            channel: Arc::new(RecordingChannel::new()),
            ec: Arc::new(MemoryEc::new()),
            presses: Arc::new(Presses::default()),
        }
    }

    fn hardware(&self, product: &str) -> Hardware {
        Hardware {
            channel: self.channel.clone(),
            ec: self.ec.clone(),
            wmi: Box::new(vec![EVENT_GUID.to_string(), GET_GUID.to_string()]),
            identity: DmiIdentity::new("Notebook", product),
            key_sink: Some(self.presses.clone()),
        }
    }

    fn presses(&self) -> u64 {
        self.presses.0.load(Ordering::SeqCst)
    }
}

fn config(text: &str) -> Config {
    Config::parse(text).unwrap()
}

#[test]
fn single_color_fills_every_zone() {
    for product in ["P370SM-A", "P15SM"] {
        let machine = Machine::new();
        let platform =
            Platform::attach(&config(r#"kb_color = ["red"]"#), machine.hardware(product)).unwrap();

        assert_eq!(
            platform.backlight().unwrap().colors(),
            ZoneColors::uniform(Color::Red)
        );
        platform.detach();
    }
}

#[test]
fn two_colors_refuse_to_attach() {
    let machine = Machine::new();
    let result = Platform::attach(
        &config(r#"kb_color = ["red", "green"]"#),
        machine.hardware("P750ZM"),
    );

    assert!(matches!(
        result,
        Err(AttachError::Config(ConfigError::ColorCount(2)))
    ));
    assert!(machine.channel.calls().is_empty());
    assert_eq!(machine.presses(), 0);
}

#[test]
fn configured_off_stays_dark() {
    let machine = Machine::new();
    let platform =
        Platform::attach(&config("kb_off = true"), machine.hardware("P750ZM")).unwrap();
    let backlight = platform.backlight().unwrap();

    assert!(backlight.is_off());

    // hotkeys other than toggle do nothing while off
    machine.channel.push_reply(method::GET_EVENT, event::NEXT_MODE);
    platform.notify(event::NOTIFY_HOTKEY);
    assert_eq!(backlight.mode(), Mode::Custom);
    platform.detach();
}

#[test]
fn poll_and_notification_report_one_press() {
    for _ in 0..20 {
        let machine = Machine::new();
        let platform = Platform::attach(
            &config("poll_freq = 20"),
            machine.hardware("P750ZM"),
        )
        .unwrap();

        machine.channel.push_reply(method::GET_EVENT, event::AIRPLANE_HOTKEY);
        let barrier = Barrier::new(2);

        thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                machine.ec.poke(ec::AIRPLANE_STATUS, ec::AIRPLANE_BIT);
            });
            s.spawn(|| {
                barrier.wait();
                platform.notify(event::NOTIFY_HOTKEY);
            });
        });

        // the notification has stopped polling by now
        assert!(!platform.is_polling());
        assert_eq!(machine.presses(), 1);
        platform.detach();
    }
}

#[test]
fn polling_alone_reports_every_press() {
    let machine = Machine::new();
    let platform = Platform::attach(&config("poll_freq = 20"), machine.hardware("P750ZM")).unwrap();

    for expected in 1..=3 {
        machine.ec.poke(ec::AIRPLANE_STATUS, ec::AIRPLANE_BIT);
        let deadline = Instant::now() + Duration::from_secs(5);
        while machine.presses() < expected {
            assert!(Instant::now() < deadline, "press {expected} not reported");
            thread::sleep(Duration::from_millis(5));
        }
    }

    assert!(platform.is_polling());
    platform.detach();
    assert!(!platform.is_polling());
}
