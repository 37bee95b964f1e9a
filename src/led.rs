//! Airplane-mode indicator LED
//!
//! The LED is bit 0x40 of EC register 0xD9, optionally with inverted
//! polarity. `set` must not block, so writes go through a single-slot
//! channel to one worker thread; requests that pile up while the worker is
//! busy collapse into the latest one.

use std::io;
use std::thread::{self, JoinHandle};

use tokio::sync::watch;
use tracing::{debug, error, info};
use tuxedo_transport::protocol::ec;
use tuxedo_transport::{BoxedEc, TransportError};

/// LED class name
pub const LED_NAME: &str = "tuxedo::airplane";

/// Highest brightness value; the LED is on/off only
pub const MAX_BRIGHTNESS: u8 = 1;

/// Register value with the LED bit set for `on`
fn apply_bit(byte: u8, on: bool, invert: bool) -> u8 {
    if on != invert {
        byte | ec::AIRPLANE_BIT
    } else {
        byte & !ec::AIRPLANE_BIT
    }
}

fn write_led(ec: &BoxedEc, on: bool, invert: bool) -> Result<(), TransportError> {
    let byte = ec.read(ec::AIRPLANE_LED)?;
    ec.write(ec::AIRPLANE_LED, apply_bit(byte, on, invert))
}

async fn led_worker(ec: BoxedEc, invert: bool, mut rx: watch::Receiver<bool>) {
    while rx.changed().await.is_ok() {
        let on = *rx.borrow_and_update();
        debug!("{} -> {}", LED_NAME, on);
        if let Err(e) = write_led(&ec, on, invert) {
            error!("Failed to update {}: {e}", LED_NAME);
        }
    }
}

/// Airplane LED with a deferred writer
pub struct AirplaneLed {
    ec: BoxedEc,
    invert: bool,
    tx: Option<watch::Sender<bool>>,
    worker: Option<JoinHandle<()>>,
}

impl AirplaneLed {
    pub fn register(ec: BoxedEc, invert: bool) -> io::Result<Self> {
        let (tx, rx) = watch::channel(false);

        let worker_ec = ec.clone();
        let worker = thread::Builder::new()
            .name("tuxedo-led".into())
            .spawn(move || futures::executor::block_on(led_worker(worker_ec, invert, rx)))?;

        info!("Registered LED {}", LED_NAME);
        Ok(Self {
            ec,
            invert,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Current LED state, read from the EC
    pub fn get(&self) -> Result<u8, TransportError> {
        let byte = self.ec.read(ec::AIRPLANE_LED)?;
        let lit = (byte & ec::AIRPLANE_BIT != 0) != self.invert;
        Ok(lit as u8)
    }

    /// Request a new state; returns immediately
    pub fn set(&self, brightness: u8) {
        if let Some(tx) = &self.tx {
            tx.send_replace(brightness != 0);
        }
    }

    /// Flush the pending request and stop the worker
    pub fn unregister(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // closing the channel ends the worker after the last request
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("LED worker panicked");
            }
        }
    }
}

impl Drop for AirplaneLed {
    fn drop(&mut self) {
        self.shutdown();
    }
}
