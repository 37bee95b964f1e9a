//! Airplane-mode hotkey debounce
//!
//! A press is seen twice: the poll loop finds the latched bit in EC
//! register 0xDB, and the firmware sends a WMI notification. Both sources
//! go through one [`ReportGate`], which holds the count of reports already
//! delivered. A source remembers how many reports it has seen; when it
//! detects a press and the gate has moved past that mark, another source
//! already delivered this press and it stays quiet.
//!
//! The first notification also stops the poll loop for good.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};
use tuxedo_transport::protocol::ec;
use tuxedo_transport::BoxedEc;

/// Receiver of logical key presses
pub trait KeySink: Send + Sync {
    /// Emit one press + release of the airplane-mode key
    fn press_and_release(&self) -> io::Result<()>;
}

/// Outcome of a report attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// This source delivered the press
    Emitted,
    /// Another source got there first
    Skipped,
    /// The sink rejected the event; nothing counted
    Failed,
}

/// Per-source mark of the reports already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportCursor {
    seen: u64,
}

impl ReportCursor {
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

/// First-writer-wins gate in front of the key sink
pub struct ReportGate {
    reported: Mutex<u64>,
    sink: Arc<dyn KeySink>,
}

impl ReportGate {
    pub fn new(sink: Arc<dyn KeySink>) -> Self {
        Self {
            reported: Mutex::new(0),
            sink,
        }
    }

    /// Cursor for a new source, positioned at the current count
    pub fn cursor(&self) -> ReportCursor {
        ReportCursor {
            seen: *self.reported.lock(),
        }
    }

    /// Number of logical presses delivered so far
    pub fn reported(&self) -> u64 {
        *self.reported.lock()
    }

    /// Deliver a detected press unless another source already did
    pub fn try_report(&self, cursor: &mut ReportCursor) -> Delivery {
        let mut reported = self.reported.lock();

        // one skip consumes one press the other source delivered
        if *reported > cursor.seen {
            cursor.seen += 1;
            return Delivery::Skipped;
        }

        if let Err(e) = self.sink.press_and_release() {
            error!("Failed to report airplane-mode key: {e}");
            return Delivery::Failed;
        }

        *reported += 1;
        cursor.seen = *reported;
        Delivery::Emitted
    }
}

/// Stop flag a sleeping thread can be woken by
pub(crate) struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    pub(crate) fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    pub(crate) fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    /// Sleep for `period` or until stopped; returns true when stopped
    pub(crate) fn sleep(&self, period: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.wake.wait_for(&mut stopped, period);
        }
        *stopped
    }
}

/// Background thread sampling the EC hotkey latch
pub struct PollLoop {
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl PollLoop {
    /// Start polling at `freq` Hz (1-20)
    pub fn spawn(ec: BoxedEc, gate: Arc<ReportGate>, freq: u32) -> io::Result<Self> {
        let signal = Arc::new(StopSignal::new());
        let period = Duration::from_millis(1000 / freq.max(1) as u64);
        let cursor = gate.cursor();

        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name("tuxedo-polld".into())
            .spawn(move || poll(ec, gate, cursor, thread_signal, period))?;

        info!("Polling thread started, polling at {} Hz", freq);
        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Whether the thread has exited on its own
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop and join; the thread never runs again once this returns
    pub fn stop(&mut self) {
        self.signal.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Polling thread panicked");
            }
        }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll(
    ec: BoxedEc,
    gate: Arc<ReportGate>,
    mut cursor: ReportCursor,
    signal: Arc<StopSignal>,
    period: Duration,
) {
    while !signal.is_stopped() {
        match ec.read(ec::AIRPLANE_STATUS) {
            Ok(byte) if byte & ec::AIRPLANE_BIT != 0 => {
                if let Err(e) = ec.write(ec::AIRPLANE_STATUS, byte & !ec::AIRPLANE_BIT) {
                    warn!("Failed to acknowledge hotkey latch: {e}");
                }
                debug!("Airplane-Mode Hotkey pressed (poll)");

                if gate.try_report(&mut cursor) == Delivery::Skipped {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Hotkey status read failed: {e}"),
        }

        if signal.sleep(period) {
            break;
        }
    }

    info!("Polling thread exiting");
}

/// Clear a stale latch so it does not read as a press
pub fn clear_latch(ec: &BoxedEc) {
    let cleared = ec
        .read(ec::AIRPLANE_STATUS)
        .and_then(|byte| ec.write(ec::AIRPLANE_STATUS, byte & !ec::AIRPLANE_BIT));
    if let Err(e) = cleared {
        warn!("Failed to clear hotkey latch: {e}");
    }
}

/// The hotkey as a whole: gate, poll loop and notification source
pub struct Hotkey {
    gate: Arc<ReportGate>,
    poll: Mutex<Option<PollLoop>>,
    notify_cursor: Mutex<ReportCursor>,
}

impl Hotkey {
    /// Open the hotkey and start polling
    ///
    /// A poll loop that fails to start is logged; notifications still work.
    pub fn open(sink: Arc<dyn KeySink>, ec: BoxedEc, poll_freq: u32) -> Self {
        let gate = Arc::new(ReportGate::new(sink));
        let notify_cursor = gate.cursor();

        let poll = match PollLoop::spawn(ec, Arc::clone(&gate), poll_freq) {
            Ok(poll) => Some(poll),
            Err(e) => {
                error!("Could not create polling thread: {e}");
                None
            }
        };

        Self {
            gate,
            poll: Mutex::new(poll),
            notify_cursor: Mutex::new(notify_cursor),
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll.lock().as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Airplane-mode key reported by the firmware
    pub fn on_notification(&self) -> Delivery {
        debug!("Airplane-Mode Hotkey pressed (notification)");

        if let Some(mut poll) = self.poll.lock().take() {
            info!("Stopping polling thread");
            poll.stop();
        }

        let mut cursor = self.notify_cursor.lock();
        self.gate.try_report(&mut cursor)
    }

    /// Stop polling; later notifications are still delivered
    pub fn close(&self) {
        if let Some(mut poll) = self.poll.lock().take() {
            poll.stop();
        }
    }
}
