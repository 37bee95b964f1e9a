//! In-memory backends
//!
//! `RecordingChannel` captures every call and answers from a reply table;
//! `MemoryEc` is a 256-byte register file. Both can be told to fail, which
//! is how dry runs and tests exercise the "state unchanged on transport
//! failure" paths.

use std::collections::{HashMap, HashSet, VecDeque};

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::{CommandChannel, EmbeddedController};

#[derive(Default)]
struct ChannelState {
    calls: Vec<(u8, u32)>,
    replies: HashMap<u8, u32>,
    queued: HashMap<u8, VecDeque<u32>>,
    failing_methods: HashSet<u8>,
    failing_args: HashSet<u32>,
}

/// Command channel that records calls instead of reaching firmware
#[derive(Default)]
pub struct RecordingChannel {
    state: Mutex<ChannelState>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default reply for a method (0 if never set)
    pub fn set_reply(&self, method: u8, value: u32) {
        self.state.lock().replies.insert(method, value);
    }

    /// One-shot reply consumed before the default
    pub fn push_reply(&self, method: u8, value: u32) {
        self.state
            .lock()
            .queued
            .entry(method)
            .or_default()
            .push_back(value);
    }

    /// Make every call to `method` fail
    pub fn fail_method(&self, method: u8) {
        self.state.lock().failing_methods.insert(method);
    }

    /// Make every call carrying exactly `arg` fail
    pub fn fail_arg(&self, arg: u32) {
        self.state.lock().failing_args.insert(arg);
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.failing_methods.clear();
        state.failing_args.clear();
    }

    /// All calls so far, failed ones included
    pub fn calls(&self) -> Vec<(u8, u32)> {
        self.state.lock().calls.clone()
    }

    /// Arguments of all calls to `method`
    pub fn args_for(&self, method: u8) -> Vec<u32> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, a)| *a)
            .collect()
    }

    /// Drain the call log
    pub fn take_calls(&self) -> Vec<(u8, u32)> {
        std::mem::take(&mut self.state.lock().calls)
    }
}

impl CommandChannel for RecordingChannel {
    fn invoke(&self, method: u8, arg: u32) -> Result<u32, TransportError> {
        let mut state = self.state.lock();
        state.calls.push((method, arg));

        if state.failing_methods.contains(&method) || state.failing_args.contains(&arg) {
            return Err(TransportError::Internal(format!(
                "injected failure for 0x{method:02X} ({arg:#010x})"
            )));
        }

        if let Some(value) = state.queued.get_mut(&method).and_then(VecDeque::pop_front) {
            return Ok(value);
        }
        Ok(state.replies.get(&method).copied().unwrap_or(0))
    }
}

/// Register file held in memory
pub struct MemoryEc {
    regs: Mutex<[u8; 256]>,
    failing: Mutex<bool>,
}

impl Default for MemoryEc {
    fn default() -> Self {
        Self {
            regs: Mutex::new([0u8; 256]),
            failing: Mutex::new(false),
        }
    }
}

impl MemoryEc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register directly (simulates the EC latching a bit)
    pub fn poke(&self, reg: u8, value: u8) {
        self.regs.lock()[reg as usize] = value;
    }

    /// Read a register without going through the trait
    pub fn peek(&self, reg: u8) -> u8 {
        self.regs.lock()[reg as usize]
    }

    /// Make all accesses fail until reset
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    fn check(&self) -> Result<(), TransportError> {
        if *self.failing.lock() {
            return Err(TransportError::Internal("injected EC failure".into()));
        }
        Ok(())
    }
}

impl EmbeddedController for MemoryEc {
    fn read(&self, reg: u8) -> Result<u8, TransportError> {
        self.check()?;
        Ok(self.peek(reg))
    }

    fn write(&self, reg: u8, value: u8) -> Result<(), TransportError> {
        self.check()?;
        self.poke(reg, value);
        Ok(())
    }
}
