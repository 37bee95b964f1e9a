//! Logging middleware for command channels
//!
//! Wraps any [`CommandChannel`] and records each request/response pair at
//! debug level, failures at error level.

use tracing::{debug, error};

use crate::error::TransportError;
use crate::protocol::method;
use crate::{BoxedChannel, CommandChannel};

/// Command channel wrapper that traces every call
pub struct LoggedChannel {
    inner: BoxedChannel,
}

impl LoggedChannel {
    /// Wrap an existing channel
    pub fn wrap(inner: BoxedChannel) -> Self {
        Self { inner }
    }
}

impl CommandChannel for LoggedChannel {
    fn invoke(&self, id: u8, arg: u32) -> Result<u32, TransportError> {
        debug!("{:#04x} {:<22} IN : {:#010x}", id, method::name(id), arg);
        match self.inner.invoke(id, arg) {
            Ok(out) => {
                debug!("{:#04x} {:<22} OUT: {:#010x} (IN: {:#010x})", id, method::name(id), out, arg);
                Ok(out)
            }
            Err(e) => {
                error!("{:#04x} {} failed (IN: {:#010x}): {}", id, method::name(id), arg, e);
                Err(e)
            }
        }
    }
}
