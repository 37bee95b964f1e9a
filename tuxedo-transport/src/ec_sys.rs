//! Embedded controller access through `ec_sys` debugfs

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::EmbeddedController;

/// Default location of the EC register file
pub const DEFAULT_EC_IO: &str = "/sys/kernel/debug/ec/ec0/io";

/// EC backed by the 256-byte debugfs `io` file, one byte per register
pub struct DebugfsEc {
    file: Mutex<File>,
}

impl DebugfsEc {
    /// Open the EC register file read/write
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| TransportError::from_open(path, e))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EmbeddedController for DebugfsEc {
    fn read(&self, reg: u8) -> Result<u8, TransportError> {
        let mut buf = [0u8; 1];
        self.file.lock().read_exact_at(&mut buf, reg as u64)?;
        Ok(buf[0])
    }

    fn write(&self, reg: u8, value: u8) -> Result<(), TransportError> {
        debug!("EC write 0x{:02X} <- 0x{:02X}", reg, value);
        self.file.lock().write_all_at(&[value], reg as u64)?;
        Ok(())
    }
}
