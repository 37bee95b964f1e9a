//! Transport layer for Clevo/Tuxedo laptop firmware
//!
//! Two independent paths reach the hardware:
//!
//! - The WMBB control method behind the Clevo WMI GUID, evaluated through
//!   the `acpi_call` kernel module (`/proc/acpi/call`)
//! - Embedded controller registers, through `ec_sys` debugfs
//!   (`/sys/kernel/debug/ec/ec0/io`, needs `write_support=1`)
//!
//! Both are exposed as traits so the backlight and hotkey logic can run on
//! the in-memory [`RecordingChannel`] / [`MemoryEc`] backends as well.

pub mod error;
pub mod protocol;
pub mod recording;
pub mod wmi_bus;

mod acpi_call;
mod ec_sys;
mod logged;

pub use acpi_call::{AcpiCallChannel, DEFAULT_ACPI_CALL, DEFAULT_WMBB_METHOD};
pub use ec_sys::{DebugfsEc, DEFAULT_EC_IO};
pub use error::TransportError;
pub use logged::LoggedChannel;
pub use recording::{MemoryEc, RecordingChannel};
pub use wmi_bus::{SysfsWmiBus, WmiBus, DEFAULT_WMI_BUS};

use std::sync::Arc;

/// Synchronous request/response channel to the firmware
///
/// A call sends a method id plus one 32-bit argument and receives a 32-bit
/// integer. The call may block while the firmware executes, so it must not
/// be issued from a context that cannot sleep. On error the firmware state
/// is to be treated as unchanged.
pub trait CommandChannel: Send + Sync {
    /// Evaluate `method` with `arg`, returning the integer reply
    fn invoke(&self, method: u8, arg: u32) -> Result<u32, TransportError>;
}

/// Byte-wide register access to the embedded controller
pub trait EmbeddedController: Send + Sync {
    /// Read one register
    fn read(&self, reg: u8) -> Result<u8, TransportError>;

    /// Write one register
    fn write(&self, reg: u8, value: u8) -> Result<(), TransportError>;
}

/// Type alias for a shared command channel
pub type BoxedChannel = Arc<dyn CommandChannel>;

/// Type alias for a shared embedded controller
pub type BoxedEc = Arc<dyn EmbeddedController>;
