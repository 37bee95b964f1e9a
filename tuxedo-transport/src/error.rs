//! Transport error types

use std::path::Path;

use thiserror::Error;

/// Errors that can occur while talking to the firmware or the embedded controller
#[derive(Error, Debug)]
pub enum TransportError {
    /// The backing interface (acpi_call, ec_sys) is not available
    #[error("Interface not available: {0}")]
    Unavailable(String),

    /// ACPI method evaluation failed inside the firmware
    #[error("ACPI call 0x{method:02X} failed: {reason}")]
    CallFailed { method: u8, reason: String },

    /// The firmware reply could not be decoded
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// I/O error on the backing device node
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Injected or otherwise synthetic failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    /// Map an I/O error from opening a device node, keeping "missing module" readable
    pub fn from_open(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => {
                TransportError::Unavailable(format!(
                    "{} not found (module not loaded?)",
                    path.display()
                ))
            }
            std::io::ErrorKind::PermissionDenied => {
                TransportError::Unavailable(format!("{}: permission denied", path.display()))
            }
            _ => TransportError::Io(e),
        }
    }
}
