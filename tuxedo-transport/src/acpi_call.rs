//! WMBB evaluation through the `acpi_call` kernel module

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::CommandChannel;

/// Default location of the acpi_call interface
pub const DEFAULT_ACPI_CALL: &str = "/proc/acpi/call";

/// Default ACPI path of the WMBB method
pub const DEFAULT_WMBB_METHOD: &str = "\\_SB.WMI.WMBB";

/// Command channel backed by `/proc/acpi/call`
///
/// The interface holds a single global result slot, so write and read-back
/// are serialized under one lock.
pub struct AcpiCallChannel {
    path: PathBuf,
    wmbb: String,
    lock: Mutex<()>,
}

impl AcpiCallChannel {
    /// Create a channel, checking that the call node exists
    pub fn open(path: impl AsRef<Path>, wmbb: &str) -> Result<Self, TransportError> {
        let path = path.as_ref();
        OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| TransportError::from_open(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            wmbb: wmbb.to_string(),
            lock: Mutex::new(()),
        })
    }

    /// Build the request line: instance 0, method id, 4-byte LE argument buffer
    fn request(&self, method: u8, arg: u32) -> String {
        let bytes = arg.to_le_bytes();
        format!(
            "{} 0x0 0x{:x} b{:02x}{:02x}{:02x}{:02x}",
            self.wmbb, method, bytes[0], bytes[1], bytes[2], bytes[3]
        )
    }
}

impl CommandChannel for AcpiCallChannel {
    fn invoke(&self, method: u8, arg: u32) -> Result<u32, TransportError> {
        let _guard = self.lock.lock();

        let mut node = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| TransportError::from_open(&self.path, e))?;
        node.write_all(self.request(method, arg).as_bytes())?;

        let mut reply = String::new();
        let mut node = OpenOptions::new()
            .read(true)
            .open(&self.path)
            .map_err(|e| TransportError::from_open(&self.path, e))?;
        node.read_to_string(&mut reply)?;

        parse_reply(method, reply.trim_end_matches('\0').trim())
    }
}

/// Decode an acpi_call reply
///
/// Integers come back as `0x…`, buffers as `{0x.., 0x..}`, failures as
/// `Error: …`. Any other object type decodes as 0.
pub(crate) fn parse_reply(method: u8, reply: &str) -> Result<u32, TransportError> {
    if let Some(reason) = reply.strip_prefix("Error:") {
        return Err(TransportError::CallFailed {
            method,
            reason: reason.trim().to_string(),
        });
    }

    if let Some(hex) = reply.strip_prefix("0x") {
        let value = u64::from_str_radix(hex, 16)
            .map_err(|e| TransportError::MalformedReply(format!("{reply}: {e}")))?;
        return Ok(value as u32);
    }

    if let Some(body) = reply.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        let mut bytes = [0u8; 4];
        for (i, item) in body.split(',').take(4).enumerate() {
            let item = item.trim();
            let hex = item.strip_prefix("0x").unwrap_or(item);
            bytes[i] = u8::from_str_radix(hex, 16)
                .map_err(|e| TransportError::MalformedReply(format!("{reply}: {e}")))?;
        }
        return Ok(u32::from_le_bytes(bytes));
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_line() {
        let channel = AcpiCallChannel {
            path: PathBuf::new(),
            wmbb: DEFAULT_WMBB_METHOD.to_string(),
            lock: Mutex::new(()),
        };
        assert_eq!(
            channel.request(0x67, 0xE007F001),
            "\\_SB.WMI.WMBB 0x0 0x67 b01f007e0"
        );
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_reply(0x0A, "0x1").unwrap(), 1);
        assert_eq!(parse_reply(0x01, "0xf4").unwrap(), 0xF4);
    }

    #[test]
    fn test_parse_buffer() {
        assert_eq!(parse_reply(0x01, "{0x83, 0x00, 0x00, 0x00}").unwrap(), 0x83);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_reply(0x67, "Error: AE_NOT_FOUND").unwrap_err();
        assert!(matches!(err, TransportError::CallFailed { method: 0x67, .. }));
    }

    #[test]
    fn test_non_integer_is_zero() {
        assert_eq!(parse_reply(0x46, "not called").unwrap(), 0);
    }
}
