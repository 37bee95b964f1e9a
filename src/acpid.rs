//! WMI notifications from acpid
//!
//! acpid forwards every ACPI event to its socket as one line,
//! `<class> <bus-id> <type> <data>`, the last two as 8-digit hex. Events
//! from the WMI bus (`PNP0C14`) carry the notification value in `type`.

use std::io::{self, BufRead, BufReader};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

/// ACPI HID of the WMI bus
pub const WMI_BUS_HID: &str = "PNP0C14";

/// Notification value of an acpid event line, if it comes from WMI
pub fn parse_line(line: &str) -> Option<u32> {
    let mut fields = line.split_whitespace();
    let class = fields.next()?;
    let bus_id = fields.next()?;
    let kind = fields.next()?;

    if !class.contains(WMI_BUS_HID) && !bus_id.contains(WMI_BUS_HID) {
        return None;
    }

    let kind = kind.strip_prefix("0x").unwrap_or(kind);
    match u32::from_str_radix(kind, 16) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Malformed acpid event \"{line}\": {e}");
            None
        }
    }
}

/// Thread reading the acpid socket
pub struct AcpidListener {
    stream: UnixStream,
    handle: Option<JoinHandle<()>>,
}

impl AcpidListener {
    /// Connect and hand every WMI notification value to `handler`
    pub fn connect<F>(socket: &Path, handler: F) -> io::Result<Self>
    where
        F: Fn(u32) + Send + 'static,
    {
        let stream = UnixStream::connect(socket)?;
        let reader = BufReader::new(stream.try_clone()?);

        let handle = thread::Builder::new()
            .name("tuxedo-acpid".into())
            .spawn(move || listen(reader, handler))?;

        info!("Listening for WMI events on {}", socket.display());
        Ok(Self {
            stream,
            handle: Some(handle),
        })
    }

    /// Close the socket and join the reader
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.stream.shutdown(Shutdown::Both) {
                debug!("acpid socket shutdown: {e}");
            }
            if handle.join().is_err() {
                error!("acpid listener panicked");
            }
        }
    }
}

impl Drop for AcpidListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn listen<R: BufRead, F: Fn(u32)>(reader: R, handler: F) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                debug!("acpid: {}", line);
                if let Some(value) = parse_line(&line) {
                    handler(value);
                }
            }
            Err(e) => {
                debug!("acpid read ended: {e}");
                break;
            }
        }
    }
    info!("acpid listener exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixListener;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_parse_wmi_line() {
        assert_eq!(parse_line("wmi PNP0C14:00 000000d0 00000000"), Some(0xD0));
        assert_eq!(parse_line("PNP0C14:00 PNP0C14:00 000000f4 00000000"), Some(0xF4));
    }

    #[test]
    fn test_other_sources_ignored() {
        assert_eq!(parse_line("button/power PBTN 00000080 00000000"), None);
        assert_eq!(parse_line("ac_adapter ACPI0003:00 00000080 00000001"), None);
        assert_eq!(parse_line("wmi PNP0C14:00"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("wmi PNP0C14:00 zz 0"), None);
    }

    #[test]
    fn test_listener_forwards_and_stops() {
        let path = std::env::temp_dir().join(format!("tuxedo-acpid-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let server = UnixListener::bind(&path).unwrap();

        let (tx, rx) = mpsc::channel();
        let listener = AcpidListener::connect(&path, move |value| {
            let _ = tx.send(value);
        })
        .unwrap();

        let (mut peer, _) = server.accept().unwrap();
        peer.write_all(b"button/lid LID close\nwmi PNP0C14:00 000000d0 00000000\n")
            .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0xD0);

        listener.stop();
        std::fs::remove_file(&path).unwrap();
    }
}
