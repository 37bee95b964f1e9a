//! WMI GUID presence checks

use std::path::PathBuf;

/// Default sysfs directory listing WMI devices
pub const DEFAULT_WMI_BUS: &str = "/sys/bus/wmi/devices";

/// Answers whether a WMI GUID is provided by the platform firmware
pub trait WmiBus: Send + Sync {
    fn has_guid(&self, guid: &str) -> bool;
}

/// GUID lookup through `/sys/bus/wmi/devices`
///
/// Entries are named `<GUID>` or `<GUID>-<n>`, case-insensitive.
pub struct SysfsWmiBus {
    dir: PathBuf,
}

impl SysfsWmiBus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl WmiBus for SysfsWmiBus {
    fn has_guid(&self, guid: &str) -> bool {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return false;
        };
        let guid = guid.to_ascii_uppercase();
        entries.flatten().any(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .to_ascii_uppercase()
                .starts_with(&guid)
        })
    }
}

/// Fixed GUID set, for dry runs and tests
impl WmiBus for Vec<String> {
    fn has_guid(&self, guid: &str) -> bool {
        self.iter().any(|g| g.eq_ignore_ascii_case(guid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{EVENT_GUID, GET_GUID};

    #[test]
    fn test_fixed_set_is_case_insensitive() {
        let bus = vec![EVENT_GUID.to_ascii_lowercase()];
        assert!(bus.has_guid(EVENT_GUID));
        assert!(!bus.has_guid(GET_GUID));
    }

    #[test]
    fn test_missing_dir_has_nothing() {
        let bus = SysfsWmiBus::new("/nonexistent/wmi/bus");
        assert!(!bus.has_guid(EVENT_GUID));
    }
}
