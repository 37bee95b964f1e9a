//! Hardware identification
//!
//! Machines are recognised from their DMI `sys_vendor` and `product_name`.
//! A field matches when the table value is a substring of the machine's
//! value, and the first matching row wins.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Default location of the DMI identity files
pub const DEFAULT_DMI_DIR: &str = "/sys/class/dmi/id";

/// Backlight command dialect spoken by a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    FullColor,
    EightColor,
}

impl DialectKind {
    pub fn name(self) -> &'static str {
        match self {
            DialectKind::FullColor => "full-color",
            DialectKind::EightColor => "8-color",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the identification table
#[derive(Debug, Clone, Copy)]
pub struct SupportedModel {
    /// Marketing name, logged on match
    pub ident: &'static str,
    pub sys_vendor: &'static str,
    pub product_name: &'static str,
    pub dialect: DialectKind,
}

impl SupportedModel {
    pub fn matches(&self, identity: &DmiIdentity) -> bool {
        identity.sys_vendor.contains(self.sys_vendor)
            && identity.product_name.contains(self.product_name)
    }
}

const fn model(
    ident: &'static str,
    product_name: &'static str,
    dialect: DialectKind,
) -> SupportedModel {
    SupportedModel {
        ident,
        sys_vendor: "Notebook",
        product_name,
        dialect,
    }
}

/// Known machines; "-A" suffixed rows must come before their prefixes
pub static SUPPORTED_MODELS: &[SupportedModel] = &[
    model("Clevo P370SM-A", "P370SM-A", DialectKind::FullColor),
    model("Clevo P17xSM-A", "P17SM-A", DialectKind::FullColor),
    model("Clevo P15xSM-A/P15xSM1-A", "P15SM-A/SM1-A", DialectKind::FullColor),
    model("Clevo P17xSM", "P17SM", DialectKind::EightColor),
    model("Clevo P15xSM", "P15SM", DialectKind::EightColor),
    model("Clevo P750ZM", "P750ZM", DialectKind::FullColor),
    model("Hyperbook N8xxEP6", "N8xxEP6", DialectKind::FullColor),
    model("Hyperbook N8xEJEK", "N8xEJEK", DialectKind::FullColor),
];

/// DMI fields used for identification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DmiIdentity {
    pub sys_vendor: String,
    pub product_name: String,
}

impl DmiIdentity {
    pub fn new(sys_vendor: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            sys_vendor: sys_vendor.into(),
            product_name: product_name.into(),
        }
    }

    /// Read `sys_vendor` and `product_name` from a DMI directory
    pub fn read_from(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| -> io::Result<String> {
            Ok(fs::read_to_string(dir.join(name))?.trim().to_string())
        };
        Ok(Self {
            sys_vendor: read("sys_vendor")?,
            product_name: read("product_name")?,
        })
    }

    /// First table row matching this machine
    pub fn identify(&self) -> Option<&'static SupportedModel> {
        SUPPORTED_MODELS.iter().find(|m| m.matches(self))
    }
}

impl fmt::Display for DmiIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sys_vendor, self.product_name)
    }
}
