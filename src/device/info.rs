//! Device and device-class identity values.

use std::hash::{Hash, Hasher};

/// Identity of one device-implementation family: the vendor API a class
/// wraps and the concrete backend type it instantiates (enforced by the
/// `DeviceClass` trait at compile time).
#[derive(Debug, Clone)]
pub struct DeviceClassInfo {
    pub api_name: String,
    pub api_version: String,
}

impl DeviceClassInfo {
    pub fn new(api_name: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            api_version: api_version.into(),
        }
    }
}

impl PartialEq for DeviceClassInfo {
    fn eq(&self, other: &Self) -> bool {
        self.api_name.eq_ignore_ascii_case(&other.api_name)
    }
}

impl Eq for DeviceClassInfo {}

impl Hash for DeviceClassInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.api_name.to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Display for DeviceClassInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.api_name, self.api_version)
    }
}

/// Top-level identity of a discoverable or connected camera.
///
/// Equality and hashing cover only (vendor, model, serial, unique id),
/// case-insensitively: two descriptions of the same physical camera compare
/// equal even when their accessibility or open flags differ. The `System`
/// mutates the state flags in place as devices are opened, closed or lost.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub vendor: String,
    pub model: String,
    pub serial: String,
    /// Globally unique identifier, the key used to open the device.
    pub unique_id: String,
    /// Optional user-assigned name.
    pub user_name: Option<String>,
    /// The device class that enumerated this camera.
    pub class: DeviceClassInfo,
    /// Whether the device can currently be opened.
    pub accessible: bool,
    /// Whether the device is currently open.
    pub open: bool,
}

impl DeviceInfo {
    pub fn new(
        vendor: impl Into<String>,
        model: impl Into<String>,
        serial: impl Into<String>,
        unique_id: impl Into<String>,
        class: DeviceClassInfo,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            model: model.into(),
            serial: serial.into(),
            unique_id: unique_id.into(),
            user_name: None,
            class,
            accessible: true,
            open: false,
        }
    }

    /// Whether `id` names this device, ignoring case.
    pub fn matches_id(&self, id: &str) -> bool {
        self.unique_id.eq_ignore_ascii_case(id)
    }

    /// Name to show an operator: the user-assigned name when present,
    /// otherwise model and serial.
    pub fn display_name(&self) -> String {
        match &self.user_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} ({})", self.model, self.serial),
        }
    }
}

impl PartialEq for DeviceInfo {
    fn eq(&self, other: &Self) -> bool {
        self.vendor.eq_ignore_ascii_case(&other.vendor)
            && self.model.eq_ignore_ascii_case(&other.model)
            && self.serial.eq_ignore_ascii_case(&other.serial)
            && self.unique_id.eq_ignore_ascii_case(&other.unique_id)
    }
}

impl Eq for DeviceInfo {}

impl Hash for DeviceInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vendor.to_ascii_lowercase().hash(state);
        self.model.to_ascii_lowercase().hash(state);
        self.serial.to_ascii_lowercase().hash(state);
        self.unique_id.to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} [{}]", self.vendor, self.model, self.unique_id)
    }
}
