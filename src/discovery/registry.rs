//! The device-class registry.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::{DeviceClass, DeviceClassInfo};
use crate::error::{HalError, Result};

/// Registry of known device-implementation families.
///
/// Explicitly constructed by application startup code and injected into the
/// [`System`](crate::discovery::System); there is no ambient global state.
/// A class is *implemented* once registered and *available* only if a probe
/// enumeration through it succeeds, so a missing vendor driver degrades to
/// a logged warning instead of failing the whole library.
#[derive(Default)]
pub struct DeviceRegistry {
    classes: Vec<Arc<dyn DeviceClass>>,
    available: Vec<String>,
}

impl DeviceRegistry {
    /// An empty registry. The core ships no built-in classes; vendor
    /// implementations register themselves here.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device class and probe it for hardware.
    ///
    /// Registering an API name twice is rejected; a stale class object must
    /// not shadow a newer one. Enumeration failures are logged and leave
    /// the class implemented but unavailable.
    pub fn register(&mut self, class: Arc<dyn DeviceClass>) -> Result<()> {
        let descriptor = class.descriptor();
        if self.classes.iter().any(|c| c.descriptor() == descriptor) {
            return Err(HalError::InvalidArgument(format!(
                "device class '{}' is already registered",
                descriptor.api_name
            )));
        }
        match class.enumerate() {
            Ok(found) => {
                info!(class = %descriptor, devices = found.len(), "device class available");
                self.available.push(descriptor.api_name.clone());
            }
            Err(e) => {
                warn!(class = %descriptor, error = %e, "device class registered but not available");
            }
        }
        self.classes.push(class);
        Ok(())
    }

    /// Remove a class from both the implemented and available sets.
    pub fn unregister(&mut self, api_name: &str) {
        self.classes
            .retain(|c| !c.descriptor().api_name.eq_ignore_ascii_case(api_name));
        self.available
            .retain(|name| !name.eq_ignore_ascii_case(api_name));
        debug!(api = api_name, "device class unregistered");
    }

    /// Descriptors of every registered class.
    pub fn implemented(&self) -> Vec<DeviceClassInfo> {
        self.classes.iter().map(|c| c.descriptor()).collect()
    }

    /// Descriptors of the classes whose probe enumeration succeeded.
    pub fn available(&self) -> Vec<DeviceClassInfo> {
        self.classes
            .iter()
            .map(|c| c.descriptor())
            .filter(|d| self.is_available(&d.api_name))
            .collect()
    }

    pub fn is_available(&self, api_name: &str) -> bool {
        self.available
            .iter()
            .any(|name| name.eq_ignore_ascii_case(api_name))
    }

    /// The registered class for an API name.
    pub fn class(&self, api_name: &str) -> Option<Arc<dyn DeviceClass>> {
        self.classes
            .iter()
            .find(|c| c.descriptor().api_name.eq_ignore_ascii_case(api_name))
            .cloned()
    }

    /// The class objects currently marked available.
    pub(crate) fn available_classes(&self) -> Vec<Arc<dyn DeviceClass>> {
        self.classes
            .iter()
            .filter(|c| self.is_available(&c.descriptor().api_name))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Drop every class and availability record.
    pub fn clear(&mut self) {
        self.classes.clear();
        self.available.clear();
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("implemented", &self.implemented())
            .field("available", &self.available)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::{MockClass, device_info};

    #[test]
    fn register_probes_enumeration() {
        let mut registry = DeviceRegistry::new();
        registry
            .register(MockClass::new(vec![device_info("cam-a")]))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.is_available("mock-sdk"));
        assert!(registry.is_available("MOCK-SDK"));
    }

    #[test]
    fn failing_enumeration_keeps_class_implemented_only() {
        let mut registry = DeviceRegistry::new();
        let class = MockClass::new(vec![]);
        class.set_enumeration_failure(true);
        registry.register(class).unwrap();
        assert_eq!(registry.implemented().len(), 1);
        assert!(!registry.is_available("mock-sdk"));
        assert!(registry.available().is_empty());
    }

    #[test]
    fn empty_enumeration_still_counts_as_available() {
        let mut registry = DeviceRegistry::new();
        registry.register(MockClass::new(vec![])).unwrap();
        assert!(registry.is_available("mock-sdk"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = DeviceRegistry::new();
        registry.register(MockClass::new(vec![])).unwrap();
        let result = registry.register(MockClass::new(vec![]));
        assert!(matches!(result, Err(HalError::InvalidArgument(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_removes_both_sets() {
        let mut registry = DeviceRegistry::new();
        registry.register(MockClass::new(vec![])).unwrap();
        registry.unregister("Mock-SDK");
        assert!(registry.is_empty());
        assert!(!registry.is_available("mock-sdk"));
        assert!(registry.class("mock-sdk").is_none());
    }

    #[test]
    fn clear_allows_reregistration() {
        let mut registry = DeviceRegistry::new();
        registry.register(MockClass::new(vec![])).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        registry.register(MockClass::new(vec![])).unwrap();
        assert_eq!(registry.len(), 1);
    }
}
