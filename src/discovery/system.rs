//! The system entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, instrument, warn};

use crate::device::events::lock;
use crate::device::{Device, DeviceEvent, DeviceInfo};
use crate::discovery::DeviceRegistry;
use crate::error::{HalError, Result};

static SYSTEM_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Claim on the one-per-process system slot, released on drop.
struct SingletonGuard;

impl SingletonGuard {
    fn claim() -> Result<Self> {
        if SYSTEM_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(HalError::InvalidState(
                "a System instance is already alive in this process".into(),
            ));
        }
        Ok(Self)
    }
}

impl Drop for SingletonGuard {
    fn drop(&mut self) {
        SYSTEM_ACTIVE.store(false, Ordering::Release);
    }
}

/// The single application entry point to discovery and device lifetime.
///
/// Owns the merged list of discoverable devices and the set of connected
/// device instances. At most one `System` exists per process; dropping it
/// closes every connected device, clears both lists and releases the slot.
///
/// The connected list is mutated both by [`open_device`](Self::open_device)
/// and by each device's `Closed` notification handler, which may run on any
/// thread, so both lists live behind mutexes.
pub struct System {
    registry: DeviceRegistry,
    available: Arc<Mutex<Vec<DeviceInfo>>>,
    connected: Arc<Mutex<Vec<(String, Arc<Device>)>>>,
    _guard: SingletonGuard,
}

impl System {
    /// Claim the process slot and take ownership of the injected registry.
    pub fn new(registry: DeviceRegistry) -> Result<Self> {
        let guard = SingletonGuard::claim()?;
        info!(
            classes = registry.len(),
            "system created"
        );
        Ok(Self {
            registry,
            available: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(Mutex::new(Vec::new())),
            _guard: guard,
        })
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Register or remove classes after construction.
    pub fn registry_mut(&mut self) -> &mut DeviceRegistry {
        &mut self.registry
    }

    /// Snapshot of the merged device list.
    pub fn device_list(&self) -> Vec<DeviceInfo> {
        lock(&self.available).clone()
    }

    /// The currently connected device instances.
    pub fn connected_devices(&self) -> Vec<Arc<Device>> {
        lock(&self.connected)
            .iter()
            .map(|(_, device)| Arc::clone(device))
            .collect()
    }

    /// Re-enumerate every available class and reconcile the device list.
    ///
    /// Duplicate reports of the same physical camera are dropped, entries
    /// for connected devices are marked open, and connected devices that no
    /// longer enumerate are retained. Per-class enumeration failures are
    /// logged and skipped. Returns whether the membership of the list
    /// changed.
    #[instrument(skip(self))]
    pub fn update_device_list(&self) -> Result<bool> {
        let mut fresh: Vec<DeviceInfo> = Vec::new();
        for class in self.registry.available_classes() {
            let descriptor = class.descriptor();
            match class.enumerate() {
                Ok(found) => {
                    for info in found {
                        if fresh.contains(&info) {
                            debug!(device = %info, "duplicate enumeration entry dropped");
                        } else {
                            fresh.push(info);
                        }
                    }
                }
                Err(e) => {
                    warn!(class = %descriptor, error = %e, "enumeration failed");
                }
            }
        }

        {
            let connected = lock(&self.connected);
            for (_, device) in connected.iter() {
                let info = device.info();
                match fresh.iter_mut().find(|candidate| **candidate == info) {
                    Some(entry) => {
                        entry.open = true;
                        entry.accessible = false;
                    }
                    // Connected but no longer discoverable: keep it listed.
                    None => fresh.push(info),
                }
            }
        }

        let mut available = lock(&self.available);
        let changed =
            available.len() != fresh.len() || fresh.iter().any(|d| !available.contains(d));
        debug!(devices = fresh.len(), changed, "device list reconciled");
        *available = fresh;
        Ok(changed)
    }

    /// Open the device with the given unique id.
    ///
    /// The concrete backend comes from the class that enumerated the
    /// device; the new instance's `Closed` notification removes it from
    /// the connected list again, whichever thread it fires on.
    #[instrument(skip(self))]
    pub fn open_device(&self, unique_id: &str) -> Result<Arc<Device>> {
        let info = lock(&self.available)
            .iter()
            .find(|d| d.matches_id(unique_id))
            .cloned()
            .ok_or_else(|| {
                HalError::InvalidArgument(format!("unknown device id '{unique_id}'"))
            })?;
        if lock(&self.connected)
            .iter()
            .any(|(id, _)| id.eq_ignore_ascii_case(unique_id))
        {
            return Err(HalError::InvalidState(format!(
                "device '{unique_id}' is already connected"
            )));
        }
        let class = self.registry.class(&info.class.api_name).ok_or_else(|| {
            HalError::InvalidState(format!(
                "device class '{}' is no longer registered",
                info.class.api_name
            ))
        })?;

        let backend = class.open(&info)?;
        let device = Device::new(backend, info.clone());

        let connected_handle = Arc::downgrade(&self.connected);
        let available_handle = Arc::downgrade(&self.available);
        device.events().subscribe(move |event| {
            if let DeviceEvent::Closed { unique_id } = event {
                if let Some(list) = connected_handle.upgrade() {
                    lock(&list).retain(|(id, _)| !id.eq_ignore_ascii_case(unique_id));
                }
                if let Some(list) = available_handle.upgrade()
                    && let Some(entry) = lock(&list)
                        .iter_mut()
                        .find(|d| d.matches_id(unique_id))
                {
                    entry.open = false;
                    entry.accessible = true;
                }
            }
        });

        lock(&self.connected).push((info.unique_id.clone(), Arc::clone(&device)));
        if let Some(entry) = lock(&self.available)
            .iter_mut()
            .find(|d| d.matches_id(unique_id))
        {
            entry.open = true;
            entry.accessible = false;
        }
        info!(device = %info, "device connected");
        Ok(device)
    }
}

impl Drop for System {
    fn drop(&mut self) {
        let devices = self.connected_devices();
        for device in devices {
            if let Err(e) = device.close() {
                warn!(device = %device.unique_id(), error = %e, "close during system teardown failed");
            }
        }
        lock(&self.connected).clear();
        lock(&self.available).clear();
        info!("system disposed");
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("available", &lock(&self.available).len())
            .field("connected", &lock(&self.connected).len())
            .finish()
    }
}
