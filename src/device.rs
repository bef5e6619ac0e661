//! Device contract and shared behavior
//!
//! Vendor implementations supply a [`DeviceBackend`] (one per camera) and a
//! [`DeviceClass`] (one per SDK family); [`Device`] layers the behavior every
//! variant shares on top: the data-stream registry, the lazily imported
//! parameter collection with typed dispatch and invalidation notifications,
//! acquisition control, single-shot fetch, and close semantics.

mod backend;
pub mod events;
mod info;
mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use backend::{DeviceBackend, DeviceClass};
pub use events::{DeviceEvent, EventHub, SubscriptionId};
pub use info::{DeviceClassInfo, DeviceInfo};
pub use stream::DataStream;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::{debug, info as log_info, instrument, warn};

use crate::buffer::ImageBuffer;
use crate::device::events::lock;
use crate::error::{HalError, Result};
use crate::params::{Parameter, ParameterCollection, ParameterKind, ParameterValue, Visibility};

/// Stream id used by acquisition helpers when the caller names none.
const DEFAULT_STREAM: &str = "stream-0";

/// One open camera.
///
/// Wraps the vendor backend and is shared as `Arc<Device>`; all methods take
/// `&self` and synchronize internally (notification handlers may run on the
/// vendor's acquisition thread). Lock order is parameters before backend.
pub struct Device {
    info: Mutex<DeviceInfo>,
    backend: Mutex<Box<dyn DeviceBackend>>,
    parameters: Mutex<Option<ParameterCollection>>,
    streams: Mutex<HashMap<String, Arc<DataStream>>>,
    events: EventHub,
    next_stream_id: AtomicU64,
    acquiring: AtomicBool,
}

impl Device {
    /// Wrap a freshly opened vendor session.
    pub fn new(backend: Box<dyn DeviceBackend>, mut info: DeviceInfo) -> Arc<Self> {
        info.open = true;
        info.accessible = false;
        log_info!(device = %info, "device opened");
        Arc::new(Self {
            info: Mutex::new(info),
            backend: Mutex::new(backend),
            parameters: Mutex::new(None),
            streams: Mutex::new(HashMap::new()),
            events: EventHub::new(),
            next_stream_id: AtomicU64::new(1),
            acquiring: AtomicBool::new(false),
        })
    }

    /// Snapshot of the device's identity and state flags.
    pub fn info(&self) -> DeviceInfo {
        lock(&self.info).clone()
    }

    pub fn unique_id(&self) -> String {
        lock(&self.info).unique_id.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.info).open
    }

    pub fn is_acquiring(&self) -> bool {
        self.acquiring.load(Ordering::Acquire)
    }

    /// The device's notification hub.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn payload_size(&self) -> Result<usize> {
        lock(&self.backend).payload_size()
    }

    pub fn buffer_capacity(&self) -> Result<u32> {
        lock(&self.backend).buffer_capacity()
    }

    pub fn set_buffer_capacity(&self, capacity: u32) -> Result<()> {
        lock(&self.backend).set_buffer_capacity(capacity)
    }

    fn ensure_parameters(&self) -> Result<()> {
        let mut parameters = lock(&self.parameters);
        if parameters.is_none() {
            let name = lock(&self.info).display_name();
            let mut backend = lock(&self.backend);
            *parameters = Some(ParameterCollection::import(name, backend.as_mut())?);
        }
        Ok(())
    }

    /// Re-read every parameter's value and access mode from the device.
    #[instrument(skip(self), fields(device = %self.unique_id()))]
    pub fn update_parameters(&self) -> Result<usize> {
        self.ensure_parameters()?;
        let mut parameters = lock(&self.parameters);
        let mut backend = lock(&self.backend);
        match parameters.as_mut() {
            Some(collection) => Ok(collection.update(backend.as_mut())),
            None => Ok(0),
        }
    }

    /// Descriptor of one parameter; `KeyNotFound` for unknown names.
    pub fn parameter(&self, name: &str) -> Result<Parameter> {
        self.ensure_parameters()?;
        let parameters = lock(&self.parameters);
        match parameters.as_ref() {
            Some(collection) => collection.get(name).cloned(),
            None => Err(HalError::KeyNotFound(name.to_string())),
        }
    }

    /// Parameters at or below a visibility tier, in import order.
    pub fn parameter_list(&self, visibility: Visibility) -> Result<Vec<Parameter>> {
        self.ensure_parameters()?;
        let parameters = lock(&self.parameters);
        Ok(parameters
            .as_ref()
            .map(|c| c.to_list(visibility).into_iter().cloned().collect())
            .unwrap_or_default())
    }

    /// Sorted categories of the visible parameters.
    pub fn categories(&self, visibility: Visibility) -> Result<Vec<String>> {
        self.ensure_parameters()?;
        let parameters = lock(&self.parameters);
        Ok(parameters
            .as_ref()
            .map(|c| c.categories(visibility))
            .unwrap_or_default())
    }

    /// Name/value pairs, selectors ordered before what they select.
    pub fn property_list(&self, visibility: Visibility) -> Result<Vec<(String, String)>> {
        self.ensure_parameters()?;
        let parameters = lock(&self.parameters);
        Ok(parameters
            .as_ref()
            .map(|c| c.property_list(visibility))
            .unwrap_or_default())
    }

    /// Read one parameter through the accessor matching its declared kind.
    ///
    /// Returns `Ok(None)` for unknown names, unreadable parameters and
    /// command kinds; read failures on a known, readable parameter
    /// propagate.
    pub fn parameter_value(&self, name: &str) -> Result<Option<ParameterValue>> {
        self.ensure_parameters()?;
        let parameters = lock(&self.parameters);
        let Some(descriptor) = parameters.as_ref().and_then(|c| c.get_opt(name)) else {
            debug!(parameter = name, "value read of unimplemented parameter ignored");
            return Ok(None);
        };
        if !descriptor.access.readable || descriptor.kind == ParameterKind::Command {
            return Ok(None);
        }
        let kind = descriptor.kind;
        drop(parameters);
        let mut backend = lock(&self.backend);
        let value = match kind {
            ParameterKind::Integer => ParameterValue::Integer(backend.get_integer(name)?),
            ParameterKind::Float => ParameterValue::Float(backend.get_float(name)?),
            ParameterKind::String => ParameterValue::String(backend.get_string(name)?),
            ParameterKind::Enumeration => {
                ParameterValue::Enumeration(backend.get_enumeration(name)?)
            }
            ParameterKind::Boolean => ParameterValue::Boolean(backend.get_boolean(name)?),
            ParameterKind::Command => unreachable!("command kinds return above"),
        };
        Ok(Some(value))
    }

    /// Write one parameter through the accessor matching its declared kind.
    ///
    /// A no-op returning `false` for unknown, unwritable and command-kind
    /// parameters; a kind mismatch between descriptor and value is an
    /// `InvalidArgument` error. On success the cached entry is refreshed
    /// and a `ParametersInvalidated` notification is published (exactly
    /// once, before this call returns) because the write may have changed
    /// other parameters' ranges or visibility.
    pub fn set_parameter_value(&self, name: &str, value: ParameterValue) -> Result<bool> {
        self.ensure_parameters()?;
        let mut parameters = lock(&self.parameters);
        let Some(collection) = parameters.as_mut() else {
            return Ok(false);
        };
        let Some(descriptor) = collection.get_opt(name) else {
            debug!(parameter = name, "write of unimplemented parameter ignored");
            return Ok(false);
        };
        if descriptor.kind == ParameterKind::Command || !descriptor.access.writable {
            debug!(parameter = name, "write of non-writable parameter ignored");
            return Ok(false);
        }
        if descriptor.kind != value.kind() {
            return Err(HalError::InvalidArgument(format!(
                "parameter '{name}' is {:?}, got a {:?} value",
                descriptor.kind,
                value.kind()
            )));
        }
        {
            let mut backend = lock(&self.backend);
            match &value {
                ParameterValue::Integer(v) => backend.set_integer(name, *v)?,
                ParameterValue::Float(v) => backend.set_float(name, *v)?,
                ParameterValue::String(v) => backend.set_string(name, v)?,
                ParameterValue::Enumeration(v) => backend.set_enumeration(name, v)?,
                ParameterValue::Boolean(v) => backend.set_boolean(name, *v)?,
                ParameterValue::Command => unreachable!("command kinds return above"),
            }
            match backend.read_parameter(name) {
                Ok((display, access)) => collection.set_cached(name, display, access),
                Err(e) => warn!(parameter = name, error = %e, "cache refresh after write failed"),
            }
        }
        drop(parameters);
        self.events.publish(&DeviceEvent::ParametersInvalidated {
            name: name.to_string(),
        });
        Ok(true)
    }

    /// Execute a command parameter.
    ///
    /// A no-op returning `false` for unknown names and non-command kinds;
    /// publishes `ParametersInvalidated` on success like a write does.
    pub fn execute_command(&self, name: &str) -> Result<bool> {
        self.ensure_parameters()?;
        let parameters = lock(&self.parameters);
        let is_command = parameters
            .as_ref()
            .and_then(|c| c.get_opt(name))
            .is_some_and(|p| p.kind == ParameterKind::Command);
        drop(parameters);
        if !is_command {
            debug!(parameter = name, "execute of non-command parameter ignored");
            return Ok(false);
        }
        lock(&self.backend).execute_command(name)?;
        self.events.publish(&DeviceEvent::ParametersInvalidated {
            name: name.to_string(),
        });
        Ok(true)
    }

    /// Return the stream registered under `id`, or create one (with a
    /// generated unique id when none is given).
    pub fn open_data_stream(&self, id: Option<&str>) -> Result<Arc<DataStream>> {
        if !self.is_open() {
            return Err(HalError::InvalidState(
                "cannot open a data stream on a closed device".into(),
            ));
        }
        let mut streams = lock(&self.streams);
        if let Some(id) = id
            && let Some(stream) = streams.get(id)
        {
            return Ok(Arc::clone(stream));
        }
        let id = id.map(str::to_owned).unwrap_or_else(|| {
            format!("stream-{}", self.next_stream_id.fetch_add(1, Ordering::Relaxed))
        });
        let stream = Arc::new(DataStream::new(id.clone(), self.events.clone()));
        streams.insert(id, Arc::clone(&stream));
        Ok(stream)
    }

    /// Begin continuous acquisition into the default data stream.
    pub fn start_acquisition(&self) -> Result<()> {
        if self.acquiring.swap(true, Ordering::AcqRel) {
            return Err(HalError::InvalidState("acquisition already running".into()));
        }
        let stream = match self.open_data_stream(Some(DEFAULT_STREAM)) {
            Ok(stream) => stream,
            Err(e) => {
                self.acquiring.store(false, Ordering::Release);
                return Err(e);
            }
        };
        if let Err(e) = lock(&self.backend).start_acquisition(stream) {
            self.acquiring.store(false, Ordering::Release);
            return Err(e);
        }
        self.events.publish(&DeviceEvent::AcquisitionStarted);
        Ok(())
    }

    /// Stop continuous acquisition. A no-op when none is running.
    pub fn stop_acquisition(&self) -> Result<()> {
        if !self.acquiring.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        lock(&self.backend).stop_acquisition()?;
        self.events.publish(&DeviceEvent::AcquisitionStopped);
        Ok(())
    }

    /// Capture a single image, blocking up to `timeout`.
    ///
    /// Subscribes a one-shot listener, starts acquisition, waits on the
    /// new-buffer notification, stops acquisition and unsubscribes. Returns
    /// `None` when no buffer arrived in time. Continuous streaming should
    /// use [`start_acquisition`](Self::start_acquisition) with a persistent
    /// subscriber instead.
    #[instrument(skip(self), fields(device = %self.unique_id()))]
    pub fn fetch_image(&self, timeout: Duration) -> Result<Option<Arc<ImageBuffer>>> {
        let slot: Arc<(Mutex<Option<Arc<ImageBuffer>>>, Condvar)> =
            Arc::new((Mutex::new(None), Condvar::new()));
        let listener_slot = Arc::clone(&slot);
        let subscription = self.events.subscribe(move |event| {
            if let DeviceEvent::NewBuffer(buffer) = event {
                let (cell, arrived) = &*listener_slot;
                let mut cell = lock(cell);
                if cell.is_none() {
                    *cell = Some(Arc::clone(buffer));
                    arrived.notify_all();
                }
            }
        });

        if let Err(e) = self.start_acquisition() {
            self.events.unsubscribe(subscription);
            return Err(e);
        }

        let (cell, arrived) = &*slot;
        let guard = lock(cell);
        let (mut guard, wait) = arrived
            .wait_timeout_while(guard, timeout, |buffer| buffer.is_none())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let buffer = guard.take();
        drop(guard);
        if wait.timed_out() && buffer.is_none() {
            debug!(?timeout, "fetch timed out without a buffer");
        }

        let stopped = self.stop_acquisition();
        self.events.unsubscribe(subscription);
        stopped?;
        Ok(buffer)
    }

    /// Close every stream, release the vendor session, mark the device
    /// closed and accessible again, and publish `Closed`. Idempotent.
    #[instrument(skip(self), fields(device = %self.unique_id()))]
    pub fn close(&self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        if self.is_acquiring()
            && let Err(e) = self.stop_acquisition()
        {
            warn!(error = %e, "stopping acquisition during close failed");
        }
        {
            let mut streams = lock(&self.streams);
            for stream in streams.values() {
                stream.close();
            }
            streams.clear();
        }
        if let Err(e) = lock(&self.backend).close() {
            warn!(error = %e, "vendor session close failed");
        }
        *lock(&self.parameters) = None;
        let unique_id = {
            let mut info = lock(&self.info);
            info.open = false;
            info.accessible = true;
            info.unique_id.clone()
        };
        log_info!(device = %unique_id, "device closed");
        self.events.publish(&DeviceEvent::Closed { unique_id });
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.is_open() {
            let _ = self.close();
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.info();
        f.debug_struct("Device")
            .field("unique_id", &info.unique_id)
            .field("open", &info.open)
            .field("acquiring", &self.is_acquiring())
            .finish()
    }
}
