//! The vendor contracts.
//!
//! Each concrete device implementation wraps exactly one vendor SDK behind
//! [`DeviceBackend`]; its family is described by a [`DeviceClass`] that can
//! enumerate hardware and open backends. The core never sees vendor types,
//! only these traits plus the identity and buffer values they produce.

use std::sync::Arc;

use crate::device::info::{DeviceClassInfo, DeviceInfo};
use crate::device::stream::DataStream;
use crate::error::Result;
use crate::params::ParameterPort;

/// Capability set every device variant implements.
///
/// Vendor calls that fail surface as `DeviceCommunication` errors; the
/// shared device layer decides per call site whether to propagate or to
/// log and continue.
pub trait DeviceBackend: ParameterPort + Send {
    /// Expected byte size of one filled buffer under current settings.
    fn payload_size(&self) -> Result<usize>;

    /// Size of the driver-side buffer pool.
    fn buffer_capacity(&self) -> Result<u32>;

    fn set_buffer_capacity(&mut self, capacity: u32) -> Result<()>;

    fn get_integer(&mut self, name: &str) -> Result<i64>;
    fn set_integer(&mut self, name: &str, value: i64) -> Result<()>;

    fn get_float(&mut self, name: &str) -> Result<f64>;
    fn set_float(&mut self, name: &str, value: f64) -> Result<()>;

    fn get_string(&mut self, name: &str) -> Result<String>;
    fn set_string(&mut self, name: &str, value: &str) -> Result<()>;

    /// Read/write the symbolic entry of an enumeration parameter.
    fn get_enumeration(&mut self, name: &str) -> Result<String>;
    fn set_enumeration(&mut self, name: &str, entry: &str) -> Result<()>;

    fn get_boolean(&mut self, name: &str) -> Result<bool>;
    fn set_boolean(&mut self, name: &str, value: bool) -> Result<()>;

    fn execute_command(&mut self, name: &str) -> Result<()>;

    /// Begin delivering filled buffers into `stream` from the vendor's
    /// acquisition thread.
    fn start_acquisition(&mut self, stream: Arc<DataStream>) -> Result<()>;

    fn stop_acquisition(&mut self) -> Result<()>;

    /// Release the vendor session.
    fn close(&mut self) -> Result<()>;
}

/// One device-implementation family.
///
/// Enumeration is a class-level operation: it reports which cameras of this
/// family are present without opening them.
pub trait DeviceClass: Send + Sync {
    fn descriptor(&self) -> DeviceClassInfo;

    /// Discover cameras of this family on the current machine.
    fn enumerate(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a vendor session for one enumerated camera.
    fn open(&self, info: &DeviceInfo) -> Result<Box<dyn DeviceBackend>>;
}
