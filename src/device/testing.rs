//! Mock vendor implementations for the crate's own tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::buffer::{ImageBuffer, monotonic_ns, next_frame_id};
use crate::device::backend::{DeviceBackend, DeviceClass};
use crate::device::events::lock;
use crate::device::info::{DeviceClassInfo, DeviceInfo};
use crate::device::stream::DataStream;
use crate::error::{HalError, Result};
use crate::format::PixelFormat;
use crate::params::{
    AccessMode, Parameter, ParameterImport, ParameterKind, ParameterPort, ParameterValue,
    Visibility,
};

pub(crate) const MOCK_API: &str = "mock-sdk";

pub(crate) fn class_info() -> DeviceClassInfo {
    DeviceClassInfo::new(MOCK_API, "0.9")
}

pub(crate) fn device_info(unique_id: &str) -> DeviceInfo {
    DeviceInfo::new("MockVision", "VirtCam", unique_id, unique_id, class_info())
}

fn entry(
    name: &str,
    category: &str,
    visibility: Visibility,
    access: AccessMode,
    value: ParameterValue,
) -> (Parameter, ParameterValue) {
    let descriptor = Parameter {
        name: name.to_string(),
        kind: value.kind(),
        category: category.to_string(),
        visibility,
        access,
        value: value.display(),
        selected: Vec::new(),
    };
    (descriptor, value)
}

/// In-memory device backend with a scriptable parameter table. Delivers one
/// synthetic Mono8 frame shortly after acquisition starts unless frames are
/// disabled.
pub(crate) struct MockBackend {
    parameters: Vec<(Parameter, ParameterValue)>,
    import_failed: Vec<String>,
    fail_import: bool,
    fail_reads: HashSet<String>,
    payload: usize,
    capacity: u32,
    deliver_frames: bool,
}

impl MockBackend {
    pub(crate) fn with_standard_parameters() -> Self {
        let parameters = vec![
            entry(
                "Width",
                "ImageFormatControl",
                Visibility::Beginner,
                AccessMode::READ_WRITE,
                ParameterValue::Integer(640),
            ),
            entry(
                "Height",
                "ImageFormatControl",
                Visibility::Beginner,
                AccessMode::READ_WRITE,
                ParameterValue::Integer(480),
            ),
            entry(
                "PixelFormat",
                "ImageFormatControl",
                Visibility::Beginner,
                AccessMode::READ_WRITE,
                ParameterValue::Enumeration("Mono8".to_string()),
            ),
            entry(
                "Gain",
                "AnalogControl",
                Visibility::Beginner,
                AccessMode::READ_WRITE,
                ParameterValue::Float(1.5),
            ),
            entry(
                "ExposureTime",
                "AcquisitionControl",
                Visibility::Beginner,
                AccessMode::READ_WRITE,
                ParameterValue::Float(10_000.0),
            ),
            entry(
                "ReverseX",
                "ImageFormatControl",
                Visibility::Expert,
                AccessMode::READ_WRITE,
                ParameterValue::Boolean(false),
            ),
            entry(
                "DeviceUserID",
                "DeviceControl",
                Visibility::Expert,
                AccessMode::READ_WRITE,
                ParameterValue::String("bench".to_string()),
            ),
            entry(
                "DeviceTemperature",
                "DeviceControl",
                Visibility::Expert,
                AccessMode::READ_ONLY,
                ParameterValue::Float(34.2),
            ),
            entry(
                "AcquisitionStart",
                "AcquisitionControl",
                Visibility::Invisible,
                AccessMode::WRITE_ONLY,
                ParameterValue::Command,
            ),
        ];
        Self {
            parameters,
            import_failed: Vec::new(),
            fail_import: false,
            fail_reads: HashSet::new(),
            payload: 640 * 480,
            capacity: 4,
            deliver_frames: true,
        }
    }

    pub(crate) fn without_frames(mut self) -> Self {
        self.deliver_frames = false;
        self
    }

    pub(crate) fn failing_reads(mut self, names: &[&str]) -> Self {
        self.fail_reads = names.iter().map(|n| n.to_string()).collect();
        self
    }

    fn find(&self, name: &str) -> Result<&(Parameter, ParameterValue)> {
        self.parameters
            .iter()
            .find(|(p, _)| p.name == name)
            .ok_or_else(|| HalError::DeviceCommunication(format!("mock has no node '{name}'")))
    }

    fn write(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let slot = self
            .parameters
            .iter_mut()
            .find(|(p, _)| p.name == name)
            .ok_or_else(|| HalError::DeviceCommunication(format!("mock has no node '{name}'")))?;
        if slot.0.kind != value.kind() {
            return Err(HalError::DeviceCommunication(format!(
                "mock node '{name}' is {:?}",
                slot.0.kind
            )));
        }
        slot.0.value = value.display();
        slot.1 = value;
        Ok(())
    }
}

impl ParameterPort for MockBackend {
    fn import_parameters(&mut self) -> Result<ParameterImport> {
        if self.fail_import {
            return Err(HalError::DeviceCommunication(
                "mock import failure".to_string(),
            ));
        }
        Ok(ParameterImport {
            parameters: self.parameters.iter().map(|(p, _)| p.clone()).collect(),
            failed: self.import_failed.clone(),
        })
    }

    fn read_parameter(&mut self, name: &str) -> Result<(String, AccessMode)> {
        if self.fail_reads.contains(name) {
            return Err(HalError::DeviceCommunication(format!(
                "mock read of '{name}' failed"
            )));
        }
        let (descriptor, value) = self.find(name)?;
        Ok((value.display(), descriptor.access))
    }
}

impl DeviceBackend for MockBackend {
    fn payload_size(&self) -> Result<usize> {
        Ok(self.payload)
    }

    fn buffer_capacity(&self) -> Result<u32> {
        Ok(self.capacity)
    }

    fn set_buffer_capacity(&mut self, capacity: u32) -> Result<()> {
        self.capacity = capacity;
        Ok(())
    }

    fn get_integer(&mut self, name: &str) -> Result<i64> {
        match &self.find(name)?.1 {
            ParameterValue::Integer(v) => Ok(*v),
            other => Err(HalError::DeviceCommunication(format!(
                "mock node '{name}' is {:?}",
                other.kind()
            ))),
        }
    }

    fn set_integer(&mut self, name: &str, value: i64) -> Result<()> {
        self.write(name, ParameterValue::Integer(value))
    }

    fn get_float(&mut self, name: &str) -> Result<f64> {
        match &self.find(name)?.1 {
            ParameterValue::Float(v) => Ok(*v),
            other => Err(HalError::DeviceCommunication(format!(
                "mock node '{name}' is {:?}",
                other.kind()
            ))),
        }
    }

    fn set_float(&mut self, name: &str, value: f64) -> Result<()> {
        self.write(name, ParameterValue::Float(value))
    }

    fn get_string(&mut self, name: &str) -> Result<String> {
        match &self.find(name)?.1 {
            ParameterValue::String(v) => Ok(v.clone()),
            other => Err(HalError::DeviceCommunication(format!(
                "mock node '{name}' is {:?}",
                other.kind()
            ))),
        }
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.write(name, ParameterValue::String(value.to_string()))
    }

    fn get_enumeration(&mut self, name: &str) -> Result<String> {
        match &self.find(name)?.1 {
            ParameterValue::Enumeration(v) => Ok(v.clone()),
            other => Err(HalError::DeviceCommunication(format!(
                "mock node '{name}' is {:?}",
                other.kind()
            ))),
        }
    }

    fn set_enumeration(&mut self, name: &str, entry: &str) -> Result<()> {
        self.write(name, ParameterValue::Enumeration(entry.to_string()))
    }

    fn get_boolean(&mut self, name: &str) -> Result<bool> {
        match &self.find(name)?.1 {
            ParameterValue::Boolean(v) => Ok(*v),
            other => Err(HalError::DeviceCommunication(format!(
                "mock node '{name}' is {:?}",
                other.kind()
            ))),
        }
    }

    fn set_boolean(&mut self, name: &str, value: bool) -> Result<()> {
        self.write(name, ParameterValue::Boolean(value))
    }

    fn execute_command(&mut self, name: &str) -> Result<()> {
        let (descriptor, _) = self.find(name)?;
        if descriptor.kind != ParameterKind::Command {
            return Err(HalError::DeviceCommunication(format!(
                "mock node '{name}' is not a command"
            )));
        }
        Ok(())
    }

    fn start_acquisition(&mut self, stream: Arc<DataStream>) -> Result<()> {
        if self.deliver_frames {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(5));
                let buffer = ImageBuffer::from_bytes(
                    vec![0x55u8; 16],
                    4,
                    4,
                    PixelFormat::Mono8,
                    next_frame_id(),
                    monotonic_ns(),
                )
                .expect("mock frame geometry is valid");
                stream.deliver(buffer);
            });
        }
        Ok(())
    }

    fn stop_acquisition(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Device class double with scriptable enumeration results.
pub(crate) struct MockClass {
    descriptor: DeviceClassInfo,
    devices: Mutex<Vec<DeviceInfo>>,
    fail_enumerate: AtomicBool,
}

impl MockClass {
    pub(crate) fn new(devices: Vec<DeviceInfo>) -> Arc<Self> {
        Arc::new(Self {
            descriptor: class_info(),
            devices: Mutex::new(devices),
            fail_enumerate: AtomicBool::new(false),
        })
    }

    pub(crate) fn named(api_name: &str, devices: Vec<DeviceInfo>) -> Arc<Self> {
        Arc::new(Self {
            descriptor: DeviceClassInfo::new(api_name, "0.9"),
            devices: Mutex::new(devices),
            fail_enumerate: AtomicBool::new(false),
        })
    }

    pub(crate) fn set_devices(&self, devices: Vec<DeviceInfo>) {
        *lock(&self.devices) = devices;
    }

    pub(crate) fn set_enumeration_failure(&self, fail: bool) {
        self.fail_enumerate.store(fail, Ordering::SeqCst);
    }
}

impl DeviceClass for MockClass {
    fn descriptor(&self) -> DeviceClassInfo {
        self.descriptor.clone()
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        if self.fail_enumerate.load(Ordering::SeqCst) {
            return Err(HalError::DeviceCommunication(
                "mock driver not present".to_string(),
            ));
        }
        Ok(lock(&self.devices).clone())
    }

    fn open(&self, info: &DeviceInfo) -> Result<Box<dyn DeviceBackend>> {
        if !lock(&self.devices).iter().any(|d| d == info) {
            return Err(HalError::DeviceCommunication(format!(
                "{} is not reachable",
                info.unique_id
            )));
        }
        Ok(Box::new(MockBackend::with_standard_parameters()))
    }
}
