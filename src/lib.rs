//! visionhal
//!
//! A vendor-neutral abstraction layer for machine-vision cameras, modeled
//! on the GenICam module hierarchy (System -> Device -> DataStream ->
//! Buffer) and its Pixel Format Naming Convention.
//!
//! Concrete vendor SDK wrappers implement the [`device`] contracts; client
//! code talks to one uniform surface:
//!
//! - [`format`] derives bit depth, channel count and dynamic range from a
//!   PFNC identifier and converts between byte-aligned and bit-packed wire
//!   layouts.
//! - [`buffer`] holds one frame's raw bytes behind bit-level pixel
//!   addressing.
//! - [`demosaic`] reconstructs color from Bayer-patterned buffers.
//! - [`params`] models typed device parameters and their cached collection.
//! - [`device`] is the camera contract plus the behavior every vendor
//!   variant shares.
//! - [`discovery`] registers device classes and enumerates, opens and
//!   tracks cameras across them.

pub mod buffer;
pub mod demosaic;
pub mod device;
pub mod discovery;
pub mod error;
pub mod format;
pub mod logger;
pub mod params;

pub use buffer::{ImageBuffer, RawFrame};
pub use demosaic::{ChannelOrder, demosaic};
pub use device::{
    DataStream, Device, DeviceBackend, DeviceClass, DeviceClassInfo, DeviceEvent, DeviceInfo,
    EventHub, SubscriptionId,
};
pub use discovery::{DeviceRegistry, System};
pub use error::{HalError, Result};
pub use format::{ByteOrder, ColorFilterPattern, PixelFormat, PixelSize, pack, unpack};
pub use params::{
    AccessMode, Parameter, ParameterCollection, ParameterImport, ParameterKind, ParameterPort,
    ParameterValue, Visibility,
};
