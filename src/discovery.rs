//! Discovery layer
//!
//! The class registry and the process-wide system entry point that turn
//! registered vendor implementations into an enumerable, openable device
//! list.

mod registry;
mod system;

pub use registry::DeviceRegistry;
pub use system::System;
