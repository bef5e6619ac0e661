//! Device parameter model
//!
//! Typed parameter descriptors and the cached, on-demand-refreshed
//! collection a device builds when it is opened.

mod collection;
mod types;

pub use collection::{ParameterCollection, ParameterPort};
pub use types::{AccessMode, Parameter, ParameterImport, ParameterKind, ParameterValue, Visibility};
