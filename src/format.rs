//! Pixel-format codec
//!
//! This module owns the GenICam PFNC identifier table and the pure layout
//! queries derived from it, plus the packed/unpacked wire-layout conversions.

pub(crate) mod packing;
mod types;

pub use packing::{ByteOrder, pack, unpack};
pub use types::{ColorFilterPattern, PixelFormat, PixelSize};
