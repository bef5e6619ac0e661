//! Bayer demosaicing
//!
//! Reconstructs a 3-channel image from a single-channel color-filter-array
//! buffer. The interpolation arithmetic is delegated to the external `bayer`
//! kernel; this module selects the conversion matching the buffer's CFA
//! pattern and keeps the significant bit depth intact across the call.

use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::debug;

use crate::buffer::ImageBuffer;
use crate::error::{HalError, Result};
use crate::format::{ColorFilterPattern, PixelFormat};

/// Channel order of the demosaiced output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Convert a Bayer-patterned buffer into the sibling interleaved color
/// format at the same significant depth, preserving frame id and timestamp.
///
/// Fails with `InvalidArgument` before any computation if the buffer's
/// format carries no color filter, or if it is bit-packed (the kernel
/// operates on byte-aligned samples; unpack first).
pub fn demosaic(buffer: &ImageBuffer, order: ChannelOrder) -> Result<ImageBuffer> {
    let format = buffer.format();
    let cfa = match format.color_filter() {
        ColorFilterPattern::None => {
            return Err(HalError::InvalidArgument(format!(
                "{format} carries no Bayer color filter"
            )));
        }
        ColorFilterPattern::BayerRggb => CFA::RGGB,
        ColorFilterPattern::BayerGbrg => CFA::GBRG,
        ColorFilterPattern::BayerGrbg => CFA::GRBG,
        ColorFilterPattern::BayerBggr => CFA::BGGR,
    };
    if format.is_packed() {
        return Err(HalError::InvalidArgument(format!(
            "{format} is bit-packed; unpack before demosaicing"
        )));
    }
    let output_format = sibling_color_format(format, order)?;

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let depth_bits = format.pixel_size().bits();
    let (bayer_depth, raster_depth, bytes_per_channel) = if depth_bits <= 8 {
        (BayerDepth::Depth8, RasterDepth::Depth8, 1usize)
    } else {
        (BayerDepth::Depth16LE, RasterDepth::Depth16, 2usize)
    };

    debug!(from = %format, to = %output_format, width, height, "demosaicing buffer");

    let mut rgb = vec![0u8; width * height * 3 * bytes_per_channel];
    {
        let mut raster = RasterMut::new(width, height, raster_depth, &mut rgb);
        bayer::run_demosaic(
            &mut Cursor::new(buffer.data()),
            bayer_depth,
            cfa,
            Demosaic::Linear,
            &mut raster,
        )
        .map_err(|e| HalError::InvalidArgument(format!("demosaic kernel failed: {e:?}")))?;
    }

    if order == ChannelOrder::Bgr {
        for pixel in rgb.chunks_exact_mut(3 * bytes_per_channel) {
            for k in 0..bytes_per_channel {
                pixel.swap(k, 2 * bytes_per_channel + k);
            }
        }
    }

    ImageBuffer::from_bytes(
        rgb,
        buffer.width(),
        buffer.height(),
        output_format,
        buffer.frame_id(),
        buffer.timestamp_ns(),
    )
}

/// The interleaved color format matching a Bayer format's significant depth.
fn sibling_color_format(format: PixelFormat, order: ChannelOrder) -> Result<PixelFormat> {
    let sibling = match (format.pixel_size().bits(), order) {
        (8, ChannelOrder::Rgb) => PixelFormat::Rgb8,
        (8, ChannelOrder::Bgr) => PixelFormat::Bgr8,
        (10, ChannelOrder::Rgb) => PixelFormat::Rgb10,
        (10, ChannelOrder::Bgr) => PixelFormat::Bgr10,
        (12, ChannelOrder::Rgb) => PixelFormat::Rgb12,
        (12, ChannelOrder::Bgr) => PixelFormat::Bgr12,
        (16, ChannelOrder::Rgb) => PixelFormat::Rgb16,
        (16, ChannelOrder::Bgr) => PixelFormat::Bgr16,
        (bits, _) => {
            return Err(HalError::UnsupportedFormat(format!(
                "no {bits}-bit interleaved color sibling for {format}"
            )));
        }
    };
    Ok(sibling)
}
