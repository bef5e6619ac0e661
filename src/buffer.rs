//! Image buffer types
//!
//! [`ImageBuffer`] is the immutable, self-describing container for one
//! frame's raw bytes. [`RawFrame`] is the plain sample value vendor backends
//! hand over at the acquisition boundary before it is shaped into a buffer.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::{HalError, Result};
use crate::format::PixelFormat;
use crate::format::packing::{extract_bits, insert_bits};

static NEXT_FRAME_ID: AtomicU64 = AtomicU64::new(1);
static CLOCK_EPOCH: OnceLock<Instant> = OnceLock::new();

/// Next value of the process-wide monotonically increasing frame counter.
pub fn next_frame_id() -> u64 {
    NEXT_FRAME_ID.fetch_add(1, Ordering::Relaxed)
}

/// Nanoseconds on the monotonic clock, measured from a process-local epoch
/// pinned on first use.
pub fn monotonic_ns() -> u64 {
    CLOCK_EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

/// Decoded sensor samples as delivered by a vendor driver.
///
/// Samples are interleaved channel-major per pixel and always exchanged as
/// `u16` regardless of the sensor's significant depth; `bits_per_sample`
/// records that depth (e.g. 12 or 14 on a 16-bit transport).
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Width of the frame in pixels.
    pub width: u32,
    /// Height of the frame in pixels.
    pub height: u32,
    /// Channels per pixel (1 for mono/Bayer, 3 for RGB, 4 for RGBa).
    pub channels: u32,
    /// Significant bits per sample.
    pub bits_per_sample: u32,
    /// Interleaved sample data, `width * height * channels` entries.
    pub samples: Vec<u16>,
}

/// One acquired or derived frame: raw bytes plus geometry, format, frame id
/// and acquisition timestamp.
///
/// A buffer exclusively owns its bytes after construction and is treated as
/// an immutable hand-off value once published; the pixel setters exist for
/// buffers a caller still exclusively owns. Unpacked multi-byte samples are
/// little-endian in memory; bit-packed formats follow the PFNC LSB-first
/// convention.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_id: u64,
    timestamp_ns: u64,
}

impl ImageBuffer {
    /// Wrap caller-owned bytes without copying.
    pub fn from_bytes(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        frame_id: u64,
        timestamp_ns: u64,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(HalError::InvalidArgument("image data is empty".into()));
        }
        if width == 0 || height == 0 {
            return Err(HalError::InvalidArgument(format!(
                "degenerate geometry {width}x{height}"
            )));
        }
        let required = format.required_len(width, height);
        if data.len() < required {
            return Err(HalError::InvalidArgument(format!(
                "{} bytes are too few for {width}x{height} {format} (needs {required})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
            frame_id,
            timestamp_ns,
        })
    }

    /// Deep-copy a vendor frame, stamping a fresh frame id and timestamp.
    ///
    /// With an explicit `format` the frame must match its channel count and
    /// fit its significant depth; with `None` the format is inferred from
    /// (channels, bits-per-sample). Packed formats are not valid targets;
    /// the data path packs explicitly when a wire layout calls for it.
    pub fn from_raw_frame(frame: &RawFrame, format: Option<PixelFormat>) -> Result<Self> {
        if frame.samples.is_empty() {
            return Err(HalError::InvalidArgument("image data is empty".into()));
        }
        let expected = frame.width as usize * frame.height as usize * frame.channels as usize;
        if frame.samples.len() != expected {
            return Err(HalError::InvalidArgument(format!(
                "{} samples for {}x{}x{} geometry (expected {expected})",
                frame.samples.len(),
                frame.width,
                frame.height,
                frame.channels
            )));
        }

        let format = match format {
            Some(format) => {
                if format.is_packed() {
                    return Err(HalError::InvalidArgument(format!(
                        "{format} is bit-packed; deep copies are byte-aligned"
                    )));
                }
                if format.channel_count() != frame.channels {
                    return Err(HalError::InvalidArgument(format!(
                        "frame has {} channels, {format} expects {}",
                        frame.channels,
                        format.channel_count()
                    )));
                }
                if frame.bits_per_sample == 0
                    || frame.bits_per_sample > format.pixel_size().bits()
                {
                    return Err(HalError::InvalidArgument(format!(
                        "{}-bit samples do not fit {format}",
                        frame.bits_per_sample
                    )));
                }
                format
            }
            None => Self::infer_format(frame.channels, frame.bits_per_sample)?,
        };

        let mut buffer = Self {
            data: vec![0u8; format.required_len(frame.width, frame.height)],
            width: frame.width,
            height: frame.height,
            format,
            frame_id: next_frame_id(),
            timestamp_ns: monotonic_ns(),
        };
        let channels = frame.channels as usize;
        let depth = format.bits_per_channel();
        for (i, sample) in frame.samples.iter().enumerate() {
            let pixel = (i / channels) as u32;
            let offset = buffer.channel_bit_offset(
                pixel / frame.width,
                pixel % frame.width,
                i % channels,
            );
            insert_bits(&mut buffer.data, offset, depth, *sample);
        }
        Ok(buffer)
    }

    fn infer_format(channels: u32, bits_per_sample: u32) -> Result<PixelFormat> {
        match (channels, bits_per_sample) {
            (1, 8) => Ok(PixelFormat::Mono8),
            (1, 10) => Ok(PixelFormat::Mono10),
            (1, 12) => Ok(PixelFormat::Mono12),
            (1, 14) => Ok(PixelFormat::Mono14),
            (1, 16) => Ok(PixelFormat::Mono16),
            (3, 8) => Ok(PixelFormat::Rgb8),
            (3, 16) => Ok(PixelFormat::Rgb16),
            (4, 8) => Ok(PixelFormat::Rgba8),
            _ => Err(HalError::InvalidArgument(format!(
                "no format inferrable from {channels} channels at {bits_per_sample} bits"
            ))),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Storage bits of one channel, as reported by the codec.
    pub fn bit_depth(&self) -> u32 {
        self.format.bits_per_channel()
    }

    pub fn channel_count(&self) -> u32 {
        self.format.channel_count()
    }

    pub fn dynamic_range_min(&self) -> u64 {
        0
    }

    pub fn dynamic_range_max(&self) -> u64 {
        self.format.dynamic_range_max()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Acquisition timestamp in monotonic-clock nanoseconds.
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// All channel values of the pixel at (`row`, `col`), channel-ordered.
    pub fn pixel(&self, row: u32, col: u32) -> Result<Vec<f64>> {
        self.check_bounds(row, col)?;
        let channels = self.format.channel_count() as usize;
        let depth = self.format.bits_per_channel();
        let mut values = Vec::with_capacity(channels);
        for ch in 0..channels {
            let offset = self.channel_bit_offset(row, col, ch);
            values.push(f64::from(extract_bits(&self.data, offset, depth)));
        }
        Ok(values)
    }

    /// One channel value of the pixel at (`row`, `col`).
    pub fn channel_value(&self, row: u32, col: u32, channel: u32) -> Result<f64> {
        self.check_bounds(row, col)?;
        self.check_channel(channel)?;
        let offset = self.channel_bit_offset(row, col, channel as usize);
        Ok(f64::from(extract_bits(
            &self.data,
            offset,
            self.format.bits_per_channel(),
        )))
    }

    /// Overwrite every channel of the pixel at (`row`, `col`).
    pub fn set_pixel(&mut self, row: u32, col: u32, values: &[f64]) -> Result<()> {
        if values.len() != self.format.channel_count() as usize {
            return Err(HalError::InvalidArgument(format!(
                "{} values for a {}-channel pixel",
                values.len(),
                self.format.channel_count()
            )));
        }
        for (ch, value) in values.iter().enumerate() {
            self.set_channel_value(row, col, ch as u32, *value)?;
        }
        Ok(())
    }

    /// Overwrite one channel of the pixel at (`row`, `col`).
    pub fn set_channel_value(&mut self, row: u32, col: u32, channel: u32, value: f64) -> Result<()> {
        self.check_bounds(row, col)?;
        self.check_channel(channel)?;
        let max = self.format.dynamic_range_max();
        if !value.is_finite() || value < 0.0 || value > max as f64 {
            return Err(HalError::OutOfRange(format!(
                "value {value} outside dynamic range 0..={max}"
            )));
        }
        let offset = self.channel_bit_offset(row, col, channel as usize);
        insert_bits(
            &mut self.data,
            offset,
            self.format.bits_per_channel(),
            value.round() as u16,
        );
        Ok(())
    }

    /// Bit address of one channel sample. Interleaved formats step by whole
    /// pixels; planar formats step plane-major.
    fn channel_bit_offset(&self, row: u32, col: u32, channel: usize) -> usize {
        let depth = self.format.bits_per_channel() as usize;
        let index = (row as usize) * self.width as usize + col as usize;
        if self.format.is_planar() {
            let plane = self.width as usize * self.height as usize * depth;
            channel * plane + index * depth
        } else {
            index * self.format.bits_per_pixel() as usize + channel * depth
        }
    }

    fn check_bounds(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.height || col >= self.width {
            return Err(HalError::OutOfRange(format!(
                "pixel ({row}, {col}) outside {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    fn check_channel(&self, channel: u32) -> Result<()> {
        if channel >= self.format.channel_count() {
            return Err(HalError::OutOfRange(format!(
                "channel {channel} of a {}-channel format",
                self.format.channel_count()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format.name())
            .field("frame_id", &self.frame_id)
            .field("timestamp_ns", &self.timestamp_ns)
            .field("bytes", &self.data.len())
            .finish()
    }
}
