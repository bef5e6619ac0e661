//! Conversions between byte-aligned and bit-packed wire layouts.
//!
//! Packed PFNC formats ("p" suffix) store samples at their exact bit width,
//! LSB-first, with no padding between pixels. Byte-aligned formats store one
//! sample per 8- or 16-bit storage slot; the byte order of 16-bit slots is
//! caller-selected because vendor transports deliver both. The bit-field
//! helpers here are also the addressing primitives used by image buffers.

use tracing::debug;

use crate::buffer::ImageBuffer;
use crate::error::{HalError, Result};

/// Byte order of 16-bit storage samples on the byte-aligned side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    fn read_u16(self, bytes: &[u8]) -> u16 {
        let pair = [bytes[0], bytes[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(pair),
            ByteOrder::BigEndian => u16::from_be_bytes(pair),
        }
    }

    fn write_u16(self, bytes: &mut [u8], value: u16) {
        let pair = match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        bytes[0] = pair[0];
        bytes[1] = pair[1];
    }
}

/// Read a `width`-bit field (width <= 16) starting at `bit_offset`, LSB-first.
pub(crate) fn extract_bits(src: &[u8], bit_offset: usize, width: u32) -> u16 {
    let byte = bit_offset / 8;
    let shift = bit_offset % 8;
    // shift (<= 7) + width (<= 16) never exceeds the 24-bit window.
    let mut window = 0u32;
    for (i, b) in src[byte..].iter().take(3).enumerate() {
        window |= u32::from(*b) << (8 * i);
    }
    let mask = (1u32 << width) - 1;
    ((window >> shift) & mask) as u16
}

/// Overwrite a `width`-bit field (width <= 16) starting at `bit_offset`,
/// LSB-first. Bits of `value` above `width` are discarded.
pub(crate) fn insert_bits(dst: &mut [u8], bit_offset: usize, width: u32, value: u16) {
    let shift = bit_offset % 8;
    let mut byte = bit_offset / 8;
    let mut mask = ((1u32 << width) - 1) << shift;
    let mut bits = (u32::from(value) << shift) & mask;
    while mask != 0 {
        dst[byte] = (dst[byte] & !(mask as u8)) | bits as u8;
        mask >>= 8;
        bits >>= 8;
        byte += 1;
    }
}

/// Convert a byte-aligned buffer into its bit-packed counterpart.
///
/// Sample values above the format's dynamic range are masked to their
/// significant bits; geometry, frame id and timestamp carry over unchanged,
/// so `unpack(pack(b)) == b` whenever `b`'s samples are within range.
pub fn pack(buffer: &ImageBuffer, order: ByteOrder) -> Result<ImageBuffer> {
    let format = buffer.format();
    let packed = format.packed_counterpart().ok_or_else(|| {
        HalError::UnsupportedFormat(format!("{} has no bit-packed counterpart", format.name()))
    })?;

    let width = buffer.width();
    let height = buffer.height();
    let pixels = width as usize * height as usize;
    let depth = format.pixel_size().bits();
    debug!(from = %format, to = %packed, width, height, "packing buffer");

    let src = buffer.data();
    let mut out = vec![0u8; packed.required_len(width, height)];
    for i in 0..pixels {
        let sample = order.read_u16(&src[2 * i..2 * i + 2]);
        insert_bits(&mut out, i * depth as usize, depth, sample);
    }

    ImageBuffer::from_bytes(
        out,
        width,
        height,
        packed,
        buffer.frame_id(),
        buffer.timestamp_ns(),
    )
}

/// Convert a bit-packed buffer into its byte-aligned counterpart.
pub fn unpack(buffer: &ImageBuffer, order: ByteOrder) -> Result<ImageBuffer> {
    let format = buffer.format();
    let unpacked = format.unpacked_counterpart().ok_or_else(|| {
        HalError::UnsupportedFormat(format!("{} is not a supported packed format", format.name()))
    })?;

    let width = buffer.width();
    let height = buffer.height();
    let pixels = width as usize * height as usize;
    let depth = format.pixel_size().bits();
    debug!(from = %format, to = %unpacked, width, height, "unpacking buffer");

    let src = buffer.data();
    let mut out = vec![0u8; unpacked.required_len(width, height)];
    for i in 0..pixels {
        let sample = extract_bits(src, i * depth as usize, depth);
        order.write_u16(&mut out[2 * i..2 * i + 2], sample);
    }

    ImageBuffer::from_bytes(
        out,
        width,
        height,
        unpacked,
        buffer.frame_id(),
        buffer.timestamp_ns(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    fn pattern_buffer(format: PixelFormat, width: u32, height: u32) -> ImageBuffer {
        let pixels = width as usize * height as usize;
        let max = format.dynamic_range_max();
        let mut bytes = vec![0u8; format.required_len(width, height)];
        for i in 0..pixels {
            let sample = (i as u64 * 37 + 11) % (max + 1);
            bytes[2 * i..2 * i + 2].copy_from_slice(&(sample as u16).to_le_bytes());
        }
        ImageBuffer::from_bytes(bytes, width, height, format, 7, 123_456).unwrap()
    }

    #[test]
    fn bit_fields_round_trip() {
        let mut scratch = vec![0u8; 16];
        insert_bits(&mut scratch, 0, 10, 0x2AB);
        insert_bits(&mut scratch, 10, 10, 0x155);
        insert_bits(&mut scratch, 20, 10, 0x3FF);
        assert_eq!(extract_bits(&scratch, 0, 10), 0x2AB);
        assert_eq!(extract_bits(&scratch, 10, 10), 0x155);
        assert_eq!(extract_bits(&scratch, 20, 10), 0x3FF);
    }

    #[test]
    fn insert_overwrites_existing_field() {
        let mut scratch = vec![0xFFu8; 4];
        insert_bits(&mut scratch, 6, 12, 0x000);
        assert_eq!(extract_bits(&scratch, 6, 12), 0x000);
        // Neighboring bits stay untouched.
        assert_eq!(extract_bits(&scratch, 0, 6), 0x3F);
        assert_eq!(extract_bits(&scratch, 18, 6), 0x3F);
    }

    #[test]
    fn insert_masks_out_of_width_bits() {
        let mut scratch = vec![0u8; 4];
        insert_bits(&mut scratch, 0, 10, 0xFFFF);
        assert_eq!(extract_bits(&scratch, 0, 10), 0x3FF);
        assert_eq!(scratch[2], 0);
    }

    #[test]
    fn round_trip_all_packed_formats() {
        let packable = [
            PixelFormat::Mono10,
            PixelFormat::Mono12,
            PixelFormat::BayerGr10,
            PixelFormat::BayerRg10,
            PixelFormat::BayerGb10,
            PixelFormat::BayerBg10,
            PixelFormat::BayerGr12,
            PixelFormat::BayerRg12,
            PixelFormat::BayerGb12,
            PixelFormat::BayerBg12,
        ];
        for format in packable {
            for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
                let zeros = ImageBuffer::from_bytes(
                    vec![0u8; format.required_len(6, 4)],
                    6,
                    4,
                    format,
                    1,
                    99,
                )
                .unwrap();
                // LE pattern samples are only valid input for the LE order.
                let buffers = if order == ByteOrder::LittleEndian {
                    vec![zeros, pattern_buffer(format, 6, 4)]
                } else {
                    vec![zeros]
                };
                for buffer in buffers {
                    let packed = pack(&buffer, order).unwrap();
                    assert_eq!(packed.format(), format.packed_counterpart().unwrap());
                    assert_eq!(packed.frame_id(), buffer.frame_id());
                    assert_eq!(packed.timestamp_ns(), buffer.timestamp_ns());
                    let back = unpack(&packed, order).unwrap();
                    assert_eq!(back, buffer, "{} via {order:?}", format.name());
                }
            }
        }
    }

    #[test]
    fn big_endian_samples_round_trip() {
        let format = PixelFormat::Mono12;
        let mut bytes = vec![0u8; format.required_len(4, 2)];
        for i in 0..8usize {
            let sample = (i as u16 * 421) & 0x0FFF;
            bytes[2 * i..2 * i + 2].copy_from_slice(&sample.to_be_bytes());
        }
        let buffer = ImageBuffer::from_bytes(bytes, 4, 2, format, 2, 0).unwrap();
        let back = unpack(&pack(&buffer, ByteOrder::BigEndian).unwrap(), ByteOrder::BigEndian)
            .unwrap();
        assert_eq!(back, buffer);
    }

    #[test]
    fn packed_layout_is_lsb_first() {
        // Two 10-bit samples: 0x201 then 0x002 -> bits 0..10 and 10..20.
        let format = PixelFormat::Mono10;
        let mut bytes = vec![0u8; format.required_len(2, 1)];
        bytes[0..2].copy_from_slice(&0x0201u16.to_le_bytes());
        bytes[2..4].copy_from_slice(&0x0002u16.to_le_bytes());
        let buffer = ImageBuffer::from_bytes(bytes, 2, 1, format, 3, 0).unwrap();
        let packed = pack(&buffer, ByteOrder::LittleEndian).unwrap();
        assert_eq!(packed.data(), &[0x01, 0x0A, 0x00]);
    }

    #[test]
    fn pack_rejects_formats_without_counterpart() {
        let buffer = ImageBuffer::from_bytes(vec![0u8; 16], 4, 4, PixelFormat::Mono8, 1, 0).unwrap();
        assert!(matches!(
            pack(&buffer, ByteOrder::LittleEndian),
            Err(HalError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn unpack_rejects_unpacked_input() {
        let buffer =
            ImageBuffer::from_bytes(vec![0u8; 32], 4, 4, PixelFormat::Mono10, 1, 0).unwrap();
        assert!(matches!(
            unpack(&buffer, ByteOrder::LittleEndian),
            Err(HalError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn pack_masks_out_of_range_samples() {
        let format = PixelFormat::Mono10;
        let mut bytes = vec![0u8; format.required_len(1, 1)];
        bytes[0..2].copy_from_slice(&0xFFFFu16.to_le_bytes());
        let buffer = ImageBuffer::from_bytes(bytes, 1, 1, format, 1, 0).unwrap();
        let packed = pack(&buffer, ByteOrder::LittleEndian).unwrap();
        let back = unpack(&packed, ByteOrder::LittleEndian).unwrap();
        assert_eq!(
            u16::from_le_bytes([back.data()[0], back.data()[1]]),
            0x03FF
        );
    }
}
