//! The pixel-format identifier table and its derived layout properties.
//!
//! Identifiers are the 32-bit codes of the GenICam Pixel Format Naming
//! Convention (PFNC v2.3). Bits 23..16 of a code encode the total storage
//! bits per pixel, but the table below is authoritative: nothing is derived
//! from a raw code at runtime without it being a member of the table, and a
//! unit test pins the table against the encoded widths.

use crate::error::{HalError, Result};

/// Represented bit depth of one channel, distinct from its storage width.
///
/// An unpacked 10-bit format stores 16 bits per channel but represents 10
/// significant bits; this enum names the significant depth. The variant set
/// covers the PFNC range even though the current table only uses 8..=16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum PixelSize {
    Bpp1 = 1,
    Bpp2 = 2,
    Bpp4 = 4,
    Bpp8 = 8,
    Bpp10 = 10,
    Bpp12 = 12,
    Bpp14 = 14,
    Bpp16 = 16,
    Bpp32 = 32,
    Bpp64 = 64,
    Bpp96 = 96,
}

impl PixelSize {
    pub const fn bits(self) -> u32 {
        self as u32
    }
}

/// Color-filter array layout of a sensor format.
///
/// The two letters in a PFNC Bayer name give the first two samples of the
/// repeating 2x2 tile, so BayerRG* tiles as RGGB, BayerGR* as GRBG, and so
/// on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFilterPattern {
    None,
    BayerRggb,
    BayerGbrg,
    BayerGrbg,
    BayerBggr,
}

/// How samples are laid out in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleLayout {
    /// Each channel padded up to the next byte boundary, channels interleaved.
    Unpacked,
    /// Samples at their exact bit width, no padding between pixels.
    Packed,
    /// Byte-aligned channels stored plane-major instead of interleaved.
    Planar,
}

macro_rules! pixel_formats {
    ($( $variant:ident = $code:literal, $pfnc:literal, $size:ident, $channels:literal, $cfa:ident, $layout:ident; )+) => {
        /// A supported PFNC pixel format. The discriminant is the PFNC code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum PixelFormat {
            $( $variant = $code, )+
        }

        impl PixelFormat {
            /// Every format in the supported table.
            pub const ALL: &'static [PixelFormat] = &[ $( PixelFormat::$variant, )+ ];

            /// Look up a raw PFNC code. The only way in from raw numbers.
            pub fn from_code(code: u32) -> Result<Self> {
                match code {
                    $( $code => Ok(Self::$variant), )+
                    other => Err(HalError::UnsupportedFormat(format!(
                        "PFNC code {other:#010x} is not in the supported table"
                    ))),
                }
            }

            /// The PFNC name of this format.
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $pfnc, )+
                }
            }

            /// Represented significant depth of one channel.
            pub const fn pixel_size(self) -> PixelSize {
                match self {
                    $( Self::$variant => PixelSize::$size, )+
                }
            }

            /// Number of channels a pixel carries.
            pub const fn channel_count(self) -> u32 {
                match self {
                    $( Self::$variant => $channels, )+
                }
            }

            /// Color-filter array of the format, `None` for non-Bayer formats.
            pub const fn color_filter(self) -> ColorFilterPattern {
                match self {
                    $( Self::$variant => ColorFilterPattern::$cfa, )+
                }
            }

            const fn layout(self) -> SampleLayout {
                match self {
                    $( Self::$variant => SampleLayout::$layout, )+
                }
            }
        }
    };
}

pixel_formats! {
    // Monochrome
    Mono8       = 0x0108_0001, "Mono8",       Bpp8,  1, None,      Unpacked;
    Mono10      = 0x0110_0003, "Mono10",      Bpp10, 1, None,      Unpacked;
    Mono10p     = 0x010A_0046, "Mono10p",     Bpp10, 1, None,      Packed;
    Mono12      = 0x0110_0005, "Mono12",      Bpp12, 1, None,      Unpacked;
    Mono12p     = 0x010C_0047, "Mono12p",     Bpp12, 1, None,      Packed;
    Mono14      = 0x0110_0025, "Mono14",      Bpp14, 1, None,      Unpacked;
    Mono16      = 0x0110_0007, "Mono16",      Bpp16, 1, None,      Unpacked;
    // Bayer, byte-aligned
    BayerGr8    = 0x0108_0008, "BayerGR8",    Bpp8,  1, BayerGrbg, Unpacked;
    BayerRg8    = 0x0108_0009, "BayerRG8",    Bpp8,  1, BayerRggb, Unpacked;
    BayerGb8    = 0x0108_000A, "BayerGB8",    Bpp8,  1, BayerGbrg, Unpacked;
    BayerBg8    = 0x0108_000B, "BayerBG8",    Bpp8,  1, BayerBggr, Unpacked;
    BayerGr10   = 0x0110_000C, "BayerGR10",   Bpp10, 1, BayerGrbg, Unpacked;
    BayerRg10   = 0x0110_000D, "BayerRG10",   Bpp10, 1, BayerRggb, Unpacked;
    BayerGb10   = 0x0110_000E, "BayerGB10",   Bpp10, 1, BayerGbrg, Unpacked;
    BayerBg10   = 0x0110_000F, "BayerBG10",   Bpp10, 1, BayerBggr, Unpacked;
    BayerGr12   = 0x0110_0010, "BayerGR12",   Bpp12, 1, BayerGrbg, Unpacked;
    BayerRg12   = 0x0110_0011, "BayerRG12",   Bpp12, 1, BayerRggb, Unpacked;
    BayerGb12   = 0x0110_0012, "BayerGB12",   Bpp12, 1, BayerGbrg, Unpacked;
    BayerBg12   = 0x0110_0013, "BayerBG12",   Bpp12, 1, BayerBggr, Unpacked;
    BayerGr16   = 0x0110_002E, "BayerGR16",   Bpp16, 1, BayerGrbg, Unpacked;
    BayerRg16   = 0x0110_002F, "BayerRG16",   Bpp16, 1, BayerRggb, Unpacked;
    BayerGb16   = 0x0110_0030, "BayerGB16",   Bpp16, 1, BayerGbrg, Unpacked;
    BayerBg16   = 0x0110_0031, "BayerBG16",   Bpp16, 1, BayerBggr, Unpacked;
    // Bayer, bit-packed
    BayerBg10p  = 0x010A_0052, "BayerBG10p",  Bpp10, 1, BayerBggr, Packed;
    BayerBg12p  = 0x010C_0053, "BayerBG12p",  Bpp12, 1, BayerBggr, Packed;
    BayerGb10p  = 0x010A_0054, "BayerGB10p",  Bpp10, 1, BayerGbrg, Packed;
    BayerGb12p  = 0x010C_0055, "BayerGB12p",  Bpp12, 1, BayerGbrg, Packed;
    BayerGr10p  = 0x010A_0056, "BayerGR10p",  Bpp10, 1, BayerGrbg, Packed;
    BayerGr12p  = 0x010C_0057, "BayerGR12p",  Bpp12, 1, BayerGrbg, Packed;
    BayerRg10p  = 0x010A_0058, "BayerRG10p",  Bpp10, 1, BayerRggb, Packed;
    BayerRg12p  = 0x010C_0059, "BayerRG12p",  Bpp12, 1, BayerRggb, Packed;
    // Interleaved color
    Rgb8        = 0x0218_0014, "RGB8",        Bpp8,  3, None,      Unpacked;
    Bgr8        = 0x0218_0015, "BGR8",        Bpp8,  3, None,      Unpacked;
    Rgba8       = 0x0220_0016, "RGBa8",       Bpp8,  4, None,      Unpacked;
    Bgra8       = 0x0220_0017, "BGRa8",       Bpp8,  4, None,      Unpacked;
    Rgb10       = 0x0230_0018, "RGB10",       Bpp10, 3, None,      Unpacked;
    Bgr10       = 0x0230_0019, "BGR10",       Bpp10, 3, None,      Unpacked;
    Rgb12       = 0x0230_001A, "RGB12",       Bpp12, 3, None,      Unpacked;
    Bgr12       = 0x0230_001B, "BGR12",       Bpp12, 3, None,      Unpacked;
    Rgb16       = 0x0230_0033, "RGB16",       Bpp16, 3, None,      Unpacked;
    Bgr16       = 0x0230_004B, "BGR16",       Bpp16, 3, None,      Unpacked;
    // Planar color
    Rgb8Planar  = 0x0218_0021, "RGB8_Planar", Bpp8,  3, None,      Planar;
    Rgb10Planar = 0x0230_0022, "RGB10_Planar", Bpp10, 3, None,     Planar;
    Rgb12Planar = 0x0230_0023, "RGB12_Planar", Bpp12, 3, None,     Planar;
    Rgb16Planar = 0x0230_0024, "RGB16_Planar", Bpp16, 3, None,     Planar;
}

impl PixelFormat {
    /// The raw PFNC code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Storage bits of one channel: the significant depth rounded up to the
    /// next byte boundary for byte-aligned formats, the exact depth for
    /// packed formats.
    pub const fn bits_per_channel(self) -> u32 {
        let significant = self.pixel_size().bits();
        match self.layout() {
            SampleLayout::Packed => significant,
            SampleLayout::Unpacked | SampleLayout::Planar => significant.div_ceil(8) * 8,
        }
    }

    /// Total storage bits of one pixel, summed over channels.
    pub const fn bits_per_pixel(self) -> u32 {
        self.bits_per_channel() * self.channel_count()
    }

    /// Largest representable sample value, `2^pixel_size - 1`.
    pub const fn dynamic_range_max(self) -> u64 {
        (1u64 << self.pixel_size().bits()) - 1
    }

    pub const fn is_packed(self) -> bool {
        matches!(self.layout(), SampleLayout::Packed)
    }

    pub const fn is_planar(self) -> bool {
        matches!(self.layout(), SampleLayout::Planar)
    }

    /// The bit-packed sibling of a byte-aligned format, if the packed set
    /// contains one.
    pub const fn packed_counterpart(self) -> Option<PixelFormat> {
        match self {
            Self::Mono10 => Some(Self::Mono10p),
            Self::Mono12 => Some(Self::Mono12p),
            Self::BayerGr10 => Some(Self::BayerGr10p),
            Self::BayerRg10 => Some(Self::BayerRg10p),
            Self::BayerGb10 => Some(Self::BayerGb10p),
            Self::BayerBg10 => Some(Self::BayerBg10p),
            Self::BayerGr12 => Some(Self::BayerGr12p),
            Self::BayerRg12 => Some(Self::BayerRg12p),
            Self::BayerGb12 => Some(Self::BayerGb12p),
            Self::BayerBg12 => Some(Self::BayerBg12p),
            _ => None,
        }
    }

    /// The byte-aligned sibling of a bit-packed format.
    pub const fn unpacked_counterpart(self) -> Option<PixelFormat> {
        match self {
            Self::Mono10p => Some(Self::Mono10),
            Self::Mono12p => Some(Self::Mono12),
            Self::BayerGr10p => Some(Self::BayerGr10),
            Self::BayerRg10p => Some(Self::BayerRg10),
            Self::BayerGb10p => Some(Self::BayerGb10),
            Self::BayerBg10p => Some(Self::BayerBg10),
            Self::BayerGr12p => Some(Self::BayerGr12),
            Self::BayerRg12p => Some(Self::BayerRg12),
            Self::BayerGb12p => Some(Self::BayerGb12),
            Self::BayerBg12p => Some(Self::BayerBg12),
            _ => None,
        }
    }

    /// Minimum byte length of a frame of the given geometry in this format.
    pub const fn required_len(self, width: u32, height: u32) -> usize {
        let bits = width as usize * height as usize * self.bits_per_pixel() as usize;
        bits.div_ceil(8)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
