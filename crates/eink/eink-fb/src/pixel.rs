//! Pixel accessors
//!
//! One [`PixelAccessor`] per live framebuffer format, picked at (re)init from the bitdepth and
//! color order. The per-pixel `get`/`set` are the hot path: no bounds checks beyond the slice
//! indexing itself, so out-of-range coordinates panic rather than corrupt memory. Callers clip.

use crate::error::{FbError, Result};
use crate::geometry::{ColorOrder, FbGeometry};

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Color {
    /// Black
    pub const BLACK: Self = Self::gray(0x00);
    /// White
    pub const WHITE: Self = Self::gray(0xFF);

    /// Color from components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Gray level
    pub const fn gray(y: u8) -> Self {
        Self { r: y, g: y, b: y }
    }

    /// Rec. 601 luma, in 16.16 fixed point. Exact for grays.
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    pub const fn luma(self) -> u8 {
        // SAFETY: max is 255 * 65536 + 32768, well within u32; the shift brings it back to 0..=255
        ((self.r as u32 * 19595 + self.g as u32 * 38470 + self.b as u32 * 7471 + 32768) >> 16) as u8
    }
}

/// Pixel layout of the framebuffer memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4bpp grayscale, two pixels per byte, even x in the high nibble
    Gray4,
    /// 8bpp grayscale
    Gray8,
    /// 16bpp RGB565, little-endian
    Rgb565,
    /// 24bpp packed, no padding byte
    Rgb24(ColorOrder),
    /// 32bpp, alpha in the last byte (always written opaque)
    Rgb32(ColorOrder),
}

impl PixelFormat {
    /// Pick the format for a bitdepth / color order combination.
    pub fn select(bpp: u32, order: ColorOrder) -> Result<Self> {
        match bpp {
            4 => Ok(PixelFormat::Gray4),
            8 => Ok(PixelFormat::Gray8),
            16 => Ok(PixelFormat::Rgb565),
            24 => Ok(PixelFormat::Rgb24(order)),
            32 => Ok(PixelFormat::Rgb32(order)),
            other => Err(FbError::UnsupportedMode(format!("{other}bpp"))),
        }
    }

    /// Bits per pixel
    pub const fn bpp(self) -> u32 {
        match self {
            PixelFormat::Gray4 => 4,
            PixelFormat::Gray8 => 8,
            PixelFormat::Rgb565 => 16,
            PixelFormat::Rgb24(_) => 24,
            PixelFormat::Rgb32(_) => 32,
        }
    }

    /// Whole bytes per pixel, `None` for packed 4bpp
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Gray4 => None,
            PixelFormat::Gray8 => Some(1),
            PixelFormat::Rgb565 => Some(2),
            PixelFormat::Rgb24(_) => Some(3),
            PixelFormat::Rgb32(_) => Some(4),
        }
    }

    /// The color a `set` followed by a `get` gives back.
    pub const fn quantize(self, color: Color) -> Color {
        match self {
            PixelFormat::Gray4 => Color::gray(expand_nibble(color.luma() >> 4)),
            PixelFormat::Gray8 => Color::gray(color.luma()),
            PixelFormat::Rgb565 => unpack_rgb565(pack_rgb565(color)),
            PixelFormat::Rgb24(_) | PixelFormat::Rgb32(_) => color,
        }
    }

    /// Memory representation of one pixel, in its first `bytes_per_pixel` bytes.
    const fn encode(self, color: Color) -> [u8; 4] {
        match self {
            PixelFormat::Gray4 | PixelFormat::Gray8 => [color.luma(), 0, 0, 0],
            PixelFormat::Rgb565 => {
                let [lo, hi] = pack_rgb565(color).to_le_bytes();
                [lo, hi, 0, 0]
            }
            PixelFormat::Rgb24(ColorOrder::Bgr) | PixelFormat::Rgb32(ColorOrder::Bgr) => {
                [color.b, color.g, color.r, 0xFF]
            }
            PixelFormat::Rgb24(ColorOrder::Rgb) | PixelFormat::Rgb32(ColorOrder::Rgb) => {
                [color.r, color.g, color.b, 0xFF]
            }
        }
    }
}

impl core::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PixelFormat::Gray4 => f.write_str("Y4"),
            PixelFormat::Gray8 => f.write_str("Y8"),
            PixelFormat::Rgb565 => f.write_str("RGB565"),
            PixelFormat::Rgb24(ColorOrder::Bgr) => f.write_str("BGR24"),
            PixelFormat::Rgb24(ColorOrder::Rgb) => f.write_str("RGB24"),
            PixelFormat::Rgb32(ColorOrder::Bgr) => f.write_str("BGRA"),
            PixelFormat::Rgb32(ColorOrder::Rgb) => f.write_str("RGBA"),
        }
    }
}

#[allow(clippy::arithmetic_side_effects)]
const fn expand_nibble(v: u8) -> u8 {
    // SAFETY: v <= 0xF, 0xF * 0x11 == 0xFF
    (v & 0x0F) * 0x11
}

const fn pack_rgb565(color: Color) -> u16 {
    ((color.r as u16 >> 3) << 11) | ((color.g as u16 >> 2) << 5) | (color.b as u16 >> 3)
}

#[allow(clippy::cast_possible_truncation)]
const fn unpack_rgb565(v: u16) -> Color {
    let r = ((v >> 11) & 0x1F) as u8;
    let g = ((v >> 5) & 0x3F) as u8;
    let b = (v & 0x1F) as u8;
    // Replicate the high bits into the low ones, so 0x1F maps back to 0xFF
    Color::rgb((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
}

/// Get/set strategy for the live format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelAccessor {
    format: PixelFormat,
    line_length: usize,
}

impl PixelAccessor {
    /// Accessor for an explicit format and stride.
    pub const fn new(format: PixelFormat, line_length: usize) -> Self {
        Self {
            format,
            line_length,
        }
    }

    /// Accessor matching a geometry.
    pub fn for_geometry(geometry: &FbGeometry) -> Result<Self> {
        let format = PixelFormat::select(geometry.bpp, geometry.color_order)?;
        let line_length = usize::try_from(geometry.line_length)
            .map_err(|_| FbError::UnsupportedMode(format!("{}b stride", geometry.line_length)))?;
        Ok(Self::new(format, line_length))
    }

    /// Active format
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Stride, in bytes
    pub const fn line_length(&self) -> usize {
        self.line_length
    }

    /// Byte offset of pixel (x, y); for 4bpp, of the byte holding it.
    #[inline]
    #[allow(clippy::arithmetic_side_effects)]
    fn offset(&self, x: usize, y: usize) -> usize {
        // SAFETY: coordinates are in-range per the caller contract, so the offset is bounded by
        // the mapping length, which fits in usize.
        let row = y * self.line_length;
        match self.format {
            PixelFormat::Gray4 => row + (x >> 1),
            PixelFormat::Gray8 => row + x,
            PixelFormat::Rgb565 => row + (x << 1),
            PixelFormat::Rgb24(_) => row + x * 3,
            PixelFormat::Rgb32(_) => row + (x << 2),
        }
    }

    /// Read pixel (x, y).
    ///
    /// # Panics
    /// If (x, y) is outside `buf`.
    #[inline]
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
    pub fn get(&self, buf: &[u8], x: u32, y: u32) -> Color {
        let (x, y) = (x as usize, y as usize);
        let off = self.offset(x, y);
        // SAFETY: indexing panics on out-of-range coordinates; multi-byte offsets are in-range
        // whenever the first byte is, since lines hold whole pixels.
        match self.format {
            PixelFormat::Gray4 => {
                let byte = buf[off];
                let nibble = if x & 1 == 0 { byte >> 4 } else { byte & 0x0F };
                Color::gray(expand_nibble(nibble))
            }
            PixelFormat::Gray8 => Color::gray(buf[off]),
            PixelFormat::Rgb565 => unpack_rgb565(u16::from_le_bytes([buf[off], buf[off + 1]])),
            PixelFormat::Rgb24(order) | PixelFormat::Rgb32(order) => {
                let (c0, c1, c2) = (buf[off], buf[off + 1], buf[off + 2]);
                match order {
                    ColorOrder::Bgr => Color::rgb(c2, c1, c0),
                    ColorOrder::Rgb => Color::rgb(c0, c1, c2),
                }
            }
        }
    }

    /// Write pixel (x, y). At 4bpp the sibling pixel sharing the byte is preserved.
    ///
    /// # Panics
    /// If (x, y) is outside `buf`.
    #[inline]
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
    pub fn set(&self, buf: &mut [u8], x: u32, y: u32, color: Color) {
        let (x, y) = (x as usize, y as usize);
        let off = self.offset(x, y);
        let px = self.format.encode(color);
        match self.format {
            PixelFormat::Gray4 => {
                let v = px[0];
                let byte = &mut buf[off];
                *byte = if x & 1 == 0 {
                    (*byte & 0x0F) | (v & 0xF0)
                } else {
                    (*byte & 0xF0) | (v >> 4)
                };
            }
            PixelFormat::Gray8 => buf[off] = px[0],
            PixelFormat::Rgb565 => buf[off..off + 2].copy_from_slice(&px[..2]),
            PixelFormat::Rgb24(_) => buf[off..off + 3].copy_from_slice(&px[..3]),
            PixelFormat::Rgb32(_) => buf[off..off + 4].copy_from_slice(&px),
        }
    }

    /// Fill a rectangle with `color`. Whole rows are written in bulk at 8bpp and up.
    ///
    /// # Panics
    /// If the rectangle is outside `buf`.
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]
    pub fn fill_rect(&self, buf: &mut [u8], left: u32, top: u32, width: u32, height: u32, color: Color) {
        if width == 0 || height == 0 {
            return;
        }
        let Some(bytes_pp) = self.format.bytes_per_pixel() else {
            for y in top..top + height {
                for x in left..left + width {
                    self.set(buf, x, y, color);
                }
            }
            return;
        };

        let px = self.format.encode(color);
        let px = &px[..bytes_pp];
        let row_len = width as usize * bytes_pp;
        for y in top..top + height {
            let start = self.offset(left as usize, y as usize);
            let row = &mut buf[start..start + row_len];
            if bytes_pp == 1 {
                row.fill(px[0]);
            } else {
                for dst in row.chunks_exact_mut(bytes_pp) {
                    dst.copy_from_slice(px);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(accessor: &PixelAccessor, height: usize) -> Vec<u8> {
        vec![0; accessor.line_length() * height]
    }

    #[test]
    fn test_luma_is_exact_for_grays() {
        for y in 0..=255u8 {
            assert_eq!(Color::gray(y).luma(), y);
        }
        assert_eq!(Color::rgb(255, 0, 0).luma(), 76);
    }

    #[test]
    fn test_gray4_preserves_sibling() {
        let acc = PixelAccessor::new(PixelFormat::Gray4, 8);
        let mut buf = buffer(&acc, 2);
        acc.set(&mut buf, 2, 1, Color::WHITE);
        acc.set(&mut buf, 3, 1, Color::gray(0x55));
        assert_eq!(buf[9], 0xF5);
        assert_eq!(acc.get(&buf, 2, 1), Color::WHITE);
        assert_eq!(acc.get(&buf, 3, 1), Color::gray(0x55));

        acc.set(&mut buf, 2, 1, Color::BLACK);
        assert_eq!(buf[9], 0x05);
    }

    #[test]
    fn test_rgb565_packing() {
        let acc = PixelAccessor::new(PixelFormat::Rgb565, 16);
        let mut buf = buffer(&acc, 1);
        acc.set(&mut buf, 1, 0, Color::rgb(0xFF, 0x00, 0xFF));
        assert_eq!(&buf[2..4], &[0x1F, 0xF8]);
        assert_eq!(acc.get(&buf, 1, 0), Color::rgb(0xFF, 0x00, 0xFF));
        assert_eq!(
            PixelFormat::Rgb565.quantize(Color::rgb(0x12, 0x34, 0x56)),
            Color::rgb(0x10, 0x34, 0x52)
        );
    }

    #[test]
    fn test_bgra_order() {
        let acc = PixelAccessor::new(PixelFormat::Rgb32(ColorOrder::Bgr), 16);
        let mut buf = buffer(&acc, 1);
        acc.set(&mut buf, 0, 0, Color::rgb(1, 2, 3));
        assert_eq!(&buf[..4], &[3, 2, 1, 0xFF]);

        let acc = PixelAccessor::new(PixelFormat::Rgb32(ColorOrder::Rgb), 16);
        acc.set(&mut buf, 0, 0, Color::rgb(1, 2, 3));
        assert_eq!(&buf[..4], &[1, 2, 3, 0xFF]);
        assert_eq!(acc.get(&buf, 0, 0), Color::rgb(1, 2, 3));
    }

    #[test]
    fn test_rgb24_is_packed() {
        let acc = PixelAccessor::new(PixelFormat::Rgb24(ColorOrder::Bgr), 12);
        let mut buf = buffer(&acc, 1);
        acc.set(&mut buf, 1, 0, Color::rgb(9, 8, 7));
        assert_eq!(&buf[3..6], &[7, 8, 9]);
        assert_eq!(acc.get(&buf, 1, 0), Color::rgb(9, 8, 7));
    }

    #[test]
    fn test_fill_rect() {
        for format in [
            PixelFormat::Gray4,
            PixelFormat::Gray8,
            PixelFormat::Rgb565,
            PixelFormat::Rgb24(ColorOrder::Rgb),
            PixelFormat::Rgb32(ColorOrder::Bgr),
        ] {
            let acc = PixelAccessor::new(format, 64);
            let mut buf = buffer(&acc, 8);
            let color = format.quantize(Color::gray(0x80));
            acc.fill_rect(&mut buf, 1, 2, 3, 4, color);
            assert_eq!(acc.get(&buf, 1, 2), color, "{format}");
            assert_eq!(acc.get(&buf, 3, 5), color, "{format}");
            assert_eq!(acc.get(&buf, 0, 2), format.quantize(Color::BLACK), "{format}");
            assert_eq!(acc.get(&buf, 4, 5), format.quantize(Color::BLACK), "{format}");
            assert_eq!(acc.get(&buf, 1, 6), format.quantize(Color::BLACK), "{format}");
        }
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_panics() {
        let acc = PixelAccessor::new(PixelFormat::Gray8, 4);
        let buf = buffer(&acc, 4);
        let _ = acc.get(&buf, 0, 4);
    }

    #[test]
    fn test_select() {
        assert_eq!(PixelFormat::select(4, ColorOrder::Bgr).unwrap(), PixelFormat::Gray4);
        assert!(PixelFormat::select(12, ColorOrder::Bgr).is_err());
    }
}
