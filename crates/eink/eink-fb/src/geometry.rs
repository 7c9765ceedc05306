//! Live framebuffer geometry
//!
//! [`FbGeometry`] mirrors the parts of the var/fix screen info every draw and refresh needs,
//! plus the viewport (the visible area once bezel-covered rows are excluded). Only a reinit
//! replaces it.

use eink_specs::DeviceQuirks;
use serde::{Deserialize, Serialize};

use crate::error::{FbError, Result};
use crate::sys::{FbFixScreenInfo, FbVarScreenInfo};

/// Component order of 24/32bpp pixels in memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    /// B, G, R(, A): `red.offset == 16`, the usual case on i.MX
    #[default]
    Bgr,
    /// R, G, B(, A): `red.offset == 0`
    Rgb,
}

impl ColorOrder {
    /// Derive the order from the red channel's bit offset.
    pub const fn from_red_offset(offset: u32) -> Self {
        if offset == 0 {
            ColorOrder::Rgb
        } else {
            ColorOrder::Bgr
        }
    }
}

/// Snapshot of the framebuffer layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbGeometry {
    /// Visible width, in pixels
    pub xres: u32,
    /// Visible height, in pixels
    pub yres: u32,
    /// Virtual width
    pub xres_virtual: u32,
    /// Virtual height
    pub yres_virtual: u32,
    /// Bits per pixel
    pub bpp: u32,
    /// Native rotation code
    pub rotate: u32,
    /// `grayscale` field (0, `GRAYSCALE_8BIT`, `GRAYSCALE_8BIT_INVERTED`)
    pub grayscale: u32,
    /// Stride, in bytes
    pub line_length: u32,
    /// Length of the framebuffer memory
    pub smem_len: u32,
    /// Component order at 24/32bpp
    pub color_order: ColorOrder,
    /// Pixels of padding at the end of each line
    pub scanline_padding: u32,
    /// Viewport left edge
    pub view_hori_origin: u32,
    /// Viewport top edge
    pub view_vert_origin: u32,
    /// Viewport width
    pub view_width: u32,
    /// Viewport height
    pub view_height: u32,
}

/// Bitdepths the pixel accessors can drive
pub const SUPPORTED_BPP: [u32; 5] = [4, 8, 16, 24, 32];

impl FbGeometry {
    /// Build from fresh screen info, applying the device's viewport offsets.
    ///
    /// The vertical offset follows the panel's long edge: it shifts rows in a portrait
    /// layout, and columns once the framebuffer is rotated to landscape.
    pub fn from_screeninfo(
        var: &FbVarScreenInfo,
        fix: &FbFixScreenInfo,
        quirks: &DeviceQuirks,
    ) -> Result<Self> {
        if !SUPPORTED_BPP.contains(&var.bits_per_pixel) {
            return Err(FbError::UnsupportedMode(format!(
                "{}bpp",
                var.bits_per_pixel
            )));
        }
        if var.xres == 0 || var.yres == 0 {
            return Err(FbError::UnsupportedMode(format!(
                "{}x{} resolution",
                var.xres, var.yres
            )));
        }

        let stride_px = fix
            .line_length
            .checked_mul(8)
            .and_then(|bits| bits.checked_div(var.bits_per_pixel))
            .unwrap_or(0);

        let mut geometry = Self {
            xres: var.xres,
            yres: var.yres,
            xres_virtual: var.xres_virtual,
            yres_virtual: var.yres_virtual,
            bpp: var.bits_per_pixel,
            rotate: var.rotate,
            grayscale: var.grayscale,
            line_length: fix.line_length,
            smem_len: fix.smem_len,
            color_order: ColorOrder::from_red_offset(var.red.offset),
            scanline_padding: stride_px.saturating_sub(var.xres),
            view_hori_origin: 0,
            view_vert_origin: 0,
            view_width: var.xres,
            view_height: var.yres,
        };
        geometry.apply_offsets(quirks);
        Ok(geometry)
    }

    fn apply_offsets(&mut self, quirks: &DeviceQuirks) {
        let landscape = self.is_landscape();
        let (origin, extent) = if landscape {
            (&mut self.view_hori_origin, &mut self.view_width)
        } else {
            (&mut self.view_vert_origin, &mut self.view_height)
        };
        let offset = quirks.view_vert_offset.unsigned_abs().into();
        if quirks.view_vert_offset > 0 {
            // Leading rows hidden: shift the origin
            *origin = offset;
            *extent = extent.saturating_sub(offset);
        } else if quirks.view_vert_offset < 0 {
            // Trailing rows hidden: shrink only
            *extent = extent.saturating_sub(offset);
        }

        let hori: u32 = quirks.view_hori_offset.unsigned_abs().into();
        if quirks.view_hori_offset > 0 {
            self.view_hori_origin = self.view_hori_origin.saturating_add(hori);
            self.view_width = self.view_width.saturating_sub(hori);
        } else if quirks.view_hori_offset < 0 {
            self.view_width = self.view_width.saturating_sub(hori);
        }
    }

    /// Wider than tall
    pub const fn is_landscape(&self) -> bool {
        self.xres > self.yres
    }

    /// Whether the viewport differs from the full screen
    pub const fn has_viewport_offset(&self) -> bool {
        self.view_hori_origin != 0
            || self.view_vert_origin != 0
            || self.view_width != self.xres
            || self.view_height != self.yres
    }

    /// Bytes needed to hold every visible line
    pub fn visible_len(&self) -> usize {
        let lines = usize::try_from(self.yres).unwrap_or(usize::MAX);
        let stride = usize::try_from(self.line_length).unwrap_or(usize::MAX);
        lines.saturating_mul(stride)
    }
}

/// What a reinit changed, as a set of flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReinitChanges(u8);

impl ReinitChanges {
    /// No change
    pub const NONE: Self = Self(0);
    /// Bitdepth changed
    pub const BPP: Self = Self(1 << 0);
    /// Native rotation changed
    pub const ROTATION: Self = Self(1 << 1);
    /// Portrait ↔ landscape swap
    pub const LAYOUT: Self = Self(1 << 2);
    /// Grayscale flag changed
    pub const GRAYSCALE: Self = Self(1 << 3);

    /// Compare two geometries.
    pub fn between(old: &FbGeometry, new: &FbGeometry) -> Self {
        let mut changes = Self::NONE;
        if old.bpp != new.bpp {
            changes = changes | Self::BPP;
        }
        if old.rotate != new.rotate {
            changes = changes | Self::ROTATION;
        }
        if old.is_landscape() != new.is_landscape() {
            changes = changes | Self::LAYOUT;
        }
        if old.grayscale != new.grayscale {
            changes = changes | Self::GRAYSCALE;
        }
        changes
    }

    /// All flags of `other` are set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// No flag set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl core::ops::BitOr for ReinitChanges {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::fmt::Display for ReinitChanges {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names = [
            (Self::BPP, "bitdepth"),
            (Self::ROTATION, "rotation"),
            (Self::LAYOUT, "layout"),
            (Self::GRAYSCALE, "grayscale"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eink_specs::devices::{kobo, lookup};

    fn screeninfo(xres: u32, yres: u32, bpp: u32) -> (FbVarScreenInfo, FbFixScreenInfo) {
        let var = FbVarScreenInfo {
            xres,
            yres,
            xres_virtual: xres,
            yres_virtual: yres * 2,
            bits_per_pixel: bpp,
            ..Default::default()
        };
        let fix = FbFixScreenInfo {
            line_length: (xres + 32) * bpp / 8,
            smem_len: (xres + 32) * bpp / 8 * yres * 2,
            ..Default::default()
        };
        (var, fix)
    }

    #[test]
    fn test_plain_geometry() {
        let (var, fix) = screeninfo(1072, 1448, 8);
        let g = FbGeometry::from_screeninfo(&var, &fix, &DeviceQuirks::GENERIC).unwrap();
        assert_eq!(g.scanline_padding, 32);
        assert_eq!(g.view_width, 1072);
        assert_eq!(g.view_height, 1448);
        assert!(!g.has_viewport_offset());
        assert_eq!(g.color_order, ColorOrder::Rgb);
    }

    #[test]
    fn test_aura_hides_bottom_rows() {
        let aura = lookup(kobo::KOBO_MODELS, 360).unwrap();
        let (var, fix) = screeninfo(758, 1024, 16);
        let g = FbGeometry::from_screeninfo(&var, &fix, &aura).unwrap();
        assert_eq!(g.view_vert_origin, 0);
        assert_eq!(g.view_height, 1014);
    }

    #[test]
    fn test_h2o_hides_top_rows() {
        let h2o = lookup(kobo::KOBO_MODELS, 370).unwrap();
        let (var, fix) = screeninfo(1080, 1440, 16);
        let g = FbGeometry::from_screeninfo(&var, &fix, &h2o).unwrap();
        assert_eq!(g.view_vert_origin, 11);
        assert_eq!(g.view_height, 1429);

        // Landscape: the offset moves to the horizontal axis
        let (var, fix) = screeninfo(1440, 1080, 16);
        let g = FbGeometry::from_screeninfo(&var, &fix, &h2o).unwrap();
        assert_eq!(g.view_hori_origin, 11);
        assert_eq!(g.view_width, 1429);
        assert_eq!(g.view_height, 1080);
    }

    #[test]
    fn test_rejects_unknown_depth() {
        let (var, fix) = screeninfo(600, 800, 2);
        assert!(FbGeometry::from_screeninfo(&var, &fix, &DeviceQuirks::GENERIC).is_err());
    }

    #[test]
    fn test_reinit_changes() {
        let (var, fix) = screeninfo(1072, 1448, 8);
        let old = FbGeometry::from_screeninfo(&var, &fix, &DeviceQuirks::GENERIC).unwrap();
        let (mut var, fix) = screeninfo(1448, 1072, 32);
        var.rotate = 1;
        let new = FbGeometry::from_screeninfo(&var, &fix, &DeviceQuirks::GENERIC).unwrap();

        let changes = ReinitChanges::between(&old, &new);
        assert!(changes.contains(ReinitChanges::BPP | ReinitChanges::ROTATION));
        assert!(changes.contains(ReinitChanges::LAYOUT));
        assert!(!changes.contains(ReinitChanges::GRAYSCALE));
        assert_eq!(changes.to_string(), "bitdepth | rotation | layout");
        assert!(ReinitChanges::between(&old, &old).is_empty());
    }
}
