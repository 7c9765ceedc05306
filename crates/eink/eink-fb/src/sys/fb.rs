//! linuxfb screen info
//!
//! Based on `include/uapi/linux/fb.h`.

use nix::{ioctl_read_bad, ioctl_readwrite_bad};

pub const FBIOGET_VSCREENINFO: u32 = 0x4600;
pub const FBIOPUT_VSCREENINFO: u32 = 0x4601;
pub const FBIOGET_FSCREENINFO: u32 = 0x4602;

pub const FB_ROTATE_UR: u32 = 0;
pub const FB_ROTATE_CW: u32 = 1;
pub const FB_ROTATE_UD: u32 = 2;
pub const FB_ROTATE_CCW: u32 = 3;

/// Apply the new mode right away
pub const FB_ACTIVATE_NOW: u32 = 0;
/// Apply even if nothing changed
pub const FB_ACTIVATE_FORCE: u32 = 128;

/// `grayscale` value for plain 8bpp grayscale
pub const GRAYSCALE_8BIT: u32 = 0x1;
/// `grayscale` value for inverted 8bpp grayscale (EPDC-side inversion)
pub const GRAYSCALE_8BIT_INVERTED: u32 = 0x2;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbVarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbFixScreenInfo {
    // Identification string, e.g. "mxc_epdc_fb"
    pub id: [u8; 16],
    // Start of frame buffer mem (physical address)
    pub smem_start: libc::c_ulong,
    // Length of frame buffer mem
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    // Length of a line in bytes
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

impl FbFixScreenInfo {
    /// Driver id, up to the first NUL.
    pub fn id_str(&self) -> &str {
        let len = self.id.iter().position(|&b| b == 0).unwrap_or(self.id.len());
        self.id
            .get(..len)
            .and_then(|id| core::str::from_utf8(id).ok())
            .unwrap_or("")
    }
}

ioctl_read_bad!(fbioget_vscreeninfo, FBIOGET_VSCREENINFO, FbVarScreenInfo);
// The kernel writes the mode it actually applied back into the struct.
ioctl_readwrite_bad!(fbioput_vscreeninfo, FBIOPUT_VSCREENINFO, FbVarScreenInfo);
ioctl_read_bad!(fbioget_fscreeninfo, FBIOGET_FSCREENINFO, FbFixScreenInfo);

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{offset_of, size_of};

    #[test]
    fn test_var_screeninfo_layout() {
        assert_eq!(size_of::<FbBitfield>(), 12);
        assert_eq!(size_of::<FbVarScreenInfo>(), 160);
        assert_eq!(offset_of!(FbVarScreenInfo, bits_per_pixel), 24);
        assert_eq!(offset_of!(FbVarScreenInfo, red), 32);
        assert_eq!(offset_of!(FbVarScreenInfo, rotate), 136);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_fix_screeninfo_layout_lp64() {
        assert_eq!(size_of::<FbFixScreenInfo>(), 80);
        assert_eq!(offset_of!(FbFixScreenInfo, smem_len), 24);
        assert_eq!(offset_of!(FbFixScreenInfo, line_length), 48);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_fix_screeninfo_layout_ilp32() {
        assert_eq!(size_of::<FbFixScreenInfo>(), 68);
        assert_eq!(offset_of!(FbFixScreenInfo, smem_len), 20);
        assert_eq!(offset_of!(FbFixScreenInfo, line_length), 44);
    }

    #[test]
    fn test_id_str() {
        let mut fix = FbFixScreenInfo::default();
        fix.id[..11].copy_from_slice(b"mxc_epdc_fb");
        assert_eq!(fix.id_str(), "mxc_epdc_fb");
    }
}
