//! Legacy Kindle einkfb driver (K2, DX, K3, K4)
//!
//! Based on `include/linux/einkfb.h` from the Lab126 Linux 2.6.26/2.6.31 sources.

use nix::{ioctl_read_bad, ioctl_write_int_bad, ioctl_write_ptr_bad};

pub const FBIO_EINK_UPDATE_DISPLAY: u32 = 0x46db;
pub const FBIO_EINK_UPDATE_DISPLAY_AREA: u32 = 0x46dd;
pub const FBIO_EINK_SET_DISPLAY_ORIENTATION: u32 = 0x46f0;
pub const FBIO_EINK_GET_DISPLAY_ORIENTATION: u32 = 0x46f1;

// fx_type
pub const FX_UPDATE_PARTIAL: libc::c_int = 0;
pub const FX_UPDATE_FULL: libc::c_int = 1;

// orientation_t
pub const ORIENTATION_PORTRAIT: libc::c_int = 0;
pub const ORIENTATION_PORTRAIT_UPSIDE_DOWN: libc::c_int = 1;
pub const ORIENTATION_LANDSCAPE: libc::c_int = 2;
pub const ORIENTATION_LANDSCAPE_UPSIDE_DOWN: libc::c_int = 3;

/// `update_area_t`. The rectangle is given as two corners, `x2`/`y2` exclusive.
///
/// `buffer` is always NULL (update from the framebuffer itself); kept pointer-sized.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateArea {
    pub x1: libc::c_int,
    pub y1: libc::c_int,
    pub x2: libc::c_int,
    pub y2: libc::c_int,
    pub which_fx: libc::c_int,
    pub buffer: usize,
}

ioctl_write_int_bad!(fbio_eink_update_display, FBIO_EINK_UPDATE_DISPLAY);
ioctl_write_ptr_bad!(fbio_eink_update_display_area, FBIO_EINK_UPDATE_DISPLAY_AREA, UpdateArea);
ioctl_write_int_bad!(fbio_eink_set_display_orientation, FBIO_EINK_SET_DISPLAY_ORIENTATION);
ioctl_read_bad!(
    fbio_eink_get_display_orientation,
    FBIO_EINK_GET_DISPLAY_ORIENTATION,
    libc::c_int
);

/// einkfb orientation → linuxfb rotation code
pub const fn orientation_to_rotate(orientation: libc::c_int) -> Option<u32> {
    match orientation {
        ORIENTATION_PORTRAIT => Some(super::fb::FB_ROTATE_UR),
        ORIENTATION_PORTRAIT_UPSIDE_DOWN => Some(super::fb::FB_ROTATE_UD),
        ORIENTATION_LANDSCAPE => Some(super::fb::FB_ROTATE_CW),
        ORIENTATION_LANDSCAPE_UPSIDE_DOWN => Some(super::fb::FB_ROTATE_CCW),
        _ => None,
    }
}

/// linuxfb rotation code → einkfb orientation
pub const fn rotate_to_orientation(rotate: u32) -> Option<libc::c_int> {
    match rotate {
        super::fb::FB_ROTATE_UR => Some(ORIENTATION_PORTRAIT),
        super::fb::FB_ROTATE_UD => Some(ORIENTATION_PORTRAIT_UPSIDE_DOWN),
        super::fb::FB_ROTATE_CW => Some(ORIENTATION_LANDSCAPE),
        super::fb::FB_ROTATE_CCW => Some(ORIENTATION_LANDSCAPE_UPSIDE_DOWN),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_round_trip() {
        for rotate in 0..4 {
            let orientation = rotate_to_orientation(rotate).unwrap();
            assert_eq!(orientation_to_rotate(orientation), Some(rotate));
        }
        assert_eq!(orientation_to_rotate(ORIENTATION_LANDSCAPE), Some(1));
        assert_eq!(rotate_to_orientation(4), None);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_update_area_layout() {
        assert_eq!(core::mem::size_of::<UpdateArea>(), 24);
    }
}
