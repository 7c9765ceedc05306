//! i.MX EPDC (mxcfb) update requests
//!
//! Every vendor forked `include/uapi/linux/mxcfb.h`, so the update struct comes in seven
//! layouts, all sent through `_IOW('F', 0x2E, ...)`. The request code embeds the struct size,
//! which is how the kernel tells them apart.

use nix::{
    ioctl_readwrite, ioctl_write_ptr, ioctl_write_ptr_bad, request_code_write,
};

pub const UPDATE_MODE_PARTIAL: u32 = 0x0;
pub const UPDATE_MODE_FULL: u32 = 0x1;

pub const TEMP_USE_AMBIENT: libc::c_int = 0x1000;
// Kindle mxcfb only; Zelda & Rex went back to TEMP_USE_AMBIENT
pub const TEMP_USE_AUTO: libc::c_int = 0x1001;

pub const EPDC_FLAG_ENABLE_INVERSION: libc::c_uint = 0x01;
pub const EPDC_FLAG_FORCE_MONOCHROME: libc::c_uint = 0x02;
pub const EPDC_FLAG_USE_CMAP: libc::c_uint = 0x04;
pub const EPDC_FLAG_USE_ALT_BUFFER: libc::c_uint = 0x100;
pub const EPDC_FLAG_TEST_COLLISION: libc::c_uint = 0x200;
pub const EPDC_FLAG_GROUP_UPDATE: libc::c_uint = 0x400;
// NTX
pub const EPDC_FLAG_USE_AAD: libc::c_uint = 0x1000;
// Kindle mxcfb
pub const EPDC_FLAG_USE_REAGLD: libc::c_uint = 0x1000;
// Kindle Zelda & Rex
pub const EPDC_FLAG_USE_ZELDA_REGAL: libc::c_uint = 0x8000;
// mxcfb v2
pub const EPDC_FLAG_USE_REGAL: libc::c_uint = 0x8000;
// Kindle MTK hwtcon
pub const MTK_EPDC_FLAG_USE_REGAL: libc::c_uint = 0x8000;
pub const EPDC_FLAG_USE_DITHERING_Y1: libc::c_uint = 0x2000;
pub const MTK_EPDC_FLAG_USE_DITHERING_Y4: libc::c_uint = 0x4000;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbRect {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbAltBufferData {
    pub phys_addr: u32,
    pub width: u32,
    pub height: u32,
    pub alt_update_region: MxcfbRect,
}

/// NTX flavor, with a leading `void *virt_addr`.
///
/// The pointer is never set; it is kept as a pointer-sized integer so the update structs
/// stay `Send`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbAltBufferDataNtx {
    pub virt_addr: usize,
    pub phys_addr: u32,
    pub width: u32,
    pub height: u32,
    pub alt_update_region: MxcfbRect,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateMarkerData {
    pub update_marker: u32,
    pub collision_test: u32,
}

/// Kindle Touch through Oasis
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateDataKindle {
    pub update_region: MxcfbRect,
    pub waveform_mode: u32,
    pub update_mode: u32,
    pub update_marker: u32,
    pub hist_bw_waveform_mode: u32,
    pub hist_gray_waveform_mode: u32,
    pub temp: libc::c_int,
    pub flags: libc::c_uint,
    pub alt_buffer_data: MxcfbAltBufferData,
}

/// Kindle Oasis 2 & 3
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateDataZelda {
    pub update_region: MxcfbRect,
    pub waveform_mode: u32,
    pub update_mode: u32,
    pub update_marker: u32,
    pub temp: libc::c_int,
    pub flags: libc::c_uint,
    pub dither_mode: libc::c_int,
    pub quant_bit: libc::c_int,
    pub alt_buffer_data: MxcfbAltBufferData,
    pub hist_bw_waveform_mode: u32,
    pub hist_gray_waveform_mode: u32,
    pub ts_pxp: u32,
    pub ts_epdc: u32,
}

/// Kindle PaperWhite 4 & Basic 3: Zelda minus the timestamps
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateDataRex {
    pub update_region: MxcfbRect,
    pub waveform_mode: u32,
    pub update_mode: u32,
    pub update_marker: u32,
    pub temp: libc::c_int,
    pub flags: libc::c_uint,
    pub dither_mode: libc::c_int,
    pub quant_bit: libc::c_int,
    pub alt_buffer_data: MxcfbAltBufferData,
    pub hist_bw_waveform_mode: u32,
    pub hist_gray_waveform_mode: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbSwipeData {
    pub direction: u32,
    pub steps: u32,
}

/// Kindle PaperWhite 5 & Basic 4 (MediaTek hwtcon): Zelda with swipe data
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateDataMtk {
    pub update_region: MxcfbRect,
    pub waveform_mode: u32,
    pub update_mode: u32,
    pub update_marker: u32,
    pub temp: libc::c_int,
    pub flags: libc::c_uint,
    pub dither_mode: libc::c_int,
    pub quant_bit: libc::c_int,
    pub alt_buffer_data: MxcfbAltBufferData,
    pub swipe_data: MxcfbSwipeData,
    pub hist_bw_waveform_mode: u32,
    pub hist_gray_waveform_mode: u32,
    pub ts_pxp: u32,
    pub ts_epdc: u32,
}

/// Kobo Mk. 3 - 6
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateDataV1Ntx {
    pub update_region: MxcfbRect,
    pub waveform_mode: u32,
    pub update_mode: u32,
    pub update_marker: u32,
    pub temp: libc::c_int,
    pub flags: libc::c_uint,
    pub alt_buffer_data: MxcfbAltBufferDataNtx,
}

/// Cervantes, PocketBook
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateDataV1 {
    pub update_region: MxcfbRect,
    pub waveform_mode: u32,
    pub update_mode: u32,
    pub update_marker: u32,
    pub temp: libc::c_int,
    pub flags: libc::c_uint,
    pub alt_buffer_data: MxcfbAltBufferData,
}

/// Kobo Mk. 7+, reMarkable, mainline
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MxcfbUpdateDataV2 {
    pub update_region: MxcfbRect,
    pub waveform_mode: u32,
    pub update_mode: u32,
    pub update_marker: u32,
    pub temp: libc::c_int,
    pub flags: libc::c_uint,
    pub dither_mode: libc::c_int,
    pub quant_bit: libc::c_int,
    pub alt_buffer_data: MxcfbAltBufferData,
}

const MXCFB_MAGIC: u8 = b'F';
const MXCFB_SEND_UPDATE: u8 = 0x2E;
const MXCFB_WAIT_FOR_UPDATE_COMPLETE: u8 = 0x2F;
const MXCFB_WAIT_FOR_UPDATE_SUBMISSION: u8 = 0x37;

ioctl_write_ptr!(mxcfb_send_update_kindle, MXCFB_MAGIC, MXCFB_SEND_UPDATE, MxcfbUpdateDataKindle);
ioctl_write_ptr!(mxcfb_send_update_zelda, MXCFB_MAGIC, MXCFB_SEND_UPDATE, MxcfbUpdateDataZelda);
ioctl_write_ptr!(mxcfb_send_update_rex, MXCFB_MAGIC, MXCFB_SEND_UPDATE, MxcfbUpdateDataRex);
ioctl_write_ptr!(mxcfb_send_update_mtk, MXCFB_MAGIC, MXCFB_SEND_UPDATE, MxcfbUpdateDataMtk);
ioctl_write_ptr!(mxcfb_send_update_v1_ntx, MXCFB_MAGIC, MXCFB_SEND_UPDATE, MxcfbUpdateDataV1Ntx);
ioctl_write_ptr!(mxcfb_send_update_v1, MXCFB_MAGIC, MXCFB_SEND_UPDATE, MxcfbUpdateDataV1);
ioctl_write_ptr!(mxcfb_send_update_v2, MXCFB_MAGIC, MXCFB_SEND_UPDATE, MxcfbUpdateDataV2);

// Kindle (non-Pearl), Zelda, Rex, MTK, mxcfb v2
ioctl_readwrite!(
    mxcfb_wait_for_update_complete,
    MXCFB_MAGIC,
    MXCFB_WAIT_FOR_UPDATE_COMPLETE,
    MxcfbUpdateMarkerData
);
// Kindle Pearl, NTX, Cervantes
ioctl_write_ptr!(
    mxcfb_wait_for_update_complete_u32,
    MXCFB_MAGIC,
    MXCFB_WAIT_FOR_UPDATE_COMPLETE,
    u32
);
// PocketBook: the request code says u32, the kernel reads a marker_data
ioctl_write_ptr_bad!(
    mxcfb_wait_for_update_complete_pb,
    request_code_write!(MXCFB_MAGIC, MXCFB_WAIT_FOR_UPDATE_COMPLETE, core::mem::size_of::<u32>()),
    MxcfbUpdateMarkerData
);
ioctl_write_ptr!(
    mxcfb_wait_for_update_submission,
    MXCFB_MAGIC,
    MXCFB_WAIT_FOR_UPDATE_SUBMISSION,
    u32
);

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{offset_of, size_of};

    #[test]
    fn test_common_layouts() {
        assert_eq!(size_of::<MxcfbRect>(), 16);
        assert_eq!(size_of::<MxcfbAltBufferData>(), 28);
        assert_eq!(size_of::<MxcfbUpdateMarkerData>(), 8);
    }

    #[test]
    fn test_kindle_layouts() {
        assert_eq!(size_of::<MxcfbUpdateDataKindle>(), 72);
        assert_eq!(offset_of!(MxcfbUpdateDataKindle, hist_bw_waveform_mode), 28);
        assert_eq!(offset_of!(MxcfbUpdateDataKindle, temp), 36);

        assert_eq!(size_of::<MxcfbUpdateDataZelda>(), 88);
        assert_eq!(offset_of!(MxcfbUpdateDataZelda, dither_mode), 36);
        assert_eq!(offset_of!(MxcfbUpdateDataZelda, hist_bw_waveform_mode), 72);

        assert_eq!(size_of::<MxcfbUpdateDataRex>(), 80);
    }

    #[test]
    fn test_mtk_layout() {
        assert_eq!(size_of::<MxcfbSwipeData>(), 8);
        assert_eq!(size_of::<MxcfbUpdateDataMtk>(), 96);
        assert_eq!(offset_of!(MxcfbUpdateDataMtk, flags), 32);
        assert_eq!(offset_of!(MxcfbUpdateDataMtk, alt_buffer_data), 44);
        assert_eq!(offset_of!(MxcfbUpdateDataMtk, swipe_data), 72);
        assert_eq!(offset_of!(MxcfbUpdateDataMtk, hist_bw_waveform_mode), 80);
        assert_eq!(offset_of!(MxcfbUpdateDataMtk, ts_epdc), 92);
        assert_eq!(
            request_code_write!(b'F', 0x2E, size_of::<MxcfbUpdateDataMtk>()) as u32,
            0x4060_462E
        );
    }

    #[test]
    fn test_mxcfb_layouts() {
        assert_eq!(size_of::<MxcfbUpdateDataV1>(), 64);
        assert_eq!(size_of::<MxcfbUpdateDataV2>(), 72);
        assert_eq!(offset_of!(MxcfbUpdateDataV2, quant_bit), 40);
        assert_eq!(offset_of!(MxcfbUpdateDataV2, alt_buffer_data), 44);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_ntx_layout_lp64() {
        assert_eq!(size_of::<MxcfbAltBufferDataNtx>(), 40);
        assert_eq!(offset_of!(MxcfbUpdateDataV1Ntx, alt_buffer_data), 40);
        assert_eq!(size_of::<MxcfbUpdateDataV1Ntx>(), 80);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_ntx_layout_ilp32() {
        assert_eq!(size_of::<MxcfbAltBufferDataNtx>(), 32);
        assert_eq!(size_of::<MxcfbUpdateDataV1Ntx>(), 68);
    }

    #[test]
    fn test_request_codes() {
        // _IOW('F', 0x2E, struct mxcfb_update_data) on a Kobo Mk. 7
        assert_eq!(
            request_code_write!(b'F', 0x2E, size_of::<MxcfbUpdateDataV2>()) as u32,
            0x4048_462E
        );
        // _IOW('F', 0x37, uint32_t)
        assert_eq!(request_code_write!(b'F', 0x37, size_of::<u32>()) as u32, 0x4004_4637);
    }
}
