//! Kernel framebuffer seam
//!
//! [`FbBackend`] is everything the session asks of the kernel: screen info, the EPDC update
//! and wait requests, the legacy orientation pair, a text control channel, and the mapped
//! pixel memory. [`crate::linux::LinuxFramebuffer`] talks to a real `/dev/fbN`; the emulator
//! crate provides a simulated one.

use std::path::Path;

use crate::error::FbError;
use crate::sys::einkfb::UpdateArea;
use crate::sys::mxcfb::{
    MxcfbRect, MxcfbUpdateDataKindle, MxcfbUpdateDataMtk, MxcfbUpdateDataRex, MxcfbUpdateDataV1,
    MxcfbUpdateDataV1Ntx, MxcfbUpdateDataV2, MxcfbUpdateDataZelda,
};
use crate::sys::{FbFixScreenInfo, FbVarScreenInfo};

/// A fully built refresh request, in its kernel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePayload {
    /// Kindle mxcfb
    Kindle(MxcfbUpdateDataKindle),
    /// Kindle Oasis 2/3
    Zelda(MxcfbUpdateDataZelda),
    /// Kindle PW4 / Basic 3
    Rex(MxcfbUpdateDataRex),
    /// Kindle MediaTek hwtcon (PW5 / Basic 4)
    Mtk(MxcfbUpdateDataMtk),
    /// Kobo NTX mxcfb v1
    V1Ntx(MxcfbUpdateDataV1Ntx),
    /// Stock mxcfb v1
    V1(MxcfbUpdateDataV1),
    /// mxcfb v2
    V2(MxcfbUpdateDataV2),
    /// einkfb full-screen update, carrying the fx
    EinkFbFull(libc::c_int),
    /// einkfb area update
    EinkFbArea(UpdateArea),
}

impl UpdatePayload {
    /// Kernel request name, for error reports
    pub const fn request_name(&self) -> &'static str {
        match self {
            UpdatePayload::EinkFbFull(_) => "FBIO_EINK_UPDATE_DISPLAY",
            UpdatePayload::EinkFbArea(_) => "FBIO_EINK_UPDATE_DISPLAY_AREA",
            _ => "MXCFB_SEND_UPDATE",
        }
    }

    /// Update marker carried by the request (einkfb has none)
    pub const fn marker(&self) -> Option<u32> {
        match self {
            UpdatePayload::Kindle(u) => Some(u.update_marker),
            UpdatePayload::Zelda(u) => Some(u.update_marker),
            UpdatePayload::Rex(u) => Some(u.update_marker),
            UpdatePayload::Mtk(u) => Some(u.update_marker),
            UpdatePayload::V1Ntx(u) => Some(u.update_marker),
            UpdatePayload::V1(u) => Some(u.update_marker),
            UpdatePayload::V2(u) => Some(u.update_marker),
            UpdatePayload::EinkFbFull(_) | UpdatePayload::EinkFbArea(_) => None,
        }
    }

    /// Region, in mxcfb terms. `None` for an einkfb full-screen update.
    #[allow(clippy::cast_sign_loss, clippy::arithmetic_side_effects)]
    pub fn region(&self) -> Option<MxcfbRect> {
        match self {
            UpdatePayload::Kindle(u) => Some(u.update_region),
            UpdatePayload::Zelda(u) => Some(u.update_region),
            UpdatePayload::Rex(u) => Some(u.update_region),
            UpdatePayload::Mtk(u) => Some(u.update_region),
            UpdatePayload::V1Ntx(u) => Some(u.update_region),
            UpdatePayload::V1(u) => Some(u.update_region),
            UpdatePayload::V2(u) => Some(u.update_region),
            UpdatePayload::EinkFbFull(_) => None,
            // SAFETY: built from an on-screen region, so x1 <= x2 and both are non-negative
            UpdatePayload::EinkFbArea(a) => Some(MxcfbRect {
                top: a.y1 as u32,
                left: a.x1 as u32,
                width: (a.x2 - a.x1) as u32,
                height: (a.y2 - a.y1) as u32,
            }),
        }
    }

    /// `(waveform_mode, update_mode, flags)` of an mxcfb request
    pub const fn mode(&self) -> Option<(u32, u32, u32)> {
        match self {
            UpdatePayload::Kindle(u) => Some((u.waveform_mode, u.update_mode, u.flags)),
            UpdatePayload::Zelda(u) => Some((u.waveform_mode, u.update_mode, u.flags)),
            UpdatePayload::Rex(u) => Some((u.waveform_mode, u.update_mode, u.flags)),
            UpdatePayload::Mtk(u) => Some((u.waveform_mode, u.update_mode, u.flags)),
            UpdatePayload::V1Ntx(u) => Some((u.waveform_mode, u.update_mode, u.flags)),
            UpdatePayload::V1(u) => Some((u.waveform_mode, u.update_mode, u.flags)),
            UpdatePayload::V2(u) => Some((u.waveform_mode, u.update_mode, u.flags)),
            UpdatePayload::EinkFbFull(_) | UpdatePayload::EinkFbArea(_) => None,
        }
    }
}

/// Flavor of wait ioctl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitKind {
    /// `MXCFB_WAIT_FOR_UPDATE_SUBMISSION`, u32 marker
    Submission,
    /// `MXCFB_WAIT_FOR_UPDATE_COMPLETE`, read/write `mxcfb_update_marker_data`
    CompleteMarkerData,
    /// `MXCFB_WAIT_FOR_UPDATE_COMPLETE`, u32 marker
    CompleteU32,
    /// PocketBook: the u32 request code with a `mxcfb_update_marker_data` argument
    CompletePocketBook,
}

impl WaitKind {
    /// Kernel request name
    pub const fn request_name(self) -> &'static str {
        match self {
            WaitKind::Submission => "MXCFB_WAIT_FOR_UPDATE_SUBMISSION",
            WaitKind::CompleteMarkerData
            | WaitKind::CompleteU32
            | WaitKind::CompletePocketBook => "MXCFB_WAIT_FOR_UPDATE_COMPLETE",
        }
    }
}

/// A wait on one update marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitRequest {
    /// Which ioctl
    pub kind: WaitKind,
    /// Marker to wait on (never 0 by the time it reaches a backend)
    pub marker: u32,
}

/// Access to a kernel framebuffer
///
/// Calls block for as long as the kernel does. No method is called concurrently with another.
pub trait FbBackend {
    /// Backend-specific error, folded into [`FbError`] by the session
    type Error: Into<FbError>;

    /// `FBIOGET_VSCREENINFO`
    fn var_screeninfo(&mut self) -> Result<FbVarScreenInfo, Self::Error>;

    /// `FBIOGET_FSCREENINFO`
    fn fix_screeninfo(&mut self) -> Result<FbFixScreenInfo, Self::Error>;

    /// `FBIOPUT_VSCREENINFO`. The kernel writes the mode it actually applied back into `var`.
    fn put_var_screeninfo(&mut self, var: &mut FbVarScreenInfo) -> Result<(), Self::Error>;

    /// Send a refresh request.
    fn send_update(&mut self, update: &UpdatePayload) -> Result<(), Self::Error>;

    /// Block on a marker. Returns the raw ioctl result (remaining jiffies on most kernels).
    fn wait(&mut self, request: WaitRequest) -> Result<u32, Self::Error>;

    /// `FBIO_EINK_GET_DISPLAY_ORIENTATION`
    fn legacy_orientation(&mut self) -> Result<libc::c_int, Self::Error>;

    /// `FBIO_EINK_SET_DISPLAY_ORIENTATION`
    fn set_legacy_orientation(&mut self, orientation: libc::c_int) -> Result<(), Self::Error>;

    /// Write a command to a driver's text control channel.
    fn write_control(&mut self, path: &Path, command: &str) -> Result<(), Self::Error>;

    /// (Re)map `len` bytes of framebuffer memory, dropping any previous mapping.
    fn map(&mut self, len: usize) -> Result<(), Self::Error>;

    /// Mapped pixel memory (empty before the first `map`)
    fn buffer(&self) -> &[u8];

    /// Mapped pixel memory, writable
    fn buffer_mut(&mut self) -> &mut [u8];
}
