//! Refresh requests
//!
//! Everything between "refresh this rectangle" and the ioctl argument: region validation,
//! marker bookkeeping, and the per-ABI request layouts. All of it is pure; the session does the
//! actual I/O.

use eink_specs::{DeviceFamily, DeviceQuirks, HwDither, RefreshAbi, WaveformMode, WAVEFORM_MODE_AUTO};

use crate::backend::{UpdatePayload, WaitKind};
use crate::diag;
use crate::error::{FbError, Result};
use crate::geometry::FbGeometry;
use crate::sys::einkfb::{UpdateArea, FX_UPDATE_FULL, FX_UPDATE_PARTIAL};
use crate::sys::mxcfb::{
    MxcfbRect, MxcfbUpdateDataKindle, MxcfbUpdateDataMtk, MxcfbUpdateDataRex, MxcfbUpdateDataV1,
    MxcfbUpdateDataV1Ntx, MxcfbUpdateDataV2, MxcfbUpdateDataZelda, EPDC_FLAG_ENABLE_INVERSION,
    EPDC_FLAG_FORCE_MONOCHROME, EPDC_FLAG_USE_AAD, EPDC_FLAG_USE_DITHERING_Y1,
    EPDC_FLAG_USE_REAGLD, EPDC_FLAG_USE_REGAL, EPDC_FLAG_USE_ZELDA_REGAL,
    MTK_EPDC_FLAG_USE_DITHERING_Y4, MTK_EPDC_FLAG_USE_REGAL, TEMP_USE_AMBIENT, TEMP_USE_AUTO,
    UPDATE_MODE_FULL, UPDATE_MODE_PARTIAL,
};

/// Screen rectangle, in visible (viewport) coordinates. All zeroes means the full screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Region {
    /// Left edge
    pub left: u32,
    /// Top edge
    pub top: u32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Region {
    /// The full-screen sentinel
    pub const FULL: Self = Self::new(0, 0, 0, 0);

    /// Region at (`left`, `top`), `width` x `height`
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Zero area in both dimensions
    pub const fn is_full_screen(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// A refresh, as asked for by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Area to refresh
    pub region: Region,
    /// Waveform mode
    pub waveform: WaveformMode,
    /// Full (flashing) update
    pub flashing: bool,
    /// EPDC-side dithering
    pub dither: HwDither,
    /// Hardware inversion (nightmode)
    pub inverted: bool,
    /// Panel temperature override, in the driver's units
    pub temperature: Option<i32>,
}

impl RefreshRequest {
    /// Partial AUTO refresh of `region`
    pub const fn new(region: Region) -> Self {
        Self {
            region,
            waveform: WaveformMode::Auto,
            flashing: false,
            dither: HwDither::Passthrough,
            inverted: false,
            temperature: None,
        }
    }

    /// Full screen, partial AUTO refresh
    pub const fn full_screen() -> Self {
        Self::new(Region::FULL)
    }

    /// Set the waveform mode
    pub const fn waveform(mut self, waveform: WaveformMode) -> Self {
        self.waveform = waveform;
        self
    }

    /// Flashing update
    pub const fn flashing(mut self, flashing: bool) -> Self {
        self.flashing = flashing;
        self
    }

    /// Set the hardware dithering mode
    pub const fn dither(mut self, dither: HwDither) -> Self {
        self.dither = dither;
        self
    }

    /// Invert on the EPDC side
    pub const fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Override the temperature
    pub const fn temperature(mut self, temperature: i32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A validated region, in framebuffer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRegion {
    /// Rectangle to send
    pub rect: MxcfbRect,
    /// Came from the full-screen sentinel
    pub full_screen: bool,
}

/// Validate `region` against the live geometry and move it into framebuffer coordinates.
pub fn resolve_region(region: Region, geometry: &FbGeometry) -> Result<ResolvedRegion> {
    if region.is_full_screen() {
        return Ok(ResolvedRegion {
            rect: MxcfbRect {
                top: 0,
                left: 0,
                width: geometry.xres,
                height: geometry.yres,
            },
            full_screen: true,
        });
    }
    if region.width == 0 || region.height == 0 || (region.width == 1 && region.height == 1) {
        return Err(FbError::BogusRegion {
            width: region.width,
            height: region.height,
        });
    }

    let left = region.left.saturating_add(geometry.view_hori_origin);
    let top = region.top.saturating_add(geometry.view_vert_origin);
    let out_of_bounds = || FbError::RegionOutOfBounds {
        top,
        left,
        width: region.width,
        height: region.height,
        xres: geometry.xres,
        yres: geometry.yres,
    };
    let right = left.checked_add(region.width).ok_or_else(out_of_bounds)?;
    let bottom = top.checked_add(region.height).ok_or_else(out_of_bounds)?;
    if right > geometry.xres || bottom > geometry.yres {
        return Err(out_of_bounds());
    }

    Ok(ResolvedRegion {
        rect: MxcfbRect {
            top,
            left,
            width: region.width,
            height: region.height,
        },
        full_screen: false,
    })
}

/// Update marker bookkeeping
///
/// Markers start from a per-process seed so that two clients of the same driver are unlikely
/// to collide, and never take the value 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerState {
    next: u32,
    last: Option<u32>,
}

impl MarkerState {
    /// Start counting from `seed`.
    pub const fn new(seed: u32) -> Self {
        Self {
            next: seed,
            last: None,
        }
    }

    /// Seeded from the process id
    pub fn from_pid() -> Self {
        Self::new(std::process::id())
    }

    /// The marker `issue` hands out next
    pub const fn peek(&self) -> u32 {
        match self.next {
            0 => 1,
            n => n,
        }
    }

    /// Hand out the next marker and remember it as the last one.
    pub fn issue(&mut self) -> u32 {
        let marker = self.peek();
        self.next = marker.wrapping_add(1);
        self.last = Some(marker);
        marker
    }

    /// Last marker issued, if any
    pub const fn last(&self) -> Option<u32> {
        self.last
    }

    /// Turn a caller's marker into a concrete one: 0 stands for the last marker issued.
    pub fn resolve(&self, marker: u32) -> Result<u32> {
        match marker {
            0 => self.last.ok_or(FbError::NoMarker),
            m => Ok(m),
        }
    }
}

const fn unsupported(feature: &'static str, abi: RefreshAbi) -> FbError {
    FbError::Unsupported {
        feature,
        device: abi.name(),
    }
}

/// Completion wait flavor for a device, `None` if its driver has none.
pub const fn completion_wait(quirks: &DeviceQuirks) -> Option<WaitKind> {
    match quirks.refresh_abi {
        RefreshAbi::KindleMxcfb if quirks.is_kindle_pearl => Some(WaitKind::CompleteU32),
        RefreshAbi::KindleMxcfb
        | RefreshAbi::KindleZelda
        | RefreshAbi::KindleRex
        | RefreshAbi::KindleMtk
        | RefreshAbi::MxcfbV2 => Some(WaitKind::CompleteMarkerData),
        RefreshAbi::NtxV1 => Some(WaitKind::CompleteU32),
        RefreshAbi::MxcfbV1 if matches!(quirks.family, DeviceFamily::PocketBook) => {
            Some(WaitKind::CompletePocketBook)
        }
        RefreshAbi::MxcfbV1 => Some(WaitKind::CompleteU32),
        RefreshAbi::None | RefreshAbi::EinkFb | RefreshAbi::Sunxi => None,
    }
}

/// Completion wait, or an unsupported feature error
pub fn require_completion_wait(quirks: &DeviceQuirks) -> Result<WaitKind> {
    completion_wait(quirks).ok_or(unsupported("waiting for update completion", quirks.refresh_abi))
}

/// Submission wait, or an unsupported feature error
pub fn require_submission_wait(quirks: &DeviceQuirks) -> Result<WaitKind> {
    if quirks.refresh_abi.has_submission_wait() {
        Ok(WaitKind::Submission)
    } else {
        Err(unsupported("waiting for update submission", quirks.refresh_abi))
    }
}

/// How long a completion wait blocked, from the kernel's remaining jiffies.
pub fn wait_elapsed_ms(remaining_jiffies: u32, timeout_ms: u32, user_hz: u32) -> u32 {
    let remaining_ms = remaining_jiffies
        .saturating_mul(1000)
        .checked_div(user_hz)
        .unwrap_or(0);
    timeout_ms.saturating_sub(remaining_ms)
}

/// Waveform, update mode and flags shared by every mxcfb layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Common {
    waveform: WaveformMode,
    waveform_code: u32,
    update_mode: u32,
    flags: u32,
    temp: libc::c_int,
    dither_mode: libc::c_int,
    quant_bit: libc::c_int,
}

fn common(request: &RefreshRequest, quirks: &DeviceQuirks) -> Result<Common> {
    let abi = quirks.refresh_abi;

    let mut waveform = match request.waveform {
        WaveformMode::Auto if request.flashing => WaveformMode::Gc16,
        mode => mode,
    };
    let waveform_code = match quirks.waveforms.kernel_code(waveform) {
        Some(code) => code,
        None => {
            tracing::warn!(target: diag::REFRESH, "waveform mode {waveform} is not supported on {abi}, using AUTO");
            waveform = WaveformMode::Auto;
            WAVEFORM_MODE_AUTO
        }
    };

    if request.dither != HwDither::Passthrough && !abi.supports_hw_dither() {
        return Err(unsupported("hardware dithering", abi));
    }
    let quant_bit = match request.dither {
        HwDither::Passthrough => 0,
        _ => waveform.quant_bits(),
    };

    let mut flags = 0;
    if request.inverted && quirks.can_hw_invert {
        flags |= EPDC_FLAG_ENABLE_INVERSION;
    }
    if waveform == WaveformMode::Reagld {
        flags |= match abi {
            RefreshAbi::NtxV1 => EPDC_FLAG_USE_AAD,
            RefreshAbi::KindleMxcfb => EPDC_FLAG_USE_REAGLD,
            RefreshAbi::KindleZelda | RefreshAbi::KindleRex => EPDC_FLAG_USE_ZELDA_REGAL,
            RefreshAbi::KindleMtk => MTK_EPDC_FLAG_USE_REGAL,
            RefreshAbi::MxcfbV2 => EPDC_FLAG_USE_REGAL,
            _ => 0,
        };
    }
    let zelda_like = matches!(
        abi,
        RefreshAbi::KindleZelda | RefreshAbi::KindleRex | RefreshAbi::KindleMtk
    );
    let monochrome = matches!(waveform, WaveformMode::A2 | WaveformMode::Du);
    if waveform == WaveformMode::A2 || (zelda_like && monochrome) {
        flags |= EPDC_FLAG_FORCE_MONOCHROME;
    }
    // hwtcon picks its dithering depth from the flags rather than quant_bit
    if abi == RefreshAbi::KindleMtk && request.dither != HwDither::Passthrough {
        flags |= if monochrome {
            EPDC_FLAG_USE_DITHERING_Y1
        } else {
            MTK_EPDC_FLAG_USE_DITHERING_Y4
        };
    }

    let ambient = match abi {
        RefreshAbi::KindleMxcfb => TEMP_USE_AUTO,
        _ => TEMP_USE_AMBIENT,
    };

    Ok(Common {
        waveform,
        waveform_code,
        update_mode: if request.flashing {
            UPDATE_MODE_FULL
        } else {
            UPDATE_MODE_PARTIAL
        },
        flags,
        temp: request.temperature.unwrap_or(ambient),
        dither_mode: request.dither.kernel_value(),
        quant_bit: i32::try_from(quant_bit).unwrap_or(0),
    })
}

fn hist_code(quirks: &DeviceQuirks, mode: WaveformMode) -> u32 {
    quirks.waveforms.kernel_code(mode).unwrap_or(WAVEFORM_MODE_AUTO)
}

#[allow(clippy::arithmetic_side_effects)]
fn einkfb_area(rect: MxcfbRect, which_fx: libc::c_int) -> UpdateArea {
    let to_int = |v: u32| libc::c_int::try_from(v).unwrap_or(libc::c_int::MAX);
    // SAFETY: the rectangle is on-screen, so the edges fit in the screen size
    UpdateArea {
        x1: to_int(rect.left),
        y1: to_int(rect.top),
        x2: to_int(rect.left + rect.width),
        y2: to_int(rect.top + rect.height),
        which_fx,
        buffer: 0,
    }
}

/// Build the kernel request for `request` on this device.
pub fn build_update(
    request: &RefreshRequest,
    region: ResolvedRegion,
    marker: u32,
    quirks: &DeviceQuirks,
) -> Result<UpdatePayload> {
    let abi = quirks.refresh_abi;
    let rect = region.rect;

    if abi == RefreshAbi::EinkFb {
        if request.dither != HwDither::Passthrough {
            return Err(unsupported("hardware dithering", abi));
        }
        let fx = if request.flashing {
            FX_UPDATE_FULL
        } else {
            FX_UPDATE_PARTIAL
        };
        return Ok(if region.full_screen {
            UpdatePayload::EinkFbFull(fx)
        } else {
            UpdatePayload::EinkFbArea(einkfb_area(rect, fx))
        });
    }
    // Sunxi refreshes go through /dev/disp, not the framebuffer
    if matches!(abi, RefreshAbi::None | RefreshAbi::Sunxi) {
        return Err(unsupported("refresh", abi));
    }

    let c = common(request, quirks)?;
    tracing::trace!(target: diag::REFRESH, waveform = %c.waveform, flags = c.flags, "update request");

    let payload = match abi {
        RefreshAbi::KindleMxcfb => UpdatePayload::Kindle(MxcfbUpdateDataKindle {
            update_region: rect,
            waveform_mode: c.waveform_code,
            update_mode: c.update_mode,
            update_marker: marker,
            hist_bw_waveform_mode: hist_code(quirks, WaveformMode::Du),
            hist_gray_waveform_mode: hist_code(quirks, WaveformMode::Gc16Fast),
            temp: c.temp,
            flags: c.flags,
            ..Default::default()
        }),
        RefreshAbi::KindleZelda => UpdatePayload::Zelda(MxcfbUpdateDataZelda {
            update_region: rect,
            waveform_mode: c.waveform_code,
            update_mode: c.update_mode,
            update_marker: marker,
            temp: c.temp,
            flags: c.flags,
            dither_mode: c.dither_mode,
            quant_bit: c.quant_bit,
            hist_bw_waveform_mode: hist_code(quirks, WaveformMode::Du),
            hist_gray_waveform_mode: hist_code(quirks, WaveformMode::Gc16),
            ..Default::default()
        }),
        RefreshAbi::KindleRex => UpdatePayload::Rex(MxcfbUpdateDataRex {
            update_region: rect,
            waveform_mode: c.waveform_code,
            update_mode: c.update_mode,
            update_marker: marker,
            temp: c.temp,
            flags: c.flags,
            dither_mode: c.dither_mode,
            quant_bit: c.quant_bit,
            hist_bw_waveform_mode: hist_code(quirks, WaveformMode::Du),
            hist_gray_waveform_mode: hist_code(quirks, WaveformMode::Gc16),
            ..Default::default()
        }),
        RefreshAbi::KindleMtk => UpdatePayload::Mtk(MxcfbUpdateDataMtk {
            update_region: rect,
            waveform_mode: c.waveform_code,
            update_mode: c.update_mode,
            update_marker: marker,
            temp: c.temp,
            flags: c.flags,
            dither_mode: c.dither_mode,
            quant_bit: c.quant_bit,
            hist_bw_waveform_mode: hist_code(quirks, WaveformMode::Du),
            hist_gray_waveform_mode: hist_code(quirks, WaveformMode::Gc16),
            ..Default::default()
        }),
        RefreshAbi::NtxV1 => UpdatePayload::V1Ntx(MxcfbUpdateDataV1Ntx {
            update_region: rect,
            waveform_mode: c.waveform_code,
            update_mode: c.update_mode,
            update_marker: marker,
            temp: c.temp,
            flags: c.flags,
            ..Default::default()
        }),
        RefreshAbi::MxcfbV1 => UpdatePayload::V1(MxcfbUpdateDataV1 {
            update_region: rect,
            waveform_mode: c.waveform_code,
            update_mode: c.update_mode,
            update_marker: marker,
            temp: c.temp,
            flags: c.flags,
            ..Default::default()
        }),
        RefreshAbi::MxcfbV2 => UpdatePayload::V2(MxcfbUpdateDataV2 {
            update_region: rect,
            waveform_mode: c.waveform_code,
            update_mode: c.update_mode,
            update_marker: marker,
            temp: c.temp,
            flags: c.flags,
            dither_mode: c.dither_mode,
            quant_bit: c.quant_bit,
            ..Default::default()
        }),
        RefreshAbi::None | RefreshAbi::EinkFb | RefreshAbi::Sunxi => {
            return Err(unsupported("refresh", abi));
        }
    };
    Ok(payload)
}
