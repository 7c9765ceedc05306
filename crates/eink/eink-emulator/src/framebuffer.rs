//! In-memory framebuffer driver
//!
//! Behaves like an EPDC fbdev driver as far as [`FbBackend`] can see: `FBIOPUT_VSCREENINFO`
//! writes back the mode it actually applied (rotation coercion included), updates are
//! checked against the live resolution, and every request is recorded for assertions.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use eink_fb::sys::einkfb::{orientation_to_rotate, rotate_to_orientation};
use eink_fb::sys::{FbBitfield, FbFixScreenInfo, FbVarScreenInfo};
use eink_fb::{ColorOrder, FbBackend, PixelAccessor, PixelFormat, UpdatePayload, WaitRequest};
use nix::errno::Errno;

use crate::config::SimConfig;
use crate::error::{SimError, SimOp};

/// Live mode of the simulated driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mode {
    bpp: u32,
    grayscale: u32,
    rotate: u32,
}

/// A refresh request as the driver saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedUpdate {
    /// The request
    pub payload: UpdatePayload,
    /// Resolution at the time (xres, yres)
    pub screen: (u32, u32),
}

/// An `FBIOPUT_VSCREENINFO` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedPut {
    /// Rotation asked for
    pub requested_rotate: u32,
    /// Rotation applied
    pub applied_rotate: u32,
    /// Bitdepth applied
    pub bpp: u32,
    /// Grayscale flag applied
    pub grayscale: u32,
}

/// Simulated framebuffer
#[derive(Debug)]
pub struct SimulatedFb {
    config: SimConfig,
    mode: Mode,
    memory: Vec<u8>,
    updates: Vec<RecordedUpdate>,
    puts: Vec<RecordedPut>,
    waits: Vec<WaitRequest>,
    controls: Vec<(PathBuf, String)>,
    submitted: HashSet<u32>,
    fail_next: HashMap<SimOp, Errno>,
    fail_always: HashMap<SimOp, Errno>,
}

impl SimulatedFb {
    /// Power up with the initial mode of `config`. Nothing is mapped yet.
    pub fn new(config: SimConfig) -> Self {
        let mode = Mode {
            bpp: config.bpp,
            grayscale: config.grayscale,
            rotate: config.rotate & 3,
        };
        Self {
            config,
            mode,
            memory: Vec::new(),
            updates: Vec::new(),
            puts: Vec::new(),
            waits: Vec::new(),
            controls: Vec::new(),
            submitted: HashSet::new(),
            fail_next: HashMap::new(),
            fail_always: HashMap::new(),
        }
    }

    /// Configuration
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Live native rotation
    pub const fn rotate(&self) -> u32 {
        self.mode.rotate
    }

    /// Live bitdepth
    pub const fn bpp(&self) -> u32 {
        self.mode.bpp
    }

    /// Live grayscale flag
    pub const fn grayscale(&self) -> u32 {
        self.mode.grayscale
    }

    /// Live resolution: odd rotations swap the panel's dimensions
    pub const fn resolution(&self) -> (u32, u32) {
        if self.mode.rotate & 1 == 1 {
            (self.config.yres, self.config.xres)
        } else {
            (self.config.xres, self.config.yres)
        }
    }

    /// Bytes per scanline, padding included
    pub fn line_length(&self) -> u32 {
        let (xres, _) = self.resolution();
        xres.saturating_add(self.config.scanline_padding)
            .saturating_mul(self.mode.bpp)
            .div_ceil(8)
    }

    /// Video memory size: the boot reservation if any, else the live mode's
    pub fn smem_len(&self) -> u32 {
        let (_, yres) = self.resolution();
        self.config
            .video_memory
            .unwrap_or_else(|| self.line_length().saturating_mul(yres))
    }

    /// Fail the next call of `op` with `errno`.
    pub fn fail_next(&mut self, op: SimOp, errno: Errno) {
        self.fail_next.insert(op, errno);
    }

    /// Fail every call of `op` with `errno`, until [`Self::clear_failures`].
    pub fn fail_always(&mut self, op: SimOp, errno: Errno) {
        self.fail_always.insert(op, errno);
    }

    /// Drop every queued failure.
    pub fn clear_failures(&mut self) {
        self.fail_next.clear();
        self.fail_always.clear();
    }

    /// Refresh requests received, oldest first
    pub fn updates(&self) -> &[RecordedUpdate] {
        &self.updates
    }

    /// Mode changes received, oldest first
    pub fn puts(&self) -> &[RecordedPut] {
        &self.puts
    }

    /// Waits received, oldest first
    pub fn waits(&self) -> &[WaitRequest] {
        &self.waits
    }

    /// Control channel writes, oldest first
    pub fn controls(&self) -> &[(PathBuf, String)] {
        &self.controls
    }

    /// Forget every recorded request.
    pub fn clear_log(&mut self) {
        self.updates.clear();
        self.puts.clear();
        self.waits.clear();
        self.controls.clear();
    }

    /// Decode the visible screen to 8-bit luma, row-major.
    pub fn luma(&self) -> Vec<u8> {
        let (xres, yres) = self.resolution();
        let Some(accessor) = self.accessor() else {
            return Vec::new();
        };
        let len = usize::try_from(xres.saturating_mul(yres)).unwrap_or(0);
        let mut out = Vec::with_capacity(len);
        if self.memory.len() < usize::try_from(self.smem_len()).unwrap_or(usize::MAX) {
            return out;
        }
        for y in 0..yres {
            for x in 0..xres {
                out.push(accessor.get(&self.memory, x, y).luma());
            }
        }
        out
    }

    /// Save the visible screen as a grayscale PNG.
    pub fn screenshot(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        let (xres, yres) = self.resolution();
        let pixels = self.luma();
        let img = image::GrayImage::from_raw(xres, yres, pixels).ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        img.save(path)
    }

    fn accessor(&self) -> Option<PixelAccessor> {
        let format = PixelFormat::select(self.mode.bpp, self.config.color_order).ok()?;
        Some(PixelAccessor::new(
            format,
            usize::try_from(self.line_length()).ok()?,
        ))
    }

    fn check(&mut self, op: SimOp) -> Result<(), SimError> {
        if let Some(errno) = self
            .fail_next
            .remove(&op)
            .or_else(|| self.fail_always.get(&op).copied())
        {
            return Err(SimError::Injected { op, errno });
        }
        Ok(())
    }

    fn bitfields(&self, var: &mut FbVarScreenInfo) {
        let field = |offset, length| FbBitfield {
            offset,
            length,
            msb_right: 0,
        };
        let (red, green, blue, transp) = match (self.mode.bpp, self.config.color_order) {
            (16, _) => (field(11, 5), field(5, 6), field(0, 5), field(0, 0)),
            (24 | 32, ColorOrder::Bgr) => (field(16, 8), field(8, 8), field(0, 8), field(24, 8)),
            (24 | 32, ColorOrder::Rgb) => (field(0, 8), field(8, 8), field(16, 8), field(24, 8)),
            (bpp, _) => (field(0, bpp), field(0, bpp), field(0, bpp), field(0, 0)),
        };
        var.red = red;
        var.green = green;
        var.blue = blue;
        var.transp = if self.mode.bpp == 24 { field(0, 0) } else { transp };
    }

    fn check_region(&self, payload: &UpdatePayload) -> Result<(), SimError> {
        let (xres, yres) = self.resolution();
        let inside = |left: u32, top: u32, width: u32, height: u32| {
            left.checked_add(width).is_some_and(|right| right <= xres)
                && top.checked_add(height).is_some_and(|bottom| bottom <= yres)
        };
        let ok = match payload {
            UpdatePayload::EinkFbFull(_) => true,
            UpdatePayload::EinkFbArea(area) => {
                let coords = [area.x1, area.y1, area.x2, area.y2].map(u32::try_from);
                match coords {
                    [Ok(x1), Ok(y1), Ok(x2), Ok(y2)] => x1 < x2 && y1 < y2 && x2 <= xres && y2 <= yres,
                    _ => false,
                }
            }
            other => other
                .region()
                .is_some_and(|r| inside(r.left, r.top, r.width, r.height)),
        };
        if ok {
            Ok(())
        } else {
            Err(SimError::rejected(SimOp::SendUpdate, "update region outside of the screen"))
        }
    }
}

impl FbBackend for SimulatedFb {
    type Error = SimError;

    fn var_screeninfo(&mut self) -> Result<FbVarScreenInfo, SimError> {
        self.check(SimOp::GetVar)?;
        let (xres, yres) = self.resolution();
        let mut var = FbVarScreenInfo {
            xres,
            yres,
            xres_virtual: xres.saturating_add(self.config.scanline_padding),
            yres_virtual: yres,
            bits_per_pixel: self.mode.bpp,
            grayscale: self.mode.grayscale,
            rotate: self.mode.rotate,
            ..Default::default()
        };
        self.bitfields(&mut var);
        Ok(var)
    }

    fn fix_screeninfo(&mut self) -> Result<FbFixScreenInfo, SimError> {
        self.check(SimOp::GetFix)?;
        let mut id = [0u8; 16];
        for (dst, src) in id.iter_mut().zip(self.config.driver_id.bytes().take(15)) {
            *dst = src;
        }
        Ok(FbFixScreenInfo {
            id,
            smem_len: self.smem_len(),
            line_length: self.line_length(),
            ..Default::default()
        })
    }

    fn put_var_screeninfo(&mut self, var: &mut FbVarScreenInfo) -> Result<(), SimError> {
        self.check(SimOp::PutVar)?;
        if !matches!(var.bits_per_pixel, 4 | 8 | 16 | 24 | 32) {
            return Err(SimError::rejected(SimOp::PutVar, "unsupported bitdepth"));
        }
        if var.rotate > 3 {
            return Err(SimError::rejected(SimOp::PutVar, "invalid rotation"));
        }

        let applied = self.config.coercion.apply(var.rotate);
        self.puts.push(RecordedPut {
            requested_rotate: var.rotate,
            applied_rotate: applied,
            bpp: var.bits_per_pixel,
            grayscale: var.grayscale,
        });
        tracing::trace!(
            target: "eink_emulator",
            requested = var.rotate,
            applied,
            bpp = var.bits_per_pixel,
            "FBIOPUT_VSCREENINFO"
        );
        self.mode = Mode {
            bpp: var.bits_per_pixel,
            grayscale: var.grayscale,
            rotate: applied,
        };
        *var = self.var_screeninfo()?;
        Ok(())
    }

    fn send_update(&mut self, update: &UpdatePayload) -> Result<(), SimError> {
        self.check(SimOp::SendUpdate)?;
        self.check_region(update)?;
        if let Some(marker) = update.marker() {
            self.submitted.insert(marker);
        }
        self.updates.push(RecordedUpdate {
            payload: *update,
            screen: self.resolution(),
        });
        Ok(())
    }

    fn wait(&mut self, request: WaitRequest) -> Result<u32, SimError> {
        self.waits.push(request);
        self.check(SimOp::Wait)?;
        // Unknown markers return right away, like the real drivers
        if self.submitted.contains(&request.marker) {
            Ok(self.config.wait_remaining_jiffies)
        } else {
            Ok(0)
        }
    }

    fn legacy_orientation(&mut self) -> Result<libc::c_int, SimError> {
        self.check(SimOp::Orientation)?;
        rotate_to_orientation(self.mode.rotate)
            .ok_or(SimError::rejected(SimOp::Orientation, "no orientation for rotation"))
    }

    fn set_legacy_orientation(&mut self, orientation: libc::c_int) -> Result<(), SimError> {
        self.check(SimOp::Orientation)?;
        let rotate = orientation_to_rotate(orientation)
            .ok_or(SimError::rejected(SimOp::Orientation, "invalid orientation"))?;
        self.mode.rotate = self.config.coercion.apply(rotate);
        Ok(())
    }

    fn write_control(&mut self, path: &Path, command: &str) -> Result<(), SimError> {
        self.check(SimOp::Control)?;
        self.controls.push((path.to_path_buf(), command.to_owned()));
        Ok(())
    }

    fn map(&mut self, len: usize) -> Result<(), SimError> {
        self.check(SimOp::Map)?;
        // A mode change reallocates: previous content is gone
        self.memory.clear();
        self.memory.resize(len, 0xFF);
        Ok(())
    }

    fn buffer(&self) -> &[u8] {
        &self.memory
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }
}
