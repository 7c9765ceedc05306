//! The framebuffer session
//!
//! [`FbSession`] owns everything that used to be process-wide state: the backend, the resolved
//! quirks, the live geometry and its pixel accessor, and the marker counter. Every mutating
//! operation takes `&mut self`, which is the single-writer contract the hardware expects.

use eink_specs::{DeviceQuirks, RefreshAbi, Rotation};
use nix::errno::Errno;

use crate::backend::{FbBackend, WaitKind, WaitRequest};
use crate::config::FbConfig;
use crate::diag::{self, detail, notice, Diagnostics};
use crate::error::{FbError, Result};
use crate::geometry::{FbGeometry, ReinitChanges};
use crate::identity::{self, accel};
use crate::linux::LinuxFramebuffer;
use crate::pixel::{Color, PixelAccessor};
use crate::reconfig::{self, FbInfoRequest, Reconfigured};
use crate::refresh::{self, MarkerState, Region, RefreshRequest};
use crate::rotation::{rotation_name, RotationCanonicalizer};
use crate::sys::einkfb::{orientation_to_rotate, rotate_to_orientation};
use crate::sys::fb::GRAYSCALE_8BIT_INVERTED;

/// Refresh state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No refresh has gone through yet
    Uninitialized,
    /// At least one refresh was accepted
    Ready,
}

/// An open framebuffer with its resolved device quirks
#[derive(Debug)]
pub struct FbSession<B: FbBackend> {
    backend: B,
    config: FbConfig,
    diag: Diagnostics,
    quirks: DeviceQuirks,
    rotation: RotationCanonicalizer,
    geometry: FbGeometry,
    accessor: PixelAccessor,
    markers: MarkerState,
    state: SessionState,
}

impl FbSession<LinuxFramebuffer> {
    /// Open `config.fb_device`, identify the device and map its memory.
    pub fn open(config: FbConfig) -> Result<Self> {
        let backend = LinuxFramebuffer::open(&config.fb_device)?;
        Self::new(backend, config)
    }
}

impl<B: FbBackend> FbSession<B> {
    /// Identify the device, then initialize on top of `backend`.
    pub fn new(backend: B, config: FbConfig) -> Result<Self> {
        let quirks = identity::resolve(&config);
        Self::with_quirks(backend, config, quirks)
    }

    /// Initialize with an already resolved quirk record.
    pub fn with_quirks(mut backend: B, config: FbConfig, quirks: DeviceQuirks) -> Result<Self> {
        let diag = config.diagnostics();
        let (geometry, accessor) = load(&mut backend, &quirks)?;
        notice!(
            diag,
            target: diag::RECONFIG,
            "Framebuffer is {}x{} @ {}, rotation {} ({})",
            geometry.xres,
            geometry.yres,
            accessor.format(),
            geometry.rotate,
            rotation_name(geometry.rotate)
        );
        Ok(Self {
            backend,
            config,
            diag,
            rotation: RotationCanonicalizer::for_device(&quirks),
            quirks,
            geometry,
            accessor,
            markers: MarkerState::from_pid(),
            state: SessionState::Uninitialized,
        })
    }

    /// Resolved device quirks
    pub const fn quirks(&self) -> &DeviceQuirks {
        &self.quirks
    }

    /// Live geometry
    pub const fn geometry(&self) -> &FbGeometry {
        &self.geometry
    }

    /// Pixel accessor matching the live format
    pub const fn accessor(&self) -> &PixelAccessor {
        &self.accessor
    }

    /// Rotation canonicalizer of this device
    pub const fn rotation(&self) -> &RotationCanonicalizer {
        &self.rotation
    }

    /// Session configuration
    pub const fn config(&self) -> &FbConfig {
        &self.config
    }

    /// Refresh state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Last marker handed out by [`Self::refresh`]
    pub const fn last_marker(&self) -> Option<u32> {
        self.markers.last()
    }

    /// The backend
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Drop the session, keeping the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Native rotation code to canonical orientation
    pub fn native_to_canonical(&self, native: u32) -> Result<Rotation> {
        self.rotation.native_to_canonical(native)
    }

    /// Canonical orientation to native rotation code
    pub fn canonical_to_native(&self, canonical: u32) -> Result<u32> {
        self.rotation.canonical_to_native(canonical)
    }

    /// Canonical orientation of the live framebuffer
    pub fn current_rotation(&self) -> Result<Rotation> {
        self.rotation.native_to_canonical(self.geometry.rotate)
    }

    /// Native rotation matching the physical orientation, from the accelerometer.
    ///
    /// `None` when the device has none, when it lies flat, or when reading it failed.
    pub fn accelerometer_rotation(&self) -> Option<u32> {
        if !self.quirks.can_rotate {
            return None;
        }
        let sources = &self.config.identity;
        match accel::read_linux(&sources.kx122_driver_dir, &sources.i2c_dev_dir) {
            Ok(Some(rotation)) => {
                detail!(self.diag, target: diag::IDENTITY, "accelerometer says {}", rotation_name(rotation));
                Some(rotation)
            }
            Ok(None) => {
                detail!(self.diag, target: diag::IDENTITY, "accelerometer reports no edge up");
                None
            }
            Err(err) => {
                tracing::warn!(target: diag::IDENTITY, "accelerometer read failed: {err}");
                None
            }
        }
    }

    /// Re-read the screen info and rebuild everything that depends on it.
    pub fn reinit(&mut self) -> Result<ReinitChanges> {
        let (geometry, accessor) = load(&mut self.backend, &self.quirks)?;
        let changes = ReinitChanges::between(&self.geometry, &geometry);
        if !changes.is_empty() {
            notice!(
                self.diag,
                target: diag::RECONFIG,
                "Framebuffer changed ({changes}): now {}x{} @ {}, rotation {} ({})",
                geometry.xres,
                geometry.yres,
                accessor.format(),
                geometry.rotate,
                rotation_name(geometry.rotate)
            );
        }
        self.geometry = geometry;
        self.accessor = accessor;
        Ok(changes)
    }

    /// Send a refresh request. Returns its update marker.
    ///
    /// A rejected request is reported as is: the marker counter only moves once the kernel has
    /// accepted the update.
    pub fn refresh(&mut self, request: &RefreshRequest) -> Result<u32> {
        let region = refresh::resolve_region(request.region, &self.geometry)?;
        let marker = self.markers.peek();
        let payload = refresh::build_update(request, region, marker, &self.quirks)?;

        if let Err(err) = self.backend.send_update(&payload) {
            let err: FbError = err.into();
            if err.errno() == Errno::EINVAL {
                let rect = region.rect;
                tracing::warn!(
                    target: diag::REFRESH,
                    "{} rejected region {}x{}+{}+{} ({})",
                    payload.request_name(),
                    rect.width,
                    rect.height,
                    rect.left,
                    rect.top,
                    request.waveform
                );
            }
            return Err(err);
        }

        let marker = self.markers.issue();
        self.state = SessionState::Ready;
        detail!(
            self.diag,
            target: diag::REFRESH,
            "{} marker {marker}: {}x{}+{}+{} {} {}",
            payload.request_name(),
            region.rect.width,
            region.rect.height,
            region.rect.left,
            region.rect.top,
            request.waveform,
            if request.flashing { "full" } else { "partial" }
        );
        Ok(marker)
    }

    /// Block until the update with `marker` (0: the last one) was taken by the EPDC.
    pub fn wait_for_submission(&mut self, marker: u32) -> Result<()> {
        let kind = refresh::require_submission_wait(&self.quirks)?;
        let marker = self.markers.resolve(marker)?;
        self.backend
            .wait(WaitRequest { kind, marker })
            .map_err(Into::into)?;
        detail!(self.diag, target: diag::REFRESH, "update {marker} submitted");
        Ok(())
    }

    /// Block until the update with `marker` (0: the last one) is on screen.
    ///
    /// Returns how long the kernel says it waited, in milliseconds.
    pub fn wait_for_completion(&mut self, marker: u32) -> Result<u32> {
        let kind = refresh::require_completion_wait(&self.quirks)?;
        let marker = self.markers.resolve(marker)?;
        let timeout_ms = self.quirks.refresh_abi.completion_timeout_ms();

        let remaining = match self.backend.wait(WaitRequest { kind, marker }) {
            Ok(remaining) => remaining,
            Err(err) => {
                let err: FbError = err.into();
                if self.quirks.unreliable_wait_for && err.errno() == Errno::ETIMEDOUT {
                    tracing::warn!(
                        target: diag::REFRESH,
                        "{} timed out on update {marker}, ignoring on this device",
                        kind.request_name()
                    );
                    return Ok(timeout_ms);
                }
                return Err(err);
            }
        };

        let elapsed = refresh::wait_elapsed_ms(remaining, timeout_ms, self.config.user_hz);
        detail!(
            self.diag,
            target: diag::REFRESH,
            "update {marker} completed after ~{elapsed}ms (out of {timeout_ms}ms)"
        );
        Ok(elapsed)
    }

    /// Change rotation, bitdepth and grayscale mode, then reinit.
    pub fn set_fb_info(&mut self, request: &FbInfoRequest) -> Result<Reconfigured> {
        request.validate()?;

        let current = self.backend.var_screeninfo().map_err(Into::into)?;
        let mut var = request.apply_to(&current);
        if self.quirks.is_legacy {
            // Rotation goes through the orientation request instead
            var.rotate = current.rotate;
        }
        detail!(
            self.diag,
            target: diag::RECONFIG,
            "applying {}bpp, grayscale {}, rotation {}",
            var.bits_per_pixel,
            var.grayscale,
            var.rotate
        );
        reconfig::put(&mut self.backend, &mut var)?;

        if self.quirks.is_sunxi {
            self.sync_sunxi_inversion(current.grayscale, var.grayscale)?;
        }

        let (rounds, settled) = match request.rotation {
            None if self.quirks.is_legacy => (0, true),
            Some(requested) if self.quirks.is_legacy => (0, self.set_legacy_rotation(requested)?),
            // Kernels that coerce rotation also coerce the one we merely re-sent
            requested => {
                let expected = requested.unwrap_or(current.rotate);
                let settled =
                    reconfig::compensate_rotation(&mut self.backend, &mut var, expected, self.diag)?;
                (settled.rounds, settled.settled)
            }
        };

        let changes = self.reinit()?;
        Ok(Reconfigured {
            changes,
            compensation_rounds: rounds,
            rotation_settled: settled,
        })
    }

    fn set_legacy_rotation(&mut self, requested: u32) -> Result<bool> {
        let orientation = rotate_to_orientation(requested).ok_or(FbError::InvalidRotation(requested))?;
        self.backend
            .set_legacy_orientation(orientation)
            .map_err(Into::into)?;
        let live = self.backend.legacy_orientation().map_err(Into::into)?;
        let settled = orientation_to_rotate(live) == Some(requested);
        if !settled {
            tracing::warn!(
                target: diag::RECONFIG,
                "asked for orientation {orientation}, einkfb reports {live}"
            );
        }
        Ok(settled)
    }

    /// The sunxi driver ignores the grayscale polarity; inversion is a separate switch.
    fn sync_sunxi_inversion(&mut self, old: u32, new: u32) -> Result<()> {
        let was_inverted = old == GRAYSCALE_8BIT_INVERTED;
        let inverted = new == GRAYSCALE_8BIT_INVERTED;
        if was_inverted == inverted {
            return Ok(());
        }
        let command = if inverted { "nightenable" } else { "nightdisable" };
        detail!(self.diag, target: diag::RECONFIG, "sunxi: {command}");
        self.backend
            .write_control(&self.config.sunxi_control, command)
            .map_err(Into::into)
    }

    /// Mapped framebuffer memory
    pub fn buffer(&self) -> &[u8] {
        self.backend.buffer()
    }

    /// Mapped framebuffer memory, mutably
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.backend.buffer_mut()
    }

    /// Read one pixel, in framebuffer coordinates.
    ///
    /// # Panics
    /// If the coordinates are outside the mapped memory.
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        self.accessor.get(self.backend.buffer(), x, y)
    }

    /// Write one pixel, in framebuffer coordinates.
    ///
    /// # Panics
    /// If the coordinates are outside the mapped memory.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.accessor.set(self.backend.buffer_mut(), x, y, color);
    }

    /// Fill a viewport rectangle, clipped to the viewport.
    pub fn fill_rect(&mut self, region: Region, color: Color) {
        let g = &self.geometry;
        let left = region.left.min(g.view_width);
        let top = region.top.min(g.view_height);
        let width = region.width.min(g.view_width.saturating_sub(left));
        let height = region.height.min(g.view_height.saturating_sub(top));
        if width == 0 || height == 0 {
            return;
        }
        let left = left.saturating_add(g.view_hori_origin);
        let top = top.saturating_add(g.view_vert_origin);
        self.accessor
            .fill_rect(self.backend.buffer_mut(), left, top, width, height, color);
    }

    /// Fill the whole screen, hidden rows included.
    pub fn clear(&mut self, color: Color) {
        let (xres, yres) = (self.geometry.xres, self.geometry.yres);
        self.accessor
            .fill_rect(self.backend.buffer_mut(), 0, 0, xres, yres, color);
    }

    /// Refresh ABI of the device
    pub const fn refresh_abi(&self) -> RefreshAbi {
        self.quirks.refresh_abi
    }

    /// Whether completion waits exist on this device
    pub const fn can_wait_for_completion(&self) -> bool {
        refresh::completion_wait(&self.quirks).is_some()
    }

    /// Completion wait flavor of this device
    pub const fn completion_wait_kind(&self) -> Option<WaitKind> {
        refresh::completion_wait(&self.quirks)
    }
}

/// Read screen info, derive geometry and accessor, and map the framebuffer memory.
fn load<B: FbBackend>(backend: &mut B, quirks: &DeviceQuirks) -> Result<(FbGeometry, PixelAccessor)> {
    let var = backend.var_screeninfo().map_err(Into::into)?;
    let fix = backend.fix_screeninfo().map_err(Into::into)?;
    let geometry = FbGeometry::from_screeninfo(&var, &fix, quirks)?;
    let accessor = PixelAccessor::for_geometry(&geometry)?;
    let len = usize::try_from(geometry.smem_len)
        .map_err(|_| FbError::UnsupportedMode(format!("{} bytes of video memory", geometry.smem_len)))?;
    // Checked before remapping, so a refused mode leaves the current mapping alone
    if len < geometry.visible_len() {
        return Err(FbError::UnsupportedMode(format!(
            "{len} bytes of video memory, {} visible",
            geometry.visible_len()
        )));
    }
    backend.map(len).map_err(Into::into)?;
    Ok((geometry, accessor))
}
