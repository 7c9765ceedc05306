//! Live framebuffer reconfiguration
//!
//! Bitdepth, grayscale and rotation go to the kernel together in one `FBIOPUT_VSCREENINFO`.
//! Several i.MX kernels then apply a rotation other than the one asked for (usually flipped
//! by 180°, sometimes shifted by 90°), so a bounded loop feeds the kernel's own answer back to
//! it until the live value matches.

use crate::backend::FbBackend;
use crate::diag::{self, detail, Diagnostics};
use crate::error::{FbError, Result};
use crate::geometry::ReinitChanges;
use crate::rotation::rotation_name;
use crate::sys::fb::{FB_ACTIVATE_FORCE, FB_ACTIVATE_NOW, GRAYSCALE_8BIT, GRAYSCALE_8BIT_INVERTED};
use crate::sys::FbVarScreenInfo;

/// Bitdepths `set_fb_info` accepts
pub const SETTABLE_BPP: [u32; 4] = [4, 8, 16, 32];

/// Candidate rounds before giving up on a rotation
pub const MAX_COMPENSATION_ROUNDS: u32 = 4;

/// Grayscale mode to apply (8bpp only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrayscaleRequest {
    /// `grayscale = 0`
    Color,
    /// `GRAYSCALE_8BIT`
    Gray8,
    /// `GRAYSCALE_8BIT_INVERTED`
    Gray8Inverted,
    /// Flip between the two 8-bit modes
    Toggle,
}

impl GrayscaleRequest {
    /// From a raw `grayscale` value.
    pub fn from_raw(value: u32) -> Result<Self> {
        match value {
            0 => Ok(GrayscaleRequest::Color),
            GRAYSCALE_8BIT => Ok(GrayscaleRequest::Gray8),
            GRAYSCALE_8BIT_INVERTED => Ok(GrayscaleRequest::Gray8Inverted),
            other => Err(FbError::InvalidGrayscale(other)),
        }
    }

    /// Raw value to apply, given the current one.
    pub const fn resolve(self, current: u32) -> u32 {
        match self {
            GrayscaleRequest::Color => 0,
            GrayscaleRequest::Gray8 => GRAYSCALE_8BIT,
            GrayscaleRequest::Gray8Inverted => GRAYSCALE_8BIT_INVERTED,
            GrayscaleRequest::Toggle if current == GRAYSCALE_8BIT_INVERTED => GRAYSCALE_8BIT,
            GrayscaleRequest::Toggle => GRAYSCALE_8BIT_INVERTED,
        }
    }
}

/// What to change. `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbInfoRequest {
    /// Native rotation code
    pub rotation: Option<u32>,
    /// Bits per pixel
    pub bpp: Option<u32>,
    /// Grayscale mode
    pub grayscale: Option<GrayscaleRequest>,
}

impl FbInfoRequest {
    /// Change nothing (still reinits)
    pub const fn keep_current() -> Self {
        Self {
            rotation: None,
            bpp: None,
            grayscale: None,
        }
    }

    /// Set the native rotation
    pub const fn rotation(mut self, rotation: u32) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Set the bitdepth
    pub const fn bpp(mut self, bpp: u32) -> Self {
        self.bpp = Some(bpp);
        self
    }

    /// Set the grayscale mode
    pub const fn grayscale(mut self, grayscale: GrayscaleRequest) -> Self {
        self.grayscale = Some(grayscale);
        self
    }

    /// Check every value before anything reaches the kernel.
    pub fn validate(&self) -> Result<()> {
        if let Some(rotation) = self.rotation {
            if rotation > 3 {
                return Err(FbError::InvalidRotation(rotation));
            }
        }
        if let Some(bpp) = self.bpp {
            if !SETTABLE_BPP.contains(&bpp) {
                return Err(FbError::InvalidBitDepth(bpp));
            }
        }
        Ok(())
    }

    /// The screen info to apply, on top of the current one.
    ///
    /// Grayscale only exists at 8bpp: it is forced to 0 at any other depth, and defaults to
    /// `GRAYSCALE_8BIT` when switching to 8bpp without an explicit mode.
    pub fn apply_to(&self, current: &FbVarScreenInfo) -> FbVarScreenInfo {
        let mut var = *current;
        if let Some(rotation) = self.rotation {
            var.rotate = rotation;
        }
        if let Some(bpp) = self.bpp {
            var.bits_per_pixel = bpp;
        }
        var.grayscale = if var.bits_per_pixel != 8 {
            0
        } else {
            match self.grayscale {
                Some(request) => request.resolve(current.grayscale),
                None if current.grayscale == 0 => GRAYSCALE_8BIT,
                None => current.grayscale,
            }
        };
        var.activate = FB_ACTIVATE_FORCE | FB_ACTIVATE_NOW;
        var
    }
}

/// Outcome of `set_fb_info`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconfigured {
    /// What the follow-up reinit saw change
    pub changes: ReinitChanges,
    /// Compensation rounds run (0: the kernel honored the request right away)
    pub compensation_rounds: u32,
    /// Live rotation matches the request (or none was made)
    pub rotation_settled: bool,
}

/// Result of the compensation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settled {
    pub(crate) rounds: u32,
    pub(crate) settled: bool,
}

/// Apply `var`, then replace it with what the kernel actually kept.
pub(crate) fn put<B: FbBackend>(backend: &mut B, var: &mut FbVarScreenInfo) -> Result<()> {
    let activate = var.activate;
    backend.put_var_screeninfo(var).map_err(Into::into)?;
    *var = backend.var_screeninfo().map_err(Into::into)?;
    var.activate = activate;
    Ok(())
}

/// Re-apply until the live rotation is `requested`.
///
/// Each round starts from the kernel's last answer: first re-sent as is (undoes a 180° flip),
/// then shifted by one (undoes an extra portrait/landscape swap), then restored before moving
/// on to the next candidate.
pub(crate) fn compensate_rotation<B: FbBackend>(
    backend: &mut B,
    var: &mut FbVarScreenInfo,
    requested: u32,
    diag: Diagnostics,
) -> Result<Settled> {
    let mut candidate = var.rotate;
    let mut rounds = 0;
    while var.rotate != requested && rounds < MAX_COMPENSATION_ROUNDS {
        rounds = rounds.saturating_add(1);
        detail!(
            diag,
            target: diag::RECONFIG,
            "asked for rotation {requested} ({}), got {} ({}), round {rounds}",
            rotation_name(requested),
            var.rotate,
            rotation_name(var.rotate)
        );

        for attempt in [candidate, candidate.wrapping_add(1) & 3] {
            var.rotate = attempt;
            put(backend, var)?;
            if var.rotate == requested {
                return Ok(Settled {
                    rounds,
                    settled: true,
                });
            }
        }
        var.rotate = candidate;
        put(backend, var)?;
        candidate = candidate.wrapping_add(1) & 3;
    }

    let settled = var.rotate == requested;
    if !settled {
        tracing::warn!(
            target: diag::RECONFIG,
            "rotation did not settle: asked for {requested} ({}), kernel kept {} ({})",
            rotation_name(requested),
            var.rotate,
            rotation_name(var.rotate)
        );
    }
    Ok(Settled { rounds, settled })
}
