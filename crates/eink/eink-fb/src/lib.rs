//! Framebuffer HAL for Linux e-readers
//!
//! Drives the `/dev/fbN` of Kindle, Kobo, Cervantes, reMarkable and PocketBook devices: works out
//! which device it runs on, picks pixel accessors for the live bitdepth, hides the kernels'
//! rotation quirks, and speaks each EPDC driver's flavor of the refresh ioctls.
//!
//! # Layers
//!
//! ```text
//! Rendering / touch input (callers)
//!         ↓
//! FbSession (this crate - refresh, waits, set_fb_info, pixel access)
//!         ↓
//! FbBackend (LinuxFramebuffer, or the emulator)
//!         ↓
//! Kernel (fbdev + mxcfb / einkfb ioctls, i2c-dev)
//! ```
//!
//! # Components
//!
//! - [`identity`] - Device identification from serials, version tags, HW CONFIG blocks
//! - [`pixel`] - Per-bitdepth get/set strategies
//! - [`rotation`] - Native ↔ canonical rotation codes
//! - [`refresh`] - Update request building, markers and waits
//! - [`reconfig`] - Live bitdepth / grayscale / rotation changes
//!
//! # Example
//!
//! ```no_run
//! use eink_fb::{FbConfig, FbSession, RefreshRequest, WaveformMode};
//!
//! # fn main() -> Result<(), eink_fb::FbError> {
//! let mut fb = FbSession::open(FbConfig::from_env())?;
//! fb.clear(eink_fb::Color::WHITE);
//! let marker = fb.refresh(&RefreshRequest::full_screen().waveform(WaveformMode::Gc16).flashing(true))?;
//! fb.wait_for_completion(marker)?;
//! # Ok(())
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(clippy::print_stdout)] // tracing, never println!, in lib code
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
mod diag;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod linux;
pub mod pixel;
pub mod reconfig;
pub mod refresh;
pub mod rotation;
pub mod session;
pub mod sys;

pub use backend::{FbBackend, UpdatePayload, WaitKind, WaitRequest};
pub use config::{FamilyHint, FbConfig, HwConfigLocation, IdentitySources};
pub use diag::Diagnostics;
pub use error::{ErrorKind, FbError, Result, SourceError};
pub use geometry::{ColorOrder, FbGeometry, ReinitChanges};
pub use linux::LinuxFramebuffer;
pub use pixel::{Color, PixelAccessor, PixelFormat};
pub use reconfig::{FbInfoRequest, GrayscaleRequest, Reconfigured};
pub use refresh::{MarkerState, Region, RefreshRequest};
pub use rotation::{rotation_name, RotationCanonicalizer};
pub use session::{FbSession, SessionState};

pub use eink_specs::devices;
pub use eink_specs::{
    DeviceFamily, DeviceQuirks, HwDither, RefreshAbi, Rotation, RotationMap, RotationQuirk,
    WaveformMode,
};
