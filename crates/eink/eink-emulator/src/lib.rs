//! E-Reader Framebuffer Emulator
//!
//! A simulated EPDC framebuffer driver, so the whole `eink-fb` session (identification aside)
//! runs on a desktop or in CI.
//!
//! - Rotation coercion quirks, as seen on Kobo kernels ([`RotationCoercion`])
//! - `FBIOPUT_VSCREENINFO` write-back of the applied mode
//! - Update marker / wait contract, unknown markers return right away
//! - Failure injection per operation ([`SimOp`])
//! - In-memory pixel buffer, PNG screenshots
//!
//! # Example
//!
//! ```
//! use eink_emulator::{RotationCoercion, SimConfig, SimulatedFb};
//! use eink_fb::devices::kobo::KOBO_MODELS;
//! use eink_fb::{FbConfig, FbInfoRequest, FbSession};
//!
//! # fn main() -> Result<(), eink_fb::FbError> {
//! let forma = eink_fb::devices::lookup(KOBO_MODELS, 377).unwrap_or(eink_fb::DeviceQuirks::GENERIC);
//! let sim = SimulatedFb::new(SimConfig::forma());
//! let mut fb = FbSession::with_quirks(sim, FbConfig::default(), forma)?;
//!
//! let report = fb.set_fb_info(&FbInfoRequest::keep_current().rotation(2))?;
//! assert!(report.rotation_settled);
//! assert_eq!(fb.geometry().rotate, 2);
//! # Ok(())
//! # }
//! ```

#![deny(unused_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
mod framebuffer;

pub use config::{RotationCoercion, SimConfig};
pub use error::{SimError, SimOp};
pub use framebuffer::{RecordedPut, RecordedUpdate, SimulatedFb};
