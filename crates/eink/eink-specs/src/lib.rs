//! E-Reader Device Database
//!
//! Static knowledge about Linux e-readers, independent of any framebuffer handle:
//! which EPDC ioctl ABI a device speaks, how its kernel mangles the fbdev rotation code,
//! which waveform numbering its driver expects, and whether hardware inversion is safe.
//!
//! # Features
//!
//! - **no_std compatible** - Tables are `static` data built with `const fn`
//! - **Per-vendor tables** - Kindle, Kobo (and mainline Tolino), Cervantes, reMarkable, PocketBook
//! - **Serde support** - Optional, for dumping identification results and config enums
//!
//! # Example
//!
//! ```
//! use eink_specs::devices::{kobo, lookup};
//! use eink_specs::{RefreshAbi, Rotation};
//!
//! let forma = lookup(kobo::KOBO_MODELS, 377).unwrap();
//! assert_eq!(forma.refresh_abi, RefreshAbi::MxcfbV2);
//!
//! // The Forma's kernel flips landscape codes
//! let map = forma.rotation_map();
//! assert_eq!(map.native_to_canonical(Rotation::Clockwise as u32), Some(3));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod device_quirks;
pub mod devices;
pub mod rotation;
pub mod waveform;

pub use device_quirks::{DeviceFamily, DeviceQuirks, RefreshAbi, RotationQuirk};
pub use rotation::{Rotation, RotationMap};
pub use waveform::{HwDither, WaveformMode, WaveformTable, WAVEFORM_MODE_AUTO};
