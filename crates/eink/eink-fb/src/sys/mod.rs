//! Kernel ABI
//!
//! `#[repr(C)]` mirrors of the fbdev, EPDC and i2c-dev request structs, and the
//! `nix` ioctl wrappers for them. Layouts are checked with `size_of`/`offset_of!` in each
//! module's tests; every struct here is passed to the kernel by pointer, so a single
//! misplaced field is a silent corruption.
//!
//! Field names follow the C headers; see those for per-field documentation.

#![allow(missing_docs)]

pub mod einkfb;
pub mod fb;
pub mod i2c;
pub mod mxcfb;

pub use fb::{FbBitfield, FbFixScreenInfo, FbVarScreenInfo};
