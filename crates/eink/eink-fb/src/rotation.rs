//! Rotation canonicalizer
//!
//! Wraps the panel's [`RotationMap`] with range-checked conversions, for callers that deal in
//! raw `u32` codes (touch input, reconfiguration requests).

use eink_specs::{DeviceQuirks, Rotation, RotationMap, RotationQuirk};

use crate::error::{FbError, Result};

/// Native ↔ canonical rotation conversions for one panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationCanonicalizer {
    quirk: RotationQuirk,
    map: RotationMap,
}

impl RotationCanonicalizer {
    /// Canonicalizer for a quirk class
    pub const fn new(quirk: RotationQuirk) -> Self {
        Self {
            quirk,
            map: RotationMap::for_quirk(quirk),
        }
    }

    /// Canonicalizer for a resolved device
    pub const fn for_device(quirks: &DeviceQuirks) -> Self {
        Self::new(quirks.rotation_quirk)
    }

    /// Quirk class the map was built from
    pub const fn quirk(&self) -> RotationQuirk {
        self.quirk
    }

    /// Underlying lookup table
    pub const fn map(&self) -> &RotationMap {
        &self.map
    }

    /// Canonical orientation of native code `native`.
    pub fn native_to_canonical(&self, native: u32) -> Result<Rotation> {
        self.map
            .native_to_canonical(native)
            .and_then(|c| Rotation::from_code(u32::from(c)))
            .ok_or(FbError::InvalidRotation(native))
    }

    /// Native code that displays as `canonical`.
    pub fn canonical_to_native(&self, canonical: u32) -> Result<u32> {
        self.map
            .canonical_to_native(canonical)
            .map(u32::from)
            .ok_or(FbError::InvalidRotation(canonical))
    }
}

/// Human-readable name of a native rotation code
pub fn rotation_name(native: u32) -> &'static str {
    Rotation::from_code(native).map_or("Unknown", Rotation::name)
}
