//! Canonical orientation and native rotation maps
//!
//! fbdev exposes rotation as a native code in `0..=3` (`FB_ROTATE_UR`, `FB_ROTATE_CW`,
//! `FB_ROTATE_UD`, `FB_ROTATE_CCW`). What that code *means* physically depends on the panel:
//! some kernels report a flipped code, some only flip landscape codes. [`RotationMap`] folds
//! that quirk into a 4-entry lookup table so callers only ever deal with [`Rotation`].

use crate::device_quirks::RotationQuirk;

/// Canonical (visual) orientation of the panel content.
///
/// Discriminants match the fbdev `FB_ROTATE_*` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Rotation {
    /// Upright (`FB_ROTATE_UR`)
    Upright = 0,
    /// Rotated 90° clockwise (`FB_ROTATE_CW`)
    Clockwise = 1,
    /// Upside down (`FB_ROTATE_UD`)
    UpsideDown = 2,
    /// Rotated 90° counter-clockwise (`FB_ROTATE_CCW`)
    CounterClockwise = 3,
}

impl Rotation {
    /// All orientations, in code order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Upright,
        Rotation::Clockwise,
        Rotation::UpsideDown,
        Rotation::CounterClockwise,
    ];

    /// Orientation for a `0..=3` code, `None` outside that range.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Rotation::Upright),
            1 => Some(Rotation::Clockwise),
            2 => Some(Rotation::UpsideDown),
            3 => Some(Rotation::CounterClockwise),
            _ => None,
        }
    }

    /// The `FB_ROTATE_*` code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Short name, as used by fbdepth & friends
    pub const fn name(self) -> &'static str {
        match self {
            Rotation::Upright => "Upright, 0°",
            Rotation::Clockwise => "Clockwise, 90°",
            Rotation::UpsideDown => "Upside Down, 180°",
            Rotation::CounterClockwise => "Counter Clockwise, 270°",
        }
    }

    /// Check if rotation swaps width and height
    pub const fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Clockwise | Rotation::CounterClockwise)
    }

    /// Calculate dimensions after rotation
    pub const fn apply_to_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

impl core::fmt::Display for Rotation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Native rotation code → canonical orientation lookup table.
///
/// Indexed by native code. Always a bijection over `{0, 1, 2, 3}`; the only constructor
/// derives it from a [`RotationQuirk`], and every quirk class maps to a permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RotationMap([u8; 4]);

impl RotationMap {
    /// Build the table for a quirk class.
    pub const fn for_quirk(quirk: RotationQuirk) -> Self {
        match quirk {
            RotationQuirk::Straight | RotationQuirk::Sane => Self([0, 1, 2, 3]),
            RotationQuirk::AllInverted => Self([0 ^ 2, 1 ^ 2, 2 ^ 2, 3 ^ 2]),
            RotationQuirk::OddInverted => Self([0, 1 ^ 2, 2, 3 ^ 2]),
        }
    }

    /// Canonical code for a native code, `None` outside `0..=3`.
    pub const fn native_to_canonical(&self, native: u32) -> Option<u8> {
        let [ur, cw, ud, ccw] = self.0;
        match native {
            0 => Some(ur),
            1 => Some(cw),
            2 => Some(ud),
            3 => Some(ccw),
            _ => None,
        }
    }

    /// Native code for a canonical code, `None` outside `0..=3`.
    ///
    /// Linear scan; relies on the table being a bijection.
    pub fn canonical_to_native(&self, canonical: u32) -> Option<u8> {
        self.0
            .iter()
            .zip(0u8..)
            .find(|(&c, _)| u32::from(c) == canonical)
            .map(|(_, native)| native)
    }

    /// The raw table, indexed by native code.
    pub const fn as_array(&self) -> [u8; 4] {
        self.0
    }

    /// `true` when every canonical code appears exactly once.
    pub fn is_bijection(&self) -> bool {
        (0u8..4).all(|c| self.0.iter().filter(|&&v| v == c).count() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_QUIRKS: [RotationQuirk; 4] = [
        RotationQuirk::Straight,
        RotationQuirk::AllInverted,
        RotationQuirk::OddInverted,
        RotationQuirk::Sane,
    ];

    #[test]
    fn test_every_quirk_map_is_a_bijection() {
        for quirk in ALL_QUIRKS {
            assert!(RotationMap::for_quirk(quirk).is_bijection(), "{quirk:?}");
        }
    }

    #[test]
    fn test_all_inverted_swaps_both_axes() {
        let map = RotationMap::for_quirk(RotationQuirk::AllInverted);
        assert_eq!(map.as_array(), [2, 3, 0, 1]);
    }

    #[test]
    fn test_odd_inverted_only_touches_landscape() {
        let map = RotationMap::for_quirk(RotationQuirk::OddInverted);
        assert_eq!(map.as_array(), [0, 3, 2, 1]);
    }

    #[test]
    fn test_inverse_round_trips() {
        for quirk in ALL_QUIRKS {
            let map = RotationMap::for_quirk(quirk);
            for c in 0..4u32 {
                let native = map.canonical_to_native(c).unwrap();
                assert_eq!(map.native_to_canonical(u32::from(native)), Some(c as u8));
            }
        }
    }

    #[test]
    fn test_out_of_range_codes() {
        let map = RotationMap::for_quirk(RotationQuirk::Straight);
        assert_eq!(map.native_to_canonical(4), None);
        assert_eq!(map.canonical_to_native(7), None);
        assert_eq!(Rotation::from_code(4), None);
    }

    #[test]
    fn test_rotation_dimensions() {
        assert_eq!(Rotation::Upright.apply_to_dimensions(1072, 1448), (1072, 1448));
        assert_eq!(Rotation::Clockwise.apply_to_dimensions(1072, 1448), (1448, 1072));
        assert!(!Rotation::UpsideDown.swaps_dimensions());
    }
}
