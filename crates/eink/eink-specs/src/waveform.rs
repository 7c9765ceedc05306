//! E-Ink Waveform Modes
//!
//! Vendor-neutral waveform mode names, and the per-driver numbering the EPDC kernel drivers
//! expect in the `waveform_mode` field of their update requests.
//!
//! Every vendor renumbered these at least once (Kindle did it twice), so the same
//! [`WaveformMode`] maps to a different kernel constant depending on the [`WaveformTable`].

/// Waveform modes a refresh can request
///
/// Not every device implements every mode; [`WaveformTable::kernel_code`] returns `None`
/// for modes a given driver cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WaveformMode {
    /// Let the EPDC pick, via histogram analysis of the region
    #[default]
    Auto,
    /// DU - Direct Update
    ///
    /// From any to B&W, ~260ms. Never flashes.
    Du,
    /// GC16 - Grayscale Clearing 16-level
    ///
    /// From any to any, ~450ms, highest fidelity. Flashes the full region when flashing.
    Gc16,
    /// GC4 - Grayscale Clearing 4-level
    Gc4,
    /// A2 - Animation Mode
    ///
    /// From B&W to B&W, ~120ms. Requests monochrome quantization.
    A2,
    /// GL16 - from white to any, optimized for text
    Gl16,
    /// REAGL - GL16 with ghosting and flashing reduction
    Reagl,
    /// REAGLD - REAGL with more ghosting reduction, only sensible when flashing
    Reagld,
    /// GC16, lower latency, lower fidelity (Kindle)
    Gc16Fast,
    /// GL16, lower latency, lower fidelity (Kindle)
    Gl16Fast,
    /// DU4 - Direct Update 4-level
    Du4,
    /// GL4 - from white to 4 levels (Kindle)
    Gl4,
    /// GL16 for text on black (Kindle)
    Gl16Inv,
    /// Nightmode GC16
    Gck16,
    /// Nightmode GL16
    Glkw16,
    /// INIT - clears the panel to white, slow
    Init,
}

impl WaveformMode {
    /// Every mode, in declaration order.
    pub const ALL: [WaveformMode; 16] = [
        WaveformMode::Auto,
        WaveformMode::Du,
        WaveformMode::Gc16,
        WaveformMode::Gc4,
        WaveformMode::A2,
        WaveformMode::Gl16,
        WaveformMode::Reagl,
        WaveformMode::Reagld,
        WaveformMode::Gc16Fast,
        WaveformMode::Gl16Fast,
        WaveformMode::Du4,
        WaveformMode::Gl4,
        WaveformMode::Gl16Inv,
        WaveformMode::Gck16,
        WaveformMode::Glkw16,
        WaveformMode::Init,
    ];

    /// Upper-case name, as used on the command line of most e-reader tools
    pub const fn name(self) -> &'static str {
        match self {
            WaveformMode::Auto => "AUTO",
            WaveformMode::Du => "DU",
            WaveformMode::Gc16 => "GC16",
            WaveformMode::Gc4 => "GC4",
            WaveformMode::A2 => "A2",
            WaveformMode::Gl16 => "GL16",
            WaveformMode::Reagl => "REAGL",
            WaveformMode::Reagld => "REAGLD",
            WaveformMode::Gc16Fast => "GC16_FAST",
            WaveformMode::Gl16Fast => "GL16_FAST",
            WaveformMode::Du4 => "DU4",
            WaveformMode::Gl4 => "GL4",
            WaveformMode::Gl16Inv => "GL16_INV",
            WaveformMode::Gck16 => "GCK16",
            WaveformMode::Glkw16 => "GLKW16",
            WaveformMode::Init => "INIT",
        }
    }

    /// Case-insensitive lookup by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
    }

    /// Bits of quantization the EPDC should apply when HW dithering into this mode.
    pub const fn quant_bits(self) -> u32 {
        match self {
            WaveformMode::A2 | WaveformMode::Du => 1,
            WaveformMode::Gl4 | WaveformMode::Du4 => 3,
            _ => 7,
        }
    }

    /// Whether this is one of the B&W-only modes.
    pub const fn is_monochrome(self) -> bool {
        matches!(self, WaveformMode::A2 | WaveformMode::Du)
    }
}

impl core::fmt::Display for WaveformMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Hardware (EPDC-side) dithering algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HwDither {
    /// No dithering
    #[default]
    Passthrough,
    /// Floyd-Steinberg error diffusion
    FloydSteinberg,
    /// Atkinson error diffusion
    Atkinson,
    /// Ordered (Bayer) dithering
    Ordered,
    /// Quantization only, no dithering
    QuantOnly,
}

impl HwDither {
    /// `dither_mode` value for mxcfb v2 style update structs
    pub const fn kernel_value(self) -> i32 {
        match self {
            HwDither::Passthrough => 0,
            HwDither::FloydSteinberg => 1,
            HwDither::Atkinson => 2,
            HwDither::Ordered => 3,
            HwDither::QuantOnly => 4,
        }
    }

    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            HwDither::Passthrough => "Passthrough",
            HwDither::FloydSteinberg => "Floyd-Steinberg",
            HwDither::Atkinson => "Atkinson",
            HwDither::Ordered => "Ordered",
            HwDither::QuantOnly => "Quant Only",
        }
    }
}

/// Kernel waveform numbering scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum WaveformTable {
    /// Kindle mxcfb, Touch through Oasis
    Kindle,
    /// Kindle Oasis 2+ and PaperWhite 4+ (renumbered)
    KindleZelda,
    /// NTX boards (Kobo, Cervantes)
    Ntx,
    /// PocketBook i.MX kernels
    PocketBook,
    /// reMarkable
    Remarkable,
}

/// `WAVEFORM_MODE_AUTO`, shared by every mxcfb flavor
pub const WAVEFORM_MODE_AUTO: u32 = 257;

impl WaveformTable {
    /// Kernel constant for `mode`, `None` if this driver has no such mode.
    pub const fn kernel_code(self, mode: WaveformMode) -> Option<u32> {
        use WaveformMode as W;

        if let W::Auto = mode {
            return Some(WAVEFORM_MODE_AUTO);
        }
        match self {
            WaveformTable::Kindle => match mode {
                W::Init => Some(0x0),
                W::Du => Some(0x1),
                W::Gc16 | W::Gc4 => Some(0x2),
                W::Gc16Fast => Some(0x3),
                W::A2 => Some(0x4),
                W::Gl16 => Some(0x5),
                W::Gl16Fast => Some(0x6),
                W::Du4 => Some(0x7),
                W::Reagl => Some(0x8),
                W::Reagld => Some(0x9),
                W::Gl4 => Some(0xA),
                W::Gl16Inv => Some(0xB),
                _ => None,
            },
            WaveformTable::KindleZelda => match mode {
                W::Init => Some(0x0),
                W::Du => Some(0x1),
                W::Gc16 | W::Gc4 | W::Gc16Fast => Some(0x2),
                W::Gl16 | W::Gl16Fast | W::Gl4 | W::Gl16Inv => Some(0x3),
                W::Reagl => Some(0x4),
                W::Reagld => Some(0x5),
                W::A2 => Some(0x6),
                W::Du4 => Some(0x7),
                W::Gck16 => Some(0x8),
                W::Glkw16 => Some(0x9),
                _ => None,
            },
            WaveformTable::Ntx => match mode {
                W::Init => Some(0),
                W::Du => Some(1),
                W::Gc16 => Some(2),
                W::Gc4 => Some(3),
                W::A2 => Some(4),
                W::Gl16 => Some(5),
                W::Reagl => Some(6),
                W::Reagld => Some(7),
                W::Du4 => Some(8),
                W::Gck16 => Some(9),
                W::Glkw16 => Some(10),
                _ => None,
            },
            WaveformTable::PocketBook => match mode {
                W::Init => Some(0),
                W::Du => Some(1),
                W::Gc16 => Some(2),
                W::Gc4 => Some(3),
                W::A2 => Some(4),
                W::Gl16 => Some(5),
                W::Du4 => Some(8),
                W::Reagl => Some(9),
                W::Reagld => Some(10),
                _ => None,
            },
            WaveformTable::Remarkable => match mode {
                W::Init => Some(0),
                W::Du => Some(1),
                W::Gc16 => Some(2),
                W::Gl16 | W::Gc16Fast => Some(3),
                W::A2 => Some(4),
                W::Du4 => Some(7),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_is_universal() {
        for table in [
            WaveformTable::Kindle,
            WaveformTable::KindleZelda,
            WaveformTable::Ntx,
            WaveformTable::PocketBook,
            WaveformTable::Remarkable,
        ] {
            assert_eq!(table.kernel_code(WaveformMode::Auto), Some(257));
        }
    }

    #[test]
    fn test_zelda_renumbering() {
        assert_eq!(WaveformTable::Kindle.kernel_code(WaveformMode::A2), Some(4));
        assert_eq!(WaveformTable::KindleZelda.kernel_code(WaveformMode::A2), Some(6));
        assert_eq!(WaveformTable::KindleZelda.kernel_code(WaveformMode::Reagld), Some(5));
    }

    #[test]
    fn test_ntx_has_no_kindle_only_modes() {
        assert_eq!(WaveformTable::Ntx.kernel_code(WaveformMode::Gc16Fast), None);
        assert_eq!(WaveformTable::Ntx.kernel_code(WaveformMode::Gl16Inv), None);
        assert_eq!(WaveformTable::Ntx.kernel_code(WaveformMode::Reagl), Some(6));
    }

    #[test]
    fn test_name_round_trip() {
        for mode in WaveformMode::ALL {
            assert_eq!(WaveformMode::from_name(mode.name()), Some(mode));
        }
        assert_eq!(WaveformMode::from_name("gc16_fast"), Some(WaveformMode::Gc16Fast));
        assert_eq!(WaveformMode::from_name("nope"), None);
    }

    #[test]
    fn test_quant_bits() {
        assert_eq!(WaveformMode::A2.quant_bits(), 1);
        assert_eq!(WaveformMode::Du4.quant_bits(), 3);
        assert_eq!(WaveformMode::Gl16.quant_bits(), 7);
    }
}
