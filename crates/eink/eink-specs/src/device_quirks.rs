//! Per-device capability record
//!
//! One [`DeviceQuirks`] describes everything the framebuffer layer needs to know about a given
//! e-reader: which ioctl ABI its EPDC driver speaks, how its kernel mangles rotation, whether
//! hardware inversion is safe, and a handful of cosmetic details (name, DPI).
//!
//! Records are plain `Copy` data built with `const fn` helpers, so the per-family tables in
//! [`crate::devices`] are ordinary `static` slices.

use crate::rotation::RotationMap;
use crate::waveform::WaveformTable;

/// Device families, i.e., vendors with a distinct identification scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeviceFamily {
    /// Plain fbdev, no EPDC
    Generic,
    /// Amazon Kindle
    Kindle,
    /// Kobo (and Tolino on mainline kernels)
    Kobo,
    /// BQ Cervantes / Fnac Touch
    Cervantes,
    /// reMarkable
    Remarkable,
    /// PocketBook
    PocketBook,
}

impl DeviceFamily {
    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            DeviceFamily::Generic => "Linux",
            DeviceFamily::Kindle => "Kindle",
            DeviceFamily::Kobo => "Kobo",
            DeviceFamily::Cervantes => "Cervantes",
            DeviceFamily::Remarkable => "reMarkable",
            DeviceFamily::PocketBook => "PocketBook",
        }
    }
}

impl core::fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the kernel interprets the fbdev rotation code.
///
/// See [`RotationMap::for_quirk`] for the resulting native → canonical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RotationQuirk {
    /// Native code is the canonical orientation.
    Straight,
    /// Every code is reported flipped (`UR <-> UD`, `CW <-> CCW`).
    AllInverted,
    /// Only landscape codes are flipped (`CW <-> CCW`).
    OddInverted,
    /// Native code is canonical, boot rotation is upright and the panel is natively upright.
    Sane,
}

impl RotationQuirk {
    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            RotationQuirk::Straight => "Straight",
            RotationQuirk::AllInverted => "All Inverted",
            RotationQuirk::OddInverted => "Odd Inverted",
            RotationQuirk::Sane => "Sane",
        }
    }
}

/// Refresh/update ioctl ABI spoken by the device's EPDC driver.
///
/// Selects the request struct layout, the request codes, and which waits are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RefreshAbi {
    /// No EPDC: plain fbdev, nothing to refresh.
    None,
    /// Legacy Kindle einkfb driver (K2 - K4).
    EinkFb,
    /// Kindle mxcfb (Touch through Oasis).
    KindleMxcfb,
    /// Kindle Oasis 2/3 mxcfb.
    KindleZelda,
    /// Kindle PaperWhite 4 / Basic 3 mxcfb.
    KindleRex,
    /// Kindle MediaTek hwtcon (PaperWhite 5 / Basic 4).
    KindleMtk,
    /// NTX flavored mxcfb v1 (Kobo Mk. 3 - 6).
    NtxV1,
    /// Stock mxcfb v1 (Cervantes, PocketBook).
    MxcfbV1,
    /// mxcfb v2 (Kobo Mk. 7+, reMarkable, Tolino on mainline).
    MxcfbV2,
    /// Allwinner sunxi disp2 (Kobo Elipsa / Sage).
    ///
    /// Refreshes go through `/dev/disp` with ION-backed layers rather than the framebuffer,
    /// so no refresh or wait request is built for it.
    Sunxi,
}

impl RefreshAbi {
    /// Display name
    pub const fn name(self) -> &'static str {
        match self {
            RefreshAbi::None => "none",
            RefreshAbi::EinkFb => "einkfb",
            RefreshAbi::KindleMxcfb => "mxcfb (Kindle)",
            RefreshAbi::KindleZelda => "mxcfb (Zelda)",
            RefreshAbi::KindleRex => "mxcfb (Rex)",
            RefreshAbi::KindleMtk => "hwtcon (MTK)",
            RefreshAbi::NtxV1 => "mxcfb v1 (NTX)",
            RefreshAbi::MxcfbV1 => "mxcfb v1",
            RefreshAbi::MxcfbV2 => "mxcfb v2",
            RefreshAbi::Sunxi => "sunxi disp2",
        }
    }

    /// Whether the update struct carries `dither_mode` / `quant_bit`.
    pub const fn supports_hw_dither(self) -> bool {
        matches!(
            self,
            RefreshAbi::KindleZelda
                | RefreshAbi::KindleRex
                | RefreshAbi::KindleMtk
                | RefreshAbi::MxcfbV2
        )
    }

    /// Whether a `WAIT_FOR_UPDATE_SUBMISSION` ioctl exists.
    pub const fn has_submission_wait(self) -> bool {
        matches!(
            self,
            RefreshAbi::KindleMxcfb
                | RefreshAbi::KindleZelda
                | RefreshAbi::KindleRex
                | RefreshAbi::KindleMtk
        )
    }

    /// Whether a `WAIT_FOR_UPDATE_COMPLETE` ioctl exists.
    pub const fn has_completion_wait(self) -> bool {
        matches!(
            self,
            RefreshAbi::KindleMxcfb
                | RefreshAbi::KindleZelda
                | RefreshAbi::KindleRex
                | RefreshAbi::KindleMtk
                | RefreshAbi::NtxV1
                | RefreshAbi::MxcfbV1
                | RefreshAbi::MxcfbV2
        )
    }

    /// Kernel-side timeout of the completion wait, in milliseconds.
    pub const fn completion_timeout_ms(self) -> u32 {
        match self {
            RefreshAbi::NtxV1 => 10_000,
            _ => 5_000,
        }
    }
}

impl core::fmt::Display for RefreshAbi {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability record for one device.
///
/// Resolved once at init, read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceQuirks {
    /// Vendor
    pub family: DeviceFamily,
    /// Vendor-specific device id (0 when unknown)
    pub device_id: u16,
    /// Marketing name
    pub name: &'static str,
    /// Internal codename
    pub codename: &'static str,
    /// Board platform
    pub platform: &'static str,
    /// Panel density
    pub screen_dpi: u16,
    /// Native rotation code the kernel boots with
    pub boot_rotation: u8,
    /// Kernel rotation quirk class
    pub rotation_quirk: RotationQuirk,
    /// Whether the panel is expected to be rotated at runtime (accelerometer, or user choice)
    pub can_rotate: bool,
    /// Whether `EPDC_FLAG_ENABLE_INVERSION` is safe to use
    pub can_hw_invert: bool,
    /// Legacy einkfb driver
    pub is_legacy: bool,
    /// Kindle with a Pearl panel (u32 completion wait)
    pub is_kindle_pearl: bool,
    /// Allwinner SoC
    pub is_sunxi: bool,
    /// Supports the "eclipse" nightmode waveforms (GCK16, GLKW16)
    pub has_eclipse_waveforms: bool,
    /// `WAIT_FOR_UPDATE_COMPLETE` may time out for no reason
    pub unreliable_wait_for: bool,
    /// Horizontal viewport offset, in pixels
    pub view_hori_offset: i16,
    /// Vertical viewport offset, in pixels (negative: bottom rows hidden behind the bezel)
    pub view_vert_offset: i16,
    /// Refresh ioctl ABI
    pub refresh_abi: RefreshAbi,
    /// Waveform mode numbering
    pub waveforms: WaveformTable,
}

impl DeviceQuirks {
    /// Safe defaults for an unidentified device: no HW inversion, straight rotation, no offsets.
    pub const GENERIC: Self = Self::new(DeviceFamily::Generic, "Unknown", "Unknown", "Unknown");

    /// A record with safe defaults for `family`.
    ///
    /// The refresh ABI and waveform table start out as the family's most common ones.
    pub const fn new(
        family: DeviceFamily,
        name: &'static str,
        codename: &'static str,
        platform: &'static str,
    ) -> Self {
        let (refresh_abi, waveforms) = match family {
            DeviceFamily::Generic => (RefreshAbi::None, WaveformTable::Ntx),
            DeviceFamily::Kindle => (RefreshAbi::KindleMxcfb, WaveformTable::Kindle),
            DeviceFamily::Kobo => (RefreshAbi::NtxV1, WaveformTable::Ntx),
            DeviceFamily::Cervantes => (RefreshAbi::MxcfbV1, WaveformTable::Ntx),
            DeviceFamily::Remarkable => (RefreshAbi::MxcfbV2, WaveformTable::Remarkable),
            DeviceFamily::PocketBook => (RefreshAbi::MxcfbV1, WaveformTable::PocketBook),
        };
        Self {
            family,
            device_id: 0,
            name,
            codename,
            platform,
            screen_dpi: 167,
            boot_rotation: 0,
            rotation_quirk: RotationQuirk::Straight,
            can_rotate: false,
            can_hw_invert: false,
            is_legacy: false,
            is_kindle_pearl: false,
            is_sunxi: false,
            has_eclipse_waveforms: false,
            unreliable_wait_for: false,
            view_hori_offset: 0,
            view_vert_offset: 0,
            refresh_abi,
            waveforms,
        }
    }

    /// Set the device id
    pub const fn with_id(mut self, device_id: u16) -> Self {
        self.device_id = device_id;
        self
    }

    /// Set the panel density
    pub const fn dpi(mut self, dpi: u16) -> Self {
        self.screen_dpi = dpi;
        self
    }

    /// Set the boot rotation code
    pub const fn boot_rotation(mut self, rotation: u8) -> Self {
        self.boot_rotation = rotation;
        self
    }

    /// Set the rotation quirk class
    pub const fn rotation_quirk(mut self, quirk: RotationQuirk) -> Self {
        self.rotation_quirk = quirk;
        self
    }

    /// Flag the panel as rotatable
    pub const fn rotatable(mut self) -> Self {
        self.can_rotate = true;
        self
    }

    /// Set HW inversion support
    pub const fn hw_invert(mut self, supported: bool) -> Self {
        self.can_hw_invert = supported;
        self
    }

    /// Legacy einkfb device
    pub const fn legacy(mut self) -> Self {
        self.is_legacy = true;
        self.refresh_abi = RefreshAbi::EinkFb;
        self
    }

    /// Kindle Pearl panel
    pub const fn pearl(mut self) -> Self {
        self.is_kindle_pearl = true;
        self
    }

    /// Allwinner SoC
    pub const fn sunxi(mut self) -> Self {
        self.is_sunxi = true;
        self.refresh_abi = RefreshAbi::Sunxi;
        self
    }

    /// Eclipse waveforms available
    pub const fn eclipse(mut self) -> Self {
        self.has_eclipse_waveforms = true;
        self
    }

    /// Completion waits are unreliable
    pub const fn unreliable_wait(mut self) -> Self {
        self.unreliable_wait_for = true;
        self
    }

    /// Set the vertical viewport offset
    pub const fn vert_offset(mut self, offset: i16) -> Self {
        self.view_vert_offset = offset;
        self
    }

    /// Set the refresh ABI
    pub const fn abi(mut self, abi: RefreshAbi) -> Self {
        self.refresh_abi = abi;
        self
    }

    /// Set the waveform table
    pub const fn waveforms(mut self, table: WaveformTable) -> Self {
        self.waveforms = table;
        self
    }

    /// Native → canonical rotation table for this panel.
    pub const fn rotation_map(&self) -> RotationMap {
        RotationMap::for_quirk(self.rotation_quirk)
    }

    /// `true` for the [`DeviceQuirks::GENERIC`] fallback or any record with an unknown id.
    pub const fn is_unknown(&self) -> bool {
        self.device_id == 0
    }
}

impl Default for DeviceQuirks {
    fn default() -> Self {
        Self::GENERIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_defaults_are_safe() {
        let q = DeviceQuirks::GENERIC;
        assert!(!q.can_hw_invert);
        assert_eq!(q.rotation_quirk, RotationQuirk::Straight);
        assert_eq!(q.view_vert_offset, 0);
        assert_eq!(q.view_hori_offset, 0);
        assert!(q.is_unknown());
        assert_eq!(q.refresh_abi, RefreshAbi::None);
    }

    #[test]
    fn test_builder_flags() {
        let q = DeviceQuirks::new(DeviceFamily::Kobo, "Elipsa", "Europa", "Mark 8")
            .with_id(387)
            .sunxi()
            .eclipse();
        assert!(q.is_sunxi);
        assert_eq!(q.refresh_abi, RefreshAbi::Sunxi);
        assert!(q.has_eclipse_waveforms);
        assert_eq!(q.device_id, 387);
    }

    #[test]
    fn test_legacy_switches_abi() {
        let q = DeviceQuirks::new(DeviceFamily::Kindle, "4", "Tequila", "Yoshi").legacy();
        assert_eq!(q.refresh_abi, RefreshAbi::EinkFb);
        assert!(!q.refresh_abi.has_completion_wait());
    }

    #[test]
    fn test_abi_capabilities() {
        assert!(RefreshAbi::MxcfbV2.supports_hw_dither());
        assert!(!RefreshAbi::NtxV1.supports_hw_dither());
        assert!(RefreshAbi::KindleRex.has_submission_wait());
        assert!(!RefreshAbi::MxcfbV2.has_submission_wait());
        assert!(RefreshAbi::KindleMtk.supports_hw_dither());
        assert!(RefreshAbi::KindleMtk.has_completion_wait());
        assert!(!RefreshAbi::Sunxi.has_completion_wait());
        assert_eq!(RefreshAbi::NtxV1.completion_timeout_ms(), 10_000);
    }
}
