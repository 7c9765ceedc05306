//! Amazon Kindle device table
//!
//! Kindles embed their device code in the 16-character serial number exposed at
//! `/proc/usid`. Older devices (serial starting with `B` or `9`) use two hex digits at
//! offset 2; everything since the PaperWhite 3 uses three characters at offset 3, encoded in
//! Amazon's flavor of base 32 (Crockford's alphabet with `L` and `U` re-added).

use super::DeviceModel;
use crate::device_quirks::{DeviceFamily, DeviceQuirks, RefreshAbi};
use crate::waveform::WaveformTable;

/// Digits of the device-code base-32 encoding
pub const KINDLE_BASE32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKLMNPQRSTUVWX";

/// Length of `/proc/usid`
pub const KINDLE_SERIAL_LEN: usize = 16;

const fn kindle(name: &'static str, codename: &'static str, platform: &'static str) -> DeviceQuirks {
    DeviceQuirks::new(DeviceFamily::Kindle, name, codename, platform).hw_invert(true)
}

const fn einkfb(name: &'static str, codename: &'static str, platform: &'static str) -> DeviceQuirks {
    kindle(name, codename, platform).legacy().hw_invert(false)
}

const fn zelda(name: &'static str, codename: &'static str) -> DeviceQuirks {
    kindle(name, codename, "Zelda")
        .abi(RefreshAbi::KindleZelda)
        .waveforms(WaveformTable::KindleZelda)
        .eclipse()
        .dpi(300)
}

const fn rex(name: &'static str, codename: &'static str) -> DeviceQuirks {
    kindle(name, codename, "Rex")
        .abi(RefreshAbi::KindleRex)
        .waveforms(WaveformTable::KindleZelda)
}

const fn mtk(name: &'static str, codename: &'static str) -> DeviceQuirks {
    kindle(name, codename, "Bellatrix")
        .abi(RefreshAbi::KindleMtk)
        .waveforms(WaveformTable::KindleZelda)
        .dpi(300)
}

/// Devices identified by a 2-digit hex code (serials starting with `B` or `9`)
pub static KINDLE_LEGACY_ID_MODELS: &[DeviceModel] = &[
    DeviceModel {
        ids: &[0x01],
        quirks: einkfb("1", "Fiona", "ADS"),
    },
    DeviceModel {
        ids: &[0x02, 0x03],
        quirks: einkfb("2", "Turing", "Mario"),
    },
    DeviceModel {
        ids: &[0x04, 0x05, 0x09],
        quirks: einkfb("DX", "Nell", "Mario").dpi(150),
    },
    DeviceModel {
        ids: &[0x08, 0x06, 0x0A],
        quirks: einkfb("3", "Shasta", "Luigi"),
    },
    DeviceModel {
        ids: &[0x0E],
        quirks: einkfb("4", "Tequila", "Yoshi"),
    },
    DeviceModel {
        ids: &[0x0F, 0x11, 0x10, 0x12],
        quirks: kindle("Touch", "Whitney", "Yoshi").pearl(),
    },
    DeviceModel {
        ids: &[0x23],
        quirks: einkfb("4", "Sauza", "Yoshi"),
    },
    DeviceModel {
        ids: &[0x24, 0x1B, 0x1C, 0x1D, 0x1F, 0x20],
        quirks: kindle("PaperWhite", "Celeste", "Yoshime").pearl().dpi(212),
    },
    DeviceModel {
        ids: &[
            0xD4, 0x5A, 0xD5, 0xD6, 0xD7, 0xD8, 0xF2, 0x17, 0x60, 0xF4, 0xF9, 0x62, 0x61, 0x5F,
        ],
        quirks: kindle("PaperWhite 2", "Pinot", "Wario").dpi(212),
    },
    DeviceModel {
        ids: &[0xC6],
        quirks: kindle("Basic", "Bourbon", "Wario"),
    },
    DeviceModel {
        ids: &[0x13, 0x16, 0x21, 0x54, 0x2A, 0x4F, 0x52, 0x53],
        quirks: kindle("Voyage", "Icewine", "Wario").dpi(300),
    },
    DeviceModel {
        ids: &[0x07, 0x0B, 0x0C, 0x0D, 0x99, 0xDD],
        quirks: kindle("Basic", "Bourbon", "Wario"),
    },
];

/// Devices identified by a 3-character base-32 code
pub static KINDLE_MODELS: &[DeviceModel] = &[
    DeviceModel {
        ids: &[
            0x201, 0x202, 0x204, 0x205, 0x206, 0x207, 0x26B, 0x26C, 0x26D, 0x26E, 0x26F, 0x270,
            0x293, 0x294,
        ],
        quirks: kindle("PaperWhite 3", "Muscat", "Wario").dpi(300),
    },
    DeviceModel {
        ids: &[0x20C, 0x20D, 0x219, 0x21A, 0x21B, 0x21C],
        quirks: kindle("Oasis", "Whisky", "Duet").dpi(300),
    },
    DeviceModel {
        ids: &[0x1BC, 0x269, 0x26A],
        quirks: kindle("Basic 2", "Eanab", "Heisenberg"),
    },
    DeviceModel {
        ids: &[
            0x295, 0x296, 0x297, 0x298, 0x2E1, 0x2E2, 0x2E6, 0x2E7, 0x2E8, 0x341, 0x342, 0x343,
            0x344, 0x347, 0x34A,
        ],
        quirks: zelda("Oasis 2", "Cognac"),
    },
    DeviceModel {
        ids: &[
            0x2F7, 0x361, 0x362, 0x363, 0x364, 0x365, 0x366, 0x367, 0x372, 0x373, 0x374, 0x375,
            0x376, 0x402, 0x403, 0x4D8, 0x4D9, 0x4DA, 0x4DB, 0x4DC, 0x4DD,
        ],
        quirks: rex("PaperWhite 4", "Moonshine").dpi(300),
    },
    DeviceModel {
        ids: &[0x414, 0x3CF, 0x3D0, 0x3D1, 0x3D2, 0x3AB],
        quirks: rex("Basic 3", "Jaeger"),
    },
    DeviceModel {
        ids: &[0x434, 0x3D8, 0x3D7, 0x3D6, 0x3D5, 0x3D4],
        quirks: zelda("Oasis 3", "Stinger"),
    },
    DeviceModel {
        ids: &[
            0x690, 0x700, 0x6FF, 0x7AD, 0x829, 0x82A, 0x971, 0x972, 0x9B3,
        ],
        quirks: mtk("PaperWhite 5", "Malbec"),
    },
    DeviceModel {
        ids: &[0x84D, 0x8BB, 0x86A, 0x958, 0x957, 0x7F1, 0x84C],
        quirks: mtk("Basic 4", "Cava"),
    },
];

/// Quirks for a Kindle whose code matched neither table.
pub const KINDLE_UNKNOWN: DeviceQuirks =
    DeviceQuirks::new(DeviceFamily::Kindle, "Unknown", "Unknown", "Unknown");

/// Decode a device code in the Kindle base-32 alphabet.
///
/// Returns `None` for an empty code, a character outside the alphabet, or overflow.
pub fn decode_base32(code: &str) -> Option<u32> {
    if code.is_empty() {
        return None;
    }
    code.bytes().try_fold(0u32, |acc, ch| {
        let digit = KINDLE_BASE32_ALPHABET.iter().position(|&c| c == ch)?;
        acc.checked_mul(32)?.checked_add(u32::try_from(digit).ok()?)
    })
}

/// Encode a device id in the Kindle base-32 alphabet, without leading zeroes (`0x2F7` → `"PP"`).
#[cfg(feature = "std")]
pub fn encode_base32(mut value: u32) -> String {
    let mut digits = Vec::new();
    loop {
        let digit = KINDLE_BASE32_ALPHABET
            .get((value & 31) as usize)
            .copied()
            .unwrap_or(b'?');
        digits.push(char::from(digit));
        value = value.wrapping_shr(5);
        if value == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

/// Where the device code sits in a serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialScheme {
    /// Two hex digits at offset 2
    Hex,
    /// Three base-32 digits at offset 3
    Base32,
}

impl SerialScheme {
    /// Pick the scheme from the first character of the serial.
    pub fn for_serial(serial: &[u8]) -> Self {
        match serial.first() {
            Some(b'B' | b'9') => SerialScheme::Hex,
            _ => SerialScheme::Base32,
        }
    }

    /// Extract and decode the device code, `None` if the serial is too short or malformed.
    pub fn device_code(self, serial: &[u8]) -> Option<u16> {
        let (range, radix) = match self {
            SerialScheme::Hex => (2..4, 16),
            SerialScheme::Base32 => (3..6, 32),
        };
        let code = core::str::from_utf8(serial.get(range)?).ok()?;
        let value = if radix == 16 {
            u32::from_str_radix(code, 16).ok()?
        } else {
            decode_base32(code)?
        };
        u16::try_from(value).ok()
    }

    /// Table of models using this scheme
    pub fn models(self) -> &'static [DeviceModel] {
        match self {
            SerialScheme::Hex => KINDLE_LEGACY_ID_MODELS,
            SerialScheme::Base32 => KINDLE_MODELS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::lookup;

    #[test]
    fn test_decode_base32() {
        assert_eq!(decode_base32("0"), Some(0));
        assert_eq!(decode_base32("10"), Some(32));
        // PaperWhite 4
        assert_eq!(decode_base32("0PP"), Some(0x2F7));
        // 'I' and 'O' are not part of the alphabet
        assert_eq!(decode_base32("0I0"), None);
        assert_eq!(decode_base32(""), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_encode_base32() {
        assert_eq!(encode_base32(0x2F7), "PP");
        assert_eq!(decode_base32(&encode_base32(0x9B3)), Some(0x9B3));
    }

    #[test]
    fn test_hex_serial() {
        let serial = b"B024XXXXXXXXXXXX";
        let scheme = SerialScheme::for_serial(serial);
        assert_eq!(scheme, SerialScheme::Hex);
        assert_eq!(scheme.device_code(serial), Some(0x24));
        let q = lookup(scheme.models(), 0x24).unwrap();
        assert_eq!(q.name, "PaperWhite");
        assert!(q.is_kindle_pearl);
    }

    #[test]
    fn test_base32_serial() {
        let serial = b"G090PPXXXXXXXXXX";
        let scheme = SerialScheme::for_serial(serial);
        assert_eq!(scheme, SerialScheme::Base32);
        assert_eq!(scheme.device_code(serial), Some(0x2F7));
        let q = lookup(scheme.models(), 0x2F7).unwrap();
        assert_eq!(q.codename, "Moonshine");
        assert_eq!(q.refresh_abi, RefreshAbi::KindleRex);
    }

    #[test]
    fn test_legacy_devices_cannot_hw_invert() {
        for model in KINDLE_LEGACY_ID_MODELS {
            assert_eq!(model.quirks.can_hw_invert, !model.quirks.is_legacy);
        }
    }

    #[test]
    fn test_short_serial() {
        assert_eq!(SerialScheme::Base32.device_code(b"G09"), None);
    }
}
