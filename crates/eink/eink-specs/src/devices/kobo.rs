//! Kobo device table
//!
//! Kobo devices are identified by a 3-digit product id (e.g., 377 for the Forma). The id can
//! come from Nickel's version tag, from the NTX "HW CONFIG" block (through a PCB id → product
//! id LUT), or, on mainline kernels, from the device-tree `compatible` strings.

use super::DeviceModel;
use crate::device_quirks::{DeviceFamily, DeviceQuirks, RefreshAbi, RotationQuirk};

/// Payload index of the PCB id in the NTX HW CONFIG block
pub const HWCFG_PCB: usize = 0;
/// Payload index of the CPU id
pub const HWCFG_CPU: usize = 27;
/// Payload index of the display resolution
pub const HWCFG_DISPLAY_RESOLUTION: usize = 31;
/// `HWCFG_CPU` value for an i.MX 6SLL
pub const HWCFG_CPU_MX6SLL: u8 = 10;
/// `HWCFG_DISPLAY_RESOLUTION` value for 800x600
pub const HWCFG_DISPLAY_RESOLUTION_800_600: u8 = 0;

/// Aura H2O² (Mk. 6)
pub const KOBO_AURA_H2O_2: u16 = 374;
/// Aura SE (Mk. 6)
pub const KOBO_AURA_SE: u16 = 375;
/// Glo HD
pub const KOBO_GLO_HD: u16 = 371;
/// Touch 2.0
pub const KOBO_TOUCH_2: u16 = 372;
/// Aura ONE
pub const KOBO_AURA_ONE: u16 = 373;
/// Aura ONE Limited Edition (32GB)
pub const KOBO_AURA_ONE_LE: u16 = 381;
/// Forma
pub const KOBO_FORMA: u16 = 377;
/// Forma 32GB
pub const KOBO_FORMA_32GB: u16 = 380;

/// Tolino Shine 2HD, mainline kernel
pub const MAINLINE_TOLINO_SHINE_2HD: u16 = 0x7F73;
/// Tolino Shine 3, mainline kernel
pub const MAINLINE_TOLINO_SHINE_3: u16 = 0x7F78;
/// Tolino Vision 5, mainline kernel
pub const MAINLINE_TOLINO_VISION_5: u16 = 0x7F80;
/// Any i.MX5 board, mainline kernel
pub const MAINLINE_GENERIC_IMX5: u16 = 0x6F7D;
/// Any i.MX6 board, mainline kernel
pub const MAINLINE_GENERIC_IMX6: u16 = 0x6F7F;
/// Any Allwinner B300 board, mainline kernel
pub const MAINLINE_GENERIC_SUNXI_B300: u16 = 0x5773;

/// NTX PCB id → Kobo product id. 0 marks PCBs that never shipped in a Kobo.
pub static KOBO_PCB_IDS: [u16; 115] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 310, 0, 0, 0, 0, 0, 0, 0, 310, 320, 0, 0, 330, 0, 0, 340,
    350, 0, 0, 0, 0, 0, 360, 360, 675, 330, 0, 0, 0, 370, 0, 0, 0, 0, 371, 0, 0, 0, 671, 0, 0, 0,
    0, 373, 0, 0, 0, 375, 374, 0, 0, 375, 0, 0, 375, 0, 0, 0, 0, 0, 0, 376, 376, 377, 0, 0, 0, 0,
    0, 382, 0, 0, 0, 0, 0, 384, 0, 0, 0, 0, 0, 0, 387, 0, 0, 0, 383, 0, 0, 388, 0, 386, 0, 0, 0,
    0, 389, 0, 0, 390, 0, 391, 0,
];

/// Device-tree `compatible` string → product id, in `fsl.yaml` order.
pub static MAINLINE_COMPATIBLES: &[(&str, u16)] = &[
    ("kobo,aura", 360),
    ("kobo,tolino-shine2hd", MAINLINE_TOLINO_SHINE_2HD),
    ("kobo,tolino-shine3", MAINLINE_TOLINO_SHINE_3),
    ("kobo,tolino-vision5", MAINLINE_TOLINO_VISION_5),
    ("kobo,clarahd", 376),
    ("kobo,librah2o", 384),
    ("fsl,imx6sl", MAINLINE_GENERIC_IMX6),
    ("fsl,imx6sll", MAINLINE_GENERIC_IMX6),
    ("fsl,imx6ull", MAINLINE_GENERIC_IMX6),
    ("fsl,imx50", MAINLINE_GENERIC_IMX5),
    ("allwinner,sun8iw15p1", MAINLINE_GENERIC_SUNXI_B300),
];

// Most boards boot UD, with a straight rotation scheme.
const fn kobo(name: &'static str, codename: &'static str, platform: &'static str) -> DeviceQuirks {
    DeviceQuirks::new(DeviceFamily::Kobo, name, codename, platform)
        .boot_rotation(2)
        .hw_invert(true)
}

const fn mk7(name: &'static str, codename: &'static str, platform: &'static str) -> DeviceQuirks {
    kobo(name, codename, platform).abi(RefreshAbi::MxcfbV2)
}

const fn sunxi(name: &'static str, codename: &'static str, platform: &'static str) -> DeviceQuirks {
    kobo(name, codename, platform)
        .sunxi()
        .eclipse()
        .hw_invert(false)
        .rotatable()
}

/// Known Kobo devices
pub static KOBO_MODELS: &[DeviceModel] = &[
    DeviceModel {
        ids: &[310],
        quirks: kobo("Touch A/B", "Trilogy", "Mark 3"),
    },
    DeviceModel {
        ids: &[320],
        quirks: kobo("Touch C", "Trilogy", "Mark 4"),
    },
    DeviceModel {
        ids: &[340],
        quirks: kobo("Mini", "Pixie", "Mark 4").dpi(200),
    },
    DeviceModel {
        ids: &[330],
        quirks: kobo("Glo", "Kraken", "Mark 4").dpi(212),
    },
    DeviceModel {
        ids: &[KOBO_GLO_HD],
        quirks: kobo("Glo HD", "Alyssum", "Mark 6").dpi(300),
    },
    DeviceModel {
        ids: &[KOBO_TOUCH_2],
        quirks: kobo("Touch 2.0", "Pika", "Mark 6"),
    },
    DeviceModel {
        ids: &[360],
        // The bottom 10 rows sit behind the bezel; PxP inversion may crash the kernel.
        quirks: kobo("Aura", "Phoenix", "Mark 5")
            .vert_offset(-10)
            .hw_invert(false)
            .dpi(212),
    },
    DeviceModel {
        ids: &[350],
        quirks: kobo("Aura HD", "Dragon", "Mark 4")
            .boot_rotation(0)
            .rotation_quirk(RotationQuirk::AllInverted)
            .dpi(265),
    },
    DeviceModel {
        ids: &[370],
        // The top 11 rows sit behind the bezel.
        quirks: kobo("Aura H2O", "Dahlia", "Mark 5")
            .vert_offset(11)
            .boot_rotation(0)
            .rotation_quirk(RotationQuirk::AllInverted)
            .dpi(265),
    },
    DeviceModel {
        ids: &[KOBO_AURA_H2O_2],
        quirks: kobo("Aura H2O²", "Snow", "Mark 6").boot_rotation(0).dpi(265),
    },
    DeviceModel {
        ids: &[378],
        quirks: mk7("Aura H2O² r2", "Snow", "Mark 7").boot_rotation(0).dpi(265),
    },
    DeviceModel {
        ids: &[KOBO_AURA_ONE],
        quirks: kobo("Aura One", "Daylight", "Mark 6").dpi(300),
    },
    DeviceModel {
        ids: &[KOBO_AURA_ONE_LE],
        quirks: kobo("Aura One LE", "Daylight", "Mark 6").dpi(300),
    },
    DeviceModel {
        ids: &[KOBO_AURA_SE],
        quirks: kobo("Aura SE", "Star", "Mark 6").dpi(212),
    },
    DeviceModel {
        ids: &[379],
        quirks: mk7("Aura SE r2", "Star", "Mark 7").dpi(212),
    },
    DeviceModel {
        ids: &[376],
        quirks: mk7("Clara HD", "Nova", "Mark 7").dpi(300),
    },
    DeviceModel {
        ids: &[KOBO_FORMA],
        quirks: mk7("Forma", "Frost", "Mark 7")
            .rotatable()
            .rotation_quirk(RotationQuirk::OddInverted)
            .dpi(300),
    },
    DeviceModel {
        ids: &[KOBO_FORMA_32GB],
        quirks: mk7("Forma 32GB", "Frost", "Mark 7")
            .rotatable()
            .rotation_quirk(RotationQuirk::OddInverted)
            .dpi(300),
    },
    DeviceModel {
        ids: &[384],
        quirks: mk7("Libra H2O", "Storm", "Mark 7")
            .boot_rotation(0)
            .rotatable()
            .rotation_quirk(RotationQuirk::Sane)
            .unreliable_wait()
            .dpi(300),
    },
    DeviceModel {
        ids: &[382],
        quirks: mk7("Nia", "Luna", "Mark 7").unreliable_wait().dpi(212),
    },
    DeviceModel {
        ids: &[387],
        quirks: sunxi("Elipsa", "Europa", "Mark 8").boot_rotation(3).dpi(227),
    },
    DeviceModel {
        ids: &[388],
        quirks: mk7("Libra 2", "Io", "Mark 9")
            .eclipse()
            .boot_rotation(0)
            .rotatable()
            .unreliable_wait()
            .dpi(300),
    },
    DeviceModel {
        ids: &[383],
        quirks: sunxi("Sage", "Cadmus", "Mark 8").boot_rotation(1).dpi(300),
    },
    DeviceModel {
        ids: &[386],
        quirks: mk7("Clara 2E", "Goldfinch", "Mark 10")
            .eclipse()
            .rotation_quirk(RotationQuirk::OddInverted)
            .unreliable_wait()
            .dpi(300),
    },
    // Mainline kernels expect the Mk. 7 ioctls, even on older boards.
    DeviceModel {
        ids: &[MAINLINE_TOLINO_SHINE_2HD],
        quirks: mk7("Shine 2HD", "Mainline", "Tolino").dpi(300),
    },
    DeviceModel {
        ids: &[MAINLINE_TOLINO_SHINE_3],
        quirks: mk7("Shine 3", "Mainline", "Tolino").dpi(300),
    },
    DeviceModel {
        ids: &[MAINLINE_TOLINO_VISION_5],
        quirks: mk7("Vision 5", "Mainline", "Tolino")
            .boot_rotation(0)
            .rotatable()
            .rotation_quirk(RotationQuirk::Sane)
            .dpi(300),
    },
    DeviceModel {
        ids: &[MAINLINE_GENERIC_IMX5],
        quirks: kobo("i.MX5", "Mainline", "Mark <= 5").dpi(212),
    },
    DeviceModel {
        ids: &[MAINLINE_GENERIC_IMX6],
        quirks: mk7("i.MX6", "Mainline", "Mark >= 6").dpi(212),
    },
    DeviceModel {
        ids: &[MAINLINE_GENERIC_SUNXI_B300],
        quirks: sunxi("B300", "Mainline", "Mark 8").boot_rotation(0).dpi(227),
    },
];

/// Quirks for an unidentified Kobo: NTX v1 ioctls, everything else at safe defaults.
pub const KOBO_UNKNOWN: DeviceQuirks =
    DeviceQuirks::new(DeviceFamily::Kobo, "Unknown", "??", "Mark ?");

/// The product id encoded in Nickel's version tag: its last three characters, in decimal.
pub fn product_id_from_version_tag(tag: &str) -> Option<u16> {
    let tag = tag.trim_end_matches(['\n', '\r', '\0']);
    let start = tag.len().checked_sub(3)?;
    tag.get(start..)?.parse().ok()
}

/// HW CONFIG payload fields relevant to product identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HwConfigFields {
    /// PCB id (index into [`KOBO_PCB_IDS`])
    pub pcb: u8,
    /// CPU id, if the payload is long enough
    pub cpu: Option<u8>,
    /// Display resolution id, if the payload is long enough
    pub display_resolution: Option<u8>,
}

impl HwConfigFields {
    /// Pick the fields out of a raw payload. `None` if the payload is empty.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        Some(Self {
            pcb: *payload.get(HWCFG_PCB)?,
            cpu: payload.get(HWCFG_CPU).copied(),
            display_resolution: payload.get(HWCFG_DISPLAY_RESOLUTION).copied(),
        })
    }
}

/// Map HW CONFIG fields to a product id.
///
/// Several products share a PCB; the CPU, panel resolution and storage size tell them apart.
/// Returns `None` for PCB ids outside the LUT or unknown to it.
pub fn product_id_from_hwconfig(fields: HwConfigFields, storage_bytes: u64) -> Option<u16> {
    let id = *KOBO_PCB_IDS.get(usize::from(fields.pcb))?;
    let id = match id {
        KOBO_AURA_H2O_2 | KOBO_AURA_SE if fields.cpu == Some(HWCFG_CPU_MX6SLL) => {
            // Mk. 7 revisions: 374 -> 378, 375 -> 379
            id.checked_add(4)?
        }
        KOBO_GLO_HD if fields.display_resolution == Some(HWCFG_DISPLAY_RESOLUTION_800_600) => {
            KOBO_TOUCH_2
        }
        KOBO_AURA_ONE | KOBO_FORMA if storage_bytes >> 30 > 8 => {
            if id == KOBO_AURA_ONE {
                KOBO_AURA_ONE_LE
            } else {
                KOBO_FORMA_32GB
            }
        }
        other => other,
    };
    (id != 0).then_some(id)
}

/// Product id for the first recognized device-tree `compatible` string.
pub fn product_id_from_compatible<'a>(compatibles: impl IntoIterator<Item = &'a str>) -> Option<u16> {
    compatibles.into_iter().find_map(|compat| {
        MAINLINE_COMPATIBLES
            .iter()
            .find(|(name, _)| *name == compat)
            .map(|&(_, id)| id)
    })
}
