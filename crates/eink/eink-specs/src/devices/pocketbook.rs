//! PocketBook device table
//!
//! PocketBook firmware reports a model name string (e.g., `"PB632"` or `"PocketBook 626"`),
//! and several spellings exist for the same board.

use crate::device_quirks::{DeviceFamily, DeviceQuirks};

/// One PocketBook model, with every model name it ships under.
#[derive(Debug, Clone, Copy)]
pub struct PocketBookModel {
    /// Model name strings
    pub names: &'static [&'static str],
    /// Quirks, `device_id` filled in
    pub quirks: DeviceQuirks,
}

const fn pb(id: u16, dpi: u16, codename: &'static str) -> DeviceQuirks {
    DeviceQuirks::new(DeviceFamily::PocketBook, codename, codename, "PocketBook")
        .with_id(id)
        .dpi(dpi)
        .hw_invert(true)
}

/// Known PocketBook models
pub static POCKETBOOK_MODELS: &[PocketBookModel] = &[
    PocketBookModel {
        names: &["PocketBook 515"],
        quirks: pb(515, 200, "PBMini"),
    },
    PocketBookModel {
        names: &["PB606", "PocketBook 606"],
        quirks: pb(606, 212, "PB606"),
    },
    PocketBookModel {
        names: &["PocketBook 611"],
        quirks: pb(611, 167, "PB611"),
    },
    PocketBookModel {
        names: &["PocketBook 613"],
        quirks: pb(613, 167, "PB613B"),
    },
    PocketBookModel {
        names: &["PocketBook 614", "PocketBook 614W"],
        quirks: pb(614, 167, "PB614W"),
    },
    PocketBookModel {
        names: &["PB615", "PB615W", "PocketBook 615", "PocketBook 615W"],
        quirks: pb(615, 212, "PBBLux"),
    },
    PocketBookModel {
        names: &["PB616", "PB616W", "PocketBook 616", "PocketBook 616W"],
        quirks: pb(616, 212, "PBBLux2"),
    },
    PocketBookModel {
        names: &["PB617", "PocketBook 617"],
        quirks: pb(617, 212, "PBBLux3"),
    },
    PocketBookModel {
        names: &["PocketBook 622"],
        quirks: pb(622, 167, "PBTouch"),
    },
    PocketBookModel {
        names: &["PocketBook 623"],
        quirks: pb(623, 212, "PBLux"),
    },
    PocketBookModel {
        names: &["PocketBook 624"],
        quirks: pb(624, 167, "PBBTouch"),
    },
    PocketBookModel {
        names: &["PB625"],
        quirks: pb(625, 167, "PBBTouch2"),
    },
    PocketBookModel {
        names: &["PB626", "PB626(2)-TL3", "PocketBook 626"],
        quirks: pb(626, 212, "PBLux3"),
    },
    PocketBookModel {
        names: &["PB627"],
        quirks: pb(627, 212, "PBLux4"),
    },
    PocketBookModel {
        names: &["PB628"],
        quirks: pb(628, 212, "PBLux5"),
    },
    PocketBookModel {
        names: &["PocketBook 630"],
        quirks: pb(630, 212, "PBSense"),
    },
    PocketBookModel {
        names: &["PB631", "PocketBook 631"],
        quirks: pb(631, 300, "PBTouchHD"),
    },
    PocketBookModel {
        names: &["PB632"],
        quirks: pb(632, 300, "PBTouchHD+"),
    },
    PocketBookModel {
        names: &["PB633"],
        quirks: pb(633, 300, "PBColor"),
    },
    PocketBookModel {
        names: &["PB640", "PocketBook 640"],
        quirks: pb(640, 167, "PBAqua"),
    },
    PocketBookModel {
        names: &["PB641"],
        quirks: pb(641, 212, "PBAqua2"),
    },
    PocketBookModel {
        names: &["PB650", "PocketBook 650"],
        quirks: pb(650, 212, "PBUltra"),
    },
    PocketBookModel {
        names: &["PB740"],
        quirks: pb(740, 300, "PBInkPad3"),
    },
    PocketBookModel {
        names: &["PB740-2", "PB740-3"],
        quirks: pb(742, 300, "PBInkPad3Pro"),
    },
    PocketBookModel {
        names: &["PB741"],
        quirks: pb(741, 300, "PBInkPadColor"),
    },
    PocketBookModel {
        names: &["PocketBook 840"],
        quirks: pb(840, 250, "PBInkPad"),
    },
    PocketBookModel {
        names: &["PB1040"],
        quirks: pb(1040, 227, "PBInkPadX"),
    },
    PocketBookModel {
        names: &["PocketBook Color Lux"],
        quirks: pb(0x7F7D, 125, "PBColorLux"),
    },
    PocketBookModel {
        names: &["PB970"],
        quirks: pb(970, 150, "PBInkPadLite"),
    },
];

/// Quirks for a model name missing from the table
pub const POCKETBOOK_UNIDENTIFIED: DeviceQuirks = pb(0, 212, "Unidentified");

/// Quirks when the firmware reported no model name at all
pub const POCKETBOOK_UNKNOWN: DeviceQuirks = pb(0, 212, "Unknown");

/// Resolve a model name. Always succeeds: unknown names get [`POCKETBOOK_UNIDENTIFIED`].
pub fn lookup_model(model: Option<&str>) -> DeviceQuirks {
    let Some(model) = model.map(str::trim).filter(|m| !m.is_empty()) else {
        return POCKETBOOK_UNKNOWN;
    };
    POCKETBOOK_MODELS
        .iter()
        .find(|entry| entry.names.contains(&model))
        .map_or(POCKETBOOK_UNIDENTIFIED, |entry| entry.quirks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_variants() {
        assert_eq!(lookup_model(Some("PB615W")).device_id, 615);
        assert_eq!(lookup_model(Some("PocketBook 615")).device_id, 615);
        assert_eq!(lookup_model(Some("PB740-3")).device_id, 742);
        assert_eq!(lookup_model(Some("PB740-3")).codename, "PBInkPad3Pro");
    }

    #[test]
    fn test_unknown_models() {
        let q = lookup_model(Some("PB9000"));
        assert_eq!(q.codename, "Unidentified");
        assert_eq!(q.screen_dpi, 212);
        assert_eq!(lookup_model(None).codename, "Unknown");
        assert_eq!(lookup_model(Some("  ")).codename, "Unknown");
    }

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in POCKETBOOK_MODELS.iter().enumerate() {
            for b in POCKETBOOK_MODELS.iter().skip(i + 1) {
                assert_ne!(a.quirks.device_id, b.quirks.device_id);
            }
        }
    }
}
