//! BQ Cervantes device table
//!
//! Cervantes boards are NTX designs too; the PCB id from the HW CONFIG block is the device id.

use super::DeviceModel;
use crate::device_quirks::{DeviceFamily, DeviceQuirks};

const fn cervantes(name: &'static str) -> DeviceQuirks {
    DeviceQuirks::new(DeviceFamily::Cervantes, name, "Cervantes", "Cervantes").boot_rotation(2)
}

/// Known Cervantes devices, keyed by PCB id
pub static CERVANTES_MODELS: &[DeviceModel] = &[
    DeviceModel {
        ids: &[22],
        quirks: cervantes("Touch"),
    },
    DeviceModel {
        ids: &[23],
        quirks: cervantes("TouchLight"),
    },
    DeviceModel {
        ids: &[33],
        quirks: cervantes("2013").dpi(212),
    },
    DeviceModel {
        ids: &[51],
        quirks: cervantes("3").dpi(300),
    },
    DeviceModel {
        ids: &[68],
        quirks: cervantes("4").dpi(300),
    },
];

/// Quirks for an unidentified Cervantes
pub const CERVANTES_UNKNOWN: DeviceQuirks = cervantes("Unknown");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_quirks::RefreshAbi;
    use crate::devices::lookup;

    #[test]
    fn test_cervantes_lookup() {
        let q = lookup(CERVANTES_MODELS, 51).unwrap();
        assert_eq!(q.name, "3");
        assert_eq!(q.screen_dpi, 300);
        assert_eq!(q.refresh_abi, RefreshAbi::MxcfbV1);
        assert!(!q.can_hw_invert);
        assert!(lookup(CERVANTES_MODELS, 50).is_none());
    }
}
