//! reMarkable device table
//!
//! The SoC machine name (`/sys/devices/soc0/machine`) tells the two generations apart.

use super::DeviceModel;
use crate::device_quirks::{DeviceFamily, DeviceQuirks, RotationQuirk};

/// Machine name reported by the second generation
pub const REMARKABLE_2_MACHINE: &str = "reMarkable 2.0";

const fn remarkable(name: &'static str, codename: &'static str) -> DeviceQuirks {
    DeviceQuirks::new(DeviceFamily::Remarkable, name, codename, "reMarkable")
        .dpi(226)
        .boot_rotation(1)
        .rotation_quirk(RotationQuirk::Sane)
        .rotatable()
}

/// Known reMarkable devices
pub static REMARKABLE_MODELS: &[DeviceModel] = &[
    DeviceModel {
        ids: &[1],
        quirks: remarkable("reMarkable", "Zero Gravitas").hw_invert(true),
    },
    DeviceModel {
        ids: &[2],
        quirks: remarkable("reMarkable 2", "Zero Sugar"),
    },
];

/// Device id for a SoC machine name. Anything but the rM2 tag is a first generation unit.
pub fn device_id_for_machine(machine: &str) -> u16 {
    if machine.trim_end() == REMARKABLE_2_MACHINE {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::lookup;

    #[test]
    fn test_machine_tags() {
        assert_eq!(device_id_for_machine("reMarkable 2.0\n"), 2);
        assert_eq!(device_id_for_machine("reMarkable Prototype 1"), 1);

        let rm2 = lookup(REMARKABLE_MODELS, 2).unwrap();
        assert!(!rm2.can_hw_invert);
        assert_eq!(rm2.codename, "Zero Sugar");
        let rm1 = lookup(REMARKABLE_MODELS, 1).unwrap();
        assert!(rm1.can_hw_invert);
        assert_eq!(rm1.boot_rotation, 1);
    }
}
