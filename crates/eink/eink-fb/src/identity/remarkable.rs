//! reMarkable: SoC machine name

use eink_specs::devices::lookup;
use eink_specs::devices::remarkable::{device_id_for_machine, REMARKABLE_MODELS};
use eink_specs::{DeviceFamily, DeviceQuirks};

use super::{read_text, Inputs};
use crate::diag::{self, detail};

pub(crate) fn identify(inputs: &Inputs<'_>) -> Option<DeviceQuirks> {
    match read_text(&inputs.sources.remarkable_machine) {
        Ok(machine) if machine.trim_start().starts_with("reMarkable") => Some(for_machine(inputs, &machine)),
        Ok(machine) => {
            detail!(inputs.diag, target: diag::IDENTITY, "SoC machine \"{}\" is not a reMarkable", machine.trim_end());
            None
        }
        Err(err) => {
            inputs.source_failed(&err);
            None
        }
    }
}

/// Explicitly requested: an unreadable machine name means a first generation unit.
pub(crate) fn identify_or_default(inputs: &Inputs<'_>) -> DeviceQuirks {
    match read_text(&inputs.sources.remarkable_machine) {
        Ok(machine) => for_machine(inputs, &machine),
        Err(err) => {
            inputs.source_failed(&err);
            for_machine(inputs, "")
        }
    }
}

fn for_machine(inputs: &Inputs<'_>, machine: &str) -> DeviceQuirks {
    let id = device_id_for_machine(machine);
    detail!(inputs.diag, target: diag::IDENTITY, "reMarkable generation {id}");
    lookup(REMARKABLE_MODELS, id)
        .unwrap_or_else(|| DeviceQuirks::new(DeviceFamily::Remarkable, "reMarkable", "Unknown", "reMarkable"))
}
