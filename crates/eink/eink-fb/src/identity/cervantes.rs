//! Cervantes: PCB id from the NTX HW CONFIG block

use eink_specs::devices::cervantes::{CERVANTES_MODELS, CERVANTES_UNKNOWN};
use eink_specs::devices::lookup;
use eink_specs::DeviceQuirks;

use super::{hwconfig, Inputs};
use crate::diag::{self, detail};
use crate::error::SourceError;

pub(crate) fn identify(inputs: &Inputs<'_>) -> Option<DeviceQuirks> {
    let block = hwconfig::read_first(&inputs.sources.hwconfig, |err| inputs.source_failed(err))?;
    let Some(fields) = block.fields() else {
        return Some(CERVANTES_UNKNOWN);
    };
    detail!(inputs.diag, target: diag::IDENTITY, "HW CONFIG {} PCB {}", block.version, fields.pcb);
    Some(lookup(CERVANTES_MODELS, u16::from(fields.pcb)).unwrap_or_else(|| {
        inputs.source_failed(&SourceError::UnknownId(u32::from(fields.pcb)));
        CERVANTES_UNKNOWN
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HwConfigLocation, IdentitySources};
    use crate::diag::Diagnostics;
    use crate::identity::hwconfig::HWCONFIG_MAGIC;

    #[test]
    fn test_pcb_is_the_device_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mmcblk0");
        let mut block = vec![0u8; 1024];
        block.extend_from_slice(HWCONFIG_MAGIC);
        block.extend_from_slice(b"v1.7\0");
        block.push(8);
        block.extend_from_slice(&[51, 0, 0, 0, 0, 0, 0, 0]);
        std::fs::write(&path, &block).unwrap();

        let sources = IdentitySources {
            hwconfig: vec![HwConfigLocation { path, offset: 1024 }],
            ..Default::default()
        };
        let quirks = identify(&Inputs {
            sources: &sources,
            pocketbook_model: None,
            diag: Diagnostics::QUIET,
        })
        .unwrap();
        assert_eq!(quirks.device_id, 51);
        assert_eq!(quirks.name, "3");
    }
}
