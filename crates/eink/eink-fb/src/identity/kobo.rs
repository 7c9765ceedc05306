//! Kobo: Nickel version tag, then the NTX HW CONFIG block, then the device tree

use eink_specs::devices::kobo::{
    product_id_from_compatible, product_id_from_hwconfig, product_id_from_version_tag,
    KOBO_MODELS, KOBO_UNKNOWN,
};
use eink_specs::devices::lookup;
use eink_specs::DeviceQuirks;

use super::hwconfig::{self, HwConfig};
use super::{read_text, Inputs};
use crate::diag::{self, detail};
use crate::error::SourceError;

pub(crate) fn identify(inputs: &Inputs<'_>) -> Option<DeviceQuirks> {
    // A present but unusable version tag is still proof of a Kobo
    let mut evidence = false;

    let id = match from_version_tag(inputs) {
        Ok(id) => Some(id),
        Err(err) => {
            evidence |= !matches!(err, SourceError::Unavailable { .. });
            inputs.source_failed(&err);
            None
        }
    }
    .or_else(|| from_hwconfig(inputs))
    .or_else(|| from_device_tree(inputs));

    match id {
        Some(id) => Some(lookup(KOBO_MODELS, id).unwrap_or_else(|| {
            inputs.source_failed(&SourceError::UnknownId(u32::from(id)));
            KOBO_UNKNOWN
        })),
        None if evidence => Some(KOBO_UNKNOWN),
        None => None,
    }
}

fn from_version_tag(inputs: &Inputs<'_>) -> Result<u16, SourceError> {
    let path = &inputs.sources.kobo_version;
    let tag = read_text(path)?;
    let id = product_id_from_version_tag(&tag)
        .ok_or_else(|| SourceError::malformed(path, "no device code in version tag"))?;
    detail!(inputs.diag, target: diag::IDENTITY, "Kobo version tag says device {id}");
    Ok(id)
}

fn from_hwconfig(inputs: &Inputs<'_>) -> Option<u16> {
    let block = hwconfig::read_first(&inputs.sources.hwconfig, |err| inputs.source_failed(err))?;
    product_id(inputs, &block)
}

fn product_id(inputs: &Inputs<'_>, block: &HwConfig) -> Option<u16> {
    let fields = block.fields()?;
    let storage = match hwconfig::storage_size(&inputs.sources.storage_device) {
        Ok(size) => size,
        Err(err) => {
            inputs.source_failed(&err);
            0
        }
    };
    let id = product_id_from_hwconfig(fields, storage);
    match id {
        Some(id) => {
            detail!(inputs.diag, target: diag::IDENTITY, "HW CONFIG {} PCB {} says device {id}", block.version, fields.pcb);
        }
        None => inputs.source_failed(&SourceError::UnknownId(u32::from(fields.pcb))),
    }
    id
}

fn from_device_tree(inputs: &Inputs<'_>) -> Option<u16> {
    let path = &inputs.sources.dt_compatible;
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            inputs.source_failed(&SourceError::unavailable(path, e));
            return None;
        }
    };
    let compatibles = raw
        .split(|&b| b == 0)
        .filter_map(|s| core::str::from_utf8(s).ok())
        .filter(|s| !s.is_empty());
    let id = product_id_from_compatible(compatibles)?;
    detail!(inputs.diag, target: diag::IDENTITY, "device tree says device {id:#x}");
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HwConfigLocation, IdentitySources};
    use crate::diag::Diagnostics;
    use crate::identity::hwconfig::HWCONFIG_MAGIC;
    use std::io::Write;
    use std::path::PathBuf;

    fn sources(dir: &tempfile::TempDir) -> IdentitySources {
        IdentitySources {
            kobo_version: dir.path().join("version"),
            hwconfig: vec![HwConfigLocation {
                path: dir.path().join("hwcfg"),
                offset: 0,
            }],
            storage_device: dir.path().join("disk"),
            dt_compatible: dir.path().join("compatible"),
            ..Default::default()
        }
    }

    fn run(sources: &IdentitySources) -> Option<DeviceQuirks> {
        identify(&Inputs {
            sources,
            pocketbook_model: None,
            diag: Diagnostics::QUIET,
        })
    }

    fn write(path: PathBuf, bytes: &[u8]) {
        std::fs::File::create(path).unwrap().write_all(bytes).unwrap();
    }

    #[test]
    fn test_version_tag() {
        let dir = tempfile::tempdir().unwrap();
        let sources = sources(&dir);
        write(
            sources.kobo_version.clone(),
            b"N249000000000,4.38.21908,4.38.21908,4.38.21908,4.38.21908,00000000-0000-0000-0000-000000000387\n",
        );
        assert_eq!(run(&sources).unwrap().name, "Elipsa");
    }

    #[test]
    fn test_falls_back_to_hwconfig() {
        let dir = tempfile::tempdir().unwrap();
        let sources = sources(&dir);
        let mut block = HWCONFIG_MAGIC.to_vec();
        block.extend_from_slice(b"v3.1\0");
        block.push(40);
        let mut payload = vec![0u8; 40];
        // PCB 73 is a Clara HD
        payload[0] = 73;
        block.extend_from_slice(&payload);
        write(sources.hwconfig[0].path.clone(), &block);

        let quirks = run(&sources).unwrap();
        assert_eq!(quirks.device_id, 376);
    }

    #[test]
    fn test_falls_back_to_device_tree() {
        let dir = tempfile::tempdir().unwrap();
        let sources = sources(&dir);
        write(sources.dt_compatible.clone(), b"kobo,clarahd\0fsl,imx6sll\0");
        assert_eq!(run(&sources).unwrap().device_id, 376);
    }

    #[test]
    fn test_garbage_version_tag_is_unknown_kobo() {
        let dir = tempfile::tempdir().unwrap();
        let sources = sources(&dir);
        write(sources.kobo_version.clone(), b"x");
        let quirks = run(&sources).unwrap();
        assert!(quirks.is_unknown());
        assert_eq!(quirks.family, eink_specs::DeviceFamily::Kobo);
    }

    #[test]
    fn test_no_evidence() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&sources(&dir)).is_none());
    }
}
