//! Kindle: device code embedded in the serial number

use eink_specs::devices::kindle::{SerialScheme, KINDLE_SERIAL_LEN, KINDLE_UNKNOWN};
use eink_specs::devices::lookup;
use eink_specs::DeviceQuirks;

use super::Inputs;
use crate::diag::{self, detail};
use crate::error::SourceError;

pub(crate) fn identify(inputs: &Inputs<'_>) -> Option<DeviceQuirks> {
    let path = &inputs.sources.kindle_usid;
    let usid = match std::fs::read(path) {
        Ok(usid) => usid,
        Err(e) => {
            inputs.source_failed(&SourceError::unavailable(path, e));
            return None;
        }
    };
    let serial = usid.get(..KINDLE_SERIAL_LEN).unwrap_or(usid.as_slice());

    let scheme = SerialScheme::for_serial(serial);
    let Some(code) = scheme.device_code(serial) else {
        inputs.source_failed(&SourceError::malformed(path, "no device code in serial number"));
        return Some(KINDLE_UNKNOWN);
    };
    detail!(inputs.diag, target: diag::IDENTITY, "Kindle device code {code:#x}");

    Some(lookup(scheme.models(), code).unwrap_or_else(|| {
        inputs.source_failed(&SourceError::UnknownId(u32::from(code)));
        KINDLE_UNKNOWN
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentitySources;
    use crate::diag::Diagnostics;
    use std::io::Write;

    fn identify_serial(serial: &[u8]) -> Option<DeviceQuirks> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serial).unwrap();
        let sources = IdentitySources {
            kindle_usid: file.path().to_path_buf(),
            ..Default::default()
        };
        identify(&Inputs {
            sources: &sources,
            pocketbook_model: None,
            diag: Diagnostics::QUIET,
        })
    }

    #[test]
    fn test_base32_serial() {
        let quirks = identify_serial(b"G000PP0000000000\n").unwrap();
        assert_eq!(quirks.device_id, 0x2F7);
        assert_eq!(quirks.name, "PaperWhite 4");
    }

    #[test]
    fn test_legacy_hex_serial() {
        let quirks = identify_serial(b"B00E000000000000").unwrap();
        assert_eq!(quirks.device_id, 0x0E);
        assert!(quirks.is_legacy);
    }

    #[test]
    fn test_short_serial_is_unknown_kindle() {
        let quirks = identify_serial(b"G0").unwrap();
        assert!(quirks.is_unknown());
        assert_eq!(quirks.family, eink_specs::DeviceFamily::Kindle);
    }

    #[test]
    fn test_missing_usid() {
        let sources = IdentitySources {
            kindle_usid: "/nonexistent/usid".into(),
            ..Default::default()
        };
        let inputs = Inputs {
            sources: &sources,
            pocketbook_model: None,
            diag: Diagnostics::QUIET,
        };
        assert!(identify(&inputs).is_none());
    }
}
