//! PocketBook: model name reported by the firmware

use eink_specs::devices::pocketbook::lookup_model;
use eink_specs::DeviceQuirks;

use super::{read_text, Inputs};
use crate::diag::{self, detail};

pub(crate) fn identify(inputs: &Inputs<'_>) -> Option<DeviceQuirks> {
    let model = match (inputs.pocketbook_model, &inputs.sources.pocketbook_model_file) {
        (Some(model), _) => model.to_owned(),
        (None, Some(path)) => match read_text(path) {
            Ok(model) => model,
            Err(err) => {
                inputs.source_failed(&err);
                return None;
            }
        },
        (None, None) => return None,
    };
    let model = model.trim();
    detail!(inputs.diag, target: diag::IDENTITY, "PocketBook model name \"{model}\"");
    let quirks = lookup_model(Some(model));
    if quirks.is_unknown() {
        tracing::warn!(target: diag::IDENTITY, "unknown PocketBook model \"{model}\", assuming a {} dpi panel", quirks.screen_dpi);
    }
    Some(quirks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdentitySources;
    use crate::diag::Diagnostics;

    #[test]
    fn test_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model");
        std::fs::write(&path, "PB740-3\n").unwrap();
        let sources = IdentitySources {
            pocketbook_model_file: Some(path),
            ..Default::default()
        };
        let quirks = identify(&Inputs {
            sources: &sources,
            pocketbook_model: None,
            diag: Diagnostics::QUIET,
        })
        .unwrap();
        assert_eq!(quirks.device_id, 742);
    }

    #[test]
    fn test_unknown_model_keeps_defaults() {
        let sources = IdentitySources::default();
        let quirks = identify(&Inputs {
            sources: &sources,
            pocketbook_model: Some("PB9000"),
            diag: Diagnostics::QUIET,
        })
        .unwrap();
        assert!(quirks.is_unknown());
        assert_eq!(quirks.screen_dpi, 212);
        assert!(!quirks.can_hw_invert);
    }
}
