//! Device identity resolution
//!
//! Each family module reads its own identity sources and returns `None` when there is no
//! evidence of that family at all. A family that *is* present but cannot be pinned down
//! (unreadable tag, unknown id) still resolves, to its safe "Unknown" record.
//!
//! [`resolve`] never fails: the worst outcome is [`DeviceQuirks::GENERIC`].

pub mod accel;
mod cervantes;
pub mod hwconfig;
mod kindle;
mod kobo;
mod pocketbook;
mod remarkable;

use std::path::Path;

use eink_specs::devices::{cervantes as cervantes_db, kindle as kindle_db, kobo as kobo_db};
use eink_specs::devices::pocketbook as pocketbook_db;
use eink_specs::DeviceQuirks;

use crate::config::{FamilyHint, FbConfig, IdentitySources};
use crate::diag::{self, detail, notice, Diagnostics};
use crate::error::SourceError;

/// What a family resolver has to work with
pub(crate) struct Inputs<'a> {
    pub(crate) sources: &'a IdentitySources,
    pub(crate) pocketbook_model: Option<&'a str>,
    pub(crate) diag: Diagnostics,
}

impl Inputs<'_> {
    /// Log a failed source: a missing one is routine, anything else is worth a warning.
    pub(crate) fn source_failed(&self, err: &SourceError) {
        match err {
            SourceError::Unavailable { .. } => {
                detail!(self.diag, target: diag::IDENTITY, "identity source skipped: {err}");
            }
            SourceError::Malformed { .. } | SourceError::UnknownId(_) => {
                tracing::warn!(target: diag::IDENTITY, "{err}");
            }
        }
    }
}

/// Read a text identity source.
pub(crate) fn read_text(path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|e| SourceError::unavailable(path, e))
}

/// Resolve the device's quirks.
///
/// Runs the identification scheme selected by `config.family`, then applies the HW
/// inversion override.
pub fn resolve(config: &FbConfig) -> DeviceQuirks {
    let inputs = Inputs {
        sources: &config.identity,
        pocketbook_model: config.pocketbook_model.as_deref(),
        diag: config.diagnostics(),
    };

    let quirks = match config.family {
        FamilyHint::Auto => kindle::identify(&inputs)
            .or_else(|| kobo::identify(&inputs))
            .or_else(|| remarkable::identify(&inputs))
            .or_else(|| pocketbook::identify(&inputs))
            .unwrap_or_else(|| {
                notice!(inputs.diag, target: diag::IDENTITY, "no e-reader identified, using generic fbdev defaults");
                DeviceQuirks::GENERIC
            }),
        FamilyHint::Generic => DeviceQuirks::GENERIC,
        FamilyHint::Kindle => kindle::identify(&inputs).unwrap_or(kindle_db::KINDLE_UNKNOWN),
        FamilyHint::Kobo => kobo::identify(&inputs).unwrap_or(kobo_db::KOBO_UNKNOWN),
        FamilyHint::Cervantes => {
            cervantes::identify(&inputs).unwrap_or(cervantes_db::CERVANTES_UNKNOWN)
        }
        FamilyHint::Remarkable => remarkable::identify_or_default(&inputs),
        FamilyHint::PocketBook => {
            pocketbook::identify(&inputs).unwrap_or(pocketbook_db::POCKETBOOK_UNKNOWN)
        }
    };

    let quirks = apply_overrides(quirks, config.allow_hw_invert, inputs.diag);
    notice!(
        inputs.diag,
        target: diag::IDENTITY,
        "Detected a {} {} ({} on {}), id {}, {} dpi, {} rotation, refresh via {}",
        quirks.family,
        quirks.name,
        quirks.codename,
        quirks.platform,
        quirks.device_id,
        quirks.screen_dpi,
        quirks.rotation_quirk.name(),
        quirks.refresh_abi
    );
    quirks
}

/// Apply user overrides on top of a resolved record.
pub fn apply_overrides(mut quirks: DeviceQuirks, allow_hw_invert: bool, diag: Diagnostics) -> DeviceQuirks {
    if !quirks.can_hw_invert {
        if allow_hw_invert {
            notice!(diag, target: diag::IDENTITY, "Forcing hardware inversion on a device that blacklists it");
            quirks.can_hw_invert = true;
        } else {
            notice!(diag, target: diag::IDENTITY, "This device does not support hardware inversion");
        }
    }
    quirks
}
