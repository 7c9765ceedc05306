//! Session configuration
//!
//! Layered as: built-in defaults, then an optional JSON file, then the environment.
//!
//! # Example JSON
//! ```json
//! {
//!   "fb_device": "/dev/fb0",
//!   "family": "kobo",
//!   "verbose": true,
//!   "identity": { "kobo_version": "/mnt/onboard/.kobo/version" }
//! }
//! ```
//!
//! Every field is optional; missing ones keep their default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diag::Diagnostics;
use crate::error::{FbError, Result};

/// Forces HW inversion on devices that blacklist it (any value)
pub const ENV_ALLOW_HW_INVERT: &str = "EINK_FB_ALLOW_HW_INVERT";
/// Enables the detail channel (any value)
pub const ENV_VERBOSE: &str = "EINK_FB_VERBOSE";
/// Silences the notice channel (any value)
pub const ENV_QUIET: &str = "EINK_FB_QUIET";

/// Which identification scheme to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyHint {
    /// Try Kindle, Kobo, reMarkable then PocketBook, in that order
    #[default]
    Auto,
    /// Plain fbdev, skip identification
    Generic,
    /// Amazon Kindle
    Kindle,
    /// Kobo / Tolino
    Kobo,
    /// BQ Cervantes (never auto-detected: its HW CONFIG block looks like a Kobo's)
    Cervantes,
    /// reMarkable
    Remarkable,
    /// PocketBook
    PocketBook,
}

/// Location of an NTX HW CONFIG block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwConfigLocation {
    /// Block device
    pub path: PathBuf,
    /// Byte offset of the header
    pub offset: u64,
}

impl HwConfigLocation {
    fn new(path: &str, offset: u64) -> Self {
        Self {
            path: PathBuf::from(path),
            offset,
        }
    }
}

/// Paths of every identity source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySources {
    /// Kindle serial number
    pub kindle_usid: PathBuf,
    /// Nickel's version tag
    pub kobo_version: PathBuf,
    /// HW CONFIG candidates, tried in order
    pub hwconfig: Vec<HwConfigLocation>,
    /// Whole-disk block device, sized to tell storage variants apart
    pub storage_device: PathBuf,
    /// Device-tree `compatible` strings (NUL separated)
    pub dt_compatible: PathBuf,
    /// reMarkable SoC machine name
    pub remarkable_machine: PathBuf,
    /// File holding the PocketBook model name, if the embedder does not pass it directly
    pub pocketbook_model_file: Option<PathBuf>,
    /// Sysfs directory of the KX122 driver
    pub kx122_driver_dir: PathBuf,
    /// Directory holding the `i2c-N` device nodes
    pub i2c_dev_dir: PathBuf,
}

impl Default for IdentitySources {
    fn default() -> Self {
        Self {
            kindle_usid: PathBuf::from("/proc/usid"),
            kobo_version: PathBuf::from("/mnt/onboard/.kobo/version"),
            hwconfig: vec![
                HwConfigLocation::new("/dev/disk/by-partlabel/hwcfg", 512),
                HwConfigLocation::new("/dev/mmcblk0", 512 * 1024),
                HwConfigLocation::new("/dev/mmcblk0p6", 512),
            ],
            storage_device: PathBuf::from("/dev/mmcblk0"),
            dt_compatible: PathBuf::from("/sys/firmware/devicetree/base/compatible"),
            remarkable_machine: PathBuf::from("/sys/devices/soc0/machine"),
            pocketbook_model_file: None,
            kx122_driver_dir: PathBuf::from("/sys/bus/i2c/drivers/kx122"),
            i2c_dev_dir: PathBuf::from("/dev"),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FbConfig {
    /// Framebuffer device node
    pub fb_device: PathBuf,
    /// Detail channel
    pub verbose: bool,
    /// Notice channel off
    pub quiet: bool,
    /// Use HW inversion even on devices where it is known to misbehave
    pub allow_hw_invert: bool,
    /// Identification scheme
    pub family: FamilyHint,
    /// Identity source paths
    pub identity: IdentitySources,
    /// sunxi debugfs command channel
    pub sunxi_control: PathBuf,
    /// PocketBook model name, as reported by the firmware
    pub pocketbook_model: Option<String>,
    /// Kernel `USER_HZ`, to convert wait results from jiffies
    pub user_hz: u32,
}

impl Default for FbConfig {
    fn default() -> Self {
        Self {
            fb_device: PathBuf::from("/dev/fb0"),
            verbose: false,
            quiet: false,
            allow_hw_invert: false,
            family: FamilyHint::Auto,
            identity: IdentitySources::default(),
            sunxi_control: PathBuf::from("/sys/kernel/debug/eink/command"),
            pocketbook_model: None,
            user_hz: 100,
        }
    }
}

impl FbConfig {
    /// Parse a JSON document over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON file over the defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| FbError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Apply the `EINK_FB_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var_os(name).is_some());
    }

    /// Apply `EINK_FB_*` overrides, with `is_set` standing in for the environment.
    ///
    /// Variables only ever turn a flag on.
    pub fn apply_env_from(&mut self, is_set: impl Fn(&str) -> bool) {
        if is_set(ENV_ALLOW_HW_INVERT) {
            self.allow_hw_invert = true;
        }
        if is_set(ENV_VERBOSE) {
            self.verbose = true;
        }
        if is_set(ENV_QUIET) {
            self.quiet = true;
        }
    }

    /// Defaults plus the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Channel gates for this config
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FbConfig::default();
        assert_eq!(config.fb_device, PathBuf::from("/dev/fb0"));
        assert_eq!(config.family, FamilyHint::Auto);
        assert_eq!(config.user_hz, 100);
        assert_eq!(config.identity.hwconfig.len(), 3);
        assert_eq!(config.identity.hwconfig[1].offset, 524_288);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{ "family": "kobo", "verbose": true, "identity": { "kobo_version": "/tmp/version" } }"#;
        let config = FbConfig::from_json_str(json).unwrap();
        assert_eq!(config.family, FamilyHint::Kobo);
        assert!(config.verbose);
        assert_eq!(config.identity.kobo_version, PathBuf::from("/tmp/version"));
        // Untouched fields keep their defaults
        assert_eq!(config.identity.kindle_usid, PathBuf::from("/proc/usid"));
        assert_eq!(config.fb_device, PathBuf::from("/dev/fb0"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = FbConfig::default();
        config.family = FamilyHint::PocketBook;
        config.pocketbook_model = Some("PB632".into());
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(FbConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_bad_json() {
        let err = FbConfig::from_json_str(r#"{ "family": "nook" }"#).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = FbConfig::default();
        config.apply_env_from(|name| name == ENV_ALLOW_HW_INVERT || name == ENV_QUIET);
        assert!(config.allow_hw_invert);
        assert!(config.quiet);
        assert!(!config.verbose);
        assert_eq!(config.diagnostics(), Diagnostics::QUIET);
    }
}
