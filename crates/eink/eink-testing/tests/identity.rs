#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Device identification through a full session: config paths in, quirks and geometry out.

use std::path::Path;

use eink_fb::{
    DeviceFamily, FamilyHint, FbConfig, FbSession, HwConfigLocation, IdentitySources, RefreshAbi,
    RotationQuirk,
};
use eink_testing::{init_tracing, SimConfig, SimulatedFb};
use tempfile::TempDir;

/// Every identity source inside `dir`, none of them present yet.
fn sandbox(dir: &Path) -> FbConfig {
    FbConfig {
        verbose: true,
        identity: IdentitySources {
            kindle_usid: dir.join("usid"),
            kobo_version: dir.join("version"),
            hwconfig: vec![HwConfigLocation {
                path: dir.join("hwcfg"),
                offset: 512,
            }],
            storage_device: dir.join("mmcblk0"),
            dt_compatible: dir.join("compatible"),
            remarkable_machine: dir.join("machine"),
            pocketbook_model_file: Some(dir.join("pb_model")),
            kx122_driver_dir: dir.join("kx122"),
            i2c_dev_dir: dir.to_path_buf(),
        },
        ..FbConfig::default()
    }
}

fn open(config: FbConfig, sim: SimConfig) -> FbSession<SimulatedFb> {
    init_tracing();
    FbSession::new(SimulatedFb::new(sim), config).unwrap()
}

#[test]
fn test_kobo_from_version_tag() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("version"),
        "N418000000000,4.38.21908,4.38.21908,4.38.21908,4.38.21908,00000000-0000-0000-0000-000000000377\n",
    )
    .unwrap();

    let fb = open(sandbox(dir.path()), SimConfig::forma());
    let quirks = fb.quirks();
    assert_eq!(quirks.family, DeviceFamily::Kobo);
    assert_eq!(quirks.name, "Forma");
    assert!(quirks.can_rotate);
    assert_eq!(fb.rotation().quirk(), RotationQuirk::OddInverted);
    assert_eq!(fb.refresh_abi(), RefreshAbi::MxcfbV2);
    // Boot rotation 1 is landscape on this panel
    assert_eq!((fb.geometry().xres, fb.geometry().yres), (1920, 1440));
}

#[test]
fn test_kindle_from_serial() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("usid"), "G000PP0000000000\n").unwrap();

    let fb = open(sandbox(dir.path()), SimConfig::paperwhite4());
    assert_eq!(fb.quirks().family, DeviceFamily::Kindle);
    assert_eq!(fb.quirks().device_id, 0x2F7);
    assert_eq!(fb.geometry().scanline_padding, 16);
}

#[test]
fn test_kobo_from_device_tree() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("compatible"), b"kobo,clarahd\0fsl,imx6sll\0").unwrap();

    let fb = open(sandbox(dir.path()), SimConfig::clara_hd());
    assert_eq!(fb.quirks().device_id, 376);
}

#[test]
fn test_truncated_hwconfig_is_safe_unknown() {
    let dir = TempDir::new().unwrap();
    let mut raw = vec![0u8; 512];
    raw.extend_from_slice(b"HW CONFIG v3.1\0");
    // Claims 64 bytes of payload, carries 10
    raw.push(64);
    raw.extend_from_slice(&[0u8; 10]);
    std::fs::write(dir.path().join("hwcfg"), raw).unwrap();

    let mut config = sandbox(dir.path());
    config.family = FamilyHint::Kobo;
    let fb = open(config.clone(), SimConfig::clara_hd());
    let quirks = fb.quirks();
    assert_eq!(quirks.family, DeviceFamily::Kobo);
    assert!(quirks.is_unknown());
    assert!(!quirks.can_hw_invert);
    assert!(!quirks.can_rotate);
    assert_eq!(quirks.rotation_quirk, RotationQuirk::Straight);
    assert_eq!(quirks.refresh_abi, RefreshAbi::NtxV1);

    // Without the hint, nothing points at any family
    config.family = FamilyHint::Auto;
    let fb = open(config, SimConfig::clara_hd());
    assert_eq!(fb.quirks().family, DeviceFamily::Generic);
    assert!(!fb.quirks().can_hw_invert);
}

#[test]
fn test_remarkable_machine() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("machine"), "reMarkable 2.0\n").unwrap();

    let fb = open(sandbox(dir.path()), SimConfig::new(1404, 1872, 16));
    assert_eq!(fb.quirks().family, DeviceFamily::Remarkable);
    assert_eq!(fb.quirks().device_id, 2);
}

#[test]
fn test_pocketbook_model_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pb_model"), "PB632\n").unwrap();

    let fb = open(sandbox(dir.path()), SimConfig::new(1072, 1448, 8));
    assert_eq!(fb.quirks().family, DeviceFamily::PocketBook);
    assert_eq!(fb.quirks().device_id, 632);
}

#[test]
fn test_hw_invert_override() {
    let dir = TempDir::new().unwrap();
    let mut config = sandbox(dir.path());
    config.family = FamilyHint::Kobo;
    config.apply_env_from(|name| name == eink_fb::config::ENV_ALLOW_HW_INVERT);

    let fb = open(config, SimConfig::clara_hd());
    assert!(fb.quirks().is_unknown());
    assert!(fb.quirks().can_hw_invert);
}

#[test]
fn test_config_file_drives_identification() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("machine"), "reMarkable 1.0\n").unwrap();

    let config = sandbox(dir.path());
    let path = dir.path().join("eink-fb.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = FbConfig::from_json_file(&path).unwrap();
    assert_eq!(loaded, config);
    let fb = open(loaded, SimConfig::new(1404, 1872, 16));
    assert_eq!(fb.quirks().family, DeviceFamily::Remarkable);
    assert_eq!(fb.quirks().device_id, 1);
}

#[test]
fn test_accelerometer_needs_a_rotatable_device() {
    let dir = TempDir::new().unwrap();
    // No KX122 bound
    std::fs::create_dir(dir.path().join("kx122")).unwrap();
    std::fs::write(
        dir.path().join("version"),
        "N418000000000,4.38.21908,4.38.21908,4.38.21908,4.38.21908,00000000-0000-0000-0000-000000000377\n",
    )
    .unwrap();
    let fb = open(sandbox(dir.path()), SimConfig::forma());
    assert_eq!(fb.accelerometer_rotation(), None);

    let mut config = sandbox(dir.path());
    config.family = FamilyHint::Generic;
    let fb = open(config, SimConfig::clara_hd());
    assert!(!fb.quirks().can_rotate);
    assert_eq!(fb.accelerometer_rotation(), None);
}
