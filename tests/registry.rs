use std::fs;
use std::path::{Path, PathBuf};

use stickmap::{resolve, DefinitionRegistry, DeviceId, Error, QualifiedId};

fn bundled() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("definitions")
}

#[test]
fn loads_bundled_definitions() {
    let reg = DefinitionRegistry::load_dir(bundled()).unwrap();
    assert_eq!(
        reg.ids(),
        vec![
            QualifiedId::new("logitech", "extreme3d"),
            QualifiedId::new("logitech", "f310"),
            QualifiedId::new("thrustmaster", "t16000m"),
        ]
    );

    let f310 = reg.get(&QualifiedId::new("logitech", "f310")).unwrap();
    assert_eq!(f310.device_id(), DeviceId::new(0x046d, 0xc216));
    assert_eq!(f310.joysticks.len(), 2);

    let x3d = reg.get(&QualifiedId::new("logitech", "extreme3d")).unwrap();
    assert_eq!(x3d.statuses[0].label_for(0x8f), Some("center"));
}

#[test]
fn bundled_vendor_resolves_against_attached_devices() {
    let reg = DefinitionRegistry::load_dir(bundled()).unwrap();
    let attached = [DeviceId::new(0x044f, 0xb10a), DeviceId::new(0x046d, 0xc216)];
    let id = resolve(&reg, "logitech", &attached).unwrap();
    assert_eq!(id.to_string(), "logitech/f310");
}

#[test]
fn ignores_unrelated_files_and_keeps_empty_vendors() {
    let dir = tempfile::tempdir().unwrap();
    let acme = dir.path().join("acme");
    fs::create_dir(&acme).unwrap();
    fs::create_dir(dir.path().join("empty")).unwrap();
    fs::write(acme.join("README.md"), "not a definition").unwrap();
    fs::write(dir.path().join("stray.toml"), "vendor_id = 1").unwrap();
    fs::write(acme.join("pad.toml"), "vendor_id = 1\nproduct_id = 2\n").unwrap();

    let reg = DefinitionRegistry::load_dir(dir.path()).unwrap();
    assert_eq!(reg.len(), 1);
    assert!(reg.get(&QualifiedId::new("acme", "pad")).is_some());

    // A vendor directory without definitions is known but cannot match anything.
    let err = resolve(&reg, "empty", &[DeviceId::new(1, 2)]).unwrap_err();
    assert!(matches!(err, Error::DeviceNotDetected { .. }));
    let err = resolve(&reg, "missing", &[DeviceId::new(1, 2)]).unwrap_err();
    assert!(matches!(err, Error::ConfigurationNotFound { .. }));
}

#[test]
fn invalid_definition_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let acme = dir.path().join("acme");
    fs::create_dir(&acme).unwrap();
    fs::write(acme.join("broken.json"), "{ \"vendorID\": 1 }").unwrap();

    let err = DefinitionRegistry::load_dir(dir.path()).unwrap_err();
    match err {
        Error::Json { path, .. } => assert!(path.ends_with("acme/broken.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_configuration_in_two_formats_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let acme = dir.path().join("acme");
    fs::create_dir(&acme).unwrap();
    fs::write(acme.join("pad.toml"), "vendor_id = 1\nproduct_id = 2\n").unwrap();
    fs::write(acme.join("pad.json"), r#"{ "vendorID": 1, "productID": 3 }"#).unwrap();

    let err = DefinitionRegistry::load_dir(dir.path()).unwrap_err();
    match err {
        Error::InvalidDefinition { id, reason } => {
            assert_eq!(id, "acme/pad");
            assert!(reason.starts_with("defined by both"), "{reason}");
            assert!(reason.contains("pad.json") && reason.contains("pad.toml"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_root_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DefinitionRegistry::load_dir(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}
