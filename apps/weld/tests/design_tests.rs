//! Tests for design files, settings, and the commands that consume them.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use std::fs;
use std::path::Path;
use weld::cli::{cmd_hash, cmd_validate, prepare};
use weld::design::DesignFile;
use weld::settings::Settings;
use weld_core::{ArchiveBuild, Exporter, ScriptedSelector, SynthesisOutcome, WeldError, synthesize};

const DESIGN: &str = r#"{
    "components": {
        "demo.Ticker": {
            "events": [{
                "name": "tick",
                "listener_type": "demo.TickListener",
                "listener_methods": ["tick"],
                "add_method": "addTickListener",
                "remove_method": "removeTickListener"
            }],
            "methods": [{"signature": {"name": "start"}}]
        },
        "demo.Counter": {
            "properties": [{
                "name": "count", "type_name": "int",
                "getter": {"name": "getCount", "returns": "int"},
                "setter": {"name": "setCount", "params": ["int"]}
            }]
        }
    },
    "wrappers": [
        {
            "id": 1, "label": "LABEL",
            "component": {"type_name": "demo.Ticker", "instance": 1},
            "origin": "lib/parts.jar",
            "direct_targets": [{
                "target": 2,
                "event_set": {
                    "name": "tick",
                    "listener_type": "demo.TickListener",
                    "listener_methods": ["tick"],
                    "add_method": "addTickListener",
                    "remove_method": "removeTickListener"
                }
            }]
        },
        {
            "id": 2, "label": "Counter",
            "component": {"type_name": "demo.Counter", "instance": 2},
            "origin": "lib/parts.jar"
        }
    ]
}"#;

/// Write the design next to its resource and return the design path.
fn write_design(dir: &Path, label: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir.join("lib")).unwrap();
    fs::write(dir.join("lib/parts.jar"), b"parts").unwrap();
    let path = dir.join("design.json");
    fs::write(&path, DESIGN.replace("LABEL", label)).unwrap();
    path
}

// =============================================================================
// DESIGN FILE TESTS
// =============================================================================

#[test]
fn test_design_resolves_relative_origins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_design(dir.path(), "Ticker");

    let design = DesignFile::load(&path).unwrap();
    assert_eq!(design.components.len(), 2);
    assert_eq!(design.wrappers.len(), 2);
    assert!(design.wrappers.iter().all(|w| w.origin == dir.path().join("lib/parts.jar")));
}

#[test]
fn test_design_rejects_malformed_json() {
    let err = DesignFile::from_json(r#"{"wrappers": 3}"#).unwrap_err();
    assert!(matches!(err, WeldError::Config(_)));
}

#[test]
fn test_missing_design_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DesignFile::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, WeldError::Io(_)));
}

#[test]
fn test_design_exports_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let design = DesignFile::load(&write_design(dir.path(), "Ticker")).unwrap();
    let mut exporter = Exporter::new(
        &design.wrappers,
        &design.components,
        &mut ScriptedSelector::cancelling(),
        &ArchiveBuild,
        Settings::default().export,
    )
    .unwrap();
    assert_eq!(exporter.units().len(), 1);

    let unit = exporter.unit_mut("ExportBean0").unwrap();
    unit.name = "Metronome".to_string();
    let outcome = synthesize(unit, &dir.path().join("out"), "Metronome").unwrap();
    let path = match outcome {
        SynthesisOutcome::Packaged(artifact) => artifact.path,
        SynthesisOutcome::Rejected(v) => panic!("rejected: {:?}", v),
    };
    assert_eq!(path, dir.path().join("out/Metronome.jar"));
    cmd_hash(&path, true).unwrap();
}

// =============================================================================
// SETTINGS TESTS
// =============================================================================

#[test]
fn test_settings_with_compiler_table() {
    let settings = Settings::from_toml(
        r#"
bean_package = "acme/beans"
change_support = true

[compiler]
program = "javac"
args = ["-g", "-nowarn"]
"#,
    )
    .unwrap();
    assert_eq!(settings.export.bean_package, "acme/beans");
    assert!(settings.export.change_support);
    assert!(!settings.export.keep_sources);
    let compiler = settings.compiler.unwrap();
    assert_eq!(compiler.program, "javac");
    assert_eq!(compiler.args, vec!["-g", "-nowarn"]);
}

#[test]
fn test_settings_reject_wrong_types() {
    let err = Settings::from_toml("keep_sources = \"often\"").unwrap_err();
    assert!(matches!(err, WeldError::Config(_)));
}

#[test]
fn test_settings_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weld.toml");
    fs::write(&path, "default_unit_name = \"Part\"\n").unwrap();
    let settings = Settings::load(Some(&path)).unwrap();
    assert_eq!(settings.export.unit_name(3), "Part3");
}

// =============================================================================
// COMMAND TESTS
// =============================================================================

#[test]
fn test_prepare_and_validate_clean_design() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_design(dir.path(), "Ticker");
    let settings = Settings::default();

    let exporter = prepare(&path, &settings, &ArchiveBuild).unwrap();
    let unit = &exporter.units()[0];
    assert_eq!(unit.input_nodes().map(|n| n.name.as_str()).collect::<Vec<_>>(), vec!["Ticker"]);
    assert_eq!(unit.output_nodes().map(|n| n.name.as_str()).collect::<Vec<_>>(), vec!["Counter"]);
    cmd_validate(&path, &settings, true).unwrap();
}

#[test]
fn test_validate_fails_on_keyword_label() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_design(dir.path(), "while");
    let err = cmd_validate(&path, &Settings::default(), true).unwrap_err();
    assert!(err.to_string().contains("1 constraint violations"));
}
