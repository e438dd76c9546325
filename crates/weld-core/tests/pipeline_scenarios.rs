//! # Pipeline Scenario Tests (T0-T3)
//!
//! End-to-end runs of the export pipeline over small wired compositions.
//!
//! ## Tiers
//! - T0: Grouping
//! - T1: Graph and interface
//! - T2: Validation
//! - T3: Synthesis

use std::fs;
use std::path::{Path, PathBuf};
use weld_core::{
    ArchiveBuild, BuildService, CancelFlag, ComponentInfo, ComponentRef, CompositionUnit,
    DescriptorEntry, DescriptorTable, EventSetInfo, EventTarget, ExportConfig, Exporter, Feature,
    MethodInfo, MethodSig, PropertyInfo, ScriptedSelector, ViolationKind, WeldError, Wrapper,
    WrapperId, build_unit, infer_interfaces, partition, synthesize, validate,
};

// =============================================================================
// FIXTURES
// =============================================================================

fn value_events() -> EventSetInfo {
    EventSetInfo {
        name: "value".to_string(),
        listener_type: "demo.ValueListener".to_string(),
        listener_methods: vec!["valueChanged".to_string()],
        add_method: "addValueListener".to_string(),
        remove_method: "removeValueListener".to_string(),
        get_method: None,
        hidden: false,
        expert: false,
    }
}

fn int_property(name: &str) -> PropertyInfo {
    let upper = format!("{}{}", name[..1].to_uppercase(), &name[1..]);
    PropertyInfo {
        name: name.to_string(),
        display_name: None,
        type_name: "int".to_string(),
        getter: Some(MethodSig::getter(format!("get{upper}"), "int")),
        setter: Some(MethodSig::void(format!("set{upper}"), &["int"])),
        hidden: false,
        expert: false,
        editor: None,
        value: None,
    }
}

/// Producer -> Relay -> Consumer component types.
fn descriptors() -> DescriptorTable {
    let mut table = DescriptorTable::new();
    table.insert(
        "demo.Producer",
        DescriptorEntry {
            info: ComponentInfo {
                properties: vec![int_property("rate")],
                methods: vec![MethodInfo {
                    signature: MethodSig::void("start", &[]),
                    hidden: false,
                    expert: false,
                }],
                events: vec![value_events()],
            },
            capabilities: Vec::new(),
        },
    );
    table.insert(
        "demo.Relay",
        DescriptorEntry {
            info: ComponentInfo {
                properties: vec![int_property("gain")],
                methods: Vec::new(),
                events: vec![value_events()],
            },
            capabilities: Vec::new(),
        },
    );
    table.insert(
        "demo.Consumer",
        DescriptorEntry {
            info: ComponentInfo {
                properties: vec![int_property("level")],
                methods: Vec::new(),
                events: Vec::new(),
            },
            capabilities: Vec::new(),
        },
    );
    table
}

fn origin(dir: &Path) -> PathBuf {
    let path = dir.join("demo.jar");
    fs::write(&path, b"demo classes").expect("write origin");
    path
}

fn wrapper(id: u64, label: &str, type_name: &str, origin: &Path, targets: &[u64]) -> Wrapper {
    let mut w = Wrapper::new(WrapperId(id), label, ComponentRef::new(type_name, id), origin);
    for t in targets {
        w.direct_targets.push(EventTarget {
            target: WrapperId(*t),
            event_set: value_events(),
        });
    }
    w
}

/// X -> Y -> Z wired by direct composition.
fn chain(origin: &Path) -> Vec<Wrapper> {
    vec![
        wrapper(1, "X", "demo.Producer", origin, &[2]),
        wrapper(2, "Y", "demo.Relay", origin, &[3]),
        wrapper(3, "Z", "demo.Consumer", origin, &[]),
    ]
}

fn combo(wrappers: &[Wrapper]) -> CompositionUnit {
    let groups = partition(wrappers);
    assert_eq!(groups.len(), 1);
    let mut unit = build_unit(&descriptors(), &groups[0], "Combo").expect("build");
    infer_interfaces(&mut unit, &mut ScriptedSelector::cancelling()).expect("infer");
    unit
}

fn names<'a>(nodes: impl Iterator<Item = &'a weld_core::CompositionNode>) -> Vec<&'a str> {
    nodes.map(|n| n.name.as_str()).collect()
}

// =============================================================================
// TIER T0: GROUPING
// =============================================================================

mod t0_grouping {
    use super::*;

    /// T0.1: A bound chain and an unbound wrapper form two groups.
    #[test]
    fn chain_and_loner() {
        let dir = tempfile::tempdir().expect("tempdir");
        let origin = origin(dir.path());
        let mut wrappers = chain(&origin);
        wrappers.push(wrapper(9, "Loner", "demo.Consumer", &origin, &[]));

        let groups = partition(&wrappers);
        let ids: Vec<Vec<u64>> = groups
            .iter()
            .map(|g| g.ids().map(|id| id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 2, 3], vec![9]]);
    }
}

// =============================================================================
// TIER T1: GRAPH AND INTERFACE
// =============================================================================

mod t1_graph_and_interface {
    use super::*;

    /// T1.1: X -> Y -> Z infers input {X} and output {Z}.
    #[test]
    fn acyclic_chain_interfaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unit = combo(&chain(&origin(dir.path())));

        assert_eq!(names(unit.nodes().iter()), vec!["X", "Y", "Z"]);
        assert_eq!(names(unit.input_nodes()), vec!["X"]);
        assert_eq!(names(unit.output_nodes()), vec!["Z"]);
        assert_eq!(unit.edges().count(), 2);
    }

    /// T1.2: A two-node cycle asks the selector for both sides.
    #[test]
    fn cyclic_unit_uses_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let origin = origin(dir.path());
        let wrappers = vec![
            wrapper(1, "A", "demo.Relay", &origin, &[2]),
            wrapper(2, "B", "demo.Relay", &origin, &[1]),
        ];
        let groups = partition(&wrappers);
        let mut unit = build_unit(&descriptors(), &groups[0], "Loop").expect("build");
        assert_eq!(unit.node_count(), 2);

        let mut selector = ScriptedSelector::new(vec![vec!["B"], vec!["A"]]);
        infer_interfaces(&mut unit, &mut selector).expect("infer");
        assert_eq!(selector.prompts().len(), 2);
        assert_eq!(names(unit.input_nodes()), vec!["A"]);
        assert_eq!(names(unit.output_nodes()), vec!["B"]);
    }

    /// T1.3: An empty fallback selection is an error for that unit only.
    #[test]
    fn empty_selection_fails_one_unit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let origin = origin(dir.path());
        let mut wrappers = vec![
            wrapper(1, "A", "demo.Relay", &origin, &[2]),
            wrapper(2, "B", "demo.Relay", &origin, &[1]),
        ];
        wrappers.extend(chain(&origin));
        let mut selector = ScriptedSelector::cancelling();

        let exporter = Exporter::new(
            &wrappers,
            &descriptors(),
            &mut selector,
            &ArchiveBuild,
            ExportConfig::default(),
        )
        .expect("exporter");
        assert_eq!(exporter.units().len(), 1);
        assert_eq!(exporter.units()[0].name, "ExportBean1");
        assert!(matches!(
            exporter.failures()[0].error,
            WeldError::EmptyInterface { .. }
        ));
    }
}

// =============================================================================
// TIER T2: VALIDATION
// =============================================================================

mod t2_validation {
    use super::*;

    /// T2.1: A keyword name is always rejected.
    #[test]
    fn keyword_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut unit = combo(&chain(&origin(dir.path())));
        if let Some(node) = unit.node_by_name_mut("Y") {
            node.name = "static".to_string();
        }
        let violations = validate(&unit);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind(), ViolationKind::InvalidIdentifier);
    }

    /// T2.2: Two nodes sharing a name produce exactly one violation naming both.
    #[test]
    fn sibling_collision_reported_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut unit = combo(&chain(&origin(dir.path())));
        if let Some(node) = unit.node_by_name_mut("Z") {
            node.name = "Y".to_string();
        }
        let collisions: Vec<_> = validate(&unit)
            .into_iter()
            .filter(|v| v.kind() == ViolationKind::NameCollision)
            .collect();
        assert_eq!(collisions.len(), 1);
        assert!(collisions[0].message().contains("demo.Relay"));
        assert!(collisions[0].message().contains("demo.Consumer"));
    }

    /// T2.3: Renaming a property onto another accessor is a collision.
    #[test]
    fn renamed_property_collides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut unit = combo(&chain(&origin(dir.path())));
        if let Some(property) = unit
            .node_by_name_mut("Z")
            .and_then(|n| n.property_mut("level"))
        {
            property.rename("rate");
        }
        let violations = validate(&unit);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind(), ViolationKind::NameCollision);
    }
}

// =============================================================================
// TIER T3: SYNTHESIS
// =============================================================================

mod t3_synthesis {
    use super::*;
    use weld_core::formats::read_archived_metadata;
    use weld_core::{Archive, ArtifactSynthesizer};

    fn bean_source(archive: &Archive, name: &str) -> String {
        let entry = format!("weld/generated/beans/{}.java", name);
        String::from_utf8_lossy(archive.entry(&entry).expect("bean source")).into_owned()
    }

    /// T3.1: Combo is instantiated in order and wired X to Y and Y to Z.
    #[test]
    fn combo_end_to_end() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unit = combo(&chain(&origin(dir.path())));
        assert!(validate(&unit).is_empty());

        let outcome = synthesize(&unit, &dir.path().join("out"), "Combo").expect("synthesize");
        let artifact = outcome.artifact().expect("packaged");
        let source = bean_source(&Archive::open(&artifact.path).expect("open"), "Combo");

        assert!(source.contains("public class Combo implements java.io.Serializable"));
        let x = source.find("x = new demo.Producer();").expect("x");
        let y = source.find("y = new demo.Relay();").expect("y");
        let z = source.find("z = new demo.Consumer();").expect("z");
        let xy = source.find("x.addValueListener(y);").expect("x to y");
        let yz = source.find("y.addValueListener(z);").expect("y to z");
        assert!(x < y && y < z);
        assert!(z < xy && xy < yz);
        assert!(source.contains("public void start() {"));
    }

    /// T3.2: Every instantiation precedes every wiring statement in a cycle.
    #[test]
    fn instantiation_before_wiring_in_cycle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let origin = origin(dir.path());
        let wrappers = vec![
            wrapper(1, "A", "demo.Relay", &origin, &[2]),
            wrapper(2, "B", "demo.Relay", &origin, &[1]),
        ];
        let groups = partition(&wrappers);
        let mut unit = build_unit(&descriptors(), &groups[0], "Loop").expect("build");
        infer_interfaces(&mut unit, &mut ScriptedSelector::new(vec![vec!["B"], vec!["A"]]))
            .expect("infer");

        let outcome = synthesize(&unit, &dir.path().join("out"), "Loop").expect("synthesize");
        let artifact = outcome.artifact().expect("packaged");
        let source = bean_source(&Archive::open(&artifact.path).expect("open"), "Loop");
        let last_new = source.rfind("= new demo.Relay();").expect("instantiation");
        let first_wire = source.find(".addValueListener(").expect("wiring");
        assert!(last_new < first_wire);
    }

    /// T3.3: Re-reading the metadata yields the exported name sets.
    #[test]
    fn metadata_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut unit = combo(&chain(&origin(dir.path())));
        if let Some(node) = unit.node_by_name_mut("Y") {
            node.set_all_properties_configurable(false);
        }

        let outcome = synthesize(&unit, &dir.path().join("out"), "Combo").expect("synthesize");
        let archive = Archive::open(&outcome.artifact().expect("packaged").path).expect("open");
        let metadata = read_archived_metadata(
            archive
                .entry("weld/generated/beans/Combo.metadata.json")
                .expect("metadata"),
        )
        .expect("parse");

        let properties: Vec<_> = unit.exported_properties().iter().map(|p| p.name().to_string()).collect();
        let methods: Vec<_> = unit.exported_methods().iter().map(|m| m.name().to_string()).collect();
        let events: Vec<_> = unit.exported_events().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(metadata.property_names(), properties);
        assert_eq!(metadata.method_names(), methods);
        assert_eq!(metadata.event_names(), events);
        assert_eq!(metadata.property_names(), vec!["rate", "level"]);
    }

    /// T3.4: A resource that vanished is reported and nothing is left behind.
    #[test]
    fn missing_resource_at_synthesis() {
        let dir = tempfile::tempdir().expect("tempdir");
        let origin = origin(dir.path());
        let unit = combo(&chain(&origin));
        fs::remove_file(&origin).expect("remove");

        let out = dir.path().join("out");
        let err = synthesize(&unit, &out, "Combo").expect_err("missing");
        assert!(matches!(err, WeldError::MissingResource(ref p) if *p == origin));
        assert!(!out.exists());
    }

    /// Build service that cancels the run while compiling.
    struct CancellingBuild {
        cancel: CancelFlag,
    }

    impl BuildService for CancellingBuild {
        fn compile(&self, _source_root: &Path, _classpath: &[PathBuf]) -> Result<Vec<PathBuf>, WeldError> {
            self.cancel.cancel();
            Ok(Vec::new())
        }

        fn pack(&self, output_file: &Path, content_root: &Path) -> Result<PathBuf, WeldError> {
            ArchiveBuild.pack(output_file, content_root)
        }
    }

    /// T3.5: Cancellation mid-run leaves nothing behind.
    #[test]
    fn cancellation_leaves_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unit = combo(&chain(&origin(dir.path())));
        let out = dir.path().join("out");
        let cancel = CancelFlag::new();
        let build = CancellingBuild {
            cancel: cancel.clone(),
        };

        let config = ExportConfig::default();
        let err = ArtifactSynthesizer::new(&config)
            .with_build(&build)
            .with_cancel(cancel)
            .synthesize(&unit, &out, "Combo")
            .expect_err("cancelled");
        assert!(matches!(err, WeldError::Cancelled));
        assert!(!out.exists());
    }

    /// T3.6: Units of one run are exported into separate archives.
    #[test]
    fn exporter_packages_each_unit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let origin = origin(dir.path());
        let mut wrappers = chain(&origin);
        wrappers.push(wrapper(9, "Loner", "demo.Consumer", &origin, &[]));
        let mut selector = ScriptedSelector::cancelling();
        let exporter = Exporter::new(
            &wrappers,
            &descriptors(),
            &mut selector,
            &ArchiveBuild,
            ExportConfig::default(),
        )
        .expect("exporter");

        let out = dir.path().join("out");
        for (index, unit) in exporter.units().iter().enumerate() {
            let outcome = exporter
                .export_unit(index, &out, &unit.name, &ArchiveBuild, CancelFlag::new(), false)
                .expect("export");
            assert!(outcome.artifact().is_some());
        }
        assert!(out.join("ExportBean0.jar").is_file());
        assert!(out.join("ExportBean1.jar").is_file());
    }
}
