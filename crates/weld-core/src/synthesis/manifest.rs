//! Manifest of a packaged unit.

use crate::graph::CompositionUnit;

/// Manifest text: the version header, the staged archives on `Class-Path`,
/// then one `Name:`/`Java-Bean: True` stanza per introspectable class.
///
/// `class_path` holds archive paths relative to the content root.
pub fn manifest(unit: &CompositionUnit, bean_package: &str, class_path: &[String]) -> String {
    let mut out = String::from("Manifest-Version: 1.0\n");
    if !class_path.is_empty() {
        out.push_str(&format!("Class-Path: {}\n", class_path.join(" ")));
    }
    out.push('\n');

    push_stanza(&mut out, &format!("{}/{}.class", bean_package, unit.name));
    for node in unit.nodes().iter().filter(|n| n.register_in_manifest) {
        push_stanza(
            &mut out,
            &format!("{}.class", node.component.type_name.replace('.', "/")),
        );
    }
    out
}

fn push_stanza(out: &mut String, entry: &str) {
    out.push_str(&format!("Name: {}\nJava-Bean: True\n\n", entry));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CompositionNode;
    use crate::types::{ComponentRef, NodeId, WrapperId};
    use std::path::PathBuf;

    #[test]
    fn lists_unit_and_registered_members() {
        let mut filter = CompositionNode::new(
            NodeId(0),
            "Filter",
            WrapperId(1),
            ComponentRef::new("solution.MedianFilter", 1),
            PathBuf::from("filters.jar"),
        );
        filter.register_in_manifest = true;
        let viewer = CompositionNode::new(
            NodeId(1),
            "Viewer",
            WrapperId(2),
            ComponentRef::new("solution.Viewer", 2),
            PathBuf::from("viewer.jar"),
        );
        let unit = CompositionUnit::new("Combo", vec![filter, viewer]);

        let text = manifest(
            &unit,
            "weld/generated/beans",
            &["lib/filters.jar".to_string(), "lib/viewer.jar".to_string()],
        );
        assert!(text.starts_with("Manifest-Version: 1.0\nClass-Path: lib/filters.jar lib/viewer.jar\n\n"));
        assert!(text.contains("Name: weld/generated/beans/Combo.class\nJava-Bean: True\n"));
        assert!(text.contains("Name: solution/MedianFilter.class\nJava-Bean: True\n"));
        assert!(!text.contains("solution/Viewer.class"));
    }
}
