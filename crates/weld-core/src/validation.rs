//! # Constraint Validation
//!
//! Checks a composition unit against the naming and interface contract of
//! generated sources. Validation never fails and never stops early: every
//! broken rule becomes one `ConstraintViolation`, so all problems can be
//! shown at once. A non-empty result blocks synthesis.
//!
//! Rules:
//! - Unit name: identifier rules, reserved class names, staged resources,
//!   sibling units.
//! - Node names: identifier rules, reserved field names, the unit's own name
//!   (case-insensitive), other nodes of the unit.
//! - Exported feature names: identifier rules, reserved names, and every
//!   member name they generate against the members of every other exported
//!   feature.
//! - Interface completeness: every method of a declaring capability must be
//!   exported.
//!
//! A collision between two items is reported once, naming both.

use crate::config::ExportConfig;
use crate::graph::{CompositionUnit, Feature};
use crate::naming::{is_identifier, lower_first};
use crate::primitives::{
    MAX_IDENTIFIER_LENGTH, METADATA_SUFFIX, RESERVED_CLASS_NAMES, RESERVED_EVENT_NAMES,
    RESERVED_METHOD_NAMES, RESERVED_PROPERTY_NAMES, in_pool, is_reserved_keyword,
};
use crate::types::{ConstraintViolation, ViolationKind};
use std::collections::BTreeSet;

/// Kind of exported feature, for messages and collision rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureKind {
    Property,
    Method,
    Event,
}

impl FeatureKind {
    fn label(self) -> &'static str {
        match self {
            Self::Property => "Property",
            Self::Method => "Method",
            Self::Event => "Event",
        }
    }
}

/// Flattened view of one exported feature.
struct FeatureEntry<'a> {
    kind: FeatureKind,
    name: &'a str,
    node: &'a str,
    members: Vec<String>,
    params: Option<&'a [String]>,
}

impl FeatureEntry<'_> {
    fn subject(&self) -> String {
        format!("{} {} of node {}", self.kind.label(), self.name, self.node)
    }

    fn reference(&self) -> String {
        format!(
            "{} {} of node {}",
            self.kind.label().to_lowercase(),
            self.name,
            self.node
        )
    }

    /// First generated member shared with `other`, if the two collide.
    fn collision_with(&self, other: &FeatureEntry<'_>) -> Option<String> {
        if let (Some(a), Some(b)) = (self.params, other.params) {
            return (self.name == other.name && a == b).then(|| self.name.to_string());
        }
        self.members
            .iter()
            .find(|m| other.members.contains(m))
            .cloned()
    }
}

/// Validates composition units before synthesis.
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator {
    package: String,
    /// Entry names of every staged resource.
    resource_names: BTreeSet<String>,
}

impl ConstraintValidator {
    #[must_use]
    pub fn new(config: &ExportConfig, resource_names: BTreeSet<String>) -> Self {
        Self {
            package: config.bean_package.clone(),
            resource_names,
        }
    }

    /// Every violation of `unit`. `siblings` are the names of the other units
    /// of the same export run.
    pub fn validate(&self, unit: &CompositionUnit, siblings: &[String]) -> Vec<ConstraintViolation> {
        let mut out = Vec::new();
        self.check_unit(unit, siblings, &mut out);
        check_nodes(unit, &mut out);
        check_features(unit, &mut out);
        check_capabilities(unit, &mut out);
        tracing::debug!(unit = %unit.name, violations = out.len(), "validated unit");
        out
    }

    fn check_unit(
        &self,
        unit: &CompositionUnit,
        siblings: &[String],
        out: &mut Vec<ConstraintViolation>,
    ) {
        let name = unit.name.as_str();
        if !check_identifier("Unit", &format!("Unit {}", name), name, out) {
            return;
        }
        if RESERVED_CLASS_NAMES.contains(&name) {
            out.push(ConstraintViolation::new(
                ViolationKind::Reserved,
                format!("Unit {}: name conflicts with reserved class name.", name),
            ));
        }
        if self.conflicts_with_resource(name) {
            out.push(ConstraintViolation::new(
                ViolationKind::ResourceConflict,
                format!("Unit {}: name conflicts with resource.", name),
            ));
        }
        for sibling in siblings.iter().filter(|s| s.as_str() == name) {
            out.push(ConstraintViolation::new(
                ViolationKind::NameCollision,
                format!("Unit {}: name conflicts with unit {}.", name, sibling),
            ));
        }
    }

    fn conflicts_with_resource(&self, name: &str) -> bool {
        let stem = format!("{}/{}", self.package, name);
        [
            format!("{}.java", stem),
            format!("{}.class", stem),
            format!("{}{}.java", stem, METADATA_SUFFIX),
            format!("{}{}.class", stem, METADATA_SUFFIX),
        ]
        .iter()
        .any(|candidate| self.resource_names.contains(candidate))
    }
}

/// Length, identifier and keyword rules. Returns `false` for an empty name.
///
/// `owner` names the item when it has no name; `subject` is used otherwise.
fn check_identifier(
    owner: &str,
    subject: &str,
    name: &str,
    out: &mut Vec<ConstraintViolation>,
) -> bool {
    if name.is_empty() {
        out.push(ConstraintViolation::new(
            ViolationKind::MissingName,
            format!("{} has no name.", owner),
        ));
        return false;
    }
    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        out.push(ConstraintViolation::new(
            ViolationKind::TooLong,
            format!(
                "{}: name exceeds maximum length of {}.",
                subject, MAX_IDENTIFIER_LENGTH
            ),
        ));
    }
    if !is_identifier(name) {
        out.push(ConstraintViolation::new(
            ViolationKind::InvalidIdentifier,
            format!("{}: name not a valid identifier.", subject),
        ));
    } else if is_reserved_keyword(name) {
        out.push(ConstraintViolation::new(
            ViolationKind::InvalidIdentifier,
            format!("{}: name is a reserved keyword.", subject),
        ));
    }
    true
}

fn check_nodes(unit: &CompositionUnit, out: &mut Vec<ConstraintViolation>) {
    let nodes = unit.nodes();
    for node in nodes {
        let subject = format!("Node {}", node.name);
        if !check_identifier("Node", &subject, &node.name, out) {
            continue;
        }
        if in_pool(RESERVED_PROPERTY_NAMES, &node.name) {
            out.push(ConstraintViolation::new(
                ViolationKind::Reserved,
                format!("Node {}: name conflicts with reserved field name.", node.name),
            ));
        }
        if node.name.to_lowercase() == unit.name.to_lowercase() {
            out.push(ConstraintViolation::new(
                ViolationKind::NameCollision,
                format!("Node {}: name conflicts with unit {}.", node.name, unit.name),
            ));
        }
    }

    // Fields are named after the node with a lowercase first letter.
    for (i, a) in nodes.iter().enumerate() {
        if a.name.is_empty() {
            continue;
        }
        for b in nodes.iter().skip(i + 1) {
            if lower_first(&a.name) == lower_first(&b.name) {
                out.push(ConstraintViolation::new(
                    ViolationKind::NameCollision,
                    format!(
                        "Node {} ({}): name conflicts with node {} ({}).",
                        a.name, a.component.type_name, b.name, b.component.type_name
                    ),
                ));
            }
        }
    }
}

fn feature_entries(unit: &CompositionUnit) -> Vec<FeatureEntry<'_>> {
    let node_name = |id| unit.node(id).map(|n| n.name.as_str()).unwrap_or_default();
    let mut entries = Vec::new();
    for p in unit.exported_properties() {
        entries.push(FeatureEntry {
            kind: FeatureKind::Property,
            name: p.name(),
            node: node_name(p.feature.node),
            members: p.generated_members(),
            params: None,
        });
    }
    for m in unit.exported_methods() {
        entries.push(FeatureEntry {
            kind: FeatureKind::Method,
            name: m.name(),
            node: node_name(m.feature.node),
            members: m.generated_members(),
            params: Some(&m.signature.params),
        });
    }
    for e in unit.exported_events() {
        entries.push(FeatureEntry {
            kind: FeatureKind::Event,
            name: e.name(),
            node: node_name(e.feature.node),
            members: e.generated_members(),
            params: None,
        });
    }
    entries
}

fn check_features(unit: &CompositionUnit, out: &mut Vec<ConstraintViolation>) {
    let entries = feature_entries(unit);

    for entry in &entries {
        let owner = format!("{} of node {}", entry.kind.label(), entry.node);
        if !check_identifier(&owner, &entry.subject(), entry.name, out) {
            continue;
        }

        let reserved = in_pool(RESERVED_METHOD_NAMES, entry.name)
            || entry.members.iter().any(|m| in_pool(RESERVED_METHOD_NAMES, m))
            || (entry.kind == FeatureKind::Event && in_pool(RESERVED_EVENT_NAMES, entry.name));
        if reserved {
            out.push(ConstraintViolation::new(
                ViolationKind::Reserved,
                format!(
                    "{}: name conflicts with reserved {} name.",
                    entry.subject(),
                    entry.kind.label().to_lowercase()
                ),
            ));
        }
    }

    for (i, a) in entries.iter().enumerate() {
        if a.name.is_empty() {
            continue;
        }
        for b in entries.iter().skip(i + 1) {
            if b.name.is_empty() {
                continue;
            }
            if let Some(member) = a.collision_with(b) {
                out.push(ConstraintViolation::new(
                    ViolationKind::NameCollision,
                    format!(
                        "{}: generated name {} conflicts with {}.",
                        a.subject(),
                        member,
                        b.reference()
                    ),
                ));
            }
        }
    }
}

fn check_capabilities(unit: &CompositionUnit, out: &mut Vec<ConstraintViolation>) {
    let mut missing: BTreeSet<(String, String, Vec<String>)> = BTreeSet::new();
    for capability in unit.implemented_capabilities() {
        for method in &capability.required {
            missing.insert((
                capability.name.clone(),
                method.name.clone(),
                method.params.clone(),
            ));
        }
    }
    for method in unit.exported_methods() {
        missing.retain(|(_, name, params)| {
            !(name == method.name() && *params == method.signature.params)
        });
    }
    for (capability, name, params) in missing {
        out.push(ConstraintViolation::new(
            ViolationKind::PartialCapability,
            format!(
                "Method {}({}) of capability {} not implemented; capability partially implemented.",
                name,
                params.join(", "),
                capability
            ),
        ));
    }
}

/// Validate `unit` on its own: no staged resources, no sibling units.
pub fn validate(unit: &CompositionUnit) -> Vec<ConstraintViolation> {
    ConstraintValidator::new(&ExportConfig::default(), BTreeSet::new()).validate(unit, &[])
}

// =============================================================================
// TESTS
// =============================================================================
