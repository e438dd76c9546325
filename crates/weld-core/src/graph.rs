//! # Composition Graph
//!
//! The per-unit graph produced by the builder and consumed by inference,
//! validation and synthesis.
//!
//! Nodes live in an arena (`Vec<CompositionNode>`) and are addressed by
//! `NodeId`, their index. Edges store the `NodeId` of both ends, so cycles
//! need no shared ownership.

use crate::naming::{add_listener_name, get_listeners_name, remove_listener_name};
use crate::naming::{property_getter, setter_name};
use crate::types::{ComponentRef, EventSetInfo, MethodSig, NodeId, PropertyInfo, WrapperId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

// =============================================================================
// EXPORT FEATURES
// =============================================================================

/// State shared by every feature staged for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFeature {
    /// Name in the generated class. Starts as the descriptor name.
    pub name: String,
    /// Node that owns the feature.
    pub node: NodeId,
    /// Whether the feature is part of the generated class.
    pub export: bool,
}

impl ExportFeature {
    #[must_use]
    pub fn new(name: impl Into<String>, node: NodeId) -> Self {
        Self {
            name: name.into(),
            node,
            export: true,
        }
    }
}

/// Common access to the `ExportFeature` part of properties, methods and events.
pub trait Feature {
    fn feature(&self) -> &ExportFeature;
    fn feature_mut(&mut self) -> &mut ExportFeature;

    fn name(&self) -> &str {
        &self.feature().name
    }

    fn is_exported(&self) -> bool {
        self.feature().export
    }

    fn set_exported(&mut self, export: bool) {
        self.feature_mut().export = export;
    }

    fn rename(&mut self, name: impl Into<String>)
    where
        Self: Sized,
    {
        self.feature_mut().name = name.into();
    }

    /// Member names this feature contributes to the generated class.
    fn generated_members(&self) -> Vec<String>;
}

/// A property staged for export as an accessor pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProperty {
    pub feature: ExportFeature,
    pub info: PropertyInfo,
    /// Freeze the component's current value as the startup default.
    pub freeze_default: bool,
}

impl Feature for ExportProperty {
    fn feature(&self) -> &ExportFeature {
        &self.feature
    }

    fn feature_mut(&mut self) -> &mut ExportFeature {
        &mut self.feature
    }

    fn generated_members(&self) -> Vec<String> {
        vec![
            property_getter(&self.info, self.name()),
            setter_name(self.name()),
        ]
    }
}

/// The capability chosen as the declaring interface of an exported method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaringCapability {
    /// Fully qualified capability name.
    pub name: String,
    /// Every method the capability requires, own and inherited.
    pub required: Vec<MethodSig>,
    /// Other leaf-most capabilities that declared the same method.
    /// Non-empty means the choice was ambiguous.
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl DeclaringCapability {
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

/// A method staged for export as a pass-through call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMethod {
    pub feature: ExportFeature,
    pub signature: MethodSig,
    pub capability: Option<DeclaringCapability>,
}

impl Feature for ExportMethod {
    fn feature(&self) -> &ExportFeature {
        &self.feature
    }

    fn feature_mut(&mut self) -> &mut ExportFeature {
        &mut self.feature
    }

    fn generated_members(&self) -> Vec<String> {
        vec![self.name().to_string()]
    }
}

/// An event set staged for export as listener registration methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEvent {
    pub feature: ExportFeature,
    pub event_set: EventSetInfo,
}

impl Feature for ExportEvent {
    fn feature(&self) -> &ExportFeature {
        &self.feature
    }

    fn feature_mut(&mut self) -> &mut ExportFeature {
        &mut self.feature
    }

    fn generated_members(&self) -> Vec<String> {
        let mut members = vec![
            add_listener_name(self.name()),
            remove_listener_name(self.name()),
        ];
        if self.event_set.get_method.is_some() {
            members.push(get_listeners_name(self.name()));
        }
        members
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// How an edge is wired in generated code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// The end node implements the listener and is registered directly.
    Direct { event_set: EventSetInfo },
    /// A design-time glue listener forwards to the end node.
    Adapter {
        event_set: EventSetInfo,
        hookup_type: String,
        hookup_path: PathBuf,
    },
    /// A generated adapter forwards property changes into `setter`.
    PropertyBinding { event_set: String, setter: MethodSig },
}

impl EdgeKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Adapter { .. } => "adapter",
            Self::PropertyBinding { .. } => "property",
        }
    }
}

/// A directed wiring relation between two nodes of the same unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionEdge {
    pub start: NodeId,
    pub end: NodeId,
    pub kind: EdgeKind,
}

// =============================================================================
// NODES
// =============================================================================

/// One participating component within a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionNode {
    pub id: NodeId,
    pub name: String,
    pub wrapper: WrapperId,
    pub component: ComponentRef,
    /// Archive the component's type came from.
    pub origin: PathBuf,
    pub properties: Vec<ExportProperty>,
    pub methods: Vec<ExportMethod>,
    pub events: Vec<ExportEvent>,
    pub edges: Vec<CompositionEdge>,
    pub input_interface: bool,
    pub output_interface: bool,
    /// List the member's own class as introspectable in the manifest.
    pub register_in_manifest: bool,
}

impl CompositionNode {
    /// A node without features or edges.
    #[must_use]
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        wrapper: WrapperId,
        component: ComponentRef,
        origin: PathBuf,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            wrapper,
            component,
            origin,
            properties: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
            edges: Vec::new(),
            input_interface: false,
            output_interface: false,
            register_in_manifest: false,
        }
    }

    pub fn all_properties_configurable(&self) -> bool {
        self.properties.iter().all(Feature::is_exported)
    }

    pub fn set_all_properties_configurable(&mut self, configurable: bool) {
        for property in &mut self.properties {
            property.set_exported(configurable);
        }
    }

    pub fn all_methods_in_input_interface(&self) -> bool {
        self.methods.iter().all(Feature::is_exported)
    }

    pub fn set_all_methods_in_input_interface(&mut self, included: bool) {
        for method in &mut self.methods {
            method.set_exported(included);
        }
    }

    pub fn all_events_in_output_interface(&self) -> bool {
        self.events.iter().all(Feature::is_exported)
    }

    pub fn set_all_events_in_output_interface(&mut self, included: bool) {
        for event in &mut self.events {
            event.set_exported(included);
        }
    }

    /// Sort properties, methods and events by name.
    pub fn sort_features(&mut self) {
        self.properties.sort_by(|a, b| a.name().cmp(b.name()));
        self.methods.sort_by(|a, b| a.name().cmp(b.name()));
        self.events.sort_by(|a, b| a.name().cmp(b.name()));
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut ExportProperty> {
        self.properties.iter_mut().find(|p| p.name() == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut ExportMethod> {
        self.methods.iter_mut().find(|m| m.name() == name)
    }

    pub fn event_mut(&mut self, name: &str) -> Option<&mut ExportEvent> {
        self.events.iter_mut().find(|e| e.name() == name)
    }
}

// =============================================================================
// COMPOSITION UNIT
// =============================================================================

/// One exportable artifact composed of one or more bound components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionUnit {
    pub name: String,
    nodes: Vec<CompositionNode>,
    /// Synthesize generic change-notification support.
    pub change_support: bool,
}

impl CompositionUnit {
    /// Create a unit, giving duplicate node names a numeric suffix.
    ///
    /// The first occurrence keeps its name; later ones get the smallest free
    /// counter starting at 2 (`Filter`, `Filter2`, `Filter3`). Every original
    /// name is reserved up front, so a suffix never lands on a user's label.
    #[must_use]
    pub fn new(name: impl Into<String>, mut nodes: Vec<CompositionNode>) -> Self {
        let mut taken: BTreeSet<String> = nodes.iter().map(|n| n.name.clone()).collect();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for node in &mut nodes {
            if !seen.insert(node.name.clone()) {
                let mut counter = 2u32;
                while taken.contains(&format!("{}{}", node.name, counter)) {
                    counter = counter.saturating_add(1);
                }
                node.name = format!("{}{}", node.name, counter);
                taken.insert(node.name.clone());
            }
        }
        Self {
            name: name.into(),
            nodes,
            change_support: false,
        }
    }

    /// All nodes in materialization order.
    pub fn nodes(&self) -> &[CompositionNode] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [CompositionNode] {
        &mut self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&CompositionNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut CompositionNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn node_by_name_mut(&mut self, name: &str) -> Option<&mut CompositionNode> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every edge of every node, in node order.
    pub fn edges(&self) -> impl Iterator<Item = &CompositionEdge> {
        self.nodes.iter().flat_map(|n| n.edges.iter())
    }

    pub fn input_nodes(&self) -> impl Iterator<Item = &CompositionNode> {
        self.nodes.iter().filter(|n| n.input_interface)
    }

    pub fn output_nodes(&self) -> impl Iterator<Item = &CompositionNode> {
        self.nodes.iter().filter(|n| n.output_interface)
    }

    /// Export-flagged properties of every node.
    pub fn exported_properties(&self) -> Vec<&ExportProperty> {
        self.nodes
            .iter()
            .flat_map(|n| n.properties.iter())
            .filter(|p| p.is_exported())
            .collect()
    }

    /// Export-flagged methods of input-interface nodes.
    pub fn exported_methods(&self) -> Vec<&ExportMethod> {
        self.input_nodes()
            .flat_map(|n| n.methods.iter())
            .filter(|m| m.is_exported())
            .collect()
    }

    /// Export-flagged events of output-interface nodes.
    pub fn exported_events(&self) -> Vec<&ExportEvent> {
        self.output_nodes()
            .flat_map(|n| n.events.iter())
            .filter(|e| e.is_exported())
            .collect()
    }

    /// Distinct declaring capabilities of exported methods, sorted by name.
    pub fn implemented_capabilities(&self) -> Vec<&DeclaringCapability> {
        let mut seen = BTreeSet::new();
        let mut capabilities: Vec<&DeclaringCapability> = self
            .exported_methods()
            .into_iter()
            .filter_map(|m| m.capability.as_ref())
            .filter(|c| seen.insert(c.name.as_str()))
            .collect();
        capabilities.sort_by(|a, b| a.name.cmp(&b.name));
        capabilities
    }

    /// Archives the generated class depends on: member origins and
    /// design-time adapter classes.
    pub fn resources(&self) -> BTreeSet<PathBuf> {
        let mut resources = BTreeSet::new();
        for node in &self.nodes {
            resources.insert(node.origin.clone());
            for edge in &node.edges {
                if let EdgeKind::Adapter { hookup_path, .. } = &edge.kind {
                    resources.insert(hookup_path.clone());
                }
            }
        }
        resources
    }

    /// Replace the interface flags of every node.
    pub fn set_interfaces(&mut self, inputs: &[NodeId], outputs: &[NodeId]) {
        for node in &mut self.nodes {
            node.input_interface = inputs.contains(&node.id);
            node.output_interface = outputs.contains(&node.id);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
