//! # Composition Graph Builder
//!
//! Turns one wrapper group into a `CompositionUnit`.
//!
//! Materialization is depth-first. A memo table keyed by `WrapperId` maps
//! every wrapper already reached to its node, and a node is registered in the
//! memo before its bindings are followed, so a binding back into the current
//! chain resolves to the existing node instead of recursing again.

use crate::graph::{
    CompositionEdge, CompositionNode, CompositionUnit, DeclaringCapability, EdgeKind,
    ExportEvent, ExportFeature, ExportMethod, ExportProperty,
};
use crate::partition::WrapperGroup;
use crate::primitives::{CHANGE_EVENT_NAME, RESERVED_METHOD_NAMES, in_pool};
use crate::providers::ComponentDescriptor;
use crate::types::{Capability, MethodSig, NodeId, WeldError, Wrapper, WrapperId};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CAPABILITY RESOLUTION
// =============================================================================

/// Capabilities of one component, indexed by name.
struct CapabilityIndex<'a> {
    by_name: BTreeMap<&'a str, &'a Capability>,
}

impl<'a> CapabilityIndex<'a> {
    fn new(capabilities: &'a [Capability]) -> Self {
        Self {
            by_name: capabilities.iter().map(|c| (c.name.as_str(), c)).collect(),
        }
    }

    /// Every capability `name` extends, transitively, excluding itself.
    fn supertypes(&self, name: &str) -> BTreeSet<&'a str> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<&'a str> = self
            .by_name
            .get(name)
            .copied()
            .map(|c| c.extends.iter().map(String::as_str).collect())
            .unwrap_or_default();
        while let Some(next) = pending.pop() {
            if let Some(cap) = self.by_name.get(next).copied()
                && seen.insert(cap.name.as_str())
            {
                pending.extend(cap.extends.iter().map(String::as_str));
            }
        }
        seen
    }

    /// Own and inherited methods of `capability`, in declaration order.
    fn required_methods(&self, capability: &Capability) -> Vec<MethodSig> {
        let mut methods: Vec<MethodSig> = capability.methods.clone();
        for parent in self.supertypes(&capability.name) {
            if let Some(cap) = self.by_name.get(parent) {
                for method in &cap.methods {
                    if !methods.iter().any(|m| m.same_signature(method)) {
                        methods.push(method.clone());
                    }
                }
            }
        }
        methods
    }

    /// Leaf-most listener capabilities declaring `method`.
    ///
    /// A capability declares a method if the method is its own or inherited.
    /// Among the declaring capabilities, one is dropped when another declaring
    /// capability extends it. The first survivor by name is chosen; the others
    /// are returned as alternatives.
    fn declaring(&self, method: &MethodSig) -> Option<DeclaringCapability> {
        let candidates: Vec<&Capability> = self
            .by_name
            .values()
            .copied()
            .filter(|c| c.listener)
            .filter(|c| {
                self.required_methods(c)
                    .iter()
                    .any(|m| m.same_signature(method))
            })
            .collect();

        let leaves: Vec<&Capability> = candidates
            .iter()
            .copied()
            .filter(|c| {
                !candidates.iter().any(|other| {
                    other.name != c.name && self.supertypes(&other.name).contains(c.name.as_str())
                })
            })
            .collect();

        let (chosen, rest) = leaves.split_first()?;
        Some(DeclaringCapability {
            name: chosen.name.clone(),
            required: self.required_methods(chosen),
            alternatives: rest.iter().map(|c| c.name.clone()).collect(),
        })
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builds the composition graph of one wrapper group.
pub struct CompositionGraphBuilder<'a, D: ComponentDescriptor + ?Sized> {
    descriptor: &'a D,
    members: Vec<&'a Wrapper>,
    group: BTreeMap<WrapperId, &'a Wrapper>,
    memo: BTreeMap<WrapperId, NodeId>,
    nodes: Vec<CompositionNode>,
}

impl<'a, D: ComponentDescriptor + ?Sized> CompositionGraphBuilder<'a, D> {
    #[must_use]
    pub fn new(descriptor: &'a D, members: &[&'a Wrapper]) -> Self {
        Self {
            descriptor,
            members: members.to_vec(),
            group: members.iter().map(|w| (w.id, *w)).collect(),
            memo: BTreeMap::new(),
            nodes: Vec::new(),
        }
    }

    /// Materialize every member and assemble the unit.
    pub fn build(mut self, name: &str) -> Result<CompositionUnit, WeldError> {
        for wrapper in self.members.clone() {
            self.materialize(wrapper)?;
        }
        tracing::debug!(unit = name, nodes = self.nodes.len(), "built composition graph");
        Ok(CompositionUnit::new(name, self.nodes))
    }

    fn materialize(&mut self, wrapper: &'a Wrapper) -> Result<NodeId, WeldError> {
        if let Some(existing) = self.memo.get(&wrapper.id) {
            return Ok(*existing);
        }

        let id = NodeId(self.nodes.len());
        let node = self.describe_node(id, wrapper)?;
        self.nodes.push(node);
        self.memo.insert(wrapper.id, id);

        for target in &wrapper.direct_targets {
            if let Some(end) = self.follow(target.target)? {
                self.push_edge(id, end, EdgeKind::Direct {
                    event_set: target.event_set.clone(),
                });
            }
        }
        for target in &wrapper.adapter_targets {
            if let Some(end) = self.follow(target.target)? {
                self.push_edge(id, end, EdgeKind::Adapter {
                    event_set: target.event_set.clone(),
                    hookup_type: target.hookup_type.clone(),
                    hookup_path: target.hookup_path.clone(),
                });
            }
        }
        for target in &wrapper.property_targets {
            if let Some(end) = self.follow(target.target)? {
                self.push_edge(id, end, EdgeKind::PropertyBinding {
                    event_set: target.event_set.clone(),
                    setter: target.setter.clone(),
                });
            }
        }
        Ok(id)
    }

    /// Materialize a binding target if it belongs to the group.
    fn follow(&mut self, target: WrapperId) -> Result<Option<NodeId>, WeldError> {
        match self.group.get(&target).copied() {
            Some(wrapper) => self.materialize(wrapper).map(Some),
            None => Ok(None),
        }
    }

    fn push_edge(&mut self, start: NodeId, end: NodeId, kind: EdgeKind) {
        if let Some(node) = self.nodes.get_mut(start.index()) {
            node.edges.push(CompositionEdge { start, end, kind });
        }
    }

    /// Read the descriptor and stage every eligible feature.
    fn describe_node(&self, id: NodeId, wrapper: &Wrapper) -> Result<CompositionNode, WeldError> {
        let info = self.descriptor.describe(&wrapper.component)?;
        let capabilities = self.descriptor.ancestry(&wrapper.component)?;
        let index = CapabilityIndex::new(&capabilities);

        let mut node = CompositionNode::new(
            id,
            wrapper.label.clone(),
            wrapper.id,
            wrapper.component.clone(),
            wrapper.origin.clone(),
        );

        for property in info.properties {
            if property.hidden || property.expert {
                continue;
            }
            if property.getter.is_none() || property.setter.is_none() {
                continue;
            }
            let freeze_default = wrapper.changed_properties.contains(&property.name);
            node.properties.push(ExportProperty {
                feature: ExportFeature::new(property.name.clone(), id),
                info: property,
                freeze_default,
            });
        }

        for method in info.methods {
            let sig = method.signature;
            if method.hidden || method.expert || !sig.is_void() {
                continue;
            }
            if in_pool(RESERVED_METHOD_NAMES, &sig.name) {
                continue;
            }
            let duplicate = node.methods.iter().any(|m| m.signature.same_signature(&sig));
            let accessor = node.properties.iter().any(|p| {
                p.info.getter.as_ref().is_some_and(|g| g.same_signature(&sig))
                    || p.info.setter.as_ref().is_some_and(|s| s.same_signature(&sig))
            });
            if duplicate || accessor {
                continue;
            }

            let capability = index.declaring(&sig);
            if let Some(cap) = &capability
                && cap.is_ambiguous()
            {
                tracing::warn!(
                    node = %wrapper.label,
                    method = %sig,
                    chosen = %cap.name,
                    alternatives = ?cap.alternatives,
                    "several capabilities declare the method; picked the first by name"
                );
            }
            node.methods.push(ExportMethod {
                feature: ExportFeature::new(sig.name.clone(), id),
                signature: sig,
                capability,
            });
        }

        for event in info.events {
            if event.hidden || event.expert || event.name == CHANGE_EVENT_NAME {
                continue;
            }
            node.events.push(ExportEvent {
                feature: ExportFeature::new(event.name.clone(), id),
                event_set: event,
            });
        }

        node.sort_features();
        Ok(node)
    }
}

/// Build the composition unit of one group.
pub fn build_unit<D: ComponentDescriptor + ?Sized>(
    descriptor: &D,
    group: &WrapperGroup<'_>,
    name: &str,
) -> Result<CompositionUnit, WeldError> {
    CompositionGraphBuilder::new(descriptor, &group.members).build(name)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Feature;
    use crate::partition::partition;
    use crate::providers::{DescriptorEntry, DescriptorTable};
    use crate::types::{ComponentInfo, ComponentRef, EventSetInfo, EventTarget, MethodInfo, PropertyInfo};

    fn listener(name: &str, methods: &[&str], extends: &[&str]) -> Capability {
        Capability {
            name: name.to_string(),
            listener: true,
            methods: methods.iter().map(|m| MethodSig::void(*m, &["demo.Event"])).collect(),
            extends: extends.iter().map(|e| (*e).to_string()).collect(),
        }
    }

    fn method(name: &str) -> MethodInfo {
        MethodInfo {
            signature: MethodSig::void(name, &["demo.Event"]),
            hidden: false,
            expert: false,
        }
    }

    fn event_set(name: &str) -> EventSetInfo {
        EventSetInfo {
            name: name.to_string(),
            listener_type: "demo.Listener".to_string(),
            listener_methods: vec!["handle".to_string()],
            add_method: "addListener".to_string(),
            remove_method: "removeListener".to_string(),
            get_method: None,
            hidden: false,
            expert: false,
        }
    }

    fn table_with(entry: DescriptorEntry) -> DescriptorTable {
        let mut table = DescriptorTable::new();
        table.insert("demo.Part", entry);
        table
    }

    fn part(id: u64) -> Wrapper {
        Wrapper::new(WrapperId(id), "Part", ComponentRef::new("demo.Part", id), "parts.jar")
    }

    fn build_single(table: &DescriptorTable, wrappers: &[Wrapper]) -> CompositionUnit {
        let groups = partition(wrappers);
        build_unit(table, &groups[0], "Combo").expect("build")
    }

    #[test]
    fn eligibility_filters() {
        let mut info = ComponentInfo::default();
        info.properties.push(PropertyInfo {
            name: "value".to_string(),
            display_name: None,
            type_name: "int".to_string(),
            getter: Some(MethodSig::getter("getValue", "int")),
            setter: Some(MethodSig::void("setValue", &["int"])),
            hidden: false,
            expert: false,
            editor: None,
            value: None,
        });
        let read_only = PropertyInfo {
            name: "readOnly".to_string(),
            setter: None,
            ..info.properties[0].clone()
        };
        info.properties.push(read_only);
        info.methods.push(MethodInfo {
            signature: MethodSig::void("setValue", &["int"]),
            hidden: false,
            expert: false,
        });
        info.methods.push(MethodInfo {
            signature: MethodSig::void("wait", &[]),
            hidden: false,
            expert: false,
        });
        info.methods.push(MethodInfo {
            signature: MethodSig::getter("compute", "int"),
            hidden: false,
            expert: false,
        });
        info.methods.push(method("reset"));
        info.methods.push(method("reset"));
        info.events.push(event_set("propertyChange"));
        info.events.push(event_set("tick"));
        info.events.push(EventSetInfo {
            hidden: true,
            ..event_set("secret")
        });

        let table = table_with(DescriptorEntry {
            info,
            capabilities: Vec::new(),
        });
        let unit = build_single(&table, &[part(1)]);
        let node = &unit.nodes()[0];

        let props: Vec<_> = node.properties.iter().map(|p| p.name()).collect();
        let methods: Vec<_> = node.methods.iter().map(|m| m.name()).collect();
        let events: Vec<_> = node.events.iter().map(|e| e.name()).collect();
        assert_eq!(props, vec!["value"]);
        assert_eq!(methods, vec!["reset"]);
        assert_eq!(events, vec!["tick"]);
    }

    #[test]
    fn changed_properties_freeze_defaults() {
        let mut info = ComponentInfo::default();
        info.properties.push(PropertyInfo {
            name: "threshold".to_string(),
            display_name: None,
            type_name: "int".to_string(),
            getter: Some(MethodSig::getter("getThreshold", "int")),
            setter: Some(MethodSig::void("setThreshold", &["int"])),
            hidden: false,
            expert: false,
            editor: None,
            value: None,
        });
        let table = table_with(DescriptorEntry {
            info,
            capabilities: Vec::new(),
        });
        let mut wrapper = part(1);
        wrapper.changed_properties.insert("threshold".to_string());
        let unit = build_single(&table, &[wrapper]);
        assert!(unit.nodes()[0].properties[0].freeze_default);
    }

    #[test]
    fn features_sorted_by_name() {
        let mut info = ComponentInfo::default();
        for name in ["zeta", "alpha", "mid"] {
            info.methods.push(method(name));
        }
        let table = table_with(DescriptorEntry {
            info,
            capabilities: Vec::new(),
        });
        let unit = build_single(&table, &[part(1)]);
        let methods: Vec<_> = unit.nodes()[0].methods.iter().map(|m| m.name()).collect();
        assert_eq!(methods, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn most_derived_capability_wins() {
        let mut info = ComponentInfo::default();
        info.methods.push(method("handle"));
        let table = table_with(DescriptorEntry {
            info,
            capabilities: vec![
                listener("demo.BaseListener", &["handle"], &[]),
                listener("demo.RichListener", &["extra"], &["demo.BaseListener"]),
            ],
        });
        let unit = build_single(&table, &[part(1)]);
        let cap = unit.nodes()[0].methods[0]
            .capability
            .as_ref()
            .expect("capability");
        assert_eq!(cap.name, "demo.RichListener");
        assert!(!cap.is_ambiguous());
        let required: Vec<_> = cap.required.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(required, vec!["extra", "handle"]);
    }

    #[test]
    fn non_listener_capabilities_are_ignored() {
        let mut info = ComponentInfo::default();
        info.methods.push(method("handle"));
        let mut plain = listener("demo.Plain", &["handle"], &[]);
        plain.listener = false;
        let table = table_with(DescriptorEntry {
            info,
            capabilities: vec![plain],
        });
        let unit = build_single(&table, &[part(1)]);
        assert!(unit.nodes()[0].methods[0].capability.is_none());
    }

    #[test]
    fn ambiguous_capability_picks_first_by_name_and_records_alternatives() {
        let mut info = ComponentInfo::default();
        info.methods.push(method("handle"));
        let table = table_with(DescriptorEntry {
            info,
            capabilities: vec![
                listener("demo.ZetaListener", &["handle"], &[]),
                listener("demo.AlphaListener", &["handle"], &[]),
            ],
        });
        let unit = build_single(&table, &[part(1)]);
        let cap = unit.nodes()[0].methods[0]
            .capability
            .as_ref()
            .expect("capability");
        assert_eq!(cap.name, "demo.AlphaListener");
        assert_eq!(cap.alternatives, vec!["demo.ZetaListener".to_string()]);
    }

    #[test]
    fn cycles_produce_one_node_per_wrapper() {
        let table = table_with(DescriptorEntry::default());
        let mut a = part(1);
        let mut b = part(2);
        a.direct_targets.push(EventTarget {
            target: WrapperId(2),
            event_set: event_set("tick"),
        });
        b.direct_targets.push(EventTarget {
            target: WrapperId(1),
            event_set: event_set("tick"),
        });
        let mut c = part(3);
        c.direct_targets.push(EventTarget {
            target: WrapperId(3),
            event_set: event_set("tick"),
        });

        let unit = build_single(&table, &[a, b]);
        assert_eq!(unit.node_count(), 2);
        assert_eq!(unit.edges().count(), 2);

        let looped = build_single(&table, &[c]);
        assert_eq!(looped.node_count(), 1);
        let edge = looped.edges().next().expect("self edge");
        assert_eq!(edge.start, edge.end);
    }

    #[test]
    fn introspection_failure_propagates() {
        let table = DescriptorTable::new();
        let wrappers = [part(1)];
        let groups = partition(&wrappers);
        let err = build_unit(&table, &groups[0], "Combo").expect_err("no descriptor");
        assert!(matches!(err, WeldError::Introspection { .. }));
    }
}
