//! Statement order of the generated constructor.
//!
//! Every member is instantiated first, in unit order. Wiring follows a
//! topological order of the unit's edges starting from its sources, so a
//! node's edges are emitted after the node and all of its targets exist.
//! Nodes left over by a cycle are wired in unit order.

use crate::graph::{CompositionEdge, CompositionUnit, EdgeKind};
use crate::naming::lower_first;
use crate::primitives::ADAPTER_PREFIX;
use crate::types::NodeId;
use std::collections::{BTreeMap, VecDeque};

/// One wiring statement group of the constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringStep<'u> {
    pub edge: &'u CompositionEdge,
    /// Local variable index for adapter and property edges.
    pub hookup: Option<usize>,
    /// Generated adapter class for property edges.
    pub adapter: Option<String>,
}

/// A generated property-binding adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterSpec {
    pub class_name: String,
    /// Fully qualified type of the bound target.
    pub target_type: String,
    pub setter: String,
    /// Parameter type the new value is cast to.
    pub value_type: String,
}

/// Constructor layout of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringPlan<'u> {
    pub instantiation: Vec<NodeId>,
    pub wiring: Vec<WiringStep<'u>>,
    pub adapters: Vec<AdapterSpec>,
}

impl<'u> WiringPlan<'u> {
    #[must_use]
    pub fn new(unit: &'u CompositionUnit) -> Self {
        let instantiation: Vec<NodeId> = unit.nodes().iter().map(|n| n.id).collect();
        let order = wiring_order(unit);

        let mut wiring = Vec::new();
        let mut adapters = Vec::new();
        let mut hookups = 0usize;
        for id in order {
            let Some(node) = unit.node(id) else {
                continue;
            };
            for edge in &node.edges {
                let step = match &edge.kind {
                    EdgeKind::Direct { .. } => WiringStep {
                        edge,
                        hookup: None,
                        adapter: None,
                    },
                    EdgeKind::Adapter { .. } => WiringStep {
                        edge,
                        hookup: Some(next_hookup(&mut hookups)),
                        adapter: None,
                    },
                    EdgeKind::PropertyBinding { setter, .. } => {
                        let class_name =
                            format!("{}{}_{}", ADAPTER_PREFIX, unit.name, adapters.len());
                        adapters.push(AdapterSpec {
                            class_name: class_name.clone(),
                            target_type: unit
                                .node(edge.end)
                                .map(|n| n.component.type_name.clone())
                                .unwrap_or_default(),
                            setter: setter.name.clone(),
                            value_type: setter.params.first().cloned().unwrap_or_default(),
                        });
                        WiringStep {
                            edge,
                            hookup: Some(next_hookup(&mut hookups)),
                            adapter: Some(class_name),
                        }
                    }
                };
                wiring.push(step);
            }
        }

        tracing::debug!(
            unit = %unit.name,
            statements = wiring.len(),
            adapters = adapters.len(),
            "planned wiring"
        );
        Self {
            instantiation,
            wiring,
            adapters,
        }
    }

    /// Field name of a node in the generated class.
    #[must_use]
    pub fn field(unit: &CompositionUnit, id: NodeId) -> String {
        unit.node(id).map(|n| lower_first(&n.name)).unwrap_or_default()
    }
}

fn next_hookup(counter: &mut usize) -> usize {
    let current = *counter;
    *counter = counter.saturating_add(1);
    current
}

/// Kahn order from in-degree zero nodes; unvisited nodes follow in unit order.
fn wiring_order(unit: &CompositionUnit) -> Vec<NodeId> {
    let mut in_degree: BTreeMap<NodeId, usize> = unit.nodes().iter().map(|n| (n.id, 0)).collect();
    for edge in unit.edges() {
        if edge.start != edge.end
            && let Some(d) = in_degree.get_mut(&edge.end)
        {
            *d = d.saturating_add(1);
        }
    }

    let mut queue: VecDeque<NodeId> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut order = Vec::with_capacity(unit.node_count());
    let mut placed = vec![false; unit.node_count()];

    while let Some(id) = queue.pop_front() {
        if placed.get(id.index()).copied().unwrap_or(true) {
            continue;
        }
        if let Some(slot) = placed.get_mut(id.index()) {
            *slot = true;
        }
        order.push(id);
        let Some(node) = unit.node(id) else {
            continue;
        };
        for edge in node.edges.iter().filter(|e| e.start != e.end) {
            if let Some(d) = in_degree.get_mut(&edge.end) {
                *d = d.saturating_sub(1);
                if *d == 0 {
                    queue.push_back(edge.end);
                }
            }
        }
    }

    for node in unit.nodes() {
        if !placed.get(node.id.index()).copied().unwrap_or(true) {
            order.push(node.id);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CompositionNode;
    use crate::types::{ComponentRef, MethodSig, WrapperId};
    use std::path::PathBuf;

    fn unit(names: &[&str], edges: &[(usize, usize)]) -> CompositionUnit {
        let mut nodes: Vec<CompositionNode> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                CompositionNode::new(
                    NodeId(i),
                    *name,
                    WrapperId(i as u64),
                    ComponentRef::new(format!("demo.{name}"), i as u64),
                    PathBuf::from("parts.jar"),
                )
            })
            .collect();
        for (start, end) in edges {
            nodes[*start].edges.push(CompositionEdge {
                start: NodeId(*start),
                end: NodeId(*end),
                kind: EdgeKind::PropertyBinding {
                    event_set: "propertyChange".to_string(),
                    setter: MethodSig::void("setValue", &["int"]),
                },
            });
        }
        CompositionUnit::new("Combo", nodes)
    }

    #[test]
    fn sources_are_wired_first() {
        // Built order C, B, A; edges A -> B -> C.
        let u = unit(&["C", "B", "A"], &[(2, 1), (1, 0)]);
        let plan = WiringPlan::new(&u);
        assert_eq!(plan.instantiation, vec![NodeId(0), NodeId(1), NodeId(2)]);
        let starts: Vec<_> = plan.wiring.iter().map(|s| s.edge.start).collect();
        assert_eq!(starts, vec![NodeId(2), NodeId(1)]);
    }

    #[test]
    fn cycle_falls_back_to_unit_order() {
        let u = unit(&["A", "B"], &[(0, 1), (1, 0)]);
        let plan = WiringPlan::new(&u);
        let starts: Vec<_> = plan.wiring.iter().map(|s| s.edge.start).collect();
        assert_eq!(starts, vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    fn adapters_are_numbered_per_unit() {
        let u = unit(&["A", "B", "C"], &[(0, 1), (1, 2)]);
        let plan = WiringPlan::new(&u);
        let names: Vec<_> = plan.adapters.iter().map(|a| a.class_name.as_str()).collect();
        assert_eq!(names, vec!["PropertyHookup_Combo_0", "PropertyHookup_Combo_1"]);
        assert_eq!(plan.adapters[0].target_type, "demo.B");
        assert_eq!(plan.adapters[0].value_type, "int");
        assert_eq!(plan.wiring[1].hookup, Some(1));
    }
}
