//! # Interface Inference
//!
//! Proposes a unit's input and output interface from its edges:
//! - output: nodes with no outgoing edges
//! - input: nodes no edge points to
//!
//! When a cycle covers the whole unit one of these sets is empty and the
//! decision goes to the `NodeSelector` over all nodes.

use crate::graph::CompositionUnit;
use crate::providers::{NodeCandidate, NodeSelector};
use crate::types::{InterfaceSide, NodeId, WeldError};
use std::collections::BTreeSet;

const OUTPUT_PROMPT: &str = "Could not infer output nodes (the composition may be cyclic). Select the output interface.";
const INPUT_PROMPT: &str = "Could not infer input nodes (the composition may be cyclic). Select the input interface.";

/// Source/sink detection over a composition graph.
pub struct InterfaceInferencer;

impl InterfaceInferencer {
    /// Nodes with zero outgoing edges, in node order.
    pub fn infer_outputs(unit: &CompositionUnit) -> Vec<NodeId> {
        unit.nodes()
            .iter()
            .filter(|n| n.edges.is_empty())
            .map(|n| n.id)
            .collect()
    }

    /// Nodes with zero incoming edges, in node order.
    pub fn infer_inputs(unit: &CompositionUnit) -> Vec<NodeId> {
        let targeted: BTreeSet<NodeId> = unit.edges().map(|e| e.end).collect();
        unit.nodes()
            .iter()
            .map(|n| n.id)
            .filter(|id| !targeted.contains(id))
            .collect()
    }

    /// Infer both interfaces and mark the nodes.
    ///
    /// Output is inferred first. An empty inference asks `selector` to choose
    /// among all nodes; an empty selection aborts with `EmptyInterface` and
    /// leaves the unit unchanged.
    pub fn infer_interfaces<S: NodeSelector + ?Sized>(
        unit: &mut CompositionUnit,
        selector: &mut S,
    ) -> Result<(), WeldError> {
        let mut outputs = Self::infer_outputs(unit);
        if outputs.is_empty() {
            outputs = Self::fallback(unit, selector, InterfaceSide::Output)?;
        }
        let mut inputs = Self::infer_inputs(unit);
        if inputs.is_empty() {
            inputs = Self::fallback(unit, selector, InterfaceSide::Input)?;
        }

        tracing::debug!(
            unit = %unit.name,
            inputs = inputs.len(),
            outputs = outputs.len(),
            "inferred interfaces"
        );
        unit.set_interfaces(&inputs, &outputs);
        Ok(())
    }

    fn fallback<S: NodeSelector + ?Sized>(
        unit: &CompositionUnit,
        selector: &mut S,
        side: InterfaceSide,
    ) -> Result<Vec<NodeId>, WeldError> {
        tracing::warn!(unit = %unit.name, %side, "interface inference failed; asking for a selection");
        let candidates: Vec<NodeCandidate> = unit
            .nodes()
            .iter()
            .map(|n| NodeCandidate {
                id: n.id,
                name: n.name.clone(),
                type_name: n.component.type_name.clone(),
            })
            .collect();
        let prompt = match side {
            InterfaceSide::Output => OUTPUT_PROMPT,
            InterfaceSide::Input => INPUT_PROMPT,
        };

        let mut seen = BTreeSet::new();
        let selected: Vec<NodeId> = selector
            .select_nodes(&candidates, prompt)
            .into_iter()
            .filter(|id| unit.node(*id).is_some())
            .filter(|id| seen.insert(*id))
            .collect();

        if selected.is_empty() {
            return Err(WeldError::EmptyInterface {
                unit: unit.name.clone(),
                side,
            });
        }
        Ok(selected)
    }
}

/// Infer and mark the input/output interface of `unit`.
pub fn infer_interfaces<S: NodeSelector + ?Sized>(
    unit: &mut CompositionUnit,
    selector: &mut S,
) -> Result<(), WeldError> {
    InterfaceInferencer::infer_interfaces(unit, selector)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CompositionEdge, CompositionNode, EdgeKind};
    use crate::providers::ScriptedSelector;
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
                    ComponentRef::new("demo.Part", i as u64),
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
    fn acyclic_chain() {
        let mut chain = unit(&["A", "B", "C"], &[(0, 1), (1, 2)]);
        let mut selector = ScriptedSelector::cancelling();
        infer_interfaces(&mut chain, &mut selector).expect("infer");

        let inputs: Vec<_> = chain.input_nodes().map(|n| n.name.as_str()).collect();
        let outputs: Vec<_> = chain.output_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(inputs, vec!["A"]);
        assert_eq!(outputs, vec!["C"]);
        assert!(selector.prompts().is_empty());
    }

    #[test]
    fn full_cycle_asks_for_both_sides() {
        let mut cycle = unit(&["A", "B"], &[(0, 1), (1, 0)]);
        let mut selector = ScriptedSelector::new(vec![vec!["B"], vec!["A"]]);
        infer_interfaces(&mut cycle, &mut selector).expect("infer");

        assert_eq!(selector.prompts().len(), 2);
        assert!(selector.prompts()[0].contains("output"));
        assert!(selector.prompts()[1].contains("input"));
        let inputs: Vec<_> = cycle.input_nodes().map(|n| n.name.as_str()).collect();
        let outputs: Vec<_> = cycle.output_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(inputs, vec!["A"]);
        assert_eq!(outputs, vec!["B"]);
    }

    #[test]
    fn cancelled_selection_is_an_error() {
        let mut cycle = unit(&["A", "B"], &[(0, 1), (1, 0)]);
        let mut selector = ScriptedSelector::cancelling();
        let err = infer_interfaces(&mut cycle, &mut selector).expect_err("cancelled");
        assert!(matches!(
            err,
            WeldError::EmptyInterface {
                side: InterfaceSide::Output,
                ..
            }
        ));
        assert_eq!(cycle.input_nodes().count(), 0);
    }

    #[test]
    fn isolated_node_is_both_input_and_output() {
        let mut single = unit(&["Solo"], &[]);
        let mut selector = ScriptedSelector::cancelling();
        infer_interfaces(&mut single, &mut selector).expect("infer");
        let node = &single.nodes()[0];
        assert!(node.input_interface && node.output_interface);
    }

    #[test]
    fn partial_cycle_still_infers() {
        // A -> B <-> C: C has an outgoing edge, B too; A is the only source.
        let mut mixed = unit(&["A", "B", "C"], &[(0, 1), (1, 2), (2, 1)]);
        let mut selector = ScriptedSelector::new(vec![vec!["C"]]);
        infer_interfaces(&mut mixed, &mut selector).expect("infer");
        assert_eq!(selector.prompts().len(), 1);
        let inputs: Vec<_> = mixed.input_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(inputs, vec!["A"]);
    }
}
