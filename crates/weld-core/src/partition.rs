//! # Group Partitioning
//!
//! Splits the wrappers of one export run into maximal connected groups.
//! Bindings are directed, but grouping treats them as undirected: two
//! wrappers share a group when either binds to the other, directly or
//! through a chain.
//!
//! Grouping is a single scan in input order. A wrapper adopts the group of
//! the first already-labelled partner it finds; when a scan step links two
//! labelled groups, every member of one is relabelled to the other. Targets
//! outside the exported set are ignored.

use crate::types::{GroupId, Wrapper, WrapperId};
use std::collections::BTreeMap;

/// One connected group, members in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperGroup<'a> {
    pub members: Vec<&'a Wrapper>,
}

impl WrapperGroup<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Ids of the members, in input order.
    pub fn ids(&self) -> impl Iterator<Item = WrapperId> + '_ {
        self.members.iter().map(|w| w.id)
    }
}

/// Partitions wrappers into connected groups.
pub struct GroupPartitioner;

impl GroupPartitioner {
    /// Partition `wrappers` into maximal connected groups.
    ///
    /// Groups are ordered by the position of their first member in the
    /// input. Repeated wrapper ids are counted once. Never fails.
    pub fn partition(wrappers: &[Wrapper]) -> Vec<WrapperGroup<'_>> {
        let mut known: BTreeMap<WrapperId, &Wrapper> = BTreeMap::new();
        let mut order: Vec<&Wrapper> = Vec::with_capacity(wrappers.len());
        for wrapper in wrappers {
            if known.insert(wrapper.id, wrapper).is_none() {
                order.push(wrapper);
            }
        }

        let mut labels: BTreeMap<WrapperId, GroupId> = BTreeMap::new();
        let mut next_label = 0u64;

        for wrapper in &order {
            let targets: Vec<WrapperId> = wrapper
                .binding_targets()
                .filter(|t| known.contains_key(t))
                .collect();

            let current = labels
                .get(&wrapper.id)
                .copied()
                .or_else(|| targets.iter().find_map(|t| labels.get(t).copied()))
                .unwrap_or_else(|| {
                    let label = GroupId(next_label);
                    next_label = next_label.saturating_add(1);
                    label
                });
            labels.insert(wrapper.id, current);

            for target in targets {
                match labels.get(&target).copied() {
                    Some(other) if other != current => relabel(&mut labels, other, current),
                    Some(_) => {}
                    None => {
                        labels.insert(target, current);
                    }
                }
            }
        }

        let mut groups: Vec<(GroupId, WrapperGroup<'_>)> = Vec::new();
        for wrapper in order {
            let Some(label) = labels.get(&wrapper.id).copied() else {
                continue;
            };
            match groups.iter_mut().find(|(l, _)| *l == label) {
                Some((_, group)) => group.members.push(wrapper),
                None => groups.push((
                    label,
                    WrapperGroup {
                        members: vec![wrapper],
                    },
                )),
            }
        }

        tracing::debug!(
            wrappers = wrappers.len(),
            groups = groups.len(),
            "partitioned wrappers"
        );
        groups.into_iter().map(|(_, group)| group).collect()
    }
}

/// Move every member labelled `from` into `into`.
fn relabel(labels: &mut BTreeMap<WrapperId, GroupId>, from: GroupId, into: GroupId) {
    for label in labels.values_mut() {
        if *label == from {
            *label = into;
        }
    }
}

/// Partition `wrappers` into connected groups.
pub fn partition(wrappers: &[Wrapper]) -> Vec<WrapperGroup<'_>> {
    GroupPartitioner::partition(wrappers)
}

// =============================================================================
// TESTS
// =============================================================================
