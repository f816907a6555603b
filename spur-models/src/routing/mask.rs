// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Grouped broadcast from the parent switches of the targets.
//!
//! Each target core is reached through its immediate parent switch. Every
//! parent that has a target broadcasts to all the child indices in the global
//! mask, which is the union of the child indices used by any parent. A parent
//! therefore also sends to children where it has no target of its own.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use spur_engine::builder::{DEFAULT_GROUP_SIZE, MAX_GROUP_SIZE};
use spur_engine::query::TreeQuery;
use spur_engine::spur_error;
use spur_engine::topology::NodeRef;
use spur_engine::types::{CoreId, SpurError, SpurResult};

use crate::resolver::TargetSet;
use crate::routing::{Broadcast, ParentBroadcast, RouteOutcome, RoutingStrategy, StrategyKind};

/// A set of child indices of fixed width.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChildMask {
    bits: u32,
    width: usize,
}

impl ChildMask {
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self { bits: 0, width }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Add a child index. Returns false if it does not fit in the mask.
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= self.width || index >= MAX_GROUP_SIZE {
            return false;
        }
        self.bits |= 1 << index;
        true
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index < self.width && index < MAX_GROUP_SIZE && self.bits & (1 << index) != 0
    }

    #[must_use]
    pub fn union(&self, other: &ChildMask) -> ChildMask {
        ChildMask {
            bits: self.bits | other.bits,
            width: self.width.max(other.width),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// The set indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(|i| self.contains(*i))
    }
}

/// Child 0 is the leftmost character.
impl fmt::Display for ChildMask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for index in 0..self.width {
            write!(f, "{}", if self.contains(index) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MaskBroadcast {
    width: usize,
}

impl MaskBroadcast {
    pub fn new(width: usize) -> SpurResult<Self> {
        if width == 0 || width > MAX_GROUP_SIZE {
            return spur_error!(
                ConstructionPrecondition,
                "mask width must be in 1..={MAX_GROUP_SIZE}, got {width}"
            );
        }
        Ok(Self { width })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Target cores grouped by parent switch and child index.
    fn group_targets(
        &self,
        tree: &dyn TreeQuery,
        targets: &TargetSet,
    ) -> SpurResult<BTreeMap<NodeRef, BTreeMap<usize, BTreeSet<CoreId>>>> {
        let mut groups: BTreeMap<NodeRef, BTreeMap<usize, BTreeSet<CoreId>>> = BTreeMap::new();
        for core in targets.neurons_by_core.keys().copied() {
            let Some(node) = tree.node_of_core(core) else {
                return spur_error!(MalformedTree, "core {core} is not in the tree");
            };
            let Some(parent) = tree.parent(node) else {
                return spur_error!(MalformedTree, "core {core} has no parent switch");
            };
            let Some(index) = tree.child_index(parent, node) else {
                return spur_error!(
                    MalformedTree,
                    "core {core} is not listed as a child of its parent {parent}"
                );
            };
            if index >= self.width {
                return spur_error!(
                    MalformedTree,
                    "core {core} is child {index} of {parent}, beyond the {}-wide mask",
                    self.width
                );
            }
            groups
                .entry(parent)
                .or_default()
                .entry(index)
                .or_default()
                .insert(core);
        }
        Ok(groups)
    }
}

impl Default for MaskBroadcast {
    fn default() -> Self {
        Self {
            width: DEFAULT_GROUP_SIZE,
        }
    }
}

impl RoutingStrategy for MaskBroadcast {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Mask
    }

    fn route(&self, tree: &dyn TreeQuery, targets: &TargetSet) -> SpurResult<RouteOutcome> {
        if targets.is_empty() {
            return Err(SpurError::EmptyTargetSet(targets.source));
        }

        let groups = self.group_targets(tree, targets)?;

        let mut global_mask = ChildMask::new(self.width);
        for by_index in groups.values() {
            for index in by_index.keys() {
                global_mask.insert(*index);
            }
        }

        let no_targets = BTreeSet::new();
        let mut parents = Vec::with_capacity(groups.len());
        let mut delivered = Vec::new();
        let mut wasted = Vec::new();

        for (parent, by_index) in &groups {
            let mut local_mask = ChildMask::new(self.width);
            for index in by_index.keys() {
                local_mask.insert(*index);
            }

            let children = tree.children(*parent);
            let mut waste = 0;
            for index in global_mask.indices() {
                let Some(child) = children.get(index) else {
                    continue;
                };
                let local_targets = by_index.get(&index).unwrap_or(&no_targets);
                for core in tree.leaves_under(*child) {
                    delivered.push(core);
                    if !local_targets.contains(&core) {
                        wasted.push(core);
                        waste += 1;
                    }
                }
            }

            parents.push(ParentBroadcast {
                parent: *parent,
                local_mask,
                waste,
            });
        }

        Ok(RouteOutcome {
            source: targets.source,
            broadcast: Broadcast::Mask {
                parents,
                global_mask,
            },
            delivered,
            wasted,
        })
    }
}
