// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Route up to the lowest common ancestor, then broadcast down.
//!
//! With two or more target cores the broadcast point is the LCA of the lowest
//! and highest target core; with a single target it is the LCA of the source
//! core and that target. Every core under the broadcast point receives the
//! message, so the waste is the number of those cores that are not targets.
//!
//! Builders place cores in ascending order along the leaves, so the subtree
//! spanning the lowest and highest target covers all targets. A tree where
//! that does not hold is reported as malformed.

use spur_engine::query::TreeQuery;
use spur_engine::spur_error;
use spur_engine::topology::NodeRef;
use spur_engine::types::{CoreId, SpurError, SpurResult};

use crate::resolver::TargetSet;
use crate::routing::{Broadcast, RouteOutcome, RoutingStrategy, StrategyKind};

#[derive(Clone, Copy, Debug, Default)]
pub struct LcaBroadcast;

fn core_node(tree: &dyn TreeQuery, core: CoreId) -> SpurResult<NodeRef> {
    match tree.node_of_core(core) {
        Some(node) => Ok(node),
        None => spur_error!(MalformedTree, "core {core} is not in the tree"),
    }
}

impl RoutingStrategy for LcaBroadcast {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Lca
    }

    fn route(&self, tree: &dyn TreeQuery, targets: &TargetSet) -> SpurResult<RouteOutcome> {
        let (Some(min_core), Some(max_core)) = (targets.min_core(), targets.max_core()) else {
            return Err(SpurError::EmptyTargetSet(targets.source));
        };

        let (a, b) = if targets.len() == 1 {
            (targets.source_core, min_core)
        } else {
            (min_core, max_core)
        };

        let Some(lca) = tree.lca(core_node(tree, a)?, core_node(tree, b)?) else {
            return spur_error!(MalformedTree, "no common ancestor for cores {a} and {b}");
        };

        let delivered = tree.leaves_under(lca);
        let missed: Vec<CoreId> = targets
            .neurons_by_core
            .keys()
            .filter(|core| delivered.binary_search(core).is_err())
            .copied()
            .collect();
        if !missed.is_empty() {
            return spur_error!(
                MalformedTree,
                "targets {missed:?} are not below the LCA {lca} of cores {a} and {b}"
            );
        }

        let wasted = delivered
            .iter()
            .copied()
            .filter(|core| !targets.contains(*core))
            .collect();

        Ok(RouteOutcome {
            source: targets.source,
            broadcast: Broadcast::Lca { lca },
            delivered,
            wasted,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use spur_engine::builder::{BinaryTreeBuilder, GroupedTreeBuilder, TreeBuilder};
    use spur_engine::topology::{CoreTree, Node};

    use super::*;

    fn targets(source_core: CoreId, cores: &[CoreId]) -> TargetSet {
        TargetSet {
            source: 0,
            source_core,
            neurons_by_core: cores
                .iter()
                .map(|core| (*core, vec![*core * 10]))
                .collect::<BTreeMap<_, _>>(),
            unmapped_targets: 0,
        }
    }

    #[test]
    fn single_target_uses_source_core() {
        let tree = BinaryTreeBuilder.build(8).unwrap();
        let outcome = LcaBroadcast.route(&tree, &targets(0, &[5])).unwrap();

        assert_eq!(outcome.broadcast, Broadcast::Lca { lca: NodeRef(14) });
        assert_eq!(outcome.delivered, (0..8).collect::<Vec<_>>());
        assert_eq!(outcome.wasted, vec![0, 1, 2, 3, 4, 6, 7]);
        assert_eq!(outcome.waste(), 7);
    }

    #[test]
    fn single_target_in_sibling() {
        let tree = BinaryTreeBuilder.build(8).unwrap();
        let outcome = LcaBroadcast.route(&tree, &targets(0, &[1])).unwrap();
        assert_eq!(outcome.broadcast, Broadcast::Lca { lca: NodeRef(8) });
        assert_eq!(outcome.wasted, vec![0]);
    }

    #[test]
    fn multiple_targets_use_min_and_max() {
        let tree = BinaryTreeBuilder.build(8).unwrap();
        // The source core is outside the LCA subtree and is not charged.
        let outcome = LcaBroadcast.route(&tree, &targets(7, &[1, 2])).unwrap();
        assert_eq!(outcome.broadcast, Broadcast::Lca { lca: NodeRef(12) });
        assert_eq!(outcome.delivered, vec![0, 1, 2, 3]);
        assert_eq!(outcome.wasted, vec![0, 3]);
        assert_eq!(outcome.waste(), tree.leaves_under(NodeRef(12)).len() - 2);
    }

    #[test]
    fn all_targets_no_waste() {
        let tree = GroupedTreeBuilder::default().build(8).unwrap();
        let outcome = LcaBroadcast.route(&tree, &targets(6, &[0, 1, 2, 3])).unwrap();
        assert_eq!(outcome.broadcast, Broadcast::Lca { lca: NodeRef(8) });
        assert_eq!(outcome.waste(), 0);
    }

    #[test]
    fn empty_targets() {
        let tree = BinaryTreeBuilder.build(4).unwrap();
        assert_eq!(
            LcaBroadcast.route(&tree, &targets(0, &[])),
            Err(SpurError::EmptyTargetSet(0))
        );
    }

    #[test]
    fn unknown_core() {
        let tree = BinaryTreeBuilder.build(4).unwrap();
        assert!(matches!(
            LcaBroadcast.route(&tree, &targets(0, &[9])),
            Err(SpurError::MalformedTree(_))
        ));
    }

    #[test]
    fn unordered_leaves() {
        // Root 4 = (5, 6, 2), switch 5 = (0, 3), switch 6 = (1).
        // Cores 0 and 3 share a switch that excludes 1.
        let nodes = vec![
            Node::core(0, Some(NodeRef(5))),
            Node::core(1, Some(NodeRef(6))),
            Node::core(2, Some(NodeRef(4))),
            Node::core(3, Some(NodeRef(5))),
            Node::switch(vec![NodeRef(5), NodeRef(6), NodeRef(2)], None),
            Node::switch(vec![NodeRef(0), NodeRef(3)], Some(NodeRef(4))),
            Node::switch(vec![NodeRef(1)], Some(NodeRef(4))),
        ];
        let tree = CoreTree::from_nodes(nodes).unwrap();
        let outcome = LcaBroadcast.route(&tree, &targets(2, &[0, 3])).unwrap();
        assert_eq!(outcome.broadcast, Broadcast::Lca { lca: NodeRef(5) });
        assert_eq!(outcome.waste(), 0);

        assert!(matches!(
            LcaBroadcast.route(&tree, &targets(2, &[0, 1, 3])),
            Err(SpurError::MalformedTree(_))
        ));
    }
}
