// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Read-only queries over a tree.
//!
//! The [`TreeQuery`] trait only needs the parent/child relations of a tree;
//! everything else (lowest common ancestor, descendant test, shortest path,
//! leaf enumeration) is provided on top of them. Every loop is bounded by the
//! number of nodes so that a corrupted relation cannot hang a query.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::topology::{CoreTree, NodeKind, NodeRef};
use crate::types::CoreId;

pub trait TreeQuery {
    /// Number of nodes in the tree.
    fn num_nodes(&self) -> usize;

    /// Parent of a node, `None` for the root or an unknown node.
    fn parent(&self, node: NodeRef) -> Option<NodeRef>;

    /// Ordered children of a node, empty for a core or an unknown node.
    fn children(&self, node: NodeRef) -> &[NodeRef];

    /// The core a node represents, `None` for switches.
    fn core_at(&self, node: NodeRef) -> Option<CoreId>;

    fn contains(&self, node: NodeRef) -> bool {
        node.index() < self.num_nodes()
    }

    /// The node of a core. Cores occupy the first arena slots.
    fn node_of_core(&self, core: CoreId) -> Option<NodeRef> {
        let node = NodeRef(core);
        (self.core_at(node) == Some(core)).then_some(node)
    }

    /// `node` followed by each of its ancestors up to the root.
    fn ancestors(&self, node: NodeRef) -> Vec<NodeRef> {
        if !self.contains(node) {
            return Vec::new();
        }
        let mut path = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            if path.len() > self.num_nodes() {
                break;
            }
            path.push(parent);
            current = parent;
        }
        path
    }

    /// Lowest common ancestor of two nodes.
    ///
    /// Both root-to-node paths are compared from the root down and the last
    /// shared node is returned. `None` when either node is unknown or the
    /// paths do not share a root.
    fn lca(&self, a: NodeRef, b: NodeRef) -> Option<NodeRef> {
        let mut path_a = self.ancestors(a);
        let mut path_b = self.ancestors(b);
        path_a.reverse();
        path_b.reverse();

        path_a
            .iter()
            .zip(path_b.iter())
            .take_while(|(x, y)| x == y)
            .last()
            .map(|(x, _)| *x)
    }

    /// True if `target` is `subtree_root` or lies below it.
    fn is_descendant(&self, subtree_root: NodeRef, target: NodeRef) -> bool {
        if !self.contains(subtree_root) || !self.contains(target) {
            return false;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![subtree_root];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if visited.insert(current) {
                stack.extend_from_slice(self.children(current));
            }
        }
        false
    }

    /// Node sequence from `start` to `end` inclusive, walking both parent and
    /// child edges. Empty if there is no path.
    fn shortest_path(&self, start: NodeRef, end: NodeRef) -> Vec<NodeRef> {
        if !self.contains(start) || !self.contains(end) {
            return Vec::new();
        }

        let mut previous: HashMap<NodeRef, NodeRef> = HashMap::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == end {
                let mut path = vec![end];
                let mut node = end;
                while let Some(prev) = previous.get(&node) {
                    path.push(*prev);
                    node = *prev;
                }
                path.reverse();
                return path;
            }

            let neighbours = self
                .parent(current)
                .into_iter()
                .chain(self.children(current).iter().copied());
            for next in neighbours {
                if visited.insert(next) {
                    previous.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        Vec::new()
    }

    /// Cores in the subtree rooted at `node`, in ascending order.
    fn leaves_under(&self, node: NodeRef) -> Vec<CoreId> {
        if !self.contains(node) {
            return Vec::new();
        }
        let mut leaves = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            match self.core_at(current) {
                Some(core) => leaves.push(core),
                None => stack.extend_from_slice(self.children(current)),
            }
        }
        leaves.sort_unstable();
        leaves
    }

    /// Position of `child` among the children of `parent`.
    fn child_index(&self, parent: NodeRef, child: NodeRef) -> Option<usize> {
        self.children(parent).iter().position(|c| *c == child)
    }
}

impl TreeQuery for CoreTree {
    fn num_nodes(&self) -> usize {
        CoreTree::num_nodes(self)
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeRef) -> &[NodeRef] {
        match self.node(node) {
            Some(n) => n.children(),
            None => &[],
        }
    }

    fn core_at(&self, node: NodeRef) -> Option<CoreId> {
        match self.node(node)?.kind {
            NodeKind::Core(core) => Some(core),
            NodeKind::Switch { .. } => None,
        }
    }
}
