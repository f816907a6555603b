// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The core-interconnect tree.
//!
//! The tree is stored as an arena of tagged [`Node`]s. Cores are the leaves
//! and occupy the first `core_count` slots of the arena, so the arena index
//! of a core node is its core ID. Switches follow in the order they were
//! created and therefore have IDs `>= core_count`.
//!
//! Parent links are explicit (`None` only for the root), and a tree can only
//! be created through [`CoreTree::from_nodes`], which checks every structural
//! invariant.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spur_error;
use crate::types::{CoreId, SpurResult};

/// Reference to a node in a [`CoreTree`] arena.
#[derive(
    Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
pub struct NodeRef(pub usize);

impl NodeRef {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a node is.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// A leaf hosting neurons.
    Core(CoreId),

    /// An internal node with an ordered list of children.
    Switch { children: Vec<NodeRef> },
}

/// A single node of the tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeRef>,
}

impl Node {
    #[must_use]
    pub fn core(core: CoreId, parent: Option<NodeRef>) -> Self {
        Self {
            kind: NodeKind::Core(core),
            parent,
        }
    }

    #[must_use]
    pub fn switch(children: Vec<NodeRef>, parent: Option<NodeRef>) -> Self {
        Self {
            kind: NodeKind::Switch { children },
            parent,
        }
    }

    #[must_use]
    pub fn is_core(&self) -> bool {
        matches!(self.kind, NodeKind::Core(_))
    }

    /// The children of a switch, empty for a core.
    #[must_use]
    pub fn children(&self) -> &[NodeRef] {
        match &self.kind {
            NodeKind::Core(_) => &[],
            NodeKind::Switch { children } => children,
        }
    }
}

/// A validated, immutable core-interconnect tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreTree {
    nodes: Vec<Node>,
    root: NodeRef,
    core_count: usize,
}

impl CoreTree {
    /// Assemble a tree from its arena, checking that it is a single rooted
    /// tree whose parent and child relations agree.
    pub fn from_nodes(nodes: Vec<Node>) -> SpurResult<Self> {
        if nodes.is_empty() {
            return spur_error!(MalformedTree, "tree has no nodes");
        }

        let core_count = nodes.iter().take_while(|node| node.is_core()).count();
        if core_count == 0 {
            return spur_error!(MalformedTree, "tree has no cores");
        }

        let mut root = None;
        for (index, node) in nodes.iter().enumerate() {
            let this = NodeRef(index);
            match &node.kind {
                NodeKind::Core(core) => {
                    if *core != index {
                        return spur_error!(
                            MalformedTree,
                            "core {core} stored at node {index}, cores must occupy [0, {core_count})"
                        );
                    }
                }
                NodeKind::Switch { children } => {
                    if index < core_count {
                        return spur_error!(MalformedTree, "switch {index} inside the core range");
                    }
                    if children.is_empty() {
                        return spur_error!(MalformedTree, "switch {index} has no children");
                    }
                    for child in children {
                        let Some(child_node) = nodes.get(child.index()) else {
                            return spur_error!(
                                MalformedTree,
                                "switch {index} references missing child {child}"
                            );
                        };
                        if child_node.parent != Some(this) {
                            return spur_error!(
                                MalformedTree,
                                "node {child} is a child of {index} but has parent {:?}",
                                child_node.parent
                            );
                        }
                    }
                }
            }

            match node.parent {
                None => {
                    if let Some(existing) = root {
                        return spur_error!(
                            MalformedTree,
                            "multiple roots: {existing} and {index}"
                        );
                    }
                    root = Some(this);
                }
                Some(parent) => {
                    let Some(parent_node) = nodes.get(parent.index()) else {
                        return spur_error!(
                            MalformedTree,
                            "node {index} references missing parent {parent}"
                        );
                    };
                    if !parent_node.children().contains(&this) {
                        return spur_error!(
                            MalformedTree,
                            "node {index} has parent {parent} which does not list it as a child"
                        );
                    }
                }
            }
        }

        let Some(root) = root else {
            return spur_error!(MalformedTree, "tree has no root");
        };

        // Every node must be reached exactly once from the root.
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                return spur_error!(MalformedTree, "node {current} reached more than once");
            }
            stack.extend(nodes[current.index()].children().iter().rev());
        }
        if seen.len() != nodes.len() {
            return spur_error!(
                MalformedTree,
                "{} of {} nodes are not reachable from root {root}",
                nodes.len() - seen.len(),
                nodes.len()
            );
        }

        Ok(Self {
            nodes,
            root,
            core_count,
        })
    }

    #[must_use]
    pub fn root(&self) -> NodeRef {
        self.root
    }

    #[must_use]
    pub fn core_count(&self) -> usize {
        self.core_count
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn num_switches(&self) -> usize {
        self.nodes.len() - self.core_count
    }

    #[must_use]
    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node.index())
    }

    /// The node of a core, if the core exists.
    #[must_use]
    pub fn core_node(&self, core: CoreId) -> Option<NodeRef> {
        (core < self.core_count).then_some(NodeRef(core))
    }

    /// Iterate over all nodes in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeRef(index), node))
    }

    /// Iterate over the switches in creation order.
    pub fn switches(&self) -> impl Iterator<Item = (NodeRef, &[NodeRef])> {
        self.iter()
            .skip(self.core_count)
            .map(|(node_ref, node)| (node_ref, node.children()))
    }

    /// The largest number of children of any switch.
    #[must_use]
    pub fn max_fanout(&self) -> usize {
        self.switches()
            .map(|(_, children)| children.len())
            .max()
            .unwrap_or(0)
    }

    /// Number of edges on the longest root-to-core path.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((node, depth)) = stack.pop() {
            height = height.max(depth);
            for child in self.nodes[node.index()].children() {
                stack.push((*child, depth + 1));
            }
        }
        height
    }
}

impl fmt::Display for CoreTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cores, {} switches, root {}, height {}, max fan-out {}",
            self.core_count,
            self.num_switches(),
            self.root,
            self.height(),
            self.max_fanout()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpurError;

    fn two_core_tree() -> Vec<Node> {
        vec![
            Node::core(0, Some(NodeRef(2))),
            Node::core(1, Some(NodeRef(2))),
            Node::switch(vec![NodeRef(0), NodeRef(1)], None),
        ]
    }

    fn expect_malformed(nodes: Vec<Node>) {
        match CoreTree::from_nodes(nodes) {
            Err(SpurError::MalformedTree(msg)) => println!("{msg}"),
            other => panic!("expected MalformedTree, got {other:?}"),
        }
    }

    #[test]
    fn valid_tree() {
        let tree = CoreTree::from_nodes(two_core_tree()).unwrap();
        assert_eq!(tree.root(), NodeRef(2));
        assert_eq!(tree.core_count(), 2);
        assert_eq!(tree.num_switches(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.core_node(1), Some(NodeRef(1)));
        assert_eq!(tree.core_node(2), None);
        assert_eq!(
            tree.to_string(),
            "2 cores, 1 switches, root 2, height 1, max fan-out 2"
        );
    }

    #[test]
    fn single_core_is_root() {
        let tree = CoreTree::from_nodes(vec![Node::core(0, None)]).unwrap();
        assert_eq!(tree.root(), NodeRef(0));
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.max_fanout(), 0);
    }

    #[test]
    fn missing_child() {
        let mut nodes = two_core_tree();
        nodes[2] = Node::switch(vec![NodeRef(0), NodeRef(1), NodeRef(7)], None);
        expect_malformed(nodes);
    }

    #[test]
    fn parent_disagrees() {
        let mut nodes = two_core_tree();
        nodes[1].parent = Some(NodeRef(0));
        expect_malformed(nodes);
    }

    #[test]
    fn two_roots() {
        let mut nodes = two_core_tree();
        nodes[2] = Node::switch(vec![NodeRef(0)], None);
        nodes[1].parent = None;
        expect_malformed(nodes);
    }

    #[test]
    fn core_out_of_place() {
        let mut nodes = two_core_tree();
        nodes[1].kind = NodeKind::Core(5);
        expect_malformed(nodes);
    }

    #[test]
    fn duplicated_child() {
        let mut nodes = two_core_tree();
        nodes[2] = Node::switch(vec![NodeRef(0), NodeRef(1), NodeRef(1)], None);
        expect_malformed(nodes);
    }

    #[test]
    fn cycle_without_root() {
        let nodes = vec![
            Node::core(0, Some(NodeRef(1))),
            Node::switch(vec![NodeRef(0), NodeRef(2)], Some(NodeRef(2))),
            Node::switch(vec![NodeRef(1)], Some(NodeRef(1))),
        ];
        expect_malformed(nodes);
    }

    #[test]
    fn empty() {
        expect_malformed(Vec::new());
    }
}
