// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Build core-interconnect trees from a core count.
//!
//! Both builders create the cores `0..core_count` as leaves and then add
//! switches bottom-up, with switch IDs allocated from `core_count` upwards.
//! When a level has an odd number of nodes the last one is carried up to the
//! next level untouched rather than being given a single-child switch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spur_error;
use crate::topology::{CoreTree, Node, NodeRef};
use crate::types::SpurResult;

/// The number of cores under each leaf switch of a grouped tree.
pub const DEFAULT_GROUP_SIZE: usize = 4;

/// Widest leaf switch supported (bounded by the width of a child mask).
pub const MAX_GROUP_SIZE: usize = 32;

/// The available tree shapes.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyKind {
    /// Cores paired level by level.
    #[default]
    Binary,

    /// Cores grouped under leaf switches, switches then paired.
    Grouped,
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TopologyKind::Binary => write!(f, "binary"),
            TopologyKind::Grouped => write!(f, "grouped"),
        }
    }
}

/// Builds a [`CoreTree`] over a number of cores.
pub trait TreeBuilder {
    /// The shape of tree produced.
    fn kind(&self) -> TopologyKind;

    /// Build the tree. The same `core_count` always gives the same tree.
    fn build(&self, core_count: usize) -> SpurResult<CoreTree>;
}

/// Create the builder for a topology.
pub fn builder_for(kind: TopologyKind, group_size: usize) -> SpurResult<Box<dyn TreeBuilder>> {
    match kind {
        TopologyKind::Binary => Ok(Box::new(BinaryTreeBuilder)),
        TopologyKind::Grouped => Ok(Box::new(GroupedTreeBuilder::new(group_size)?)),
    }
}

/// A pure binary tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryTreeBuilder;

impl TreeBuilder for BinaryTreeBuilder {
    fn kind(&self) -> TopologyKind {
        TopologyKind::Binary
    }

    fn build(&self, core_count: usize) -> SpurResult<CoreTree> {
        let mut arena = Arena::with_cores(core_count)?;
        let cores = arena.all_nodes();
        arena.pair_upwards(cores);
        CoreTree::from_nodes(arena.nodes)
    }
}

/// Cores in consecutive groups under leaf switches, with a binary tree of
/// switches above them.
#[derive(Clone, Copy, Debug)]
pub struct GroupedTreeBuilder {
    group_size: usize,
}

impl GroupedTreeBuilder {
    pub fn new(group_size: usize) -> SpurResult<Self> {
        if group_size == 0 || group_size > MAX_GROUP_SIZE {
            return spur_error!(
                ConstructionPrecondition,
                "group size must be in 1..={MAX_GROUP_SIZE}, got {group_size}"
            );
        }
        Ok(Self { group_size })
    }

    #[must_use]
    pub fn group_size(&self) -> usize {
        self.group_size
    }
}

impl Default for GroupedTreeBuilder {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
        }
    }
}

impl TreeBuilder for GroupedTreeBuilder {
    fn kind(&self) -> TopologyKind {
        TopologyKind::Grouped
    }

    fn build(&self, core_count: usize) -> SpurResult<CoreTree> {
        let mut arena = Arena::with_cores(core_count)?;
        let cores = arena.all_nodes();
        let leaf_switches: Vec<NodeRef> = cores
            .chunks(self.group_size)
            .map(|group| arena.push_switch(group.to_vec()))
            .collect();
        arena.pair_upwards(leaf_switches);
        CoreTree::from_nodes(arena.nodes)
    }
}

/// Nodes under construction.
struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    fn with_cores(core_count: usize) -> SpurResult<Self> {
        if core_count == 0 {
            return spur_error!(ConstructionPrecondition, "core count must be > 0");
        }
        Ok(Self {
            nodes: (0..core_count).map(|core| Node::core(core, None)).collect(),
        })
    }

    fn all_nodes(&self) -> Vec<NodeRef> {
        (0..self.nodes.len()).map(NodeRef).collect()
    }

    fn push_switch(&mut self, children: Vec<NodeRef>) -> NodeRef {
        let switch = NodeRef(self.nodes.len());
        for child in &children {
            self.nodes[child.index()].parent = Some(switch);
        }
        self.nodes.push(Node::switch(children, None));
        switch
    }

    /// Pair consecutive nodes until one remains. An odd node out is carried
    /// up alone.
    fn pair_upwards(&mut self, mut level: Vec<NodeRef>) {
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| match pair {
                    [single] => *single,
                    _ => self.push_switch(pair.to_vec()),
                })
                .collect();
        }
    }
}
