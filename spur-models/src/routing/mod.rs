// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Multicast routing strategies.
//!
//! A [`RoutingStrategy`] is given the tree (through the shared
//! [`TreeQuery`] operations) and the [`TargetSet`] of one source neuron, and
//! decides which cores the message is delivered to. It has no side effects:
//! the caller is responsible for logging the returned [`RouteOutcome`] and
//! adding it to a [`WasteAccumulator`](crate::accumulator::WasteAccumulator).

use std::fmt;

use serde::{Deserialize, Serialize};
use spur_engine::query::TreeQuery;
use spur_engine::topology::NodeRef;
use spur_engine::types::{CoreId, NeuronId, SpurResult};

use crate::resolver::TargetSet;

pub mod lca;
pub mod mask;

pub use lca::LcaBroadcast;
pub use mask::{ChildMask, MaskBroadcast};

/// The available routing strategies.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Route up to the lowest common ancestor of the targets and broadcast
    /// down from there.
    #[default]
    Lca,

    /// Broadcast from each parent switch of the targets using one mask shared
    /// by all parents.
    Mask,
}

impl StrategyKind {
    /// Title used in reports.
    #[must_use]
    pub fn report_title(&self) -> &'static str {
        match self {
            StrategyKind::Lca => "LCA",
            StrategyKind::Mask => "HBS",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StrategyKind::Lca => write!(f, "lca"),
            StrategyKind::Mask => write!(f, "mask"),
        }
    }
}

/// The decision made about a message.
pub trait RoutingStrategy {
    fn kind(&self) -> StrategyKind;

    /// Route the message of `targets.source`.
    ///
    /// Errors only concern this source neuron.
    fn route(&self, tree: &dyn TreeQuery, targets: &TargetSet) -> SpurResult<RouteOutcome>;
}

/// Create a strategy. `mask_width` is only used by [`MaskBroadcast`].
pub fn strategy_for(kind: StrategyKind, mask_width: usize) -> SpurResult<Box<dyn RoutingStrategy>> {
    match kind {
        StrategyKind::Lca => Ok(Box::new(LcaBroadcast)),
        StrategyKind::Mask => Ok(Box::new(MaskBroadcast::new(mask_width)?)),
    }
}

/// What one parent switch did under [`MaskBroadcast`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParentBroadcast {
    pub parent: NodeRef,

    /// Child indices of this parent that hold a target.
    pub local_mask: ChildMask,

    /// Deliveries made by this parent to cores that were not its targets.
    pub waste: usize,
}

/// How the message was spread.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Broadcast {
    /// Routed up to `lca` and broadcast to every core below it.
    Lca { lca: NodeRef },

    /// Every participating parent broadcast to the children in `global_mask`.
    Mask {
        parents: Vec<ParentBroadcast>,
        global_mask: ChildMask,
    },
}

/// The result of routing one source neuron.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteOutcome {
    pub source: NeuronId,
    pub broadcast: Broadcast,

    /// Every delivery made, one entry per delivery.
    pub delivered: Vec<CoreId>,

    /// The deliveries to cores that were not targets. A core reached by two
    /// broadcasts appears twice.
    pub wasted: Vec<CoreId>,
}

impl RouteOutcome {
    /// Number of wasted deliveries.
    #[must_use]
    pub fn waste(&self) -> usize {
        self.wasted.len()
    }
}
