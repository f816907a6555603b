// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The data model of the SPUR routing evaluation.
//!
//! This crate provides:
//!
//!  - the shared [error type](crate::types::SpurError),
//!  - the [connectivity matrix](crate::connectivity::ConnectivityMatrix) and
//!    [neuron-to-core map](crate::mapping::NeuronCoreMap) consumed by routing,
//!  - the arena-based [core-interconnect tree](crate::topology::CoreTree) and
//!    its [builders](crate::builder),
//!  - the [`TreeQuery`](crate::query::TreeQuery) operations shared by every
//!    routing strategy.
//!
//! # Example
//!
//! ```rust
//! use spur_engine::builder::{GroupedTreeBuilder, TreeBuilder};
//! use spur_engine::query::TreeQuery;
//! use spur_engine::topology::NodeRef;
//!
//! let tree = GroupedTreeBuilder::default().build(8).unwrap();
//! assert_eq!(tree.root(), NodeRef(10));
//! assert_eq!(tree.leaves_under(NodeRef(8)), vec![0, 1, 2, 3]);
//! ```

pub mod builder;
pub mod connectivity;
pub mod mapping;
pub mod query;
pub mod test_helpers;
pub mod topology;
pub mod types;
