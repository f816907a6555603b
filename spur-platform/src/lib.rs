// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Everything around the routing evaluation itself: configuration, loading
//! matrices, placing neurons on cores, choosing the firing neurons, exporting
//! trees, writing reports and running whole evaluations.
//!
//! # Example
//!
//! ```rust
//! use spur_engine::builder::{GroupedTreeBuilder, TreeBuilder};
//! use spur_platform::export::{TextTreeExporter, TreeExporter};
//!
//! let tree = GroupedTreeBuilder::default().build(3).unwrap();
//! let text = TextTreeExporter.export(&tree).unwrap();
//! assert_eq!(text.lines().next(), Some("Switch 3"));
//! ```

pub mod assignment;
pub mod config;
pub mod export;
pub mod input;
pub mod report;
pub mod run;
pub mod spikes;
