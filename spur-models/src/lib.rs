// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Routing strategies and waste accounting.
//!
//! A run of the evaluation walks every firing source neuron in index order:
//!
//!  1. the [`TargetResolver`](crate::resolver::TargetResolver) finds the cores
//!     the neuron must reach,
//!  2. a [`RoutingStrategy`](crate::routing::RoutingStrategy) decides which
//!     cores actually receive the message,
//!  3. the [`WasteAccumulator`](crate::accumulator::WasteAccumulator) counts
//!     every delivery to a core that was not a target.
//!
//! The [`Evaluator`](crate::evaluator::Evaluator) drives these steps, owns
//! the logging and isolates per-neuron errors.

pub mod accumulator;
pub mod context;
pub mod evaluator;
pub mod resolver;
pub mod routing;
