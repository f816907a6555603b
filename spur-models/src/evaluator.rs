// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Drive a routing strategy over the firing neurons of a run.
//!
//! Errors for one source neuron never stop the run: the neuron is logged,
//! counted as skipped and the next one is evaluated.

use std::collections::BTreeSet;
use std::rc::Rc;

use spur_engine::types::{NeuronId, SpurError};
use spur_track::entity::Entity;
use spur_track::{debug, error, info, trace, value, warn};

use crate::accumulator::WasteAccumulator;
use crate::context::EvaluationContext;
use crate::resolver::{TargetResolver, TargetSet};
use crate::routing::{Broadcast, RouteOutcome, RoutingStrategy};

pub struct Evaluator {
    pub entity: Rc<Entity>,
    context: EvaluationContext,
    strategy: Box<dyn RoutingStrategy>,
}

impl Evaluator {
    #[must_use]
    pub fn new(
        parent: &Rc<Entity>,
        name: &str,
        context: EvaluationContext,
        strategy: Box<dyn RoutingStrategy>,
    ) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
            context,
            strategy,
        }
    }

    #[must_use]
    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    #[must_use]
    pub fn strategy(&self) -> &dyn RoutingStrategy {
        self.strategy.as_ref()
    }

    /// Evaluate every neuron of the matrix.
    #[must_use]
    pub fn run(&self) -> WasteAccumulator {
        self.run_sources(0..self.context.matrix.num_neurons())
    }

    /// Evaluate the given source neurons once each, in ascending order.
    pub fn run_sources<I>(&self, sources: I) -> WasteAccumulator
    where
        I: IntoIterator<Item = NeuronId>,
    {
        let sources: BTreeSet<NeuronId> = sources.into_iter().collect();
        let resolver = TargetResolver::new(&self.context);
        let mut acc = WasteAccumulator::new();

        for source in sources {
            self.evaluate(&resolver, source, &mut acc);
        }

        info!(self.entity ; "{}: {} routed, {} silent, {} skipped, total waste {}",
            self.strategy.kind(),
            acc.routed(),
            acc.silent(),
            acc.skipped(),
            acc.total_waste());
        acc
    }

    fn evaluate(&self, resolver: &TargetResolver, source: NeuronId, acc: &mut WasteAccumulator) {
        let targets = match resolver.resolve(source) {
            Ok(targets) => targets,
            Err(SpurError::EmptyTargetSet(_)) => {
                debug!(self.entity ; "neuron {source}: no targets on other cores");
                acc.record_silent();
                return;
            }
            Err(e) => {
                warn!(self.entity ; "neuron {source} skipped: {e}");
                acc.record_skipped();
                return;
            }
        };

        debug!(self.entity ; "neuron {} on core {}, target cores {:?}",
            source, targets.source_core, targets.cores());

        match self.strategy.route(self.context.tree.as_ref(), &targets) {
            Ok(outcome) => {
                self.log_outcome(&targets, &outcome);
                acc.record(&targets, &outcome);
            }
            Err(e @ SpurError::MalformedTree(_)) => {
                error!(self.entity ; "neuron {source} skipped: {e}");
                acc.record_skipped();
            }
            Err(e) => {
                warn!(self.entity ; "neuron {source} skipped: {e}");
                acc.record_skipped();
            }
        }
    }

    fn log_outcome(&self, targets: &TargetSet, outcome: &RouteOutcome) {
        let source = targets.source;
        match &outcome.broadcast {
            Broadcast::Lca { lca } => {
                debug!(self.entity ; "neuron {}: LCA {}, {} deliveries, waste {}",
                    source, lca, outcome.delivered.len(), outcome.waste());
            }
            Broadcast::Mask {
                parents,
                global_mask,
            } => {
                for parent in parents {
                    debug!(self.entity ; "neuron {}: parent {} local mask {}, global mask {}, waste {}",
                        source, parent.parent, parent.local_mask, global_mask, parent.waste);
                }
            }
        }
        for core in &outcome.wasted {
            trace!(self.entity ; "neuron {source} wasted delivery to core {core}");
        }
        value!(self.entity ; outcome.waste());
    }
}
