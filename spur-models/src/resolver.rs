// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Find the cores a source neuron has to reach.

use std::collections::{BTreeMap, BTreeSet};

use spur_engine::connectivity::ConnectivityMatrix;
use spur_engine::mapping::NeuronCoreMap;
use spur_engine::types::{CoreId, NeuronId, SpurError, SpurResult};

use crate::context::EvaluationContext;

/// The cores that must receive a message when a neuron fires.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TargetSet {
    pub source: NeuronId,
    pub source_core: CoreId,

    /// Target neurons grouped by the core hosting them. The source core is
    /// never included.
    pub neurons_by_core: BTreeMap<CoreId, Vec<NeuronId>>,

    /// Connected neurons that have no core and were ignored.
    pub unmapped_targets: usize,
}

impl TargetSet {
    /// The distinct target cores in ascending order.
    #[must_use]
    pub fn cores(&self) -> BTreeSet<CoreId> {
        self.neurons_by_core.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.neurons_by_core.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neurons_by_core.is_empty()
    }

    #[must_use]
    pub fn contains(&self, core: CoreId) -> bool {
        self.neurons_by_core.contains_key(&core)
    }

    #[must_use]
    pub fn min_core(&self) -> Option<CoreId> {
        self.neurons_by_core.keys().next().copied()
    }

    #[must_use]
    pub fn max_core(&self) -> Option<CoreId> {
        self.neurons_by_core.keys().next_back().copied()
    }

    /// Neuron-level deliveries: connected neurons on a core other than the
    /// source's.
    #[must_use]
    pub fn valid_messages(&self) -> usize {
        self.neurons_by_core.values().map(Vec::len).sum()
    }
}

/// Applies the threshold rule to a row of the connectivity matrix.
pub struct TargetResolver<'a> {
    matrix: &'a ConnectivityMatrix,
    neuron_map: &'a NeuronCoreMap,
    weight_threshold: f32,
}

impl<'a> TargetResolver<'a> {
    #[must_use]
    pub fn new(context: &'a EvaluationContext) -> Self {
        Self {
            matrix: &context.matrix,
            neuron_map: &context.neuron_map,
            weight_threshold: context.weight_threshold,
        }
    }

    /// Resolve the target cores of `source`.
    ///
    /// Returns `UnmappedNeuron` if the source has no core and
    /// `EmptyTargetSet` if no connected neuron lives on another core.
    pub fn resolve(&self, source: NeuronId) -> SpurResult<TargetSet> {
        let source_core = self
            .neuron_map
            .core_of(source)
            .ok_or(SpurError::UnmappedNeuron(source))?;

        let mut targets = TargetSet {
            source,
            source_core,
            ..Default::default()
        };

        for (target, _) in self.matrix.connections_from(source, self.weight_threshold) {
            match self.neuron_map.core_of(target) {
                None => targets.unmapped_targets += 1,
                Some(core) if core == source_core => {}
                Some(core) => targets.neurons_by_core.entry(core).or_default().push(target),
            }
        }

        if targets.is_empty() {
            return Err(SpurError::EmptyTargetSet(source));
        }
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use spur_engine::builder::{BinaryTreeBuilder, TreeBuilder};
    use spur_engine::connectivity::ConnectivityMatrix;

    use super::*;

    /// Six neurons, two per core, neuron 5 unmapped.
    fn context(threshold: f32) -> EvaluationContext {
        let mut rows = vec![vec![0.0; 6]; 6];
        rows[0][1] = 0.9; // same core as the source
        rows[0][2] = 0.6;
        rows[0][3] = 0.5; // exactly on a 0.5 threshold
        rows[0][4] = 0.7;
        rows[0][5] = 0.8; // unmapped
        rows[2][0] = 0.1;

        let mut map = NeuronCoreMap::new(6, 3);
        for (neuron, core) in [(0, 0), (1, 0), (2, 1), (3, 1), (4, 2)] {
            map.assign(neuron, core).unwrap();
        }

        EvaluationContext::new(
            Rc::new(ConnectivityMatrix::from_rows(rows).unwrap()),
            Rc::new(map),
            Rc::new(BinaryTreeBuilder.build(3).unwrap()),
            threshold,
        )
        .unwrap()
    }

    #[test]
    fn threshold_is_strict() {
        let context = context(0.5);
        let targets = TargetResolver::new(&context).resolve(0).unwrap();

        assert_eq!(targets.source_core, 0);
        assert_eq!(targets.cores(), BTreeSet::from([1, 2]));
        assert_eq!(targets.neurons_by_core[&1], vec![2]);
        assert_eq!(targets.valid_messages(), 2);
        assert_eq!(targets.unmapped_targets, 1);
        assert_eq!(targets.min_core(), Some(1));
        assert_eq!(targets.max_core(), Some(2));
    }

    #[test]
    fn lower_threshold_adds_targets() {
        let context = context(0.0);
        let targets = TargetResolver::new(&context).resolve(0).unwrap();
        assert_eq!(targets.neurons_by_core[&1], vec![2, 3]);
        assert_eq!(targets.valid_messages(), 3);
    }

    #[test]
    fn empty_and_unmapped() {
        let context = context(0.5);
        let resolver = TargetResolver::new(&context);
        assert_eq!(resolver.resolve(1), Err(SpurError::EmptyTargetSet(1)));
        // Below threshold.
        assert_eq!(resolver.resolve(2), Err(SpurError::EmptyTargetSet(2)));
        assert_eq!(resolver.resolve(5), Err(SpurError::UnmappedNeuron(5)));
        assert_eq!(resolver.resolve(17), Err(SpurError::UnmappedNeuron(17)));
    }
}
