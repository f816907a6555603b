// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The assignment of neurons to cores.

use std::collections::BTreeMap;
use std::fmt;

use crate::spur_error;
use crate::types::{CoreId, NeuronId, SpurResult};

/// Which core each neuron lives on.
///
/// The map does not have to be total: unmapped neurons are excluded from
/// routing.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NeuronCoreMap {
    cores: Vec<Option<CoreId>>,
    core_count: usize,
}

impl NeuronCoreMap {
    /// An empty map for `num_neurons` neurons over `core_count` cores.
    #[must_use]
    pub fn new(num_neurons: usize, core_count: usize) -> Self {
        Self {
            cores: vec![None; num_neurons],
            core_count,
        }
    }

    /// Place a neuron on a core. A neuron can only be placed once.
    pub fn assign(&mut self, neuron: NeuronId, core: CoreId) -> SpurResult {
        if core >= self.core_count {
            return spur_error!(
                Input,
                "core {core} out of range for {} cores",
                self.core_count
            );
        }
        match self.cores.get_mut(neuron) {
            None => spur_error!(
                Input,
                "neuron {neuron} out of range for {} neurons",
                self.cores.len()
            ),
            Some(Some(existing)) => spur_error!(
                Input,
                "neuron {neuron} already assigned to core {existing}"
            ),
            Some(slot) => {
                *slot = Some(core);
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn core_of(&self, neuron: NeuronId) -> Option<CoreId> {
        self.cores.get(neuron).copied().flatten()
    }

    #[must_use]
    pub fn num_neurons(&self) -> usize {
        self.cores.len()
    }

    #[must_use]
    pub fn core_count(&self) -> usize {
        self.core_count
    }

    #[must_use]
    pub fn num_mapped(&self) -> usize {
        self.cores.iter().filter(|c| c.is_some()).count()
    }

    /// The mapped `(neuron, core)` pairs in neuron order.
    pub fn iter(&self) -> impl Iterator<Item = (NeuronId, CoreId)> + '_ {
        self.cores
            .iter()
            .enumerate()
            .filter_map(|(neuron, core)| core.map(|c| (neuron, c)))
    }

    /// The neurons on each core that hosts at least one neuron.
    #[must_use]
    pub fn by_core(&self) -> BTreeMap<CoreId, Vec<NeuronId>> {
        let mut by_core: BTreeMap<CoreId, Vec<NeuronId>> = BTreeMap::new();
        for (neuron, core) in self.iter() {
            by_core.entry(core).or_default().push(neuron);
        }
        by_core
    }

    /// Number of neurons on each core, indexed by core.
    #[must_use]
    pub fn load(&self) -> Vec<usize> {
        let mut load = vec![0; self.core_count];
        for (_, core) in self.iter() {
            load[core] += 1;
        }
        load
    }
}

impl fmt::Display for NeuronCoreMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let load = self.load();
        write!(
            f,
            "{} of {} neurons on {} cores (max {} per core)",
            self.num_mapped(),
            self.num_neurons(),
            self.core_count,
            load.iter().max().copied().unwrap_or(0)
        )
    }
}
