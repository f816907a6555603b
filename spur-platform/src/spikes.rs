// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The neurons that fire in a run.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spur_engine::spur_error;
use spur_engine::types::{NeuronId, SpurError, SpurResult};

#[derive(Clone, Debug, PartialEq)]
pub enum SpikeSet {
    /// Every neuron fires.
    All,

    /// Each neuron fires independently with `probability`.
    Random { probability: f64, seed: u64 },

    /// Only the listed neurons fire.
    Listed(Vec<NeuronId>),
}

impl SpikeSet {
    /// Read a JSON list of neuron IDs.
    pub fn from_file(path: &Path) -> SpurResult<SpikeSet> {
        let text = fs::read_to_string(path)
            .map_err(|e| SpurError::Input(format!("unable to read {}: {e}", path.display())))?;
        let neurons: Vec<NeuronId> = serde_json::from_str(&text)
            .map_err(|e| SpurError::Input(format!("unable to parse {}: {e}", path.display())))?;
        Ok(SpikeSet::Listed(neurons))
    }

    /// The firing neurons out of `num_neurons`, ascending and without
    /// repeats.
    pub fn sources(&self, num_neurons: usize) -> SpurResult<Vec<NeuronId>> {
        match self {
            SpikeSet::All => Ok((0..num_neurons).collect()),
            SpikeSet::Random { probability, seed } => {
                if !(0.0..=1.0).contains(probability) {
                    return spur_error!(
                        ConstructionPrecondition,
                        "spike probability must be in [0, 1], got {probability}"
                    );
                }
                let mut rng = StdRng::seed_from_u64(*seed);
                Ok((0..num_neurons)
                    .filter(|_| rng.gen_bool(*probability))
                    .collect())
            }
            SpikeSet::Listed(neurons) => {
                if let Some(neuron) = neurons.iter().find(|n| **n >= num_neurons) {
                    return spur_error!(
                        Input,
                        "spiking neuron {neuron} out of range for {num_neurons} neurons"
                    );
                }
                let unique: BTreeSet<NeuronId> = neurons.iter().copied().collect();
                Ok(unique.into_iter().collect())
            }
        }
    }
}
