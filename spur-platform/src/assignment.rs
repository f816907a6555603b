// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Placement of neurons on cores.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use spur_engine::connectivity::ConnectivityMatrix;
use spur_engine::mapping::NeuronCoreMap;
use spur_engine::spur_error;
use spur_engine::types::{CoreId, NeuronId, SpurError, SpurResult};

/// A way of building a [`NeuronCoreMap`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssignmentPolicy {
    /// Shuffle the neurons with a seeded generator and fill the cores in
    /// order.
    Random { seed: u64 },

    /// Neuron `n` on core `n / neurons_per_core`.
    Sequential,

    /// Fill each core with the neurons most strongly connected to the ones
    /// already there.
    Clustered,

    /// Read the mapping from a JSON file.
    File(PathBuf),
}

impl AssignmentPolicy {
    /// Place the neurons of `matrix` on `core_count` cores holding at most
    /// `neurons_per_core` neurons each.
    pub fn assign(
        &self,
        matrix: &ConnectivityMatrix,
        core_count: usize,
        neurons_per_core: usize,
    ) -> SpurResult<NeuronCoreMap> {
        let num_neurons = matrix.num_neurons();
        match self {
            AssignmentPolicy::Random { seed } => {
                check_capacity(num_neurons, core_count, neurons_per_core)?;
                let mut order: Vec<NeuronId> = (0..num_neurons).collect();
                order.shuffle(&mut StdRng::seed_from_u64(*seed));
                fill_in_order(&order, core_count, neurons_per_core)
            }
            AssignmentPolicy::Sequential => {
                check_capacity(num_neurons, core_count, neurons_per_core)?;
                let order: Vec<NeuronId> = (0..num_neurons).collect();
                fill_in_order(&order, core_count, neurons_per_core)
            }
            AssignmentPolicy::Clustered => {
                check_capacity(num_neurons, core_count, neurons_per_core)?;
                cluster(matrix, core_count, neurons_per_core)
            }
            AssignmentPolicy::File(path) => {
                let map = load_mapping(path, num_neurons, core_count)?;
                if let Some((core, load)) = map
                    .load()
                    .into_iter()
                    .enumerate()
                    .find(|(_, load)| *load > neurons_per_core)
                {
                    return spur_error!(
                        ConstructionPrecondition,
                        "{}: core {core} holds {load} neurons, more than {neurons_per_core}",
                        path.display()
                    );
                }
                Ok(map)
            }
        }
    }
}

fn check_capacity(num_neurons: usize, core_count: usize, neurons_per_core: usize) -> SpurResult {
    if core_count == 0 || neurons_per_core == 0 {
        return spur_error!(
            ConstructionPrecondition,
            "core count and neurons per core must be > 0"
        );
    }
    if core_count.saturating_mul(neurons_per_core) < num_neurons {
        return spur_error!(
            ConstructionPrecondition,
            "{num_neurons} neurons do not fit on {core_count} cores of {neurons_per_core}"
        );
    }
    Ok(())
}

fn fill_in_order(
    order: &[NeuronId],
    core_count: usize,
    neurons_per_core: usize,
) -> SpurResult<NeuronCoreMap> {
    let mut map = NeuronCoreMap::new(order.len(), core_count);
    for (position, neuron) in order.iter().enumerate() {
        map.assign(*neuron, position / neurons_per_core)?;
    }
    Ok(map)
}

/// Greedy clustering: each core is seeded with the lowest unplaced neuron
/// and then takes the unplaced neuron with the largest total weight (in
/// either direction) to the neurons already on it, lowest ID on a tie.
fn cluster(
    matrix: &ConnectivityMatrix,
    core_count: usize,
    neurons_per_core: usize,
) -> SpurResult<NeuronCoreMap> {
    let num_neurons = matrix.num_neurons();
    let mut map = NeuronCoreMap::new(num_neurons, core_count);
    let mut unplaced: Vec<NeuronId> = (0..num_neurons).collect();

    // Weight from each unplaced neuron to the core being filled.
    let mut affinity = vec![0.0_f64; num_neurons];
    let link = |a: NeuronId, b: NeuronId| {
        f64::from(matrix.weight(a, b).unwrap_or(0.0)) + f64::from(matrix.weight(b, a).unwrap_or(0.0))
    };

    for core in 0..core_count {
        if unplaced.is_empty() {
            break;
        }
        affinity.fill(0.0);

        // `unplaced` stays sorted, so the seed is the lowest unplaced ID.
        let mut next = unplaced.remove(0);
        let mut placed = 0;
        loop {
            map.assign(next, core)?;
            placed += 1;
            if placed == neurons_per_core || unplaced.is_empty() {
                break;
            }
            for neuron in &unplaced {
                affinity[*neuron] += link(next, *neuron);
            }

            // Strictly greater keeps the lowest ID on a tie.
            let mut best: Option<(usize, f64)> = None;
            for (index, neuron) in unplaced.iter().enumerate() {
                if best.is_none_or(|(_, weight)| affinity[*neuron] > weight) {
                    best = Some((index, affinity[*neuron]));
                }
            }
            let Some((index, _)) = best else {
                break;
            };
            next = unplaced.remove(index);
        }
    }
    Ok(map)
}

/// Read a mapping stored as `{"<core>": [neurons...]}`.
///
/// Neurons not listed stay unmapped.
pub fn load_mapping(path: &Path, num_neurons: usize, core_count: usize) -> SpurResult<NeuronCoreMap> {
    let text = fs::read_to_string(path)
        .map_err(|e| SpurError::Input(format!("unable to read {}: {e}", path.display())))?;
    let by_core: BTreeMap<CoreId, Vec<NeuronId>> = serde_json::from_str(&text)
        .map_err(|e| SpurError::Input(format!("unable to parse {}: {e}", path.display())))?;

    let mut map = NeuronCoreMap::new(num_neurons, core_count);
    for (core, neurons) in by_core {
        for neuron in neurons {
            map.assign(neuron, core)
                .map_err(|e| SpurError::Input(format!("{}: {e}", path.display())))?;
        }
    }
    Ok(map)
}

/// The JSON form read by [`load_mapping`].
pub fn mapping_to_json(map: &NeuronCoreMap) -> SpurResult<String> {
    serde_json::to_string_pretty(&map.by_core())
        .map_err(|e| SpurError::Input(format!("unable to serialise mapping: {e}")))
}

pub fn save_mapping(map: &NeuronCoreMap, path: &Path) -> SpurResult {
    fs::write(path, mapping_to_json(map)?)
        .map_err(|e| SpurError::Input(format!("unable to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(n: usize, edges: &[(usize, usize, f32)]) -> ConnectivityMatrix {
        let mut rows = vec![vec![0.0; n]; n];
        for (i, j, w) in edges {
            rows[*i][*j] = *w;
        }
        ConnectivityMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn sequential() {
        let map = AssignmentPolicy::Sequential
            .assign(&matrix(5, &[]), 3, 2)
            .unwrap();
        let cores: Vec<_> = (0..5).map(|n| map.core_of(n)).collect();
        assert_eq!(cores, vec![Some(0), Some(0), Some(1), Some(1), Some(2)]);
    }

    #[test]
    fn random_is_seeded() {
        let m = matrix(40, &[]);
        let policy = AssignmentPolicy::Random { seed: 7 };
        let first = policy.assign(&m, 5, 8).unwrap();
        assert_eq!(first, policy.assign(&m, 5, 8).unwrap());
        assert_eq!(first.num_mapped(), 40);
        assert!(first.load().iter().all(|load| *load == 8));
    }

    #[test]
    fn capacity_checked() {
        let m = matrix(10, &[]);
        for policy in [
            AssignmentPolicy::Random { seed: 1 },
            AssignmentPolicy::Sequential,
            AssignmentPolicy::Clustered,
        ] {
            assert!(matches!(
                policy.assign(&m, 2, 4),
                Err(SpurError::ConstructionPrecondition(_))
            ));
        }
    }

    #[test]
    fn clustered_groups_connected_neurons() {
        // Two cliques, {0, 2, 4} and {1, 3, 5}, interleaved by ID.
        let m = matrix(
            6,
            &[
                (0, 2, 1.0),
                (2, 4, 1.0),
                (4, 0, 0.5),
                (1, 3, 1.0),
                (3, 5, 1.0),
                (5, 1, 0.5),
            ],
        );
        let map = AssignmentPolicy::Clustered.assign(&m, 2, 3).unwrap();
        assert_eq!(map.by_core()[&0], vec![0, 2, 4]);
        assert_eq!(map.by_core()[&1], vec![1, 3, 5]);
    }

    #[test]
    fn clustered_ties_take_lowest_id() {
        let map = AssignmentPolicy::Clustered
            .assign(&matrix(4, &[]), 2, 2)
            .unwrap();
        assert_eq!(map.by_core()[&0], vec![0, 1]);
        assert_eq!(map.by_core()[&1], vec![2, 3]);
    }

    #[test]
    fn mapping_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");

        let mut map = NeuronCoreMap::new(4, 2);
        map.assign(0, 1).unwrap();
        map.assign(2, 0).unwrap();
        map.assign(3, 1).unwrap();
        save_mapping(&map, &path).unwrap();

        let policy = AssignmentPolicy::File(path);
        assert_eq!(policy.assign(&matrix(4, &[]), 2, 2).unwrap(), map);
        assert!(matches!(
            policy.assign(&matrix(4, &[]), 2, 1),
            Err(SpurError::ConstructionPrecondition(_))
        ));
    }

    #[test]
    fn bad_mapping_files() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, text: &str| {
            let path = dir.path().join(name);
            fs::write(&path, text).unwrap();
            path
        };

        let duplicate = write("dup.json", r#"{"0": [1], "1": [1]}"#);
        let out_of_range = write("range.json", r#"{"0": [9]}"#);
        let bad_core = write("core.json", r#"{"5": [0]}"#);
        let not_json = write("bad.json", "[");

        for path in [duplicate, out_of_range, bad_core, not_json] {
            assert!(matches!(
                load_mapping(&path, 4, 2),
                Err(SpurError::Input(_))
            ));
        }
        assert!(load_mapping(&dir.path().join("missing.json"), 4, 2).is_err());
    }
}
