// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The neuron connectivity matrix.

use crate::spur_error;
use crate::types::{NeuronId, SpurResult};

/// Square matrix of non-negative connection weights.
///
/// `weight(i, j)` is the strength of the connection from neuron `i` to
/// neuron `j`. Stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectivityMatrix {
    num_neurons: usize,
    weights: Vec<f32>,
}

impl ConnectivityMatrix {
    /// Create a matrix from its rows.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> SpurResult<Self> {
        let num_neurons = rows.len();
        if num_neurons == 0 {
            return spur_error!(Input, "connectivity matrix is empty");
        }

        let mut weights = Vec::with_capacity(num_neurons * num_neurons);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != num_neurons {
                return spur_error!(
                    Input,
                    "connectivity matrix is not square: row {i} has {} entries, expected {num_neurons}",
                    row.len()
                );
            }
            if let Some((j, w)) = row
                .iter()
                .enumerate()
                .find(|(_, w)| !w.is_finite() || **w < 0.0)
            {
                return spur_error!(Input, "invalid weight {w} at [{i}][{j}]");
            }
            weights.extend(row);
        }

        Ok(Self {
            num_neurons,
            weights,
        })
    }

    #[must_use]
    pub fn num_neurons(&self) -> usize {
        self.num_neurons
    }

    /// Outgoing weights of a neuron, `None` if it does not exist.
    #[must_use]
    pub fn row(&self, source: NeuronId) -> Option<&[f32]> {
        if source >= self.num_neurons {
            return None;
        }
        let start = source * self.num_neurons;
        Some(&self.weights[start..start + self.num_neurons])
    }

    #[must_use]
    pub fn weight(&self, source: NeuronId, target: NeuronId) -> Option<f32> {
        self.row(source).and_then(|row| row.get(target).copied())
    }

    /// The `(target, weight)` pairs of a neuron with a weight above
    /// `threshold`.
    pub fn connections_from(
        &self,
        source: NeuronId,
        threshold: f32,
    ) -> impl Iterator<Item = (NeuronId, f32)> + '_ {
        self.row(source)
            .unwrap_or(&[])
            .iter()
            .copied()
            .enumerate()
            .filter(move |(_, w)| *w > threshold)
    }

    /// Number of connections with a weight above `threshold`.
    #[must_use]
    pub fn num_connections(&self, threshold: f32) -> usize {
        self.weights.iter().filter(|w| **w > threshold).count()
    }

    /// A copy with every weight above `threshold` set to 1 and all others
    /// set to 0.
    #[must_use]
    pub fn binarized(&self, threshold: f32) -> Self {
        Self {
            num_neurons: self.num_neurons,
            weights: self
                .weights
                .iter()
                .map(|w| if *w > threshold { 1.0 } else { 0.0 })
                .collect(),
        }
    }
}
