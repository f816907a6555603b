// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Everything a run needs, passed explicitly.

use std::rc::Rc;

use spur_engine::connectivity::ConnectivityMatrix;
use spur_engine::mapping::NeuronCoreMap;
use spur_engine::spur_error;
use spur_engine::topology::CoreTree;
use spur_engine::types::SpurResult;

/// The immutable inputs of one evaluation run.
#[derive(Clone, Debug)]
pub struct EvaluationContext {
    pub matrix: Rc<ConnectivityMatrix>,
    pub neuron_map: Rc<NeuronCoreMap>,
    pub tree: Rc<CoreTree>,

    /// A target neuron is connected if its weight is strictly greater than
    /// this.
    pub weight_threshold: f32,
}

impl EvaluationContext {
    /// Check that the inputs describe the same neurons and cores.
    pub fn new(
        matrix: Rc<ConnectivityMatrix>,
        neuron_map: Rc<NeuronCoreMap>,
        tree: Rc<CoreTree>,
        weight_threshold: f32,
    ) -> SpurResult<Self> {
        if neuron_map.num_neurons() != matrix.num_neurons() {
            return spur_error!(
                Input,
                "mapping covers {} neurons but the matrix has {}",
                neuron_map.num_neurons(),
                matrix.num_neurons()
            );
        }
        if neuron_map.core_count() > tree.core_count() {
            return spur_error!(
                ConstructionPrecondition,
                "mapping uses {} cores but the tree only has {}",
                neuron_map.core_count(),
                tree.core_count()
            );
        }
        if !weight_threshold.is_finite() || weight_threshold < 0.0 {
            return spur_error!(
                ConstructionPrecondition,
                "weight threshold must be finite and >= 0, got {weight_threshold}"
            );
        }
        Ok(Self {
            matrix,
            neuron_map,
            tree,
            weight_threshold,
        })
    }
}
