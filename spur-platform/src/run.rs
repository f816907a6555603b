// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Evaluation of matrix files from start to finish.
//!
//! For each matrix the neurons are placed once and then every selected
//! topology is built and evaluated with its routing strategy: binary trees
//! use [`LcaBroadcast`](spur_models::routing::LcaBroadcast) and grouped trees
//! use [`MaskBroadcast`](spur_models::routing::MaskBroadcast).

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use spur_engine::builder::{TopologyKind, builder_for};
use spur_engine::types::SpurResult;
use spur_models::context::EvaluationContext;
use spur_models::evaluator::Evaluator;
use spur_models::routing::{StrategyKind, strategy_for};
use spur_track::entity::Entity;
use spur_track::{debug, info};

use crate::assignment::save_mapping;
use crate::config::RunSettings;
use crate::export::{JsonTreeExporter, TextTreeExporter, TreeExporter};
use crate::input::{load_matrix, matrix_stem};
use crate::report::RunReport;

/// The strategy used on a topology.
#[must_use]
pub fn strategy_for_topology(topology: TopologyKind) -> StrategyKind {
    match topology {
        TopologyKind::Binary => StrategyKind::Lca,
        TopologyKind::Grouped => StrategyKind::Mask,
    }
}

/// The outcome of evaluating one topology for one matrix.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub report: RunReport,

    /// Every file written for this run.
    pub written: Vec<PathBuf>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let waste = &self.report.waste;
        write!(
            f,
            "{} {}/{}: waste {} over {} valid messages",
            self.report.matrix, self.report.topology, waste.strategy, waste.total_waste, waste.valid_messages
        )?;
        if let Some(percentage) = waste.waste_percentage {
            write!(f, " ({percentage:.2}%)")?;
        }
        Ok(())
    }
}

pub struct Runner {
    pub entity: Rc<Entity>,
    settings: RunSettings,
}

impl Runner {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, settings: RunSettings) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, "run")),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Evaluate every configured matrix in turn.
    pub fn run_all(&self) -> SpurResult<Vec<RunSummary>> {
        let mut summaries = Vec::new();
        for matrix in &self.settings.matrices {
            summaries.extend(self.run_matrix(matrix)?);
        }
        Ok(summaries)
    }

    /// Evaluate one matrix file on every selected topology.
    pub fn run_matrix(&self, path: &Path) -> SpurResult<Vec<RunSummary>> {
        let settings = &self.settings;
        let stem = matrix_stem(path);
        let entity = Rc::new(Entity::new(&self.entity, &stem));

        let mut matrix = load_matrix(path)?;
        if settings.binarize {
            matrix = matrix.binarized(settings.weight_threshold);
        }
        info!(entity ; "loaded {} neurons with {} connections above {}",
            matrix.num_neurons(),
            matrix.num_connections(settings.weight_threshold),
            settings.weight_threshold);

        let core_count = settings.core_count_for(matrix.num_neurons());
        let neuron_map = Rc::new(settings.assignment.assign(
            &matrix,
            core_count,
            settings.neurons_per_core,
        )?);
        info!(entity ; "mapping: {neuron_map}");

        let sources = settings.spikes.sources(matrix.num_neurons())?;
        debug!(entity ; "{} of {} neurons fire", sources.len(), matrix.num_neurons());

        let mut exported = Vec::new();
        if settings.export_mapping {
            let path = self.output_path(&format!("{stem}_mapping.json"))?;
            save_mapping(&neuron_map, &path)?;
            exported.push(path);
        }

        let matrix = Rc::new(matrix);
        let mut summaries = Vec::new();
        for topology in &settings.topologies {
            let tree = Rc::new(builder_for(*topology, settings.group_size)?.build(core_count)?);
            info!(entity ; "{topology} tree: {tree}");

            let mut written = exported.clone();
            if settings.export_trees {
                let exporters: [&dyn TreeExporter; 2] = [&JsonTreeExporter, &TextTreeExporter];
                for exporter in exporters {
                    let path = self.output_path(&format!(
                        "{stem}_{topology}_tree.{}",
                        exporter.extension()
                    ))?;
                    exporter.write(&tree, &path)?;
                    written.push(path);
                }
            }

            let context = EvaluationContext::new(
                matrix.clone(),
                neuron_map.clone(),
                tree.clone(),
                settings.weight_threshold,
            )?;
            let strategy = strategy_for(strategy_for_topology(*topology), settings.group_size)?;
            let kind = strategy.kind();
            let evaluator = Evaluator::new(&entity, &topology.to_string(), context, strategy);
            let acc = evaluator.run_sources(sources.iter().copied());

            let report = RunReport {
                matrix: stem.clone(),
                topology: *topology,
                tree: tree.to_string(),
                mapping: neuron_map.to_string(),
                waste: acc.report(kind),
            };
            written.extend(report.write(&settings.output_dir, settings.report_format)?);
            summaries.push(RunSummary { report, written });
        }
        Ok(summaries)
    }

    fn output_path(&self, file_name: &str) -> SpurResult<PathBuf> {
        let dir = &self.settings.output_dir;
        std::fs::create_dir_all(dir).map_err(|e| {
            spur_engine::types::SpurError::Input(format!(
                "unable to create {}: {e}",
                dir.display()
            ))
        })?;
        Ok(dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_follow_topology() {
        assert_eq!(strategy_for_topology(TopologyKind::Binary), StrategyKind::Lca);
        assert_eq!(strategy_for_topology(TopologyKind::Grouped), StrategyKind::Mask);
    }
}
