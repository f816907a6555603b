// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Evaluation configuration gathered from several sources.
//!
//! Values are layered, each source overriding the previous one:
//!
//!  1. the defaults of [`EvalConfig`],
//!  2. an optional TOML configuration file,
//!  3. environment variables prefixed with `SPUR_` (e.g. `SPUR_SEED=7`),
//!  4. command-line arguments.
//!
//! Every field is optional so that a source only overrides the values it
//! actually sets. [`EvalConfig::settings`] then checks the merged result and
//! turns it into the concrete [`RunSettings`] used by a run.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use spur_engine::builder::{MAX_GROUP_SIZE, TopologyKind};
use spur_engine::spur_error;
use spur_engine::types::{SpurError, SpurResult};

use crate::assignment::AssignmentPolicy;
use crate::report::ReportFormat;
use crate::spikes::SpikeSet;

/// Prefix of the environment variables read.
pub const ENV_PREFIX: &str = "SPUR_";

/// How neurons are placed on cores.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentKind {
    /// Seeded shuffle, then fill cores in order.
    #[default]
    Random,

    /// Neuron `n` on core `n / neurons_per_core`.
    Sequential,

    /// Greedy clustering of strongly connected neurons.
    Clustered,

    /// Read from `mapping_file`.
    File,
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AssignmentKind::Random => write!(f, "random"),
            AssignmentKind::Sequential => write!(f, "sequential"),
            AssignmentKind::Clustered => write!(f, "clustered"),
            AssignmentKind::File => write!(f, "file"),
        }
    }
}

/// Which topologies are evaluated.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluationKind {
    Binary,
    Grouped,
    #[default]
    Both,
}

impl EvaluationKind {
    #[must_use]
    pub fn topologies(&self) -> Vec<TopologyKind> {
        match self {
            EvaluationKind::Binary => vec![TopologyKind::Binary],
            EvaluationKind::Grouped => vec![TopologyKind::Grouped],
            EvaluationKind::Both => vec![TopologyKind::Binary, TopologyKind::Grouped],
        }
    }
}

/// The configurable values of an evaluation.
#[derive(clap::Args, Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EvalConfig {
    /// Connectivity matrix files (JSON arrays of rows).
    #[arg(long, num_args = 1..)]
    pub matrix: Option<Vec<PathBuf>>,

    /// Maximum number of neurons placed on a core.
    #[arg(long)]
    pub neurons_per_core: Option<usize>,

    /// Number of cores. Derived from the neuron count when not given.
    #[arg(long)]
    pub core_count: Option<usize>,

    /// Number of cores under each leaf switch of the grouped tree.
    #[arg(long)]
    pub group_size: Option<usize>,

    /// A connection exists when its weight is strictly above this value.
    #[arg(long)]
    pub weight_threshold: Option<f32>,

    /// Replace the weights by 0/1 using the threshold before routing.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub binarize: Option<bool>,

    /// Policy used to place neurons on cores.
    #[arg(long, value_enum)]
    pub assignment: Option<AssignmentKind>,

    /// Mapping file used by the `file` assignment.
    #[arg(long)]
    pub mapping_file: Option<PathBuf>,

    /// Seed of the random assignment and random spikes.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Topologies to evaluate.
    #[arg(long, value_enum)]
    pub evaluation: Option<EvaluationKind>,

    /// Probability of each neuron firing (1.0 fires every neuron).
    #[arg(long)]
    pub spike_probability: Option<f64>,

    /// JSON list of the neurons that fire. Overrides `spike_probability`.
    #[arg(long)]
    pub spikes_file: Option<PathBuf>,

    /// Directory the reports and exports are written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Format of the written reports.
    #[arg(long, value_enum)]
    pub report_format: Option<ReportFormat>,

    /// Write each tree as JSON and as text.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub export_trees: Option<bool>,

    /// Write the neuron-to-core mapping as JSON.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub export_mapping: Option<bool>,

    /// TOML configuration file.
    #[arg(long)]
    pub conf_file: Option<PathBuf>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            matrix: None,
            neurons_per_core: Some(16),
            core_count: None,
            group_size: Some(4),
            weight_threshold: Some(0.0435),
            binarize: Some(false),
            assignment: Some(AssignmentKind::Random),
            mapping_file: None,
            seed: Some(42),
            evaluation: Some(EvaluationKind::Both),
            spike_probability: Some(1.0),
            spikes_file: None,
            output_dir: Some(PathBuf::from("reports")),
            report_format: Some(ReportFormat::Text),
            export_trees: Some(false),
            export_mapping: Some(false),
            conf_file: None,
        }
    }
}

macro_rules! override_fields {
    ($base:ident, $over:ident, $($field:ident),+ $(,)?) => {
        $(
            if $over.$field.is_some() {
                $base.$field = $over.$field.clone();
            }
        )+
    };
}

impl EvalConfig {
    /// Defaults, then the configuration file (if any), then the environment.
    pub fn from_sources(conf_file: Option<&Path>) -> SpurResult<EvalConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(EvalConfig::default()));
        if let Some(conf_file) = conf_file {
            if !conf_file.exists() {
                return spur_error!(
                    Input,
                    "configuration file {} not found",
                    conf_file.display()
                );
            }
            figment = figment.merge(Toml::file(conf_file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        figment
            .extract()
            .map_err(|e| SpurError::Input(format!("invalid configuration: {e}")))
    }

    /// Apply every value set in `other` on top of this configuration.
    #[must_use]
    pub fn merged_with(self, other: &EvalConfig) -> EvalConfig {
        let mut config = self;
        override_fields!(
            config,
            other,
            matrix,
            neurons_per_core,
            core_count,
            group_size,
            weight_threshold,
            binarize,
            assignment,
            mapping_file,
            seed,
            evaluation,
            spike_probability,
            spikes_file,
            output_dir,
            report_format,
            export_trees,
            export_mapping,
            conf_file,
        );
        config
    }

    /// Layer all sources, with the command-line values in `cli` on top.
    pub fn load(cli: &EvalConfig) -> SpurResult<EvalConfig> {
        let config = EvalConfig::from_sources(cli.conf_file.as_deref())?;
        Ok(config.merged_with(cli))
    }

    /// Check the configuration and resolve it into run settings.
    pub fn settings(&self) -> SpurResult<RunSettings> {
        let defaults = EvalConfig::default();
        macro_rules! resolved {
            ($field:ident) => {
                self.$field.clone().or(defaults.$field).unwrap_or_default()
            };
        }

        let matrices = self.matrix.clone().unwrap_or_default();
        if matrices.is_empty() {
            return spur_error!(Input, "no connectivity matrix given");
        }

        let neurons_per_core: usize = resolved!(neurons_per_core);
        if neurons_per_core == 0 {
            return spur_error!(ConstructionPrecondition, "neurons per core must be > 0");
        }
        if self.core_count == Some(0) {
            return spur_error!(ConstructionPrecondition, "core count must be > 0");
        }
        let group_size: usize = resolved!(group_size);
        if group_size == 0 || group_size > MAX_GROUP_SIZE {
            return spur_error!(
                ConstructionPrecondition,
                "group size must be in 1..={MAX_GROUP_SIZE}, got {group_size}"
            );
        }
        let weight_threshold: f32 = resolved!(weight_threshold);
        if !weight_threshold.is_finite() || weight_threshold < 0.0 {
            return spur_error!(
                ConstructionPrecondition,
                "weight threshold must be finite and >= 0, got {weight_threshold}"
            );
        }

        let seed: u64 = resolved!(seed);
        let assignment = match resolved!(assignment) {
            AssignmentKind::Random => AssignmentPolicy::Random { seed },
            AssignmentKind::Sequential => AssignmentPolicy::Sequential,
            AssignmentKind::Clustered => AssignmentPolicy::Clustered,
            AssignmentKind::File => match &self.mapping_file {
                Some(path) => AssignmentPolicy::File(path.clone()),
                None => {
                    return spur_error!(Input, "the file assignment needs a mapping file");
                }
            },
        };

        let spikes = match &self.spikes_file {
            Some(path) => SpikeSet::from_file(path)?,
            None => {
                let probability: f64 = resolved!(spike_probability);
                if !(0.0..=1.0).contains(&probability) {
                    return spur_error!(
                        ConstructionPrecondition,
                        "spike probability must be in [0, 1], got {probability}"
                    );
                }
                if probability >= 1.0 {
                    SpikeSet::All
                } else {
                    SpikeSet::Random { probability, seed }
                }
            }
        };

        Ok(RunSettings {
            matrices,
            neurons_per_core,
            core_count: self.core_count,
            group_size,
            weight_threshold,
            binarize: resolved!(binarize),
            assignment,
            topologies: resolved!(evaluation).topologies(),
            spikes,
            output_dir: resolved!(output_dir),
            report_format: resolved!(report_format),
            export_trees: resolved!(export_trees),
            export_mapping: resolved!(export_mapping),
        })
    }
}

/// Checked settings of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSettings {
    pub matrices: Vec<PathBuf>,
    pub neurons_per_core: usize,

    /// `None` to derive the core count from each matrix.
    pub core_count: Option<usize>,

    pub group_size: usize,
    pub weight_threshold: f32,
    pub binarize: bool,
    pub assignment: AssignmentPolicy,
    pub topologies: Vec<TopologyKind>,
    pub spikes: SpikeSet,
    pub output_dir: PathBuf,
    pub report_format: ReportFormat,
    pub export_trees: bool,
    pub export_mapping: bool,
}

impl RunSettings {
    /// The cores needed for `num_neurons` neurons.
    #[must_use]
    pub fn core_count_for(&self, num_neurons: usize) -> usize {
        self.core_count
            .unwrap_or_else(|| num_neurons.div_ceil(self.neurons_per_core).max(1))
    }
}
