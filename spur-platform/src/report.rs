// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Writing waste reports.
//!
//! Reports are named `<matrix stem>_<topology>.txt` (or `.json`) inside the
//! output directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spur_engine::builder::TopologyKind;
use spur_engine::types::{SpurError, SpurResult};
use spur_models::accumulator::WasteReport;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Both,
}

impl ReportFormat {
    fn extensions(&self) -> &'static [&'static str] {
        match self {
            ReportFormat::Text => &["txt"],
            ReportFormat::Json => &["json"],
            ReportFormat::Both => &["txt", "json"],
        }
    }
}

/// A waste report together with what was evaluated.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RunReport {
    pub matrix: String,
    pub topology: TopologyKind,

    /// One-line description of the tree.
    pub tree: String,

    /// One-line description of the neuron placement.
    pub mapping: String,

    pub waste: WasteReport,
}

impl RunReport {
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}_{}.{extension}", self.matrix, self.topology)
    }

    pub fn to_json(&self) -> SpurResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SpurError::Input(format!("unable to serialise report: {e}")))
    }

    /// Write the report in each requested format and return the paths
    /// written.
    pub fn write(&self, output_dir: &Path, format: ReportFormat) -> SpurResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir).map_err(|e| {
            SpurError::Input(format!("unable to create {}: {e}", output_dir.display()))
        })?;

        let mut written = Vec::new();
        for extension in format.extensions() {
            let contents = match *extension {
                "json" => self.to_json()?,
                _ => self.waste.to_string(),
            };
            let path = output_dir.join(self.file_name(extension));
            fs::write(&path, contents)
                .map_err(|e| SpurError::Input(format!("unable to write {}: {e}", path.display())))?;
            written.push(path);
        }
        Ok(written)
    }
}
