// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Loading connectivity matrices.

use std::fs;
use std::path::Path;

use spur_engine::connectivity::ConnectivityMatrix;
use spur_engine::types::{SpurError, SpurResult};

/// Read a matrix stored as a JSON array of rows.
pub fn load_matrix(path: &Path) -> SpurResult<ConnectivityMatrix> {
    let text = fs::read_to_string(path)
        .map_err(|e| SpurError::Input(format!("unable to read {}: {e}", path.display())))?;
    parse_matrix(&text).map_err(|e| match e {
        SpurError::Input(msg) => SpurError::Input(format!("{}: {msg}", path.display())),
        other => other,
    })
}

pub fn parse_matrix(text: &str) -> SpurResult<ConnectivityMatrix> {
    let rows: Vec<Vec<f32>> =
        serde_json::from_str(text).map_err(|e| SpurError::Input(format!("invalid matrix: {e}")))?;
    ConnectivityMatrix::from_rows(rows)
}

/// The name used for the outputs of a matrix file.
#[must_use]
pub fn matrix_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "matrix".to_string(), |s| s.to_string_lossy().into_owned())
}
