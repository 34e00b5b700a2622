//! JSON export
//!
//! Indicators and steady states are written through their serde
//! representation (not-applicable indicators become `null`). The matrix is
//! written as `{"codes": [...], "rows": [[...], ...]}` with one row per
//! destination species.

use crate::assembly::{SpeciesCode, TransitionMatrix};
use crate::error::UtopiaError;
use crate::indicators::{ExposureIndicators, SteadyState};
use crate::output::export::Exporter;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON implementation of [`Exporter`]
#[derive(Debug, Clone, Copy)]
pub struct JsonExporter {
    /// Indented output (default: true)
    pub pretty: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

#[derive(Serialize)]
struct MatrixDocument<'a> {
    codes: &'a [SpeciesCode],
    rows: Vec<Vec<f64>>,
}

impl JsonExporter {
    fn write<T: Serialize>(&self, value: &T, path: &Path) -> Result<(), UtopiaError> {
        let mut out = BufWriter::new(File::create(path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut out, value)?;
        } else {
            serde_json::to_writer(&mut out, value)?;
        }
        out.flush()?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }
}

impl Exporter for JsonExporter {
    type Error = UtopiaError;

    fn export_indicators(&self, indicators: &ExposureIndicators, path: &Path) -> Result<(), UtopiaError> {
        self.write(indicators, path)
    }

    fn export_matrix(&self, matrix: &TransitionMatrix, path: &Path) -> Result<(), UtopiaError> {
        let rows = matrix
            .values()
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        self.write(
            &MatrixDocument {
                codes: matrix.codes(),
                rows,
            },
            path,
        )
    }

    fn export_steady_state(&self, steady: &SteadyState, path: &Path) -> Result<(), UtopiaError> {
        self.write(steady, path)
    }
}
