//! CSV export
//!
//! # Formats
//!
//! **Indicators** are written in long format, one indicator per line:
//!
//! ```csv
//! Scope,Name,Indicator,Years
//! overall,mass,Pov,1.234560e1
//! compartment,Air,Tov_mass,3.100000e-3
//! size,mp1,Pov,NaN
//! ```
//!
//! Not-applicable indicators are written as `NaN`.
//!
//! **Transition matrix**: one header row of species codes, then one row per
//! destination species, the first column holding its code.
//!
//! **Steady state**: one row per species with its compartment, box, mass (g)
//! and particle number.
//!
//! Numbers are written in scientific notation; rates of a fate model span
//! far too many orders of magnitude for fixed decimals.
//!
//! # Example
//!
//! ```rust,ignore
//! use utopia_rs::output::export::{CsvConfig, CsvExporter, CsvMetadata, Exporter};
//!
//! let exporter = CsvExporter::new(
//!     CsvConfig::default()
//!         .delimiter(';')
//!         .with_metadata(CsvMetadata::from_run("Utopia", "Steady State (LU)", 640)),
//! );
//! exporter.export_indicators(&indicators, Path::new("indicators.csv"))?;
//! ```

use crate::assembly::TransitionMatrix;
use crate::indicators::{ExposureIndicators, Indicator, SteadyState};
use crate::output::export::Exporter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty data: {0}")]
    Empty(&'static str),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

// =============================================================================
// Configuration Structures
// =============================================================================

/// Configuration for CSV export
///
/// # Example
///
/// ```rust
/// use utopia_rs::output::export::CsvConfig;
///
/// let config = CsvConfig::default().delimiter(';').precision(3);
/// assert_eq!(config.delimiter, ';');
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Digits after the decimal point of the mantissa (default: 6)
    pub precision: usize,

    /// Include metadata header comments (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 6,
            include_metadata: false,
            metadata: None,
        }
    }
}

impl CsvConfig {
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Metadata for CSV header comments
///
/// Only fields that are set end up in the header.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    pub model_name: Option<String>,
    pub solver_name: Option<String>,
    pub species: Option<usize>,
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    pub fn from_run(model: &str, solver: &str, species: usize) -> Self {
        Self {
            model_name: Some(model.to_string()),
            solver_name: Some(solver.to_string()),
            species: Some(species),
            ..Default::default()
        }
    }

    pub fn add_custom(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.push((key.into(), value.into()));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn write_metadata_header<W: Write>(out: &mut W, metadata: &CsvMetadata) -> Result<(), CsvError> {
    writeln!(out, "# Microplastic Fate Model Output")?;
    writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some(model) = &metadata.model_name {
        writeln!(out, "# Model: {}", model)?;
    }
    if let Some(solver) = &metadata.solver_name {
        writeln!(out, "# Solver: {}", solver)?;
    }
    if let Some(species) = metadata.species {
        writeln!(out, "# Species: {}", species)?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {}: {}", key, value)?;
    }
    writeln!(out, "#")?;
    Ok(())
}

fn format_number(value: f64, config: &CsvConfig) -> String {
    format!("{:.prec$e}", value, prec = config.precision)
}

fn format_indicator(indicator: Indicator, config: &CsvConfig) -> String {
    match indicator {
        Indicator::Value(v) => format_number(v, config),
        Indicator::NotApplicable => "NaN".to_string(),
    }
}

// =============================================================================
// Exporter
// =============================================================================

/// CSV implementation of [`Exporter`]
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    pub config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    fn create(&self, path: &Path) -> Result<BufWriter<File>, CsvError> {
        let mut out = BufWriter::new(File::create(path)?);
        if self.config.include_metadata
            && let Some(metadata) = &self.config.metadata
        {
            write_metadata_header(&mut out, metadata)?;
        }
        Ok(out)
    }

    fn write_row<W: Write>(&self, out: &mut W, cells: &[String]) -> Result<(), CsvError> {
        writeln!(out, "{}", cells.join(&self.config.delimiter.to_string()))?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    type Error = CsvError;

    fn export_indicators(&self, indicators: &ExposureIndicators, path: &Path) -> Result<(), CsvError> {
        let config = &self.config;
        let mut out = self.create(path)?;
        self.write_row(&mut out, &["Scope".into(), "Name".into(), "Indicator".into(), "Years".into()])?;

        let mut line = |scope: &str, name: &str, indicator: &str, value: Indicator| {
            self.write_row(
                &mut out,
                &[scope.to_string(), name.to_string(), indicator.to_string(), format_indicator(value, config)],
            )
        };

        for (basis, overall) in [("mass", &indicators.mass), ("number", &indicators.number)] {
            line("overall", basis, "Pov", overall.pov_years)?;
            line("overall", basis, "Tov", overall.tov_years)?;
        }
        for c in &indicators.compartments {
            line("compartment", &c.compartment, "Pov_mass", c.pov_mass_years)?;
            line("compartment", &c.compartment, "Pov_number", c.pov_number_years)?;
            line("compartment", &c.compartment, "Tov_mass", c.tov_mass_years)?;
            line("compartment", &c.compartment, "Tov_number", c.tov_number_years)?;
        }
        for s in &indicators.sizes {
            line("size", &s.size_class, "Pov", s.pov_years)?;
            line("size", &s.size_class, "Tov", s.tov_years)?;
        }

        out.flush()?;
        Ok(())
    }

    fn export_matrix(&self, matrix: &TransitionMatrix, path: &Path) -> Result<(), CsvError> {
        // ============================= Validation =============================

        if matrix.dimension() == 0 {
            return Err(CsvError::Empty("transition matrix has no species"));
        }
        if matrix.values().iter().any(|v| !v.is_finite()) {
            return Err(CsvError::InvalidData("NaN or Inf in transition matrix".to_string()));
        }

        // ============================= Write ==================================

        let mut out = self.create(path)?;
        let mut header = vec!["code".to_string()];
        header.extend(matrix.codes().iter().map(ToString::to_string));
        self.write_row(&mut out, &header)?;

        for (i, code) in matrix.codes().iter().enumerate() {
            let mut row = vec![code.to_string()];
            row.extend(matrix.values().row(i).iter().map(|v| format_number(*v, &self.config)));
            self.write_row(&mut out, &row)?;
        }

        out.flush()?;
        Ok(())
    }

    fn export_steady_state(&self, steady: &SteadyState, path: &Path) -> Result<(), CsvError> {
        if steady.is_empty() {
            return Err(CsvError::Empty("steady state has no species"));
        }

        let mut out = self.create(path)?;
        self.write_row(
            &mut out,
            &["code".into(), "compartment".into(), "box".into(), "mass_g".into(), "number".into()],
        )?;
        for species in steady.species() {
            self.write_row(
                &mut out,
                &[
                    species.code.to_string(),
                    species.compartment.clone(),
                    species.box_name.clone(),
                    format_number(species.mass_g, &self.config),
                    format_number(species.number, &self.config),
                ],
            )?;
        }

        out.flush()?;
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::SpeciesCode;
    use crate::indicators::{CompartmentIndicators, OverallIndicators, SizeIndicators};
    use nalgebra::DMatrix;
    use std::fs;
    use tempfile::NamedTempFile;

    fn indicators() -> ExposureIndicators {
        ExposureIndicators {
            mass: OverallIndicators {
                pov_years: Indicator::Value(12.5),
                tov_years: Indicator::Value(2.0),
            },
            number: OverallIndicators {
                pov_years: Indicator::Value(10.0),
                tov_years: Indicator::NotApplicable,
            },
            compartments: vec![CompartmentIndicators {
                compartment: "Air".to_string(),
                pov_mass_years: Indicator::NotApplicable,
                pov_number_years: Indicator::NotApplicable,
                tov_mass_years: Indicator::Value(0.001),
                tov_number_years: Indicator::Value(0.001),
            }],
            sizes: vec![SizeIndicators {
                size: 'a',
                size_class: "mp1".to_string(),
                pov_years: Indicator::Value(1.0),
                tov_years: Indicator::Value(0.5),
            }],
        }
    }

    #[test]
    fn test_indicator_long_format() {
        let file = NamedTempFile::new().unwrap();
        CsvExporter::default().export_indicators(&indicators(), file.path()).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Scope,Name,Indicator,Years");
        assert_eq!(lines[1], "overall,mass,Pov,1.250000e1");
        assert!(content.contains("overall,number,Tov,NaN"));
        assert!(content.contains("compartment,Air,Pov_mass,NaN"));
        assert!(content.contains("size,mp1,Tov,5.000000e-1"));
        assert_eq!(lines.len(), 1 + 4 + 4 + 2);
    }

    #[test]
    fn test_metadata_header() {
        let file = NamedTempFile::new().unwrap();
        let mut metadata = CsvMetadata::from_run("Utopia", "Steady State (LU)", 2);
        metadata.add_custom("Emission", "Air");
        let exporter = CsvExporter::new(CsvConfig::default().with_metadata(metadata));
        exporter.export_indicators(&indicators(), file.path()).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("# Microplastic Fate Model Output"));
        assert!(content.contains("# Generated: "));
        assert!(content.contains("# Solver: Steady State (LU)"));
        assert!(content.contains("# Emission: Air"));
    }

    #[test]
    fn test_matrix_layout() {
        let codes = vec![SpeciesCode::new('a', 'A', 0, "Utopia"), SpeciesCode::new('b', 'A', 0, "Utopia")];
        let matrix = TransitionMatrix::new(codes, DMatrix::from_row_slice(2, 2, &[-0.5, 0.0, 0.25, -1.0])).unwrap();

        let file = NamedTempFile::new().unwrap();
        CsvExporter::new(CsvConfig::default().delimiter(';').precision(2))
            .export_matrix(&matrix, file.path())
            .unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "code;aA0_Utopia;bA0_Utopia");
        assert_eq!(lines[1], "aA0_Utopia;-5.00e-1;0.00e0");
        assert_eq!(lines[2], "bA0_Utopia;2.50e-1;-1.00e0");
    }

    #[test]
    fn test_non_finite_matrix_rejected() {
        let codes = vec![SpeciesCode::new('a', 'A', 0, "Utopia")];
        let matrix = TransitionMatrix::new(codes, DMatrix::from_element(1, 1, f64::NAN)).unwrap();
        let file = NamedTempFile::new().unwrap();
        let err = CsvExporter::default().export_matrix(&matrix, file.path()).unwrap_err();
        assert!(matches!(err, CsvError::InvalidData(_)));
    }
}
