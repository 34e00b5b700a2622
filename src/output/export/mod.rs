//! Export module for run results.
//!
//! # Architecture
//!
//! This module defines the [`Exporter`] trait that abstracts the export format.
//! Each format is an independent implementation in its own sub-module; adding
//! a format means adding a file.
//!
//! # Available formats
//!
//! | Format | Module     |
//! |--------|------------|
//! | CSV    | [`csv`]    |
//! | JSON   | [`json`]   |
//!
//! # Usage example
//!
//! ```rust,ignore
//! use utopia_rs::output::export::{CsvExporter, Exporter, JsonExporter};
//!
//! CsvExporter::default().export_indicators(&indicators, Path::new("indicators.csv"))?;
//! JsonExporter::default().export_matrix(&matrix, Path::new("matrix.json"))?;
//! ```

pub mod csv;
pub mod json;

pub use csv::{CsvConfig, CsvError, CsvExporter, CsvMetadata};
pub use json::JsonExporter;

use crate::assembly::TransitionMatrix;
use crate::indicators::{ExposureIndicators, SteadyState};
use std::path::Path;

/// Abstraction trait for all export formats.
///
/// # Associated type `Error`
///
/// Each format manages its own errors via the associated type, so callers
/// can react to the precise failure without boxing.
pub trait Exporter {
    type Error: std::error::Error;

    /// Overall, per-compartment and per-size-class indicators
    fn export_indicators(&self, indicators: &ExposureIndicators, path: &Path) -> Result<(), Self::Error>;

    /// Transition matrix with its species codes
    fn export_matrix(&self, matrix: &TransitionMatrix, path: &Path) -> Result<(), Self::Error>;

    /// Mass and particle number per species
    fn export_steady_state(&self, steady: &SteadyState, path: &Path) -> Result<(), Self::Error>;
}
