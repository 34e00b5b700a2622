//! Error types shared by every stage of the pipeline
//!
//! Lookup failures and formula failures carry the offending particle or
//! species code and the process name so that a failure can be traced back to
//! the row of the input table that produced it.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, UtopiaError>;

/// Every failure the pipeline can report
#[derive(Error, Debug)]
pub enum UtopiaError {
    /// A particle attribute has no entry in one of the coding tables
    #[error("key '{key}' not found in {table} table (particle {particle})")]
    KeyNotFound {
        table: &'static str,
        key: String,
        particle: String,
    },

    /// Two particles produced the same species code
    #[error("duplicate species code {0}")]
    DuplicateSpecies(String),

    /// The formula library failed for one process of one species
    #[error("rate constant k_{process} failed for species {species}: {reason}")]
    RateConstantComputation {
        process: String,
        species: String,
        reason: String,
    },

    /// A species pair could not be classified while building the matrix
    #[error("cannot resolve transition {source_code} -> {destination_code}: {reason}")]
    StructuralResolution {
        source_code: String,
        destination_code: String,
        reason: String,
    },

    /// A process label that is not part of the process vocabulary
    #[error("unknown process '{0}'")]
    UnknownProcess(String),

    /// Malformed species code text
    #[error("invalid species code '{code}': {reason}")]
    InvalidSpeciesCode { code: String, reason: String },

    /// Inconsistent model input or run configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Numerical solver failure
    #[error("solver error: {0}")]
    Solver(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl UtopiaError {
    pub(crate) fn structural(
        source_code: impl ToString,
        destination_code: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::StructuralResolution {
            source_code: source_code.to_string(),
            destination_code: destination_code.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}
