//! Output module for run results
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs
//! └── export/        ← Data export
//!     ├── mod.rs     ← Exporter trait
//!     ├── csv.rs
//!     └── json.rs
//! ```
//!
//! Exporters write indicator tables, the transition matrix and the
//! steady-state species amounts for external analysis.

pub mod export;

pub use export::{CsvConfig, CsvError, CsvExporter, CsvMetadata, Exporter, JsonExporter};
