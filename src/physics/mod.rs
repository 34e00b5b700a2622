//! Process vocabulary, rate values and the formula seam
//!
//! # Core Concepts
//!
//! - **Process**: closed, ordered vocabulary of fate processes
//! - **Rate value**: scalar, per-size-class vector, size-distribution matrix
//!   or labelled mapping returned by a formula
//! - **Rate formula**: external library computing one rate constant for one
//!   particle species
//!
//! # Architecture
//!
//! The empirical formulas are **separate from the matrix pipeline**:
//! - The formula library provides the **rate constants** (physics)
//! - The assembly stage decides **where the mass goes** (structure)
//!
//! # Example
//!
//! ```rust
//! use utopia_rs::physics::{FormulaTable, Process, RateFormula, RateValue};
//!
//! let formulas = FormulaTable::new("example")
//!     .with(Process::Fragmentation, |_, _| Ok(Some(RateValue::from_vec(vec![0.1, 0.05]))));
//!
//! assert!(formulas.supports(Process::Fragmentation));
//! assert!(!formulas.supports(Process::Burial));
//! ```

// module declaration
pub mod data;
pub mod traits;

// re-export commonly used types for convenience
pub use data::RateValue;
pub use traits::{FormulaHandler, FormulaTable, Process, RateConstants, RateFormula};
