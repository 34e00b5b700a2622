//! Species coding, rate assembly and transition-matrix construction
//!
//! # Pipeline
//!
//! ```text
//! particles ──> SpeciesRegistry ──> RateAssembler ──> elimination ──> MatrixBuilder
//!               (codes)             (k_ per process)   (diagonal)      (dense K)
//! ```
//!
//! Each stage consumes the output of the previous one and the read-only run
//! context. A failure anywhere is reported with the species code(s) and the
//! process involved; a run is retried by rebuilding it from the start.
//!
//! # Example
//!
//! ```rust
//! use utopia_rs::assembly::{CodingTables, MatrixBuilder, RateAssembler, SpeciesRegistry};
//! use utopia_rs::config::RunConfiguration;
//! use utopia_rs::models::{Compartment, CompartmentType, ModelBox, ModelContext, Particle, ParticleProperties};
//! use utopia_rs::physics::{FormulaTable, Process, RateValue};
//!
//! # fn main() -> utopia_rs::Result<()> {
//! let config = RunConfiguration::default();
//! let context = ModelContext::single(
//!     ModelBox::new("Utopia").with_compartment(
//!         Compartment::new("Air", CompartmentType::Air).with_processes(vec![Process::Discorporation]),
//!     ),
//! )?;
//!
//! let particles = vec![Particle::new(ParticleProperties::sphere("mp1", "PE", 980.0, 0.5), "freeMP", "Air", "Utopia")];
//! let tables = CodingTables::from_context(&config, &context)?;
//! let mut registry = SpeciesRegistry::new(particles, &tables)?;
//!
//! let formulas = FormulaTable::new("constant")
//!     .with(Process::Discorporation, |_, _| Ok(Some(RateValue::from_scalar(1e-3))));
//! RateAssembler::new(&context, &formulas).assemble(&mut registry)?;
//!
//! let matrix = MatrixBuilder::new(&context, &registry, &tables, &config).build()?;
//! assert_eq!(matrix.get(0, 0), -1e-3);
//! # Ok(())
//! # }
//! ```

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod coding;
pub mod elimination;
pub mod matrix;
pub mod rates;
pub mod registry;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use coding::{CodingTables, SpeciesCode};
pub use elimination::{elimination_rate, elimination_rates, loss_contribution};
pub use matrix::{MatrixBuilder, TransitionMatrix};
pub use rates::RateAssembler;
pub use registry::{SpeciesRegistry, assign_codes};
