//! utopia-rs: Microplastic Fate Modelling
//!
//! Species coding, transition-matrix assembly and exposure indicators for a
//! multimedia fate model of microplastic particles. Particles of every size
//! class and aggregation state are tracked in every compartment of every box;
//! each combination is a species whose mass evolves as
//!
//! ```text
//! dm/dt = K · m + e
//! ```
//!
//! # Architecture
//!
//! 1. **Separation of physics and numerics**
//!    - Process formulas are a black box behind [`physics::RateFormula`]
//!    - The assembled matrix is solved by any [`solver::Solver`]
//!
//! 2. **One immutable context per run**
//!    - [`config::RunConfiguration`] and [`models::ModelContext`] are built
//!      once and passed explicitly; a failed run is retried by rebuilding it
//!
//! # Quick Start
//!
//! ```rust
//! use utopia_rs::prelude::*;
//!
//! # fn main() -> utopia_rs::Result<()> {
//! let config = RunConfiguration::default();
//! let context = ModelContext::single(
//!     ModelBox::new("Utopia").with_compartment(
//!         Compartment::new("Air", CompartmentType::Air).with_processes(vec![Process::Discorporation]),
//!     ),
//! )?;
//! let particles = vec![Particle::new(ParticleProperties::sphere("mp1", "PE", 980.0, 0.5), "freeMP", "Air", "Utopia")];
//!
//! // 1. Codes and rate constants
//! let tables = CodingTables::from_context(&config, &context)?;
//! let mut registry = SpeciesRegistry::new(particles, &tables)?;
//! let formulas = FormulaTable::new("constant")
//!     .with(Process::Discorporation, |_, _| Ok(Some(RateValue::from_scalar(1e-6))));
//! RateAssembler::new(&context, &formulas).assemble(&mut registry)?;
//!
//! // 2. Transition matrix and steady state
//! let builder = MatrixBuilder::new(&context, &registry, &tables, &config);
//! let emissions = Emissions::new().add("Utopia", "Air", 'a', 1.0);
//! let scenario = Scenario::new(builder.build()?, emissions.species_vector(registry.particles())?);
//! let result = SteadyStateSolver::new().solve(&scenario, &SolverConfiguration::steady_state())?;
//!
//! // 3. Exposure indicators
//! let steady = SteadyState::from_result(&registry, &result)?;
//! let flows = FlowTables::from_steady_state(&builder, &steady)?;
//! let indicators = ExposureCalculator::new(&config, &registry, &emissions).calculate(&steady, &flows)?;
//! assert!(indicators.mass.pov_years.is_applicable());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`physics`]: process vocabulary, rate values, formula seam
//! - [`models`]: particles, compartments, boxes, emissions
//! - [`assembly`]: species codes, rate constants, transition matrix
//! - [`solver`]: numerical solvers (methods)
//! - [`indicators`]: flow tables, persistence and residence time
//! - [`output`]: CSV and JSON export
//! - [`config`]: run configuration

pub mod assembly;
pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod output;
pub mod physics;
pub mod solver;

pub use error::{Result, UtopiaError};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use utopia_rs::prelude::*;
    //! ```
    pub use crate::assembly::{CodingTables, MatrixBuilder, RateAssembler, SpeciesCode, SpeciesRegistry, TransitionMatrix};
    pub use crate::config::RunConfiguration;
    pub use crate::indicators::{Basis, ExposureCalculator, ExposureIndicators, FlowTables, Indicator, SteadyState};
    pub use crate::models::{
        BoxFlows, Compartment, CompartmentType, Emissions, ModelBox, ModelContext, ModelInput, Particle,
        ParticleProperties,
    };
    pub use crate::physics::{FormulaTable, Process, RateConstants, RateFormula, RateValue};
    pub use crate::solver::{EulerSolver, Scenario, SimulationResult, Solver, SolverConfiguration, SolverType, SteadyStateSolver};
}
