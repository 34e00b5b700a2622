//! Exposure indicators
//!
//! Post-solve stage: steady-state masses are turned into per-process flows,
//! and the flows into persistence and residence-time indicators.
//!
//! ```text
//! SimulationResult ──> SteadyState ──> FlowTables ──> ExposureCalculator ──> ExposureIndicators
//!                      (mass, number)  (out/in flows)  (Pov, Tov)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let steady = SteadyState::from_result(&registry, &result)?;
//! let flows = FlowTables::from_steady_state(&builder, &steady)?;
//! let indicators = ExposureCalculator::new(&config, &registry, &emissions).calculate(&steady, &flows)?;
//! println!("Pov = {} years", indicators.mass.pov_years);
//! ```

pub mod exposure;
pub mod flows;

pub use exposure::{
    CompartmentIndicators, DAYS_PER_YEAR, ExposureCalculator, ExposureIndicators, Indicator, OverallIndicators,
    SECONDS_PER_DAY, SizeIndicators, seconds_to_years,
};
pub use flows::{Basis, CompartmentFlows, FlowRow, FlowTables, SpeciesAmount, SteadyState};
