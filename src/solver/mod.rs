//! Numerical solvers
//!
//! A solver applies a numerical method to the species mass balance
//!
//! ```text
//! dm/dt = K · m + e
//! ```
//!
//! where K is the assembled transition matrix (1/s), m the mass per species
//! (g) and e the emission per species (g/s).
//!
//! # Core Concepts
//!
//! 1. **Scenario** (`Scenario`) - WHAT to solve
//!    - Transition matrix
//!    - Emission vector and initial masses
//!
//! 2. **Configuration** (`SolverConfiguration`) - HOW to solve
//!    - Steady state or time evolution
//!    - Numerical parameters (total time, time steps)
//!
//! 3. **Solver** (`Solver` trait) - The numerical method
//!    - `SteadyStateSolver`: direct LU solve of K·m = -e
//!    - `EulerSolver`: forward Euler time stepping
//!
//! # Quick Start Example
//!
//! ```rust
//! use utopia_rs::assembly::{SpeciesCode, TransitionMatrix};
//! use utopia_rs::solver::{Scenario, Solver, SolverConfiguration, SteadyStateSolver};
//! use nalgebra::{DMatrix, DVector};
//!
//! # fn main() -> utopia_rs::Result<()> {
//! let matrix = TransitionMatrix::new(
//!     vec![SpeciesCode::new('a', 'A', 0, "Utopia")],
//!     DMatrix::from_element(1, 1, -0.25),
//! )?;
//! let scenario = Scenario::new(matrix, DVector::from_element(1, 1.0));
//!
//! let result = SteadyStateSolver::new().solve(&scenario, &SolverConfiguration::steady_state())?;
//! assert!((result.final_state[0] - 4.0).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────┐
//! │ TransitionMatrix │   │  Emissions   │
//! └────────┬─────────┘   └──────┬───────┘
//!          └────────┬───────────┘
//!          ┌────────▼────────┐
//!          │    Scenario     │ ← WHAT to solve
//!          └────────┬────────┘
//!          ┌────────▼─────────────┐
//!          │ Solver Configuration │ ← HOW to solve
//!          └────────┬─────────────┘
//!          ┌────────▼────────┐
//!          │ Numerical Solver│ ← The method
//!          └────────┬────────┘
//!          ┌────────▼────────────┐
//!          │ Simulation Result   │ ← masses per species
//!          └─────────────────────┘
//! ```

// =================================================================================================
// Module Declarations
// =================================================================================================

mod methods;
mod scenario;
mod traits;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{SimulationResult, Solver, SolverConfiguration, SolverType};

pub use scenario::Scenario;

pub use methods::{EulerSolver, SteadyStateSolver};

// =================================================================================================
// Helper Functions
// =================================================================================================

use crate::error::{Result, UtopiaError};
use nalgebra::DVector;

/// Reject NaN and Inf masses
///
/// `step` is reported in the error; the steady-state solver passes 0.
pub(crate) fn validate_state(state: &DVector<f64>, step: usize) -> Result<()> {
    if let Some(index) = state.iter().position(|x| x.is_nan()) {
        return Err(UtopiaError::Solver(format!(
            "NaN detected for species {} at step {}. Try increasing time_steps.",
            index, step
        )));
    }

    if let Some(index) = state.iter().position(|x| x.is_infinite()) {
        return Err(UtopiaError::Solver(format!(
            "Infinity detected for species {} at step {}. Try increasing time_steps.",
            index, step
        )));
    }

    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_state() {
        assert!(validate_state(&DVector::from_vec(vec![0.0, 1.0]), 3).is_ok());

        let err = validate_state(&DVector::from_vec(vec![0.0, f64::NAN]), 3).unwrap_err();
        assert!(err.to_string().contains("species 1 at step 3"));

        assert!(validate_state(&DVector::from_vec(vec![f64::INFINITY]), 0).is_err());
    }
}
