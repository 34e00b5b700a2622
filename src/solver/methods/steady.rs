//! Steady-state solver
//!
//! # Mathematical Background
//!
//! At steady state the mass balance dm/dt = K·m + e vanishes, so the species
//! masses solve the linear system
//!
//! ```text
//! K · m = -e
//! ```
//!
//! K is factorised once with partial-pivoting LU. A singular K means some
//! species has no loss at all (no process, no exit) while receiving mass, and
//! no steady state exists.

use crate::error::{Result, UtopiaError};
use crate::solver::{Scenario, SimulationResult, Solver, SolverConfiguration, SolverType, validate_state};

/// Direct LU steady-state solver
#[derive(Debug, Clone, Copy, Default)]
pub struct SteadyStateSolver;

impl SteadyStateSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for SteadyStateSolver {
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> Result<SimulationResult> {
        config.validate()?;
        scenario.validate()?;

        if config.solver_type != SolverType::SteadyState {
            return Err(UtopiaError::Solver(format!(
                "SteadyStateSolver only supports SteadyState configuration, got {}",
                config.solver_type.name()
            )));
        }

        let n = scenario.dimension();
        log::debug!("solving steady state for {} species", n);

        let rhs = -&scenario.emissions;
        let state = scenario
            .matrix
            .values()
            .clone()
            .lu()
            .solve(&rhs)
            .ok_or_else(|| UtopiaError::Solver("transition matrix is singular, no steady state exists".to_string()))?;

        validate_state(&state, 0)?;

        if let Some(min) = state.iter().copied().reduce(f64::min)
            && min < 0.0
        {
            log::warn!("steady state holds negative masses (min {:e} g)", min);
        }

        let mut result = SimulationResult::steady(state);
        result.add_metadata("solver", self.name());
        result.add_metadata("species", &n.to_string());
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Steady State (LU)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{SpeciesCode, TransitionMatrix};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn codes(n: usize) -> Vec<SpeciesCode> {
        (0..n).map(|i| SpeciesCode::new('a', 'A', i, "Utopia")).collect()
    }

    #[test]
    fn test_single_species_balance() {
        // dm/dt = -0.5 m + 2 -> m = 4
        let matrix = TransitionMatrix::new(codes(1), DMatrix::from_element(1, 1, -0.5)).unwrap();
        let scenario = Scenario::new(matrix, DVector::from_element(1, 2.0));
        let result = SteadyStateSolver::new()
            .solve(&scenario, &SolverConfiguration::steady_state())
            .unwrap();
        assert_relative_eq!(result.final_state[0], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_chain_transfer() {
        // species 0 -> species 1 at 0.1, species 1 lost at 0.2
        let values = DMatrix::from_row_slice(2, 2, &[-0.1, 0.0, 0.1, -0.2]);
        let matrix = TransitionMatrix::new(codes(2), values).unwrap();
        let scenario = Scenario::new(matrix, DVector::from_vec(vec![1.0, 0.0]));
        let result = SteadyStateSolver::new()
            .solve(&scenario, &SolverConfiguration::steady_state())
            .unwrap();
        assert_relative_eq!(result.final_state[0], 10.0, epsilon = 1e-9);
        assert_relative_eq!(result.final_state[1], 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_matrix() {
        let matrix = TransitionMatrix::new(codes(2), DMatrix::zeros(2, 2)).unwrap();
        let scenario = Scenario::new(matrix, DVector::from_vec(vec![1.0, 0.0]));
        let err = SteadyStateSolver::new()
            .solve(&scenario, &SolverConfiguration::steady_state())
            .unwrap_err();
        assert!(matches!(err, UtopiaError::Solver(_)));
    }

    #[test]
    fn test_rejects_time_evolution() {
        let matrix = TransitionMatrix::new(codes(1), DMatrix::from_element(1, 1, -1.0)).unwrap();
        let scenario = Scenario::new(matrix, DVector::zeros(1));
        assert!(
            SteadyStateSolver::new()
                .solve(&scenario, &SolverConfiguration::time_evolution(1.0, 10))
                .is_err()
        );
    }
}
