//! Forward Euler numerical solver
//!
//! # Mathematical Background
//!
//! Integrates the species mass balance
//!
//! ```text
//! dm/dt = K · m + e
//! ```
//!
//! with the explicit scheme
//!
//! ```text
//! m_{n+1} = m_n + dt · (K · m_n + e)
//! ```
//!
//! # Characteristics
//!
//! - **Order**: first-order accurate (error ~ O(dt))
//! - **Stability**: conditionally stable, dt · max|K_ii| must stay below 2
//! - **Complexity**: one matrix-vector product per step
//!
//! Fate matrices are often stiff (fast air deposition next to century-scale
//! burial). Prefer [`SteadyStateSolver`](crate::solver::SteadyStateSolver)
//! unless the transient itself is of interest.
//!
//! # Example
//!
//! ```rust,ignore
//! use utopia_rs::solver::{EulerSolver, Solver, SolverConfiguration};
//!
//! let config = SolverConfiguration::time_evolution(3.15e7, 100_000);
//! let result = EulerSolver::new().solve(&scenario, &config)?;
//! ```

use crate::error::{Result, UtopiaError};
use crate::solver::{Scenario, SimulationResult, Solver, SolverConfiguration, SolverType, validate_state};

// =================================================================================================
// Forward Euler Solver
// =================================================================================================

/// Forward Euler time-stepping solver
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerSolver;

impl EulerSolver {
    /// Create a new Forward Euler solver
    ///
    /// # Example
    ///
    /// ```rust
    /// use utopia_rs::solver::{EulerSolver, Solver};
    ///
    /// let solver = EulerSolver::new();
    /// assert_eq!(solver.name(), "Forward Euler");
    /// ```
    pub fn new() -> Self {
        Self
    }
}

impl Solver for EulerSolver {
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> Result<SimulationResult> {
        // ====== Step 1: Validation ======

        config.validate()?;
        scenario.validate()?;

        let (total_time, time_steps) = match &config.solver_type {
            SolverType::TimeEvolution {
                total_time,
                time_steps,
            } => (*total_time, *time_steps),
            other => {
                return Err(UtopiaError::Solver(format!(
                    "EulerSolver only supports TimeEvolution configuration, got {}",
                    other.name()
                )));
            }
        };

        // ====== Step 2: Setup ======

        let dt = total_time / (time_steps as f64);

        let fastest = scenario
            .matrix
            .diagonal()
            .iter()
            .fold(0.0_f64, |acc, k| acc.max(k.abs()));
        if fastest * dt > 2.0 {
            log::warn!(
                "Forward Euler step dt = {:e} s exceeds the stability limit {:e} s",
                dt,
                2.0 / fastest
            );
        }

        let mut state = scenario.initial.clone();
        let mut time_points = Vec::with_capacity(time_steps + 1);
        let mut trajectory = Vec::with_capacity(time_steps + 1);
        time_points.push(0.0);
        trajectory.push(state.clone());

        // ====== Step 3: Time Integration ======

        for step in 0..time_steps {
            let rate = scenario.derivative(&state);
            state += rate * dt;

            trajectory.push(state.clone());
            // Computed from the index so the last point is exactly total_time.
            time_points.push((step as f64 + 1.0) * dt);

            validate_state(&state, step + 1)?;
        }

        // ====== Step 4: Build Result ======

        let mut result = SimulationResult::new(time_points, trajectory, state);
        result.add_metadata("solver", self.name());
        result.add_metadata("time steps", &time_steps.to_string());
        result.add_metadata("dt", &dt.to_string());
        result.add_metadata("total time", &total_time.to_string());
        Ok(result)
    }

    fn name(&self) -> &'static str {
        "Forward Euler"
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{SpeciesCode, TransitionMatrix};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    /// dm/dt = -k m, m(0) = 1
    fn decay(k: f64) -> Scenario {
        let matrix = TransitionMatrix::new(
            vec![SpeciesCode::new('a', 'A', 0, "Utopia")],
            DMatrix::from_element(1, 1, -k),
        )
        .unwrap();
        Scenario::new(matrix, DVector::zeros(1)).with_initial(DVector::from_element(1, 1.0))
    }

    #[test]
    fn test_trajectory_shape() {
        let result = EulerSolver::new()
            .solve(&decay(0.1), &SolverConfiguration::time_evolution(10.0, 100))
            .unwrap();
        assert_eq!(result.len(), 101);
        assert_eq!(result.time_points.len(), 101);
        assert_relative_eq!(*result.time_points.last().unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let result = EulerSolver::new()
            .solve(&decay(0.1), &SolverConfiguration::time_evolution(10.0, 10_000))
            .unwrap();
        assert_relative_eq!(result.final_state[0], (-1.0_f64).exp(), max_relative = 1e-3);
    }

    #[test]
    fn test_converges_to_steady_state() {
        // dm/dt = -0.5 m + 1 -> 2
        let matrix = TransitionMatrix::new(
            vec![SpeciesCode::new('a', 'A', 0, "Utopia")],
            DMatrix::from_element(1, 1, -0.5),
        )
        .unwrap();
        let scenario = Scenario::new(matrix, DVector::from_element(1, 1.0));
        let result = EulerSolver::new()
            .solve(&scenario, &SolverConfiguration::time_evolution(60.0, 6000))
            .unwrap();
        assert_relative_eq!(result.final_state[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_step_update() {
        // m1 = 1 + dt * (-k) with dt * k = 1000, far beyond the stability limit
        let result = EulerSolver::new()
            .solve(&decay(1000.0), &SolverConfiguration::time_evolution(1.0, 1))
            .unwrap();
        assert_relative_eq!(result.final_state[0], -999.0, epsilon = 1e-9);
        assert_eq!(result.metadata["solver"], "Forward Euler");
    }

    #[test]
    fn test_rejects_steady_state_configuration() {
        assert!(
            EulerSolver::new()
                .solve(&decay(1.0), &SolverConfiguration::steady_state())
                .is_err()
        );
    }
}
