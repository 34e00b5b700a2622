//! Numerical solver traits and types
//!
//! # Design
//!
//! - `SolverType` says what kind of solution is wanted (steady state or a
//!   time series) and carries its parameters
//! - `SolverConfiguration` wraps it and is validated before every solve
//! - `SimulationResult` holds the trajectory of species masses plus free-form
//!   metadata

use crate::error::{Result, UtopiaError};
use crate::solver::Scenario;
use nalgebra::DVector;
use std::collections::HashMap;

// =================================================================================================
// Solver type
// =================================================================================================

/// Type of numerical solution
///
/// # Examples
///
/// ```rust
/// use utopia_rs::solver::SolverType;
///
/// let steady = SolverType::SteadyState;
/// let dynamic = SolverType::TimeEvolution { total_time: 3.15e7, time_steps: 1000 };
/// assert!(dynamic.validate().is_ok());
/// assert_eq!(steady.name(), "SteadyState");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum SolverType {
    /// Mass distribution with dm/dt = 0
    SteadyState,

    /// Mass distribution over time
    ///
    /// # Parameters
    /// - `total_time`: simulated time (s)
    /// - `time_steps`: number of steps
    TimeEvolution { total_time: f64, time_steps: usize },
}

impl SolverType {
    pub fn name(&self) -> &str {
        match self {
            SolverType::SteadyState => "SteadyState",
            SolverType::TimeEvolution { .. } => "TimeEvolution",
        }
    }

    /// Validate that parameters are meaningful
    pub fn validate(&self) -> Result<()> {
        match self {
            SolverType::SteadyState => Ok(()),
            SolverType::TimeEvolution {
                total_time,
                time_steps,
            } => {
                if !total_time.is_finite() || *total_time <= 0.0 {
                    return Err(UtopiaError::Solver("total time must be positive".to_string()));
                }
                if *time_steps == 0 {
                    return Err(UtopiaError::Solver("time steps must be greater than 0".to_string()));
                }
                Ok(())
            }
        }
    }
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Configuration for a numerical solver
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfiguration {
    pub solver_type: SolverType,
}

impl SolverConfiguration {
    pub fn new(solver_type: SolverType) -> Self {
        Self { solver_type }
    }

    /// Steady-state configuration
    pub fn steady_state() -> Self {
        Self::new(SolverType::SteadyState)
    }

    /// Time-resolved configuration
    pub fn time_evolution(total_time: f64, time_steps: usize) -> Self {
        Self::new(SolverType::TimeEvolution {
            total_time,
            time_steps,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.solver_type.validate()
    }
}

// =================================================================================================
// Simulation result
// =================================================================================================

/// Species masses (g) over time, in registry order
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// Time of every trajectory point (s); a single 0 for steady state
    pub time_points: Vec<f64>,

    pub trajectory: Vec<DVector<f64>>,

    pub final_state: DVector<f64>,

    pub metadata: HashMap<String, String>,
}

impl SimulationResult {
    pub fn new(time_points: Vec<f64>, trajectory: Vec<DVector<f64>>, final_state: DVector<f64>) -> Self {
        Self {
            time_points,
            trajectory,
            final_state,
            metadata: HashMap::new(),
        }
    }

    /// Single-point result
    pub fn steady(state: DVector<f64>) -> Self {
        Self::new(vec![0.0], vec![state.clone()], state)
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Number of trajectory points
    pub fn len(&self) -> usize {
        self.trajectory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectory.is_empty()
    }
}

// =================================================================================================
// Solver trait
// =================================================================================================

/// Trait for numerical solvers
///
/// # Responsibility
/// Applies a numerical method to dm/dt = K·m + e. Knows nothing about
/// species, compartments or processes.
pub trait Solver: Send + Sync {
    fn solve(&self, scenario: &Scenario, config: &SolverConfiguration) -> Result<SimulationResult>;

    fn name(&self) -> &'static str;
}
