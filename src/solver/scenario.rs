//! Simulation scenario definition
//!
//! A scenario combines the transition matrix of a run with an emission
//! vector and initial masses: dm/dt = K·m + e, m(0) = m0.

use crate::assembly::TransitionMatrix;
use crate::error::{Result, UtopiaError};
use nalgebra::DVector;

/// Simulation scenario
///
/// The same scenario can be solved with different numerical methods; it is
/// the WHAT to solve, not the HOW.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Transition matrix (1/s)
    pub matrix: TransitionMatrix,

    /// Emission per species (g/s)
    pub emissions: DVector<f64>,

    /// Initial mass per species (g)
    pub initial: DVector<f64>,
}

impl Scenario {
    /// Scenario starting from an empty system
    pub fn new(matrix: TransitionMatrix, emissions: DVector<f64>) -> Self {
        let initial = DVector::zeros(matrix.dimension());
        Self {
            matrix,
            emissions,
            initial,
        }
    }

    pub fn with_initial(mut self, initial: DVector<f64>) -> Self {
        self.initial = initial;
        self
    }

    /// Number of species
    pub fn dimension(&self) -> usize {
        self.matrix.dimension()
    }

    /// Check vector sizes and finiteness
    pub fn validate(&self) -> Result<()> {
        let n = self.dimension();
        if self.emissions.len() != n {
            return Err(UtopiaError::Solver(format!(
                "emission vector has {} entries for {} species",
                self.emissions.len(),
                n
            )));
        }
        if self.initial.len() != n {
            return Err(UtopiaError::Solver(format!(
                "initial state has {} entries for {} species",
                self.initial.len(),
                n
            )));
        }
        if self.matrix.values().iter().any(|v| !v.is_finite()) {
            return Err(UtopiaError::Solver("transition matrix holds non-finite rates".to_string()));
        }
        Ok(())
    }

    /// Right-hand side K·m + e
    pub fn derivative(&self, state: &DVector<f64>) -> DVector<f64> {
        self.matrix.values() * state + &self.emissions
    }
}
