//! Numerical methods for the species mass balance
//!
//! Concrete implementations of the [`Solver`](crate::solver::Solver) trait.
//!
//! - **[`SteadyStateSolver`]**: LU factorisation of K, one solve. The default
//!   for exposure indicators, which are defined at steady state.
//! - **[`EulerSolver`]**: forward Euler time stepping. First order, explicit,
//!   conditionally stable; useful for transients on non-stiff systems.
//!
//! Both are stateless and can be reused across runs.

pub mod euler;
pub mod steady;

pub use euler::EulerSolver;
pub use steady::SteadyStateSolver;
