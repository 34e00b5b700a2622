//! Elimination (total loss) rates
//!
//! The loss rate of a species is minus the sum of all its rate constants and
//! becomes the diagonal of the transition matrix. Null entries count as zero;
//! fragmentation contributes only its first element, which is the total
//! fragmentation rate of the species.

use crate::assembly::SpeciesRegistry;
use crate::physics::{Process, RateConstants, RateValue};
use nalgebra::DVector;

/// Contribution of one rate value to the total loss
pub fn loss_contribution(process: Process, value: &RateValue) -> f64 {
    match process {
        Process::Fragmentation => value.first(),
        _ => value.total(),
    }
}

/// Total loss rate of one species (<= 0 for non-negative rates)
///
/// # Example
/// ```
/// use utopia_rs::assembly::elimination_rate;
/// use utopia_rs::physics::{Process, RateConstants, RateValue};
///
/// let mut rates = RateConstants::new();
/// rates.insert(Process::Fragmentation, Some(RateValue::from_vec(vec![0.1, 0.05])));
/// rates.insert(Process::Settling, Some(RateValue::from_scalar(0.2)));
/// rates.insert(Process::Burial, None);
///
/// assert!((elimination_rate(&rates) + 0.3).abs() < 1e-12);
/// ```
pub fn elimination_rate(rates: &RateConstants) -> f64 {
    let losses: f64 = rates
        .iter()
        .filter_map(|(process, value)| value.map(|v| loss_contribution(process, v)))
        .sum();
    -losses
}

/// Loss rate of every species, in registry order
pub fn elimination_rates(registry: &SpeciesRegistry) -> DVector<f64> {
    DVector::from_iterator(
        registry.len(),
        registry
            .particles()
            .iter()
            .map(|p| elimination_rate(p.rate_constants())),
    )
}
