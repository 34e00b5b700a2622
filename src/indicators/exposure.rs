//! Overall persistence (Pov) and residence time (Tov)
//!
//! # Definitions
//!
//! ```text
//! Pov = M / Σ F_discorporation                 (persistence)
//! Tov = M / Σ F_exit                           (residence time)
//! ```
//!
//! with M the steady-state amount inside the system boundaries and F the
//! flows of the flow tables. Excluded compartments (by default the deep
//! ocean column and its sediment) are removed from numerators and
//! denominators alike; the ocean mixed layer instead counts its net exchange
//! with the deep ocean as a system exit:
//!
//! ```text
//! F_exit(mixed) = F_discorporation + F_settling
//!               + Σ k_mixing[down] · m(mixed)
//!               - Σ k_mixing · m(column) - Σ k_rising · m(column)
//! ```
//!
//! Deep soils add sequestration and sediments add burial. Per size class the
//! fragmentation flow is an exit as well, since fragments leave the class.
//!
//! Every indicator is reported in years. A zero amount or a zero denominator
//! gives [`Indicator::NotApplicable`] instead of an error.

use crate::assembly::SpeciesRegistry;
use crate::config::RunConfiguration;
use crate::error::Result;
use crate::indicators::flows::{Basis, FlowTables, SpeciesAmount, SteadyState};
use crate::models::{CompartmentType, Emissions};
use crate::physics::Process;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Convert seconds to years
pub fn seconds_to_years(seconds: f64) -> f64 {
    seconds / SECONDS_PER_DAY / DAYS_PER_YEAR
}

// =================================================================================================
// Indicator value
// =================================================================================================

/// One indicator, in years
///
/// Serialises as a number, or `null` when not applicable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Indicator {
    Value(f64),
    NotApplicable,
}

impl Indicator {
    /// `amount / flow` seconds, converted to years
    ///
    /// # Example
    /// ```
    /// use utopia_rs::indicators::Indicator;
    ///
    /// let tov = Indicator::years(300.0, 15.0);
    /// assert_eq!(tov.value(), Some(20.0 / 86_400.0 / 365.0));
    /// assert_eq!(Indicator::years(0.0, 15.0), Indicator::NotApplicable);
    /// ```
    pub fn years(amount: f64, flow: f64) -> Self {
        if amount == 0.0 || flow == 0.0 {
            return Indicator::NotApplicable;
        }
        let years = seconds_to_years(amount / flow);
        if years.is_finite() {
            Indicator::Value(years)
        } else {
            Indicator::NotApplicable
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Indicator::Value(v) => Some(*v),
            Indicator::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Indicator::Value(_))
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Value(v) => fmt::Display::fmt(v, f),
            Indicator::NotApplicable => f.pad("NaN"),
        }
    }
}

impl Serialize for Indicator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Indicator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.map_or(Indicator::NotApplicable, Indicator::Value))
    }
}

// =================================================================================================
// Indicator tables
// =================================================================================================

/// Whole-system indicators in one basis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallIndicators {
    pub pov_years: Indicator,
    pub tov_years: Indicator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentIndicators {
    pub compartment: String,
    pub pov_mass_years: Indicator,
    pub pov_number_years: Indicator,
    pub tov_mass_years: Indicator,
    pub tov_number_years: Indicator,
}

/// Mass-based indicators of one size class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeIndicators {
    pub size: char,
    pub size_class: String,
    pub pov_years: Indicator,
    pub tov_years: Indicator,
}

/// Every exposure indicator of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureIndicators {
    pub mass: OverallIndicators,
    pub number: OverallIndicators,
    pub compartments: Vec<CompartmentIndicators>,
    pub sizes: Vec<SizeIndicators>,
}

impl ExposureIndicators {
    pub fn overall(&self, basis: Basis) -> &OverallIndicators {
        match basis {
            Basis::Mass => &self.mass,
            Basis::Number => &self.number,
        }
    }

    pub fn compartment(&self, name: &str) -> Option<&CompartmentIndicators> {
        self.compartments.iter().find(|c| c.compartment == name)
    }

    pub fn size(&self, symbol: char) -> Option<&SizeIndicators> {
        self.sizes.iter().find(|s| s.size == symbol)
    }
}

// =================================================================================================
// Calculator
// =================================================================================================

/// Computes exposure indicators from a steady state and its flow tables
pub struct ExposureCalculator<'a> {
    config: &'a RunConfiguration,
    registry: &'a SpeciesRegistry,
    emissions: &'a Emissions,
}

impl<'a> ExposureCalculator<'a> {
    pub fn new(config: &'a RunConfiguration, registry: &'a SpeciesRegistry, emissions: &'a Emissions) -> Self {
        Self {
            config,
            registry,
            emissions,
        }
    }

    /// # Errors
    /// `InvalidConfiguration` when an emission source matches no species.
    pub fn calculate(&self, steady: &SteadyState, flows: &FlowTables) -> Result<ExposureIndicators> {
        let overall = |basis| OverallIndicators {
            pov_years: Indicator::years(
                self.in_scope_total(steady, basis, None),
                self.discorporation(flows, basis, None),
            ),
            tov_years: Indicator::years(
                self.in_scope_total(steady, basis, None),
                self.system_exits(flows, steady, basis, None),
            ),
        };
        let mass = overall(Basis::Mass);
        let number = overall(Basis::Number);

        let mut compartments = Vec::with_capacity(flows.len());
        for table in flows.iter() {
            let name = table.name.as_str();
            let mass_g = steady.compartment_total(name, Basis::Mass);
            let number_total = steady.compartment_total(name, Basis::Number);
            let emitted_mass = self.emissions.compartment_mass(name);
            let emitted_number = self.emissions.compartment_number(name, self.registry.particles())?;

            compartments.push(CompartmentIndicators {
                compartment: name.to_string(),
                pov_mass_years: Indicator::years(
                    mass_g,
                    table.outflow(Basis::Mass, Process::Discorporation, None),
                ),
                pov_number_years: Indicator::years(
                    number_total,
                    table.outflow(Basis::Number, Process::Discorporation, None),
                ),
                tov_mass_years: Indicator::years(mass_g, emitted_mass + table.inflow_total(Basis::Mass)),
                tov_number_years: Indicator::years(number_total, emitted_number + table.inflow_total(Basis::Number)),
            });
        }

        let sizes = self
            .config
            .size_classes
            .iter()
            .map(|class| {
                let size = Some(class.symbol);
                let mass_g = self.in_scope_total(steady, Basis::Mass, size);
                let fragmentation = self.in_scope_outflow(flows, Basis::Mass, Process::Fragmentation, size);
                SizeIndicators {
                    size: class.symbol,
                    size_class: class.prefix.clone(),
                    pov_years: Indicator::years(mass_g, fragmentation + self.discorporation(flows, Basis::Mass, size)),
                    tov_years: Indicator::years(
                        mass_g,
                        fragmentation + self.system_exits(flows, steady, Basis::Mass, size),
                    ),
                }
            })
            .collect();

        log::info!(
            "exposure indicators: Pov(mass) = {} y, Tov(mass) = {} y",
            mass.pov_years,
            mass.tov_years
        );
        Ok(ExposureIndicators {
            mass,
            number,
            compartments,
            sizes,
        })
    }

    fn selected(&self, species: &SpeciesAmount, size: Option<char>) -> bool {
        self.config.in_scope(&species.compartment) && size.is_none_or(|s| species.code.size() == s)
    }

    fn in_scope_total(&self, steady: &SteadyState, basis: Basis, size: Option<char>) -> f64 {
        steady.total_where(basis, |s| self.selected(s, size))
    }

    fn in_scope_outflow(&self, flows: &FlowTables, basis: Basis, process: Process, size: Option<char>) -> f64 {
        flows
            .iter()
            .filter(|c| self.config.in_scope(&c.name))
            .map(|c| c.outflow(basis, process, size))
            .sum()
    }

    fn discorporation(&self, flows: &FlowTables, basis: Basis, size: Option<char>) -> f64 {
        self.in_scope_outflow(flows, basis, Process::Discorporation, size)
    }

    fn system_exits(&self, flows: &FlowTables, steady: &SteadyState, basis: Basis, size: Option<char>) -> f64 {
        let mut total = 0.0;
        for table in flows.iter().filter(|c| self.config.in_scope(&c.name)) {
            total += table.outflow(basis, Process::Discorporation, size);
            match table.kind {
                CompartmentType::DeepSoil => {
                    total += table.outflow(basis, Process::SequestrationDeepSoils, size);
                }
                CompartmentType::Sediment => {
                    total += table.outflow(basis, Process::Burial, size);
                }
                _ => {}
            }
            if table.name == self.config.ocean_mixed_water {
                total += table.outflow(basis, Process::Settling, size);
                total += self.deep_ocean_exchange(steady, basis, size);
            }
        }
        total
    }

    /// Net loss of the mixed layer to the deep ocean
    fn deep_ocean_exchange(&self, steady: &SteadyState, basis: Basis, size: Option<char>) -> f64 {
        // Mixing vectors follow the configured receiving order.
        let column = self
            .config
            .mixing_targets
            .iter()
            .position(|name| *name == self.config.ocean_column_water);

        let mut net = 0.0;
        for (particle, species) in self.registry.particles().iter().zip(steady.species()) {
            if size.is_some_and(|s| species.code.size() != s) {
                continue;
            }
            let rates = particle.rate_constants();
            let amount = species.amount(basis);
            if species.compartment == self.config.ocean_mixed_water {
                let down = column
                    .and_then(|i| rates.get(Process::Mixing)?.receiving(i))
                    .unwrap_or(0.0);
                net += down * amount;
            } else if species.compartment == self.config.ocean_column_water {
                let up = rates.get(Process::Mixing).map(|k| k.total()).unwrap_or(0.0);
                let rising = rates.get(Process::Rising).map(|k| k.total()).unwrap_or(0.0);
                net -= (up + rising) * amount;
            }
        }
        net
    }
}
