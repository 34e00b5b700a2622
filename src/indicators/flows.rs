//! Steady-state amounts and process flows
//!
//! A flow is a rate constant multiplied by the amount of the species it acts
//! on (g/s for mass, 1/s for particle number). Two tables are kept per
//! compartment:
//!
//! - **outflows**: for every species of the compartment, the flow through
//!   each of its processes (fragmentation counted once, by its total rate)
//! - **inflows**: for every species of the compartment, the mass arriving from
//!   species of other compartments, attributed to the transport process
//!   that carries it

use crate::assembly::{MatrixBuilder, SpeciesCode, SpeciesRegistry, loss_contribution};
use crate::error::{Result, UtopiaError};
use crate::models::CompartmentType;
use crate::physics::Process;
use crate::solver::SimulationResult;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit an amount or flow is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// Grams
    Mass,
    /// Particle count
    Number,
}

impl Basis {
    pub fn name(&self) -> &'static str {
        match self {
            Basis::Mass => "mass",
            Basis::Number => "number",
        }
    }
}

// =================================================================================================
// Steady state
// =================================================================================================

/// Amount of one species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesAmount {
    pub code: SpeciesCode,
    pub compartment: String,
    #[serde(rename = "box")]
    pub box_name: String,
    pub mass_g: f64,
    pub number: f64,
}

impl SpeciesAmount {
    pub fn amount(&self, basis: Basis) -> f64 {
        match basis {
            Basis::Mass => self.mass_g,
            Basis::Number => self.number,
        }
    }
}

/// Mass and particle number of every species, in registry order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteadyState {
    species: Vec<SpeciesAmount>,
}

impl SteadyState {
    /// Attach masses (g) to the species of `registry`
    ///
    /// The particle number of each species follows from its volume and
    /// density.
    ///
    /// # Errors
    /// `InvalidConfiguration` when the vector length differs from the
    /// species count.
    pub fn new(registry: &SpeciesRegistry, mass_g: &DVector<f64>) -> Result<Self> {
        if mass_g.len() != registry.len() {
            return Err(UtopiaError::config(format!(
                "steady state holds {} masses for {} species",
                mass_g.len(),
                registry.len()
            )));
        }

        let species = registry
            .particles()
            .iter()
            .zip(registry.codes())
            .zip(mass_g.iter())
            .map(|((particle, code), &mass)| SpeciesAmount {
                code: code.clone(),
                compartment: particle.compartment.clone(),
                box_name: particle.box_name.clone(),
                mass_g: mass,
                number: particle.number_from_mass(mass),
            })
            .collect();
        Ok(Self { species })
    }

    /// Final state of a solver run
    pub fn from_result(registry: &SpeciesRegistry, result: &SimulationResult) -> Result<Self> {
        Self::new(registry, &result.final_state)
    }

    pub fn species(&self) -> &[SpeciesAmount] {
        &self.species
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// Sum over the species accepted by `filter`
    pub fn total_where<F>(&self, basis: Basis, filter: F) -> f64
    where
        F: Fn(&SpeciesAmount) -> bool,
    {
        self.species.iter().filter(|s| filter(s)).map(|s| s.amount(basis)).sum()
    }

    /// Amount held in every compartment named `compartment`
    pub fn compartment_total(&self, compartment: &str, basis: Basis) -> f64 {
        self.total_where(basis, |s| s.compartment == compartment)
    }
}

// =================================================================================================
// Flow tables
// =================================================================================================

/// Flows of one species, by process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRow {
    pub code: SpeciesCode,
    pub flows: BTreeMap<Process, f64>,
}

impl FlowRow {
    /// Flow through `process`, zero when absent
    pub fn flow(&self, process: Process) -> f64 {
        self.flows.get(&process).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.flows.values().sum()
    }
}

/// Outflow and inflow tables of one compartment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentFlows {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CompartmentType,
    mass_outflows: Vec<FlowRow>,
    number_outflows: Vec<FlowRow>,
    mass_inflows: Vec<FlowRow>,
    number_inflows: Vec<FlowRow>,
}

impl CompartmentFlows {
    fn new(name: &str, kind: CompartmentType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            mass_outflows: Vec::new(),
            number_outflows: Vec::new(),
            mass_inflows: Vec::new(),
            number_inflows: Vec::new(),
        }
    }

    pub fn outflows(&self, basis: Basis) -> &[FlowRow] {
        match basis {
            Basis::Mass => &self.mass_outflows,
            Basis::Number => &self.number_outflows,
        }
    }

    pub fn inflows(&self, basis: Basis) -> &[FlowRow] {
        match basis {
            Basis::Mass => &self.mass_inflows,
            Basis::Number => &self.number_inflows,
        }
    }

    /// Outflow through `process`, optionally restricted to one size symbol
    pub fn outflow(&self, basis: Basis, process: Process, size: Option<char>) -> f64 {
        self.outflows(basis)
            .iter()
            .filter(|row| size.is_none_or(|s| row.code.size() == s))
            .map(|row| row.flow(process))
            .sum()
    }

    /// Everything arriving from other compartments
    pub fn inflow_total(&self, basis: Basis) -> f64 {
        self.inflows(basis).iter().map(FlowRow::total).sum()
    }
}

/// Flow tables of every compartment, in compartment-ordinal order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTables {
    compartments: Vec<CompartmentFlows>,
}

impl FlowTables {
    /// Derive outflow and inflow tables from a steady state
    ///
    /// Species sharing a compartment name across boxes share one table.
    ///
    /// # Errors
    /// `InvalidConfiguration` when `steady` does not match the builder's
    /// registry; `StructuralResolution` from pair classification.
    pub fn from_steady_state(builder: &MatrixBuilder<'_>, steady: &SteadyState) -> Result<Self> {
        let registry = builder.registry();
        let context = builder.context();
        if steady.len() != registry.len() {
            return Err(UtopiaError::config(format!(
                "steady state holds {} species, registry {}",
                steady.len(),
                registry.len()
            )));
        }

        let mut compartments: Vec<CompartmentFlows> = context
            .compartment_names()
            .iter()
            .filter_map(|name| {
                let kind = context.compartments().find(|c| c.name() == name)?.kind();
                Some(CompartmentFlows::new(name, kind))
            })
            .collect();

        let amounts = steady.species();
        for (i, (particle, target)) in registry.particles().iter().zip(amounts).enumerate() {
            let Some(slot) = compartments.iter_mut().find(|c| c.name == target.compartment) else {
                return Err(UtopiaError::KeyNotFound {
                    table: "compartment",
                    key: target.compartment.clone(),
                    particle: particle.label(),
                });
            };

            // ====== Outflows ======

            let mut mass_out = BTreeMap::new();
            let mut number_out = BTreeMap::new();
            for (process, value) in particle.rate_constants().iter() {
                let k = value.map(|v| loss_contribution(process, v)).unwrap_or(0.0);
                mass_out.insert(process, k * target.mass_g);
                number_out.insert(process, k * target.number);
            }

            // ====== Inflows ======

            let mut mass_in: BTreeMap<Process, f64> = BTreeMap::new();
            let mut number_in: BTreeMap<Process, f64> = BTreeMap::new();
            for (j, source) in amounts.iter().enumerate() {
                if source.compartment == target.compartment && source.box_name == target.box_name {
                    continue;
                }
                for (process, rate) in builder.contributions(j, i)? {
                    *mass_in.entry(process).or_default() += rate * source.mass_g;
                    *number_in.entry(process).or_default() += rate * source.number;
                }
            }

            let row = |flows| FlowRow {
                code: target.code.clone(),
                flows,
            };
            slot.mass_outflows.push(row(mass_out));
            slot.number_outflows.push(row(number_out));
            slot.mass_inflows.push(row(mass_in));
            slot.number_inflows.push(row(number_in));
        }

        log::debug!("flow tables derived for {} compartments", compartments.len());
        Ok(Self { compartments })
    }

    pub fn compartment(&self, name: &str) -> Option<&CompartmentFlows> {
        self.compartments.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompartmentFlows> {
        self.compartments.iter()
    }

    pub fn len(&self) -> usize {
        self.compartments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compartments.is_empty()
    }
}
