//! Rate-constant assembly
//!
//! For every species, asks the formula library for one rate constant per
//! process listed by the species' compartment. Processes the compartment does
//! not list get no entry at all.

use crate::assembly::SpeciesRegistry;
use crate::error::{Result, UtopiaError};
use crate::models::{ModelContext, Particle};
use crate::physics::{RateConstants, RateFormula};

/// Calls a formula library over the species of a registry
pub struct RateAssembler<'a> {
    context: &'a ModelContext,
    formulas: &'a dyn RateFormula,
}

impl<'a> RateAssembler<'a> {
    pub fn new(context: &'a ModelContext, formulas: &'a dyn RateFormula) -> Self {
        Self { context, formulas }
    }

    /// Rate constants of one species
    ///
    /// # Errors
    /// - `KeyNotFound` when the species' compartment is not in the context
    /// - `RateConstantComputation` for the first failing (or non-finite)
    ///   process, naming the process and the species code
    pub fn species_rates(&self, particle: &Particle) -> Result<RateConstants> {
        let species = particle
            .code()
            .map(ToString::to_string)
            .unwrap_or_else(|| particle.label());

        let compartment = self.context.compartment_of(particle).ok_or_else(|| UtopiaError::KeyNotFound {
            table: "compartment",
            key: format!("{}/{}", particle.box_name, particle.compartment),
            particle: species.clone(),
        })?;

        let mut rates = RateConstants::new();
        for process in compartment.processes() {
            let failure = |reason: String| UtopiaError::RateConstantComputation {
                process: process.name().to_string(),
                species: species.clone(),
                reason,
            };

            let value = self
                .formulas
                .compute(process, particle, self.context)
                .map_err(failure)?;

            if let Some(v) = &value
                && !v.is_finite()
            {
                return Err(failure(format!("non-finite value {}", v)));
            }
            rates.insert(process, value);
        }
        Ok(rates)
    }

    /// Assemble and store the rate constants of every species
    ///
    /// Every species is attempted. A failing species keeps its previous
    /// (empty) mapping while its siblings are committed; the first failure is
    /// returned once all species have been visited.
    pub fn assemble(&self, registry: &mut SpeciesRegistry) -> Result<()> {
        log::info!(
            "assembling rate constants for {} species with '{}'",
            registry.len(),
            self.formulas.name()
        );

        let mut first_error = None;
        let mut failures = 0usize;

        for particle in registry.particles_mut() {
            match self.species_rates(particle) {
                Ok(rates) => particle.set_rate_constants(rates),
                Err(e) => {
                    log::error!("{}", e);
                    failures += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => {
                log::error!("rate assembly failed for {} species", failures);
                Err(e)
            }
            None => Ok(()),
        }
    }
}
