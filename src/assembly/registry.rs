//! Species registry
//!
//! Assigns a code to every particle and keeps the ordered code list that
//! indexes the transition matrix, the flow tables and the solver vectors.
//! The registry is the only writer of species codes.

use crate::assembly::{CodingTables, SpeciesCode};
use crate::error::{Result, UtopiaError};
use crate::models::Particle;
use std::collections::{HashMap, HashSet};

/// Compute and write back the code of every particle
///
/// Codes are computed for the whole slice before any is written, so a
/// failure leaves every particle untouched. Running it again with the same
/// tables yields the same codes.
///
/// # Errors
/// - `KeyNotFound` for a particle attribute missing from the tables
/// - `DuplicateSpecies` when two particles produce the same code
pub fn assign_codes(particles: &mut [Particle], tables: &CodingTables) -> Result<Vec<SpeciesCode>> {
    let codes = particles
        .iter()
        .map(|p| tables.code_for(p))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = HashSet::with_capacity(codes.len());
    for code in &codes {
        if !seen.insert(code) {
            return Err(UtopiaError::DuplicateSpecies(code.to_string()));
        }
    }

    for (particle, code) in particles.iter_mut().zip(&codes) {
        particle.assign_code(code.clone());
    }
    Ok(codes)
}

/// Ordered species of one run
#[derive(Debug, Clone)]
pub struct SpeciesRegistry {
    particles: Vec<Particle>,
    codes: Vec<SpeciesCode>,
    index: HashMap<SpeciesCode, usize>,
}

impl SpeciesRegistry {
    /// Code every particle and index them in input order
    pub fn new(mut particles: Vec<Particle>, tables: &CodingTables) -> Result<Self> {
        let codes = assign_codes(&mut particles, tables)?;
        let index = codes
            .iter()
            .enumerate()
            .map(|(i, code)| (code.clone(), i))
            .collect();

        log::debug!("registered {} species", codes.len());
        Ok(Self {
            particles,
            codes,
            index,
        })
    }

    /// Ordered species codes
    pub fn codes(&self) -> &[SpeciesCode] {
        &self.codes
    }

    /// Particles in code order
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Position of a code in the ordered list
    pub fn index_of(&self, code: &SpeciesCode) -> Option<usize> {
        self.index.get(code).copied()
    }

    /// Particle carrying `code`
    pub fn particle(&self, code: &SpeciesCode) -> Option<&Particle> {
        self.index_of(code).map(|i| &self.particles[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfiguration;
    use crate::models::ParticleProperties;

    fn tables() -> CodingTables {
        CodingTables::new(
            &RunConfiguration::default(),
            vec!["Surface_Freshwater".into(), "Sediment_Freshwater".into()],
            vec!["Utopia".into()],
        )
        .unwrap()
    }

    fn particles() -> Vec<Particle> {
        let mut out = Vec::new();
        for compartment in ["Surface_Freshwater", "Sediment_Freshwater"] {
            for name in ["mp1", "mp2"] {
                for state in ["freeMP", "heterMP", "biofMP", "heterBiofMP"] {
                    out.push(Particle::new(
                        ParticleProperties::sphere(name, "PE", 980.0, 1.0),
                        state,
                        compartment,
                        "Utopia",
                    ));
                }
            }
        }
        out
    }

    #[test]
    fn test_distinct_tuples_give_distinct_codes() {
        let registry = SpeciesRegistry::new(particles(), &tables()).unwrap();
        assert_eq!(registry.len(), 16);
        let mut codes: Vec<String> = registry.codes().iter().map(|c| c.to_string()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 16);
    }

    #[test]
    fn test_codes_written_back_in_order() {
        let registry = SpeciesRegistry::new(particles(), &tables()).unwrap();
        for (particle, code) in registry.particles().iter().zip(registry.codes()) {
            assert_eq!(particle.code(), Some(code));
        }
        let code: SpeciesCode = "bD1_Utopia".parse().unwrap();
        assert_eq!(registry.index_of(&code), Some(15));
        assert_eq!(registry.particle(&code).unwrap().state, "heterBiofMP");
    }

    #[test]
    fn test_reassignment_is_idempotent() {
        let mut particles = particles();
        let first = assign_codes(&mut particles, &tables()).unwrap();
        let second = assign_codes(&mut particles, &tables()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_species_rejected() {
        let mut particles = particles();
        particles.push(particles[0].clone());
        let err = SpeciesRegistry::new(particles, &tables()).unwrap_err();
        assert!(matches!(err, UtopiaError::DuplicateSpecies(code) if code == "aA0_Utopia"));
    }

    #[test]
    fn test_failed_assignment_writes_nothing() {
        let mut particles = particles();
        particles.push(Particle::new(
            ParticleProperties::sphere("mp7", "PE", 980.0, 1.0),
            "freeMP",
            "Surface_Freshwater",
            "Utopia",
        ));
        assert!(assign_codes(&mut particles, &tables()).is_err());
        assert!(particles.iter().all(|p| p.code().is_none()));
    }
}
