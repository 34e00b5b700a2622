//! Emission scenario
//!
//! Direct emissions of plastic mass into compartments, in g/s. Each source
//! targets one size class of one compartment; the aggregation state defaults
//! to the first configured state (free particles).

use crate::error::{Result, UtopiaError};
use crate::models::Particle;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// One emission source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionSource {
    #[serde(rename = "box")]
    pub box_name: String,
    pub compartment: String,

    /// Size symbol (`a`..`e`)
    pub size: char,

    /// State symbol (`A`..`D`)
    #[serde(default = "default_state")]
    pub state: char,

    pub mass_g_s: f64,
}

fn default_state() -> char {
    'A'
}

/// Emission scenario of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emissions {
    sources: Vec<EmissionSource>,
}

impl Emissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit free particles of size `size` into a compartment
    pub fn add(mut self, box_name: impl Into<String>, compartment: impl Into<String>, size: char, mass_g_s: f64) -> Self {
        self.sources.push(EmissionSource {
            box_name: box_name.into(),
            compartment: compartment.into(),
            size,
            state: default_state(),
            mass_g_s,
        });
        self
    }

    pub fn sources(&self) -> &[EmissionSource] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Total mass emission into every compartment named `compartment` (g/s)
    pub fn compartment_mass(&self, compartment: &str) -> f64 {
        self.sources
            .iter()
            .filter(|s| s.compartment == compartment)
            .map(|s| s.mass_g_s)
            .sum()
    }

    /// Mass emission per species (g/s), in particle order
    ///
    /// # Errors
    /// `InvalidConfiguration` when a source matches no species, or when a
    /// species has no code yet.
    pub fn species_vector(&self, particles: &[Particle]) -> Result<DVector<f64>> {
        let mut vector = DVector::zeros(particles.len());
        for source in &self.sources {
            let mut matched = false;
            for (i, particle) in particles.iter().enumerate() {
                let code = particle.code().ok_or_else(|| {
                    UtopiaError::config(format!("species {} has no code", particle.label()))
                })?;
                if particle.box_name == source.box_name
                    && particle.compartment == source.compartment
                    && code.size() == source.size
                    && code.state() == source.state
                {
                    vector[i] += source.mass_g_s;
                    matched = true;
                }
            }
            if !matched {
                return Err(UtopiaError::config(format!(
                    "emission into {}/{} (size {}, state {}) matches no species",
                    source.box_name, source.compartment, source.size, source.state
                )));
            }
        }
        Ok(vector)
    }

    /// Number emission per species (particles/s), in particle order
    pub fn species_number_vector(&self, particles: &[Particle]) -> Result<DVector<f64>> {
        let mass = self.species_vector(particles)?;
        Ok(DVector::from_iterator(
            particles.len(),
            particles.iter().zip(mass.iter()).map(|(p, m)| p.number_from_mass(*m)),
        ))
    }

    /// Total number emission into every compartment named `compartment` (1/s)
    pub fn compartment_number(&self, compartment: &str, particles: &[Particle]) -> Result<f64> {
        let numbers = self.species_number_vector(particles)?;
        Ok(particles
            .iter()
            .zip(numbers.iter())
            .filter(|(p, _)| p.compartment == compartment)
            .map(|(_, n)| n)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults_state() {
        let emissions: Emissions = serde_json::from_str(
            r#"[{"box": "Utopia", "compartment": "Air", "size": "e", "mass_g_s": 2.5}]"#,
        )
        .unwrap();
        assert_eq!(emissions.sources()[0].state, 'A');
        assert_eq!(emissions.compartment_mass("Air"), 2.5);
        assert_eq!(emissions.compartment_mass("Impacted_Soil"), 0.0);
    }
}
