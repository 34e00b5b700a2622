//! Microplastic particle species
//!
//! A [`Particle`] is one species of the system: a size class (given by the
//! particle base name), an aggregation state, and the compartment and box it
//! lives in. Its geometry comes from [`ParticleProperties`], shared by every
//! species generated from the same input row.

use crate::assembly::SpeciesCode;
use crate::physics::RateConstants;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Micrometres per metre
const UM_PER_M: f64 = 1e6;

// =================================================================================================
// Shape
// =================================================================================================

/// Particle shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Radius = X
    Sphere,

    /// Radius = X, length = Y
    #[serde(alias = "fiber", alias = "cylinder")]
    Fibre,

    /// Box of X * Y * Z
    #[serde(alias = "fragment")]
    Pellet,
}

// =================================================================================================
// Particle properties (input row)
// =================================================================================================

/// Intrinsic properties of one particle size class
///
/// Dimensions are in micrometres; for spheres and fibres `dimension_x_um` is
/// the radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleProperties {
    /// Base name, its first three characters select the size class (`mp1`..)
    pub name: String,
    pub composition: String,
    pub density_kg_m3: f64,
    pub shape: Shape,
    pub dimension_x_um: f64,
    pub dimension_y_um: f64,
    pub dimension_z_um: f64,
}

impl ParticleProperties {
    /// Spherical particle of the given radius
    pub fn sphere(name: impl Into<String>, composition: impl Into<String>, density_kg_m3: f64, radius_um: f64) -> Self {
        Self {
            name: name.into(),
            composition: composition.into(),
            density_kg_m3,
            shape: Shape::Sphere,
            dimension_x_um: radius_um,
            dimension_y_um: radius_um,
            dimension_z_um: radius_um,
        }
    }

    /// Size-class prefix of the base name
    pub fn size_prefix(&self) -> &str {
        self.name.get(..3).unwrap_or(&self.name)
    }

    /// Radius (m)
    pub fn radius_m(&self) -> f64 {
        self.dimension_x_um / UM_PER_M
    }

    /// Diameter (m)
    pub fn diameter_m(&self) -> f64 {
        2.0 * self.radius_m()
    }

    /// Diameter (um)
    pub fn diameter_um(&self) -> f64 {
        2.0 * self.dimension_x_um
    }

    /// Volume of one particle (m3)
    pub fn volume_m3(&self) -> f64 {
        let x = self.dimension_x_um / UM_PER_M;
        let y = self.dimension_y_um / UM_PER_M;
        let z = self.dimension_z_um / UM_PER_M;
        match self.shape {
            Shape::Sphere => 4.0 / 3.0 * PI * x.powi(3),
            Shape::Fibre => PI * x.powi(2) * y,
            Shape::Pellet => x * y * z,
        }
    }

    /// Corey shape factor
    pub fn corey_shape_factor(&self) -> f64 {
        let x = self.dimension_x_um / UM_PER_M;
        let y = self.dimension_y_um / UM_PER_M;
        let z = self.dimension_z_um / UM_PER_M;
        match self.shape {
            Shape::Sphere => 1.0,
            Shape::Fibre => x / (y * x).sqrt(),
            Shape::Pellet => x / (y * z).sqrt(),
        }
    }

    /// Mass of one particle (kg)
    pub fn particle_mass_kg(&self) -> f64 {
        self.density_kg_m3 * self.volume_m3()
    }

    /// Number of particles in `mass_g` grams
    ///
    /// Returns 0 for degenerate particles (zero volume or density).
    pub fn number_from_mass(&self, mass_g: f64) -> f64 {
        let particle_mass_kg = self.particle_mass_kg();
        if particle_mass_kg > 0.0 {
            mass_g / 1000.0 / particle_mass_kg
        } else {
            0.0
        }
    }
}

// =================================================================================================
// Particle (species)
// =================================================================================================

/// One particle species
///
/// The species code and rate constants are written by the assembly stage
/// only; everything else is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub properties: ParticleProperties,

    /// Aggregation state name (e.g. `freeMP`)
    pub state: String,

    /// Name of the compartment holding the species
    pub compartment: String,

    /// Name of the box holding the compartment
    pub box_name: String,

    code: Option<SpeciesCode>,
    rate_constants: RateConstants,
}

impl Particle {
    pub fn new(
        properties: ParticleProperties,
        state: impl Into<String>,
        compartment: impl Into<String>,
        box_name: impl Into<String>,
    ) -> Self {
        Self {
            properties,
            state: state.into(),
            compartment: compartment.into(),
            box_name: box_name.into(),
            code: None,
            rate_constants: RateConstants::new(),
        }
    }

    /// Base name of the particle
    pub fn name(&self) -> &str {
        &self.properties.name
    }

    /// Human readable identity, used in error messages
    pub fn label(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.properties.name, self.state, self.compartment, self.box_name
        )
    }

    /// Species code, once assigned
    pub fn code(&self) -> Option<&SpeciesCode> {
        self.code.as_ref()
    }

    pub(crate) fn assign_code(&mut self, code: SpeciesCode) {
        self.code = Some(code);
    }

    /// Rate constants, empty until assembled
    pub fn rate_constants(&self) -> &RateConstants {
        &self.rate_constants
    }

    pub(crate) fn set_rate_constants(&mut self, rates: RateConstants) {
        self.rate_constants = rates;
    }

    /// Number of particles in `mass_g` grams of this species
    pub fn number_from_mass(&self, mass_g: f64) -> f64 {
        self.properties.number_from_mass(mass_g)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pellet() -> ParticleProperties {
        ParticleProperties {
            name: "mp3".into(),
            composition: "PE".into(),
            density_kg_m3: 1000.0,
            shape: Shape::Pellet,
            dimension_x_um: 10.0,
            dimension_y_um: 20.0,
            dimension_z_um: 5.0,
        }
    }

    #[test]
    fn test_sphere_geometry() {
        let sphere = ParticleProperties::sphere("mp1", "PE", 980.0, 0.5);
        let r = 0.5e-6;
        assert_relative_eq!(sphere.volume_m3(), 4.0 / 3.0 * PI * r * r * r, max_relative = 1e-12);
        assert_eq!(sphere.corey_shape_factor(), 1.0);
        assert_relative_eq!(sphere.diameter_um(), 1.0);
        assert_eq!(sphere.size_prefix(), "mp1");
    }

    #[test]
    fn test_fibre_geometry() {
        let fibre = ParticleProperties {
            shape: Shape::Fibre,
            ..pellet()
        };
        let (r, l) = (10e-6, 20e-6);
        assert_relative_eq!(fibre.volume_m3(), PI * r * r * l, max_relative = 1e-12);
        assert_relative_eq!(fibre.corey_shape_factor(), r / (l * r).sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_pellet_geometry() {
        let pellet = pellet();
        assert_relative_eq!(pellet.volume_m3(), 10e-6 * 20e-6 * 5e-6, max_relative = 1e-12);
        assert_relative_eq!(pellet.corey_shape_factor(), 10e-6 / (20e-6_f64 * 5e-6).sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_number_from_mass() {
        let pellet = pellet();
        // 1e-15 m3 * 1000 kg/m3 = 1e-12 kg per particle
        assert_relative_eq!(pellet.number_from_mass(1.0), 1e9, max_relative = 1e-9);
    }

    #[test]
    fn test_degenerate_particle_has_no_number() {
        let mut pellet = pellet();
        pellet.density_kg_m3 = 0.0;
        assert_eq!(pellet.number_from_mass(5.0), 0.0);
    }

    #[test]
    fn test_shape_aliases() {
        let shape: Shape = serde_json::from_str(r#""fiber""#).unwrap();
        assert_eq!(shape, Shape::Fibre);
        let shape: Shape = serde_json::from_str(r#""fragment""#).unwrap();
        assert_eq!(shape, Shape::Pellet);
    }

    #[test]
    fn test_particle_starts_without_code() {
        let particle = Particle::new(pellet(), "freeMP", "Air", "Utopia");
        assert!(particle.code().is_none());
        assert!(particle.rate_constants().is_empty());
        assert_eq!(particle.label(), "mp3_freeMP_Air_Utopia");
    }
}
