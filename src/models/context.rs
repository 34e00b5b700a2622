//! Run context and model input
//!
//! [`ModelContext`] is the read-only environment of one run: boxes, their
//! compartments and the inter-box connectivity. Species refer to it by
//! compartment and box name only. [`ModelInput`] is the JSON document the
//! context and the species list are built from.

use crate::config::RunConfiguration;
use crate::error::{Result, UtopiaError};
use crate::models::{BoxFlows, Compartment, Emissions, ModelBox, Particle, ParticleProperties};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// =================================================================================================
// Model context
// =================================================================================================

/// Environment of one run
#[derive(Debug, Clone)]
pub struct ModelContext {
    boxes: Vec<ModelBox>,
    box_flows: BoxFlows,

    /// Distinct compartment names in first-seen order; position = ordinal
    compartment_names: Vec<String>,
}

impl ModelContext {
    /// Build and check a context
    ///
    /// # Errors
    /// `InvalidConfiguration` on duplicate box or compartment names, on a
    /// connection toward a compartment missing from the box, or on a box
    /// flow naming an unknown box.
    pub fn new(boxes: Vec<ModelBox>, box_flows: BoxFlows) -> Result<Self> {
        let mut box_names = HashSet::new();
        let mut compartment_names: Vec<String> = Vec::new();

        for model_box in &boxes {
            if !box_names.insert(model_box.name.as_str()) {
                return Err(UtopiaError::config(format!("duplicate box '{}'", model_box.name)));
            }

            let mut local = HashSet::new();
            for compartment in &model_box.compartments {
                if !local.insert(compartment.name()) {
                    return Err(UtopiaError::config(format!(
                        "duplicate compartment '{}' in box '{}'",
                        compartment.name(),
                        model_box.name
                    )));
                }
                if !compartment_names.iter().any(|n| n == compartment.name()) {
                    compartment_names.push(compartment.name().to_string());
                }
            }

            for compartment in &model_box.compartments {
                for neighbour in compartment.connections().keys() {
                    if model_box.compartment(neighbour).is_none() {
                        return Err(UtopiaError::config(format!(
                            "compartment '{}' connects to '{}', absent from box '{}'",
                            compartment.name(),
                            neighbour,
                            model_box.name
                        )));
                    }
                }
            }
        }

        if let Some(unknown) = box_flows.box_names().find(|name| !box_names.contains(name)) {
            return Err(UtopiaError::config(format!("box flow names unknown box '{}'", unknown)));
        }

        log::debug!(
            "model context: {} boxes, {} distinct compartments",
            boxes.len(),
            compartment_names.len()
        );

        Ok(Self {
            boxes,
            box_flows,
            compartment_names,
        })
    }

    /// Single-box context without inter-box transport
    pub fn single(model_box: ModelBox) -> Result<Self> {
        Self::new(vec![model_box], BoxFlows::default())
    }

    pub fn boxes(&self) -> &[ModelBox] {
        &self.boxes
    }

    pub fn box_names(&self) -> Vec<String> {
        self.boxes.iter().map(|b| b.name.clone()).collect()
    }

    pub fn model_box(&self, name: &str) -> Option<&ModelBox> {
        self.boxes.iter().find(|b| b.name == name)
    }

    pub fn box_flows(&self) -> &BoxFlows {
        &self.box_flows
    }

    /// Distinct compartment names; the position is the compartment ordinal
    pub fn compartment_names(&self) -> &[String] {
        &self.compartment_names
    }

    /// Compartment `name` of box `box_name`
    pub fn compartment(&self, box_name: &str, name: &str) -> Option<&Compartment> {
        self.model_box(box_name)?.compartment(name)
    }

    /// Compartment holding `particle`
    pub fn compartment_of(&self, particle: &Particle) -> Option<&Compartment> {
        self.compartment(&particle.box_name, &particle.compartment)
    }

    /// Every compartment of every box
    pub fn compartments(&self) -> impl Iterator<Item = &Compartment> {
        self.boxes.iter().flat_map(|b| b.compartments.iter())
    }

    /// Volume of compartment `name` of box `box_name` (m3)
    pub fn compartment_volume(&self, box_name: &str, name: &str) -> Option<f64> {
        self.model_box(box_name)?.compartment_volume(name)
    }
}

// =================================================================================================
// Model input
// =================================================================================================

/// Model input document
///
/// One species is generated for every box, compartment, particle row and
/// aggregation state, in that nesting order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInput {
    pub boxes: Vec<ModelBox>,
    pub particles: Vec<ParticleProperties>,

    #[serde(default, skip_serializing_if = "BoxFlows::is_empty")]
    pub box_flows: BoxFlows,

    #[serde(default, skip_serializing_if = "Emissions::is_empty")]
    pub emissions: Emissions,
}

/// Result of [`ModelInput::build`]
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub context: ModelContext,
    pub particles: Vec<Particle>,
    pub emissions: Emissions,
}

impl ModelInput {
    /// Parse from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let input = Self::from_json(&contents)?;
        log::info!("Loaded model input from {:?}", path.as_ref());
        Ok(input)
    }

    /// Build the run context and the species list
    pub fn build(self, config: &RunConfiguration) -> Result<LoadedModel> {
        let mut particles = Vec::new();
        for model_box in &self.boxes {
            for compartment in &model_box.compartments {
                for properties in &self.particles {
                    for state in &config.states {
                        particles.push(Particle::new(
                            properties.clone(),
                            state.clone(),
                            compartment.name(),
                            model_box.name.clone(),
                        ));
                    }
                }
            }
        }

        let context = ModelContext::new(self.boxes, self.box_flows)?;
        log::info!("generated {} particle species", particles.len());

        Ok(LoadedModel {
            context,
            particles,
            emissions: self.emissions,
        })
    }
}
