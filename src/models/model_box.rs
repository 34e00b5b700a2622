//! Model boxes and inter-box connectivity

use crate::models::Compartment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One spatial unit world holding a set of compartments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBox {
    pub name: String,

    #[serde(default)]
    pub compartments: Vec<Compartment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_m3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_m: Option<f64>,
}

impl ModelBox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            compartments: Vec::new(),
            volume_m3: None,
            depth_m: None,
            length_m: None,
            width_m: None,
        }
    }

    pub fn with_compartment(mut self, compartment: Compartment) -> Self {
        self.compartments.push(compartment);
        self
    }

    pub fn with_dimensions(mut self, depth_m: f64, length_m: f64, width_m: f64) -> Self {
        self.depth_m = Some(depth_m);
        self.length_m = Some(length_m);
        self.width_m = Some(width_m);
        self
    }

    /// Compartment by name
    pub fn compartment(&self, name: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.name() == name)
    }

    /// Box volume (m3)
    ///
    /// Explicit volume, then depth * length * width, then the sum of the
    /// compartment volumes that can be resolved without the box volume.
    pub fn volume(&self) -> Option<f64> {
        if let Some(volume) = self.volume_m3 {
            return Some(volume);
        }
        if let (Some(d), Some(l), Some(w)) = (self.depth_m, self.length_m, self.width_m) {
            return Some(d * l * w);
        }
        if self.compartments.is_empty() {
            log::warn!("box '{}' has neither dimensions nor compartments", self.name);
            return None;
        }
        let mut total = 0.0;
        for compartment in &self.compartments {
            match compartment.volume_from_dimensions() {
                Some(volume) => total += volume,
                None => log::warn!(
                    "box '{}': volume of compartment '{}' is missing",
                    self.name,
                    compartment.name()
                ),
            }
        }
        Some(total)
    }

    /// Volume of one compartment of this box (m3)
    pub fn compartment_volume(&self, name: &str) -> Option<f64> {
        let compartment = self.compartment(name)?;
        compartment
            .volume_from_dimensions()
            .or_else(|| compartment.volume_m3(self.volume()))
    }
}

/// Inter-box connectivity: source box -> ordered receiving boxes
///
/// Vector-valued inter-box rates are indexed by the position of the
/// receiving box in its source's list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxFlows {
    targets: BTreeMap<String, Vec<String>>,
}

impl BoxFlows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection `from` -> `to`, appended to the receiving order
    pub fn connect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let to = to.into();
        let targets = self.targets.entry(from.into()).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
        self
    }

    /// Receiving boxes of `from`, in order
    pub fn targets(&self, from: &str) -> &[String] {
        self.targets.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Position of `to` among the receiving boxes of `from`
    pub fn position(&self, from: &str, to: &str) -> Option<usize> {
        self.targets(from).iter().position(|t| t == to)
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Every box named by a connection
    pub fn box_names(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .flat_map(|(from, to)| std::iter::once(from.as_str()).chain(to.iter().map(String::as_str)))
    }
}
