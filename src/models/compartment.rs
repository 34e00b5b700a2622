//! Environmental compartments
//!
//! A compartment is one well-mixed environmental medium of a box (a water
//! layer, a soil layer, a sediment, the air). Its type fixes the default list
//! of processes acting on the particles it holds; its connections list the
//! transport processes carrying particles to neighbouring compartments of the
//! same box.

use crate::physics::Process;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

// =================================================================================================
// Compartment type
// =================================================================================================

/// Compartment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompartmentType {
    #[serde(rename = "water")]
    Water,

    #[serde(rename = "surfaceSea_water", alias = "surface_sea_water")]
    SurfaceSeaWater,

    #[serde(rename = "sediment")]
    Sediment,

    #[serde(rename = "soil_surface")]
    SoilSurface,

    #[serde(rename = "deep_soil")]
    DeepSoil,

    #[serde(rename = "air")]
    Air,
}

impl CompartmentType {
    /// Processes acting in a compartment of this type unless overridden
    pub fn default_processes(&self) -> Vec<Process> {
        use Process::*;
        let water = vec![
            Discorporation,
            Fragmentation,
            Heteroaggregation,
            HeteroaggregateBreakup,
            Biofouling,
            Defouling,
            AdvectiveTransport,
            Settling,
            Rising,
            Mixing,
        ];
        match self {
            CompartmentType::Water => water,
            CompartmentType::SurfaceSeaWater => {
                let mut processes = water;
                processes.extend([SeaSprayAerosol, Beaching]);
                processes
            }
            CompartmentType::Sediment => vec![
                Discorporation,
                Fragmentation,
                SedimentResuspension,
                Burial,
            ],
            CompartmentType::SoilSurface => vec![
                Discorporation,
                Fragmentation,
                RunoffTransport,
                Percolation,
                SoilAirResuspension,
                SoilConvection,
            ],
            CompartmentType::DeepSoil => vec![
                Discorporation,
                Fragmentation,
                SequestrationDeepSoils,
                SoilConvection,
            ],
            CompartmentType::Air => vec![
                Discorporation,
                Fragmentation,
                WindTransport,
                DryDeposition,
                WetDeposition,
            ],
        }
    }
}

// =================================================================================================
// Transport edge
// =================================================================================================

/// Transport processes along one connection, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEdge {
    labels: Vec<Process>,
}

impl TransportEdge {
    pub fn new(labels: Vec<Process>) -> Self {
        Self { labels }
    }

    pub fn single(process: Process) -> Self {
        Self {
            labels: vec![process],
        }
    }

    pub fn labels(&self) -> &[Process] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl From<Process> for TransportEdge {
    fn from(process: Process) -> Self {
        Self::single(process)
    }
}

impl From<Vec<Process>> for TransportEdge {
    fn from(labels: Vec<Process>) -> Self {
        Self::new(labels)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEdge {
    One(Process),
    Many(Vec<Process>),
}

impl Serialize for TransportEdge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.labels.as_slice() {
            [one] => RawEdge::One(*one).serialize(serializer),
            many => RawEdge::Many(many.to_vec()).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TransportEdge {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawEdge::deserialize(deserializer)? {
            RawEdge::One(process) => TransportEdge::single(process),
            RawEdge::Many(labels) => TransportEdge::new(labels),
        })
    }
}

// =================================================================================================
// Compartment
// =================================================================================================

/// One compartment of a box
///
/// # Example
/// ```
/// use utopia_rs::models::{Compartment, CompartmentType};
/// use utopia_rs::physics::Process;
///
/// let soil = Compartment::new("Impacted_Soil_Surface", CompartmentType::SoilSurface)
///     .with_dimensions(0.1, 1000.0, 1000.0)
///     .connect("Surface_Freshwater", Process::RunoffTransport);
///
/// assert!(soil.lists(Process::Percolation));
/// assert_eq!(soil.volume_m3(None), Some(100_000.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    name: String,

    #[serde(rename = "type")]
    kind: CompartmentType,

    /// Explicit process list, replaces the type default when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    processes: Option<Vec<Process>>,

    /// Neighbour name -> transport processes
    #[serde(default, alias = "connexions")]
    connections: BTreeMap<String, TransportEdge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_m3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_area_m2: Option<f64>,

    /// Fraction of the box volume, used when no volume or dimensions are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_fraction: Option<f64>,

    /// Environmental parameters read by rate formulas (SPM, temperature, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, f64>,
}

impl Compartment {
    pub fn new(name: impl Into<String>, kind: CompartmentType) -> Self {
        Self {
            name: name.into(),
            kind,
            processes: None,
            connections: BTreeMap::new(),
            volume_m3: None,
            depth_m: None,
            length_m: None,
            width_m: None,
            surface_area_m2: None,
            volume_fraction: None,
            parameters: BTreeMap::new(),
        }
    }

    /// Replace the default process list
    pub fn with_processes(mut self, processes: Vec<Process>) -> Self {
        self.processes = Some(processes);
        self
    }

    /// Add a transport edge toward `neighbour`
    pub fn connect(mut self, neighbour: impl Into<String>, edge: impl Into<TransportEdge>) -> Self {
        self.connections.insert(neighbour.into(), edge.into());
        self
    }

    pub fn with_volume(mut self, volume_m3: f64) -> Self {
        self.volume_m3 = Some(volume_m3);
        self
    }

    pub fn with_dimensions(mut self, depth_m: f64, length_m: f64, width_m: f64) -> Self {
        self.depth_m = Some(depth_m);
        self.length_m = Some(length_m);
        self.width_m = Some(width_m);
        self
    }

    pub fn with_volume_fraction(mut self, fraction: f64) -> Self {
        self.volume_fraction = Some(fraction);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CompartmentType {
        self.kind
    }

    /// Processes acting in this compartment
    pub fn processes(&self) -> Vec<Process> {
        self.processes
            .clone()
            .unwrap_or_else(|| self.kind.default_processes())
    }

    /// Check `process` acts in this compartment
    pub fn lists(&self, process: Process) -> bool {
        match &self.processes {
            Some(processes) => processes.contains(&process),
            None => self.kind.default_processes().contains(&process),
        }
    }

    /// Transport edges, keyed by neighbour name
    pub fn connections(&self) -> &BTreeMap<String, TransportEdge> {
        &self.connections
    }

    /// Edge toward `neighbour`, if connected
    pub fn edge_to(&self, neighbour: &str) -> Option<&TransportEdge> {
        self.connections.get(neighbour)
    }

    /// Environmental parameter
    pub fn parameter(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).copied()
    }

    /// Volume from dimensions only
    pub fn volume_from_dimensions(&self) -> Option<f64> {
        self.volume_m3
            .or_else(|| Some(self.depth_m? * self.length_m? * self.width_m?))
    }

    /// Volume (m3)
    ///
    /// Resolution order: explicit volume, depth * length * width, box volume
    /// times the compartment's volume fraction.
    pub fn volume_m3(&self, box_volume_m3: Option<f64>) -> Option<f64> {
        self.volume_from_dimensions()
            .or_else(|| Some(box_volume_m3? * self.volume_fraction?))
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_process_lists() {
        let surface = CompartmentType::SurfaceSeaWater.default_processes();
        assert_eq!(surface.len(), 12);
        assert!(surface.contains(&Process::Beaching));

        let deep = CompartmentType::DeepSoil.default_processes();
        assert!(deep.contains(&Process::SequestrationDeepSoils));
        assert!(!deep.contains(&Process::Burial));

        assert!(CompartmentType::Air.default_processes().contains(&Process::WetDeposition));
    }

    #[test]
    fn test_explicit_processes_override_type() {
        let water = Compartment::new("Bulk_Freshwater", CompartmentType::Water)
            .with_processes(vec![Process::Discorporation]);
        assert!(water.lists(Process::Discorporation));
        assert!(!water.lists(Process::Settling));
    }

    #[test]
    fn test_volume_resolution() {
        let direct = Compartment::new("Air", CompartmentType::Air).with_volume(5.0);
        assert_eq!(direct.volume_m3(Some(100.0)), Some(5.0));

        let fraction = Compartment::new("Air", CompartmentType::Air).with_volume_fraction(0.25);
        assert_eq!(fraction.volume_m3(Some(100.0)), Some(25.0));
        assert_eq!(fraction.volume_m3(None), None);
    }

    #[test]
    fn test_json_with_aliases() {
        let json = r#"{
            "name": "Ocean_Mixed_Water",
            "type": "water",
            "connexions": {
                "Ocean_Surface_Water": "rising",
                "Ocean_Column_Water": ["settling", "mixing"]
            },
            "processes": ["discorporation", "heteroaggregate_breackup"]
        }"#;
        let compartment: Compartment = serde_json::from_str(json).unwrap();
        assert!(compartment.lists(Process::HeteroaggregateBreakup));
        assert_eq!(
            compartment.edge_to("Ocean_Column_Water").unwrap().labels(),
            &[Process::Settling, Process::Mixing]
        );
        assert_eq!(
            compartment.edge_to("Ocean_Surface_Water").unwrap().labels(),
            &[Process::Rising]
        );
    }

    #[test]
    fn test_edge_serializes_compactly() {
        let single = serde_json::to_string(&TransportEdge::single(Process::Burial)).unwrap();
        assert_eq!(single, r#""burial""#);
    }
}
