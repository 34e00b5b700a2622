//! Process vocabulary and the rate-constant formula seam
//!
//! This module defines the core API between the pipeline and the physics:
//! - `Process`: closed vocabulary of transformation and transport processes
//! - `RateConstants`: per-species mapping `"k_" + process` -> rate value
//! - `RateFormula`: trait for rate-constant formula libraries
//! - `FormulaTable`: dispatch table implementation validated at load time

use crate::error::{Result, UtopiaError};
use crate::models::{ModelContext, Particle};
use crate::physics::RateValue;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

// =================================================================================================
// Processes (Type-safe Identifiers)
// =================================================================================================

/// Known fate processes
///
/// Variants are ordered; every mapping keyed by `Process` iterates in this
/// order, which keeps rate assembly and exports deterministic.
///
/// # Names
///
/// Each process has one canonical snake_case name used on the wire as
/// `"k_" + name`. Two historical misspellings are accepted when parsing
/// (`heteroaggregate_breackup`, `wind_trasport`).
///
/// # Example
/// ```
/// use utopia_rs::physics::Process;
///
/// let process: Process = "k_settling".parse().unwrap();
/// assert_eq!(process, Process::Settling);
/// assert_eq!(process.key(), "k_settling");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Process {
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
    SeaSprayAerosol,
    Beaching,
    SedimentResuspension,
    Burial,
    SedimentTransport,
    RunoffTransport,
    Percolation,
    SoilAirResuspension,
    SoilConvection,
    SequestrationDeepSoils,
    WindTransport,
    DryDeposition,
    WetDeposition,
}

impl Process {
    /// Every process, in mapping order
    pub const ALL: [Process; 23] = [
        Process::Discorporation,
        Process::Fragmentation,
        Process::Heteroaggregation,
        Process::HeteroaggregateBreakup,
        Process::Biofouling,
        Process::Defouling,
        Process::AdvectiveTransport,
        Process::Settling,
        Process::Rising,
        Process::Mixing,
        Process::SeaSprayAerosol,
        Process::Beaching,
        Process::SedimentResuspension,
        Process::Burial,
        Process::SedimentTransport,
        Process::RunoffTransport,
        Process::Percolation,
        Process::SoilAirResuspension,
        Process::SoilConvection,
        Process::SequestrationDeepSoils,
        Process::WindTransport,
        Process::DryDeposition,
        Process::WetDeposition,
    ];

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Process::Discorporation => "discorporation",
            Process::Fragmentation => "fragmentation",
            Process::Heteroaggregation => "heteroaggregation",
            Process::HeteroaggregateBreakup => "heteroaggregate_breakup",
            Process::Biofouling => "biofouling",
            Process::Defouling => "defouling",
            Process::AdvectiveTransport => "advective_transport",
            Process::Settling => "settling",
            Process::Rising => "rising",
            Process::Mixing => "mixing",
            Process::SeaSprayAerosol => "sea_spray_aerosol",
            Process::Beaching => "beaching",
            Process::SedimentResuspension => "sediment_resuspension",
            Process::Burial => "burial",
            Process::SedimentTransport => "sediment_transport",
            Process::RunoffTransport => "runoff_transport",
            Process::Percolation => "percolation",
            Process::SoilAirResuspension => "soil_air_resuspension",
            Process::SoilConvection => "soil_convection",
            Process::SequestrationDeepSoils => "sequestration_deep_soils",
            Process::WindTransport => "wind_transport",
            Process::DryDeposition => "dry_deposition",
            Process::WetDeposition => "wet_deposition",
        }
    }

    /// Wire key (`"k_" + name`)
    pub fn key(&self) -> String {
        format!("k_{}", self.name())
    }

    /// Parse a wire key, with or without the `k_` prefix
    pub fn from_key(key: &str) -> Result<Self> {
        key.parse()
    }

    /// Check whether the process moves mass between compartments
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Process::AdvectiveTransport
                | Process::Settling
                | Process::Rising
                | Process::Mixing
                | Process::SeaSprayAerosol
                | Process::Beaching
                | Process::SedimentResuspension
                | Process::SedimentTransport
                | Process::RunoffTransport
                | Process::Percolation
                | Process::SoilAirResuspension
                | Process::SoilConvection
                | Process::WindTransport
                | Process::DryDeposition
                | Process::WetDeposition
        )
    }
}

impl FromStr for Process {
    type Err = UtopiaError;

    fn from_str(text: &str) -> Result<Self> {
        let name = text.strip_prefix("k_").unwrap_or(text);
        match name {
            "heteroaggregate_breackup" => return Ok(Process::HeteroaggregateBreakup),
            "wind_trasport" => return Ok(Process::WindTransport),
            _ => {}
        }
        Process::ALL
            .iter()
            .copied()
            .find(|process| process.name() == name)
            .ok_or_else(|| UtopiaError::UnknownProcess(text.to_string()))
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Process {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Process {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =================================================================================================
// Rate constants (per-species mapping)
// =================================================================================================

/// Rate constants of one species
///
/// Holds one entry per process listed by the species' compartment. An entry
/// may be `None` when the formula library reports the process as not
/// applicable; such entries count as zero everywhere.
///
/// # Example
/// ```
/// use utopia_rs::physics::{Process, RateConstants, RateValue};
///
/// let mut rates = RateConstants::new();
/// rates.insert(Process::Settling, Some(RateValue::from_scalar(1e-5)));
/// rates.insert(Process::Beaching, None);
///
/// assert!(rates.contains(Process::Beaching));
/// assert!(rates.get(Process::Beaching).is_none());
/// assert_eq!(rates.keys(), vec!["k_settling", "k_beaching"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateConstants {
    values: BTreeMap<Process, Option<RateValue>>,
}

impl RateConstants {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a rate
    pub fn insert(&mut self, process: Process, value: Option<RateValue>) {
        self.values.insert(process, value);
    }

    /// Get a rate; null entries read as absent
    pub fn get(&self, process: Process) -> Option<&RateValue> {
        self.values.get(&process).and_then(Option::as_ref)
    }

    /// Check a process has an entry, null or not
    pub fn contains(&self, process: Process) -> bool {
        self.values.contains_key(&process)
    }

    /// Processes with an entry
    pub fn processes(&self) -> impl Iterator<Item = Process> + '_ {
        self.values.keys().copied()
    }

    /// Iterate over entries in process order
    pub fn iter(&self) -> impl Iterator<Item = (Process, Option<&RateValue>)> {
        self.values.iter().map(|(p, v)| (*p, v.as_ref()))
    }

    /// Wire keys in process order
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().map(Process::key).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Process, Option<RateValue>)> for RateConstants {
    fn from_iter<I: IntoIterator<Item = (Process, Option<RateValue>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Serialize for RateConstants {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (process, value) in &self.values {
            map.serialize_entry(&process.key(), value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RateConstants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<RateValue>>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| {
                Process::from_key(&key)
                    .map(|process| (process, value))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}

// =================================================================================================
// Rate formula trait
// =================================================================================================

/// Trait for rate-constant formula libraries
///
/// # Responsibility
/// Computes the rate constant of one process for one particle species.
/// Does NOT decide which processes apply (the compartment's process list
/// does) nor where the mass goes (the matrix builder does).
///
/// # Return value
/// - `Ok(Some(value))`: rate in any [`RateValue`] shape
/// - `Ok(None)`: process not applicable to this particle, counts as zero
/// - `Err(reason)`: formula failure; the assembler wraps it with the process
///   name and species code
pub trait RateFormula: Send + Sync {
    /// Compute one rate constant
    fn compute(
        &self,
        process: Process,
        particle: &Particle,
        context: &ModelContext,
    ) -> std::result::Result<Option<RateValue>, String>;

    /// Check a handler exists for `process`
    fn supports(&self, _process: Process) -> bool {
        true
    }

    /// Library name
    fn name(&self) -> &str;
}

/// Handler signature stored in a [`FormulaTable`]
pub type FormulaHandler =
    Box<dyn Fn(&Particle, &ModelContext) -> std::result::Result<Option<RateValue>, String> + Send + Sync>;

/// Fixed dispatch table process -> handler
///
/// # Example
/// ```
/// use utopia_rs::physics::{FormulaTable, Process, RateValue};
///
/// let formulas = FormulaTable::new("constant")
///     .with(Process::Discorporation, |_, _| Ok(Some(RateValue::from_scalar(1e-9))))
///     .with(Process::Settling, |_, _| Ok(None));
///
/// assert_eq!(formulas.len(), 2);
/// ```
pub struct FormulaTable {
    name: String,
    handlers: HashMap<Process, FormulaHandler>,
}

impl FormulaTable {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    /// Register a handler (builder style)
    pub fn with<F>(mut self, process: Process, handler: F) -> Self
    where
        F: Fn(&Particle, &ModelContext) -> std::result::Result<Option<RateValue>, String>
            + Send
            + Sync
            + 'static,
    {
        self.register(process, handler);
        self
    }

    /// Register a handler, replacing any previous one
    pub fn register<F>(&mut self, process: Process, handler: F)
    where
        F: Fn(&Particle, &ModelContext) -> std::result::Result<Option<RateValue>, String>
            + Send
            + Sync
            + 'static,
    {
        if self.handlers.insert(process, Box::new(handler)).is_some() {
            log::debug!("formula table '{}': handler for {} replaced", self.name, process);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Check every process listed by a compartment of `context` has a handler
    ///
    /// # Errors
    /// `InvalidConfiguration` naming the first missing process and the
    /// compartment listing it.
    pub fn validate(&self, context: &ModelContext) -> Result<()> {
        for compartment in context.compartments() {
            for process in compartment.processes() {
                if !self.handlers.contains_key(&process) {
                    return Err(UtopiaError::config(format!(
                        "no formula registered for '{}' listed by compartment '{}'",
                        process,
                        compartment.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl RateFormula for FormulaTable {
    fn compute(
        &self,
        process: Process,
        particle: &Particle,
        context: &ModelContext,
    ) -> std::result::Result<Option<RateValue>, String> {
        match self.handlers.get(&process) {
            Some(handler) => handler(particle, context),
            None => Err(format!("no formula registered in '{}'", self.name)),
        }
    }

    fn supports(&self, process: Process) -> bool {
        self.handlers.contains_key(&process)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for FormulaTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut processes: Vec<_> = self.handlers.keys().copied().collect();
        processes.sort();
        f.debug_struct("FormulaTable")
            .field("name", &self.name)
            .field("processes", &processes)
            .finish()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_parses_back() {
        for process in Process::ALL {
            assert_eq!(process.name().parse::<Process>().unwrap(), process);
            assert_eq!(Process::from_key(&process.key()).unwrap(), process);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(
            "heteroaggregate_breackup".parse::<Process>().unwrap(),
            Process::HeteroaggregateBreakup
        );
        assert_eq!("k_wind_trasport".parse::<Process>().unwrap(), Process::WindTransport);
    }

    #[test]
    fn test_unknown_process() {
        let err = "photolysis".parse::<Process>().unwrap_err();
        assert!(matches!(err, UtopiaError::UnknownProcess(name) if name == "photolysis"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(Process::Mixing.is_transport());
        assert!(!Process::Discorporation.is_transport());
        assert!(!Process::Biofouling.is_transport());
    }

    #[test]
    fn test_rate_constants_order_is_deterministic() {
        let mut rates = RateConstants::new();
        rates.insert(Process::Rising, Some(RateValue::from_scalar(2.0)));
        rates.insert(Process::Discorporation, Some(RateValue::from_scalar(1.0)));
        assert_eq!(rates.keys(), vec!["k_discorporation", "k_rising"]);
    }

    #[test]
    fn test_rate_constants_json_keys() {
        let mut rates = RateConstants::new();
        rates.insert(Process::Fragmentation, Some(RateValue::from_vec(vec![0.1, 0.05])));
        rates.insert(Process::Burial, None);

        let text = serde_json::to_string(&rates).unwrap();
        assert_eq!(text, r#"{"k_fragmentation":[0.1,0.05],"k_burial":null}"#);

        let back: RateConstants = serde_json::from_str(&text).unwrap();
        assert_eq!(back, rates);
    }

    #[test]
    fn test_rate_constants_reject_unknown_key() {
        let result: std::result::Result<RateConstants, _> = serde_json::from_str(r#"{"k_magic": 1.0}"#);
        assert!(result.is_err());
    }
}
