//! Species codes and the coding tables producing them
//!
//! A species code is the size symbol, the state symbol, the compartment
//! ordinal and the box name: `bA3_Utopia` is size class `b`, free state `A`,
//! compartment 3, box `Utopia`. Every adjacency question the matrix builder
//! asks is answered by comparing parts of two codes.

use crate::config::RunConfiguration;
use crate::error::{Result, UtopiaError};
use crate::models::{ModelContext, Particle};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// State symbols in state-table order
const STATE_SYMBOLS: [char; 4] = ['A', 'B', 'C', 'D'];

// =================================================================================================
// Species code
// =================================================================================================

/// Identity of one species
///
/// # Example
/// ```
/// use utopia_rs::assembly::SpeciesCode;
///
/// let code: SpeciesCode = "bA3_Utopia".parse().unwrap();
/// assert_eq!(code.size(), 'b');
/// assert_eq!(code.state(), 'A');
/// assert_eq!(code.compartment(), 3);
/// assert_eq!(code.box_name(), "Utopia");
/// assert_eq!(code.to_string(), "bA3_Utopia");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesCode {
    size: char,
    state: char,
    compartment: usize,
    box_name: String,
}

impl SpeciesCode {
    pub fn new(size: char, state: char, compartment: usize, box_name: impl Into<String>) -> Self {
        Self {
            size,
            state,
            compartment,
            box_name: box_name.into(),
        }
    }

    pub fn size(&self) -> char {
        self.size
    }

    pub fn state(&self) -> char {
        self.state
    }

    pub fn compartment(&self) -> usize {
        self.compartment
    }

    pub fn box_name(&self) -> &str {
        &self.box_name
    }

    /// Same compartment of the same box
    pub fn same_location(&self, other: &Self) -> bool {
        self.compartment == other.compartment && self.box_name == other.box_name
    }

    /// Same state, compartment and box
    pub fn same_except_size(&self, other: &Self) -> bool {
        self.state == other.state && self.same_location(other)
    }

    /// Same size and state
    pub fn same_particle(&self, other: &Self) -> bool {
        self.size == other.size && self.state == other.state
    }

    /// Same size, state and compartment, any box
    pub fn same_except_box(&self, other: &Self) -> bool {
        self.same_particle(other) && self.compartment == other.compartment
    }
}

impl fmt::Display for SpeciesCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}_{}", self.size, self.state, self.compartment, self.box_name)
    }
}

impl FromStr for SpeciesCode {
    type Err = UtopiaError;

    fn from_str(text: &str) -> Result<Self> {
        let invalid = |reason: &str| UtopiaError::InvalidSpeciesCode {
            code: text.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = text.chars();
        let size = chars
            .next()
            .filter(char::is_ascii_lowercase)
            .ok_or_else(|| invalid("expected a lowercase size symbol"))?;
        let state = chars
            .next()
            .filter(|c| STATE_SYMBOLS.contains(c))
            .ok_or_else(|| invalid("expected a state symbol A-D"))?;

        let rest = chars.as_str();
        let (ordinal, box_name) = rest
            .split_once('_')
            .ok_or_else(|| invalid("missing '_' before the box name"))?;
        if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a compartment ordinal"));
        }
        if box_name.is_empty() {
            return Err(invalid("empty box name"));
        }
        let compartment = ordinal
            .parse()
            .map_err(|_| invalid("compartment ordinal out of range"))?;

        Ok(Self::new(size, state, compartment, box_name))
    }
}

impl Serialize for SpeciesCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpeciesCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =================================================================================================
// Coding tables
// =================================================================================================

/// Immutable coding configuration of one run
#[derive(Debug, Clone, PartialEq)]
pub struct CodingTables {
    /// (base-name prefix, size symbol), smallest class first
    sizes: Vec<(String, char)>,

    /// State names, symbol = `A` + position
    states: Vec<String>,

    /// Compartment names, ordinal = position
    compartments: Vec<String>,

    boxes: Vec<String>,
}

impl CodingTables {
    /// Build tables from the run configuration and explicit name lists
    pub fn new(config: &RunConfiguration, compartments: Vec<String>, boxes: Vec<String>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sizes: config
                .size_classes
                .iter()
                .map(|s| (s.prefix.clone(), s.symbol))
                .collect(),
            states: config.states.clone(),
            compartments,
            boxes,
        })
    }

    /// Build tables for the compartments and boxes of a context
    pub fn from_context(config: &RunConfiguration, context: &ModelContext) -> Result<Self> {
        Self::new(config, context.compartment_names().to_vec(), context.box_names())
    }

    /// Size symbol for a base-name prefix
    pub fn size_symbol(&self, prefix: &str) -> Option<char> {
        self.sizes.iter().find(|(p, _)| p == prefix).map(|(_, s)| *s)
    }

    /// Ordinal of a size symbol, 0 = smallest
    pub fn size_ordinal(&self, symbol: char) -> Option<usize> {
        self.sizes.iter().position(|(_, s)| *s == symbol)
    }

    /// Size symbols, smallest first
    pub fn size_symbols(&self) -> Vec<char> {
        self.sizes.iter().map(|(_, s)| *s).collect()
    }

    /// State symbol for a state name
    pub fn state_symbol(&self, state: &str) -> Option<char> {
        self.states
            .iter()
            .position(|s| s == state)
            .and_then(|i| STATE_SYMBOLS.get(i).copied())
    }

    /// Compartment ordinal for a compartment name
    pub fn compartment_ordinal(&self, name: &str) -> Option<usize> {
        self.compartments.iter().position(|c| c == name)
    }

    /// Compartment name for an ordinal
    pub fn compartment_name(&self, ordinal: usize) -> Option<&str> {
        self.compartments.get(ordinal).map(String::as_str)
    }

    /// Code of one particle
    ///
    /// # Errors
    /// `KeyNotFound` naming the table, the missing key and the particle.
    pub fn code_for(&self, particle: &Particle) -> Result<SpeciesCode> {
        let missing = |table: &'static str, key: &str| UtopiaError::KeyNotFound {
            table,
            key: key.to_string(),
            particle: particle.label(),
        };

        let prefix = particle.properties.size_prefix();
        let size = self.size_symbol(prefix).ok_or_else(|| missing("size class", prefix))?;
        let state = self
            .state_symbol(&particle.state)
            .ok_or_else(|| missing("aggregation state", &particle.state))?;
        let compartment = self
            .compartment_ordinal(&particle.compartment)
            .ok_or_else(|| missing("compartment", &particle.compartment))?;
        if !self.boxes.iter().any(|b| *b == particle.box_name) {
            return Err(missing("box", &particle.box_name));
        }

        Ok(SpeciesCode::new(size, state, compartment, particle.box_name.clone()))
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParticleProperties;

    fn tables() -> CodingTables {
        CodingTables::new(
            &RunConfiguration::default(),
            vec!["Ocean_Surface_Water".into(), "Air".into()],
            vec!["Utopia".into()],
        )
        .unwrap()
    }

    fn particle(name: &str, state: &str, compartment: &str, box_name: &str) -> Particle {
        Particle::new(ParticleProperties::sphere(name, "PE", 980.0, 1.0), state, compartment, box_name)
    }

    #[test]
    fn test_code_for_particle() {
        let code = tables().code_for(&particle("mp2", "biofMP", "Air", "Utopia")).unwrap();
        assert_eq!(code.to_string(), "bC1_Utopia");
    }

    #[test]
    fn test_prefix_uses_first_three_characters() {
        let code = tables().code_for(&particle("mp5_PE", "freeMP", "Air", "Utopia")).unwrap();
        assert_eq!(code.size(), 'e');
    }

    #[test]
    fn test_unknown_keys_name_particle() {
        let t = tables();
        let err = t.code_for(&particle("mp9", "freeMP", "Air", "Utopia")).unwrap_err();
        assert!(matches!(err, UtopiaError::KeyNotFound { table: "size class", ref key, .. } if key == "mp9"));

        let err = t.code_for(&particle("mp1", "dissolved", "Air", "Utopia")).unwrap_err();
        assert!(err.to_string().contains("dissolved"));

        let err = t.code_for(&particle("mp1", "freeMP", "Mars", "Utopia")).unwrap_err();
        assert!(matches!(err, UtopiaError::KeyNotFound { table: "compartment", .. }));

        let err = t.code_for(&particle("mp1", "freeMP", "Air", "Atlantis")).unwrap_err();
        assert!(matches!(err, UtopiaError::KeyNotFound { table: "box", .. }));
    }

    #[test]
    fn test_parse_multi_digit_ordinal() {
        let code: SpeciesCode = "eD16_North_Sea".parse().unwrap();
        assert_eq!(code.compartment(), 16);
        assert_eq!(code.box_name(), "North_Sea");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in ["", "A", "aE1_Utopia", "aA_Utopia", "aA1", "aA1_", "Aa1_Utopia"] {
            assert!(text.parse::<SpeciesCode>().is_err(), "{text} should not parse");
        }
    }

    #[test]
    fn test_relations() {
        let a: SpeciesCode = "aA0_Utopia".parse().unwrap();
        let b: SpeciesCode = "bA0_Utopia".parse().unwrap();
        let c: SpeciesCode = "aC0_Utopia".parse().unwrap();
        let far: SpeciesCode = "aA0_Other".parse().unwrap();

        assert!(a.same_except_size(&b));
        assert!(a.same_location(&c) && !a.same_except_size(&c));
        assert!(a.same_except_box(&far) && !a.same_location(&far));
    }

    #[test]
    fn test_serde_as_string() {
        let code = SpeciesCode::new('c', 'B', 2, "Utopia");
        assert_eq!(serde_json::to_string(&code).unwrap(), r#""cB2_Utopia""#);
    }
}
