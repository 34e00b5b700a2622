//! Run configuration
//!
//! Everything that is fixed for one run and shared by every stage: the state
//! and size coding tables, the receiving-compartment orders used to pick one
//! element out of vector-valued transport rates, the system boundaries of the
//! exposure indicators and the parallel assembly threshold.
//!
//! Defaults reproduce the UTOPIA model. A JSON file may override any subset
//! of the fields:
//!
//! ```json
//! {
//!   "states": ["freeMP", "heterMP", "biofMP", "heterBiofMP"],
//!   "excluded_compartments": ["Ocean_Column_Water", "Sediment_Ocean"],
//!   "parallel_threshold": 512
//! }
//! ```

use crate::error::{Result, UtopiaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Maximum number of aggregation states (`A`..`D`)
pub const MAX_STATES: usize = 4;

/// Maximum number of size classes (`a`..`e`)
pub const MAX_SIZE_CLASSES: usize = 5;

/// One entry of the size coding table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeClassCode {
    /// Particle base-name prefix (first three characters, e.g. `mp1`)
    pub prefix: String,

    /// Size symbol written into species codes
    pub symbol: char,
}

impl SizeClassCode {
    pub fn new(prefix: impl Into<String>, symbol: char) -> Self {
        Self {
            prefix: prefix.into(),
            symbol,
        }
    }
}

/// Run-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfiguration {
    /// Aggregation state names, coded `A`, `B`, `C`, `D` in this order
    pub states: Vec<String>,

    /// Size coding table, smallest class first
    pub size_classes: Vec<SizeClassCode>,

    /// Receiving order of deposition rate vectors
    pub surface_compartments: Vec<String>,

    /// Receiving order of mixing rate vectors
    pub mixing_targets: Vec<String>,

    /// Receiving order of runoff rate vectors
    pub runoff_targets: Vec<String>,

    /// Compartments outside the exposure-indicator boundaries
    pub excluded_compartments: Vec<String>,

    /// Compartment whose deep-ocean exchange counts as a system exit
    pub ocean_mixed_water: String,

    /// Deep compartment exchanging with `ocean_mixed_water`
    pub ocean_column_water: String,

    /// Species count above which matrix columns are built in parallel
    pub parallel_threshold: usize,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            states: ["freeMP", "heterMP", "biofMP", "heterBiofMP"]
                .into_iter()
                .map(String::from)
                .collect(),
            size_classes: vec![
                SizeClassCode::new("mp1", 'a'),
                SizeClassCode::new("mp2", 'b'),
                SizeClassCode::new("mp3", 'c'),
                SizeClassCode::new("mp4", 'd'),
                SizeClassCode::new("mp5", 'e'),
            ],
            surface_compartments: [
                "Ocean_Surface_Water",
                "Coast_Surface_Water",
                "Surface_Freshwater",
                "Beaches_Soil_Surface",
                "Background_Soil_Surface",
                "Impacted_Soil_Surface",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            mixing_targets: vec!["Ocean_Surface_Water".into(), "Ocean_Column_Water".into()],
            runoff_targets: vec!["Coast_Surface_Water".into(), "Surface_Freshwater".into()],
            excluded_compartments: vec!["Ocean_Column_Water".into(), "Sediment_Ocean".into()],
            ocean_mixed_water: "Ocean_Mixed_Water".into(),
            ocean_column_water: "Ocean_Column_Water".into(),
            parallel_threshold: 256,
        }
    }
}

impl RunConfiguration {
    /// Load from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        log::info!("Loaded run configuration from {:?}", path.as_ref());
        Ok(config)
    }

    /// Load from a JSON file, falling back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path.as_ref()) {
            Ok(config) => config,
            Err(UtopiaError::Io(_)) => {
                log::info!("Run configuration {:?} not found, using defaults", path.as_ref());
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load run configuration: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Check table sizes and uniqueness
    pub fn validate(&self) -> Result<()> {
        if self.states.is_empty() || self.states.len() > MAX_STATES {
            return Err(UtopiaError::config(format!(
                "expected 1 to {} aggregation states, got {}",
                MAX_STATES,
                self.states.len()
            )));
        }
        if self.size_classes.is_empty() || self.size_classes.len() > MAX_SIZE_CLASSES {
            return Err(UtopiaError::config(format!(
                "expected 1 to {} size classes, got {}",
                MAX_SIZE_CLASSES,
                self.size_classes.len()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(state) = self.states.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(UtopiaError::config(format!("duplicate state '{}'", state)));
        }

        let mut prefixes = HashSet::new();
        let mut symbols = HashSet::new();
        for size in &self.size_classes {
            if !prefixes.insert(size.prefix.as_str()) {
                return Err(UtopiaError::config(format!("duplicate size prefix '{}'", size.prefix)));
            }
            if !symbols.insert(size.symbol) || !size.symbol.is_ascii_lowercase() {
                return Err(UtopiaError::config(format!(
                    "size symbol '{}' must be a unique lowercase letter",
                    size.symbol
                )));
            }
        }
        Ok(())
    }

    /// Check a compartment lies inside the exposure-indicator boundaries
    pub fn in_scope(&self, compartment: &str) -> bool {
        !self.excluded_compartments.iter().any(|c| c == compartment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = RunConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.states.len(), 4);
        assert_eq!(config.size_classes[4].symbol, 'e');
        assert!(!config.in_scope("Sediment_Ocean"));
        assert!(config.in_scope("Air"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "parallel_threshold": 8 }}"#).unwrap();

        let config = RunConfiguration::from_file(file.path()).unwrap();
        assert_eq!(config.parallel_threshold, 8);
        assert_eq!(config.ocean_mixed_water, "Ocean_Mixed_Water");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = RunConfiguration::load_or_default("/nonexistent/utopia.json");
        assert_eq!(config, RunConfiguration::default());
    }

    #[test]
    fn test_too_many_states_rejected() {
        let config = RunConfiguration {
            states: (0..5).map(|i| format!("s{i}")).collect(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(UtopiaError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let config = RunConfiguration {
            size_classes: vec![SizeClassCode::new("mp1", 'a'), SizeClassCode::new("mp2", 'a')],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
