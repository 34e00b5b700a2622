//! Rate-constant value types
//!
//! The formula library returns one of several shapes for a process: a plain
//! rate, a vector indexed by receiving size class, a size-distribution matrix
//! (fragmentation) or a mapping keyed by receiving compartment / sub-process.
//! [`RateValue`] stores all of them behind one tagged type so that the
//! elimination and matrix stages never inspect types at runtime.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Rate constant value of a single process for a single species (1/s)
///
/// # Shapes
///
/// - **Scalar**: one rate (settling, burial, discorporation, ...)
/// - **BySizeClass**: one rate per receiving size class (fragmentation) or
///   per receiving compartment in a fixed order (deposition, mixing, runoff)
/// - **SizeDistribution**: fragment size distribution matrix; only its first
///   row is used for transfers
/// - **ByLabel**: rates keyed by receiving compartment or sub-process
///
/// # Example
///
/// ```rust
/// use utopia_rs::physics::RateValue;
///
/// let fragmentation = RateValue::from_vec(vec![0.1, 0.05]);
/// assert_eq!(fragmentation.first(), 0.1);
/// assert!((fragmentation.total() - 0.15).abs() < 1e-12);
/// assert_eq!(fragmentation.receiving(1), Some(0.05));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RateValue {
    /// Single rate
    Scalar(f64),

    /// Ordered rates, index = receiving size class or receiving compartment
    BySizeClass(DVector<f64>),

    /// Fragment size distribution, one row per generation
    SizeDistribution(DMatrix<f64>),

    /// Rates keyed by label
    ByLabel(BTreeMap<String, f64>),
}

impl RateValue {

    // ======================================= constructors =======================================

    /// Create from scalar
    pub fn from_scalar(value: f64) -> Self {
        Self::Scalar(value)
    }

    /// Create from vector
    pub fn from_vec(values: Vec<f64>) -> Self {
        Self::BySizeClass(DVector::from_vec(values))
    }

    /// Create a size-distribution matrix from rows
    ///
    /// Returns `None` when the rows are empty or ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let ncols = rows.first()?.len();
        if rows.iter().any(|row| row.len() != ncols) {
            return None;
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Some(Self::SizeDistribution(DMatrix::from_row_slice(rows.len(), ncols, &flat)))
    }

    /// Create from label/value pairs
    pub fn from_labels<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self::ByLabel(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    // ========================================== Queries ==========================================

    /// Check value is scalar
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Check value is an ordered sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::BySizeClass(_))
    }

    /// Check value is a size-distribution matrix
    pub fn is_distribution(&self) -> bool {
        matches!(self, Self::SizeDistribution(_))
    }

    /// Check value is a labelled mapping
    pub fn is_labelled(&self) -> bool {
        matches!(self, Self::ByLabel(_))
    }

    /// Number of stored rates
    pub fn len(&self) -> usize {
        match self {
            RateValue::Scalar(_) => 1,
            RateValue::BySizeClass(v) => v.len(),
            RateValue::SizeDistribution(m) => m.len(),
            RateValue::ByLabel(map) => map.len(),
        }
    }

    /// Check emptiness
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ======================================== Extractions ========================================

    /// Try to extract as a scalar
    pub fn try_as_scalar(&self) -> Option<f64> {
        match self {
            RateValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to extract as a labelled mapping
    pub fn try_as_labels(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            RateValue::ByLabel(values) => Some(values),
            _ => None,
        }
    }

    /// Sum of every stored rate
    pub fn total(&self) -> f64 {
        match self {
            RateValue::Scalar(value) => *value,
            RateValue::BySizeClass(values) => values.sum(),
            RateValue::SizeDistribution(values) => values.sum(),
            RateValue::ByLabel(values) => values.values().sum(),
        }
    }

    /// First stored rate
    ///
    /// Scalars return themselves, sequences their element 0, matrices their
    /// `(0, 0)` element. Mappings have no order and return their total.
    pub fn first(&self) -> f64 {
        match self {
            RateValue::Scalar(value) => *value,
            RateValue::BySizeClass(values) => values.get(0).copied().unwrap_or(0.0),
            RateValue::SizeDistribution(values) => values.get((0, 0)).copied().unwrap_or(0.0),
            RateValue::ByLabel(values) => values.values().sum(),
        }
    }

    /// Rate for a receiving position
    ///
    /// Sequences are indexed directly; size-distribution matrices use their
    /// first row. Scalars and mappings have no positional meaning.
    pub fn receiving(&self, index: usize) -> Option<f64> {
        match self {
            RateValue::BySizeClass(values) => values.get(index).copied(),
            RateValue::SizeDistribution(values) => {
                if values.nrows() == 0 {
                    None
                } else {
                    values.get((0, index)).copied()
                }
            }
            RateValue::Scalar(_) | RateValue::ByLabel(_) => None,
        }
    }

    /// Rate stored under `label`
    pub fn label(&self, label: &str) -> Option<f64> {
        self.try_as_labels().and_then(|map| map.get(label).copied())
    }

    /// Check every stored rate is finite
    pub fn is_finite(&self) -> bool {
        match self {
            RateValue::Scalar(value) => value.is_finite(),
            RateValue::BySizeClass(values) => values.iter().all(|x| x.is_finite()),
            RateValue::SizeDistribution(values) => values.iter().all(|x| x.is_finite()),
            RateValue::ByLabel(values) => values.values().all(|x| x.is_finite()),
        }
    }
}

// ================================== Simple arithmetic functions ==================================

impl std::ops::Mul<f64> for RateValue {
    type Output = RateValue;
    fn mul(self, scalar: f64) -> Self::Output {
        match self {
            RateValue::Scalar(x) => RateValue::Scalar(x * scalar),
            RateValue::BySizeClass(x) => RateValue::BySizeClass(x * scalar),
            RateValue::SizeDistribution(x) => RateValue::SizeDistribution(x * scalar),
            RateValue::ByLabel(mut x) => {
                x.values_mut().for_each(|v| *v *= scalar);
                RateValue::ByLabel(x)
            }
        }
    }
}

impl std::ops::Mul<&RateValue> for f64 {
    type Output = RateValue;
    fn mul(self, rhs: &RateValue) -> Self::Output {
        rhs.clone() * self
    }
}

impl From<f64> for RateValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for RateValue {
    fn from(values: Vec<f64>) -> Self {
        Self::from_vec(values)
    }
}

// ======================== Serialization ============================

/// Plain JSON shapes: number, array, nested array, object
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawRateValue {
    Scalar(f64),
    Sequence(Vec<f64>),
    Nested(Vec<Vec<f64>>),
    Mapping(BTreeMap<String, f64>),
}

impl Serialize for RateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            RateValue::Scalar(value) => RawRateValue::Scalar(*value),
            RateValue::BySizeClass(values) => RawRateValue::Sequence(values.iter().copied().collect()),
            RateValue::SizeDistribution(values) => RawRateValue::Nested(
                values
                    .row_iter()
                    .map(|row| row.iter().copied().collect())
                    .collect(),
            ),
            RateValue::ByLabel(values) => RawRateValue::Mapping(values.clone()),
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawRateValue::deserialize(deserializer)? {
            RawRateValue::Scalar(value) => Ok(RateValue::Scalar(value)),
            RawRateValue::Sequence(values) => Ok(RateValue::from_vec(values)),
            RawRateValue::Nested(rows) => RateValue::from_rows(&rows)
                .ok_or_else(|| serde::de::Error::custom("size distribution rows must be non-empty and rectangular")),
            RawRateValue::Mapping(values) => Ok(RateValue::ByLabel(values)),
        }
    }
}

// ======================== Display ============================

impl fmt::Display for RateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateValue::Scalar(value) => write!(f, "Scalar ({})", value),
            RateValue::BySizeClass(values) => write!(f, "BySizeClass [{}]", values.len()),
            RateValue::SizeDistribution(values) => {
                write!(f, "SizeDistribution [{} * {}]", values.nrows(), values.ncols())
            }
            RateValue::ByLabel(values) => {
                let labels = values.keys().cloned().collect::<Vec<_>>().join(", ");
                write!(f, "ByLabel {{{}}}", labels)
            }
        }
    }
}

// ==================== Tests ====================
