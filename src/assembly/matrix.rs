//! Transition matrix construction
//!
//! # Layout
//!
//! The matrix is square, one row and one column per species in registry
//! order. Entry `(destination, source)` is the first-order rate (1/s) at
//! which mass of the source species becomes mass of the destination species;
//! the diagonal holds the elimination rate of each species.
//!
//! ```text
//!              source j
//!            ┌───────────────┐
//!            │ -Σk_j   ...   │
//! dest i     │  k_ji  -Σk_i  │     dm/dt = K · m + e
//!            └───────────────┘
//! ```
//!
//! # Pair classification
//!
//! For an ordered pair (source, destination) of distinct species:
//!
//! | Relation                                   | Process                              |
//! |--------------------------------------------|--------------------------------------|
//! | same compartment and state, other size     | fragmentation                        |
//! | same compartment and size, other state     | heteroaggregation / breakup / (de)fouling |
//! | connected compartments, same size and state| transport labels of the edge         |
//! | other box, same code modulo box            | advective or sediment transport      |
//! | anything else                              | none                                 |
//!
//! Only the source's rate constants and the source compartment's edges are
//! read, so every column can be built independently.

use crate::assembly::elimination::{elimination_rate, elimination_rates};
use crate::assembly::{CodingTables, SpeciesCode, SpeciesRegistry};
use crate::config::RunConfiguration;
use crate::error::{Result, UtopiaError};
use crate::models::{Compartment, CompartmentType, ModelContext, Particle};
use crate::physics::{Process, RateValue};
use nalgebra::{DMatrix, DVector};

// =================================================================================================
// Transition matrix
// =================================================================================================

/// Dense species x species rate matrix, `matrix[destination][source]`
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    codes: Vec<SpeciesCode>,
    values: DMatrix<f64>,
}

impl TransitionMatrix {
    /// Wrap a matrix whose rows and columns follow `codes`
    pub fn new(codes: Vec<SpeciesCode>, values: DMatrix<f64>) -> Result<Self> {
        if values.nrows() != codes.len() || values.ncols() != codes.len() {
            return Err(UtopiaError::config(format!(
                "matrix is {}x{} for {} species",
                values.nrows(),
                values.ncols(),
                codes.len()
            )));
        }
        Ok(Self { codes, values })
    }

    /// Number of species
    pub fn dimension(&self) -> usize {
        self.codes.len()
    }

    /// Row and column labels
    pub fn codes(&self) -> &[SpeciesCode] {
        &self.codes
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn into_inner(self) -> DMatrix<f64> {
        self.values
    }

    /// Entry by position
    pub fn get(&self, destination: usize, source: usize) -> f64 {
        self.values[(destination, source)]
    }

    /// Entry by species code
    pub fn rate(&self, destination: &SpeciesCode, source: &SpeciesCode) -> Option<f64> {
        let d = self.codes.iter().position(|c| c == destination)?;
        let s = self.codes.iter().position(|c| c == source)?;
        Some(self.get(d, s))
    }

    pub fn diagonal(&self) -> DVector<f64> {
        self.values.diagonal()
    }

    /// Sum of each column
    ///
    /// A column sums to minus the mass leaving the system from that species
    /// when every process of the species has a destination.
    pub fn column_sums(&self) -> DVector<f64> {
        DVector::from_iterator(self.dimension(), self.values.column_iter().map(|c| c.sum()))
    }
}

// =================================================================================================
// Builder
// =================================================================================================

/// Classifies species pairs and assembles the transition matrix
pub struct MatrixBuilder<'a> {
    context: &'a ModelContext,
    registry: &'a SpeciesRegistry,
    tables: &'a CodingTables,
    config: &'a RunConfiguration,
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(
        context: &'a ModelContext,
        registry: &'a SpeciesRegistry,
        tables: &'a CodingTables,
        config: &'a RunConfiguration,
    ) -> Self {
        Self {
            context,
            registry,
            tables,
            config,
        }
    }

    /// Species the builder indexes
    pub fn registry(&self) -> &'a SpeciesRegistry {
        self.registry
    }

    pub fn context(&self) -> &'a ModelContext {
        self.context
    }

    /// Process contributions to the transfer `source` -> `destination`
    ///
    /// Positions are registry indices. Returns no contribution for the
    /// diagonal and for unrelated pairs; zero-valued contributions are kept.
    ///
    /// # Errors
    /// `StructuralResolution` naming both codes.
    pub fn contributions(&self, source: usize, destination: usize) -> Result<Vec<(Process, f64)>> {
        let mut out = Vec::new();
        self.visit(source, destination, &mut |process, rate| out.push((process, rate)))?;
        Ok(out)
    }

    /// Transfer rate `source` -> `destination` (the diagonal is the elimination rate)
    pub fn rate(&self, source: usize, destination: usize) -> Result<f64> {
        if source == destination {
            return Ok(elimination_rate(self.registry.particles()[source].rate_constants()));
        }
        let mut total = 0.0;
        self.visit(source, destination, &mut |_, rate| total += rate)?;
        Ok(total)
    }

    /// Build the whole matrix
    ///
    /// Any structural error aborts the build.
    pub fn build(&self) -> Result<TransitionMatrix> {
        let n = self.registry.len();
        log::info!("building {n}x{n} transition matrix");

        let diagonal = elimination_rates(self.registry);

        // One column per source species; columns are independent.
        let compute_column = |j: usize| -> Result<Vec<f64>> {
            let mut column = vec![0.0; n];
            for (i, entry) in column.iter_mut().enumerate() {
                *entry = if i == j {
                    diagonal[j]
                } else {
                    let mut total = 0.0;
                    self.visit(j, i, &mut |_, rate| total += rate)?;
                    total
                };
            }
            Ok(column)
        };

        let columns: Vec<Vec<f64>> = if n > self.config.parallel_threshold {
            #[cfg(feature = "parallel")]
            {
                use rayon::prelude::*;
                (0..n).into_par_iter().map(compute_column).collect::<Result<_>>()?
            }
            #[cfg(not(feature = "parallel"))]
            {
                (0..n).map(compute_column).collect::<Result<_>>()?
            }
        } else {
            (0..n).map(compute_column).collect::<Result<_>>()?
        };

        let mut values = DMatrix::zeros(n, n);
        for (j, column) in columns.into_iter().enumerate() {
            for (i, rate) in column.into_iter().enumerate() {
                values[(i, j)] = rate;
            }
        }

        log::debug!(
            "transition matrix: {} non-zero entries",
            values.iter().filter(|v| **v != 0.0).count()
        );
        TransitionMatrix::new(self.registry.codes().to_vec(), values)
    }

    // ======================================== Classification ========================================

    fn visit(&self, source: usize, destination: usize, emit: &mut dyn FnMut(Process, f64)) -> Result<()> {
        if source == destination {
            return Ok(());
        }
        let codes = self.registry.codes();
        let (cs, cd) = (&codes[source], &codes[destination]);
        let particles = self.registry.particles();
        let (ps, pd) = (&particles[source], &particles[destination]);

        if cs.box_name() == cd.box_name() {
            if cs.same_location(cd) {
                self.within_compartment(cs, cd, ps, emit)
            } else {
                self.between_compartments(cs, cd, ps, pd, emit)
            }
        } else if cs.same_except_box(cd) {
            self.between_boxes(cs, cd, ps, emit)
        } else {
            Ok(())
        }
    }

    fn source_compartment(&self, code: &SpeciesCode, particle: &Particle) -> Result<&'a Compartment> {
        self.context.compartment_of(particle).ok_or_else(|| {
            UtopiaError::structural(
                code,
                code,
                format!("compartment '{}' of box '{}' is unknown", particle.compartment, particle.box_name),
            )
        })
    }

    fn within_compartment(
        &self,
        cs: &SpeciesCode,
        cd: &SpeciesCode,
        ps: &Particle,
        emit: &mut dyn FnMut(Process, f64),
    ) -> Result<()> {
        if cs.state() == cd.state() {
            let rate = self.fragmentation(cs, cd, ps)?;
            emit(Process::Fragmentation, rate);
            return Ok(());
        }
        if cs.size() != cd.size() {
            return Ok(());
        }

        let Some(process) = state_transition(cs.state(), cd.state())
            .ok_or_else(|| UtopiaError::structural(cs, cd, "undefined state transition"))?
        else {
            return Ok(());
        };

        let compartment = self.source_compartment(cs, ps)?;
        if compartment.lists(process) {
            let rate = ps.rate_constants().get(process).map(RateValue::total).unwrap_or(0.0);
            emit(process, rate);
        }
        Ok(())
    }

    fn fragmentation(&self, cs: &SpeciesCode, cd: &SpeciesCode, ps: &Particle) -> Result<f64> {
        let ordinal = |code: &SpeciesCode| {
            self.tables
                .size_ordinal(code.size())
                .ok_or_else(|| UtopiaError::structural(cs, cd, format!("unresolvable size symbol '{}'", code.size())))
        };
        let (from, to) = (ordinal(cs)?, ordinal(cd)?);

        // Fragments are always smaller than their parent.
        if to >= from {
            return Ok(0.0);
        }
        let offset = from - to;

        let Some(value) = ps.rate_constants().get(Process::Fragmentation) else {
            return Ok(0.0);
        };
        match value {
            RateValue::Scalar(rate) => Ok(if offset == 1 { *rate } else { 0.0 }),
            RateValue::BySizeClass(_) | RateValue::SizeDistribution(_) => Ok(value.receiving(offset).unwrap_or(0.0)),
            RateValue::ByLabel(_) => Err(UtopiaError::structural(cs, cd, "fragmentation rate keyed by label")),
        }
    }

    fn between_compartments(
        &self,
        cs: &SpeciesCode,
        cd: &SpeciesCode,
        ps: &Particle,
        pd: &Particle,
        emit: &mut dyn FnMut(Process, f64),
    ) -> Result<()> {
        let compartment = self.source_compartment(cs, ps)?;
        let Some(edge) = compartment.edge_to(&pd.compartment) else {
            return Ok(());
        };
        if !cs.same_particle(cd) {
            return Ok(());
        }
        if edge.is_empty() {
            return Err(UtopiaError::structural(cs, cd, "transport edge without labels"));
        }

        for &process in edge.labels() {
            if !process.is_transport() {
                return Err(UtopiaError::structural(
                    cs,
                    cd,
                    format!("edge label '{}' does not move mass between compartments", process),
                ));
            }
            if !compartment.lists(process) {
                return Err(UtopiaError::structural(
                    cs,
                    cd,
                    format!("edge label '{}' is not a process of '{}'", process, compartment.name()),
                ));
            }
            let Some(value) = ps.rate_constants().get(process) else {
                emit(process, 0.0);
                continue;
            };

            let order = match process {
                Process::DryDeposition | Process::WetDeposition => Some(&self.config.surface_compartments),
                Process::Mixing => Some(&self.config.mixing_targets),
                Process::RunoffTransport => Some(&self.config.runoff_targets),
                _ => None,
            };
            let rate = receiving_rate(value, order.map(Vec::as_slice), &pd.compartment)
                .map_err(|reason| UtopiaError::structural(cs, cd, format!("{}: {}", process, reason)))?;
            emit(process, rate);
        }
        Ok(())
    }

    fn between_boxes(
        &self,
        cs: &SpeciesCode,
        cd: &SpeciesCode,
        ps: &Particle,
        emit: &mut dyn FnMut(Process, f64),
    ) -> Result<()> {
        let flows = self.context.box_flows();
        let Some(position) = flows.position(cs.box_name(), cd.box_name()) else {
            return Ok(());
        };

        let compartment = self.source_compartment(cs, ps)?;
        let process = match compartment.kind() {
            CompartmentType::Sediment => Process::SedimentTransport,
            _ => Process::AdvectiveTransport,
        };
        let Some(value) = ps.rate_constants().get(process) else {
            return Ok(());
        };

        let rate = match value {
            RateValue::Scalar(rate) => *rate,
            RateValue::BySizeClass(_) | RateValue::SizeDistribution(_) => value.receiving(position).unwrap_or(0.0),
            RateValue::ByLabel(_) => value.label(cd.box_name()).unwrap_or(0.0),
        };
        emit(process, rate);
        Ok(())
    }
}

/// Process turning state `from` into state `to`
///
/// `None` for a symbol outside `A`..`D`, `Some(None)` for a pair with no
/// direct process (A/D and B/C).
fn state_transition(from: char, to: char) -> Option<Option<Process>> {
    if !matches!(from, 'A'..='D') || !matches!(to, 'A'..='D') {
        return None;
    }
    Some(match (from, to) {
        ('A', 'B') | ('C', 'D') => Some(Process::Heteroaggregation),
        ('B', 'A') | ('D', 'C') => Some(Process::HeteroaggregateBreakup),
        ('A', 'C') | ('B', 'D') => Some(Process::Biofouling),
        ('C', 'A') | ('D', 'B') => Some(Process::Defouling),
        _ => None,
    })
}

/// Pick the rate of one receiving compartment out of a transport value
///
/// `order` is the receiving order of vector-valued rates; without one, a
/// vector is malformed. Labelled values are looked up by compartment name.
fn receiving_rate(value: &RateValue, order: Option<&[String]>, receiver: &str) -> std::result::Result<f64, String> {
    match value {
        RateValue::Scalar(rate) => Ok(*rate),
        RateValue::ByLabel(_) => Ok(value.label(receiver).unwrap_or(0.0)),
        RateValue::BySizeClass(_) | RateValue::SizeDistribution(_) => {
            let order = order.ok_or_else(|| "vector rate without a receiving order".to_string())?;
            let index = order
                .iter()
                .position(|name| name == receiver)
                .ok_or_else(|| format!("no receiving position for '{}'", receiver))?;
            value
                .receiving(index)
                .ok_or_else(|| format!("rate has no element {} for '{}'", index, receiver))
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_table() {
        assert_eq!(state_transition('A', 'B'), Some(Some(Process::Heteroaggregation)));
        assert_eq!(state_transition('D', 'C'), Some(Some(Process::HeteroaggregateBreakup)));
        assert_eq!(state_transition('B', 'D'), Some(Some(Process::Biofouling)));
        assert_eq!(state_transition('C', 'A'), Some(Some(Process::Defouling)));
        assert_eq!(state_transition('A', 'D'), Some(None));
        assert_eq!(state_transition('B', 'C'), Some(None));
        assert_eq!(state_transition('A', 'E'), None);
    }

    #[test]
    fn test_receiving_rate_shapes() {
        let order = vec!["Coast_Surface_Water".to_string(), "Surface_Freshwater".to_string()];
        let vector = RateValue::from_vec(vec![1.0, 2.0]);
        assert_eq!(receiving_rate(&vector, Some(order.as_slice()), "Surface_Freshwater"), Ok(2.0));
        assert!(receiving_rate(&vector, Some(order.as_slice()), "Air").is_err());
        assert!(receiving_rate(&vector, None, "Air").is_err());
        assert_eq!(receiving_rate(&RateValue::from_scalar(3.0), None, "Air"), Ok(3.0));

        let labelled = RateValue::from_labels([("Air", 4.0)]);
        assert_eq!(receiving_rate(&labelled, None, "Air"), Ok(4.0));
        assert_eq!(receiving_rate(&labelled, None, "Sea"), Ok(0.0));
    }

    #[test]
    fn test_short_vector_is_structural() {
        let order = vec!["a".to_string(), "b".to_string()];
        let short = RateValue::from_vec(vec![1.0]);
        assert!(receiving_rate(&short, Some(order.as_slice()), "b").is_err());
    }

    #[test]
    fn test_matrix_dimension_checked() {
        let codes = vec![SpeciesCode::new('a', 'A', 0, "Utopia")];
        assert!(TransitionMatrix::new(codes.clone(), DMatrix::zeros(2, 2)).is_err());
        let matrix = TransitionMatrix::new(codes, DMatrix::from_element(1, 1, -1.0)).unwrap();
        assert_eq!(matrix.column_sums()[0], -1.0);
    }
}
