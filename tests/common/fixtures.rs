//! Model fixtures shared by the integration tests

use nalgebra::DVector;
use utopia_rs::prelude::*;

/// Polyethylene sphere of base name `name`, radius growing with the class
pub fn sphere(name: &str) -> ParticleProperties {
    let class: f64 = name[2..3].parse().unwrap_or(1.0);
    ParticleProperties::sphere(name, "PE", 980.0, 0.5 * 10f64.powf(class - 1.0))
}

/// Formula table returning the same value for every species
pub fn constant_formulas(values: &[(Process, RateValue)]) -> FormulaTable {
    values.iter().cloned().fold(FormulaTable::new("constant"), |table, (process, value)| {
        table.with(process, move |_, _| Ok(Some(value.clone())))
    })
}

/// One fully assembled run
pub struct Run {
    pub config: RunConfiguration,
    pub context: ModelContext,
    pub tables: CodingTables,
    pub registry: SpeciesRegistry,
}

impl Run {
    /// Species for every box, compartment, particle and state, with rate
    /// constants assembled from `formulas`
    pub fn new(
        config: RunConfiguration,
        context: ModelContext,
        particles: &[ParticleProperties],
        states: &[&str],
        formulas: &dyn RateFormula,
    ) -> Self {
        let mut species = Vec::new();
        for model_box in context.boxes() {
            for compartment in &model_box.compartments {
                for properties in particles {
                    for state in states {
                        species.push(Particle::new(
                            properties.clone(),
                            *state,
                            compartment.name(),
                            model_box.name.clone(),
                        ));
                    }
                }
            }
        }

        let tables = CodingTables::from_context(&config, &context).unwrap();
        let mut registry = SpeciesRegistry::new(species, &tables).unwrap();
        RateAssembler::new(&context, formulas).assemble(&mut registry).unwrap();

        Self {
            config,
            context,
            tables,
            registry,
        }
    }

    pub fn builder(&self) -> MatrixBuilder<'_> {
        MatrixBuilder::new(&self.context, &self.registry, &self.tables, &self.config)
    }

    pub fn matrix(&self) -> TransitionMatrix {
        self.builder().build().unwrap()
    }

    /// Registry position of the species with code `code`
    pub fn index(&self, code: &str) -> usize {
        let code: SpeciesCode = code.parse().unwrap();
        self.registry.index_of(&code).unwrap()
    }

    /// Steady state under `emissions`
    pub fn steady_state(&self, emissions: &Emissions) -> SteadyState {
        let vector = emissions.species_vector(self.registry.particles()).unwrap();
        let scenario = Scenario::new(self.matrix(), vector);
        let result = SteadyStateSolver::new()
            .solve(&scenario, &SolverConfiguration::steady_state())
            .unwrap();
        SteadyState::from_result(&self.registry, &result).unwrap()
    }

    /// Steady state from given masses, bypassing the solver
    pub fn with_masses(&self, masses: Vec<f64>) -> SteadyState {
        SteadyState::new(&self.registry, &DVector::from_vec(masses)).unwrap()
    }

    pub fn indicators(&self, steady: &SteadyState, emissions: &Emissions) -> ExposureIndicators {
        let flows = FlowTables::from_steady_state(&self.builder(), steady).unwrap();
        ExposureCalculator::new(&self.config, &self.registry, emissions)
            .calculate(steady, &flows)
            .unwrap()
    }
}
