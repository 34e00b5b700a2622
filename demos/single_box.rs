//! Example: one freshwater box with air, soils and sediment
//!
//! Polyamide particles of five size classes are emitted into an impacted
//! soil surface and a river. Rate constants come from simple closed-form
//! formulas:
//!
//! - Settling: Stokes velocity over the water depth
//! - Fragmentation: one halving per size class, slower in sediment and soil
//! - Everything else: literature-style constants
//!
//! The steady state is solved with LU, then persistence (Pov) and residence
//! time (Tov) are reported for the whole box, per compartment and per size
//! class. Results are written to the system temporary directory.
//!
//! ```bash
//! RUST_LOG=info cargo run --example single_box
//! ```
//!
//! A `utopia_config.json` in the working directory replaces the default run
//! configuration.

use utopia_rs::{
    indicators::Basis,
    output::{CsvConfig, CsvExporter, CsvMetadata, Exporter, JsonExporter},
    prelude::*,
};

use std::time::Instant;

const GRAVITY: f64 = 9.81; // m/s2
const WATER_DENSITY: f64 = 1000.0; // kg/m3
const WATER_VISCOSITY: f64 = 1e-3; // Pa·s

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("═══════════════════════════════════════════════════════");
    println!("  Microplastic Fate - Single Freshwater Box");
    println!("═══════════════════════════════════════════════════════\n");

    let config = RunConfiguration::load_or_default("utopia_config.json");

    // ====== System description ======

    let water_depth = 3.0; // m
    let context = ModelContext::single(
        ModelBox::new("Utopia")
            .with_compartment(
                Compartment::new("Air", CompartmentType::Air)
                    .with_processes(vec![Process::Discorporation, Process::DryDeposition])
                    .connect("Surface_Freshwater", Process::DryDeposition)
                    .connect("Impacted_Soil_Surface", Process::DryDeposition),
            )
            .with_compartment(
                Compartment::new("Surface_Freshwater", CompartmentType::Water)
                    .with_processes(vec![
                        Process::Discorporation,
                        Process::Fragmentation,
                        Process::Heteroaggregation,
                        Process::HeteroaggregateBreakup,
                        Process::Biofouling,
                        Process::Defouling,
                        Process::Settling,
                    ])
                    .with_parameter("depth_m", water_depth)
                    .connect("Sediment_Freshwater", Process::Settling),
            )
            .with_compartment(
                Compartment::new("Sediment_Freshwater", CompartmentType::Sediment)
                    .with_processes(vec![
                        Process::Discorporation,
                        Process::Fragmentation,
                        Process::SedimentResuspension,
                        Process::Burial,
                    ])
                    .connect("Surface_Freshwater", Process::SedimentResuspension),
            )
            .with_compartment(
                Compartment::new("Impacted_Soil_Surface", CompartmentType::SoilSurface)
                    .with_processes(vec![
                        Process::Discorporation,
                        Process::Fragmentation,
                        Process::RunoffTransport,
                        Process::Percolation,
                    ])
                    .connect("Surface_Freshwater", Process::RunoffTransport)
                    .connect("Impacted_Soil", Process::Percolation),
            )
            .with_compartment(
                Compartment::new("Impacted_Soil", CompartmentType::DeepSoil)
                    .with_processes(vec![Process::Discorporation, Process::SequestrationDeepSoils]),
            ),
    )?;

    let particles: Vec<ParticleProperties> = (1..=5)
        .map(|class| ParticleProperties::sphere(format!("mp{}", class), "PA", 1140.0, 0.5 * 10f64.powi(class - 1)))
        .collect();

    println!("Particles:");
    for p in &particles {
        println!("  {} : {} µm diameter, {} kg/m3", p.name, p.diameter_um(), p.density_kg_m3);
    }
    println!();

    // ====== Species ======

    let mut species = Vec::new();
    for model_box in context.boxes() {
        for compartment in &model_box.compartments {
            for properties in &particles {
                for state in &config.states {
                    species.push(Particle::new(
                        properties.clone(),
                        state.clone(),
                        compartment.name(),
                        model_box.name.clone(),
                    ));
                }
            }
        }
    }

    let tables = CodingTables::from_context(&config, &context)?;
    let mut registry = SpeciesRegistry::new(species, &tables)?;
    println!("Species: {}\n", registry.len());

    // ====== Rate constants ======

    let formulas = formula_library();
    formulas.validate(&context)?;
    RateAssembler::new(&context, &formulas).assemble(&mut registry)?;

    // ====== Transition matrix and steady state ======

    let emissions = Emissions::new()
        .add("Utopia", "Impacted_Soil_Surface", 'e', 1.0)
        .add("Utopia", "Surface_Freshwater", 'c', 0.1);

    let start = Instant::now();
    let builder = MatrixBuilder::new(&context, &registry, &tables, &config);
    let matrix = builder.build()?;
    let assembly_time = start.elapsed().as_secs_f64();

    let scenario = Scenario::new(matrix.clone(), emissions.species_vector(registry.particles())?);
    let solver = SteadyStateSolver::new();
    let start = Instant::now();
    let result = solver.solve(&scenario, &SolverConfiguration::steady_state())?;
    let solve_time = start.elapsed().as_secs_f64();

    println!("Matrix assembly : {:.3} ms", assembly_time * 1e3);
    println!("Steady state    : {:.3} ms ({})\n", solve_time * 1e3, solver.name());

    // ====== Indicators ======

    let steady = SteadyState::from_result(&registry, &result)?;
    let flows = FlowTables::from_steady_state(&builder, &steady)?;
    let indicators = ExposureCalculator::new(&config, &registry, &emissions).calculate(&steady, &flows)?;

    println!("═══════════════════════════════════════════════════════");
    println!("  Results: Exposure Indicators (years)");
    println!("═══════════════════════════════════════════════════════\n");

    for basis in [Basis::Mass, Basis::Number] {
        let overall = indicators.overall(basis);
        println!("  Overall ({:<6}) Pov = {:<12.4} Tov = {:.4}", basis.name(), overall.pov_years, overall.tov_years);
    }
    println!();

    println!("{:<24} {:>12} {:>12} {:>12}", "Compartment", "Mass (g)", "Pov mass", "Tov mass");
    println!("{:-<64}", "");
    for c in &indicators.compartments {
        println!(
            "{:<24} {:>12.4e} {:>12.4} {:>12.4}",
            c.compartment,
            steady.compartment_total(&c.compartment, Basis::Mass),
            c.pov_mass_years,
            c.tov_mass_years
        );
    }
    println!();

    println!("{:<8} {:>12} {:>12}", "Size", "Pov", "Tov");
    println!("{:-<34}", "");
    for s in &indicators.sizes {
        println!("{:<8} {:>12.4} {:>12.4}", s.size_class, s.pov_years, s.tov_years);
    }

    // ====== Export ======

    let out_dir = std::env::temp_dir().join("utopia_single_box");
    std::fs::create_dir_all(&out_dir)?;

    let csv = CsvExporter::new(CsvConfig::default().with_metadata(CsvMetadata::from_run(
        "single_box",
        solver.name(),
        registry.len(),
    )));
    csv.export_indicators(&indicators, &out_dir.join("indicators.csv"))?;
    csv.export_steady_state(&steady, &out_dir.join("steady_state.csv"))?;
    csv.export_matrix(&matrix, &out_dir.join("transition_matrix.csv"))?;
    JsonExporter::default().export_indicators(&indicators, &out_dir.join("indicators.json"))?;

    println!("\nResults written to {}", out_dir.display());
    Ok(())
}

/// Closed-form rate constants
fn formula_library() -> FormulaTable {
    FormulaTable::new("single_box")
        .with(Process::Discorporation, |p, _| {
            // Slower for larger and aggregated particles.
            let days = 365.0 * 10f64.powi(size_class(p)) * if p.state == "freeMP" { 1.0 } else { 2.0 };
            Ok(Some(RateValue::from_scalar(1.0 / (days * 86_400.0))))
        })
        .with(Process::Fragmentation, |p, _| {
            let base = match p.compartment.as_str() {
                "Surface_Freshwater" => 1.0 / (36.5 * 86_400.0),
                _ => 1.0 / (365.0 * 86_400.0),
            };
            // Element 0 is the total, element k the share reaching the class k below.
            let shares = [1.0, 0.5, 0.25, 0.15, 0.1];
            Ok(Some(RateValue::from_vec(shares.iter().map(|s| s * base).collect())))
        })
        .with(Process::Heteroaggregation, |p, _| {
            Ok(Some(RateValue::from_scalar(1e-6 / 10f64.powi(size_class(p)))))
        })
        .with(Process::HeteroaggregateBreakup, |_, _| Ok(Some(RateValue::from_scalar(1e-9))))
        .with(Process::Biofouling, |_, _| Ok(Some(RateValue::from_scalar(1.0 / (30.0 * 86_400.0)))))
        .with(Process::Defouling, |_, _| Ok(Some(RateValue::from_scalar(0.0))))
        .with(Process::Settling, |p, ctx| {
            let depth = ctx
                .compartment_of(p)
                .and_then(|c| c.parameter("depth_m"))
                .ok_or_else(|| "compartment has no depth_m parameter".to_string())?;
            let r = p.properties.radius_m();
            let velocity =
                2.0 / 9.0 * (p.properties.density_kg_m3 - WATER_DENSITY) * GRAVITY * r * r / WATER_VISCOSITY;
            Ok((velocity > 0.0).then(|| RateValue::from_scalar(velocity / depth)))
        })
        .with(Process::SedimentResuspension, |_, _| Ok(Some(RateValue::from_scalar(1e-9))))
        .with(Process::Burial, |_, _| Ok(Some(RateValue::from_scalar(2.7e-9))))
        .with(Process::RunoffTransport, |_, _| {
            // Receiving order: coast, river.
            Ok(Some(RateValue::from_vec(vec![0.0, 1e-8])))
        })
        .with(Process::Percolation, |_, _| Ok(Some(RateValue::from_scalar(5e-9))))
        .with(Process::SequestrationDeepSoils, |_, _| Ok(Some(RateValue::from_scalar(1e-10))))
        .with(Process::DryDeposition, |_, _| {
            // Receiving order: the six surface compartments.
            Ok(Some(RateValue::from_vec(vec![0.0, 0.0, 2e-6, 0.0, 0.0, 8e-6])))
        })
}

/// 0 for `mp1` up to 4 for `mp5`
fn size_class(p: &Particle) -> i32 {
    p.name()
        .get(2..3)
        .and_then(|d| d.parse::<i32>().ok())
        .map(|n| n - 1)
        .unwrap_or(0)
}
