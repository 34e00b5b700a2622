//! Persistence and residence-time indicators on small hand-checked systems

use approx::assert_relative_eq;
use utopia_rs::indicators::{SECONDS_PER_DAY, seconds_to_years};
use utopia_rs::prelude::*;

mod common;
use common::{Run, constant_formulas, sphere};

const YEAR: f64 = SECONDS_PER_DAY * 365.0;

#[test]
fn test_deep_soil_residence_time() {
    // 300 g held, 10 g/s discorporated and 5 g/s sequestered.
    let context = ModelContext::single(
        ModelBox::new("Utopia").with_compartment(
            Compartment::new("Background_Soil", CompartmentType::DeepSoil)
                .with_processes(vec![Process::Discorporation, Process::SequestrationDeepSoils]),
        ),
    )
    .unwrap();
    let formulas = constant_formulas(&[
        (Process::Discorporation, RateValue::from_scalar(10.0 / 300.0)),
        (Process::SequestrationDeepSoils, RateValue::from_scalar(5.0 / 300.0)),
    ]);
    let run = Run::new(RunConfiguration::default(), context, &[sphere("mp1")], &["freeMP"], &formulas);

    let steady = run.with_masses(vec![300.0]);
    let indicators = run.indicators(&steady, &Emissions::new());

    let tov = indicators.mass.tov_years.value().unwrap();
    assert_relative_eq!(tov, 300.0 / 15.0 / 86_400.0 / 365.0, max_relative = 1e-12);
    let pov = indicators.mass.pov_years.value().unwrap();
    assert_relative_eq!(pov, 300.0 / 10.0 / 86_400.0 / 365.0, max_relative = 1e-12);
}

#[test]
fn test_solved_steady_state_matches_emission_balance() {
    let context = ModelContext::single(
        ModelBox::new("Utopia").with_compartment(
            Compartment::new("Background_Soil", CompartmentType::DeepSoil)
                .with_processes(vec![Process::Discorporation, Process::SequestrationDeepSoils]),
        ),
    )
    .unwrap();
    let formulas = constant_formulas(&[
        (Process::Discorporation, RateValue::from_scalar(10.0 / 300.0)),
        (Process::SequestrationDeepSoils, RateValue::from_scalar(5.0 / 300.0)),
    ]);
    let run = Run::new(RunConfiguration::default(), context, &[sphere("mp1")], &["freeMP"], &formulas);
    let emissions = Emissions::new().add("Utopia", "Background_Soil", 'a', 15.0);

    let steady = run.steady_state(&emissions);
    assert_relative_eq!(steady.species()[0].mass_g, 300.0, max_relative = 1e-12);

    // Emission is the only inflow, so compartment Tov equals overall Tov.
    let indicators = run.indicators(&steady, &emissions);
    let compartment = indicators.compartment("Background_Soil").unwrap();
    assert_relative_eq!(
        compartment.tov_mass_years.value().unwrap(),
        300.0 / 15.0 / 86_400.0 / 365.0,
        max_relative = 1e-12
    );
    assert_relative_eq!(
        compartment.tov_mass_years.value().unwrap(),
        indicators.mass.tov_years.value().unwrap(),
        max_relative = 1e-12
    );
    assert_relative_eq!(
        compartment.tov_number_years.value().unwrap(),
        indicators.number.tov_years.value().unwrap(),
        max_relative = 1e-12
    );
}

#[test]
fn test_empty_compartment_is_not_applicable() {
    let context = ModelContext::single(
        ModelBox::new("Utopia")
            .with_compartment(Compartment::new("Air", CompartmentType::Air).with_processes(vec![Process::Discorporation]))
            .with_compartment(
                Compartment::new("Surface_Freshwater", CompartmentType::Water)
                    .with_processes(vec![Process::Discorporation]),
            ),
    )
    .unwrap();
    let formulas = constant_formulas(&[(Process::Discorporation, RateValue::from_scalar(0.01))]);
    let run = Run::new(RunConfiguration::default(), context, &[sphere("mp1")], &["freeMP"], &formulas);
    let emissions = Emissions::new().add("Utopia", "Air", 'a', 1.0);

    let steady = run.steady_state(&emissions);
    let indicators = run.indicators(&steady, &emissions);

    let water = indicators.compartment("Surface_Freshwater").unwrap();
    assert_eq!(water.pov_mass_years, Indicator::NotApplicable);
    assert_eq!(water.pov_number_years, Indicator::NotApplicable);
    assert_eq!(water.tov_mass_years, Indicator::NotApplicable);

    // m / (0.01 m) = 100 s, carried by the air alone.
    let air = indicators.compartment("Air").unwrap();
    assert_relative_eq!(air.pov_mass_years.value().unwrap(), seconds_to_years(100.0), max_relative = 1e-9);
    assert_relative_eq!(indicators.mass.pov_years.value().unwrap(), seconds_to_years(100.0), max_relative = 1e-9);
}

#[test]
fn test_inflow_residence_time() {
    // Water settles into sediment; the sediment is fed by settling only.
    let context = ModelContext::single(
        ModelBox::new("Utopia")
            .with_compartment(
                Compartment::new("Surface_Freshwater", CompartmentType::Water)
                    .with_processes(vec![Process::Settling])
                    .connect("Sediment_Freshwater", Process::Settling),
            )
            .with_compartment(
                Compartment::new("Sediment_Freshwater", CompartmentType::Sediment).with_processes(vec![Process::Burial]),
            ),
    )
    .unwrap();
    let formulas = constant_formulas(&[
        (Process::Settling, RateValue::from_scalar(0.5)),
        (Process::Burial, RateValue::from_scalar(0.25)),
    ]);
    let run = Run::new(RunConfiguration::default(), context, &[sphere("mp1")], &["freeMP"], &formulas);
    let emissions = Emissions::new().add("Utopia", "Surface_Freshwater", 'a', 2.0);

    // water: 2 / 0.5 = 4 g; sediment: 0.5 * 4 / 0.25 = 8 g
    let steady = run.steady_state(&emissions);
    let indicators = run.indicators(&steady, &emissions);

    let water = indicators.compartment("Surface_Freshwater").unwrap();
    assert_relative_eq!(water.tov_mass_years.value().unwrap(), seconds_to_years(4.0 / 2.0), max_relative = 1e-9);
    let sediment = indicators.compartment("Sediment_Freshwater").unwrap();
    assert_relative_eq!(sediment.tov_mass_years.value().unwrap(), seconds_to_years(8.0 / 2.0), max_relative = 1e-9);

    // Burial is the only exit: 12 g / 2 g/s.
    assert_relative_eq!(indicators.mass.tov_years.value().unwrap(), seconds_to_years(6.0), max_relative = 1e-9);
    // Nothing discorporates.
    assert_eq!(indicators.mass.pov_years, Indicator::NotApplicable);
}

fn ocean_run() -> Run {
    let context = ModelContext::single(
        ModelBox::new("Utopia")
            .with_compartment(
                Compartment::new("Ocean_Mixed_Water", CompartmentType::Water).with_processes(vec![
                    Process::Discorporation,
                    Process::Settling,
                    Process::Mixing,
                ]),
            )
            .with_compartment(
                Compartment::new("Ocean_Column_Water", CompartmentType::Water).with_processes(vec![
                    Process::Discorporation,
                    Process::Mixing,
                    Process::Rising,
                ]),
            )
            .with_compartment(
                Compartment::new("Sediment_Ocean", CompartmentType::Sediment)
                    .with_processes(vec![Process::Discorporation, Process::Burial]),
            ),
    )
    .unwrap();

    let mixed = |p: &Particle| p.compartment == "Ocean_Mixed_Water";
    let formulas = FormulaTable::new("ocean")
        .with(Process::Discorporation, move |p, _| {
            Ok(Some(RateValue::from_scalar(if mixed(p) { 0.01 } else { 1e-6 })))
        })
        .with(Process::Settling, |_, _| Ok(Some(RateValue::from_scalar(0.02))))
        .with(Process::Mixing, move |p, _| {
            Ok(Some(if mixed(p) {
                RateValue::from_vec(vec![0.0, 0.03])
            } else {
                RateValue::from_scalar(0.001)
            }))
        })
        .with(Process::Rising, |_, _| Ok(Some(RateValue::from_scalar(0.002))))
        .with(Process::Burial, |_, _| Ok(Some(RateValue::from_scalar(1e-4))));

    Run::new(RunConfiguration::default(), context, &[sphere("mp1")], &["freeMP"], &formulas)
}

#[test]
fn test_excluded_deep_ocean_does_not_dominate() {
    let run = ocean_run();
    // Almost all mass sits in the deep ocean.
    let steady = run.with_masses(vec![10.0, 100.0, 1e6]);
    let indicators = run.indicators(&steady, &Emissions::new());

    // Pov = 10 / (0.01 * 10)
    assert_relative_eq!(indicators.mass.pov_years.value().unwrap(), seconds_to_years(100.0), max_relative = 1e-9);

    // Tov exits: 0.1 discorporation + 0.2 settling + 0.3 down - 0.1 up - 0.2 rising
    let tov = indicators.mass.tov_years.value().unwrap();
    assert_relative_eq!(tov, seconds_to_years(10.0 / 0.3), max_relative = 1e-9);
    assert!(tov * YEAR < 1e3);
}

#[test]
fn test_deep_ocean_exchange_follows_mixing_order() {
    let context = ModelContext::single(
        ModelBox::new("Utopia")
            .with_compartment(
                Compartment::new("Ocean_Mixed_Water", CompartmentType::Water)
                    .with_processes(vec![Process::Mixing])
                    .connect("Ocean_Column_Water", Process::Mixing),
            )
            .with_compartment(Compartment::new("Ocean_Column_Water", CompartmentType::Water).with_processes(vec![])),
    )
    .unwrap();
    let formulas = constant_formulas(&[(Process::Mixing, RateValue::from_vec(vec![0.7, 0.3]))]);
    let mut config = RunConfiguration::default();
    config.mixing_targets = vec!["Ocean_Column_Water".to_string(), "Ocean_Surface_Water".to_string()];
    let run = Run::new(config, context, &[sphere("mp1")], &["freeMP"], &formulas);

    assert_relative_eq!(run.matrix().get(run.index("aA1_Utopia"), run.index("aA0_Utopia")), 0.7);

    let steady = run.with_masses(vec![10.0, 0.0]);
    let indicators = run.indicators(&steady, &Emissions::new());

    // The column leads the receiving order, so 0.7 * 10 leaves downward.
    let tov = indicators.mass.tov_years.value().unwrap();
    assert_relative_eq!(tov, seconds_to_years(10.0 / 7.0), max_relative = 1e-9);
}

#[test]
fn test_excluded_set_is_configurable() {
    let mut run = ocean_run();
    run.config.excluded_compartments.clear();
    let steady = run.with_masses(vec![10.0, 100.0, 1e6]);
    let indicators = run.indicators(&steady, &Emissions::new());

    // With the deep ocean inside the boundaries its mass dominates.
    let pov = indicators.mass.pov_years.value().unwrap();
    let expected = (10.0 + 100.0 + 1e6) / (0.1 + 1e-6 * 100.0 + 1e-6 * 1e6);
    assert_relative_eq!(pov, seconds_to_years(expected), max_relative = 1e-9);
}

#[test]
fn test_size_class_indicators() {
    let context = ModelContext::single(
        ModelBox::new("Utopia").with_compartment(
            Compartment::new("Surface_Freshwater", CompartmentType::Water)
                .with_processes(vec![Process::Fragmentation, Process::Discorporation]),
        ),
    )
    .unwrap();
    let formulas = constant_formulas(&[
        (Process::Fragmentation, RateValue::from_vec(vec![0.1, 0.05])),
        (Process::Discorporation, RateValue::from_scalar(0.01)),
    ]);
    let run = Run::new(
        RunConfiguration::default(),
        context,
        &[sphere("mp1"), sphere("mp2")],
        &["freeMP"],
        &formulas,
    );
    let steady = run.with_masses(vec![20.0, 10.0]);
    let indicators = run.indicators(&steady, &Emissions::new());

    assert_eq!(indicators.sizes.len(), 5);
    let b = indicators.size('b').unwrap();
    assert_eq!(b.size_class, "mp2");
    assert_relative_eq!(b.pov_years.value().unwrap(), seconds_to_years(10.0 / 1.1), max_relative = 1e-9);
    assert_relative_eq!(b.tov_years.value().unwrap(), seconds_to_years(10.0 / 1.1), max_relative = 1e-9);

    let a = indicators.size('a').unwrap();
    assert_relative_eq!(a.pov_years.value().unwrap(), seconds_to_years(20.0 / 2.2), max_relative = 1e-9);

    assert_eq!(indicators.size('e').unwrap().pov_years, Indicator::NotApplicable);
}
