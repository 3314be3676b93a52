#![no_main]

//! Tick fuzzer.
//!
//! Builds a small simulation from arbitrary knobs, runs a few ticks and
//! checks the board invariants plus conservation of the harvest after each.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wealthscape::world::check_invariants;
use wealthscape::{EdgePolicy, HarvestMode, SimConfig, Simulation};

/// Structured input for tick fuzzing.
#[derive(Arbitrary, Debug)]
struct TickInput {
    seed: u64,
    num_people: u8,
    width: u8,
    height: u8,
    ticks: u8,
    growth_interval: u8,
    growth_rate: u8,
    max_grain: u8,
    percent_best_land: u8,
    tax_percent: u8,
    inheritance_percent: u8,
    taxation: bool,
    inheritance: bool,
    proportional: bool,
    same_position: bool,
    wrap: bool,
    per_agent: bool,
}

fuzz_target!(|input: TickInput| {
    // Cap sizes to keep each run short
    let config = SimConfig {
        seed: input.seed,
        num_people: u32::from(input.num_people % 64),
        time_max: u32::from(input.ticks % 20),
        board_width: u16::from(input.width % 16).max(1),
        board_height: u16::from(input.height % 16).max(1),
        grain_growth_interval: u32::from(input.growth_interval % 5).max(1),
        grain_growth_rate: u32::from(input.growth_rate),
        max_grain: u32::from(input.max_grain),
        percent_best_land: u32::from(input.percent_best_land % 101),
        tax_percent: u32::from(input.tax_percent % 101),
        wealth_inheritance_percent: u32::from(input.inheritance_percent % 101),
        taxation_enabled: input.taxation,
        wealth_inheritance_enabled: input.inheritance,
        proportional_growth_enabled: input.proportional,
        same_position_enabled: input.same_position,
        edge_policy: if input.wrap { EdgePolicy::Wrap } else { EdgePolicy::Bounded },
        harvest_mode: if input.per_agent { HarvestMode::PerAgent } else { HarvestMode::PerTick },
        ..SimConfig::default()
    };

    let ticks = config.time_max;
    let inheritance = config.wealth_inheritance_enabled;
    let Ok(mut sim) = Simulation::new(config) else {
        return;
    };

    let mut population = sim.board().population();
    for _ in 0..ticks {
        let report = sim.step().expect("tick on a valid board must succeed");

        let violations = check_invariants(sim.board());
        assert!(violations.is_empty(), "Invariants violated: {violations:?}");

        assert_eq!(
            report.harvest.tax_collected,
            report.harvest.tax_redistributed + report.harvest.tax_undistributed,
            "Tax pool leaked"
        );
        if inheritance {
            assert_eq!(report.population, population, "Heirs must replace the dead");
        } else {
            assert!(report.population <= population, "Population grew without heirs");
        }
        population = report.population;
    }
});
