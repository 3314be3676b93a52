//! Property-based tests for the harvest and tick mechanics.
//!
//! Run with: cargo test --release prop_simulation

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use wealthscape::simulation::harvest;
use wealthscape::world::check_invariants;
use wealthscape::{Board, EdgePolicy, Patch, Person, SimConfig, Simulation};

/// Build a small board from generated patch grain and people.
fn build_board(width: u16, height: u16, grain: &[u32], people: &[(u16, u16, i64)]) -> Board {
    let mut board = Board::new(width, height, EdgePolicy::Bounded).unwrap();
    for (patch, &g) in board.patches_mut().iter_mut().zip(grain.iter().cycle()) {
        *patch = Patch::with_grain(g, 100);
    }
    for (i, &(x, y, wealth)) in people.iter().enumerate() {
        let id = u32::try_from(i).unwrap();
        let person = Person::new(id, wealth, 1, 1, 100);
        board
            .put(person, i64::from(x % width), i64::from(y % height))
            .unwrap();
    }
    board
}

fn system_grain(board: &Board) -> i128 {
    i128::from(board.total_patch_grain()) + i128::from(board.total_person_grain())
}

fn small_config() -> impl Strategy<Value = SimConfig> {
    (
        any::<u64>(),
        0u32..40,
        1u16..12,
        1u16..12,
        1u32..4,
        0u32..6,
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(seed, people, w, h, interval, rate, tax, proportional, wrap, legacy)| SimConfig {
                seed,
                num_people: people,
                time_max: 15,
                board_width: w,
                board_height: h,
                grain_growth_interval: interval,
                grain_growth_rate: rate,
                taxation_enabled: tax,
                proportional_growth_enabled: proportional,
                edge_policy: if wrap { EdgePolicy::Wrap } else { EdgePolicy::Bounded },
                harvest_mode: if legacy {
                    wealthscape::HarvestMode::PerAgent
                } else {
                    wealthscape::HarvestMode::PerTick
                },
                ..SimConfig::default()
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Harvest only moves grain around; what disappears is exactly the
    /// reported truncation and undistributed tax.
    #[test]
    fn prop_harvest_conserves_grain(
        width in 1u16..8,
        height in 1u16..8,
        grain in prop::collection::vec(0u32..=100, 1..64),
        people in prop::collection::vec((0u16..8, 0u16..8, 0i64..500), 0..30),
        taxation in any::<bool>(),
        tax_percent in 0u32..=100,
    ) {
        let mut board = build_board(width, height, &grain, &people);
        let config = SimConfig {
            taxation_enabled: taxation,
            tax_percent,
            ..SimConfig::default()
        };

        let before = system_grain(&board);
        let report = harvest(&mut board, &config).unwrap();
        let after = system_grain(&board);

        prop_assert_eq!(before - after, i128::from(report.lost()));
        prop_assert!(check_invariants(&board).is_empty());
    }

    /// One person per patch and no tax: the harvest is exactly conservative.
    #[test]
    fn prop_single_occupancy_exact(
        grain in prop::collection::vec(0u32..=100, 16),
        wealth in prop::collection::vec(0i64..200, 1..16),
    ) {
        let people: Vec<(u16, u16, i64)> = wealth
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let i = u16::try_from(i).unwrap();
                (i % 4, i / 4, w)
            })
            .collect();
        let mut board = build_board(4, 4, &grain, &people);

        let before = system_grain(&board);
        let report = harvest(&mut board, &SimConfig::default()).unwrap();

        prop_assert_eq!(report.truncated, 0);
        prop_assert_eq!(system_grain(&board), before);
    }

    /// Every grain of tax collected is either redistributed or reported
    /// as undistributed.
    #[test]
    fn prop_tax_neutrality(
        grain in prop::collection::vec(0u32..=100, 1..64),
        people in prop::collection::vec((0u16..8, 0u16..8, 0i64..500), 1..30),
        tax_percent in 0u32..=100,
    ) {
        let mut board = build_board(8, 8, &grain, &people);
        let config = SimConfig {
            taxation_enabled: true,
            tax_percent,
            ..SimConfig::default()
        };

        let report = harvest(&mut board, &config).unwrap();

        prop_assert_eq!(
            report.tax_collected,
            report.tax_redistributed + report.tax_undistributed
        );
    }

    /// Patches stay within capacity through growth.
    #[test]
    fn prop_growth_clamped(config in small_config()) {
        let mut sim = Simulation::new(config).unwrap();
        for _ in 0..15 {
            sim.step().unwrap();
            for patch in sim.board().patches() {
                prop_assert!(patch.grain() <= patch.max_grain());
            }
        }
    }

    /// Without inheritance nobody is born, so the population never grows.
    #[test]
    fn prop_population_monotone_without_inheritance(config in small_config()) {
        let mut sim = Simulation::new(config).unwrap();
        let mut last = sim.board().population();
        for _ in 0..15 {
            let report = sim.step().unwrap();
            prop_assert_eq!(report.births, 0);
            prop_assert!(report.population <= last);
            last = report.population;
        }
    }

    /// With inheritance each death is replaced, so the population is fixed.
    #[test]
    fn prop_inheritance_keeps_population(config in small_config()) {
        let config = SimConfig {
            wealth_inheritance_enabled: true,
            ..config
        };
        let start = usize::try_from(config.num_people).unwrap();
        let mut sim = Simulation::new(config).unwrap();
        for _ in 0..15 {
            let report = sim.step().unwrap();
            prop_assert_eq!(report.deaths, report.births);
            prop_assert_eq!(report.population, start);
        }
    }

    /// Board bookkeeping stays consistent across ticks.
    #[test]
    fn prop_invariants_hold(config in small_config()) {
        let mut sim = Simulation::new(config).unwrap();
        for _ in 0..15 {
            sim.step().unwrap();
            let violations = check_invariants(sim.board());
            prop_assert!(violations.is_empty(), "{:?}", violations);
        }
    }
}
