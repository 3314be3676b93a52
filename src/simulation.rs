//! The simulation loop.
//!
//! A run moves through `Initialized → Running → Finished`. Each tick:
//!
//! 1. Snapshot the live ids (ascending, so ticks are reproducible).
//! 2. Movement and harvest, per the configured [`HarvestMode`]:
//!    - `PerTick`: plan every move, harvest once, then move everyone.
//!    - `PerAgent`: plan, harvest, move, one person at a time.
//! 3. Every moved person eats, ages and may die. With inheritance on, a
//!    death spawns an heir on the same cell.
//! 4. Patches grow when `time % grain_growth_interval == 0`.
//! 5. `time` advances and the caller records a snapshot.

mod economy;
mod rng;

pub use economy::{harvest, HarvestReport};
pub use rng::{create_rng, SimRng};

use rand::Rng;
use tracing::{debug, info, trace};

use crate::config::{percent_of, HarvestMode, SimConfig};
use crate::error::{SimError, SimResult};
use crate::record::RecordSink;
use crate::world::{assert_invariants, generate_terrain, Board, Fate, Person, PersonId, Position};

/// Lifecycle of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Board built and populated, no tick run yet.
    Initialized,
    /// Ticks in progress.
    Running {
        /// Tick currently or last executed.
        tick: u32,
    },
    /// `run` completed. No further ticks are accepted.
    Finished,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Time after the tick.
    pub time: u32,
    /// Harvest totals (summed over harvests in `PerAgent` mode).
    pub harvest: HarvestReport,
    /// People who died.
    pub deaths: u32,
    /// Heirs spawned.
    pub births: u32,
    /// Whether patches grew this tick.
    pub grew: bool,
    /// Population after the tick.
    pub population: usize,
}

/// Totals for a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed by `run`.
    pub ticks: u32,
    /// Final time.
    pub final_time: u32,
    /// Population at the end.
    pub final_population: usize,
    /// Deaths over the run.
    pub total_deaths: u64,
    /// Heirs spawned over the run.
    pub total_births: u64,
}

/// A simulation run.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Immutable run configuration.
    config: SimConfig,
    /// Grid and people.
    board: Board,
    /// Random source for placement and heirs.
    rng: SimRng,
    /// Ticks completed.
    time: u32,
    /// Lifecycle state.
    phase: Phase,
    /// Deaths since construction.
    total_deaths: u64,
    /// Heirs since construction.
    total_births: u64,
}

impl Simulation {
    /// Build a fresh simulation: generate terrain and place the population.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        let mut rng = create_rng(config.seed);
        let mut board = Board::from_config(&config)?;
        generate_terrain(&mut board, &config, &mut rng);

        let width = i64::from(config.board_width);
        let height = i64::from(config.board_height);
        for _ in 0..config.num_people {
            let id = board.next_person_id();
            let person = Person::random(id, &config, &mut rng);
            let (x, y) = if config.same_position_enabled {
                (width / 2, height / 2)
            } else {
                (rng.random_range(0..width), rng.random_range(0..height))
            };
            board.put(person, x, y)?;
        }

        info!(
            seed = config.seed,
            people = board.population(),
            width = config.board_width,
            height = config.board_height,
            patch_grain = board.total_patch_grain(),
            "simulation initialized"
        );

        Ok(Self::from_parts(config, board, rng))
    }

    /// Build a simulation around a prepared board.
    ///
    /// The board is used as is: no terrain is generated and no one is
    /// placed. The RNG is still seeded from the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration fails validation.
    pub fn with_board(config: SimConfig, board: Board) -> SimResult<Self> {
        config.validate()?;
        let rng = create_rng(config.seed);
        Ok(Self::from_parts(config, board, rng))
    }

    fn from_parts(config: SimConfig, board: Board, rng: SimRng) -> Self {
        Self {
            config,
            board,
            rng,
            time: 0,
            phase: Phase::Initialized,
            total_deaths: 0,
            total_births: 0,
        }
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Ticks completed.
    #[must_use]
    pub const fn time(&self) -> u32 {
        self.time
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Record the starting state, run `time_max` ticks recording after each,
    /// and mark the simulation finished.
    ///
    /// The sink is not closed; that is the owner's job.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFinished` on a second call, or any error raised by a
    /// tick or by the sink.
    pub fn run(&mut self, sink: &mut dyn RecordSink) -> SimResult<RunSummary> {
        self.run_with(sink, |_| {})
    }

    /// Like [`Simulation::run`], calling `on_tick` after each recorded tick.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::run`].
    pub fn run_with<F>(&mut self, sink: &mut dyn RecordSink, mut on_tick: F) -> SimResult<RunSummary>
    where
        F: FnMut(&TickReport),
    {
        if self.phase == Phase::Finished {
            return Err(SimError::AlreadyFinished);
        }

        sink.record(&self.board, self.time)?;
        for _ in 0..self.config.time_max {
            let report = self.step()?;
            sink.record(&self.board, self.time)?;
            on_tick(&report);
        }
        self.phase = Phase::Finished;

        let summary = RunSummary {
            ticks: self.config.time_max,
            final_time: self.time,
            final_population: self.board.population(),
            total_deaths: self.total_deaths,
            total_births: self.total_births,
        };
        info!(
            ticks = summary.ticks,
            population = summary.final_population,
            deaths = summary.total_deaths,
            births = summary.total_births,
            "simulation finished"
        );
        Ok(summary)
    }

    /// Execute one tick.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFinished` after `run` has completed, or
    /// `OutOfBounds`/`UnknownPerson` if the board is corrupt.
    pub fn step(&mut self) -> SimResult<TickReport> {
        if self.phase == Phase::Finished {
            return Err(SimError::AlreadyFinished);
        }
        self.phase = Phase::Running { tick: self.time };

        let mut report = TickReport::default();
        let ids = self.board.person_ids();

        match self.config.harvest_mode {
            HarvestMode::PerTick => {
                let mut targets = Vec::with_capacity(ids.len());
                for &id in &ids {
                    targets.push((id, self.board.next_position(id)?));
                }
                report.harvest = harvest(&mut self.board, &self.config)?;
                for (id, target) in targets {
                    self.move_eat_age_die(id, target, &mut report)?;
                }
            }
            HarvestMode::PerAgent => {
                report.harvest.skipped = true;
                for id in ids {
                    if self.board.person(id).is_none() {
                        continue;
                    }
                    let target = self.board.next_position(id)?;
                    let round = harvest(&mut self.board, &self.config)?;
                    report.harvest.absorb(&round);
                    self.move_eat_age_die(id, target, &mut report)?;
                }
            }
        }

        if self.time % self.config.grain_growth_interval == 0 {
            self.grow_patches();
            report.grew = true;
        }

        self.time += 1;
        report.time = self.time;
        report.population = self.board.population();
        self.total_deaths += u64::from(report.deaths);
        self.total_births += u64::from(report.births);

        assert_invariants(&self.board);

        debug!(
            time = report.time,
            population = report.population,
            deaths = report.deaths,
            births = report.births,
            harvested = report.harvest.harvested,
            tax_collected = report.harvest.tax_collected,
            "tick complete"
        );

        Ok(report)
    }

    /// Move one person and run their lifecycle. People who died earlier in
    /// the tick are skipped.
    fn move_eat_age_die(
        &mut self,
        id: PersonId,
        target: Position,
        report: &mut TickReport,
    ) -> SimResult<()> {
        if self.board.person(id).is_none() {
            return Ok(());
        }

        if let Fate::Died {
            remaining_grain,
            position,
        } = self.board.move_eat_age_die(id, target)?
        {
            report.deaths += 1;
            if self.config.wealth_inheritance_enabled {
                self.spawn_heir(remaining_grain, position)?;
                report.births += 1;
            }
        }
        Ok(())
    }

    /// Place a newborn on `position`, inheriting part of the parent's grain.
    fn spawn_heir(&mut self, remaining_grain: i64, position: Position) -> SimResult<PersonId> {
        let id = self.board.next_person_id();
        let mut heir = Person::random(id, &self.config, &mut self.rng);
        heir.age = 0;
        let inheritance = percent_of(remaining_grain.max(0), self.config.wealth_inheritance_percent);
        heir.add_grain(inheritance);

        trace!(id, inheritance, ?position, "heir spawned");
        self.board.put(heir, i64::from(position.x), i64::from(position.y))?;
        Ok(id)
    }

    /// Grow every patch by the configured amount, clamped to capacity.
    fn grow_patches(&mut self) {
        for patch in self.board.patches_mut() {
            patch.add_grain(self.config.growth_amount(patch.max_grain()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EdgePolicy;
    use crate::record::MemorySink;
    use crate::world::Patch;

    fn tiny_config() -> SimConfig {
        SimConfig {
            num_people: 0,
            time_max: 5,
            board_width: 1,
            board_height: 1,
            grain_growth_rate: 0,
            ..SimConfig::default()
        }
    }

    fn lone_board(grain: i64, metabolism: u32, life_expectancy: u32) -> Board {
        let mut board = Board::new(1, 1, EdgePolicy::Bounded).unwrap();
        board
            .put(Person::new(0, grain, 1, metabolism, life_expectancy), 0, 0)
            .unwrap();
        board
    }

    #[test]
    fn test_new_places_population() {
        let config = SimConfig {
            num_people: 40,
            ..SimConfig::default()
        };
        let sim = Simulation::new(config).unwrap();
        assert_eq!(sim.board().population(), 40);
        assert_eq!(sim.phase(), Phase::Initialized);
        assert_eq!(sim.time(), 0);
    }

    #[test]
    fn test_same_position_starts_at_centre() {
        let config = SimConfig {
            num_people: 10,
            same_position_enabled: true,
            ..SimConfig::default()
        };
        let sim = Simulation::new(config).unwrap();
        let centre = Position::new(25, 25);
        assert!(sim.board().people().all(|p| p.position == centre));
        assert_eq!(sim.board().all_positions().len(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            grain_growth_interval: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_lone_person_starves_out() {
        let mut sim = Simulation::with_board(tiny_config(), lone_board(5, 1, 100)).unwrap();

        for expected in (0..5).rev() {
            sim.step().unwrap();
            assert_eq!(sim.board().person(0).unwrap().grain, expected);
        }
        let report = sim.step().unwrap();
        assert_eq!(report.deaths, 1);
        assert_eq!(sim.board().population(), 0);
    }

    #[test]
    fn test_run_records_every_tick() {
        let mut sim = Simulation::with_board(tiny_config(), lone_board(5, 1, 100)).unwrap();
        let mut sink = MemorySink::default();

        let summary = sim.run(&mut sink).unwrap();

        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.final_time, 5);
        let times: Vec<u32> = sink.snapshots.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(sim.phase(), Phase::Finished);
    }

    #[test]
    fn test_run_twice_fails() {
        let mut sim = Simulation::with_board(tiny_config(), lone_board(5, 1, 100)).unwrap();
        let mut sink = MemorySink::default();
        sim.run(&mut sink).unwrap();
        assert_eq!(sim.run(&mut sink).unwrap_err(), SimError::AlreadyFinished);
        assert_eq!(sim.step().unwrap_err(), SimError::AlreadyFinished);
    }

    #[test]
    fn test_growth_gated_by_interval() {
        let config = SimConfig {
            grain_growth_interval: 3,
            grain_growth_rate: 2,
            ..tiny_config()
        };
        let mut board = Board::new(1, 1, EdgePolicy::Bounded).unwrap();
        *board.patch_mut(Position::new(0, 0)).unwrap() = Patch::with_grain(0, 50);
        let mut sim = Simulation::with_board(config, board).unwrap();

        let grew: Vec<bool> = (0..6).map(|_| sim.step().unwrap().grew).collect();
        assert_eq!(grew, vec![true, false, false, true, false, false]);
        assert_eq!(sim.board().patches()[0].grain(), 4);
    }

    #[test]
    fn test_proportional_growth() {
        let config = SimConfig {
            proportional_growth_enabled: true,
            patch_growth_percent: 20,
            ..tiny_config()
        };
        let mut board = Board::new(1, 1, EdgePolicy::Bounded).unwrap();
        *board.patch_mut(Position::new(0, 0)).unwrap() = Patch::with_grain(0, 50);
        let mut sim = Simulation::with_board(config, board).unwrap();

        sim.step().unwrap();
        assert_eq!(sim.board().patches()[0].grain(), 10);
    }

    #[test]
    fn test_inheritance_spawns_heir() {
        let config = SimConfig {
            wealth_inheritance_enabled: true,
            wealth_inheritance_percent: 50,
            ..tiny_config()
        };
        // Dies of old age on the first tick holding 40 - 1 = 39 grain.
        let mut sim = Simulation::with_board(config, lone_board(40, 1, 0)).unwrap();

        let report = sim.step().unwrap();

        assert_eq!(report.deaths, 1);
        assert_eq!(report.births, 1);
        let heir = sim.board().people().next().unwrap();
        assert_eq!(heir.id, 1);
        assert_eq!(heir.age, 0);
        assert_eq!(heir.position, Position::new(0, 0));
        assert!(heir.grain >= i64::from(heir.metabolism) + 19);
    }

    #[test]
    fn test_no_inheritance_no_births() {
        let mut sim = Simulation::with_board(tiny_config(), lone_board(40, 1, 0)).unwrap();
        let report = sim.step().unwrap();
        assert_eq!(report.deaths, 1);
        assert_eq!(report.births, 0);
        assert_eq!(sim.board().population(), 0);
    }

    #[test]
    fn test_empty_population_ticks_cleanly() {
        let board = Board::new(2, 2, EdgePolicy::Bounded).unwrap();
        let mut sim = Simulation::with_board(tiny_config(), board).unwrap();
        let report = sim.step().unwrap();
        assert!(report.harvest.skipped);
        assert_eq!(report.population, 0);
    }

    #[test]
    fn test_per_agent_mode_harvests_per_person() {
        let config = SimConfig {
            harvest_mode: HarvestMode::PerAgent,
            ..tiny_config()
        };
        let mut board = Board::new(1, 1, EdgePolicy::Bounded).unwrap();
        *board.patch_mut(Position::new(0, 0)).unwrap() = Patch::with_grain(10, 50);
        board.put(Person::new(0, 5, 1, 1, 100), 0, 0).unwrap();
        board.put(Person::new(1, 5, 1, 1, 100), 0, 0).unwrap();
        let mut sim = Simulation::with_board(config, board).unwrap();

        let report = sim.step().unwrap();

        // The first harvest empties the patch; the second finds nothing.
        assert_eq!(report.harvest.harvested, 10);
        assert!(!report.harvest.skipped);
        assert_eq!(sim.board().person(0).unwrap().grain, 5 + 5 - 1);
        assert_eq!(sim.board().person(1).unwrap().grain, 5 + 5 - 1);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let config = SimConfig {
            num_people: 30,
            time_max: 20,
            ..SimConfig::default()
        };
        let mut a = Simulation::new(config.clone()).unwrap();
        let mut b = Simulation::new(config).unwrap();
        let mut sink_a = MemorySink::default();
        let mut sink_b = MemorySink::default();
        a.run(&mut sink_a).unwrap();
        b.run(&mut sink_b).unwrap();
        assert_eq!(sink_a.snapshots, sink_b.snapshots);
    }
}
