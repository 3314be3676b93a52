//! People: the mobile, grain-hoarding agents.

use rand::Rng;
use serde::Serialize;

use crate::config::SimConfig;
use crate::world::Position;

/// Unique identifier for a person. Ids are handed out in increasing order
/// and never reused within a run.
pub type PersonId = u32;

/// Wealth class of a person relative to the richest person alive.
///
/// With `m` the maximum wealth, `low` and `high` the configured cutoff
/// percents:
/// - `grain * 100 <= m * low`  → `Low`
/// - `grain * 100 <= m * high` → `Middle`
/// - otherwise                 → `High`
///
/// When `m <= 0` everyone is `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WealthTier {
    /// Bottom of the distribution. Receives redistributed tax.
    Low,
    /// Neither taxed nor subsidised.
    Middle,
    /// Top of the distribution. Pays tax on harvest.
    High,
}

impl WealthTier {
    /// Classify `grain` against `max_wealth` using percent cutoffs.
    #[must_use]
    pub fn classify(grain: i64, max_wealth: i64, low_percent: u32, high_percent: u32) -> Self {
        if max_wealth <= 0 {
            return WealthTier::Low;
        }
        let scaled = i128::from(grain) * 100;
        let max = i128::from(max_wealth);
        if scaled <= max * i128::from(low_percent) {
            WealthTier::Low
        } else if scaled <= max * i128::from(high_percent) {
            WealthTier::Middle
        } else {
            WealthTier::High
        }
    }
}

/// A single person on the board.
#[allow(missing_copy_implementations)] // The board owns people; copies would drift from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Unique identifier.
    pub id: PersonId,
    /// Current cell. Owned by the board; change it through `Board::put`.
    pub position: Position,
    /// Wealth. Negative only transiently, between eating and dying.
    pub grain: i64,
    /// Ticks lived so far.
    pub age: u32,
    /// How many cells ahead the person can see in each direction.
    pub vision: u32,
    /// Grain eaten per tick.
    pub metabolism: u32,
    /// Age past which the person dies.
    pub life_expectancy: u32,
}

impl Person {
    /// Create a person with explicit attributes at the origin.
    #[must_use]
    pub fn new(id: PersonId, grain: i64, vision: u32, metabolism: u32, life_expectancy: u32) -> Self {
        Self {
            id,
            position: Position::new(0, 0),
            grain,
            age: 0,
            vision,
            metabolism,
            life_expectancy,
        }
    }

    /// Draw a person with random attributes.
    ///
    /// Vision and metabolism start at 1, starting grain is the metabolism
    /// plus a random bonus, and the age is a random point in the lifespan
    /// so the population does not die off in lockstep.
    pub fn random<R: Rng + ?Sized>(id: PersonId, config: &SimConfig, rng: &mut R) -> Self {
        let vision = rng.random_range(1..=config.max_vision);
        let metabolism = rng.random_range(1..=config.metabolism_max);
        let life_expectancy =
            rng.random_range(config.life_expectancy_min..=config.life_expectancy_max);
        let bonus = if config.initial_grain_bonus == 0 {
            0
        } else {
            rng.random_range(0..config.initial_grain_bonus)
        };
        let age = rng.random_range(0..=life_expectancy);

        Self {
            id,
            position: Position::new(0, 0),
            grain: i64::from(metabolism) + i64::from(bonus),
            age,
            vision,
            metabolism,
            life_expectancy,
        }
    }

    /// Credit grain to this person.
    pub fn add_grain(&mut self, amount: i64) {
        self.grain = self.grain.saturating_add(amount);
    }

    /// Wealth tier relative to `max_wealth`.
    #[must_use]
    pub fn wealth_tier(&self, max_wealth: i64, config: &SimConfig) -> WealthTier {
        WealthTier::classify(
            self.grain,
            max_wealth,
            config.low_tier_percent,
            config.high_tier_percent,
        )
    }

    /// Eat one tick's worth of grain and grow one tick older.
    pub fn eat_and_age(&mut self) {
        self.grain = self.grain.saturating_sub(i64::from(self.metabolism));
        self.age = self.age.saturating_add(1);
    }

    /// Whether the person has starved or outlived their life expectancy.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.grain < 0 || self.age > self.life_expectancy
    }
}
