//! Run configuration.
//!
//! Every tunable of a run lives in [`SimConfig`], which is handed to the
//! simulation by value and never mutated afterwards. Fractional policy
//! knobs (tax rate, inheritance share, proportional growth) are integer
//! percents so the economy stays in exact integer arithmetic.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// How coordinates outside the grid are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// The grid has hard edges. Foraging never looks past them and placing
    /// a person outside fails with `OutOfBounds`.
    #[default]
    Bounded,
    /// The grid is a torus; coordinates wrap around.
    Wrap,
}

/// How often the harvest runs within a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestMode {
    /// Plan every move, harvest once, then move everyone.
    #[default]
    PerTick,
    /// Harvest again before each person moves. Reproduces the legacy model
    /// where harvest sat inside the per-person loop.
    PerAgent,
}

/// Full configuration of a simulation run.
#[allow(missing_copy_implementations)] // Handed over once and owned by the simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Seed for every random draw in the run.
    pub seed: u64,
    /// Initial population.
    pub num_people: u32,
    /// Number of ticks to run.
    pub time_max: u32,
    /// Patches grow when `time % grain_growth_interval == 0`.
    pub grain_growth_interval: u32,
    /// Flat grain added per growth step when proportional growth is off.
    pub grain_growth_rate: u32,
    /// Grid width in patches.
    pub board_width: u16,
    /// Grid height in patches.
    pub board_height: u16,
    /// Upper bound on any patch's capacity.
    pub max_grain: u32,
    /// Percent of patches seeded at `max_grain` before diffusion.
    pub percent_best_land: u32,
    /// Vision is drawn from `1..=max_vision`.
    pub max_vision: u32,
    /// Metabolism is drawn from `1..=metabolism_max`.
    pub metabolism_max: u32,
    /// Lower bound of the life expectancy draw.
    pub life_expectancy_min: u32,
    /// Upper bound (inclusive) of the life expectancy draw.
    pub life_expectancy_max: u32,
    /// Starting grain is metabolism plus a draw from `0..initial_grain_bonus`.
    pub initial_grain_bonus: u32,
    /// Spawn an heir when a person dies.
    pub wealth_inheritance_enabled: bool,
    /// Percent of the dead person's grain passed to the heir.
    pub wealth_inheritance_percent: u32,
    /// Grow patches by a percent of their capacity instead of a flat rate.
    pub proportional_growth_enabled: bool,
    /// Percent of capacity added per growth step.
    pub patch_growth_percent: u32,
    /// Skim harvest from the wealthy and hand it to the poor.
    pub taxation_enabled: bool,
    /// Percent of a high tier share taken as tax.
    pub tax_percent: u32,
    /// Start everyone on the centre cell.
    pub same_position_enabled: bool,
    /// Wealth at or below this percent of the maximum is the low tier.
    pub low_tier_percent: u32,
    /// Wealth above this percent of the maximum is the high tier.
    pub high_tier_percent: u32,
    /// Board edge behaviour.
    pub edge_policy: EdgePolicy,
    /// Harvest invocation policy.
    pub harvest_mode: HarvestMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_people: 250,
            time_max: 1000,
            grain_growth_interval: 1,
            grain_growth_rate: 4,
            board_width: 50,
            board_height: 50,
            max_grain: 50,
            percent_best_land: 10,
            max_vision: 5,
            metabolism_max: 15,
            life_expectancy_min: 1,
            life_expectancy_max: 83,
            initial_grain_bonus: 50,
            wealth_inheritance_enabled: false,
            wealth_inheritance_percent: 50,
            proportional_growth_enabled: false,
            patch_growth_percent: 20,
            taxation_enabled: false,
            tax_percent: 10,
            same_position_enabled: false,
            low_tier_percent: 33,
            high_tier_percent: 66,
            edge_policy: EdgePolicy::Bounded,
            harvest_mode: HarvestMode::PerTick,
        }
    }
}

impl SimConfig {
    /// Load a configuration from a JSON file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `Setup` if the file cannot be read and `InvalidConfig` if it
    /// does not parse or fails validation.
    pub fn from_json_file(path: &Path) -> SimResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| SimError::Setup(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Parse a configuration from JSON text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the text does not parse or fails validation.
    pub fn from_json_str(text: &str) -> SimResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| SimError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a runnable simulation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> SimResult<()> {
        let fail = |reason: &str| Err(SimError::InvalidConfig(reason.to_string()));

        if self.board_width == 0 || self.board_height == 0 {
            return fail("board dimensions must be non-zero");
        }
        if self.grain_growth_interval == 0 {
            return fail("grain_growth_interval must be at least 1");
        }
        if self.max_vision == 0 {
            return fail("max_vision must be at least 1");
        }
        if self.metabolism_max == 0 {
            return fail("metabolism_max must be at least 1");
        }
        if self.life_expectancy_min > self.life_expectancy_max {
            return fail("life_expectancy_min exceeds life_expectancy_max");
        }
        for (name, value) in [
            ("percent_best_land", self.percent_best_land),
            ("wealth_inheritance_percent", self.wealth_inheritance_percent),
            ("patch_growth_percent", self.patch_growth_percent),
            ("tax_percent", self.tax_percent),
            ("low_tier_percent", self.low_tier_percent),
            ("high_tier_percent", self.high_tier_percent),
        ] {
            if value > 100 {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be within 0..=100, got {value}"
                )));
            }
        }
        if self.low_tier_percent > self.high_tier_percent {
            return fail("low_tier_percent exceeds high_tier_percent");
        }
        Ok(())
    }

    /// Grain added to a patch of the given capacity in one growth step.
    #[must_use]
    pub fn growth_amount(&self, max_grain: u32) -> u32 {
        if self.proportional_growth_enabled {
            percent_of_u32(max_grain, self.patch_growth_percent)
        } else {
            self.grain_growth_rate
        }
    }
}

/// `value * percent / 100`, floored.
#[must_use]
pub(crate) fn percent_of_u32(value: u32, percent: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// `value * percent / 100`, floored toward zero.
#[must_use]
pub(crate) fn percent_of(value: i64, percent: u32) -> i64 {
    value.saturating_mul(i64::from(percent)) / 100
}
