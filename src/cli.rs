//! CLI command implementations for Wealthscape.

pub(crate) mod run;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use wealthscape::{EdgePolicy, HarvestMode, RecordFormat, SimConfig, SimError};

/// Record format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    /// Record file used when `--output` is not given.
    pub(crate) fn default_output(self) -> PathBuf {
        match self {
            Self::Csv => PathBuf::from("wealthscape.csv"),
            Self::Json => PathBuf::from("wealthscape.jsonl"),
        }
    }
}

impl From<OutputFormat> for RecordFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => Self::Csv,
            OutputFormat::Json => Self::JsonLines,
        }
    }
}

/// Configuration flags shared by the commands.
///
/// Values come from `--config` when given, otherwise the defaults; any flag
/// set on the command line wins. Each feature switch has a `--no-` twin so
/// a file can be overridden in either direction; the last of a pair wins.
#[allow(clippy::struct_excessive_bools)] // One field per command-line switch
#[derive(Debug, Default, clap::Args)]
pub(crate) struct ConfigArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Initial population
    #[arg(long)]
    num_people: Option<u32>,

    /// Ticks to run
    #[arg(long)]
    time_max: Option<u32>,

    /// Grow patches every N ticks
    #[arg(long)]
    grain_growth_interval: Option<u32>,

    /// Grain added per growth step
    #[arg(long)]
    grain_growth_rate: Option<u32>,

    /// Tax the high tier's harvest and hand it to the low tier
    #[arg(long, overrides_with = "no_taxation")]
    taxation: bool,

    /// Turn taxation off
    #[arg(long, overrides_with = "taxation")]
    no_taxation: bool,

    /// Percent of a high tier share taken as tax
    #[arg(long)]
    tax_percent: Option<u32>,

    /// Spawn an heir when a person dies
    #[arg(long, overrides_with = "no_inheritance")]
    inheritance: bool,

    /// Let the dead leave no heir
    #[arg(long, overrides_with = "inheritance")]
    no_inheritance: bool,

    /// Grow patches by a percent of capacity
    #[arg(long, overrides_with = "no_proportional_growth")]
    proportional_growth: bool,

    /// Grow patches by a fixed amount
    #[arg(long, overrides_with = "proportional_growth")]
    no_proportional_growth: bool,

    /// Start everyone on the centre cell
    #[arg(long, overrides_with = "no_same_position")]
    same_position: bool,

    /// Scatter people at random
    #[arg(long, overrides_with = "same_position")]
    no_same_position: bool,

    /// Wrap the board edges into a torus
    #[arg(long)]
    wrap: bool,

    /// Harvest before every person's move instead of once per tick
    #[arg(long)]
    legacy_harvest: bool,
}

impl ConfigArgs {
    /// Build the effective configuration and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result is invalid.
    pub(crate) fn resolve(&self) -> Result<SimConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(n) = self.num_people {
            config.num_people = n;
        }
        if let Some(t) = self.time_max {
            config.time_max = t;
        }
        if let Some(interval) = self.grain_growth_interval {
            config.grain_growth_interval = interval;
        }
        if let Some(rate) = self.grain_growth_rate {
            config.grain_growth_rate = rate;
        }
        if let Some(percent) = self.tax_percent {
            config.tax_percent = percent;
        }
        switch(&mut config.taxation_enabled, self.taxation, self.no_taxation);
        switch(
            &mut config.wealth_inheritance_enabled,
            self.inheritance,
            self.no_inheritance,
        );
        switch(
            &mut config.proportional_growth_enabled,
            self.proportional_growth,
            self.no_proportional_growth,
        );
        switch(
            &mut config.same_position_enabled,
            self.same_position,
            self.no_same_position,
        );
        if self.wrap {
            config.edge_policy = EdgePolicy::Wrap;
        }
        if self.legacy_harvest {
            config.harvest_mode = HarvestMode::PerAgent;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Apply an on/off flag pair to a setting, leaving it alone if neither is set.
fn switch(setting: &mut bool, on: bool, off: bool) {
    if on {
        *setting = true;
    } else if off {
        *setting = false;
    }
}

/// Print a configuration as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub(crate) fn show_config(config: &SimConfig) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
    println!("{json}");
    Ok(())
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<SimError> for CliError {
    fn from(e: SimError) -> Self {
        Self::new(e.to_string())
    }
}
