//! Per-tick records of the simulation.
//!
//! A [`RecordSink`] receives the board after setup (time 0) and after every
//! tick. Sinks summarise the board into a [`Snapshot`] and write it out:
//! - [`CsvSink`] - one header row, one row per record
//! - [`JsonLinesSink`] - one JSON object per line
//! - [`MemorySink`] - keeps snapshots in memory (tests, benches)
//!
//! File-backed sinks are wrapped in an [`OutputGuard`] so they are flushed
//! and closed even when the run fails part way.

// Gini works in floating point over counts
#![allow(clippy::cast_precision_loss)]

mod csv;
mod json;

pub use csv::{CSV_HEADER, CsvSink, format_row};
pub use json::JsonLinesSink;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::world::{Board, WealthTier};

/// Wealth tier cutoffs used when counting tiers in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCutoffs {
    /// Percent of max wealth at or below which a person is low tier.
    pub low_percent: u32,
    /// Percent of max wealth above which a person is high tier.
    pub high_percent: u32,
}

impl From<&SimConfig> for TierCutoffs {
    fn from(config: &SimConfig) -> Self {
        Self {
            low_percent: config.low_tier_percent,
            high_percent: config.high_tier_percent,
        }
    }
}

impl Default for TierCutoffs {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

/// Summary of the board at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    /// Tick the snapshot was taken after (0 = initial state).
    pub time: u32,
    /// Live people.
    pub population: usize,
    /// People in the low tier.
    pub low: usize,
    /// People in the middle tier.
    pub middle: usize,
    /// People in the high tier.
    pub high: usize,
    /// Grain held by people.
    pub total_wealth: i64,
    /// Richest person's grain (0 when empty).
    pub max_wealth: i64,
    /// Grain left on patches.
    pub patch_grain: u64,
    /// Gini coefficient of wealth, in `[0, 1]`.
    pub gini: f64,
}

impl Snapshot {
    /// Summarise the board.
    #[must_use]
    pub fn capture(board: &Board, time: u32, cutoffs: TierCutoffs) -> Self {
        let max_wealth = board.max_wealth().unwrap_or(0);
        let (mut low, mut middle, mut high) = (0, 0, 0);
        for person in board.people() {
            match WealthTier::classify(
                person.grain,
                max_wealth,
                cutoffs.low_percent,
                cutoffs.high_percent,
            ) {
                WealthTier::Low => low += 1,
                WealthTier::Middle => middle += 1,
                WealthTier::High => high += 1,
            }
        }

        let mut wealth: Vec<i64> = board.people().map(|p| p.grain).collect();
        wealth.sort_unstable();

        Self {
            time,
            population: board.population(),
            low,
            middle,
            high,
            total_wealth: board.total_person_grain(),
            max_wealth,
            patch_grain: board.total_patch_grain(),
            gini: gini(&wealth),
        }
    }
}

/// Gini coefficient of an ascending wealth list via the Lorenz curve.
///
/// Zero for an empty list or when nobody owns anything.
#[must_use]
pub fn gini(sorted_wealth: &[i64]) -> f64 {
    let n = sorted_wealth.len();
    let total: i64 = sorted_wealth.iter().map(|w| (*w).max(0)).sum();
    if n == 0 || total == 0 {
        return 0.0;
    }

    let total = total as f64;
    let count = n as f64;
    let mut cumulative = 0.0;
    let mut reserve = 0.0;
    for (i, wealth) in sorted_wealth.iter().enumerate() {
        cumulative += (*wealth).max(0) as f64;
        reserve += (i + 1) as f64 / count - cumulative / total;
    }

    (reserve / count / 0.5).clamp(0.0, 1.0)
}

/// Destination for per-tick records.
pub trait RecordSink {
    /// Append a record of the board at `time`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the record cannot be written.
    fn record(&mut self, board: &Board, time: u32) -> SimResult<()>;

    /// Flush and release the output. Further records are an error.
    ///
    /// # Errors
    ///
    /// Returns `Io` if flushing fails.
    fn close(&mut self) -> SimResult<()>;
}

/// Keeps every snapshot in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Snapshots in recording order.
    pub snapshots: Vec<Snapshot>,
    /// Cutoffs used for tier counts.
    pub cutoffs: TierCutoffs,
    /// Whether `close` has been called.
    pub closed: bool,
}

impl MemorySink {
    /// Create an empty sink counting tiers with `cutoffs`.
    #[must_use]
    pub fn new(cutoffs: TierCutoffs) -> Self {
        Self {
            snapshots: Vec::new(),
            cutoffs,
            closed: false,
        }
    }
}

impl RecordSink for MemorySink {
    fn record(&mut self, board: &Board, time: u32) -> SimResult<()> {
        if self.closed {
            return Err(SimError::Io("sink is closed".to_string()));
        }
        self.snapshots.push(Snapshot::capture(board, time, self.cutoffs));
        Ok(())
    }

    fn close(&mut self) -> SimResult<()> {
        self.closed = true;
        Ok(())
    }
}

/// On-disk record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// One JSON object per line.
    JsonLines,
}

/// Create a buffered file sink.
///
/// # Errors
///
/// Returns `Setup` if the file cannot be created, or `Io` if the header
/// cannot be written.
pub fn create_file_sink(
    path: &Path,
    format: RecordFormat,
    cutoffs: TierCutoffs,
) -> SimResult<Box<dyn RecordSink>> {
    let file = File::create(path)
        .map_err(|e| SimError::Setup(format!("cannot create {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);

    Ok(match format {
        RecordFormat::Csv => Box::new(CsvSink::new(writer, cutoffs)?),
        RecordFormat::JsonLines => Box::new(JsonLinesSink::new(writer, cutoffs)),
    })
}

/// Owns a sink and guarantees it is closed.
///
/// Call [`OutputGuard::finish`] to close and see any error. If the guard is
/// dropped without that, for example because the run failed, the sink is
/// closed on drop and a close error is logged.
pub struct OutputGuard {
    /// The guarded sink.
    sink: Box<dyn RecordSink>,
    /// Whether `close` already ran.
    closed: bool,
}

impl std::fmt::Debug for OutputGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputGuard")
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl OutputGuard {
    /// Take ownership of a sink.
    #[must_use]
    pub fn new(sink: Box<dyn RecordSink>) -> Self {
        Self {
            sink,
            closed: false,
        }
    }

    /// The guarded sink.
    pub fn sink(&mut self) -> &mut dyn RecordSink {
        self.sink.as_mut()
    }

    /// Close the sink, surfacing any flush error.
    ///
    /// # Errors
    ///
    /// Returns the sink's close error.
    pub fn finish(mut self) -> SimResult<()> {
        self.closed = true;
        self.sink.close()
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(err) = self.sink.close() {
                warn!(%err, "failed to close output on drop");
            }
        }
    }
}
