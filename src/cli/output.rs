//! Output formatting utilities for CLI.

use std::fmt::Write;
use std::path::Path;
use std::time::Duration;
use wealthscape::{RunSummary, Snapshot};

/// Format the end-of-run summary as human-readable text.
pub(super) fn format_summary(
    summary: &RunSummary,
    last: &Snapshot,
    output: &Path,
    elapsed: Duration,
) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "Simulation finished after {} ticks", summary.ticks);
    let _ = writeln!(
        text,
        "  Population: {} (low {}, middle {}, high {})",
        last.population, last.low, last.middle, last.high
    );
    let _ = writeln!(
        text,
        "  Deaths: {}  Heirs: {}",
        summary.total_deaths, summary.total_births
    );
    let _ = writeln!(
        text,
        "  Wealth: {} total, {} max, gini {:.3}",
        last.total_wealth, last.max_wealth, last.gini
    );
    let _ = writeln!(text, "  Grain on patches: {}", last.patch_grain);
    let _ = writeln!(text, "  Records: {}", output.display());
    let _ = writeln!(text, "  Duration: {:.2}s", elapsed.as_secs_f64());

    text
}
