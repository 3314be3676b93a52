//! Run command implementation.

use super::output::format_summary;
use super::{CliError, OutputFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use wealthscape::record::create_file_sink;
use wealthscape::{OutputGuard, SimConfig, Simulation, Snapshot, TierCutoffs};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the output cannot be created, the simulation
/// cannot be built, a tick fails or the records cannot be flushed. The
/// output file is opened first so a bad path is reported before any
/// setup work.
pub(crate) fn execute(
    config: SimConfig,
    format: OutputFormat,
    output: &Path,
    progress: bool,
) -> Result<(), CliError> {
    let cutoffs = TierCutoffs::from(&config);
    let ticks = config.time_max;

    let mut guard = OutputGuard::new(create_file_sink(output, format.into(), cutoffs)?);
    let mut sim = Simulation::new(config)?;

    let pb = if progress {
        let pb = ProgressBar::new(u64::from(ticks));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ticks ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let summary = sim.run_with(guard.sink(), |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    })?;
    guard.finish()?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let last = Snapshot::capture(sim.board(), sim.time(), cutoffs);
    print!("{}", format_summary(&summary, &last, output, start.elapsed()));
    Ok(())
}
