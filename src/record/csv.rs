//! CSV record sink.

use std::io::Write;

use crate::error::{SimError, SimResult};
use crate::record::{RecordSink, Snapshot, TierCutoffs};
use crate::world::Board;

/// Header row written before the first record.
pub const CSV_HEADER: &str = "time,population,low,middle,high,total_wealth,max_wealth,patch_grain,gini";

/// Writes one CSV row per record.
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    /// Destination.
    writer: W,
    /// Cutoffs for tier counts.
    cutoffs: TierCutoffs,
    /// Set once `close` has run.
    closed: bool,
}

impl<W: Write> CsvSink<W> {
    /// Create a sink and write the header row.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the header cannot be written.
    pub fn new(mut writer: W, cutoffs: TierCutoffs) -> SimResult<Self> {
        writeln!(writer, "{CSV_HEADER}")?;
        Ok(Self {
            writer,
            cutoffs,
            closed: false,
        })
    }

    /// The underlying writer.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }
}

/// Format a snapshot as one CSV row, without the newline.
#[must_use]
pub fn format_row(snap: &Snapshot) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{:.6}",
        snap.time,
        snap.population,
        snap.low,
        snap.middle,
        snap.high,
        snap.total_wealth,
        snap.max_wealth,
        snap.patch_grain,
        snap.gini
    )
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn record(&mut self, board: &Board, time: u32) -> SimResult<()> {
        if self.closed {
            return Err(SimError::Io("csv sink is closed".to_string()));
        }
        let snap = Snapshot::capture(board, time, self.cutoffs);
        writeln!(self.writer, "{}", format_row(&snap))?;
        Ok(())
    }

    fn close(&mut self) -> SimResult<()> {
        if !self.closed {
            self.closed = true;
            self.writer.flush()?;
        }
        Ok(())
    }
}
