//! JSON lines record sink.

use std::io::Write;

use crate::error::{SimError, SimResult};
use crate::record::{RecordSink, Snapshot, TierCutoffs};
use crate::world::Board;

/// Writes one JSON object per record, newline separated.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    cutoffs: TierCutoffs,
    closed: bool,
}

impl<W: Write> JsonLinesSink<W> {
    /// Create a sink. Nothing is written until the first record.
    #[must_use]
    pub const fn new(writer: W, cutoffs: TierCutoffs) -> Self {
        Self {
            writer,
            cutoffs,
            closed: false,
        }
    }

    /// The underlying writer.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn record(&mut self, board: &Board, time: u32) -> SimResult<()> {
        if self.closed {
            return Err(SimError::Io("json sink is closed".to_string()));
        }
        let snap = Snapshot::capture(board, time, self.cutoffs);
        serde_json::to_writer(&mut self.writer, &snap).map_err(|e| SimError::Io(e.to_string()))?;
        self.writer.write_all(b"\n")?;
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
