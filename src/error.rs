//! Error types for the simulation.

use std::fmt;

use crate::world::PersonId;

/// Errors raised while setting up or running a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A cell lookup or placement fell outside the grid.
    OutOfBounds {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
    },
    /// A person id that is not (or no longer) on the board.
    UnknownPerson(PersonId),
    /// The configuration failed validation.
    InvalidConfig(String),
    /// The output sink could not be created.
    Setup(String),
    /// Writing or flushing a record failed.
    Io(String),
    /// `run` was called on a simulation that already finished.
    AlreadyFinished,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::OutOfBounds { x, y } => write!(f, "position ({x}, {y}) is out of bounds"),
            SimError::UnknownPerson(id) => write!(f, "unknown person {id}"),
            SimError::InvalidConfig(reason) => write!(f, "invalid configuration: {reason}"),
            SimError::Setup(reason) => write!(f, "setup failed: {reason}"),
            SimError::Io(reason) => write!(f, "i/o error: {reason}"),
            SimError::AlreadyFinished => write!(f, "simulation already finished"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
