//! Spatial layer of the simulation.
//!
//! - Grid of grain-bearing patches
//! - People with vision, metabolism and a life expectancy
//! - Board tying the two together with an occupancy index
//! - Terrain generation and invariant checks

mod board;
mod invariants;
mod patch;
mod person;
mod position;
mod terrain;

pub use board::{Board, Fate};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use patch::Patch;
pub use person::{Person, PersonId, WealthTier};
pub use position::{Direction, Position};
pub use terrain::generate_terrain;
