// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Wealthscape: a deterministic grid simulation of wealth distribution.
//!
//! People forage a grid of grain-growing patches, harvest what they stand
//! on, eat, age and die. Optional policies (taxation, inheritance,
//! proportional growth) change how grain flows between them. Runs are fully
//! determined by their [`SimConfig`], seed included.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Record sinks (CSV / JSON lines)   │
//! ├─────────────────────────────────────┤
//! │   Simulation loop + harvest         │
//! ├─────────────────────────────────────┤
//! │   World (board, patches, people)    │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod record;
pub mod simulation;
pub mod world;

pub use config::{EdgePolicy, HarvestMode, SimConfig};
pub use error::{SimError, SimResult};
pub use record::{OutputGuard, RecordFormat, RecordSink, Snapshot, TierCutoffs};
pub use simulation::{Phase, RunSummary, Simulation, TickReport};
pub use world::{Board, Patch, Person, PersonId, Position, WealthTier};
