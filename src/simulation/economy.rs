//! Harvest economy: empty every occupied patch into the pockets of the people on it.
//!
//! # Rounding
//!
//! All arithmetic is integer and floors:
//! - a patch's grain is split evenly, the remainder is lost
//! - a high tier person's tax is `share * tax_percent / 100`
//! - the tax pool is split evenly among the low tier, the remainder is lost
//!
//! Tiers are computed once, from wealth before any grain changes hands.

use std::collections::BTreeMap;

use tracing::trace;

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::world::{Board, PersonId, Position, WealthTier};

/// What one harvest moved around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// No one was alive, nothing happened.
    pub skipped: bool,
    /// Richest person's wealth before the harvest.
    pub max_wealth: Option<i64>,
    /// Grain removed from patches.
    pub harvested: u64,
    /// Grain credited directly to harvesters, after tax.
    pub distributed: u64,
    /// Grain lost to the per-patch integer split.
    pub truncated: u64,
    /// Grain skimmed from high tier shares.
    pub tax_collected: u64,
    /// Grain handed to the low tier.
    pub tax_redistributed: u64,
    /// Tax left over: split remainder, or the whole pool when no one is low tier.
    pub tax_undistributed: u64,
}

impl HarvestReport {
    /// Fold another report into this one.
    pub fn absorb(&mut self, other: &HarvestReport) {
        self.skipped &= other.skipped;
        self.max_wealth = self.max_wealth.or(other.max_wealth);
        self.harvested += other.harvested;
        self.distributed += other.distributed;
        self.truncated += other.truncated;
        self.tax_collected += other.tax_collected;
        self.tax_redistributed += other.tax_redistributed;
        self.tax_undistributed += other.tax_undistributed;
    }

    /// Grain that left the system in this harvest.
    #[must_use]
    pub const fn lost(&self) -> u64 {
        self.truncated + self.tax_undistributed
    }
}

/// Run one harvest over the whole board.
///
/// Occupied patches are processed in row-major order. An empty board is
/// reported as `skipped` and left untouched.
///
/// # Errors
///
/// Returns `OutOfBounds` or `UnknownPerson` only if the occupancy index is
/// corrupt.
pub fn harvest(board: &mut Board, config: &SimConfig) -> SimResult<HarvestReport> {
    let mut report = HarvestReport::default();

    let mut wealth: Vec<i64> = board.people().map(|p| p.grain).collect();
    wealth.sort_unstable();
    let Some(&max_wealth) = wealth.last() else {
        report.skipped = true;
        return Ok(report);
    };
    report.max_wealth = Some(max_wealth);

    let tiers: BTreeMap<PersonId, WealthTier> = board
        .people()
        .map(|p| (p.id, p.wealth_tier(max_wealth, config)))
        .collect();

    let groups: Vec<(Position, Vec<PersonId>)> = board
        .all_positions()
        .iter()
        .map(|(pos, ids)| (*pos, ids.iter().copied().collect()))
        .collect();

    let mut pool: u64 = 0;
    for (pos, ids) in groups {
        let grain = u64::from(board.patch_mut(pos)?.remove_all());
        let count = ids.len() as u64;
        let share = grain / count;
        report.harvested += grain;
        report.truncated += grain - share * count;

        for id in ids {
            let taxed = config.taxation_enabled && tiers.get(&id) == Some(&WealthTier::High);
            let (credited, tax) = if taxed {
                split_tax(share, config.tax_percent)
            } else {
                (share, 0)
            };
            pool += tax;
            credit(board, id, credited)?;
            report.distributed += credited;
        }
    }
    report.tax_collected = pool;

    if config.taxation_enabled && pool > 0 {
        let poor: Vec<PersonId> = tiers
            .iter()
            .filter(|(_, tier)| **tier == WealthTier::Low)
            .map(|(id, _)| *id)
            .collect();

        if poor.is_empty() {
            report.tax_undistributed = pool;
        } else {
            let each = pool / poor.len() as u64;
            for &id in &poor {
                credit(board, id, each)?;
            }
            report.tax_redistributed = each * poor.len() as u64;
            report.tax_undistributed = pool - report.tax_redistributed;
        }
    }

    trace!(
        harvested = report.harvested,
        truncated = report.truncated,
        tax_collected = report.tax_collected,
        tax_redistributed = report.tax_redistributed,
        "harvest complete"
    );

    Ok(report)
}

/// Split a share into `(kept, tax)`.
#[must_use]
fn split_tax(share: u64, tax_percent: u32) -> (u64, u64) {
    let tax = share * u64::from(tax_percent) / 100;
    (share - tax, tax)
}

/// Add grain to a person's wealth.
fn credit(board: &mut Board, id: PersonId, amount: u64) -> SimResult<()> {
    let person = board.person_mut(id).ok_or(SimError::UnknownPerson(id))?;
    person.add_grain(i64::try_from(amount).unwrap_or(i64::MAX));
    Ok(())
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Tax plus what is kept always equals the share.
    #[kani::proof]
    fn prove_tax_split_conserves() {
        let share: u32 = kani::any();
        let percent: u32 = kani::any();
        if percent > 100 {
            return;
        }

        let (kept, tax) = split_tax(u64::from(share), percent);
        assert_eq!(kept + tax, u64::from(share));
        assert!(tax <= u64::from(share));
    }
}
