//! Deterministic terrain generation.
//!
//! A few patches are seeded as best land at full capacity, then capacity
//! is diffused outwards so the board ends up with smooth grain hills:
//!
//! 1. Seed `percent_best_land` percent of the patches at `max_grain`.
//! 2. Five rounds of: reset seeded patches to `max_grain`, diffuse.
//! 3. Ten more rounds of diffusion.
//! 4. Floor every value; that is the patch's capacity and starting grain.
//!
//! Each diffusion round hands a quarter of every patch's value to its
//! eight neighbours in equal parts. On a bounded board the share meant for
//! a missing neighbour stays where it was.

// Terrain works in floating point and floors back to whole grain
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use rand::Rng;
use rand::seq::index::sample;

use crate::config::SimConfig;
use crate::world::{Board, Patch};

/// Fraction of a patch's value shared out per diffusion round.
const DIFFUSION_RATE: f64 = 0.25;

/// Rounds that keep re-seeding the best land.
const SEEDED_ROUNDS: usize = 5;

/// Rounds of plain smoothing afterwards.
const SMOOTHING_ROUNDS: usize = 10;

/// Neighbour offsets, clockwise from north-west.
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

/// Fill the board's patches with generated capacities.
///
/// Every patch starts full. Capacities never exceed `config.max_grain`.
pub fn generate_terrain<R: Rng + ?Sized>(board: &mut Board, config: &SimConfig, rng: &mut R) {
    let cells = board.patches().len();
    let best_land = cells * config.percent_best_land as usize / 100;
    let max = f64::from(config.max_grain);

    let mut seeded = vec![false; cells];
    for idx in sample(rng, cells, best_land) {
        seeded[idx] = true;
    }

    let mut field: Vec<f64> = seeded
        .iter()
        .map(|&is_seed| if is_seed { max } else { 0.0 })
        .collect();

    let neighbours = neighbour_table(board);

    for _ in 0..SEEDED_ROUNDS {
        for (value, &is_seed) in field.iter_mut().zip(&seeded) {
            if is_seed {
                *value = max;
            }
        }
        diffuse(&mut field, &neighbours);
    }
    for _ in 0..SMOOTHING_ROUNDS {
        diffuse(&mut field, &neighbours);
    }

    for (patch, value) in board.patches_mut().iter_mut().zip(field) {
        let capacity = (value.max(0.0).floor() as u32).min(config.max_grain);
        *patch = Patch::new(capacity);
    }
}

/// Patch indices of each patch's neighbours under the board's edge policy.
fn neighbour_table(board: &Board) -> Vec<Vec<usize>> {
    let width = usize::from(board.width());
    board
        .iter_patches()
        .map(|(pos, _)| {
            NEIGHBOURS
                .iter()
                .filter_map(|&(dx, dy)| board.resolve(i64::from(pos.x) + dx, i64::from(pos.y) + dy))
                .map(|n| usize::from(n.y) * width + usize::from(n.x))
                .collect()
        })
        .collect()
}

/// One diffusion round.
fn diffuse(field: &mut Vec<f64>, neighbours: &[Vec<usize>]) {
    let mut next = field.clone();
    for (idx, targets) in neighbours.iter().enumerate() {
        let share = field[idx] * DIFFUSION_RATE / NEIGHBOURS.len() as f64;
        for &target in targets {
            next[idx] -= share;
            next[target] += share;
        }
    }
    *field = next;
}
