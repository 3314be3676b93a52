//! The board: patch grid, live people and the occupancy index.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{EdgePolicy, SimConfig};
use crate::error::{SimError, SimResult};
use crate::world::{Direction, Patch, Person, PersonId, Position};

/// Outcome of a person's end-of-turn lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// The person survived the tick.
    Alive,
    /// The person starved or died of old age and left the board.
    Died {
        /// Grain held at the moment of death (may be negative).
        remaining_grain: i64,
        /// Cell the person died on.
        position: Position,
    },
}

/// The simulation board.
///
/// People are kept in an ordered map so every pass over the population
/// runs in ascending id order. The occupancy index maps each occupied cell
/// to the ids standing on it and always agrees with `Person::position`.
#[derive(Debug, Clone)]
pub struct Board {
    /// Width of the board in patches.
    width: u16,
    /// Height of the board in patches.
    height: u16,
    /// Behaviour at the edges.
    edge_policy: EdgePolicy,
    /// Patches stored in row-major order.
    patches: Vec<Patch>,
    /// Live people by id.
    people: BTreeMap<PersonId, Person>,
    /// Occupied cells and who stands on them. Never holds empty sets.
    occupancy: BTreeMap<Position, BTreeSet<PersonId>>,
    /// Next id handed out by `next_person_id`.
    next_id: PersonId,
}

impl Board {
    /// Create a board of empty patches with zero capacity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is zero.
    pub fn new(width: u16, height: u16, edge_policy: EdgePolicy) -> SimResult<Self> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidConfig(
                "board dimensions must be non-zero".to_string(),
            ));
        }

        let size = usize::from(width) * usize::from(height);
        Ok(Self {
            width,
            height,
            edge_policy,
            patches: vec![Patch::new(0); size],
            people: BTreeMap::new(),
            occupancy: BTreeMap::new(),
            next_id: 0,
        })
    }

    /// Create an empty board sized and edged per the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is zero.
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        Self::new(config.board_width, config.board_height, config.edge_policy)
    }

    /// Width of the board.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height of the board.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Whether signed coordinates fall on the grid.
    #[must_use]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        (0..i64::from(self.width)).contains(&x) && (0..i64::from(self.height)).contains(&y)
    }

    /// Map signed coordinates onto the grid according to the edge policy.
    ///
    /// Returns `None` for off-grid coordinates on a bounded board.
    #[must_use]
    pub fn resolve(&self, x: i64, y: i64) -> Option<Position> {
        match self.edge_policy {
            EdgePolicy::Bounded => self
                .in_bounds(x, y)
                .then(|| Position::new(to_u16(x), to_u16(y))),
            EdgePolicy::Wrap => Some(Position::new(
                to_u16(x.rem_euclid(i64::from(self.width))),
                to_u16(y.rem_euclid(i64::from(self.height))),
            )),
        }
    }

    /// Resolve coordinates or fail with `OutOfBounds`.
    fn resolve_or_err(&self, x: i64, y: i64) -> SimResult<Position> {
        self.resolve(x, y).ok_or(SimError::OutOfBounds { x, y })
    }

    /// Index into the patch vector for an in-bounds position.
    fn index(&self, pos: Position) -> SimResult<usize> {
        if pos.x < self.width && pos.y < self.height {
            Ok(usize::from(pos.y) * usize::from(self.width) + usize::from(pos.x))
        } else {
            Err(SimError::OutOfBounds {
                x: i64::from(pos.x),
                y: i64::from(pos.y),
            })
        }
    }

    /// Patch at signed coordinates, resolved through the edge policy.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` for off-grid coordinates on a bounded board.
    pub fn patch_at(&self, x: i64, y: i64) -> SimResult<&Patch> {
        let pos = self.resolve_or_err(x, y)?;
        self.patch(pos)
    }

    /// Patch at a position.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the position is off the grid.
    pub fn patch(&self, pos: Position) -> SimResult<&Patch> {
        let idx = self.index(pos)?;
        Ok(&self.patches[idx])
    }

    /// Mutable patch at a position.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the position is off the grid.
    pub fn patch_mut(&mut self, pos: Position) -> SimResult<&mut Patch> {
        let idx = self.index(pos)?;
        Ok(&mut self.patches[idx])
    }

    /// All patches in row-major order.
    #[must_use]
    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// All patches in row-major order, mutably.
    #[must_use]
    #[inline]
    pub fn patches_mut(&mut self) -> &mut [Patch] {
        &mut self.patches
    }

    /// Iterate over every position and its patch.
    pub fn iter_patches(&self) -> impl Iterator<Item = (Position, &Patch)> {
        let width = usize::from(self.width);
        self.patches.iter().enumerate().map(move |(idx, patch)| {
            let x = to_u16_usize(idx % width);
            let y = to_u16_usize(idx / width);
            (Position::new(x, y), patch)
        })
    }

    /// Reserve a fresh person id.
    pub fn next_person_id(&mut self) -> PersonId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Place a person on the board at signed coordinates.
    ///
    /// A person already on the board is moved; a new one is inserted. The
    /// person's recorded position and the occupancy index are updated
    /// together.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` for off-grid coordinates on a bounded board.
    pub fn put(&mut self, mut person: Person, x: i64, y: i64) -> SimResult<()> {
        let pos = self.resolve_or_err(x, y)?;
        let id = person.id;

        if let Some(old) = self.people.get(&id) {
            let old_pos = old.position;
            self.vacate(id, old_pos);
        }

        person.position = pos;
        self.people.insert(id, person);
        self.occupancy.entry(pos).or_default().insert(id);
        self.next_id = self.next_id.max(id.saturating_add(1));
        Ok(())
    }

    /// Move a person already on the board to `pos`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPerson` if the id is not on the board and
    /// `OutOfBounds` if `pos` is off the grid.
    pub fn move_person(&mut self, id: PersonId, pos: Position) -> SimResult<()> {
        self.index(pos)?;
        let person = self.people.get_mut(&id).ok_or(SimError::UnknownPerson(id))?;
        let old_pos = person.position;
        if old_pos == pos {
            return Ok(());
        }
        person.position = pos;
        self.vacate(id, old_pos);
        self.occupancy.entry(pos).or_default().insert(id);
        Ok(())
    }

    /// Take a person off the board.
    pub fn remove(&mut self, id: PersonId) -> Option<Person> {
        let person = self.people.remove(&id)?;
        self.vacate(id, person.position);
        Some(person)
    }

    /// Drop `id` from the occupancy set of `pos`, pruning empty sets.
    fn vacate(&mut self, id: PersonId, pos: Position) {
        if let Some(ids) = self.occupancy.get_mut(&pos) {
            ids.remove(&id);
            if ids.is_empty() {
                self.occupancy.remove(&pos);
            }
        }
    }

    /// Live people in ascending id order.
    pub fn people(&self) -> impl Iterator<Item = &Person> {
        self.people.values()
    }

    /// A person by id.
    #[must_use]
    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.get(&id)
    }

    /// A person by id, mutably. Do not change `position` through this.
    #[must_use]
    pub fn person_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.people.get_mut(&id)
    }

    /// Snapshot of the live ids, ascending.
    #[must_use]
    pub fn person_ids(&self) -> Vec<PersonId> {
        self.people.keys().copied().collect()
    }

    /// Number of live people.
    #[must_use]
    pub fn population(&self) -> usize {
        self.people.len()
    }

    /// Every occupied cell with its occupants, in row-major order.
    #[must_use]
    pub fn all_positions(&self) -> &BTreeMap<Position, BTreeSet<PersonId>> {
        &self.occupancy
    }

    /// Ids standing on `pos`.
    pub fn occupants(&self, pos: Position) -> impl Iterator<Item = PersonId> + '_ {
        self.occupancy.get(&pos).into_iter().flatten().copied()
    }

    /// Where a person wants to go next.
    ///
    /// Looks up to `vision` cells along each compass direction and picks the
    /// richest cell, preferring the nearer one and then the earlier
    /// direction on ties. The person stays put unless that cell holds
    /// strictly more grain than the current one. Does not mutate anything.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPerson` if the id is not on the board.
    pub fn next_position(&self, id: PersonId) -> SimResult<Position> {
        let person = self.people.get(&id).ok_or(SimError::UnknownPerson(id))?;
        let here = person.position;
        let current = self.patch(here)?.grain();

        let mut best: Option<(u32, u32, Position)> = None;
        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            for distance in 1..=self.reach(direction, person.vision) {
                let x = i64::from(here.x) + dx * i64::from(distance);
                let y = i64::from(here.y) + dy * i64::from(distance);
                let Some(pos) = self.resolve(x, y) else {
                    break;
                };
                let grain = self.patch(pos)?.grain();
                let better = match best {
                    None => true,
                    Some((best_grain, best_distance, _)) => {
                        grain > best_grain || (grain == best_grain && distance < best_distance)
                    }
                };
                if better {
                    best = Some((grain, distance, pos));
                }
            }
        }

        Ok(match best {
            Some((grain, _, pos)) if grain > current => pos,
            _ => here,
        })
    }

    /// How far a scan along `direction` can usefully look.
    ///
    /// On a wrapped board a line of cells repeats after one lap, and the
    /// repeats are farther away so they never win a tie.
    fn reach(&self, direction: Direction, vision: u32) -> u32 {
        let span = match direction {
            Direction::North | Direction::South => self.height,
            Direction::East | Direction::West => self.width,
        };
        match self.edge_policy {
            EdgePolicy::Bounded => vision,
            EdgePolicy::Wrap => vision.min(u32::from(span) - 1),
        }
    }

    /// Move a person to `pos`, then eat, age and possibly die.
    ///
    /// A dead person is removed from the board before returning.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPerson` if the id is not on the board and
    /// `OutOfBounds` if `pos` is off the grid.
    pub fn move_eat_age_die(&mut self, id: PersonId, pos: Position) -> SimResult<Fate> {
        self.move_person(id, pos)?;
        let person = self.people.get_mut(&id).ok_or(SimError::UnknownPerson(id))?;
        person.eat_and_age();

        if !person.is_dead() {
            return Ok(Fate::Alive);
        }

        let dead = self.remove(id).ok_or(SimError::UnknownPerson(id))?;
        Ok(Fate::Died {
            remaining_grain: dead.grain,
            position: dead.position,
        })
    }

    /// Grain left on all patches.
    #[must_use]
    pub fn total_patch_grain(&self) -> u64 {
        self.patches.iter().map(|p| u64::from(p.grain())).sum()
    }

    /// Grain held by all live people.
    #[must_use]
    pub fn total_person_grain(&self) -> i64 {
        self.people.values().map(|p| p.grain).sum()
    }

    /// Richest person's wealth, or `None` on an empty board.
    #[must_use]
    pub fn max_wealth(&self) -> Option<i64> {
        self.people.values().map(|p| p.grain).max()
    }
}

/// Narrow a coordinate already known to fit the grid.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn to_u16(value: i64) -> u16 {
    value as u16
}

/// Narrow a patch index component already known to fit the grid.
#[allow(clippy::cast_possible_truncation)]
const fn to_u16_usize(value: usize) -> u16 {
    value as u16
}
