//! Board invariants - sanity checks that detect bugs.
//!
//! A correctly implemented tick never breaks these. They are bug detectors,
//! not model rules.

use crate::world::Board;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all board invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(board: &Board) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (pos, patch) in board.iter_patches() {
        if patch.grain() > patch.max_grain() {
            violations.push(InvariantViolation {
                message: format!(
                    "Patch at {pos:?} holds {} grain > capacity {}",
                    patch.grain(),
                    patch.max_grain()
                ),
            });
        }
    }

    let mut indexed = 0usize;
    for (pos, ids) in board.all_positions() {
        if ids.is_empty() {
            violations.push(InvariantViolation {
                message: format!("Occupancy index holds an empty set at {pos:?}"),
            });
        }
        for &id in ids {
            indexed += 1;
            match board.person(id) {
                None => violations.push(InvariantViolation {
                    message: format!("Occupancy index lists missing person {id} at {pos:?}"),
                }),
                Some(person) if person.position != *pos => {
                    violations.push(InvariantViolation {
                        message: format!(
                            "Person {id} indexed at {pos:?} but records {:?}",
                            person.position
                        ),
                    });
                }
                Some(_) => {}
            }
        }
    }

    if indexed != board.population() {
        violations.push(InvariantViolation {
            message: format!(
                "Occupancy index covers {indexed} people but {} are alive",
                board.population()
            ),
        });
    }

    for person in board.people() {
        if board.patch(person.position).is_err() {
            violations.push(InvariantViolation {
                message: format!("Person {} stands off the grid at {:?}", person.id, person.position),
            });
        }
        if person.grain < 0 {
            violations.push(InvariantViolation {
                message: format!("Live person {} has negative grain {}", person.id, person.grain),
            });
        }
    }

    violations
}

/// Assert all board invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(board: &Board) {
    let violations = check_invariants(board);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Board invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_board: &Board) {}
