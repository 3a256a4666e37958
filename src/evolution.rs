//! Sparse generation step.
//!
//! Only live cells and their dead neighbors are ever visited, so the cost of
//! a generation is O(8 * |live|) regardless of how far apart the cells are.

use std::collections::{HashMap, HashSet};

use crate::grid::Cell;
use crate::rules::GameRules;

/// Moore neighborhood offsets (orthogonal + diagonal).
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Neighbors of `cell` that exist; the plane ends at the `i32` range.
#[inline]
pub fn neighbors(cell: Cell) -> impl Iterator<Item = Cell> {
    NEIGHBOR_OFFSETS
        .into_iter()
        .filter_map(move |(dx, dy)| cell.checked_offset(dx, dy))
}

/// Compute the generation that follows `live` under `rules`.
///
/// Each live cell counts its alive neighbors and tallies the dead ones. Every
/// dead neighbor gets one tally per adjacent live
/// cell, which is exactly its alive-neighbor count once all live cells are
/// visited. The result depends only on the contents of `live`, not on the
/// order in which it is iterated.
pub fn next_generation(live: &HashSet<Cell>, rules: &GameRules) -> HashSet<Cell> {
    let mut next = HashSet::with_capacity(live.len());
    let mut dead_tally: HashMap<Cell, u8> = HashMap::with_capacity(live.len() * 2);

    for &cell in live {
        let mut alive_neighbors = 0u8;
        for neighbor in neighbors(cell) {
            if live.contains(&neighbor) {
                alive_neighbors += 1;
            } else {
                *dead_tally.entry(neighbor).or_insert(0) += 1;
            }
        }

        if rules.survives(alive_neighbors) {
            next.insert(cell);
        }
    }

    next.extend(
        dead_tally
            .into_iter()
            .filter(|&(_, count)| rules.is_born(count))
            .map(|(cell, _)| cell),
    );

    next
}

/// Advance `live` by `generations` steps.
pub fn evolve(live: &HashSet<Cell>, rules: &GameRules, generations: usize) -> HashSet<Cell> {
    let mut current = live.clone();
    for _ in 0..generations {
        current = next_generation(&current, rules);
    }
    current
}
