//! Rules module for the sparse Game of Life engine
//!
//! This module contains the birth/survival rule definition and the preset
//! patterns used to seed the grid.

mod patterns;
mod presets;

use thiserror::Error;

/// Errors raised when building a rule the sparse engine cannot evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Birth on zero neighbors would fill the unbounded plane.
    #[error("rule births cells with zero neighbors, which an unbounded sparse grid cannot represent")]
    BirthOnZero,

    /// A mask names a neighbor count above 8.
    #[error("neighbor count mask {0:#b} uses counts above 8")]
    CountOutOfRange(u16),
}

const VALID_COUNTS: u16 = 0b1_1111_1111;

/// Outer-totalistic rule over the Moore neighborhood.
///
/// Bit `n` of `birth` set means a dead cell with `n` alive neighbors is born;
/// bit `n` of `survival` set means a live cell with `n` alive neighbors stays
/// alive. Classic Conway's Game of Life is B3/S23:
/// 1. Any live cell with fewer than two live neighbors dies (underpopulation)
/// 2. Any live cell with two or three live neighbors lives (survival)
/// 3. Any live cell with more than three live neighbors dies (overpopulation)
/// 4. Any dead cell with exactly three live neighbors becomes alive (reproduction)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    birth: u16,
    survival: u16,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            birth: 1 << 3,
            survival: (1 << 2) | (1 << 3),
        }
    }
}

impl GameRules {
    /// Create a rule set from birth/survival neighbor-count masks
    pub fn new(birth: u16, survival: u16) -> Result<Self, RuleError> {
        if birth & 1 != 0 {
            return Err(RuleError::BirthOnZero);
        }
        for mask in [birth, survival] {
            if mask & !VALID_COUNTS != 0 {
                return Err(RuleError::CountOutOfRange(mask));
            }
        }
        Ok(Self { birth, survival })
    }

    /// Build a rule from lists of neighbor counts, e.g. `(&[3], &[2, 3])`.
    pub fn from_counts(birth: &[u8], survival: &[u8]) -> Result<Self, RuleError> {
        let to_mask = |counts: &[u8]| {
            counts
                .iter()
                .fold(0u16, |mask, &n| mask | if n > 8 { 1 << 15 } else { 1 << n })
        };
        Self::new(to_mask(birth), to_mask(survival))
    }

    #[inline]
    pub fn is_born(&self, alive_neighbors: u8) -> bool {
        self.birth & (1 << alive_neighbors) != 0
    }

    #[inline]
    pub fn survives(&self, alive_neighbors: u8) -> bool {
        self.survival & (1 << alive_neighbors) != 0
    }

    pub fn birth_mask(&self) -> u16 {
        self.birth
    }

    pub fn survival_mask(&self) -> u16 {
        self.survival
    }
}

impl std::fmt::Display for GameRules {
    /// Formats as `B3/S23`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = |mask: u16| -> String {
            (0..=8u8)
                .filter(|n| mask & (1 << n) != 0)
                .map(|n| char::from(b'0' + n))
                .collect()
        };
        write!(f, "B{}/S{}", digits(self.birth), digits(self.survival))
    }
}

/// Predefined patterns for seeding the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// The five-cell hook placed on every restart
    Seed,
    /// A small oscillator
    Blinker,
    /// A small oscillator
    Toad,
    /// A small stationary pattern
    Block,
    /// A diagonal spaceship
    Glider,
    /// A horizontal spaceship
    LightweightSpaceship,
    /// A pattern that grows indefinitely
    GosperGliderGun,
}
