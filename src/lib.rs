//! Unbounded Game of Life engine.
//!
//! A sparse live-cell set evolved on a background thread while an
//! interactive thread paints cells and renders snapshots.

pub mod engine;
pub mod evolution;
pub mod grid;
pub mod pacing;
pub mod pending;
pub mod rules;
pub mod view;

pub use engine::{Engine, EngineConfig, EngineStats, LoopStep, SimulationHandle};
pub use grid::{Cell, GridSnapshot, SparseGrid};
pub use pacing::{Channel, Pacer, RatePreset};
pub use rules::{GameRules, Pattern, RuleError};
pub use view::View;
