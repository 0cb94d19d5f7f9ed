//! Deterministic round engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only arrives through `tick(dt)`
//! - Seeded or scripted equations only
//! - No rendering, audio or platform dependencies

pub mod engine;
pub mod equation;
pub mod state;
pub mod tick;

pub use engine::RoundEngine;
pub use equation::{EquationSource, ScriptedEquations, SeededEquations, digit_count};
pub use state::{Equation, GameEvent, GameMode, Outcome, OutcomeCause, OutcomeKind, RoundState};
