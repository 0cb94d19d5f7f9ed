//! Math Craft - a creeper-countdown multiplication trainer
//!
//! Core modules:
//! - `sim`: Deterministic round engine (state machine, timing, equations)
//! - `input`: Input resolver (keys and taps to engine calls, answer choices)
//! - `tuning`: Data-driven game balance
//! - `ui`: Layout and HUD view-model consumed by the host
//! - `audio`: Outcome cues and Web Audio playback
//! - `platform`: Browser/native platform abstraction

pub mod audio;
pub mod input;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use input::{AnswerChoiceSet, InputResolver, KeyAction};
pub use platform::{FrameClock, InputMode};
pub use settings::Settings;
pub use sim::{GameEvent, GameMode, RoundEngine, RoundState};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Lives at the start of every game
    pub const STARTING_LIVES: u8 = 5;
    /// How long the correct/incorrect feedback screen stays up (seconds)
    pub const FEEDBACK_DURATION: f32 = 0.7;
    /// Maximum digits the player can type for one answer
    pub const MAX_INPUT_DIGITS: usize = 4;

    /// Operand range (inclusive)
    pub const OPERAND_MIN: u32 = 1;
    pub const OPERAND_MAX: u32 = 10;

    /// Tap mode: buttons shown per round
    pub const CHOICE_COUNT: usize = 4;
    /// Tap mode: distractors stay within this distance of the answer
    pub const CHOICE_SPREAD: u32 = 10;

    /// Time ratio below which the creeper is "approaching"
    pub const LOW_TIME_RATIO: f32 = 0.3;

    /// Host-side cap on a single frame delta (seconds)
    pub const MAX_FRAME_DT: f32 = 0.25;
}
