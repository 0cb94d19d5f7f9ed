//! Round state and core simulation types
//!
//! Everything the host renders from lives in `RoundState`.

use serde::{Deserialize, Serialize};

use crate::consts::LOW_TIME_RATIO;

/// Current screen/mode of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Title screen, waiting for the first start
    #[default]
    Waiting,
    /// A round is live and the creeper is walking
    Playing,
    /// Showing the result of the last round
    Feedback,
    /// Out of lives, waiting for a restart
    GameOver,
}

impl GameMode {
    /// The legal edges of the mode state machine
    pub fn can_transition_to(self, next: GameMode) -> bool {
        matches!(
            (self, next),
            (GameMode::Waiting, GameMode::Playing)
                | (GameMode::GameOver, GameMode::Playing)
                | (GameMode::Playing, GameMode::Feedback)
                | (GameMode::Feedback, GameMode::Playing)
                | (GameMode::Feedback, GameMode::GameOver)
        )
    }
}

/// A multiplication problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equation {
    pub a: u32,
    pub b: u32,
    pub answer: u32,
}

impl Equation {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b, answer: a * b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Correct,
    Incorrect,
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeCause {
    /// The player submitted a value
    Answered,
    /// The countdown ran out
    TimedOut,
}

/// Result of one round, with the deltas that were applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub cause: OutcomeCause,
    pub equation: Equation,
    /// Value the player submitted (None on timeout or unparseable input)
    pub submitted: Option<u32>,
    pub score_delta: u32,
    pub lives_lost: u8,
}

impl Outcome {
    pub fn is_correct(&self) -> bool {
        self.kind == OutcomeKind::Correct
    }
}

/// Discrete events emitted by the engine, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted,
    RoundStarted { equation: Equation, time_limit: f32 },
    Resolved(Outcome),
    GameOver { final_score: u32 },
}

/// Complete round state (single owner: `RoundEngine`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub mode: GameMode,
    pub score: u32,
    pub lives: u8,
    /// Current problem (absent before the first start)
    pub equation: Option<Equation>,
    /// Digits typed so far this round
    pub pending_input: String,
    pub time_limit: f32,
    pub time_remaining: f32,
    pub last_outcome: Option<Outcome>,
    pub feedback_remaining: f32,
    /// Serial of the current equation; bumps on every new equation, never resets
    pub round: u64,
}

impl RoundState {
    pub fn new(lives: u8, time_limit: f32) -> Self {
        Self {
            mode: GameMode::Waiting,
            score: 0,
            lives,
            equation: None,
            pending_input: String::new(),
            time_limit,
            time_remaining: time_limit,
            last_outcome: None,
            feedback_remaining: 0.0,
            round: 0,
        }
    }

    /// Fraction of the countdown left, in [0, 1]
    pub fn time_ratio(&self) -> f32 {
        if self.time_limit <= 0.0 {
            return 0.0;
        }
        (self.time_remaining / self.time_limit).clamp(0.0, 1.0)
    }

    /// True when the creeper is close enough to warn the player
    pub fn is_low_time(&self) -> bool {
        self.mode == GameMode::Playing && self.time_ratio() < LOW_TIME_RATIO
    }
}
