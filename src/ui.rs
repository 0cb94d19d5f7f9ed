//! Presentation view-model
//!
//! Pure functions from `RoundState` to what the host draws: button rectangles
//! for tap mode, the creeper's position on its track, and HUD text.

use glam::Vec2;

use crate::consts::CHOICE_COUNT;
use crate::platform::InputMode;
use crate::sim::{GameMode, OutcomeKind, RoundState};

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min).all() && p.cmplt(self.max()).all()
    }
}

/// Gap between answer buttons
const BUTTON_GAP: f32 = 16.0;
/// Widest the button grid gets on large screens
const GRID_MAX_WIDTH: f32 = 600.0;

/// Where the four answer buttons sit (2x2 grid, row-major, same order as the choices)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChoiceLayout {
    pub buttons: [Rect; CHOICE_COUNT],
}

impl ChoiceLayout {
    pub fn for_viewport(width: f32, height: f32) -> Self {
        let grid_w = (width * 0.9).min(GRID_MAX_WIDTH);
        let button_w = (grid_w - BUTTON_GAP) / 2.0;
        let button_h = (height * 0.12).clamp(48.0, 120.0);
        let left = (width - grid_w) / 2.0;
        let top = height * 0.55;

        let buttons = std::array::from_fn(|i| {
            let col = (i % 2) as f32;
            let row = (i / 2) as f32;
            Rect::new(
                left + col * (button_w + BUTTON_GAP),
                top + row * (button_h + BUTTON_GAP),
                button_w,
                button_h,
            )
        });
        Self { buttons }
    }

    /// Index of the button under `pos`, if any
    pub fn hit_test(&self, pos: Vec2) -> Option<usize> {
        self.buttons.iter().position(|b| b.contains(pos))
    }
}

/// Creeper distance along its track, 0 at the start and `track_width` when time is up
pub fn creeper_offset(state: &RoundState, track_width: f32) -> f32 {
    (1.0 - state.time_ratio()) * track_width.max(0.0)
}

/// Color family for the equation and answer text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Correct,
    Incorrect,
}

/// Everything textual the host shows for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudView {
    pub mode: GameMode,
    pub score: u32,
    /// One entry per starting life, filled first
    pub hearts: Vec<bool>,
    pub headline: String,
    pub prompt: String,
    pub equation: String,
    /// Typed digits while playing, the right answer during feedback
    pub answer: String,
    pub tone: Tone,
    /// "CREEPER APPROACHING!" warning
    pub danger: bool,
    /// Warning blinks (off with reduced motion)
    pub danger_flash: bool,
}

impl HudView {
    pub fn from_state(
        state: &RoundState,
        max_lives: u8,
        input_mode: InputMode,
        reduced_motion: bool,
    ) -> Self {
        let hearts = (0..max_lives.max(state.lives)).map(|i| i < state.lives).collect();
        let start_verb = match input_mode {
            InputMode::Keyboard => "Press SPACE",
            InputMode::Touch => "Tap",
        };

        let (headline, prompt) = match state.mode {
            GameMode::Waiting => ("MATH CRAFT".to_string(), format!("{start_verb} to start")),
            GameMode::GameOver => (
                format!("GAME OVER - Final Score: {}", state.score),
                format!("{start_verb} to respawn"),
            ),
            GameMode::Playing | GameMode::Feedback => (String::new(), String::new()),
        };

        let equation = state
            .equation
            .map(|e| format!("{} \u{d7} {} =", e.a, e.b))
            .unwrap_or_default();

        let (answer, tone) = match state.mode {
            GameMode::Feedback => {
                let answer = state
                    .equation
                    .map(|e| e.answer.to_string())
                    .unwrap_or_default();
                let tone = match state.last_outcome.map(|o| o.kind) {
                    Some(OutcomeKind::Correct) => Tone::Correct,
                    Some(OutcomeKind::Incorrect) => Tone::Incorrect,
                    None => Tone::Neutral,
                };
                (answer, tone)
            }
            GameMode::Playing if state.pending_input.is_empty() => ("_".to_string(), Tone::Neutral),
            GameMode::Playing => (state.pending_input.clone(), Tone::Neutral),
            GameMode::Waiting | GameMode::GameOver => (String::new(), Tone::Neutral),
        };

        let danger = state.is_low_time();
        Self {
            mode: state.mode,
            score: state.score,
            hearts,
            headline,
            prompt,
            equation,
            answer,
            tone,
            danger,
            danger_flash: danger && !reduced_motion,
        }
    }
}
