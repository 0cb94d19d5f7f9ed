//! Input resolver
//!
//! Turns raw key presses and taps into round engine calls, and owns the
//! multiple-choice answers shown in tap mode. Input that arrives in the wrong
//! mode is dropped without complaint.

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{CHOICE_COUNT, CHOICE_SPREAD};
use crate::sim::{Equation, EquationSource, GameMode, RoundEngine};
use crate::ui::ChoiceLayout;

/// What a keyboard key means to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Digit(u8),
    Backspace,
    /// Enter: submit what has been typed
    Confirm,
    /// Space: start, restart or skip feedback
    Primary,
}

impl KeyAction {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " => Some(KeyAction::Primary),
            "Backspace" => Some(KeyAction::Backspace),
            "Enter" => Some(KeyAction::Confirm),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c.to_digit(10).map(|d| KeyAction::Digit(d as u8)),
                    _ => None,
                }
            }
        }
    }
}

/// Four distinct positive values, one of them the answer, sorted ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerChoiceSet {
    values: [u32; CHOICE_COUNT],
}

impl AnswerChoiceSet {
    /// Build choices for `answer` (which must be positive)
    ///
    /// Distractors are drawn without replacement from the positive values
    /// within `CHOICE_SPREAD` of the answer.
    pub fn generate<R: Rng + ?Sized>(answer: u32, rng: &mut R) -> Self {
        let low = answer.saturating_sub(CHOICE_SPREAD).max(1);
        let mut candidates: Vec<u32> = (low..=answer + CHOICE_SPREAD)
            .filter(|&v| v != answer)
            .collect();
        candidates.shuffle(rng);

        let mut values = [answer; CHOICE_COUNT];
        for (slot, value) in values.iter_mut().skip(1).zip(candidates) {
            *slot = value;
        }
        values.sort_unstable();
        Self { values }
    }

    pub fn values(&self) -> &[u32; CHOICE_COUNT] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.values.get(index).copied()
    }

    pub fn contains(&self, value: u32) -> bool {
        self.values.contains(&value)
    }
}

#[derive(Debug, Clone)]
pub struct InputResolver {
    rng: Pcg32,
    choices: Option<AnswerChoiceSet>,
    /// Engine round the current choices belong to
    round_seen: u64,
}

impl InputResolver {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            choices: None,
            round_seen: 0,
        }
    }

    pub fn choices(&self) -> Option<&AnswerChoiceSet> {
        self.choices.as_ref()
    }

    /// Pick up a new equation if the engine has moved to another round
    pub fn sync<S: EquationSource>(&mut self, engine: &RoundEngine<S>) {
        let state = engine.state();
        if state.round == self.round_seen {
            return;
        }
        self.round_seen = state.round;
        if let Some(equation) = state.equation {
            self.regenerate_choices(&equation);
        }
    }

    pub fn regenerate_choices(&mut self, equation: &Equation) {
        self.choices = Some(AnswerChoiceSet::generate(equation.answer, &mut self.rng));
    }

    pub fn on_key<S: EquationSource>(&mut self, engine: &mut RoundEngine<S>, action: KeyAction) {
        match action {
            KeyAction::Digit(d) => self.on_digit_key(engine, d),
            KeyAction::Backspace => self.on_backspace_key(engine),
            KeyAction::Confirm => self.on_confirm_key(engine),
            KeyAction::Primary => self.on_primary_activate(engine),
        }
    }

    pub fn on_digit_key<S: EquationSource>(&mut self, engine: &mut RoundEngine<S>, digit: u8) {
        if engine.state().mode == GameMode::Playing {
            engine.append_digit(digit);
        }
    }

    pub fn on_backspace_key<S: EquationSource>(&mut self, engine: &mut RoundEngine<S>) {
        if engine.state().mode == GameMode::Playing {
            engine.backspace();
        }
    }

    pub fn on_confirm_key<S: EquationSource>(&mut self, engine: &mut RoundEngine<S>) {
        let state = engine.state();
        if state.mode == GameMode::Playing && !state.pending_input.is_empty() {
            engine.submit_pending();
        }
    }

    /// Space or a tap outside the answer buttons
    pub fn on_primary_activate<S: EquationSource>(&mut self, engine: &mut RoundEngine<S>) {
        match engine.state().mode {
            GameMode::Waiting | GameMode::GameOver => {
                engine.start_game();
                self.sync(engine);
            }
            GameMode::Feedback => engine.skip_feedback(),
            GameMode::Playing => {}
        }
    }

    /// Tap on an answer button showing `value`
    pub fn on_choice_activate<S: EquationSource>(&mut self, engine: &mut RoundEngine<S>, value: u32) {
        self.sync(engine);
        if engine.state().mode != GameMode::Playing {
            return;
        }
        if self.choices.is_some_and(|c| c.contains(value)) {
            engine.submit_answer(value);
        } else {
            log::trace!("Tap on {value} is not one of the current choices");
        }
    }

    /// Pointer/touch down at `pos` (CSS pixels)
    pub fn on_pointer<S: EquationSource>(
        &mut self,
        engine: &mut RoundEngine<S>,
        pos: Vec2,
        layout: &ChoiceLayout,
    ) {
        self.sync(engine);
        let hit = match engine.state().mode {
            GameMode::Playing => layout
                .hit_test(pos)
                .and_then(|i| self.choices.and_then(|c| c.get(i))),
            _ => None,
        };
        match hit {
            Some(value) => self.on_choice_activate(engine, value),
            None => self.on_primary_activate(engine),
        }
    }
}
