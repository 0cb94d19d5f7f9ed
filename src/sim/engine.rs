//! Round engine: the single owner of `RoundState`
//!
//! Every mode-gated entrypoint is a silent no-op outside its mode. Input racing
//! a state change (a key landing on the frame a round resolves) is normal, so
//! nothing here returns an error.

use super::equation::{EquationSource, SeededEquations, digit_count};
use super::state::{Equation, GameEvent, GameMode, Outcome, OutcomeCause, OutcomeKind, RoundState};
use crate::consts::MAX_INPUT_DIGITS;
use crate::tuning::{Tuning, TuningError};

#[derive(Debug, Clone)]
pub struct RoundEngine<S: EquationSource = SeededEquations> {
    pub(super) state: RoundState,
    pub(super) tuning: Tuning,
    source: S,
    events: Vec<GameEvent>,
}

impl RoundEngine<SeededEquations> {
    /// Engine with default tuning and seeded equations
    pub fn new(seed: u64) -> Self {
        Self::build(SeededEquations::new(seed), Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Result<Self, TuningError> {
        Self::with_source(SeededEquations::new(seed), tuning)
    }
}

impl<S: EquationSource> RoundEngine<S> {
    /// Engine over any equation source; rejects tuning that fails `Tuning::validate`
    pub fn with_source(source: S, tuning: Tuning) -> Result<Self, TuningError> {
        tuning.validate()?;
        Ok(Self::build(source, tuning))
    }

    fn build(source: S, tuning: Tuning) -> Self {
        let state = RoundState::new(tuning.starting_lives, tuning.time_limit_for(0));
        Self {
            state,
            tuning,
            source,
            events: Vec::new(),
        }
    }

    /// Read-only view for rendering
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start (or restart) a game. Only honored from Waiting or GameOver.
    pub fn start_game(&mut self) {
        if !matches!(self.state.mode, GameMode::Waiting | GameMode::GameOver) {
            log::trace!("start_game ignored in {:?}", self.state.mode);
            return;
        }

        self.state.score = 0;
        self.state.lives = self.tuning.starting_lives;
        self.state.last_outcome = None;
        self.events.push(GameEvent::GameStarted);
        log::info!("Game started with {} lives", self.state.lives);

        self.begin_round();
        self.set_mode(GameMode::Playing);
    }

    /// Judge a candidate answer for the live round
    pub fn submit_answer(&mut self, candidate: u32) {
        if self.state.mode != GameMode::Playing {
            log::trace!("submit_answer({candidate}) ignored in {:?}", self.state.mode);
            return;
        }
        self.resolve(Some(candidate), OutcomeCause::Answered);
    }

    /// Submit whatever has been typed so far (confirm key)
    pub fn submit_pending(&mut self) {
        if self.state.mode != GameMode::Playing || self.state.pending_input.is_empty() {
            return;
        }
        match self.state.pending_input.parse::<u32>() {
            Ok(value) => self.submit_answer(value),
            Err(_) => {
                log::debug!("Unparseable input {:?} counts as wrong", self.state.pending_input);
                self.resolve(None, OutcomeCause::Answered);
            }
        }
    }

    /// Type one digit; auto-submits once the input is as long as the answer
    pub fn append_digit(&mut self, digit: u8) {
        if self.state.mode != GameMode::Playing
            || digit > 9
            || self.state.pending_input.len() >= MAX_INPUT_DIGITS
        {
            log::trace!("append_digit({digit}) ignored");
            return;
        }
        let Some(equation) = self.state.equation else {
            return;
        };

        self.state.pending_input.push(char::from(b'0' + digit));

        if self.state.pending_input.len() == digit_count(equation.answer) {
            self.submit_pending();
        }
    }

    pub fn backspace(&mut self) {
        if self.state.mode != GameMode::Playing {
            return;
        }
        self.state.pending_input.pop();
    }

    /// Cut the feedback screen short; the next `tick` resolves it
    pub fn skip_feedback(&mut self) {
        if self.state.mode != GameMode::Feedback {
            return;
        }
        self.state.feedback_remaining = 0.0;
    }

    /// Apply a verdict and move to Feedback.
    ///
    /// Game over is never decided here: even a fatal round shows its feedback first.
    pub(super) fn resolve(&mut self, submitted: Option<u32>, cause: OutcomeCause) {
        let Some(equation) = self.state.equation else {
            return;
        };

        let outcome = if submitted == Some(equation.answer) {
            self.state.score += 1;
            Outcome {
                kind: OutcomeKind::Correct,
                cause,
                equation,
                submitted,
                score_delta: 1,
                lives_lost: 0,
            }
        } else {
            let before = self.state.lives;
            self.state.lives = before.saturating_sub(1);
            Outcome {
                kind: OutcomeKind::Incorrect,
                cause,
                equation,
                submitted,
                score_delta: 0,
                lives_lost: before - self.state.lives,
            }
        };

        log::debug!(
            "{} x {} = {}: {:?} ({:?}), score {}, lives {}",
            equation.a,
            equation.b,
            equation.answer,
            outcome.kind,
            cause,
            self.state.score,
            self.state.lives
        );

        self.state.last_outcome = Some(outcome);
        self.state.feedback_remaining = self.tuning.feedback_duration;
        self.set_mode(GameMode::Feedback);
        self.events.push(GameEvent::Resolved(outcome));
    }

    /// Leave Feedback: next round, or game over if the last life is gone
    pub(super) fn finish_feedback(&mut self) {
        self.state.feedback_remaining = 0.0;
        if self.state.lives == 0 {
            self.set_mode(GameMode::GameOver);
            self.events.push(GameEvent::GameOver {
                final_score: self.state.score,
            });
            log::info!("Game over, final score {}", self.state.score);
        } else {
            self.begin_round();
            self.set_mode(GameMode::Playing);
        }
    }

    /// Fresh equation and a full countdown sized by the current score
    fn begin_round(&mut self) {
        let equation: Equation = self.source.next_equation(self.tuning.operands());
        let time_limit = self.tuning.time_limit_for(self.state.score);

        self.state.equation = Some(equation);
        self.state.pending_input.clear();
        self.state.time_limit = time_limit;
        self.state.time_remaining = time_limit;
        self.state.feedback_remaining = 0.0;
        self.state.round += 1;

        log::debug!(
            "Round {}: {} x {} ({}s)",
            self.state.round,
            equation.a,
            equation.b,
            time_limit
        );
        self.events.push(GameEvent::RoundStarted {
            equation,
            time_limit,
        });
    }

    fn set_mode(&mut self, next: GameMode) {
        debug_assert!(
            self.state.mode.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state.mode,
            next
        );
        self.state.mode = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScriptedEquations;
    use proptest::prelude::*;

    fn scripted(pairs: &[(u32, u32)]) -> RoundEngine<ScriptedEquations> {
        RoundEngine::with_source(ScriptedEquations::new(pairs.iter().copied()), Tuning::default()).unwrap()
    }

    fn resolved(events: &[GameEvent]) -> Vec<Outcome> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Resolved(o) => Some(*o),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        let engine = RoundEngine::new(1);
        let state = engine.state();
        assert_eq!(state.mode, GameMode::Waiting);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 5);
        assert!(state.equation.is_none());
        assert_eq!(state.time_limit, 7.0);
    }

    #[test]
    fn test_constructor_rejects_unvalidated_tuning() {
        let empty_range = Tuning {
            operand_min: 5,
            operand_max: 2,
            ..Tuning::default()
        };
        assert!(matches!(
            RoundEngine::with_tuning(1, empty_range),
            Err(TuningError::Invalid(_))
        ));

        let too_many_lives = Tuning {
            starting_lives: 9,
            ..Tuning::default()
        };
        assert!(RoundEngine::with_tuning(1, too_many_lives).is_err());

        let narrow = Tuning {
            operand_min: 3,
            operand_max: 3,
            ..Tuning::default()
        };
        let mut engine = RoundEngine::with_tuning(1, narrow).unwrap();
        engine.start_game();
        assert_eq!(engine.state().equation, Some(Equation::new(3, 3)));
    }

    #[test]
    fn test_start_game() {
        let mut engine = scripted(&[(3, 4)]);
        engine.start_game();

        let state = engine.state();
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.equation, Some(Equation::new(3, 4)));
        assert_eq!(state.time_remaining, state.time_limit);
        assert_eq!(state.round, 1);

        let events = engine.take_events();
        assert_eq!(events[0], GameEvent::GameStarted);
        assert!(matches!(events[1], GameEvent::RoundStarted { time_limit, .. } if time_limit == 7.0));
        assert!(engine.take_events().is_empty());
    }

    #[test]
    fn test_start_game_ignored_mid_game() {
        let mut engine = scripted(&[(3, 4), (5, 5)]);
        engine.start_game();
        engine.submit_answer(12);
        let before = engine.state().clone();

        engine.start_game();
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_correct_answer() {
        let mut engine = scripted(&[(3, 4)]);
        engine.start_game();
        engine.take_events();

        engine.submit_answer(12);
        let state = engine.state();
        assert_eq!(state.mode, GameMode::Feedback);
        assert_eq!(state.score, 1);
        assert_eq!(state.lives, 5);
        assert_eq!(state.feedback_remaining, 0.7);

        let outcome = state.last_outcome.unwrap();
        assert!(outcome.is_correct());
        assert_eq!(outcome.cause, OutcomeCause::Answered);
        assert_eq!(outcome.score_delta, 1);
        assert_eq!(resolved(&engine.take_events()), vec![outcome]);
    }

    #[test]
    fn test_wrong_answer() {
        let mut engine = scripted(&[(3, 4)]);
        engine.start_game();
        engine.submit_answer(13);

        let state = engine.state();
        assert_eq!(state.mode, GameMode::Feedback);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 4);
        let outcome = state.last_outcome.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Incorrect);
        assert_eq!(outcome.submitted, Some(13));
        assert_eq!(outcome.lives_lost, 1);
    }

    #[test]
    fn test_auto_submit_fires_once_after_last_digit() {
        let mut engine = scripted(&[(6, 7)]);
        engine.start_game();
        engine.take_events();

        engine.append_digit(4);
        assert_eq!(engine.state().mode, GameMode::Playing);
        assert_eq!(engine.state().pending_input, "4");
        assert!(resolved(&engine.take_events()).is_empty());

        engine.append_digit(2);
        let outcomes = resolved(&engine.take_events());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].submitted, Some(42));
        assert!(outcomes[0].is_correct());
    }

    #[test]
    fn test_three_digit_answer_waits_for_confirm() {
        let mut engine = scripted(&[(10, 10)]);
        engine.start_game();

        engine.append_digit(1);
        engine.append_digit(0);
        assert_eq!(engine.state().mode, GameMode::Playing);

        engine.submit_pending();
        assert_eq!(engine.state().mode, GameMode::Feedback);
        assert_eq!(engine.state().last_outcome.unwrap().submitted, Some(10));
        assert_eq!(engine.state().lives, 4);
    }

    #[test]
    fn test_backspace_then_correct() {
        let mut engine = scripted(&[(10, 10)]);
        engine.start_game();

        engine.append_digit(1);
        engine.append_digit(1);
        engine.backspace();
        assert_eq!(engine.state().pending_input, "1");
        engine.append_digit(0);
        engine.append_digit(0);

        assert!(engine.state().last_outcome.unwrap().is_correct());
    }

    #[test]
    fn test_submit_pending_empty_is_noop() {
        let mut engine = scripted(&[(2, 2)]);
        engine.start_game();
        let before = engine.state().clone();
        engine.submit_pending();
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_noops_leave_state_untouched() {
        let mut engine = scripted(&[(6, 7)]);

        // Waiting
        let before = engine.state().clone();
        engine.append_digit(4);
        engine.backspace();
        engine.submit_answer(42);
        engine.submit_pending();
        engine.skip_feedback();
        assert_eq!(engine.state(), &before);
        assert!(engine.take_events().is_empty());

        // Playing with empty input
        engine.start_game();
        let before = engine.state().clone();
        engine.backspace();
        engine.skip_feedback();
        engine.append_digit(10);
        assert_eq!(engine.state(), &before);

        // Feedback
        engine.append_digit(4);
        engine.append_digit(2);
        let before = engine.state().clone();
        engine.append_digit(1);
        engine.backspace();
        engine.submit_answer(42);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_fatal_round_defers_game_over() {
        let mut engine = scripted(&[]);
        engine.start_game();

        for _ in 0..5 {
            assert_eq!(engine.state().mode, GameMode::Playing);
            engine.submit_answer(0);
            assert_eq!(engine.state().mode, GameMode::Feedback);
            engine.tick(1.0);
        }

        // The fifth tick above resolved the fatal feedback
        assert_eq!(engine.state().lives, 0);
        assert_eq!(engine.state().mode, GameMode::GameOver);
        let events = engine.take_events();
        assert_eq!(events.last(), Some(&GameEvent::GameOver { final_score: 0 }));
    }

    #[test]
    fn test_fatal_round_shows_feedback() {
        let mut engine = scripted(&[]);
        engine.start_game();
        for _ in 0..4 {
            engine.submit_answer(0);
            engine.tick(1.0);
        }
        assert_eq!(engine.state().lives, 1);

        engine.submit_answer(0);
        assert_eq!(engine.state().lives, 0);
        assert_eq!(engine.state().mode, GameMode::Feedback);

        engine.tick(0.5);
        assert_eq!(engine.state().mode, GameMode::Feedback);
        engine.tick(0.3);
        assert_eq!(engine.state().mode, GameMode::GameOver);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut engine = RoundEngine::new(9);
        engine.start_game();
        while engine.state().mode != GameMode::GameOver {
            engine.tick(10.0);
        }
        let last_round = engine.state().round;

        engine.start_game();
        let state = engine.state();
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.lives, 5);
        assert_eq!(state.score, 0);
        assert!(state.last_outcome.is_none());
        assert_eq!(state.round, last_round + 1);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut engine = scripted(&[(6, 7)]);
        engine.start_game();
        assert_eq!(engine.state().score, 0);
        assert_eq!(engine.state().lives, 5);
        assert_eq!(engine.state().equation.map(|e| e.answer), Some(42));

        engine.append_digit(4);
        engine.append_digit(2);
        let state = engine.state();
        assert_eq!(state.last_outcome.map(|o| o.kind), Some(OutcomeKind::Correct));
        assert_eq!(state.score, 1);
        assert_eq!(state.mode, GameMode::Feedback);

        engine.tick(crate::consts::FEEDBACK_DURATION);
        let state = engine.state();
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.round, 2);
        assert!(state.equation.is_some());
        assert!(state.pending_input.is_empty());
        assert_eq!(state.lives, 5);
    }

    proptest! {
        #[test]
        fn prop_lives_never_underflow(answers in proptest::collection::vec(0u32..120, 1..40)) {
            let mut engine = RoundEngine::new(42);
            engine.start_game();
            for answer in answers {
                engine.submit_answer(answer);
                prop_assert!(engine.state().lives <= 5);
                engine.tick(1.0);
                if engine.state().mode == GameMode::GameOver {
                    prop_assert_eq!(engine.state().lives, 0);
                    engine.start_game();
                }
            }
        }

        #[test]
        fn prop_score_never_decreases_within_game(
            answers in proptest::collection::vec(proptest::option::of(0u32..120), 1..60)
        ) {
            let mut engine = RoundEngine::new(7);
            engine.start_game();
            let mut last_score = 0;
            for answer in answers {
                let correct = engine.state().equation.map(|e| e.answer);
                // None means answer correctly
                engine.submit_answer(answer.or(correct).unwrap_or(0));
                prop_assert!(engine.state().score >= last_score);
                last_score = engine.state().score;
                engine.tick(1.0);
                if engine.state().mode == GameMode::GameOver {
                    break;
                }
            }
        }
    }
}
