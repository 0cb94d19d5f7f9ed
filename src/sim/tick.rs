//! Per-frame timing
//!
//! The host passes the wall-clock delta since the previous frame. One call
//! resolves at most one countdown crossing zero; overshoot is dropped and the
//! next state starts with its full nominal timer.

use super::engine::RoundEngine;
use super::equation::EquationSource;
use super::state::{GameMode, OutcomeCause};

impl<S: EquationSource> RoundEngine<S> {
    /// Advance the active countdown by `dt` seconds (must be >= 0)
    pub fn tick(&mut self, dt: f32) {
        debug_assert!(dt >= 0.0, "negative frame delta {dt}");

        match self.state.mode {
            GameMode::Playing => {
                self.state.time_remaining -= dt;
                if self.state.time_remaining <= 0.0 {
                    // Timeout counts exactly like a wrong answer
                    self.state.time_remaining = 0.0;
                    self.state.pending_input.clear();
                    self.resolve(None, OutcomeCause::TimedOut);
                }
            }
            GameMode::Feedback => {
                self.state.feedback_remaining -= dt;
                if self.state.feedback_remaining <= 0.0 {
                    self.finish_feedback();
                }
            }
            GameMode::Waiting | GameMode::GameOver => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Equation, GameEvent, OutcomeKind, ScriptedEquations};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn scripted(pairs: &[(u32, u32)]) -> RoundEngine<ScriptedEquations> {
        RoundEngine::with_source(ScriptedEquations::new(pairs.iter().copied()), Tuning::default()).unwrap()
    }

    #[test]
    fn test_tick_counts_down() {
        let mut engine = scripted(&[(2, 3)]);
        engine.start_game();
        engine.tick(1.5);
        assert_eq!(engine.state().mode, GameMode::Playing);
        assert!((engine.state().time_remaining - 5.5).abs() < 1e-5);
        assert!((engine.state().time_ratio() - 5.5 / 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_tick_idle_modes() {
        let mut engine = scripted(&[]);
        let before = engine.state().clone();
        engine.tick(100.0);
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_timeout_is_incorrect() {
        let mut engine = scripted(&[(9, 9)]);
        engine.start_game();
        engine.append_digit(8);
        engine.take_events();

        engine.tick(7.0);
        let state = engine.state();
        assert_eq!(state.mode, GameMode::Feedback);
        assert_eq!(state.lives, 4);
        assert_eq!(state.time_remaining, 0.0);
        assert!(state.pending_input.is_empty());

        let outcome = state.last_outcome.unwrap();
        assert_eq!(outcome.kind, OutcomeKind::Incorrect);
        assert_eq!(outcome.cause, OutcomeCause::TimedOut);
        assert_eq!(outcome.submitted, None);
        assert_eq!(engine.take_events(), vec![GameEvent::Resolved(outcome)]);
    }

    #[test]
    fn test_feedback_elapses_into_new_round() {
        let mut engine = scripted(&[(2, 3), (4, 5)]);
        engine.start_game();
        engine.submit_answer(6);

        engine.tick(0.69);
        assert_eq!(engine.state().mode, GameMode::Feedback);

        engine.tick(0.02);
        let state = engine.state();
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.equation, Some(Equation::new(4, 5)));
        assert_eq!(state.time_remaining, state.time_limit);
    }

    #[test]
    fn test_overshoot_not_carried() {
        let mut engine = scripted(&[(2, 3), (4, 5)]);
        engine.start_game();

        // Far longer than countdown + feedback + next round
        engine.tick(60.0);
        assert_eq!(engine.state().mode, GameMode::Feedback);
        assert_eq!(engine.state().feedback_remaining, 0.7);

        engine.tick(60.0);
        let state = engine.state();
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.time_remaining, 7.0);
        assert_eq!(state.lives, 4);
    }

    #[test]
    fn test_skip_feedback_resolves_on_next_tick() {
        let mut engine = scripted(&[(2, 3)]);
        engine.start_game();
        engine.submit_answer(6);
        engine.skip_feedback();
        assert_eq!(engine.state().mode, GameMode::Feedback);
        assert_eq!(engine.state().feedback_remaining, 0.0);

        engine.tick(0.0);
        assert_eq!(engine.state().mode, GameMode::Playing);
    }

    #[test]
    fn test_skip_on_fatal_round_goes_to_game_over() {
        let tuning = Tuning {
            starting_lives: 1,
            ..Tuning::default()
        };
        let mut engine = RoundEngine::with_source(ScriptedEquations::new([(2, 2)]), tuning).unwrap();
        engine.start_game();
        engine.submit_answer(5);
        assert_eq!(engine.state().mode, GameMode::Feedback);

        engine.skip_feedback();
        engine.tick(0.0);
        assert_eq!(engine.state().mode, GameMode::GameOver);
    }

    #[test]
    fn test_difficulty_applied_on_new_round() {
        let mut engine = scripted(&[]);
        engine.start_game();

        for _ in 0..20 {
            assert_eq!(engine.state().time_limit, 7.0);
            let answer = engine.state().equation.map(|e| e.answer).unwrap_or(0);
            engine.submit_answer(answer);
            engine.tick(1.0);
        }
        assert_eq!(engine.state().score, 20);
        assert_eq!(engine.state().time_limit, 5.0);

        engine.state.score = 39;
        engine.submit_answer(0);
        engine.tick(1.0);
        assert_eq!(engine.state().time_limit, 5.0);

        engine.state.score = 40;
        engine.submit_answer(0);
        engine.tick(1.0);
        assert_eq!(engine.state().time_limit, 4.0);
    }

    proptest! {
        #[test]
        fn prop_playing_always_resolves(
            seed in any::<u64>(),
            deltas in proptest::collection::vec(0.001f32..0.5, 1..400),
        ) {
            let mut engine = RoundEngine::new(seed);
            engine.start_game();
            let round = engine.state().round;
            let mut elapsed = 0.0;
            for dt in deltas {
                engine.tick(dt);
                elapsed += dt;
                if engine.state().mode != GameMode::Playing || engine.state().round != round {
                    break;
                }
                prop_assert!(elapsed < 7.0 + 1e-3);
            }
            let state = engine.state();
            prop_assert!(state.time_remaining >= 0.0 && state.time_remaining <= state.time_limit);
        }

        #[test]
        fn prop_one_transition_per_tick(
            seed in any::<u64>(),
            deltas in proptest::collection::vec(0.0f32..50.0, 1..100),
        ) {
            let mut engine = RoundEngine::new(seed);
            engine.start_game();
            for dt in deltas {
                let before = engine.state().mode;
                engine.tick(dt);
                let after = engine.state().mode;
                prop_assert!(before == after || before.can_transition_to(after));
                let resolutions = engine
                    .take_events()
                    .iter()
                    .filter(|e| matches!(e, GameEvent::Resolved(_)))
                    .count();
                prop_assert!(resolutions <= 1);
                if after == GameMode::GameOver {
                    engine.start_game();
                }
            }
        }
    }
}
