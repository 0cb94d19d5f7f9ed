//! Equation generation
//!
//! The engine never touches an RNG directly; it asks an `EquationSource`.
//! Gameplay uses `SeededEquations`, tests script exact problems with
//! `ScriptedEquations`.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::Equation;

/// Supplies the next equation for a round
pub trait EquationSource {
    fn next_equation(&mut self, operands: RangeInclusive<u32>) -> Equation;
}

/// Uniform independent operands from a seeded PCG stream
#[derive(Debug, Clone)]
pub struct SeededEquations {
    rng: Pcg32,
}

impl SeededEquations {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl EquationSource for SeededEquations {
    fn next_equation(&mut self, operands: RangeInclusive<u32>) -> Equation {
        // Repeats are allowed; the problem space is tiny
        let a = self.rng.random_range(operands.clone());
        let b = self.rng.random_range(operands);
        Equation::new(a, b)
    }
}

/// Plays back a fixed list of operand pairs, then falls back to seeded generation
#[derive(Debug, Clone)]
pub struct ScriptedEquations {
    script: VecDeque<(u32, u32)>,
    fallback: SeededEquations,
}

impl ScriptedEquations {
    pub fn new(script: impl IntoIterator<Item = (u32, u32)>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: SeededEquations::new(0),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl EquationSource for ScriptedEquations {
    fn next_equation(&mut self, operands: RangeInclusive<u32>) -> Equation {
        match self.script.pop_front() {
            Some((a, b)) => Equation::new(a, b),
            None => self.fallback.next_equation(operands),
        }
    }
}

/// Number of decimal digits in `n` (0 has one digit)
pub fn digit_count(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}
