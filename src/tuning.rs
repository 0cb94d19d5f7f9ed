//! Data-driven game balance
//!
//! Defaults reproduce the stock game. A JSON document can override any subset
//! of fields; missing ones keep their defaults.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::consts::{FEEDBACK_DURATION, OPERAND_MAX, OPERAND_MIN, STARTING_LIVES};

#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("tuning is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// One step of the difficulty table: from `min_score` upward, rounds last `time_limit` seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyStep {
    pub min_score: u32,
    pub time_limit: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub starting_lives: u8,
    /// Seconds the feedback screen stays up
    pub feedback_duration: f32,
    pub operand_min: u32,
    pub operand_max: u32,
    /// Sorted by `min_score`, first entry starts at 0
    pub difficulty: Vec<DifficultyStep>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            feedback_duration: FEEDBACK_DURATION,
            operand_min: OPERAND_MIN,
            operand_max: OPERAND_MAX,
            difficulty: vec![
                DifficultyStep { min_score: 0, time_limit: 7.0 },
                DifficultyStep { min_score: 20, time_limit: 5.0 },
                DifficultyStep { min_score: 40, time_limit: 4.0 },
            ],
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if !(1..=STARTING_LIVES).contains(&self.starting_lives) {
            return Err(TuningError::Invalid(format!(
                "starting_lives {} outside 1..={STARTING_LIVES}",
                self.starting_lives
            )));
        }
        if !(self.feedback_duration >= 0.0) {
            return Err(TuningError::Invalid("feedback_duration must be >= 0".into()));
        }
        // Operands may narrow the times table but never leave it
        let table = OPERAND_MIN..=OPERAND_MAX;
        if self.operand_min > self.operand_max
            || !table.contains(&self.operand_min)
            || !table.contains(&self.operand_max)
        {
            return Err(TuningError::Invalid(format!(
                "operand range {}..={} must be non-empty and within {OPERAND_MIN}..={OPERAND_MAX}",
                self.operand_min, self.operand_max
            )));
        }

        let Some(first) = self.difficulty.first() else {
            return Err(TuningError::Invalid("difficulty table is empty".into()));
        };
        if first.min_score != 0 {
            return Err(TuningError::Invalid("first difficulty step must start at score 0".into()));
        }
        for pair in self.difficulty.windows(2) {
            if pair[1].min_score <= pair[0].min_score {
                return Err(TuningError::Invalid(format!(
                    "difficulty thresholds must increase ({} then {})",
                    pair[0].min_score, pair[1].min_score
                )));
            }
        }
        if let Some(step) = self.difficulty.iter().find(|s| !(s.time_limit > 0.0)) {
            return Err(TuningError::Invalid(format!(
                "time limit at score {} must be positive",
                step.min_score
            )));
        }
        Ok(())
    }

    /// Round length for a given score
    ///
    /// Picks the last step whose threshold the score has reached, so a score
    /// sitting exactly on a boundary gets the shorter time.
    pub fn time_limit_for(&self, score: u32) -> f32 {
        self.difficulty
            .iter()
            .rev()
            .find(|step| score >= step.min_score)
            .or(self.difficulty.first())
            .map(|step| step.time_limit)
            .unwrap_or(7.0)
    }

    pub fn operands(&self) -> RangeInclusive<u32> {
        self.operand_min..=self.operand_max
    }
}
