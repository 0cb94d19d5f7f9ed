//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame timing (delta computation and clamping)
//! - Input mode detection (touch vs keyboard)

use serde::{Deserialize, Serialize};

use crate::consts::MAX_FRAME_DT;

/// Which input path the host wires up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    /// Number keys, backspace, enter, space
    #[default]
    Keyboard,
    /// Multiple-choice buttons and taps
    Touch,
}

/// Guess the input mode from the device (touch points on web)
#[cfg(target_arch = "wasm32")]
pub fn detect_input_mode() -> InputMode {
    let touch_points = web_sys::window()
        .map(|w| w.navigator().max_touch_points())
        .unwrap_or(0);
    if touch_points > 0 {
        InputMode::Touch
    } else {
        InputMode::Keyboard
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn detect_input_mode() -> InputMode {
    InputMode::Keyboard
}

/// Turns host timestamps (ms) into per-frame deltas (seconds)
///
/// Deltas are clamped to `[0, MAX_FRAME_DT]` so a clock going backwards or a
/// long stall never reaches the engine as a negative or huge step.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call (0 on the first call)
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        if dt.is_nan() {
            return 0.0;
        }
        dt.clamp(0.0, MAX_FRAME_DT)
    }

    /// Forget the previous timestamp (tab hidden, focus lost)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
