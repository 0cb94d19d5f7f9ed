//! Audio cues for round outcomes
//!
//! Retro square-wave jingles, procedurally generated - no external files needed!
//! Cue selection is platform independent; playback uses Web Audio on wasm and
//! is a no-op on native.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::{GameEvent, OutcomeKind};

/// A short note sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Melody {
    pub name: &'static str,
    /// Note frequencies in Hz
    pub notes: &'static [f32],
    /// Delay before each note after the first, in ms (one shorter than `notes`)
    pub gaps_ms: &'static [f32],
}

impl Melody {
    /// (start offset in seconds, frequency) for each note
    pub fn schedule(&self) -> Vec<(f32, f32)> {
        let mut offset_ms = 0.0;
        let mut out = Vec::with_capacity(self.notes.len());
        for (i, &freq) in self.notes.iter().enumerate() {
            if i > 0 {
                offset_ms += self.gaps_ms.get(i - 1).copied().unwrap_or(0.0);
            }
            out.push((offset_ms / 1000.0, freq));
        }
        out
    }
}

pub static SUCCESS_MELODIES: [Melody; 9] = [
    Melody { name: "ascending", notes: &[523.25, 659.25, 783.99], gaps_ms: &[80.0, 80.0] },
    Melody { name: "power-up", notes: &[392.00, 523.25, 659.25, 783.99], gaps_ms: &[60.0, 60.0, 80.0] },
    Melody { name: "fanfare", notes: &[659.25, 783.99, 1046.50], gaps_ms: &[70.0, 70.0] },
    Melody { name: "bounce", notes: &[523.25, 783.99, 659.25, 880.00], gaps_ms: &[60.0, 50.0, 70.0] },
    Melody { name: "coin", notes: &[987.77, 1318.51], gaps_ms: &[50.0] },
    Melody {
        name: "level-up",
        notes: &[523.25, 587.33, 659.25, 783.99, 880.00],
        gaps_ms: &[50.0, 50.0, 50.0, 80.0],
    },
    Melody { name: "quick-win", notes: &[659.25, 880.00, 1046.50, 1318.51], gaps_ms: &[40.0, 40.0, 60.0] },
    Melody {
        name: "arpeggio",
        notes: &[523.25, 659.25, 783.99, 1046.50, 1318.51],
        gaps_ms: &[40.0, 40.0, 40.0, 60.0],
    },
    Melody { name: "cheerful", notes: &[659.25, 523.25, 783.99, 659.25], gaps_ms: &[50.0, 50.0, 70.0] },
];

/// G4, D4, G3
pub static FAIL_MELODY: Melody = Melody {
    name: "fail",
    notes: &[392.00, 293.66, 196.00],
    gaps_ms: &[100.0, 100.0],
};

/// Per-note gain envelope (seconds, and levels relative to peak)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub peak: f32,
}

impl Envelope {
    pub fn duration(&self) -> f32 {
        self.attack + self.decay + self.release
    }
}

/// Something the audio layer should play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Index into `SUCCESS_MELODIES`
    Success(usize),
    Fail,
}

impl Cue {
    pub fn melody(&self) -> &'static Melody {
        match *self {
            Cue::Success(i) => &SUCCESS_MELODIES[i % SUCCESS_MELODIES.len()],
            Cue::Fail => &FAIL_MELODY,
        }
    }

    pub fn envelope(&self) -> Envelope {
        match self {
            Cue::Success(_) => Envelope { attack: 0.01, decay: 0.05, sustain: 0.1, release: 0.1, peak: 0.2 },
            Cue::Fail => Envelope { attack: 0.01, decay: 0.1, sustain: 0.2, release: 0.15, peak: 0.25 },
        }
    }
}

/// Maps engine events to cues, picking a random celebration for each success
#[derive(Debug, Clone)]
pub struct CueSelector {
    rng: Pcg32,
}

impl CueSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn cue_for(&mut self, event: &GameEvent) -> Option<Cue> {
        match event {
            GameEvent::Resolved(outcome) => Some(match outcome.kind {
                OutcomeKind::Correct => Cue::Success(self.rng.random_range(0..SUCCESS_MELODIES.len())),
                OutcomeKind::Incorrect => Cue::Fail,
            }),
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{Cue, Envelope};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl AudioManager {
        pub fn new(settings: &Settings) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            let mut manager = Self {
                ctx,
                master_volume: 0.8,
                sfx_volume: 1.0,
                muted: false,
            };
            manager.apply_settings(settings);
            manager
        }

        pub fn apply_settings(&mut self, settings: &Settings) {
            self.master_volume = settings.master_volume.clamp(0.0, 1.0);
            self.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
            self.muted = settings.muted;
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.master_volume * self.sfx_volume
            }
        }

        pub fn play(&self, cue: Cue) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let start = ctx.current_time();
            let envelope = cue.envelope();
            for (offset, freq) in cue.melody().schedule() {
                self.play_note(ctx, freq, start + offset as f64, &envelope, vol);
            }
        }

        /// Create a square oscillator routed through a gain node
        fn create_osc(&self, ctx: &AudioContext, freq: f32) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(OscillatorType::Square);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        fn play_note(&self, ctx: &AudioContext, freq: f32, t: f64, env: &Envelope, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, freq) else {
                log::warn!("Could not create oscillator for {freq} Hz");
                return;
            };
            let peak = env.peak * vol;
            let attack_end = t + env.attack as f64;
            let decay_end = attack_end + env.decay as f64;
            let release_end = decay_end + env.release as f64;

            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain().linear_ramp_to_value_at_time(peak, attack_end).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time((peak * env.sustain).max(0.001), decay_end)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, release_end)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + env.duration() as f64 + 0.02).ok();
        }
    }
}

/// Native stand-in: logs cues instead of playing them
#[cfg(not(target_arch = "wasm32"))]
pub struct AudioManager {
    muted: bool,
}

#[cfg(not(target_arch = "wasm32"))]
impl AudioManager {
    pub fn new(settings: &crate::settings::Settings) -> Self {
        Self { muted: settings.muted }
    }

    pub fn apply_settings(&mut self, settings: &crate::settings::Settings) {
        self.muted = settings.muted;
    }

    pub fn resume(&self) {}

    pub fn play(&self, cue: Cue) {
        if !self.muted {
            log::debug!("Cue: {} ({:?})", cue.melody().name, cue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Equation, Outcome, OutcomeCause};

    fn resolved(kind: OutcomeKind) -> GameEvent {
        GameEvent::Resolved(Outcome {
            kind,
            cause: OutcomeCause::Answered,
            equation: Equation::new(2, 3),
            submitted: Some(6),
            score_delta: 0,
            lives_lost: 0,
        })
    }

    #[test]
    fn test_melody_tables_consistent() {
        for melody in SUCCESS_MELODIES.iter().chain(std::iter::once(&FAIL_MELODY)) {
            assert_eq!(melody.gaps_ms.len() + 1, melody.notes.len(), "{}", melody.name);
        }
    }

    #[test]
    fn test_fail_schedule_descends() {
        let schedule = FAIL_MELODY.schedule();
        assert_eq!(schedule.len(), 3);
        assert!((schedule[1].0 - 0.1).abs() < 1e-6);
        assert!((schedule[2].0 - 0.2).abs() < 1e-6);
        assert!(schedule.windows(2).all(|w| w[1].1 < w[0].1));
    }

    #[test]
    fn test_cue_selection() {
        let mut selector = CueSelector::new(99);
        assert_eq!(selector.cue_for(&resolved(OutcomeKind::Incorrect)), Some(Cue::Fail));
        assert_eq!(selector.cue_for(&GameEvent::GameStarted), None);
        assert_eq!(selector.cue_for(&GameEvent::GameOver { final_score: 3 }), None);

        let mut seen = vec![false; SUCCESS_MELODIES.len()];
        for _ in 0..500 {
            match selector.cue_for(&resolved(OutcomeKind::Correct)) {
                Some(Cue::Success(i)) => seen[i] = true,
                other => panic!("unexpected cue {other:?}"),
            }
        }
        assert!(seen.iter().all(|&s| s));
    }
}
