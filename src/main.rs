//! Math Craft entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent, PointerEvent};

    use math_craft::audio::{AudioManager, CueSelector};
    use math_craft::platform::{FrameClock, InputMode, detect_input_mode};
    use math_craft::ui::{ChoiceLayout, HudView, Tone, creeper_offset};
    use math_craft::{GameEvent, GameMode, InputResolver, KeyAction, RoundEngine, Settings, Tuning};

    /// Creeper track length in CSS pixels (bar width minus creeper width)
    const TRACK_WIDTH: f32 = 540.0;

    /// Game instance holding all state
    struct Game {
        engine: RoundEngine,
        input: InputResolver,
        cues: CueSelector,
        audio: AudioManager,
        settings: Settings,
        input_mode: InputMode,
        clock: FrameClock,
        layout: ChoiceLayout,
    }

    impl Game {
        fn new(seed: u64, settings: Settings, tuning: Tuning) -> Self {
            let input_mode = settings.resolve_input_mode(detect_input_mode());
            log::info!("Input mode: {:?}", input_mode);
            let (w, h) = viewport_size();
            let engine = RoundEngine::with_tuning(seed, tuning).unwrap_or_else(|e| {
                log::warn!("Falling back to default tuning: {e}");
                RoundEngine::new(seed)
            });
            Self {
                engine,
                input: InputResolver::new(seed.wrapping_add(1)),
                cues: CueSelector::new(seed.wrapping_add(2)),
                audio: AudioManager::new(&settings),
                settings,
                input_mode,
                clock: FrameClock::new(),
                layout: ChoiceLayout::for_viewport(w, h),
            }
        }

        fn update(&mut self, time: f64) {
            let dt = self.clock.advance(time);
            self.engine.tick(dt);
            self.dispatch_events();
        }

        /// Keep the choices in step and hand outcomes to the audio layer
        fn dispatch_events(&mut self) {
            self.input.sync(&self.engine);
            for event in self.engine.take_events() {
                if let GameEvent::GameOver { final_score } = event {
                    log::info!("Game over with score {}", final_score);
                }
                if let Some(cue) = self.cues.cue_for(&event) {
                    self.audio.play(cue);
                }
            }
        }

        fn on_key(&mut self, key: &str) -> bool {
            if key == "m" || key == "M" {
                self.settings.muted = !self.settings.muted;
                self.audio.apply_settings(&self.settings);
                self.settings.save();
                log::info!("Muted: {}", self.settings.muted);
                return true;
            }
            let Some(action) = KeyAction::from_key(key) else {
                return false;
            };
            // Browsers only allow audio after a user gesture
            self.audio.resume();
            self.input.on_key(&mut self.engine, action);
            self.dispatch_events();
            true
        }

        fn on_pointer(&mut self, x: f32, y: f32) {
            self.audio.resume();
            self.input.on_pointer(&mut self.engine, Vec2::new(x, y), &self.layout);
            self.dispatch_events();
        }

        fn resize(&mut self) {
            let (w, h) = viewport_size();
            self.layout = ChoiceLayout::for_viewport(w, h);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let state = self.engine.state();
            let hud = HudView::from_state(
                state,
                self.engine.tuning().starting_lives,
                self.input_mode,
                self.settings.reduced_motion,
            );

            let in_round = matches!(hud.mode, GameMode::Playing | GameMode::Feedback);
            set_class(&document, "title-screen", if in_round { "hidden" } else { "" });
            set_class(&document, "play-screen", if in_round { "" } else { "hidden" });
            set_text(&document, "headline", &hud.headline);
            set_text(&document, "prompt", &hud.prompt);

            set_text(&document, "score", &format!("Score: {}", hud.score));
            let hearts: String = hud.hearts.iter().map(|&h| if h { '\u{2665}' } else { '\u{2661}' }).collect();
            set_text(&document, "hearts", &hearts);

            let tone = match hud.tone {
                Tone::Neutral => "",
                Tone::Correct => "correct",
                Tone::Incorrect => "incorrect",
            };
            set_text(&document, "equation", &hud.equation);
            set_class(&document, "equation", tone);
            set_text(&document, "answer", &hud.answer);
            set_class(&document, "answer", tone);

            let danger_class = match (hud.danger, hud.danger_flash) {
                (false, _) => "hidden",
                (true, false) => "danger",
                (true, true) => "danger blink",
            };
            set_class(&document, "danger", danger_class);

            let creeper_x = creeper_offset(state, TRACK_WIDTH);
            set_style(&document, "creeper", &format!("left: {creeper_x:.1}px"));

            self.update_choices(&document, hud.mode);
        }

        fn update_choices(&self, document: &Document, mode: GameMode) {
            let show = self.input_mode == InputMode::Touch && mode == GameMode::Playing;
            let choices = self.input.choices().filter(|_| show);
            for (i, rect) in self.layout.buttons.iter().enumerate() {
                let id = format!("choice-{i}");
                match choices.and_then(|c| c.get(i)) {
                    Some(value) => {
                        set_text(document, &id, &value.to_string());
                        set_class(document, &id, "choice");
                        set_style(
                            document,
                            &id,
                            &format!(
                                "left: {:.0}px; top: {:.0}px; width: {:.0}px; height: {:.0}px",
                                rect.min.x, rect.min.y, rect.size.x, rect.size.y
                            ),
                        );
                    }
                    None => set_class(document, &id, "choice hidden"),
                }
            }
        }
    }

    fn viewport_size() -> (f32, f32) {
        let Some(window) = web_sys::window() else {
            return (800.0, 600.0);
        };
        let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
        let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
        (w as f32, h as f32)
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_class(document: &Document, id: &str, class: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", class);
        }
    }

    fn set_style(document: &Document, id: &str, style: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("style", style);
        }
    }

    /// Optional balance overrides from `<script id="tuning" type="application/json">`
    fn load_tuning(document: &Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
        else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning overrides: {e}");
                Tuning::default()
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }
        log::info!("Math Craft starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document - cannot start");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, Settings::load(), load_tuning(&document))));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());
        setup_window_handlers(game.clone());
        request_animation_frame(game);
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };

        // Keyboard works in every input mode
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().on_key(&event.key()) {
                    // Keep space from scrolling and backspace from navigating
                    event.prevent_default();
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Taps only drive the game in touch mode
        if game.borrow().input_mode == InputMode::Touch {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                game.borrow_mut()
                    .on_pointer(event.client_x() as f32, event.client_y() as f32);
            });
            let _ = window.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_window_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        // Resize moves the answer buttons
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().resize();
            });
            let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // A hidden tab must not come back with one giant frame
        {
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().clock.reset();
                    log::info!("Tab hidden, frame clock reset");
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use math_craft::audio::{AudioManager, CueSelector};
    use math_craft::{GameEvent, GameMode, InputResolver, KeyAction, RoundEngine, Settings, Tuning, TuningError};

    const FRAME_DT: f32 = 1.0 / 60.0;

    /// What the bot does with the current round
    enum Plan {
        Answer { value: u32, think: f32 },
        Wait,
    }

    pub struct Summary {
        pub score: u32,
        pub rounds: u64,
        pub timeouts: u32,
    }

    /// Play one game with a scripted player at 60 fps until game over or `max_rounds`
    pub fn run(seed: u64, tuning: Tuning, max_rounds: u64) -> Result<Summary, TuningError> {
        let settings = Settings::load();
        let mut engine = RoundEngine::with_tuning(seed, tuning)?;
        let mut input = InputResolver::new(seed.wrapping_add(1));
        let mut cues = CueSelector::new(seed.wrapping_add(2));
        let audio = AudioManager::new(&settings);
        let mut bot = Pcg32::seed_from_u64(seed.wrapping_add(3));

        let mut plan = Plan::Wait;
        let mut round_seen = 0;
        let mut round_time = 0.0;
        let mut timeouts = 0;

        input.on_key(&mut engine, KeyAction::Primary);

        while engine.state().mode != GameMode::GameOver && engine.state().round <= max_rounds {
            let state = engine.state();
            if state.round != round_seen {
                round_seen = state.round;
                round_time = 0.0;
                plan = make_plan(&mut bot, state.equation.map(|e| e.answer).unwrap_or(0), state.time_limit);
            }

            let mode = state.mode;
            match mode {
                GameMode::Playing => {
                    round_time += FRAME_DT;
                    if let Plan::Answer { value, think } = plan {
                        if round_time >= think {
                            for d in value.to_string().bytes() {
                                input.on_key(&mut engine, KeyAction::Digit(d - b'0'));
                            }
                            plan = Plan::Wait;
                        }
                    }
                }
                GameMode::Feedback => {
                    if bot.random_bool(0.25) {
                        input.on_key(&mut engine, KeyAction::Primary);
                    }
                }
                GameMode::Waiting | GameMode::GameOver => {}
            }

            engine.tick(FRAME_DT);
            input.sync(&engine);

            for event in engine.take_events() {
                if let GameEvent::Resolved(outcome) = event {
                    if outcome.cause == math_craft::sim::OutcomeCause::TimedOut {
                        timeouts += 1;
                    }
                    log::info!(
                        "{} x {} -> {:?} {:?}",
                        outcome.equation.a,
                        outcome.equation.b,
                        outcome.submitted,
                        outcome.kind
                    );
                }
                if let Some(cue) = cues.cue_for(&event) {
                    audio.play(cue);
                }
            }
        }

        let state = engine.state();
        Ok(Summary {
            score: state.score,
            rounds: state.round,
            timeouts,
        })
    }

    fn make_plan(bot: &mut Pcg32, answer: u32, time_limit: f32) -> Plan {
        let roll: f32 = bot.random();
        let think = bot.random_range(0.5..(time_limit * 0.9).max(0.6));
        if roll < 0.8 {
            Plan::Answer { value: answer, think }
        } else if roll < 0.9 {
            Plan::Answer {
                value: answer + bot.random_range(1..=10),
                think,
            }
        } else {
            Plan::Wait
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use math_craft::Tuning;

    env_logger::init();
    log::info!("Math Craft (native) starting...");
    log::info!("Native mode runs a headless bot game - use `trunk serve` for the web version");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match Tuning::load_file(&path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {path}");
                tuning
            }
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let summary = match headless::run(2024, tuning, 500) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };
    println!(
        "Final score: {} after {} rounds ({} timeouts)",
        summary.score, summary.rounds, summary.timeouts
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
