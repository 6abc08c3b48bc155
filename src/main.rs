//! Ashfall entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use ashfall::audio::{AudioManager, SoundEffect};
    use ashfall::consts::*;
    use ashfall::renderer::RenderState;
    use ashfall::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use ashfall::tuning::Tuning;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        render_state: Option<RenderState>,
        audio: AudioManager,
        input: TickInput,
        /// Level announcement overlay, removed once its expiry passes
        announcement: Option<(Element, f64)>,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning) -> Self {
            Self {
                state: GameState::new_with_tuning(seed, tuning),
                render_state: None,
                audio: AudioManager::new(),
                input: TickInput::default(),
                announcement: None,
            }
        }

        /// One fixed simulation step per animation frame
        fn update(&mut self) {
            let input = self.input.clone();
            tick(&mut self.state, &input);
            // Fire is edge-triggered, consumed by the tick we just ran
            self.input.fire = false;
        }

        /// Map drained gameplay events to audio cues and DOM effects
        fn handle_events(&mut self, time: f64) {
            for event in self.state.drain_events() {
                match event {
                    GameEvent::RunStarted => {
                        self.audio.resume();
                        self.audio.start_drone();
                    }
                    GameEvent::ShotFired => self.audio.play(SoundEffect::Shot),
                    GameEvent::RaiderSpawned => self.audio.play(SoundEffect::SpawnScreech),
                    GameEvent::Detonation { massive: false } => {
                        self.audio.play(SoundEffect::Blast);
                    }
                    GameEvent::Detonation { massive: true } => {
                        self.audio.play(SoundEffect::MassiveBlast);
                    }
                    GameEvent::LevelUp { level } => {
                        self.audio.play(SoundEffect::LevelUp);
                        self.show_level_announcement(level, time);
                    }
                    GameEvent::Breach { x } => {
                        log::info!("Breach at x={x:.0}");
                    }
                    GameEvent::RunOver => {
                        self.audio.stop_drone();
                        self.audio.play(SoundEffect::MassiveBlast);
                        show_game_over(self.state.score);
                    }
                }
            }

            // Expire the level announcement
            if let Some((el, until)) = self.announcement.take() {
                if time >= until {
                    el.remove();
                } else {
                    self.announcement = Some((el, until));
                }
            }
        }

        /// Big center-screen level banner, kept for two seconds
        fn show_level_announcement(&mut self, level: u32, time: f64) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let Some(body) = document.body() else { return };

            if let Some((el, _)) = self.announcement.take() {
                el.remove();
            }

            if let Ok(el) = document.create_element("div") {
                el.set_text_content(Some(&format!("NIGHTMARE LEVEL {level}")));
                let _ = el.set_attribute("class", "level-banner");
                if body.append_child(&el).is_ok() {
                    self.announcement = Some((el, time + 2000.0));
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&self.state, self.input.aim, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("score") {
                el.set_text_content(Some(&format!(
                    "LVL {} | {}",
                    self.state.level, self.state.score
                )));
            }

            if let Some(el) = document.get_element_by_id("health") {
                el.set_text_content(Some(&format!("{}%", self.state.integrity)));
            }

            // Integrity readout shifts color as the bastion crumbles
            if let Some(el) = document.get_element_by_id("health-box") {
                let color = if self.state.integrity > 60 {
                    "#ff4444"
                } else if self.state.integrity > 20 {
                    "orange"
                } else {
                    "darkred"
                };
                let _ = el.set_attribute("style", &format!("color: {color}"));
            }

            if let Some(el) = document.get_element_by_id("ammo-fill") {
                let _ = el.set_attribute("style", &format!("width: {}%", self.state.ammo));
            }
        }
    }

    /// Optional tuning overrides from an embedded JSON block in the page
    fn load_tuning() -> Tuning {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("tuning"))
            .and_then(|el| el.text_content());
        match json {
            Some(json) if !json.trim().is_empty() => match Tuning::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from page");
                    tuning
                }
                Err(e) => {
                    log::warn!("Bad tuning JSON, using defaults: {e}");
                    Tuning::default()
                }
            },
            _ => Tuning::default(),
        }
    }

    fn show_game_over(score: u64) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("game-over-screen") {
            let _ = el.set_attribute("class", "screen");
        }
        if let Some(el) = document.get_element_by_id("final-score") {
            el.set_text_content(Some(&score.to_string()));
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Ashfall starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let tuning = load_tuning();
        let game = Rc::new(RefCell::new(Game::new(seed, tuning)));

        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let mut render_state = RenderState::new(surface, &adapter, width, height).await;
        render_state.set_start_time(js_sys::Date::now());
        game.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(game.clone());

        // Start game loop
        request_animation_frame(game);

        log::info!("Ashfall running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Mouse move - track the aim point in world coordinates
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                if rect.width() <= 0.0 || rect.height() <= 0.0 {
                    return;
                }
                let x = (event.client_x() as f64 - rect.left()) / rect.width() * WORLD_WIDTH as f64;
                let y = (event.client_y() as f64 - rect.top()) / rect.height() * WORLD_HEIGHT as f64;
                game.borrow_mut().input.aim = glam::Vec2::new(x as f32, y as f32);
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard - Control fires, edge-triggered (held key does not autofire)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.key() == "Control" && !event.repeat() {
                    game.borrow_mut().input.fire = true;
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let document = web_sys::window().unwrap().document().unwrap();
                if let Some(el) = document.get_element_by_id("start-screen") {
                    let _ = el.set_attribute("class", "screen hidden");
                }
                game.borrow_mut().state.start();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let document = web_sys::window().unwrap().document().unwrap();
                if let Some(el) = document.get_element_by_id("game-over-screen") {
                    let _ = el.set_attribute("class", "screen hidden");
                }
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::GameOver {
                    g.state.start();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.update();
            g.handle_events(time);
            g.render(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Ashfall (native) starting...");
    log::info!("Native mode has no window - run with `trunk serve` for the web version");

    // Headless smoke run: a few seconds of simulation with periodic fire
    use ashfall::sim::{GameState, TickInput, tick};

    let mut state = GameState::new(0xA5F);
    state.start();
    let mut input = TickInput::default();
    for i in 0u64..600 {
        input.fire = i % 45 == 0;
        tick(&mut state, &input);
        state.drain_events();
    }
    log::info!(
        "Smoke run done: tick={} score={} level={} integrity={}",
        state.tick,
        state.score,
        state.level,
        state.integrity
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
