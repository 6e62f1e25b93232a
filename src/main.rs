//! Mole Rush entry point
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
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, PointerEvent};

    use mole_rush::assets::Assets;
    use mole_rush::audio::{AudioManager, MusicPlayer};
    use mole_rush::best::LocalStore;
    use mole_rush::hud::{HudSink, HudSnapshot};
    use mole_rush::renderer::Presenter;
    use mole_rush::sim::{GameEvent, Haptic, ImpactStyle};
    use mole_rush::{Session, Settings, Tuning, Viewport};

    /// HUD written straight into the page
    struct DomHud {
        document: Document,
        last: Option<HudSnapshot>,
    }

    impl DomHud {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    impl HudSink for DomHud {
        fn show(&mut self, hud: &HudSnapshot) {
            if self.last.as_ref() == Some(hud) {
                return;
            }
            self.set_text("hud-time", &hud.seconds_left.to_string());
            self.set_text("hud-score", &hud.score.to_string());
            self.set_text("hud-mult", &hud.multiplier);
            self.set_text("hud-combo", &hud.combo.to_string());
            self.set_text("hud-best", &hud.best.to_string());

            if let Some(bar) = self
                .document
                .get_element_by_id("hud-progress")
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                let _ = bar.style().set_property("width", &hud.progress_width());
            }
            self.last = Some(hud.clone());
        }
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        presenter: Option<Presenter>,
        canvas: HtmlCanvasElement,
        audio: AudioManager,
        music: MusicPlayer,
        hud: DomHud,
    }

    impl Game {
        fn now() -> f64 {
            web_sys::window()
                .and_then(|w| w.performance())
                .map(|p| p.now())
                .unwrap_or_else(js_sys::Date::now)
        }

        /// Buffer viewport for the canvas' current CSS size
        fn measure(canvas: &HtmlCanvasElement) -> Viewport {
            let dpr = web_sys::window()
                .map(|w| w.device_pixel_ratio())
                .unwrap_or(1.0);
            Viewport::from_client(
                canvas.client_width() as f32,
                canvas.client_height() as f32,
                dpr as f32,
            )
        }

        fn sync_size(&mut self) {
            let viewport = Self::measure(&self.canvas);
            if viewport == self.session.state().viewport {
                return;
            }
            let (w, h) = (viewport.width as u32, viewport.height as u32);
            self.canvas.set_width(w);
            self.canvas.set_height(h);
            self.session.resize(viewport);
            if let Some(presenter) = &mut self.presenter {
                presenter.resize(w, h);
            }
        }

        fn frame(&mut self, time: f64) {
            self.sync_size();
            let frame = self.session.frame(time);
            if let Some(presenter) = &mut self.presenter {
                match presenter.present(&frame) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        presenter.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
            self.dispatch_events(time);
            self.music.update(time);
            let hud = self.session.hud();
            self.hud.show(&hud);
        }

        fn dispatch_events(&mut self, now: f64) {
            for event in self.session.drain_events() {
                match event {
                    GameEvent::Sound(sfx) => self.audio.play(sfx),
                    GameEvent::Music(cue) => self.music.handle(cue, now),
                    GameEvent::Haptic(haptic) => vibrate(haptic),
                    GameEvent::RoundEnded(report) => {
                        self.hud.set_text("final-score", &report.score.to_string());
                        self.hud
                            .set_text("final-note", if report.new_best { "NEW BEST!" } else { "" });
                        if let Some(el) = self.hud.document.get_element_by_id("game-over") {
                            let _ = el.set_attribute("class", "");
                        }
                        self.set_start_label("AGAIN");
                    }
                }
            }
        }

        fn start(&mut self) {
            self.audio.resume();
            if let Some(el) = self.hud.document.get_element_by_id("game-over") {
                let _ = el.set_attribute("class", "hidden");
            }
            self.session.start(Self::now());
            self.set_start_label("RESTART");
        }

        fn set_start_label(&self, text: &str) {
            self.hud.set_text("start", text);
        }

        /// Refresh every toggle button's label
        fn sync_buttons(&self) {
            let settings = self.session.settings();
            let on_off = |on: bool| if on { "ON" } else { "OFF" };
            self.hud
                .set_text("sound", &format!("Sound: {}", on_off(settings.sound)));
            self.hud
                .set_text("haptic", &format!("Haptics: {}", on_off(settings.haptics)));
            self.hud
                .set_text("scares", &format!("Scares: {}", on_off(settings.jump_scares)));
            self.hud
                .set_text("music", &format!("Music: {}", on_off(settings.music)));
            self.hud
                .set_text("quality", &format!("Quality: {}", settings.quality.as_str()));
        }
    }

    /// Best-effort vibration; unsupported browsers just ignore it
    fn vibrate(haptic: Haptic) {
        let ms = match haptic {
            Haptic::Selection => 8,
            Haptic::Impact(ImpactStyle::Light) => 12,
            Haptic::Impact(ImpactStyle::Medium) => 22,
            Haptic::Impact(ImpactStyle::Heavy) => 45,
            Haptic::Warning => 30,
        };
        if let Some(window) = web_sys::window() {
            let _ = window.navigator().vibrate_with_duration(ms);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Mole Rush starting...");

        let Some(window) = web_sys::window() else {
            log::error!("no window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("no document");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("no canvas");
            return;
        };

        let viewport = Game::measure(&canvas);
        let (width, height) = (viewport.width as u32, viewport.height as u32);
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let settings = Settings::load();
        let music = MusicPlayer::new(settings.music_volume);
        let session = Session::new(
            Tuning::default(),
            viewport,
            settings,
            Box::new(LocalStore),
            Assets::procedural(seed),
            seed,
        );
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });
        let presenter = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => match Presenter::new(&instance, surface, width, height, session.assets()).await {
                Ok(p) => Some(p),
                Err(e) => {
                    log::error!("Presenter unavailable: {}", e);
                    None
                }
            },
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                None
            }
        };

        let game = Rc::new(RefCell::new(Game {
            session,
            presenter,
            canvas: canvas.clone(),
            audio: AudioManager::new(),
            music,
            hud: DomHud {
                document: document.clone(),
                last: None,
            },
        }));
        game.borrow().sync_buttons();

        setup_input_handlers(&canvas, game.clone());
        setup_buttons(&document, game.clone());

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Start game loop
        request_animation_frame(game);

        log::info!("Mole Rush running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            event.prevent_default();
            let mut g = game.borrow_mut();
            let dpr = g.session.state().viewport.dpr;
            let point = Vec2::new(event.offset_x() as f32, event.offset_y() as f32) * dpr;
            let outcome = g.session.pointer_down(point, Game::now());
            log::debug!("tap {:?} -> {:?}", point, outcome);
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn on_click(document: &Document, id: &str, game: Rc<RefCell<Game>>, action: fn(&mut Game)) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{} button", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let mut g = game.borrow_mut();
            action(&mut g);
            g.sync_buttons();
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        on_click(document, "start", game.clone(), |g| g.start());
        on_click(document, "sound", game.clone(), |g| {
            if g.session.toggle_sound() {
                g.audio.resume();
            }
        });
        on_click(document, "haptic", game.clone(), |g| {
            g.session.toggle_haptics();
        });
        on_click(document, "scares", game.clone(), |g| {
            g.session.toggle_jump_scares();
        });
        on_click(document, "music", game.clone(), |g| {
            g.session.toggle_music();
            let now = Game::now();
            g.dispatch_events(now);
        });
        on_click(document, "quality", game, |g| {
            g.session.toggle_quality();
        });
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
        game.borrow_mut().frame(time);
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
    log::info!("Mole Rush (native) starting...");
    log::info!("Native mode is a headless demo - run with `trunk serve` for the web version");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| mole_rush::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {}: {}", path, e);
                mole_rush::Tuning::default()
            }
        },
        None => mole_rush::Tuning::default(),
    };

    autoplay(tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one round with a bot that taps whatever is showing
#[cfg(not(target_arch = "wasm32"))]
fn autoplay(tuning: mole_rush::Tuning) {
    use glam::Vec2;
    use mole_rush::assets::Assets;
    use mole_rush::consts::SLOT_COUNT;
    use mole_rush::hud::{HudSink, LastHud};
    use mole_rush::sim::{GameEvent, TapOutcome};
    use mole_rush::{MemoryStore, Session, Settings, Viewport};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Bot reaction time before tapping a fresh target
    const REACTION_MS: f64 = 280.0;

    let seed = 2024;
    let viewport = Viewport::from_client(180.0, 320.0, 1.0);
    let mut session = Session::new(
        tuning,
        viewport,
        Settings::default(),
        Box::new(MemoryStore::new()),
        Assets::procedural(seed),
        seed,
    );

    let mut now = 0.0;
    session.start(now);
    let (mut hits, mut bonuses, mut misses) = (0u32, 0u32, 0u32);
    let mut hud = LastHud::default();
    // When the bot first noticed each slot's current occupant
    let mut seen = [None::<f64>; SLOT_COUNT];

    loop {
        now += FRAME_MS;
        session.frame(now);

        let mut target = None;
        for (i, slot) in session.state().slots.iter().enumerate() {
            if !slot.is_live(now) {
                seen[i] = None;
                continue;
            }
            let since = *seen[i].get_or_insert(now);
            if target.is_none() && now - since >= REACTION_MS {
                target = Some(i);
            }
        }

        if let Some(index) = target {
            let state = session.state();
            if let Some((centre, _)) = state.slots.hit_circle(index, &state.viewport) {
                match session.pointer_down(centre, now) {
                    TapOutcome::Common { .. } => hits += 1,
                    TapOutcome::Bonus { .. } => bonuses += 1,
                    TapOutcome::Miss => misses += 1,
                    TapOutcome::Ignored => {}
                }
            }
            seen[index] = None;
        }

        // Every few seconds the bot fumbles and taps the empty frame
        if (now / FRAME_MS) as u64 % 240 == 0 {
            if let TapOutcome::Miss = session.pointer_down(Vec2::new(2.0, 2.0), now) {
                misses += 1;
            }
        }

        for event in session.drain_events() {
            match event {
                GameEvent::RoundEnded(report) => {
                    log::info!(
                        "Round over: score {} (best {}, new best: {})",
                        report.score,
                        report.best,
                        report.new_best
                    );
                }
                other => log::debug!("{:?}", other),
            }
        }

        hud.show(&session.hud());
        if !session.is_running() {
            break;
        }
    }

    if let Some(last) = &hud.last {
        log::info!(
            "Final HUD after {} refreshes: {} pts, best {}, bar {}",
            hud.updates,
            last.score,
            last.best,
            last.progress_width()
        );
    }

    log::info!(
        "Bot tapped {} targets and {} bonuses with {} misses",
        hits,
        bonuses,
        misses
    );
}
