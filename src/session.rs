//! Frame loop glue
//!
//! Owns everything one running game needs (sim state, RNG, score store,
//! settings, sprites, compositor) so the host only forwards clock ticks,
//! pointer presses and button commands.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::Viewport;
use crate::assets::Assets;
use crate::best::{BestScore, ScoreStore};
use crate::consts::BEST_SCORE_KEY;
use crate::hud::HudSnapshot;
use crate::renderer::{Compositor, Frame};
use crate::settings::{QualityTier, Settings};
use crate::sim::{self, GameEvent, GamePhase, GameState, Haptic, MusicCue, SimFlags, TapOutcome};
use crate::tuning::Tuning;

pub struct Session {
    state: GameState,
    rng: Pcg32,
    store: Box<dyn ScoreStore>,
    settings: Settings,
    assets: Assets,
    compositor: Compositor,
}

impl Session {
    pub fn new(
        tuning: Tuning,
        viewport: Viewport,
        settings: Settings,
        store: Box<dyn ScoreStore>,
        assets: Assets,
        seed: u64,
    ) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let best = BestScore::load(BEST_SCORE_KEY, store.as_ref());
        let mut state = GameState::new(tuning, viewport, best, &mut rng);
        state.flags = flags_for(&settings);
        state.fx.density = settings.quality.params().particles;

        Self {
            state,
            rng,
            store,
            settings,
            assets,
            compositor: Compositor::new(viewport, seed.wrapping_add(1)),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn is_running(&self) -> bool {
        self.state.phase == GamePhase::Running
    }

    /// Start (or restart) a round
    pub fn start(&mut self, now: f64) {
        sim::start(&mut self.state, now);
    }

    /// Resolve a press at `point` (buffer pixels)
    pub fn pointer_down(&mut self, point: Vec2, now: f64) -> TapOutcome {
        sim::tap(&mut self.state, point, now, &mut self.rng)
    }

    /// Advance the sim and render one frame. Idle frames still render.
    pub fn frame(&mut self, now: f64) -> Frame<'_> {
        sim::tick(&mut self.state, now, &mut self.rng, self.store.as_mut());
        self.compositor
            .render(&self.state, &self.assets, self.settings.quality, now)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.state.viewport {
            return;
        }
        log::info!(
            "Viewport {}x{} @{}",
            viewport.width,
            viewport.height,
            viewport.dpr
        );
        self.state.viewport = viewport;
        self.compositor.resize(viewport);
    }

    /// Sound, haptic, music and round-end events since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.take_events()
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::from_state(&self.state)
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.settings.sound = !self.settings.sound;
        self.apply_settings();
        self.settings.sound
    }

    /// Switching haptics on confirms with a tick; switching off stays silent
    pub fn toggle_haptics(&mut self) -> bool {
        self.settings.haptics = !self.settings.haptics;
        self.apply_settings();
        self.state.emit(GameEvent::Haptic(Haptic::Selection));
        self.settings.haptics
    }

    pub fn toggle_jump_scares(&mut self) -> bool {
        self.settings.jump_scares = !self.settings.jump_scares;
        self.apply_settings();
        self.state.emit(GameEvent::Haptic(Haptic::Selection));
        self.settings.jump_scares
    }

    /// Music follows the toggle immediately, mid-round included
    pub fn toggle_music(&mut self) -> bool {
        self.settings.music = !self.settings.music;
        if self.settings.music {
            self.apply_settings();
            if self.is_running() {
                self.state.emit(GameEvent::Music(MusicCue::Play));
            }
        } else {
            // Queued before the flag drops so the stop is not filtered out
            self.state.emit(GameEvent::Music(MusicCue::Stop));
            self.apply_settings();
        }
        self.settings.music
    }

    pub fn toggle_quality(&mut self) -> QualityTier {
        self.settings.quality = self.settings.quality.toggled();
        log::info!("Quality: {}", self.settings.quality.as_str());
        self.apply_settings();
        self.state.emit(GameEvent::Haptic(Haptic::Selection));
        self.settings.quality
    }

    fn apply_settings(&mut self) {
        self.state.flags = flags_for(&self.settings);
        self.state.fx.density = self.settings.quality.params().particles;
        self.settings.save();
    }
}

fn flags_for(settings: &Settings) -> SimFlags {
    SimFlags {
        sound: settings.sound,
        music: settings.music,
        haptics: settings.haptics,
        jump_scares: settings.jump_scares,
    }
}
