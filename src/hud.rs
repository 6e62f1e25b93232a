//! Heads-up display values
//!
//! The sim never reads these back; a `HudSink` only displays them.

use crate::sim::GameState;

/// Plain values for one HUD refresh
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    /// Whole seconds left, rounded up
    pub seconds_left: u32,
    pub score: u64,
    /// Multiplier label, e.g. "x2"
    pub multiplier: String,
    pub combo: u32,
    pub best: u64,
    /// Round completion in [0, 1]
    pub progress: f32,
}

impl HudSnapshot {
    pub fn from_state(state: &GameState) -> Self {
        let round = &state.round;
        Self {
            seconds_left: round.seconds_left(),
            score: round.score,
            multiplier: format!("x{}", round.multiplier),
            combo: round.combo,
            best: state.best.value(),
            progress: round.progress(state.tuning.round_ms),
        }
    }

    /// CSS width of the progress bar; it fills as the round runs down
    pub fn progress_width(&self) -> String {
        format!("{:.1}%", self.progress.clamp(0.0, 1.0) * 100.0)
    }
}

/// Presentation layer that displays HUD values
pub trait HudSink {
    fn show(&mut self, hud: &HudSnapshot);
}

/// Sink that keeps the last snapshot (native builds and tests)
#[derive(Debug, Default)]
pub struct LastHud {
    pub last: Option<HudSnapshot>,
    pub updates: usize,
}

impl HudSink for LastHud {
    fn show(&mut self, hud: &HudSnapshot) {
        self.last = Some(hud.clone());
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;
    use crate::best::{BestScore, MemoryStore, ScoreStore};
    use crate::sim::ScriptedSource;
    use crate::tuning::Tuning;

    #[test]
    fn test_snapshot_from_state() {
        let mut store = MemoryStore::new();
        store.set("hud_best", 420);
        let mut state = GameState::new(
            Tuning::default(),
            Viewport::default(),
            BestScore::load("hud_best", &store),
            &mut ScriptedSource::constant(0.5),
        );
        state.round.remaining_ms = 10_000.5;
        state.round.score = 90;
        state.round.multiplier = 2;
        state.round.combo = 3;

        let hud = HudSnapshot::from_state(&state);
        assert_eq!(hud.seconds_left, 11);
        assert_eq!(hud.multiplier, "x2");
        assert_eq!(hud.best, 420);
        assert!((hud.progress - 0.75).abs() < 1e-4);
        assert_eq!(hud.progress_width(), "75.0%");

        let mut sink = LastHud::default();
        sink.show(&hud);
        assert_eq!(sink.last.as_ref().map(|h| h.score), Some(90));
    }

    #[test]
    fn test_progress_bar_grows_over_round() {
        let store = MemoryStore::new();
        let mut state = GameState::new(
            Tuning::default(),
            Viewport::default(),
            BestScore::load("hud_best", &store),
            &mut ScriptedSource::constant(0.5),
        );
        assert_eq!(HudSnapshot::from_state(&state).progress_width(), "0.0%");
        state.round.remaining_ms = 30_000.0;
        assert_eq!(HudSnapshot::from_state(&state).progress_width(), "25.0%");
        state.round.remaining_ms = 0.0;
        assert_eq!(HudSnapshot::from_state(&state).progress_width(), "100.0%");
    }
}
