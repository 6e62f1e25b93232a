//! Game state and core simulation types
//!
//! Everything the loop mutates lives in one `GameState` aggregate that is
//! passed by reference into each component.

use super::effects::Effects;
use super::fx::Emitter;
use super::random::RandomSource;
use super::schedule::{Deferred, Schedule};
use super::slot::SlotGrid;
use crate::Viewport;
use crate::best::{BestScore, RoundReport};
use crate::tuning::Tuning;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Waiting for start; an idle frame is rendered
    Idle,
    /// Countdown running, world simulated every tick
    Running,
    /// Round just finished; falls back to Idle on the next tick
    Ended,
}

/// Named sound triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Hit,
    Bonus,
    Miss,
    Start,
    End,
    Combo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Platform haptic feedback requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Haptic {
    Impact(ImpactStyle),
    Selection,
    Warning,
}

/// Background music requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicCue {
    Play,
    Stop,
    /// Briefly drop the volume (jump-scare)
    Duck,
    Restore,
}

/// Fire-and-forget output for the host to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Sound(SoundEffect),
    Haptic(Haptic),
    Music(MusicCue),
    RoundEnded(RoundReport),
}

/// Player toggles the sim honours when emitting events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimFlags {
    pub sound: bool,
    pub music: bool,
    pub haptics: bool,
    pub jump_scares: bool,
}

impl Default for SimFlags {
    fn default() -> Self {
        Self {
            sound: true,
            music: true,
            haptics: true,
            jump_scares: true,
        }
    }
}

/// Score, timers and streaks of the current round
#[derive(Debug, Clone)]
pub struct RoundState {
    /// Countdown (simulated ms)
    pub remaining_ms: f64,
    pub score: u64,
    /// Always >= 1
    pub multiplier: u32,
    pub mult_until: f64,
    pub combo: u32,
    pub combo_until: f64,
    /// Difficulty scalar for the current tick
    pub intensity: f32,
}

impl RoundState {
    pub fn new(round_ms: f64) -> Self {
        Self {
            remaining_ms: round_ms,
            score: 0,
            multiplier: 1,
            mult_until: 0.0,
            combo: 0,
            combo_until: 0.0,
            intensity: 1.0,
        }
    }

    /// Drop the multiplier and combo once their windows have passed
    pub fn expire(&mut self, now: f64) {
        if self.multiplier > 1 && now > self.mult_until {
            self.multiplier = 1;
        }
        if self.combo > 0 && now > self.combo_until {
            self.combo = 0;
        }
    }

    /// Round completion in [0, 1]
    pub fn progress(&self, round_ms: f64) -> f32 {
        if round_ms <= 0.0 {
            return 1.0;
        }
        (1.0 - self.remaining_ms / round_ms).clamp(0.0, 1.0) as f32
    }

    /// Whole seconds left, rounded up
    pub fn seconds_left(&self) -> u32 {
        (self.remaining_ms.max(0.0) / 1000.0).ceil() as u32
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub round: RoundState,
    pub best: BestScore,
    pub slots: SlotGrid,
    pub fx: Emitter,
    pub effects: Effects,
    pub schedule: Schedule,
    /// Pending output, drained by the host every frame
    pub events: Vec<GameEvent>,
    pub viewport: Viewport,
    pub flags: SimFlags,
    pub tuning: Tuning,
    /// Timestamp of the last processed tick (wall clock ms)
    pub last_tick: Option<f64>,
}

impl GameState {
    pub fn new(
        tuning: Tuning,
        viewport: Viewport,
        best: BestScore,
        rng: &mut dyn RandomSource,
    ) -> Self {
        Self {
            phase: GamePhase::Idle,
            round: RoundState::new(tuning.round_ms),
            best,
            slots: SlotGrid::new(rng),
            fx: Emitter::default(),
            effects: Effects::default(),
            schedule: Schedule::default(),
            events: Vec::new(),
            viewport,
            flags: SimFlags::default(),
            tuning,
            last_tick: None,
        }
    }

    /// Queue an output event, dropping the kinds the player switched off
    pub fn emit(&mut self, event: GameEvent) {
        let allowed = match event {
            GameEvent::Sound(_) => self.flags.sound,
            GameEvent::Haptic(_) => self.flags.haptics,
            GameEvent::Music(_) => self.flags.music,
            GameEvent::RoundEnded(_) => true,
        };
        if allowed {
            self.events.push(event);
        }
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run deferred work that has come due
    pub fn fire_due(&mut self, now: f64) {
        for action in self.schedule.drain_due(now) {
            match action {
                Deferred::Sound(sfx) => self.emit(GameEvent::Sound(sfx)),
                Deferred::RestoreMusic => self.emit(GameEvent::Music(MusicCue::Restore)),
            }
        }
    }

    /// Startle the player: overlay, flash, heavy shake, music duck and a sting
    pub fn jump_scare(&mut self, now: f64, strength: f32) {
        if !self.flags.jump_scares {
            return;
        }
        log::debug!("jump-scare (strength {:.2})", strength);
        let tuning = &self.tuning;
        self.effects
            .jump_scare(now, strength, self.viewport.dpr, tuning);

        let sting_at = now + tuning.scare_sting_delay_ms;
        let restore_at = now + tuning.music_restore_delay_ms;
        self.emit(GameEvent::Music(MusicCue::Duck));
        self.schedule.schedule(restore_at, Deferred::RestoreMusic);
        self.emit(GameEvent::Sound(SoundEffect::Miss));
        self.schedule
            .schedule(sting_at, Deferred::Sound(SoundEffect::End));
        self.emit(GameEvent::Haptic(Haptic::Impact(ImpactStyle::Heavy)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::best::MemoryStore;
    use crate::sim::random::ScriptedSource;

    fn state() -> GameState {
        let store = MemoryStore::new();
        GameState::new(
            Tuning::default(),
            Viewport::default(),
            BestScore::load("k", &store),
            &mut ScriptedSource::constant(0.5),
        )
    }

    #[test]
    fn test_round_expire_windows() {
        let mut r = RoundState::new(40_000.0);
        r.multiplier = 2;
        r.mult_until = 1000.0;
        r.combo = 3;
        r.combo_until = 500.0;

        r.expire(500.0);
        assert_eq!((r.multiplier, r.combo), (2, 3));
        r.expire(500.1);
        assert_eq!((r.multiplier, r.combo), (2, 0));
        r.expire(1000.1);
        assert_eq!(r.multiplier, 1);
    }

    #[test]
    fn test_seconds_left_rounds_up() {
        let mut r = RoundState::new(40_000.0);
        assert_eq!(r.seconds_left(), 40);
        r.remaining_ms = 39_001.0;
        assert_eq!(r.seconds_left(), 40);
        r.remaining_ms = 0.5;
        assert_eq!(r.seconds_left(), 1);
        r.remaining_ms = -20.0;
        assert_eq!(r.seconds_left(), 0);
    }

    #[test]
    fn test_emit_honours_flags() {
        let mut s = state();
        s.flags.sound = false;
        s.emit(GameEvent::Sound(SoundEffect::Hit));
        s.emit(GameEvent::Haptic(Haptic::Selection));
        assert_eq!(s.take_events(), vec![GameEvent::Haptic(Haptic::Selection)]);
        assert!(s.events.is_empty());
    }

    #[test]
    fn test_jump_scare_schedules_sting() {
        let mut s = state();
        s.jump_scare(1000.0, 1.0);
        assert!(s.effects.scare_overlay.is_active(1100.0));
        assert!(s.take_events().contains(&GameEvent::Music(MusicCue::Duck)));

        s.fire_due(1089.0);
        assert!(s.events.is_empty());
        s.fire_due(1090.0);
        assert_eq!(s.take_events(), vec![GameEvent::Sound(SoundEffect::End)]);
        s.fire_due(1650.0);
        assert_eq!(s.take_events(), vec![GameEvent::Music(MusicCue::Restore)]);
    }

    #[test]
    fn test_jump_scare_disabled() {
        let mut s = state();
        s.flags.jump_scares = false;
        s.jump_scare(0.0, 1.0);
        assert!(!s.effects.scare_overlay.is_active(10.0));
        assert!(s.schedule.is_empty());
    }
}
