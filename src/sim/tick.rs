//! Per-frame simulation tick
//!
//! Variable timestep: each call integrates the wall-clock time since the
//! previous call, clamped so a backgrounded tab cannot fast-forward a round.

use super::random::RandomSource;
use super::spawn::{intensity, spawn_pass};
use super::state::{GameEvent, GamePhase, GameState, Haptic, MusicCue, RoundState, SoundEffect};
use crate::best::ScoreStore;
use crate::consts::MAX_TICK_MS;

/// Begin a new round at wall-clock `now`
pub fn start(state: &mut GameState, now: f64) {
    state.round = RoundState::new(state.tuning.round_ms);
    state.fx.clear();
    state.effects.clear();
    state.slots.reset();
    state.schedule.cancel_all();
    state.phase = GamePhase::Running;
    state.last_tick = Some(now);

    state.emit(GameEvent::Music(MusicCue::Play));
    state.emit(GameEvent::Haptic(Haptic::Selection));
    state.emit(GameEvent::Sound(SoundEffect::Start));
    log::info!("Round started ({:.0}ms)", state.tuning.round_ms);
}

/// Advance the game to wall-clock `now`
pub fn tick(
    state: &mut GameState,
    now: f64,
    rng: &mut dyn RandomSource,
    store: &mut dyn ScoreStore,
) {
    let last = state.last_tick.unwrap_or(now);
    state.last_tick = Some(now);

    match state.phase {
        GamePhase::Idle => {
            state.fire_due(now);
            return;
        }
        GamePhase::Ended => {
            state.phase = GamePhase::Idle;
            state.fire_due(now);
            return;
        }
        GamePhase::Running => {}
    }

    let raw_ms = (now - last).clamp(0.0, MAX_TICK_MS);
    let scale = state.effects.time_scale(now, &state.tuning);
    let sim_ms = raw_ms * scale as f64;
    let dt = (sim_ms / 1000.0) as f32;

    state.round.remaining_ms -= sim_ms;
    state.fire_due(now);
    state.round.expire(now);

    // Spawning
    let tuning = &state.tuning;
    state.round.intensity = intensity(
        state.round.remaining_ms,
        tuning.round_ms,
        tuning.intensity_ramp,
    );
    state.slots.expire(now);
    spawn_pass(&mut state.slots, now, state.round.intensity, tuning, rng);

    // Animation
    state.slots.animate(dt, tuning);
    state.fx.update(dt, state.viewport.dpr);

    if state.flags.jump_scares && rng.chance(state.tuning.scare_ambient_chance) {
        state.jump_scare(now, state.tuning.scare_ambient_strength);
    }

    if state.round.remaining_ms <= 0.0 {
        finish_round(state, store);
    }
}

fn finish_round(state: &mut GameState, store: &mut dyn ScoreStore) {
    state.round.remaining_ms = 0.0;
    state.phase = GamePhase::Ended;

    state.emit(GameEvent::Sound(SoundEffect::End));
    state.emit(GameEvent::Music(MusicCue::Stop));

    let report = state.best.submit(state.round.score, store);
    state.emit(GameEvent::RoundEnded(report));
    log::info!(
        "Round over: score {} (best {}{})",
        report.score,
        report.best,
        if report.new_best { ", new" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;
    use crate::best::{BestScore, MemoryStore};
    use crate::sim::random::ScriptedSource;
    use crate::sim::slot::Occupant;
    use crate::tuning::Tuning;

    const KEY: &str = "tick_best";

    fn running_state(store: &MemoryStore) -> GameState {
        let mut state = GameState::new(
            Tuning::default(),
            Viewport::default(),
            BestScore::load(KEY, store),
            &mut ScriptedSource::constant(0.5),
        );
        start(&mut state, 0.0);
        state.take_events();
        state
    }

    #[test]
    fn test_start_resets_round() {
        let store = MemoryStore::new();
        let mut state = running_state(&store);
        state.round.score = 999;
        state.round.combo = 4;
        state.slots.occupy(0, Occupant::Common, 0.0, 500.0, 100.0);
        state.jump_scare(10.0, 1.0);

        start(&mut state, 100.0);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.round.score, 0);
        assert_eq!(state.round.combo, 0);
        assert_eq!(state.round.multiplier, 1);
        assert_eq!(state.round.remaining_ms, 40_000.0);
        assert!(state.slots.iter().all(|s| s.occupant.is_none()));
        assert!(state.schedule.is_empty());
        assert!(!state.effects.scare_overlay.is_active(101.0));
        assert!(state.events.contains(&GameEvent::Sound(SoundEffect::Start)));
    }

    #[test]
    fn test_round_lasts_exactly_duration() {
        let mut store = MemoryStore::new();
        let mut state = running_state(&store);
        let mut rng = ScriptedSource::never();

        for i in 1..800 {
            tick(&mut state, i as f64 * 50.0, &mut rng, &mut store);
            assert_eq!(state.phase, GamePhase::Running, "ended early at tick {i}");
        }
        tick(&mut state, 40_000.0, &mut rng, &mut store);
        assert_eq!(state.phase, GamePhase::Ended);
        assert!(
            state
                .take_events()
                .iter()
                .any(|e| matches!(e, GameEvent::RoundEnded(_)))
        );

        tick(&mut state, 40_050.0, &mut rng, &mut store);
        assert_eq!(state.phase, GamePhase::Idle);
    }

    #[test]
    fn test_large_gap_is_clamped() {
        let mut store = MemoryStore::new();
        let mut state = running_state(&store);
        tick(&mut state, 60_000.0, &mut ScriptedSource::never(), &mut store);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.round.remaining_ms, 40_000.0 - 50.0);
    }

    #[test]
    fn test_slowmo_slows_countdown() {
        let mut store = MemoryStore::new();
        let mut state = running_state(&store);
        state.effects.start_slowmo(0.0, &state.tuning);
        tick(&mut state, 40.0, &mut ScriptedSource::never(), &mut store);
        assert!((state.round.remaining_ms - (40_000.0 - 22.0)).abs() < 1e-3);
    }

    #[test]
    fn test_slowmo_scales_springs_and_particles() {
        use crate::sim::fx::{Particle, ParticleKind};
        use crate::sim::spring::spring_step;
        use glam::Vec2;

        let mut store = MemoryStore::new();
        let mut normal = running_state(&store);
        let mut slow = running_state(&store);
        slow.effects.start_slowmo(0.0, &slow.tuning);

        for state in [&mut normal, &mut slow] {
            state.slots.occupy(4, Occupant::Common, 0.0, 10_000.0, 0.0);
            state.fx.particles.push(Particle {
                pos: Vec2::new(100.0, 100.0),
                prev: Vec2::new(100.0, 100.0),
                vel: Vec2::new(10.0, 0.0),
                radius: 4.0,
                age_ms: 0.0,
                life_ms: 1000.0,
                kind: ParticleKind::Hit,
            });
            tick(state, 40.0, &mut ScriptedSource::never(), &mut store);
        }

        // The pop spring integrated 22 ms instead of 40 ms
        let k = slow.tuning.pop_occupied;
        let (x, v) = spring_step(0.0, 0.0, 1.0, 0.022, k.k, k.d);
        let pop = slow.slots.get(4).unwrap().pop;
        assert!((pop.value - x).abs() < 1e-6);
        assert!((pop.velocity - v).abs() < 1e-5);
        let fast = normal.slots.get(4).unwrap().pop;
        assert!((pop.velocity / fast.velocity - 0.55).abs() < 1e-3);

        let moved = |s: &GameState| s.fx.particles[0].pos.x - 100.0;
        assert!((moved(&slow) / moved(&normal) - 0.55).abs() < 1e-3);
        assert!((slow.fx.particles[0].age_ms - 22.0).abs() < 1e-3);
        assert!((normal.fx.particles[0].age_ms - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_tick_expires_multiplier_and_combo() {
        let mut store = MemoryStore::new();
        let mut state = running_state(&store);
        state.round.multiplier = 2;
        state.round.mult_until = 30.0;
        state.round.combo = 5;
        state.round.combo_until = 50.0;

        let mut rng = ScriptedSource::never();
        tick(&mut state, 40.0, &mut rng, &mut store);
        assert_eq!(state.round.multiplier, 1);
        assert_eq!(state.round.combo, 5);
        tick(&mut state, 60.0, &mut rng, &mut store);
        assert_eq!(state.round.combo, 0);
    }

    #[test]
    fn test_best_score_updates_on_end() {
        let mut store = MemoryStore::new();
        store.set(KEY, 300);
        let mut state = running_state(&store);
        state.round.score = 500;
        state.round.remaining_ms = 10.0;
        tick(&mut state, 50.0, &mut ScriptedSource::never(), &mut store);

        assert_eq!(state.phase, GamePhase::Ended);
        assert_eq!(store.get(KEY), Some(500));
        let report = state.take_events().into_iter().find_map(|e| match e {
            GameEvent::RoundEnded(r) => Some(r),
            _ => None,
        });
        assert_eq!(report.map(|r| r.new_best), Some(true));
    }

    #[test]
    fn test_ambient_scare_respects_toggle() {
        let mut store = MemoryStore::new();
        let mut state = running_state(&store);
        state.flags.jump_scares = false;
        tick(&mut state, 16.0, &mut ScriptedSource::always(), &mut store);
        assert!(!state.effects.scare_overlay.is_active(17.0));

        state.flags.jump_scares = true;
        tick(&mut state, 32.0, &mut ScriptedSource::always(), &mut store);
        assert!(state.effects.scare_overlay.is_active(33.0));
    }

    #[test]
    fn test_idle_does_not_spawn() {
        let mut store = MemoryStore::new();
        let mut state = GameState::new(
            Tuning::default(),
            Viewport::default(),
            BestScore::load(KEY, &store),
            &mut ScriptedSource::constant(0.5),
        );
        for i in 0..20 {
            tick(&mut state, i as f64 * 16.0, &mut ScriptedSource::always(), &mut store);
        }
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.slots.iter().all(|s| s.occupant.is_none()));
    }

    #[test]
    fn test_determinism() {
        use rand::SeedableRng;
        use rand_pcg::Pcg32;

        let mut store = MemoryStore::new();
        let mut a = running_state(&store);
        let mut b = running_state(&store);
        let mut rng_a = Pcg32::seed_from_u64(7);
        let mut rng_b = Pcg32::seed_from_u64(7);

        for i in 1..300 {
            let now = i as f64 * 16.7;
            tick(&mut a, now, &mut rng_a, &mut store);
            tick(&mut b, now, &mut rng_b, &mut store);
        }
        let occ = |s: &GameState| s.slots.iter().map(|t| t.occupant).collect::<Vec<_>>();
        assert_eq!(occ(&a), occ(&b));
        assert_eq!(a.round.remaining_ms, b.round.remaining_ms);
    }
}
