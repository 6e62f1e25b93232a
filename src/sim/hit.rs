//! Pointer hit resolution and scoring

use glam::Vec2;

use super::fx::ParticleKind;
use super::random::RandomSource;
use super::slot::{Occupant, SlotGrid};
use super::state::{GameEvent, GamePhase, GameState, Haptic, ImpactStyle, SoundEffect};
use crate::Viewport;

/// What a tap did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Common { slot: usize, points: u64 },
    Bonus { slot: usize },
    Miss,
    /// No round running
    Ignored,
}

/// First live slot (grid order) whose hit circle contains `point`
pub fn hit_test(slots: &SlotGrid, viewport: &Viewport, point: Vec2, now: f64) -> Option<usize> {
    (0..slots.len()).find(|&index| {
        let live = slots.get(index).is_some_and(|s| s.is_live(now));
        live && slots
            .hit_circle(index, viewport)
            .is_some_and(|(centre, radius)| centre.distance_squared(point) <= radius * radius)
    })
}

/// Resolve a tap at `point` (buffer pixels)
pub fn tap(state: &mut GameState, point: Vec2, now: f64, rng: &mut dyn RandomSource) -> TapOutcome {
    if state.phase != GamePhase::Running {
        return TapOutcome::Ignored;
    }

    // Stale multiplier or combo must never score
    state.round.expire(now);

    let Some(index) = hit_test(&state.slots, &state.viewport, point, now) else {
        return miss(state, now, rng);
    };
    let Some(kind) = state.slots.clear(index, now) else {
        return miss(state, now, rng);
    };

    let dpr = state.viewport.dpr;
    let size = state.viewport.slot_size();
    let centre = state.viewport.to_pixels(state.slots.get(index).map_or(Vec2::ZERO, |s| s.pos));

    state.slots.pulse(index, now, state.tuning.hit_flash_ms);
    state.effects.impact(now, 1.0, dpr, &state.tuning);

    let spark_origin = centre - Vec2::new(0.0, size * 0.25);
    match kind {
        Occupant::Bonus => {
            let tuning = &state.tuning;
            let round = &mut state.round;
            round.multiplier = tuning.bonus_multiplier;
            round.mult_until = now + tuning.bonus_multiplier_ms;
            state.effects.start_slowmo(now, tuning);

            state
                .fx
                .burst(spark_origin, tuning.bonus_burst, ParticleKind::Bonus, dpr, rng);
            state.fx.label(
                centre - Vec2::new(0.0, size * 0.78),
                -0.13 * dpr,
                tuning.boost_text_ms,
                format!("x{} BOOST!", tuning.bonus_multiplier),
                true,
            );
            log::debug!("bonus hit in slot {}", index);

            state.emit(GameEvent::Sound(SoundEffect::Bonus));
            state.emit(GameEvent::Haptic(Haptic::Impact(ImpactStyle::Medium)));
            TapOutcome::Bonus { slot: index }
        }
        Occupant::Common => {
            let tuning = &state.tuning;
            let round = &mut state.round;
            let points = tuning.combo_points(round.combo) * round.multiplier as u64;
            round.score += points;
            round.combo += 1;
            round.combo_until = now + tuning.combo_window_ms;
            let sting = tuning.combo_sting_every > 0 && round.combo % tuning.combo_sting_every == 0;

            state.fx.label(
                centre - Vec2::new(0.0, size * 0.58),
                -0.11 * dpr,
                tuning.score_text_ms,
                format!("+{}", points),
                points >= tuning.emphasis_points,
            );
            state
                .fx
                .burst(spark_origin, tuning.hit_burst, ParticleKind::Hit, dpr, rng);

            state.emit(GameEvent::Sound(SoundEffect::Hit));
            if sting {
                state.emit(GameEvent::Sound(SoundEffect::Combo));
            }
            state.emit(GameEvent::Haptic(Haptic::Impact(ImpactStyle::Light)));
            TapOutcome::Common { slot: index, points }
        }
    }
}

fn miss(state: &mut GameState, now: f64, rng: &mut dyn RandomSource) -> TapOutcome {
    state.emit(GameEvent::Sound(SoundEffect::Miss));
    state.emit(GameEvent::Haptic(Haptic::Warning));
    if state.flags.jump_scares && rng.chance(state.tuning.scare_on_miss_chance) {
        state.jump_scare(now, 1.0);
    }
    TapOutcome::Miss
}
