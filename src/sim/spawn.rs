//! Spawn scheduling with a difficulty ramp
//!
//! Every eligible slot rolls independently each tick, so the expected spawn
//! rate grows with the number of empty slots as well as with intensity.

use super::random::RandomSource;
use super::slot::{Occupant, SlotGrid};
use crate::tuning::Tuning;

/// Difficulty scalar: 1.0 at round start, `1 + ramp` at the end
pub fn intensity(remaining_ms: f64, round_ms: f64, ramp: f32) -> f32 {
    let progress = if round_ms > 0.0 {
        (1.0 - remaining_ms / round_ms).clamp(0.0, 1.0) as f32
    } else {
        1.0
    };
    1.0 + progress * ramp
}

/// Roll every eligible slot once; returns how many spawned
pub fn spawn_pass(
    slots: &mut SlotGrid,
    now: f64,
    intensity: f32,
    tuning: &Tuning,
    rng: &mut dyn RandomSource,
) -> usize {
    let p_spawn = tuning.base_spawn_rate * intensity;
    let mut spawned = 0;

    for index in 0..slots.len() {
        let eligible = slots.get(index).is_some_and(|s| s.accepts_spawn(now));
        if !eligible || !rng.chance(p_spawn) {
            continue;
        }

        let kind = if rng.chance(tuning.bonus_chance) {
            Occupant::Bonus
        } else {
            Occupant::Common
        };
        let life = match kind {
            Occupant::Bonus => tuning.bonus_life,
            Occupant::Common => tuning.common_life,
        };
        let lifetime = rng.range(life.min, life.max) / intensity;
        let cooldown = rng.range(tuning.cooldown.min, tuning.cooldown.max) / intensity;

        slots.occupy(index, kind, now, lifetime as f64, cooldown as f64);
        spawned += 1;
        log::trace!("spawn {:?} in slot {} for {:.0}ms", kind, index, lifetime);
    }

    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::ScriptedSource;

    #[test]
    fn test_intensity_ramp() {
        assert_eq!(intensity(40_000.0, 40_000.0, 1.65), 1.0);
        assert!((intensity(20_000.0, 40_000.0, 1.65) - 1.825).abs() < 1e-5);
        assert!((intensity(0.0, 40_000.0, 1.65) - 2.65).abs() < 1e-5);
        // Clamped outside the round
        assert!((intensity(-500.0, 40_000.0, 1.65) - 2.65).abs() < 1e-5);
        assert_eq!(intensity(50_000.0, 40_000.0, 1.65), 1.0);
    }

    #[test]
    fn test_no_spawn_when_rolls_fail() {
        let mut slots = SlotGrid::new(&mut ScriptedSource::constant(0.5));
        let n = spawn_pass(&mut slots, 0.0, 1.0, &Tuning::default(), &mut ScriptedSource::never());
        assert_eq!(n, 0);
        assert!(slots.iter().all(|s| s.occupant.is_none()));
    }

    #[test]
    fn test_forced_common_spawn_lifetime() {
        let tuning = Tuning::default();
        let mut slots = SlotGrid::new(&mut ScriptedSource::constant(0.5));
        // Slot 0: spawn, not bonus, lifetime draw 0.5, cooldown draw 0.0; rest fail
        let mut rng = ScriptedSource::never().then(&[0.0, 0.9, 0.5, 0.0]);
        let n = spawn_pass(&mut slots, 1000.0, 2.0, &tuning, &mut rng);
        assert_eq!(n, 1);

        let slot = slots.get(0).unwrap();
        assert_eq!(slot.occupant, Some(Occupant::Common));
        // (680 + 0.5 * 440) / 2 = 450
        assert!((slot.expires_at - 1450.0).abs() < 1e-3);
        assert!((slot.pending_cooldown - 110.0).abs() < 1e-3);
    }

    #[test]
    fn test_forced_bonus_spawn() {
        let tuning = Tuning::default();
        let mut slots = SlotGrid::new(&mut ScriptedSource::constant(0.5));
        let mut rng = ScriptedSource::never().then(&[0.0, 0.1, 0.0, 0.0]);
        spawn_pass(&mut slots, 0.0, 1.0, &tuning, &mut rng);
        let slot = slots.get(0).unwrap();
        assert_eq!(slot.occupant, Some(Occupant::Bonus));
        assert!((slot.expires_at - 860.0).abs() < 1e-3);
    }

    #[test]
    fn test_occupied_and_cooling_slots_skip() {
        let tuning = Tuning::default();
        let mut slots = SlotGrid::new(&mut ScriptedSource::constant(0.5));
        slots.occupy(0, Occupant::Common, 0.0, 5000.0, 400.0);
        slots.occupy(1, Occupant::Common, 0.0, 10.0, 400.0);
        slots.expire(10.0); // slot 1 cooling until 410

        let n = spawn_pass(&mut slots, 100.0, 1.0, &tuning, &mut ScriptedSource::always());
        assert_eq!(n, crate::consts::SLOT_COUNT - 2);
        assert!(slots.get(1).unwrap().occupant.is_none());
    }
}
