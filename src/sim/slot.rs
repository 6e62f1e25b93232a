//! Target slots: the fixed grid of sites where items pop up
//!
//! Slots are built once and live for the whole process; a round only resets
//! their occupant and animation state.

use glam::Vec2;

use super::random::RandomSource;
use super::spring::Spring;
use crate::Viewport;
use crate::consts::{GRID, HIT_LIFT_FRAC, HIT_RADIUS_FRAC, SLOT_COUNT};
use crate::tuning::Tuning;

/// Item currently standing in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    /// Regular target, scores points
    Common,
    /// Rare target, grants the multiplier boost
    Bonus,
}

/// One target site
#[derive(Debug, Clone)]
pub struct TargetSlot {
    /// Normalized centre in [0, 1]²
    pub pos: Vec2,
    pub occupant: Option<Occupant>,
    /// Occupant leaves at this timestamp (ms)
    pub expires_at: f64,
    /// No new occupant before this timestamp (ms)
    pub cooldown_until: f64,
    /// Cooldown drawn at spawn time, applied when the occupant leaves
    pub pending_cooldown: f64,
    /// Pop-in progress (0 hidden, 1 fully up)
    pub pop: Spring,
    /// Glow pulse after a hit, relaxes to 0
    pub ring: Spring,
    /// Hit flash visible until this timestamp (ms)
    pub flash_until: f64,
    /// Phase accumulator for idle bobbing
    pub idle: f32,
}

impl TargetSlot {
    fn new(pos: Vec2, idle: f32) -> Self {
        Self {
            pos,
            occupant: None,
            expires_at: 0.0,
            cooldown_until: 0.0,
            pending_cooldown: 0.0,
            pop: Spring::default(),
            ring: Spring::default(),
            flash_until: 0.0,
            idle,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Occupied and not yet past its expiry
    pub fn is_live(&self, now: f64) -> bool {
        self.occupant.is_some() && now < self.expires_at
    }

    /// Empty and off cooldown
    pub fn accepts_spawn(&self, now: f64) -> bool {
        self.occupant.is_none() && now >= self.cooldown_until
    }

    /// Pop-in progress clamped for drawing
    pub fn pop_progress(&self) -> f32 {
        self.pop.value.clamp(0.0, 1.0)
    }

    /// Remove the occupant and start the cooldown drawn at spawn
    fn vacate(&mut self, now: f64) {
        self.occupant = None;
        self.expires_at = 0.0;
        self.cooldown_until = now + self.pending_cooldown;
        self.pending_cooldown = 0.0;
    }

    fn reset(&mut self) {
        self.occupant = None;
        self.expires_at = 0.0;
        self.cooldown_until = 0.0;
        self.pending_cooldown = 0.0;
        self.pop = Spring::default();
        self.ring = Spring::default();
        self.flash_until = 0.0;
    }
}

/// The fixed board of target slots
#[derive(Debug, Clone)]
pub struct SlotGrid {
    slots: [TargetSlot; SLOT_COUNT],
}

impl SlotGrid {
    /// Build the board; idle phases are randomized so slots do not bob in sync
    pub fn new(rng: &mut dyn RandomSource) -> Self {
        let slots = std::array::from_fn(|i| {
            let (x, y) = GRID[i];
            TargetSlot::new(Vec2::new(x, y), rng.range(0.0, 10.0))
        });
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TargetSlot> {
        self.slots.get(index)
    }

    /// Slots in grid order (top-left to bottom-right)
    pub fn iter(&self) -> impl Iterator<Item = &TargetSlot> {
        self.slots.iter()
    }

    /// Place an occupant; the slot's pop animation restarts from hidden
    pub fn occupy(&mut self, index: usize, kind: Occupant, now: f64, lifetime: f64, cooldown: f64) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.occupant = Some(kind);
            slot.expires_at = now + lifetime;
            slot.pending_cooldown = cooldown;
            slot.pop = Spring::default();
        }
    }

    /// Remove the occupant (hit), returning what was there
    pub fn clear(&mut self, index: usize, now: f64) -> Option<Occupant> {
        let slot = self.slots.get_mut(index)?;
        let kind = slot.occupant;
        if kind.is_some() {
            slot.vacate(now);
        }
        kind
    }

    /// Mark a slot as just hit: flash + ring pulse
    pub fn pulse(&mut self, index: usize, now: f64, flash_ms: f64) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.flash_until = now + flash_ms;
            slot.ring.snap(1.0);
        }
    }

    /// Drop occupants whose time ran out (a timed-out target costs nothing)
    pub fn expire(&mut self, now: f64) -> usize {
        let mut expired = 0;
        for slot in &mut self.slots {
            if slot.occupant.is_some() && slot.expires_at <= now {
                slot.vacate(now);
                expired += 1;
            }
        }
        expired
    }

    /// Advance pop/ring springs and idle phase by `dt` simulated seconds
    pub fn animate(&mut self, dt: f32, tuning: &Tuning) {
        for slot in &mut self.slots {
            let (target, params) = if slot.is_occupied() {
                (1.0, tuning.pop_occupied)
            } else {
                (0.0, tuning.pop_empty)
            };
            slot.pop.step(target, dt, params);
            slot.ring.step(0.0, dt, tuning.ring);
            slot.idle += dt * tuning.idle_rate;
        }
    }

    /// Reset every slot for a new round
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    /// Pixel-space hit circle (centre, radius) of a slot
    pub fn hit_circle(&self, index: usize, viewport: &Viewport) -> Option<(Vec2, f32)> {
        let slot = self.slots.get(index)?;
        let size = viewport.slot_size();
        let centre = viewport.to_pixels(slot.pos) - Vec2::new(0.0, size * HIT_LIFT_FRAC);
        Some((centre, size * HIT_RADIUS_FRAC))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::ScriptedSource;

    fn grid() -> SlotGrid {
        SlotGrid::new(&mut ScriptedSource::constant(0.5))
    }

    #[test]
    fn test_grid_has_seven_slots_in_order() {
        let g = grid();
        assert_eq!(g.len(), SLOT_COUNT);
        let first = g.get(0).unwrap();
        let last = g.get(6).unwrap();
        assert_eq!(first.pos, Vec2::new(0.2, 0.25));
        assert_eq!(last.pos, Vec2::new(0.5, 0.83));
    }

    #[test]
    fn test_expire_clears_and_starts_cooldown() {
        let mut g = grid();
        g.occupy(2, Occupant::Common, 1000.0, 500.0, 300.0);
        assert!(g.get(2).unwrap().is_live(1200.0));
        // Cooldown is not running while occupied
        assert!(g.get(2).unwrap().cooldown_until <= 1000.0);

        assert_eq!(g.expire(1499.0), 0);
        assert_eq!(g.expire(1500.0), 1);
        let slot = g.get(2).unwrap();
        assert!(slot.occupant.is_none());
        assert_eq!(slot.cooldown_until, 1800.0);
        assert!(!slot.accepts_spawn(1700.0));
        assert!(slot.accepts_spawn(1800.0));
    }

    #[test]
    fn test_clear_returns_occupant() {
        let mut g = grid();
        g.occupy(0, Occupant::Bonus, 0.0, 1000.0, 250.0);
        assert_eq!(g.clear(0, 100.0), Some(Occupant::Bonus));
        assert_eq!(g.clear(0, 100.0), None);
        assert_eq!(g.get(0).unwrap().cooldown_until, 350.0);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut g = grid();
        g.occupy(99, Occupant::Common, 0.0, 1.0, 1.0);
        assert_eq!(g.clear(99, 0.0), None);
        assert!(g.hit_circle(99, &Viewport::default()).is_none());
    }

    #[test]
    fn test_pop_rises_when_occupied() {
        let mut g = grid();
        let tuning = Tuning::default();
        g.occupy(1, Occupant::Common, 0.0, 10_000.0, 0.0);
        for _ in 0..30 {
            g.animate(1.0 / 60.0, &tuning);
        }
        assert!(g.get(1).unwrap().pop_progress() > 0.9);
        assert!(g.get(0).unwrap().pop_progress() < 0.01);
    }

    #[test]
    fn test_reset_keeps_positions() {
        let mut g = grid();
        g.occupy(3, Occupant::Common, 0.0, 100.0, 100.0);
        g.pulse(3, 0.0, 220.0);
        g.reset();
        let slot = g.get(3).unwrap();
        assert!(slot.occupant.is_none());
        assert_eq!(slot.ring.value, 0.0);
        assert_eq!(slot.pos, Vec2::new(0.2, 0.55));
    }
}
