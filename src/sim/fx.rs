//! Transient visual entities: spark particles and floating labels
//!
//! Nothing here affects gameplay. Motion is tuned in "60 Hz frames" so the
//! feel is independent of the actual tick rate.

use glam::Vec2;

use super::random::RandomSource;
use crate::tuning::BurstParams;

/// Maximum live particles
pub const MAX_PARTICLES: usize = 512;

/// Gravity in CSS pixels per 60 Hz frame²
const PARTICLE_GRAVITY: f32 = 0.22;
/// Per-tick velocity retention
const PARTICLE_DRAG: f32 = 0.986;
/// Upward acceleration of floating labels
const TEXT_LIFT: f32 = 0.0018;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    /// White sparks from a common hit
    Hit,
    /// Pink burst from a bonus hit
    Bonus,
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    /// Position last tick (trail start)
    pub prev: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub age_ms: f32,
    pub life_ms: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// Age as a fraction of lifetime
    pub fn progress(&self) -> f32 {
        (self.age_ms / self.life_ms).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct FloatingText {
    pub pos: Vec2,
    pub vy: f32,
    pub age_ms: f32,
    pub life_ms: f32,
    pub text: String,
    pub emphasized: bool,
}

impl FloatingText {
    pub fn progress(&self) -> f32 {
        (self.age_ms / self.life_ms).clamp(0.0, 1.0)
    }
}

/// Owns every live particle and label
#[derive(Debug, Clone)]
pub struct Emitter {
    pub particles: Vec<Particle>,
    pub texts: Vec<FloatingText>,
    /// Burst count multiplier (quality tier)
    pub density: f32,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            texts: Vec::new(),
            density: 1.0,
        }
    }
}

impl Emitter {
    /// Radial burst at `origin`; counts scale with density
    pub fn burst(
        &mut self,
        origin: Vec2,
        params: BurstParams,
        kind: ParticleKind,
        dpr: f32,
        rng: &mut dyn RandomSource,
    ) {
        let count = (params.count as f32 * self.density).floor() as usize;
        let room = MAX_PARTICLES.saturating_sub(self.particles.len());
        let base_radius = match kind {
            ParticleKind::Bonus => 8.0,
            ParticleKind::Hit => 6.0,
        };
        let power = params.power * dpr;

        for _ in 0..count.min(room) {
            let angle = rng.range(0.0, std::f32::consts::TAU);
            let speed = power * rng.range(0.35, 1.10);
            self.particles.push(Particle {
                pos: origin,
                prev: origin,
                // Slight upward bias so bursts fountain out of the socket
                vel: Vec2::new(angle.cos() * speed, angle.sin() * speed - speed * 0.28),
                radius: base_radius * rng.range(0.55, 1.50),
                age_ms: 0.0,
                life_ms: params.life_ms,
                kind,
            });
        }
    }

    /// Add a floating label; `vy` is in pixels per 60 Hz frame (negative rises)
    pub fn label(&mut self, pos: Vec2, vy: f32, life_ms: f32, text: impl Into<String>, emphasized: bool) {
        self.texts.push(FloatingText {
            pos,
            vy,
            age_ms: 0.0,
            life_ms,
            text: text.into(),
            emphasized,
        });
    }

    /// Age and move everything by `dt` simulated seconds, dropping the expired
    pub fn update(&mut self, dt: f32, dpr: f32) {
        let frames = dt * 60.0;
        let dt_ms = dt * 1000.0;

        self.particles.retain_mut(|p| {
            p.age_ms += dt_ms;
            if p.age_ms >= p.life_ms {
                return false;
            }
            p.prev = p.pos;
            p.vel.y += PARTICLE_GRAVITY * dpr * frames;
            p.pos += p.vel * frames;
            p.vel *= PARTICLE_DRAG;
            true
        });

        self.texts.retain_mut(|t| {
            t.age_ms += dt_ms;
            if t.age_ms >= t.life_ms {
                return false;
            }
            t.pos.y += t.vy * frames;
            t.vy -= TEXT_LIFT * dpr * frames;
            true
        });
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.texts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::random::ScriptedSource;

    const BURST: BurstParams = BurstParams {
        count: 28,
        power: 11.0,
        life_ms: 1000.0,
    };

    #[test]
    fn test_burst_respects_density() {
        let mut e = Emitter::default();
        let mut rng = ScriptedSource::constant(0.5);
        e.burst(Vec2::ZERO, BURST, ParticleKind::Hit, 1.0, &mut rng);
        assert_eq!(e.particles.len(), 28);

        let mut e = Emitter {
            density: 0.78,
            ..Default::default()
        };
        e.burst(Vec2::ZERO, BURST, ParticleKind::Hit, 1.0, &mut rng);
        assert_eq!(e.particles.len(), 21);
    }

    #[test]
    fn test_burst_is_capped() {
        let mut e = Emitter::default();
        let mut rng = ScriptedSource::constant(0.5);
        for _ in 0..40 {
            e.burst(Vec2::ZERO, BURST, ParticleKind::Bonus, 1.0, &mut rng);
        }
        assert_eq!(e.particles.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_particles_expire_after_lifetime() {
        let mut e = Emitter::default();
        e.burst(Vec2::ZERO, BURST, ParticleKind::Hit, 1.0, &mut ScriptedSource::constant(0.25));
        for _ in 0..59 {
            e.update(1.0 / 60.0, 1.0);
        }
        assert!(!e.particles.is_empty());
        for _ in 0..3 {
            e.update(1.0 / 60.0, 1.0);
        }
        assert!(e.particles.is_empty());
    }

    #[test]
    fn test_particle_records_trail_and_falls() {
        let mut e = Emitter::default();
        e.burst(Vec2::ZERO, BURST, ParticleKind::Hit, 1.0, &mut ScriptedSource::constant(0.0));
        let start_vy = e.particles[0].vel.y;
        e.update(1.0 / 60.0, 1.0);
        let p = &e.particles[0];
        assert_eq!(p.prev, Vec2::ZERO);
        assert_ne!(p.pos, Vec2::ZERO);
        // Gravity pulled it down before drag was applied
        assert!(p.vel.y > start_vy * PARTICLE_DRAG);
    }

    #[test]
    fn test_label_rises_and_expires() {
        let mut e = Emitter::default();
        e.label(Vec2::new(0.0, 100.0), -0.11, 1100.0, "+30", false);
        e.update(0.5, 1.0);
        assert!(e.texts[0].pos.y < 100.0);
        e.update(0.61, 1.0);
        assert!(e.texts.is_empty());
    }
}
