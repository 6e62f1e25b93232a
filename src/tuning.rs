//! Data-driven game balance
//!
//! Every gameplay constant lives here so rounds can be re-tuned from JSON
//! without touching the simulation code. `Default` is the shipped balance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tuning field `{field}` {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Spring constants (stiffness, damping)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    pub k: f32,
    pub d: f32,
}

/// Inclusive-exclusive millisecond range used for random draws
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MsRange {
    pub min: f32,
    pub max: f32,
}

impl MsRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Particle burst recipe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstParams {
    pub count: u32,
    /// Launch speed in CSS pixels per 60 Hz frame (scaled by dpr)
    pub power: f32,
    pub life_ms: f32,
}

/// Game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Round ===
    pub round_ms: f64,

    // === Spawning ===
    /// Per-slot, per-tick spawn probability at intensity 1
    pub base_spawn_rate: f32,
    /// Intensity gained over a full round (intensity = 1 + progress * ramp)
    pub intensity_ramp: f32,
    pub bonus_chance: f32,
    pub common_life: MsRange,
    pub bonus_life: MsRange,
    pub cooldown: MsRange,

    // === Scoring ===
    pub base_points: u64,
    pub combo_step_points: u64,
    pub combo_cap_points: u64,
    pub combo_window_ms: f64,
    /// Every Nth combo step plays the combo sting
    pub combo_sting_every: u32,
    /// Floating score texts at or above this value are emphasized
    pub emphasis_points: u64,
    pub bonus_multiplier: u32,
    pub bonus_multiplier_ms: f64,

    // === Time effects ===
    pub slowmo_ms: f64,
    pub slowmo_factor: f32,
    pub hit_flash_ms: f64,

    // === Impacts ===
    pub impact_shake_ms: f64,
    pub impact_shake_px: f32,
    pub impact_chroma_ms: f64,
    pub impact_chroma_px: f32,

    // === Jump-scares ===
    pub scare_on_miss_chance: f32,
    pub scare_ambient_chance: f32,
    pub scare_ambient_strength: f32,
    pub scare_overlay_ms: f64,
    pub scare_flash_ms: f64,
    pub scare_shake_ms: f64,
    pub scare_shake_px: f32,
    pub scare_chroma_ms: f64,
    pub scare_chroma_px: f32,
    pub scare_sting_delay_ms: f64,
    pub music_restore_delay_ms: f64,

    // === Motion ===
    pub pop_occupied: SpringParams,
    pub pop_empty: SpringParams,
    pub ring: SpringParams,
    pub idle_rate: f32,

    // === Visual bursts ===
    pub hit_burst: BurstParams,
    pub bonus_burst: BurstParams,
    pub score_text_ms: f32,
    pub boost_text_ms: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            round_ms: 40_000.0,

            base_spawn_rate: 0.0155,
            intensity_ramp: 1.65,
            bonus_chance: 0.20,
            common_life: MsRange::new(680.0, 1120.0),
            bonus_life: MsRange::new(860.0, 1320.0),
            cooldown: MsRange::new(220.0, 560.0),

            base_points: 30,
            combo_step_points: 4,
            combo_cap_points: 90,
            combo_window_ms: 2_000.0,
            combo_sting_every: 5,
            emphasis_points: 70,
            bonus_multiplier: 2,
            bonus_multiplier_ms: 10_000.0,

            slowmo_ms: 720.0,
            slowmo_factor: 0.55,
            hit_flash_ms: 220.0,

            impact_shake_ms: 190.0,
            impact_shake_px: 10.0,
            impact_chroma_ms: 280.0,
            impact_chroma_px: 5.0,

            scare_on_miss_chance: 0.05,
            scare_ambient_chance: 0.00055,
            scare_ambient_strength: 0.85,
            scare_overlay_ms: 560.0,
            scare_flash_ms: 150.0,
            scare_shake_ms: 520.0,
            scare_shake_px: 22.0,
            scare_chroma_ms: 560.0,
            scare_chroma_px: 7.0,
            scare_sting_delay_ms: 90.0,
            music_restore_delay_ms: 650.0,

            pop_occupied: SpringParams { k: 90.0, d: 13.0 },
            pop_empty: SpringParams { k: 76.0, d: 12.0 },
            ring: SpringParams { k: 42.0, d: 10.0 },
            idle_rate: 1.2,

            hit_burst: BurstParams {
                count: 28,
                power: 11.0,
                life_ms: 1000.0,
            },
            bonus_burst: BurstParams {
                count: 42,
                power: 13.0,
                life_ms: 1200.0,
            },
            score_text_ms: 1100.0,
            boost_text_ms: 1250.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the round logic cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |field, reason| Err(TuningError::Invalid { field, reason });
        if !(self.round_ms.is_finite() && self.round_ms > 0.0) {
            return invalid("round_ms", "must be positive");
        }
        if self.bonus_multiplier < 1 {
            return invalid("bonus_multiplier", "must be at least 1");
        }
        if !(self.slowmo_factor > 0.0 && self.slowmo_factor <= 1.0) {
            return invalid("slowmo_factor", "must be in (0, 1]");
        }
        let chances = [
            ("base_spawn_rate", self.base_spawn_rate),
            ("bonus_chance", self.bonus_chance),
            ("scare_on_miss_chance", self.scare_on_miss_chance),
            ("scare_ambient_chance", self.scare_ambient_chance),
        ];
        for (field, p) in chances {
            if !(0.0..=1.0).contains(&p) {
                return invalid(field, "must be a probability in [0, 1]");
            }
        }
        Ok(())
    }

    /// Points for a common hit at the given combo, before the multiplier
    pub fn combo_points(&self, combo: u32) -> u64 {
        self.base_points + (combo as u64 * self.combo_step_points).min(self.combo_cap_points)
    }
}
