//! Time-windowed effects: shake, chromatic aberration, slow-motion, jump-scare
//!
//! Each effect is one independent window. Triggering an effect replaces its
//! window outright; there is no stacking or queueing.

use crate::tuning::Tuning;

/// A decaying effect window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EffectWindow {
    pub start: f64,
    pub until: f64,
    pub peak: f32,
}

impl EffectWindow {
    /// Replace the window with a fresh one starting at `now`
    pub fn activate(&mut self, now: f64, duration_ms: f64, peak: f32) {
        self.start = now;
        self.until = now + duration_ms.max(0.0);
        self.peak = peak;
    }

    pub fn is_active(&self, now: f64) -> bool {
        now < self.until
    }

    /// Fraction of the window still remaining (1 at start, 0 at expiry)
    pub fn remaining(&self, now: f64) -> f32 {
        let span = self.until - self.start;
        if !self.is_active(now) || span <= 0.0 {
            return 0.0;
        }
        ((self.until - now) / span).clamp(0.0, 1.0) as f32
    }

    /// Linearly decayed intensity
    pub fn intensity(&self, now: f64) -> f32 {
        self.peak * self.remaining(now)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Registry of all effect windows
#[derive(Debug, Clone, Default)]
pub struct Effects {
    /// Camera shake, peak in pixels
    pub shake: EffectWindow,
    /// Chromatic split, peak in pixels
    pub chroma: EffectWindow,
    /// Slow-motion (peak unused)
    pub slowmo: EffectWindow,
    /// Jump-scare white flash, peak is opacity
    pub scare_flash: EffectWindow,
    /// Jump-scare dark overlay + screamer art, peak is opacity
    pub scare_overlay: EffectWindow,
}

impl Effects {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Small camera kick on a successful hit
    pub fn impact(&mut self, now: f64, power: f32, dpr: f32, tuning: &Tuning) {
        self.shake
            .activate(now, tuning.impact_shake_ms, tuning.impact_shake_px * dpr * power);
        self.chroma
            .activate(now, tuning.impact_chroma_ms, tuning.impact_chroma_px * dpr * power);
    }

    /// Visual half of a jump-scare (audio/haptics are emitted by the caller)
    pub fn jump_scare(&mut self, now: f64, strength: f32, dpr: f32, tuning: &Tuning) {
        self.scare_overlay.activate(now, tuning.scare_overlay_ms, 0.92);
        self.scare_flash.activate(now, tuning.scare_flash_ms, 1.0);
        self.shake
            .activate(now, tuning.scare_shake_ms, tuning.scare_shake_px * dpr * strength);
        self.chroma
            .activate(now, tuning.scare_chroma_ms, tuning.scare_chroma_px * dpr * strength);
    }

    pub fn start_slowmo(&mut self, now: f64, tuning: &Tuning) {
        self.slowmo.activate(now, tuning.slowmo_ms, 1.0);
    }

    /// Scale applied to simulated time (countdown, spawn timers, physics)
    pub fn time_scale(&self, now: f64, tuning: &Tuning) -> f32 {
        if self.slowmo.is_active(now) {
            tuning.slowmo_factor
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_decays_linearly() {
        let mut w = EffectWindow::default();
        w.activate(1000.0, 200.0, 10.0);
        assert_eq!(w.intensity(1000.0), 10.0);
        assert!((w.intensity(1100.0) - 5.0).abs() < 1e-5);
        assert!(w.is_active(1199.9));
        assert!(!w.is_active(1200.0));
        assert_eq!(w.intensity(1200.0), 0.0);
        assert_eq!(w.intensity(5000.0), 0.0);
    }

    #[test]
    fn test_retrigger_overwrites() {
        let mut fx = Effects::default();
        let tuning = Tuning::default();
        fx.jump_scare(0.0, 1.0, 1.0, &tuning);
        assert_eq!(fx.shake.peak, 22.0);
        fx.impact(100.0, 1.0, 1.0, &tuning);
        assert_eq!(fx.shake.peak, 10.0);
        assert_eq!(fx.shake.until, 290.0);
    }

    #[test]
    fn test_slowmo_scale_window() {
        let mut fx = Effects::default();
        let tuning = Tuning::default();
        assert_eq!(fx.time_scale(0.0, &tuning), 1.0);
        fx.start_slowmo(0.0, &tuning);
        assert_eq!(fx.time_scale(719.0, &tuning), 0.55);
        assert_eq!(fx.time_scale(720.0, &tuning), 1.0);
    }

    #[test]
    fn test_impact_scales_with_dpr() {
        let mut fx = Effects::default();
        fx.impact(0.0, 1.0, 2.0, &Tuning::default());
        assert_eq!(fx.chroma.peak, 10.0);
    }
}
