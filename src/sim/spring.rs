//! Critically-damped 1-D spring used for all organic motion

use crate::tuning::SpringParams;

/// Advance a spring by `dt` seconds with semi-implicit Euler.
///
/// `a = -k (x - target) - d v`, velocity is updated first and the new
/// velocity moves the value.
#[inline]
pub fn spring_step(x: f32, v: f32, target: f32, dt: f32, k: f32, d: f32) -> (f32, f32) {
    let a = -k * (x - target) - d * v;
    let v = v + a * dt;
    (x + v * dt, v)
}

/// Spring state (value + velocity)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spring {
    pub value: f32,
    pub velocity: f32,
}

impl Spring {
    pub fn step(&mut self, target: f32, dt: f32, params: SpringParams) {
        let (x, v) = spring_step(self.value, self.velocity, target, dt, params.k, params.d);
        self.value = x;
        self.velocity = v;
    }

    /// Jump to a value at rest
    pub fn snap(&mut self, value: f32) {
        self.value = value;
        self.velocity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equilibrium_is_fixed_point() {
        let (mut x, mut v) = (1.0, 0.0);
        for _ in 0..1000 {
            (x, v) = spring_step(x, v, 1.0, 1.0 / 60.0, 90.0, 13.0);
        }
        assert_eq!(x, 1.0);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_converges_to_target() {
        let mut s = Spring::default();
        let params = SpringParams { k: 90.0, d: 13.0 };
        for _ in 0..240 {
            s.step(1.0, 1.0 / 60.0, params);
        }
        assert!((s.value - 1.0).abs() < 1e-3, "value = {}", s.value);
        assert!(s.velocity.abs() < 1e-2);
    }

    #[test]
    fn test_ring_relaxes_from_pulse() {
        let mut s = Spring::default();
        s.snap(1.0);
        let params = SpringParams { k: 42.0, d: 10.0 };
        for _ in 0..300 {
            s.step(0.0, 1.0 / 60.0, params);
        }
        assert!(s.value.abs() < 1e-3);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        assert_eq!(spring_step(0.3, 2.0, 1.0, 0.0, 70.0, 10.0), (0.3, 2.0));
    }
}
