//! Injected randomness
//!
//! The spawn scheduler, particle emitter and hit resolver draw through this
//! trait instead of a global RNG, so a seeded `Pcg32` drives real play and a
//! `ScriptedSource` can force exact spawn / jump-scare outcomes.

use std::collections::VecDeque;

use rand::Rng;
use rand_pcg::Pcg32;

pub trait RandomSource {
    /// Uniform draw in [0, 1)
    fn next_unit(&mut self) -> f32;

    /// True with probability `p`
    fn chance(&mut self, p: f32) -> bool {
        self.next_unit() < p
    }

    /// Uniform draw in [min, max)
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_unit()
    }
}

impl RandomSource for Pcg32 {
    fn next_unit(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Replays queued values, then repeats a fallback forever
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    queue: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedSource {
    /// Source that always returns `value`
    pub fn constant(value: f32) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: value.clamp(0.0, 0.999_999),
        }
    }

    /// Source that never passes a `chance` with p < 1
    pub fn never() -> Self {
        Self::constant(0.999_999)
    }

    /// Source that passes every `chance` with p > 0
    pub fn always() -> Self {
        Self::constant(0.0)
    }

    /// Queue values to be returned before the fallback
    pub fn then(mut self, values: &[f32]) -> Self {
        self.queue.extend(values.iter().map(|v| v.clamp(0.0, 0.999_999)));
        self
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f32 {
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}
