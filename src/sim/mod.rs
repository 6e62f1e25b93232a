//! Simulation module
//!
//! All gameplay logic lives here:
//! - One explicit state aggregate (`GameState`), no ambient globals
//! - Injected randomness only (`RandomSource`)
//! - Stable slot iteration order (grid declaration order)
//! - No rendering or platform dependencies

pub mod effects;
pub mod fx;
pub mod hit;
pub mod random;
pub mod schedule;
pub mod slot;
pub mod spawn;
pub mod spring;
pub mod state;
pub mod tick;

pub use effects::{EffectWindow, Effects};
pub use fx::{Emitter, FloatingText, Particle, ParticleKind};
pub use hit::{TapOutcome, hit_test, tap};
pub use random::{RandomSource, ScriptedSource};
pub use schedule::{Deferred, EventId, Schedule};
pub use slot::{Occupant, SlotGrid, TargetSlot};
pub use spawn::{intensity, spawn_pass};
pub use spring::{Spring, spring_step};
pub use state::{
    GameEvent, GamePhase, GameState, Haptic, ImpactStyle, MusicCue, RoundState, SimFlags,
    SoundEffect,
};
pub use tick::{start, tick};
