use glam::Vec2;
use mole_rush::best::{BestScore, MemoryStore};
use mole_rush::sim::{self, GamePhase, GameState, spring_step};
use mole_rush::{Tuning, Viewport};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// One step of a random play session
#[derive(Debug, Clone)]
enum Action {
    /// Advance the clock by this many ms and tick
    Wait(f64),
    /// Tap the hit circle of a slot
    TapSlot(usize),
    /// Tap anywhere, given as fractions of the viewport
    TapAt(f32, f32),
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (0.0..120.0f64).prop_map(Action::Wait),
        2 => (0..7usize).prop_map(Action::TapSlot),
        1 => (0.0..1.0f32, 0.0..1.0f32).prop_map(|(x, y)| Action::TapAt(x, y)),
    ]
}

fn new_state(rng: &mut Pcg32, store: &MemoryStore) -> GameState {
    let best = BestScore::load("prop_best", store);
    GameState::new(Tuning::default(), Viewport::default(), best, rng)
}

fn check_invariants(state: &GameState, now: f64) -> Result<(), TestCaseError> {
    let round = &state.round;
    prop_assert!(round.multiplier >= 1);
    if state.phase == GamePhase::Running {
        if now > round.mult_until {
            prop_assert_eq!(round.multiplier, 1);
        }
        if now > round.combo_until {
            prop_assert_eq!(round.combo, 0);
        }
    }
    for slot in state.slots.iter() {
        prop_assert!(
            !(slot.is_occupied() && now < slot.cooldown_until),
            "occupied slot still cooling down"
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn round_invariants_hold(
        seed in any::<u64>(),
        actions in prop::collection::vec(action(), 1..400),
    ) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut store = MemoryStore::new();
        let mut state = new_state(&mut rng, &store);

        let mut now = 1_000.0;
        sim::start(&mut state, now);
        prop_assert_eq!(state.round.score, 0);
        let mut last_score = 0;

        for action in actions {
            match action {
                Action::Wait(ms) => {
                    now += ms;
                    sim::tick(&mut state, now, &mut rng, &mut store);
                }
                Action::TapSlot(index) => {
                    if let Some((centre, _)) = state.slots.hit_circle(index, &state.viewport) {
                        sim::tap(&mut state, centre, now, &mut rng);
                    }
                }
                Action::TapAt(x, y) => {
                    let point = state.viewport.to_pixels(Vec2::new(x, y));
                    sim::tap(&mut state, point, now, &mut rng);
                }
            }

            check_invariants(&state, now)?;
            if state.phase == GamePhase::Running {
                prop_assert!(state.round.score >= last_score, "score went down");
            }
            last_score = state.round.score;
        }

        sim::start(&mut state, now);
        prop_assert_eq!(state.round.score, 0);
        prop_assert_eq!(state.round.multiplier, 1);
        prop_assert_eq!(state.round.combo, 0);
    }

    #[test]
    fn spring_rests_at_equilibrium(
        target in -10.0f32..10.0,
        k in 1.0f32..500.0,
        d in 0.0f32..50.0,
        dt in 0.0f32..0.05,
        steps in 1usize..50,
    ) {
        let (mut x, mut v) = (target, 0.0);
        for _ in 0..steps {
            (x, v) = spring_step(x, v, target, dt, k, d);
        }
        prop_assert_eq!(x, target);
        prop_assert_eq!(v, 0.0);
    }

    #[test]
    fn best_score_is_running_max(scores in prop::collection::vec(0u64..10_000, 1..20)) {
        let mut store = MemoryStore::new();
        let mut best = BestScore::load("prop_best", &store);
        for &score in &scores {
            best.submit(score, &mut store);
        }
        let max = scores.iter().copied().max().unwrap_or(0);
        prop_assert_eq!(best.value(), max);
        let reloaded = BestScore::load("prop_best", &store);
        prop_assert_eq!(reloaded.value(), max);
    }
}
