//! Delayed events checked against the shared clock each tick
//!
//! Replaces detached timer callbacks: anything deferred lives in game state,
//! so starting a new round or tearing the game down cannot leak a pending
//! sound or music change.

use super::state::SoundEffect;

/// Work to perform once its due time passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    Sound(SoundEffect),
    /// Bring ducked background music back to its normal volume
    RestoreMusic,
}

/// Handle for cancelling a scheduled event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

#[derive(Debug, Clone)]
struct Pending {
    id: EventId,
    due: f64,
    action: Deferred,
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pending: Vec<Pending>,
    next_id: u64,
}

impl Schedule {
    pub fn schedule(&mut self, due: f64, action: Deferred) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { id, due, action });
        id
    }

    /// Returns false if the event already fired or was cancelled
    pub fn cancel(&mut self, id: EventId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every event due at `now`, in due order
    /// (ties keep scheduling order)
    pub fn drain_due(&mut self, now: f64) -> Vec<Deferred> {
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|p| {
            if p.due <= now {
                due.push(p.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|p| p.action).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut s = Schedule::default();
        s.schedule(200.0, Deferred::RestoreMusic);
        s.schedule(90.0, Deferred::Sound(SoundEffect::End));
        assert!(s.drain_due(50.0).is_empty());
        assert_eq!(
            s.drain_due(300.0),
            vec![Deferred::Sound(SoundEffect::End), Deferred::RestoreMusic]
        );
        assert!(s.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut s = Schedule::default();
        let id = s.schedule(10.0, Deferred::RestoreMusic);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.drain_due(100.0).is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut s = Schedule::default();
        s.schedule(10.0, Deferred::RestoreMusic);
        s.schedule(20.0, Deferred::Sound(SoundEffect::Miss));
        s.cancel_all();
        assert_eq!(s.len(), 0);
    }
}
