//! Best-score tracking
//!
//! The score itself goes through an abstract key-value store so the sim never
//! cares whether it lands in LocalStorage, a file, or memory.

use std::collections::HashMap;

/// Integer key-value persistence
pub trait ScoreStore {
    fn get(&self, key: &str) -> Option<u64>;
    fn set(&mut self, key: &str, value: u64);
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Option<u64> {
        self.values.get(key).copied()
    }

    fn set(&mut self, key: &str, value: u64) {
        self.values.insert(key.to_string(), value);
    }
}

/// LocalStorage-backed store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStore {
    fn get(&self, key: &str) -> Option<u64> {
        let raw = Self::storage()?.get_item(key).ok()??;
        raw.trim().parse().ok()
    }

    fn set(&mut self, key: &str, value: u64) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, &value.to_string()).is_err() {
                log::warn!("Failed to persist {}", key);
            }
        }
    }
}

/// Outcome of submitting a finished round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    pub score: u64,
    pub best: u64,
    pub new_best: bool,
}

/// Best score ever, mirrored from a store
#[derive(Debug, Clone)]
pub struct BestScore {
    key: &'static str,
    value: u64,
}

impl BestScore {
    /// Read the current best from the store (absent counts as 0)
    pub fn load(key: &'static str, store: &dyn ScoreStore) -> Self {
        let value = store.get(key).unwrap_or(0);
        log::info!("Best score: {}", value);
        Self { key, value }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Record a finished round, persisting only when the best improves
    pub fn submit(&mut self, score: u64, store: &mut dyn ScoreStore) -> RoundReport {
        let new_best = score > self.value;
        if new_best {
            self.value = score;
            store.set(self.key, score);
            log::info!("New best score: {}", score);
        }
        RoundReport {
            score,
            best: self.value,
            new_best,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "test_best";

    #[test]
    fn test_absent_best_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(BestScore::load(KEY, &store).value(), 0);
    }

    #[test]
    fn test_best_persists_across_rounds() {
        let mut store = MemoryStore::new();
        store.set(KEY, 300);
        let mut best = BestScore::load(KEY, &store);

        let report = best.submit(500, &mut store);
        assert!(report.new_best);
        assert_eq!(store.get(KEY), Some(500));

        let report = best.submit(200, &mut store);
        assert!(!report.new_best);
        assert_eq!(report.best, 500);
        assert_eq!(store.get(KEY), Some(500));
    }

    #[test]
    fn test_tie_does_not_rewrite() {
        let mut store = MemoryStore::new();
        store.set(KEY, 100);
        let mut best = BestScore::load(KEY, &store);
        assert!(!best.submit(100, &mut store).new_best);
    }
}
