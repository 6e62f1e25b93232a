//! Player settings and preferences
//!
//! Persisted separately from the best score in LocalStorage.

use serde::{Deserialize, Serialize};

/// Rendering quality tiers
///
/// Purely a cost/fidelity knob; no tier changes gameplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityTier {
    #[default]
    Max,
    High,
}

/// Per-tier post-processing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityParams {
    /// Bloom blur radius in buffer pixels
    pub bloom_blur: f32,
    pub bloom_alpha: f32,
    pub grain_alpha: f32,
    pub scan_alpha: f32,
    /// Multiplier applied to particle burst counts
    pub particles: f32,
    /// Grain tile scale
    pub noise_scale: f32,
    /// Opacity of the previous frame blended under the current one
    pub motion_blur: f32,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Max => "MAX",
            QualityTier::High => "HIGH",
        }
    }

    /// The other tier (the quality button flips between the two)
    pub fn toggled(&self) -> Self {
        match self {
            QualityTier::Max => QualityTier::High,
            QualityTier::High => QualityTier::Max,
        }
    }

    pub fn params(&self) -> QualityParams {
        match self {
            QualityTier::Max => QualityParams {
                bloom_blur: 22.0,
                bloom_alpha: 0.92,
                grain_alpha: 0.10,
                scan_alpha: 0.11,
                particles: 1.0,
                noise_scale: 1.0,
                motion_blur: 0.18,
            },
            QualityTier::High => QualityParams {
                bloom_blur: 16.0,
                bloom_alpha: 0.78,
                grain_alpha: 0.07,
                scan_alpha: 0.08,
                particles: 0.78,
                noise_scale: 1.2,
                motion_blur: 0.12,
            },
        }
    }
}

/// Player settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Rendering quality tier
    pub quality: QualityTier,
    /// Sound effects on/off
    pub sound: bool,
    /// Background music on/off
    pub music: bool,
    /// Haptic feedback on/off
    pub haptics: bool,
    /// Jump-scare events on/off
    pub jump_scares: bool,
    /// Music volume when not ducked (0.0 - 1.0)
    pub music_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityTier::Max,
            sound: true,
            music: true,
            haptics: true,
            jump_scares: true,
            music_volume: 0.32,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "mole_rush_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
