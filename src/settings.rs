//! Player-facing effect preferences
//!
//! Persisted separately from the engine config (LocalStorage on web, a JSON
//! file natively) and folded into an [`FxConfig`] with [`Settings::apply_to`].

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, FxConfig};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle population cap for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }

    /// Reuse pool cap for this preset
    pub fn pool_capacity(&self) -> usize {
        match self {
            QualityPreset::Low => 50,
            QualityPreset::Medium => 100,
            QualityPreset::High => 300,
        }
    }

    /// Whether to render the glow pass
    pub fn glow_enabled(&self) -> bool {
        match self {
            QualityPreset::Low => false,
            QualityPreset::Medium => true,
            QualityPreset::High => true,
        }
    }
}

/// Effect preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Screen shake on explosions/impacts
    pub screen_shake: bool,
    /// Particle effects (explosions, sparks, trails)
    pub particles: bool,
    /// Full-screen flashes (hit stop)
    pub flash: bool,
    /// Glow pass around particles
    pub glow: bool,
    /// Combo bursts
    pub combo_effects: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            // Visual effects - all on by default
            screen_shake: true,
            particles: true,
            flash: true,
            glow: true,
            combo_effects: true,

            // Accessibility
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset disables some effects for performance
        if preset == QualityPreset::Low {
            self.glow = false;
            self.combo_effects = false;
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        self.flash && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Fold these preferences into an engine config
    pub fn apply_to(&self, config: &mut FxConfig) {
        let feedback = &mut config.feedback;
        feedback.particles_enabled = self.particles;
        feedback.max_particles = self.max_particles();
        feedback.pool_capacity = self.quality.pool_capacity();
        feedback.screen_shake_enabled = self.effective_screen_shake();
        feedback.flash_enabled = self.effective_flash();
        feedback.glow_enabled = self.glow && self.quality.glow_enabled();
        feedback.combo_effects_enabled = self.combo_effects;
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// LocalStorage key / file stem
    const STORAGE_KEY: &'static str = "arcade_fx_settings";

    #[cfg(target_arch = "wasm32")]
    fn local_storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    /// Web: LocalStorage entry, defaults when missing or invalid
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = Self::local_storage().and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten());
        match json.map(|json| Self::from_json(&json)) {
            Some(Ok(settings)) => {
                log::info!("Loaded settings from LocalStorage");
                settings
            }
            Some(Err(e)) => {
                log::warn!("Ignoring invalid stored settings: {}", e);
                Self::default()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Web: write to LocalStorage; failures are logged and otherwise ignored
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = Self::local_storage() else {
            log::warn!("LocalStorage unavailable; settings not saved");
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("LocalStorage rejected settings");
                }
            }
            Err(e) => log::warn!("Could not serialize settings: {}", e),
        }
    }

    /// Native: `<dir>/arcade_fx_settings.json`, defaults when missing or invalid
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(dir: &std::path::Path) -> Self {
        let path = dir.join(format!("{}.json", Self::STORAGE_KEY));
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring invalid settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, dir: &std::path::Path) -> Result<(), ConfigError> {
        let path = dir.join(format!("{}.json", Self::STORAGE_KEY));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
