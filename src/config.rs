//! Engine configuration
//!
//! `FxConfig` holds the static tunables handed to each component at
//! construction. `GameplayTuning` is the mutable gameplay snapshot that
//! power-ups change; it only moves through [`GameplayTuning::apply`], which
//! bumps its version and records the delta.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::discovery::powerup::{PowerUpDef, default_catalog};
use crate::discovery::SpawnPattern;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Visible area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

/// Particle, shake and flash tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Master switch for the particle subsystem
    pub particles_enabled: bool,
    pub screen_shake_enabled: bool,
    pub glow_enabled: bool,
    pub combo_effects_enabled: bool,
    pub flash_enabled: bool,

    /// Population cap enforced after every update
    pub max_particles: usize,
    /// Reuse pool cap; excess returned particles are dropped
    pub pool_capacity: usize,

    /// Explosion particle count at intensity 1.0
    pub explosion_count: u32,
    pub muzzle_flash_count: u32,
    pub muzzle_flash_lifetime_ms: f32,
    pub trail_lifetime_ms: f32,
    /// Emit one trail particle every N frames
    pub trail_interval_frames: u64,

    /// Explosion shake at intensity 1.0
    pub shake_intensity: f32,
    pub shake_duration_ms: f32,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            particles_enabled: true,
            screen_shake_enabled: true,
            glow_enabled: true,
            combo_effects_enabled: true,
            flash_enabled: true,
            max_particles: 500,
            pool_capacity: 100,
            explosion_count: 12,
            muzzle_flash_count: 5,
            muzzle_flash_lifetime_ms: 150.0,
            trail_lifetime_ms: 300.0,
            trail_interval_frames: 3,
            shake_intensity: 5.0,
            shake_duration_ms: 200.0,
        }
    }
}

/// Wave and power-up tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub enabled: bool,
    pub enemies_per_wave: u32,
    /// Compounded into the difficulty multiplier on every wave advance
    pub difficulty_multiplier: f32,
    pub spawn_patterns: Vec<SpawnPattern>,
    pub power_ups: Vec<PowerUpDef>,
    /// Candidates offered per selection
    pub offer_count: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enemies_per_wave: 15,
            difficulty_multiplier: 1.2,
            spawn_patterns: SpawnPattern::ALL.to_vec(),
            power_ups: default_catalog(),
            offer_count: 3,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    /// Seed for every RNG stream the engine owns
    pub seed: u64,
    pub screen: ScreenConfig,
    pub feedback: FeedbackConfig,
    pub discovery: DiscoveryConfig,
    /// Initial gameplay snapshot
    pub tuning: GameplayTuning,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            screen: ScreenConfig::default(),
            feedback: FeedbackConfig::default(),
            discovery: DiscoveryConfig::default(),
            tuning: GameplayTuning::default(),
        }
    }
}

impl FxConfig {
    /// Parse and validate a JSON config; omitted fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject values the engine cannot clamp into something meaningful
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.screen.width > 0.0 && self.screen.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "screen must be positive, got {}x{}",
                self.screen.width, self.screen.height
            )));
        }
        if self.discovery.enemies_per_wave == 0 {
            return Err(ConfigError::Invalid("enemies_per_wave must be at least 1".into()));
        }
        if !(self.discovery.difficulty_multiplier.is_finite()
            && self.discovery.difficulty_multiplier > 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "difficulty_multiplier must be positive, got {}",
                self.discovery.difficulty_multiplier
            )));
        }
        if self.discovery.spawn_patterns.is_empty() {
            return Err(ConfigError::Invalid("spawn_patterns must not be empty".into()));
        }
        let mut keys: Vec<&str> = self.discovery.power_ups.iter().map(|p| p.key.as_str()).collect();
        keys.sort_unstable();
        if let Some(dup) = keys.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigError::Invalid(format!("duplicate power-up key '{}'", dup[0])));
        }
        Ok(())
    }
}

/// Gameplay tunables owned by the host game and rebalanced by power-ups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayTuning {
    /// Bumped on every applied delta
    pub version: u32,
    pub shoot_cooldown_ms: f32,
    pub player_speed: f32,
    pub bullet_damage: f32,
    /// Full spread angle of the shotgun (radians)
    pub shotgun_spread: f32,
    pub enemy_speed_scale: f32,
    pub enemy_hp_scale: f32,
    pub enemy_size_scale: f32,
    /// Frames between enemy spawns (never below 1)
    pub enemy_spawn_interval_frames: u32,
    /// Lives granted by power-ups and not yet collected by the host
    pub bonus_lives: u32,
    /// Audit trail of applied deltas, oldest first
    #[serde(skip)]
    pub history: Vec<TuningDelta>,
}

impl Default for GameplayTuning {
    fn default() -> Self {
        Self {
            version: 0,
            shoot_cooldown_ms: 200.0,
            player_speed: 5.0,
            bullet_damage: 1.0,
            shotgun_spread: 0.5,
            enemy_speed_scale: 1.0,
            enemy_hp_scale: 1.0,
            enemy_size_scale: 1.0,
            enemy_spawn_interval_frames: 30,
            bonus_lives: 0,
            history: Vec::new(),
        }
    }
}

/// A single auditable change to [`GameplayTuning`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TuningDelta {
    ScaleShootCooldown(f32),
    ScalePlayerSpeed(f32),
    AddLives(u32),
    ScaleBulletDamage(f32),
    ScaleShotgunSpread(f32),
    ScaleEnemySpeed(f32),
    /// Divides the spawn interval, so more enemies per second
    ScaleEnemySpawnRate(f32),
    ScaleEnemyHp(f32),
    ScaleEnemySize(f32),
}

impl GameplayTuning {
    /// Apply one delta, bump the version, and record it
    pub fn apply(&mut self, delta: TuningDelta) {
        match delta {
            TuningDelta::ScaleShootCooldown(f) => self.shoot_cooldown_ms *= positive(f),
            TuningDelta::ScalePlayerSpeed(f) => self.player_speed *= positive(f),
            TuningDelta::AddLives(n) => self.bonus_lives = self.bonus_lives.saturating_add(n),
            TuningDelta::ScaleBulletDamage(f) => self.bullet_damage *= positive(f),
            TuningDelta::ScaleShotgunSpread(f) => self.shotgun_spread *= positive(f),
            TuningDelta::ScaleEnemySpeed(f) => self.enemy_speed_scale *= positive(f),
            TuningDelta::ScaleEnemySpawnRate(f) => {
                let interval = (self.enemy_spawn_interval_frames as f32 / positive(f)).floor();
                self.enemy_spawn_interval_frames = (interval as u32).max(1);
            }
            TuningDelta::ScaleEnemyHp(f) => self.enemy_hp_scale *= positive(f),
            TuningDelta::ScaleEnemySize(f) => self.enemy_size_scale *= positive(f),
        }
        self.version += 1;
        self.history.push(delta);
        log::debug!("Tuning v{}: applied {:?}", self.version, delta);
    }

    /// Hand granted lives to the host, resetting the counter
    pub fn take_bonus_lives(&mut self) -> u32 {
        std::mem::take(&mut self.bonus_lives)
    }
}

/// Multipliers must be positive; anything else leaves the value untouched
fn positive(f: f32) -> f32 {
    if f.is_finite() && f > 0.0 { f } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = FxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.feedback.max_particles, 500);
        assert_eq!(config.feedback.pool_capacity, 100);
        assert_eq!(config.discovery.enemies_per_wave, 15);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FxConfig::from_json(r#"{ "seed": 7, "feedback": { "max_particles": 42 } }"#)
            .expect("valid config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.feedback.max_particles, 42);
        assert_eq!(config.feedback.pool_capacity, 100);
        assert_eq!(config.screen, ScreenConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = FxConfig::default();
        let json = config.to_json().expect("serializable");
        assert_eq!(FxConfig::from_json(&json).expect("parses"), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = FxConfig::from_json(r#"{ "discovery": { "enemies_per_wave": 0 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
        let err = FxConfig::from_json(r#"{ "screen": { "width": -1, "height": 600 } }"#);
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
        let err = FxConfig::from_json("not json");
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_tuning_delta_versioning() {
        let mut tuning = GameplayTuning::default();
        tuning.apply(TuningDelta::ScaleShootCooldown(0.5));
        tuning.apply(TuningDelta::AddLives(2));
        assert_eq!(tuning.version, 2);
        assert_eq!(tuning.shoot_cooldown_ms, 100.0);
        assert_eq!(tuning.history.len(), 2);
        assert_eq!(tuning.take_bonus_lives(), 2);
        assert_eq!(tuning.bonus_lives, 0);
    }

    #[test]
    fn test_spawn_rate_never_below_one_frame() {
        let mut tuning = GameplayTuning::default();
        tuning.apply(TuningDelta::ScaleEnemySpawnRate(1.5));
        assert_eq!(tuning.enemy_spawn_interval_frames, 20);
        tuning.apply(TuningDelta::ScaleEnemySpawnRate(1000.0));
        assert_eq!(tuning.enemy_spawn_interval_frames, 1);
    }

    #[test]
    fn test_bad_multiplier_is_ignored() {
        let mut tuning = GameplayTuning::default();
        tuning.apply(TuningDelta::ScalePlayerSpeed(f32::NAN));
        tuning.apply(TuningDelta::ScaleEnemySpeed(-2.0));
        assert_eq!(tuning.player_speed, 5.0);
        assert_eq!(tuning.enemy_speed_scale, 1.0);
    }
}
