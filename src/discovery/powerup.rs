//! Power-up catalog
//!
//! Every power-up is a paired trade: a player upgrade plus a difficulty
//! penalty applied at the same time.

use serde::{Deserialize, Serialize};

use crate::config::TuningDelta;

/// What the power-up improves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpEffect {
    /// Multiplies the shot cooldown (below 1 fires faster)
    ShootCooldown,
    PlayerSpeed,
    /// Adds `value` lives
    Lives,
    BulletDamage,
    ShotgunSpread,
}

/// What the power-up costs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    EnemySpeed,
    /// Enemies spawn more often
    EnemyCount,
    EnemyHp,
    EnemySize,
    /// More kills needed per wave
    WaveEnemies,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpDef {
    pub key: String,
    pub name: String,
    pub description: String,
    pub effect: PowerUpEffect,
    pub value: f32,
    pub penalty: Penalty,
    pub penalty_value: f32,
}

impl PowerUpDef {
    /// Tuning change for the upgrade half of the trade
    pub fn effect_delta(&self) -> TuningDelta {
        match self.effect {
            PowerUpEffect::ShootCooldown => TuningDelta::ScaleShootCooldown(self.value),
            PowerUpEffect::PlayerSpeed => TuningDelta::ScalePlayerSpeed(self.value),
            PowerUpEffect::Lives => TuningDelta::AddLives(self.value.max(0.0).round() as u32),
            PowerUpEffect::BulletDamage => TuningDelta::ScaleBulletDamage(self.value),
            PowerUpEffect::ShotgunSpread => TuningDelta::ScaleShotgunSpread(self.value),
        }
    }

    /// Tuning change for the penalty, or `None` when the penalty targets the
    /// wave quota instead
    pub fn penalty_delta(&self) -> Option<TuningDelta> {
        match self.penalty {
            Penalty::EnemySpeed => Some(TuningDelta::ScaleEnemySpeed(self.penalty_value)),
            Penalty::EnemyCount => Some(TuningDelta::ScaleEnemySpawnRate(self.penalty_value)),
            Penalty::EnemyHp => Some(TuningDelta::ScaleEnemyHp(self.penalty_value)),
            Penalty::EnemySize => Some(TuningDelta::ScaleEnemySize(self.penalty_value)),
            Penalty::WaveEnemies => None,
        }
    }

    /// Human-readable penalty, e.g. "Enemy speed +20%"
    pub fn penalty_description(&self) -> String {
        let percent = ((self.penalty_value - 1.0) * 100.0).round() as i32;
        let what = match self.penalty {
            Penalty::EnemySpeed => "Enemy speed",
            Penalty::EnemyCount => "Enemy spawn rate",
            Penalty::EnemyHp => "Enemy HP",
            Penalty::EnemySize => "Enemy size",
            Penalty::WaveEnemies => "Enemies per wave",
        };
        format!("{} {:+}%", what, percent)
    }
}

fn def(
    key: &str,
    name: &str,
    description: &str,
    effect: PowerUpEffect,
    value: f32,
    penalty: Penalty,
    penalty_value: f32,
) -> PowerUpDef {
    PowerUpDef {
        key: key.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        effect,
        value,
        penalty,
        penalty_value,
    }
}

/// Stock catalog
pub fn default_catalog() -> Vec<PowerUpDef> {
    vec![
        def(
            "rapid_fire",
            "Rapid Fire",
            "Shoot 20% faster",
            PowerUpEffect::ShootCooldown,
            0.8,
            Penalty::EnemySpeed,
            1.2,
        ),
        def(
            "swift",
            "Swift",
            "Move 25% faster",
            PowerUpEffect::PlayerSpeed,
            1.25,
            Penalty::EnemyCount,
            1.3,
        ),
        def(
            "extra_life",
            "Extra Life",
            "Gain one life",
            PowerUpEffect::Lives,
            1.0,
            Penalty::EnemyHp,
            1.5,
        ),
        def(
            "heavy_rounds",
            "Heavy Rounds",
            "Bullets deal 50% more damage",
            PowerUpEffect::BulletDamage,
            1.5,
            Penalty::EnemySize,
            1.2,
        ),
        def(
            "wide_spread",
            "Wide Spread",
            "Shotgun spread 30% wider",
            PowerUpEffect::ShotgunSpread,
            1.3,
            Penalty::WaveEnemies,
            1.2,
        ),
        def(
            "overclock",
            "Overclock",
            "Shoot 30% faster",
            PowerUpEffect::ShootCooldown,
            0.7,
            Penalty::WaveEnemies,
            1.5,
        ),
    ]
}
