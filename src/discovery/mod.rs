//! Wave progression and power-up discovery
//!
//! - `powerup`: the power-up/penalty catalog
//! - `system`: wave state machine, spawn patterns, selection

pub mod powerup;
pub mod system;

pub use powerup::{Penalty, PowerUpDef, PowerUpEffect};
pub use system::{DiscoveryStatus, DiscoverySystem};

use serde::{Deserialize, Serialize};

/// Parametric spawn layout, chosen once per wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    Random,
    FormationV,
    FormationCircle,
    FormationLine,
    FormationSpiral,
}

impl SpawnPattern {
    pub const ALL: [SpawnPattern; 5] = [
        SpawnPattern::Random,
        SpawnPattern::FormationV,
        SpawnPattern::FormationCircle,
        SpawnPattern::FormationLine,
        SpawnPattern::FormationSpiral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpawnPattern::Random => "random",
            SpawnPattern::FormationV => "formation_v",
            SpawnPattern::FormationCircle => "formation_circle",
            SpawnPattern::FormationLine => "formation_line",
            SpawnPattern::FormationSpiral => "formation_spiral",
        }
    }
}

/// Where the wave cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WavePhase {
    #[default]
    Spawning,
    /// Quota met; passes straight into selection
    WaveCleared,
    PowerUpSelection,
}

/// Notifications published on the discovery event bus
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    WaveStarted { wave: u32, pattern: SpawnPattern },
    WaveCleared { wave: u32 },
    PowerUpOffered { wave: u32, keys: Vec<String> },
    PowerUpSelected { wave: u32, key: String, penalty: String },
}
