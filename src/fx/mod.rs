//! Particle effects
//!
//! - `particle`: the pooled particle and its behavior kinds
//! - `factory`: pure builders for canonical bursts
//! - `manager`: active list, reuse pool, composite triggers

pub mod factory;
pub mod manager;
pub mod particle;

pub use factory::ParticleSpawn;
pub use manager::{Burst, EffectManager, EffectStats, ScreenShake, ShakeRequest, ShakeSink};
pub use particle::{Particle, ParticleKind, ParticleOptions};
