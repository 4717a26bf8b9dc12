//! Canonical particle batches
//!
//! Pure builders: they only read the random source and return descriptors
//! for the caller to insert. Same seed, same batch.

use glam::Vec2;
use rand::Rng;

use super::particle::{ParticleKind, ParticleOptions};
use crate::renderer::vertex::colors;
use crate::{polar_to_cartesian, rand_between};

/// A particle waiting to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSpawn {
    pub pos: Vec2,
    pub options: ParticleOptions,
}

/// `count` particles radiating at uniform angular spacing
pub fn explosion<R: Rng + ?Sized>(
    pos: Vec2,
    count: u32,
    color: [f32; 3],
    rng: &mut R,
) -> Vec<ParticleSpawn> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let speed = rand_between(rng, 2.0, 6.0);
            ParticleSpawn {
                pos,
                options: ParticleOptions {
                    vel: Some(polar_to_cartesian(speed, angle)),
                    size: rand_between(rng, 3.0, 8.0),
                    lifetime_ms: rand_between(rng, 400.0, 800.0),
                    color,
                    kind: ParticleKind::Explosion,
                    glow: true,
                    ..Default::default()
                },
            }
        })
        .collect()
}

/// Short spark burst biased along `direction`
pub fn muzzle_flash<R: Rng + ?Sized>(
    pos: Vec2,
    direction: Vec2,
    count: u32,
    lifetime_ms: f32,
    rng: &mut R,
) -> Vec<ParticleSpawn> {
    let direction = direction.try_normalize().unwrap_or(Vec2::X);
    (0..count)
        .map(|_| {
            let vel = direction * rand_between(rng, 1.0, 3.0)
                + Vec2::new(rand_between(rng, -0.5, 0.5), rand_between(rng, -0.5, 0.5));
            ParticleSpawn {
                pos,
                options: ParticleOptions {
                    vel: Some(vel),
                    size: rand_between(rng, 2.0, 4.0),
                    lifetime_ms,
                    color: colors::MUZZLE,
                    kind: ParticleKind::Spark,
                    glow: true,
                    ..Default::default()
                },
            }
        })
        .collect()
}

/// One particle drifting against `velocity`
pub fn trail<R: Rng + ?Sized>(
    pos: Vec2,
    velocity: Vec2,
    color: [f32; 3],
    lifetime_ms: f32,
    rng: &mut R,
) -> ParticleSpawn {
    let vel = -velocity * 0.3 + Vec2::new(rand_between(rng, -0.5, 0.5), rand_between(rng, -0.5, 0.5));
    ParticleSpawn {
        pos,
        options: ParticleOptions {
            vel: Some(vel),
            size: rand_between(rng, 2.0, 4.0),
            lifetime_ms,
            color,
            kind: ParticleKind::Trail,
            ..Default::default()
        },
    }
}
