//! Arcade FX - visual feedback engine for an arcade shooter
//!
//! Core modules:
//! - `fx`: Pooled particles, particle factory, effect manager
//! - `camera`: Tween scheduler, easing, camera/time/post effects
//! - `discovery`: Waves, spawn patterns, power-up/penalty trades
//! - `renderer`: Drawing context abstraction and a tessellating vertex canvas
//! - `config` / `settings`: Tunables, versioned gameplay snapshot, player preferences
//! - `stack`: Per-frame driver wiring everything together
//!
//! Everything is single-threaded and frame-stepped: the host calls `update`
//! then `render` once per frame.

pub mod camera;
pub mod config;
pub mod discovery;
pub mod events;
pub mod fx;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod stack;

pub use camera::{CameraEffectController, Easing, TweenScheduler};
pub use config::{ConfigError, FxConfig, GameplayTuning};
pub use discovery::{DiscoverySystem, WavePhase};
pub use fx::{EffectManager, Particle, ParticleKind, ParticleOptions};
pub use renderer::{DrawContext, VertexCanvas};
pub use settings::{QualityPreset, Settings};
pub use stack::FxStack;

use glam::Vec2;
use rand::Rng;

/// Engine constants
pub mod consts {
    /// Reference frame length; per-frame physics constants are tuned for 60 Hz
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
    /// Largest frame delta the driver will forward (prevents huge jumps after a stall)
    pub const MAX_FRAME_MS: f32 = 100.0;

    /// Default visible area
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Particles without bounce survive this far outside the screen
    pub const OFFSCREEN_MARGIN: f32 = 50.0;
}

/// Per-frame capability: advance internal state by `dt_ms` milliseconds
pub trait Updatable {
    fn update(&mut self, dt_ms: f32);
}

/// Per-frame capability: issue draw calls
pub trait Renderable {
    fn render(&self, ctx: &mut dyn DrawContext);
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Replace NaN/infinite and negative values with zero
#[inline]
pub fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// [`sanitize`] a trigger argument, warning when it had to be clamped
pub fn sanitize_input(what: &str, value: f32) -> f32 {
    let clean = sanitize(value);
    if clean != value {
        log::warn!("Clamped {} from {} to {}", what, value, clean);
    }
    clean
}

/// Uniform float in `[min, max)`, or `min` when the range is empty
#[inline]
pub fn rand_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Uniform offset in `[-amount, amount]`; zero for non-positive amounts
#[inline]
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    if amount > 0.0 && amount.is_finite() {
        rng.random_range(-amount..=amount)
    } else {
        0.0
    }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Scale a per-frame rate (tuned at 60 Hz) to an arbitrary delta
#[inline]
pub fn frame_scale(dt_ms: f32) -> f32 {
    sanitize(dt_ms) / consts::FRAME_MS
}
