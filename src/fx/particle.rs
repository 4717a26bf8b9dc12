//! Single decaying visual unit
//!
//! Physics constants (friction, gravity, velocities) are expressed per 60 Hz
//! frame and scaled by the actual delta, so a particle behaves the same at
//! any frame rate.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::OFFSCREEN_MARGIN;
use crate::renderer::{BlendMode, DrawContext, rgba_from_bytes, shapes};
use crate::{frame_scale, rand_between, sanitize};

/// Below this the bounce coefficient is treated as spent
const MIN_BOUNCE: f32 = 0.1;
/// Chance per update that a spark flickers
const SPARK_FLICKER_CHANCE: f32 = 0.1;

/// Behavior profile, selecting both the visual override in `update` and the
/// drawn shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Default,
    Explosion,
    Trail,
    Spark,
    Smoke,
    Star,
    Line,
    Circle,
    Square,
}

/// Construction parameters; anything left at its default gets the stock value
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleOptions {
    /// Initial velocity (px/frame); random in [-2, 2) per axis when `None`
    pub vel: Option<Vec2>,
    pub acceleration: Vec2,
    /// Velocity multiplier per frame
    pub friction: f32,
    /// Added to vertical velocity per frame
    pub gravity: f32,
    pub lifetime_ms: f32,
    pub size: f32,
    pub end_size: f32,
    /// RGB, 0..=255 per channel
    pub color: [f32; 3],
    /// 0..=255
    pub alpha: f32,
    pub kind: ParticleKind,
    pub fade_out: bool,
    pub shrink: bool,
    pub glow: bool,
    /// Restitution on wall contact; 0 means the particle leaves the screen
    pub bounce: f32,
    pub bounce_decay: f32,
    pub min_bounce_velocity: f32,
    /// Render layer; higher draws later
    pub depth: i32,
}

impl Default for ParticleOptions {
    fn default() -> Self {
        Self {
            vel: None,
            acceleration: Vec2::ZERO,
            friction: 0.98,
            gravity: 0.05,
            lifetime_ms: 500.0,
            size: 4.0,
            end_size: 0.0,
            color: [255.0, 255.0, 255.0],
            alpha: 255.0,
            kind: ParticleKind::Default,
            fade_out: true,
            shrink: true,
            glow: false,
            bounce: 0.0,
            bounce_decay: 0.8,
            min_bounce_velocity: 0.5,
            depth: 0,
        }
    }
}

/// A pooled particle. Construct with [`Particle::new`], recycle with
/// [`Particle::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub start_pos: Vec2,
    pub vel: Vec2,
    pub acceleration: Vec2,
    pub friction: f32,
    pub gravity: f32,

    pub lifetime_ms: f32,
    pub elapsed_ms: f32,

    pub size: f32,
    pub start_size: f32,
    pub end_size: f32,
    pub color: [f32; 3],
    pub alpha: f32,
    pub start_alpha: f32,

    pub kind: ParticleKind,
    pub fade_out: bool,
    pub shrink: bool,
    pub glow: bool,

    pub bounce: f32,
    pub bounce_decay: f32,
    pub min_bounce_velocity: f32,

    pub depth: i32,
    pub active: bool,
    /// Creation order stamp assigned by the owning manager
    pub serial: u64,
}

impl Particle {
    pub fn new<R: Rng + ?Sized>(pos: Vec2, options: &ParticleOptions, rng: &mut R) -> Self {
        let vel = initial_velocity(options, rng);
        let size = sanitize(options.size);
        let alpha = sanitize(options.alpha).min(255.0);
        Self {
            pos,
            start_pos: pos,
            vel,
            acceleration: finite_or_zero(options.acceleration),
            friction: options.friction,
            gravity: options.gravity,
            lifetime_ms: sanitize(options.lifetime_ms),
            elapsed_ms: 0.0,
            size,
            start_size: size,
            end_size: sanitize(options.end_size),
            color: options.color.map(|c| c.clamp(0.0, 255.0)),
            alpha,
            start_alpha: alpha,
            kind: options.kind,
            fade_out: options.fade_out,
            shrink: options.shrink,
            glow: options.glow,
            bounce: sanitize(options.bounce),
            bounce_decay: sanitize(options.bounce_decay),
            min_bounce_velocity: sanitize(options.min_bounce_velocity),
            depth: options.depth,
            active: true,
            serial: 0,
        }
    }

    /// Reinitialise every field as if freshly constructed
    pub fn reset<R: Rng + ?Sized>(&mut self, pos: Vec2, options: &ParticleOptions, rng: &mut R) {
        *self = Self::new(pos, options, rng);
    }

    /// Advance by `dt_ms` inside a `bounds`-sized screen
    pub fn update<R: Rng + ?Sized>(&mut self, dt_ms: f32, bounds: Vec2, rng: &mut R) {
        if !self.active {
            return;
        }
        let dt_ms = sanitize(dt_ms);
        let k = frame_scale(dt_ms);

        // Physics
        self.vel += self.acceleration * k;
        self.vel.y += self.gravity * k;
        self.vel *= self.friction.powf(k);
        self.pos += self.vel * k;

        self.elapsed_ms += dt_ms;
        if self.elapsed_ms >= self.lifetime_ms {
            self.active = false;
            return;
        }

        let progress = self.life_progress();
        if self.fade_out {
            self.alpha = self.start_alpha * (1.0 - progress);
        }
        if self.shrink {
            self.size = self.start_size + (self.end_size - self.start_size) * progress;
        }

        match self.kind {
            ParticleKind::Explosion => {
                self.size = self.start_size * (1.0 - progress * progress);
            }
            ParticleKind::Trail => {
                self.size = self.start_size * (1.0 - progress * 0.5);
            }
            ParticleKind::Spark => {
                if rng.random::<f32>() < SPARK_FLICKER_CHANCE {
                    self.alpha = (self.alpha * rand_between(rng, 0.5, 1.5)).clamp(0.0, 255.0);
                }
            }
            ParticleKind::Smoke => {
                self.vel.y -= 0.02 * k;
                self.size = self.start_size * (1.0 + progress * 0.5);
            }
            _ => {}
        }

        self.handle_bounds(bounds);
    }

    fn handle_bounds(&mut self, bounds: Vec2) {
        if self.bounce > 0.0 {
            let mut bounced = false;
            if self.pos.x <= 0.0 || self.pos.x >= bounds.x {
                self.vel.x *= -self.bounce;
                self.pos.x = self.pos.x.clamp(0.0, bounds.x);
                bounced = true;
            }
            if self.pos.y <= 0.0 || self.pos.y >= bounds.y {
                self.vel.y *= -self.bounce;
                self.pos.y = self.pos.y.clamp(0.0, bounds.y);
                bounced = true;
            }
            if bounced {
                self.bounce *= self.bounce_decay;
                if self.bounce < MIN_BOUNCE {
                    self.bounce = 0.0;
                }
                if self.vel.x.abs() < self.min_bounce_velocity {
                    self.vel.x = 0.0;
                }
                if self.vel.y.abs() < self.min_bounce_velocity {
                    self.vel.y = 0.0;
                }
            }
        } else if !self.is_on_screen(bounds, OFFSCREEN_MARGIN) {
            self.active = false;
        }
    }

    /// Draw the particle; `glow_enabled` is the global glow switch
    pub fn draw(&self, ctx: &mut dyn DrawContext, glow_enabled: bool) {
        if !self.active || self.alpha <= 0.0 || self.size <= 0.0 {
            return;
        }

        ctx.push();

        if self.glow && glow_enabled {
            ctx.set_blend(BlendMode::Additive);
            for i in 1..=3 {
                let layer = i as f32;
                let color = rgba_from_bytes(self.color, self.alpha * 0.3 / layer);
                ctx.fill_circle(self.pos, self.size * layer / 2.0, color);
            }
            ctx.set_blend(BlendMode::Alpha);
        }

        let color = rgba_from_bytes(self.color, self.alpha);
        match self.kind {
            ParticleKind::Square => {
                let half = Vec2::splat(self.size / 2.0);
                ctx.fill_rect(self.pos - half, Vec2::splat(self.size), color);
            }
            ParticleKind::Line => {
                ctx.line(self.pos - self.vel * 2.0, self.pos, self.size / 2.0, color);
            }
            ParticleKind::Star => {
                let points = shapes::star_points(self.pos, self.size, self.size * 0.4);
                ctx.fill_polygon(&points, color);
            }
            _ => ctx.fill_circle(self.pos, self.size / 2.0, color),
        }

        ctx.pop();
    }

    /// Inside the screen grown by `margin` on every side
    pub fn is_on_screen(&self, bounds: Vec2, margin: f32) -> bool {
        self.pos.x > -margin
            && self.pos.x < bounds.x + margin
            && self.pos.y > -margin
            && self.pos.y < bounds.y + margin
    }

    pub fn distance_from(&self, point: Vec2) -> f32 {
        self.pos.distance(point)
    }

    /// Elapsed fraction of the lifetime, in [0, 1]
    pub fn life_progress(&self) -> f32 {
        if self.lifetime_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.lifetime_ms).clamp(0.0, 1.0)
        }
    }

    pub fn set_velocity(&mut self, vel: Vec2) {
        self.vel = finite_or_zero(vel);
    }

    pub fn set_acceleration(&mut self, acceleration: Vec2) {
        self.acceleration = finite_or_zero(acceleration);
    }

    pub fn set_color(&mut self, color: [f32; 3]) {
        self.color = color.map(|c| c.clamp(0.0, 255.0));
    }

    pub fn extend_life(&mut self, extra_ms: f32) {
        self.lifetime_ms += sanitize(extra_ms);
    }
}

impl crate::Renderable for Particle {
    fn render(&self, ctx: &mut dyn DrawContext) {
        self.draw(ctx, true);
    }
}

fn initial_velocity<R: Rng + ?Sized>(options: &ParticleOptions, rng: &mut R) -> Vec2 {
    match options.vel {
        Some(vel) => finite_or_zero(vel),
        None => Vec2::new(rand_between(rng, -2.0, 2.0), rand_between(rng, -2.0, 2.0)),
    }
}

fn finite_or_zero(v: Vec2) -> Vec2 {
    if v.is_finite() { v } else { Vec2::ZERO }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FRAME_MS, SCREEN_HEIGHT, SCREEN_WIDTH};
    use crate::renderer::VertexCanvas;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const BOUNDS: Vec2 = Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT);

    fn still() -> ParticleOptions {
        ParticleOptions {
            vel: Some(Vec2::ZERO),
            friction: 1.0,
            gravity: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_expires_at_lifetime() {
        let mut rng = Pcg32::seed_from_u64(1);
        let opts = ParticleOptions {
            lifetime_ms: 100.0,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(400.0, 300.0), &opts, &mut rng);

        p.update(60.0, BOUNDS, &mut rng);
        assert!(p.active);
        p.update(39.0, BOUNDS, &mut rng);
        assert!(p.active);
        p.update(1.0, BOUNDS, &mut rng);
        assert!(!p.active);

        // Stays dead
        p.update(10.0, BOUNDS, &mut rng);
        assert!(!p.active);
    }

    #[test]
    fn test_gravity_is_damped_by_friction() {
        let mut rng = Pcg32::seed_from_u64(1);
        let opts = ParticleOptions {
            friction: 0.5,
            gravity: 1.0,
            ..still()
        };
        let start = Vec2::new(400.0, 300.0);
        let mut p = Particle::new(start, &opts, &mut rng);
        p.update(FRAME_MS, BOUNDS, &mut rng);
        assert!((p.vel.y - 0.5).abs() < 1e-5, "vel {}", p.vel.y);
        assert!((p.pos.y - start.y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_reset_matches_fresh() {
        let mut rng = Pcg32::seed_from_u64(2);
        let opts = ParticleOptions {
            vel: Some(Vec2::new(1.0, -3.0)),
            kind: ParticleKind::Smoke,
            color: [10.0, 20.0, 30.0],
            glow: true,
            ..Default::default()
        };
        let mut recycled = Particle::new(
            Vec2::new(5.0, 5.0),
            &ParticleOptions {
                bounce: 0.7,
                kind: ParticleKind::Star,
                ..Default::default()
            },
            &mut rng,
        );
        for _ in 0..20 {
            recycled.update(FRAME_MS, BOUNDS, &mut rng);
        }
        recycled.serial = 99;

        recycled.reset(Vec2::new(100.0, 200.0), &opts, &mut rng);
        let fresh = Particle::new(Vec2::new(100.0, 200.0), &opts, &mut rng);
        assert_eq!(recycled, fresh);
    }

    #[test]
    fn test_fade_and_shrink() {
        let mut rng = Pcg32::seed_from_u64(3);
        let opts = ParticleOptions {
            lifetime_ms: 1000.0,
            size: 10.0,
            end_size: 2.0,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(400.0, 300.0), &opts, &mut rng);
        p.update(500.0, BOUNDS, &mut rng);
        assert!((p.alpha - 127.5).abs() < 1e-3);
        assert!((p.size - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_explosion_shrinks_quadratically() {
        let mut rng = Pcg32::seed_from_u64(4);
        let opts = ParticleOptions {
            lifetime_ms: 1000.0,
            size: 8.0,
            kind: ParticleKind::Explosion,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(400.0, 300.0), &opts, &mut rng);
        p.update(500.0, BOUNDS, &mut rng);
        assert!((p.size - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_smoke_rises_and_grows() {
        let mut rng = Pcg32::seed_from_u64(5);
        let opts = ParticleOptions {
            lifetime_ms: 1000.0,
            size: 4.0,
            kind: ParticleKind::Smoke,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(400.0, 300.0), &opts, &mut rng);
        for _ in 0..10 {
            p.update(FRAME_MS, BOUNDS, &mut rng);
        }
        assert!(p.vel.y < 0.0);
        assert!(p.size > 4.0);
    }

    #[test]
    fn test_spark_alpha_stays_in_range() {
        let mut rng = Pcg32::seed_from_u64(6);
        let opts = ParticleOptions {
            lifetime_ms: 10_000.0,
            kind: ParticleKind::Spark,
            fade_out: false,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(400.0, 300.0), &opts, &mut rng);
        for _ in 0..500 {
            p.update(FRAME_MS, BOUNDS, &mut rng);
            assert!((0.0..=255.0).contains(&p.alpha));
        }
    }

    #[test]
    fn test_leaves_screen_past_margin() {
        let mut rng = Pcg32::seed_from_u64(7);
        let opts = ParticleOptions {
            vel: Some(Vec2::new(-10.0, 0.0)),
            lifetime_ms: 10_000.0,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(5.0, 300.0), &opts, &mut rng);
        // Just outside the edge is still alive
        p.update(FRAME_MS, BOUNDS, &mut rng);
        assert!(p.active);
        assert!(p.pos.x < 0.0);
        for _ in 0..10 {
            p.update(FRAME_MS, BOUNDS, &mut rng);
        }
        assert!(!p.active);
    }

    #[test]
    fn test_bounce_reflects_and_decays() {
        let mut rng = Pcg32::seed_from_u64(8);
        let opts = ParticleOptions {
            vel: Some(Vec2::new(0.0, 10.0)),
            lifetime_ms: 10_000.0,
            bounce: 0.8,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(400.0, 595.0), &opts, &mut rng);
        p.update(FRAME_MS, BOUNDS, &mut rng);
        assert!(p.active);
        assert_eq!(p.pos.y, SCREEN_HEIGHT);
        assert!((p.vel.y + 8.0).abs() < 1e-4);
        assert!((p.bounce - 0.64).abs() < 1e-6);
    }

    #[test]
    fn test_bounce_spends_out() {
        let mut rng = Pcg32::seed_from_u64(9);
        let opts = ParticleOptions {
            vel: Some(Vec2::new(0.0, 0.3)),
            lifetime_ms: 10_000.0,
            bounce: 0.11,
            ..still()
        };
        let mut p = Particle::new(Vec2::new(400.0, 599.9), &opts, &mut rng);
        p.update(FRAME_MS, BOUNDS, &mut rng);
        assert_eq!(p.bounce, 0.0);
        assert_eq!(p.vel.y, 0.0);
    }

    #[test]
    fn test_malformed_options_are_clamped() {
        let mut rng = Pcg32::seed_from_u64(10);
        let opts = ParticleOptions {
            vel: Some(Vec2::new(f32::NAN, 1.0)),
            lifetime_ms: -5.0,
            size: f32::NAN,
            color: [300.0, -4.0, 128.0],
            ..Default::default()
        };
        let mut p = Particle::new(Vec2::ZERO, &opts, &mut rng);
        assert_eq!(p.vel, Vec2::ZERO);
        assert_eq!(p.size, 0.0);
        assert_eq!(p.color, [255.0, 0.0, 128.0]);
        p.update(FRAME_MS, BOUNDS, &mut rng);
        assert!(!p.active);
    }

    #[test]
    fn test_draw_skips_invisible() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut p = Particle::new(Vec2::new(10.0, 10.0), &still(), &mut rng);
        let mut canvas = VertexCanvas::new();

        p.draw(&mut canvas, true);
        assert!(canvas.vertex_count() > 0);

        canvas.clear();
        p.alpha = 0.0;
        p.draw(&mut canvas, true);
        assert_eq!(canvas.vertex_count(), 0);
        assert_eq!(canvas.depth(), 0);
    }

    #[test]
    fn test_glow_adds_layers() {
        let mut rng = Pcg32::seed_from_u64(12);
        let opts = ParticleOptions {
            glow: true,
            ..still()
        };
        let p = Particle::new(Vec2::new(10.0, 10.0), &opts, &mut rng);

        let mut plain = VertexCanvas::new();
        p.draw(&mut plain, false);
        let mut glowing = VertexCanvas::new();
        p.draw(&mut glowing, true);
        assert!(glowing.vertex_count() > plain.vertex_count());
        assert!(glowing.batches().iter().any(|b| b.blend == BlendMode::Additive));
    }

    #[test]
    fn test_helpers() {
        let mut rng = Pcg32::seed_from_u64(13);
        let mut p = Particle::new(Vec2::new(3.0, 4.0), &still(), &mut rng);
        assert_eq!(p.distance_from(Vec2::ZERO), 5.0);
        p.extend_life(-10.0);
        assert_eq!(p.lifetime_ms, 500.0);
        p.extend_life(100.0);
        assert_eq!(p.lifetime_ms, 600.0);
        p.set_color([999.0, 0.0, 0.0]);
        assert_eq!(p.color[0], 255.0);
        assert!(p.is_on_screen(BOUNDS, 0.0));
        assert_eq!(p.life_progress(), 0.0);
    }
}
