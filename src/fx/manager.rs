//! Effect manager
//!
//! Owns the active particle list (creation order) and a bounded LIFO reuse
//! pool. Composite triggers spawn factory batches and hand back the shake
//! they want as a [`Burst`]; the caller decides which [`ShakeSink`] gets it.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::factory::{self, ParticleSpawn};
use super::particle::{Particle, ParticleKind, ParticleOptions};
use crate::config::{FeedbackConfig, FxConfig};
use crate::renderer::DrawContext;
use crate::{Renderable, Updatable, jitter, polar_to_cartesian, rand_between, sanitize, sanitize_input};

/// Small kick for a single bullet impact
const HIT_SHAKE: ShakeRequest = ShakeRequest {
    intensity: 1.5,
    duration_ms: 80.0,
};
const MUZZLE_SHAKE: ShakeRequest = ShakeRequest {
    intensity: 2.0,
    duration_ms: 100.0,
};
const HIT_SPARKS: u32 = 4;
const COMBO_SHAKE_MS: f32 = 150.0;

/// A requested screen shake
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeRequest {
    pub intensity: f32,
    pub duration_ms: f32,
}

/// Anything that can perform a screen shake
pub trait ShakeSink {
    fn shake(&mut self, intensity: f32, duration_ms: f32);
}

/// Outcome of a composite trigger
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Burst {
    /// Particles actually inserted
    pub spawned: usize,
    pub shake: Option<ShakeRequest>,
}

impl Burst {
    /// Hand the requested shake (if any) to `sink`
    pub fn forward_shake(self, sink: &mut dyn ShakeSink) -> Self {
        if let Some(req) = self.shake {
            sink.shake(req.intensity, req.duration_ms);
        }
        self
    }
}

/// Local screen shake, applied around the particle pass when no camera
/// controller is in use
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenShake {
    pub active: bool,
    pub intensity: f32,
    pub duration_ms: f32,
    pub start_ms: f64,
    pub offset: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectStats {
    pub created: u64,
    pub destroyed: u64,
    pub effects_triggered: u64,
}

/// Particle and shake engine
#[derive(Debug)]
pub struct EffectManager {
    config: FeedbackConfig,
    bounds: Vec2,
    particles: Vec<Particle>,
    pool: Vec<Particle>,
    /// Reused between updates for order-preserving removal
    scratch: Vec<Particle>,
    shake: ScreenShake,
    stats: EffectStats,
    rng: Pcg32,
    now_ms: f64,
    frame: u64,
    next_serial: u64,
}

impl EffectManager {
    pub fn new(config: &FxConfig) -> Self {
        Self {
            config: config.feedback.clone(),
            bounds: Vec2::new(config.screen.width, config.screen.height),
            particles: Vec::with_capacity(config.feedback.max_particles),
            pool: Vec::with_capacity(config.feedback.pool_capacity),
            scratch: Vec::new(),
            shake: ScreenShake::default(),
            stats: EffectStats::default(),
            rng: Pcg32::seed_from_u64(config.seed),
            now_ms: 0.0,
            frame: 0,
            next_serial: 0,
        }
    }

    /// Insert one particle, reusing a pooled instance when possible.
    ///
    /// Returns `None` when particles are disabled.
    pub fn add_particle(&mut self, pos: Vec2, options: &ParticleOptions) -> Option<&mut Particle> {
        if !self.config.particles_enabled {
            return None;
        }

        let mut particle = match self.pool.pop() {
            Some(mut recycled) => {
                recycled.reset(pos, options, &mut self.rng);
                recycled
            }
            None => Particle::new(pos, options, &mut self.rng),
        };
        particle.serial = self.next_serial;
        self.next_serial += 1;

        self.particles.push(particle);
        self.stats.created += 1;
        self.particles.last_mut()
    }

    /// Insert a batch; returns how many were added
    pub fn add_particles<I>(&mut self, spawns: I) -> usize
    where
        I: IntoIterator<Item = ParticleSpawn>,
    {
        let mut added = 0;
        for spawn in spawns {
            if self.add_particle(spawn.pos, &spawn.options).is_none() {
                break;
            }
            added += 1;
        }
        added
    }

    /// Draw every active particle, lowest depth first
    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        ctx.push();
        if self.shake.active {
            ctx.translate(self.shake.offset);
        }

        let mut ordered: Vec<&Particle> = self.particles.iter().filter(|p| p.active).collect();
        ordered.sort_by_key(|p| p.depth);
        for particle in ordered {
            particle.draw(ctx, self.config.glow_enabled);
        }

        ctx.pop();
    }

    /// Start (or restart) the local shake
    pub fn trigger_screen_shake(&mut self, intensity: f32, duration_ms: f32) {
        if !self.config.screen_shake_enabled {
            return;
        }
        self.shake = ScreenShake {
            active: true,
            intensity: sanitize_input("shake intensity", intensity),
            duration_ms: sanitize_input("shake duration", duration_ms),
            start_ms: self.now_ms,
            offset: Vec2::ZERO,
        };
        self.stats.effects_triggered += 1;
    }

    /// Radial burst scaled by `intensity`
    #[must_use = "forward the shake or drop it explicitly"]
    pub fn create_explosion(&mut self, pos: Vec2, intensity: f32, color: [f32; 3]) -> Burst {
        let intensity = sanitize_input("explosion intensity", intensity);
        let count = ((self.config.explosion_count as f32 * intensity).floor() as u32).min(self.burst_limit());
        let batch = factory::explosion(pos, count, color, &mut self.rng);
        let spawned = self.add_particles(batch);
        self.finish_trigger(
            spawned,
            ShakeRequest {
                intensity: self.config.shake_intensity * intensity,
                duration_ms: self.config.shake_duration_ms,
            },
        )
    }

    #[must_use = "forward the shake or drop it explicitly"]
    pub fn create_muzzle_flash(&mut self, pos: Vec2, direction: Vec2) -> Burst {
        let batch = factory::muzzle_flash(
            pos,
            direction,
            self.config.muzzle_flash_count,
            self.config.muzzle_flash_lifetime_ms,
            &mut self.rng,
        );
        let spawned = self.add_particles(batch);
        self.finish_trigger(spawned, MUZZLE_SHAKE)
    }

    /// Emits one trail particle every `trail_interval_frames` frames
    #[must_use = "forward the shake or drop it explicitly"]
    pub fn create_movement_trail(&mut self, pos: Vec2, velocity: Vec2, color: [f32; 3]) -> Burst {
        let interval = self.config.trail_interval_frames.max(1);
        if self.frame % interval != 0 {
            return Burst::default();
        }
        let spawn = factory::trail(pos, velocity, color, self.config.trail_lifetime_ms, &mut self.rng);
        Burst {
            spawned: self.add_particles([spawn]),
            shake: None,
        }
    }

    #[must_use = "forward the shake or drop it explicitly"]
    pub fn create_hit_effect(&mut self, pos: Vec2, color: [f32; 3]) -> Burst {
        let mut spawned = 0;
        for i in 0..HIT_SPARKS {
            let angle = i as f32 / HIT_SPARKS as f32 * std::f32::consts::TAU;
            let options = ParticleOptions {
                vel: Some(polar_to_cartesian(rand_between(&mut self.rng, 1.0, 3.0), angle)),
                kind: ParticleKind::Spark,
                color,
                size: rand_between(&mut self.rng, 2.0, 5.0),
                lifetime_ms: 200.0,
                glow: true,
                ..Default::default()
            };
            if self.add_particle(pos, &options).is_some() {
                spawned += 1;
            }
        }
        self.finish_trigger(spawned, HIT_SHAKE)
    }

    /// Star burst whose size, speed and shake grow with the combo
    #[must_use = "forward the shake or drop it explicitly"]
    pub fn create_combo_effect(&mut self, pos: Vec2, combo: u32) -> Burst {
        if !self.config.combo_effects_enabled {
            return Burst::default();
        }

        let combo_f = combo as f32;
        let scale = (combo_f / 10.0).min(2.0);
        let color = [
            255.0,
            (255.0 - combo_f * 10.0).clamp(0.0, 255.0),
            (100.0 + combo_f * 5.0).clamp(0.0, 255.0),
        ];
        let count = 5u32.saturating_add(combo).min(self.burst_limit());
        let lifetime_ms = 400.0 + combo_f * 20.0;

        let mut spawned = 0;
        for i in 0..count {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let speed = rand_between(&mut self.rng, 2.0, 5.0) * scale;
            let options = ParticleOptions {
                vel: Some(polar_to_cartesian(speed, angle)),
                kind: ParticleKind::Star,
                color,
                size: rand_between(&mut self.rng, 3.0, 8.0) * scale,
                lifetime_ms,
                glow: true,
                ..Default::default()
            };
            if self.add_particle(pos, &options).is_none() {
                break;
            }
            spawned += 1;
        }

        self.finish_trigger(
            spawned,
            ShakeRequest {
                intensity: 3.0 * scale,
                duration_ms: COMBO_SHAKE_MS,
            },
        )
    }

    /// Largest batch worth building; anything beyond the cap is evicted anyway
    fn burst_limit(&self) -> u32 {
        u32::try_from(self.config.max_particles).unwrap_or(u32::MAX)
    }

    fn finish_trigger(&mut self, spawned: usize, shake: ShakeRequest) -> Burst {
        self.stats.effects_triggered += 1;
        Burst {
            spawned,
            shake: self.config.screen_shake_enabled.then_some(shake),
        }
    }

    /// Return every particle to the pool and stop the local shake
    pub fn clear_all_effects(&mut self) {
        let cap = self.config.pool_capacity;
        for particle in self.particles.drain(..) {
            recycle(&mut self.pool, cap, particle);
        }
        self.shake.active = false;
        self.shake.offset = Vec2::ZERO;
    }

    fn update_shake(&mut self) {
        if !self.shake.active {
            self.shake.offset = Vec2::ZERO;
            return;
        }

        let elapsed = (self.now_ms - self.shake.start_ms) as f32;
        let progress = if self.shake.duration_ms > 0.0 {
            elapsed / self.shake.duration_ms
        } else {
            1.0
        };

        if progress >= 1.0 {
            self.shake.active = false;
            self.shake.offset = Vec2::ZERO;
        } else {
            let current = self.shake.intensity * (1.0 - progress);
            self.shake.offset = Vec2::new(jitter(&mut self.rng, current), jitter(&mut self.rng, current));
        }
    }

    fn update_particles(&mut self, dt_ms: f32) {
        let cap = self.config.pool_capacity;
        for particle in &mut self.particles {
            particle.update(dt_ms, self.bounds, &mut self.rng);
        }

        std::mem::swap(&mut self.particles, &mut self.scratch);
        for particle in self.scratch.drain(..) {
            if particle.active {
                self.particles.push(particle);
            } else {
                self.stats.destroyed += 1;
                recycle(&mut self.pool, cap, particle);
            }
        }
    }

    /// Evict oldest particles until the population cap holds
    fn enforce_cap(&mut self) {
        let max = self.config.max_particles;
        if self.particles.len() <= max {
            return;
        }
        let excess = self.particles.len() - max;
        let cap = self.config.pool_capacity;
        for particle in self.particles.drain(..excess) {
            recycle(&mut self.pool, cap, particle);
        }
        self.stats.destroyed += excess as u64;
        log::debug!("Evicted {} oldest particles (cap {})", excess, max);
    }

    /// Swap in new feedback settings; a lowered cap applies on the next update
    pub fn update_settings(&mut self, config: &FeedbackConfig) {
        self.config = config.clone();
        self.pool.truncate(self.config.pool_capacity);
        if !self.config.screen_shake_enabled {
            self.shake.active = false;
            self.shake.offset = Vec2::ZERO;
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn active_particle_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn screen_shake_status(&self) -> ScreenShake {
        self.shake
    }

    pub fn stats(&self) -> EffectStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = EffectStats::default();
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    /// Frames advanced so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl Updatable for EffectManager {
    fn update(&mut self, dt_ms: f32) {
        let dt_ms = sanitize(dt_ms);
        self.now_ms += dt_ms as f64;
        self.frame += 1;

        self.update_particles(dt_ms);
        self.update_shake();
        self.enforce_cap();
    }
}

impl Renderable for EffectManager {
    fn render(&self, ctx: &mut dyn DrawContext) {
        self.draw(ctx);
    }
}

impl ShakeSink for EffectManager {
    fn shake(&mut self, intensity: f32, duration_ms: f32) {
        self.trigger_screen_shake(intensity, duration_ms);
    }
}

/// Pool a retired particle, dropping it when the pool is full
fn recycle(pool: &mut Vec<Particle>, cap: usize, mut particle: Particle) {
    if pool.len() < cap {
        particle.active = false;
        pool.push(particle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;
    use crate::renderer::VertexCanvas;
    use crate::renderer::vertex::colors;
    use proptest::prelude::*;

    fn manager_with(feedback: FeedbackConfig) -> EffectManager {
        let config = FxConfig {
            feedback,
            ..Default::default()
        };
        EffectManager::new(&config)
    }

    fn long_lived() -> ParticleOptions {
        ParticleOptions {
            vel: Some(Vec2::ZERO),
            gravity: 0.0,
            lifetime_ms: 60_000.0,
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct RecordingSink(Vec<(f32, f32)>);

    impl ShakeSink for RecordingSink {
        fn shake(&mut self, intensity: f32, duration_ms: f32) {
            self.0.push((intensity, duration_ms));
        }
    }

    #[test]
    fn test_add_particle_disabled_returns_none() {
        let mut fx = manager_with(FeedbackConfig {
            particles_enabled: false,
            ..Default::default()
        });
        assert!(fx.add_particle(Vec2::ZERO, &long_lived()).is_none());
        assert_eq!(fx.particle_count(), 0);
        assert_eq!(fx.stats().created, 0);
    }

    #[test]
    fn test_expired_particles_go_to_pool() {
        let mut fx = manager_with(FeedbackConfig::default());
        let opts = ParticleOptions {
            lifetime_ms: 10.0,
            ..long_lived()
        };
        for _ in 0..5 {
            fx.add_particle(Vec2::new(100.0, 100.0), &opts);
        }
        fx.update(FRAME_MS);
        assert_eq!(fx.particle_count(), 0);
        assert_eq!(fx.pool_size(), 5);
        assert_eq!(fx.stats().destroyed, 5);
    }

    #[test]
    fn test_expired_particle_never_returns() {
        let mut fx = manager_with(FeedbackConfig::default());
        let opts = ParticleOptions {
            lifetime_ms: 50.0,
            ..long_lived()
        };
        let serial = fx.add_particle(Vec2::new(10.0, 10.0), &opts).map(|p| p.serial);
        for _ in 0..10 {
            fx.update(FRAME_MS);
            assert!(fx.particles().iter().all(|p| p.active));
        }
        assert!(fx.particles().iter().all(|p| Some(p.serial) != serial));
    }

    #[test]
    fn test_pool_is_bounded() {
        let mut fx = manager_with(FeedbackConfig {
            pool_capacity: 3,
            ..Default::default()
        });
        for _ in 0..10 {
            fx.add_particle(Vec2::new(10.0, 10.0), &long_lived());
        }
        fx.clear_all_effects();
        assert_eq!(fx.particle_count(), 0);
        assert_eq!(fx.pool_size(), 3);
    }

    #[test]
    fn test_pooled_particle_is_reused() {
        let mut fx = manager_with(FeedbackConfig::default());
        for _ in 0..3 {
            fx.add_particle(Vec2::new(10.0, 10.0), &long_lived());
        }
        fx.clear_all_effects();
        assert_eq!(fx.pool_size(), 3);

        let reused = fx.add_particle(Vec2::new(1.0, 2.0), &long_lived()).map(|p| (p.pos, p.active));
        assert_eq!(reused, Some((Vec2::new(1.0, 2.0), true)));
        assert_eq!(fx.pool_size(), 2);
        assert_eq!(fx.stats().created, 4);
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let mut fx = manager_with(FeedbackConfig {
            max_particles: 4,
            ..Default::default()
        });
        for _ in 0..7 {
            fx.add_particle(Vec2::new(10.0, 10.0), &long_lived());
        }
        fx.update(FRAME_MS);

        let serials: Vec<u64> = fx.particles().iter().map(|p| p.serial).collect();
        assert_eq!(serials, vec![3, 4, 5, 6]);
        assert_eq!(fx.stats().destroyed, 3);
    }

    #[test]
    fn test_render_sorted_by_depth() {
        let mut fx = manager_with(FeedbackConfig {
            glow_enabled: false,
            ..Default::default()
        });
        for depth in [2, -1, 0] {
            fx.add_particle(
                Vec2::new(10.0 * (depth + 5) as f32, 10.0),
                &ParticleOptions {
                    depth,
                    ..long_lived()
                },
            );
        }
        let mut canvas = VertexCanvas::new();
        fx.render(&mut canvas);
        assert_eq!(canvas.depth(), 0);

        // Each circle is a centred fan; its first vertex is the centre
        let per_circle = canvas.vertex_count() / 3;
        let vertices = &canvas.batches()[0].vertices;
        let xs: Vec<f32> = (0..3).map(|i| vertices[i * per_circle].position[0]).collect();
        assert_eq!(xs, vec![40.0, 50.0, 70.0]);
    }

    #[test]
    fn test_explosion_scales_with_intensity() {
        let mut fx = manager_with(FeedbackConfig::default());
        let burst = fx.create_explosion(Vec2::new(400.0, 300.0), 1.5, colors::EXPLOSION);
        assert_eq!(burst.spawned, 18);
        assert_eq!(
            burst.shake,
            Some(ShakeRequest {
                intensity: 7.5,
                duration_ms: 200.0
            })
        );

        let burst = fx.create_explosion(Vec2::new(400.0, 300.0), f32::NAN, colors::EXPLOSION);
        assert_eq!(burst.spawned, 0);
    }

    #[test]
    fn test_shake_disabled_yields_no_request() {
        let mut fx = manager_with(FeedbackConfig {
            screen_shake_enabled: false,
            ..Default::default()
        });
        let burst = fx.create_muzzle_flash(Vec2::ZERO, Vec2::X);
        assert_eq!(burst.spawned, 5);
        assert!(burst.shake.is_none());
        fx.trigger_screen_shake(10.0, 100.0);
        assert!(!fx.screen_shake_status().active);
    }

    #[test]
    fn test_burst_forwards_to_sink() {
        let mut fx = manager_with(FeedbackConfig::default());
        let mut sink = RecordingSink::default();
        let burst = fx.create_hit_effect(Vec2::new(50.0, 50.0), colors::HIT).forward_shake(&mut sink);
        assert_eq!(burst.spawned, 4);
        assert_eq!(sink.0, vec![(1.5, 80.0)]);
    }

    #[test]
    fn test_forwarded_burst_can_be_dropped() {
        let mut fx = manager_with(FeedbackConfig::default());
        let mut sink = RecordingSink::default();
        fx.create_muzzle_flash(Vec2::ZERO, Vec2::X).forward_shake(&mut sink);
        fx.create_movement_trail(Vec2::ZERO, Vec2::X, colors::TRAIL).forward_shake(&mut sink);
        assert_eq!(sink.0, vec![(2.0, 100.0)]);
        assert_eq!(fx.particle_count(), 6);
    }

    #[test]
    fn test_trail_rate_limited() {
        let mut fx = manager_with(FeedbackConfig::default());
        let mut total = 0;
        for _ in 0..9 {
            total += fx.create_movement_trail(Vec2::new(100.0, 100.0), Vec2::X, colors::TRAIL).spawned;
            fx.update(FRAME_MS);
        }
        assert_eq!(total, 3);
    }

    #[test]
    fn test_combo_grows_with_count() {
        let mut fx = manager_with(FeedbackConfig::default());
        let small = fx.create_combo_effect(Vec2::new(100.0, 100.0), 0);
        let big = fx.create_combo_effect(Vec2::new(100.0, 100.0), 10);
        assert!(small.spawned < big.spawned);
        let small_shake = small.shake.map(|s| s.intensity).unwrap_or_default();
        let big_shake = big.shake.map(|s| s.intensity).unwrap_or_default();
        assert!(small_shake < big_shake);
    }

    #[test]
    fn test_combo_color_channels_clamped() {
        let mut fx = manager_with(FeedbackConfig::default());
        let _ = fx.create_combo_effect(Vec2::new(100.0, 100.0), 60);
        for p in fx.particles() {
            assert!(p.color.iter().all(|c| (0.0..=255.0).contains(c)));
            assert_eq!(p.kind, ParticleKind::Star);
        }
        assert_eq!(fx.particle_count(), 65);
    }

    #[test]
    fn test_huge_combo_is_bounded_by_cap() {
        let mut fx = manager_with(FeedbackConfig::default());
        let burst = fx.create_combo_effect(Vec2::new(100.0, 100.0), u32::MAX);
        assert_eq!(burst.spawned, fx.config().max_particles);
        let shake = burst.shake.map(|s| s.intensity).unwrap_or_default();
        assert_eq!(shake, 6.0);
    }

    #[test]
    fn test_huge_explosion_is_bounded_by_cap() {
        let mut fx = manager_with(FeedbackConfig {
            max_particles: 40,
            ..Default::default()
        });
        let burst = fx.create_explosion(Vec2::new(400.0, 300.0), 1e5, colors::EXPLOSION);
        assert_eq!(burst.spawned, 40);
        assert_eq!(fx.stats().created, 40);
    }

    #[test]
    fn test_combo_disabled() {
        let mut fx = manager_with(FeedbackConfig {
            combo_effects_enabled: false,
            ..Default::default()
        });
        assert_eq!(fx.create_combo_effect(Vec2::ZERO, 5), Burst::default());
    }

    #[test]
    fn test_zero_shake_has_zero_offset() {
        let mut fx = manager_with(FeedbackConfig::default());
        fx.trigger_screen_shake(0.0, 500.0);
        for _ in 0..40 {
            fx.update(FRAME_MS);
            assert_eq!(fx.screen_shake_status().offset, Vec2::ZERO);
        }
    }

    #[test]
    fn test_shake_decays_to_zero() {
        let mut fx = manager_with(FeedbackConfig::default());
        fx.trigger_screen_shake(10.0, 200.0);
        let mut elapsed = 0.0;
        while fx.screen_shake_status().active {
            fx.update(FRAME_MS);
            elapsed += FRAME_MS;
            let bound = 10.0 * (1.0 - elapsed / 200.0).max(0.0) + 1e-4;
            let offset = fx.screen_shake_status().offset;
            assert!(offset.x.abs() <= bound && offset.y.abs() <= bound);
        }
        assert_eq!(fx.screen_shake_status().offset, Vec2::ZERO);
        assert!(elapsed <= 200.0 + FRAME_MS);
    }

    #[test]
    fn test_malformed_shake_is_clamped() {
        let mut fx = manager_with(FeedbackConfig::default());
        fx.trigger_screen_shake(f32::NAN, -10.0);
        let status = fx.screen_shake_status();
        assert_eq!(status.intensity, 0.0);
        assert_eq!(status.duration_ms, 0.0);
        fx.update(FRAME_MS);
        assert!(!fx.screen_shake_status().active);
    }

    #[test]
    fn test_lowered_cap_applies_next_update() {
        let mut fx = manager_with(FeedbackConfig::default());
        for _ in 0..20 {
            fx.add_particle(Vec2::new(10.0, 10.0), &long_lived());
        }
        fx.update_settings(&FeedbackConfig {
            max_particles: 5,
            ..Default::default()
        });
        fx.update(FRAME_MS);
        assert_eq!(fx.particle_count(), 5);
    }

    proptest! {
        #[test]
        fn prop_population_never_exceeds_cap(
            cap in 0usize..64,
            bursts in proptest::collection::vec(0usize..40, 1..20),
        ) {
            let mut fx = manager_with(FeedbackConfig {
                max_particles: cap,
                ..Default::default()
            });
            for n in bursts {
                for _ in 0..n {
                    fx.add_particle(Vec2::new(100.0, 100.0), &long_lived());
                }
                fx.update(FRAME_MS);
                prop_assert!(fx.particle_count() <= cap);
                prop_assert!(fx.pool_size() <= fx.config().pool_capacity);
                prop_assert!(fx.particles().iter().all(|p| p.active));
            }
        }
    }
}
