//! Frame driver
//!
//! Owns the effect manager, camera controller and discovery system, steps
//! them in a fixed order and turns gameplay events into effect bursts.

use glam::Vec2;

use crate::camera::CameraEffectController;
use crate::config::FxConfig;
use crate::consts::MAX_FRAME_MS;
use crate::discovery::DiscoverySystem;
use crate::fx::{Burst, EffectManager};
use crate::platform::Clock;
use crate::renderer::DrawContext;
use crate::renderer::vertex::colors;
use crate::settings::Settings;
use crate::{Renderable, Updatable, sanitize};

/// Explosion intensity for the wave-clear burst
const WAVE_CLEAR_INTENSITY: f32 = 3.0;

/// Timing of one driver step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Clamped wall delta; effects run on this
    pub dt_ms: f32,
    /// `dt_ms` scaled by slow motion / freeze; gameplay should run on this
    pub world_dt_ms: f32,
}

/// What a destroyed enemy set off
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KillReport {
    pub particles: usize,
    pub wave_cleared: bool,
}

pub struct FxStack {
    config: FxConfig,
    effects: EffectManager,
    camera: CameraEffectController,
    discovery: DiscoverySystem,
    last_ms: Option<f64>,
    time: FrameTime,
}

impl FxStack {
    pub fn new(config: FxConfig) -> Self {
        log::info!("Starting effect stack (seed {:#x})", config.seed);
        Self {
            effects: EffectManager::new(&config),
            camera: CameraEffectController::new(&config),
            discovery: DiscoverySystem::new(&config),
            config,
            last_ms: None,
            time: FrameTime::default(),
        }
    }

    /// Build from engine defaults folded with player preferences
    pub fn with_settings(settings: &Settings) -> Self {
        let mut config = FxConfig::default();
        settings.apply_to(&mut config);
        Self::new(config)
    }

    /// Re-apply player preferences at runtime
    pub fn apply_settings(&mut self, settings: &Settings) {
        settings.apply_to(&mut self.config);
        self.effects.update_settings(&self.config.feedback);
        self.camera.update_settings(&self.config.feedback);
        log::debug!("Applied settings (quality {})", settings.quality.as_str());
    }

    /// Read the clock and advance one frame. The first call only primes the
    /// clock and steps by zero.
    pub fn tick(&mut self, clock: &dyn Clock) -> FrameTime {
        let now = clock.now_ms();
        let dt_ms = match self.last_ms {
            Some(last) => sanitize((now - last) as f32).min(MAX_FRAME_MS),
            None => 0.0,
        };
        self.last_ms = Some(now);
        self.step(dt_ms)
    }

    /// Advance by an explicit delta (clamped like [`FxStack::tick`])
    pub fn step(&mut self, dt_ms: f32) -> FrameTime {
        let dt_ms = sanitize(dt_ms).min(MAX_FRAME_MS);

        self.effects.update(dt_ms);
        self.camera.update(dt_ms);
        let world_dt_ms = dt_ms * self.camera.time_scale();
        self.discovery.update(world_dt_ms);

        self.time = FrameTime { dt_ms, world_dt_ms };
        self.time
    }

    /// Draw one frame: camera transform, the host's world, particles, post
    /// effects, then the power-up overlay in screen space.
    pub fn render<C, F>(&self, ctx: &mut C, draw_world: F)
    where
        C: DrawContext,
        F: FnOnce(&mut C),
    {
        {
            let mut pass = self.camera.begin_pass(ctx);
            draw_world(&mut *pass);
            self.effects.draw(&mut *pass);
        }
        self.discovery.render(ctx);
    }

    pub fn on_shot_fired(&mut self, pos: Vec2, direction: Vec2) -> Burst {
        self.effects
            .create_muzzle_flash(pos, direction)
            .forward_shake(&mut self.camera)
    }

    pub fn on_player_moved(&mut self, pos: Vec2, velocity: Vec2) -> Burst {
        self.effects
            .create_movement_trail(pos, velocity, colors::TRAIL)
            .forward_shake(&mut self.camera)
    }

    pub fn on_enemy_hit(&mut self, pos: Vec2, color: [f32; 3]) -> Burst {
        self.effects
            .create_hit_effect(pos, color)
            .forward_shake(&mut self.camera)
    }

    /// Count the kill and play its feedback. `combo` is the running combo
    /// including this kill.
    pub fn on_enemy_destroyed(&mut self, pos: Vec2, color: [f32; 3], combo: u32) -> KillReport {
        let mut report = KillReport::default();

        if self.discovery.on_enemy_destroyed() {
            report.wave_cleared = true;
            let center = Vec2::new(self.config.screen.width, self.config.screen.height) / 2.0;
            let burst = self
                .effects
                .create_explosion(center, WAVE_CLEAR_INTENSITY, colors::WAVE_CLEAR)
                .forward_shake(&mut self.camera);
            report.particles += burst.spawned;
        }

        let intensity = (combo as f32 / 5.0).min(2.0);
        let burst = self
            .effects
            .create_explosion(pos, intensity, color)
            .forward_shake(&mut self.camera);
        report.particles += burst.spawned;

        if combo > 1 {
            let burst = self
                .effects
                .create_combo_effect(pos, combo)
                .forward_shake(&mut self.camera);
            report.particles += burst.spawned;
            self.camera.trigger_hit_stop(combo);
        }

        report
    }

    /// Forward a number key (1-based) to the open power-up selection
    pub fn select_power_up(&mut self, slot: usize) -> bool {
        self.discovery.select_by_index(slot)
    }

    /// Drop all transient effects and restart the wave cycle
    pub fn reset(&mut self) {
        self.effects.clear_all_effects();
        self.camera.reset_all_effects();
        self.discovery.reset();
        self.last_ms = None;
        self.time = FrameTime::default();
    }

    pub fn config(&self) -> &FxConfig {
        &self.config
    }

    pub fn effects(&self) -> &EffectManager {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectManager {
        &mut self.effects
    }

    pub fn camera(&self) -> &CameraEffectController {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraEffectController {
        &mut self.camera
    }

    pub fn discovery(&self) -> &DiscoverySystem {
        &self.discovery
    }

    pub fn discovery_mut(&mut self) -> &mut DiscoverySystem {
        &mut self.discovery
    }

    /// Timing of the last step
    pub fn frame_time(&self) -> FrameTime {
        self.time
    }
}
