//! Camera, flash, time and post effects
//!
//! All timing advances from `update(dt_ms)`; nothing is scheduled on a wall
//! clock. Shake, zoom, rotation and post-effect fades run as tweens on the
//! shared [`TweenScheduler`], animating a [`CameraRig`].

use std::ops::{Deref, DerefMut};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::easing::Easing;
use super::tween::TweenScheduler;
use crate::config::{FeedbackConfig, FxConfig};
use crate::fx::ShakeSink;
use crate::renderer::{BlendMode, DrawContext, rgba_from_bytes};
use crate::{Updatable, frame_scale, jitter, lerp, sanitize, sanitize_input};

const ZOOM_LERP: f32 = 0.1;
const ROTATION_DECAY: f32 = 0.95;
const SLOW_MOTION_LERP: f32 = 0.05;
const POST_DECAY: f32 = 0.95;
const POST_CUTOFF: f32 = 0.01;
/// Flash overlay alpha (0..=255) at intensity 1
const FLASH_ALPHA: f32 = 120.0;
const VIGNETTE_RINGS: u32 = 8;

const SHAKE_KEY: &str = "camera_shake";
const ZOOM_KEY: &str = "camera_zoom";
const ROTATION_KEY: &str = "camera_rotation";

/// Camera placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub offset: Vec2,
    pub zoom: f32,
    pub target_zoom: f32,
    pub shake: Vec2,
    pub rotation: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            target_zoom: 1.0,
            shake: Vec2::ZERO,
            rotation: 0.0,
        }
    }
}

/// Full-screen additive flash
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Flash {
    pub active: bool,
    pub color: [f32; 3],
    /// Intensity at the start of the flash
    pub peak: f32,
    /// Current intensity, `peak * (1 - progress)^2`
    pub intensity: f32,
    pub duration_ms: f32,
    pub elapsed_ms: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostEffectKind {
    Vignette,
    Scanlines,
    ChromaticAberration,
    Pixelation,
}

impl PostEffectKind {
    pub const ALL: [PostEffectKind; 4] = [
        PostEffectKind::Vignette,
        PostEffectKind::Scanlines,
        PostEffectKind::ChromaticAberration,
        PostEffectKind::Pixelation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostEffectKind::Vignette => "vignette",
            PostEffectKind::Scanlines => "scanlines",
            PostEffectKind::ChromaticAberration => "chromaticAberration",
            PostEffectKind::Pixelation => "pixelation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    fn index(self) -> usize {
        self as usize
    }

    fn fade_key(self) -> String {
        format!("{}_fade", self.as_str())
    }
}

/// One decaying overlay
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PostEffect {
    pub enabled: bool,
    pub intensity: f32,
    /// Controller time at which the eased fade-out starts
    fade_at_ms: Option<f64>,
    fade_ms: f32,
}

/// State the camera tweens animate
#[derive(Debug)]
pub struct CameraRig {
    pub camera: CameraState,
    pub flash: Flash,
    pub post: [PostEffect; 4],
    rng: Pcg32,
}

impl CameraRig {
    fn new(seed: u64) -> Self {
        Self {
            camera: CameraState::default(),
            flash: Flash::default(),
            post: [PostEffect::default(); 4],
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn post(&self, kind: PostEffectKind) -> &PostEffect {
        &self.post[kind.index()]
    }

    fn post_mut(&mut self, kind: PostEffectKind) -> &mut PostEffect {
        &mut self.post[kind.index()]
    }
}

/// Slow-motion phases, advanced once per update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowMotionPhase {
    #[default]
    Idle,
    /// Easing toward the slow factor
    Ramping,
    /// At the slow factor, waiting for the half-way point
    Holding,
    /// Easing back toward normal speed
    Releasing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlowMotion {
    pub phase: SlowMotionPhase,
    pub factor: f32,
    pub target: f32,
    pub duration_ms: f32,
    pub elapsed_ms: f32,
}

impl Default for SlowMotion {
    fn default() -> Self {
        Self {
            phase: SlowMotionPhase::Idle,
            factor: 1.0,
            target: 1.0,
            duration_ms: 0.0,
            elapsed_ms: 0.0,
        }
    }
}

impl SlowMotion {
    fn advance(&mut self, dt_ms: f32) {
        if self.phase == SlowMotionPhase::Idle {
            return;
        }
        self.elapsed_ms += dt_ms;
        let half = self.duration_ms / 2.0;

        if self.elapsed_ms >= self.duration_ms {
            *self = Self::default();
            return;
        }
        if self.elapsed_ms >= half && self.phase != SlowMotionPhase::Releasing {
            self.phase = SlowMotionPhase::Releasing;
            self.target = 1.0;
        }

        let t = 1.0 - (1.0 - SLOW_MOTION_LERP).powf(frame_scale(dt_ms));
        self.factor = lerp(self.factor, self.target, t);

        if self.phase == SlowMotionPhase::Ramping && (self.factor - self.target).abs() < 0.01 {
            self.phase = SlowMotionPhase::Holding;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Freeze {
    pub active: bool,
    pub duration_ms: f32,
    pub elapsed_ms: f32,
}

/// Snapshot for debug overlays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraStatus {
    pub zoom: f32,
    pub rotation: f32,
    pub shake: Vec2,
    pub flash_intensity: f32,
    pub slow_motion: SlowMotionPhase,
    pub time_scale: f32,
    pub frozen: bool,
    pub active_tweens: usize,
}

/// Camera and screen-space effect controller
#[derive(Debug)]
pub struct CameraEffectController {
    rig: CameraRig,
    tweens: TweenScheduler<CameraRig>,
    slow_motion: SlowMotion,
    freeze: Freeze,
    config: FeedbackConfig,
    screen: Vec2,
    now_ms: f64,
}

impl CameraEffectController {
    pub fn new(config: &FxConfig) -> Self {
        Self {
            rig: CameraRig::new(config.seed.wrapping_add(1)),
            tweens: TweenScheduler::new(),
            slow_motion: SlowMotion::default(),
            freeze: Freeze::default(),
            config: config.feedback.clone(),
            screen: Vec2::new(config.screen.width, config.screen.height),
            now_ms: 0.0,
        }
    }

    /// Decaying random offset; re-triggering restarts it
    pub fn trigger_camera_shake(&mut self, intensity: f32, duration_ms: f32) {
        if !self.config.screen_shake_enabled {
            return;
        }
        let intensity = sanitize_input("camera shake intensity", intensity);
        let duration_ms = sanitize_input("camera shake duration", duration_ms);
        self.tweens
            .animate(SHAKE_KEY, intensity, 0.0, duration_ms, Easing::Linear)
            .on_update(|rig, remaining| {
                rig.camera.shake = Vec2::new(jitter(&mut rig.rng, remaining), jitter(&mut rig.rng, remaining));
            })
            .on_complete(|rig| rig.camera.shake = Vec2::ZERO);
    }

    pub fn trigger_flash(&mut self, color: [f32; 3], duration_ms: f32, intensity: f32) {
        if !self.config.flash_enabled {
            return;
        }
        let peak = sanitize_input("flash intensity", intensity);
        self.rig.flash = Flash {
            active: true,
            color: color.map(|c| c.clamp(0.0, 255.0)),
            peak,
            intensity: peak,
            duration_ms: sanitize_input("flash duration", duration_ms),
            elapsed_ms: 0.0,
        };
    }

    /// Tween the zoom level to `target` and keep it there
    pub fn trigger_zoom(&mut self, target: f32, duration_ms: f32, easing: Easing) {
        let target = if target.is_finite() && target > 0.0 {
            target
        } else {
            log::warn!("Ignoring zoom target {}", target);
            return;
        };
        let from = self.rig.camera.zoom;
        self.tweens
            .animate(ZOOM_KEY, from, target, sanitize_input("zoom duration", duration_ms), easing)
            .on_update(|rig, zoom| {
                rig.camera.zoom = zoom;
                rig.camera.target_zoom = zoom;
            });
    }

    /// Snap to `rotation` radians, then ease back to level
    pub fn trigger_rotation(&mut self, rotation: f32, duration_ms: f32) {
        let rotation = if rotation.is_finite() { rotation } else { 0.0 };
        self.rig.camera.rotation = rotation;
        self.tweens
            .animate(
                ROTATION_KEY,
                rotation,
                0.0,
                sanitize_input("rotation duration", duration_ms),
                Easing::CubicOut,
            )
            .on_update(|rig, r| rig.camera.rotation = r);
    }

    /// Ease time down to `factor`, hold, and release over `duration_ms`
    pub fn trigger_slow_motion(&mut self, factor: f32, duration_ms: f32) {
        if !factor.is_finite() {
            log::warn!("Ignoring slow motion factor {}", factor);
            return;
        }
        let factor = sanitize_input("slow motion factor", factor).min(1.0);
        let duration_ms = sanitize_input("slow motion duration", duration_ms);
        if duration_ms <= 0.0 {
            self.slow_motion = SlowMotion::default();
            return;
        }
        self.slow_motion = SlowMotion {
            phase: SlowMotionPhase::Ramping,
            factor: self.slow_motion.factor,
            target: factor,
            duration_ms,
            elapsed_ms: 0.0,
        };
    }

    pub fn trigger_time_freeze(&mut self, duration_ms: f32) {
        let duration_ms = sanitize_input("freeze duration", duration_ms);
        self.freeze = Freeze {
            active: duration_ms > 0.0,
            duration_ms,
            elapsed_ms: 0.0,
        };
    }

    /// Freeze, shake and a muted flash, all scaled by the combo
    pub fn trigger_hit_stop(&mut self, combo: u32) {
        let combo_f = combo as f32;
        let duration_ms = (50.0 + combo_f * 10.0).min(200.0);
        self.trigger_time_freeze(duration_ms);
        self.trigger_camera_shake(2.0 + combo_f, duration_ms);
        let color = [255.0, (255.0 - combo_f * 20.0).clamp(0.0, 255.0), 100.0];
        self.trigger_flash(color, duration_ms / 2.0, 0.2);
    }

    /// Enable an overlay at `intensity`; it decays and, after half of
    /// `duration_ms`, eases out over the remaining half
    pub fn trigger_post_effect(&mut self, kind: PostEffectKind, intensity: f32, duration_ms: f32) {
        let intensity = sanitize_input("post effect intensity", intensity);
        let duration_ms = sanitize_input("post effect duration", duration_ms);
        self.tweens.cancel(&kind.fade_key());
        *self.rig.post_mut(kind) = PostEffect {
            enabled: intensity > 0.0,
            intensity,
            fade_at_ms: Some(self.now_ms + (duration_ms / 2.0) as f64),
            fade_ms: duration_ms / 2.0,
        };
    }

    /// Name-based variant; unknown names are ignored
    pub fn trigger_post_effect_named(&mut self, name: &str, intensity: f32, duration_ms: f32) -> bool {
        match PostEffectKind::from_name(name) {
            Some(kind) => {
                self.trigger_post_effect(kind, intensity, duration_ms);
                true
            }
            None => {
                log::warn!("Unknown post effect '{}'", name);
                false
            }
        }
    }

    /// Zoom level the camera eases toward each frame
    pub fn set_target_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.rig.camera.target_zoom = zoom;
        }
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        if offset.is_finite() {
            self.rig.camera.offset = offset;
        }
    }

    pub fn reset_all_effects(&mut self) {
        self.tweens.clear();
        self.rig.camera = CameraState::default();
        self.rig.flash = Flash::default();
        self.rig.post = [PostEffect::default(); 4];
        self.slow_motion = SlowMotion::default();
        self.freeze = Freeze::default();
    }

    fn update_camera(&mut self, k: f32) {
        let camera = &mut self.rig.camera;
        camera.zoom = lerp(camera.zoom, camera.target_zoom, 1.0 - (1.0 - ZOOM_LERP).powf(k));
        camera.rotation *= ROTATION_DECAY.powf(k);
    }

    fn update_flash(&mut self, dt_ms: f32) {
        let flash = &mut self.rig.flash;
        if !flash.active {
            return;
        }
        flash.elapsed_ms += dt_ms;
        let progress = if flash.duration_ms > 0.0 {
            flash.elapsed_ms / flash.duration_ms
        } else {
            1.0
        };
        if progress >= 1.0 {
            flash.active = false;
            flash.intensity = 0.0;
        } else {
            flash.intensity = flash.peak * (1.0 - progress).powi(2);
        }
    }

    fn update_freeze(&mut self, dt_ms: f32) {
        if !self.freeze.active {
            return;
        }
        self.freeze.elapsed_ms += dt_ms;
        if self.freeze.elapsed_ms >= self.freeze.duration_ms {
            self.freeze.active = false;
        }
    }

    fn update_post_effects(&mut self, k: f32) {
        let decay = POST_DECAY.powf(k);
        for kind in PostEffectKind::ALL {
            let now = self.now_ms;
            let effect = self.rig.post_mut(kind);
            if effect.intensity > 0.0 {
                effect.intensity *= decay;
                if effect.intensity < POST_CUTOFF {
                    effect.intensity = 0.0;
                    effect.enabled = false;
                    effect.fade_at_ms = None;
                }
            }

            let starts_fade = effect.enabled && effect.fade_at_ms.is_some_and(|at| now >= at);
            if starts_fade {
                effect.fade_at_ms = None;
                let (from, fade_ms) = (effect.intensity, effect.fade_ms);
                self.tweens
                    .animate(kind.fade_key(), from, 0.0, fade_ms, Easing::QuadOut)
                    .on_update(move |rig, v| rig.post_mut(kind).intensity = v)
                    .on_complete(move |rig| rig.post_mut(kind).enabled = false);
            }
        }
    }

    /// Open the camera transform; pair with [`Self::apply_post_render_effects`]
    pub fn apply_pre_render_transforms<C: DrawContext + ?Sized>(&self, ctx: &mut C) {
        let camera = &self.rig.camera;
        let center = self.screen / 2.0;
        ctx.push();
        ctx.translate(center + camera.offset + camera.shake);
        ctx.scale(camera.zoom);
        ctx.rotate(camera.rotation);
        ctx.translate(-center);
    }

    /// Close the camera transform and draw overlays in screen space
    pub fn apply_post_render_effects<C: DrawContext + ?Sized>(&self, ctx: &mut C) {
        ctx.pop();
        self.draw_post_effects(ctx);
        self.draw_flash(ctx);
    }

    /// Scoped camera pass; post effects run when the guard drops
    pub fn begin_pass<'a, C: DrawContext + ?Sized>(&'a self, ctx: &'a mut C) -> CameraPass<'a, C> {
        self.apply_pre_render_transforms(ctx);
        CameraPass { controller: self, ctx }
    }

    fn draw_post_effects<C: DrawContext + ?Sized>(&self, ctx: &mut C) {
        let vignette = self.rig.post(PostEffectKind::Vignette);
        if vignette.enabled {
            self.draw_vignette(ctx, vignette.intensity);
        }
        let scanlines = self.rig.post(PostEffectKind::Scanlines);
        if scanlines.enabled {
            self.draw_scanlines(ctx, scanlines.intensity);
        }
        let chroma = self.rig.post(PostEffectKind::ChromaticAberration);
        if chroma.enabled {
            let tint = (200.0 - chroma.intensity * 50.0).clamp(0.0, 255.0);
            ctx.push();
            ctx.set_blend(BlendMode::Multiply);
            ctx.fill_rect(Vec2::ZERO, self.screen, rgba_from_bytes([255.0, tint, tint], 50.0));
            ctx.pop();
        }
    }

    /// Nested dark frames, darkest at the edge
    fn draw_vignette<C: DrawContext + ?Sized>(&self, ctx: &mut C, intensity: f32) {
        let band = self.screen.min_element() / (2.0 * VIGNETTE_RINGS as f32);
        ctx.push();
        for ring in 0..VIGNETTE_RINGS {
            let inset = band * ring as f32;
            let weight = (VIGNETTE_RINGS - ring) as f32 / VIGNETTE_RINGS as f32;
            let color = rgba_from_bytes([0.0; 3], weight * intensity * 100.0);
            let outer = self.screen - Vec2::splat(2.0 * inset);
            // top, bottom, left, right
            ctx.fill_rect(Vec2::splat(inset), Vec2::new(outer.x, band), color);
            ctx.fill_rect(
                Vec2::new(inset, self.screen.y - inset - band),
                Vec2::new(outer.x, band),
                color,
            );
            ctx.fill_rect(
                Vec2::new(inset, inset + band),
                Vec2::new(band, outer.y - 2.0 * band),
                color,
            );
            ctx.fill_rect(
                Vec2::new(self.screen.x - inset - band, inset + band),
                Vec2::new(band, outer.y - 2.0 * band),
                color,
            );
        }
        ctx.pop();
    }

    fn draw_scanlines<C: DrawContext + ?Sized>(&self, ctx: &mut C, intensity: f32) {
        let color = rgba_from_bytes([0.0; 3], intensity * 50.0);
        let mut y = 0.0;
        while y < self.screen.y {
            ctx.line(Vec2::new(0.0, y), Vec2::new(self.screen.x, y), 1.0, color);
            y += 2.0;
        }
    }

    fn draw_flash<C: DrawContext + ?Sized>(&self, ctx: &mut C) {
        let flash = &self.rig.flash;
        if !flash.active || flash.intensity <= 0.0 {
            return;
        }
        ctx.push();
        ctx.set_blend(BlendMode::Additive);
        ctx.fill_rect(
            Vec2::ZERO,
            self.screen,
            rgba_from_bytes(flash.color, flash.intensity * FLASH_ALPHA),
        );
        ctx.pop();
    }

    /// Multiplier for gameplay time: 0 while frozen, else the slow-motion factor
    pub fn time_scale(&self) -> f32 {
        if self.freeze.active { 0.0 } else { self.slow_motion.factor }
    }

    pub fn animation_value(&self, key: &str) -> Option<f32> {
        self.tweens.value(key)
    }

    pub fn camera(&self) -> &CameraState {
        &self.rig.camera
    }

    pub fn flash(&self) -> &Flash {
        &self.rig.flash
    }

    pub fn post_effect(&self, kind: PostEffectKind) -> &PostEffect {
        self.rig.post(kind)
    }

    pub fn slow_motion(&self) -> &SlowMotion {
        &self.slow_motion
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze.active
    }

    pub fn update_settings(&mut self, config: &FeedbackConfig) {
        self.config = config.clone();
        if !self.config.screen_shake_enabled {
            self.tweens.cancel(SHAKE_KEY);
            self.rig.camera.shake = Vec2::ZERO;
        }
        if !self.config.flash_enabled {
            self.rig.flash = Flash::default();
        }
    }

    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            zoom: self.rig.camera.zoom,
            rotation: self.rig.camera.rotation,
            shake: self.rig.camera.shake,
            flash_intensity: self.rig.flash.intensity,
            slow_motion: self.slow_motion.phase,
            time_scale: self.time_scale(),
            frozen: self.freeze.active,
            active_tweens: self.tweens.len(),
        }
    }
}

impl Updatable for CameraEffectController {
    fn update(&mut self, dt_ms: f32) {
        let dt_ms = sanitize(dt_ms);
        let k = frame_scale(dt_ms);
        self.now_ms += dt_ms as f64;

        self.update_camera(k);
        self.update_flash(dt_ms);
        self.slow_motion.advance(dt_ms);
        self.update_freeze(dt_ms);
        self.tweens.tick(&mut self.rig, dt_ms);
        self.update_post_effects(k);
    }
}

impl ShakeSink for CameraEffectController {
    fn shake(&mut self, intensity: f32, duration_ms: f32) {
        self.trigger_camera_shake(intensity, duration_ms);
    }
}

/// Draw context inside the camera transform.
///
/// Dereferences to the wrapped context; dropping it closes the transform and
/// draws the post effects and flash.
pub struct CameraPass<'a, C: DrawContext + ?Sized> {
    controller: &'a CameraEffectController,
    ctx: &'a mut C,
}

impl<C: DrawContext + ?Sized> Deref for CameraPass<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.ctx
    }
}

impl<C: DrawContext + ?Sized> DerefMut for CameraPass<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.ctx
    }
}

impl<C: DrawContext + ?Sized> Drop for CameraPass<'_, C> {
    fn drop(&mut self) {
        self.controller.apply_post_render_effects(self.ctx);
    }
}
