//! Wave state machine
//!
//! `Spawning(n) -> WaveCleared -> PowerUpSelection -> Spawning(n + 1)`.
//! Spawn positions follow the wave's pattern, parametrised by a progress
//! counter that wraps at the wave quota.

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand::seq::index::sample;
use rand_pcg::Pcg32;

use super::powerup::{Penalty, PowerUpDef};
use super::{DiscoveryEvent, SpawnPattern, WavePhase};
use crate::config::{DiscoveryConfig, FxConfig, GameplayTuning};
use crate::events::{EventBus, ListenerError, Subscription};
use crate::renderer::vertex::colors;
use crate::renderer::{DrawContext, Rgba};
use crate::{Renderable, Updatable, frame_scale, jitter, rand_between};

/// Spawns appear this far right of the screen edge
const SPAWN_X_OFFSET: f32 = 50.0;
/// Spawn positions stay this far from the top and bottom edges
const SPAWN_MARGIN: f32 = 50.0;
const CIRCLE_RADIUS: f32 = 150.0;
/// Spawns the timer may queue in one update
const MAX_SPAWNS_PER_UPDATE: usize = 8;

// Selection card layout
const CARD_WIDTH: f32 = 500.0;
const CARD_HEIGHT: f32 = 80.0;
const CARD_TOP: f32 = 300.0;
const CARD_SPACING: f32 = 120.0;

/// Snapshot for debug overlays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoveryStatus {
    pub wave: u32,
    pub phase: WavePhase,
    pub pattern: SpawnPattern,
    pub pattern_progress: u32,
    pub kills_in_wave: u32,
    pub enemies_per_wave: u32,
    pub difficulty: f32,
}

/// Waves, spawn placement, and power-up selection
#[derive(Debug)]
pub struct DiscoverySystem {
    config: DiscoveryConfig,
    initial_tuning: GameplayTuning,
    screen: Vec2,
    seed: u64,

    wave: u32,
    phase: WavePhase,
    kills_in_wave: u32,
    enemies_per_wave: u32,
    difficulty: f32,
    pattern: SpawnPattern,
    pattern_progress: u32,

    /// Indices into the catalog
    offers: Vec<usize>,
    history: Vec<String>,
    clear_enemies: bool,

    tuning: GameplayTuning,
    spawn_frames: f32,
    spawn_queue: Vec<Vec2>,
    events: EventBus<DiscoveryEvent>,
    rng: Pcg32,
}

impl DiscoverySystem {
    pub fn new(config: &FxConfig) -> Self {
        let seed = config.seed.wrapping_add(2);
        let mut system = Self {
            config: config.discovery.clone(),
            initial_tuning: config.tuning.clone(),
            screen: Vec2::new(config.screen.width, config.screen.height),
            seed,
            wave: 1,
            phase: WavePhase::Spawning,
            kills_in_wave: 0,
            enemies_per_wave: config.discovery.enemies_per_wave.max(1),
            difficulty: 1.0,
            pattern: SpawnPattern::Random,
            pattern_progress: 0,
            offers: Vec::new(),
            history: Vec::new(),
            clear_enemies: false,
            tuning: config.tuning.clone(),
            spawn_frames: 0.0,
            spawn_queue: Vec::new(),
            events: EventBus::new(),
            rng: Pcg32::seed_from_u64(seed),
        };
        system.generate_pattern();
        system
    }

    /// Attach a listener for wave and power-up events
    #[must_use = "dropping the subscription detaches the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&DiscoveryEvent) -> Result<(), ListenerError> + 'static,
    {
        self.events.subscribe(listener)
    }

    fn generate_pattern(&mut self) {
        self.pattern = self
            .config
            .spawn_patterns
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(SpawnPattern::Random);
        self.pattern_progress = 0;
        log::info!("Wave {}: pattern {}", self.wave, self.pattern.as_str());
        self.events.emit(&DiscoveryEvent::WaveStarted {
            wave: self.wave,
            pattern: self.pattern,
        });
    }

    /// Count a kill. Returns `true` when it completed the wave.
    ///
    /// Kills during selection (or with discovery disabled) are ignored.
    pub fn on_enemy_destroyed(&mut self) -> bool {
        if !self.config.enabled || self.phase != WavePhase::Spawning {
            return false;
        }
        self.kills_in_wave += 1;
        if self.kills_in_wave >= self.enemies_per_wave {
            self.complete_wave();
            return true;
        }
        false
    }

    fn complete_wave(&mut self) {
        log::info!("Wave {} cleared", self.wave);
        self.phase = WavePhase::WaveCleared;
        self.clear_enemies = true;
        self.spawn_queue.clear();
        self.events.emit(&DiscoveryEvent::WaveCleared { wave: self.wave });
        self.start_selection();
    }

    fn start_selection(&mut self) {
        let available = self.config.power_ups.len();
        let amount = self.config.offer_count.min(available);
        self.offers = sample(&mut self.rng, available, amount).into_vec();

        if self.offers.is_empty() {
            log::warn!("No power-ups to offer; skipping selection");
            self.next_wave();
            return;
        }

        self.phase = WavePhase::PowerUpSelection;
        let keys = self.offers().map(|p| p.key.clone()).collect();
        self.events.emit(&DiscoveryEvent::PowerUpOffered { wave: self.wave, keys });
    }

    /// Accept an offered power-up by key. Returns `false` when no selection
    /// is running or `key` was not offered.
    pub fn select_power_up(&mut self, key: &str) -> bool {
        if self.phase != WavePhase::PowerUpSelection {
            return false;
        }
        let Some(index) = self
            .offers
            .iter()
            .copied()
            .find(|&i| self.config.power_ups[i].key == key)
        else {
            log::warn!("Power-up '{}' was not offered", key);
            return false;
        };

        let power_up = self.config.power_ups[index].clone();
        self.apply_trade(&power_up);
        self.next_wave();
        true
    }

    /// Accept the `slot`-th offer (1-based, matching the number keys)
    pub fn select_by_index(&mut self, slot: usize) -> bool {
        if slot == 0 {
            return false;
        }
        match self.offers.get(slot - 1) {
            Some(&index) => {
                let key = self.config.power_ups[index].key.clone();
                self.select_power_up(&key)
            }
            None => false,
        }
    }

    fn apply_trade(&mut self, power_up: &PowerUpDef) {
        self.tuning.apply(power_up.effect_delta());
        match power_up.penalty_delta() {
            Some(delta) => self.tuning.apply(delta),
            None => {
                debug_assert_eq!(power_up.penalty, Penalty::WaveEnemies);
                let scaled = (self.enemies_per_wave as f32 * power_up.penalty_value).ceil();
                self.enemies_per_wave = (scaled as u32).max(1);
            }
        }

        let penalty = power_up.penalty_description();
        log::info!("Selected {} ({})", power_up.name, penalty);
        self.history.push(power_up.key.clone());
        self.events.emit(&DiscoveryEvent::PowerUpSelected {
            wave: self.wave,
            key: power_up.key.clone(),
            penalty,
        });
    }

    fn next_wave(&mut self) {
        self.wave += 1;
        self.kills_in_wave = 0;
        self.offers.clear();
        self.difficulty *= self.config.difficulty_multiplier;
        self.phase = WavePhase::Spawning;
        self.spawn_frames = 0.0;
        self.generate_pattern();
    }

    /// Next spawn point, or `None` while a selection is open
    pub fn spawn_position(&mut self) -> Option<Vec2> {
        if self.phase != WavePhase::Spawning {
            return None;
        }

        let (low, high) = self.spawn_band();
        let x = self.screen.x + SPAWN_X_OFFSET;
        if !self.config.enabled {
            return Some(Vec2::new(x, rand_between(&mut self.rng, low, high)));
        }

        let base_y = self.pattern_y();
        self.pattern_progress = (self.pattern_progress + 1) % self.enemies_per_wave;

        let spread = (80.0 - self.wave as f32 * 5.0).max(20.0);
        let jittered = Vec2::new(x, base_y) + Vec2::new(jitter(&mut self.rng, spread), jitter(&mut self.rng, spread));
        Some(Vec2::new(jittered.x, jittered.y.clamp(low, high)))
    }

    /// Pattern height for the current progress, already inside the band
    fn pattern_y(&mut self) -> f32 {
        let (low, high) = self.spawn_band();
        let h = self.screen.y;
        let progress = self.pattern_progress as f32 / self.enemies_per_wave as f32;

        let y = match self.pattern {
            SpawnPattern::Random => rand_between(&mut self.rng, low, high),
            SpawnPattern::FormationV => h * (0.2 + (progress - 0.5).abs() * 2.0 * 0.6),
            SpawnPattern::FormationCircle => h / 2.0 + (progress * std::f32::consts::TAU).sin() * CIRCLE_RADIUS,
            SpawnPattern::FormationLine => h * (0.2 + progress * 0.6),
            SpawnPattern::FormationSpiral => {
                let angle = progress * std::f32::consts::PI * 6.0;
                let radius = 100.0 + progress * 100.0;
                h / 2.0 + angle.sin() * radius
            }
        };
        y.clamp(low, high)
    }

    fn spawn_band(&self) -> (f32, f32) {
        let low = SPAWN_MARGIN.min(self.screen.y / 2.0);
        (low, (self.screen.y - SPAWN_MARGIN).max(low))
    }

    /// One-shot: `true` once after each wave clear
    pub fn take_clear_enemies_signal(&mut self) -> bool {
        std::mem::take(&mut self.clear_enemies)
    }

    /// Spawn points queued by the timer since the last call
    pub fn take_spawns(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.spawn_queue)
    }

    /// Back to wave 1 with the initial tuning
    pub fn reset(&mut self) {
        self.wave = 1;
        self.phase = WavePhase::Spawning;
        self.kills_in_wave = 0;
        self.enemies_per_wave = self.config.enemies_per_wave.max(1);
        self.difficulty = 1.0;
        self.offers.clear();
        self.history.clear();
        self.clear_enemies = false;
        self.tuning = self.initial_tuning.clone();
        self.spawn_frames = 0.0;
        self.spawn_queue.clear();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.generate_pattern();
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn is_selecting(&self) -> bool {
        self.phase == WavePhase::PowerUpSelection
    }

    pub fn kills_in_wave(&self) -> u32 {
        self.kills_in_wave
    }

    pub fn enemies_per_wave(&self) -> u32 {
        self.enemies_per_wave
    }

    pub fn difficulty(&self) -> f32 {
        self.difficulty
    }

    pub fn pattern(&self) -> SpawnPattern {
        self.pattern
    }

    /// Current offers, in slot order
    pub fn offers(&self) -> impl Iterator<Item = &PowerUpDef> + '_ {
        self.offers.iter().map(|&i| &self.config.power_ups[i])
    }

    /// Keys of accepted power-ups, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn tuning(&self) -> &GameplayTuning {
        &self.tuning
    }

    /// Hand lives granted by power-ups to the host
    pub fn take_bonus_lives(&mut self) -> u32 {
        self.tuning.take_bonus_lives()
    }

    pub fn status(&self) -> DiscoveryStatus {
        DiscoveryStatus {
            wave: self.wave,
            phase: self.phase,
            pattern: self.pattern,
            pattern_progress: self.pattern_progress,
            kills_in_wave: self.kills_in_wave,
            enemies_per_wave: self.enemies_per_wave,
            difficulty: self.difficulty,
        }
    }

    /// Dim the screen and draw one card per offer. Text is left to the host,
    /// which can read [`Self::offers`].
    pub fn draw_selection(&self, ctx: &mut dyn DrawContext) {
        if self.phase != WavePhase::PowerUpSelection {
            return;
        }

        ctx.push();
        ctx.fill_rect(Vec2::ZERO, self.screen, colors::SELECTION_DIM);

        let left = self.screen.x / 2.0 - CARD_WIDTH / 2.0;
        for slot in 0..self.offers.len() {
            let top = CARD_TOP + slot as f32 * CARD_SPACING - CARD_HEIGHT / 2.0;
            let min = Vec2::new(left, top);
            let size = Vec2::new(CARD_WIDTH, CARD_HEIGHT);
            ctx.fill_rect(min, size, colors::SELECTION_CARD);
            outline(ctx, min, size, 2.0, colors::SELECTION_BORDER);
            // Penalty strip along the bottom edge
            ctx.fill_rect(
                Vec2::new(left, top + CARD_HEIGHT - 6.0),
                Vec2::new(CARD_WIDTH, 4.0),
                colors::PENALTY,
            );
        }
        ctx.pop();
    }
}

fn outline(ctx: &mut dyn DrawContext, min: Vec2, size: Vec2, width: f32, color: Rgba) {
    let max = min + size;
    ctx.line(min, Vec2::new(max.x, min.y), width, color);
    ctx.line(Vec2::new(max.x, min.y), max, width, color);
    ctx.line(max, Vec2::new(min.x, max.y), width, color);
    ctx.line(Vec2::new(min.x, max.y), min, width, color);
}

impl Updatable for DiscoverySystem {
    /// Run the spawn timer, queueing positions for [`DiscoverySystem::take_spawns`]
    fn update(&mut self, dt_ms: f32) {
        if self.phase != WavePhase::Spawning {
            return;
        }
        self.spawn_frames += frame_scale(dt_ms);
        let interval = self.tuning.enemy_spawn_interval_frames.max(1) as f32;
        let mut queued = 0;
        while self.spawn_frames >= interval && queued < MAX_SPAWNS_PER_UPDATE {
            self.spawn_frames -= interval;
            if let Some(pos) = self.spawn_position() {
                self.spawn_queue.push(pos);
            }
            queued += 1;
        }
        self.spawn_frames = self.spawn_frames.min(interval);
    }
}

impl Renderable for DiscoverySystem {
    fn render(&self, ctx: &mut dyn DrawContext) {
        self.draw_selection(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::consts::FRAME_MS;
    use crate::renderer::VertexCanvas;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn system_with(discovery: DiscoveryConfig) -> DiscoverySystem {
        DiscoverySystem::new(&FxConfig {
            discovery,
            ..Default::default()
        })
    }

    fn clear_wave(system: &mut DiscoverySystem) {
        for _ in 0..system.enemies_per_wave() {
            system.on_enemy_destroyed();
        }
    }

    fn first_offer(system: &DiscoverySystem) -> String {
        system.offers().next().map(|p| p.key.clone()).unwrap_or_default()
    }

    #[test]
    fn test_wave_cycle() {
        let mut system = system_with(DiscoveryConfig::default());
        assert_eq!(system.wave(), 1);
        for _ in 0..14 {
            assert!(!system.on_enemy_destroyed());
        }
        assert_eq!(system.phase(), WavePhase::Spawning);
        assert!(system.on_enemy_destroyed());
        assert!(system.is_selecting());
        assert_eq!(system.offers().count(), 3);

        let key = first_offer(&system);
        assert!(system.select_power_up(&key));
        assert_eq!(system.wave(), 2);
        assert_eq!(system.kills_in_wave(), 0);
        assert_eq!(system.difficulty(), 1.2);
        assert_eq!(system.phase(), WavePhase::Spawning);
        assert_eq!(system.history(), &[key]);
    }

    #[test]
    fn test_offers_distinct() {
        let mut system = system_with(DiscoveryConfig::default());
        for _ in 0..10 {
            clear_wave(&mut system);
            let mut keys: Vec<String> = system.offers().map(|p| p.key.clone()).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), 3);
            assert!(system.select_by_index(2));
        }
        assert_eq!(system.wave(), 11);
    }

    #[test]
    fn test_small_catalog_offers_all() {
        let mut config = DiscoveryConfig::default();
        config.power_ups.truncate(2);
        let mut system = system_with(config);
        clear_wave(&mut system);
        assert_eq!(system.offers().count(), 2);
        assert!(!system.select_by_index(3));
        assert!(system.select_by_index(1));
    }

    #[test]
    fn test_empty_catalog_skips_selection() {
        let mut config = DiscoveryConfig::default();
        config.power_ups.clear();
        let mut system = system_with(config);
        clear_wave(&mut system);
        assert_eq!(system.wave(), 2);
        assert_eq!(system.phase(), WavePhase::Spawning);
    }

    #[test]
    fn test_clear_signal_is_one_shot() {
        let mut system = system_with(DiscoveryConfig::default());
        assert!(!system.take_clear_enemies_signal());
        clear_wave(&mut system);
        assert!(system.take_clear_enemies_signal());
        assert!(!system.take_clear_enemies_signal());
    }

    #[test]
    fn test_selection_suspends_spawning_and_kills() {
        let mut system = system_with(DiscoveryConfig::default());
        clear_wave(&mut system);
        assert_eq!(system.spawn_position(), None);
        assert!(!system.on_enemy_destroyed());
        assert_eq!(system.kills_in_wave(), 15);
        for _ in 0..120 {
            system.update(FRAME_MS);
        }
        assert!(system.take_spawns().is_empty());
    }

    #[test]
    fn test_unknown_or_unoffered_key_rejected() {
        let mut system = system_with(DiscoveryConfig::default());
        assert!(!system.select_power_up("rapid_fire"));
        clear_wave(&mut system);
        assert!(!system.select_power_up("does_not_exist"));
        assert!(system.is_selecting());
    }

    #[test]
    fn test_wave_enemies_penalty_grows_quota() {
        let mut config = DiscoveryConfig::default();
        config.power_ups.retain(|p| p.key == "overclock");
        let mut system = system_with(config);
        clear_wave(&mut system);
        assert!(system.select_power_up("overclock"));
        assert_eq!(system.enemies_per_wave(), 23);
        assert_eq!(system.tuning().version, 1);
        assert!((system.tuning().shoot_cooldown_ms - 140.0).abs() < 1e-3);
    }

    #[test]
    fn test_tuning_penalty_applied() {
        let mut config = DiscoveryConfig::default();
        config.power_ups.retain(|p| p.key == "extra_life");
        let mut system = system_with(config);
        clear_wave(&mut system);
        assert!(system.select_by_index(1));
        assert_eq!(system.tuning().version, 2);
        assert_eq!(system.tuning().enemy_hp_scale, 1.5);
        assert_eq!(system.take_bonus_lives(), 1);
        assert_eq!(system.take_bonus_lives(), 0);
    }

    #[test]
    fn test_disabled_never_clears() {
        let mut system = system_with(DiscoveryConfig {
            enabled: false,
            ..Default::default()
        });
        for _ in 0..100 {
            assert!(!system.on_enemy_destroyed());
        }
        let pos = system.spawn_position().unwrap_or_default();
        assert!((50.0..=550.0).contains(&pos.y));
    }

    #[test]
    fn test_spawn_timer_queues_positions() {
        let mut system = system_with(DiscoveryConfig::default());
        for _ in 0..90 {
            system.update(FRAME_MS);
        }
        let spawns = system.take_spawns();
        assert_eq!(spawns.len(), 3);
        assert!(spawns.iter().all(|p| p.x > 700.0 && (50.0..=550.0).contains(&p.y)));
    }

    #[test]
    fn test_line_pattern_progresses_downward() {
        let mut system = system_with(DiscoveryConfig {
            spawn_patterns: vec![SpawnPattern::FormationLine],
            ..Default::default()
        });
        assert_eq!(system.pattern(), SpawnPattern::FormationLine);
        let first = system.pattern_y();
        for _ in 0..7 {
            system.pattern_progress += 1;
        }
        let later = system.pattern_y();
        assert!((first - 120.0).abs() < 1e-3);
        assert!(later > first);
    }

    #[test]
    fn test_progress_wraps_at_quota() {
        let mut system = system_with(DiscoveryConfig::default());
        for _ in 0..15 {
            system.spawn_position();
        }
        assert_eq!(system.status().pattern_progress, 0);
    }

    #[test]
    fn test_events_published() {
        let mut system = system_with(DiscoveryConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let _sub = system.subscribe(move |e| {
            sink.borrow_mut().push(e.clone());
            Ok(())
        });

        clear_wave(&mut system);
        let key = first_offer(&system);
        system.select_power_up(&key);

        let events = log.borrow();
        assert!(matches!(events[0], DiscoveryEvent::WaveCleared { wave: 1 }));
        assert!(matches!(events[1], DiscoveryEvent::PowerUpOffered { wave: 1, .. }));
        assert!(matches!(events[2], DiscoveryEvent::PowerUpSelected { wave: 1, .. }));
        assert!(matches!(events[3], DiscoveryEvent::WaveStarted { wave: 2, .. }));
    }

    #[test]
    fn test_failing_listener_does_not_break_wave() {
        let mut system = system_with(DiscoveryConfig::default());
        let _sub = system.subscribe(|_| Err("listener down".into()));
        clear_wave(&mut system);
        assert!(system.is_selecting());
    }

    #[test]
    fn test_reset() {
        let mut system = system_with(DiscoveryConfig::default());
        clear_wave(&mut system);
        system.select_by_index(1);
        system.reset();
        assert_eq!(system.wave(), 1);
        assert_eq!(system.difficulty(), 1.0);
        assert_eq!(system.tuning(), &GameplayTuning::default());
        assert!(system.history().is_empty());
    }

    #[test]
    fn test_selection_overlay() {
        let mut system = system_with(DiscoveryConfig::default());
        let mut canvas = VertexCanvas::new();
        system.render(&mut canvas);
        assert_eq!(canvas.vertex_count(), 0);

        clear_wave(&mut system);
        system.render(&mut canvas);
        assert!(canvas.vertex_count() > 0);
        assert_eq!(canvas.depth(), 0);
    }

    proptest! {
        #[test]
        fn prop_circle_spawns_stay_in_band(seed in any::<u64>(), per_wave in 1u32..60, wave_skips in 0u32..12) {
            let mut system = DiscoverySystem::new(&FxConfig {
                seed,
                discovery: DiscoveryConfig {
                    enemies_per_wave: per_wave,
                    spawn_patterns: vec![SpawnPattern::FormationCircle],
                    power_ups: Vec::new(),
                    ..Default::default()
                },
                ..Default::default()
            });
            for _ in 0..wave_skips {
                clear_wave(&mut system);
            }
            for _ in 0..per_wave {
                let pos = system.spawn_position();
                prop_assert!(pos.is_some());
                let y = pos.unwrap_or_default().y;
                prop_assert!((SPAWN_MARGIN..=600.0 - SPAWN_MARGIN).contains(&y), "y = {}", y);
            }
        }
    }
}
