//! Headless demo: drives the effect stack through a scripted fight and logs
//! what it produced. Natively logs through env_logger, on the web through the
//! browser console.

use arcade_fx::platform::{Clock, ManualClock};
use arcade_fx::renderer::vertex::colors;
use arcade_fx::{DrawContext, FxStack, Settings, VertexCanvas, WavePhase};
use glam::Vec2;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

const DEMO_FRAMES: u32 = 600;
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Fake gameplay: the player strafes, fires every 12 frames, and every
/// fourth shot kills something.
fn run_demo(settings: &Settings) {
    let mut fx = FxStack::with_settings(settings);
    let _wave_log = fx.discovery().subscribe(|event| {
        log::info!("discovery: {:?}", event);
        Ok(())
    });

    let clock = ManualClock::new();
    let mut canvas = VertexCanvas::new();
    let mut combo = 0;
    let mut shots = 0;
    let mut enemies: Vec<Vec2> = Vec::new();

    for frame in 0..DEMO_FRAMES {
        clock.advance(FRAME_MS);
        let time = fx.tick(&clock);

        let t = clock.now_ms() as f32 / 1000.0;
        let player = Vec2::new(120.0, 300.0 + (t * 2.0).sin() * 150.0);
        fx.on_player_moved(player, Vec2::new(0.0, (t * 2.0).cos() * 5.0));

        enemies.extend(fx.discovery_mut().take_spawns());
        for enemy in enemies.iter_mut() {
            enemy.x -= 2.0 * time.world_dt_ms / FRAME_MS as f32;
        }

        if fx.discovery().is_selecting() {
            // Take the first offer a second into the selection
            if frame % 60 == 0 {
                fx.select_power_up(1);
            }
        } else if frame % 12 == 0 {
            fx.on_shot_fired(player, Vec2::X);
            shots += 1;
            if let Some(target) = enemies.pop() {
                if shots % 4 == 0 {
                    combo += 1;
                    let report = fx.on_enemy_destroyed(target, colors::EXPLOSION, combo);
                    if report.wave_cleared {
                        combo = 0;
                    }
                } else {
                    fx.on_enemy_hit(target, colors::HIT);
                    enemies.push(target);
                }
            }
        }

        if fx.discovery_mut().take_clear_enemies_signal() {
            enemies.clear();
        }
        enemies.retain(|e| e.x > -50.0);

        canvas.clear();
        fx.render(&mut canvas, |ctx| {
            for enemy in &enemies {
                ctx.fill_circle(*enemy, 12.0, [1.0, 0.4, 0.4, 1.0]);
            }
            ctx.fill_circle(player, 10.0, [0.4, 0.6, 1.0, 1.0]);
        });

        if frame % 120 == 0 {
            log::info!(
                "frame {}: {} particles, {} vertices in {} batches, wave {} ({:?})",
                frame,
                fx.effects().particle_count(),
                canvas.vertex_count(),
                canvas.batches().len(),
                fx.discovery().wave(),
                fx.discovery().phase()
            );
        }
    }

    let stats = fx.effects().stats();
    log::info!(
        "done: created {}, destroyed {}, triggers {}, pool {}",
        stats.created,
        stats.destroyed,
        stats.effects_triggered,
        fx.effects().pool_size()
    );
    log::info!("camera: {:?}", fx.camera().status());
    log::info!("discovery: {:?}", fx.discovery().status());
    if fx.discovery().phase() == WavePhase::PowerUpSelection {
        log::info!("ended mid-selection");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("logger init failed: {}", e).into());
    }
    log::info!("Arcade FX demo (web) starting...");
    run_demo(&Settings::load());
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Arcade FX demo (native) starting...");
    run_demo(&Settings::load_from(std::path::Path::new(".")));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
