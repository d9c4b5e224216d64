//! Headless симуляция Robowander
//!
//! Комната 8x8 м с колоннами, один робот, 1000 тиков без рендера.
//! Первый аргумент (опционально) — путь к JSON с WanderConfig.

use bevy::prelude::*;
use robowander_simulation::{
    create_headless_app, logger, spawn_wander_robot, PhysicsWorld, Shape, SimulationPlugin,
    WanderAgent, WanderConfig, WanderStats,
};

fn main() {
    let seed = 42;

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    logger::set_log_level(logger::LogLevel::Info);
    logger::log_info(&format!("Starting Robowander headless simulation (seed: {})", seed));

    {
        let mut world = app.world_mut().resource_mut::<PhysicsWorld>();
        world.add_room(Vec2::splat(-4.0), Vec2::splat(4.0), 0.5);
        world.add_obstacle(Vec2::new(1.5, 1.0), Shape::Circle { radius: 0.6 });
        world.add_obstacle(Vec2::new(-2.0, -1.5), Shape::Aabb { half_extents: Vec2::new(0.8, 0.3) });
        world.add_obstacle(Vec2::new(-1.0, 2.5), Shape::Circle { radius: 0.4 });
    }

    let config = std::env::args().nth(1).map_or_else(WanderConfig::default, |path| load_config(&path));

    if spawn_wander_robot(app.world_mut(), Vec2::ZERO, config).is_none() {
        logger::log_error("Robot spawn failed");
        return;
    }

    // Запускаем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let mut agents = app.world_mut().query::<(&WanderAgent, &Transform)>();
            for (agent, transform) in agents.iter(app.world()) {
                logger::log_info(&format!(
                    "Tick {}: {:?} at ({:.2}, {:.2}), direction ({:.2}, {:.2}){}",
                    tick,
                    agent.collider(),
                    transform.translation.x,
                    transform.translation.y,
                    agent.direction().x,
                    agent.direction().y,
                    if agent.is_stopped() { " [stopped]" } else { "" }
                ));
            }
        }
    }

    let stats = app.world().resource::<WanderStats>();
    logger::log_info(&format!(
        "Simulation complete: {} collisions ({} escape searches), {} direction changes ({} surface timeouts), {} stuck escapes",
        stats.collisions,
        stats.escape_searches,
        stats.direction_changes,
        stats.surface_timeouts,
        stats.stuck_escapes
    ));
}

/// Config из файла; при ошибке — default
fn load_config(path: &str) -> WanderConfig {
    let loaded = std::fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|text| WanderConfig::from_json(&text).map_err(|err| err.to_string()));

    match loaded {
        Ok(config) => {
            logger::log_info(&format!("Loaded WanderConfig from {}", path));
            config
        }
        Err(err) => {
            logger::log_warning(&format!("Failed to load config {}: {}, using defaults", path, err));
            WanderConfig::default()
        }
    }
}
