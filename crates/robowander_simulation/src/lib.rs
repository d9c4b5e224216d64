//! Robowander Simulation Core
//!
//! Headless ECS-симуляция на Bevy 0.16: автономный wander/avoidance агент
//! ("robot") в 2D мире.
//!
//! Слои:
//! - wander = поведение (state machine агента, не знает о движке)
//! - physics = минимальный 2D host (тела, препятствия, запросы, deferred задачи)
//! - Bevy = расписание тиков (FixedUpdate 60Hz), events, ресурсы

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod logger;
pub mod physics;
pub mod wander;

// Re-export базовых типов для удобства
pub use logger::{log, log_error, log_info, log_warning};
pub use physics::{PhysicsWorld, Shape};
pub use wander::{
    ColliderId, DirectionChangeReason, PhysicsHost, WanderAgent, WanderConfig, WanderEvent,
    WanderPlugin, WanderStats,
};

/// Seed по умолчанию, если App собран без create_headless_app
pub const DEFAULT_SEED: u64 = 42;

/// Радиус тела робота (метры)
pub const ROBOT_RADIUS: f32 = 0.25;

/// Частота fixed тика симуляции
pub const FIXED_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed из create_headless_app не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(DEFAULT_SEED));
        }

        app.insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            .add_plugins(WanderPlugin);
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Независимый поток для одного агента (детерминирован порядком вызовов)
    pub fn fork(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.rng.gen())
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную (1/60 сек на update) — одинаковый seed даёт
/// одинаковое число fixed тиков и одинаковый результат.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / FIXED_HZ,
        )));

    app
}

/// Spawn робота: тело в PhysicsWorld + entity с WanderAgent/WanderConfig/Transform
///
/// Невалидный config логируется и заменяется default'ом.
/// None — если в World нет PhysicsWorld или DeterministicRng.
pub fn spawn_wander_robot(world: &mut World, position: Vec2, config: WanderConfig) -> Option<Entity> {
    let config = match config.validate() {
        Ok(()) => config,
        Err(err) => {
            logger::log_warning(&format!("spawn_wander_robot: invalid config ({}), using defaults", err));
            WanderConfig::default()
        }
    };

    let Some(rng) = world
        .get_resource_mut::<DeterministicRng>()
        .map(|mut rng| rng.fork())
    else {
        logger::log_error("spawn_wander_robot: DeterministicRng не найден");
        return None;
    };

    let Some(collider) = world
        .get_resource_mut::<PhysicsWorld>()
        .map(|mut physics| physics.add_body(position, ROBOT_RADIUS))
    else {
        logger::log_error("spawn_wander_robot: PhysicsWorld не найден");
        return None;
    };

    let agent = WanderAgent::spawn(collider, position, rng);
    logger::log_info(&format!(
        "🤖 Robot {:?} spawned at {:?}, direction {:?}",
        collider,
        position,
        agent.direction()
    ));

    let entity = world
        .spawn((Transform::from_xyz(position.x, position.y, 0.0), agent, config))
        .id();

    Some(entity)
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
