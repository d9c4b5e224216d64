//! Wander systems (FixedUpdate)
//!
//! Порядок в цепочке (см. WanderPlugin):
//! 1. wander_fixed_tick — stuck / surface таймеры (escape до движения)
//! 2. wander_tick — stop+rotate или движение
//! 3. step_physics_world — integration, контакты, deferred задачи
//! 4. dispatch_collisions — collision-enter → агенты
//! 5. tally_wander_events — статистика
//! 6. sync_agent_transforms — PhysicsWorld → Transform

use bevy::prelude::*;

use crate::physics::PhysicsWorld;

use super::agent::WanderAgent;
use super::config::WanderConfig;
use super::events::{DirectionChangeReason, WanderEvent};

/// Счётчики переходов (для headless логов и тестов)
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct WanderStats {
    pub collisions: u32,
    pub escape_searches: u32,
    pub direction_changes: u32,
    /// Из них — по таймауту следования поверхности
    pub surface_timeouts: u32,
    pub stuck_escapes: u32,
}

pub fn wander_fixed_tick(
    mut world: ResMut<PhysicsWorld>,
    mut agents: Query<(&mut WanderAgent, &WanderConfig)>,
    time: Res<Time<Fixed>>,
    mut events: EventWriter<WanderEvent>,
) {
    let delta = time.delta_secs();

    for (mut agent, config) in agents.iter_mut() {
        let mut host = world.body_view(agent.collider());
        agent.fixed_tick(&mut host, config, delta);

        for event in agent.drain_events() {
            events.write(event);
        }
    }
}

pub fn wander_tick(
    mut world: ResMut<PhysicsWorld>,
    mut agents: Query<(&mut WanderAgent, &WanderConfig)>,
    time: Res<Time<Fixed>>,
    mut events: EventWriter<WanderEvent>,
) {
    let delta = time.delta_secs();

    for (mut agent, config) in agents.iter_mut() {
        let mut host = world.body_view(agent.collider());
        agent.tick(&mut host, config, delta);

        for event in agent.drain_events() {
            events.write(event);
        }
    }
}

pub fn step_physics_world(mut world: ResMut<PhysicsWorld>, time: Res<Time<Fixed>>) {
    world.step(time.delta_secs());
}

/// Доставка collision-enter контактов агентам (по ColliderId тела)
pub fn dispatch_collisions(
    mut world: ResMut<PhysicsWorld>,
    mut agents: Query<(&mut WanderAgent, &WanderConfig)>,
    mut events: EventWriter<WanderEvent>,
) {
    let contacts = world.drain_contacts();
    if contacts.is_empty() {
        return;
    }

    for (mut agent, config) in agents.iter_mut() {
        let collider = agent.collider();

        for contact in contacts.iter().filter(|c| c.body == collider) {
            let mut host = world.body_view(collider);
            agent.on_collision_enter(&mut host, config, contact.normal);
        }

        for event in agent.drain_events() {
            events.write(event);
        }
    }
}

pub fn tally_wander_events(mut reader: EventReader<WanderEvent>, mut stats: ResMut<WanderStats>) {
    for event in reader.read() {
        match event {
            WanderEvent::Collided { used_escape_search, .. } => {
                stats.collisions += 1;
                if *used_escape_search {
                    stats.escape_searches += 1;
                }
            }
            WanderEvent::DirectionChanged { reason, .. } => {
                stats.direction_changes += 1;
                if *reason == DirectionChangeReason::SurfaceTimeout {
                    stats.surface_timeouts += 1;
                }
            }
            WanderEvent::StuckEscape { .. } => stats.stuck_escapes += 1,
            WanderEvent::StopFinished { .. } => {}
        }
    }
}

/// Transform для рендера/debug (XY плоскость, поворот вокруг Z)
pub fn sync_agent_transforms(
    world: Res<PhysicsWorld>,
    mut agents: Query<(&WanderAgent, &mut Transform)>,
) {
    for (agent, mut transform) in agents.iter_mut() {
        let Some(body) = world.body(agent.collider()) else {
            continue;
        };

        transform.translation = body.position.extend(transform.translation.z);
        transform.rotation = Quat::from_rotation_z(body.rotation.as_radians());
    }
}

/// Wander Plugin
///
/// Регистрирует PhysicsWorld, WanderEvent и системы в FixedUpdate.
pub struct WanderPlugin;

impl Plugin for WanderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsWorld>()
            .init_resource::<WanderStats>()
            .add_event::<WanderEvent>()
            .add_systems(
                FixedUpdate,
                (
                    wander_fixed_tick,
                    wander_tick,
                    step_physics_world,
                    dispatch_collisions,
                    tally_wander_events,
                    sync_agent_transforms,
                )
                    .chain(), // Последовательное выполнение для детерминизма
            );
    }
}
