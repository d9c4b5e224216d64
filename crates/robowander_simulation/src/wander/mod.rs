//! Wander / obstacle-avoidance behavior
//!
//! Один агент ("robot"): постоянная скорость в выбранном направлении,
//! отражение от препятствий, stuck detection + escape, плавный доворот корпуса.
//!
//! Агент — чистая state machine поверх `PhysicsHost` (injected capability),
//! Bevy системы только связывают её с PhysicsWorld.

pub mod agent;
pub mod config;
pub mod escape;
pub mod events;
pub mod host;
pub mod steering;
pub mod systems;

#[cfg(test)]
mod test_host;


// Re-export основных типов
pub use agent::WanderAgent;
pub use config::{
    ConfigError, WanderConfig, COLLISION_REENABLE_DELAY, ESCAPE_NORMAL_DOT_LIMIT,
    ESCAPE_PROBE_COUNT, UNSTICK_RADIUS,
};
pub use escape::{escape_candidates, find_escape_direction, EscapeChoice};
pub use events::{DirectionChangeReason, WanderEvent};
pub use host::{CancelToken, CollisionFilter, ColliderId, DeferredTask, PhysicsHost, RayHit};
pub use systems::{WanderPlugin, WanderStats};
