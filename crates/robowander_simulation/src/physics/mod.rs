//! Headless 2D physics host
//!
//! Rapier world в Bevy Resource: тела агентов, статические препятствия,
//! raycast/overlap запросы, попарные collision filters и deferred задачи.

pub mod scheduler;
pub mod world;

// Re-export основных типов
pub use scheduler::Scheduler;
pub use world::{BodyState, BodyView, ContactEvent, PhysicsWorld, Shape};
