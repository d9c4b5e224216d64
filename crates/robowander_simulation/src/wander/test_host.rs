//! Scripted PhysicsHost для unit-тестов агента
//!
//! Часы, позиция и результаты raycast/overlap задаются тестом напрямую,
//! все команды агента записываются.

use bevy::math::Rot2;
use bevy::prelude::*;
use std::collections::HashSet;

use super::host::{CollisionFilter, ColliderId, DeferredTask, PhysicsHost, RayHit};

/// Коллайдер, в который "попадают" все scripted лучи
pub const WALL: ColliderId = ColliderId(900);

pub struct ScriptedHost {
    pub now: f32,
    pub position: Vec2,
    pub rotation: Rot2,
    pub velocity: Vec2,
    pub impulses: Vec<Vec2>,
    /// direction → Some(hit distance) / None (свободно)
    pub ray: Box<dyn Fn(Vec2) -> Option<f32>>,
    pub overlap: Vec<ColliderId>,
    pub alive: HashSet<ColliderId>,
    pub collision_calls: Vec<(ColliderId, ColliderId, bool)>,
    pub scheduled: Vec<(f32, DeferredTask)>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            position: Vec2::ZERO,
            rotation: Rot2::IDENTITY,
            velocity: Vec2::ZERO,
            impulses: Vec::new(),
            ray: Box::new(|_| None),
            overlap: Vec::new(),
            alive: HashSet::new(),
            collision_calls: Vec::new(),
            scheduled: Vec::new(),
        }
    }

    pub fn with_ray(mut self, ray: impl Fn(Vec2) -> Option<f32> + 'static) -> Self {
        self.ray = Box::new(ray);
        self
    }
}

impl CollisionFilter for ScriptedHost {
    fn collider_exists(&self, id: ColliderId) -> bool {
        self.alive.contains(&id)
    }

    fn set_collision_enabled(&mut self, a: ColliderId, b: ColliderId, enabled: bool) {
        self.collision_calls.push((a, b, enabled));
    }
}

impl PhysicsHost for ScriptedHost {
    fn elapsed_secs(&self) -> f32 {
        self.now
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn rotation(&self) -> Rot2 {
        self.rotation
    }

    fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn set_rotation(&mut self, rotation: Rot2) {
        self.rotation = rotation;
    }

    fn apply_impulse(&mut self, impulse: Vec2) {
        self.impulses.push(impulse);
    }

    fn raycast(&self, _origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        (self.ray)(direction)
            .filter(|distance| *distance <= max_distance)
            .map(|distance| RayHit {
                distance,
                collider: WALL,
            })
    }

    fn overlap_circle(&self, _center: Vec2, _radius: f32) -> Vec<ColliderId> {
        self.overlap.clone()
    }

    fn schedule_after(&mut self, delay: f32, task: DeferredTask) {
        self.scheduled.push((delay, task));
    }
}
