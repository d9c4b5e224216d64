//! Physics host contract
//!
//! Агент не знает о конкретном движке: всё, что ему нужно от физики,
//! приходит через `PhysicsHost` (per-agent view на тело агента).
//! Headless реализация — `physics::world::BodyView`.

use bevy::math::Rot2;
use bevy::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::logger;

/// Handle коллайдера в host'е (тело агента или препятствие)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u32);

/// Результат raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub collider: ColliderId,
}

/// Попарный collision filter + liveness check
///
/// Отдельный trait: deferred tasks исполняются самим host'ом,
/// без per-agent view.
pub trait CollisionFilter {
    fn collider_exists(&self, id: ColliderId) -> bool;
    fn set_collision_enabled(&mut self, a: ColliderId, b: ColliderId, enabled: bool);
}

pub trait PhysicsHost: CollisionFilter {
    /// Часы симуляции (секунды с начала)
    fn elapsed_secs(&self) -> f32;

    fn position(&self) -> Vec2;
    fn rotation(&self) -> Rot2;

    fn set_linear_velocity(&mut self, velocity: Vec2);
    fn set_rotation(&mut self, rotation: Rot2);
    fn apply_impulse(&mut self, impulse: Vec2);

    /// Ближайшее попадание луча; собственный коллайдер агента игнорируется
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit>;

    /// Все коллайдеры, пересекающие круг (может включать коллайдер агента)
    fn overlap_circle(&self, center: Vec2, radius: f32) -> Vec<ColliderId>;

    /// Выполнить задачу через `delay` секунд времени симуляции
    fn schedule_after(&mut self, delay: f32, task: DeferredTask);
}

/// Токен отмены для deferred задач
///
/// Клон разделяет флаг: отмена через любую копию видна всем.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Отложенная команда host'у
#[derive(Debug, Clone)]
pub enum DeferredTask {
    /// Вернуть коллизию между агентом и препятствием после временного ignore
    ReEnableCollision {
        agent: ColliderId,
        other: ColliderId,
        token: CancelToken,
    },
}

impl DeferredTask {
    /// Исполнить задачу. Возвращает false если задача стала no-op
    /// (коллайдер удалён или задача отменена).
    pub fn run<H: CollisionFilter + ?Sized>(self, host: &mut H) -> bool {
        match self {
            DeferredTask::ReEnableCollision { agent, other, token } => {
                if token.is_cancelled() {
                    return false;
                }

                if !host.collider_exists(agent) || !host.collider_exists(other) {
                    logger::log(&format!(
                        "Re-enable collision skipped: {:?} <-> {:?} (collider gone)",
                        agent, other
                    ));
                    return false;
                }

                host.set_collision_enabled(agent, other, true);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FilterStub {
        alive: HashSet<ColliderId>,
        enabled_calls: Vec<(ColliderId, ColliderId, bool)>,
    }

    impl CollisionFilter for FilterStub {
        fn collider_exists(&self, id: ColliderId) -> bool {
            self.alive.contains(&id)
        }

        fn set_collision_enabled(&mut self, a: ColliderId, b: ColliderId, enabled: bool) {
            self.enabled_calls.push((a, b, enabled));
        }
    }

    fn task(token: &CancelToken) -> DeferredTask {
        DeferredTask::ReEnableCollision {
            agent: ColliderId(1),
            other: ColliderId(2),
            token: token.clone(),
        }
    }

    #[test]
    fn test_reenable_runs_when_both_alive() {
        let mut host = FilterStub::default();
        host.alive.extend([ColliderId(1), ColliderId(2)]);

        assert!(task(&CancelToken::new()).run(&mut host));
        assert_eq!(host.enabled_calls, vec![(ColliderId(1), ColliderId(2), true)]);
    }

    #[test]
    fn test_reenable_skips_destroyed_collider() {
        let mut host = FilterStub::default();
        host.alive.insert(ColliderId(1));

        assert!(!task(&CancelToken::new()).run(&mut host));
        assert!(host.enabled_calls.is_empty());
    }

    #[test]
    fn test_reenable_skips_destroyed_agent() {
        let mut host = FilterStub::default();
        host.alive.insert(ColliderId(2));

        assert!(!task(&CancelToken::new()).run(&mut host));
        assert!(host.enabled_calls.is_empty());
    }

    #[test]
    fn test_cancelled_token_is_shared_between_clones() {
        let mut host = FilterStub::default();
        host.alive.extend([ColliderId(1), ColliderId(2)]);

        let token = CancelToken::new();
        let scheduled = task(&token);
        token.cancel();

        assert!(!scheduled.run(&mut host));
        assert!(host.enabled_calls.is_empty());
    }
}
