//! WanderAgent — state machine движения и обхода препятствий
//!
//! Режимы (ровно один активен на тик):
//! - Moving: velocity = direction * speed, корпус сразу смотрит по direction
//! - Stopped: velocity = 0, корпус плавно доворачивается к direction
//!
//! Переходы:
//! - коллизия → reflect(direction, normal) (или escape search если отражённый луч
//!   заблокирован) → Stopped + surface-following
//! - stuck окно (displacement < min_move_distance) → ChangeDirection (случайное)
//!   → при persistent stuck / свежей коллизии → stuck escape (импульс + ignore)
//! - surface-following дольше max_surface_distance → ChangeDirection
//! - stop_duration истёк → Moving
//!
//! Clocks: `fixed_tick` — stuck/surface таймеры, `tick` — stop/movement.
//! `step` вызывает оба в этом порядке.

use bevy::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::logger;

use super::config::{WanderConfig, COLLISION_REENABLE_DELAY, UNSTICK_RADIUS};
use super::escape::{find_escape_direction, EscapeChoice};
use super::events::{DirectionChangeReason, WanderEvent};
use super::host::{CancelToken, ColliderId, DeferredTask, PhysicsHost};
use super::steering::{heading_rotation, random_unit_vector, reflect, smooth_rotation};

#[derive(Component, Debug, Clone)]
pub struct WanderAgent {
    collider: ColliderId,
    direction: Vec2,

    last_collision_time: Option<f32>,
    last_escape_time: Option<f32>,
    stop_start_time: f32,

    is_stuck: bool,
    is_stopped: bool,
    is_following_surface: bool,

    last_collision_normal: Option<Vec2>,
    last_position: Vec2,
    stuck_timer: f32,
    surface_start_position: Vec2,

    rng: ChaCha8Rng,
    events: Vec<WanderEvent>,
}

impl WanderAgent {
    /// Создать агента на старте симуляции: случайное направление, текущая позиция
    pub fn spawn(collider: ColliderId, position: Vec2, mut rng: ChaCha8Rng) -> Self {
        let direction = random_unit_vector(&mut rng);

        Self {
            collider,
            direction,
            last_collision_time: None,
            last_escape_time: None,
            stop_start_time: 0.0,
            is_stuck: false,
            is_stopped: false,
            is_following_surface: false,
            last_collision_normal: None,
            last_position: position,
            stuck_timer: 0.0,
            surface_start_position: position,
            rng,
            events: Vec::new(),
        }
    }

    pub fn collider(&self) -> ColliderId {
        self.collider
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Принудительно задать направление (нормализуется; нулевой вектор игнорируется)
    pub fn set_direction(&mut self, direction: Vec2) {
        if let Some(direction) = direction.try_normalize() {
            self.direction = direction;
        }
    }

    pub fn is_stuck(&self) -> bool {
        self.is_stuck
    }

    pub fn is_stopped(&self) -> bool {
        self.is_stopped
    }

    pub fn is_following_surface(&self) -> bool {
        self.is_following_surface
    }

    pub fn last_collision_time(&self) -> Option<f32> {
        self.last_collision_time
    }

    pub fn last_escape_time(&self) -> Option<f32> {
        self.last_escape_time
    }

    pub fn last_collision_normal(&self) -> Option<Vec2> {
        self.last_collision_normal
    }

    pub fn surface_start_position(&self) -> Vec2 {
        self.surface_start_position
    }

    pub fn stuck_timer(&self) -> f32 {
        self.stuck_timer
    }

    /// Забрать накопленные события (outbox очищается)
    pub fn drain_events(&mut self) -> Vec<WanderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Полный тик: таймеры, затем stop/movement
    pub fn step<H: PhysicsHost + ?Sized>(&mut self, host: &mut H, config: &WanderConfig, delta: f32) {
        self.fixed_tick(host, config, delta);
        self.tick(host, config, delta);
    }

    /// Fixed-rate часть: displacement stuck check + surface-following timeout
    pub fn fixed_tick<H: PhysicsHost + ?Sized>(
        &mut self,
        host: &mut H,
        config: &WanderConfig,
        delta: f32,
    ) {
        let now = host.elapsed_secs();
        let position = host.position();

        self.stuck_timer += delta;
        if self.stuck_timer >= config.stuck_check_interval {
            let moved = position.distance(self.last_position);
            let was_stuck = self.is_stuck;

            self.is_stuck = moved < config.min_move_distance;
            self.last_position = position;
            self.stuck_timer = 0.0;

            if self.is_stuck {
                self.change_direction(host, DirectionChangeReason::Stuck);

                let recently_collided = self
                    .last_collision_time
                    .is_some_and(|t| now - t < config.stuck_threshold);
                let cooled_down = self
                    .last_escape_time
                    .map_or(true, |t| now - t >= config.stuck_cooldown);

                if (was_stuck || recently_collided) && cooled_down {
                    self.escape_stuck(host, config);
                }
            }
        }

        // Следование поверхности держится только внутри stop окна (velocity = 0),
        // так что сработать может лишь при внешнем смещении тела: толчок, импульс
        if self.is_following_surface
            && position.distance(self.surface_start_position) >= config.max_surface_distance
        {
            self.change_direction(host, DirectionChangeReason::SurfaceTimeout);
        }
    }

    /// Variable-rate часть: удержание в stop окне с доворотом, либо движение
    pub fn tick<H: PhysicsHost + ?Sized>(&mut self, host: &mut H, config: &WanderConfig, delta: f32) {
        if self.is_stopped {
            host.set_linear_velocity(Vec2::ZERO);

            if host.elapsed_secs() - self.stop_start_time >= config.stop_duration {
                self.is_stopped = false;
                self.is_following_surface = false;
                self.events.push(WanderEvent::StopFinished {
                    agent: self.collider,
                });
            } else if self.direction != Vec2::ZERO {
                let target = heading_rotation(self.direction);
                let rotation = smooth_rotation(host.rotation(), target, config.rotation_speed, delta);
                host.set_rotation(rotation);
            }
        } else {
            host.set_linear_velocity(self.direction * config.speed);

            if self.direction != Vec2::ZERO {
                host.set_rotation(heading_rotation(self.direction));
            }
        }
    }

    /// Collision-enter от host'а (normal направлена от препятствия к агенту)
    pub fn on_collision_enter<H: PhysicsHost + ?Sized>(
        &mut self,
        host: &mut H,
        config: &WanderConfig,
        normal: Vec2,
    ) {
        let now = host.elapsed_secs();
        let position = host.position();

        self.last_collision_time = Some(now);
        let normal = normal.normalize_or_zero();
        if normal != Vec2::ZERO {
            self.last_collision_normal = Some(normal);
        }

        let reflected = reflect(self.direction, normal);
        if reflected != Vec2::ZERO {
            self.direction = reflected;
        }

        let blocked = host
            .raycast(position, self.direction, config.raycast_distance)
            .is_some();
        if blocked {
            self.direction = self
                .find_escape(&*host, config, self.last_collision_normal)
                .direction;
        }

        self.is_stopped = true;
        self.stop_start_time = now;
        self.surface_start_position = position;
        self.is_following_surface = true;

        logger::log(&format!(
            "🤖 {:?} collision: normal={:?} → direction={:?}{}",
            self.collider,
            normal,
            self.direction,
            if blocked { " (escape search)" } else { "" }
        ));

        self.events.push(WanderEvent::Collided {
            agent: self.collider,
            normal,
            direction: self.direction,
            used_escape_search: blocked,
        });
    }

    /// Stuck escape: escape search + импульс + временный ignore соседей
    ///
    /// Возвращает токены отмены запланированных re-enable.
    pub fn escape_stuck<H: PhysicsHost + ?Sized>(
        &mut self,
        host: &mut H,
        config: &WanderConfig,
    ) -> Vec<CancelToken> {
        let choice = self.find_escape(&*host, config, self.last_collision_normal);
        self.direction = choice.direction;

        host.apply_impulse(self.direction * config.stuck_force);

        let mut tokens = Vec::new();
        for other in host.overlap_circle(host.position(), UNSTICK_RADIUS) {
            if other == self.collider {
                continue;
            }

            host.set_collision_enabled(self.collider, other, false);

            let token = CancelToken::new();
            host.schedule_after(
                COLLISION_REENABLE_DELAY,
                DeferredTask::ReEnableCollision {
                    agent: self.collider,
                    other,
                    token: token.clone(),
                },
            );
            tokens.push(token);
        }

        self.last_escape_time = Some(host.elapsed_secs());

        logger::log(&format!(
            "🤖 {:?} stuck escape: direction={:?}, ignored {} collider(s)",
            self.collider,
            self.direction,
            tokens.len()
        ));

        self.events.push(WanderEvent::StuckEscape {
            agent: self.collider,
            direction: self.direction,
            ignored_colliders: tokens.len(),
        });

        tokens
    }

    /// ChangeDirection: остановка + случайное направление
    pub fn change_direction<H: PhysicsHost + ?Sized>(
        &mut self,
        host: &mut H,
        reason: DirectionChangeReason,
    ) {
        self.is_stopped = true;
        self.stop_start_time = host.elapsed_secs();
        self.direction = random_unit_vector(&mut self.rng);
        self.is_following_surface = false;

        logger::log(&format!(
            "🤖 {:?} change direction ({:?}): {:?}",
            self.collider, reason, self.direction
        ));

        self.events.push(WanderEvent::DirectionChanged {
            agent: self.collider,
            direction: self.direction,
            reason,
        });
    }

    fn find_escape<H: PhysicsHost + ?Sized>(
        &self,
        host: &H,
        config: &WanderConfig,
        contact_normal: Option<Vec2>,
    ) -> EscapeChoice {
        let origin = host.position();
        find_escape_direction(
            |direction| {
                host.raycast(origin, direction, config.raycast_distance)
                    .map(|hit| hit.distance)
            },
            contact_normal,
        )
    }
}
