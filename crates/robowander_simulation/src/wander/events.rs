//! Wander events — переходы state machine агента
//!
//! Агент складывает события в свой outbox, систему `wander_*` пересылают
//! их в Bevy `Events<WanderEvent>` (логирование, debug overlay, тесты).

use bevy::prelude::*;

use super::host::ColliderId;

/// Причина смены направления без коллизии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionChangeReason {
    /// Displacement за stuck-окно меньше min_move_distance
    Stuck,
    /// Проехали вдоль поверхности дальше max_surface_distance
    SurfaceTimeout,
}

#[derive(Event, Debug, Clone, PartialEq)]
pub enum WanderEvent {
    /// Коллизия: направление отражено (или заменено escape search)
    Collided {
        agent: ColliderId,
        normal: Vec2,
        direction: Vec2,
        /// true — отражённый луч был заблокирован, направление из escape search
        used_escape_search: bool,
    },

    /// ChangeDirection: случайное новое направление + stop
    DirectionChanged {
        agent: ColliderId,
        direction: Vec2,
        reason: DirectionChangeReason,
    },

    /// Stuck escape: импульс + временный ignore соседних коллайдеров
    StuckEscape {
        agent: ColliderId,
        direction: Vec2,
        ignored_colliders: usize,
    },

    /// Окно остановки закончилось, агент снова едет
    StopFinished { agent: ColliderId },
}
