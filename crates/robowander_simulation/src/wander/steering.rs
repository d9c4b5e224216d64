//! 2D steering helpers (чистые функции, без host)

use bevy::math::Rot2;
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

/// Зеркальное отражение направления относительно нормали: d' = d - 2(d·n)n
///
/// Результат нормализуется; при вырожденном входе (d == 0) возвращает ZERO.
pub fn reflect(direction: Vec2, normal: Vec2) -> Vec2 {
    let normal = normal.normalize_or_zero();
    (direction - 2.0 * direction.dot(normal) * normal).normalize_or_zero()
}

/// Поворот корпуса, соответствующий направлению движения (atan2(y, x))
pub fn heading_rotation(direction: Vec2) -> Rot2 {
    Rot2::radians(direction.y.atan2(direction.x))
}

/// Равномерно случайное единичное направление
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..TAU))
}

/// Плавный доворот к цели: slerp с коэффициентом dt * rate (clamp в [0, 1])
pub fn smooth_rotation(current: Rot2, target: Rot2, rate: f32, delta: f32) -> Rot2 {
    let factor = (delta * rate).clamp(0.0, 1.0);
    current.slerp(target, factor)
}
