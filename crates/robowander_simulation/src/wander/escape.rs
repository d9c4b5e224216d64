//! Escape search — детерминированный скан 8 направлений
//!
//! Score кандидата = дистанция raycast hit, либо +inf если луч ничего не задел.
//! С известной нормалью контакта сначала идёт biased pass (только направления
//! почти перпендикулярные нормали), затем fallback по всем 8.
//! При равных score выигрывает первый по углу (0°, 45°, ...).

use bevy::prelude::*;
use std::f32::consts::FRAC_PI_4;

use super::config::{ESCAPE_NORMAL_DOT_LIMIT, ESCAPE_PROBE_COUNT};

/// Результат поиска
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscapeChoice {
    pub direction: Vec2,
    /// Дистанция до препятствия (INFINITY = свободно)
    pub score: f32,
    /// true — выбрано biased pass'ом, false — fallback / поиск без нормали
    pub biased: bool,
}

/// Кандидаты в порядке обхода: 0°, 45°, ..., 315°
pub fn escape_candidates() -> [Vec2; ESCAPE_PROBE_COUNT] {
    std::array::from_fn(|i| Vec2::from_angle(i as f32 * FRAC_PI_4))
}

/// Выбрать самое открытое направление
///
/// `probe(direction)` — raycast от агента длиной raycast_distance,
/// `Some(distance)` при попадании, `None` если свободно.
pub fn find_escape_direction<F>(mut probe: F, contact_normal: Option<Vec2>) -> EscapeChoice
where
    F: FnMut(Vec2) -> Option<f32>,
{
    let scored: Vec<(Vec2, f32)> = escape_candidates()
        .into_iter()
        .map(|direction| (direction, probe(direction).unwrap_or(f32::INFINITY)))
        .collect();

    if let Some(normal) = contact_normal {
        let biased = best_of(
            scored
                .iter()
                .copied()
                .filter(|(direction, _)| direction.dot(normal).abs() < ESCAPE_NORMAL_DOT_LIMIT),
        );

        if let Some((direction, score)) = biased {
            if score > 0.0 {
                return EscapeChoice {
                    direction,
                    score,
                    biased: true,
                };
            }
        }
    }

    // Fallback: все кандидаты без фильтра (scored всегда непустой)
    let (direction, score) = best_of(scored.iter().copied()).unwrap_or((Vec2::X, 0.0));
    EscapeChoice {
        direction,
        score,
        biased: false,
    }
}

/// Максимальный score, при равенстве — первый встреченный
fn best_of(candidates: impl Iterator<Item = (Vec2, f32)>) -> Option<(Vec2, f32)> {
    let mut best: Option<(Vec2, f32)> = None;

    for (direction, score) in candidates {
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((direction, score)),
        }
    }

    best
}
