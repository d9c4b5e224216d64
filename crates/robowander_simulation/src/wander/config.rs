//! Параметры wander/avoidance поведения

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Количество направлений в escape search (шаг 45°)
pub const ESCAPE_PROBE_COUNT: usize = 8;

/// Biased pass: кандидаты с |dot(dir, normal)| >= этого значения отбрасываются
pub const ESCAPE_NORMAL_DOT_LIMIT: f32 = 0.5;

/// Радиус поиска коллайдеров вокруг агента при выходе из stuck
pub const UNSTICK_RADIUS: f32 = 1.0;

/// Через сколько секунд возвращаем коллизию с временно игнорируемым коллайдером
pub const COLLISION_REENABLE_DELAY: f32 = 0.5;

/// Tunable параметры агента (все в секундах / метрах / m/s)
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct WanderConfig {
    /// Постоянная скорость движения (m/s)
    pub speed: f32,
    /// Длина raycast при проверке направления
    pub raycast_distance: f32,
    /// Окно после коллизии: stuck внутри окна сразу эскалирует в escape
    pub stuck_threshold: f32,
    /// Импульс при выходе из stuck
    pub stuck_force: f32,
    /// Минимальный интервал между двумя escape
    pub stuck_cooldown: f32,
    /// Длительность остановки после коллизии
    pub stop_duration: f32,
    /// Скорость доворота корпуса во время остановки
    pub rotation_speed: f32,
    /// Период displacement-проверки
    pub stuck_check_interval: f32,
    /// Минимальное смещение за период, иначе — stuck
    pub min_move_distance: f32,
    /// Максимальный путь вдоль поверхности после коллизии
    pub max_surface_distance: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            speed: 2.0,
            raycast_distance: 1.0,
            stuck_threshold: 0.5,
            stuck_force: 3.0,
            stuck_cooldown: 1.0,
            stop_duration: 0.3,
            rotation_speed: 5.0,
            stuck_check_interval: 1.0,
            min_move_distance: 0.1,
            max_surface_distance: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("parameter `{name}` must be finite (got {value})")]
    NotFinite { name: &'static str, value: f32 },

    #[error("parameter `{name}` must not be negative (got {value})")]
    Negative { name: &'static str, value: f32 },

    #[error("parameter `{name}` must be greater than zero (got {value})")]
    NotPositive { name: &'static str, value: f32 },

    #[error("invalid config JSON: {0}")]
    Parse(String),
}

impl WanderConfig {
    /// Загрузка из JSON: отсутствующие поля берутся из Default, результат валидируется
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Проверка значений
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("speed", self.speed),
            ("raycast_distance", self.raycast_distance),
            ("stuck_threshold", self.stuck_threshold),
            ("stuck_force", self.stuck_force),
            ("stuck_cooldown", self.stuck_cooldown),
            ("stop_duration", self.stop_duration),
            ("rotation_speed", self.rotation_speed),
            ("min_move_distance", self.min_move_distance),
            ("max_surface_distance", self.max_surface_distance),
        ];

        for (name, value) in non_negative {
            check_finite(name, value)?;
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }

        // Нулевой интервал = проверка каждый тик без накопления смещения
        check_finite("stuck_check_interval", self.stuck_check_interval)?;
        if self.stuck_check_interval <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "stuck_check_interval",
                value: self.stuck_check_interval,
            });
        }

        Ok(())
    }
}

fn check_finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { name, value })
    }
}
