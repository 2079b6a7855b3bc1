//! Error types for agent construction.
//!
//! Configuration is validated once, at spawn time. Nothing here is clamped silently:
//! a bad radius ordering makes agents flip between Chase and Patrol every tick, so it
//! is rejected with a diagnostic instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Радиус отрицательный, NaN или бесконечный
    #[error("invalid {name} radius: {value} (must be finite and >= 0)")]
    InvalidRadius { name: &'static str, value: f32 },

    #[error("attack radius ({attack}) exceeds detection radius ({detection})")]
    AttackOutsideDetection { attack: f32, detection: f32 },

    #[error("lose-target radius ({lose_target}) is smaller than detection radius ({detection})")]
    LoseTargetInsideDetection { detection: f32, lose_target: f32 },

    /// Cooldown, длительность или интервал <= 0
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f32 },

    #[error("max health must be greater than zero")]
    ZeroMaxHealth,

    #[error("archetype '{archetype}': {reason}")]
    InvalidArchetype {
        archetype: &'static str,
        reason: String,
    },

    #[error("malformed agent configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Проверка: value > 0 и конечное
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Проверка: value >= 0 и конечное
pub(crate) fn ensure_non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

pub(crate) fn ensure_probability(name: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}
