//! Agent configuration records.
//!
//! Spawner/level script отдаёт `AgentConfig` (JSON); core читает его один раз при спавне.
//! После спавна конфиг больше не перечитывается (кроме patrol endpoints - они живут в
//! `PatrolPath`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::{AIState, Archetype, PerceptionRadii};
use crate::error::{ensure_non_negative, ensure_positive, ensure_probability, ConfigError, Result};

/// Параметры FSM: dwell times, шансы переходов, hold durations
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
#[serde(default)]
pub struct AIConfig {
    /// Минимум секунд в Idle до броска Idle → Patrol
    pub min_idle_dwell: f32,
    /// Минимум секунд в Patrol до броска Patrol → Idle
    pub min_patrol_dwell: f32,
    /// Минимум секунд в Chase до Chase → Patrol (hysteresis band)
    pub min_chase_dwell: f32,
    pub idle_to_patrol_chance: f32,
    pub patrol_to_idle_chance: f32,
    /// Шаг между повторными бросками Idle/Patrol после dwell (не зависит от cadence scheduler'а)
    pub roll_interval: f32,
    pub hurt_duration: f32,
    pub stun_duration: f32,
    /// Cadence дешёвого detection check (секунды)
    pub detection_check_interval: f32,
    /// Задержка между Dead и удалением из симуляции (death animation/audio)
    pub death_grace_period: f32,
}

impl Default for AIConfig {
    fn default() -> Self {
        Self {
            min_idle_dwell: 2.0,
            min_patrol_dwell: 3.0,
            min_chase_dwell: 2.0,
            idle_to_patrol_chance: 0.7,
            patrol_to_idle_chance: 0.3,
            roll_interval: 1.0,
            hurt_duration: 0.4,
            stun_duration: 1.5,
            detection_check_interval: 0.1,
            death_grace_period: 2.0,
        }
    }
}

impl AIConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("min_idle_dwell", self.min_idle_dwell)?;
        ensure_non_negative("min_patrol_dwell", self.min_patrol_dwell)?;
        ensure_non_negative("min_chase_dwell", self.min_chase_dwell)?;
        ensure_probability("idle_to_patrol_chance", self.idle_to_patrol_chance)?;
        ensure_probability("patrol_to_idle_chance", self.patrol_to_idle_chance)?;
        ensure_positive("roll_interval", self.roll_interval)?;
        ensure_positive("hurt_duration", self.hurt_duration)?;
        ensure_positive("stun_duration", self.stun_duration)?;
        ensure_positive("detection_check_interval", self.detection_check_interval)?;
        ensure_non_negative("death_grace_period", self.death_grace_period)?;
        Ok(())
    }

    /// Время в состоянии, когда положен первый бросок (None - состояние без бросков)
    pub fn first_roll_at(&self, state: AIState) -> Option<f32> {
        match state {
            AIState::Idle => Some(self.min_idle_dwell),
            AIState::Patrol => Some(self.min_patrol_dwell),
            _ => None,
        }
    }
}

/// Интервалы visibility tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct SchedulerConfig {
    pub on_screen_interval: f32,
    pub off_screen_interval: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            on_screen_interval: 0.05,
            off_screen_interval: 0.5,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("on_screen_interval", self.on_screen_interval)?;
        ensure_positive("off_screen_interval", self.off_screen_interval)?;
        Ok(())
    }
}

/// Полный набор атрибутов агента от spawner'а
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub max_health: u32,
    pub move_speed: f32,
    pub chase_speed_multiplier: f32,
    pub attack_damage: u32,
    #[serde(default)]
    pub defense: u32,
    /// Cooldown между атаками (секунды)
    pub attack_cooldown: f32,
    /// Swing windup до попадания (секунды)
    pub attack_windup: f32,
    pub detection_radius: f32,
    pub attack_radius: f32,
    pub lose_target_radius: f32,
    pub patrol_range: f32,
    pub patrol_wait_time: f32,
    #[serde(default)]
    pub behavior: AIConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub archetype: Archetype,
}

fn default_level() -> u32 {
    1
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "grunt".to_string(),
            level: 1,
            max_health: 50,
            move_speed: 2.0,
            chase_speed_multiplier: 1.5,
            attack_damage: 10,
            defense: 2,
            attack_cooldown: 1.0,
            attack_windup: 0.35,
            detection_radius: 6.0,
            attack_radius: 1.5,
            lose_target_radius: 9.0,
            patrol_range: 6.0,
            patrol_wait_time: 2.0,
            behavior: AIConfig::default(),
            scheduler: SchedulerConfig::default(),
            archetype: Archetype::Grunt,
        }
    }
}

impl AgentConfig {
    /// Fail fast: любая ошибка конфигурации - descriptive error, без clamping
    pub fn validate(&self) -> Result<()> {
        if self.max_health == 0 {
            return Err(ConfigError::ZeroMaxHealth);
        }
        self.perception_radii()?;
        ensure_non_negative("move_speed", self.move_speed)?;
        ensure_positive("chase_speed_multiplier", self.chase_speed_multiplier)?;
        ensure_positive("attack_cooldown", self.attack_cooldown)?;
        ensure_positive("attack_windup", self.attack_windup)?;
        ensure_non_negative("patrol_range", self.patrol_range)?;
        ensure_positive("patrol_wait_time", self.patrol_wait_time)?;
        self.behavior.validate()?;
        self.scheduler.validate()?;
        self.archetype.validate()?;
        Ok(())
    }

    pub fn perception_radii(&self) -> Result<PerceptionRadii> {
        PerceptionRadii::new(
            self.detection_radius,
            self.attack_radius,
            self.lose_target_radius,
        )
    }

    /// Парсинг + валидация
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AgentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Список конфигов (spawn table уровня)
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        let configs: Vec<AgentConfig> = serde_json::from_str(json)?;
        for config in &configs {
            config.validate()?;
        }
        Ok(configs)
    }
}
