//! Perception Unit - distance-based отношения агент ↔ цель.
//!
//! Snapshot пересчитывается из позиций каждый check, ничего не хранится кроме последнего
//! результата. Изменения между snapshot'ами превращаются в dirty flags для scheduler.

use bevy::prelude::*;

use crate::ai::DirtyFlags;
use crate::error::{ConfigError, Result};

/// Радиусы восприятия
///
/// Инвариант: 0 ≤ attack ≤ detection ≤ lose_target.
/// Без него агент на границе радиусов прыгал бы Chase ↔ Patrol каждый tick.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PerceptionRadii {
    detection: f32,
    attack: f32,
    lose_target: f32,
}

impl PerceptionRadii {
    pub fn new(detection: f32, attack: f32, lose_target: f32) -> Result<Self> {
        for (name, value) in [
            ("detection", detection),
            ("attack", attack),
            ("lose-target", lose_target),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRadius { name, value });
            }
        }
        if attack > detection {
            return Err(ConfigError::AttackOutsideDetection { attack, detection });
        }
        if lose_target < detection {
            return Err(ConfigError::LoseTargetInsideDetection {
                detection,
                lose_target,
            });
        }

        Ok(Self {
            detection,
            attack,
            lose_target,
        })
    }

    pub fn detection(&self) -> f32 {
        self.detection
    }

    pub fn attack(&self) -> f32 {
        self.attack
    }

    pub fn lose_target(&self) -> f32 {
        self.lose_target
    }
}

/// Результат одного perception check
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PerceptionSnapshot {
    pub has_target: bool,
    pub distance_to_target: f32,
    /// Последняя известная позиция цели (для chase/facing)
    pub target_position: Vec2,
    pub in_detection_range: bool,
    pub in_attack_range: bool,
    pub has_lost_target: bool,
}

impl Default for PerceptionSnapshot {
    /// "Нет цели": chase/attack недостижимы
    fn default() -> Self {
        Self {
            has_target: false,
            distance_to_target: f32::INFINITY,
            target_position: Vec2::ZERO,
            in_detection_range: false,
            in_attack_range: false,
            has_lost_target: true,
        }
    }
}

impl PerceptionSnapshot {
    /// Diff против предыдущего snapshot → dirty flags
    pub fn changes_from(&self, previous: &PerceptionSnapshot) -> DirtyFlags {
        let mut flags = DirtyFlags::empty();
        if self.in_detection_range != previous.in_detection_range {
            flags |= DirtyFlags::TARGET_IN_RANGE;
        }
        if self.in_attack_range != previous.in_attack_range {
            flags |= DirtyFlags::TARGET_IN_ATTACK_RANGE;
        }
        if self.has_lost_target != previous.has_lost_target {
            flags |= DirtyFlags::TARGET_LOST;
        }
        flags
    }
}

/// Perception компонент агента
#[derive(Component, Debug, Clone)]
pub struct Perception {
    pub radii: PerceptionRadii,
    snapshot: PerceptionSnapshot,
    /// Entity цели из последнего check (для AgentAttack)
    pub target: Option<Entity>,
    /// last-detection-check timestamp
    pub last_check: Option<f32>,
}

impl Perception {
    pub fn new(radii: PerceptionRadii) -> Self {
        Self {
            radii,
            snapshot: PerceptionSnapshot::default(),
            target: None,
            last_check: None,
        }
    }

    pub fn snapshot(&self) -> &PerceptionSnapshot {
        &self.snapshot
    }

    /// Refresh: чистое вычисление snapshot без побочных эффектов
    ///
    /// `target == None` → восприятие не меняется, все флаги сохраняют предыдущие значения.
    pub fn refresh(&self, agent_position: Vec2, target: Option<Vec2>) -> PerceptionSnapshot {
        let Some(target_position) = target else {
            return self.snapshot;
        };

        let distance = agent_position.distance(target_position);
        PerceptionSnapshot {
            has_target: true,
            distance_to_target: distance,
            target_position,
            in_detection_range: distance <= self.radii.detection,
            in_attack_range: distance <= self.radii.attack,
            has_lost_target: distance > self.radii.lose_target,
        }
    }

    /// Refresh + сохранить snapshot, вернуть что изменилось
    pub fn update(&mut self, agent_position: Vec2, target: Option<Vec2>) -> DirtyFlags {
        let next = self.refresh(agent_position, target);
        let changes = next.changes_from(&self.snapshot);
        self.snapshot = next;
        changes
    }

    /// Target provider отсутствует (или цель мертва) → "нет цели"
    pub fn clear(&mut self) -> DirtyFlags {
        let next = PerceptionSnapshot::default();
        let changes = next.changes_from(&self.snapshot);
        self.snapshot = next;
        self.target = None;
        changes
    }

    /// Пора ли делать дешёвый detection check
    pub fn check_due(&self, now: f32, interval: f32) -> bool {
        self.last_check.map_or(true, |last| now - last >= interval)
    }
}
