//! Enemy archetypes - strategy objects поверх одного общего FSM.
//!
//! Archetype не дублирует машину состояний. Он даёт три hook'а:
//! - `additional_rules` - правила перед стандартной таблицей (после death rule)
//! - `on_state_enter` - реакция на вход в состояние
//! - `on_perception_update` - может поднять dirty flags по свежему snapshot

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::transitions::{charge_window, hold_released, TransitionRule};
use crate::ai::{AIState, DirtyFlags, PerceptionSnapshot, StateChange};
use crate::combat::{SkillCast, SkillKind};
use crate::config::AIConfig;
use crate::error::{ConfigError, Result};

/// Charge без charger archetype (принудительный через skill provider)
pub const FORCED_CHARGE_DURATION: f32 = 0.5;
pub const DEFAULT_CHARGE_SPEED_MULTIPLIER: f32 = 2.5;

#[derive(Component, Debug, Clone, PartialEq, Default, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Archetype {
    /// Базовый melee: oscillating patrol, swing
    #[default]
    Grunt,
    /// Рывок к цели на дистанции, после рывка - оглушён
    Charger {
        charge_speed_multiplier: f32,
        charge_duration: f32,
        charge_cooldown: f32,
        min_charge_distance: f32,
    },
    /// Стоит на месте, атакует кастом
    Caster { cast_time: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchetypeKind {
    Grunt,
    Charger,
    Caster,
}

impl ArchetypeKind {
    pub const ALL: [ArchetypeKind; 3] = [
        ArchetypeKind::Grunt,
        ArchetypeKind::Charger,
        ArchetypeKind::Caster,
    ];

    pub fn default_archetype(self) -> Archetype {
        match self {
            ArchetypeKind::Grunt => Archetype::Grunt,
            ArchetypeKind::Charger => Archetype::Charger {
                charge_speed_multiplier: DEFAULT_CHARGE_SPEED_MULTIPLIER,
                charge_duration: 0.8,
                charge_cooldown: 4.0,
                min_charge_distance: 3.0,
            },
            ArchetypeKind::Caster => Archetype::Caster { cast_time: 0.9 },
        }
    }
}

/// Как archetype патрулирует
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolPattern {
    Oscillate,
    Stationary,
}

/// Cooldown special ability (charge)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct AbilityCooldown {
    pub ready_at: f32,
}

impl AbilityCooldown {
    pub fn is_ready(&self, now: f32) -> bool {
        now >= self.ready_at
    }

    pub fn trigger(&mut self, now: f32, cooldown: f32) {
        self.ready_at = now + cooldown;
    }
}

/// Что hook `on_state_enter` может трогать
pub struct EnterContext<'a> {
    pub now: f32,
    pub ability: &'a mut AbilityCooldown,
    pub cast: &'a mut SkillCast,
}

impl Archetype {
    pub fn kind(&self) -> ArchetypeKind {
        match self {
            Archetype::Grunt => ArchetypeKind::Grunt,
            Archetype::Charger { .. } => ArchetypeKind::Charger,
            Archetype::Caster { .. } => ArchetypeKind::Caster,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Grunt => "grunt",
            Archetype::Charger { .. } => "charger",
            Archetype::Caster { .. } => "caster",
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ConfigError::InvalidArchetype {
            archetype: self.name(),
            reason,
        };

        match *self {
            Archetype::Grunt => Ok(()),
            Archetype::Charger {
                charge_speed_multiplier,
                charge_duration,
                charge_cooldown,
                min_charge_distance,
            } => {
                for (name, value) in [
                    ("charge_speed_multiplier", charge_speed_multiplier),
                    ("charge_duration", charge_duration),
                    ("charge_cooldown", charge_cooldown),
                ] {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(invalid(format!("{name} must be positive, got {value}")));
                    }
                }
                if !(min_charge_distance.is_finite() && min_charge_distance >= 0.0) {
                    return Err(invalid(format!(
                        "min_charge_distance must not be negative, got {min_charge_distance}"
                    )));
                }
                Ok(())
            }
            Archetype::Caster { cast_time } => {
                if cast_time.is_finite() && cast_time > 0.0 {
                    Ok(())
                } else {
                    Err(invalid(format!("cast_time must be positive, got {cast_time}")))
                }
            }
        }
    }

    pub fn patrol_pattern(&self) -> PatrolPattern {
        match self {
            Archetype::Caster { .. } => PatrolPattern::Stationary,
            Archetype::Grunt | Archetype::Charger { .. } => PatrolPattern::Oscillate,
        }
    }

    pub fn attack_skill(&self) -> SkillKind {
        match self {
            Archetype::Caster { .. } => SkillKind::RangedBolt,
            Archetype::Grunt | Archetype::Charger { .. } => SkillKind::MeleeSwing,
        }
    }

    /// Время от начала атаки до release
    pub fn cast_time(&self, attack_windup: f32) -> f32 {
        match self {
            Archetype::Caster { cast_time } => *cast_time,
            Archetype::Grunt | Archetype::Charger { .. } => attack_windup,
        }
    }

    pub fn charge_speed_multiplier(&self) -> f32 {
        match self {
            Archetype::Charger {
                charge_speed_multiplier,
                ..
            } => *charge_speed_multiplier,
            Archetype::Grunt | Archetype::Caster { .. } => DEFAULT_CHARGE_SPEED_MULTIPLIER,
        }
    }

    /// Hold timer для состояний с hold (None - состояние без hold)
    pub fn hold_duration(&self, state: AIState, config: &AIConfig) -> Option<f32> {
        match state {
            AIState::Hurt => Some(config.hurt_duration),
            AIState::Stun => Some(config.stun_duration),
            AIState::Charge => Some(match self {
                Archetype::Charger {
                    charge_duration, ..
                } => *charge_duration,
                Archetype::Grunt | Archetype::Caster { .. } => FORCED_CHARGE_DURATION,
            }),
            _ => None,
        }
    }

    /// AdditionalGuards hook
    pub fn additional_rules(&self) -> Vec<TransitionRule> {
        match self {
            Archetype::Charger { .. } => vec![
                TransitionRule::new(AIState::Chase, AIState::Charge, charge_window, "charge"),
                TransitionRule::new(AIState::Charge, AIState::Stun, hold_released, "charge dazed"),
            ],
            Archetype::Grunt | Archetype::Caster { .. } => Vec::new(),
        }
    }

    /// OnStateEnter hook. Возвращает skill, если hook начал cast.
    pub fn on_state_enter(&self, change: &StateChange, ctx: EnterContext) -> Option<SkillKind> {
        match (self, change.to) {
            (
                Archetype::Charger {
                    charge_cooldown, ..
                },
                AIState::Charge,
            ) => {
                ctx.ability.trigger(ctx.now, *charge_cooldown);
                ctx.cast.begin(SkillKind::Charge, ctx.now, change.generation);
                Some(SkillKind::Charge)
            }
            _ => None,
        }
    }

    /// OnPerceptionUpdate hook
    pub fn on_perception_update(&self, snapshot: &PerceptionSnapshot, ability_ready: bool) -> DirtyFlags {
        match self {
            Archetype::Charger {
                min_charge_distance,
                ..
            } => {
                let window = ability_ready
                    && snapshot.in_detection_range
                    && !snapshot.in_attack_range
                    && snapshot.distance_to_target >= *min_charge_distance;
                if window {
                    DirtyFlags::CHARGE_STATE_CHANGED
                } else {
                    DirtyFlags::empty()
                }
            }
            Archetype::Grunt | Archetype::Caster { .. } => DirtyFlags::empty(),
        }
    }
}
