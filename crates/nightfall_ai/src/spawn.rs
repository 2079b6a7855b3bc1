//! Spawner: валидированный `AgentConfig` → entity агента.
//!
//! Конфиг копируется в компоненты один раз. После спавна core его не перечитывает.

use bevy::prelude::*;

use crate::ai::{
    AIStateMachine, AbilityCooldown, Archetype, DeferredActions, Perception, PatrolPath, UpdateScheduler,
};
use crate::combat::{Attacker, SkillCast};
use crate::components::{Agent, CombatStats, DesiredVelocity, Health, Locomotion, Target, WorldPosition};
use crate::config::{AIConfig, AgentConfig};
use crate::error::Result;

/// Полный набор компонентов агента
#[derive(Bundle)]
pub struct AgentBundle {
    pub agent: Agent,
    pub health: Health,
    pub stats: CombatStats,
    pub locomotion: Locomotion,
    pub position: WorldPosition,
    pub velocity: DesiredVelocity,
    pub machine: AIStateMachine,
    pub perception: Perception,
    pub patrol: PatrolPath,
    pub scheduler: UpdateScheduler,
    pub deferred: DeferredActions,
    pub behavior: AIConfig,
    pub archetype: Archetype,
    pub ability: AbilityCooldown,
    pub cast: SkillCast,
    pub attacker: Attacker,
}

impl AgentBundle {
    /// `id` - стабильный идентификатор от spawner'а, `now` - время спавна
    pub fn from_config(config: &AgentConfig, id: u64, position: Vec2, now: f32) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            agent: Agent {
                id,
                level: config.level,
                name: config.name.clone(),
            },
            health: Health::new(config.max_health),
            stats: CombatStats {
                attack_damage: config.attack_damage,
                defense: config.defense,
            },
            locomotion: Locomotion {
                move_speed: config.move_speed,
                chase_speed_multiplier: config.chase_speed_multiplier,
                facing_right: true,
            },
            position: WorldPosition(position),
            velocity: DesiredVelocity::default(),
            machine: AIStateMachine::new(),
            perception: Perception::new(config.perception_radii()?),
            patrol: PatrolPath::new(id, position, config.patrol_range, config.patrol_wait_time, now),
            scheduler: UpdateScheduler::new(&config.scheduler),
            deferred: DeferredActions::default(),
            behavior: config.behavior.clone(),
            archetype: config.archetype.clone(),
            ability: AbilityCooldown::default(),
            cast: SkillCast::default(),
            attacker: Attacker::new(config.attack_cooldown, config.attack_windup),
        })
    }
}

/// Spawn агента. Невалидный конфиг → ошибка, entity не создаётся.
pub fn spawn_agent(
    commands: &mut Commands,
    config: &AgentConfig,
    id: u64,
    position: Vec2,
    now: f32,
) -> Result<Entity> {
    let bundle = AgentBundle::from_config(config, id, position, now).map_err(|err| {
        crate::log_warning(&format!("Rejected agent config '{}': {}", config.name, err));
        err
    })?;

    let entity = commands.spawn(bundle).id();
    crate::log_info(&format!(
        "✨ Spawned {} '{}' (id {}) at {:?} → {:?}",
        config.archetype.name(),
        config.name,
        id,
        position,
        entity
    ));
    Ok(entity)
}

/// Spawn Target Provider (игрок / манекен)
pub fn spawn_target(commands: &mut Commands, position: Vec2, max_health: u32) -> Entity {
    commands
        .spawn((Target, WorldPosition(position), Health::new(max_health)))
        .id()
}
