//! Combat Resolution Hooks: ApplyDamage / Die
//!
//! Чистые функции над компонентами агента; ECS-системы в `combat::systems` только читают
//! события и раскладывают результат обратно в события.
//!
//! Порядок в ApplyDamage:
//! 1. mitigation: applied = max(1, amount - defense)
//! 2. health -= applied
//! 3. health == 0 → Dead, ранний выход (без Hurt и без interrupt)
//! 4. иначе: mid-cast → interrupt, затем Hurt

use bevy::prelude::*;

use crate::ai::{AIState, AIStateMachine, StateChange};
use crate::combat::{SkillCast, SkillKind};
use crate::components::{CombatStats, Health};

/// Тип урона
///
/// Mitigation пока одинаковая для обоих: defense вычитается из любого урона.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum DamageKind {
    #[default]
    Physical,
    Magical,
}

/// Запрос нанести урон агенту (от игрока, ловушки, снаряда)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub target: Entity,
    pub amount: u32,
    pub kind: DamageKind,
    /// Откуда пришёл удар (агент разворачивается к источнику)
    pub source_position: Option<Vec2>,
}

/// Урон применён к агенту
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageApplied {
    pub entity: Entity,
    pub applied: u32,
    pub remaining_health: u32,
    pub killed: bool,
}

/// Explicit force-kill (Die)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillRequest {
    pub entity: Entity,
}

/// Агент вошёл в Dead (ровно один раз на агента)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDied {
    pub entity: Entity,
}

/// Агент бьёт Target Provider
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentAttack {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
}

/// Урон нанесён цели агентом
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub target_died: bool,
}

/// Mitigation с floor 1: chip damage всегда проходит
pub fn mitigate(amount: u32, defense: u32, kind: DamageKind) -> u32 {
    let reduced = match kind {
        DamageKind::Physical | DamageKind::Magical => amount.saturating_sub(defense),
    };
    reduced.max(1)
}

/// Результат ApplyDamage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub applied: u32,
    pub killed: bool,
    /// Прерванный каст (только если агент выжил)
    pub interrupted: Option<SkillKind>,
    /// Переход в Hurt/Dead (None если агент уже был в Hurt)
    pub change: Option<StateChange>,
}

/// ApplyDamage. `None` - агент уже мёртв, вызов проигнорирован.
pub fn apply_damage(
    machine: &mut AIStateMachine,
    health: &mut Health,
    stats: &CombatStats,
    cast: &mut SkillCast,
    amount: u32,
    kind: DamageKind,
) -> Option<DamageOutcome> {
    if machine.is_dead() {
        crate::log("💀 ApplyDamage on dead agent ignored");
        return None;
    }

    let applied = mitigate(amount, stats.defense, kind);
    health.take_damage(applied);

    if !health.is_alive() {
        // Смерть обходит interrupt
        cast.clear();
        let change = machine.change_state(AIState::Dead, "health depleted");
        return Some(DamageOutcome {
            applied,
            killed: true,
            interrupted: None,
            change,
        });
    }

    let interrupted = if cast.is_mid_cast() {
        cast.interrupt()
    } else {
        None
    };
    let change = machine.change_state(AIState::Hurt, "took damage");

    Some(DamageOutcome {
        applied,
        killed: false,
        interrupted,
        change,
    })
}

/// Die: идемпотентно, health не трогает
pub fn die(machine: &mut AIStateMachine, cast: &mut SkillCast) -> Option<StateChange> {
    if machine.is_dead() {
        crate::log("💀 Die on dead agent ignored");
        return None;
    }
    cast.clear();
    machine.force_kill("killed")
}
