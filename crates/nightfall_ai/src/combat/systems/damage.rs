//! Damage / kill request processing.

use bevy::prelude::*;

use crate::ai::{AIStateMachine, DirtyFlags, StateChanged, UpdateScheduler};
use crate::combat::{
    apply_damage, die, AgentAttack, DamageApplied, DamageDealt, DamageRequest, InterruptReason, KillRequest,
    SkillCast, SkillInterrupted,
};
use crate::components::{CombatStats, Health, Locomotion, Target, WorldPosition};

/// Система: DamageRequest → ApplyDamage
///
/// 1. mitigation + health
/// 2. разворот к источнику урона
/// 3. DamageApplied, SkillInterrupted (если каст прерван), StateChanged (Hurt/Dead)
pub fn process_damage_requests(
    mut requests: EventReader<DamageRequest>,
    mut agents: Query<(
        &mut AIStateMachine,
        &mut Health,
        &CombatStats,
        &mut SkillCast,
        &mut UpdateScheduler,
        &mut Locomotion,
        &WorldPosition,
    )>,
    mut applied_events: EventWriter<DamageApplied>,
    mut interrupt_events: EventWriter<SkillInterrupted>,
    mut state_events: EventWriter<StateChanged>,
) {
    for request in requests.read() {
        let Ok((mut machine, mut health, stats, mut cast, mut scheduler, mut locomotion, position)) =
            agents.get_mut(request.target)
        else {
            crate::log_warning(&format!("DamageRequest: unknown agent {:?}", request.target));
            continue;
        };

        let Some(outcome) = apply_damage(
            &mut machine,
            &mut health,
            stats,
            &mut cast,
            request.amount,
            request.kind,
        ) else {
            continue;
        };

        if let Some(source) = request.source_position {
            locomotion.face_towards(position.0, source);
        }
        scheduler.mark_dirty(DirtyFlags::HEALTH_CHANGED);

        crate::log(&format!(
            "🩸 {:?}: {} {:?} damage → {} applied (health {}/{})",
            request.target, request.amount, request.kind, outcome.applied, health.current, health.max
        ));

        applied_events.write(DamageApplied {
            entity: request.target,
            applied: outcome.applied,
            remaining_health: health.current,
            killed: outcome.killed,
        });

        if let Some(skill) = outcome.interrupted {
            interrupt_events.write(SkillInterrupted {
                entity: request.target,
                skill,
                reason: InterruptReason::Damage,
            });
        }

        if let Some(change) = outcome.change {
            state_events.write(StateChanged::new(request.target, change));
        }
    }
}

/// Система: KillRequest → Die (идемпотентно)
pub fn process_kill_requests(
    mut requests: EventReader<KillRequest>,
    mut agents: Query<(&mut AIStateMachine, &mut SkillCast)>,
    mut state_events: EventWriter<StateChanged>,
) {
    for request in requests.read() {
        let Ok((mut machine, mut cast)) = agents.get_mut(request.entity) else {
            crate::log_warning(&format!("KillRequest: unknown agent {:?}", request.entity));
            continue;
        };

        if let Some(change) = die(&mut machine, &mut cast) {
            state_events.write(StateChanged::new(request.entity, change));
        }
    }
}

/// Система: AgentAttack → Health цели (Target Provider "take damage")
pub fn resolve_agent_attacks(
    mut attacks: EventReader<AgentAttack>,
    mut targets: Query<&mut Health, With<Target>>,
    mut dealt_events: EventWriter<DamageDealt>,
) {
    for attack in attacks.read() {
        let Ok(mut health) = targets.get_mut(attack.target) else {
            crate::log(&format!("AgentAttack: target {:?} is gone", attack.target));
            continue;
        };

        let was_alive = health.is_alive();
        health.take_damage(attack.damage);
        let target_died = was_alive && !health.is_alive();

        dealt_events.write(DamageDealt {
            attacker: attack.attacker,
            target: attack.target,
            damage: attack.damage,
            target_died,
        });

        if target_died {
            crate::log_info(&format!("🎯 Target {:?} killed by {:?}", attack.target, attack.attacker));
        }
    }
}
