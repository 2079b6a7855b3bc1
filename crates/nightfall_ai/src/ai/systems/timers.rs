//! Timers: state timer, deferred actions (hold release, cast completion).

use bevy::prelude::*;

use crate::ai::{AIStateMachine, DeferredActions, DeferredKind, DirtyFlags, Perception, UpdateScheduler};
use crate::combat::{AgentAttack, SkillCast, SkillKind, SkillReleased};
use crate::components::CombatStats;

/// System: stateTimer += dt для всех живых FSM
pub fn tick_state_timers(mut machines: Query<&mut AIStateMachine>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut machine in machines.iter_mut() {
        if !machine.is_dead() {
            machine.tick(delta);
        }
    }
}

/// System: срабатывание deferred actions
///
/// Каждое действие проверяется guard'ом "всё ещё в ожидаемом состоянии той же generation".
/// Stale действия выбрасываются с debug логом - агент мог уйти из состояния или умереть.
pub fn fire_deferred_actions(
    mut agents: Query<(
        Entity,
        &mut DeferredActions,
        &mut AIStateMachine,
        &mut SkillCast,
        &mut UpdateScheduler,
        &Perception,
        &CombatStats,
    )>,
    time: Res<Time<Fixed>>,
    mut released_events: EventWriter<SkillReleased>,
    mut attack_events: EventWriter<AgentAttack>,
) {
    let now = time.elapsed_secs();

    for (entity, mut deferred, mut machine, mut cast, mut scheduler, perception, stats) in agents.iter_mut() {
        if deferred.is_empty() {
            continue;
        }

        for action in deferred.drain_due(now) {
            if !action.is_current(machine.current(), machine.generation()) {
                crate::log(&format!(
                    "⏱️ {:?}: stale {:?} for {} (gen {}), now {} (gen {})",
                    entity,
                    action.kind,
                    action.expected_state,
                    action.generation,
                    machine.current(),
                    machine.generation()
                ));
                continue;
            }

            match action.kind {
                DeferredKind::ReleaseHold => {
                    machine.release_hold(action.expected_state, action.generation);
                    scheduler.mark_dirty(DirtyFlags::HOLD_RELEASED);

                    // Рывок закончился штатно
                    if matches!(cast.active, Some(active) if active.skill == SkillKind::Charge) {
                        if let Some(done) = cast.finish() {
                            released_events.write(SkillReleased {
                                entity,
                                skill: done.skill,
                                target: perception.target,
                            });
                        }
                    }
                }
                DeferredKind::CompleteCast => {
                    let Some(done) = cast.active.filter(|active| active.generation == action.generation) else {
                        continue;
                    };
                    cast.finish();
                    scheduler.mark_dirty(DirtyFlags::ATTACK_STATE_CHANGED);

                    released_events.write(SkillReleased {
                        entity,
                        skill: done.skill,
                        target: perception.target,
                    });

                    // Melee swing бьёт цель, если она ещё в радиусе; остальное - skill provider
                    if done.skill == SkillKind::MeleeSwing && perception.snapshot().in_attack_range {
                        if let Some(target) = perception.target {
                            attack_events.write(AgentAttack {
                                attacker: entity,
                                target,
                                damage: stats.attack_damage,
                            });
                        }
                    }
                }
            }
        }
    }
}
