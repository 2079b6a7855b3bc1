//! Reaction: exit/enter последствия каждого StateChanged.
//!
//! Переход мог быть вызван evaluation, damage hook'ом или внешним запросом - реакция одна.
//! Если за кадр случилось несколько переходов, enter-эффекты применяются только для
//! актуальной generation; exit-эффекты (interrupt, invalidate) - для всех.
//! Animation signal "entered X" уходит на каждый StateChanged, даже если за кадр их несколько.

use bevy::prelude::*;

use crate::ai::{
    AIState, AIStateMachine, AbilityCooldown, AnimationSignal, Archetype, DeferredAction, DeferredActions,
    DeferredKind, DirtyFlags, EnterContext, PatrolPath, StateChange, StateChanged, UpdateScheduler,
};
use crate::combat::{AgentDied, InterruptReason, SkillCast, SkillInterrupted, SkillStarted};
use crate::components::DesiredVelocity;
use crate::config::AIConfig;

pub fn react_to_state_changes(
    mut changes: EventReader<StateChanged>,
    mut agents: Query<(
        &AIStateMachine,
        &mut PatrolPath,
        &mut UpdateScheduler,
        &mut DeferredActions,
        &mut SkillCast,
        &mut AbilityCooldown,
        &mut DesiredVelocity,
        &AIConfig,
        &Archetype,
    )>,
    time: Res<Time<Fixed>>,
    mut interrupt_events: EventWriter<SkillInterrupted>,
    mut started_events: EventWriter<SkillStarted>,
    mut death_events: EventWriter<AgentDied>,
    mut signals: EventWriter<AnimationSignal>,
) {
    let now = time.elapsed_secs();

    for event in changes.read() {
        let Ok((machine, mut patrol, mut scheduler, mut deferred, mut cast, mut ability, mut velocity, config, archetype)) =
            agents.get_mut(event.entity)
        else {
            // Агент уже удалён - no-op
            continue;
        };

        signals.write(AnimationSignal::StateEntered {
            entity: event.entity,
            state: event.to,
        });

        if event.from == AIState::Patrol {
            patrol.invalidate();
        }
        scheduler.mark_dirty(DirtyFlags::for_state(event.from) | DirtyFlags::for_state(event.to));

        // Выход из Attack/Charge посреди каста → interrupt. Смерть чистит каст молча.
        if matches!(event.from, AIState::Attack | AIState::Charge) && event.to != AIState::Dead {
            if let Some(skill) = cast.interrupt() {
                interrupt_events.write(SkillInterrupted {
                    entity: event.entity,
                    skill,
                    reason: InterruptReason::StateExit,
                });
            }
        }

        if event.to == AIState::Dead {
            let cancelled = deferred.cancel_all();
            cast.clear();
            velocity.0 = Vec2::ZERO;
            crate::log_info(&format!(
                "💀 {:?} died ({}), cancelled {} pending actions",
                event.entity, event.label, cancelled
            ));
            death_events.write(AgentDied { entity: event.entity });
            continue;
        }

        if event.generation != machine.generation() {
            continue;
        }

        deferred.cancel_stale(event.generation);

        if let Some(hold) = archetype.hold_duration(event.to, config) {
            deferred.schedule(DeferredAction {
                fire_at: now + hold,
                kind: DeferredKind::ReleaseHold,
                expected_state: event.to,
                generation: event.generation,
            });
        }

        let change = StateChange {
            from: event.from,
            to: event.to,
            label: event.label,
            generation: event.generation,
        };
        let started = archetype.on_state_enter(
            &change,
            EnterContext {
                now,
                ability: &mut *ability,
                cast: &mut *cast,
            },
        );
        if let Some(skill) = started {
            started_events.write(SkillStarted {
                entity: event.entity,
                skill,
            });
        }
    }
}

/// System: "entered Idle" для только что заспавненных агентов.
///
/// Идёт до `react_to_state_changes`, чтобы Idle спавна шёл раньше переходов того же кадра.
pub fn emit_spawn_signals(
    mut machines: Query<(Entity, &mut AIStateMachine)>,
    mut signals: EventWriter<AnimationSignal>,
) {
    for (entity, mut machine) in machines.iter_mut() {
        if !machine.spawn_signal_pending() {
            continue;
        }
        if let Some(state) = machine.take_spawn_signal() {
            signals.write(AnimationSignal::StateEntered { entity, state });
        }
    }
}
