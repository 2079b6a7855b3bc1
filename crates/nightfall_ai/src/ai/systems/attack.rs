//! Action: исполнение атаки в Attack state.
//!
//! Атака = skill cast: SkillStarted → (windup / cast time) → CompleteCast deferred action →
//! SkillReleased (+ AgentAttack для melee). Повреждение в середине каста прерывает его.

use bevy::prelude::*;

use crate::ai::{AIState, AIStateMachine, Archetype, DeferredAction, DeferredActions, DeferredKind, Perception};
use crate::combat::{Attacker, SkillCast, SkillStarted};
use crate::components::{Locomotion, WorldPosition};

pub fn execute_attacks(
    mut agents: Query<(
        Entity,
        &AIStateMachine,
        &mut Attacker,
        &mut SkillCast,
        &mut DeferredActions,
        &mut Locomotion,
        &WorldPosition,
        &Perception,
        &Archetype,
    )>,
    time: Res<Time<Fixed>>,
    mut started_events: EventWriter<SkillStarted>,
) {
    let now = time.elapsed_secs();

    for (entity, machine, mut attacker, mut cast, mut deferred, mut locomotion, position, perception, archetype) in
        agents.iter_mut()
    {
        if machine.current() != AIState::Attack
            || !machine.capabilities().can_attack
            || !attacker.can_attack()
            || cast.is_mid_cast()
        {
            continue;
        }

        let snapshot = perception.snapshot();
        if snapshot.has_target {
            locomotion.face_towards(position.0, snapshot.target_position);
        }

        let skill = archetype.attack_skill();
        attacker.start_attack();
        cast.begin(skill, now, machine.generation());
        deferred.schedule(DeferredAction {
            fire_at: now + archetype.cast_time(attacker.windup),
            kind: DeferredKind::CompleteCast,
            expected_state: AIState::Attack,
            generation: machine.generation(),
        });

        crate::log(&format!("⚔️ {:?}: {:?} started", entity, skill));
        started_events.write(SkillStarted { entity, skill });
    }
}
