//! Decision: ShouldTick gate → perception refresh → OnPerceptionUpdate → Evaluate.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::systems::sensing::{nearest_target, refresh_perception};
use crate::ai::{
    AIState, AIStateMachine, AbilityCooldown, Archetype, DirtyFlags, ForceStateRequest, GuardContext,
    PatrolPattern, Perception, StateChanged, TransitionTables, UpdateScheduler, Viewport,
};
use crate::combat::SkillCast;
use crate::components::{Health, Target, WorldPosition};
use crate::config::AIConfig;
use crate::DeterministicRng;

/// System: внешние ForceStateRequest (skill provider)
///
/// Идёт через тот же `change_state`, что и evaluation: Dead остаётся терминальным.
pub fn apply_force_state_requests(
    mut requests: EventReader<ForceStateRequest>,
    mut agents: Query<(&mut AIStateMachine, &mut UpdateScheduler, &mut SkillCast)>,
    mut state_events: EventWriter<StateChanged>,
) {
    for request in requests.read() {
        let Ok((mut machine, mut scheduler, mut cast)) = agents.get_mut(request.entity) else {
            crate::log_warning(&format!(
                "ForceStateRequest: unknown agent {:?} ({})",
                request.entity, request.state
            ));
            continue;
        };

        let change = if request.state == AIState::Dead {
            if !machine.is_dead() {
                cast.clear();
            }
            machine.force_kill("forced")
        } else {
            machine.change_state(request.state, "forced")
        };

        if let Some(change) = change {
            scheduler.mark_dirty(DirtyFlags::FORCED);
            crate::log(&format!(
                "🎯 {:?}: forced {} → {}",
                request.entity, change.from, change.to
            ));
            state_events.write(StateChanged::new(request.entity, change));
        }
    }
}

/// System: полный behavior tick для агентов, которым scheduler разрешил
pub fn evaluate_transitions(
    mut agents: Query<(
        Entity,
        &WorldPosition,
        &Health,
        &mut AIStateMachine,
        &mut Perception,
        &mut UpdateScheduler,
        &AIConfig,
        &Archetype,
        &AbilityCooldown,
    )>,
    targets: Query<(Entity, &WorldPosition, &Health), With<Target>>,
    tables: Res<TransitionTables>,
    viewport: Res<Viewport>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut state_events: EventWriter<StateChanged>,
) {
    let now = time.elapsed_secs();

    for (entity, position, health, mut machine, mut perception, mut scheduler, config, archetype, ability) in
        agents.iter_mut()
    {
        // Idle/Patrol бросок идёт по своему расписанию, а не по cadence scheduler'а:
        // иначе видимый агент бросал бы чаще невидимого
        let roll_first_at = config.first_roll_at(machine.current());
        let roll_due = machine.roll_due(roll_first_at);
        let scheduled = scheduler.should_tick(now, machine.current(), position.0, &viewport);
        if !scheduled && !roll_due {
            continue;
        }

        let dirty = scheduler.dirty();
        if !dirty.is_empty() {
            crate::log(&format!("🔔 {:?}: tick in {} (dirty {:?})", entity, machine.current(), dirty));
        }

        // Полный refresh: между detection checks цель могла сдвинуться
        refresh_perception(&mut perception, position.0, nearest_target(position.0, &targets));
        perception.last_check = Some(now);

        let ability_ready = ability.is_ready(now) && machine.capabilities().can_charge;
        let hook_flags = archetype.on_perception_update(perception.snapshot(), ability_ready);

        // Бросок до evaluation: guards остаются чистыми
        let roll = roll_due.then(|| rng.rng.gen::<f32>());

        let ctx = GuardContext {
            state: machine.current(),
            state_timer: machine.state_timer(),
            perception: perception.snapshot(),
            health: health.current,
            movement_allowed: machine.capabilities().can_move
                && archetype.patrol_pattern() == PatrolPattern::Oscillate,
            hold_released: machine.hold_released(),
            ability_ready,
            roll,
            config,
            archetype,
        };

        let table = tables.get(archetype.kind());
        let change = machine.evaluate(table, &ctx);

        if change.is_none() {
            if let Some(first_at) = roll_first_at.filter(|_| roll_due) {
                machine.consume_roll(first_at, config.roll_interval);
            }
        }

        // Внеочередной проход ради броска cadence не сдвигает
        if scheduled {
            scheduler.record_tick(now);
        }
        // Флаги hook'а переживают tick: окно способности будит агента повторно
        scheduler.mark_dirty(hook_flags);

        if let Some(change) = change {
            crate::log(&format!(
                "🧠 {:?}: {} → {} ({})",
                entity, change.from, change.to, change.label
            ));
            state_events.write(StateChanged::new(entity, change));
        }
    }
}
