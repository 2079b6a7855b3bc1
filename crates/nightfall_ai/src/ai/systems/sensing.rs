//! Sensing: дешёвый detection check на собственном cadence.
//!
//! Полный tick FSM может быть редким (off-screen 0.5s), а вход цели в радиус должен
//! будить агента сразу. Поэтому perception проверяется чаще, и diff превращается в dirty flags.

use bevy::prelude::*;

use crate::ai::{AIStateMachine, AbilityCooldown, Archetype, Perception, UpdateScheduler};
use crate::components::{Health, Target, WorldPosition};
use crate::config::AIConfig;

/// Ближайшая живая цель (tie-break по Entity для детерминизма)
pub fn nearest_target(
    position: Vec2,
    targets: &Query<(Entity, &WorldPosition, &Health), With<Target>>,
) -> Option<(Entity, Vec2)> {
    targets
        .iter()
        .filter(|(_, _, health)| health.is_alive())
        .map(|(entity, target_pos, _)| (entity, target_pos.0))
        .min_by(|(a_entity, a_pos), (b_entity, b_pos)| {
            position
                .distance_squared(*a_pos)
                .total_cmp(&position.distance_squared(*b_pos))
                .then(a_entity.cmp(b_entity))
        })
}

/// Обновить perception агента из Target Provider. Возвращает изменения.
pub fn refresh_perception(
    perception: &mut Perception,
    position: Vec2,
    target: Option<(Entity, Vec2)>,
) -> crate::ai::DirtyFlags {
    match target {
        Some((entity, target_position)) => {
            perception.target = Some(entity);
            perception.update(position, Some(target_position))
        }
        // Нет цели (или мертва) → "no target", chase/attack недостижимы
        None => perception.clear(),
    }
}

/// System: detection check по `detection_check_interval`
pub fn sense_targets(
    mut agents: Query<(
        &WorldPosition,
        &AIStateMachine,
        &mut Perception,
        &mut UpdateScheduler,
        &AIConfig,
        &Archetype,
        &AbilityCooldown,
    )>,
    targets: Query<(Entity, &WorldPosition, &Health), With<Target>>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for (position, machine, mut perception, mut scheduler, config, archetype, ability) in agents.iter_mut() {
        if machine.is_dead() || !perception.check_due(now, config.detection_check_interval) {
            continue;
        }
        perception.last_check = Some(now);

        let mut changes = refresh_perception(&mut perception, position.0, nearest_target(position.0, &targets));
        changes |= archetype.on_perception_update(perception.snapshot(), ability.is_ready(now));

        if !changes.is_empty() {
            scheduler.mark_dirty(changes);
        }
    }
}
