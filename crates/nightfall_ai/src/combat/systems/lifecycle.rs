//! Death lifecycle: Dead маркер и удаление после grace period.
//!
//! Задержка принадлежит lifecycle агента, а не FSM. Все deferred actions живут на entity
//! и уходят вместе с ней при despawn - поздний таймер просто не найдёт агента.

use bevy::prelude::*;

use crate::combat::AgentDied;
use crate::config::AIConfig;

/// Компонент-маркер: агент мёртв
///
/// Используется для визуальных эффектов (death animation, fade-out).
#[derive(Component, Debug)]
pub struct Dead;

/// Компонент-маркер: деспавн entity после указанного времени
#[derive(Component, Debug)]
pub struct DespawnAfter {
    /// Время деспавна (в секундах от старта симуляции)
    pub despawn_time: f32,
}

/// Система: AgentDied → Dead + DespawnAfter(now + grace period)
pub fn mark_dead_agents(
    mut commands: Commands,
    mut deaths: EventReader<AgentDied>,
    configs: Query<&AIConfig>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for death in deaths.read() {
        let grace = configs
            .get(death.entity)
            .map(|config| config.death_grace_period)
            .unwrap_or_else(|_| AIConfig::default().death_grace_period);

        if let Ok(mut entity_commands) = commands.get_entity(death.entity) {
            entity_commands.insert((
                Dead,
                DespawnAfter {
                    despawn_time: now + grace,
                },
            ));
        }
    }
}

pub fn despawn_after_timeout(
    mut commands: Commands,
    query: Query<(Entity, &DespawnAfter)>,
    time: Res<Time<Fixed>>,
) {
    let current_time = time.elapsed_secs();

    for (entity, despawn_after) in query.iter() {
        if current_time >= despawn_after.despawn_time {
            crate::log_info(&format!("⚰️ Despawning entity {:?} (grace period over)", entity));
            commands.entity(entity).despawn();
        }
    }
}
