//! Movement/Physics provider adapters
//!
//! Core только пишет `DesiredVelocity`. Здесь два адаптера:
//! - headless: интегрируем velocity прямо в `WorldPosition` (тесты, сервер)
//! - rapier: пишем в `Velocity` rigid body, позицию читаем обратно из `Transform`

pub mod velocity;

// Re-export основных типов
pub use velocity::{integrate_desired_velocity, read_back_rapier_positions, sync_desired_velocity_to_rapier};

use bevy::prelude::*;

use crate::SimulationSet;

/// Physics adapters plugin
///
/// Rapier step сам по себе сюда не входит - его подключает хост-приложение
/// (`RapierPhysicsPlugin`). Без него rapier-системы просто ничего не находят.
pub struct PhysicsAdapterPlugin;

impl Plugin for PhysicsAdapterPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_simulation_sets(app);

        app.add_systems(
            FixedUpdate,
            (
                read_back_rapier_positions.in_set(SimulationSet::Timers),
                (integrate_desired_velocity, sync_desired_velocity_to_rapier)
                    .in_set(SimulationSet::Action)
                    .after(crate::ai::systems::emit_desired_velocity),
            ),
        );
    }
}
