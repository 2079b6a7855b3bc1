//! Desired velocity → тело.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{RigidBody, Velocity};

use crate::components::{DesiredVelocity, HeadlessBody, WorldPosition};

/// Система интеграции velocity → WorldPosition (headless режим, без Rapier)
pub fn integrate_desired_velocity(
    mut query: Query<(&DesiredVelocity, &mut WorldPosition), With<HeadlessBody>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (velocity, mut position) in query.iter_mut() {
        if velocity.0 != Vec2::ZERO {
            position.0 += velocity.0 * delta;
        }
    }
}

/// Desired velocity → rapier `Velocity` (плоскость x/y, z не трогаем)
pub fn sync_desired_velocity_to_rapier(
    mut query: Query<(&DesiredVelocity, &mut Velocity), Without<HeadlessBody>>,
) {
    for (desired, mut rapier_velocity) in query.iter_mut() {
        rapier_velocity.linvel.x = desired.0.x;
        rapier_velocity.linvel.y = desired.0.y;
    }
}

/// Rapier authoritative для позиции тела → WorldPosition для AI decisions
pub fn read_back_rapier_positions(
    mut query: Query<(&Transform, &mut WorldPosition), (With<RigidBody>, Without<HeadlessBody>)>,
) {
    for (transform, mut position) in query.iter_mut() {
        let current = transform.translation.truncate();
        if position.0 != current {
            position.0 = current;
        }
    }
}
