//! Action: state → desired velocity + facing.
//!
//! Мир side-scroller: агент двигается по горизонтали, физика (гравитация, прыжки,
//! knockback) - забота Movement/Physics provider.

use bevy::prelude::*;

use crate::ai::{AIState, AIStateMachine, Archetype, PatrolPattern, PatrolPath, Perception};
use crate::components::{DesiredVelocity, Locomotion, WorldPosition};

/// Ближе этого по X к цели не дёргаемся (иначе jitter влево-вправо)
const CHASE_DEADZONE: f32 = 0.05;

pub fn emit_desired_velocity(
    mut agents: Query<(
        &AIStateMachine,
        &mut PatrolPath,
        &mut Locomotion,
        &mut DesiredVelocity,
        &WorldPosition,
        &Perception,
        &Archetype,
    )>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for (machine, mut patrol, mut locomotion, mut velocity, position, perception, archetype) in agents.iter_mut() {
        let snapshot = perception.snapshot();

        let desired = match machine.current() {
            AIState::Patrol if archetype.patrol_pattern() == PatrolPattern::Oscillate => {
                patrol.refresh_endpoints(now, position.0);
                let direction = patrol.steer(now, position.0, locomotion.facing_right);
                direction.as_vec2() * locomotion.move_speed
            }
            AIState::Chase if machine.capabilities().can_move && snapshot.has_target => {
                let dx = snapshot.target_position.x - position.0.x;
                if dx.abs() <= CHASE_DEADZONE {
                    Vec2::ZERO
                } else {
                    Vec2::new(dx.signum() * locomotion.chase_speed(), 0.0)
                }
            }
            AIState::Charge => {
                // Рывок по facing, зафиксированному на входе
                let sign = if locomotion.facing_right { 1.0 } else { -1.0 };
                Vec2::new(sign * locomotion.move_speed * archetype.charge_speed_multiplier(), 0.0)
            }
            AIState::Attack => {
                if snapshot.has_target {
                    locomotion.face_towards(position.0, snapshot.target_position);
                }
                Vec2::ZERO
            }
            _ => Vec2::ZERO,
        };

        if desired.x > f32::EPSILON {
            locomotion.facing_right = true;
        } else if desired.x < -f32::EPSILON {
            locomotion.facing_right = false;
        }

        if velocity.0 != desired {
            velocity.0 = desired;
        }
    }
}
