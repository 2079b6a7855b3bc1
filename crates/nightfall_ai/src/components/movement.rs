//! Movement компоненты: позиция, скорость, desired velocity
//!
//! Core никогда не интегрирует физику сам: FSM пишет `DesiredVelocity`, а Movement/Physics
//! provider (rapier или headless integrator) двигает тело и пишет обратно `WorldPosition`.

use bevy::prelude::*;

/// Позиция агента в 2D плоскости симуляции (ECS authoritative для AI decisions)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct WorldPosition(pub Vec2);

/// Скорость движения + facing
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Locomotion {
    /// Базовая скорость (единиц/сек)
    pub move_speed: f32,
    /// Множитель скорости в Chase
    pub chase_speed_multiplier: f32,
    pub facing_right: bool,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            move_speed: 2.0, // 2 m/s - базовая скорость ходьбы
            chase_speed_multiplier: 1.5,
            facing_right: true,
        }
    }
}

impl Locomotion {
    pub fn chase_speed(&self) -> f32 {
        self.move_speed * self.chase_speed_multiplier
    }

    /// Развернуться к точке (без изменения если точка ровно по вертикали)
    pub fn face_towards(&mut self, from: Vec2, to: Vec2) {
        let dx = to.x - from.x;
        if dx > f32::EPSILON {
            self.facing_right = true;
        } else if dx < -f32::EPSILON {
            self.facing_right = false;
        }
    }
}

/// Желаемая скорость на этот tick (output FSM → physics provider)
///
/// Модуль вектора - "current speed magnitude" для animation provider.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct DesiredVelocity(pub Vec2);

impl DesiredVelocity {
    pub fn speed(&self) -> f32 {
        self.0.length()
    }
}

/// Маркер: тело двигается headless интегратором (без rapier)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct HeadlessBody;
