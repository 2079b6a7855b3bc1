//! Attacker component - cooldown и windup атаки агента
//!
//! FSM решает КОГДА атаковать (Attack state), Attacker - МОЖНО ли прямо сейчас.

use bevy::prelude::*;

/// Attacker - компонент для агентов которые могут атаковать
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Attacker {
    /// Cooldown между атаками (секунды)
    pub attack_cooldown: f32,

    /// Текущий cooldown таймер (уменьшается до 0)
    pub cooldown_timer: f32,

    /// Swing windup: от начала атаки до удара (секунды)
    pub windup: f32,
}

impl Default for Attacker {
    fn default() -> Self {
        Self {
            attack_cooldown: 1.0,
            cooldown_timer: 0.0,
            windup: 0.35,
        }
    }
}

impl Attacker {
    pub fn new(attack_cooldown: f32, windup: f32) -> Self {
        Self {
            attack_cooldown,
            cooldown_timer: 0.0,
            windup,
        }
    }

    /// Может ли атаковать (cooldown == 0)
    pub fn can_attack(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    /// Начать атаку (сбросить cooldown)
    pub fn start_attack(&mut self) {
        self.cooldown_timer = self.attack_cooldown;
    }

    pub fn tick(&mut self, delta: f32) {
        if self.cooldown_timer > 0.0 {
            self.cooldown_timer = (self.cooldown_timer - delta).max(0.0);
        }
    }
}

/// System: обновление attack cooldown таймеров
pub fn tick_attack_cooldowns(mut query: Query<&mut Attacker>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for mut attacker in query.iter_mut() {
        attacker.tick(delta);
    }
}
