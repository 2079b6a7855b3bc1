//! Базовые компоненты агентов: Agent, Health, CombatStats

use bevy::prelude::*;

/// Агент (враг под управлением FSM)
///
/// `id` - стабильный идентификатор от spawner'а (phase offset патруля считается из него).
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, CombatStats, crate::components::WorldPosition, crate::components::DesiredVelocity)]
pub struct Agent {
    pub id: u64,
    pub level: u32,
    pub name: String,
}

/// Здоровье
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Возвращает сколько реально снято (не больше current)
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let before = self.current;
        self.current = self.current.saturating_sub(amount);
        before - self.current
    }
}

/// Боевые характеристики агента
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CombatStats {
    pub attack_damage: u32,
    /// Вычитается из входящего урона (floor 1)
    pub defense: u32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            attack_damage: 10,
            defense: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_never_underflows() {
        let mut health = Health::new(50);
        assert_eq!(health.take_damage(20), 20);
        assert_eq!(health.current, 30);

        assert_eq!(health.take_damage(100), 30);
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }
}
