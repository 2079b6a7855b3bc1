//! AI FSM состояния.

use bevy::prelude::*;

/// Поведенческое состояние агента
///
/// Ровно одно активное состояние на агента. `Dead` - терминальное: из него нет переходов.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum AIState {
    /// Начальное состояние после спавна
    #[default]
    Idle,
    /// Качаемся влево/вправо вокруг точки спавна
    Patrol,
    /// Преследуем цель
    Chase,
    /// Стоим и бьём (swing / cast)
    Attack,
    /// Рывок (только charger archetype, или принудительно через skill provider)
    Charge,
    /// Оглушён: ни движения, ни атак до конца hold timer
    Stun,
    /// Реакция на урон
    Hurt,
    Dead,
}

impl AIState {
    pub const ALL: [AIState; 8] = [
        AIState::Idle,
        AIState::Patrol,
        AIState::Chase,
        AIState::Attack,
        AIState::Charge,
        AIState::Stun,
        AIState::Hurt,
        AIState::Dead,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, AIState::Dead)
    }

    /// Состояния, которые тикаются каждый кадр независимо от видимости
    pub fn requires_frequent_updates(self) -> bool {
        matches!(
            self,
            AIState::Attack | AIState::Charge | AIState::Hurt | AIState::Stun
        )
    }

    /// Состояния, в которых агент держит hold timer (выход только после release)
    pub fn has_hold(self) -> bool {
        matches!(self, AIState::Hurt | AIState::Stun | AIState::Charge)
    }

    pub fn label(self) -> &'static str {
        match self {
            AIState::Idle => "Idle",
            AIState::Patrol => "Patrol",
            AIState::Chase => "Chase",
            AIState::Attack => "Attack",
            AIState::Charge => "Charge",
            AIState::Stun => "Stun",
            AIState::Hurt => "Hurt",
            AIState::Dead => "Dead",
        }
    }
}

impl std::fmt::Display for AIState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_state_default() {
        assert_eq!(AIState::default(), AIState::Idle);
    }

    #[test]
    fn test_only_dead_is_terminal() {
        for state in AIState::ALL {
            assert_eq!(state.is_terminal(), state == AIState::Dead, "{state}");
        }
    }

    #[test]
    fn test_frequent_update_states() {
        let frequent: Vec<_> = AIState::ALL
            .into_iter()
            .filter(|s| s.requires_frequent_updates())
            .collect();
        assert_eq!(
            frequent,
            vec![AIState::Attack, AIState::Charge, AIState::Stun, AIState::Hurt]
        );
    }
}
