//! AI Events - сигналы FSM наружу и запросы внутрь.
//!
//! Animation/audio/VFX слои подписываются на эти события и никогда не лезут во внутренности
//! FSM. Skill provider форсирует состояния через `ForceStateRequest` - тот же `change_state`,
//! что и внутренняя evaluation.

use bevy::prelude::*;

use crate::ai::AIState;

/// Переход применён
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct StateChanged {
    pub entity: Entity,
    pub from: AIState,
    pub to: AIState,
    pub label: &'static str,
    pub generation: u32,
}

/// Intent для animation provider
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum AnimationSignal {
    /// "entered Attack", "entered Hurt", "entered Dead", ...
    StateEntered { entity: Entity, state: AIState },
}

/// Внешний запрос на смену состояния (например Stun после прерванного каста)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceStateRequest {
    pub entity: Entity,
    pub state: AIState,
}

impl StateChanged {
    pub fn new(entity: Entity, change: crate::ai::StateChange) -> Self {
        Self {
            entity,
            from: change.from,
            to: change.to,
            label: change.label,
            generation: change.generation,
        }
    }
}
