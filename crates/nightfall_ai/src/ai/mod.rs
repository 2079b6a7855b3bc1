//! AI decision-making module
//!
//! Один FSM на агента + perception, patrol, update scheduler, archetype hooks.
//!
//! Поток данных за кадр:
//! Scheduler решает, нужен ли tick → Perception обновляет predicates → FSM применяет
//! первое подходящее правило → реакции на переход (holds, hooks, сигналы) → intent
//! (desired velocity, атака). Combat hooks форсируют Hurt/Dead вне cadence scheduler'а.

use bevy::prelude::*;

pub mod archetype;
pub mod deferred;
pub mod events;
pub mod machine;
pub mod patrol;
pub mod perception;
pub mod scheduler;
pub mod state;
pub mod systems;
pub mod transitions;


// Re-export основных типов
pub use archetype::{AbilityCooldown, Archetype, ArchetypeKind, EnterContext, PatrolPattern};
pub use deferred::{DeferredAction, DeferredActions, DeferredKind};
pub use events::{AnimationSignal, ForceStateRequest, StateChanged};
pub use machine::{AIStateMachine, Capabilities, StateChange, TransientFlags};
pub use patrol::{PatrolDirection, PatrolPath};
pub use perception::{Perception, PerceptionRadii, PerceptionSnapshot};
pub use scheduler::{DirtyFlags, UpdateScheduler, Viewport};
pub use state::AIState;
pub use transitions::{GuardContext, StateFilter, TransitionRule, TransitionTable, TransitionTables};

pub use crate::config::AIConfig;

use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения (внутри `SimulationSet`):
/// 1. Timers - state timers, deferred actions
/// 2. Sensing - detection check на своём cadence
/// 3. Commands - ForceStateRequest
/// 4. Decision - ShouldTick → refresh → Evaluate
/// 5. Reaction - последствия переходов, animation signals
/// 6. Action - атаки, desired velocity
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_simulation_sets(app);

        app.add_event::<StateChanged>()
            .add_event::<AnimationSignal>()
            .add_event::<ForceStateRequest>()
            .add_event::<crate::combat::SkillStarted>()
            .add_event::<crate::combat::SkillReleased>()
            .add_event::<crate::combat::SkillInterrupted>()
            .add_event::<crate::combat::AgentAttack>()
            .add_event::<crate::combat::AgentDied>();

        // Таблицы переходов строятся один раз и дальше не меняются
        app.init_resource::<TransitionTables>()
            .init_resource::<Viewport>();

        app.add_systems(
            FixedUpdate,
            (
                (systems::tick_state_timers, systems::fire_deferred_actions)
                    .chain()
                    .in_set(SimulationSet::Timers),
                systems::sense_targets.in_set(SimulationSet::Sensing),
                systems::apply_force_state_requests.in_set(SimulationSet::Commands),
                systems::evaluate_transitions.in_set(SimulationSet::Decision),
                (systems::emit_spawn_signals, systems::react_to_state_changes)
                    .chain()
                    .in_set(SimulationSet::Reaction),
                (systems::execute_attacks, systems::emit_desired_velocity)
                    .chain()
                    .in_set(SimulationSet::Action),
            ),
        );
    }
}
