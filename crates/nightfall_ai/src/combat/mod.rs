//! Combat Resolution Hooks
//!
//! ECS ответственность:
//! - ApplyDamage (mitigation → Hurt / Dead), Die, interrupt каста
//! - Attacker cooldowns, урон по Target Provider
//! - Death lifecycle: Dead маркер + grace period → despawn
//!
//! Анимации смерти, звук, VFX - внешние подписчики на `AgentDied` / `DamageApplied`.

use bevy::prelude::*;

pub mod attacker;
pub mod damage;
pub mod skill;
pub mod systems;

// Re-export основных типов
pub use attacker::{tick_attack_cooldowns, Attacker};
pub use damage::{
    apply_damage, die, mitigate, AgentAttack, AgentDied, DamageApplied, DamageDealt, DamageKind, DamageOutcome,
    DamageRequest, KillRequest,
};
pub use skill::{ActiveCast, InterruptReason, SkillCast, SkillInterrupted, SkillKind, SkillReleased, SkillStarted};
pub use systems::{Dead, DespawnAfter};

use crate::SimulationSet;

/// Combat Plugin
///
/// Порядок выполнения:
/// 1. Timers - tick_attack_cooldowns
/// 2. Commands - KillRequest → Die
/// 3. Combat - DamageRequest → ApplyDamage (Hurt/Dead вне cadence scheduler'а)
/// 4. Lifecycle - урон по цели, Dead маркер, despawn после grace period
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        crate::configure_simulation_sets(app);

        // Регистрация событий
        app.add_event::<DamageRequest>()
            .add_event::<DamageApplied>()
            .add_event::<KillRequest>()
            .add_event::<AgentDied>()
            .add_event::<AgentAttack>()
            .add_event::<DamageDealt>()
            .add_event::<SkillInterrupted>()
            .add_event::<crate::ai::StateChanged>();

        app.add_systems(
            FixedUpdate,
            (
                tick_attack_cooldowns.in_set(SimulationSet::Timers),
                systems::process_kill_requests.in_set(SimulationSet::Commands),
                systems::process_damage_requests.in_set(SimulationSet::Combat),
                (
                    systems::resolve_agent_attacks,
                    systems::mark_dead_agents,
                    systems::despawn_after_timeout,
                )
                    .chain()
                    .in_set(SimulationSet::Lifecycle),
            ),
        );
    }
}
