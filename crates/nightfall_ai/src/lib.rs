//! NIGHTFALL AI Core
//!
//! ECS-симуляция поведения врагов на Bevy 0.16 (headless).
//!
//! Внешние слои (рендер, анимации, звук, скиллы, физика) общаются с core только через
//! компоненты и события:
//! - вход: `DamageRequest`, `KillRequest`, `ForceStateRequest`, `WorldPosition` цели, `Viewport`
//! - выход: `StateChanged`, `AnimationSignal`, `SkillStarted/Released/Interrupted`,
//!   `DesiredVelocity`, `AgentDied`, `AgentAttack`

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod physics;
pub mod spawn;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, AIState, AIStateMachine, Archetype, ForceStateRequest, StateChanged, Viewport};
pub use combat::{AgentDied, CombatPlugin, DamageKind, DamageRequest, KillRequest, SkillInterrupted};
pub use components::*;
pub use config::{AIConfig, AgentConfig, SchedulerConfig};
pub use error::ConfigError;
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter};
pub use physics::PhysicsAdapterPlugin;
pub use spawn::{spawn_agent, spawn_target, AgentBundle};

/// Частота FixedUpdate
pub const FIXED_HZ: f64 = 60.0;

/// Фазы симуляционного кадра (FixedUpdate, строго последовательно)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// State timers, cooldowns, deferred actions
    Timers,
    /// Дешёвый detection check
    Sensing,
    /// Внешние запросы (ForceState, Kill)
    Commands,
    /// DamageRequest → Hurt / Dead
    Combat,
    /// ShouldTick → Evaluate
    Decision,
    /// Последствия переходов
    Reaction,
    /// Атаки, desired velocity, physics adapters
    Action,
    /// Урон по цели, смерть, despawn
    Lifecycle,
}

/// Порядок фаз. Вызывается каждым plugin'ом - повторная конфигурация безвредна.
pub fn configure_simulation_sets(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (
            SimulationSet::Timers,
            SimulationSet::Sensing,
            SimulationSet::Commands,
            SimulationSet::Combat,
            SimulationSet::Decision,
            SimulationSet::Reaction,
            SimulationSet::Action,
            SimulationSet::Lifecycle,
        )
            .chain(),
    );
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<DeterministicRng>() {
            // Детерминистичный RNG (seed по умолчанию)
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            // Подсистемы
            .add_plugins((AIPlugin, CombatPlugin, PhysicsAdapterPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время шагает вручную: один `app.update()` = один fixed tick (кроме самого первого
/// update, на котором часы только стартуют).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();

    let fixed = Time::<Fixed>::from_hz(FIXED_HZ);
    let step = fixed.timestep();

    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(fixed)
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(step));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    // Собираем все компоненты в детерминированный формат
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
