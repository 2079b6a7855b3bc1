//! Headless демо NIGHTFALL AI
//!
//! Спавнит по агенту каждого archetype и блуждающую цель, гоняет 1000 тиков
//! и печатает распределение состояний.

use std::collections::BTreeMap;

use bevy::prelude::*;
use nightfall_ai::ai::ArchetypeKind;
use nightfall_ai::{
    create_headless_app, log_error, log_info, set_log_level, spawn_agent, spawn_target, AIStateMachine, AgentConfig,
    HeadlessBody, LogLevel, SimulationPlugin, Target, WorldPosition,
};

/// Цель ходит туда-сюда через всю арену
fn wander_target(mut targets: Query<&mut WorldPosition, With<Target>>, time: Res<Time<Fixed>>) {
    let t = time.elapsed_secs();
    for mut position in targets.iter_mut() {
        position.0.x = 12.0 * (t * 0.25).sin();
    }
}

fn main() {
    let seed = 42;
    set_log_level(LogLevel::Info);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin)
        .add_systems(FixedUpdate, wander_target.before(nightfall_ai::SimulationSet::Timers));

    log_info(&format!("Starting NIGHTFALL headless simulation (seed: {})", seed));

    let mut commands = app.world_mut().commands();
    spawn_target(&mut commands, Vec2::ZERO, 200);

    for (id, kind) in ArchetypeKind::ALL.into_iter().enumerate() {
        let config = AgentConfig {
            name: format!("{:?}", kind).to_lowercase(),
            archetype: kind.default_archetype(),
            ..AgentConfig::default()
        };
        let x = -10.0 + id as f32 * 10.0;
        match spawn_agent(&mut commands, &config, id as u64, Vec2::new(x, 0.0), 0.0) {
            Ok(entity) => {
                commands.entity(entity).insert(HeadlessBody);
            }
            Err(err) => log_error(&format!("Failed to spawn {}: {}", config.name, err)),
        }
    }

    // Запускаем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            let world = app.world_mut();
            let mut query = world.query::<&AIStateMachine>();
            for machine in query.iter(world) {
                *counts.entry(machine.current().to_string()).or_default() += 1;
            }
            log_info(&format!("Tick {}: {:?}", tick, counts));
        }
    }

    log_info("Simulation complete!");
}
