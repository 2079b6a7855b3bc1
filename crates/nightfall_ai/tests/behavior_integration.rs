//! Behavior integration tests: полный кадр симуляции через `SimulationPlugin`.
//!
//! Агенты спавнятся без `HeadlessBody` - позиции статичны, расстояния до цели под контролем теста.

use bevy::prelude::*;
use nightfall_ai::ai::{AnimationSignal, ArchetypeKind};
use nightfall_ai::combat::{AgentAttack, DamageDealt, SkillCast, SkillKind, SkillStarted};
use nightfall_ai::*;

// --- Harness ---

/// Всё, что core отдал наружу за прогон
#[derive(Resource, Default)]
struct Recorded {
    changes: Vec<(f32, StateChanged)>,
    signals: Vec<AnimationSignal>,
    started: Vec<SkillStarted>,
    interrupts: Vec<SkillInterrupted>,
    deaths: Vec<AgentDied>,
    attacks: Vec<AgentAttack>,
    dealt: Vec<DamageDealt>,
}

impl Recorded {
    fn transitions(&self, entity: Entity) -> Vec<(AIState, AIState)> {
        self.changes
            .iter()
            .filter(|(_, change)| change.entity == entity)
            .map(|(_, change)| (change.from, change.to))
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn record_events(
    mut recorded: ResMut<Recorded>,
    time: Res<Time<Fixed>>,
    mut changes: EventReader<StateChanged>,
    mut signals: EventReader<AnimationSignal>,
    mut started: EventReader<SkillStarted>,
    mut interrupts: EventReader<SkillInterrupted>,
    mut deaths: EventReader<AgentDied>,
    mut attacks: EventReader<AgentAttack>,
    mut dealt: EventReader<DamageDealt>,
) {
    let now = time.elapsed_secs();
    recorded.changes.extend(changes.read().map(|change| (now, *change)));
    recorded.signals.extend(signals.read().copied());
    recorded.started.extend(started.read().copied());
    recorded.interrupts.extend(interrupts.read().copied());
    recorded.deaths.extend(deaths.read().copied());
    recorded.attacks.extend(attacks.read().copied());
    recorded.dealt.extend(dealt.read().copied());
}

fn create_test_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin)
        .init_resource::<Recorded>()
        .add_systems(FixedUpdate, record_events.after(SimulationSet::Lifecycle));

    // Первый update только стартует часы
    app.update();
    app
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

fn ticks_for(seconds: f32) -> usize {
    (seconds * FIXED_HZ as f32).ceil() as usize + 1
}

fn grunt_config() -> AgentConfig {
    AgentConfig {
        name: "Grunt".into(),
        detection_radius: 5.0,
        attack_radius: 2.0,
        lose_target_radius: 8.0,
        ..AgentConfig::default()
    }
}

fn spawn(app: &mut App, config: &AgentConfig, id: u64, position: Vec2) -> Entity {
    let now = app.world().resource::<Time<Fixed>>().elapsed_secs();
    let bundle = AgentBundle::from_config(config, id, position, now).unwrap();
    app.world_mut().spawn(bundle).id()
}

fn spawn_dummy(app: &mut App, position: Vec2) -> Entity {
    app.world_mut()
        .spawn((Target, WorldPosition(position), Health::new(100)))
        .id()
}

fn state_of(app: &App, entity: Entity) -> AIState {
    app.world().get::<AIStateMachine>(entity).unwrap().current()
}

fn recorded(app: &App) -> &Recorded {
    app.world().resource::<Recorded>()
}

/// Крутит тики, пока агент не окажется в `state` (или не кончится лимит)
fn run_until_state(app: &mut App, entity: Entity, state: AIState, max_ticks: usize) -> bool {
    for _ in 0..max_ticks {
        if state_of(app, entity) == state {
            return true;
        }
        app.update();
    }
    state_of(app, entity) == state
}

fn damage(app: &mut App, target: Entity, amount: u32) {
    app.world_mut().send_event(DamageRequest {
        target,
        amount,
        kind: DamageKind::Physical,
        source_position: None,
    });
}

// --- Perception / evaluation ---

#[test]
fn test_target_inside_detection_chases_within_one_tick() {
    let mut app = create_test_app(42);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);
    spawn_dummy(&mut app, Vec2::new(3.0, 0.0));

    step(&mut app, 1);
    assert_eq!(state_of(&app, agent), AIState::Chase);

    // Дистанция 3 > attack 2: Attack не наступает, Chase держится
    step(&mut app, ticks_for(3.0));
    assert_eq!(state_of(&app, agent), AIState::Chase);
    assert_eq!(recorded(&app).transitions(agent), vec![(AIState::Idle, AIState::Chase)]);
}

#[test]
fn test_no_target_never_chases_or_attacks() {
    let mut app = create_test_app(7);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);

    step(&mut app, ticks_for(20.0));

    let transitions = recorded(&app).transitions(agent);
    assert!(
        transitions
            .iter()
            .all(|(from, to)| matches!(from, AIState::Idle | AIState::Patrol)
                && matches!(to, AIState::Idle | AIState::Patrol)),
        "unexpected transitions without target: {transitions:?}"
    );
    // 20 секунд при шансе 0.7 - агент хоть раз вышел в патруль
    assert!(transitions.contains(&(AIState::Idle, AIState::Patrol)));
}

#[test]
fn test_detection_boundary_jitter_flips_once() {
    let mut app = create_test_app(42);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);
    let dummy = spawn_dummy(&mut app, Vec2::new(4.9, 0.0));

    // Цель дрожит на границе detection (4.9 ↔ 5.1) каждый tick
    for tick in 0..ticks_for(6.0) {
        let x = if tick % 2 == 0 { 5.1 } else { 4.9 };
        app.world_mut().get_mut::<WorldPosition>(dummy).unwrap().0.x = x;
        app.update();
    }

    // 5.1 < lose radius 8: цель не потеряна, повторных флипов нет
    assert_eq!(recorded(&app).transitions(agent), vec![(AIState::Idle, AIState::Chase)]);
    assert_eq!(state_of(&app, agent), AIState::Chase);
}

#[test]
fn test_target_lost_respects_min_chase_dwell() {
    let mut app = create_test_app(42);
    let config = grunt_config();
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);
    let dummy = spawn_dummy(&mut app, Vec2::new(4.0, 0.0));

    // Цель прыгает между "внутри detection" и "за lose radius" каждые 0.5s
    let half_period = ticks_for(0.5);
    for tick in 0..ticks_for(12.0) {
        let inside = (tick / half_period) % 2 == 0;
        let x = if inside { 4.0 } else { 9.0 };
        app.world_mut().get_mut::<WorldPosition>(dummy).unwrap().0.x = x;
        app.update();
    }

    let entered_chase: Vec<f32> = recorded(&app)
        .changes
        .iter()
        .filter(|(_, change)| change.entity == agent && change.to == AIState::Chase)
        .map(|(at, _)| *at)
        .collect();
    let lost: Vec<f32> = recorded(&app)
        .changes
        .iter()
        .filter(|(_, change)| change.entity == agent && change.from == AIState::Chase && change.to == AIState::Patrol)
        .map(|(at, _)| *at)
        .collect();

    assert!(!lost.is_empty(), "target never lost");
    for lost_at in &lost {
        let entered_at = entered_chase
            .iter()
            .rev()
            .find(|at| *at <= lost_at)
            .copied()
            .unwrap();
        assert!(
            lost_at - entered_at >= config.behavior.min_chase_dwell - 1e-4,
            "Chase left after {}s",
            lost_at - entered_at
        );
    }
}

#[test]
fn test_offscreen_agent_wakes_on_detection() {
    let mut app = create_test_app(42);
    let far = Vec2::new(100.0, 0.0);
    let agent = spawn(&mut app, &grunt_config(), 1, far);

    step(&mut app, ticks_for(1.0));
    assert!(!app.world().resource::<Viewport>().contains(far));

    spawn_dummy(&mut app, far + Vec2::new(3.0, 0.0));

    // detection check (0.1s) будит агента раньше off-screen cadence (0.5s)
    step(&mut app, ticks_for(0.2));
    assert_eq!(state_of(&app, agent), AIState::Chase);
}

#[test]
fn test_herd_spawned_together_patrols_out_of_step() {
    let mut app = create_test_app(42);
    let agents: Vec<Entity> = (1..=6)
        .map(|id| spawn(&mut app, &grunt_config(), id, Vec2::ZERO))
        .collect();

    for &entity in &agents {
        app.world_mut().send_event(ForceStateRequest {
            entity,
            state: AIState::Patrol,
        });
    }
    step(&mut app, 1);

    let directions: Vec<f32> = agents
        .iter()
        .map(|&entity| app.world().get::<DesiredVelocity>(entity).unwrap().0.x.signum())
        .collect();

    assert!(directions.iter().all(|x| *x != 0.0));
    // Соседние id расходятся в противоположные стороны
    assert!(
        directions.windows(2).all(|pair| pair[0] != pair[1]),
        "adjacent ids in lockstep: {directions:?}"
    );
}

/// Idle/Patrol поток одного seed'а не зависит от того, видит ли агента камера
#[test]
fn test_wander_rolls_independent_of_visibility() {
    fn wander_log(position: Vec2) -> Vec<(f32, AIState, AIState)> {
        let mut app = create_test_app(99);
        let agent = spawn(&mut app, &grunt_config(), 1, position);
        step(&mut app, ticks_for(60.0));
        recorded(&app)
            .changes
            .iter()
            .filter(|(_, change)| change.entity == agent)
            .map(|(at, change)| (*at, change.from, change.to))
            .collect()
    }

    let on_screen = wander_log(Vec2::ZERO);
    let off_screen = wander_log(Vec2::new(500.0, 0.0));

    assert!(!on_screen.is_empty());
    assert_eq!(on_screen, off_screen);
}

// --- Combat ---

#[test]
fn test_chip_damage_registers_and_hurts() {
    let mut app = create_test_app(42);
    let config = AgentConfig {
        max_health: 50,
        defense: 10,
        ..grunt_config()
    };
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);

    damage(&mut app, agent, 5);
    step(&mut app, 1);

    assert_eq!(app.world().get::<Health>(agent).unwrap().current, 49);
    assert_eq!(state_of(&app, agent), AIState::Hurt);
}

#[test]
fn test_hurt_recovers_after_hold() {
    let mut app = create_test_app(42);
    let config = grunt_config();
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);
    spawn_dummy(&mut app, Vec2::new(4.0, 0.0));

    assert!(run_until_state(&mut app, agent, AIState::Chase, 10));

    damage(&mut app, agent, 5);
    step(&mut app, 1);
    assert_eq!(state_of(&app, agent), AIState::Hurt);

    // Раньше hurt_duration выхода нет
    step(&mut app, ticks_for(config.behavior.hurt_duration * 0.5));
    assert_eq!(state_of(&app, agent), AIState::Hurt);

    step(&mut app, ticks_for(config.behavior.hurt_duration));
    assert_eq!(state_of(&app, agent), AIState::Chase);
    assert!(recorded(&app).transitions(agent).contains(&(AIState::Hurt, AIState::Chase)));
}

#[test]
fn test_melee_attack_hits_target() {
    let mut app = create_test_app(42);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);
    let dummy = spawn_dummy(&mut app, Vec2::new(1.0, 0.0));

    step(&mut app, ticks_for(2.0));

    let rec = recorded(&app);
    assert!(rec.transitions(agent).contains(&(AIState::Chase, AIState::Attack)));
    assert!(rec
        .started
        .iter()
        .any(|started| started.entity == agent && started.skill == SkillKind::MeleeSwing));
    assert!(!rec.attacks.is_empty());
    assert!(rec.dealt.iter().all(|dealt| dealt.attacker == agent && dealt.target == dummy));
    assert!(app.world().get::<Health>(dummy).unwrap().current < 100);
}

#[test]
fn test_lethal_damage_mid_cast_skips_interrupt() {
    let mut app = create_test_app(42);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);
    spawn_dummy(&mut app, Vec2::new(1.0, 0.0));

    let mut mid_cast = false;
    for _ in 0..ticks_for(1.0) {
        app.update();
        if app.world().get::<SkillCast>(agent).unwrap().is_mid_cast() {
            mid_cast = true;
            break;
        }
    }
    assert!(mid_cast, "agent never started a cast");

    damage(&mut app, agent, 1_000);
    step(&mut app, 1);

    let rec = recorded(&app);
    assert_eq!(state_of(&app, agent), AIState::Dead);
    assert!(rec.interrupts.is_empty());
    assert_eq!(rec.deaths.len(), 1);
    assert!(!rec.transitions(agent).contains(&(AIState::Attack, AIState::Hurt)));
    assert_eq!(app.world().get::<Health>(agent).unwrap().current, 0);
}

#[test]
fn test_forced_stun_interrupts_cast_and_recovers() {
    let mut app = create_test_app(42);
    let config = grunt_config();
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);
    spawn_dummy(&mut app, Vec2::new(1.0, 0.0));

    let mut mid_cast = false;
    for _ in 0..ticks_for(1.0) {
        app.update();
        if app.world().get::<SkillCast>(agent).unwrap().is_mid_cast() {
            mid_cast = true;
            break;
        }
    }
    assert!(mid_cast);

    app.world_mut().send_event(ForceStateRequest {
        entity: agent,
        state: AIState::Stun,
    });
    step(&mut app, 1);

    assert_eq!(state_of(&app, agent), AIState::Stun);
    assert_eq!(recorded(&app).interrupts.len(), 1);
    assert_eq!(recorded(&app).interrupts[0].skill, SkillKind::MeleeSwing);

    step(&mut app, ticks_for(config.behavior.stun_duration + 0.1));
    assert_ne!(state_of(&app, agent), AIState::Stun);
    assert!(recorded(&app).transitions(agent).contains(&(AIState::Stun, AIState::Chase)));
}

#[test]
fn test_die_twice_emits_single_death_and_despawns() {
    let mut app = create_test_app(42);
    let config = grunt_config();
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);

    app.world_mut().send_event(KillRequest { entity: agent });
    step(&mut app, 1);
    app.world_mut().send_event(KillRequest { entity: agent });
    step(&mut app, 1);

    assert_eq!(state_of(&app, agent), AIState::Dead);
    assert_eq!(recorded(&app).deaths.len(), 1);
    // Die не трогает health
    assert_eq!(app.world().get::<Health>(agent).unwrap().current, config.max_health);

    step(&mut app, ticks_for(config.behavior.death_grace_period * 0.5));
    assert!(app.world().get_entity(agent).is_ok());

    step(&mut app, ticks_for(config.behavior.death_grace_period));
    assert!(app.world().get_entity(agent).is_err());
}

#[test]
fn test_dead_ignores_forced_states_and_damage() {
    let mut app = create_test_app(42);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);
    spawn_dummy(&mut app, Vec2::new(1.0, 0.0));

    damage(&mut app, agent, 1_000);
    step(&mut app, 1);
    assert_eq!(state_of(&app, agent), AIState::Dead);
    let changes_at_death = recorded(&app).changes.len();

    app.world_mut().send_event(ForceStateRequest {
        entity: agent,
        state: AIState::Chase,
    });
    damage(&mut app, agent, 5);
    step(&mut app, 10);

    assert_eq!(state_of(&app, agent), AIState::Dead);
    assert_eq!(recorded(&app).changes.len(), changes_at_death);
    assert_eq!(app.world().get::<Health>(agent).unwrap().current, 0);
    assert_eq!(app.world().get::<DesiredVelocity>(agent).unwrap().0, Vec2::ZERO);
}

#[test]
fn test_health_never_exceeds_bounds_under_barrage() {
    let mut app = create_test_app(42);
    let config = grunt_config();
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);

    for _ in 0..60 {
        damage(&mut app, agent, 3);
        damage(&mut app, agent, 7);
        app.update();

        let Some(health) = app.world().get::<Health>(agent) else {
            break;
        };
        assert!(health.current <= health.max);
    }

    assert_eq!(app.world().get::<Health>(agent).unwrap().current, 0);
    assert_eq!(recorded(&app).deaths.len(), 1);
}

// --- Signals / archetypes ---

#[test]
fn test_animation_signal_once_per_entered_state() {
    let mut app = create_test_app(42);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);
    spawn_dummy(&mut app, Vec2::new(1.0, 0.0));

    step(&mut app, ticks_for(3.0));

    let rec = recorded(&app);
    let entered: Vec<AIState> = rec
        .signals
        .iter()
        .map(|AnimationSignal::StateEntered { entity, state }| (*entity, *state))
        .filter(|(entity, _)| *entity == agent)
        .map(|(_, state)| state)
        .collect();
    let mut expected = vec![AIState::Idle];
    expected.extend(rec.transitions(agent).into_iter().map(|(_, to)| to));

    assert_eq!(entered, expected);
}

#[test]
fn test_animation_signals_for_every_entry_in_one_frame() {
    let mut app = create_test_app(42);
    let agent = spawn(&mut app, &grunt_config(), 1, Vec2::ZERO);
    step(&mut app, 1);
    assert_eq!(state_of(&app, agent), AIState::Idle);

    // Stun из Commands и Hurt из Combat в одном кадре
    app.world_mut().send_event(ForceStateRequest {
        entity: agent,
        state: AIState::Stun,
    });
    damage(&mut app, agent, 5);
    step(&mut app, 1);

    let entered: Vec<AIState> = recorded(&app)
        .signals
        .iter()
        .map(|AnimationSignal::StateEntered { entity, state }| (*entity, *state))
        .filter(|(entity, _)| *entity == agent)
        .map(|(_, state)| state)
        .collect();
    assert_eq!(entered, vec![AIState::Idle, AIState::Stun, AIState::Hurt]);
    assert_eq!(state_of(&app, agent), AIState::Hurt);
}

#[test]
fn test_charger_charges_then_gets_dazed() {
    let mut app = create_test_app(42);
    let config = AgentConfig {
        name: "Charger".into(),
        archetype: ArchetypeKind::Charger.default_archetype(),
        ..AgentConfig::default()
    };
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);
    spawn_dummy(&mut app, Vec2::new(4.0, 0.0));

    step(&mut app, ticks_for(3.0));

    let rec = recorded(&app);
    let transitions = rec.transitions(agent);
    assert!(transitions.contains(&(AIState::Idle, AIState::Chase)));
    assert!(transitions.contains(&(AIState::Chase, AIState::Charge)));
    assert!(transitions.contains(&(AIState::Charge, AIState::Stun)));
    assert!(!transitions.contains(&(AIState::Charge, AIState::Chase)));
    assert!(rec
        .started
        .iter()
        .any(|started| started.entity == agent && started.skill == SkillKind::Charge));
}

#[test]
fn test_caster_casts_ranged_bolt() {
    let mut app = create_test_app(42);
    let config = AgentConfig {
        name: "Caster".into(),
        attack_radius: 4.0,
        archetype: ArchetypeKind::Caster.default_archetype(),
        ..AgentConfig::default()
    };
    let agent = spawn(&mut app, &config, 1, Vec2::ZERO);
    let dummy = spawn_dummy(&mut app, Vec2::new(3.0, 0.0));

    step(&mut app, ticks_for(2.0));

    let rec = recorded(&app);
    assert!(rec.transitions(agent).contains(&(AIState::Chase, AIState::Attack)));
    assert!(rec
        .started
        .iter()
        .any(|started| started.entity == agent && started.skill == SkillKind::RangedBolt));
    // Урон снаряда - забота skill provider
    assert!(rec.attacks.is_empty());
    assert_eq!(app.world().get::<Health>(dummy).unwrap().current, 100);
}
