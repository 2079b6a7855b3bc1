//! Transition table: `(from, to, guard, label)`.
//!
//! Правила объявляются один раз при build plugin'а и дальше не меняются.
//! Guards - чистые функции от `GuardContext`; случайный бросок делается ДО evaluation и
//! приходит в контексте, поэтому guard сам ничего не мутирует. Бросок есть только когда
//! он положен по расписанию машины (`AIStateMachine::roll_due`).
//!
//! Порядок важен: первый совпавший guard выигрывает, остальные в этом проходе не смотрятся.
//! Два одновременно истинных guard'а для одного `from` - не гонка, а декларативный приоритет.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::ai::{AIState, Archetype, ArchetypeKind, PerceptionSnapshot};
use crate::config::AIConfig;

/// Всё, что guard может прочитать
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    pub state: AIState,
    /// Секунды с последнего перехода
    pub state_timer: f32,
    pub perception: &'a PerceptionSnapshot,
    pub health: u32,
    /// canMove + archetype patrol pattern
    pub movement_allowed: bool,
    /// Hold timer текущего состояния истёк
    pub hold_released: bool,
    /// Special ability cooldown готов
    pub ability_ready: bool,
    /// Бросок в [0, 1). `None` - бросок по расписанию ещё не положен.
    pub roll: Option<f32>,
    pub config: &'a AIConfig,
    pub archetype: &'a Archetype,
}

pub type Guard = fn(&GuardContext) -> bool;

/// Из какого состояния правило применимо
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    /// Любое нетерминальное состояние
    Any,
    Only(AIState),
}

impl StateFilter {
    pub fn matches(self, state: AIState) -> bool {
        match self {
            StateFilter::Any => !state.is_terminal(),
            StateFilter::Only(from) => from == state,
        }
    }
}

#[derive(Clone, Copy)]
pub struct TransitionRule {
    pub from: StateFilter,
    pub to: AIState,
    pub guard: Guard,
    pub label: &'static str,
}

impl TransitionRule {
    pub const fn new(from: AIState, to: AIState, guard: Guard, label: &'static str) -> Self {
        Self {
            from: StateFilter::Only(from),
            to,
            guard,
            label,
        }
    }

    pub const fn from_any(to: AIState, guard: Guard, label: &'static str) -> Self {
        Self {
            from: StateFilter::Any,
            to,
            guard,
            label,
        }
    }

    pub fn applies(&self, ctx: &GuardContext) -> bool {
        self.from.matches(ctx.state) && (self.guard)(ctx)
    }
}

impl std::fmt::Debug for TransitionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionRule")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("label", &self.label)
            .finish()
    }
}

// ============================================================================
// Guards
// ============================================================================

pub fn health_depleted(ctx: &GuardContext) -> bool {
    ctx.health == 0
}

pub fn in_detection_range(ctx: &GuardContext) -> bool {
    ctx.perception.in_detection_range
}

pub fn in_attack_range(ctx: &GuardContext) -> bool {
    ctx.perception.in_attack_range
}

pub fn out_of_attack_range(ctx: &GuardContext) -> bool {
    !ctx.perception.in_attack_range
}

fn idle_wander(ctx: &GuardContext) -> bool {
    !ctx.perception.in_detection_range
        && ctx.movement_allowed
        && ctx.state_timer >= ctx.config.min_idle_dwell
        && ctx.roll.is_some_and(|roll| roll < ctx.config.idle_to_patrol_chance)
}

fn patrol_rest(ctx: &GuardContext) -> bool {
    ctx.state_timer >= ctx.config.min_patrol_dwell
        && ctx.roll.is_some_and(|roll| roll < ctx.config.patrol_to_idle_chance)
}

/// Hysteresis: потеря цели учитывается только после min_chase_dwell
fn target_lost_after_dwell(ctx: &GuardContext) -> bool {
    ctx.perception.has_lost_target && ctx.state_timer >= ctx.config.min_chase_dwell
}

pub fn hold_released(ctx: &GuardContext) -> bool {
    ctx.hold_released
}

fn recovered_with_target(ctx: &GuardContext) -> bool {
    ctx.hold_released && ctx.perception.in_detection_range
}

fn recovered_without_target(ctx: &GuardContext) -> bool {
    ctx.hold_released && !ctx.perception.in_detection_range
}

/// Charger: цель видна, но далеко, cooldown готов
pub fn charge_window(ctx: &GuardContext) -> bool {
    let Archetype::Charger {
        min_charge_distance,
        ..
    } = ctx.archetype
    else {
        return false;
    };

    ctx.ability_ready
        && ctx.perception.in_detection_range
        && !ctx.perception.in_attack_range
        && ctx.perception.distance_to_target >= *min_charge_distance
}

// ============================================================================
// Table
// ============================================================================

/// Immutable таблица правил одного archetype
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rules: Vec<TransitionRule>,
}

impl TransitionTable {
    pub fn new(rules: Vec<TransitionRule>) -> Self {
        Self { rules }
    }

    /// Смерть проверяется первой: health == 0 перебивает всё
    pub fn death_rule() -> TransitionRule {
        TransitionRule::from_any(AIState::Dead, health_depleted, "health depleted")
    }

    /// Общие правила для всех archetype'ов
    pub fn standard_rules() -> Vec<TransitionRule> {
        use AIState::*;

        vec![
            TransitionRule::new(Idle, Patrol, idle_wander, "idle wander"),
            TransitionRule::new(Idle, Chase, in_detection_range, "target detected"),
            TransitionRule::new(Patrol, Idle, patrol_rest, "patrol rest"),
            TransitionRule::new(Patrol, Chase, in_detection_range, "target detected"),
            TransitionRule::new(Chase, Attack, in_attack_range, "target in attack range"),
            TransitionRule::new(Chase, Patrol, target_lost_after_dwell, "target lost"),
            TransitionRule::new(Attack, Chase, out_of_attack_range, "target left attack range"),
            TransitionRule::new(Hurt, Chase, recovered_with_target, "hurt recovered"),
            TransitionRule::new(Hurt, Patrol, recovered_without_target, "hurt recovered"),
            TransitionRule::new(Stun, Chase, recovered_with_target, "stun recovered"),
            TransitionRule::new(Stun, Patrol, recovered_without_target, "stun recovered"),
            TransitionRule::new(Charge, Chase, hold_released, "charge finished"),
        ]
    }

    /// death → archetype rules → standard rules
    pub fn for_archetype(archetype: &Archetype) -> Self {
        let mut rules = vec![Self::death_rule()];
        rules.extend(archetype.additional_rules());
        rules.extend(Self::standard_rules());
        Self::new(rules)
    }

    /// First match wins, в порядке объявления
    pub fn first_match(&self, ctx: &GuardContext) -> Option<&TransitionRule> {
        self.rules.iter().find(|rule| rule.applies(ctx))
    }

    /// Есть ли вообще правила из этого состояния
    pub fn has_outgoing(&self, state: AIState) -> bool {
        self.rules.iter().any(|rule| rule.from.matches(state))
    }
}

/// Таблицы всех archetype'ов (строятся один раз при build plugin'а)
#[derive(Resource, Debug, Clone)]
pub struct TransitionTables {
    tables: HashMap<ArchetypeKind, TransitionTable>,
    fallback: TransitionTable,
}

impl Default for TransitionTables {
    fn default() -> Self {
        let tables = ArchetypeKind::ALL
            .into_iter()
            .map(|kind| (kind, TransitionTable::for_archetype(&kind.default_archetype())))
            .collect();

        Self {
            tables,
            fallback: TransitionTable::for_archetype(&Archetype::Grunt),
        }
    }
}

impl TransitionTables {
    pub fn get(&self, kind: ArchetypeKind) -> &TransitionTable {
        self.tables.get(&kind).unwrap_or(&self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        perception: PerceptionSnapshot,
        config: AIConfig,
        archetype: Archetype,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                perception: PerceptionSnapshot::default(),
                config: AIConfig::default(),
                archetype: Archetype::Grunt,
            }
        }

        fn seen_at(mut self, distance: f32, detection: f32, attack: f32, lose: f32) -> Self {
            self.perception = PerceptionSnapshot {
                has_target: true,
                distance_to_target: distance,
                target_position: Vec2::new(distance, 0.0),
                in_detection_range: distance <= detection,
                in_attack_range: distance <= attack,
                has_lost_target: distance > lose,
            };
            self
        }

        fn ctx(&self, state: AIState, state_timer: f32, roll: f32) -> GuardContext<'_> {
            GuardContext {
                state,
                state_timer,
                perception: &self.perception,
                health: 50,
                movement_allowed: true,
                hold_released: false,
                ability_ready: true,
                roll: Some(roll),
                config: &self.config,
                archetype: &self.archetype,
            }
        }
    }

    fn target_of(table: &TransitionTable, ctx: &GuardContext) -> Option<AIState> {
        table.first_match(ctx).map(|rule| rule.to)
    }

    #[test]
    fn test_death_rule_first_from_every_live_state() {
        let f = Fixture::new().seen_at(1.0, 5.0, 2.0, 8.0);
        let table = TransitionTable::for_archetype(&Archetype::Grunt);

        for state in AIState::ALL.into_iter().filter(|s| !s.is_terminal()) {
            let mut ctx = f.ctx(state, 10.0, 0.0);
            ctx.health = 0;
            ctx.hold_released = true;
            assert_eq!(target_of(&table, &ctx), Some(AIState::Dead), "from {state}");
        }
    }

    #[test]
    fn test_dead_has_no_outgoing_rules() {
        let table = TransitionTable::for_archetype(&Archetype::Grunt);
        assert!(!table.has_outgoing(AIState::Dead));

        let f = Fixture::new().seen_at(1.0, 5.0, 2.0, 8.0);
        let ctx = f.ctx(AIState::Dead, 10.0, 0.0);
        assert!(table.first_match(&ctx).is_none());
    }

    #[test]
    fn test_idle_to_chase_when_detected() {
        let f = Fixture::new().seen_at(3.0, 5.0, 2.0, 8.0);
        let table = TransitionTable::for_archetype(&Archetype::Grunt);

        assert_eq!(target_of(&table, &f.ctx(AIState::Idle, 0.0, 0.9)), Some(AIState::Chase));
        // 3 > attack radius → из Chase никуда
        assert_eq!(target_of(&table, &f.ctx(AIState::Chase, 0.0, 0.9)), None);
    }

    #[test]
    fn test_idle_to_patrol_needs_dwell_roll_and_movement() {
        let f = Fixture::new();
        let table = TransitionTable::for_archetype(&Archetype::Grunt);

        assert_eq!(target_of(&table, &f.ctx(AIState::Idle, 1.0, 0.1)), None);
        assert_eq!(target_of(&table, &f.ctx(AIState::Idle, 2.0, 0.8)), None);
        assert_eq!(
            target_of(&table, &f.ctx(AIState::Idle, 2.0, 0.1)),
            Some(AIState::Patrol)
        );

        let mut ctx = f.ctx(AIState::Idle, 2.0, 0.1);
        ctx.movement_allowed = false;
        assert_eq!(target_of(&table, &ctx), None);
    }

    #[test]
    fn test_random_rules_wait_for_scheduled_roll() {
        let f = Fixture::new();
        let table = TransitionTable::for_archetype(&Archetype::Grunt);

        let mut idle = f.ctx(AIState::Idle, 10.0, 0.0);
        idle.roll = None;
        assert_eq!(target_of(&table, &idle), None);

        let mut patrol = f.ctx(AIState::Patrol, 10.0, 0.0);
        patrol.roll = None;
        assert_eq!(target_of(&table, &patrol), None);
    }

    #[test]
    fn test_patrol_to_idle_roll() {
        let f = Fixture::new();
        let table = TransitionTable::for_archetype(&Archetype::Grunt);

        assert_eq!(target_of(&table, &f.ctx(AIState::Patrol, 2.9, 0.0)), None);
        assert_eq!(target_of(&table, &f.ctx(AIState::Patrol, 3.0, 0.5)), None);
        assert_eq!(
            target_of(&table, &f.ctx(AIState::Patrol, 3.0, 0.2)),
            Some(AIState::Idle)
        );
    }

    #[test]
    fn test_chase_to_patrol_respects_dwell() {
        let f = Fixture::new().seen_at(9.0, 5.0, 2.0, 8.0);
        let table = TransitionTable::for_archetype(&Archetype::Grunt);

        assert_eq!(target_of(&table, &f.ctx(AIState::Chase, 1.9, 0.0)), None);
        assert_eq!(
            target_of(&table, &f.ctx(AIState::Chase, 2.0, 0.0)),
            Some(AIState::Patrol)
        );
    }

    #[test]
    fn test_chase_holds_between_detection_and_lose_radius() {
        // 6.0: вне detection, но lose-target ещё не сработал
        let f = Fixture::new().seen_at(6.0, 5.0, 2.0, 8.0);
        let table = TransitionTable::for_archetype(&Archetype::Grunt);
        assert_eq!(target_of(&table, &f.ctx(AIState::Chase, 30.0, 0.0)), None);
    }

    #[test]
    fn test_hurt_waits_for_hold_release() {
        let f = Fixture::new().seen_at(3.0, 5.0, 2.0, 8.0);
        let table = TransitionTable::for_archetype(&Archetype::Grunt);

        let mut ctx = f.ctx(AIState::Hurt, 5.0, 0.0);
        assert_eq!(target_of(&table, &ctx), None);

        ctx.hold_released = true;
        assert_eq!(target_of(&table, &ctx), Some(AIState::Chase));

        let far = Fixture::new();
        let mut ctx = far.ctx(AIState::Hurt, 5.0, 0.0);
        ctx.hold_released = true;
        assert_eq!(target_of(&table, &ctx), Some(AIState::Patrol));
    }

    #[test]
    fn test_declaration_order_resolves_overlap() {
        // Оба guard'а истинны - выигрывает объявленное раньше
        fn always(_: &GuardContext) -> bool {
            true
        }
        let table = TransitionTable::new(vec![
            TransitionRule::new(AIState::Idle, AIState::Patrol, always, "first"),
            TransitionRule::new(AIState::Idle, AIState::Chase, always, "second"),
        ]);
        let f = Fixture::new();
        let rule = table.first_match(&f.ctx(AIState::Idle, 0.0, 0.0));
        assert_eq!(rule.map(|r| r.label), Some("first"));
    }

    #[test]
    fn test_charger_rules_precede_standard_chase_rules() {
        let mut f = Fixture::new().seen_at(4.0, 6.0, 1.5, 9.0);
        f.archetype = ArchetypeKind::Charger.default_archetype();
        let table = TransitionTable::for_archetype(&f.archetype);

        assert_eq!(
            target_of(&table, &f.ctx(AIState::Chase, 0.0, 0.0)),
            Some(AIState::Charge)
        );

        let mut ctx = f.ctx(AIState::Chase, 0.0, 0.0);
        ctx.ability_ready = false;
        assert_eq!(target_of(&table, &ctx), None);

        // Хвост charge → Stun, а не общий Charge → Chase
        let mut ctx = f.ctx(AIState::Charge, 1.0, 0.0);
        ctx.hold_released = true;
        assert_eq!(target_of(&table, &ctx), Some(AIState::Stun));
    }

    #[test]
    fn test_grunt_never_charges() {
        let f = Fixture::new().seen_at(4.0, 6.0, 1.5, 9.0);
        let tables = TransitionTables::default();
        let table = tables.get(ArchetypeKind::Grunt);
        assert_eq!(target_of(table, &f.ctx(AIState::Chase, 0.0, 0.0)), None);
    }
}
