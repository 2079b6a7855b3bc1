//! State Machine Core - единственный владелец FSM агента.
//!
//! `change_state` - единая точка входа для всех переходов: evaluation, damage hooks,
//! внешние ForceStateRequest. Exit hook старого состояния → enter hook нового →
//! timer = 0, generation += 1.

use bevy::prelude::*;

use crate::ai::{AIState, GuardContext, TransitionTable};

/// Transient flags (isAttacking, isCharging, isStunned, isHurt)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub struct TransientFlags {
    pub attacking: bool,
    pub charging: bool,
    pub stunned: bool,
    pub hurt: bool,
}

/// Что агенту сейчас разрешено
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct Capabilities {
    pub can_move: bool,
    pub can_attack: bool,
    pub can_charge: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_move: true,
            can_attack: true,
            can_charge: true,
        }
    }
}

/// Результат применённого перехода
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: AIState,
    pub to: AIState,
    pub label: &'static str,
    /// Generation нового состояния
    pub generation: u32,
}

#[derive(Component, Debug, Clone)]
pub struct AIStateMachine {
    current: AIState,
    previous: AIState,
    /// Секунды с последнего перехода (dwell guards читают его)
    state_timer: f32,
    /// Растёт на каждом переходе; deferred actions привязаны к нему
    generation: u32,
    flags: TransientFlags,
    capabilities: Capabilities,
    hold_released: bool,
    /// Время в состоянии для следующего Idle/Patrol броска (None - ещё не бросали)
    next_roll_at: Option<f32>,
    /// "entered Idle" при спавне. Остальные входы сигналит reaction по StateChanged.
    spawn_signal_pending: bool,
    force_killed: bool,
}

impl Default for AIStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl AIStateMachine {
    pub fn new() -> Self {
        Self {
            current: AIState::Idle,
            previous: AIState::Idle,
            state_timer: 0.0,
            generation: 0,
            flags: TransientFlags::default(),
            capabilities: Capabilities::default(),
            hold_released: false,
            next_roll_at: None,
            // Idle после спавна - тоже вход в состояние
            spawn_signal_pending: true,
            force_killed: false,
        }
    }

    pub fn current(&self) -> AIState {
        self.current
    }

    pub fn previous(&self) -> AIState {
        self.previous
    }

    pub fn state_timer(&self) -> f32 {
        self.state_timer
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn flags(&self) -> TransientFlags {
        self.flags
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn hold_released(&self) -> bool {
        self.hold_released
    }

    pub fn is_dead(&self) -> bool {
        self.current.is_terminal()
    }

    /// Dead через explicit kill, а не через health == 0
    pub fn was_force_killed(&self) -> bool {
        self.force_killed
    }

    pub fn tick(&mut self, delta: f32) {
        self.state_timer += delta;
    }

    /// ChangeState
    ///
    /// Тот же state → no-op. Из Dead выхода нет.
    pub fn change_state(&mut self, next: AIState, label: &'static str) -> Option<StateChange> {
        if next == self.current {
            return None;
        }
        if self.current.is_terminal() {
            crate::log(&format!(
                "💀 FSM: ignoring {} → {} ({}), agent is dead",
                self.current, next, label
            ));
            return None;
        }

        let from = self.current;
        self.exit_state(from);

        self.previous = from;
        self.current = next;
        self.state_timer = 0.0;
        self.generation = self.generation.wrapping_add(1);
        self.hold_released = false;
        self.next_roll_at = None;

        self.enter_state(next);

        Some(StateChange {
            from,
            to: next,
            label,
            generation: self.generation,
        })
    }

    /// Explicit force-kill (Die без урона)
    pub fn force_kill(&mut self, label: &'static str) -> Option<StateChange> {
        let change = self.change_state(AIState::Dead, label)?;
        self.force_killed = true;
        Some(change)
    }

    /// Evaluate: первое правило таблицы, чей guard истинен. Максимум один переход за проход.
    pub fn evaluate(&mut self, table: &TransitionTable, ctx: &GuardContext) -> Option<StateChange> {
        if self.current.is_terminal() {
            return None;
        }
        debug_assert_eq!(ctx.state, self.current);

        let rule = table.first_match(ctx)?;
        self.change_state(rule.to, rule.label)
    }

    /// Hold timer истёк. Принимается только для той же generation того же состояния.
    pub fn release_hold(&mut self, expected: AIState, generation: u32) -> bool {
        if self.current != expected || self.generation != generation || self.is_dead() {
            return false;
        }
        self.hold_released = true;
        true
    }

    /// Положен ли бросок по расписанию: первый на `first_at`, дальше через `roll_interval`.
    ///
    /// Расписание живёт во времени состояния, поэтому частота опроса scheduler'ом на
    /// шансы не влияет.
    pub fn roll_due(&self, first_at: Option<f32>) -> bool {
        let Some(first_at) = first_at else {
            return false;
        };
        !self.is_dead() && self.state_timer >= self.next_roll_at.unwrap_or(first_at)
    }

    /// Бросок потрачен без перехода: следующий через `interval` от положенного момента
    pub fn consume_roll(&mut self, first_at: f32, interval: f32) {
        let due = self.next_roll_at.unwrap_or(first_at);
        self.next_roll_at = Some(due + interval);
    }

    pub fn spawn_signal_pending(&self) -> bool {
        self.spawn_signal_pending
    }

    /// "entered Idle" при спавне, ровно один раз
    pub fn take_spawn_signal(&mut self) -> Option<AIState> {
        if !self.spawn_signal_pending {
            return None;
        }
        self.spawn_signal_pending = false;
        Some(AIState::Idle)
    }

    fn enter_state(&mut self, state: AIState) {
        let caps = &mut self.capabilities;
        match state {
            AIState::Idle | AIState::Patrol | AIState::Chase => {
                caps.can_move = true;
                caps.can_attack = true;
            }
            AIState::Attack => {
                // Горизонтальное движение останавливается
                self.flags.attacking = true;
                caps.can_move = false;
                // Форс из Stun/Charge тоже должен уметь бить
                caps.can_attack = true;
            }
            AIState::Charge => {
                self.flags.charging = true;
                caps.can_move = false;
                caps.can_attack = false;
            }
            AIState::Stun => {
                self.flags.stunned = true;
                caps.can_move = false;
                caps.can_attack = false;
            }
            AIState::Hurt => {
                self.flags.hurt = true;
                caps.can_move = false;
            }
            AIState::Dead => {
                caps.can_move = false;
                caps.can_attack = false;
                caps.can_charge = false;
                self.flags = TransientFlags::default();
            }
        }
    }

    fn exit_state(&mut self, state: AIState) {
        match state {
            AIState::Attack => self.flags.attacking = false,
            AIState::Charge => self.flags.charging = false,
            AIState::Stun => self.flags.stunned = false,
            AIState::Hurt => self.flags.hurt = false,
            AIState::Idle | AIState::Patrol | AIState::Chase | AIState::Dead => {}
        }
    }
}
