//! Deferred actions - "подождать и сделать" без блокирующих wait'ов.
//!
//! Каждое действие привязано к (ожидаемое состояние, generation перехода). Если к моменту
//! срабатывания агент уже ушёл из состояния (или умер) - действие stale и выбрасывается.
//! Actions живут на entity: despawn агента уносит их с собой.

use bevy::prelude::*;

use crate::ai::AIState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredKind {
    /// Конец hold периода (Hurt / Stun / Charge) → разрешаем выход из состояния
    ReleaseHold,
    /// Завершение swing/cast в Attack
    CompleteCast,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredAction {
    pub fire_at: f32,
    pub kind: DeferredKind,
    pub expected_state: AIState,
    pub generation: u32,
}

impl DeferredAction {
    /// Guard: агент всё ещё в том же состоянии той же generation
    pub fn is_current(&self, state: AIState, generation: u32) -> bool {
        !state.is_terminal() && state == self.expected_state && generation == self.generation
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct DeferredActions {
    pending: Vec<DeferredAction>,
}

impl DeferredActions {
    pub fn schedule(&mut self, action: DeferredAction) {
        self.pending.push(action);
    }

    /// Забрать все действия с fire_at <= now, в порядке срабатывания
    pub fn drain_due(&mut self, now: f32) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        self.pending.retain(|action| {
            if action.fire_at <= now {
                due.push(*action);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.fire_at.total_cmp(&b.fire_at));
        due
    }

    /// Выбросить всё, что привязано к устаревшим generation
    pub fn cancel_stale(&mut self, generation: u32) -> usize {
        let before = self.pending.len();
        self.pending.retain(|action| action.generation == generation);
        before - self.pending.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
