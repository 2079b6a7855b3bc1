//! Update Scheduler - решает, нужен ли агенту полный behavior tick в этом кадре.
//!
//! Гибрид event-driven + periodic floor:
//! - dirty flags (цель вошла в радиус, изменилось здоровье, attack/charge/stun) → tick сразу
//! - иначе tick не реже интервала текущего visibility tier (on-screen быстро, off-screen медленно)
//! - Attack/Charge/Hurt/Stun тикаются всегда
//!
//! Periodic floor нужен для условий, которые никто не анонсирует событием
//! (истечение dwell time, случайные idle ↔ patrol броски).

use bevy::prelude::*;

use crate::ai::AIState;
use crate::config::SchedulerConfig;

bitflags::bitflags! {
    /// Что изменилось с прошлого tick
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirtyFlags: u16 {
        /// Цель вошла в detection radius (или вышла из него)
        const TARGET_IN_RANGE = 1 << 0;
        /// Цель вошла в attack radius (или вышла из него)
        const TARGET_IN_ATTACK_RANGE = 1 << 1;
        /// Цель ушла дальше lose-target radius (или вернулась)
        const TARGET_LOST = 1 << 2;
        const HEALTH_CHANGED = 1 << 3;
        const ATTACK_STATE_CHANGED = 1 << 4;
        const CHARGE_STATE_CHANGED = 1 << 5;
        const STUN_STATE_CHANGED = 1 << 6;
        /// Сработал hold timer (hurt/stun/charge) или завершился cast
        const HOLD_RELEASED = 1 << 7;
        /// Внешний ForceStateRequest
        const FORCED = 1 << 8;
    }
}

impl DirtyFlags {
    /// Флаги, которые выставляются при входе/выходе из состояния
    pub fn for_state(state: AIState) -> DirtyFlags {
        match state {
            AIState::Attack => DirtyFlags::ATTACK_STATE_CHANGED,
            AIState::Charge => DirtyFlags::CHARGE_STATE_CHANGED,
            AIState::Stun => DirtyFlags::STUN_STATE_CHANGED,
            AIState::Dead | AIState::Hurt => DirtyFlags::HEALTH_CHANGED,
            AIState::Idle | AIState::Patrol | AIState::Chase => DirtyFlags::empty(),
        }
    }
}

/// Видимая область (камера) + расширение границы
///
/// Агенты становятся "on-screen" чуть раньше входа в кадр, чтобы не было pop-in поведения.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Vec2,
    pub half_extents: Vec2,
    /// Boundary extension (world units) с каждой стороны
    pub margin: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            half_extents: Vec2::new(16.0, 9.0),
            margin: 2.0,
        }
    }
}

impl Viewport {
    pub fn new(center: Vec2, half_extents: Vec2, margin: f32) -> Self {
        Self {
            center,
            half_extents,
            margin,
        }
    }

    /// Проекция позиции в viewport с учётом margin
    pub fn contains(&self, position: Vec2) -> bool {
        let offset = (position - self.center).abs();
        let limit = self.half_extents + Vec2::splat(self.margin);
        offset.x <= limit.x && offset.y <= limit.y
    }
}

/// Per-agent scheduler state
#[derive(Component, Debug, Clone)]
pub struct UpdateScheduler {
    pub on_screen_interval: f32,
    pub off_screen_interval: f32,
    /// Время последнего полного tick (last-update timestamp)
    last_tick: Option<f32>,
    visible: bool,
    dirty: DirtyFlags,
}

impl UpdateScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            on_screen_interval: config.on_screen_interval,
            off_screen_interval: config.off_screen_interval,
            last_tick: None,
            visible: false,
            dirty: DirtyFlags::empty(),
        }
    }

    /// ShouldTick: пересчитывает видимость и решает, нужен ли tick
    pub fn should_tick(
        &mut self,
        now: f32,
        state: AIState,
        position: Vec2,
        viewport: &Viewport,
    ) -> bool {
        self.visible = viewport.contains(position);

        if state.is_terminal() {
            return false;
        }
        if !self.dirty.is_empty() || state.requires_frequent_updates() {
            return true;
        }

        match self.last_tick {
            // Первый tick после спавна - сразу
            None => true,
            Some(last) => now - last >= self.interval(),
        }
    }

    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty |= flags;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = DirtyFlags::empty();
    }

    /// Tick выполнен: запоминаем время и сбрасываем все dirty flags
    pub fn record_tick(&mut self, now: f32) {
        self.last_tick = Some(now);
        self.clear_dirty();
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn last_tick(&self) -> Option<f32> {
        self.last_tick
    }

    /// Интервал текущего visibility tier
    pub fn interval(&self) -> f32 {
        if self.visible {
            self.on_screen_interval
        } else {
            self.off_screen_interval
        }
    }
}
