//! Patrol Path Generator - oscillating влево/вправо без persistent waypoint state.
//!
//! Направление выводится из времени: `phase = (now + phase_offset) mod cycle`,
//! первая половина цикла → вправо, вторая → влево. `phase_offset` считается от момента
//! спавна и стабильного id агента: чётность id выбирает полуцикл, Weyl jitter разносит
//! агентов одной чётности. Соседние id одного спавна стартуют в разные стороны.
//!
//! Endpoints (`initial ± range/2`) пересчитываются раз в несколько секунд:
//! knockback/physics push может унести агента с исходной точки.

use bevy::prelude::*;

/// Множитель patrol_wait_time → длина полного цикла (меньше - видимый jitter)
pub const PATROL_CYCLE_FACTOR: f32 = 5.0;

/// Короче этой доли полуцикла разворачиваться не стоит - держим текущий facing
const MIN_LEG_FRACTION: f32 = 0.25;

/// Период пересчёта endpoints (секунды)
pub const ENDPOINT_REFRESH_INTERVAL: f32 = 3.0;

/// Weyl-последовательность для jitter внутри полуцикла
const GOLDEN_RATIO_FRACT: f64 = 0.618_033_988_749_894_8;

/// Jitter не больше этой доли полуцикла. Меньше `1 - MIN_LEG_FRACTION`, иначе на спавне
/// facing bias может развернуть агента в сторону соседа.
const PHASE_JITTER_FRACTION: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum PatrolDirection {
    Left,
    Right,
}

impl PatrolDirection {
    pub fn from_facing(facing_right: bool) -> Self {
        if facing_right {
            PatrolDirection::Right
        } else {
            PatrolDirection::Left
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            PatrolDirection::Left => -1.0,
            PatrolDirection::Right => 1.0,
        }
    }

    /// Единичный вектор направления
    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.sign(), 0.0)
    }

    pub fn reversed(self) -> Self {
        match self {
            PatrolDirection::Left => PatrolDirection::Right,
            PatrolDirection::Right => PatrolDirection::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedLeg {
    direction: PatrolDirection,
    valid_until: f32,
}

/// Patrol endpoints + кэш направления
#[derive(Component, Debug, Clone)]
pub struct PatrolPath {
    pub initial_position: Vec2,
    pub left_point: Vec2,
    pub right_point: Vec2,
    pub current_target: Vec2,
    pub patrol_range: f32,
    pub cycle_length: f32,
    pub phase_offset: f32,
    cached: Option<CachedLeg>,
    next_endpoint_refresh: f32,
}

impl PatrolPath {
    pub fn new(agent_id: u64, initial_position: Vec2, patrol_range: f32, patrol_wait_time: f32, now: f32) -> Self {
        let cycle_length = patrol_wait_time * PATROL_CYCLE_FACTOR;
        let half_range = Vec2::new(patrol_range * 0.5, 0.0);

        Self {
            initial_position,
            left_point: initial_position - half_range,
            right_point: initial_position + half_range,
            current_target: initial_position + half_range,
            patrol_range,
            cycle_length,
            // Фаза отсчитывается от спавна: при `now == spawn` phase == offset
            phase_offset: (Self::phase_offset_for(agent_id, cycle_length) - now).rem_euclid(cycle_length),
            cached: None,
            next_endpoint_refresh: now + ENDPOINT_REFRESH_INTERVAL,
        }
    }

    /// Стабильный per-instance сдвиг фазы в [0, cycle_length)
    ///
    /// Нечётные id начинают с левого полуцикла, чётные с правого; jitter ограничен
    /// `PHASE_JITTER_FRACTION` полуцикла.
    pub fn phase_offset_for(agent_id: u64, cycle_length: f32) -> f32 {
        let half = cycle_length * 0.5;
        let parity = if agent_id % 2 == 1 { half } else { 0.0 };
        let jitter = (agent_id as f64 * GOLDEN_RATIO_FRACT).fract() as f32;
        parity + jitter * half * PHASE_JITTER_FRACTION
    }

    /// Направление из чистой фазы (без кэша и facing bias)
    pub fn raw_direction(&self, now: f32) -> PatrolDirection {
        let phase = (now + self.phase_offset).rem_euclid(self.cycle_length);
        if phase < self.cycle_length * 0.5 {
            PatrolDirection::Right
        } else {
            PatrolDirection::Left
        }
    }

    /// Когда закончится текущий полуцикл
    fn half_cycle_end(&self, now: f32) -> f32 {
        let half = self.cycle_length * 0.5;
        let phase = (now + self.phase_offset).rem_euclid(self.cycle_length);
        now + (half - phase.rem_euclid(half))
    }

    /// GetPatrolDirection
    ///
    /// Направление кэшируется до конца полуцикла. На свежем leg'е (кэш пуст после входа в
    /// Patrol) короткий остаток полуцикла идём по текущему facing, а не разворачиваемся.
    pub fn direction(&mut self, now: f32, facing_right: bool) -> PatrolDirection {
        if let Some(leg) = self.cached {
            if now < leg.valid_until {
                return leg.direction;
            }
        }

        let fresh_leg = self.cached.is_none();
        let valid_until = self.half_cycle_end(now);
        let mut direction = self.raw_direction(now);

        let remaining = valid_until - now;
        let facing = PatrolDirection::from_facing(facing_right);
        if fresh_leg && direction != facing && remaining < self.cycle_length * 0.5 * MIN_LEG_FRACTION {
            direction = facing;
        }

        self.cache(direction, valid_until);
        direction
    }

    /// Direction + удержание внутри endpoints
    pub fn steer(&mut self, now: f32, position: Vec2, facing_right: bool) -> PatrolDirection {
        let direction = self.direction(now, facing_right);

        let at_edge = match direction {
            PatrolDirection::Right => position.x >= self.right_point.x,
            PatrolDirection::Left => position.x <= self.left_point.x,
        };
        let bounded = if at_edge { direction.reversed() } else { direction };

        if bounded != direction {
            // Упёрлись в край - разворот держим до конца полуцикла
            let valid_until = self.cached.map_or(now, |leg| leg.valid_until);
            self.cache(bounded, valid_until);
        }
        bounded
    }

    fn cache(&mut self, direction: PatrolDirection, valid_until: f32) {
        self.cached = Some(CachedLeg {
            direction,
            valid_until,
        });
        self.current_target = match direction {
            PatrolDirection::Left => self.left_point,
            PatrolDirection::Right => self.right_point,
        };
    }

    /// Сброс кэша (любой выход из Patrol)
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn cached_direction(&self) -> Option<PatrolDirection> {
        self.cached.map(|leg| leg.direction)
    }

    /// Периодический пересчёт endpoints
    ///
    /// Если агента вытолкнуло за пределы маршрута - новый центр в текущей позиции.
    /// Возвращает true если endpoints сдвинулись.
    pub fn refresh_endpoints(&mut self, now: f32, position: Vec2) -> bool {
        if now < self.next_endpoint_refresh {
            return false;
        }
        self.next_endpoint_refresh = now + ENDPOINT_REFRESH_INTERVAL;

        let drift = (position.x - self.initial_position.x).abs();
        if drift <= self.patrol_range * 0.5 {
            return false;
        }

        let half_range = Vec2::new(self.patrol_range * 0.5, 0.0);
        self.initial_position = position;
        self.left_point = position - half_range;
        self.right_point = position + half_range;
        if let Some(direction) = self.cached_direction() {
            self.current_target = match direction {
                PatrolDirection::Left => self.left_point,
                PatrolDirection::Right => self.right_point,
            };
        }
        true
    }
}
