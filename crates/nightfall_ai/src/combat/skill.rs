//! Skill cast tracking - граница со Skill/Ability provider.
//!
//! FSM не исполняет эффекты скиллов. Он только сигналит start / release / interrupt и
//! держит флаг "is mid-cast", который читает damage hook.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum SkillKind {
    MeleeSwing,
    RangedBolt,
    Charge,
}

/// Каст в полёте
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ActiveCast {
    pub skill: SkillKind,
    pub started_at: f32,
    /// Generation состояния, в котором каст начат
    pub generation: u32,
}

#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct SkillCast {
    pub active: Option<ActiveCast>,
}

impl SkillCast {
    pub fn is_mid_cast(&self) -> bool {
        self.active.is_some()
    }

    pub fn begin(&mut self, skill: SkillKind, now: f32, generation: u32) {
        self.active = Some(ActiveCast {
            skill,
            started_at: now,
            generation,
        });
    }

    /// Каст завершился штатно
    pub fn finish(&mut self) -> Option<ActiveCast> {
        self.active.take()
    }

    /// Каст прерван; возвращает что именно прервали
    pub fn interrupt(&mut self) -> Option<SkillKind> {
        self.active.take().map(|cast| cast.skill)
    }

    /// Тихая очистка (смерть: interrupt не поднимается)
    pub fn clear(&mut self) {
        self.active = None;
    }
}

/// Почему каст прерван
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    Damage,
    StateExit,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SkillStarted {
    pub entity: Entity,
    pub skill: SkillKind,
}

/// Каст дошёл до release - provider исполняет эффект
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SkillReleased {
    pub entity: Entity,
    pub skill: SkillKind,
    pub target: Option<Entity>,
}

/// Interrupt callback: provider обязан отменить in-flight эффект и свои таймеры
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SkillInterrupted {
    pub entity: Entity,
    pub skill: SkillKind,
    pub reason: InterruptReason,
}
