//! ECS Components для агентов и цели
//!
//! Организация по доменам:
//! - actor: идентичность и боевые характеристики (Agent, Health, CombatStats)
//! - movement: позиция, скорость, desired velocity (WorldPosition, Locomotion, DesiredVelocity)
//! - target: маркер Target Provider (игрок)

pub mod actor;
pub mod movement;
pub mod target;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
pub use target::*;
