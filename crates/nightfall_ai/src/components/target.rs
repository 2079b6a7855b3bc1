//! Target Provider - то, за чем охотятся агенты (обычно игрок).

use bevy::prelude::*;

use crate::components::{Health, WorldPosition};

/// Маркер цели
///
/// Agent читает только `WorldPosition` и `Health::is_alive`; урон приходит через
/// `AgentAttack` → Health цели.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Health, WorldPosition)]
pub struct Target;
