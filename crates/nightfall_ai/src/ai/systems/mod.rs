//! AI systems (FixedUpdate, порядок задаёт `SimulationSet`)

pub mod attack;
pub mod behavior;
pub mod movement;
pub mod reactions;
pub mod sensing;
pub mod timers;

// Re-export all systems
pub use attack::*;
pub use behavior::*;
pub use movement::*;
pub use reactions::*;
pub use sensing::*;
pub use timers::*;
