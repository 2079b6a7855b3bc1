//! Combat systems (strategic layer logic)

pub mod damage;
pub mod lifecycle;


// Re-export all systems
pub use damage::*;
pub use lifecycle::*;
