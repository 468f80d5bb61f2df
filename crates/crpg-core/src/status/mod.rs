//! Status effects and buffs
//!
//! Two stores with different merge rules: boss statuses never merge (every
//! Burn application ticks on its own), player buffs merge by id.

mod buffs;
mod effects;

pub use buffs::{Buff, BuffDef, BuffId, BuffKind, BuffList};
pub use effects::{StatusKind, StatusList, StatusStack, StatusTick};
