//! crpg-core: Combat turn and status engine for the Corruption RPG cave encounter
//!
//! This crate contains the combat rules with no I/O dependencies: initiative
//! and turn order, the Burn and Inferno kit, boss decks and boss AI, and grid
//! movement. A front end drives a [`TurnEngine`] with player commands, steps
//! boss turns (directly or through [`driver::drive_boss_turn`]) and renders
//! [`CombatSnapshot`]s and [`CombatEvent`]s.

pub mod actions;
pub mod boss_ai;
pub mod bosses;
pub mod combatant;
pub mod config;
pub mod deck;
pub mod driver;
pub mod error;
pub mod event;
pub mod grid;
pub mod pathing;
pub mod spells;
pub mod state;
pub mod status;
pub mod turn;

mod consts;
mod rng;

pub use actions::{BurnResult, InfernoToggle, MoveResult};
pub use boss_ai::{BossStep, CardOutcome};
pub use bosses::BossKind;
pub use combatant::{Attributes, Boss, Player, PlayerId};
pub use config::{BurnPolicy, CombatConfig};
pub use consts::*;
pub use error::{ConfigError, Rejection};
pub use event::{CombatEvent, CombatObserver};
pub use grid::{Board, Cell, DistanceMetric, Footprint};
pub use rng::{Die, GameRng};
pub use state::{CombatSnapshot, CombatState, Phase, TurnSlot};
pub use turn::{EndTurnOrigin, TurnEngine};
