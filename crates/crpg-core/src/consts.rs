//! Core combat constants
//!
//! Defaults for [`crate::CombatConfig`]; the engine itself reads the config.

/// Board edge length (board is square, 1-indexed)
pub const GRID_SIZE: i32 = 15;

/// Burn damage-over-time
pub const BURN_TICK_AMOUNT: u32 = 1;
pub const BURN_TICKS: u32 = 3;
pub const BURN_RANGE: i32 = 7;

/// First Inferno pulse damage; each pulse adds one
pub const INFERNO_PULSE_START: u32 = 2;

/// Boss card numbers
pub const SWIPE_DAMAGE: u32 = 4;
pub const CHARGE_DAMAGE: u32 = 2;
pub const CHARGE_STEPS: u32 = 4;
pub const ROAR_RADIUS: i32 = 20;
pub const ROAR_PENALTY: u32 = 2;

/// Hard cap on cards resolved in one boss turn
pub const CARD_LOOP_CAP: u32 = 10;

/// Sides of the initiative tiebreak die
pub const INITIATIVE_TIEBREAK_SIDES: u32 = 1000;

/// Player defaults
pub const DEFAULT_HIT_DIE: u32 = 6;
pub const DEFAULT_MOVE_DIE: u32 = 4;
pub const DEFAULT_ATTRIBUTE: i32 = 8;
