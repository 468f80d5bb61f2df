//! Combat tuning
//!
//! Every number the engine uses lives here. Defaults reproduce the shipped
//! encounter; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::grid::DistanceMetric;

/// How a Burn cast without Inferno primed is turned into a status stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BurnPolicy {
    /// `amount` per tick for `ticks` ticks
    Fixed { amount: u32, ticks: u32 },
    /// `amount` per tick; ticks come from the caster's POW
    PowerScaled { amount: u32 },
}

impl Default for BurnPolicy {
    fn default() -> Self {
        Self::Fixed {
            amount: BURN_TICK_AMOUNT,
            ticks: BURN_TICKS,
        }
    }
}

impl BurnPolicy {
    /// `(amount per tick, ticks)` for a caster with the given POW
    pub fn stack_for(&self, pow: i32) -> (u32, u32) {
        match *self {
            Self::Fixed { amount, ticks } => (amount, ticks),
            Self::PowerScaled { amount } => (amount, ((pow - 10).div_euclid(2)).max(0) as u32),
        }
    }

    /// Damage a detonation front-loads: the full DoT of one fixed stack
    pub fn detonation_damage(&self, pow: i32) -> u32 {
        let (amount, ticks) = self.stack_for(pow);
        amount * ticks
    }
}

/// Combat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub grid_size: i32,
    pub burn_policy: BurnPolicy,
    pub burn_range: i32,
    pub range_metric: DistanceMetric,
    pub inferno_pulse_start: u32,
    pub swipe_damage: u32,
    pub charge_damage: u32,
    pub charge_steps: u32,
    pub roar_radius: i32,
    pub roar_penalty: u32,
    pub card_loop_cap: u32,
    pub initiative_tiebreak_sides: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            burn_policy: BurnPolicy::default(),
            burn_range: BURN_RANGE,
            range_metric: DistanceMetric::Dnd35,
            inferno_pulse_start: INFERNO_PULSE_START,
            swipe_damage: SWIPE_DAMAGE,
            charge_damage: CHARGE_DAMAGE,
            charge_steps: CHARGE_STEPS,
            roar_radius: ROAR_RADIUS,
            roar_penalty: ROAR_PENALTY,
            card_loop_cap: CARD_LOOP_CAP,
            initiative_tiebreak_sides: INITIATIVE_TIEBREAK_SIDES,
        }
    }
}

impl CombatConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 1 {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be at least 1, got {}",
                self.grid_size
            )));
        }
        if self.card_loop_cap == 0 {
            return Err(ConfigError::Invalid("card_loop_cap must be positive".into()));
        }
        if self.initiative_tiebreak_sides == 0 {
            return Err(ConfigError::Invalid(
                "initiative_tiebreak_sides must be positive".into(),
            ));
        }
        Ok(())
    }
}
