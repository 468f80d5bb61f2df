//! Error types
//!
//! [`Rejection`] is what a command returns when the request is not allowed
//! right now. Its `Display` text is shown to the player as is.

use thiserror::Error;

/// A refused player or turn command. No state was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Not your turn.")]
    NotYourTurn,

    #[error("{name} has no actions left.")]
    NoActionsLeft { name: String },

    #[error("{name} has no bonus actions left.")]
    NoBonusLeft { name: String },

    #[error("{name} has no attack spells available.")]
    SpellUnavailable { name: String },

    #[error("{name} cannot use Inferno.")]
    InfernoUnavailable { name: String },

    #[error("{name} is down.")]
    Defeated { name: String },

    #[error("No valid target.")]
    NoValidTarget,

    #[error("Target out of range.")]
    OutOfRange,

    #[error("Already moved this turn.")]
    AlreadyMoved,

    #[error("Movement already rolled.")]
    MovementAlreadyRolled,

    #[error("Roll movement first.")]
    MovementNotRolled,

    #[error("Destination not reachable.")]
    Unreachable,

    /// End-turn requested by something other than the player
    #[error("(ignored auto end-turn)")]
    AutomaticEndTurn { origin: &'static str },

    #[error("The boss is still acting.")]
    BossTurnPending,

    #[error("Combat is not active.")]
    CombatInactive,
}

/// Problems loading or validating a [`crate::CombatConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
