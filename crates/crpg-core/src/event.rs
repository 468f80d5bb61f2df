//! Domain events
//!
//! Every state transition worth showing is recorded here in order. The
//! engine keeps them until [`crate::TurnEngine::flush_events`] hands them to
//! subscribed observers, or a caller drains them directly.

use core::fmt;

use serde::Serialize;
use tracing::debug;

use crate::boss_ai::CardOutcome;
use crate::combatant::PlayerId;
use crate::grid::Cell;
use crate::rng::Die;
use crate::state::TurnSlot;
use crate::status::{BuffId, StatusKind};

/// Who took damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Player(PlayerId),
    Boss,
}

/// What dealt it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum DamageReason {
    Burn,
    Detonation,
    #[strum(serialize = "Inferno pulse")]
    InfernoPulse,
    Swipe,
    Charge,
}

/// A recorded combat transition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CombatEvent {
    InitiativeRolled {
        slot: TurnSlot,
        name: String,
        roll: u32,
        tiebreak: u32,
    },
    InitiativeResolved {
        order: Vec<TurnSlot>,
        names: Vec<String>,
    },
    RoundStarted {
        round: u32,
    },
    TurnBegan {
        slot: TurnSlot,
        name: String,
        round: u32,
    },
    TurnEnded {
        slot: TurnSlot,
        name: String,
    },
    EndTurnRejected {
        origin: &'static str,
        reason: String,
    },
    StatusApplied {
        kind: StatusKind,
        amount: u32,
        remaining: u32,
        source: String,
    },
    StatusTicked {
        damage: u32,
        stacks: usize,
    },
    StatusExpired {
        kind: StatusKind,
        count: usize,
    },
    BuffApplied {
        player: PlayerId,
        name: String,
        buff: BuffId,
        stacks: u32,
    },
    BuffConsumed {
        player: PlayerId,
        name: String,
        buff: BuffId,
        stacks_left: u32,
    },
    BuffCleared {
        player: PlayerId,
        name: String,
        buff: BuffId,
    },
    BuffExpired {
        player: PlayerId,
        name: String,
        buff: BuffId,
    },
    DamageApplied {
        target: Target,
        name: String,
        amount: u32,
        hp_after: u32,
        reason: DamageReason,
    },
    BossMoved {
        from: Cell,
        to: Cell,
        cost: u32,
    },
    CardDrawn {
        id: String,
        name: String,
    },
    CardResolved {
        id: String,
        name: String,
        outcome: CardOutcome,
        cycle: bool,
    },
    MovementRolled {
        player: PlayerId,
        name: String,
        die: Die,
        roll: u32,
        penalty: u32,
        steps: u32,
    },
    PlayerMoved {
        player: PlayerId,
        name: String,
        from: Cell,
        to: Cell,
        cost: u32,
        remaining: u32,
    },
    ActionRejected {
        reason: String,
    },
    SpellCast {
        player: PlayerId,
        name: String,
        spell: &'static str,
    },
    InfernoPulse {
        source: PlayerId,
        damage: u32,
    },
    CombatAborted,
}

impl fmt::Display for CombatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitiativeRolled {
                name, roll, tiebreak, ..
            } => write!(f, "{name} rolls {roll} for initiative (tiebreak {tiebreak})"),
            Self::InitiativeResolved { names, .. } => {
                write!(f, "Turn order: {}", names.join(", "))
            }
            Self::RoundStarted { round } => write!(f, "Round {round}"),
            Self::TurnBegan { name, .. } => write!(f, "{name}'s turn"),
            Self::TurnEnded { name, .. } => write!(f, "{name} ends the turn"),
            Self::EndTurnRejected { origin, reason } => write!(f, "{reason} [{origin}]"),
            Self::StatusApplied {
                kind,
                amount,
                remaining,
                source,
            } => write!(
                f,
                "{source} applies {} ({amount}/tick, {remaining} ticks)",
                kind.name()
            ),
            Self::StatusTicked { damage, stacks } => {
                write!(f, "Statuses tick: {stacks} stack(s) for {damage}")
            }
            Self::StatusExpired { kind, count } => {
                write!(f, "{count} {} stack(s) expire", kind.name())
            }
            Self::BuffApplied {
                name, buff, stacks, ..
            } => write!(f, "{name} gains {} ({stacks})", buff.name()),
            Self::BuffConsumed {
                name,
                buff,
                stacks_left,
                ..
            } => write!(f, "{name} spends {} ({stacks_left} left)", buff.name()),
            Self::BuffCleared { name, buff, .. } => write!(f, "{name} drops {}", buff.name()),
            Self::BuffExpired { name, buff, .. } => write!(f, "{}'s {} fades", name, buff.name()),
            Self::DamageApplied {
                name,
                amount,
                hp_after,
                reason,
                ..
            } => write!(f, "{name} takes {amount} damage ({reason}), hp {hp_after}"),
            Self::BossMoved { from, to, cost } => {
                write!(f, "Boss moves {from} -> {to} (cost {cost})")
            }
            Self::CardDrawn { name, .. } => write!(f, "Boss draws {name}"),
            Self::CardResolved {
                name,
                outcome,
                cycle,
                ..
            } => {
                write!(f, "{name}: {outcome}")?;
                if *cycle {
                    write!(f, " (cycle)")?;
                }
                Ok(())
            }
            Self::MovementRolled {
                name,
                die,
                roll,
                penalty,
                steps,
                ..
            } => {
                if *penalty > 0 {
                    write!(f, "{name} rolls {die} = {roll}, penalty {penalty} -> {steps}")
                } else {
                    write!(f, "{name} rolls {die} = {steps}")
                }
            }
            Self::PlayerMoved {
                name,
                from,
                to,
                cost,
                remaining,
                ..
            } => write!(f, "{name} moves {from} -> {to} (cost {cost}, {remaining} left)"),
            Self::ActionRejected { reason } => write!(f, "{reason}"),
            Self::SpellCast { name, spell, .. } => write!(f, "{name} casts {spell}"),
            Self::InfernoPulse { damage, .. } => write!(f, "Inferno pulses for {damage}"),
            Self::CombatAborted => write!(f, "Combat aborted"),
        }
    }
}

/// Receives events in the order they were recorded
pub trait CombatObserver {
    fn on_event(&mut self, event: &CombatEvent);
}

impl<F> CombatObserver for F
where
    F: FnMut(&CombatEvent),
{
    fn on_event(&mut self, event: &CombatEvent) {
        self(event)
    }
}

/// Pending events, oldest first
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pending: Vec<CombatEvent>,
}

impl EventLog {
    pub fn record(&mut self, event: CombatEvent) {
        debug!("{event}");
        self.pending.push(event);
    }

    pub fn pending(&self) -> &[CombatEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_drains_in_order() {
        let mut log = EventLog::default();
        log.record(CombatEvent::RoundStarted { round: 1 });
        log.record(CombatEvent::CombatAborted);
        let events = log.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], CombatEvent::RoundStarted { round: 1 });
        assert!(log.is_empty());
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |e: &CombatEvent| seen.push(e.to_string());
            observer.on_event(&CombatEvent::RoundStarted { round: 2 });
        }
        assert_eq!(seen, vec!["Round 2"]);
    }

    #[test]
    fn test_event_json_tag() {
        let event = CombatEvent::DamageApplied {
            target: Target::Boss,
            name: "Bear".into(),
            amount: 1,
            hp_after: 99,
            reason: DamageReason::Burn,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "damage_applied");
        assert_eq!(json["target"], "boss");
        assert_eq!(json["reason"], "burn");
        assert_eq!(event.to_string(), "Bear takes 1 damage (Burn), hp 99");
    }
}
