//! Combat state
//!
//! The single mutable aggregate of an encounter. Only the turn engine and the
//! two resolvers write to it; presentation code reads a [`CombatSnapshot`].

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::bosses::BossKind;
use crate::combatant::{Boss, Player, PlayerId, TurnResources};
use crate::deck::DeckCounts;
use crate::event::{CombatEvent, DamageReason, EventLog, Target};
use crate::grid::{Board, Cell, Footprint, Occupancy, Occupant};
use crate::status::{Buff, StatusStack};

/// One entry of the initiative order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnSlot {
    Player { idx: usize },
    Boss,
}

/// Where the encounter is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Created, initiative not rolled
    #[default]
    Setup,
    PlayerTurn,
    BossTurn,
    /// Stopped from outside; no further commands are accepted
    Aborted,
}

/// Everything the engine mutates during an encounter
#[derive(Debug, Clone)]
pub struct CombatState {
    pub board: Board,
    pub players: Vec<Player>,
    pub boss: Boss,
    /// Starts at 1, bumped when the turn pointer wraps
    pub round: u32,
    /// Fixed for the whole encounter once initiative resolves
    pub turn_order: Vec<TurnSlot>,
    pub turn_ptr: usize,
    pub is_player_turn: bool,
    /// Damage of the next Inferno pulse
    pub inferno_pulse: u32,
    /// Applied to boss card damage this boss turn
    pub damage_multiplier: u32,
    pub phase: Phase,
    pub events: EventLog,
}

impl CombatState {
    pub fn new(board: Board, players: Vec<Player>, boss: Boss, inferno_pulse: u32) -> Self {
        Self {
            board,
            players,
            boss,
            round: 1,
            turn_order: Vec::new(),
            turn_ptr: 0,
            is_player_turn: false,
            inferno_pulse,
            damage_multiplier: 1,
            phase: Phase::Setup,
            events: EventLog::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Aborted)
    }

    pub fn current_slot(&self) -> Option<TurnSlot> {
        self.turn_order.get(self.turn_ptr).copied()
    }

    /// Index of the player whose turn it is
    pub fn active_player(&self) -> Option<usize> {
        match self.current_slot()? {
            TurnSlot::Player { idx } if self.is_player_turn => Some(idx),
            _ => None,
        }
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn slot_name(&self, slot: TurnSlot) -> String {
        match slot {
            TurnSlot::Player { idx } => self
                .players
                .get(idx)
                .map_or_else(|| format!("player #{idx}"), |p| p.name.clone()),
            TurnSlot::Boss => self.boss.name.clone(),
        }
    }

    /// Living player closest to the boss footprint (Manhattan), lowest index on ties
    pub fn nearest_player_to_boss(&self) -> Option<usize> {
        let fp = self.boss.footprint;
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_alive())
            .min_by_key(|(idx, p)| (fp.manhattan_to(p.pos), *idx))
            .map(|(idx, _)| idx)
    }

    pub fn damage_boss(&mut self, amount: u32, reason: DamageReason) {
        let hp_after = self.boss.take_damage(amount);
        let name = self.boss.name.clone();
        self.events.record(CombatEvent::DamageApplied {
            target: Target::Boss,
            name,
            amount,
            hp_after,
            reason,
        });
    }

    pub fn damage_player(&mut self, idx: usize, amount: u32, reason: DamageReason) {
        let Some(player) = self.players.get_mut(idx) else {
            return;
        };
        let hp_after = player.take_damage(amount);
        let event = CombatEvent::DamageApplied {
            target: Target::Player(player.id),
            name: player.name.clone(),
            amount,
            hp_after,
            reason,
        };
        self.events.record(event);
    }

    pub fn party_defeated(&self) -> bool {
        self.players.iter().all(|p| !p.is_alive())
    }

    pub fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot {
            round: self.round,
            phase: self.phase,
            turn_ptr: self.turn_ptr,
            active: self.current_slot(),
            is_player_turn: self.is_player_turn,
            turn_order: self
                .turn_order
                .iter()
                .map(|&slot| SlotView {
                    slot,
                    name: self.slot_name(slot),
                })
                .collect(),
            players: self.players.iter().map(PlayerView::from).collect(),
            boss: BossView {
                kind: self.boss.kind,
                name: self.boss.name.clone(),
                family: self.boss.kind.def().family,
                footprint: self.boss.footprint,
                hp: self.boss.hp,
                hp_max: self.boss.hp_max,
                statuses: self.boss.statuses.stacks().to_vec(),
                deck: self.boss.deck.peek_counts(),
                enrage_next: self.boss.enrage_next,
            },
            inferno_pulse: self.inferno_pulse,
            damage_multiplier: self.damage_multiplier,
        }
    }
}

impl Occupancy for CombatState {
    fn grid_size(&self) -> i32 {
        self.board.size
    }

    fn is_cell_blocked(&self, cell: Cell, excluding: Option<Occupant>) -> bool {
        if self.board.is_obstacle(cell) {
            return true;
        }
        if excluding != Some(Occupant::Boss) && self.boss.footprint.contains(cell) {
            return true;
        }
        self.players.iter().any(|p| {
            p.is_alive() && p.pos == cell && excluding != Some(Occupant::Player(p.id))
        })
    }
}

/// Read-only view for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatSnapshot {
    pub round: u32,
    pub phase: Phase,
    pub turn_ptr: usize,
    pub active: Option<TurnSlot>,
    pub is_player_turn: bool,
    pub turn_order: Vec<SlotView>,
    pub players: Vec<PlayerView>,
    pub boss: BossView,
    pub inferno_pulse: u32,
    pub damage_multiplier: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub slot: TurnSlot,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub hp: u32,
    pub hp_max: u32,
    pub pos: Cell,
    pub turn: TurnResources,
    pub buffs: Vec<Buff>,
    /// Tooltip strings, same order as `buffs`
    pub buff_labels: Vec<String>,
    pub next_move_penalty: u32,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            hp: p.hp,
            hp_max: p.hp_max,
            pos: p.pos,
            turn: p.turn,
            buffs: p.buffs.iter().cloned().collect(),
            buff_labels: p.buffs.labels(),
            next_move_penalty: p.next_move_penalty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BossView {
    pub kind: BossKind,
    pub name: String,
    pub family: &'static str,
    pub footprint: Footprint,
    pub hp: u32,
    pub hp_max: u32,
    pub statuses: Vec<StatusStack>,
    pub deck: DeckCounts,
    pub enrage_next: bool,
}
