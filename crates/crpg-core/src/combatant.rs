//! Players and the boss

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::bosses::BossKind;
use crate::consts::{DEFAULT_ATTRIBUTE, DEFAULT_HIT_DIE, DEFAULT_MOVE_DIE};
use crate::deck::Deck;
use crate::grid::{Cell, Footprint};
use crate::rng::{Die, GameRng};
use crate::spells::class_def;
use crate::status::{BuffList, StatusList};

/// Unique identifier for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// POW / DEF / SUP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub pow: i32,
    pub def: i32,
    pub sup: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            pow: DEFAULT_ATTRIBUTE,
            def: DEFAULT_ATTRIBUTE,
            sup: DEFAULT_ATTRIBUTE,
        }
    }
}

/// Per-turn action economy, reset whenever the player's turn begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnResources {
    pub action: u32,
    pub bonus: u32,
    /// Refund cap for cancelled bonus actions
    pub bonus_max: u32,
    pub moved: bool,
    /// Movement banked from this turn's roll
    pub remaining_movement: u32,
    /// An odd number of diagonals walked so far this turn
    pub odd_diagonals: bool,
    pub movement_rolled: bool,
    /// Roll after penalties, if rolled
    pub rolled: Option<u32>,
}

impl TurnResources {
    pub const fn fresh() -> Self {
        Self {
            action: 1,
            bonus: 1,
            bonus_max: 1,
            moved: false,
            remaining_movement: 0,
            odd_diagonals: false,
            movement_rolled: false,
            rolled: None,
        }
    }
}

/// A party member in combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Looked up in the spell registry; opaque to the engine
    pub class_id: String,
    pub affinity: String,
    pub attrs: Attributes,
    pub hit_die: u32,
    pub move_die: Die,
    pub hp: u32,
    pub hp_max: u32,
    pub pos: Cell,
    pub turn: TurnResources,
    pub buffs: BuffList,
    /// Subtracted from the next movement roll, then cleared
    pub next_move_penalty: u32,
}

impl Player {
    /// New player at full health. Hit and movement dice come from the class
    /// table when the class is known.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        class_id: impl Into<String>,
        affinity: impl Into<String>,
        attrs: Attributes,
    ) -> Self {
        let class_id = class_id.into();
        let (hit_die, move_die) = class_def(&class_id)
            .map_or((DEFAULT_HIT_DIE, DEFAULT_MOVE_DIE), |c| (c.hit_die, c.move_die));
        let hp_max = hit_die * 2;
        Self {
            id,
            name: name.into(),
            class_id,
            affinity: affinity.into(),
            attrs,
            hit_die,
            move_die: Die::new(move_die),
            hp: hp_max,
            hp_max,
            pos: Cell::new(1, 1),
            turn: TurnResources::default(),
            buffs: BuffList::new(),
            next_move_penalty: 0,
        }
    }

    pub fn at(mut self, pos: Cell) -> Self {
        self.pos = pos;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Returns hp left. Never goes below zero.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }
}

/// The encounter's boss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub kind: BossKind,
    pub name: String,
    pub footprint: Footprint,
    pub hp: u32,
    pub hp_max: u32,
    pub movement_die: Die,
    pub statuses: StatusList,
    pub deck: Deck,
    /// Double damage next boss turn
    pub enrage_next: bool,
    pub moved_this_turn: bool,
}

impl Boss {
    /// Spawn a boss with its anchor on `anchor` and a freshly shuffled deck
    pub fn spawn(kind: BossKind, anchor: Cell, rng: &mut GameRng) -> Self {
        let def = kind.def();
        Self {
            kind,
            name: def.name.to_string(),
            footprint: Footprint::new(anchor.col, anchor.row, def.width, def.height),
            hp: def.hp,
            hp_max: def.hp,
            movement_die: def.movement_die,
            statuses: StatusList::new(),
            deck: Deck::new(&kind.deck(), rng),
            enrage_next: false,
            moved_this_turn: false,
        }
    }

    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }

    pub fn is_adjacent_to(&self, cell: Cell) -> bool {
        self.footprint.is_adjacent(cell)
    }
}
