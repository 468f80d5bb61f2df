//! Boss registry
//!
//! Stat blocks and opening decks for every boss the cave can spawn.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::deck::{CardTemplate, Keywords};
use crate::rng::Die;

/// Boss types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BossKind {
    #[default]
    Bear,
    Dragon,
}

/// Static boss data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossDef {
    pub name: &'static str,
    /// Creature family, shown in the boss panel
    pub family: &'static str,
    pub hp: u32,
    pub width: i32,
    pub height: i32,
    pub movement_die: Die,
}

impl BossKind {
    pub const fn def(&self) -> BossDef {
        match self {
            Self::Bear => BossDef {
                name: "Bear",
                family: "beast",
                hp: 100,
                width: 1,
                height: 2,
                movement_die: Die::D3,
            },
            Self::Dragon => BossDef {
                name: "Ancient Dragon",
                family: "dragon",
                hp: 300,
                width: 2,
                height: 3,
                movement_die: Die::D6,
            },
        }
    }

    /// Opening deck
    pub fn deck(&self) -> Vec<CardTemplate> {
        match self {
            Self::Bear => vec![
                CardTemplate::new("swipe", "Swipe", Keywords::ADVANCE, 5),
                CardTemplate::new("charge", "Charge", Keywords::ADVANCE, 2),
                CardTemplate::new("enrage", "Enrage", Keywords::empty(), 1),
                CardTemplate::new("roar", "Roar", Keywords::CYCLE, 1),
            ],
            Self::Dragon => vec![
                CardTemplate::new("flame_breath", "Flame Breath", Keywords::empty(), 3),
                CardTemplate::new("wing_buffet", "Wing Buffet", Keywords::empty(), 2),
                CardTemplate::new("treasure_guard", "Treasure Guard", Keywords::empty(), 2),
            ],
        }
    }
}
