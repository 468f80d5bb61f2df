//! Merging buffs carried by players
//!
//! At most one entry per buff id. Re-applying adds stacks up to the buff's cap
//! and refreshes the duration only when a new one is given.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Known buff ids
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BuffId {
    /// Converts the next Burn cast into a detonation
    InfernoPrimed,
    /// Persistent stacks gained from a detonation; pulse at turn start
    Inferno,
}

/// Broad category shown in tooltips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BuffKind {
    Buff,
    Passive,
}

/// Static definition of a buff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuffDef {
    pub name: &'static str,
    pub kind: BuffKind,
    pub max_stacks: u32,
}

/// Cap for buffs without an explicit definition
pub const DEFAULT_MAX_STACKS: u32 = 99;

impl BuffId {
    pub const fn def(&self) -> BuffDef {
        match self {
            Self::InfernoPrimed => BuffDef {
                name: "Inferno (Primed)",
                kind: BuffKind::Buff,
                max_stacks: 1,
            },
            Self::Inferno => BuffDef {
                name: "Inferno",
                kind: BuffKind::Buff,
                max_stacks: DEFAULT_MAX_STACKS,
            },
        }
    }

    pub const fn name(&self) -> &'static str {
        self.def().name
    }

    pub const fn max_stacks(&self) -> u32 {
        self.def().max_stacks
    }
}

/// A buff entry on a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buff {
    pub id: BuffId,
    pub kind: BuffKind,
    pub stacks: u32,
    /// Turns left; `None` lasts until consumed or cleared
    pub remaining: Option<u32>,
}

impl Buff {
    /// Tooltip label: `Name`, `Name xN`, or `Name (T)`
    pub fn label(&self) -> String {
        let name = self.id.name();
        match (self.stacks, self.remaining) {
            (s, _) if s > 1 => format!("{name} x{s}"),
            (_, Some(t)) => format!("{name} ({t})"),
            _ => name.to_string(),
        }
    }
}

/// Ordered buff list with at most one entry per id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffList {
    buffs: Vec<Buff>,
}

impl BuffList {
    pub const fn new() -> Self {
        Self { buffs: Vec::new() }
    }

    /// Add stacks of an untimed buff. Returns the resulting stack count.
    pub fn add(&mut self, id: BuffId, stacks: u32) -> u32 {
        self.apply(id, stacks, None)
    }

    /// Add stacks and set the duration to `turns`.
    pub fn add_timed(&mut self, id: BuffId, stacks: u32, turns: u32) -> u32 {
        self.apply(id, stacks, Some(turns))
    }

    fn apply(&mut self, id: BuffId, stacks: u32, duration: Option<u32>) -> u32 {
        let cap = id.max_stacks();
        if let Some(buff) = self.buffs.iter_mut().find(|b| b.id == id) {
            buff.stacks = buff.stacks.saturating_add(stacks).min(cap);
            if duration.is_some() {
                buff.remaining = duration;
            }
            return buff.stacks;
        }
        let stacks = stacks.min(cap);
        self.buffs.push(Buff {
            id,
            kind: id.def().kind,
            stacks,
            remaining: duration,
        });
        stacks
    }

    pub fn has(&self, id: BuffId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: BuffId) -> Option<&Buff> {
        self.buffs.iter().find(|b| b.id == id)
    }

    pub fn stacks(&self, id: BuffId) -> u32 {
        self.get(id).map_or(0, |b| b.stacks)
    }

    /// Remove up to `amount` stacks; the entry goes away at zero.
    ///
    /// Returns false if the buff was not present.
    pub fn consume(&mut self, id: BuffId, amount: u32) -> bool {
        let Some(idx) = self.buffs.iter().position(|b| b.id == id) else {
            return false;
        };
        let buff = &mut self.buffs[idx];
        buff.stacks = buff.stacks.saturating_sub(amount);
        if buff.stacks == 0 {
            self.buffs.remove(idx);
        }
        true
    }

    /// Remove the entry regardless of stacks
    pub fn clear(&mut self, id: BuffId) -> Option<Buff> {
        let idx = self.buffs.iter().position(|b| b.id == id)?;
        Some(self.buffs.remove(idx))
    }

    /// Count down timed buffs and return the ones that ran out.
    pub fn tick(&mut self) -> Vec<Buff> {
        for buff in &mut self.buffs {
            if let Some(t) = buff.remaining.as_mut() {
                *t = t.saturating_sub(1);
            }
        }
        let (expired, kept): (Vec<_>, Vec<_>) = self
            .buffs
            .drain(..)
            .partition(|b| b.remaining == Some(0));
        self.buffs = kept;
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buff> {
        self.buffs.iter()
    }

    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.buffs.iter().map(Buff::label).collect()
    }
}
