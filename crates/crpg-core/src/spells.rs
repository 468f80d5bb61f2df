//! Classes, spells and passives
//!
//! The engine only asks whether a player knows a spell by id. The default
//! registry unlocks spells at attribute breakpoints per class and affinity.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::combatant::Attributes;

/// Attribute values at which table entries unlock
pub const BREAKPOINTS: [i32; 5] = [8, 10, 12, 14, 16];

/// Which resource a spell spends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionType {
    Action,
    Bonus,
    /// Always on, never cast
    Passive,
}

/// Attribute keys
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AttrKey {
    Pow,
    Def,
    Sup,
}

impl AttrKey {
    pub const fn of(&self, attrs: &Attributes) -> i32 {
        match self {
            Self::Pow => attrs.pow,
            Self::Def => attrs.def,
            Self::Sup => attrs.sup,
        }
    }
}

/// A spell or passive record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spell {
    pub id: &'static str,
    pub name: &'static str,
    pub action_type: ActionType,
    /// Targeting range in squares, for targeted spells
    pub range: Option<i32>,
}

impl Spell {
    const fn new(id: &'static str, name: &'static str, action_type: ActionType) -> Self {
        Self {
            id,
            name,
            action_type,
            range: None,
        }
    }

    const fn with_range(mut self, range: i32) -> Self {
        self.range = Some(range);
        self
    }

    /// Id the engine matches on
    pub fn canonical_id(&self) -> &'static str {
        canonical_spell_id(self.id)
    }
}

/// Map legacy ids onto the ids the engine knows
pub fn canonical_spell_id(id: &str) -> &str {
    match id {
        "burn_dot" => "burn",
        other => other,
    }
}

/// Spell and passive lookup consumed by the engine
pub trait SpellRegistry {
    fn spells_for(&self, class_id: &str, affinity: &str, attrs: &Attributes) -> Vec<Spell>;

    fn passives_for(&self, class_id: &str, affinity: &str, attrs: &Attributes) -> Vec<Spell>;

    /// True if `id` is among the player's spells or passives
    fn knows(&self, class_id: &str, affinity: &str, attrs: &Attributes, id: &str) -> bool {
        let id = canonical_spell_id(id);
        self.spells_for(class_id, affinity, attrs)
            .iter()
            .chain(self.passives_for(class_id, affinity, attrs).iter())
            .any(|s| s.canonical_id() == id)
    }

    /// Looks up a known spell by id
    fn find(&self, class_id: &str, affinity: &str, attrs: &Attributes, id: &str) -> Option<Spell> {
        let id = canonical_spell_id(id);
        self.spells_for(class_id, affinity, attrs)
            .into_iter()
            .chain(self.passives_for(class_id, affinity, attrs))
            .find(|s| s.canonical_id() == id)
    }
}

#[derive(Debug, Clone)]
struct TableEntry {
    class_id: &'static str,
    affinity: &'static str,
    /// `None` for base entries granted regardless of attributes
    gate: Option<(AttrKey, i32)>,
    spell: Spell,
}

impl TableEntry {
    fn unlocked(&self, class_id: &str, affinity: &str, attrs: &Attributes) -> bool {
        self.class_id == class_id
            && self.affinity == affinity
            && self.gate.is_none_or(|(key, at)| key.of(attrs) >= at)
    }
}

/// Attribute-breakpoint registry
#[derive(Debug, Clone)]
pub struct AttributeSpellTable {
    spells: Vec<TableEntry>,
    passives: Vec<TableEntry>,
}

impl AttributeSpellTable {
    /// A table with nothing in it
    pub fn empty() -> Self {
        Self {
            spells: Vec::new(),
            passives: Vec::new(),
        }
    }

    pub fn with_spell(mut self, class_id: &'static str, affinity: &'static str, gate: Option<(AttrKey, i32)>, spell: Spell) -> Self {
        self.spells.push(TableEntry {
            class_id,
            affinity,
            gate,
            spell,
        });
        self
    }

    pub fn with_passive(mut self, class_id: &'static str, affinity: &'static str, gate: Option<(AttrKey, i32)>, spell: Spell) -> Self {
        self.passives.push(TableEntry {
            class_id,
            affinity,
            gate,
            spell,
        });
        self
    }

    fn collect(entries: &[TableEntry], class_id: &str, affinity: &str, attrs: &Attributes) -> Vec<Spell> {
        let mut out: Vec<Spell> = Vec::new();
        for entry in entries.iter().filter(|e| e.unlocked(class_id, affinity, attrs)) {
            if !out.iter().any(|s| s.id == entry.spell.id) {
                out.push(entry.spell.clone());
            }
        }
        out
    }
}

impl Default for AttributeSpellTable {
    fn default() -> Self {
        use ActionType::*;
        use AttrKey::*;

        const E: &str = "ELEMENTALIST";
        let table = Self::empty()
            .with_spell(E, "Flame", Some((Pow, 10)), Spell::new("burn_dot", "Burn", Action).with_range(7))
            .with_spell(E, "Flame", Some((Def, 10)), Spell::new("lava_shield", "Lava Shield", Action))
            .with_spell(E, "Flame", Some((Sup, 10)), Spell::new("cauterize", "Cauterize", Action))
            .with_spell(E, "Flame", Some((Sup, 16)), Spell::new("phoenix_rise", "Phoenix Rise", Action))
            .with_passive(E, "Flame", None, Spell::new("inferno", "Inferno", Bonus))
            .with_passive(E, "Flame", Some((Sup, 14)), Spell::new("inferno_embercare", "Inferno - Embercare", Passive))
            .with_passive(E, "Flame", Some((Pow, 16)), Spell::new("conflagrate", "Conflagrate", Passive))
            .with_passive(E, "Flame", Some((Def, 14)), Spell::new("magma_temper", "Magma Temper", Passive))
            .with_passive(E, "Flame", Some((Def, 16)), Spell::new("magma_form", "Magma Form", Passive));

        let base = [
            (E, "Terra", "stoneheart", "Stoneheart"),
            (E, "Tide", "undertow", "Undertow"),
            ("WARRIOR", "Brutality", "bloodlust", "Bloodlust"),
            ("WARRIOR", "Guardianship", "bulwark", "Bulwark"),
            ("WARRIOR", "Leadership", "command", "Command"),
            ("SURVIVALIST", "Lethality", "mark", "Mark"),
            ("SURVIVALIST", "Primalism", "frenzy", "Frenzy"),
            ("SURVIVALIST", "Nature's Aid", "mender", "Mender"),
        ];
        base.into_iter().fold(table, |t, (class, affinity, id, name)| {
            t.with_passive(class, affinity, None, Spell::new(id, name, Passive))
        })
    }
}

impl SpellRegistry for AttributeSpellTable {
    fn spells_for(&self, class_id: &str, affinity: &str, attrs: &Attributes) -> Vec<Spell> {
        Self::collect(&self.spells, class_id, affinity, attrs)
    }

    fn passives_for(&self, class_id: &str, affinity: &str, attrs: &Attributes) -> Vec<Spell> {
        Self::collect(&self.passives, class_id, affinity, attrs)
    }
}

/// Class stat block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassDef {
    pub id: &'static str,
    pub name: &'static str,
    pub hit_die: u32,
    pub move_die: u32,
    pub affinities: [&'static str; 3],
}

pub const CLASSES: [ClassDef; 3] = [
    ClassDef {
        id: "WARRIOR",
        name: "Warrior",
        hit_die: 10,
        move_die: 4,
        affinities: ["Brutality", "Guardianship", "Leadership"],
    },
    ClassDef {
        id: "SURVIVALIST",
        name: "Survivalist",
        hit_die: 8,
        move_die: 4,
        affinities: ["Lethality", "Primalism", "Nature's Aid"],
    },
    ClassDef {
        id: "ELEMENTALIST",
        name: "Elementalist",
        hit_die: 6,
        move_die: 4,
        affinities: ["Flame", "Terra", "Tide"],
    },
];

pub fn class_def(id: &str) -> Option<&'static ClassDef> {
    CLASSES.iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pow: i32, def: i32, sup: i32) -> Attributes {
        Attributes { pow, def, sup }
    }

    #[test]
    fn test_burn_unlocks_at_pow_10() {
        let table = AttributeSpellTable::default();
        assert!(!table.knows("ELEMENTALIST", "Flame", &attrs(8, 8, 8), "burn"));
        assert!(table.knows("ELEMENTALIST", "Flame", &attrs(10, 8, 8), "burn"));
        assert!(table.knows("ELEMENTALIST", "Flame", &attrs(10, 8, 8), "burn_dot"));
        assert!(!table.knows("ELEMENTALIST", "Terra", &attrs(16, 16, 16), "burn"));
    }

    #[test]
    fn test_inferno_is_base_passive() {
        let table = AttributeSpellTable::default();
        let inferno = table.find("ELEMENTALIST", "Flame", &attrs(8, 8, 8), "inferno");
        assert_eq!(inferno.map(|s| s.action_type), Some(ActionType::Bonus));
        assert!(!table.knows("WARRIOR", "Brutality", &attrs(16, 8, 10), "inferno"));
    }

    #[test]
    fn test_burn_range() {
        let table = AttributeSpellTable::default();
        let burn = table.find("ELEMENTALIST", "Flame", &attrs(16, 8, 10), "burn");
        assert_eq!(burn.and_then(|s| s.range), Some(7));
    }

    #[test]
    fn test_breakpoint_passives() {
        let table = AttributeSpellTable::default();
        let passives = table.passives_for("ELEMENTALIST", "Flame", &attrs(16, 8, 10));
        let ids: Vec<_> = passives.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["inferno", "conflagrate"]);
    }

    #[test]
    fn test_class_table() {
        assert_eq!(class_def("ELEMENTALIST").map(|c| c.hit_die), Some(6));
        assert_eq!(class_def("WARRIOR").map(|c| c.hit_die), Some(10));
        assert!(class_def("BARD").is_none());
        assert_eq!("POW".parse::<AttrKey>(), Ok(AttrKey::Pow));
        assert!(BREAKPOINTS.windows(2).all(|w| w[0] < w[1]));
    }
}
