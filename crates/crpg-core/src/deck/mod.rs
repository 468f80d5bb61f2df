//! Boss card deck
//!
//! Draw and discard piles. Cards are reusable: a drawn card goes straight onto
//! the discard pile, and an empty draw pile is refilled by shuffling the
//! discards back in.

pub mod odds;

use std::collections::VecDeque;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::rng::GameRng;

bitflags! {
    /// Card keywords
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Keywords: u8 {
        /// Move toward the nearest player before resolving
        const ADVANCE = 0x01;
        /// Draw and resolve another card afterwards
        const CYCLE = 0x02;
    }
}

impl Serialize for Keywords {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Keywords {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Keywords::from_bits_truncate(bits))
    }
}

/// A boss card
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Effect id; ids the resolver does not know are no-ops
    pub id: String,
    pub name: String,
    pub keywords: Keywords,
}

impl Card {
    pub fn new(id: impl Into<String>, name: impl Into<String>, keywords: Keywords) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            keywords,
        }
    }

    pub const fn advances(&self) -> bool {
        self.keywords.contains(Keywords::ADVANCE)
    }

    pub const fn cycles(&self) -> bool {
        self.keywords.contains(Keywords::CYCLE)
    }
}

/// A card and how many copies go into a deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub card: Card,
    pub count: u32,
}

impl CardTemplate {
    pub fn new(id: &str, name: &str, keywords: Keywords, count: u32) -> Self {
        Self {
            card: Card::new(id, name, keywords),
            count,
        }
    }
}

/// Per-card tally of the draw pile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardCount {
    pub id: String,
    pub name: String,
    pub count: u32,
    /// Share of the draw pile, 0..=100
    pub pct: f64,
}

/// Read-only view of the deck for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckCounts {
    /// Cards left in the draw pile
    pub total: u32,
    /// Sorted by card name
    pub items: Vec<CardCount>,
    pub discard_count: u32,
}

impl DeckCounts {
    /// Chance that `id` shows up in the next `draws` cards
    pub fn chance_within(&self, deck: &Deck, id: &str, draws: u32) -> f64 {
        let in_pile = self
            .items
            .iter()
            .find(|c| c.id == id)
            .map_or(0, |c| c.count);
        let in_discard = deck.discard.iter().filter(|c| c.id == id).count() as u32;
        odds::prob_with_reshuffle(self.total, in_pile, self.discard_count, in_discard, draws)
    }
}

/// Draw pile plus discard pile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    draw_pile: VecDeque<Card>,
    discard: Vec<Card>,
}

impl Deck {
    /// Expand each template by its count, then shuffle.
    pub fn new(templates: &[CardTemplate], rng: &mut GameRng) -> Self {
        let mut draw_pile: VecDeque<Card> = templates
            .iter()
            .flat_map(|t| std::iter::repeat_n(t.card.clone(), t.count as usize))
            .collect();
        rng.shuffle(draw_pile.make_contiguous());
        Self {
            draw_pile,
            discard: Vec::new(),
        }
    }

    /// Build a deck in exactly the given order, front first.
    pub fn stacked(cards: Vec<Card>) -> Self {
        Self {
            draw_pile: cards.into(),
            discard: Vec::new(),
        }
    }

    /// Take the front card, reshuffling the discards in first if the draw pile
    /// is empty. The card is placed on the discard pile immediately.
    ///
    /// `None` only when both piles are empty.
    pub fn draw(&mut self, rng: &mut GameRng) -> Option<Card> {
        if self.draw_pile.is_empty() {
            self.reshuffle(rng);
        }
        let card = self.draw_pile.pop_front()?;
        self.discard.push(card.clone());
        Some(card)
    }

    fn reshuffle(&mut self, rng: &mut GameRng) {
        let mut cards = std::mem::take(&mut self.discard);
        rng.shuffle(&mut cards);
        self.draw_pile.extend(cards);
    }

    pub fn draw_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn discard_len(&self) -> usize {
        self.discard.len()
    }

    /// Cards in both piles
    pub fn len(&self) -> usize {
        self.draw_pile.len() + self.discard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn draw_pile(&self) -> impl Iterator<Item = &Card> {
        self.draw_pile.iter()
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard
    }

    pub fn peek_counts(&self) -> DeckCounts {
        let total = self.draw_pile.len() as u32;
        let mut items: Vec<CardCount> = Vec::new();
        for card in &self.draw_pile {
            match items.iter_mut().find(|c| c.id == card.id) {
                Some(entry) => entry.count += 1,
                None => items.push(CardCount {
                    id: card.id.clone(),
                    name: card.name.clone(),
                    count: 1,
                    pct: 0.0,
                }),
            }
        }
        for item in &mut items {
            item.pct = if total > 0 {
                f64::from(item.count) / f64::from(total) * 100.0
            } else {
                0.0
            };
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        DeckCounts {
            total,
            items,
            discard_count: self.discard.len() as u32,
        }
    }
}
