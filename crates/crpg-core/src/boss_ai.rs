//! Boss AI
//!
//! A boss turn is a sequence of discrete steps: start (multiplier), status
//! tick, then a card loop of draw, optional advance, resolve, repeated while
//! the resolved card cycles. [`BossTurn`] yields one step per call so the
//! same turn can run to completion in a test or be paced by a UI driver.

use core::fmt;

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::warn;

use crate::combatant::PlayerId;
use crate::config::CombatConfig;
use crate::deck::Card;
use crate::event::{CombatEvent, DamageReason};
use crate::grid::Occupant;
use crate::pathing::{Approach, greedy_approach};
use crate::rng::GameRng;
use crate::state::{CombatState, Phase};

/// Card ids the resolver knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum CardAction {
    Swipe,
    Charge,
    Enrage,
    Roar,
}

/// What a resolved card did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CardOutcome {
    Hit { target: PlayerId, damage: u32 },
    Miss,
    /// Enrage after the boss already moved
    Fizzle,
    Enraged,
    Roared { affected: usize },
    /// Unrecognized card id
    NoOp,
}

impl fmt::Display for CardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit { damage, .. } => write!(f, "hit for {damage}"),
            Self::Miss => write!(f, "miss"),
            Self::Fizzle => write!(f, "fizzles"),
            Self::Enraged => write!(f, "enraged"),
            Self::Roared { affected } => write!(f, "roar slows {affected}"),
            Self::NoOp => write!(f, "no effect"),
        }
    }
}

/// One observable step of a boss turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BossStep {
    TurnStarted { multiplier: u32 },
    StatusTicked { damage: u32 },
    CardDrawn { card: Card },
    Advanced { roll: u32, moved: bool },
    CardResolved { card: Card, outcome: CardOutcome, cycle: bool },
    TurnEnded,
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Start,
    Tick,
    Draw,
    Advance(Card),
    Resolve(Card),
    End,
    Done,
}

/// Boss turn in progress
#[derive(Debug, Clone)]
pub struct BossTurn {
    stage: Stage,
    cards_resolved: u32,
}

impl Default for BossTurn {
    fn default() -> Self {
        Self::new()
    }
}

impl BossTurn {
    pub const fn new() -> Self {
        Self {
            stage: Stage::Start,
            cards_resolved: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn cards_resolved(&self) -> u32 {
        self.cards_resolved
    }

    /// Run the next step. `None` once the turn has ended.
    ///
    /// Each step is applied in full before it returns.
    pub fn step(
        &mut self,
        state: &mut CombatState,
        rng: &mut GameRng,
        config: &CombatConfig,
    ) -> Option<BossStep> {
        let stage = std::mem::replace(&mut self.stage, Stage::Done);
        let (next, step) = match stage {
            Stage::Start => {
                let multiplier = begin_boss_turn(state);
                (Stage::Tick, BossStep::TurnStarted { multiplier })
            }
            Stage::Tick => {
                let damage = tick_boss_statuses(state);
                (Stage::Draw, BossStep::StatusTicked { damage })
            }
            Stage::Draw => match state.boss.deck.draw(rng) {
                Some(card) => {
                    state.events.record(CombatEvent::CardDrawn {
                        id: card.id.clone(),
                        name: card.name.clone(),
                    });
                    let next = if card.advances() {
                        Stage::Advance(card.clone())
                    } else {
                        Stage::Resolve(card.clone())
                    };
                    (next, BossStep::CardDrawn { card })
                }
                None => {
                    warn!(boss = %state.boss.name, "boss deck is empty");
                    (Stage::Done, BossStep::TurnEnded)
                }
            },
            Stage::Advance(card) => {
                let roll = rng.roll(state.boss.movement_die);
                let moved = advance_toward_nearest(state, roll).is_some_and(|a| a.moved());
                // An Advance counts as the boss's move even when it went nowhere
                state.boss.moved_this_turn = true;
                (Stage::Resolve(card), BossStep::Advanced { roll, moved })
            }
            Stage::Resolve(card) => {
                let (outcome, effect_cycles) = resolve_card(state, config, &card);
                let cycle = effect_cycles || card.cycles();
                self.cards_resolved += 1;
                state.events.record(CombatEvent::CardResolved {
                    id: card.id.clone(),
                    name: card.name.clone(),
                    outcome,
                    cycle,
                });
                let next = if !cycle {
                    Stage::End
                } else if self.cards_resolved >= config.card_loop_cap {
                    warn!(
                        cap = config.card_loop_cap,
                        "boss card loop hit its safety cap"
                    );
                    Stage::End
                } else {
                    Stage::Draw
                };
                (next, BossStep::CardResolved {
                    card,
                    outcome,
                    cycle,
                })
            }
            Stage::End => (Stage::Done, BossStep::TurnEnded),
            Stage::Done => return None,
        };
        self.stage = next;
        Some(step)
    }
}

/// Reset per-turn flags and fold last turn's Enrage into the multiplier
fn begin_boss_turn(state: &mut CombatState) -> u32 {
    state.is_player_turn = false;
    state.phase = Phase::BossTurn;
    state.boss.moved_this_turn = false;
    let multiplier = if state.boss.enrage_next { 2 } else { 1 };
    state.boss.enrage_next = false;
    state.damage_multiplier = multiplier;
    multiplier
}

/// Apply every active status stack as one lump, then expire spent stacks
fn tick_boss_statuses(state: &mut CombatState) -> u32 {
    let tick = state.boss.statuses.tick();
    if tick.ticked > 0 {
        state.events.record(CombatEvent::StatusTicked {
            damage: tick.damage,
            stacks: tick.ticked,
        });
    }
    if tick.damage > 0 {
        state.damage_boss(tick.damage, DamageReason::Burn);
    }
    if let Some(first) = tick.expired.first() {
        state.events.record(CombatEvent::StatusExpired {
            kind: first.kind,
            count: tick.expired.len(),
        });
    }
    tick.damage
}

/// Greedy-step the boss toward the nearest living player
fn advance_toward_nearest(state: &mut CombatState, budget: u32) -> Option<Approach> {
    let target = state.players[state.nearest_player_to_boss()?].pos;
    let from = state.boss.footprint;
    let approach = greedy_approach(state, from, target, budget, Occupant::Boss);
    if approach.moved() {
        let to = approach.end(from);
        state.boss.footprint = to;
        state.boss.moved_this_turn = true;
        state.events.record(CombatEvent::BossMoved {
            from: from.anchor(),
            to: to.anchor(),
            cost: approach.spent,
        });
    }
    Some(approach)
}

/// Apply a card's effect. Returns the outcome and whether the effect itself
/// asks for another card.
pub fn resolve_card(state: &mut CombatState, config: &CombatConfig, card: &Card) -> (CardOutcome, bool) {
    let Ok(action) = card.id.parse::<CardAction>() else {
        warn!(card = %card.id, "unrecognized boss card, skipping");
        return (CardOutcome::NoOp, false);
    };
    let multiplier = state.damage_multiplier;

    match action {
        CardAction::Swipe => {
            let Some(idx) = state.nearest_player_to_boss() else {
                return (CardOutcome::Miss, false);
            };
            if !state.boss.is_adjacent_to(state.players[idx].pos) {
                return (CardOutcome::Miss, false);
            }
            let damage = config.swipe_damage * multiplier;
            state.damage_player(idx, damage, DamageReason::Swipe);
            let target = state.players[idx].id;
            (CardOutcome::Hit { target, damage }, false)
        }
        CardAction::Charge => {
            let Some(idx) = state.nearest_player_to_boss() else {
                return (CardOutcome::Miss, false);
            };
            advance_toward_nearest(state, config.charge_steps);
            if !state.boss.is_adjacent_to(state.players[idx].pos) {
                return (CardOutcome::Miss, false);
            }
            let damage = config.charge_damage * multiplier;
            state.damage_player(idx, damage, DamageReason::Charge);
            let target = state.players[idx].id;
            (CardOutcome::Hit { target, damage }, false)
        }
        CardAction::Enrage => {
            if state.boss.moved_this_turn {
                (CardOutcome::Fizzle, true)
            } else {
                state.boss.enrage_next = true;
                (CardOutcome::Enraged, false)
            }
        }
        CardAction::Roar => {
            let anchor = state.boss.footprint.anchor();
            let mut affected = 0;
            for player in state.players.iter_mut().filter(|p| p.is_alive()) {
                if anchor.manhattan(player.pos) <= config.roar_radius {
                    player.next_move_penalty += config.roar_penalty;
                    affected += 1;
                }
            }
            (CardOutcome::Roared { affected }, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bosses::BossKind;
    use crate::combatant::{Attributes, Boss, Player};
    use crate::deck::{Deck, Keywords};
    use crate::grid::{Board, Cell};
    use crate::status::{StatusKind, StatusStack};

    fn card(id: &str, keywords: Keywords) -> Card {
        Card::new(id, id, keywords)
    }

    fn setup(player_at: Cell, cards: Vec<Card>) -> (CombatState, GameRng) {
        let mut rng = GameRng::new(42);
        let player = Player::new(PlayerId(1), "Ember", "ELEMENTALIST", "Flame", Attributes::default())
            .at(player_at);
        let boss = Boss::spawn(BossKind::Bear, Cell::new(8, 8), &mut rng).with_deck(Deck::stacked(cards));
        (CombatState::new(Board::new(15), vec![player], boss, 2), rng)
    }

    fn run(state: &mut CombatState, rng: &mut GameRng) -> Vec<BossStep> {
        let config = CombatConfig::default();
        let mut turn = BossTurn::new();
        let mut steps = Vec::new();
        while let Some(step) = turn.step(state, rng, &config) {
            steps.push(step);
        }
        steps
    }

    #[test]
    fn test_swipe_hits_adjacent() {
        let (mut state, mut rng) = setup(Cell::new(9, 10), vec![card("swipe", Keywords::empty())]);
        let steps = run(&mut state, &mut rng);
        assert_eq!(state.players[0].hp, 8);
        assert!(steps.iter().any(|s| matches!(
            s,
            BossStep::CardResolved { outcome: CardOutcome::Hit { damage: 4, .. }, cycle: false, .. }
        )));
        assert_eq!(steps.last(), Some(&BossStep::TurnEnded));
    }

    #[test]
    fn test_swipe_misses_at_range() {
        let (mut state, mut rng) = setup(Cell::new(1, 1), vec![card("swipe", Keywords::empty())]);
        run(&mut state, &mut rng);
        assert_eq!(state.players[0].hp, 12);
    }

    #[test]
    fn test_enrage_doubles_next_turn() {
        let (mut state, mut rng) = setup(
            Cell::new(9, 10),
            vec![card("enrage", Keywords::empty()), card("swipe", Keywords::empty())],
        );
        run(&mut state, &mut rng);
        assert!(state.boss.enrage_next);
        let steps = run(&mut state, &mut rng);
        assert_eq!(steps[0], BossStep::TurnStarted { multiplier: 2 });
        assert_eq!(state.players[0].hp, 4);
        assert!(!state.boss.enrage_next);
    }

    #[test]
    fn test_enrage_fizzles_after_moving() {
        let (mut state, mut rng) = setup(
            Cell::new(2, 2),
            vec![
                card("roar", Keywords::ADVANCE | Keywords::CYCLE),
                card("enrage", Keywords::empty()),
                card("swipe", Keywords::empty()),
            ],
        );
        let steps = run(&mut state, &mut rng);
        assert!(state.boss.moved_this_turn);
        assert!(!state.boss.enrage_next);
        let outcomes: Vec<_> = steps
            .iter()
            .filter_map(|s| match s {
                BossStep::CardResolved { outcome, .. } => Some(*outcome),
                _ => None,
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![
                CardOutcome::Roared { affected: 1 },
                CardOutcome::Fizzle,
                CardOutcome::Miss
            ]
        );
    }

    #[test]
    fn test_enrage_fizzles_after_advance_in_place() {
        let (mut state, mut rng) = setup(
            Cell::new(9, 10),
            vec![
                card("swipe", Keywords::ADVANCE | Keywords::CYCLE),
                card("enrage", Keywords::empty()),
                card("swipe", Keywords::empty()),
            ],
        );
        let steps = run(&mut state, &mut rng);
        assert!(steps.iter().any(|s| matches!(s, BossStep::Advanced { moved: false, .. })));
        assert_eq!(state.players[0].hp, 4);
        assert_eq!(state.boss.footprint.anchor(), Cell::new(8, 8));
        assert!(state.boss.moved_this_turn);
        assert!(!state.boss.enrage_next);
        assert!(steps.iter().any(|s| matches!(
            s,
            BossStep::CardResolved { outcome: CardOutcome::Fizzle, .. }
        )));
    }

    #[test]
    fn test_charge_closes_distance() {
        let (mut state, mut rng) = setup(Cell::new(8, 13), vec![card("charge", Keywords::empty())]);
        let steps = run(&mut state, &mut rng);
        assert!(state.boss.moved_this_turn);
        assert_eq!(state.boss.footprint.anchor(), Cell::new(8, 11));
        assert_eq!(state.players[0].hp, 10);
        assert!(steps.iter().any(|s| matches!(
            s,
            BossStep::CardResolved { outcome: CardOutcome::Hit { damage: 2, .. }, .. }
        )));
    }

    #[test]
    fn test_roar_cycles_and_penalizes() {
        let (mut state, mut rng) = setup(
            Cell::new(1, 1),
            vec![card("roar", Keywords::CYCLE), card("enrage", Keywords::empty())],
        );
        let steps = run(&mut state, &mut rng);
        assert_eq!(state.players[0].next_move_penalty, 2);
        let resolved = steps
            .iter()
            .filter(|s| matches!(s, BossStep::CardResolved { .. }))
            .count();
        assert_eq!(resolved, 2);
        assert!(state.boss.enrage_next);
    }

    #[test]
    fn test_unknown_card_is_noop() {
        let (mut state, mut rng) = setup(Cell::new(9, 10), vec![card("flame_breath", Keywords::empty())]);
        let steps = run(&mut state, &mut rng);
        assert!(steps.iter().any(|s| matches!(
            s,
            BossStep::CardResolved { outcome: CardOutcome::NoOp, cycle: false, .. }
        )));
        assert_eq!(state.players[0].hp, 12);
        assert_eq!(state.boss.deck.discard_len(), 1);
    }

    #[test]
    fn test_card_loop_cap() {
        let cards = (0..20).map(|_| card("roar", Keywords::CYCLE)).collect();
        let (mut state, mut rng) = setup(Cell::new(1, 1), cards);
        let steps = run(&mut state, &mut rng);
        let resolved = steps
            .iter()
            .filter(|s| matches!(s, BossStep::CardResolved { .. }))
            .count();
        assert_eq!(resolved, 10);
        assert_eq!(state.players[0].next_move_penalty, 20);
    }

    #[test]
    fn test_status_tick_before_cards() {
        let (mut state, mut rng) = setup(Cell::new(1, 1), vec![card("enrage", Keywords::empty())]);
        state.boss.statuses.add(StatusStack::new(StatusKind::Burn, 1, 3, "Ember"));
        state.boss.statuses.add(StatusStack::new(StatusKind::Burn, 1, 1, "Ember"));
        let steps = run(&mut state, &mut rng);
        assert_eq!(steps[1], BossStep::StatusTicked { damage: 2 });
        assert_eq!(state.boss.hp, 98);
        assert_eq!(state.boss.statuses.stacks().len(), 1);
        assert_eq!(state.boss.statuses.stacks()[0].remaining, 2);
    }

    #[test]
    fn test_advance_moves_before_resolving() {
        let (mut state, mut rng) = setup(Cell::new(8, 12), vec![card("swipe", Keywords::ADVANCE)]);
        let steps = run(&mut state, &mut rng);
        assert!(matches!(steps[3], BossStep::Advanced { moved: true, .. }));
        assert!(state.boss.moved_this_turn);
        assert!(state.boss.footprint.row > 8);
    }
}
