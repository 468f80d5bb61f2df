//! Turn engine
//!
//! Owns the combat state and drives it:
//!
//! ```text
//! Setup -> initiative -> slot 0 -> ... -> slot n-1 -> slot 0 (round + 1) -> ...
//! ```
//!
//! Player slots wait for commands and end only through a manual end-turn
//! request. Boss slots run a [`BossTurn`], one step per [`TurnEngine::step_boss`]
//! call, and advance the pointer themselves when the turn ends. The engine has
//! no terminal state; deciding that the encounter is over is up to the caller.

use tracing::info;

use crate::actions::inferno_pulse;
use crate::boss_ai::{BossStep, BossTurn};
use crate::combatant::{Boss, Player, TurnResources};
use crate::config::CombatConfig;
use crate::error::Rejection;
use crate::event::{CombatEvent, CombatObserver};
use crate::grid::Board;
use crate::rng::GameRng;
use crate::spells::{AttributeSpellTable, SpellRegistry};
use crate::state::{CombatSnapshot, CombatState, Phase, TurnSlot};
use crate::status::BuffId;

/// Who is asking for the turn to end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndTurnOrigin {
    /// The player pressed end turn
    Manual,
    /// Some system decided the turn was over (e.g. movement ran out)
    Automatic(&'static str),
}

/// One participant's initiative roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiativeRoll {
    pub slot: TurnSlot,
    pub roll: u32,
    pub tiebreak: u32,
}

/// Combat turn engine
pub struct TurnEngine<R = AttributeSpellTable> {
    pub(crate) state: CombatState,
    pub(crate) rng: GameRng,
    pub(crate) config: CombatConfig,
    pub(crate) spells: R,
    boss_turn: Option<BossTurn>,
    observers: Vec<Box<dyn CombatObserver>>,
}

impl TurnEngine<AttributeSpellTable> {
    /// Engine on an empty `config.grid_size` board with the default spell table
    pub fn new(players: Vec<Player>, boss: Boss, config: CombatConfig, rng: GameRng) -> Self {
        let board = Board::new(config.grid_size);
        let state = CombatState::new(board, players, boss, config.inferno_pulse_start);
        Self {
            state,
            rng,
            config,
            spells: AttributeSpellTable::default(),
            boss_turn: None,
            observers: Vec::new(),
        }
    }
}

impl<R: SpellRegistry> TurnEngine<R> {
    /// Replace the spell registry
    pub fn with_spells<S: SpellRegistry>(self, spells: S) -> TurnEngine<S> {
        TurnEngine {
            state: self.state,
            rng: self.rng,
            config: self.config,
            spells,
            boss_turn: self.boss_turn,
            observers: self.observers,
        }
    }

    /// Replace the terrain. Only meaningful before [`Self::start`].
    pub fn with_board(mut self, board: Board) -> Self {
        self.state.board = board;
        self
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn rng(&self) -> &GameRng {
        &self.rng
    }

    pub fn snapshot(&self) -> CombatSnapshot {
        self.state.snapshot()
    }

    pub fn subscribe(&mut self, observer: Box<dyn CombatObserver>) {
        self.observers.push(observer);
    }

    /// Deliver pending events to observers in order, then drop them
    pub fn flush_events(&mut self) -> usize {
        let events = self.state.events.drain();
        for event in &events {
            for observer in &mut self.observers {
                observer.on_event(event);
            }
        }
        events.len()
    }

    /// Take pending events without notifying observers
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.state.events.drain()
    }

    pub fn pending_events(&self) -> &[CombatEvent] {
        self.state.events.pending()
    }

    pub fn boss_turn_pending(&self) -> bool {
        self.boss_turn.is_some()
    }

    /// Roll initiative and begin the first turn
    pub fn start(&mut self) -> Vec<InitiativeRoll> {
        let rolls = self.resolve_initiative();
        self.begin_round_one();
        rolls
    }

    /// Begin with a fixed turn order instead of rolling
    ///
    /// # Panics
    /// If `order` is empty.
    pub fn start_with_order(&mut self, order: Vec<TurnSlot>) {
        assert!(!order.is_empty(), "turn order must not be empty");
        let names = order.iter().map(|&s| self.state.slot_name(s)).collect();
        self.state.events.record(CombatEvent::InitiativeResolved {
            order: order.clone(),
            names,
        });
        self.state.turn_order = order;
        self.state.turn_ptr = 0;
        self.begin_round_one();
    }

    /// Roll every participant's movement die plus a tiebreak, and fix the
    /// turn order by (roll, tiebreak) descending.
    pub fn resolve_initiative(&mut self) -> Vec<InitiativeRoll> {
        let sides = self.config.initiative_tiebreak_sides;
        let mut rolls = Vec::with_capacity(self.state.players.len() + 1);
        for idx in 0..self.state.players.len() {
            let die = self.state.players[idx].move_die;
            let roll = self.rng.roll(die);
            let tiebreak = self.rng.rnd(sides);
            rolls.push(InitiativeRoll {
                slot: TurnSlot::Player { idx },
                roll,
                tiebreak,
            });
        }
        let roll = self.rng.roll(self.state.boss.movement_die);
        let tiebreak = self.rng.rnd(sides);
        rolls.push(InitiativeRoll {
            slot: TurnSlot::Boss,
            roll,
            tiebreak,
        });

        for r in &rolls {
            let name = self.state.slot_name(r.slot);
            self.state.events.record(CombatEvent::InitiativeRolled {
                slot: r.slot,
                name,
                roll: r.roll,
                tiebreak: r.tiebreak,
            });
        }

        let mut sorted = rolls.clone();
        sorted.sort_by(|a, b| (b.roll, b.tiebreak).cmp(&(a.roll, a.tiebreak)));
        let order: Vec<TurnSlot> = sorted.iter().map(|r| r.slot).collect();
        let names: Vec<String> = order.iter().map(|&s| self.state.slot_name(s)).collect();
        info!(order = %names.join(", "), "initiative resolved");
        self.state.events.record(CombatEvent::InitiativeResolved {
            order: order.clone(),
            names,
        });
        self.state.turn_order = order;
        self.state.turn_ptr = 0;
        rolls
    }

    fn begin_round_one(&mut self) {
        self.state.round = 1;
        info!(round = 1, "round started");
        self.state.events.record(CombatEvent::RoundStarted { round: 1 });
        self.begin_current_turn();
    }

    fn begin_current_turn(&mut self) {
        let slot = self
            .state
            .current_slot()
            .expect("turn order is empty when beginning a turn");
        let name = self.state.slot_name(slot);
        self.state.events.record(CombatEvent::TurnBegan {
            slot,
            name,
            round: self.state.round,
        });
        match slot {
            TurnSlot::Player { idx } => self.begin_player_turn(idx),
            TurnSlot::Boss => {
                self.state.is_player_turn = false;
                self.state.phase = Phase::BossTurn;
                self.boss_turn = Some(BossTurn::new());
            }
        }
    }

    fn begin_player_turn(&mut self, idx: usize) {
        let player = &mut self.state.players[idx];
        player.turn = TurnResources::fresh();
        let id = player.id;
        let name = player.name.clone();
        let holds_inferno = player.is_alive() && player.buffs.has(BuffId::Inferno);
        for buff in player.buffs.tick() {
            self.state.events.record(CombatEvent::BuffExpired {
                player: id,
                name: name.clone(),
                buff: buff.id,
            });
        }
        if holds_inferno {
            inferno_pulse(&mut self.state, idx);
        }
        self.state.phase = Phase::PlayerTurn;
        self.state.is_player_turn = true;
    }

    /// Move the pointer on, bumping the round on wrap, and begin that turn
    fn advance(&mut self) {
        let len = self.state.turn_order.len();
        debug_assert!(self.state.turn_ptr < len, "turn pointer out of range");
        self.state.turn_ptr = (self.state.turn_ptr + 1) % len;
        if self.state.turn_ptr == 0 {
            self.state.round += 1;
            info!(round = self.state.round, "round started");
            self.state.events.record(CombatEvent::RoundStarted {
                round: self.state.round,
            });
        }
        self.begin_current_turn();
    }

    /// Request the end of the current player turn.
    ///
    /// Only [`EndTurnOrigin::Manual`] can advance the turn. Anything else is
    /// rejected and recorded, and leaves the pointer, round and boss alone.
    pub fn end_turn(&mut self, origin: EndTurnOrigin) -> Result<(), Rejection> {
        if !self.state.is_active() {
            return Err(self.reject(Rejection::CombatInactive));
        }
        if let EndTurnOrigin::Automatic(source) = origin {
            let rejection = Rejection::AutomaticEndTurn { origin: source };
            self.state.events.record(CombatEvent::EndTurnRejected {
                origin: source,
                reason: rejection.to_string(),
            });
            return Err(rejection);
        }
        if self.boss_turn.is_some() {
            return Err(self.reject(Rejection::BossTurnPending));
        }
        let Some(idx) = self.state.active_player() else {
            return Err(self.reject(Rejection::NotYourTurn));
        };

        let player = &mut self.state.players[idx];
        player.next_move_penalty = 0;
        let name = player.name.clone();
        self.state.events.record(CombatEvent::TurnEnded {
            slot: TurnSlot::Player { idx },
            name,
        });
        self.advance();
        Ok(())
    }

    /// The player's end-turn button
    pub fn manual_end_turn(&mut self) -> Result<(), Rejection> {
        self.end_turn(EndTurnOrigin::Manual)
    }

    /// Run one step of the pending boss turn, if any.
    ///
    /// After the final step the pointer advances and the next turn begins.
    pub fn step_boss(&mut self) -> Option<BossStep> {
        if !self.state.is_active() {
            return None;
        }
        let turn = self.boss_turn.as_mut()?;
        let step = turn.step(&mut self.state, &mut self.rng, &self.config);
        if matches!(step, Some(BossStep::TurnEnded) | None) {
            self.boss_turn = None;
            let name = self.state.boss.name.clone();
            self.state.events.record(CombatEvent::TurnEnded {
                slot: TurnSlot::Boss,
                name,
            });
            self.advance();
        }
        step
    }

    /// Run the pending boss turn to completion
    pub fn resolve_boss_turn(&mut self) -> Vec<BossStep> {
        let mut steps = Vec::new();
        while self.boss_turn.is_some() {
            match self.step_boss() {
                Some(step) => steps.push(step),
                None => break,
            }
        }
        steps
    }

    /// Stop the encounter. Pending boss steps are discarded and every later
    /// command is rejected.
    pub fn abort(&mut self) {
        if !self.state.is_active() {
            return;
        }
        self.boss_turn = None;
        self.state.phase = Phase::Aborted;
        self.state.is_player_turn = false;
        info!("combat aborted");
        self.state.events.record(CombatEvent::CombatAborted);
    }

    /// Record a rejection and hand it back
    pub(crate) fn reject(&mut self, rejection: Rejection) -> Rejection {
        self.state.events.record(CombatEvent::ActionRejected {
            reason: rejection.to_string(),
        });
        rejection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bosses::BossKind;
    use crate::combatant::{Attributes, PlayerId};
    use crate::grid::Cell;

    fn party(n: u32) -> Vec<Player> {
        (0..n)
            .map(|i| {
                Player::new(PlayerId(i + 1), format!("P{}", i + 1), "ELEMENTALIST", "Flame", Attributes::default())
                    .at(Cell::new(1 + i as i32, 1))
            })
            .collect()
    }

    fn engine(n: u32, seed: u64) -> TurnEngine {
        let mut rng = GameRng::new(seed);
        let boss = Boss::spawn(BossKind::Bear, Cell::new(8, 8), &mut rng);
        TurnEngine::new(party(n), boss, CombatConfig::default(), rng)
    }

    #[test]
    fn test_initiative_is_deterministic() {
        let mut a = engine(3, 42);
        let mut b = engine(3, 42);
        a.start();
        b.start();
        assert_eq!(a.state().turn_order, b.state().turn_order);
        assert_eq!(a.state().turn_order.len(), 4);
    }

    #[test]
    fn test_initiative_sorted_descending() {
        let mut e = engine(3, 7);
        let rolls = e.resolve_initiative();
        let order = &e.state().turn_order;
        let key = |slot: &TurnSlot| {
            let r = rolls.iter().find(|r| r.slot == *slot).map(|r| (r.roll, r.tiebreak));
            r.unwrap_or_default()
        };
        assert!(order.windows(2).all(|w| key(&w[0]) >= key(&w[1])));
    }

    #[test]
    fn test_forced_order_starts_player_turn() {
        let mut e = engine(1, 1);
        e.start_with_order(vec![TurnSlot::Player { idx: 0 }, TurnSlot::Boss]);
        assert!(e.state().is_player_turn);
        assert_eq!(e.state().phase, Phase::PlayerTurn);
        assert_eq!(e.state().players[0].turn, TurnResources::fresh());
        assert!(!e.boss_turn_pending());
    }

    #[test]
    fn test_automatic_end_turn_is_rejected() {
        let mut e = engine(1, 1);
        e.start_with_order(vec![TurnSlot::Player { idx: 0 }, TurnSlot::Boss]);
        e.drain_events();
        for _ in 0..5 {
            let r = e.end_turn(EndTurnOrigin::Automatic("movement exhausted"));
            assert_eq!(r, Err(Rejection::AutomaticEndTurn { origin: "movement exhausted" }));
        }
        assert_eq!(e.state().turn_ptr, 0);
        assert_eq!(e.state().round, 1);
        assert!(!e.boss_turn_pending());
        assert!(e
            .pending_events()
            .iter()
            .all(|ev| matches!(ev, CombatEvent::EndTurnRejected { .. })));
    }

    #[test]
    fn test_manual_end_turn_hands_to_boss() {
        let mut e = engine(1, 1);
        e.start_with_order(vec![TurnSlot::Player { idx: 0 }, TurnSlot::Boss]);
        assert_eq!(e.manual_end_turn(), Ok(()));
        assert!(e.boss_turn_pending());
        assert!(!e.state().is_player_turn);
        assert_eq!(e.manual_end_turn(), Err(Rejection::BossTurnPending));

        let steps = e.resolve_boss_turn();
        assert_eq!(steps.first(), Some(&BossStep::TurnStarted { multiplier: 1 }));
        assert_eq!(steps.last(), Some(&BossStep::TurnEnded));
        assert_eq!(e.state().round, 2);
        assert_eq!(e.state().turn_ptr, 0);
        assert!(e.state().is_player_turn);
    }

    #[test]
    fn test_boss_first_waits_for_stepping() {
        let mut e = engine(1, 1);
        e.start_with_order(vec![TurnSlot::Boss, TurnSlot::Player { idx: 0 }]);
        assert!(e.boss_turn_pending());
        assert_eq!(e.manual_end_turn(), Err(Rejection::BossTurnPending));
        e.resolve_boss_turn();
        assert_eq!(e.state().round, 1);
        assert_eq!(e.state().active_player(), Some(0));
    }

    #[test]
    fn test_abort_discards_boss_turn() {
        let mut e = engine(1, 1);
        e.start_with_order(vec![TurnSlot::Boss, TurnSlot::Player { idx: 0 }]);
        assert!(e.step_boss().is_some());
        e.abort();
        assert!(e.step_boss().is_none());
        assert_eq!(e.state().phase, Phase::Aborted);
        assert_eq!(e.manual_end_turn(), Err(Rejection::CombatInactive));
    }

    #[test]
    fn test_end_turn_clears_move_penalty() {
        let mut e = engine(1, 1);
        e.start_with_order(vec![TurnSlot::Player { idx: 0 }, TurnSlot::Boss]);
        e.state.players[0].next_move_penalty = 2;
        e.manual_end_turn().unwrap();
        assert_eq!(e.state().players[0].next_move_penalty, 0);
    }

    #[test]
    fn test_downed_inferno_holder_does_not_pulse() {
        let mut e = engine(2, 1);
        e.state.players[0].buffs.add(BuffId::Inferno, 1);
        e.state.players[0].hp = 0;
        e.start_with_order(vec![TurnSlot::Player { idx: 0 }, TurnSlot::Player { idx: 1 }, TurnSlot::Boss]);
        assert_eq!(e.state().boss.hp, 100);
        assert_eq!(e.state().players[1].hp, e.state().players[1].hp_max);
        assert_eq!(e.state().inferno_pulse, 2);
        assert!(!e
            .pending_events()
            .iter()
            .any(|ev| matches!(ev, CombatEvent::InfernoPulse { .. })));
        assert_eq!(e.manual_end_turn(), Ok(()));
        assert_eq!(e.state().active_player(), Some(1));
    }

    #[test]
    fn test_observers_receive_flushed_events() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut e = engine(1, 1);
        e.subscribe(Box::new(move |ev: &CombatEvent| sink.borrow_mut().push(ev.clone())));
        e.start_with_order(vec![TurnSlot::Player { idx: 0 }, TurnSlot::Boss]);
        let n = e.flush_events();
        assert_eq!(seen.borrow().len(), n);
        assert!(matches!(seen.borrow()[0], CombatEvent::InitiativeResolved { .. }));
        assert!(e.pending_events().is_empty());
    }
}
