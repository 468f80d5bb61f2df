//! Player commands
//!
//! Burn, the Inferno toggle and movement. Every command validates first and
//! only then mutates, so a rejection leaves the state as it was (apart from
//! the recorded rejection event).

use serde::Serialize;

use crate::error::Rejection;
use crate::event::{CombatEvent, DamageReason};
use crate::grid::{Cell, Occupant};
use crate::pathing::{Destination, reachable_continuing};
use crate::spells::SpellRegistry;
use crate::state::CombatState;
use crate::status::{BuffId, StatusKind, StatusStack};
use crate::turn::{EndTurnOrigin, TurnEngine};

/// Spell ids the action resolver checks
pub const BURN: &str = "burn";
pub const INFERNO: &str = "inferno";

/// Which branch a Burn cast took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnResult {
    /// A new Burn stack went on the boss
    Applied { amount: u32, ticks: u32 },
    /// Inferno was primed: immediate damage, then a pulse
    Detonated { damage: u32, pulse: u32 },
}

/// Result of pressing the Inferno button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfernoToggle {
    Primed,
    /// Primed buff cleared, bonus refunded
    Cancelled,
}

/// Result of a successful move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// Cells walked, destination last
    pub path: Vec<Cell>,
    pub cost: u32,
    pub remaining: u32,
}

/// Deal the current pulse to the boss and every other living player, then
/// escalate it. Returns the damage dealt.
pub fn inferno_pulse(state: &mut CombatState, holder: usize) -> u32 {
    let damage = state.inferno_pulse;
    let source = state.players[holder].id;
    state.events.record(CombatEvent::InfernoPulse { source, damage });
    state.damage_boss(damage, DamageReason::InfernoPulse);
    for idx in 0..state.players.len() {
        if idx != holder && state.players[idx].is_alive() {
            state.damage_player(idx, damage, DamageReason::InfernoPulse);
        }
    }
    state.inferno_pulse += 1;
    damage
}

impl<R: SpellRegistry> TurnEngine<R> {
    /// Index of the player allowed to act right now
    fn acting_player(&mut self) -> Result<usize, Rejection> {
        if !self.state.is_active() {
            return Err(self.reject(Rejection::CombatInactive));
        }
        if self.boss_turn_pending() {
            return Err(self.reject(Rejection::NotYourTurn));
        }
        let Some(idx) = self.state.active_player() else {
            return Err(self.reject(Rejection::NotYourTurn));
        };
        if !self.state.players[idx].is_alive() {
            let name = self.state.players[idx].name.clone();
            return Err(self.reject(Rejection::Defeated { name }));
        }
        Ok(idx)
    }

    fn knows(&self, idx: usize, spell: &str) -> bool {
        let p = &self.state.players[idx];
        self.spells.knows(&p.class_id, &p.affinity, &p.attrs, spell)
    }

    /// Cast Burn at `target`, a cell of the boss footprint.
    pub fn cast_burn(&mut self, target: Cell) -> Result<BurnResult, Rejection> {
        let idx = self.acting_player()?;
        let name = self.state.players[idx].name.clone();
        if !self.knows(idx, BURN) {
            return Err(self.reject(Rejection::SpellUnavailable { name }));
        }
        if self.state.players[idx].turn.action == 0 {
            return Err(self.reject(Rejection::NoActionsLeft { name }));
        }
        if !self.state.boss.footprint.contains(target) {
            return Err(self.reject(Rejection::NoValidTarget));
        }
        let origin = self.state.players[idx].pos;
        if !self
            .config
            .range_metric
            .in_range(origin, target, self.config.burn_range)
        {
            return Err(self.reject(Rejection::OutOfRange));
        }

        let id = self.state.players[idx].id;
        let pow = self.state.players[idx].attrs.pow;
        self.state.events.record(CombatEvent::SpellCast {
            player: id,
            name: name.clone(),
            spell: BURN,
        });

        let result = if self.state.players[idx].buffs.has(BuffId::InfernoPrimed) {
            self.consume_buff(idx, BuffId::InfernoPrimed);
            let damage = self.config.burn_policy.detonation_damage(pow);
            self.state.damage_boss(damage, DamageReason::Detonation);
            self.add_buff(idx, BuffId::Inferno, 1);
            let pulse = inferno_pulse(&mut self.state, idx);
            BurnResult::Detonated { damage, pulse }
        } else {
            let (amount, ticks) = self.config.burn_policy.stack_for(pow);
            if ticks > 0 {
                self.state
                    .boss
                    .statuses
                    .add(StatusStack::new(StatusKind::Burn, amount, ticks, name.clone()));
                self.state.events.record(CombatEvent::StatusApplied {
                    kind: StatusKind::Burn,
                    amount,
                    remaining: ticks,
                    source: name,
                });
            }
            BurnResult::Applied { amount, ticks }
        };

        let turn = &mut self.state.players[idx].turn;
        debug_assert!(turn.action > 0);
        turn.action -= 1;
        Ok(result)
    }

    /// Prime Inferno, or cancel it (with a bonus refund) if already primed.
    pub fn toggle_inferno(&mut self) -> Result<InfernoToggle, Rejection> {
        let idx = self.acting_player()?;
        let name = self.state.players[idx].name.clone();
        if !self.knows(idx, INFERNO) {
            return Err(self.reject(Rejection::InfernoUnavailable { name }));
        }

        if self.state.players[idx].buffs.has(BuffId::InfernoPrimed) {
            let player = &mut self.state.players[idx];
            player.buffs.clear(BuffId::InfernoPrimed);
            player.turn.bonus = (player.turn.bonus + 1).min(player.turn.bonus_max);
            let id = player.id;
            self.state.events.record(CombatEvent::BuffCleared {
                player: id,
                name,
                buff: BuffId::InfernoPrimed,
            });
            return Ok(InfernoToggle::Cancelled);
        }

        if self.state.players[idx].turn.bonus == 0 {
            return Err(self.reject(Rejection::NoBonusLeft { name }));
        }
        self.state.players[idx].turn.bonus -= 1;
        self.add_buff(idx, BuffId::InfernoPrimed, 1);
        Ok(InfernoToggle::Primed)
    }

    /// Roll the movement die once for this turn and bank the result
    pub fn roll_movement(&mut self) -> Result<u32, Rejection> {
        let idx = self.acting_player()?;
        let turn = self.state.players[idx].turn;
        if turn.movement_rolled {
            let rejection = if turn.remaining_movement > 0 {
                Rejection::MovementAlreadyRolled
            } else {
                Rejection::AlreadyMoved
            };
            return Err(self.reject(rejection));
        }

        let die = self.state.players[idx].move_die;
        let roll = self.rng.roll(die);
        let player = &mut self.state.players[idx];
        let penalty = std::mem::take(&mut player.next_move_penalty);
        let steps = roll.saturating_sub(penalty);
        player.turn.movement_rolled = true;
        player.turn.remaining_movement = steps;
        player.turn.rolled = Some(steps);
        let event = CombatEvent::MovementRolled {
            player: player.id,
            name: player.name.clone(),
            die,
            roll,
            penalty,
            steps,
        };
        self.state.events.record(event);
        Ok(steps)
    }

    /// Destinations the active player can reach with banked movement
    pub fn reachable_destinations(&self) -> Vec<Destination> {
        let Some(idx) = self.state.active_player() else {
            return Vec::new();
        };
        let player = &self.state.players[idx];
        if player.turn.remaining_movement == 0 {
            return Vec::new();
        }
        reachable_continuing(
            &self.state,
            player.pos,
            player.turn.remaining_movement,
            player.turn.odd_diagonals,
            Some(Occupant::Player(player.id)),
        )
        .destinations()
    }

    /// Walk the active player to `dest` along the cheapest path.
    ///
    /// Spending the last banked point fires an automatic end-turn request,
    /// which the end-turn gate turns down.
    pub fn move_to(&mut self, dest: Cell) -> Result<MoveResult, Rejection> {
        let idx = self.acting_player()?;
        let turn = self.state.players[idx].turn;
        if !turn.movement_rolled {
            return Err(self.reject(Rejection::MovementNotRolled));
        }
        if turn.remaining_movement == 0 {
            return Err(self.reject(Rejection::AlreadyMoved));
        }

        let (id, from) = (self.state.players[idx].id, self.state.players[idx].pos);
        let reach = reachable_continuing(
            &self.state,
            from,
            turn.remaining_movement,
            turn.odd_diagonals,
            Some(Occupant::Player(id)),
        );
        let (Some(cost), Some(path), Some(odd_diagonals)) = (
            reach.cost(dest).filter(|_| reach.contains(dest)),
            reach.path_to(dest),
            reach.odd_diagonals(dest),
        ) else {
            return Err(self.reject(Rejection::Unreachable));
        };

        let player = &mut self.state.players[idx];
        player.pos = dest;
        player.turn.remaining_movement -= cost;
        player.turn.odd_diagonals = odd_diagonals;
        player.turn.moved = true;
        let remaining = player.turn.remaining_movement;
        let event = CombatEvent::PlayerMoved {
            player: id,
            name: player.name.clone(),
            from,
            to: dest,
            cost,
            remaining,
        };
        self.state.events.record(event);

        if remaining == 0 {
            let _ = self.end_turn(EndTurnOrigin::Automatic("movement exhausted"));
        }
        Ok(MoveResult {
            path,
            cost,
            remaining,
        })
    }

    /// Drop whatever movement is still banked
    pub fn cancel_movement(&mut self) -> Result<(), Rejection> {
        let idx = self.acting_player()?;
        let turn = &mut self.state.players[idx].turn;
        if !turn.movement_rolled || turn.remaining_movement == 0 {
            return Err(self.reject(Rejection::MovementNotRolled));
        }
        turn.remaining_movement = 0;
        Ok(())
    }

    fn add_buff(&mut self, idx: usize, buff: BuffId, stacks: u32) {
        let player = &mut self.state.players[idx];
        let total = player.buffs.add(buff, stacks);
        let event = CombatEvent::BuffApplied {
            player: player.id,
            name: player.name.clone(),
            buff,
            stacks: total,
        };
        self.state.events.record(event);
    }

    fn consume_buff(&mut self, idx: usize, buff: BuffId) {
        let player = &mut self.state.players[idx];
        if player.buffs.consume(buff, 1) {
            let event = CombatEvent::BuffConsumed {
                player: player.id,
                name: player.name.clone(),
                buff,
                stacks_left: player.buffs.stacks(buff),
            };
            self.state.events.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bosses::BossKind;
    use crate::combatant::{Attributes, Boss, Player, PlayerId};
    use crate::config::CombatConfig;
    use crate::rng::GameRng;
    use crate::state::TurnSlot;

    fn caster(id: u32, pos: Cell) -> Player {
        let attrs = Attributes {
            pow: 16,
            def: 8,
            sup: 10,
        };
        Player::new(PlayerId(id), format!("Pyro{id}"), "ELEMENTALIST", "Flame", attrs).at(pos)
    }

    fn engine(players: Vec<Player>) -> TurnEngine {
        let mut rng = GameRng::new(42);
        let boss = Boss::spawn(BossKind::Bear, Cell::new(8, 8), &mut rng);
        let n = players.len();
        let mut e = TurnEngine::new(players, boss, CombatConfig::default(), rng);
        let mut order: Vec<TurnSlot> = (0..n).map(|idx| TurnSlot::Player { idx }).collect();
        order.push(TurnSlot::Boss);
        e.start_with_order(order);
        e
    }

    #[test]
    fn test_burn_applies_stack_without_damage() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8))]);
        let r = e.cast_burn(Cell::new(8, 8));
        assert_eq!(r, Ok(BurnResult::Applied { amount: 1, ticks: 3 }));
        assert_eq!(e.state().boss.hp, 100);
        assert_eq!(e.state().boss.statuses.stacks().len(), 1);
        assert_eq!(e.state().players[0].turn.action, 0);
    }

    #[test]
    fn test_burn_needs_action() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8))]);
        e.cast_burn(Cell::new(8, 8)).unwrap();
        let r = e.cast_burn(Cell::new(8, 8));
        assert_eq!(r, Err(Rejection::NoActionsLeft { name: "Pyro1".into() }));
        assert_eq!(e.state().boss.statuses.stacks().len(), 1);
    }

    #[test]
    fn test_burn_requires_spell() {
        let weak = Player::new(PlayerId(1), "Ash", "ELEMENTALIST", "Flame", Attributes::default())
            .at(Cell::new(7, 8));
        let mut e = engine(vec![weak]);
        let r = e.cast_burn(Cell::new(8, 8));
        assert_eq!(
            r.map_err(|e| e.to_string()),
            Err("Ash has no attack spells available.".to_string())
        );
        assert_eq!(e.state().players[0].turn.action, 1);
    }

    #[test]
    fn test_burn_target_checks() {
        let mut e = engine(vec![caster(1, Cell::new(1, 1))]);
        assert_eq!(e.cast_burn(Cell::new(5, 5)), Err(Rejection::NoValidTarget));
        // dnd35 distance from (1,1) to (8,8) is 10
        assert_eq!(e.cast_burn(Cell::new(8, 8)), Err(Rejection::OutOfRange));
        assert_eq!(e.state().players[0].turn.action, 1);
    }

    #[test]
    fn test_inferno_toggle_round_trip() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8))]);
        let before = e.state().players[0].turn;
        assert_eq!(e.toggle_inferno(), Ok(InfernoToggle::Primed));
        assert_eq!(e.state().players[0].turn.bonus, 0);
        assert!(e.state().players[0].buffs.has(BuffId::InfernoPrimed));
        assert_eq!(e.toggle_inferno(), Ok(InfernoToggle::Cancelled));
        assert_eq!(e.state().players[0].turn, before);
        assert!(e.state().players[0].buffs.is_empty());
    }

    #[test]
    fn test_inferno_needs_bonus() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8))]);
        e.toggle_inferno().unwrap();
        e.cast_burn(Cell::new(8, 8)).unwrap();
        let r = e.toggle_inferno();
        assert_eq!(r, Err(Rejection::NoBonusLeft { name: "Pyro1".into() }));
    }

    #[test]
    fn test_detonation() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8)), caster(2, Cell::new(1, 1))]);
        e.toggle_inferno().unwrap();
        let r = e.cast_burn(Cell::new(8, 9));
        assert_eq!(r, Ok(BurnResult::Detonated { damage: 3, pulse: 2 }));
        let s = e.state();
        assert!(s.boss.statuses.is_empty());
        assert_eq!(s.boss.hp, 100 - 3 - 2);
        assert_eq!(s.players[0].hp, 12);
        assert_eq!(s.players[1].hp, 10);
        assert_eq!(s.players[0].buffs.stacks(BuffId::Inferno), 1);
        assert!(!s.players[0].buffs.has(BuffId::InfernoPrimed));
        assert_eq!(s.inferno_pulse, 3);
    }

    #[test]
    fn test_movement_roll_and_move() {
        let mut e = engine(vec![caster(1, Cell::new(2, 2))]);
        assert_eq!(e.move_to(Cell::new(3, 3)), Err(Rejection::MovementNotRolled));
        let steps = e.roll_movement().unwrap();
        assert!((1..=4).contains(&steps));
        assert_eq!(e.roll_movement(), Err(Rejection::MovementAlreadyRolled));
        assert!(!e.reachable_destinations().is_empty());

        let r = e.move_to(Cell::new(3, 2)).unwrap();
        assert_eq!(r.cost, 1);
        assert_eq!(r.path, vec![Cell::new(3, 2)]);
        assert_eq!(e.state().players[0].pos, Cell::new(3, 2));
        assert_eq!(e.state().turn_ptr, 0);
    }

    #[test]
    fn test_exhausting_movement_does_not_end_turn() {
        let mut e = engine(vec![caster(1, Cell::new(2, 2))]);
        let steps = e.roll_movement().unwrap();
        e.drain_events();
        let dest = Cell::new(2 + steps as i32, 2);
        let r = e.move_to(dest).unwrap();
        assert_eq!(r.remaining, 0);
        assert!(e.state().is_player_turn);
        assert_eq!(e.state().turn_ptr, 0);
        assert!(!e.boss_turn_pending());
        assert!(e
            .pending_events()
            .iter()
            .any(|ev| matches!(ev, CombatEvent::EndTurnRejected { .. })));
        assert_eq!(e.roll_movement(), Err(Rejection::AlreadyMoved));
    }

    #[test]
    fn test_split_moves_keep_diagonal_alternation() {
        let mut e = engine(vec![caster(1, Cell::new(2, 2))]);
        e.state.players[0].turn.movement_rolled = true;
        e.state.players[0].turn.remaining_movement = 4;

        let costs: Vec<u32> = [Cell::new(3, 3), Cell::new(4, 4), Cell::new(5, 5)]
            .into_iter()
            .map(|dest| e.move_to(dest).map(|r| r.cost).unwrap())
            .collect();
        assert_eq!(costs, vec![1, 2, 1]);
        assert_eq!(e.move_to(Cell::new(6, 6)), Err(Rejection::AlreadyMoved));
        assert_eq!(e.state().players[0].pos, Cell::new(5, 5));
    }

    #[test]
    fn test_reachable_destinations_continue_the_walk() {
        let mut e = engine(vec![caster(1, Cell::new(2, 2))]);
        e.state.players[0].turn.movement_rolled = true;
        e.state.players[0].turn.remaining_movement = 3;
        e.move_to(Cell::new(3, 3)).unwrap();

        let dests = e.reachable_destinations();
        let next_diag = dests.iter().find(|d| d.cell == Cell::new(4, 4));
        assert_eq!(next_diag.map(|d| d.cost), Some(2));
        assert!(dests.iter().all(|d| d.cost <= 2));
    }

    #[test]
    fn test_downed_player_cannot_act() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8))]);
        e.state.players[0].hp = 0;
        let down = Rejection::Defeated { name: "Pyro1".into() };
        assert_eq!(e.cast_burn(Cell::new(8, 8)), Err(down.clone()));
        assert_eq!(e.toggle_inferno(), Err(down.clone()));
        assert_eq!(e.roll_movement(), Err(down));
        assert!(e.state().boss.statuses.is_empty());
        assert_eq!(e.state().players[0].turn.action, 1);
        assert_eq!(e.manual_end_turn(), Ok(()));
    }

    #[test]
    fn test_roar_penalty_applies_to_roll() {
        let mut e = engine(vec![caster(1, Cell::new(2, 2))]);
        e.state.players[0].next_move_penalty = 10;
        assert_eq!(e.roll_movement(), Ok(0));
        assert_eq!(e.state().players[0].next_move_penalty, 0);
        assert!(e.reachable_destinations().is_empty());
    }

    #[test]
    fn test_cannot_walk_into_boss() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8))]);
        e.roll_movement().unwrap();
        assert_eq!(e.move_to(Cell::new(8, 8)), Err(Rejection::Unreachable));
    }

    #[test]
    fn test_commands_rejected_on_boss_turn() {
        let mut e = engine(vec![caster(1, Cell::new(7, 8))]);
        e.manual_end_turn().unwrap();
        assert_eq!(e.cast_burn(Cell::new(8, 8)), Err(Rejection::NotYourTurn));
        assert_eq!(e.toggle_inferno(), Err(Rejection::NotYourTurn));
        assert_eq!(e.roll_movement(), Err(Rejection::NotYourTurn));
    }
}
