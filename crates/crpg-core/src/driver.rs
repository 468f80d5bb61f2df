//! Paced boss-turn driver
//!
//! Runs a pending boss turn one step at a time and asks a [`Pacer`] after
//! every step whether to keep going. Presentation layers use this to put a
//! delay between card draws, or to stop the encounter halfway through.

use std::thread;
use std::time::Duration;

use crate::boss_ai::BossStep;
use crate::spells::SpellRegistry;
use crate::state::CombatState;
use crate::turn::TurnEngine;

/// What the pacer wants after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Continue,
    /// Stop the encounter; remaining steps are discarded
    Abort,
}

/// Called between boss steps
pub trait Pacer {
    fn after_step(&mut self, step: &BossStep, state: &CombatState) -> Pace;
}

impl<F> Pacer for F
where
    F: FnMut(&BossStep, &CombatState) -> Pace,
{
    fn after_step(&mut self, step: &BossStep, state: &CombatState) -> Pace {
        self(step, state)
    }
}

/// No delay
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Pacer for Immediate {
    fn after_step(&mut self, _step: &BossStep, _state: &CombatState) -> Pace {
        Pace::Continue
    }
}

/// Sleeps a fixed time after every step
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    fn after_step(&mut self, _step: &BossStep, _state: &CombatState) -> Pace {
        thread::sleep(self.0);
        Pace::Continue
    }
}

/// How a driven boss turn finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOutcome {
    Completed(Vec<BossStep>),
    /// The pacer stopped the encounter after `steps`
    Aborted { steps: Vec<BossStep> },
}

impl DriveOutcome {
    pub fn steps(&self) -> &[BossStep] {
        match self {
            Self::Completed(steps) | Self::Aborted { steps } => steps,
        }
    }
}

/// Step the pending boss turn to its end, consulting `pacer` between steps.
///
/// Returns `Completed` with no steps if no boss turn was pending.
pub fn drive_boss_turn<R, P>(engine: &mut TurnEngine<R>, pacer: &mut P) -> DriveOutcome
where
    R: SpellRegistry,
    P: Pacer + ?Sized,
{
    let mut steps = Vec::new();
    while engine.boss_turn_pending() {
        let Some(step) = engine.step_boss() else {
            break;
        };
        let pace = pacer.after_step(&step, engine.state());
        steps.push(step);
        if pace == Pace::Abort && engine.boss_turn_pending() {
            engine.abort();
            return DriveOutcome::Aborted { steps };
        }
    }
    DriveOutcome::Completed(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bosses::BossKind;
    use crate::combatant::{Attributes, Boss, Player, PlayerId};
    use crate::config::CombatConfig;
    use crate::grid::Cell;
    use crate::rng::GameRng;
    use crate::state::{Phase, TurnSlot};

    fn boss_first() -> TurnEngine {
        let mut rng = GameRng::new(3);
        let boss = Boss::spawn(BossKind::Bear, Cell::new(8, 8), &mut rng);
        let player = Player::new(PlayerId(1), "Ember", "ELEMENTALIST", "Flame", Attributes::default())
            .at(Cell::new(2, 2));
        let mut e = TurnEngine::new(vec![player], boss, CombatConfig::default(), rng);
        e.start_with_order(vec![TurnSlot::Boss, TurnSlot::Player { idx: 0 }]);
        e
    }

    #[test]
    fn test_immediate_runs_to_end() {
        let mut e = boss_first();
        let out = drive_boss_turn(&mut e, &mut Immediate);
        assert!(matches!(out, DriveOutcome::Completed(_)));
        assert_eq!(out.steps().last(), Some(&BossStep::TurnEnded));
        assert_eq!(e.state().active_player(), Some(0));
    }

    #[test]
    fn test_nothing_pending() {
        let mut e = boss_first();
        drive_boss_turn(&mut e, &mut Immediate);
        let out = drive_boss_turn(&mut e, &mut Immediate);
        assert_eq!(out, DriveOutcome::Completed(Vec::new()));
    }

    #[test]
    fn test_abort_after_first_step() {
        let mut e = boss_first();
        let mut pacer = |_: &BossStep, _: &CombatState| Pace::Abort;
        let out = drive_boss_turn(&mut e, &mut pacer);
        assert_eq!(out.steps().len(), 1);
        assert!(matches!(out, DriveOutcome::Aborted { .. }));
        assert_eq!(e.state().phase, Phase::Aborted);
        assert!(!e.boss_turn_pending());
    }

    #[test]
    fn test_pacer_sees_every_step() {
        let mut e = boss_first();
        let mut seen = 0;
        let mut pacer = |_: &BossStep, _: &CombatState| {
            seen += 1;
            Pace::Continue
        };
        let out = drive_boss_turn(&mut e, &mut pacer);
        assert_eq!(seen, out.steps().len());
    }

    fn replay_matches<T: Eq>(a: &T, b: &T) -> bool {
        a == b
    }

    #[test]
    fn test_same_seed_replays_same_steps() {
        let first = drive_boss_turn(&mut boss_first(), &mut Immediate);
        let second = drive_boss_turn(&mut boss_first(), &mut Immediate);
        assert!(replay_matches(&first, &second));
        assert!(first.steps().iter().any(|s| matches!(s, BossStep::CardDrawn { .. })));
    }

    #[test]
    fn test_fixed_delay_completes() {
        let mut e = boss_first();
        let out = drive_boss_turn(&mut e, &mut FixedDelay(Duration::from_millis(1)));
        assert!(matches!(out, DriveOutcome::Completed(_)));
    }
}
