//! Independent-stack statuses carried by the boss

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Kinds of status the boss can carry
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    /// Fire damage over time
    Burn,
}

impl StatusKind {
    /// Display name for the status
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Burn => "Burn",
        }
    }
}

/// One application of a status, with its own countdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStack {
    pub kind: StatusKind,
    /// Damage dealt per tick
    pub amount: u32,
    /// Ticks left; the stack is removed when this reaches 0
    pub remaining: u32,
    /// Who applied it (player name)
    pub source: String,
}

impl StatusStack {
    pub fn new(kind: StatusKind, amount: u32, remaining: u32, source: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            remaining,
            source: source.into(),
        }
    }

    pub const fn is_active(&self) -> bool {
        self.remaining > 0
    }
}

/// Outcome of one owner-turn tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTick {
    /// Lump damage to apply to the owner, summed before decrementing
    pub damage: u32,
    /// Stacks that dealt damage this tick
    pub ticked: usize,
    /// Stacks removed because their countdown reached 0
    pub expired: Vec<StatusStack>,
}

/// Ordered collection of status stacks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusList {
    stacks: Vec<StatusStack>,
}

impl StatusList {
    pub const fn new() -> Self {
        Self { stacks: Vec::new() }
    }

    /// Append a new stack; existing stacks of the same kind are left alone.
    pub fn add(&mut self, stack: StatusStack) {
        self.stacks.push(stack);
    }

    pub fn stacks(&self) -> &[StatusStack] {
        &self.stacks
    }

    pub fn count(&self, kind: StatusKind) -> usize {
        self.stacks.iter().filter(|s| s.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Damage the next tick would deal
    pub fn pending_damage(&self) -> u32 {
        self.stacks
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.amount)
            .sum()
    }

    /// Damage first, then decrement, then drop stacks at 0.
    ///
    /// A stack created with `remaining = 3` therefore deals damage on three
    /// separate ticks.
    pub fn tick(&mut self) -> StatusTick {
        let mut tick = StatusTick::default();
        for stack in self.stacks.iter_mut().filter(|s| s.is_active()) {
            tick.damage += stack.amount;
            tick.ticked += 1;
            stack.remaining -= 1;
        }
        let (expired, kept): (Vec<_>, Vec<_>) =
            self.stacks.drain(..).partition(|s| s.remaining == 0);
        self.stacks = kept;
        tick.expired = expired;
        tick
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burn(remaining: u32) -> StatusStack {
        StatusStack::new(StatusKind::Burn, 1, remaining, "Ember")
    }

    #[test]
    fn test_add_never_merges() {
        let mut list = StatusList::new();
        list.add(burn(3));
        list.add(burn(3));
        list.add(burn(3));
        assert_eq!(list.count(StatusKind::Burn), 3);
        assert!(list.stacks().iter().all(|s| s.remaining == 3));

        let ticks: Vec<StatusTick> = (0..3).map(|_| list.tick()).collect();
        assert!(ticks.iter().all(|t| t.damage == 3 && t.ticked == 3));
        assert_eq!(ticks.iter().map(|t| t.damage).sum::<u32>(), 9);
        assert!(ticks[..2].iter().all(|t| t.expired.is_empty()));
        assert_eq!(ticks[2].expired.len(), 3);
        assert!(list.is_empty());
    }

    #[test]
    fn test_tick_damages_before_decrement() {
        let mut list = StatusList::new();
        list.add(burn(1));
        let tick = list.tick();
        assert_eq!(tick.damage, 1);
        assert_eq!(tick.expired.len(), 1);
        assert!(list.is_empty());
    }

    #[test]
    fn test_three_tick_stack_lifetime() {
        let mut list = StatusList::new();
        list.add(burn(3));
        let damage: Vec<u32> = (0..4).map(|_| list.tick().damage).collect();
        assert_eq!(damage, vec![1, 1, 1, 0]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_staggered_stacks_expire_independently() {
        let mut list = StatusList::new();
        list.add(burn(3));
        list.tick();
        list.add(burn(3));
        assert_eq!(list.pending_damage(), 2);
        list.tick();
        let tick = list.tick();
        assert_eq!(tick.damage, 2);
        assert_eq!(tick.expired.len(), 1);
        assert_eq!(list.stacks()[0].remaining, 1);
    }

    #[test]
    fn test_zero_remaining_stack_is_inert() {
        let mut list = StatusList::new();
        list.add(burn(0));
        let tick = list.tick();
        assert_eq!(tick.damage, 0);
        assert_eq!(tick.ticked, 0);
        assert_eq!(tick.expired.len(), 1);
    }
}
