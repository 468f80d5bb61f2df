//! Movement pathing
//!
//! 8-directional movement where diagonals alternate between costing 1 and 2
//! along each path. The alternation is part of the search state, so the
//! search runs Dijkstra over `(cell, diagonal parity)` rather than plain BFS.
//! Diagonals may not cut corners: both orthogonal neighbours forming the
//! corner have to be passable.
//!
//! Two entry points share the cost model: [`reachable`] for a single-cell
//! mover choosing any destination, and [`greedy_approach`] for the boss
//! footprint stepping toward a target.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Footprint, Occupancy, Occupant};

/// Orthogonals first, then diagonals
pub const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Cost of the next diagonal after `diagonals_taken` diagonals on this path
pub const fn diagonal_cost(diagonals_taken: u32) -> u32 {
    if diagonals_taken % 2 == 0 { 1 } else { 2 }
}

/// Total cost of walking `steps` in order, each a unit `(dc, dr)` offset
pub fn path_cost(steps: &[(i32, i32)]) -> u32 {
    let mut diagonals = 0;
    let mut cost = 0;
    for &(dc, dr) in steps {
        if dc != 0 && dr != 0 {
            cost += diagonal_cost(diagonals);
            diagonals += 1;
        } else if dc != 0 || dr != 0 {
            cost += 1;
        }
    }
    cost
}

/// Search state: the cell plus whether an odd number of diagonals led here
type Node = (Cell, u8);

/// Minimum-cost reachability from one origin
#[derive(Debug, Clone)]
pub struct Reachable {
    origin: Cell,
    budget: u32,
    /// Best cost and parity per cell
    best: HashMap<Cell, (u32, u8)>,
    prev: HashMap<Node, Node>,
}

/// A destination and what it costs to get there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub cell: Cell,
    pub cost: u32,
}

impl Reachable {
    pub fn origin(&self) -> Cell {
        self.origin
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell != self.origin && self.best.contains_key(&cell)
    }

    pub fn cost(&self, cell: Cell) -> Option<u32> {
        self.best.get(&cell).map(|&(c, _)| c)
    }

    /// Whether the cheapest path to `cell` leaves the next diagonal costing 2
    pub fn odd_diagonals(&self, cell: Cell) -> Option<bool> {
        self.best.get(&cell).map(|&(_, p)| p == 1)
    }

    /// Every reachable cell except the origin, sorted by (row, col)
    pub fn destinations(&self) -> Vec<Destination> {
        let mut out: Vec<Destination> = self
            .best
            .iter()
            .filter(|(cell, _)| **cell != self.origin)
            .map(|(&cell, &(cost, _))| Destination { cell, cost })
            .collect();
        out.sort_by_key(|d| (d.cell.row, d.cell.col));
        out
    }

    /// Cells walked from the origin (exclusive) to `dest` (inclusive) along the
    /// cheapest path. `None` if `dest` is not reachable.
    pub fn path_to(&self, dest: Cell) -> Option<Vec<Cell>> {
        let &(_, parity) = self.best.get(&dest)?;
        let mut node = (dest, parity);
        let mut path = vec![dest];
        while let Some(&prev) = self.prev.get(&node) {
            if prev.0 == self.origin {
                break;
            }
            path.push(prev.0);
            node = prev;
        }
        if dest == self.origin {
            return Some(Vec::new());
        }
        path.reverse();
        Some(path)
    }
}

/// Every cell a single-cell mover at `origin` can reach within `budget`.
///
/// `mover` is excluded from the occupancy check so the mover never blocks
/// itself.
pub fn reachable<O: Occupancy + ?Sized>(
    occupancy: &O,
    origin: Cell,
    budget: u32,
    mover: Option<Occupant>,
) -> Reachable {
    reachable_continuing(occupancy, origin, budget, false, mover)
}

/// Like [`reachable`], for a mover already partway along its turn's walk.
/// With `odd_diagonals` set the first diagonal taken costs 2.
pub fn reachable_continuing<O: Occupancy + ?Sized>(
    occupancy: &O,
    origin: Cell,
    budget: u32,
    odd_diagonals: bool,
    mover: Option<Occupant>,
) -> Reachable {
    let passable = |cell: Cell| occupancy.is_passable(cell, mover);

    let mut dist: HashMap<Node, u32> = HashMap::new();
    let mut prev: HashMap<Node, Node> = HashMap::new();
    let mut heap = BinaryHeap::new();

    let start = (origin, u8::from(odd_diagonals));
    dist.insert(start, 0);
    heap.push(Reverse((0u32, start.0, start.1)));

    while let Some(Reverse((cost, cell, parity))) = heap.pop() {
        if dist.get(&(cell, parity)).is_some_and(|&d| d < cost) {
            continue;
        }
        for (dc, dr) in DIRECTIONS {
            let next = cell.offset(dc, dr);
            if !passable(next) {
                continue;
            }
            let diagonal = dc != 0 && dr != 0;
            if diagonal && !(passable(cell.offset(dc, 0)) && passable(cell.offset(0, dr))) {
                continue;
            }
            let (step, next_parity) = if diagonal {
                (diagonal_cost(u32::from(parity)), parity ^ 1)
            } else {
                (1, parity)
            };
            let next_cost = cost + step;
            if next_cost > budget {
                continue;
            }
            let node = (next, next_parity);
            if dist.get(&node).is_none_or(|&d| next_cost < d) {
                dist.insert(node, next_cost);
                prev.insert(node, (cell, parity));
                heap.push(Reverse((next_cost, next, next_parity)));
            }
        }
    }

    let mut best: HashMap<Cell, (u32, u8)> = HashMap::new();
    for (&(cell, parity), &cost) in &dist {
        let better = match best.get(&cell) {
            None => true,
            Some(&(c, p)) => cost < c || (cost == c && parity < p),
        };
        if better {
            best.insert(cell, (cost, parity));
        }
    }

    Reachable {
        origin,
        budget,
        best,
        prev,
    }
}

/// Why a greedy approach stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Adjacent to (or overlapping) the target
    Arrived,
    /// No affordable step left
    BudgetExhausted,
    /// Every candidate step is blocked
    Stuck,
}

/// Result of moving a footprint toward a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approach {
    /// Anchor after each step taken
    pub steps: Vec<Cell>,
    pub spent: u32,
    pub stop: StopReason,
}

impl Approach {
    pub fn moved(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn end(&self, start: Footprint) -> Footprint {
        self.steps.last().map_or(start, |&cell| start.at(cell))
    }
}

fn footprint_passable<O: Occupancy + ?Sized>(occupancy: &O, fp: Footprint, mover: Occupant) -> bool {
    fp.cells().all(|cell| occupancy.is_passable(cell, Some(mover)))
}

/// Step a footprint toward `target` one cell at a time.
///
/// Each step prefers the diagonal that closes both axes, then the axis with
/// the larger gap, then the other axis. A diagonal is skipped when it would
/// cut a corner or cost more than what is left of the budget.
pub fn greedy_approach<O: Occupancy + ?Sized>(
    occupancy: &O,
    start: Footprint,
    target: Cell,
    budget: u32,
    mover: Occupant,
) -> Approach {
    let mut fp = start;
    let mut left = budget;
    let mut diagonals = 0;
    let mut steps = Vec::new();

    let stop = loop {
        if fp.chebyshev_to(target) <= 1 {
            break StopReason::Arrived;
        }
        if left == 0 {
            break StopReason::BudgetExhausted;
        }
        let (dx, dy) = fp.delta_to(target);
        let (sx, sy) = (dx.signum(), dy.signum());

        let mut candidates: Vec<(i32, i32)> = Vec::with_capacity(3);
        if sx != 0 && sy != 0 {
            candidates.push((sx, sy));
        }
        if dx.abs() >= dy.abs() {
            candidates.push((sx, 0));
            candidates.push((0, sy));
        } else {
            candidates.push((0, sy));
            candidates.push((sx, 0));
        }

        let mut unaffordable = false;
        let mut taken = None;
        for (dc, dr) in candidates.into_iter().filter(|&(dc, dr)| dc != 0 || dr != 0) {
            let diagonal = dc != 0 && dr != 0;
            let cost = if diagonal { diagonal_cost(diagonals) } else { 1 };
            let next = fp.at(fp.anchor().offset(dc, dr));
            if !footprint_passable(occupancy, next, mover) {
                continue;
            }
            if diagonal {
                let side_a = fp.at(fp.anchor().offset(dc, 0));
                let side_b = fp.at(fp.anchor().offset(0, dr));
                if !footprint_passable(occupancy, side_a, mover)
                    || !footprint_passable(occupancy, side_b, mover)
                {
                    continue;
                }
            }
            if cost > left {
                unaffordable = true;
                continue;
            }
            taken = Some((next, cost, diagonal));
            break;
        }

        match taken {
            Some((next, cost, diagonal)) => {
                fp = next;
                left -= cost;
                if diagonal {
                    diagonals += 1;
                }
                steps.push(fp.anchor());
            }
            None if unaffordable => break StopReason::BudgetExhausted,
            None => break StopReason::Stuck,
        }
    };

    Approach {
        steps,
        spent: budget - left,
        stop,
    }
}
