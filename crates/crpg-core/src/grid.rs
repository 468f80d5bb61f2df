//! Board geometry
//!
//! Cells, the boss footprint rectangle, distance metrics and the occupancy
//! contract that pathing consults.

use core::fmt;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::combatant::PlayerId;

/// A grid cell, 1-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub const fn offset(self, dc: i32, dr: i32) -> Self {
        Self {
            col: self.col + dc,
            row: self.row + dr,
        }
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }

    pub fn chebyshev(self, other: Cell) -> i32 {
        (self.col - other.col).abs().max((self.row - other.row).abs())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A `w × h` rectangle anchored at its top-left cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub col: i32,
    pub row: i32,
    pub w: i32,
    pub h: i32,
}

impl Footprint {
    pub const fn new(col: i32, row: i32, w: i32, h: i32) -> Self {
        Self { col, row, w, h }
    }

    pub const fn anchor(&self) -> Cell {
        Cell::new(self.col, self.row)
    }

    /// Same size, moved so the anchor sits on `cell`
    pub const fn at(&self, cell: Cell) -> Self {
        Self::new(cell.col, cell.row, self.w, self.h)
    }

    pub const fn right(&self) -> i32 {
        self.col + self.w - 1
    }

    pub const fn bottom(&self) -> i32 {
        self.row + self.h - 1
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.col >= self.col && cell.col <= self.right() && cell.row >= self.row && cell.row <= self.bottom()
    }

    /// Every occupied cell, row-major
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (self.row..=self.bottom())
            .flat_map(move |row| (self.col..=self.right()).map(move |col| Cell::new(col, row)))
    }

    /// Signed per-axis gap from the rectangle to `cell`; zero on an axis the
    /// rectangle already spans.
    pub fn delta_to(&self, cell: Cell) -> (i32, i32) {
        let dx = if cell.col < self.col {
            cell.col - self.col
        } else if cell.col > self.right() {
            cell.col - self.right()
        } else {
            0
        };
        let dy = if cell.row < self.row {
            cell.row - self.row
        } else if cell.row > self.bottom() {
            cell.row - self.bottom()
        } else {
            0
        };
        (dx, dy)
    }

    /// Minimum Chebyshev distance from `cell` to any occupied cell
    pub fn chebyshev_to(&self, cell: Cell) -> i32 {
        let (dx, dy) = self.delta_to(cell);
        dx.abs().max(dy.abs())
    }

    /// Minimum Manhattan distance from `cell` to any occupied cell
    pub fn manhattan_to(&self, cell: Cell) -> i32 {
        let (dx, dy) = self.delta_to(cell);
        dx.abs() + dy.abs()
    }

    /// Touching the rectangle, diagonals included, without overlapping it
    pub fn is_adjacent(&self, cell: Cell) -> bool {
        self.chebyshev_to(cell) == 1
    }
}

/// Distance used for range gates (never for pathfinding)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistanceMetric {
    Chebyshev,
    Manhattan,
    /// 3.5-edition optional rule: diagonals alternate 5 ft / 10 ft
    #[default]
    #[serde(rename = "dnd35")]
    #[strum(serialize = "dnd35")]
    Dnd35,
}

impl DistanceMetric {
    pub fn distance(self, a: Cell, b: Cell) -> i32 {
        match self {
            DistanceMetric::Chebyshev => a.chebyshev(b),
            DistanceMetric::Manhattan => a.manhattan(b),
            DistanceMetric::Dnd35 => dnd35_distance(a, b),
        }
    }

    pub fn in_range(self, a: Cell, b: Cell, range: i32) -> bool {
        self.distance(a, b) <= range
    }
}

/// Range in 5-ft squares: every pair of diagonals costs 15 ft, a leftover
/// diagonal 5 ft, straight squares 5 ft each.
pub fn dnd35_distance(a: Cell, b: Cell) -> i32 {
    let dx = (a.col - b.col).abs();
    let dy = (a.row - b.row).abs();
    let diagonals = dx.min(dy);
    let straight = (dx - dy).abs();
    let feet = 15 * (diagonals / 2) + 5 * (diagonals % 2) + 5 * straight;
    feet / 5
}

/// Identifies whoever is standing somewhere, so a mover can ignore itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    Player(PlayerId),
    Boss,
}

/// Passability contract consumed by pathing
pub trait Occupancy {
    /// Board is `grid_size × grid_size`
    fn grid_size(&self) -> i32;

    /// True if something other than `excluding` stands on (or walls off) the cell
    fn is_cell_blocked(&self, cell: Cell, excluding: Option<Occupant>) -> bool;

    fn in_bounds(&self, cell: Cell) -> bool {
        let n = self.grid_size();
        cell.col >= 1 && cell.row >= 1 && cell.col <= n && cell.row <= n
    }

    fn is_passable(&self, cell: Cell, excluding: Option<Occupant>) -> bool {
        self.in_bounds(cell) && !self.is_cell_blocked(cell, excluding)
    }
}

/// Static terrain of the encounter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    pub size: i32,
    /// Cells nobody may enter (rocks, walls)
    pub obstacles: HashSet<Cell>,
}

impl Board {
    pub fn new(size: i32) -> Self {
        Self {
            size,
            obstacles: HashSet::new(),
        }
    }

    pub fn with_obstacles(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.obstacles.extend(cells);
        self
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }
}

/// Terrain only, nobody standing anywhere
impl Occupancy for Board {
    fn grid_size(&self) -> i32 {
        self.size
    }

    fn is_cell_blocked(&self, cell: Cell, _excluding: Option<Occupant>) -> bool {
        self.is_obstacle(cell)
    }
}
