//! Random number generation for combat
//!
//! Wraps the shared LCG so every roll in an encounter is reproducible from its seed.

use core::fmt;

use crpg_rng::Lcg64;
use serde::{Deserialize, Serialize};

/// Game random number generator
///
/// The whole LCG state is serialized, so a restored generator continues the
/// exact sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameRng {
    rng: Lcg64,
}

impl GameRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Lcg64::new(seed),
        }
    }

    /// Get the seed used to create this RNG
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.rng.next_f64()
    }

    /// Integer in `[min, max]`
    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        self.rng.int(min, max)
    }

    /// Roll one die - returns 1..=sides
    ///
    /// Returns 0 if sides is 0.
    pub fn rnd(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        self.rng.int(1, i64::from(sides)) as u32
    }

    /// Roll a [`Die`]
    pub fn roll(&mut self, die: Die) -> u32 {
        self.rnd(die.sides)
    }

    /// Choose a random element from a slice
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.rng.choice(items)
    }

    /// Shuffle a slice in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        self.rng.shuffle(items);
    }

    /// Underlying generator, for callers that want `rand` trait methods
    pub fn inner_mut(&mut self) -> &mut Lcg64 {
        &mut self.rng
    }
}

/// A single die such as `d3` or `d6`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Die {
    pub sides: u32,
}

impl Die {
    pub const D3: Die = Die { sides: 3 };
    pub const D4: Die = Die { sides: 4 };
    pub const D6: Die = Die { sides: 6 };

    pub const fn new(sides: u32) -> Self {
        Self { sides }
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides)
    }
}
