//! 64-bit linear congruential generator
//!
//! Every random decision in a combat (initiative, tiebreaks, movement dice,
//! deck shuffles) draws from one of these. The multiplier and increment are
//! Knuth's MMIX constants; floats are built from the top 53 bits of the state
//! so a given seed and call sequence always produce the same numbers.

use rand::{Error, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Scale for turning 53 bits of state into a float in [0, 1)
const F64_SCALE: f64 = (1u64 << 53) as f64;

/// An RNG call trace entry for debugging divergences between two runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RngTraceEntry {
    /// Sequence number (0-indexed)
    pub seq: u64,
    /// Function name (e.g. "int", "next_f64")
    pub func: &'static str,
    /// Raw state after the step
    pub raw: u64,
}

/// Deterministic LCG context
#[derive(Clone, Serialize, Deserialize)]
pub struct Lcg64 {
    /// Current generator state
    state: u64,
    /// Seed the generator was created with
    seed: u64,
    /// Total number of steps taken (for tracing)
    call_count: u64,
    /// If true, record all calls into trace log
    #[serde(skip)]
    tracing: bool,
    /// Trace log (only populated when tracing is true)
    #[serde(skip)]
    trace: Vec<RngTraceEntry>,
}

impl core::fmt::Debug for Lcg64 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Lcg64")
            .field("state", &self.state)
            .field("seed", &self.seed)
            .field("call_count", &self.call_count)
            .finish()
    }
}

impl Lcg64 {
    /// Create a generator whose initial state is the seed itself.
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed,
            seed,
            call_count: 0,
            tracing: false,
            trace: Vec::new(),
        }
    }

    /// Seed the generator was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Advance the state once and return it.
    #[inline]
    pub fn step(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.call_count += 1;
        self.state
    }

    fn record(&mut self, func: &'static str) {
        if self.tracing {
            self.trace.push(RngTraceEntry {
                seq: self.call_count - 1,
                func,
                raw: self.state,
            });
        }
    }

    /// Float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        let raw = self.step();
        self.record("next_f64");
        (raw >> 11) as f64 / F64_SCALE
    }

    /// Integer in `[min, max]`, both inclusive.
    ///
    /// Returns `min` when the range is empty or inverted.
    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let value = (self.next_f64() * span).floor() as i64 + min;
        self.record("int");
        value
    }

    /// Pick an element uniformly. `None` on an empty slice.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.int(0, items.len() as i64 - 1) as usize;
        items.get(idx)
    }

    /// Fisher-Yates shuffle in place, walking from the back.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64).floor() as usize;
            items.swap(i, j);
        }
    }

    /// Start recording every call.
    pub fn enable_tracing(&mut self) {
        self.tracing = true;
    }

    /// Stop recording and drop the log.
    pub fn disable_tracing(&mut self) {
        self.tracing = false;
        self.trace.clear();
    }

    /// Recorded calls since tracing was enabled
    pub fn trace(&self) -> &[RngTraceEntry] {
        &self.trace
    }

    /// Total number of state steps taken
    pub fn call_count(&self) -> u64 {
        self.call_count
    }
}

impl Default for Lcg64 {
    fn default() -> Self {
        Self::new(123_456_789)
    }
}

impl RngCore for Lcg64 {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Lcg64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Lcg64::new(42);
        let mut b = Lcg64::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_first_step_matches_formula() {
        let mut rng = Lcg64::new(1);
        let expected = LCG_MULTIPLIER.wrapping_add(LCG_INCREMENT);
        assert_eq!(rng.step(), expected);
    }

    #[test]
    fn test_next_f64_bounds() {
        let mut rng = Lcg64::new(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_int_inclusive_bounds() {
        let mut rng = Lcg64::new(99);
        let mut seen = [false; 4];
        for _ in 0..500 {
            let v = rng.int(1, 4);
            assert!((1..=4).contains(&v));
            seen[(v - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_int_degenerate_range() {
        let mut rng = Lcg64::new(5);
        assert_eq!(rng.int(3, 3), 3);
        assert_eq!(rng.int(8, 2), 8);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = Lcg64::new(2024);
        let mut items: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_choice_empty() {
        let mut rng = Lcg64::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.choice(&empty).is_none());
        assert_eq!(rng.choice(&[9]), Some(&9));
    }

    #[test]
    fn test_tracing_records_calls() {
        let mut rng = Lcg64::new(3);
        rng.enable_tracing();
        rng.next_f64();
        rng.int(1, 6);
        let funcs: Vec<_> = rng.trace().iter().map(|t| t.func).collect();
        assert_eq!(funcs, vec!["next_f64", "next_f64", "int"]);
        rng.disable_tracing();
        assert!(rng.trace().is_empty());
    }

    #[test]
    fn test_seedable_matches_new() {
        let mut a = Lcg64::seed_from_u64(77);
        let mut b = Lcg64::new(77);
        assert_eq!(a.next_u64(), b.next_u64());
        let mut c = Lcg64::from_seed(77u64.to_le_bytes());
        let mut d = Lcg64::new(77);
        assert_eq!(c.next_u32(), d.next_u32());
    }

    #[test]
    fn test_fill_bytes_partial_chunk() {
        let mut rng = Lcg64::new(8);
        let mut buf = [0u8; 11];
        rng.fill_bytes(&mut buf);
        assert_eq!(rng.call_count(), 2);
    }
}
