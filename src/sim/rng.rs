//! Seeded Park-Miller random stream
//!
//! A level is regenerated from nothing but its seed, so this generator must
//! produce the same sequence everywhere: multiplicative LCG with modulus
//! `2^31 - 1` and multiplier `16807`.

use serde::{Deserialize, Serialize};

/// Park-Miller modulus (`2^31 - 1`)
pub const MODULUS: u64 = 2_147_483_647;
/// Park-Miller multiplier
pub const MULTIPLIER: u64 = 16_807;

/// Source of uniform floats in `[0, 1)` consumed by the level generator.
///
/// The generator only needs a stream of draws; tests plug in scripted
/// sources to force particular branches.
pub trait RandomSource {
    /// Next value in `[0, 1)`
    fn next(&mut self) -> f64;

    /// Next value as `f32`, for geometry
    #[inline]
    fn next_f32(&mut self) -> f32 {
        self.next() as f32
    }

    /// Uniform value in `[min, min + span)`
    #[inline]
    fn span(&mut self, min: f32, span: f32) -> f32 {
        min + self.next_f32() * span
    }

    /// `-1.0` or `1.0` with equal probability
    #[inline]
    fn sign(&mut self) -> f32 {
        if self.next() < 0.5 { -1.0 } else { 1.0 }
    }
}

/// Deterministic multiplicative LCG
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkMiller {
    state: u64,
}

impl ParkMiller {
    /// Create a stream from any integer seed.
    ///
    /// The seed is reduced modulo `2^31 - 1` and non-positive residues are
    /// shifted into `[1, 2^31 - 2]`, so every input yields a valid state.
    pub fn new(seed: i64) -> Self {
        Self {
            state: normalize_seed(seed) as u64,
        }
    }

    /// Current internal state
    pub fn state(&self) -> u32 {
        self.state as u32
    }
}

impl RandomSource for ParkMiller {
    #[inline]
    fn next(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER) % MODULUS;
        self.state as f64 / MODULUS as f64
    }
}

/// Reduce an arbitrary integer into the valid state range `[1, 2^31 - 2]`
pub fn normalize_seed(seed: i64) -> u32 {
    let m = MODULUS as i64;
    let mut s = seed % m;
    if s <= 0 {
        s += m - 1;
    }
    // seed % m == 0 lands on m - 1, which is still a legal state
    s.clamp(1, m - 1) as u32
}
