//! Seeded random source for lane picks and probabilistic note decisions.
//!
//! One `NoteRng` is created per generation call. Every draw the generator
//! makes goes through it in a fixed order, so the same identity string and
//! parameters always reproduce the same beatmap.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hash of `identity`.
///
/// Unlike `std::hash::DefaultHasher` this is stable across toolchains and
/// processes, so persisted beatmaps can be regenerated later.
pub fn stable_hash(identity: &str) -> u64 {
    identity.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

pub struct NoteRng {
    inner: StdRng,
}

impl NoteRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_identity(identity: &str) -> Self {
        Self::from_seed(stable_hash(identity))
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform index in `[0, upper)`. `upper` must be non-zero.
    pub fn next_index(&mut self, upper: usize) -> usize {
        self.inner.gen_range(0..upper)
    }
}
