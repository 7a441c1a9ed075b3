//! Session random source
//!
//! Every random decision in a session goes through one seeded PCG stream.
//! Callers can queue forced rolls ahead of the stream to pin a probability
//! branch (operator tooling and tests).

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    inner: Pcg32,
    forced: VecDeque<f64>,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg32::seed_from_u64(seed),
            forced: VecDeque::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Queue rolls that will be returned before the seeded stream resumes
    pub fn force<I: IntoIterator<Item = f64>>(&mut self, rolls: I) {
        self.forced.extend(rolls);
    }

    /// Uniform roll in [0, 1)
    pub fn roll(&mut self) -> f64 {
        match self.forced.pop_front() {
            Some(value) => value,
            None => self.inner.random::<f64>(),
        }
    }

    /// `true` with probability `chance`
    pub fn chance(&mut self, chance: f64) -> bool {
        self.roll() < chance
    }

    /// Uniform index into a collection of `len` items (`len` must be non-zero)
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        ((self.roll() * len as f64) as usize).min(len.saturating_sub(1))
    }

    /// Pick one element uniformly
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.index(items.len());
        items.get(idx)
    }
}
