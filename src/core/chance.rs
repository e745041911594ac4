//! Chance: the single probabilistic trigger behind every effect
//!
//! All branching goes through [`Chance::fires`] and friends, so a seeded or
//! scripted source makes the whole scheduler deterministic under test.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Uniform source of randomness for effect selection.
pub trait Chance {
    /// Uniform sample in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// True with probability `p`.
    fn fires(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform index in `0..n`. `n` must be non-zero.
    fn pick(&mut self, n: usize) -> usize {
        let idx = (self.unit() * n as f64) as usize;
        idx.min(n.saturating_sub(1))
    }

    /// Uniform whole milliseconds in `[0, spread)`.
    fn jitter(&mut self, spread_ms: u64) -> u64 {
        (self.unit() * spread_ms as f64) as u64
    }
}

/// `rand`-backed chance source.
pub struct RandChance<R: Rng> {
    rng: R,
}

impl RandChance<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }
}

impl<R: Rng> RandChance<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Chance for RandChance<R> {
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Chance source with a fixed trigger verdict and a scripted sample queue.
///
/// `fires` answers with the configured verdict regardless of `p`. Samples
/// come from the queue in order, then fall back to the constant `rest`.
#[derive(Debug, Clone)]
pub struct FixedChance {
    verdict: bool,
    samples: VecDeque<f64>,
    rest: f64,
}

impl FixedChance {
    /// Every trigger passes, every sample is `0.0`.
    pub fn always() -> Self {
        Self { verdict: true, samples: VecDeque::new(), rest: 0.0 }
    }

    /// No trigger passes, every sample is `0.0`.
    pub fn never() -> Self {
        Self { verdict: false, samples: VecDeque::new(), rest: 0.0 }
    }

    pub fn with_samples(mut self, samples: impl IntoIterator<Item = f64>) -> Self {
        self.samples.extend(samples);
        self
    }

    pub fn with_rest(mut self, rest: f64) -> Self {
        self.rest = rest;
        self
    }
}

impl Chance for FixedChance {
    fn unit(&mut self) -> f64 {
        self.samples.pop_front().unwrap_or(self.rest)
    }

    fn fires(&mut self, _p: f64) -> bool {
        self.verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_is_repeatable() {
        let mut a = RandChance::seeded(7);
        let mut b = RandChance::seeded(7);
        for _ in 0..32 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn pick_stays_in_range() {
        let mut chance = FixedChance::never().with_rest(0.999_999_999);
        assert_eq!(chance.pick(6), 5);
        let mut chance = FixedChance::never();
        assert_eq!(chance.pick(6), 0);
    }

    #[test]
    fn jitter_is_bounded() {
        let mut chance = RandChance::seeded(1);
        for _ in 0..1000 {
            assert!(chance.jitter(4000) < 4000);
        }
    }

    #[test]
    fn fires_tracks_probability() {
        let mut chance = RandChance::seeded(42);
        let hits = (0..100_000).filter(|_| chance.fires(0.05)).count();
        assert!((4_000..6_000).contains(&hits), "hits = {hits}");
    }

    #[test]
    fn fixed_plays_script_then_rest() {
        let mut chance = FixedChance::always().with_samples([0.25, 0.5]).with_rest(0.75);
        assert_eq!(chance.unit(), 0.25);
        assert_eq!(chance.unit(), 0.5);
        assert_eq!(chance.unit(), 0.75);
        assert!(chance.fires(0.0));
    }
}
