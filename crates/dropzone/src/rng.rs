//! Seeded random helpers shared by every engine.
//!
//! All randomness in a match or season flows through a single [`SimRng`], so a
//! run is fully reproducible from its seed. Unseeded construction still draws
//! and records a seed, which keeps any run replayable after the fact.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random source (`ChaCha8`) with the sampling helpers the
/// simulator needs.
///
/// # Example
///
/// ```
/// use dropzone::SimRng;
///
/// let mut a = SimRng::seeded(7);
/// let mut b = SimRng::seeded(7);
///
/// let items = [10, 20, 30, 40];
/// assert_eq!(a.pick(&items), b.pick(&items));
/// assert_eq!(a.weighted_sample(&[5, 1, 0, 3], 2), b.weighted_sample(&[5, 1, 0, 3], 2));
/// ```
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl SimRng {
    /// Creates a generator from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Creates a generator from an OS-random seed.
    ///
    /// The drawn seed is kept and available through [`SimRng::seed`].
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::seeded(rand::thread_rng().next_u64())
    }

    /// Returns the seed this generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws a raw 64-bit value (used to derive child seeds and tie-break keys).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Derives an independent child generator.
    ///
    /// The tournament engine gives every match its own child so a match can be
    /// replayed in isolation from its recorded seed.
    #[must_use]
    pub fn child(&mut self) -> Self {
        Self::seeded(self.next_u64())
    }

    /// Uniform index in `0..len`, or `None` when `len == 0`.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }

    /// Uniform pick from a slice, or `None` when it is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Returns true with probability `p`.
    ///
    /// `p` is clamped to `[0, 1]`; a non-finite probability never fires.
    pub fn chance(&mut self, p: f64) -> bool {
        if !p.is_finite() {
            return false;
        }
        self.inner.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform roll in `[0, 100)`.
    pub fn roll_percent(&mut self) -> f64 {
        self.inner.gen::<f64>() * 100.0
    }

    /// Uniform real in `[lo, hi]` (bounds may be given in either order).
    ///
    /// Returns `lo` when either bound is non-finite.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if !(lo.is_finite() && hi.is_finite()) {
            return lo;
        }
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        lo + self.inner.gen::<f64>() * (hi - lo)
    }

    /// Uniform integer in `lo..=hi` (bounds may be given in either order).
    pub fn range_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.inner.gen_range(lo..=hi)
    }

    /// Weighted sampling without replacement.
    ///
    /// Returns up to `count` distinct indices into `weights`, each drawn with
    /// probability proportional to its weight among the indices not yet drawn.
    /// Zero-weight entries are never drawn, so fewer than `count` indices come
    /// back when the positive-weight pool runs out.
    pub fn weighted_sample(&mut self, weights: &[u32], count: usize) -> Vec<usize> {
        let mut pool: Vec<(usize, u64)> = weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0)
            .map(|(i, w)| (i, u64::from(*w)))
            .collect();

        let mut drawn = Vec::with_capacity(count.min(pool.len()));
        while drawn.len() < count && !pool.is_empty() {
            let total: u64 = pool.iter().map(|(_, w)| *w).sum();
            let mut roll = self.inner.gen_range(0..total);
            let mut chosen = pool.len() - 1;
            for (slot, (_, weight)) in pool.iter().enumerate() {
                if roll < *weight {
                    chosen = slot;
                    break;
                }
                roll -= *weight;
            }
            drawn.push(pool.remove(chosen).0);
        }
        drawn
    }

    /// Single weighted pick, or `None` when no entry has positive weight.
    pub fn weighted_pick(&mut self, weights: &[u32]) -> Option<usize> {
        self.weighted_sample(weights, 1).first().copied()
    }
}
