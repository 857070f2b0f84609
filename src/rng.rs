//! Random number source abstraction.
//!
//! Specialized to `i64` rather than kept fully generic over `T`: every
//! draw in this crate ultimately produces a die value, so a generic
//! `choose_one<T>` would only add an unused type parameter.

/// A source of random draws a dice evaluation can be seeded with.
///
/// Implementors need only produce uniformly-distributed values; the
/// evaluator is responsible for everything else (budget accounting,
/// rerolling, sorting).
pub trait Rng {
    /// Draw uniformly from `[lo, hi]` inclusive. Callers always ensure `lo <= hi`.
    fn uniform_inclusive(&mut self, lo: i64, hi: i64) -> i64;

    /// Draw uniformly (with replacement) from a non-empty slice. Callers
    /// always ensure `items` is non-empty.
    fn choose_one(&mut self, items: &[i64]) -> i64;
}

/// Default production [`Rng`], backed by `nanorand`'s `WyRand` — the same
/// generator the teacher crate already depends on and draws from via
/// `nanorand::tls_rng()`, generalized here to be explicitly seedable.
#[derive(Debug)]
pub struct WyRng {
    inner: nanorand::WyRand,
}

impl WyRng {
    /// Seed a new generator deterministically.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { inner: nanorand::WyRand::new_seed(seed) }
    }

    /// Seed a new generator from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self { inner: nanorand::WyRand::new() }
    }
}

impl Rng for WyRng {
    fn uniform_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        use nanorand::Rng as _;
        let span = (hi - lo) as u64;
        lo + self.inner.generate_range(0..=span) as i64
    }

    fn choose_one(&mut self, items: &[i64]) -> i64 {
        use nanorand::Rng as _;
        let idx = self.inner.generate_range(0..items.len());
        items[idx]
    }
}

/// Wraps another [`Rng`] and records how many calls were made to it.
///
/// Used to verify that the `rng_count` an evaluation reports matches the
/// number of draws actually performed (the RNG-accounting property).
#[derive(Debug)]
pub struct CountingRng<R> {
    inner: R,
    calls: u64,
}

impl<R: Rng> CountingRng<R> {
    /// Wrap `inner`, starting the call counter at zero.
    pub const fn new(inner: R) -> Self {
        Self { inner, calls: 0 }
    }

    /// Number of draws performed through this wrapper so far.
    #[must_use]
    pub const fn calls(&self) -> u64 {
        self.calls
    }
}

impl<R: Rng> Rng for CountingRng<R> {
    fn uniform_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        self.calls += 1;
        self.inner.uniform_inclusive(lo, hi)
    }

    fn choose_one(&mut self, items: &[i64]) -> i64 {
        self.calls += 1;
        self.inner.choose_one(items)
    }
}

#[cfg(test)]
pub(crate) use test_support::ScriptedRng;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_rng_counts_every_draw() {
        let mut rng = CountingRng::new(ScriptedRng::new([3, 4, 5]));
        assert_eq!(rng.uniform_inclusive(1, 6), 3);
        assert_eq!(rng.choose_one(&[4, 9]), 4);
        assert_eq!(rng.uniform_inclusive(1, 6), 5);
        assert_eq!(rng.calls(), 3);
    }

    #[test]
    fn wyrng_stays_in_range() {
        let mut rng = WyRng::new(42);
        for _ in 0..200 {
            let v = rng.uniform_inclusive(1, 6);
            assert!((1..=6).contains(&v));
        }
    }
}
