//! Random sources for the telemetry simulator.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of uniformly distributed noise.
pub trait NoiseSource {
    /// Draw a value from `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

impl<N: NoiseSource + ?Sized> NoiseSource for &mut N {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }
}

/// Noise backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngNoise<R> {
    rng: R,
}

impl<R: Rng> RngNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngNoise<StdRng> {
    /// Reproducible noise for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> NoiseSource for RngNoise<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Always returns the midpoint of the requested range, which makes every
/// multiplicative draw 1.0 and every symmetric offset 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralNoise;

impl NoiseSource for NeutralNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (low + high) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_noise_returns_midpoint() {
        let mut noise = NeutralNoise;
        assert_eq!(noise.uniform(0.8, 1.2), 1.0);
        assert_eq!(noise.uniform(-1.0, 1.0), 0.0);
    }

    #[test]
    fn test_rng_noise_stays_in_range() {
        let mut noise = RngNoise::seeded(7);
        for _ in 0..1_000 {
            let v = noise.uniform(0.8, 1.2);
            assert!((0.8..=1.2).contains(&v));
        }
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let mut a = RngNoise::seeded(42);
        let mut b = RngNoise::seeded(42);
        let xs: Vec<f64> = (0..16).map(|_| a.uniform(-1.0, 1.0)).collect();
        let ys: Vec<f64> = (0..16).map(|_| b.uniform(-1.0, 1.0)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_degenerate_range() {
        let mut noise = RngNoise::seeded(1);
        assert_eq!(noise.uniform(3.0, 3.0), 3.0);
    }
}
