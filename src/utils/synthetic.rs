//! Reproducible synthetic problems for the experiment runners.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Draws `n` points uniformly from the unit cube `[0, 1]^dim`.
///
/// A fixed `seed` makes every run see the same point set.
pub fn random_points(n: usize, dim: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.random::<f64>()).collect())
        .collect()
}

/// The Gaussian (squared exponential) kernel `exp(-‖x − y‖² / (2ℓ²))`.
///
/// Its diagonal is 1, so the initial trace over `n` points is exactly `n`.
pub fn gaussian_kernel(x: &[f64], y: &[f64], length_scale: f64) -> f64 {
    let squared_distance: f64 = x.iter().zip(y).map(|(a, b)| (a - b) * (a - b)).sum();
    (-squared_distance / (2.0 * length_scale * length_scale)).exp()
}
