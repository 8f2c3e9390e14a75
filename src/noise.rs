//! Dithering noise used to break quantization ties before log transforms.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Perturb each value by uniform noise of half a quantization step at
/// the given bit depth, flooring the result at one step so downstream
/// `log2` stays finite.
///
/// The RNG is seeded with a fixed value, so the dither is deterministic
/// across runs.
pub fn smooth_with_noise(values: &[f64], bits: u32) -> Vec<f64> {
    let delta = 2f64.powi(-(bits as i32));
    let mut rng = StdRng::seed_from_u64(0);
    values
        .iter()
        .map(|&v| (v + rng.gen_range(-0.5..0.5) * delta).max(delta))
        .collect()
}
