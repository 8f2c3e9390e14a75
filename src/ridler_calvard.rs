//! Ridler-Calvard iterative threshold selection, run in log space.
//!
//! Reference: T. Ridler and S. Calvard, "Picture Thresholding Using an
//! Iterative Selection Method", IEEE Trans. SMC 8(8), 1978.

use crate::otsu::otsu;

const TOLERANCE: f64 = 1e-5;
/// Safety cap; the iteration normally exits on the tolerance.
const MAX_ITERATIONS: usize = 100;

/// Threshold by iterated bisection of the below/above class means.
///
/// The sample's dynamic range is limited to 256:1 before the log
/// transform so near-zero pixels cannot dominate, and the iteration is
/// seeded with Otsu's threshold on the log-normalized values.
pub fn ridler_calvard_threshold(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let min_v = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max_v = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min_v == max_v {
        return min_v;
    }
    if samples.len() < 3 {
        return 0.0;
    }

    let floor = max_v / 256.0;
    let logs: Vec<f64> = samples.iter().map(|&v| v.max(floor).ln()).collect();
    let lo = logs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        // Every value sat below the floor.
        return lo.exp();
    }
    let normalized: Vec<f64> = logs.iter().map(|&l| (l - lo) / (hi - lo)).collect();

    let mut threshold = otsu(&normalized, None, None);
    let mut previous = 0.0f64;
    for _ in 0..MAX_ITERATIONS {
        if (previous - threshold).abs() <= TOLERANCE {
            break;
        }
        previous = threshold;
        let mut low_sum = 0.0;
        let mut low_n = 0usize;
        let mut high_sum = 0.0;
        let mut high_n = 0usize;
        for &v in &normalized {
            if v < previous {
                low_sum += v;
                low_n += 1;
            } else {
                high_sum += v;
                high_n += 1;
            }
        }
        threshold = match (low_n, high_n) {
            (0, _) => high_sum / high_n as f64,
            (_, 0) => low_sum / low_n as f64,
            _ => (low_sum / low_n as f64 + high_sum / high_n as f64) / 2.0,
        };
    }

    (lo + (hi - lo) * threshold).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn bimodal_sample_yields_log_midpoint() {
        let mut samples = vec![0.1; 50];
        samples.extend(vec![0.9; 50]);
        // The iteration settles on the midpoint of the two log-space
        // classes, which maps back to the geometric mean.
        assert_abs_diff_eq!(
            ridler_calvard_threshold(&samples),
            (0.1f64 * 0.9).sqrt(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn threshold_lies_between_the_modes() {
        let mut samples = Vec::new();
        for i in 0..100 {
            samples.push(0.05 + 0.001 * (i % 7) as f64);
        }
        for i in 0..40 {
            samples.push(0.6 + 0.01 * (i % 5) as f64);
        }
        let t = ridler_calvard_threshold(&samples);
        assert!(t > 0.06 && t < 0.6, "t = {t}");
    }

    #[test]
    fn degenerate_samples() {
        assert_eq!(0.0, ridler_calvard_threshold(&[]));
        assert_eq!(0.25, ridler_calvard_threshold(&[0.25; 5]));
        assert_eq!(0.0, ridler_calvard_threshold(&[0.2, 0.4]));
    }
}
