//! Background estimators: histogram mode and robust trimmed statistics.

/// Saturated pixels are excluded from the mode histogram.
const SATURATION_MIN: f64 = 0.02;
const SATURATION_MAX: f64 = 0.98;
const BINS: usize = 256;

/// Mode-based background threshold: twice the modal bin center of a
/// 256-bin histogram over the unsaturated intensities.
///
/// The factor of 2 is empirical; callers tune it further through the
/// engine's correction factor.
pub fn background_threshold(samples: &[f64]) -> f64 {
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

    let mut hist = [0u32; BINS];
    let mut kept = 0usize;
    for &v in samples {
        if v > SATURATION_MIN && v < SATURATION_MAX {
            let bin = ((v * BINS as f64) as usize).min(BINS - 1);
            hist[bin] += 1;
            kept += 1;
        }
    }
    if kept == 0 {
        return 0.0;
    }

    let mode = hist
        .iter()
        .enumerate()
        .max_by_key(|&(i, &h)| (h, std::cmp::Reverse(i)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let cutoff = mode as f64 / (BINS - 1) as f64;
    cutoff * 2.0
}

/// Robust background threshold: drop the lowest and highest 5% of the
/// sample, then return mean + 2 standard deviations of the remainder.
pub fn robust_background_threshold(samples: &[f64]) -> f64 {
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

    let mut data = samples.to_vec();
    data.sort_by(f64::total_cmp);
    let chop = (data.len() as f64 * 0.05).round() as usize;
    // Skip the trim when it would leave nothing to measure.
    let data = if chop > 0 && 2 * chop < data.len() {
        &data[chop..data.len() - chop]
    } else {
        &data[..]
    };

    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
    mean + 2.0 * variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mode_threshold_is_twice_the_modal_bin() {
        // Dominant value 0.25, some spread elsewhere.
        let mut samples = vec![0.25; 100];
        samples.extend([0.5, 0.6, 0.7, 0.8]);
        let t = background_threshold(&samples);
        // Bin 64 of 256 over [0,1] -> cutoff 64/255, doubled.
        assert_abs_diff_eq!(t, 2.0 * 64.0 / 255.0, epsilon = 1e-12);
    }

    #[test]
    fn mode_threshold_ignores_saturated_pixels() {
        // All pixels saturated: nothing left to histogram.
        let samples = [0.0, 0.01, 0.99, 1.0, 1.0];
        assert_eq!(0.0, background_threshold(&samples));
    }

    #[test]
    fn robust_threshold_trims_outliers() {
        // 100 background pixels at 0.1 with one hot outlier; the trim
        // removes the outlier entirely, leaving a tight distribution.
        let mut samples = vec![0.1; 99];
        samples.push(10.0);
        let t = robust_background_threshold(&samples);
        assert_abs_diff_eq!(t, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn robust_threshold_is_mean_plus_two_sigma() {
        // Small sample: 5% rounds to 0, so no trimming takes place.
        let samples = [0.1, 0.2, 0.3];
        let mean = 0.2;
        let sd = (((0.1f64 - mean).powi(2) + 0.0 + (0.3f64 - mean).powi(2)) / 3.0).sqrt();
        assert_abs_diff_eq!(
            robust_background_threshold(&samples),
            mean + 2.0 * sd,
            epsilon = 1e-12
        );
    }

    #[test]
    fn degenerate_samples() {
        assert_eq!(0.0, background_threshold(&[]));
        assert_eq!(0.5, background_threshold(&[0.5; 4]));
        assert_eq!(0.0, background_threshold(&[0.1, 0.2]));
        assert_eq!(0.0, robust_background_threshold(&[]));
        assert_eq!(0.5, robust_background_threshold(&[0.5; 4]));
        assert_eq!(0.0, robust_background_threshold(&[0.1, 0.2]));
    }
}
