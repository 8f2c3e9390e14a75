//! Otsu's method: maximize inter-class variance over a 256-bin histogram.

const BINS: usize = 256;

/// Compute Otsu's threshold from a flat sample of intensities.
///
/// The histogram spans the sample's own min..max, so the method is
/// insensitive to the absolute intensity scale. When `lo` / `hi` are
/// given, the result is clamped into the search bounds.
///
/// Degenerate samples follow the shared policy: fewer than 3 values
/// yields 0, a constant sample yields that constant.
pub fn otsu(samples: &[f64], lo: Option<f64>, hi: Option<f64>) -> f64 {
    if samples.len() < 3 {
        return 0.0;
    }
    let min_v = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max_v = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; BINS];
    let scale = BINS as f64 / (max_v - min_v);
    for &v in samples {
        let bin = (((v - min_v) * scale) as usize).min(BINS - 1);
        hist[bin] += 1;
    }

    let total = samples.len() as f64;
    let mut sum_total = 0f64;
    for (i, &h) in hist.iter().enumerate() {
        sum_total += i as f64 * h as f64;
    }

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_bin = 0usize;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_bin = t;
        }
    }

    let mut threshold = min_v + (best_bin as f64 + 0.5) / scale;
    if let Some(lo) = lo {
        threshold = threshold.max(lo);
    }
    if let Some(hi) = hi {
        threshold = threshold.min(hi);
    }
    threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_bimodal_sample() {
        let mut samples = vec![0.1; 50];
        samples.extend(vec![0.9; 50]);
        let t = otsu(&samples, None, None);
        assert!(t > 0.1 && t < 0.9, "t = {t}");
    }

    #[test]
    fn constant_sample_returns_constant() {
        assert_eq!(0.42, otsu(&[0.42; 10], None, None));
    }

    #[test]
    fn tiny_sample_returns_zero() {
        assert_eq!(0.0, otsu(&[0.3, 0.7], None, None));
        assert_eq!(0.0, otsu(&[], None, None));
    }

    #[test]
    fn result_respects_search_bounds() {
        let mut samples = vec![0.1; 50];
        samples.extend(vec![0.9; 50]);
        assert!(otsu(&samples, None, Some(0.2)) <= 0.2);
        assert!(otsu(&samples, Some(0.8), None) >= 0.8);
    }
}
