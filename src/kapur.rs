//! Kapur-Sahoo-Wong maximum-entropy threshold, adapted to log space.

use crate::noise::smooth_with_noise;

const BINS: usize = 256;
const DITHER_BITS: u32 = 8;

/// Threshold by the entropy of the split histograms.
///
/// The sample is dithered to break quantization ties, transformed with
/// `log2`, and binned into a 256-bin histogram. For every candidate
/// split the (negated) entropies of the two cumulative distributions
/// are summed; the best split maps back to the linear domain via `2^x`.
pub fn kapur_threshold(samples: &[f64]) -> f64 {
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

    let log_values: Vec<f64> = smooth_with_noise(samples, DITHER_BITS)
        .iter()
        .map(|&v| v.log2())
        .collect();
    let lo = log_values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = log_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        // Everything collapsed onto the dither floor.
        return lo.exp2();
    }

    let mut hist = [0u32; BINS];
    let scale = BINS as f64 / (hi - lo);
    for &x in &log_values {
        let bin = (((x - lo) * scale) as usize).min(BINS - 1);
        hist[bin] += 1;
    }

    // Drop empty bins, keeping each survivor's log-domain bin value.
    let mut probs = Vec::with_capacity(BINS);
    let mut bin_values = Vec::with_capacity(BINS);
    let total = samples.len() as f64;
    for (i, &h) in hist.iter().enumerate() {
        if h > 0 {
            probs.push(h as f64 / total);
            bin_values.push(lo + (hi - lo) * i as f64 / (BINS - 1) as f64);
        }
    }
    if bin_values.len() == 1 {
        return bin_values[0].exp2();
    }

    // Cumulative probability mass and entropy numerator per split.
    let mut cum_p = Vec::with_capacity(probs.len());
    let mut cum_e = Vec::with_capacity(probs.len());
    let mut p_acc = 0.0;
    let mut e_acc = 0.0;
    for &p in &probs {
        p_acc += p;
        e_acc += p * p.log2();
        cum_p.push(p_acc);
        cum_e.push(e_acc);
    }
    let total_p = p_acc;
    let total_e = e_acc;

    let mut best = 0usize;
    let mut best_entropy = f64::INFINITY;
    for k in 0..probs.len() - 1 {
        let lo_sum = cum_p[k];
        let hi_sum = total_p - lo_sum;
        let lo_entropy = cum_e[k] / lo_sum - lo_sum.log2();
        let hi_entropy = (total_e - cum_e[k]) / hi_sum - hi_sum.log2();
        let sum = lo_entropy + hi_entropy;
        // Singular splits (a side with no mass) are never selected.
        let sum = if sum.is_finite() { sum } else { f64::INFINITY };
        if sum < best_entropy {
            best_entropy = sum;
            best = k;
        }
    }

    ((bin_values[best] + bin_values[best + 1]) / 2.0).exp2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bimodal_sample() {
        let mut samples = vec![0.1; 50];
        samples.extend(vec![0.9; 50]);
        let t = kapur_threshold(&samples);
        assert!(t > 0.1 && t < 0.9, "t = {t}");
    }

    #[test]
    fn constant_sample_returns_constant() {
        assert_eq!(0.5, kapur_threshold(&[0.5; 20]));
        assert_eq!(0.125, kapur_threshold(&[0.125; 3]));
    }

    #[test]
    fn degenerate_samples() {
        assert_eq!(0.0, kapur_threshold(&[]));
        assert_eq!(0.0, kapur_threshold(&[0.2, 0.8]));
    }
}
