//! Quality metrics for comparing threshold choices.
//!
//! Both metrics score how well a candidate threshold separates the
//! masked pixels into foreground and background, working on the same
//! clamped log-domain representation the estimators use. They depend
//! only on the multiset of intensities and the mask/threshold partition,
//! not on pixel layout.

use crate::engine::Threshold;
use crate::grid::{Image, Mask};
use crate::noise::smooth_with_noise;

const BINS: usize = 256;
const DITHER_BITS: u32 = 8;

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Pixel-count-weighted average of the log2-domain variances of the
/// foreground (>= threshold) and background (< threshold) classes.
///
/// Lower is better: a good threshold leaves both classes tight. Returns
/// 0 for an empty mask or an all-zero image; if one class is empty, the
/// other class's variance is returned alone.
pub fn weighted_variance(image: &Image, mask: &Mask, threshold: &Threshold) -> f64 {
    if !mask.any() {
        return 0.0;
    }
    let max_v = image
        .data()
        .iter()
        .zip(mask.data())
        .filter_map(|(&v, &m)| m.then_some(v))
        .fold(f64::NEG_INFINITY, f64::max);
    // Clamp the foreground dynamic range to 256:1.
    let floor = max_v / 256.0;
    if floor == 0.0 {
        return 0.0;
    }

    let mut foreground = Vec::new();
    let mut background = Vec::new();
    for (i, (&v, &m)) in image.data().iter().zip(mask.data()).enumerate() {
        if !m {
            continue;
        }
        let v = v.max(floor);
        if v >= threshold.at(i) {
            foreground.push(v.log2());
        } else {
            background.push(v.log2());
        }
    }

    let nfg = foreground.len();
    let nbg = background.len();
    if nfg == 0 {
        population_variance(&background)
    } else if nbg == 0 {
        population_variance(&foreground)
    } else {
        (population_variance(&foreground) * nfg as f64
            + population_variance(&background) * nbg as f64)
            / (nfg + nbg) as f64
    }
}

fn side_entropy(logs: &[f64], lower: f64, upper: f64) -> f64 {
    let mut hist = [0u32; BINS];
    let scale = BINS as f64 / (upper - lower);
    for &x in logs {
        let bin = (((x - lower) * scale) as usize).min(BINS - 1);
        hist[bin] += 1;
    }
    let counts: Vec<u32> = hist.iter().copied().filter(|&h| h > 0).collect();
    // An entirely empty side contributes a single-bin histogram of 1,
    // i.e. zero entropy.
    if counts.is_empty() {
        return 0.0;
    }
    let total: f64 = counts.iter().map(|&h| h as f64).sum();
    counts
        .iter()
        .map(|&h| {
            let p = h as f64 / total;
            p * p.log2()
        })
        .sum()
}

/// Sum of the log2-domain entropies of the foreground and background
/// histograms. More negative means sharper separation.
///
/// Returns 0 for an empty mask or all-zero image, and `log2(pixel
/// count)` when the masked image is a single repeated value.
pub fn sum_of_entropies(image: &Image, mask: &Mask, threshold: &Threshold) -> f64 {
    if !mask.any() {
        return 0.0;
    }
    let max_v = image
        .data()
        .iter()
        .zip(mask.data())
        .filter_map(|(&v, &m)| m.then_some(v))
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = max_v / 256.0;
    if floor == 0.0 {
        return 0.0;
    }

    // Clamped working copy of the whole image, paired with the per-pixel
    // threshold and mask bit, put into a canonical order so the dither
    // depends only on the multiset of values.
    let mut pixels: Vec<(f64, f64, bool)> = image
        .data()
        .iter()
        .enumerate()
        .map(|(i, &v)| (v.max(floor), threshold.at(i), mask.data()[i]))
        .collect();
    pixels.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    let masked_min = pixels
        .iter()
        .filter_map(|&(v, _, m)| m.then_some(v))
        .fold(f64::INFINITY, f64::min);
    if masked_min == max_v {
        // Single unique value: the split is meaningless, report the
        // entropy of the flat distribution.
        return (mask.count() as f64).log2();
    }

    let values: Vec<f64> = pixels.iter().map(|&(v, _, _)| v).collect();
    let smoothed = smooth_with_noise(&values, DITHER_BITS);

    let lower = smoothed
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
        .log2();
    let upper = smoothed
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
        .log2();
    if lower == upper {
        return (mask.count() as f64).log2();
    }

    let mut fg_logs = Vec::new();
    let mut bg_logs = Vec::new();
    for (&(_, t, m), &v) in pixels.iter().zip(&smoothed) {
        if !m {
            continue;
        }
        if v >= t {
            fg_logs.push(v.log2());
        } else {
            bg_logs.push(v.log2());
        }
    }

    side_entropy(&fg_logs, lower, upper) + side_entropy(&bg_logs, lower, upper)
}
