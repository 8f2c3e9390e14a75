//! Mixture-of-Gaussians threshold.
//!
//! Fits three Gaussian classes (background, intermediate, object) to the
//! intensity sample with EM, decides whether the intermediate class is
//! background- or object-like by comparing accumulated priors against
//! the caller's object fraction, and places the threshold where the
//! background and object densities cross.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Subsample cap; larger samples are randomly thinned for cost control.
const MAX_SAMPLE: usize = 512 * 512;
const CLASS_COUNT: usize = 3;
const EM_TOLERANCE: f64 = 1e-3;
/// Safety cap; the loop normally exits on the tolerance.
const MAX_EM_ITERATIONS: usize = 100;
/// Resolution of the density-crossing scan between the class means.
const CROSSING_DIVISIONS: usize = 10_000;
const NORMALIZER_EPS: f64 = 1e-12;
const STD_FLOOR: f64 = 1e-6;

fn gaussian_pdf(x: f64, mean: f64, std: f64) -> f64 {
    let z = (x - mean) / std;
    (-0.5 * z * z).exp() / (std * (2.0 * std::f64::consts::PI).sqrt())
}

/// Estimate a threshold by 3-class Gaussian-mixture EM.
///
/// `object_fraction` is the prior estimate of the fraction of pixels
/// belonging to objects, in (0, 1). Samples too small to trim safely
/// return 1.0; constant samples return the constant.
pub fn mog_threshold(samples: &[f64], object_fraction: f64) -> f64 {
    let background_fraction = 1.0 - object_fraction;
    if samples.is_empty() {
        return 1.0;
    }
    let min_v = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max_v = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min_v == max_v {
        return min_v;
    }
    // The 1% tails are chopped below; refuse samples where that would
    // leave nothing of the rarer class.
    if (samples.len() as f64) < 3.0 / object_fraction.min(background_fraction) {
        return 1.0;
    }

    let mut data = samples.to_vec();
    if data.len() > MAX_SAMPLE {
        let mut rng = StdRng::seed_from_u64(0);
        data.shuffle(&mut rng);
        data.truncate(MAX_SAMPLE);
    }
    data.sort_by(f64::total_cmp);

    // Trim 1% from each tail against quantization pile-ups at 0 and 1.
    let one_percent = (data.len() + 99) / 100;
    let data = &data[one_percent..data.len() - one_percent];
    let pixel_count = data.len() as f64;

    // Initial class means from the background/object quantiles, with the
    // intermediate class at their midpoint.
    let quantile = |q: f64| data[((pixel_count * q).round() as usize).min(data.len() - 1)];
    let bg_pixel = quantile(background_fraction / 2.0);
    let fg_pixel = quantile(1.0 - object_fraction / 2.0);
    let mut class_mean = [bg_pixel, (bg_pixel + fg_pixel) / 2.0, fg_pixel];
    let mut class_std = [0.15f64; CLASS_COUNT];
    // The intermediate class steals prior mass from both ends.
    let mut class_prob = [
        0.75 * background_fraction,
        0.25,
        0.75 * object_fraction,
    ];

    let mut responsibilities = vec![[0.0f64; CLASS_COUNT]; data.len()];
    for iteration in 0..MAX_EM_ITERATIONS {
        let old_mean = class_mean;

        // E-step: posterior responsibility of each class per pixel.
        for (resp, &x) in responsibilities.iter_mut().zip(data.iter()) {
            for k in 0..CLASS_COUNT {
                resp[k] = class_prob[k] * gaussian_pdf(x, class_mean[k], class_std[k]);
            }
            let normalizer: f64 = resp.iter().sum::<f64>() + NORMALIZER_EPS;
            for r in resp.iter_mut() {
                *r /= normalizer;
            }
        }

        // M-step: update prior, mean and std per class.
        for k in 0..CLASS_COUNT {
            let resp_sum: f64 = responsibilities.iter().map(|r| r[k]).sum();
            class_prob[k] = resp_sum / pixel_count;
            class_mean[k] = responsibilities
                .iter()
                .zip(data.iter())
                .map(|(r, &x)| r[k] * x)
                .sum::<f64>()
                / (resp_sum + NORMALIZER_EPS);
            class_std[k] = (responsibilities
                .iter()
                .zip(data.iter())
                .map(|(r, &x)| r[k] * (x - class_mean[k]) * (x - class_mean[k]))
                .sum::<f64>()
                / (resp_sum + NORMALIZER_EPS))
                .sqrt()
                + STD_FLOOR;
        }

        let delta: f64 = old_mean
            .iter()
            .zip(class_mean.iter())
            .map(|(o, n)| (o - n).abs())
            .sum();
        if delta <= EM_TOLERANCE {
            debug!("MoG EM converged after {} iterations", iteration + 1);
            break;
        }
    }

    // Decide whether the intermediate class models background or object
    // pixels: pick the grouping whose total prior best matches the
    // requested object fraction.
    let intermediate_is_object = (class_prob[1] + class_prob[2] - object_fraction).abs()
        < (class_prob[2] - object_fraction).abs();

    // Scan for the abscissa where the background and object densities
    // cross, between the background and object means.
    let step = (class_mean[2] - class_mean[0]) / CROSSING_DIVISIONS as f64;
    let mut best_level = class_mean[0];
    let mut best_gap = f64::INFINITY;
    for i in 0..CROSSING_DIVISIONS {
        let level = class_mean[0] + i as f64 * step;
        let density =
            |k: usize| class_prob[k] * gaussian_pdf(level, class_mean[k], class_std[k]);
        let (background, object) = if intermediate_is_object {
            (density(0), density(1) + density(2))
        } else {
            (density(0) + density(1), density(2))
        };
        let gap = (background - object).abs();
        if gap < best_gap {
            best_gap = gap;
            best_level = level;
        }
    }
    best_level
}
