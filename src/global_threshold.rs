//! Dispatch from [`Algorithm`] to the individual estimators.

use crate::background::{background_threshold, robust_background_threshold};
use crate::config::{Algorithm, ThresholdConfig};
use crate::kapur::kapur_threshold;
use crate::mog::mog_threshold;
use crate::otsu::otsu;
use crate::ridler_calvard::ridler_calvard_threshold;

/// Estimate a single threshold from a mask-filtered intensity sample.
///
/// The enum makes the dispatch total: unknown method names are rejected
/// when the configuration is parsed, never here. Degenerate samples
/// (empty, constant, or too small) produce each algorithm's documented
/// fallback instead of an error, so callers never special-case tiny or
/// uniform regions.
pub fn global_threshold(samples: &[f64], algorithm: Algorithm, config: &ThresholdConfig) -> f64 {
    match algorithm {
        Algorithm::Otsu => otsu(samples, Some(config.range.min), Some(config.range.max)),
        Algorithm::MoG => mog_threshold(samples, config.object_fraction),
        Algorithm::Background => background_threshold(samples),
        Algorithm::RobustBackground => robust_background_threshold(samples),
        Algorithm::RidlerCalvard => ridler_calvard_threshold(samples),
        Algorithm::Kapur => kapur_threshold(samples),
    }
}
