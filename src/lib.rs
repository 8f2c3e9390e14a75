//! Intensity-thresholding engine for segmentation pipelines.
//!
//! Given a grayscale image normalized to [0, 1], an optional mask and an
//! optional object label matrix, the engine estimates one or more
//! thresholds separating foreground from background. Six global
//! estimators are provided (Otsu, mixture-of-Gaussians EM, mode-based
//! background, robust background, Ridler-Calvard, Kapur entropy), each
//! of which can be applied globally, per adaptive block, or per labeled
//! object. Two quality metrics score candidate thresholds for callers
//! that auto-select among algorithms.
//!
//! This crate does *not* decode images, extract objects from a
//! threshold, or persist anything. Callers hand it well-typed arrays and
//! take back thresholds (or recorded measurements).
//!
//! ```
//! use cyto_thresh::{compute, Image, ThresholdConfig, ThresholdMethod};
//!
//! let image = Image::from_vec(4, 4, (0..16).map(|i| i as f64 / 15.0).collect()).unwrap();
//! let config = ThresholdConfig {
//!     method: ThresholdMethod::parse("Otsu Global").unwrap(),
//!     ..ThresholdConfig::default()
//! };
//! let (threshold, global) = compute(&image, None, None, &config).unwrap();
//! assert_eq!(Some(global), threshold.as_scalar());
//! ```

mod adaptive;
mod background;
mod config;
mod engine;
mod error;
mod global_threshold;
mod grid;
mod kapur;
mod measurements;
mod metrics;
mod mog;
mod noise;
mod otsu;
mod per_object;
mod ridler_calvard;

pub use adaptive::adaptive_threshold;
pub use background::{background_threshold, robust_background_threshold};
pub use config::{Algorithm, SpatialModifier, ThresholdConfig, ThresholdMethod, ThresholdRange};
pub use engine::{compute, Threshold};
pub use error::ThresholdError;
pub use global_threshold::global_threshold;
pub use grid::{
    label_bounding_boxes, label_centroids, masked_values, BoundingBox, Grid, Image, LabelMatrix,
    Mask,
};
pub use measurements::{
    add_object_count_measurements, add_object_location_measurements, Measurements,
    FT_LOCATION_CENTER_X, FT_LOCATION_CENTER_Y,
};
pub use metrics::{sum_of_entropies, weighted_variance};
pub use mog::mog_threshold;
pub use noise::smooth_with_noise;
pub use otsu::otsu;
pub use per_object::per_object_threshold;
pub use ridler_calvard::ridler_calvard_threshold;
