//! Per-object thresholding.
//!
//! Each labeled region is thresholded independently on its own masked
//! pixels; pixels outside every object keep the neutral value 1.0, so
//! downstream comparisons treat them as never-foreground.

use log::debug;
use rayon::prelude::*;

use crate::config::{Algorithm, ThresholdConfig};
use crate::global_threshold::global_threshold;
use crate::grid::{label_bounding_boxes, Image, LabelMatrix, Mask};

/// Threshold applied to pixels outside any labeled object.
const NEUTRAL_THRESHOLD: f64 = 1.0;

/// Compute a per-pixel threshold map with one threshold per label.
///
/// `global` is the whole-image threshold the engine computed first; the
/// per-object pass does not constrain its results with it (the engine's
/// outer range clamp is the only bound), so it is only reported here.
///
/// Labels whose bounding box contains no masked pixels contribute no
/// threshold and keep the neutral value. That is intentional, not an
/// error.
pub fn per_object_threshold(
    image: &Image,
    mask: &Mask,
    labels: &LabelMatrix,
    algorithm: Algorithm,
    config: &ThresholdConfig,
    global: f64,
) -> Image {
    debug!(
        "per-object threshold over {} labels, global seed {global:.4}",
        labels.max_label()
    );

    let boxes = label_bounding_boxes(labels);
    // Labels own disjoint pixel sets, so they are processed in parallel
    // and written afterwards.
    let results: Vec<(Vec<usize>, f64)> = boxes
        .par_iter()
        .enumerate()
        .filter_map(|(k, bbox)| {
            let bbox = (*bbox)?;
            let label = k as u32 + 1;
            let mut indices = Vec::new();
            let mut values = Vec::new();
            for r in bbox.row0..bbox.row1 {
                for c in bbox.col0..bbox.col1 {
                    if *labels.get(r, c) == label && *mask.get(r, c) {
                        indices.push(image.idx(r, c));
                        values.push(*image.get(r, c));
                    }
                }
            }
            if indices.is_empty() {
                return None;
            }
            Some((indices, global_threshold(&values, algorithm, config)))
        })
        .collect();

    let mut out = Image::new(image.width(), image.height(), NEUTRAL_THRESHOLD);
    for (indices, threshold) in results {
        for i in indices {
            out.data_mut()[i] = threshold;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::masked_values;

    /// 6x4 image with two 2x2 objects of distinct constant intensities.
    fn fixture() -> (Image, Mask, LabelMatrix) {
        let mut image = Image::new(6, 4, 0.05);
        let mut labels = LabelMatrix::new(6, 4, 0);
        for r in 0..2 {
            for c in 0..2 {
                image.set(r, c, 0.3);
                labels.set(r, c, 1);
                image.set(r + 2, c + 4, 0.8);
                labels.set(r + 2, c + 4, 2);
            }
        }
        (image, Mask::all_true(6, 4), labels)
    }

    #[test]
    fn outside_pixels_keep_neutral_value() {
        let (image, mask, labels) = fixture();
        let config = ThresholdConfig::default();
        let out = per_object_threshold(&image, &mask, &labels, Algorithm::Otsu, &config, 0.5);
        for r in 0..4 {
            for c in 0..6 {
                if *labels.get(r, c) == 0 {
                    assert_eq!(1.0, *out.get(r, c));
                }
            }
        }
    }

    #[test]
    fn object_pixels_get_their_region_threshold() {
        let (image, mask, labels) = fixture();
        let config = ThresholdConfig::default();
        let out = per_object_threshold(&image, &mask, &labels, Algorithm::Otsu, &config, 0.5);
        // Constant regions fall back to their constant value.
        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(0.3, *out.get(r, c));
                assert_eq!(0.8, *out.get(r + 2, c + 4));
            }
        }
    }

    #[test]
    fn masked_out_object_keeps_neutral_value() {
        let (image, mut mask, labels) = fixture();
        // Exclude object 1 entirely.
        for r in 0..2 {
            for c in 0..2 {
                mask.set(r, c, false);
            }
        }
        let config = ThresholdConfig::default();
        let out = per_object_threshold(&image, &mask, &labels, Algorithm::Otsu, &config, 0.5);
        for r in 0..2 {
            for c in 0..2 {
                assert_eq!(1.0, *out.get(r, c));
            }
        }
        // The other object is unaffected.
        assert_eq!(0.8, *out.get(2, 4));
    }

    #[test]
    fn region_threshold_matches_direct_library_call() {
        let (mut image, mask, labels) = fixture();
        // Give object 2 a gradient so the threshold is non-trivial.
        image.set(2, 4, 0.2);
        image.set(2, 5, 0.4);
        image.set(3, 4, 0.6);
        image.set(3, 5, 0.9);
        let config = ThresholdConfig::default();
        let out =
            per_object_threshold(&image, &mask, &labels, Algorithm::RobustBackground, &config, 0.5);

        let mut region_mask = Mask::new(6, 4, false);
        for r in 2..4 {
            for c in 4..6 {
                region_mask.set(r, c, true);
            }
        }
        let expected = global_threshold(
            &masked_values(&image, &region_mask),
            Algorithm::RobustBackground,
            &config,
        );
        assert_eq!(expected, *out.get(2, 4));
        assert_eq!(expected, *out.get(3, 5));
    }
}
