//! Adaptive block thresholding.
//!
//! The image is partitioned into a grid of blocks, each block is
//! thresholded independently with the configured global algorithm, and
//! the block results are clamped to a band around the whole-image
//! threshold before being painted into a per-pixel map.

use log::debug;
use rayon::prelude::*;

use crate::config::{Algorithm, ThresholdConfig};
use crate::global_threshold::global_threshold;
use crate::grid::{Image, Mask};

/// Blocks are never smaller than 50 pixels per side.
const MIN_BLOCK_SIDE: usize = 50;
/// Images of 500+ pixels per axis get ~10 blocks along that axis.
const TARGET_BLOCKS_PER_AXIS: usize = 10;

/// Block thresholds are confined to `[0.7 T, min(1.5 T, 1)]` around the
/// global threshold `T`.
const BLOCK_CLAMP_LOW: f64 = 0.7;
const BLOCK_CLAMP_HIGH: f64 = 1.5;

/// Block count and floating-point block pitch for one axis. The float
/// pitch spreads rounding across the blocks instead of letting it pile
/// up in the last one.
fn axis_blocks(size: usize) -> (usize, f64) {
    let side = (size / TARGET_BLOCKS_PER_AXIS).max(MIN_BLOCK_SIDE);
    let count = (size / side).max(1);
    (count, size as f64 / count as f64)
}

/// Compute a per-pixel threshold map from a grid of blocks.
///
/// Every pixel of the result is covered by exactly one block and holds
/// that block's clamped threshold.
pub fn adaptive_threshold(
    image: &Image,
    mask: &Mask,
    algorithm: Algorithm,
    config: &ThresholdConfig,
    global: f64,
) -> Image {
    let min_threshold = (BLOCK_CLAMP_LOW * global).max(0.0);
    let max_threshold = (BLOCK_CLAMP_HIGH * global).min(1.0);

    let (row_blocks, row_pitch) = axis_blocks(image.height());
    let (col_blocks, col_pitch) = axis_blocks(image.width());
    debug!(
        "adaptive threshold: {row_blocks}x{col_blocks} blocks over {}x{} pixels, global {global:.4}",
        image.height(),
        image.width()
    );

    let mut blocks = Vec::with_capacity(row_blocks * col_blocks);
    for i in 0..row_blocks {
        let r0 = (i as f64 * row_pitch) as usize;
        // Pin the final block to the axis end so float truncation can
        // never leave a sliver uncovered.
        let r1 = if i + 1 == row_blocks {
            image.height()
        } else {
            ((i + 1) as f64 * row_pitch) as usize
        };
        for j in 0..col_blocks {
            let c0 = (j as f64 * col_pitch) as usize;
            let c1 = if j + 1 == col_blocks {
                image.width()
            } else {
                ((j + 1) as f64 * col_pitch) as usize
            };
            blocks.push((r0, r1, c0, c1));
        }
    }

    // Blocks are disjoint, so they can be thresholded in parallel and
    // painted afterwards.
    let thresholds: Vec<f64> = blocks
        .par_iter()
        .map(|&(r0, r1, c0, c1)| {
            let mut samples = Vec::with_capacity((r1 - r0) * (c1 - c0));
            for r in r0..r1 {
                for c in c0..c1 {
                    if *mask.get(r, c) {
                        samples.push(*image.get(r, c));
                    }
                }
            }
            let t = global_threshold(&samples, algorithm, config);
            t.max(min_threshold).min(max_threshold)
        })
        .collect();

    let mut out = Image::new(image.width(), image.height(), 0.0);
    for (&(r0, r1, c0, c1), &t) in blocks.iter().zip(&thresholds) {
        for r in r0..r1 {
            for c in c0..c1 {
                out.set(r, c, t);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: usize, height: usize) -> Image {
        let data = (0..width * height)
            .map(|i| i as f64 / (width * height - 1) as f64)
            .collect();
        Image::from_vec(width, height, data).unwrap()
    }

    #[test]
    fn axis_blocks_respects_minimum_side() {
        // 120 pixels: 120/10 = 12 < 50, so blocks are 50 wide -> 2 blocks.
        assert_eq!(2, axis_blocks(120).0);
        // Small axis collapses to a single block.
        assert_eq!(1, axis_blocks(30).0);
        // 1000 pixels: 10 blocks of pitch 100.
        let (count, pitch) = axis_blocks(1000);
        assert_eq!(10, count);
        assert_eq!(100.0, pitch);
    }

    #[test]
    fn output_covers_every_pixel_within_clamp_band() {
        let image = gradient_image(120, 110);
        let mask = Mask::all_true(120, 110);
        let config = ThresholdConfig::default();
        let global = 0.5;
        let out = adaptive_threshold(&image, &mask, Algorithm::Otsu, &config, global);
        assert!(out.same_shape(&image));
        let lo = 0.7 * global;
        let hi = (1.5 * global).min(1.0);
        for &t in out.data() {
            assert!(t >= lo && t <= hi, "t = {t}");
        }
    }

    #[test]
    fn uneven_axis_leaves_no_uncovered_sliver() {
        // 3 blocks of pitch 1000/3; the final block must reach the edge.
        let image = gradient_image(4, 150);
        let mask = Mask::all_true(4, 150);
        let config = ThresholdConfig::default();
        let out = adaptive_threshold(&image, &mask, Algorithm::RobustBackground, &config, 0.4);
        for &t in out.data() {
            assert!(t > 0.0, "uncovered pixel kept its fill value");
        }
    }

    #[test]
    fn single_block_image_matches_clamped_global_result() {
        let image = gradient_image(40, 40);
        let mask = Mask::all_true(40, 40);
        let config = ThresholdConfig::default();
        let global = 0.9;
        let out = adaptive_threshold(&image, &mask, Algorithm::Otsu, &config, global);
        let expected = global_threshold(&crate::grid::masked_values(&image, &mask), Algorithm::Otsu, &config)
            .max(0.7 * global)
            .min(1.0);
        for &t in out.data() {
            assert_eq!(expected, t);
        }
    }
}
