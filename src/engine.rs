//! Top-level threshold engine: method dispatch, range clamp, correction.

use log::debug;

use crate::adaptive::adaptive_threshold;
use crate::config::{SpatialModifier, ThresholdConfig, ThresholdMethod};
use crate::error::ThresholdError;
use crate::global_threshold::global_threshold;
use crate::grid::{masked_values, Grid, Image, LabelMatrix, Mask};
use crate::per_object::per_object_threshold;

/// A computed threshold: one scalar for the whole image, or one value
/// per pixel for the adaptive and per-object strategies.
#[derive(Clone, Debug, PartialEq)]
pub enum Threshold {
    Scalar(f64),
    Map(Image),
}

impl Threshold {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Threshold::Scalar(v) => Some(*v),
            Threshold::Map(_) => None,
        }
    }

    /// Threshold applying to the pixel at the given flat index.
    #[inline]
    pub fn at(&self, index: usize) -> f64 {
        match self {
            Threshold::Scalar(v) => *v,
            Threshold::Map(map) => map.data()[index],
        }
    }
}

fn check_shape<T>(image: &Image, other: &Grid<T>, role: &'static str) -> Result<(), ThresholdError> {
    if image.same_shape(other) {
        Ok(())
    } else {
        Err(ThresholdError::ShapeMismatch {
            role,
            want_width: image.width(),
            want_height: image.height(),
            got_width: other.width(),
            got_height: other.height(),
        })
    }
}

/// Compute the threshold selected by `config`.
///
/// Returns the final (possibly spatially varying) threshold together
/// with the single global threshold it was derived from. The result is
/// clamped element-wise to the configured range *before* the correction
/// factor is applied, so the final value may exceed the nominal range by
/// that factor; this ordering is part of the contract.
///
/// A pure function of its inputs: no caller-owned array is mutated and
/// no state survives the call.
pub fn compute(
    image: &Image,
    mask: Option<&Mask>,
    objects: Option<&LabelMatrix>,
    config: &ThresholdConfig,
) -> Result<(Threshold, f64), ThresholdError> {
    config.validate()?;
    if let Some(mask) = mask {
        check_shape(image, mask, "mask")?;
    }
    if let Some(objects) = objects {
        check_shape(image, objects, "label matrix")?;
    }

    let (algorithm, modifier) = match config.method {
        ThresholdMethod::Manual => {
            return Ok((Threshold::Scalar(config.manual_value), config.manual_value));
        }
        ThresholdMethod::Automatic {
            algorithm,
            modifier,
        } => (algorithm, modifier),
    };

    let full_mask;
    let mask = match mask {
        Some(m) => m,
        None => {
            full_mask = Mask::all_true(image.width(), image.height());
            &full_mask
        }
    };

    let global = global_threshold(&masked_values(image, mask), algorithm, config);
    debug!(
        "{} global threshold {global:.4} ({} modifier)",
        algorithm.name(),
        modifier.name()
    );

    let mut local = match modifier {
        SpatialModifier::Global => Threshold::Scalar(global),
        SpatialModifier::Adaptive => {
            Threshold::Map(adaptive_threshold(image, mask, algorithm, config, global))
        }
        SpatialModifier::PerObject => {
            let objects = objects.ok_or(ThresholdError::MissingObjects)?;
            Threshold::Map(per_object_threshold(
                image, mask, objects, algorithm, config, global,
            ))
        }
    };

    // Clamp to the configured range, then apply the correction factor.
    let clamp_correct = |v: f64| {
        v.max(config.range.min).min(config.range.max) * config.correction_factor
    };
    match &mut local {
        Threshold::Scalar(v) => *v = clamp_correct(*v),
        Threshold::Map(map) => {
            for v in map.data_mut() {
                *v = clamp_correct(*v);
            }
        }
    }

    Ok((local, global))
}
