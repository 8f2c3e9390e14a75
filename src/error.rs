/// Errors produced by the threshold engine.
///
/// Degenerate *data* (empty masks, constant images, tiny samples) is
/// never an error: every algorithm defines a fallback value so that
/// pipelines keep running over pathological regions. Errors are reserved
/// for misconfiguration and missing inputs.
#[derive(thiserror::Error, Debug)]
pub enum ThresholdError {
    /// Unknown algorithm or modifier string. Never silently mapped to a
    /// default.
    #[error("unsupported threshold method {method:?}")]
    UnsupportedAlgorithm { method: String },

    /// Per-object thresholding was requested without a label matrix.
    #[error("per-object thresholding requires a label matrix")]
    MissingObjects,

    /// Mask or label matrix does not match the image dimensions.
    #[error("{role} shape {got_width}x{got_height} does not match image shape {want_width}x{want_height}")]
    ShapeMismatch {
        role: &'static str,
        want_width: usize,
        want_height: usize,
        got_width: usize,
        got_height: usize,
    },

    /// Numeric configuration field out of its documented domain.
    #[error("invalid threshold configuration: {reason}")]
    InvalidConfig { reason: String },
}
