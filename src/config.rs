//! Threshold configuration.
//!
//! The original pipeline stored the method as a single
//! `"<Algorithm> <Modifier>"` string and split it on every access. Here
//! the string is parsed once into a tagged (algorithm, modifier) pair so
//! the per-call dispatch is total and an unknown name fails exactly once,
//! at configuration time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ThresholdError;

/// Global threshold estimator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    Otsu,
    MoG,
    Background,
    RobustBackground,
    RidlerCalvard,
    Kapur,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Otsu => "Otsu",
            Algorithm::MoG => "MoG",
            Algorithm::Background => "Background",
            Algorithm::RobustBackground => "RobustBackground",
            Algorithm::RidlerCalvard => "RidlerCalvard",
            Algorithm::Kapur => "Kapur",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "Otsu" => Algorithm::Otsu,
            "MoG" => Algorithm::MoG,
            "Background" => Algorithm::Background,
            "RobustBackground" => Algorithm::RobustBackground,
            "RidlerCalvard" => Algorithm::RidlerCalvard,
            "Kapur" => Algorithm::Kapur,
            _ => return None,
        })
    }
}

/// Spatial strategy for applying a global algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpatialModifier {
    /// One threshold for the whole image.
    Global,
    /// One threshold per block of a grid partition.
    Adaptive,
    /// One threshold per labeled object.
    PerObject,
}

impl SpatialModifier {
    pub fn name(self) -> &'static str {
        match self {
            SpatialModifier::Global => "Global",
            SpatialModifier::Adaptive => "Adaptive",
            SpatialModifier::PerObject => "PerObject",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "Global" => SpatialModifier::Global,
            "Adaptive" => SpatialModifier::Adaptive,
            "PerObject" => SpatialModifier::PerObject,
            _ => return None,
        })
    }
}

/// Fully resolved threshold method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdMethod {
    /// Fixed user-supplied value; no statistics are computed.
    Manual,
    Automatic {
        algorithm: Algorithm,
        modifier: SpatialModifier,
    },
}

impl ThresholdMethod {
    /// Parse the original method strings: `"Manual"`, `"Otsu Global"`,
    /// `"MoG Adaptive"`, ... A bare algorithm name implies `Global`.
    pub fn parse(method: &str) -> Result<Self, ThresholdError> {
        let unsupported = || ThresholdError::UnsupportedAlgorithm {
            method: method.to_string(),
        };
        let mut tokens = method.split_whitespace();
        let first = tokens.next().ok_or_else(unsupported)?;
        if first == "Manual" {
            return match tokens.next() {
                None => Ok(ThresholdMethod::Manual),
                Some(_) => Err(unsupported()),
            };
        }
        let algorithm = Algorithm::parse(first).ok_or_else(unsupported)?;
        let modifier = match tokens.next() {
            None => SpatialModifier::Global,
            Some(token) => SpatialModifier::parse(token).ok_or_else(unsupported)?,
        };
        if tokens.next().is_some() {
            return Err(unsupported());
        }
        Ok(ThresholdMethod::Automatic {
            algorithm,
            modifier,
        })
    }
}

impl FromStr for ThresholdMethod {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMethod::Manual => f.write_str("Manual"),
            ThresholdMethod::Automatic {
                algorithm,
                modifier,
            } => write!(f, "{} {}", algorithm.name(), modifier.name()),
        }
    }
}

/// Inclusive bounds applied to the computed threshold before the
/// correction factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub min: f64,
    pub max: f64,
}

/// Immutable per-invocation configuration of the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub method: ThresholdMethod,
    /// Used only when `method` is `Manual`.
    pub manual_value: f64,
    pub range: ThresholdRange,
    /// Multiplied into the threshold *after* the range clamp, so the
    /// final value may leave the nominal range. Deliberate.
    pub correction_factor: f64,
    /// Prior estimate of the fraction of the image covered by objects;
    /// consumed by the mixture-of-Gaussians estimator.
    pub object_fraction: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::Automatic {
                algorithm: Algorithm::Otsu,
                modifier: SpatialModifier::Global,
            },
            manual_value: 0.0,
            range: ThresholdRange { min: 0.0, max: 1.0 },
            correction_factor: 1.0,
            object_fraction: 0.01,
        }
    }
}

impl ThresholdConfig {
    /// Check the numeric fields against their documented domains.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let invalid = |reason: String| ThresholdError::InvalidConfig { reason };
        if !(self.range.min <= self.range.max) {
            return Err(invalid(format!(
                "range.min ({}) must not exceed range.max ({})",
                self.range.min, self.range.max
            )));
        }
        if !(self.correction_factor > 0.0) {
            return Err(invalid(format!(
                "correction_factor ({}) must be positive",
                self.correction_factor
            )));
        }
        if !(self.object_fraction > 0.0 && self.object_fraction < 1.0) {
            return Err(invalid(format!(
                "object_fraction ({}) must lie in (0, 1)",
                self.object_fraction
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_algorithm_modifier_pairs() {
        assert_eq!(
            ThresholdMethod::Automatic {
                algorithm: Algorithm::Otsu,
                modifier: SpatialModifier::Global
            },
            ThresholdMethod::parse("Otsu Global").unwrap()
        );
        assert_eq!(
            ThresholdMethod::Automatic {
                algorithm: Algorithm::RobustBackground,
                modifier: SpatialModifier::PerObject
            },
            ThresholdMethod::parse("RobustBackground PerObject").unwrap()
        );
        assert_eq!(
            ThresholdMethod::Manual,
            ThresholdMethod::parse("Manual").unwrap()
        );
    }

    #[test]
    fn bare_algorithm_implies_global() {
        assert_eq!(
            ThresholdMethod::parse("Kapur Global").unwrap(),
            ThresholdMethod::parse("Kapur").unwrap()
        );
    }

    #[test]
    fn unknown_method_names_the_offender() {
        let err = ThresholdMethod::parse("Oats Global").unwrap_err();
        assert!(err.to_string().contains("Oats Global"));
        assert!(ThresholdMethod::parse("Otsu Sideways").is_err());
        assert!(ThresholdMethod::parse("").is_err());
        assert!(ThresholdMethod::parse("Otsu Global Extra").is_err());
    }

    #[test]
    fn display_round_trips() {
        for s in [
            "Manual",
            "Otsu Global",
            "MoG Adaptive",
            "Background PerObject",
            "RidlerCalvard Global",
        ] {
            assert_eq!(s, ThresholdMethod::parse(s).unwrap().to_string());
        }
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let mut cfg = ThresholdConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.range = ThresholdRange { min: 0.6, max: 0.4 };
        assert!(cfg.validate().is_err());

        let mut cfg = ThresholdConfig::default();
        cfg.correction_factor = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = ThresholdConfig::default();
        cfg.object_fraction = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_serializes() {
        let cfg = ThresholdConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ThresholdConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
