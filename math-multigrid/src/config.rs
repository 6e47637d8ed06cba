//! Transfer configuration
//!
//! Tolerances and defaults shared by the transfer maps, projectors and the
//! operator. Can be loaded from JSON alongside the rest of a solver setup;
//! missing fields fall back to [`TransferConfig::default`].

use crate::error::Result;
use crate::transfer::RestrictionKind;
use serde::{Deserialize, Serialize};

/// Configuration for building and applying transfer operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Restriction used by `TransferOperator::restrict`
    pub restriction: RestrictionKind,

    /// Relative residual at which the normal equations PᵀP x = Pᵀy count as solved
    pub pinv_tolerance: f64,

    /// Iteration cap for the normal-equation solve
    pub pinv_max_iterations: usize,

    /// Row count from which sparse products run in parallel (`rayon` feature)
    pub parallel_threshold: usize,

    /// Residual norm below which a constraint row counts as dependent
    pub projector_tolerance: f64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            restriction: RestrictionKind::Transpose,
            pinv_tolerance: 1e-12,
            pinv_max_iterations: 1000,
            parallel_threshold: 256,
            projector_tolerance: 1e-10,
        }
    }
}

impl TransferConfig {
    /// Galerkin coarse-grid correction: restriction is the transpose of prolongation
    pub fn galerkin() -> Self {
        Self::default()
    }

    /// Least-squares restriction through the pseudo-inverse
    ///
    /// Preferable for the 3-wide and edge-constraint blocks, where the forward
    /// map is not orthonormal and its transpose is not a left inverse.
    pub fn least_squares() -> Self {
        Self {
            restriction: RestrictionKind::PseudoInverse,
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(TransferConfig::galerkin().restriction, RestrictionKind::Transpose);
        assert_eq!(
            TransferConfig::least_squares().restriction,
            RestrictionKind::PseudoInverse
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TransferConfig::from_json(r#"{ "restriction": "pseudo_inverse" }"#)
            .expect("partial config should parse");

        assert_eq!(config.restriction, RestrictionKind::PseudoInverse);
        assert_eq!(config.parallel_threshold, 256);
        assert_eq!(config.pinv_max_iterations, 1000);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = TransferConfig {
            parallel_threshold: 1024,
            ..TransferConfig::least_squares()
        };
        let json = config.to_json().unwrap();
        assert_eq!(TransferConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_json() {
        let err = TransferConfig::from_json(r#"{ "restriction": "sideways" }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid transfer configuration"));
    }
}
