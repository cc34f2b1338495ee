//! Qubit configuration for QSO
//!
//! Gantree: L0_Foundation → QubitConfig
//!
//! Per-qubit device parameters. Decoherence values are passed through
//! to the simulation engine untouched.

use crate::types::{ParamValue, Params};
use serde::{Deserialize, Serialize};

/// Device parameters of one qubit or classical bit
/// Gantree: QubitConfig // 큐비트 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QubitConfig {
    /// Classical bit (measurement output) rather than a qubit
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub classical: bool,

    /// T1 relaxation time; builder default (or infinity) when absent
    /// Gantree: t1: Option<f64> // T1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t1: Option<f64>,

    /// T2 dephasing time; builder default (or infinity) when absent
    /// Gantree: t2: Option<f64> // T2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t2: Option<f64>,

    /// Readout error, used to build the shared measurement sampler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readout_error: Option<f64>,

    /// Any other device parameters, kept for the engine
    #[serde(flatten)]
    pub extra: Params,
}

impl QubitConfig {
    /// Qubit with explicit decoherence times
    pub fn new(t1: f64, t2: f64) -> Self {
        Self {
            t1: Some(t1),
            t2: Some(t2),
            ..Self::default()
        }
    }

    /// Qubit without decoherence parameters
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Classical bit
    pub fn classical() -> Self {
        Self {
            classical: true,
            ..Self::default()
        }
    }

    /// Set readout error
    pub fn with_readout_error(mut self, readout_error: f64) -> Self {
        self.readout_error = Some(readout_error);
        self
    }

    /// Attach an extra device parameter
    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// T1 to hand to the engine
    pub fn resolved_t1(&self, default: Option<f64>) -> f64 {
        self.t1.or(default).unwrap_or(f64::INFINITY)
    }

    /// T2 to hand to the engine
    pub fn resolved_t2(&self, default: Option<f64>) -> f64 {
        self.t2.or(default).unwrap_or(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let explicit = QubitConfig::new(30_000.0, 20_000.0);
        assert_eq!(explicit.resolved_t1(Some(1.0)), 30_000.0);

        let bare = QubitConfig::ideal();
        assert_eq!(bare.resolved_t2(Some(5.0)), 5.0);
        assert!(bare.resolved_t1(None).is_infinite());
    }

    #[test]
    fn test_json_shape() {
        let q: QubitConfig =
            serde_json::from_str(r#"{"t1": 30000, "readout_error": 0.01, "frequency": 5.2}"#)
                .unwrap();
        assert_eq!(q.t1, Some(30000.0));
        assert!(!q.classical);
        assert_eq!(q.extra["frequency"], ParamValue::Number(5.2));

        let c: QubitConfig = serde_json::from_str(r#"{"classical": true}"#).unwrap();
        assert!(c.classical);
        assert_eq!(serde_json::to_string(&c).unwrap(), r#"{"classical":true}"#);
    }
}
