//! Core types for QSO
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases and the dynamically-typed parameter value passed
//! between gate templates, bindings and the simulation engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit (or classical bit) identifier
/// Gantree: QubitId // pub type QubitId = String
pub type QubitId = String;

/// Simulated time, in the units of the gate bindings (typically ns)
/// Gantree: Time // pub type Time = f64
pub type Time = f64;

/// Named gate parameters, ordered by name
/// Gantree: Params // pub type Params = BTreeMap<String, ParamValue>
pub type Params = BTreeMap<String, ParamValue>;

// ============================================================================
// ParamValue
// ============================================================================

/// A single gate parameter value
/// Gantree: ParamValue // 파라미터 값
///
/// Numbers, flags and symbolic strings all travel through the same
/// parameter maps; the engine decides what it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag (also the placeholder for the shared sampler)
    Bool(bool),
    /// Numeric value
    Number(f64),
    /// Symbolic or textual value
    Text(String),
}

impl ParamValue {
    /// Coerce an import token: numeric when lexically valid, text otherwise
    /// Gantree: from_token(s) -> Self // 토큰 변환
    pub fn from_token(token: &str) -> Self {
        match token.parse::<f64>() {
            Ok(v) => ParamValue::Number(v),
            Err(_) => ParamValue::Text(token.to_string()),
        }
    }

    /// Numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Sign-flipped copy; only numbers can be negated
    pub fn negated(&self) -> Option<Self> {
        self.as_f64().map(|v| ParamValue::Number(-v))
    }

    /// Short name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Number(_) => "number",
            ParamValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Number(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Number(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Number(v as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token() {
        assert_eq!(ParamValue::from_token("1.5"), ParamValue::Number(1.5));
        assert_eq!(ParamValue::from_token("-3"), ParamValue::Number(-3.0));
        assert_eq!(
            ParamValue::from_token("theta"),
            ParamValue::Text("theta".into())
        );
    }

    #[test]
    fn test_negated() {
        assert_eq!(
            ParamValue::Number(0.25).negated(),
            Some(ParamValue::Number(-0.25))
        );
        assert_eq!(ParamValue::Text("phi".into()).negated(), None);
        assert_eq!(ParamValue::Bool(true).negated(), None);
    }

    #[test]
    fn test_untagged_json() {
        let params: Params =
            serde_json::from_str(r#"{"angle": 1.0, "sampler": true, "label": "c0"}"#).unwrap();
        assert_eq!(params["angle"], ParamValue::Number(1.0));
        assert_eq!(params["sampler"], ParamValue::Bool(true));
        assert_eq!(params["label"], ParamValue::Text("c0".into()));
    }

    #[test]
    fn test_accessors() {
        let v = ParamValue::from(2);
        assert_eq!(v.as_f64(), Some(2.0));
        assert_eq!(v.as_str(), None);
        assert_eq!(v.kind(), "number");
        assert_eq!(ParamValue::from(false).as_bool(), Some(false));
        assert_eq!(ParamValue::from("x").to_string(), "x");
    }
}
