//! Gate descriptors and requests
//!
//! Gantree: L2_Builder → Descriptor
//!
//! [`GateDescriptor`] is the positional record kept in the circuit log and
//! replayed on reversal. [`GateRequest`] is the named form `add_gate` takes.
//! The tuple form (`[gate, q.., p.., time?, flag?]`) decodes into a
//! descriptor by comparing its length against the template.

use crate::catalogue::{GateCatalogue, GateTemplate};
use qso_core::{ParamValue, Params, QsoError, QsoResult, QubitId, Time};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// GateDescriptor
// ============================================================================

/// Positional gate record
/// Gantree: GateDescriptor // 게이트 기술자
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDescriptor {
    /// Gate name
    pub gate: String,
    /// Qubits (length = template arity)
    pub qubits: Vec<QubitId>,
    /// User parameter values in template order
    #[serde(default)]
    pub params: Vec<ParamValue>,
    /// Explicit firing time; clocks are not advanced when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Time>,
    /// Handle request: operation `n` back from the end (1 = last)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_handle: Option<usize>,
}

impl GateDescriptor {
    /// Descriptor without parameters
    pub fn new<Q: Into<QubitId>>(gate: &str, qubits: impl IntoIterator<Item = Q>) -> Self {
        Self {
            gate: gate.to_string(),
            qubits: qubits.into_iter().map(Into::into).collect(),
            params: Vec::new(),
            time: None,
            return_handle: None,
        }
    }

    /// Append a positional parameter
    pub fn param(mut self, value: impl Into<ParamValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Fire at an explicit time
    pub fn at(mut self, time: Time) -> Self {
        self.time = Some(time);
        self
    }

    /// Ask for a handle to the operation `back` positions from the end
    pub fn with_handle(mut self, back: usize) -> Self {
        self.return_handle = Some(back);
        self
    }

    /// Decode the tuple form against the catalogue
    /// Gantree: from_fields(fields,catalogue) -> Result<Self> // 길이로 판별
    ///
    /// `fields[0]` is the gate name. With `k` qubits and `m` parameters,
    /// `1+k+m` fields carry nothing extra; one more is a return flag when
    /// boolean, otherwise a time; two more are a time then a return flag.
    pub fn from_fields(fields: &[ParamValue], catalogue: &GateCatalogue) -> QsoResult<Self> {
        let gate = match fields.first() {
            Some(ParamValue::Text(name)) => name.clone(),
            Some(other) => {
                return Err(QsoError::InvalidDescriptor(format!(
                    "gate name must be text, got {} '{}'",
                    other.kind(),
                    other
                )))
            }
            None => return Err(QsoError::InvalidDescriptor("empty descriptor".to_string())),
        };
        let template = catalogue.get(&gate)?;
        let base = template.descriptor_len();

        let (time, flag) = match fields.len().checked_sub(base) {
            Some(0) => (None, None),
            Some(1) => match &fields[base] {
                ParamValue::Bool(flag) => (None, Some(*flag)),
                ParamValue::Number(time) => (Some(*time), None),
                other => return Err(trailing_error(&gate, "time or return flag", other)),
            },
            Some(2) => {
                let time = fields[base]
                    .as_f64()
                    .ok_or_else(|| trailing_error(&gate, "time", &fields[base]))?;
                let flag = fields[base + 1]
                    .as_bool()
                    .ok_or_else(|| trailing_error(&gate, "return flag", &fields[base + 1]))?;
                (Some(time), Some(flag))
            }
            _ => {
                return Err(QsoError::ArityMismatch {
                    gate,
                    expected: format!("{} to {}", base, base + 2),
                    got: fields.len(),
                })
            }
        };

        let qubits = fields[1..=template.num_qubits]
            .iter()
            .map(|field| match field {
                ParamValue::Text(q) => Ok(q.clone()),
                other => Err(QsoError::InvalidDescriptor(format!(
                    "qubit of '{}' must be text, got {} '{}'",
                    gate,
                    other.kind(),
                    other
                ))),
            })
            .collect::<QsoResult<Vec<_>>>()?;

        Ok(Self {
            params: fields[template.num_qubits + 1..base].to_vec(),
            gate,
            qubits,
            time,
            return_handle: flag.and_then(|f| f.then_some(1)),
        })
    }

    /// Name the positional parameters with the template's user parameters
    pub fn into_request(self, template: &GateTemplate) -> QsoResult<GateRequest> {
        if self.qubits.len() != template.num_qubits
            || self.params.len() != template.user_params.len()
        {
            return Err(QsoError::ArityMismatch {
                expected: template.descriptor_len().to_string(),
                got: 1 + self.qubits.len() + self.params.len(),
                gate: self.gate,
            });
        }

        let params = template
            .user_params
            .iter()
            .cloned()
            .zip(self.params)
            .collect();

        Ok(GateRequest {
            gate: self.gate,
            qubits: self.qubits,
            params,
            time: self.time,
            return_handle: self.return_handle,
        })
    }
}

fn trailing_error(gate: &str, expected: &str, got: &ParamValue) -> QsoError {
    QsoError::InvalidDescriptor(format!(
        "trailing field of '{}' must be a {}, got {} '{}'",
        gate,
        expected,
        got.kind(),
        got
    ))
}

impl fmt::Display for GateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gate)?;
        for q in &self.qubits {
            write!(f, " {}", q)?;
        }
        for p in &self.params {
            write!(f, " {}", p)?;
        }
        if let Some(time) = self.time {
            write!(f, " @{}", time)?;
        }
        Ok(())
    }
}

// ============================================================================
// Instruction
// ============================================================================

/// What `Builder::enqueue` accepts
/// Gantree: Instruction // 단일 | 동시
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// One gate
    Single(GateDescriptor),
    /// Gates sharing a common start baseline
    Simultaneous(Vec<GateDescriptor>),
}

impl From<GateDescriptor> for Instruction {
    fn from(descriptor: GateDescriptor) -> Self {
        Instruction::Single(descriptor)
    }
}

impl From<Vec<GateDescriptor>> for Instruction {
    fn from(group: Vec<GateDescriptor>) -> Self {
        Instruction::Simultaneous(group)
    }
}

// ============================================================================
// GateRequest
// ============================================================================

/// Named gate call
/// Gantree: GateRequest // add_gate 입력
#[derive(Debug, Clone, PartialEq)]
pub struct GateRequest {
    /// Gate name
    pub gate: String,
    /// Qubits in call order
    pub qubits: Vec<QubitId>,
    /// Caller parameters (override binding values)
    pub params: Params,
    /// Explicit firing time
    pub time: Option<Time>,
    /// Handle request: operation `n` back from the end (1 = last)
    pub return_handle: Option<usize>,
}

impl GateRequest {
    /// Request without parameters
    pub fn new<Q: Into<QubitId>>(gate: &str, qubits: impl IntoIterator<Item = Q>) -> Self {
        Self {
            gate: gate.to_string(),
            qubits: qubits.into_iter().map(Into::into).collect(),
            params: Params::new(),
            time: None,
            return_handle: None,
        }
    }

    /// Set a caller parameter
    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Merge in parameters the request does not already set
    pub fn with_defaults(mut self, defaults: &Params) -> Self {
        for (key, value) in defaults {
            self.params
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Fire at an explicit time
    pub fn at(mut self, time: Time) -> Self {
        self.time = Some(time);
        self
    }

    /// Ask for a handle to the operation `back` positions from the end
    pub fn with_handle(mut self, back: usize) -> Self {
        self.return_handle = Some(back);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> GateCatalogue {
        GateCatalogue::new()
            .with("X", GateTemplate::primitive("x", "x", 1).involutory())
            .with(
                "RX",
                GateTemplate::primitive("rotate_x", "rotate_x", 1).with_params(&["angle"]),
            )
    }

    fn fields(items: &[ParamValue]) -> Vec<ParamValue> {
        items.to_vec()
    }

    #[test]
    fn test_bare_tuple() {
        let d = GateDescriptor::from_fields(&fields(&["X".into(), "a".into()]), &catalogue())
            .unwrap();
        assert_eq!(d, GateDescriptor::new("X", ["a"]));
    }

    #[test]
    fn test_one_trailing_field() {
        let cat = catalogue();

        let flagged =
            GateDescriptor::from_fields(&fields(&["X".into(), "a".into(), true.into()]), &cat)
                .unwrap();
        assert_eq!(flagged.return_handle, Some(1));
        assert_eq!(flagged.time, None);

        let timed =
            GateDescriptor::from_fields(&fields(&["X".into(), "a".into(), 0.0.into()]), &cat)
                .unwrap();
        assert_eq!(timed.time, Some(0.0));
        assert_eq!(timed.return_handle, None);

        let bad = GateDescriptor::from_fields(&fields(&["X".into(), "a".into(), "b".into()]), &cat);
        assert!(matches!(bad, Err(QsoError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_two_trailing_fields() {
        let d = GateDescriptor::from_fields(
            &fields(&["RX".into(), "a".into(), 1.0.into(), 25.0.into(), true.into()]),
            &catalogue(),
        )
        .unwrap();
        assert_eq!(d.params, vec![ParamValue::Number(1.0)]);
        assert_eq!(d.time, Some(25.0));
        assert_eq!(d.return_handle, Some(1));

        let swapped = GateDescriptor::from_fields(
            &fields(&["RX".into(), "a".into(), 1.0.into(), true.into(), 25.0.into()]),
            &catalogue(),
        );
        assert!(swapped.is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let err = GateDescriptor::from_fields(&fields(&["RX".into(), "a".into()]), &catalogue())
            .unwrap_err();
        assert!(matches!(err, QsoError::ArityMismatch { got: 2, .. }));

        let err = GateDescriptor::from_fields(&fields(&["H".into(), "a".into()]), &catalogue())
            .unwrap_err();
        assert_eq!(err, QsoError::UnknownGate("H".into()));

        let err = GateDescriptor::from_fields(&fields(&["X".into(), 3.0.into()]), &catalogue())
            .unwrap_err();
        assert!(matches!(err, QsoError::InvalidDescriptor(_)));
    }

    #[test]
    fn test_into_request() {
        let cat = catalogue();
        let rx = cat.get("RX").unwrap();

        let request = GateDescriptor::new("RX", ["a"])
            .param(0.5)
            .at(12.0)
            .into_request(rx)
            .unwrap();
        assert_eq!(request.params["angle"], ParamValue::Number(0.5));
        assert_eq!(request.time, Some(12.0));

        let err = GateDescriptor::new("RX", ["a"]).into_request(rx).unwrap_err();
        assert!(matches!(err, QsoError::ArityMismatch { .. }));
    }

    #[test]
    fn test_request_defaults_do_not_override() {
        let defaults = Params::from([
            ("angle".to_string(), ParamValue::Number(1.0)),
            ("label".to_string(), ParamValue::Text("d".into())),
        ]);
        let request = GateRequest::new("RX", ["a"])
            .param("angle", 2.0)
            .with_defaults(&defaults);

        assert_eq!(request.params["angle"], ParamValue::Number(2.0));
        assert_eq!(request.params["label"], ParamValue::Text("d".into()));
    }

    #[test]
    fn test_display() {
        let d = GateDescriptor::new("RX", ["a"]).param(0.5);
        assert_eq!(d.to_string(), "RX a 0.5");
    }
}
