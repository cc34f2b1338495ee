//! Operations recorded by the simulation engine
//!
//! Gantree: L1_Engine → Operation
//!
//! An operation is an instant-in-time instruction on one or more bits.
//! Builders get an [`OperationId`] back when they ask for a handle.

use crate::sampler::SharedSampler;
use qso_core::{ParamValue, Params, QubitId, Time};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an operation inside one engine circuit
/// Gantree: OperationId // 핸들
///
/// Ids survive reordering (`sort_by_time`, `order`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// What an operation does
#[derive(Debug, Clone)]
pub enum OperationKind {
    /// Unitary or noisy gate
    Gate,

    /// Projective measurement writing a classical bit
    Measurement {
        /// Classical bit receiving the declared outcome
        output_bit: QubitId,
        /// Classical bit receiving the projected outcome, if tracked
        real_output_bit: Option<QubitId>,
        /// Sampler shared with every other measurement of the setup
        sampler: SharedSampler,
    },

    /// Idle period inserted by the finalizer (decoherence only)
    Waiting {
        /// Length of the idle period
        duration: Time,
    },
}

/// A single engine instruction
/// Gantree: Operation // 연산
#[derive(Debug, Clone)]
pub struct Operation {
    id: OperationId,

    /// Engine-level name (e.g. `rotate_x`, `cphase`, `measure`, `wait`)
    pub name: String,

    /// Bits touched, in call order
    pub bits: Vec<QubitId>,

    /// Firing time
    pub time: Time,

    /// Fully resolved parameters
    pub params: Params,

    /// Kind
    pub kind: OperationKind,
}

impl Operation {
    /// New gate operation; the id is assigned when an engine accepts it
    pub fn gate(name: &str, bits: Vec<QubitId>, time: Time, params: Params) -> Self {
        Self {
            id: OperationId(0),
            name: name.to_string(),
            bits,
            time,
            params,
            kind: OperationKind::Gate,
        }
    }

    /// New idle period on one bit, centred at `time`
    pub fn waiting(bit: &str, time: Time, duration: Time, params: Params) -> Self {
        Self {
            id: OperationId(0),
            name: "wait".to_string(),
            bits: vec![bit.to_string()],
            time,
            params,
            kind: OperationKind::Waiting { duration },
        }
    }

    /// Engine-assigned id
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Assign the id (engines only)
    pub fn assign_id(&mut self, id: OperationId) {
        self.id = id;
    }

    /// Set the firing time (handles are returned so gates can be adjusted)
    pub fn set_time(&mut self, time: Time) {
        self.time = time;
    }

    /// Look up a parameter
    pub fn param(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Replace a parameter
    pub fn set_param(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.params.insert(key.to_string(), value.into());
    }

    /// Check if this operation touches a bit
    pub fn involves(&self, bit: &str) -> bool {
        self.bits.iter().any(|b| b == bit)
    }

    /// Check if operation is an idle period
    pub fn is_waiting(&self) -> bool {
        matches!(self.kind, OperationKind::Waiting { .. })
    }

    /// Check if operation is a measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self.kind, OperationKind::Measurement { .. })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.1}] {} on {:?}", self.time, self.name, self.bits)?;
        if let OperationKind::Waiting { duration } = self.kind {
            write!(f, " for {:.1}", duration)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_operation() {
        let mut op = Operation::gate(
            "rotate_x",
            vec!["q0".into()],
            10.0,
            Params::from([("angle".to_string(), ParamValue::Number(1.0))]),
        );

        assert!(op.involves("q0"));
        assert!(!op.involves("q1"));
        assert!(!op.is_waiting());
        assert_eq!(op.param("angle"), Some(&ParamValue::Number(1.0)));

        op.set_param("angle", -1.0);
        op.set_time(12.5);
        assert_eq!(op.param("angle"), Some(&ParamValue::Number(-1.0)));
        assert_eq!(op.time, 12.5);
    }

    #[test]
    fn test_waiting_display() {
        let mut op = Operation::waiting("q1", 5.0, 10.0, Params::new());
        op.assign_id(OperationId(3));
        assert!(op.is_waiting());
        assert_eq!(op.id(), OperationId(3));
        assert!(op.to_string().contains("wait"));
        assert!(op.to_string().contains("for 10.0"));
    }
}
