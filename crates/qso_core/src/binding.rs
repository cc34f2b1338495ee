//! Gate bindings for QSO
//!
//! Gantree: L0_Foundation → GateBinding
//!
//! A binding configures one gate on one ordered qubit tuple: the fixed
//! parameters handed to the engine and the timing used by the scheduler.
//! The same gate may be bound differently on `(a, b)` and `(b, a)`.

use crate::error::{QsoError, QsoResult};
use crate::types::{ParamValue, Params, QubitId, Time};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scheduling parameters of a binding
/// Gantree: SchedulingParams // 시간 설정
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulingParams {
    /// Nominal duration of the gate window
    /// Gantree: duration: Time // gate_time
    #[serde(rename = "gate_time")]
    pub duration: Time,

    /// Fixed execution offset inside the window
    /// Gantree: offset: Option<Time> // exec_time
    #[serde(rename = "exec_time", default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Time>,
}

impl SchedulingParams {
    /// Window of the given duration, gate centred
    pub fn new(duration: Time) -> Self {
        Self {
            duration,
            offset: None,
        }
    }

    /// Set a fixed execution offset
    pub fn with_offset(mut self, offset: Time) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Offset from the window start at which the gate fires
    /// Gantree: firing_offset() -> Time // 기본: 중앙
    pub fn firing_offset(&self) -> Time {
        self.offset.unwrap_or(self.duration / 2.0)
    }
}

/// Fixed overrides plus timing for one (gate, qubits) pair
/// Gantree: GateBinding // 게이트 바인딩
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateBinding {
    /// Parameters always passed for this binding (caller values win)
    pub overrides: Params,

    /// Timing
    pub scheduling: SchedulingParams,
}

impl GateBinding {
    /// Binding with no overrides
    pub fn new(scheduling: SchedulingParams) -> Self {
        Self {
            overrides: Params::new(),
            scheduling,
        }
    }

    /// Add a fixed override
    pub fn with_override(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.overrides.insert(key.to_string(), value.into());
        self
    }
}

/// Binding key: gate name and qubits in call order
pub type BindingKey = (String, Vec<QubitId>);

/// Table of every configured (gate, qubits) pair
/// Gantree: BindingTable // gate_set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<BindingEntry>", try_from = "Vec<BindingEntry>")]
pub struct BindingTable {
    bindings: BTreeMap<BindingKey, GateBinding>,
}

impl BindingTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a binding
    pub fn insert<Q: Into<QubitId>>(
        &mut self,
        gate: &str,
        qubits: impl IntoIterator<Item = Q>,
        binding: GateBinding,
    ) {
        let qubits = qubits.into_iter().map(Into::into).collect();
        self.bindings.insert((gate.to_string(), qubits), binding);
    }

    /// Builder-style insert
    pub fn with<Q: Into<QubitId>>(
        mut self,
        gate: &str,
        qubits: impl IntoIterator<Item = Q>,
        binding: GateBinding,
    ) -> Self {
        self.insert(gate, qubits, binding);
        self
    }

    /// Look up a binding
    /// Gantree: get(gate,qubits) -> Result<&GateBinding> // UnboundGate
    pub fn get(&self, gate: &str, qubits: &[QubitId]) -> QsoResult<&GateBinding> {
        self.bindings
            .get(&(gate.to_string(), qubits.to_vec()))
            .ok_or_else(|| QsoError::UnboundGate {
                gate: gate.to_string(),
                qubits: qubits.to_vec(),
            })
    }

    /// Check whether a binding exists
    pub fn contains(&self, gate: &str, qubits: &[QubitId]) -> bool {
        self.get(gate, qubits).is_ok()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over all bindings
    pub fn iter(&self) -> impl Iterator<Item = (&BindingKey, &GateBinding)> {
        self.bindings.iter()
    }

    /// Iterate over all bindings, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&BindingKey, &mut GateBinding)> {
        self.bindings.iter_mut()
    }
}

// ============================================================================
// Serialized form: [{"key": [gate, q0, ...], "val": [overrides, scheduling]}]
// ============================================================================

/// One serialized binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingEntry {
    /// Gate name followed by qubits
    pub key: Vec<String>,
    /// Overrides and scheduling parameters
    pub val: (Params, SchedulingParams),
}

impl From<BindingTable> for Vec<BindingEntry> {
    fn from(table: BindingTable) -> Self {
        table
            .bindings
            .into_iter()
            .map(|((gate, qubits), binding)| {
                let mut key = Vec::with_capacity(qubits.len() + 1);
                key.push(gate);
                key.extend(qubits);
                BindingEntry {
                    key,
                    val: (binding.overrides, binding.scheduling),
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<BindingEntry>> for BindingTable {
    type Error = QsoError;

    fn try_from(entries: Vec<BindingEntry>) -> Result<Self, Self::Error> {
        let mut table = BindingTable::new();
        for entry in entries {
            let mut key = entry.key.into_iter();
            let gate = key.next().ok_or_else(|| {
                QsoError::ConfigurationError("binding with empty key".to_string())
            })?;
            let (overrides, scheduling) = entry.val;
            table.insert(
                &gate,
                key,
                GateBinding {
                    overrides,
                    scheduling,
                },
            );
        }
        Ok(table)
    }
}

// ============================================================================
// Tests
// ============================================================================
