//! Simulation engine contract
//!
//! Gantree: L1_Engine → Engine
//!
//! The builder never looks inside the engine's circuit. It registers bits,
//! forwards fully-parameterised instructions, asks for idle backfill and
//! ordering at finalize time, and reads back operations for handles.

use crate::operation::{Operation, OperationId};
use crate::sampler::SharedSampler;
use qso_core::{Params, QsoResult, QubitId, Time};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound of the idle backfill
/// Gantree: EndTime // 종료 시간
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EndTime {
    /// Same end time for every bit
    Uniform(Time),
    /// Per-bit end times; bits without an entry get no backfill
    PerBit(BTreeMap<QubitId, Time>),
}

impl EndTime {
    /// End time for one bit
    pub fn for_bit(&self, bit: &str) -> Option<Time> {
        match self {
            EndTime::Uniform(t) => Some(*t),
            EndTime::PerBit(map) => map.get(bit).copied(),
        }
    }

    /// Latest end time across all bits
    pub fn max(&self) -> Time {
        match self {
            EndTime::Uniform(t) => *t,
            EndTime::PerBit(map) => map.values().cloned().fold(0.0, f64::max),
        }
    }
}

/// Simulation engine consumed by the builder
/// Gantree: Engine // trait
pub trait Engine: fmt::Debug {
    /// Circuit title
    fn title(&self) -> &str;

    /// Empty engine of the same kind (used for new circuits and reversal)
    fn new_empty(&self, title: &str) -> Box<dyn Engine>;

    /// Register a qubit with its decoherence times
    fn add_qubit(&mut self, name: &str, t1: f64, t2: f64) -> QsoResult<()>;

    /// Register a classical bit
    fn add_classical_bit(&mut self, name: &str) -> QsoResult<()>;

    /// Check whether a bit is registered
    fn has_bit(&self, name: &str) -> bool;

    /// Add a named primitive gate
    fn add_gate(
        &mut self,
        name: &str,
        bits: &[QubitId],
        time: Time,
        params: &Params,
    ) -> QsoResult<OperationId>;

    /// Add a pre-built operation
    fn add_operation(&mut self, op: Operation) -> QsoResult<OperationId>;

    /// Add a measurement writing `output_bit`
    fn add_measurement(
        &mut self,
        bit: &str,
        time: Time,
        sampler: SharedSampler,
        output_bit: &str,
        real_output_bit: Option<&str>,
    ) -> QsoResult<OperationId>;

    /// Fill idle periods of every qubit between `tmin` and `tmax`
    fn add_waiting_gates(&mut self, tmin: Time, tmax: &EndTime) -> QsoResult<usize>;

    /// Establish a dependency-respecting order
    fn order(&mut self) -> QsoResult<()>;

    /// Stable sort of all operations by firing time
    fn sort_by_time(&mut self);

    /// All operations in current order
    fn operations(&self) -> &[Operation];

    /// Mutable access to operations
    fn operations_mut(&mut self) -> &mut [Operation];

    /// Look up an operation by id
    fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations().iter().find(|op| op.id() == id)
    }

    /// Look up an operation by id, mutably
    fn operation_mut(&mut self, id: OperationId) -> Option<&mut Operation> {
        self.operations_mut().iter_mut().find(|op| op.id() == id)
    }

    /// Id of the operation `back` positions from the end (1 = last)
    fn recent(&self, back: usize) -> Option<OperationId> {
        let ops = self.operations();
        if back == 0 || back > ops.len() {
            return None;
        }
        Some(ops[ops.len() - back].id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_time() {
        let uniform = EndTime::Uniform(100.0);
        assert_eq!(uniform.for_bit("any"), Some(100.0));
        assert_eq!(uniform.max(), 100.0);

        let per_bit = EndTime::PerBit(BTreeMap::from([
            ("a".to_string(), 50.0),
            ("b".to_string(), 80.0),
        ]));
        assert_eq!(per_bit.for_bit("a"), Some(50.0));
        assert_eq!(per_bit.for_bit("c"), None);
        assert_eq!(per_bit.max(), 80.0);
    }
}
