//! Recording simulation circuit
//!
//! Gantree: L1_Engine → SimCircuit
//!
//! Reference [`Engine`]: registers bits, records operations with stable ids,
//! backfills idle periods and orders the result. No state evolution.

use crate::engine::{EndTime, Engine};
use crate::operation::{Operation, OperationId, OperationKind};
use crate::sampler::SharedSampler;
use qso_core::{ParamValue, Params, QsoError, QsoResult, QubitId, Time};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;

/// Idle gaps shorter than this are not backfilled
const MIN_IDLE: Time = 1e-9;

/// A registered bit
#[derive(Debug, Clone, Copy, PartialEq)]
enum Bit {
    Quantum { t1: f64, t2: f64 },
    Classical,
}

/// Recording circuit
/// Gantree: SimCircuit // 기록 회로
#[derive(Debug, Clone)]
pub struct SimCircuit {
    title: String,
    bits: BTreeMap<QubitId, Bit>,
    operations: Vec<Operation>,
    next_id: u64,
}

impl SimCircuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an empty circuit
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            bits: BTreeMap::new(),
            operations: Vec::new(),
            next_id: 0,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Registered qubit names (classical bits excluded)
    pub fn qubit_names(&self) -> Vec<&str> {
        self.bits
            .iter()
            .filter(|(_, b)| matches!(b, Bit::Quantum { .. }))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Registered classical bit names
    pub fn classical_bit_names(&self) -> Vec<&str> {
        self.bits
            .iter()
            .filter(|(_, b)| matches!(b, Bit::Classical))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Decoherence times of a qubit
    pub fn decoherence(&self, name: &str) -> Option<(f64, f64)> {
        match self.bits.get(name) {
            Some(Bit::Quantum { t1, t2 }) => Some((*t1, *t2)),
            _ => None,
        }
    }

    /// Number of recorded operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if no operation was recorded
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn register(&mut self, name: &str, bit: Bit) -> QsoResult<()> {
        if self.bits.contains_key(name) {
            return Err(QsoError::DuplicateQubit(name.to_string()));
        }
        self.bits.insert(name.to_string(), bit);
        Ok(())
    }

    fn check_bits(&self, bits: &[QubitId]) -> QsoResult<()> {
        match bits.iter().find(|b| !self.bits.contains_key(b.as_str())) {
            Some(missing) => Err(QsoError::NotFound(missing.clone())),
            None => Ok(()),
        }
    }

    fn push(&mut self, mut op: Operation) -> OperationId {
        let id = OperationId(self.next_id);
        self.next_id += 1;
        op.assign_id(id);
        log::trace!("{}: recorded {}", self.title, op);
        self.operations.push(op);
        id
    }

    /// Firing times of non-idle operations on one bit
    fn busy_times(&self, bit: &str) -> Vec<Time> {
        let mut times: Vec<Time> = self
            .operations
            .iter()
            .filter(|op| !op.is_waiting() && op.involves(bit))
            .map(|op| op.time)
            .collect();
        times.sort_by(|a, b| a.total_cmp(b));
        times
    }
}

impl Engine for SimCircuit {
    fn title(&self) -> &str {
        &self.title
    }

    fn new_empty(&self, title: &str) -> Box<dyn Engine> {
        Box::new(SimCircuit::new(title))
    }

    fn add_qubit(&mut self, name: &str, t1: f64, t2: f64) -> QsoResult<()> {
        self.register(name, Bit::Quantum { t1, t2 })
    }

    fn add_classical_bit(&mut self, name: &str) -> QsoResult<()> {
        self.register(name, Bit::Classical)
    }

    fn has_bit(&self, name: &str) -> bool {
        self.bits.contains_key(name)
    }

    fn add_gate(
        &mut self,
        name: &str,
        bits: &[QubitId],
        time: Time,
        params: &Params,
    ) -> QsoResult<OperationId> {
        self.check_bits(bits)?;
        Ok(self.push(Operation::gate(name, bits.to_vec(), time, params.clone())))
    }

    fn add_operation(&mut self, op: Operation) -> QsoResult<OperationId> {
        self.check_bits(&op.bits)?;
        Ok(self.push(op))
    }

    fn add_measurement(
        &mut self,
        bit: &str,
        time: Time,
        sampler: SharedSampler,
        output_bit: &str,
        real_output_bit: Option<&str>,
    ) -> QsoResult<OperationId> {
        match self.bits.get(bit) {
            Some(Bit::Quantum { .. }) => {}
            Some(Bit::Classical) => {
                return Err(QsoError::EngineError(format!(
                    "cannot measure classical bit '{}'",
                    bit
                )))
            }
            None => return Err(QsoError::NotFound(bit.to_string())),
        }

        let mut bits = vec![bit.to_string(), output_bit.to_string()];
        if let Some(real) = real_output_bit {
            bits.push(real.to_string());
        }
        self.check_bits(&bits)?;

        let mut op = Operation::gate("measure", bits, time, Params::new());
        op.kind = OperationKind::Measurement {
            output_bit: output_bit.to_string(),
            real_output_bit: real_output_bit.map(str::to_string),
            sampler,
        };
        Ok(self.push(op))
    }

    fn add_waiting_gates(&mut self, tmin: Time, tmax: &EndTime) -> QsoResult<usize> {
        let qubits: Vec<(QubitId, f64, f64)> = self
            .bits
            .iter()
            .filter_map(|(name, bit)| match bit {
                Bit::Quantum { t1, t2 } => Some((name.clone(), *t1, *t2)),
                Bit::Classical => None,
            })
            .collect();

        let mut added = 0;
        for (name, t1, t2) in qubits {
            let Some(end) = tmax.for_bit(&name) else {
                continue;
            };

            let mut points = vec![tmin];
            points.extend(
                self.busy_times(&name)
                    .into_iter()
                    .filter(|&t| t >= tmin && t <= end),
            );
            points.push(end);

            for window in points.windows(2) {
                let (start, stop) = (window[0], window[1]);
                if stop - start <= MIN_IDLE {
                    continue;
                }
                let params = Params::from([
                    ("t1".to_string(), ParamValue::Number(t1)),
                    ("t2".to_string(), ParamValue::Number(t2)),
                ]);
                self.push(Operation::waiting(
                    &name,
                    (start + stop) / 2.0,
                    stop - start,
                    params,
                ));
                added += 1;
            }
        }

        log::debug!(
            "{}: backfilled {} idle periods up to {:.1}",
            self.title,
            added,
            tmax.max()
        );
        Ok(added)
    }

    fn order(&mut self) -> QsoResult<()> {
        let n = self.operations.len();

        // Per-bit chains in (time, insertion) order; consecutive links are edges.
        let mut chains: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, op) in self.operations.iter().enumerate() {
            // A bit listed twice on one operation is still one link
            let mut seen: Vec<&str> = Vec::with_capacity(op.bits.len());
            for bit in &op.bits {
                if seen.contains(&bit.as_str()) {
                    continue;
                }
                seen.push(bit.as_str());
                chains.entry(bit.as_str()).or_default().push(idx);
            }
        }

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        for chain in chains.values_mut() {
            chain.sort_by(|&a, &b| {
                self.operations[a]
                    .time
                    .total_cmp(&self.operations[b].time)
                    .then(a.cmp(&b))
            });
            for pair in chain.windows(2) {
                successors[pair[0]].push(pair[1]);
                in_degree[pair[1]] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(Reverse)
            .collect();
        let mut sequence = Vec::with_capacity(n);
        while let Some(Reverse(idx)) = ready.pop() {
            sequence.push(idx);
            for &next in &successors[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if sequence.len() != n {
            return Err(QsoError::EngineError(
                "dependency cycle while ordering operations".to_string(),
            ));
        }

        let mut slots: Vec<Option<Operation>> =
            std::mem::take(&mut self.operations).into_iter().map(Some).collect();
        self.operations = sequence
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect();
        Ok(())
    }

    fn sort_by_time(&mut self) {
        self.operations.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    fn operations(&self) -> &[Operation] {
        &self.operations
    }

    fn operations_mut(&mut self) -> &mut [Operation] {
        &mut self.operations
    }
}

impl fmt::Display for SimCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SimCircuit '{}':", self.title)?;
        writeln!(f, "  Qubits: {}", self.qubit_names().len())?;
        writeln!(f, "  Classical bits: {}", self.classical_bit_names().len())?;
        writeln!(f, "  Operations: {}", self.operations.len())?;
        for op in &self.operations {
            writeln!(f, "    {}", op)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{share, UniformNoisySampler};

    fn two_qubit_circuit() -> SimCircuit {
        let mut c = SimCircuit::new("test");
        c.add_qubit("a", 30_000.0, 20_000.0).unwrap();
        c.add_qubit("b", f64::INFINITY, f64::INFINITY).unwrap();
        c.add_classical_bit("m").unwrap();
        c
    }

    #[test]
    fn test_registration() {
        let mut c = two_qubit_circuit();
        assert!(c.has_bit("a"));
        assert!(c.has_bit("m"));
        assert_eq!(c.qubit_names(), vec!["a", "b"]);
        assert_eq!(c.classical_bit_names(), vec!["m"]);
        assert_eq!(c.decoherence("a"), Some((30_000.0, 20_000.0)));
        assert_eq!(c.decoherence("m"), None);

        let err = c.add_qubit("a", 1.0, 1.0).unwrap_err();
        assert_eq!(err, QsoError::DuplicateQubit("a".into()));
    }

    #[test]
    fn test_unknown_bit_rejected() {
        let mut c = two_qubit_circuit();
        let err = c
            .add_gate("rotate_x", &["z".to_string()], 0.0, &Params::new())
            .unwrap_err();
        assert_eq!(err, QsoError::NotFound("z".into()));
        assert!(c.is_empty());
    }

    #[test]
    fn test_ids_and_recent() {
        let mut c = two_qubit_circuit();
        let first = c
            .add_gate("rotate_x", &["a".to_string()], 10.0, &Params::new())
            .unwrap();
        let second = c
            .add_gate("cphase", &["a".to_string(), "b".to_string()], 30.0, &Params::new())
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(c.recent(1), Some(second));
        assert_eq!(c.recent(2), Some(first));
        assert_eq!(c.recent(3), None);
        assert_eq!(c.recent(0), None);
        assert_eq!(c.operation(first).unwrap().name, "rotate_x");
    }

    #[test]
    fn test_measurement() {
        let mut c = two_qubit_circuit();
        let sampler = share(UniformNoisySampler::new(1, 0.0).unwrap());

        let id = c
            .add_measurement("a", 50.0, sampler.clone(), "m", None)
            .unwrap();
        let op = c.operation(id).unwrap();
        assert!(op.is_measurement());
        assert!(op.involves("m"));

        let err = c.add_measurement("m", 60.0, sampler.clone(), "m", None);
        assert!(matches!(err, Err(QsoError::EngineError(_))));

        let err = c.add_measurement("a", 60.0, sampler, "missing", None);
        assert_eq!(err.unwrap_err(), QsoError::NotFound("missing".into()));
    }

    #[test]
    fn test_waiting_gates_fill_gaps() {
        let mut c = two_qubit_circuit();
        c.add_gate("rotate_x", &["a".to_string()], 10.0, &Params::new())
            .unwrap();
        c.add_gate("rotate_x", &["a".to_string()], 30.0, &Params::new())
            .unwrap();

        // a: [0,10], [10,30], [30,40]; b: [0,40]
        let added = c.add_waiting_gates(0.0, &EndTime::Uniform(40.0)).unwrap();
        assert_eq!(added, 4);

        let waits_a: Vec<&Operation> = c
            .operations()
            .iter()
            .filter(|op| op.is_waiting() && op.involves("a"))
            .collect();
        assert_eq!(waits_a.len(), 3);
        assert_eq!(waits_a[0].time, 5.0);
        assert_eq!(waits_a[1].time, 20.0);
        assert!(matches!(
            waits_a[2].kind,
            OperationKind::Waiting { duration } if (duration - 10.0).abs() < 1e-12
        ));

        // Classical bits get nothing
        assert!(!c.operations().iter().any(|op| op.is_waiting() && op.involves("m")));
    }

    #[test]
    fn test_waiting_gates_per_bit() {
        let mut c = two_qubit_circuit();
        let end = EndTime::PerBit(BTreeMap::from([("a".to_string(), 25.0)]));
        assert_eq!(c.add_waiting_gates(0.0, &end).unwrap(), 1);
        assert!(c.operations()[0].involves("a"));
    }

    #[test]
    fn test_sort_by_time_is_stable() {
        let mut c = two_qubit_circuit();
        c.add_gate("late", &["a".to_string()], 30.0, &Params::new())
            .unwrap();
        c.add_gate("early_1", &["b".to_string()], 10.0, &Params::new())
            .unwrap();
        c.add_gate("early_2", &["a".to_string()], 10.0, &Params::new())
            .unwrap();

        c.sort_by_time();
        let names: Vec<&str> = c.operations().iter().map(|op| op.name.as_str()).collect();
        assert_eq!(names, vec!["early_1", "early_2", "late"]);
    }

    #[test]
    fn test_order_respects_bit_dependencies() {
        let mut c = two_qubit_circuit();
        // Inserted out of time order on `a`
        c.add_gate("second", &["a".to_string()], 20.0, &Params::new())
            .unwrap();
        c.add_gate("other", &["b".to_string()], 50.0, &Params::new())
            .unwrap();
        c.add_gate("first", &["a".to_string()], 10.0, &Params::new())
            .unwrap();

        c.order().unwrap();
        let names: Vec<&str> = c.operations().iter().map(|op| op.name.as_str()).collect();
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("first") < pos("second"));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_order_with_repeated_bit() {
        let mut c = two_qubit_circuit();
        c.add_gate("late", &["a".to_string()], 30.0, &Params::new())
            .unwrap();
        c.add_gate(
            "doubled",
            &["a".to_string(), "a".to_string()],
            10.0,
            &Params::new(),
        )
        .unwrap();

        c.order().unwrap();
        let names: Vec<&str> = c.operations().iter().map(|op| op.name.as_str()).collect();
        assert_eq!(names, vec!["doubled", "late"]);
    }
}
