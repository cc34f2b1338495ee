//! Qubit clock registry
//!
//! Gantree: L2_Builder → QubitClocks
//!
//! One timestamp per qubit: the earliest time the next gate may start.
//! Clocks only move forward.

use qso_core::{QsoError, QsoResult, QubitId, Time};
use std::collections::BTreeMap;

/// Per-qubit clocks
/// Gantree: QubitClocks // times
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QubitClocks {
    clocks: BTreeMap<QubitId, Time>,
}

impl QubitClocks {
    /// Clocks at zero for every given qubit
    pub fn new<Q: Into<QubitId>>(qubits: impl IntoIterator<Item = Q>) -> Self {
        Self {
            clocks: qubits.into_iter().map(|q| (q.into(), 0.0)).collect(),
        }
    }

    /// Current clock of a qubit
    /// Gantree: clock_of(q) -> Result<Time> // NotFound
    pub fn clock_of(&self, qubit: &str) -> QsoResult<Time> {
        self.clocks
            .get(qubit)
            .copied()
            .ok_or_else(|| QsoError::NotFound(qubit.to_string()))
    }

    /// Move a clock to `max(current, time)`; returns the new value
    /// Gantree: advance(q,t) -> Result<Time> // never regresses
    pub fn advance(&mut self, qubit: &str, time: Time) -> QsoResult<Time> {
        let clock = self
            .clocks
            .get_mut(qubit)
            .ok_or_else(|| QsoError::NotFound(qubit.to_string()))?;
        *clock = clock.max(time);
        Ok(*clock)
    }

    /// Latest clock over a set of qubits (0 for an empty set)
    pub fn latest(&self, qubits: &[QubitId]) -> QsoResult<Time> {
        qubits
            .iter()
            .try_fold(0.0, |acc: Time, q| Ok(acc.max(self.clock_of(q)?)))
    }

    /// Latest clock over every qubit
    pub fn max_time(&self) -> Time {
        self.clocks.values().cloned().fold(0.0, f64::max)
    }

    /// Check if a qubit has a clock
    pub fn contains(&self, qubit: &str) -> bool {
        self.clocks.contains_key(qubit)
    }

    /// Number of clocks
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Iterate in qubit order
    pub fn iter(&self) -> impl Iterator<Item = (&QubitId, &Time)> {
        self.clocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let clocks = QubitClocks::new(["a", "b"]);
        assert_eq!(clocks.len(), 2);
        assert_eq!(clocks.clock_of("a").unwrap(), 0.0);
        assert_eq!(clocks.max_time(), 0.0);
    }

    #[test]
    fn test_advance_never_regresses() {
        let mut clocks = QubitClocks::new(["a"]);
        assert_eq!(clocks.advance("a", 20.0).unwrap(), 20.0);
        assert_eq!(clocks.advance("a", 5.0).unwrap(), 20.0);
        assert_eq!(clocks.clock_of("a").unwrap(), 20.0);
    }

    #[test]
    fn test_latest_and_unknown() {
        let mut clocks = QubitClocks::new(["a", "b"]);
        clocks.advance("b", 40.0).unwrap();

        let pair = vec!["a".to_string(), "b".to_string()];
        assert_eq!(clocks.latest(&pair).unwrap(), 40.0);
        assert_eq!(clocks.latest(&[]).unwrap(), 0.0);

        let err = clocks.latest(&["c".to_string()]).unwrap_err();
        assert_eq!(err, QsoError::NotFound("c".into()));
        assert!(clocks.advance("c", 1.0).is_err());
    }
}
