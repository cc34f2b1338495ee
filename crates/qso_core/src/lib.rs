//! # QSO Core
//!
//! Foundation types for the Quantum Schedule Overlay: parameter values,
//! errors, qubit configuration and the gate binding table.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qso_core // L0: Foundation (완료)
//!     CoreTypes // QubitId, Time, ParamValue, Params (완료)
//!     Errors // QsoError, QsoResult (완료)
//!     QubitConfig // 큐비트 설정 (완료)
//!     GateBinding // (gate, qubits) -> overrides + timing (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qso_core::prelude::*;
//!
//! let bindings = BindingTable::new()
//!     .with("X", ["a"], GateBinding::new(SchedulingParams::new(20.0)))
//!     .with(
//!         "CZ",
//!         ["a", "b"],
//!         GateBinding::new(SchedulingParams::new(40.0).with_offset(5.0)),
//!     );
//!
//! let x = bindings.get("X", &["a".to_string()]).unwrap();
//! assert_eq!(x.scheduling.firing_offset(), 10.0);
//! assert!(bindings.get("X", &["b".to_string()]).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Qubit configuration (Gantree: L0_Foundation → QubitConfig)
pub mod qubit;

/// Gate bindings (Gantree: L0_Foundation → GateBinding)
pub mod binding;

// ============================================================================
// Re-exports
// ============================================================================

pub use binding::{BindingKey, BindingTable, GateBinding, SchedulingParams};
pub use error::{QsoError, QsoResult};
pub use qubit::QubitConfig;
pub use types::{ParamValue, Params, QubitId, Time};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qso_core::prelude::*;
    //! ```

    pub use crate::binding::{BindingKey, BindingTable, GateBinding, SchedulingParams};
    pub use crate::error::{QsoError, QsoResult};
    pub use crate::qubit::QubitConfig;
    pub use crate::types::{ParamValue, Params, QubitId, Time};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_binding_override_merge_inputs() {
        let binding = GateBinding::new(SchedulingParams::new(30.0))
            .with_override("dephase_var", 0.02)
            .with_override("label", "fast");

        assert_eq!(binding.overrides.len(), 2);
        assert_eq!(
            binding.overrides["dephase_var"],
            ParamValue::Number(0.02)
        );
        assert_eq!(binding.scheduling.firing_offset(), 15.0);
    }

    #[test]
    fn test_qubit_set_json() {
        let json = r#"{
            "q0": {"t1": 30000, "t2": 20000, "readout_error": 0.005},
            "c0": {"classical": true}
        }"#;
        let qubits: std::collections::BTreeMap<QubitId, QubitConfig> =
            serde_json::from_str(json).unwrap();

        assert_eq!(qubits.len(), 2);
        assert!(qubits["c0"].classical);
        assert_eq!(qubits["q0"].readout_error, Some(0.005));
    }

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "qso_core");
    }
}
