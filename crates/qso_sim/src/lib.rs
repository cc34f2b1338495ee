//! # QSO Sim
//!
//! Simulation engine contract for the Quantum Schedule Overlay, plus a
//! recording reference circuit and the shared measurement sampler.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qso_sim // L1: Engine (완료)
//!     Operation // 연산 + 안정 핸들 (완료)
//!     Sampler // 공유 측정 샘플러 (완료)
//!     Engine // builder가 쓰는 trait (완료)
//!     SimCircuit // 기록 회로 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qso_sim::prelude::*;
//! use qso_core::Params;
//!
//! let mut circuit = SimCircuit::new("demo");
//! circuit.add_qubit("a", 30_000.0, 20_000.0).unwrap();
//!
//! circuit.add_gate("rotate_x", &["a".to_string()], 10.0, &Params::new()).unwrap();
//! circuit.add_waiting_gates(0.0, &EndTime::Uniform(40.0)).unwrap();
//! circuit.sort_by_time();
//!
//! assert_eq!(circuit.operations().len(), 3);
//! assert!(circuit.operations()[0].is_waiting());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Operations and handles (Gantree: L1_Engine → Operation)
pub mod operation;

/// Measurement samplers (Gantree: L1_Engine → Sampler)
pub mod sampler;

/// Engine trait (Gantree: L1_Engine → Engine)
pub mod engine;

/// Reference circuit (Gantree: L1_Engine → SimCircuit)
pub mod circuit;

// ============================================================================
// Re-exports
// ============================================================================

pub use circuit::SimCircuit;
pub use engine::{EndTime, Engine};
pub use operation::{Operation, OperationId, OperationKind};
pub use sampler::{share, MeasurementOutcome, MeasurementSampler, SharedSampler, UniformNoisySampler};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qso_sim::prelude::*;
    //! ```

    pub use crate::circuit::SimCircuit;
    pub use crate::engine::{EndTime, Engine};
    pub use crate::operation::{Operation, OperationId, OperationKind};
    pub use crate::sampler::{
        share, MeasurementOutcome, MeasurementSampler, SharedSampler, UniformNoisySampler,
    };
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
