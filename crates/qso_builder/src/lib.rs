//! # QSO Builder
//!
//! Timed gate sequences for simulation engines: per-qubit clocks, a
//! replayable circuit log, tuple and text descriptor forms, simultaneous
//! groups, reversal, finalization and named update rules.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qso_builder // L2: Builder (완료)
//!     GateCatalogue // 이름 -> 템플릿 (완료)
//!     QubitClocks // 큐비트별 시계 (완료)
//!     Descriptor // 튜플 형식, GateRequest, Instruction (완료)
//!     Import // 텍스트 한 줄 = 게이트 하나 (완료)
//!     Builder // 스케줄러 + 기록기 (완료)
//!         SuppressLog // 재진입 가드 (완료)
//!     Reverse // 역회로 (완료)
//!     Library // 표준 게이트 (완료)
//!     Setup // JSON 설정 + 공유 샘플러 (완료)
//!     Update // 이름 있는 갱신 규칙 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qso_builder::prelude::*;
//!
//! let setup = Setup::new()
//!     .with_qubit("a", QubitConfig::new(30_000.0, 20_000.0))
//!     .with_gate("RX", library::template("rotate_x").unwrap())
//!     .with_binding("RX", ["a"], GateBinding::new(SchedulingParams::new(20.0)))
//!     .into_shared();
//!
//! let mut builder = Builder::new(setup).unwrap();
//! builder.add_gate(GateRequest::new("RX", ["a"]).param("angle", 0.5)).unwrap();
//! builder
//!     .add_qasm(["RX a 0.25;"], TokenOrder::QubitsFirst, &Params::new())
//!     .unwrap();
//!
//! assert_eq!(builder.clock_of("a").unwrap(), 40.0);
//! assert_eq!(builder.log().len(), 2);
//!
//! let reversed = builder.reverse("undo", true).unwrap();
//! assert_eq!(reversed.log()[0].params, vec![ParamValue::Number(-0.25)]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Gate catalogue (Gantree: L2_Builder → GateCatalogue)
pub mod catalogue;

/// Qubit clocks (Gantree: L2_Builder → QubitClocks)
pub mod clock;

/// Descriptors and requests (Gantree: L2_Builder → Descriptor)
pub mod descriptor;

/// Text import (Gantree: L2_Builder → Import)
pub mod import;

/// Scheduler / recorder (Gantree: L2_Builder → Builder)
pub mod builder;

/// Reversal (Gantree: L2_Builder → Reverse)
pub mod reverse;

/// Standard gates (Gantree: L2_Builder → Library)
pub mod library;

/// Shared configuration (Gantree: L2_Builder → Setup)
pub mod setup;

/// Update rules (Gantree: L2_Builder → Update)
pub mod update;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{Builder, BuilderOptions, Padding};
pub use catalogue::{GateCall, GateCatalogue, GateHandler, GateTemplate};
pub use clock::QubitClocks;
pub use descriptor::{GateDescriptor, GateRequest, Instruction};
pub use import::TokenOrder;
pub use setup::Setup;
pub use update::{UpdateFn, UpdateRegistry};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qso_builder::prelude::*;
    //! ```

    pub use crate::builder::{Builder, BuilderOptions, Padding};
    pub use crate::catalogue::{GateCall, GateCatalogue, GateHandler, GateTemplate};
    pub use crate::clock::QubitClocks;
    pub use crate::descriptor::{GateDescriptor, GateRequest, Instruction};
    pub use crate::import::TokenOrder;
    pub use crate::library;
    pub use crate::setup::Setup;
    pub use crate::update::{UpdateFn, UpdateRegistry};

    pub use qso_core::prelude::*;
    pub use qso_sim::prelude::*;
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
