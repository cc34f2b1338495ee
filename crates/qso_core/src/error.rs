//! Error types for QSO
//!
//! Gantree: L0_Foundation → Errors
//!
//! Every failure a circuit build can hit is a variant of [`QsoError`].
//! Errors propagate to the immediate caller; nothing retries.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use crate::types::{Params, QubitId};
use thiserror::Error;

/// Main error type for QSO
/// Gantree: QsoError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QsoError {
    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// Qubit (or classical bit) not declared
    /// Gantree: NotFound(QubitId) // 미등록 큐비트
    #[error("Qubit '{0}' not found")]
    NotFound(QubitId),

    /// Gate name absent from the catalogue
    /// Gantree: UnknownGate(String) // 미등록 게이트
    #[error("Unknown gate '{0}': not in the gate catalogue")]
    UnknownGate(String),

    /// No binding for this gate/qubit combination
    /// Gantree: UnboundGate{{gate,qubits}} // 미설정 조합
    #[error("Gate '{gate}' is not configured on qubits {qubits:?}")]
    UnboundGate { gate: String, qubits: Vec<QubitId> },

    /// Qubit declared twice in one circuit
    #[error("Qubit '{0}' declared twice")]
    DuplicateQubit(QubitId),

    // ========================================================================
    // Descriptor Errors
    // ========================================================================
    /// Descriptor length inconsistent with template arity / parameter count
    /// Gantree: ArityMismatch{{gate,expected,got}} // 길이 불일치
    #[error("Descriptor for '{gate}' has {got} fields, expected {expected}")]
    ArityMismatch {
        gate: String,
        expected: String,
        got: usize,
    },

    /// Descriptor field of the wrong kind (e.g. numeric qubit name)
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A user parameter declared by the template was not supplied
    #[error("Gate '{gate}' requires parameter '{param}'")]
    MissingParameter { gate: String, param: String },

    /// A parameter has an unusable value
    #[error("Invalid parameter '{param}' for gate '{gate}': {reason}")]
    InvalidParameter {
        gate: String,
        param: String,
        reason: String,
    },

    /// Gate cannot be replayed in reverse
    #[error("Gate '{0}' is neither self-inverse nor angle-parameterised; cannot reverse")]
    NotReversible(String),

    // ========================================================================
    // Import Errors
    // ========================================================================
    /// A text import line could not be turned into a gate
    /// Gantree: ParseError{{line,gate,qubits,params}} // 가져오기 실패
    #[error(
        "Import failed at line {line_no} '{line}': {reason} \
         (gate: {gate:?}, qubits: {qubits:?}, params: {params:?})"
    )]
    ParseError {
        line_no: usize,
        line: String,
        gate: Option<String>,
        qubits: Vec<QubitId>,
        params: Params,
        reason: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Shared configuration incomplete (e.g. missing sampler seed)
    /// Gantree: ConfigurationError(String) // 설정
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// Simulation engine rejected an instruction
    #[error("Engine error: {0}")]
    EngineError(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),
}

/// Result type alias for QSO operations
/// Gantree: QsoResult<T> // type alias
pub type QsoResult<T> = Result<T, QsoError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QsoError {
    fn from(err: serde_json::Error) -> Self {
        QsoError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for QsoError {
    fn from(err: std::io::Error) -> Self {
        QsoError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QsoError {
    /// Check if error comes from a catalogue, binding or qubit lookup
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            QsoError::NotFound(_)
                | QsoError::UnknownGate(_)
                | QsoError::UnboundGate { .. }
                | QsoError::DuplicateQubit(_)
        )
    }

    /// Check if error is a malformed descriptor or parameter
    pub fn is_descriptor_error(&self) -> bool {
        matches!(
            self,
            QsoError::ArityMismatch { .. }
                | QsoError::InvalidDescriptor(_)
                | QsoError::MissingParameter { .. }
                | QsoError::InvalidParameter { .. }
                | QsoError::ParseError { .. }
        )
    }

    /// Check if error is a configuration problem
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            QsoError::ConfigurationError(_) | QsoError::JsonError(_) | QsoError::FileError(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
