//! Gate catalogue
//!
//! Gantree: L2_Builder → GateCatalogue
//!
//! Maps the gate names callers use (`RX`, `CZ`, `Measure`, ...) to
//! templates: qubit arity, ordered user parameters and a handler.

use crate::builder::Builder;
use qso_core::{ParamValue, Params, QsoError, QsoResult, QubitId, Time};
use qso_sim::Operation;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// GateCall
// ============================================================================

/// Fully resolved gate call handed to a handler
/// Gantree: GateCall // 해석된 호출
#[derive(Debug, Clone, PartialEq)]
pub struct GateCall {
    /// Gate name as called
    pub gate: String,
    /// Qubits in call order
    pub bits: Vec<QubitId>,
    /// Firing time
    pub time: Time,
    /// Binding overrides merged with caller parameters (caller wins)
    pub params: Params,
}

impl GateCall {
    /// Qubit at position `index`
    pub fn bit(&self, index: usize) -> QsoResult<&str> {
        self.bits
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| QsoError::ArityMismatch {
                gate: self.gate.clone(),
                expected: format!("at least {} qubits", index + 1),
                got: self.bits.len(),
            })
    }

    /// Raw parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Required numeric parameter
    pub fn number(&self, key: &str) -> QsoResult<f64> {
        match self.params.get(key) {
            Some(value) => value.as_f64().ok_or_else(|| self.invalid(key, value)),
            None => Err(QsoError::MissingParameter {
                gate: self.gate.clone(),
                param: key.to_string(),
            }),
        }
    }

    /// Optional numeric parameter with a fallback
    pub fn number_or(&self, key: &str, default: f64) -> QsoResult<f64> {
        match self.params.get(key) {
            Some(value) => value.as_f64().ok_or_else(|| self.invalid(key, value)),
            None => Ok(default),
        }
    }

    /// Required text parameter
    pub fn text(&self, key: &str) -> QsoResult<&str> {
        match self.params.get(key) {
            Some(value) => value.as_str().ok_or_else(|| self.invalid(key, value)),
            None => Err(QsoError::MissingParameter {
                gate: self.gate.clone(),
                param: key.to_string(),
            }),
        }
    }

    fn invalid(&self, key: &str, value: &ParamValue) -> QsoError {
        QsoError::InvalidParameter {
            gate: self.gate.clone(),
            param: key.to_string(),
            reason: format!("unexpected {} value '{}'", value.kind(), value),
        }
    }
}

// ============================================================================
// GateHandler
// ============================================================================

/// Builds one engine operation from a resolved call
pub type ConstructorFn = fn(&GateCall) -> QsoResult<Operation>;

/// Expands one logical gate by calling back into the builder
pub type CompositeFn = Arc<dyn Fn(&mut Builder, &GateCall) -> QsoResult<()> + Send + Sync>;

/// How a gate reaches the engine
/// Gantree: GateHandler // 핸들러
#[derive(Clone)]
pub enum GateHandler {
    /// Forwarded to the engine by name
    Primitive(String),
    /// Operation built here, then added to the engine
    Constructor(ConstructorFn),
    /// Composite expansion issuing further builder calls
    Composite(CompositeFn),
}

impl fmt::Debug for GateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateHandler::Primitive(name) => write!(f, "Primitive({})", name),
            GateHandler::Constructor(_) => write!(f, "Constructor(..)"),
            GateHandler::Composite(_) => write!(f, "Composite(..)"),
        }
    }
}

// ============================================================================
// GateTemplate
// ============================================================================

/// Catalogue entry
/// Gantree: GateTemplate // 게이트 템플릿
#[derive(Debug, Clone)]
pub struct GateTemplate {
    /// Template name, used when saving a setup
    pub name: String,
    /// Number of qubits
    pub num_qubits: usize,
    /// Ordered user parameter names
    pub user_params: Vec<String>,
    /// Dispatch target
    pub handler: GateHandler,
    /// Gate is its own inverse (replayed unchanged on reversal)
    pub self_inverse: bool,
}

impl GateTemplate {
    /// Template forwarding to an engine gate
    pub fn primitive(name: &str, engine_gate: &str, num_qubits: usize) -> Self {
        Self::with_handler(name, num_qubits, GateHandler::Primitive(engine_gate.to_string()))
    }

    /// Template building its own operation
    pub fn constructor(name: &str, num_qubits: usize, build: ConstructorFn) -> Self {
        Self::with_handler(name, num_qubits, GateHandler::Constructor(build))
    }

    /// Template expanding into further builder calls
    pub fn composite<F>(name: &str, num_qubits: usize, expand: F) -> Self
    where
        F: Fn(&mut Builder, &GateCall) -> QsoResult<()> + Send + Sync + 'static,
    {
        Self::with_handler(name, num_qubits, GateHandler::Composite(Arc::new(expand)))
    }

    fn with_handler(name: &str, num_qubits: usize, handler: GateHandler) -> Self {
        Self {
            name: name.to_string(),
            num_qubits,
            user_params: Vec::new(),
            handler,
            self_inverse: false,
        }
    }

    /// Set the ordered user parameter names
    pub fn with_params(mut self, params: &[&str]) -> Self {
        self.user_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Declare the gate self-inverse
    pub fn involutory(mut self) -> Self {
        self.self_inverse = true;
        self
    }

    /// Position of the `angle` user parameter, if declared
    pub fn angle_index(&self) -> Option<usize> {
        self.user_params.iter().position(|p| p == "angle")
    }

    /// Field count of a bare tuple descriptor (name + qubits + params)
    pub fn descriptor_len(&self) -> usize {
        1 + self.num_qubits + self.user_params.len()
    }
}

// ============================================================================
// GateCatalogue
// ============================================================================

/// Gate name -> template
/// Gantree: GateCatalogue // gate_dic
#[derive(Debug, Clone, Default)]
pub struct GateCatalogue {
    templates: BTreeMap<String, GateTemplate>,
}

impl GateCatalogue {
    /// Empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under a gate name
    pub fn insert(&mut self, gate: &str, template: GateTemplate) {
        self.templates.insert(gate.to_string(), template);
    }

    /// Builder-style insert
    pub fn with(mut self, gate: &str, template: GateTemplate) -> Self {
        self.insert(gate, template);
        self
    }

    /// Look up a template
    /// Gantree: get(gate) -> Result<&GateTemplate> // UnknownGate
    pub fn get(&self, gate: &str) -> QsoResult<&GateTemplate> {
        self.templates
            .get(gate)
            .ok_or_else(|| QsoError::UnknownGate(gate.to_string()))
    }

    /// Check whether a gate is known
    pub fn contains(&self, gate: &str) -> bool {
        self.templates.contains_key(gate)
    }

    /// Number of gates
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Iterate in gate-name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GateTemplate)> {
        self.templates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(params: Params) -> GateCall {
        GateCall {
            gate: "RX".into(),
            bits: vec!["a".into()],
            time: 10.0,
            params,
        }
    }

    #[test]
    fn test_template_shape() {
        let rx = GateTemplate::primitive("rotate_x", "rotate_x", 1).with_params(&["angle"]);
        assert_eq!(rx.descriptor_len(), 3);
        assert_eq!(rx.angle_index(), Some(0));
        assert!(!rx.self_inverse);

        let cz = GateTemplate::primitive("cphase", "cphase", 2).involutory();
        assert_eq!(cz.descriptor_len(), 3);
        assert_eq!(cz.angle_index(), None);
        assert!(cz.self_inverse);
    }

    #[test]
    fn test_catalogue_lookup() {
        let catalogue = GateCatalogue::new()
            .with("RX", GateTemplate::primitive("rotate_x", "rotate_x", 1));

        assert!(catalogue.contains("RX"));
        assert_eq!(catalogue.len(), 1);
        assert_eq!(
            catalogue.get("RY").unwrap_err(),
            QsoError::UnknownGate("RY".into())
        );
    }

    #[test]
    fn test_call_parameter_access() {
        let c = call(Params::from([
            ("angle".to_string(), ParamValue::Number(1.5)),
            ("output_bit".to_string(), ParamValue::Text("m".into())),
        ]));

        assert_eq!(c.bit(0).unwrap(), "a");
        assert!(c.bit(1).is_err());
        assert_eq!(c.number("angle").unwrap(), 1.5);
        assert_eq!(c.number_or("interval_time", 0.0).unwrap(), 0.0);
        assert_eq!(c.text("output_bit").unwrap(), "m");

        assert!(matches!(
            c.number("missing"),
            Err(QsoError::MissingParameter { .. })
        ));
        assert!(matches!(
            c.number("output_bit"),
            Err(QsoError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_handler_debug() {
        let t = GateTemplate::primitive("iswap", "iswap", 2);
        assert_eq!(format!("{:?}", t.handler), "Primitive(iswap)");
    }
}
