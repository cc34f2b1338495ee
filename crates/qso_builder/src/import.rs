//! Line-oriented text import
//!
//! Gantree: L2_Builder → Import
//!
//! Grammar, one gate per line:
//!
//! ```text
//! GATE ARG ARG ...;        // tokens split on ' ' or ','
//! measure Q -> C;          // measurement into classical bit C
//! ```
//!
//! Blank lines and `//` comments are skipped. Non-qubit tokens become
//! numbers when they parse as one, text otherwise.

use crate::catalogue::GateCatalogue;
use crate::descriptor::GateRequest;
use qso_core::{ParamValue, Params, QsoError, QubitId};
use serde::{Deserialize, Serialize};

/// Gate name used for the `measure q -> c` form
pub const MEASURE_GATE: &str = "Measure";

/// Parameter receiving the classical bit of a measurement
pub const OUTPUT_BIT_PARAM: &str = "output_bit";

/// Token order after the gate name
/// Gantree: TokenOrder // qubits_first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenOrder {
    /// `GATE q0 q1 p0 p1`
    #[default]
    QubitsFirst,
    /// `GATE p0 p1 q0 q1`
    ParamsFirst,
}

/// Strip comments, whitespace and the trailing `;`; `None` for lines to skip
pub fn clean_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return None;
    }
    let line = line.strip_suffix(';').unwrap_or(line).trim_end();
    (!line.is_empty()).then_some(line)
}

/// Split a cleaned line into tokens
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split([' ', ','])
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parse one cleaned line into a request
/// Gantree: parse_line(line,..) -> Result<GateRequest> // ParseError
///
/// `defaults` are merged into the call unless the line sets the same name.
pub fn parse_line(
    line_no: usize,
    line: &str,
    catalogue: &GateCatalogue,
    order: TokenOrder,
    defaults: &Params,
) -> Result<GateRequest, QsoError> {
    let tokens = tokenize(line);
    let Some((&gate, args)) = tokens.split_first() else {
        return Err(parse_error(line_no, line, None, Vec::new(), Params::new(), "empty line"));
    };

    if gate == "measure" {
        return match args {
            [qubit, "->", output] => Ok(GateRequest::new(MEASURE_GATE, [*qubit])
                .param(OUTPUT_BIT_PARAM, *output)
                .with_defaults(defaults)),
            _ => Err(parse_error(
                line_no,
                line,
                Some(MEASURE_GATE),
                Vec::new(),
                Params::new(),
                "expected 'measure <qubit> -> <bit>'",
            )),
        };
    }

    let template = catalogue.get(gate).map_err(|e| {
        parse_error(line_no, line, Some(gate), Vec::new(), Params::new(), &e.to_string())
    })?;

    let num_qubits = template.num_qubits;
    let num_params = template.user_params.len();
    let (qubit_tokens, param_tokens) = match order {
        TokenOrder::QubitsFirst => (
            args.get(..num_qubits),
            args.get(num_qubits..(num_qubits + num_params).min(args.len())),
        ),
        TokenOrder::ParamsFirst => (
            args.get(num_params..(num_params + num_qubits).min(args.len())),
            args.get(..num_params.min(args.len())),
        ),
    };

    let qubits: Vec<QubitId> = qubit_tokens
        .unwrap_or_default()
        .iter()
        .map(|q| q.to_string())
        .collect();
    let mut params = defaults.clone();
    for (name, token) in template.user_params.iter().zip(param_tokens.unwrap_or_default()) {
        params.insert(name.clone(), ParamValue::from_token(token));
    }

    if args.len() != num_qubits + num_params {
        let reason = format!(
            "expected {} qubits and {} parameters, got {} arguments",
            num_qubits,
            num_params,
            args.len()
        );
        return Err(parse_error(line_no, line, Some(gate), qubits, params, &reason));
    }

    Ok(GateRequest {
        gate: gate.to_string(),
        qubits,
        params,
        time: None,
        return_handle: None,
    })
}

/// Attach line context to an import failure
pub fn parse_error(
    line_no: usize,
    line: &str,
    gate: Option<&str>,
    qubits: Vec<QubitId>,
    params: Params,
    reason: &str,
) -> QsoError {
    QsoError::ParseError {
        line_no,
        line: line.to_string(),
        gate: gate.map(str::to_string),
        qubits,
        params,
        reason: reason.to_string(),
    }
}
