//! Standard gate library
//!
//! Gantree: L2_Builder → Library
//!
//! Templates a setup file can refer to by name. Composite expansions call
//! back into the builder with explicit times, using the conventional
//! catalogue names `RX`, `RY`, `RZ`, `CZ` and `CPhase`; those gates must be
//! in the catalogue and bound on the qubits involved.

use crate::builder::Builder;
use crate::catalogue::{GateCall, GateCatalogue, GateTemplate};
use crate::descriptor::GateRequest;
use crate::import::{MEASURE_GATE, OUTPUT_BIT_PARAM};
use qso_core::{ParamValue, Params, QsoError, QsoResult};
use std::f64::consts::PI;

/// Names accepted by [`template`]
pub const TEMPLATE_NAMES: &[&str] = &[
    "rotate_x",
    "rotate_y",
    "rotate_z",
    "cphase",
    "cphase_rotation",
    "iswap",
    "x_from_rx",
    "y_from_ry",
    "z_from_rz",
    "had_from_rot",
    "cnot_from_cz",
    "crx_from_cz",
    "measurement",
    "reset",
];

/// Look up a library template
/// Gantree: template(name) -> Result<GateTemplate> // UnknownGate
pub fn template(name: &str) -> QsoResult<GateTemplate> {
    let t = match name {
        "rotate_x" | "rotate_y" | "rotate_z" => {
            GateTemplate::primitive(name, name, 1).with_params(&["angle"])
        }
        "cphase" => GateTemplate::composite(name, 2, insert_cz).involutory(),
        "cphase_rotation" => {
            GateTemplate::composite(name, 2, cphase_rotation).with_params(&["angle"])
        }
        "iswap" => GateTemplate::primitive(name, name, 2),
        "x_from_rx" => GateTemplate::composite(name, 1, x_gate).involutory(),
        "y_from_ry" => GateTemplate::composite(name, 1, y_gate).involutory(),
        "z_from_rz" => GateTemplate::composite(name, 1, z_gate).involutory(),
        "had_from_rot" => GateTemplate::composite(name, 1, had_from_rot).involutory(),
        "cnot_from_cz" => GateTemplate::composite(name, 2, cnot_from_cz).involutory(),
        "crx_from_cz" => GateTemplate::composite(name, 2, crx_from_cz).with_params(&["angle"]),
        "measurement" => GateTemplate::composite(name, 1, insert_measurement)
            .with_params(&[OUTPUT_BIT_PARAM])
            .involutory(),
        "reset" => GateTemplate::composite(name, 1, insert_reset),
        _ => return Err(QsoError::UnknownGate(name.to_string())),
    };
    Ok(t)
}

/// Catalogue with every library template under its conventional gate name
pub fn standard_catalogue() -> QsoResult<GateCatalogue> {
    let entries = [
        ("RX", "rotate_x"),
        ("RY", "rotate_y"),
        ("RZ", "rotate_z"),
        ("CZ", "cphase"),
        ("CPhase", "cphase_rotation"),
        ("ISwap", "iswap"),
        ("X", "x_from_rx"),
        ("Y", "y_from_ry"),
        ("Z", "z_from_rz"),
        ("H", "had_from_rot"),
        ("CNOT", "cnot_from_cz"),
        ("CRX", "crx_from_cz"),
        (MEASURE_GATE, "measurement"),
        ("Reset", "reset"),
    ];

    let mut catalogue = GateCatalogue::new();
    for (gate, name) in entries {
        catalogue.insert(gate, template(name)?);
    }
    Ok(catalogue)
}

// ============================================================================
// Single-qubit composites
// ============================================================================

fn rotation(gate: &str, bit: &str, angle: f64, call: &GateCall) -> GateRequest {
    GateRequest::new(gate, [bit]).param("angle", angle).at(call.time)
}

fn x_gate(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    builder.add_gate(rotation("RX", call.bit(0)?, -PI, call))?;
    Ok(())
}

fn y_gate(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    builder.add_gate(rotation("RY", call.bit(0)?, -PI, call))?;
    Ok(())
}

fn z_gate(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    builder.add_gate(rotation("RZ", call.bit(0)?, -PI, call))?;
    Ok(())
}

fn had_from_rot(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let bit = call.bit(0)?;
    builder.add_gate(rotation("RX", bit, -PI, call))?;
    builder.add_gate(rotation("RY", bit, -PI / 2.0, call))?;
    Ok(())
}

// ============================================================================
// Two-qubit composites
// ============================================================================

fn cnot_from_cz(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let (control, target) = (call.bit(0)?, call.bit(1)?);
    builder.add_gate(rotation("RY", target, -PI / 2.0, call))?;
    builder.add_gate(GateRequest::new("CZ", [control, target]).at(call.time))?;
    builder.add_gate(rotation("RY", target, PI / 2.0, call))?;
    Ok(())
}

fn crx_from_cz(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let (control, target) = (call.bit(0)?, call.bit(1)?);
    let angle = call.number("angle")?;
    builder.add_gate(rotation("RY", target, -PI / 2.0, call))?;
    builder.add_gate(rotation("RZ", control, -angle / 2.0, call))?;
    builder.add_gate(
        GateRequest::new("CPhase", [control, target])
            .param("angle", angle)
            .at(call.time),
    )?;
    builder.add_gate(rotation("RY", target, PI / 2.0, call))?;
    Ok(())
}

/// CZ with optional quasistatic flux noise as a slightly delayed Z rotation
fn insert_cz(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let mut params = Params::new();
    if let Some(var) = call.get("dephase_var") {
        params.insert("dephase_var".to_string(), var.clone());
    }
    builder
        .engine_mut()
        .add_gate("cphase", &call.bits, call.time, &params)?;
    add_flux_noise(builder, call)
}

fn add_flux_noise(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let Some(flux) = call.get("quasistatic_flux") else {
        return Ok(());
    };
    if call.get("high_frequency") == Some(&ParamValue::Bool(false)) {
        return Err(QsoError::InvalidParameter {
            gate: call.gate.clone(),
            param: "high_frequency".to_string(),
            reason: "flux noise requires the first qubit to be high-frequency".to_string(),
        });
    }
    let flux = flux.as_f64().ok_or_else(|| QsoError::InvalidParameter {
        gate: call.gate.clone(),
        param: "quasistatic_flux".to_string(),
        reason: format!("expected a number, got {} '{}'", flux.kind(), flux),
    })?;

    let params = Params::from([
        ("angle".to_string(), ParamValue::Number(flux)),
        ("quasistatic_flux_flag".to_string(), ParamValue::Bool(true)),
    ]);
    builder.engine_mut().add_gate(
        "rotate_z",
        &[call.bit(0)?.to_string()],
        call.time * (1.0 + 1e-6),
        &params,
    )?;
    Ok(())
}

/// Conditional phase rotation, with the same flux noise as CZ
fn cphase_rotation(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let angle = call.number("angle")?;
    let mut params = Params::from([("angle".to_string(), ParamValue::Number(angle))]);
    if let Some(var) = call.get("dephase_var") {
        params.insert("dephase_var".to_string(), var.clone());
    }
    builder
        .engine_mut()
        .add_gate("cphase_rotation", &call.bits, call.time, &params)?;
    add_flux_noise(builder, call)
}

// ============================================================================
// Measurement and reset
// ============================================================================

/// Butterfly measurement: decay before, projection, decay after
///
/// Parameters: `interval_time` (required), `output_bit` (required),
/// `real_output_bit`, `p_exc_init`, `p_dec_init`, `p_exc_fin`, `p_dec_fin`.
/// Classical output bits are registered on first use.
fn insert_measurement(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let bit = call.bit(0)?;
    let interval = call.number("interval_time")?;
    let output_bit = call.text(OUTPUT_BIT_PARAM)?;
    let real_output_bit = match call.get("real_output_bit") {
        Some(value) => Some(value.as_str().ok_or_else(|| QsoError::InvalidParameter {
            gate: call.gate.clone(),
            param: "real_output_bit".to_string(),
            reason: format!("expected text, got {} '{}'", value.kind(), value),
        })?),
        None => None,
    };

    if call.get("sampler") == Some(&ParamValue::Bool(false)) {
        return Err(QsoError::ConfigurationError(format!(
            "measurement '{}' on {} has its sampler disabled",
            call.gate, bit
        )));
    }
    let sampler = builder.setup().sampler.clone().ok_or_else(|| {
        QsoError::ConfigurationError("measurement requires a shared sampler".to_string())
    })?;

    let engine = builder.engine_mut();
    for classical in std::iter::once(output_bit).chain(real_output_bit) {
        if !engine.has_bit(classical) {
            engine.add_classical_bit(classical)?;
        }
    }

    let bits = [bit.to_string()];
    let p_exc_init = call.number_or("p_exc_init", 0.0)?;
    let p_dec_init = call.number_or("p_dec_init", 0.0)?;
    if p_exc_init + p_dec_init > 0.0 {
        engine.add_gate("butterfly", &bits, call.time, &decay(p_exc_init, p_dec_init))?;
    }
    let p_exc_fin = call.number_or("p_exc_fin", 0.0)?;
    let p_dec_fin = call.number_or("p_dec_fin", 0.0)?;
    if p_exc_fin + p_dec_fin > 0.0 {
        engine.add_gate(
            "butterfly",
            &bits,
            call.time + 2.0 * interval,
            &decay(p_exc_fin, p_dec_fin),
        )?;
    }

    engine.add_measurement(bit, call.time + interval, sampler, output_bit, real_output_bit)?;
    Ok(())
}

fn decay(p_exc: f64, p_dec: f64) -> Params {
    Params::from([
        ("p_exc".to_string(), ParamValue::Number(p_exc)),
        ("p_dec".to_string(), ParamValue::Number(p_dec)),
    ])
}

fn insert_reset(builder: &mut Builder, call: &GateCall) -> QsoResult<()> {
    let reset_time = call.number("reset_time")?;
    let population = call.number("population")?;
    builder.engine_mut().add_gate(
        "reset",
        &[call.bit(0)?.to_string()],
        call.time + reset_time,
        &Params::from([("population".to_string(), ParamValue::Number(population))]),
    )?;
    Ok(())
}
