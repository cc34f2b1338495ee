//! Circuit reversal
//!
//! Gantree: L2_Builder → Reverse
//!
//! Replays the log of a builder backwards into a fresh builder over the
//! same setup. Angle-parameterised gates are replayed with the angle
//! negated; gates declared self-inverse are replayed unchanged; anything
//! else cannot be reversed.

use crate::builder::{Builder, BuilderOptions};
use crate::catalogue::GateTemplate;
use crate::descriptor::GateDescriptor;
use qso_core::{QsoError, QsoResult};
use std::sync::Arc;

/// Inverse of one log entry
/// Gantree: invert(entry,template) -> Result<GateDescriptor> // 역연산
pub fn invert(entry: &GateDescriptor, template: &GateTemplate) -> QsoResult<GateDescriptor> {
    let mut inverse = entry.clone();

    if let Some(index) = template.angle_index() {
        let angle = entry.params.get(index).ok_or_else(|| QsoError::ArityMismatch {
            gate: entry.gate.clone(),
            expected: template.descriptor_len().to_string(),
            got: 1 + entry.qubits.len() + entry.params.len(),
        })?;
        inverse.params[index] = angle.negated().ok_or_else(|| QsoError::InvalidParameter {
            gate: entry.gate.clone(),
            param: "angle".to_string(),
            reason: format!("cannot negate {} value '{}'", angle.kind(), angle),
        })?;
        return Ok(inverse);
    }

    if template.self_inverse {
        Ok(inverse)
    } else {
        Err(QsoError::NotReversible(entry.gate.clone()))
    }
}

impl Builder {
    /// Builder replaying this circuit backwards
    /// Gantree: reverse(title,finalize) -> Result<Builder> // 역회로
    ///
    /// Fails before building anything if any entry cannot be inverted.
    pub fn reverse(&self, title: &str, finalize: bool) -> QsoResult<Builder> {
        let catalogue = &self.setup().catalogue;
        let reversed = self
            .log()
            .iter()
            .rev()
            .map(|entry| invert(entry, catalogue.get(&entry.gate)?))
            .collect::<QsoResult<Vec<_>>>()?;

        let options = BuilderOptions {
            title: title.to_string(),
            ..self.options().clone()
        };
        let mut builder = Builder::with_engine(
            Arc::clone(self.setup()),
            self.engine().new_empty(title),
            options,
        )?;
        builder.add_many(reversed)?;

        if finalize {
            builder.finalize(false, 0.0)?;
        }

        log::info!(
            "reversed '{}' into '{}' ({} gates)",
            self.title(),
            title,
            builder.log().len()
        );
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qso_core::ParamValue;

    #[test]
    fn test_invert_angle() {
        let rx = GateTemplate::primitive("rotate_x", "rotate_x", 1).with_params(&["angle"]);
        let entry = GateDescriptor::new("RX", ["a"]).param(0.5);
        let inverse = invert(&entry, &rx).unwrap();
        assert_eq!(inverse.params, vec![ParamValue::Number(-0.5)]);
        assert_eq!(inverse.qubits, entry.qubits);
    }

    #[test]
    fn test_invert_symbolic_angle_fails() {
        let rx = GateTemplate::primitive("rotate_x", "rotate_x", 1).with_params(&["angle"]);
        let entry = GateDescriptor::new("RX", ["a"]).param("theta");
        assert!(matches!(
            invert(&entry, &rx),
            Err(QsoError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_invert_self_inverse_and_not() {
        let cz = GateTemplate::primitive("cphase", "cphase", 2).involutory();
        let entry = GateDescriptor::new("CZ", ["a", "b"]);
        assert_eq!(invert(&entry, &cz).unwrap(), entry);

        let iswap = GateTemplate::primitive("iswap", "iswap", 2);
        let entry = GateDescriptor::new("ISwap", ["a", "b"]);
        assert_eq!(
            invert(&entry, &iswap).unwrap_err(),
            QsoError::NotReversible("ISwap".into())
        );
    }
}
