//! Shared configuration
//!
//! Gantree: L2_Builder → Setup
//!
//! Qubits, catalogue, bindings and the one measurement sampler every
//! builder of an experiment shares. Stored as JSON:
//!
//! ```text
//! {
//!   "gate_dic":      {"RX": "rotate_x", ...},
//!   "qubit_dic":     {"q0": {"t1": 30000, "readout_error": 0.01}, ...},
//!   "gate_set":      [{"key": ["RX", "q0"], "val": [{}, {"gate_time": 20}]}, ...],
//!   "update_rules":  [],
//!   "system_params": {}
//! }
//! ```
//!
//! Binding overrides set `"sampler": true` where the shared sampler is
//! meant; the flag is kept as is.
//!
//! `update_rules` names rules of the setup's [`UpdateRegistry`], applied in
//! order by [`Builder::update`](crate::Builder::update).

use crate::catalogue::{GateCatalogue, GateTemplate};
use crate::library;
use crate::update::UpdateRegistry;
use qso_core::{BindingTable, GateBinding, Params, QsoError, QsoResult, QubitConfig, QubitId};
use qso_sim::{share, SharedSampler, UniformNoisySampler};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Experiment configuration shared by builders
/// Gantree: Setup // 설정
#[derive(Debug, Clone, Default)]
pub struct Setup {
    /// Qubits and classical bits by name
    pub qubits: BTreeMap<QubitId, QubitConfig>,
    /// Gate catalogue
    pub catalogue: GateCatalogue,
    /// Gate bindings
    pub bindings: BindingTable,
    /// Sampler shared by every measurement
    pub sampler: Option<SharedSampler>,
    /// Free-form system parameters
    pub system_params: Params,
    /// Names of update rules applied between experiments, in order
    pub update_rules: Vec<String>,
    /// Rules available to [`Builder::update`](crate::Builder::update)
    pub update_functions: UpdateRegistry,
}

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct SetupFile {
    gate_dic: BTreeMap<String, String>,
    #[serde(default)]
    update_rules: Vec<String>,
    qubit_dic: BTreeMap<QubitId, QubitConfig>,
    gate_set: BindingTable,
    #[serde(default)]
    system_params: Params,
}

impl Setup {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Empty setup
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a qubit or classical bit
    pub fn with_qubit(mut self, name: &str, config: QubitConfig) -> Self {
        self.qubits.insert(name.to_string(), config);
        self
    }

    /// Register a gate
    pub fn with_gate(mut self, gate: &str, template: GateTemplate) -> Self {
        self.catalogue.insert(gate, template);
        self
    }

    /// Bind a gate to a qubit tuple
    pub fn with_binding<Q: Into<QubitId>>(
        mut self,
        gate: &str,
        qubits: impl IntoIterator<Item = Q>,
        binding: GateBinding,
    ) -> Self {
        self.bindings.insert(gate, qubits, binding);
        self
    }

    /// Attach the shared sampler
    pub fn with_sampler(mut self, sampler: SharedSampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Wrap for sharing between builders
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Parse a setup; a seed is required for the shared sampler
    /// Gantree: from_json_str(json,seed) -> Result<Setup> // ConfigurationError
    ///
    /// The sampler takes its readout error from the first qubit (by name).
    pub fn from_json_str(json: &str, seed: Option<u64>) -> QsoResult<Self> {
        let file: SetupFile = serde_json::from_str(json)?;

        let seed = seed.ok_or_else(|| {
            QsoError::ConfigurationError("a seed is required for the shared sampler".to_string())
        })?;
        let readout_error = file
            .qubit_dic
            .values()
            .next()
            .and_then(|q| q.readout_error)
            .unwrap_or(0.0);
        let sampler = share(UniformNoisySampler::new(seed, readout_error)?);

        Self::from_file(file, sampler)
    }

    /// Parse a setup around a sampler the caller already holds
    /// Gantree: from_json_with_sampler(json,sampler) -> Result<Setup> // 샘플러 공유
    pub fn from_json_with_sampler(json: &str, sampler: SharedSampler) -> QsoResult<Self> {
        let file: SetupFile = serde_json::from_str(json)?;
        Self::from_file(file, sampler)
    }

    fn from_file(file: SetupFile, sampler: SharedSampler) -> QsoResult<Self> {
        let mut catalogue = GateCatalogue::new();
        for (gate, name) in &file.gate_dic {
            catalogue.insert(gate, library::template(name)?);
        }

        log::info!(
            "loaded setup: {} qubits, {} gates, {} bindings",
            file.qubit_dic.len(),
            catalogue.len(),
            file.gate_set.len()
        );

        Ok(Self {
            qubits: file.qubit_dic,
            catalogue,
            bindings: file.gate_set,
            sampler: Some(sampler),
            system_params: file.system_params,
            update_rules: file.update_rules,
            update_functions: UpdateRegistry::standard(),
        })
    }

    /// Load a setup file
    pub fn load(path: impl AsRef<Path>, seed: Option<u64>) -> QsoResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json, seed)
    }

    /// Load a setup file around an existing sampler
    pub fn load_with_sampler(path: impl AsRef<Path>, sampler: SharedSampler) -> QsoResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_with_sampler(&json, sampler)
    }

    /// Serialize in the layout `from_json_str` reads
    pub fn to_json_string(&self) -> QsoResult<String> {
        let file = SetupFile {
            gate_dic: self
                .catalogue
                .iter()
                .map(|(gate, template)| (gate.clone(), template.name.clone()))
                .collect(),
            update_rules: self.update_rules.clone(),
            qubit_dic: self.qubits.clone(),
            gate_set: self.bindings.clone(),
            system_params: self.system_params.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Write a setup file
    pub fn save(&self, path: impl AsRef<Path>) -> QsoResult<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Names of non-classical qubits
    pub fn qubit_names(&self) -> Vec<&str> {
        self.qubits
            .iter()
            .filter(|(_, q)| !q.classical)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qso_core::{ParamValue, SchedulingParams};

    const SETUP_JSON: &str = r#"{
        "gate_dic": {"RX": "rotate_x", "CZ": "cphase", "Measure": "measurement"},
        "update_rules": ["drift"],
        "qubit_dic": {
            "q0": {"t1": 30000.0, "t2": 20000.0, "readout_error": 0.02},
            "q1": {"t1": 25000.0},
            "m0": {"classical": true}
        },
        "gate_set": [
            {"key": ["RX", "q0"], "val": [{}, {"gate_time": 20.0}]},
            {"key": ["CZ", "q0", "q1"], "val": [{"dephase_var": 0.01}, {"gate_time": 40.0, "exec_time": 5.0}]},
            {"key": ["Measure", "q0"], "val": [{"sampler": true, "interval_time": 100.0}, {"gate_time": 300.0}]}
        ],
        "system_params": {"temperature": 0.02}
    }"#;

    #[test]
    fn test_load_requires_seed() {
        let err = Setup::from_json_str(SETUP_JSON, None).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_load() {
        let setup = Setup::from_json_str(SETUP_JSON, Some(7)).unwrap();

        assert_eq!(setup.qubits.len(), 3);
        assert_eq!(setup.qubit_names(), vec!["q0", "q1"]);
        assert_eq!(setup.catalogue.get("RX").unwrap().name, "rotate_x");
        assert!(setup.sampler.is_some());
        assert_eq!(setup.update_rules, vec!["drift"]);
        assert_eq!(setup.system_params["temperature"], ParamValue::Number(0.02));

        let cz = setup
            .bindings
            .get("CZ", &["q0".to_string(), "q1".to_string()])
            .unwrap();
        assert_eq!(cz.scheduling, SchedulingParams::new(40.0).with_offset(5.0));

        let measure = setup.bindings.get("Measure", &["q0".to_string()]).unwrap();
        assert_eq!(measure.overrides["sampler"], ParamValue::Bool(true));
    }

    #[test]
    fn test_load_with_existing_sampler() {
        let sampler = share(UniformNoisySampler::new(11, 0.0).unwrap());
        let first = Setup::from_json_with_sampler(SETUP_JSON, Arc::clone(&sampler)).unwrap();
        let second = Setup::from_json_with_sampler(SETUP_JSON, Arc::clone(&sampler)).unwrap();

        assert!(Arc::ptr_eq(first.sampler.as_ref().unwrap(), &sampler));
        assert!(Arc::ptr_eq(second.sampler.as_ref().unwrap(), &sampler));
        assert_eq!(Arc::strong_count(&sampler), 3);
        assert_eq!(first.update_rules, vec!["drift"]);
    }

    #[test]
    fn test_unknown_template() {
        let json = r#"{"gate_dic": {"T": "t_gate"}, "qubit_dic": {}, "gate_set": []}"#;
        let err = Setup::from_json_str(json, Some(1)).unwrap_err();
        assert_eq!(err, QsoError::UnknownGate("t_gate".into()));
    }

    #[test]
    fn test_round_trip() {
        let setup = Setup::from_json_str(SETUP_JSON, Some(7)).unwrap();
        let reloaded = Setup::from_json_str(&setup.to_json_string().unwrap(), Some(7)).unwrap();

        assert_eq!(reloaded.qubits, setup.qubits);
        assert_eq!(reloaded.bindings, setup.bindings);
        assert_eq!(reloaded.system_params, setup.system_params);
        assert_eq!(reloaded.catalogue.len(), setup.catalogue.len());
    }

    #[test]
    fn test_save_and_load_file() {
        let setup = Setup::from_json_str(SETUP_JSON, Some(3)).unwrap();
        let path = std::env::temp_dir().join(format!("qso_setup_{}.json", std::process::id()));

        setup.save(&path).unwrap();
        let loaded = Setup::load(&path, Some(3)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.bindings.len(), 3);

        let missing = Setup::load(path.with_extension("missing"), Some(3));
        assert!(matches!(missing, Err(QsoError::FileError(_))));
    }
}
