//! Update rules
//!
//! Gantree: L2_Builder → Update
//!
//! Named rules a setup lists under `update_rules`, applied by
//! [`Builder::update`] between experiments to move the configuration along
//! (drifting bindings, changing decoherence defaults).

use crate::builder::Builder;
use qso_core::{ParamValue, Params, QsoError, QsoResult};
use std::collections::BTreeMap;
use std::fmt;

/// One update rule
pub type UpdateFn = fn(&mut Builder, &Params) -> QsoResult<()>;

/// Names of the rules every registry starts with
pub const STANDARD_RULES: &[&str] = &["binding_overrides", "decoherence"];

/// Update rules by name
/// Gantree: UpdateRegistry // 갱신 규칙
#[derive(Clone)]
pub struct UpdateRegistry {
    rules: BTreeMap<String, UpdateFn>,
}

impl fmt::Debug for UpdateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rules.keys()).finish()
    }
}

impl Default for UpdateRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl UpdateRegistry {
    /// Registry without any rule
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Registry holding the standard rules
    pub fn standard() -> Self {
        Self::empty()
            .with("binding_overrides", binding_overrides)
            .with("decoherence", decoherence)
    }

    /// Register a rule, replacing any rule of the same name
    pub fn insert(&mut self, name: &str, rule: UpdateFn) {
        self.rules.insert(name.to_string(), rule);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: &str, rule: UpdateFn) -> Self {
        self.insert(name, rule);
        self
    }

    /// Look up a rule
    pub fn get(&self, name: &str) -> QsoResult<UpdateFn> {
        self.rules
            .get(name)
            .copied()
            .ok_or_else(|| QsoError::ConfigurationError(format!("unknown update rule '{}'", name)))
    }

    /// Check whether a rule is registered
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl Builder {
    /// Apply every update rule of the setup, in listed order
    /// Gantree: update(params) -> Result<()> // 설정 갱신
    ///
    /// All names are resolved before any rule runs, so an unknown rule
    /// leaves the builder untouched.
    pub fn update(&mut self, params: &Params) -> QsoResult<()> {
        let rules = self
            .setup()
            .update_rules
            .iter()
            .map(|name| Ok((name.clone(), self.setup().update_functions.get(name)?)))
            .collect::<QsoResult<Vec<(String, UpdateFn)>>>()?;

        for (name, rule) in rules {
            log::debug!("applying update rule '{}'", name);
            rule(self, params)?;
        }
        Ok(())
    }
}

// ============================================================================
// Standard rules
// ============================================================================

/// Replace binding overrides that the parameters name
fn binding_overrides(builder: &mut Builder, params: &Params) -> QsoResult<()> {
    let mut changed = 0;
    for (_, binding) in builder.setup_mut().bindings.iter_mut() {
        for (key, value) in binding.overrides.iter_mut() {
            if let Some(new) = params.get(key) {
                *value = new.clone();
                changed += 1;
            }
        }
    }
    log::debug!("binding_overrides: {} values replaced", changed);
    Ok(())
}

/// New default T1/T2, used from the next circuit on
fn decoherence(builder: &mut Builder, params: &Params) -> QsoResult<()> {
    let options = builder.options_mut();
    if let Some(t1) = time_param(params, "t1")? {
        options.t1 = Some(t1);
    }
    if let Some(t2) = time_param(params, "t2")? {
        options.t2 = Some(t2);
    }
    Ok(())
}

fn time_param(params: &Params, key: &str) -> QsoResult<Option<f64>> {
    match params.get(key) {
        None => Ok(None),
        Some(ParamValue::Number(value)) => Ok(Some(*value)),
        Some(other) => Err(QsoError::ConfigurationError(format!(
            "update rule 'decoherence': {} must be a number, got {} '{}'",
            key,
            other.kind(),
            other
        ))),
    }
}
