//! Scheduler / recorder
//!
//! Gantree: L2_Builder → Builder
//!
//! Resolves gate calls against the catalogue and binding table, computes
//! firing times from per-qubit clocks, dispatches to the engine and keeps
//! the circuit log of top-level calls.

use crate::catalogue::{GateCall, GateHandler};
use crate::clock::QubitClocks;
use crate::descriptor::{GateDescriptor, GateRequest, Instruction};
use crate::import::{clean_line, parse_error, parse_line, TokenOrder};
use crate::setup::Setup;
use qso_core::{ParamValue, Params, QsoError, QsoResult, QubitId, Time};
use qso_sim::{EndTime, Engine, Operation, OperationId, SimCircuit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

// ============================================================================
// Options
// ============================================================================

/// Per-builder options
/// Gantree: BuilderOptions // 빌더 옵션
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderOptions {
    /// Circuit title
    pub title: String,
    /// T1 for qubits that do not set one
    #[serde(default)]
    pub t1: Option<f64>,
    /// T2 for qubits that do not set one
    #[serde(default)]
    pub t2: Option<f64>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            title: "New Circuit".to_string(),
            t1: None,
            t2: None,
        }
    }
}

impl BuilderOptions {
    /// Set the circuit title
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Set default decoherence times
    pub fn with_decoherence(mut self, t1: f64, t2: f64) -> Self {
        self.t1 = Some(t1);
        self.t2 = Some(t2);
        self
    }
}

/// Extra idle time appended at finalize
#[derive(Debug, Clone, PartialEq)]
pub enum Padding {
    /// Same padding on every qubit
    Uniform(Time),
    /// Per-qubit padding; qubits without an entry get no idle fill
    PerQubit(BTreeMap<QubitId, Time>),
}

impl Default for Padding {
    fn default() -> Self {
        Padding::Uniform(0.0)
    }
}

impl From<f64> for Padding {
    fn from(pad: f64) -> Self {
        Padding::Uniform(pad)
    }
}

impl From<BTreeMap<QubitId, Time>> for Padding {
    fn from(pad: BTreeMap<QubitId, Time>) -> Self {
        Padding::PerQubit(pad)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Gate scheduler and circuit recorder
/// Gantree: Builder // 스케줄러 + 기록기
#[derive(Debug)]
pub struct Builder {
    setup: Arc<Setup>,
    engine: Box<dyn Engine>,
    clocks: QubitClocks,
    log: Vec<GateDescriptor>,
    recording: bool,
    options: BuilderOptions,
}

impl Builder {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Builder over a [`SimCircuit`] with default options
    pub fn new(setup: Arc<Setup>) -> QsoResult<Self> {
        Self::with_options(setup, BuilderOptions::default())
    }

    /// Builder over a [`SimCircuit`]
    pub fn with_options(setup: Arc<Setup>, options: BuilderOptions) -> QsoResult<Self> {
        let engine = Box::new(SimCircuit::new(&options.title));
        Self::with_engine(setup, engine, options)
    }

    /// Builder over any engine; the engine is replaced by an empty one
    pub fn with_engine(
        setup: Arc<Setup>,
        engine: Box<dyn Engine>,
        options: BuilderOptions,
    ) -> QsoResult<Self> {
        let title = options.title.clone();
        let mut builder = Self {
            setup,
            engine,
            clocks: QubitClocks::default(),
            log: Vec::new(),
            recording: true,
            options,
        };
        builder.new_circuit(&title)?;
        Ok(builder)
    }

    /// Start a fresh circuit: new engine circuit, clocks at zero, empty log
    /// Gantree: new_circuit(title) -> Result<()> // 초기화
    pub fn new_circuit(&mut self, title: &str) -> QsoResult<()> {
        let mut engine = self.engine.new_empty(title);
        let mut quantum = Vec::new();

        for (name, config) in &self.setup.qubits {
            if config.classical {
                engine.add_classical_bit(name)?;
                continue;
            }
            engine.add_qubit(
                name,
                config.resolved_t1(self.options.t1),
                config.resolved_t2(self.options.t2),
            )?;
            quantum.push(name.clone());
        }

        self.engine = engine;
        self.clocks = QubitClocks::new(quantum);
        self.log.clear();
        self.options.title = title.to_string();
        log::debug!("new circuit '{}' with {} qubits", title, self.clocks.len());
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Shared configuration
    pub fn setup(&self) -> &Arc<Setup> {
        &self.setup
    }

    /// Mutable configuration; copied first if other builders share it
    pub fn setup_mut(&mut self) -> &mut Setup {
        Arc::make_mut(&mut self.setup)
    }

    /// Options
    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Mutable options; decoherence defaults apply from the next circuit
    pub fn options_mut(&mut self) -> &mut BuilderOptions {
        &mut self.options
    }

    /// Circuit title
    pub fn title(&self) -> &str {
        self.engine.title()
    }

    /// Engine holding the circuit
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Mutable engine, for composite expansions that add operations directly
    pub fn engine_mut(&mut self) -> &mut dyn Engine {
        self.engine.as_mut()
    }

    /// Qubit clocks
    pub fn clocks(&self) -> &QubitClocks {
        &self.clocks
    }

    /// Clock of one qubit
    pub fn clock_of(&self, qubit: &str) -> QsoResult<Time> {
        self.clocks.clock_of(qubit)
    }

    /// Circuit log of top-level calls
    pub fn log(&self) -> &[GateDescriptor] {
        &self.log
    }

    /// Check whether calls are currently being logged
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Operation behind a handle
    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.engine.operation(id)
    }

    /// Mutable operation behind a handle
    pub fn operation_mut(&mut self, id: OperationId) -> Option<&mut Operation> {
        self.engine.operation_mut(id)
    }

    // ========================================================================
    // Gate Insertion
    // ========================================================================

    /// Schedule one gate
    /// Gantree: add_gate(request) -> Result<Option<OperationId>> // 핵심
    ///
    /// Without an explicit time the gate window opens at the latest clock of
    /// its qubits; the gate fires at `start + offset` and every qubit clock
    /// moves to `start + duration`. An explicit time is used verbatim and
    /// leaves the clocks alone.
    ///
    /// The returned handle is resolved after the gate is committed: a
    /// `return_handle` reaching past the first operation yields
    /// `EngineError`, but the gate stays in the circuit, the log and the
    /// clocks.
    pub fn add_gate(&mut self, request: GateRequest) -> QsoResult<Option<OperationId>> {
        let setup = Arc::clone(&self.setup);
        let template = setup.catalogue.get(&request.gate)?;
        if request.qubits.len() != template.num_qubits {
            return Err(QsoError::ArityMismatch {
                gate: request.gate,
                expected: format!("{} qubits", template.num_qubits),
                got: request.qubits.len(),
            });
        }
        let binding = setup.bindings.get(&request.gate, &request.qubits)?;

        let mut params = binding.overrides.clone();
        params.extend(request.params);

        let user_values = template
            .user_params
            .iter()
            .map(|name| {
                params
                    .get(name)
                    .cloned()
                    .ok_or_else(|| QsoError::MissingParameter {
                        gate: request.gate.clone(),
                        param: name.clone(),
                    })
            })
            .collect::<QsoResult<Vec<ParamValue>>>()?;

        // `window` is the opening of the gate window when clocks are in play
        let (time, window) = match request.time {
            Some(time) => {
                if self.recording {
                    log::warn!(
                        "{} on {:?} at explicit time {}: clocks not advanced",
                        request.gate,
                        request.qubits,
                        time
                    );
                }
                (time, None)
            }
            None => {
                let start = self.clocks.latest(&request.qubits)?;
                (start + binding.scheduling.firing_offset(), Some(start))
            }
        };

        let call = GateCall {
            gate: request.gate,
            bits: request.qubits,
            time,
            params,
        };
        log::debug!("dispatch {} on {:?} at {}", call.gate, call.bits, call.time);

        self.suppress_log().dispatch(&template.handler, &call)?;

        let GateCall { gate, bits, .. } = call;
        if let Some(start) = window {
            let end = start + binding.scheduling.duration;
            for qubit in &bits {
                self.clocks.advance(qubit, end)?;
            }
        }

        let entry = GateDescriptor {
            gate,
            qubits: bits,
            params: user_values,
            time: None,
            return_handle: request.return_handle,
        };
        if self.recording {
            self.log.push(entry);
        } else {
            log::trace!("nested call not logged: {}", entry);
        }

        match request.return_handle {
            Some(back) if back > 0 => self.engine.recent(back).map(Some).ok_or_else(|| {
                QsoError::EngineError(format!(
                    "no operation {} back from the end ({} recorded)",
                    back,
                    self.engine.operations().len()
                ))
            }),
            _ => Ok(None),
        }
    }

    /// Schedule one positional descriptor
    pub fn add_descriptor(&mut self, descriptor: GateDescriptor) -> QsoResult<Option<OperationId>> {
        let request = {
            let template = self.setup.catalogue.get(&descriptor.gate)?;
            descriptor.into_request(template)?
        };
        self.add_gate(request)
    }

    /// Schedule a tuple-form descriptor
    pub fn add_fields(&mut self, fields: &[ParamValue]) -> QsoResult<Option<OperationId>> {
        let descriptor = GateDescriptor::from_fields(fields, &self.setup.catalogue)?;
        self.add_descriptor(descriptor)
    }

    /// Insert a single gate or a simultaneous group
    /// Gantree: enqueue(instruction) -> Result<Vec<OperationId>> // 단일 | 동시
    pub fn enqueue(&mut self, instruction: impl Into<Instruction>) -> QsoResult<Vec<OperationId>> {
        match instruction.into() {
            Instruction::Single(descriptor) => {
                Ok(self.add_descriptor(descriptor)?.into_iter().collect())
            }
            Instruction::Simultaneous(group) => self.add_simultaneous(group),
        }
    }

    /// Schedule descriptors one after another; returns requested handles
    pub fn add_many(
        &mut self,
        descriptors: impl IntoIterator<Item = GateDescriptor>,
    ) -> QsoResult<Vec<OperationId>> {
        let mut handles = Vec::new();
        for descriptor in descriptors {
            handles.extend(self.add_descriptor(descriptor)?);
        }
        Ok(handles)
    }

    /// Replay a list of instructions (single gates and groups)
    pub fn add_circuit_list<I>(&mut self, instructions: I) -> QsoResult<Vec<OperationId>>
    where
        I: IntoIterator,
        I::Item: Into<Instruction>,
    {
        let mut handles = Vec::new();
        for instruction in instructions {
            handles.extend(self.enqueue(instruction)?);
        }
        Ok(handles)
    }

    /// Start a group of gates from a common baseline
    /// Gantree: add_simultaneous(group) -> Result<Vec<OperationId>> // 동시 시작
    ///
    /// Every qubit in the group is moved to the group's latest clock before
    /// any gate fires; each gate then follows the single-gate path.
    pub fn add_simultaneous(
        &mut self,
        group: Vec<GateDescriptor>,
    ) -> QsoResult<Vec<OperationId>> {
        let requests = group
            .into_iter()
            .map(|descriptor| {
                let template = self.setup.catalogue.get(&descriptor.gate)?;
                descriptor.into_request(template)
            })
            .collect::<QsoResult<Vec<_>>>()?;

        let qubits: Vec<QubitId> = requests
            .iter()
            .flat_map(|r| r.qubits.iter().cloned())
            .collect();
        let start = self.clocks.latest(&qubits)?;
        for qubit in &qubits {
            self.clocks.advance(qubit, start)?;
        }
        log::debug!("simultaneous group of {} from {}", requests.len(), start);

        let mut handles = Vec::new();
        for request in requests {
            handles.extend(self.add_gate(request)?);
        }
        Ok(handles)
    }

    /// Import text lines
    /// Gantree: add_qasm(lines,order,defaults) -> Result<Vec<OperationId>> // 가져오기
    ///
    /// Aborts on the first failing line with a `ParseError` carrying the
    /// line, gate, qubits and parameters.
    pub fn add_qasm<I, S>(
        &mut self,
        lines: I,
        order: TokenOrder,
        defaults: &Params,
    ) -> QsoResult<Vec<OperationId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut handles = Vec::new();
        for (index, raw) in lines.into_iter().enumerate() {
            let line_no = index + 1;
            let Some(line) = clean_line(raw.as_ref()) else {
                continue;
            };

            let request = parse_line(line_no, line, &self.setup.catalogue, order, defaults)
                .map_err(|e| {
                    log::error!("import aborted: {}", e);
                    e
                })?;

            let (gate, qubits, params) = (
                request.gate.clone(),
                request.qubits.clone(),
                request.params.clone(),
            );
            match self.add_gate(request) {
                Ok(handle) => handles.extend(handle),
                Err(e) => {
                    let err = parse_error(line_no, line, Some(&gate), qubits, params, &e.to_string());
                    log::error!("import aborted: {}", err);
                    return Err(err);
                }
            }
        }
        Ok(handles)
    }

    // ========================================================================
    // Finalize
    // ========================================================================

    /// Backfill idle periods and fix the final order
    /// Gantree: finalize(topo_order,pad) -> Result<EndTime> // 마무리
    ///
    /// The end time is the latest qubit clock plus `pad` (per qubit when a
    /// map is given). Operations are then sorted by firing time, or put in
    /// dependency order when `topo_order` is set.
    pub fn finalize(&mut self, topo_order: bool, pad: impl Into<Padding>) -> QsoResult<EndTime> {
        let latest = self.clocks.max_time();
        let end = match pad.into() {
            Padding::Uniform(pad) => EndTime::Uniform(latest + pad),
            Padding::PerQubit(pads) => EndTime::PerBit(
                pads.into_iter()
                    .map(|(qubit, pad)| (qubit, latest + pad))
                    .collect(),
            ),
        };

        let idle = self.engine.add_waiting_gates(0.0, &end)?;
        if topo_order {
            self.engine.order()?;
        } else {
            self.engine.sort_by_time();
        }

        log::info!(
            "finalized '{}': {} operations ({} idle), end {:.1}",
            self.title(),
            self.engine.operations().len(),
            idle,
            end.max()
        );
        Ok(end)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn suppress_log(&mut self) -> SuppressLog<'_> {
        SuppressLog::new(self)
    }

    fn dispatch(&mut self, handler: &GateHandler, call: &GateCall) -> QsoResult<()> {
        match handler {
            GateHandler::Primitive(name) => {
                self.engine.add_gate(name, &call.bits, call.time, &call.params)?;
            }
            GateHandler::Constructor(build) => {
                let op = build(call)?;
                self.engine.add_operation(op)?;
            }
            GateHandler::Composite(expand) => expand(self, call)?,
        }
        Ok(())
    }
}

// ============================================================================
// Logging suspension
// ============================================================================

/// Logging switched off for the lifetime of the scope
/// Gantree: SuppressLog // 재진입 가드
///
/// Restores the previous state on drop, so a failing handler cannot leave
/// the builder silent.
struct SuppressLog<'a> {
    builder: &'a mut Builder,
    previous: bool,
}

impl<'a> SuppressLog<'a> {
    fn new(builder: &'a mut Builder) -> Self {
        let previous = builder.recording;
        builder.recording = false;
        Self { builder, previous }
    }
}

impl Deref for SuppressLog<'_> {
    type Target = Builder;

    fn deref(&self) -> &Builder {
        self.builder
    }
}

impl DerefMut for SuppressLog<'_> {
    fn deref_mut(&mut self) -> &mut Builder {
        self.builder
    }
}

impl Drop for SuppressLog<'_> {
    fn drop(&mut self) {
        self.builder.recording = self.previous;
    }
}

// ============================================================================
// Tests
// ============================================================================
