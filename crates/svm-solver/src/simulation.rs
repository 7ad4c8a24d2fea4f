//! End-to-end run: ground normalization, topology, equations, integration.

use indexmap::IndexMap;
use serde::Serialize;
use svm_core::{Circuit, Diagnostic, Topology, TopologyReport, analyze};

use crate::error::Result;
use crate::state_space::{SingularPolicy, StateSpace, StateSpaceReport, build_state_space};
use crate::transient::{
    InitialState, InputShaping, TransientParams, TransientResult, solve_transient,
};

/// Which inputs get the delayed ramp.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StimulusSelection {
    /// Voltage sources named `U...` without `dd`.
    #[default]
    NamingConvention,
    /// Exactly these sources.
    Named(Vec<String>),
    /// Every input constant.
    None,
}

/// Everything a run needs besides the circuit.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub params: TransientParams,
    /// Explicit node voltages at t = 0, by node number.
    pub initial_voltages: Option<IndexMap<u32, f64>>,
    pub stimuli: StimulusSelection,
    /// Start every capacitor at this voltage. Overrides the default rule
    /// but not explicit node voltages.
    pub capacitor_seed: Option<f64>,
    pub singular_policy: SingularPolicy,
    /// Circuit designation, used by the resonant-tank seed rule. Falls back
    /// to the circuit title.
    pub designation: Option<String>,
}

impl RunConfig {
    pub fn new(params: TransientParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    fn initial_state(&self, circuit: &Circuit, has_inputs: bool) -> InitialState {
        if let Some(v) = self.initial_voltages.as_ref().filter(|v| !v.is_empty()) {
            return InitialState::NodeVoltages(v.clone());
        }
        if let Some(seed) = self.capacitor_seed {
            return InitialState::SeedCapacitors(seed);
        }
        let designation = self.designation.as_deref().or(circuit.title());
        InitialState::resolve(None, designation, has_inputs)
    }

    fn shaping(&self, circuit: &Circuit, system: &StateSpace) -> InputShaping {
        match &self.stimuli {
            StimulusSelection::NamingConvention => {
                InputShaping::by_name_convention(circuit, system)
            }
            StimulusSelection::Named(names) => {
                InputShaping::from_names(circuit, system, names.as_slice())
            }
            StimulusSelection::None => InputShaping::constant(),
        }
    }
}

/// Output of [`run_simulation`].
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// The circuit after ground normalization, with tree flags set.
    pub circuit: Circuit,
    pub topology: Topology,
    pub system: StateSpace,
    pub transient: TransientResult,
    /// Every absorbed condition, in the order it occurred.
    pub diagnostics: Vec<Diagnostic>,
}

impl SimulationReport {
    /// Serializable snapshot of the whole run.
    pub fn trace(&self) -> SimulationTrace {
        let components = self.circuit.components();
        SimulationTrace {
            title: self.circuit.title().map(str::to_string),
            topology: self.topology.report(components),
            system: self.system.report(components),
            equations: self.system.equations(),
            dt: self.transient.dt,
            t_end: self.transient.t_end,
            time: self.transient.time.clone(),
            series: self
                .transient
                .labeled()
                .map(|(label, values)| TraceSeries {
                    label: label.to_string(),
                    values: values.to_vec(),
                })
                .collect(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// JSON-friendly record of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationTrace {
    pub title: Option<String>,
    pub topology: TopologyReport,
    pub system: StateSpaceReport,
    pub equations: Vec<String>,
    pub dt: f64,
    pub t_end: f64,
    pub time: Vec<f64>,
    pub series: Vec<TraceSeries>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline on `circuit`.
///
/// The input circuit is left untouched; the normalized copy is returned in
/// the report.
pub fn run_simulation(circuit: &Circuit, config: &RunConfig) -> Result<SimulationReport> {
    let mut circuit = circuit.clone();
    let mut diagnostics = Vec::new();

    diagnostics.extend(circuit.normalize_ground());
    circuit.validate()?;

    let topology = analyze(&mut circuit);
    diagnostics.extend(topology.diagnostics.iter().cloned());

    let system = build_state_space(&circuit, config.singular_policy)?;
    diagnostics.extend(system.diagnostics.iter().cloned());

    let shaping = config.shaping(&circuit, &system);
    let initial = config.initial_state(&circuit, system.num_inputs() > 0);
    let transient = solve_transient(&circuit, &system, &config.params, &shaping, &initial)?;
    diagnostics.extend(transient.budget.diagnostic());

    log::info!(
        "simulation done: {} steps, {} diagnostics",
        transient.num_steps(),
        diagnostics.len()
    );

    Ok(SimulationReport {
        circuit,
        topology,
        system,
        transient,
        diagnostics,
    })
}
