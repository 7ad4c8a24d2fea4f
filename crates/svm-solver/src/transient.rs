//! Transient analysis of a state-space model.
//!
//! The continuous system `dX/dt = A·X + B·U` is discretized with the
//! trapezoidal (bilinear) rule:
//!
//! ```text
//! X[k+1] = (I - A·h/2)⁻¹ · ((I + A·h/2)·X[k] + B·h·(U[k] + U[k+1])/2)
//! ```
//!
//! The inverse is formed once per run, so every step is two matrix-vector
//! products plus the input term.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use svm_core::{Circuit, ComponentKind, Diagnostic};

use crate::error::{Error, Result};
use crate::linear::invert_dense;
use crate::state_space::StateSpace;

/// Hard cap on the number of integration steps per run.
pub const MAX_STEPS: usize = 100_000;

/// Designations containing this marker get the resonant-tank seed.
const RESONANT_MARKER: &str = "LC";

/// Transient analysis parameters.
#[derive(Debug, Clone)]
pub struct TransientParams {
    /// Requested end time (s).
    pub t_end: f64,
    /// Fixed step (s).
    pub dt: f64,
    /// Step cap; `t_end` is shortened when exceeded.
    pub max_steps: usize,
}

impl TransientParams {
    pub fn new(t_end: f64, dt: f64) -> Self {
        Self {
            t_end,
            dt,
            max_steps: MAX_STEPS,
        }
    }

    /// Resolve the step count, applying the cap.
    pub fn step_budget(&self) -> Result<StepBudget> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(Error::InvalidParams(format!(
                "step must be positive, got {}",
                self.dt
            )));
        }
        if !(self.t_end.is_finite() && self.t_end >= 0.0) {
            return Err(Error::InvalidParams(format!(
                "end time must be non-negative, got {}",
                self.t_end
            )));
        }

        let ratio = self.t_end / self.dt;
        // Absorb rounding in the division so 20 / 0.01 gives 2000 steps, not 2001.
        // A ratio that overflows to infinity saturates the cast and clamps.
        let requested = (ratio * (1.0 - 1e-12)).ceil().max(0.0) as u64;

        if requested > self.max_steps as u64 {
            let steps = self.max_steps;
            Ok(StepBudget {
                requested,
                steps,
                t_end: steps as f64 * self.dt,
                clamped: true,
            })
        } else {
            Ok(StepBudget {
                requested,
                steps: requested as usize,
                t_end: self.t_end,
                clamped: false,
            })
        }
    }
}

impl Default for TransientParams {
    fn default() -> Self {
        Self::new(0.01, 1e-5)
    }
}

/// Step count actually used for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBudget {
    /// `ceil(t_end / dt)` before the cap.
    pub requested: u64,
    pub steps: usize,
    /// Effective end time; `steps * dt` when clamped.
    pub t_end: f64,
    pub clamped: bool,
}

impl StepBudget {
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.clamped.then(|| Diagnostic::StepCountClamped {
            requested: self.requested,
            steps: self.steps,
            t_end: self.t_end,
        })
    }
}

/// Time shaping of the input vector.
///
/// Inputs listed in `stimuli` are held at 0 until `ramp_start * T`, ramp
/// linearly to their nominal value at `ramp_end * T`, then hold. All other
/// inputs are constant at their nominal value.
#[derive(Debug, Clone, PartialEq)]
pub struct InputShaping {
    /// Positions in the input vector.
    pub stimuli: BTreeSet<usize>,
    pub ramp_start: f64,
    pub ramp_end: f64,
}

impl Default for InputShaping {
    fn default() -> Self {
        Self {
            stimuli: BTreeSet::new(),
            ramp_start: 0.2,
            ramp_end: 0.25,
        }
    }
}

impl InputShaping {
    /// Every input constant.
    pub fn constant() -> Self {
        Self::default()
    }

    /// Naming rule for stimulus sources: `U...` but not a `...dd...` supply rail.
    pub fn is_stimulus_name(name: &str) -> bool {
        name.starts_with('U') && !name.contains("dd")
    }

    /// Voltage sources whose names follow the stimulus naming rule are ramped.
    pub fn by_name_convention(circuit: &Circuit, system: &StateSpace) -> Self {
        let components = circuit.components();
        Self::select(system, |k| {
            let c = &components[system.inputs[k]];
            c.kind == ComponentKind::VoltageSource && Self::is_stimulus_name(&c.name)
        })
    }

    /// Ramp exactly the named inputs. Unknown names are ignored with a warning.
    pub fn from_names<S: AsRef<str>>(circuit: &Circuit, system: &StateSpace, names: &[S]) -> Self {
        let components = circuit.components();
        for name in names {
            let name = name.as_ref();
            if !system.inputs.iter().any(|&i| components[i].name == name) {
                log::warn!("stimulus {name} is not an independent source; ignored");
            }
        }
        Self::select(system, |k| {
            let input = &components[system.inputs[k]].name;
            names.iter().any(|n| n.as_ref() == input)
        })
    }

    fn select(system: &StateSpace, pred: impl Fn(usize) -> bool) -> Self {
        Self {
            stimuli: (0..system.num_inputs()).filter(|&k| pred(k)).collect(),
            ..Self::default()
        }
    }

    /// Value of input `k` with nominal value `nominal` at time `t`.
    pub fn value(&self, k: usize, nominal: f64, t: f64, duration: f64) -> f64 {
        if !self.stimuli.contains(&k) {
            return nominal;
        }
        let start = duration * self.ramp_start;
        let end = duration * self.ramp_end;
        if t < start {
            0.0
        } else if t < end {
            nominal * (t - start) / (end - start)
        } else {
            nominal
        }
    }

    /// Fill `u` with all input values at time `t`.
    pub fn fill(&self, nominal: &[f64], t: f64, duration: f64, u: &mut DVector<f64>) {
        for (k, (slot, &v)) in u.iter_mut().zip(nominal).enumerate() {
            *slot = self.value(k, v, t, duration);
        }
    }
}

/// How the state vector starts.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InitialState {
    /// All states zero.
    #[default]
    Zero,
    /// Capacitor voltages from node potentials (missing nodes at 0 V);
    /// inductor currents zero.
    NodeVoltages(IndexMap<u32, f64>),
    /// Every capacitor at this voltage; inductor currents zero.
    SeedCapacitors(f64),
}

impl InitialState {
    /// Capacitor seed used for source-free resonant tanks.
    pub const RESONANT_SEED: f64 = 10.0;

    /// Default selection: explicit node voltages win; otherwise a source-free
    /// circuit whose designation mentions `LC` gets its capacitors seeded.
    pub fn resolve(
        node_voltages: Option<&IndexMap<u32, f64>>,
        designation: Option<&str>,
        has_inputs: bool,
    ) -> Self {
        match node_voltages {
            Some(v) if !v.is_empty() => InitialState::NodeVoltages(v.clone()),
            _ if !has_inputs && designation.is_some_and(|d| d.contains(RESONANT_MARKER)) => {
                InitialState::SeedCapacitors(Self::RESONANT_SEED)
            }
            _ => InitialState::Zero,
        }
    }

    /// Initial X for `system`.
    pub fn state_vector(&self, circuit: &Circuit, system: &StateSpace) -> DVector<f64> {
        let components = circuit.components();
        let mut x = DVector::zeros(system.num_states());
        for (slot, &ci) in x.iter_mut().zip(&system.states) {
            let c = &components[ci];
            if c.kind != ComponentKind::Capacitor {
                continue;
            }
            *slot = match self {
                InitialState::Zero => 0.0,
                InitialState::SeedCapacitors(v) => *v,
                InitialState::NodeVoltages(map) => {
                    let v = |n: u32| map.get(&n).copied().unwrap_or(0.0);
                    v(c.node1.as_u32()) - v(c.node2.as_u32())
                }
            };
        }
        x
    }
}

/// Precomputed trapezoidal transition operators.
#[derive(Debug, Clone)]
pub struct TrapezoidalStepper {
    /// `(I - A·h/2)⁻¹`
    left: DMatrix<f64>,
    /// `I + A·h/2`
    right: DMatrix<f64>,
    /// `B·h`
    input: DMatrix<f64>,
    scratch: DVector<f64>,
}

impl TrapezoidalStepper {
    pub fn new(a: &DMatrix<f64>, b: &DMatrix<f64>, dt: f64) -> Result<Self> {
        let nx = a.nrows();
        if a.ncols() != nx {
            return Err(Error::DimensionMismatch {
                expected: nx,
                actual: a.ncols(),
            });
        }
        if b.nrows() != nx {
            return Err(Error::DimensionMismatch {
                expected: nx,
                actual: b.nrows(),
            });
        }

        let identity = DMatrix::<f64>::identity(nx, nx);
        let half = a * (dt / 2.0);
        Ok(Self {
            left: invert_dense(&(&identity - &half))?,
            right: identity + half,
            input: b * dt,
            scratch: DVector::zeros(nx),
        })
    }

    /// Advance `x` in place by one step with averaged input `u_avg`.
    pub fn step(&mut self, x: &mut DVector<f64>, u_avg: &DVector<f64>) {
        self.scratch.gemv(1.0, &self.right, x, 0.0);
        self.scratch.gemv(1.0, &self.input, u_avg, 1.0);
        x.gemv(1.0, &self.left, &self.scratch, 0.0);
    }
}

/// Sampled waveforms of a transient run.
///
/// Series are index-keyed in state order; `labels` is the name table.
#[derive(Debug, Clone)]
pub struct TransientResult {
    /// Sample times, `(k + 1) · dt` for step `k`.
    pub time: Vec<f64>,
    /// One series per state, each as long as `time`.
    pub series: Vec<Vec<f64>>,
    pub labels: Vec<String>,
    pub dt: f64,
    /// Effective end time after the step cap.
    pub t_end: f64,
    pub budget: StepBudget,
}

impl TransientResult {
    pub fn num_steps(&self) -> usize {
        self.time.len()
    }

    /// Series of the state with this label.
    pub fn series(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.series[i].as_slice())
    }

    /// `(label, series)` pairs in state order.
    pub fn labeled(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.series.iter().map(Vec::as_slice))
    }

    /// Last sample of every state.
    pub fn final_state(&self) -> Vec<f64> {
        self.series
            .iter()
            .map(|s| s.last().copied().unwrap_or(0.0))
            .collect()
    }
}

/// Integrate `system` over the requested horizon.
///
/// # Arguments
/// * `circuit` - Source of nominal input values and capacitor terminals
/// * `system` - A and B from the equation builder
/// * `params` - End time, step and step cap
/// * `shaping` - Which inputs are ramped
/// * `initial` - Starting state
pub fn solve_transient(
    circuit: &Circuit,
    system: &StateSpace,
    params: &TransientParams,
    shaping: &InputShaping,
    initial: &InitialState,
) -> Result<TransientResult> {
    let budget = params.step_budget()?;
    if let Some(diagnostic) = budget.diagnostic() {
        diagnostic.log();
    }

    let dt = params.dt;
    let t_end = budget.t_end;
    let steps = budget.steps;
    let nx = system.num_states();

    log::info!("T_end={t_end:.3e}s, dt={dt:.3e}s, steps={steps}");

    let mut stepper = TrapezoidalStepper::new(&system.a, &system.b, dt)?;

    let components = circuit.components();
    let nominal: Vec<f64> = system.inputs.iter().map(|&i| components[i].value).collect();

    let mut x = initial.state_vector(circuit, system);
    if *initial != InitialState::Zero {
        for (label, v) in system.labels.iter().zip(x.iter()) {
            if v.abs() > 1e-9 {
                log::info!("initial {label} = {v}");
            }
        }
    }

    let mut time = Vec::with_capacity(steps);
    let mut series = vec![Vec::with_capacity(steps); nx];

    let mut u_curr = DVector::zeros(nominal.len());
    let mut u_next = DVector::zeros(nominal.len());
    let mut u_avg = DVector::zeros(nominal.len());
    shaping.fill(&nominal, 0.0, t_end, &mut u_curr);

    let report_every = (steps / 15).max(1);

    for k in 0..steps {
        let t = k as f64 * dt;
        let t_next = t + dt;

        shaping.fill(&nominal, t_next, t_end, &mut u_next);
        u_avg.copy_from(&u_curr);
        u_avg += &u_next;
        u_avg *= 0.5;

        stepper.step(&mut x, &u_avg);
        std::mem::swap(&mut u_curr, &mut u_next);

        time.push(t_next);
        for (s, &v) in series.iter_mut().zip(x.iter()) {
            s.push(v);
        }

        if k % report_every == 0 || k + 1 == steps {
            log::debug!("t={t_next:<10.3e} X={:?}", x.as_slice());
        }
    }

    Ok(TransientResult {
        time,
        series,
        labels: system.labels.clone(),
        dt,
        t_end,
        budget,
    })
}
