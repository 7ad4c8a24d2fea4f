//! State-space extraction by unit perturbation.
//!
//! For a linear network with capacitor voltages and inductor currents as
//! states, `dX/dt = A·X + B·U`. Column `j` of A is the derivative vector
//! produced when state `j` is held at 1 and every other state and input at 0;
//! columns of B are built the same way from the inputs.
//!
//! Each probe is a resistive DC problem: capacitors become voltage
//! constraints, inductors become current injections, and the augmented MNA
//! system is solved once per probe.

use std::fmt::Write as _;

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use svm_core::mna::MnaSystem;
use svm_core::units::format_exponent;
use svm_core::{Circuit, Component, ComponentKind, Diagnostic};

use crate::error::{Error, Result};
use crate::linear::solve_dense;

/// Shunt conductance added on every node diagonal.
pub const GMIN: f64 = 1e-12;

/// Diagonal term on every voltage-constraint row.
pub const CONSTRAINT_DIAGONAL: f64 = -1e-12;

/// Coefficients at or below this magnitude are left out of rendered equations.
const EQUATION_EPSILON: f64 = 1e-12;

/// What to do when a probe's augmented system cannot be solved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SingularPolicy {
    /// Fill the column with zeros and report a diagnostic.
    #[default]
    ZeroColumn,
    /// Abort the build.
    Error,
}

/// The variable forced to unit value during one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Position in the state vector.
    State(usize),
    /// Position in the input vector.
    Input(usize),
}

/// Continuous-time linear model of a circuit.
#[derive(Debug, Clone)]
pub struct StateSpace {
    /// `nx x nx`.
    pub a: DMatrix<f64>,
    /// `nx x nu`.
    pub b: DMatrix<f64>,
    /// Component index of each state, in circuit order.
    pub states: Vec<usize>,
    /// Component index of each input, in circuit order.
    pub inputs: Vec<usize>,
    /// `U(name)` / `I(name)` for each state.
    pub labels: Vec<String>,
    /// Probes that fell back to a zero column.
    pub diagnostics: Vec<Diagnostic>,
}

impl StateSpace {
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Position of a state in X by its label.
    pub fn state_position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// One line per state: `d[U(C1)]/dt = 1.0E+5 * I(L1) + ...`.
    ///
    /// Only the A terms are written; terms with negligible coefficients are
    /// skipped.
    pub fn equations(&self) -> Vec<String> {
        (0..self.num_states())
            .map(|i| {
                let mut eq = format!("d[{}]/dt = ", self.labels[i]);
                for j in 0..self.num_states() {
                    let coeff = self.a[(i, j)];
                    if coeff.abs() > EQUATION_EPSILON {
                        let _ = write!(
                            eq,
                            "{} * {} + ",
                            format_exponent(coeff, 1),
                            self.labels[j]
                        );
                    }
                }
                eq.trim_end_matches([' ', '+']).to_string()
            })
            .collect()
    }

    /// Serializable view of the system.
    pub fn report(&self, components: &[Component]) -> StateSpaceReport {
        let rows = |m: &DMatrix<f64>| -> Vec<Vec<f64>> {
            m.row_iter().map(|r| r.iter().copied().collect()).collect()
        };
        StateSpaceReport {
            states: self.labels.clone(),
            inputs: self
                .inputs
                .iter()
                .map(|&i| components[i].name.clone())
                .collect(),
            a: rows(&self.a),
            b: rows(&self.b),
        }
    }
}

/// Serializable form of [`StateSpace`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSpaceReport {
    pub states: Vec<String>,
    pub inputs: Vec<String>,
    pub a: Vec<Vec<f64>>,
    pub b: Vec<Vec<f64>>,
}

/// A voltage-type constraint row of the augmented system.
#[derive(Debug, Clone, Copy)]
struct Constraint {
    component: usize,
    /// The probe that drives this constraint to 1.
    driven_by: Probe,
}

/// Builds A and B for one circuit.
#[derive(Debug)]
pub struct StateSpaceBuilder<'a> {
    circuit: &'a Circuit,
    num_nodes: usize,
    states: Vec<usize>,
    inputs: Vec<usize>,
    /// Voltage sources (input order), then capacitors (state order).
    constraints: Vec<Constraint>,
    /// Branch-current unknown of each capacitor state, `None` for inductors.
    state_branch: Vec<Option<usize>>,
    policy: SingularPolicy,
}

impl<'a> StateSpaceBuilder<'a> {
    pub fn new(circuit: &'a Circuit) -> Self {
        let components = circuit.components();
        let states = circuit.state_indices();
        let inputs = circuit.input_indices();

        let mut constraints: Vec<Constraint> = inputs
            .iter()
            .enumerate()
            .filter(|&(_, &ci)| components[ci].kind == ComponentKind::VoltageSource)
            .map(|(k, &ci)| Constraint {
                component: ci,
                driven_by: Probe::Input(k),
            })
            .collect();

        let mut state_branch = Vec::with_capacity(states.len());
        for (j, &ci) in states.iter().enumerate() {
            if components[ci].kind == ComponentKind::Capacitor {
                state_branch.push(Some(constraints.len()));
                constraints.push(Constraint {
                    component: ci,
                    driven_by: Probe::State(j),
                });
            } else {
                state_branch.push(None);
            }
        }

        Self {
            circuit,
            num_nodes: circuit.node_count().saturating_sub(1),
            states,
            inputs,
            constraints,
            state_branch,
            policy: SingularPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SingularPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Size of the augmented system solved per probe.
    pub fn system_size(&self) -> usize {
        self.num_nodes + self.constraints.len()
    }

    /// Run all `nx + nu` probes and collect the columns of A and B.
    pub fn build(&self) -> Result<StateSpace> {
        self.circuit.validate()?;

        let nx = self.states.len();
        let nu = self.inputs.len();
        let mut a = DMatrix::zeros(nx, nx);
        let mut b = DMatrix::zeros(nx, nu);
        let mut diagnostics = Vec::new();

        log::info!(
            "building state space: {nx} states, {nu} inputs, augmented size {}",
            self.system_size()
        );

        for j in 0..nx {
            let column = self.probe_column(Probe::State(j), &mut diagnostics)?;
            a.set_column(j, &column);
        }
        for k in 0..nu {
            let column = self.probe_column(Probe::Input(k), &mut diagnostics)?;
            b.set_column(k, &column);
        }

        log::debug!("A = {a}");
        log::debug!("B = {b}");

        let components = self.circuit.components();
        let labels = self
            .states
            .iter()
            .map(|&i| components[i].state_label().unwrap_or_default())
            .collect();

        Ok(StateSpace {
            a,
            b,
            states: self.states.clone(),
            inputs: self.inputs.clone(),
            labels,
            diagnostics,
        })
    }

    fn probe_column(
        &self,
        probe: Probe,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<DVector<f64>> {
        let mna = self.assemble(probe);
        match solve_dense(mna.matrix(), mna.rhs()) {
            Ok(solution) => Ok(self.derivatives(&solution)),
            Err(Error::SingularMatrix) => {
                let name = self.probe_name(probe);
                match self.policy {
                    SingularPolicy::ZeroColumn => {
                        let diagnostic = Diagnostic::SingularPerturbation { probe: name };
                        diagnostic.log();
                        diagnostics.push(diagnostic);
                        Ok(DVector::zeros(self.states.len()))
                    }
                    SingularPolicy::Error => Err(Error::SingularPerturbation { probe: name }),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Stamp the resistive network with `probe` at 1 and everything else at 0.
    pub fn assemble(&self, probe: Probe) -> MnaSystem {
        let components = self.circuit.components();
        let mut mna = MnaSystem::new(self.num_nodes, self.constraints.len());

        mna.stamp_gmin(GMIN);

        for c in components {
            match c.kind {
                ComponentKind::Resistor => {
                    mna.stamp_conductance(c.node1.mna_index(), c.node2.mna_index(), 1.0 / c.value);
                }
                ComponentKind::Vccs => mna.stamp_vccs(
                    c.node1.mna_index(),
                    c.node2.mna_index(),
                    c.ctrl1.mna_index(),
                    c.ctrl2.mna_index(),
                    c.value,
                ),
                _ => {}
            }
        }

        // Current-type excitations: current sources and inductor probes
        let unit = |active: bool| if active { 1.0 } else { 0.0 };
        for (k, &ci) in self.inputs.iter().enumerate() {
            let c = &components[ci];
            if c.kind == ComponentKind::CurrentSource {
                let value = unit(probe == Probe::Input(k));
                mna.stamp_current_source(c.node1.mna_index(), c.node2.mna_index(), value);
            }
        }
        for (j, &ci) in self.states.iter().enumerate() {
            let c = &components[ci];
            if c.kind == ComponentKind::Inductor {
                let value = unit(probe == Probe::State(j));
                mna.stamp_current_source(c.node1.mna_index(), c.node2.mna_index(), value);
            }
        }

        // Voltage-type constraints: voltage sources and capacitor probes
        for (branch, constraint) in self.constraints.iter().enumerate() {
            let c = &components[constraint.component];
            let value = unit(probe == constraint.driven_by);
            mna.stamp_voltage_constraint(c.node1.mna_index(), c.node2.mna_index(), branch, value);
            mna.stamp_branch_diagonal(branch, CONSTRAINT_DIAGONAL);
        }

        mna
    }

    /// Read state derivatives out of a solved augmented system.
    fn derivatives(&self, solution: &DVector<f64>) -> DVector<f64> {
        let components = self.circuit.components();
        let voltage = |idx: Option<usize>| idx.map_or(0.0, |i| solution[i]);

        DVector::from_iterator(
            self.states.len(),
            self.states.iter().zip(&self.state_branch).map(|(&ci, branch)| {
                let c = &components[ci];
                match branch {
                    // i_C = C dV/dt
                    Some(b) => solution[self.num_nodes + b] / c.value,
                    // v_L = L dI/dt
                    None => {
                        (voltage(c.node1.mna_index()) - voltage(c.node2.mna_index())) / c.value
                    }
                }
            }),
        )
    }

    fn probe_name(&self, probe: Probe) -> String {
        let components = self.circuit.components();
        match probe {
            Probe::State(j) => {
                let c = &components[self.states[j]];
                format!("state {}", c.state_label().unwrap_or_else(|| c.name.clone()))
            }
            Probe::Input(k) => format!("input {}", components[self.inputs[k]].name),
        }
    }
}

/// Build A and B for `circuit` with the given singular-system policy.
pub fn build_state_space(circuit: &Circuit, policy: SingularPolicy) -> Result<StateSpace> {
    StateSpaceBuilder::new(circuit).with_policy(policy).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rlc_step() -> Circuit {
        Circuit::from_components(vec![
            Component::voltage_source("U_src", 1, 0, 10.0),
            Component::resistor("R1", 1, 2, 5.0),
            Component::inductor("L1", 2, 3, 1e-3),
            Component::capacitor("C1", 3, 0, 10e-6),
        ])
    }

    fn assert_close(actual: f64, expected: f64, what: &str) {
        let tol = 1e-6 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() < tol,
            "{what} = {actual} (expected {expected})"
        );
    }

    #[test]
    fn test_series_rlc_matrices() {
        let circuit = rlc_step();
        let ss = build_state_space(&circuit, SingularPolicy::ZeroColumn).unwrap();

        // States in circuit order: I(L1), U(C1)
        assert_eq!(ss.labels, vec!["I(L1)", "U(C1)"]);
        assert_eq!(ss.a.shape(), (2, 2));
        assert_eq!(ss.b.shape(), (2, 1));

        let (r, l, c) = (5.0, 1e-3, 10e-6);
        assert_close(ss.a[(0, 0)], -r / l, "dI/dt per I");
        assert_close(ss.a[(0, 1)], -1.0 / l, "dI/dt per Uc");
        assert_close(ss.a[(1, 0)], 1.0 / c, "dUc/dt per I");
        assert_close(ss.a[(1, 1)], 0.0, "dUc/dt per Uc");
        assert_close(ss.b[(0, 0)], 1.0 / l, "dI/dt per Usrc");
        assert_close(ss.b[(1, 0)], 0.0, "dUc/dt per Usrc");
        assert!(ss.diagnostics.is_empty());
    }

    #[test]
    fn test_rc_discharge_matrix() {
        let circuit = Circuit::from_components(vec![
            Component::resistor("R", 1, 0, 2.0),
            Component::capacitor("C", 1, 0, 0.5),
        ]);
        let ss = build_state_space(&circuit, SingularPolicy::Error).unwrap();
        assert_close(ss.a[(0, 0)], -1.0, "-1/RC");
        assert_eq!(ss.b.ncols(), 0);
    }

    #[test]
    fn test_current_source_input() {
        // I1 pushes current from ground into node 1, charging C
        let circuit = Circuit::from_components(vec![
            Component::current_source("I1", 0, 1, 1e-3),
            Component::resistor("R1", 1, 0, 1e3),
            Component::capacitor("C1", 1, 0, 1e-6),
        ]);
        let ss = build_state_space(&circuit, SingularPolicy::Error).unwrap();
        assert_close(ss.b[(0, 0)], 1.0 / 1e-6, "dUc/dt per I1");
        assert_close(ss.a[(0, 0)], -1.0 / (1e3 * 1e-6), "-1/RC");
    }

    #[test]
    fn test_vccs_feedback() {
        // Gate cap C_gs drives a VCCS discharging C_ds through node 2
        let circuit = Circuit::from_components(vec![
            Component::capacitor("C_gs", 1, 0, 1.0),
            Component::resistor("R_g", 1, 0, 1.0),
            Component::vccs("J", 2, 0, 1, 0, 0.5),
            Component::capacitor("C_ds", 2, 0, 2.0),
        ]);
        let ss = build_state_space(&circuit, SingularPolicy::Error).unwrap();
        // gm * V(C_gs) leaves node 2 through the VCCS: dV(C_ds)/dt = -gm / C_ds
        assert_close(ss.a[(1, 0)], -0.25, "VCCS coupling");
        assert_close(ss.a[(0, 0)], -1.0, "gate discharge");
    }

    #[test]
    fn test_build_is_deterministic() {
        let circuit = rlc_step();
        let first = build_state_space(&circuit, SingularPolicy::ZeroColumn).unwrap();
        let second = build_state_space(&circuit, SingularPolicy::ZeroColumn).unwrap();
        assert_eq!(first.a, second.a);
        assert_eq!(first.b, second.b);
    }

    #[test]
    fn test_augmented_layout() {
        let circuit = rlc_step();
        let builder = StateSpaceBuilder::new(&circuit);
        // 3 node voltages + U_src + C1
        assert_eq!(builder.system_size(), 5);

        let mna = builder.assemble(Probe::Input(0));
        // U_src constraint is branch 0, driven to 1
        assert_eq!(mna.rhs()[3], 1.0);
        assert_eq!(mna.rhs()[4], 0.0);
        assert_eq!(mna.matrix()[(3, 0)], 1.0);
        assert_eq!(mna.matrix()[(3, 3)], CONSTRAINT_DIAGONAL);
        assert_eq!(mna.matrix()[(1, 1)], 1.0 / 5.0 + GMIN);
    }

    #[test]
    fn test_inductor_probe_injects_current() {
        let circuit = rlc_step();
        let mna = StateSpaceBuilder::new(&circuit).assemble(Probe::State(0));
        // L1 runs 2 -> 3: unit current leaves node 2 and enters node 3
        assert_eq!(mna.rhs()[1], -1.0);
        assert_eq!(mna.rhs()[2], 1.0);
    }

    #[test]
    fn test_parallel_voltage_constraints() {
        // Two capacitors in parallel: the probed one at 1 V and the other at
        // 0 V fight over the same node pair. The constraint diagonal keeps
        // the system solvable.
        let circuit = Circuit::from_components(vec![
            Component::capacitor("C1", 1, 0, 1.0),
            Component::capacitor("C2", 1, 0, 1.0),
            Component::resistor("R", 1, 0, 1.0),
        ]);
        let ss = build_state_space(&circuit, SingularPolicy::ZeroColumn).unwrap();
        assert_eq!(ss.a.shape(), (2, 2));
        assert!(ss.a.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_equations() {
        let circuit = rlc_step();
        let ss = build_state_space(&circuit, SingularPolicy::ZeroColumn).unwrap();
        let eqs = ss.equations();
        assert_eq!(eqs.len(), 2);
        assert_eq!(eqs[0], "d[I(L1)]/dt = -5.0E+3 * I(L1) + -1.0E+3 * U(C1)");
        // gmin leaves a ~1e-7 self term on the capacitor, above the cutoff
        assert!(
            eqs[1].starts_with("d[U(C1)]/dt = 1.0E+5 * I(L1)"),
            "{}",
            eqs[1]
        );
    }

    /// The VCCS feeds back exactly the conductance R1 and gmin put on node 1,
    /// leaving that node row at zero for every probe.
    fn cancelled_node() -> Circuit {
        Circuit::from_components(vec![
            Component::resistor("R1", 1, 0, 1.0),
            Component::vccs("G1", 0, 1, 1, 0, 1.0 + GMIN),
            Component::inductor("L1", 1, 0, 1.0),
        ])
    }

    #[test]
    fn test_singular_probe_gives_zero_column() {
        let ss = build_state_space(&cancelled_node(), SingularPolicy::ZeroColumn).unwrap();

        assert_eq!(ss.a.shape(), (1, 1));
        assert_eq!(ss.a[(0, 0)], 0.0);
        assert_eq!(
            ss.diagnostics,
            vec![Diagnostic::SingularPerturbation {
                probe: "state I(L1)".to_string()
            }]
        );
    }

    #[test]
    fn test_singular_probe_strict() {
        let result = build_state_space(&cancelled_node(), SingularPolicy::Error);
        match result {
            Err(Error::SingularPerturbation { probe }) => assert_eq!(probe, "state I(L1)"),
            other => panic!("expected a singular perturbation error, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_value_rejected() {
        let circuit = Circuit::from_components(vec![Component::capacitor("C0", 1, 0, 0.0)]);
        let result = build_state_space(&circuit, SingularPolicy::ZeroColumn);
        assert!(matches!(result, Err(Error::Circuit(_))));
    }
}
