//! Modified Nodal Analysis (MNA) system for resistive probe networks.
//!
//! Unknowns are the non-ground node voltages followed by one branch current
//! per voltage constraint. A constraint is anything that pins the voltage
//! across two nodes: an independent voltage source, or a capacitor held at a
//! known voltage while the equation builder probes it.

use nalgebra::{DMatrix, DVector};

/// Dense `matrix · x = rhs` with `num_nodes + num_constraints` unknowns.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    pub matrix: DMatrix<f64>,
    pub rhs: DVector<f64>,
    /// Nodes excluding ground.
    pub num_nodes: usize,
    /// Voltage constraints, each adding a branch-current unknown.
    pub num_constraints: usize,
}

impl MnaSystem {
    pub fn new(num_nodes: usize, num_constraints: usize) -> Self {
        let size = num_nodes + num_constraints;
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
            num_nodes,
            num_constraints,
        }
    }

    pub fn size(&self) -> usize {
        self.num_nodes + self.num_constraints
    }

    /// Row/column of a constraint's branch current.
    pub fn branch_row(&self, branch: usize) -> usize {
        self.num_nodes + branch
    }

    /// Conductance `g` between two nodes; `None` is ground.
    pub fn stamp_conductance(&mut self, node_i: Option<usize>, node_j: Option<usize>, g: f64) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += g;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += g;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= g;
            self.matrix[(j, i)] -= g;
        }
    }

    /// Shunt `gmin` from every node to ground. Nodes reached only through
    /// current-type branches would otherwise leave the matrix singular.
    pub fn stamp_gmin(&mut self, gmin: f64) {
        for i in 0..self.num_nodes {
            self.matrix[(i, i)] += gmin;
        }
    }

    /// Voltage-controlled current source.
    ///
    /// `gm * (V(ctrl_pos) - V(ctrl_neg))` leaves `node_out` and enters
    /// `node_in` through the device.
    pub fn stamp_vccs(
        &mut self,
        node_out: Option<usize>,
        node_in: Option<usize>,
        ctrl_pos: Option<usize>,
        ctrl_neg: Option<usize>,
        gm: f64,
    ) {
        for (row, sign) in [(node_out, 1.0), (node_in, -1.0)] {
            let Some(row) = row else { continue };
            if let Some(cp) = ctrl_pos {
                self.matrix[(row, cp)] += sign * gm;
            }
            if let Some(cn) = ctrl_neg {
                self.matrix[(row, cn)] -= sign * gm;
            }
        }
    }

    /// Independent current `current` driven from `node_i` through the branch
    /// into `node_j`.
    pub fn stamp_current_source(
        &mut self,
        node_i: Option<usize>,
        node_j: Option<usize>,
        current: f64,
    ) {
        if let Some(i) = node_i {
            self.rhs[i] -= current;
        }
        if let Some(j) = node_j {
            self.rhs[j] += current;
        }
    }

    /// Pin `V(node_pos) - V(node_neg)` to `voltage` using constraint `branch`.
    ///
    /// The branch current flows into `node_pos` from the constraint and shows
    /// up in KCL with that sign.
    pub fn stamp_voltage_constraint(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        branch: usize,
        voltage: f64,
    ) {
        let row = self.branch_row(branch);

        if let Some(i) = node_pos {
            self.matrix[(i, row)] += 1.0;
            self.matrix[(row, i)] += 1.0;
        }
        if let Some(j) = node_neg {
            self.matrix[(j, row)] -= 1.0;
            self.matrix[(row, j)] -= 1.0;
        }

        self.rhs[row] = voltage;
    }

    /// Add `g` on the diagonal of constraint `branch`. A tiny negative value
    /// keeps loops made only of constraints from being exactly singular.
    pub fn stamp_branch_diagonal(&mut self, branch: usize, g: f64) {
        let row = self.branch_row(branch);
        self.matrix[(row, row)] += g;
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }
}
