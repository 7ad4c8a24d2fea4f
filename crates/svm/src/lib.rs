//! # svm
//!
//! A state-variable method simulator for linear lumped circuits.
//!
//! svm covers the whole chain from netlist to waveforms:
//! - Netlist parsing (R, L, C, independent sources, VCCS)
//! - Spanning-tree decomposition and fundamental loop matrix
//! - Extraction of `dX/dt = A·X + B·U` by unit perturbation of the MNA system
//! - Fixed-step trapezoidal integration with a delayed ramp on stimulus sources
//!
//! ## Quick Start
//!
//! ```rust
//! use svm::prelude::*;
//!
//! let circuit = svm::parse_named(
//!     "U_src V 10 1 0\nR1 R 5 1 2\nL1 Inductor 0.001 2 3\nC1 Capacitor 10e-6 3 0\n",
//!     "RLC_step",
//! )
//! .unwrap();
//!
//! let config = RunConfig::new(TransientParams::new(0.01, 1e-6));
//! let report = run_simulation(&circuit, &config).unwrap();
//!
//! let u = report.transient.series("U(C1)").unwrap();
//! assert!((u[u.len() - 1] - 10.0).abs() < 1e-3);
//! ```
//!
//! ## Step by step
//!
//! ```rust
//! use svm::prelude::*;
//!
//! let mut circuit = Circuit::from_components(vec![
//!     Component::resistor("R1", 1, 0, 1e3),
//!     Component::capacitor("C1", 1, 0, 1e-6),
//! ]);
//!
//! let topology = analyze(&mut circuit);
//! assert_eq!(topology.num_loops(), 1);
//!
//! let system = build_state_space(&circuit, SingularPolicy::Error).unwrap();
//! assert!((system.a[(0, 0)] + 1e3).abs() < 1e-3);
//! ```

// Re-export member crates
pub use svm_core as core;
pub use svm_parser as parser;
pub use svm_solver as solver;

// ============================================================================
// Convenient re-exports from svm_core
// ============================================================================

pub use svm_core::{
    // Circuit representation
    Circuit,
    Component,
    ComponentKind,
    // Diagnostics and errors
    Diagnostic,
    Error as CoreError,
    NodeId,
    // Topology
    Topology,
    TopologyReport,
    analyze,
};

// MNA system (exported from submodule)
pub use svm_core::mna::MnaSystem;

// ============================================================================
// Convenient re-exports from svm_parser
// ============================================================================

pub use svm_parser::{
    // Errors
    Error as ParseError,
    parse,
    parse_initial_conditions,
    parse_named,
};

// ============================================================================
// Convenient re-exports from svm_solver
// ============================================================================

pub use svm_solver::{
    // Errors
    Error as SolverError,
    InitialState,
    InputShaping,
    // Pipeline
    RunConfig,
    SimulationReport,
    SimulationTrace,
    // State space
    SingularPolicy,
    StateSpace,
    StateSpaceBuilder,
    StimulusSelection,
    // Transient analysis
    TransientParams,
    TransientResult,
    build_state_space,
    run_simulation,
    solve_transient,
};

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

/// Prelude module containing commonly used types.
///
/// ```rust
/// use svm::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::{Circuit, Component, ComponentKind, Diagnostic, NodeId, analyze};

    // Parser
    pub use crate::{parse, parse_initial_conditions, parse_named};

    // Solver
    pub use crate::{
        InitialState, InputShaping, RunConfig, SingularPolicy, StateSpace, StimulusSelection,
        TransientParams, TransientResult, build_state_space, run_simulation, solve_transient,
    };

    // Common external types
    pub use crate::{DMatrix, DVector};
}
