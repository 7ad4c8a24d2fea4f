//! Equation building and time integration for svm.
//!
//! This crate provides:
//! - Dense LU helpers for the small systems the simulator produces
//! - State-space extraction (`A`, `B`) by unit perturbation of the MNA system
//! - Fixed-step trapezoidal integration with the stimulus ramp
//! - The end-to-end run pipeline

pub mod error;
pub mod linear;
pub mod simulation;
pub mod state_space;
pub mod transient;

pub use error::{Error, Result};
pub use simulation::{
    RunConfig, SimulationReport, SimulationTrace, StimulusSelection, TraceSeries, run_simulation,
};
pub use state_space::{
    GMIN, Probe, SingularPolicy, StateSpace, StateSpaceBuilder, StateSpaceReport,
    build_state_space,
};
pub use transient::{
    InitialState, InputShaping, MAX_STEPS, StepBudget, TransientParams, TransientResult,
    TrapezoidalStepper, solve_transient,
};
