//! Core circuit representation for the svm state-variable simulator.
//!
//! This crate provides the component model, the circuit container with its
//! ground normalization pass, the spanning-tree/fundamental-loop analysis,
//! and the Modified Nodal Analysis (MNA) system the equation builder stamps
//! into.

pub mod circuit;
pub mod component;
pub mod diagnostic;
pub mod error;
pub mod mna;
pub mod node;
pub mod topology;
pub mod units;

pub use circuit::Circuit;
pub use component::{Component, ComponentKind};
pub use diagnostic::Diagnostic;
pub use error::{Error, Result};
pub use node::NodeId;
pub use topology::{DisjointSet, Topology, TopologyReport, analyze};
