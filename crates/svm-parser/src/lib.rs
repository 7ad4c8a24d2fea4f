//! Netlist reader for the svm simulator.
//!
//! # Example
//!
//! ```
//! use svm_parser::parse;
//!
//! let circuit = parse(r#"
//! // series RLC
//! U_src V 10 1 0
//! R1 R 5 1 2
//! L1 Inductor 0.001 2 3
//! C1 Capacitor 10e-6 3 0
//! "#).unwrap();
//!
//! assert_eq!(circuit.len(), 4);
//! ```

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{Error, Result};
pub use parser::{component_kind, parse, parse_initial_conditions, parse_named};
