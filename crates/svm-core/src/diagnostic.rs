//! Non-fatal conditions absorbed during a run.
//!
//! Every run collects these next to its results and logs each one at warn
//! level.

use std::fmt;

use serde::Serialize;

use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No component touched ground; `node` was renamed to node 0.
    GroundRemapped { node: NodeId },

    /// A chord whose endpoints are not joined by any tree path. Its loop
    /// matrix row is left empty.
    DisconnectedChord { component: String },

    /// The augmented system was singular for this probe; its derivative
    /// column was replaced by zeros.
    SingularPerturbation { probe: String },

    /// The requested step count exceeded the cap.
    StepCountClamped {
        requested: u64,
        steps: usize,
        t_end: f64,
    },
}

impl Diagnostic {
    /// Emit this diagnostic through the `log` facade.
    pub fn log(&self) {
        log::warn!("{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::GroundRemapped { node } => {
                write!(f, "no component references ground; node {node} taken as GND (0)")
            }
            Diagnostic::DisconnectedChord { component } => {
                write!(f, "chord {component} has no tree path between its terminals")
            }
            Diagnostic::SingularPerturbation { probe } => {
                write!(f, "singular augmented system while probing {probe}; column set to zero")
            }
            Diagnostic::StepCountClamped {
                requested,
                steps,
                t_end,
            } => write!(
                f,
                "too many steps ({requested}); limited to {steps}, T_end shortened to {t_end:e}"
            ),
        }
    }
}
