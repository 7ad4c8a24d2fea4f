//! Lumped circuit components.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Kind of a lumped element.
///
/// Variant order is the spanning-tree priority: voltage sources are the most
/// preferred tree members, current sources the least, VCCS last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    VoltageSource,
    Capacitor,
    Resistor,
    Inductor,
    CurrentSource,
    Vccs,
}

impl ComponentKind {
    /// Rank used when ordering components for tree construction.
    pub fn tree_priority(self) -> u8 {
        self as u8
    }

    /// Capacitors and inductors carry a state variable.
    pub fn is_state(self) -> bool {
        matches!(self, ComponentKind::Capacitor | ComponentKind::Inductor)
    }

    /// Independent sources are the inputs of the state-space model.
    pub fn is_input(self) -> bool {
        matches!(
            self,
            ComponentKind::VoltageSource | ComponentKind::CurrentSource
        )
    }

    /// Whether `value` is used as a divisor and therefore must be nonzero.
    pub fn requires_nonzero_value(self) -> bool {
        matches!(
            self,
            ComponentKind::Resistor | ComponentKind::Capacitor | ComponentKind::Inductor
        )
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentKind::VoltageSource => "VoltageSource",
            ComponentKind::Capacitor => "Capacitor",
            ComponentKind::Resistor => "Resistor",
            ComponentKind::Inductor => "Inductor",
            ComponentKind::CurrentSource => "CurrentSource",
            ComponentKind::Vccs => "VCCS",
        };
        f.pad(name)
    }
}

/// A two-terminal element, or a four-terminal VCCS.
///
/// Positive branch direction is `node1 -> node2`. For a VCCS the output
/// current flows from `node1` through the device to `node2`, proportional to
/// `v(ctrl1) - v(ctrl2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    /// Ohms, farads, henries, volts, amperes or siemens depending on `kind`.
    pub value: f64,
    pub node1: NodeId,
    pub node2: NodeId,
    pub ctrl1: NodeId,
    pub ctrl2: NodeId,
    /// Set by the topology analyzer; `None` until analysis has run.
    is_tree_branch: Option<bool>,
}

impl Component {
    /// Create a two-terminal component.
    pub fn new(
        name: impl Into<String>,
        kind: ComponentKind,
        value: f64,
        node1: impl Into<NodeId>,
        node2: impl Into<NodeId>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            node1: node1.into(),
            node2: node2.into(),
            ctrl1: NodeId::GROUND,
            ctrl2: NodeId::GROUND,
            is_tree_branch: None,
        }
    }

    pub fn resistor(name: impl Into<String>, n1: u32, n2: u32, ohms: f64) -> Self {
        Self::new(name, ComponentKind::Resistor, ohms, n1, n2)
    }

    pub fn capacitor(name: impl Into<String>, n1: u32, n2: u32, farads: f64) -> Self {
        Self::new(name, ComponentKind::Capacitor, farads, n1, n2)
    }

    pub fn inductor(name: impl Into<String>, n1: u32, n2: u32, henries: f64) -> Self {
        Self::new(name, ComponentKind::Inductor, henries, n1, n2)
    }

    pub fn voltage_source(name: impl Into<String>, n1: u32, n2: u32, volts: f64) -> Self {
        Self::new(name, ComponentKind::VoltageSource, volts, n1, n2)
    }

    pub fn current_source(name: impl Into<String>, n1: u32, n2: u32, amps: f64) -> Self {
        Self::new(name, ComponentKind::CurrentSource, amps, n1, n2)
    }

    /// Voltage-controlled current source with transconductance `gm`.
    pub fn vccs(
        name: impl Into<String>,
        n1: u32,
        n2: u32,
        ctrl1: u32,
        ctrl2: u32,
        gm: f64,
    ) -> Self {
        let mut c = Self::new(name, ComponentKind::Vccs, gm, n1, n2);
        c.ctrl1 = NodeId::new(ctrl1);
        c.ctrl2 = NodeId::new(ctrl2);
        c
    }

    /// Tree membership, once the topology analyzer has classified this component.
    pub fn is_tree_branch(&self) -> Option<bool> {
        self.is_tree_branch
    }

    /// Record tree membership. Only the first call has an effect.
    pub(crate) fn mark_tree_branch(&mut self, in_tree: bool) {
        if self.is_tree_branch.is_none() {
            self.is_tree_branch = Some(in_tree);
        }
    }

    /// All node references, control terminals included for a VCCS.
    pub fn terminals(&self) -> impl Iterator<Item = NodeId> + '_ {
        let ctrl = if self.kind == ComponentKind::Vccs {
            [Some(self.ctrl1), Some(self.ctrl2)]
        } else {
            [None, None]
        };
        [self.node1, self.node2].into_iter().chain(ctrl.into_iter().flatten())
    }

    /// Display label of the state variable carried by this component.
    ///
    /// `U(name)` for a capacitor voltage, `I(name)` for an inductor current.
    pub fn state_label(&self) -> Option<String> {
        match self.kind {
            ComponentKind::Capacitor => Some(format!("U({})", self.name)),
            ComponentKind::Inductor => Some(format!("I({})", self.name)),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.name, self.kind, self.value)
    }
}
