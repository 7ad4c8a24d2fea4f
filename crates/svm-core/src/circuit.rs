//! Circuit container: the ordered component list plus its node space.

use crate::component::{Component, ComponentKind};
use crate::diagnostic::Diagnostic;
use crate::error::{Error, Result};
use crate::node::NodeId;

/// An ordered list of components connected at numbered nodes.
///
/// Component order is significant: it fixes the index space of the state
/// vector and the input vector.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    /// Circuit designation (usually the netlist file stem).
    title: Option<String>,
    components: Vec<Component>,
    /// Node count supplied by the caller; inferred from the components otherwise.
    declared_node_count: Option<usize>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new circuit with a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        let mut circuit = Self::new();
        circuit.title = Some(title.into());
        circuit
    }

    /// Build a circuit from an existing component list.
    pub fn from_components(components: Vec<Component>) -> Self {
        Self {
            components,
            ..Self::default()
        }
    }

    /// Get the circuit title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Set the circuit title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Append a component.
    pub fn add(&mut self, component: Component) {
        self.components.push(component);
    }

    /// Override the inferred node count.
    pub fn set_node_count(&mut self, node_count: usize) {
        self.declared_node_count = Some(node_count);
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Find a component by name.
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Highest node referenced by any terminal.
    pub fn max_node(&self) -> Option<NodeId> {
        self.components.iter().flat_map(|c| c.terminals()).max()
    }

    /// Number of node slots including ground.
    ///
    /// Either the declared count or one past the highest referenced node.
    pub fn node_count(&self) -> usize {
        self.declared_node_count
            .unwrap_or_else(|| self.max_node().map_or(1, |n| n.index() + 1))
    }

    /// Indices of components carrying a state variable, in list order.
    pub fn state_indices(&self) -> Vec<usize> {
        self.indices_where(|k| k.is_state())
    }

    /// Indices of independent sources, in list order.
    pub fn input_indices(&self) -> Vec<usize> {
        self.indices_where(|k| k.is_input())
    }

    fn indices_where(&self, pred: impl Fn(ComponentKind) -> bool) -> Vec<usize> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(c.kind))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether any component has a terminal on node 0.
    ///
    /// Only the two main terminals count, control terminals do not.
    pub fn references_ground(&self) -> bool {
        self.components
            .iter()
            .any(|c| c.node1.is_ground() || c.node2.is_ground())
    }

    /// Make sure the circuit has a ground reference.
    ///
    /// If no component touches node 0, the highest main-terminal node is
    /// renamed to 0 everywhere (control terminals included). Returns the
    /// diagnostic describing the remap, or `None` when nothing changed.
    pub fn normalize_ground(&mut self) -> Option<Diagnostic> {
        if self.components.is_empty() || self.references_ground() {
            return None;
        }

        let max = self
            .components
            .iter()
            .flat_map(|c| [c.node1, c.node2])
            .max()?;

        let remap = |n: &mut NodeId| {
            if *n == max {
                *n = NodeId::GROUND;
            }
        };
        for c in &mut self.components {
            remap(&mut c.node1);
            remap(&mut c.node2);
            remap(&mut c.ctrl1);
            remap(&mut c.ctrl2);
        }

        let diagnostic = Diagnostic::GroundRemapped { node: max };
        diagnostic.log();
        Some(diagnostic)
    }

    /// Check the structural invariants the solver relies on.
    pub fn validate(&self) -> Result<()> {
        if self.components.is_empty() {
            return Err(Error::EmptyCircuit);
        }

        let node_count = self.node_count();
        for c in &self.components {
            if let Some(node) = c.terminals().find(|n| n.index() >= node_count) {
                return Err(Error::NodeOutOfRange {
                    component: c.name.clone(),
                    node: node.as_u32(),
                    node_count,
                });
            }
            if c.kind.requires_nonzero_value() && c.value == 0.0 {
                return Err(Error::ZeroValue(c.name.clone()));
            }
            if !c.value.is_finite() {
                return Err(Error::InvalidCircuit(format!(
                    "component {} has non-finite value",
                    c.name
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<Component> for Circuit {
    fn from_iter<T: IntoIterator<Item = Component>>(iter: T) -> Self {
        Self::from_components(iter.into_iter().collect())
    }
}
