//! Circuit structure: the component list and the wiring between ports.

use std::collections::HashMap;
use std::fmt;

use super::netlist::NetFactory;
use super::types::{ComponentId, PortId, Value};
use crate::error::{NodalError, Result};
use crate::components::Component;
use crate::solver::SolverConfig;

/// A circuit: an append-only, ordered list of components and the wires
/// between their ports.
pub struct Circuit {
    /// All components, in the order they were added
    pub(crate) components: Vec<Box<dyn Component>>,

    /// Peers of each port, in wiring order (symmetric)
    pub(crate) wiring: HashMap<PortId, Vec<PortId>>,

    /// Numerical settings for the analyses
    pub(crate) config: SolverConfig,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Create an empty circuit with default solver settings.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    /// Create an empty circuit with custom solver settings.
    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            components: Vec::new(),
            wiring: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SolverConfig) {
        self.config = config;
    }

    /// Append a component. Its position fixes the order of extra rows.
    pub fn add<C: Component + 'static>(&mut self, component: C) -> ComponentId {
        self.add_boxed(Box::new(component))
    }

    /// Append an already boxed component.
    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> ComponentId {
        let id = ComponentId(self.components.len());
        self.components.push(component);
        id
    }

    /// Append several boxed components in order.
    pub fn extend<I>(&mut self, components: I) -> Vec<ComponentId>
    where
        I: IntoIterator<Item = Box<dyn Component>>,
    {
        components.into_iter().map(|c| self.add_boxed(c)).collect()
    }

    /// Wire two ports together. Wiring is symmetric and never removed.
    pub fn connect(&mut self, a: impl Into<PortId>, b: impl Into<PortId>) {
        let (a, b) = (a.into(), b.into());
        if a == b {
            log::debug!("Ignoring connection of {} to itself", a);
            return;
        }
        self.wiring.entry(a).or_default().push(b);
        self.wiring.entry(b).or_default().push(a);
    }

    /// Wire the first port to each of the others.
    pub fn connect_all(&mut self, ports: &[PortId]) {
        if let Some((&first, rest)) = ports.split_first() {
            for &port in rest {
                self.connect(first, port);
            }
        }
    }

    /// Ports wired directly to `port`, in wiring order.
    pub fn connections(&self, port: impl Into<PortId>) -> &[PortId] {
        self.wiring
            .get(&port.into())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.components.get(id.0).map(|c| c.as_ref())
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut (dyn Component + 'static)> {
        self.components.get_mut(id.0).map(|c| c.as_mut())
    }

    /// Change a component parameter between analyses.
    pub fn set_parameter(
        &mut self,
        id: ComponentId,
        parameter: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let component = self
            .components
            .get_mut(id.0)
            .ok_or_else(|| NodalError::UnknownComponent { id: id.to_string() })?;
        component.set_parameter(parameter, value.into())
    }

    /// Find a component by name.
    pub fn find_component(&self, name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Merge every wired port pair into nets and assign net ids.
    ///
    /// Components are visited in order, their ports in declaration order and
    /// each port's peers in wiring order, which fixes the net numbering.
    pub fn netlist(&self) -> NetFactory {
        let mut factory = NetFactory::new();

        for component in &self.components {
            for port in component.ports() {
                for &peer in self.connections(port.id()) {
                    factory.add_connection(port.id(), peer);
                }
            }
        }

        // Ids are the matrix rows/columns of each net
        factory.assign_net_ids();
        log::debug!(
            "Netlist: {} components, {} nets",
            self.components.len(),
            factory.len()
        );

        factory
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("components", &self.components)
            .field("wires", &(self.wiring.values().map(Vec::len).sum::<usize>() / 2))
            .field("config", &self.config)
            .finish()
    }
}
