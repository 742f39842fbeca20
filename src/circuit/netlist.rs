//! Net construction: merging wired ports into electrical nodes.
//!
//! Every connection handed to [`NetFactory::add_connection`] either creates a
//! net, grows one, or merges two. The surviving net keeps its position in the
//! net list, so ids handed out by [`NetFactory::assign_net_ids`] follow the
//! order in which nets were first created.

use std::collections::HashMap;
use std::fmt;

use super::types::{Port, PortId};
use crate::error::{NodalError, Result};

/// One electrical node: the set of transitively connected ports.
#[derive(Debug, Clone)]
pub struct Net {
    name: String,
    ports: Vec<PortId>,
    id: Option<usize>,
}

impl Net {
    fn new(ports: Vec<PortId>) -> Self {
        Self {
            name: String::new(),
            ports,
            id: None,
        }
    }

    /// The assigned name; empty means unnamed.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// Matrix row/column of this net, once ids are assigned.
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn contains(&self, port: PortId) -> bool {
        self.ports.contains(&port)
    }

    /// A net is grounded iff it contains the ground singleton.
    pub fn is_ground(&self) -> bool {
        self.ports.iter().any(|p| p.is_ground())
    }

    /// The unknown this net contributes to the variable vector.
    pub fn variable_name(&self) -> Option<String> {
        if !self.name.is_empty() {
            Some(self.name.clone())
        } else {
            self.id.map(|id| format!("V{}", id))
        }
    }
}

impl fmt::Display for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ports: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
        write!(f, "Net({}, [{}])", self.name, ports.join(", "))
    }
}

/// Builds the partition of ports into nets.
#[derive(Debug, Clone, Default)]
pub struct NetFactory {
    /// Net storage; merged-away nets leave an empty slot behind
    slots: Vec<Option<Net>>,
    /// Live slots in net-list order
    order: Vec<usize>,
    /// Slot owning each port
    owner: HashMap<PortId, usize>,
    ids_assigned: bool,
}

impl NetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an undirected wire between two ports.
    pub fn add_connection(&mut self, port_a: PortId, port_b: PortId) {
        let slot_a = self.owner.get(&port_a).copied();
        let slot_b = self.owner.get(&port_b).copied();

        match (slot_a, slot_b) {
            (None, None) => {
                let ports = if port_a == port_b {
                    vec![port_a]
                } else {
                    vec![port_a, port_b]
                };
                let slot = self.slots.len();
                for port in &ports {
                    self.owner.insert(*port, slot);
                }
                self.slots.push(Some(Net::new(ports)));
                self.order.push(slot);
            }
            (Some(slot), None) => self.absorb(slot, port_b),
            (None, Some(slot)) => self.absorb(slot, port_a),
            (Some(a), Some(b)) if a == b => return,
            (Some(a), Some(b)) => self.merge(a, b),
        }

        self.invalidate_ids();
    }

    fn absorb(&mut self, slot: usize, port: PortId) {
        if let Some(net) = self.slots[slot].as_mut() {
            net.ports.push(port);
            self.owner.insert(port, slot);
        }
    }

    /// Move every port of `absorbed` into `survivor` and drop `absorbed`.
    fn merge(&mut self, survivor: usize, absorbed: usize) {
        let Some(gone) = self.slots[absorbed].take() else {
            return;
        };
        self.order.retain(|&slot| slot != absorbed);

        for port in &gone.ports {
            self.owner.insert(*port, survivor);
        }
        if let Some(net) = self.slots[survivor].as_mut() {
            net.ports.extend(gone.ports);
            if net.name.is_empty() {
                net.name = gone.name;
            }
        }
    }

    fn invalidate_ids(&mut self) {
        if self.ids_assigned {
            log::warn!("Connection added after net ids were assigned; ids invalidated");
            self.ids_assigned = false;
            for net in self.slots.iter_mut().flatten() {
                net.id = None;
            }
        }
    }

    /// Assign contiguous ids `0..N-1` in net-list order.
    pub fn assign_net_ids(&mut self) {
        for (id, &slot) in self.order.iter().enumerate() {
            if let Some(net) = self.slots[slot].as_mut() {
                net.id = Some(id);
            }
        }
        self.ids_assigned = true;
        log::debug!("Assigned ids to {} nets", self.order.len());
    }

    /// Whether ids are assigned and still valid.
    pub fn ids_assigned(&self) -> bool {
        self.ids_assigned
    }

    /// Nets in list order.
    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.order.iter().filter_map(|&slot| self.slots[slot].as_ref())
    }

    /// Number of nets.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The net containing `port`, if the port was ever connected.
    pub fn get_net_of(&self, port: PortId) -> Option<&Net> {
        let slot = *self.owner.get(&port)?;
        self.slots[slot].as_ref()
    }

    /// Matrix index of the net containing `port`.
    ///
    /// An unconnected port is a configuration error.
    pub fn net_id(&self, port: &Port) -> Result<usize> {
        let net = self
            .get_net_of(port.id())
            .ok_or_else(|| NodalError::unconnected(port))?;
        net.id.ok_or(NodalError::NetIdsNotAssigned)
    }

    /// Name the net containing `port`.
    pub fn set_name(&mut self, port: impl Into<PortId>, name: impl Into<String>) -> Result<()> {
        let port = port.into();
        let slot = *self
            .owner
            .get(&port)
            .ok_or_else(|| NodalError::unconnected(port))?;
        if let Some(net) = self.slots[slot].as_mut() {
            net.name = name.into();
        }
        Ok(())
    }

    /// First net carrying `name`.
    pub fn get(&self, name: &str) -> Option<&Net> {
        self.nets().find(|net| !name.is_empty() && net.name == name)
    }

    /// Ids of grounded nets, ascending.
    pub fn ground_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .nets()
            .filter(|net| net.is_ground())
            .filter_map(|net| net.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// The net part of the variable vector, in id order.
    pub fn variable_names(&self) -> Result<Vec<String>> {
        if !self.ids_assigned {
            return Err(NodalError::NetIdsNotAssigned);
        }
        Ok(self.nets().filter_map(Net::variable_name).collect())
    }
}
