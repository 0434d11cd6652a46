//! Emulation plan types.
//!
//! This file contains the serializable record of the exact call sequence
//! the adapter issues against the external runtime, plus the address
//! registry written alongside it. The plan YAML and registry JSON are the
//! handoff artifacts an operator feeds to the emulation runtime.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use super::runtime::{EmulationRuntime, RuntimeError, SegmentAttachment};
use crate::topology::{Role, Topology};

/// One recorded runtime call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PlanStep {
    CreateNode {
        name: String,
    },
    SetForwarding {
        node: String,
        enabled: bool,
    },
    CreateLink {
        a: String,
        interface_a: String,
        addr_a: Ipv4Net,
        b: String,
        interface_b: String,
        addr_b: Ipv4Net,
    },
    CreateSegment {
        name: String,
        members: Vec<SegmentAttachment>,
    },
    ApplyRoute {
        node: String,
        destination: Ipv4Net,
        via: Ipv4Addr,
        out_interface: String,
    },
}

/// Ordered call sequence for one emulation session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmulationPlan {
    pub steps: Vec<PlanStep>,
}

/// Runtime implementation that records calls instead of emulating.
#[derive(Debug, Default)]
pub struct PlanRecorder {
    plan: EmulationPlan,
}

impl PlanRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_plan(self) -> EmulationPlan {
        self.plan
    }
}

impl EmulationRuntime for PlanRecorder {
    fn create_node(&mut self, name: &str) -> Result<(), RuntimeError> {
        self.plan.steps.push(PlanStep::CreateNode {
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_forwarding(&mut self, node: &str, enabled: bool) -> Result<(), RuntimeError> {
        self.plan.steps.push(PlanStep::SetForwarding {
            node: node.to_string(),
            enabled,
        });
        Ok(())
    }

    fn create_link(
        &mut self,
        a: &str,
        iface_a: &str,
        addr_a: Ipv4Net,
        b: &str,
        iface_b: &str,
        addr_b: Ipv4Net,
    ) -> Result<(), RuntimeError> {
        self.plan.steps.push(PlanStep::CreateLink {
            a: a.to_string(),
            interface_a: iface_a.to_string(),
            addr_a,
            b: b.to_string(),
            interface_b: iface_b.to_string(),
            addr_b,
        });
        Ok(())
    }

    fn create_segment(
        &mut self,
        name: &str,
        members: &[SegmentAttachment],
    ) -> Result<(), RuntimeError> {
        self.plan.steps.push(PlanStep::CreateSegment {
            name: name.to_string(),
            members: members.to_vec(),
        });
        Ok(())
    }

    fn apply_route(
        &mut self,
        node: &str,
        destination: Ipv4Net,
        via: Ipv4Addr,
        out_interface: &str,
    ) -> Result<(), RuntimeError> {
        self.plan.steps.push(PlanStep::ApplyRoute {
            node: node.to_string(),
            destination,
            via,
            out_interface: out_interface.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Address registry
// ============================================================================

/// Address of one interface, as the operator will see it inside the
/// emulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub name: String,
    pub addr: Ipv4Net,
}

/// All addresses of one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAddresses {
    pub name: String,
    pub role: String,
    pub forwarding_enabled: bool,
    pub interfaces: Vec<InterfaceAddress>,
}

/// Registry of every node's addresses, written next to the plan so
/// operators can predict addresses before anything is materialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRegistry {
    pub nodes: Vec<NodeAddresses>,
}

impl AddressRegistry {
    pub fn from_topology(topology: &Topology) -> Self {
        let nodes = topology
            .nodes()
            .map(|(_, node)| NodeAddresses {
                name: node.name.clone(),
                role: match node.role {
                    Role::Host => "host".to_string(),
                    Role::Router => "router".to_string(),
                },
                forwarding_enabled: node.forwarding_enabled,
                interfaces: node
                    .interfaces
                    .iter()
                    .map(|iface| InterfaceAddress {
                        name: iface.name.clone(),
                        addr: iface.addr,
                    })
                    .collect(),
            })
            .collect();
        AddressRegistry { nodes }
    }
}
