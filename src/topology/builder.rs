//! Topology model construction.
//!
//! This file contains the validating builder for the topology model. The
//! builder rejects name and address collisions and overlapping subnets at
//! insertion time; `freeze` produces the immutable model the compiler
//! consumes. There is no mutation after freezing.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::debug;

use super::types::{
    Attachment, Endpoint, Interface, Link, LinkId, Node, NodeId, Role, Segment, SegmentId,
    Topology,
};

/// Model construction errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("duplicate name '{name}' within {scope}")]
    DuplicateName { name: String, scope: String },
    #[error("subnet {new} overlaps already-registered subnet {existing}")]
    OverlappingSubnet { new: Ipv4Net, existing: Ipv4Net },
    #[error("link endpoints {a} and {b} do not share a subnet")]
    MismatchedLinkSubnet { a: Ipv4Net, b: Ipv4Net },
    #[error("address {addr} is already assigned to interface '{interface}'")]
    DuplicateAddress { addr: Ipv4Addr, interface: String },
    #[error("both endpoints of a link sit on node '{node}'")]
    SelfLink { node: String },
    #[error("segment '{name}' needs at least one member interface")]
    EmptySegment { name: String },
}

/// One attachment of a shared segment: node, interface name, address.
pub type SegmentMemberSpec = (NodeId, String, Ipv4Net);

/// Incremental, validating constructor for [`Topology`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    segments: Vec<Segment>,
    subnets: Vec<Ipv4Net>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Routers get forwarding enabled; hosts do not.
    pub fn add_node(&mut self, name: &str, role: Role) -> Result<NodeId, ModelError> {
        if self.nodes.iter().any(|n| n.name == name) {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
                scope: "topology".to_string(),
            });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            role,
            forwarding_enabled: role == Role::Router,
            interfaces: Vec::new(),
        });
        debug!("Added node '{}' as {:?}", name, role);
        Ok(id)
    }

    /// Add a point-to-point link, creating one interface on each node.
    ///
    /// Both endpoint addresses must fall in the same subnet; that subnet is
    /// registered and must not overlap any previously registered one.
    pub fn add_link(
        &mut self,
        a: NodeId,
        iface_a: &str,
        addr_a: Ipv4Net,
        b: NodeId,
        iface_b: &str,
        addr_b: Ipv4Net,
    ) -> Result<LinkId, ModelError> {
        if addr_a.trunc() != addr_b.trunc() {
            return Err(ModelError::MismatchedLinkSubnet {
                a: addr_a,
                b: addr_b,
            });
        }
        if a == b {
            return Err(ModelError::SelfLink {
                node: self.nodes[a.0].name.clone(),
            });
        }
        // Subnet overlap is checked before any address collision so an
        // intersecting CIDR always surfaces as the overlap error
        self.check_subnet_free(addr_a.trunc())?;
        self.check_interface_free(a, iface_a)?;
        self.check_interface_free(b, iface_b)?;
        self.check_address_free(addr_a.addr())?;
        self.check_address_free(addr_b.addr())?;
        if addr_a.addr() == addr_b.addr() {
            return Err(ModelError::DuplicateAddress {
                addr: addr_b.addr(),
                interface: iface_a.to_string(),
            });
        }
        self.subnets.push(addr_a.trunc());

        let id = LinkId(self.links.len());
        let ep_a = self.attach(a, iface_a, addr_a, Attachment::Link(id));
        let ep_b = self.attach(b, iface_b, addr_b, Attachment::Link(id));
        self.links.push(Link { a: ep_a, b: ep_b });
        debug!(
            "Linked {}:{} ({}) <-> {}:{} ({})",
            self.nodes[a.0].name, iface_a, addr_a, self.nodes[b.0].name, iface_b, addr_b
        );
        Ok(id)
    }

    /// Add a shared broadcast segment with one interface per member.
    ///
    /// All member addresses must share one subnet, registered like a link's.
    pub fn add_segment(
        &mut self,
        name: &str,
        members: &[SegmentMemberSpec],
    ) -> Result<SegmentId, ModelError> {
        let Some((_, _, first_addr)) = members.first() else {
            return Err(ModelError::EmptySegment {
                name: name.to_string(),
            });
        };
        if self.segments.iter().any(|s| s.name == name) {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
                scope: "segments".to_string(),
            });
        }
        let subnet = first_addr.trunc();
        for (_, _, addr) in members {
            if addr.trunc() != subnet {
                return Err(ModelError::MismatchedLinkSubnet {
                    a: *first_addr,
                    b: *addr,
                });
            }
        }
        self.check_subnet_free(subnet)?;
        for (_, iface_name, addr) in members {
            self.check_address_free(addr.addr())?;
            if members
                .iter()
                .filter(|(_, _, other)| other.addr() == addr.addr())
                .count()
                > 1
            {
                return Err(ModelError::DuplicateAddress {
                    addr: addr.addr(),
                    interface: iface_name.clone(),
                });
            }
        }
        for (node, iface_name, _) in members {
            self.check_interface_free(*node, iface_name)?;
        }
        self.subnets.push(subnet);

        let id = SegmentId(self.segments.len());
        let endpoints = members
            .iter()
            .map(|(node, iface_name, addr)| {
                self.attach(*node, iface_name, *addr, Attachment::Segment(id))
            })
            .collect();
        self.segments.push(Segment {
            name: name.to_string(),
            members: endpoints,
        });
        debug!("Added segment '{}' on {} with {} members", name, subnet, members.len());
        Ok(id)
    }

    /// Freeze the model. The designated router ordering is creation order.
    pub fn freeze(self) -> Topology {
        let router_order = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_router())
            .map(|(i, _)| NodeId(i))
            .collect();
        Topology {
            nodes: self.nodes,
            links: self.links,
            segments: self.segments,
            subnets: self.subnets,
            router_order,
        }
    }

    fn attach(&mut self, node: NodeId, name: &str, addr: Ipv4Net, attachment: Attachment) -> Endpoint {
        let interfaces = &mut self.nodes[node.0].interfaces;
        let iface = interfaces.len();
        interfaces.push(Interface {
            name: name.to_string(),
            addr,
            attachment,
        });
        Endpoint { node, iface }
    }

    fn check_interface_free(&self, node: NodeId, name: &str) -> Result<(), ModelError> {
        if self.nodes[node.0].interface(name).is_some() {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
                scope: format!("node '{}'", self.nodes[node.0].name),
            });
        }
        Ok(())
    }

    fn check_address_free(&self, addr: Ipv4Addr) -> Result<(), ModelError> {
        for node in &self.nodes {
            if let Some(iface) = node.interfaces.iter().find(|iface| iface.ip() == addr) {
                return Err(ModelError::DuplicateAddress {
                    addr,
                    interface: iface.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_subnet_free(&self, subnet: Ipv4Net) -> Result<(), ModelError> {
        for &existing in &self.subnets {
            if existing.contains(&subnet.network()) || subnet.contains(&existing.network()) {
                return Err(ModelError::OverlappingSubnet {
                    new: subnet,
                    existing,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn test_duplicate_node_name() {
        let mut builder = TopologyBuilder::new();
        builder.add_node("r1", Role::Router).unwrap();
        let err = builder.add_node("r1", Role::Host).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateName { .. }));
    }

    #[test]
    fn test_duplicate_interface_name() {
        let mut builder = TopologyBuilder::new();
        let r1 = builder.add_node("r1", Role::Router).unwrap();
        let r2 = builder.add_node("r2", Role::Router).unwrap();
        let r3 = builder.add_node("r3", Role::Router).unwrap();
        builder
            .add_link(r1, "r1-eth1", net("10.0.0.1/24"), r2, "r2-eth1", net("10.0.0.2/24"))
            .unwrap();
        let err = builder
            .add_link(r1, "r1-eth1", net("10.0.1.1/24"), r3, "r3-eth1", net("10.0.1.2/24"))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateName { .. }));
    }

    #[test]
    fn test_overlapping_subnets() {
        let mut builder = TopologyBuilder::new();
        let r1 = builder.add_node("r1", Role::Router).unwrap();
        let r2 = builder.add_node("r2", Role::Router).unwrap();
        builder
            .add_link(r1, "r1-eth1", net("10.0.0.1/24"), r2, "r2-eth1", net("10.0.0.2/24"))
            .unwrap();

        // Exact duplicate on a second link is an overlap
        let err = builder
            .add_link(r1, "r1-eth2", net("10.0.0.3/24"), r2, "r2-eth2", net("10.0.0.4/24"))
            .unwrap_err();
        assert!(matches!(err, ModelError::OverlappingSubnet { .. }));

        // A wider block containing an existing /24 is an overlap too, and
        // the overlap is reported even though 10.0.0.1 also collides with
        // an assigned address
        let err = builder
            .add_link(r1, "r1-eth2", net("10.0.0.1/16"), r2, "r2-eth2", net("10.0.1.2/16"))
            .unwrap_err();
        assert!(matches!(err, ModelError::OverlappingSubnet { .. }));

        // Fresh addresses inside the wider block hit the same overlap
        let err = builder
            .add_link(r1, "r1-eth2", net("10.0.0.5/16"), r2, "r2-eth2", net("10.0.1.6/16"))
            .unwrap_err();
        assert!(matches!(err, ModelError::OverlappingSubnet { .. }));
    }

    #[test]
    fn test_self_link_rejected() {
        let mut builder = TopologyBuilder::new();
        let r1 = builder.add_node("r1", Role::Router).unwrap();
        let err = builder
            .add_link(r1, "r1-eth1", net("10.0.0.1/24"), r1, "r1-eth2", net("10.0.0.2/24"))
            .unwrap_err();
        assert!(matches!(err, ModelError::SelfLink { .. }));
        // Nothing half-built sticks around after the rejection
        let topology = builder.freeze();
        assert!(topology.node(r1).interfaces.is_empty());
        assert!(topology.subnets().is_empty());
    }

    #[test]
    fn test_mismatched_link_subnet() {
        let mut builder = TopologyBuilder::new();
        let r1 = builder.add_node("r1", Role::Router).unwrap();
        let r2 = builder.add_node("r2", Role::Router).unwrap();
        let err = builder
            .add_link(r1, "r1-eth1", net("10.0.0.1/24"), r2, "r2-eth1", net("10.0.1.2/24"))
            .unwrap_err();
        assert!(matches!(err, ModelError::MismatchedLinkSubnet { .. }));
    }

    #[test]
    fn test_duplicate_address_across_links() {
        let mut builder = TopologyBuilder::new();
        let r1 = builder.add_node("r1", Role::Router).unwrap();
        let r2 = builder.add_node("r2", Role::Router).unwrap();
        let h1 = builder.add_node("h1", Role::Host).unwrap();
        builder
            .add_link(r1, "r1-eth1", net("10.0.0.1/24"), r2, "r2-eth1", net("10.0.0.2/24"))
            .unwrap();
        // Same host address inside a segment that would share the subnet is
        // caught by the overlap check first, so collide inside a fresh one
        let err = builder.add_segment(
            "s1",
            &[
                (h1, "h1-eth0".to_string(), net("10.0.1.10/24")),
                (r1, "r1-eth2".to_string(), net("10.0.1.10/24")),
            ],
        );
        assert!(matches!(err.unwrap_err(), ModelError::DuplicateAddress { .. }));
    }

    #[test]
    fn test_segment_members_share_subnet() {
        let mut builder = TopologyBuilder::new();
        let r1 = builder.add_node("r1", Role::Router).unwrap();
        let h1 = builder.add_node("h1", Role::Host).unwrap();
        let err = builder.add_segment(
            "s1",
            &[
                (r1, "r1-eth1".to_string(), net("10.0.0.1/24")),
                (h1, "h1-eth0".to_string(), net("10.0.1.10/24")),
            ],
        );
        assert!(matches!(err.unwrap_err(), ModelError::MismatchedLinkSubnet { .. }));
    }

    #[test]
    fn test_freeze_router_order_and_forwarding() {
        let mut builder = TopologyBuilder::new();
        let r1 = builder.add_node("r1", Role::Router).unwrap();
        let h1 = builder.add_node("h1", Role::Host).unwrap();
        let r2 = builder.add_node("r2", Role::Router).unwrap();
        builder
            .add_link(r1, "r1-eth1", net("10.0.0.1/24"), r2, "r2-eth1", net("10.0.0.2/24"))
            .unwrap();
        let topology = builder.freeze();

        assert_eq!(topology.router_order(), &[r1, r2]);
        assert!(topology.node(r1).forwarding_enabled);
        assert!(!topology.node(h1).forwarding_enabled);
        assert_eq!(topology.subnets(), &[net("10.0.0.0/24")]);
    }
}
