//! Topology model type definitions.
//!
//! This file contains the frozen, immutable topology model handed to the
//! route compiler and the emulation adapter. Identity is fixed at build
//! time; structural index (creation order) doubles as the tie-break order
//! for route compilation.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

/// Index of a node within its topology, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in creation order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a point-to-point link within its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkId(pub(crate) usize);

/// Index of a shared segment within its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub(crate) usize);

/// Role of a node. Forwarding is a plain attribute interpreted by the
/// emulation adapter, never a type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Router,
}

/// What an interface terminates: a point-to-point link or a shared
/// broadcast segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Link(LinkId),
    Segment(SegmentId),
}

/// A network interface owned by exactly one node.
#[derive(Debug, Clone)]
pub struct Interface {
    /// Interface name, unique within the owning node (`<node>-eth<N>`)
    pub name: String,
    /// Assigned address with prefix length, e.g. `10.0.3.1/24`
    pub addr: Ipv4Net,
    /// The link or segment this interface terminates
    pub attachment: Attachment,
}

impl Interface {
    /// The subnet this interface's address falls in
    pub fn subnet(&self) -> Ipv4Net {
        self.addr.trunc()
    }

    /// The bare host address
    pub fn ip(&self) -> Ipv4Addr {
        self.addr.addr()
    }
}

/// A node in the topology: a host or a router with its interfaces.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub role: Role,
    /// Whether the emulation runtime should enable IP forwarding
    pub forwarding_enabled: bool,
    pub interfaces: Vec<Interface>,
}

impl Node {
    pub fn is_router(&self) -> bool {
        self.role == Role::Router
    }

    /// Look up an interface by name
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }

    /// True if one of this node's interfaces sits in `subnet`
    pub fn connects_to(&self, subnet: Ipv4Net) -> bool {
        self.interfaces.iter().any(|iface| iface.subnet() == subnet)
    }
}

/// One end of a link or one member of a segment: a node plus the index of
/// the terminating interface within that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub node: NodeId,
    pub iface: usize,
}

/// A point-to-point link between exactly two interfaces.
#[derive(Debug, Clone)]
pub struct Link {
    pub a: Endpoint,
    pub b: Endpoint,
}

/// A shared broadcast domain with one member interface per attached node.
/// The segment itself owns its membership.
#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub members: Vec<Endpoint>,
}

/// A static route owned by one node's routing table.
///
/// Invariant: the destination is never a subnet directly connected on the
/// owning node; directly connected subnets stay implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub destination: Ipv4Net,
    pub next_hop: Ipv4Addr,
    /// Name of the egress interface on the owning node
    pub interface: String,
}

/// The frozen aggregate: all nodes, links, segments, and subnets, plus the
/// designated router ordering used for next-hop tie-breaks.
#[derive(Debug, Clone)]
pub struct Topology {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) subnets: Vec<Ipv4Net>,
    pub(crate) router_order: Vec<NodeId>,
}

impl Topology {
    /// All nodes with their ids, in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// All registered subnets, in registration order
    pub fn subnets(&self) -> &[Ipv4Net] {
        &self.subnets
    }

    /// Routers in structural order
    pub fn router_order(&self) -> &[NodeId] {
        &self.router_order
    }

    pub fn node_by_name(&self, name: &str) -> Option<(NodeId, &Node)> {
        self.nodes().find(|(_, n)| n.name == name)
    }

    /// The interface an endpoint designates
    pub fn endpoint_interface(&self, endpoint: Endpoint) -> &Interface {
        &self.nodes[endpoint.node.0].interfaces[endpoint.iface]
    }

    /// Resolve an address to the node owning it
    pub fn node_with_address(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.nodes()
            .find(|(_, n)| n.interfaces.iter().any(|iface| iface.ip() == addr))
            .map(|(id, _)| id)
    }
}
