//! Static route compilation.
//!
//! This file derives, for every node of a frozen topology, the minimal
//! loop-free set of static routes covering every subnet the node is not
//! directly attached to. The algorithm is shape-agnostic: it runs a
//! breadth-first search per router over the router adjacency graph,
//! visiting neighbors in structural-index order so equal-cost choices
//! always resolve to the lowest-index neighbor. The left/right partition
//! of a chain and the route pairs of a two-router star both fall out of
//! the same pass.
//!
//! Hosts get exactly one default route via the lowest-index router on
//! their subnet; the sink node of a chain is a forwarding node like any
//! other router and its table is derived by the same search.

use std::collections::{BTreeMap, VecDeque};
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::debug;

use crate::topology::{NodeId, Role, Route, Topology};

/// Compiled routing tables, one per node, keyed in creation order.
pub type RouteMap = BTreeMap<NodeId, Vec<Route>>;

/// Route compilation errors
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("no route to subnet {subnet} from node '{node}'")]
    UnreachableSubnet { node: String, subnet: Ipv4Net },
    #[error(
        "ambiguous next hop from '{node}' toward subnet {subnet}: \
         parallel attachments to the same neighbor"
    )]
    AmbiguousNextHop { node: String, subnet: Ipv4Net },
}

/// A usable hop to an adjacent router: the local egress interface index
/// and the peer's address on the shared subnet.
#[derive(Debug, Clone, Copy)]
struct Hop {
    egress: usize,
    next_hop: Ipv4Addr,
}

type AdjacencyMap = BTreeMap<NodeId, BTreeMap<NodeId, Vec<Hop>>>;

/// Compile the complete routing table of every node.
///
/// The result holds exactly one route per non-directly-connected subnet on
/// each router, sorted by destination, and one default route per host.
/// Tables are all-or-nothing: a disconnected topology fails instead of
/// producing a partial result.
pub fn compile_routes(topology: &Topology) -> Result<RouteMap, CompileError> {
    let adjacency = router_adjacency(topology);
    let mut tables = RouteMap::new();
    for (id, node) in topology.nodes() {
        let routes = match node.role {
            Role::Router => compile_router(topology, &adjacency, id)?,
            Role::Host => compile_host(topology, id)?,
        };
        debug!("Compiled {} routes for '{}'", routes.len(), node.name);
        tables.insert(id, routes);
    }
    Ok(tables)
}

/// Build the router-to-router adjacency map from point-to-point links and
/// shared segments. Every router gets an entry, even if isolated.
fn router_adjacency(topology: &Topology) -> AdjacencyMap {
    let mut adjacency: AdjacencyMap = topology
        .router_order()
        .iter()
        .map(|&id| (id, BTreeMap::new()))
        .collect();

    let mut connect = |a: crate::topology::Endpoint, b: crate::topology::Endpoint| {
        if !topology.node(a.node).is_router() || !topology.node(b.node).is_router() {
            return;
        }
        let peer_addr = topology.endpoint_interface(b).ip();
        adjacency
            .get_mut(&a.node)
            .expect("router adjacency is pre-seeded")
            .entry(b.node)
            .or_default()
            .push(Hop {
                egress: a.iface,
                next_hop: peer_addr,
            });
    };

    for link in topology.links() {
        connect(link.a, link.b);
        connect(link.b, link.a);
    }
    for segment in topology.segments() {
        for &a in &segment.members {
            for &b in &segment.members {
                if a.node != b.node {
                    connect(a, b);
                }
            }
        }
    }
    adjacency
}

/// One router's table: BFS over the router graph, then one route per
/// foreign subnet via the owner at minimum `(distance, first-hop index)`.
fn compile_router(
    topology: &Topology,
    adjacency: &AdjacencyMap,
    router: NodeId,
) -> Result<Vec<Route>, CompileError> {
    let node = topology.node(router);

    // BFS with neighbors visited in structural order. The first visit of a
    // node therefore carries the lowest-index first hop among all
    // shortest paths, which is exactly the tie-break rule.
    let mut distance: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut first_hop: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut queue = VecDeque::new();
    distance.insert(router, 0);
    for &neighbor in adjacency[&router].keys() {
        if !distance.contains_key(&neighbor) {
            distance.insert(neighbor, 1);
            first_hop.insert(neighbor, neighbor);
            queue.push_back(neighbor);
        }
    }
    while let Some(current) = queue.pop_front() {
        for &next in adjacency[&current].keys() {
            if !distance.contains_key(&next) {
                distance.insert(next, distance[&current] + 1);
                first_hop.insert(next, first_hop[&current]);
                queue.push_back(next);
            }
        }
    }

    let mut routes = Vec::new();
    for &subnet in topology.subnets() {
        if node.connects_to(subnet) {
            // Directly connected subnets stay implicit
            continue;
        }

        let mut best: Option<(usize, NodeId)> = None;
        for &owner in topology.router_order() {
            if owner == router || !topology.node(owner).connects_to(subnet) {
                continue;
            }
            let Some(&dist) = distance.get(&owner) else {
                continue;
            };
            let candidate = (dist, first_hop[&owner]);
            if best.map_or(true, |current| candidate < current) {
                best = Some(candidate);
            }
        }
        let Some((_, hop)) = best else {
            return Err(CompileError::UnreachableSubnet {
                node: node.name.clone(),
                subnet,
            });
        };

        let options = &adjacency[&router][&hop];
        if options.len() > 1 {
            // Parallel attachments to the chosen neighbor: the structural
            // tie-break cannot pick an egress, so reject the shape
            return Err(CompileError::AmbiguousNextHop {
                node: node.name.clone(),
                subnet,
            });
        }
        let via = options[0];
        routes.push(Route {
            destination: subnet,
            next_hop: via.next_hop,
            interface: node.interfaces[via.egress].name.clone(),
        });
    }

    routes.sort_by_key(|route| route.destination);
    Ok(routes)
}

/// One host's table: a single default route via the lowest-index router on
/// its subnet, mirroring the emulator's `defaultRoute` parameter.
fn compile_host(topology: &Topology, host: NodeId) -> Result<Vec<Route>, CompileError> {
    let node = topology.node(host);
    let Some(iface) = node.interfaces.first() else {
        return Ok(Vec::new());
    };
    let subnet = iface.subnet();

    let has_foreign = topology.subnets().iter().any(|&s| s != subnet);
    if !has_foreign {
        return Ok(Vec::new());
    }

    for &router in topology.router_order() {
        if let Some(gateway) = topology
            .node(router)
            .interfaces
            .iter()
            .find(|i| i.subnet() == subnet)
        {
            return Ok(vec![Route {
                destination: default_destination(),
                next_hop: gateway.ip(),
                interface: iface.name.clone(),
            }]);
        }
    }

    let unreachable = topology
        .subnets()
        .iter()
        .copied()
        .find(|&s| s != subnet)
        .expect("a foreign subnet exists when has_foreign holds");
    Err(CompileError::UnreachableSubnet {
        node: node.name.clone(),
        subnet: unreachable,
    })
}

fn default_destination() -> Ipv4Net {
    Ipv4Net::new(Ipv4Addr::UNSPECIFIED, 0).expect("/0 is a valid IPv4 prefix length")
}
