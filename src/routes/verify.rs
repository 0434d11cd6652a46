//! Forwarding-path verification.
//!
//! This file replays compiled tables hop by hop so callers and tests can
//! confirm the loop-freeness and path-length guarantees of the compiler
//! without any emulator involved.

use std::collections::{BTreeMap, VecDeque};
use std::net::Ipv4Addr;

use super::compiler::RouteMap;
use crate::topology::{NodeId, Topology};

/// Forwarding simulation errors
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("node '{node}' has no route toward {destination}")]
    NoRoute { node: String, destination: Ipv4Addr },
    #[error("forwarding loop detected after {hops} hops starting at '{node}'")]
    ForwardingLoop { node: String, hops: usize },
    #[error("next hop {next_hop} of node '{node}' resolves to no interface")]
    DanglingNextHop { node: String, next_hop: Ipv4Addr },
}

/// Walk a packet from `from` toward `destination`, applying each node's
/// compiled table in turn.
///
/// Returns the traversed node sequence, starting with `from` and ending at
/// the node that delivers on-link (owns the address or sits in its
/// subnet). Longest-prefix match is used so host default routes combine
/// with router subnet routes.
pub fn trace_path(
    topology: &Topology,
    tables: &RouteMap,
    from: NodeId,
    destination: Ipv4Addr,
) -> Result<Vec<NodeId>, VerifyError> {
    let mut path = vec![from];
    let mut current = from;

    // Any loop must repeat a node within node_count hops
    for _ in 0..topology.node_count() {
        let node = topology.node(current);
        if node
            .interfaces
            .iter()
            .any(|iface| iface.subnet().contains(&destination))
        {
            return Ok(path);
        }

        let empty = Vec::new();
        let table = tables.get(&current).unwrap_or(&empty);
        let route = table
            .iter()
            .filter(|route| route.destination.contains(&destination))
            .max_by_key(|route| route.destination.prefix_len())
            .ok_or_else(|| VerifyError::NoRoute {
                node: node.name.clone(),
                destination,
            })?;

        // Interface addresses are unique model-wide, so the next hop
        // resolves without consulting the egress link
        let next = topology
            .node_with_address(route.next_hop)
            .ok_or_else(|| VerifyError::DanglingNextHop {
                node: node.name.clone(),
                next_hop: route.next_hop,
            })?;
        path.push(next);
        current = next;
    }

    Err(VerifyError::ForwardingLoop {
        node: topology.node(from).name.clone(),
        hops: path.len(),
    })
}

/// Longest shortest-path distance, in hops, between any two nodes of the
/// topology graph (links and shared segments alike).
pub fn diameter(topology: &Topology) -> usize {
    let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut connect = |a: NodeId, b: NodeId| {
        adjacency.entry(a).or_default().push(b);
    };
    for link in topology.links() {
        connect(link.a.node, link.b.node);
        connect(link.b.node, link.a.node);
    }
    for segment in topology.segments() {
        for &a in &segment.members {
            for &b in &segment.members {
                if a.node != b.node {
                    connect(a.node, b.node);
                }
            }
        }
    }

    let mut longest = 0;
    for (start, _) in topology.nodes() {
        let mut distance: BTreeMap<NodeId, usize> = BTreeMap::new();
        let mut queue = VecDeque::new();
        distance.insert(start, 0);
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            let here = distance[&current];
            longest = longest.max(here);
            for &next in adjacency.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                if !distance.contains_key(&next) {
                    distance.insert(next, here + 1);
                    queue.push_back(next);
                }
            }
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::allocate;
    use crate::routes::compile_routes;
    use crate::shape::{AddressScheme, ShapeDescriptor};

    #[test]
    fn test_trace_chain_end_to_end() {
        let topology = allocate(
            &ShapeDescriptor::LinearChain { length: 3 },
            &AddressScheme::default(),
        )
        .unwrap();
        let tables = compile_routes(&topology).unwrap();

        let (h1, _) = topology.node_by_name("h1").unwrap();
        let path = trace_path(&topology, &tables, h1, "10.0.3.2".parse().unwrap()).unwrap();
        let names: Vec<_> = path
            .iter()
            .map(|&id| topology.node(id).name.clone())
            .collect();
        assert_eq!(names, vec!["h1", "r1", "r2", "r3"]);
    }

    #[test]
    fn test_trace_to_sink() {
        let topology = allocate(
            &ShapeDescriptor::LinearChain { length: 3 },
            &AddressScheme::default(),
        )
        .unwrap();
        let tables = compile_routes(&topology).unwrap();

        let (h3, _) = topology.node_by_name("h3").unwrap();
        let path = trace_path(&topology, &tables, h3, "10.100.0.1".parse().unwrap()).unwrap();
        // Delivery is on-link at r1, which sits in the sink subnet
        let names: Vec<_> = path
            .iter()
            .map(|&id| topology.node(id).name.clone())
            .collect();
        assert_eq!(names, vec!["h3", "r3", "r2", "r1"]);
    }

    #[test]
    fn test_chain_diameter() {
        let topology = allocate(
            &ShapeDescriptor::LinearChain { length: 3 },
            &AddressScheme::default(),
        )
        .unwrap();
        // h1 .. h3: h1, r1, r2, r3, h3 is four hops
        assert_eq!(diameter(&topology), 4);
    }
}
