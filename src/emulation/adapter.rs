//! Emulation adapter.
//!
//! Pure translation from the frozen model and compiled route map into
//! runtime calls, in dependency order: nodes first, then forwarding flags,
//! then links and segments, then routes. The adapter makes no decisions
//! and owns no recovery: a failed call propagates unchanged and no further
//! calls are issued, leaving rollback to the runtime's owner.

use log::debug;

use super::runtime::{EmulationRuntime, RuntimeError, SegmentAttachment};
use crate::routes::RouteMap;
use crate::topology::Topology;

/// Drive `runtime` with the complete call sequence for `topology` and its
/// compiled `tables`. Idempotent against a fresh emulation session.
pub fn materialize<R: EmulationRuntime>(
    topology: &Topology,
    tables: &RouteMap,
    runtime: &mut R,
) -> Result<(), RuntimeError> {
    for (_, node) in topology.nodes() {
        runtime.create_node(&node.name)?;
    }
    for (_, node) in topology.nodes() {
        if node.forwarding_enabled {
            runtime.set_forwarding(&node.name, true)?;
        }
    }

    for link in topology.links() {
        let iface_a = topology.endpoint_interface(link.a);
        let iface_b = topology.endpoint_interface(link.b);
        runtime.create_link(
            &topology.node(link.a.node).name,
            &iface_a.name,
            iface_a.addr,
            &topology.node(link.b.node).name,
            &iface_b.name,
            iface_b.addr,
        )?;
    }
    for segment in topology.segments() {
        let members: Vec<SegmentAttachment> = segment
            .members
            .iter()
            .map(|&endpoint| {
                let iface = topology.endpoint_interface(endpoint);
                SegmentAttachment {
                    node: topology.node(endpoint.node).name.clone(),
                    interface: iface.name.clone(),
                    addr: iface.addr,
                }
            })
            .collect();
        runtime.create_segment(&segment.name, &members)?;
    }

    for (&id, routes) in tables {
        let name = &topology.node(id).name;
        for route in routes {
            runtime.apply_route(name, route.destination, route.next_hop, &route.interface)?;
        }
    }

    debug!(
        "Materialized {} nodes, {} links, {} segments",
        topology.node_count(),
        topology.links().len(),
        topology.segments().len()
    );
    Ok(())
}
