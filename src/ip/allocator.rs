//! Deterministic subnet and interface address allocation.
//!
//! This file derives every subnet, interface address, and interface name of
//! a topology from a shape descriptor and an octet template, producing a
//! frozen model ready for route compilation. Identical inputs always yield
//! byte-identical assignments, so operators can predict addresses before
//! anything is materialized.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::{debug, info};

use crate::shape::{AddressScheme, ShapeDescriptor};
use crate::topology::{ModelError, Role, SegmentMemberSpec, Topology, TopologyBuilder};

/// Every generated subnet is a /24.
pub const SUBNET_PREFIX_LEN: u8 = 24;

/// Hosts on shared-segment stubs step by 10: `.10`, `.20`, ...
const HOST_ADDRESS_STEP: u8 = 10;

/// Address allocation errors
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("address space exhausted: {0}")]
    AddressSpaceExhausted(String),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Allocate addresses for `shape` under `scheme` and return the frozen
/// topology model.
pub fn allocate(
    shape: &ShapeDescriptor,
    scheme: &AddressScheme,
) -> Result<Topology, AllocationError> {
    match shape {
        ShapeDescriptor::LinearChain { length } => allocate_chain(*length, scheme),
        ShapeDescriptor::HubMesh { stub_hosts } => allocate_hub_mesh(stub_hosts, scheme),
    }
}

/// Linear chain: sink node `recv`, routers `r1..rN` each with one stub
/// host, transit links between adjacent routers, sink link on `r1`.
///
/// Interface convention follows the emulated layout: `eth1` faces the stub,
/// `eth2` faces the next router (away from the sink), `eth3` faces the
/// previous router or the sink.
fn allocate_chain(length: usize, scheme: &AddressScheme) -> Result<Topology, AllocationError> {
    if length == 0 {
        return Err(AllocationError::InvalidShape(
            "linear chain needs at least one router".to_string(),
        ));
    }
    if length > 254 {
        return Err(AllocationError::AddressSpaceExhausted(format!(
            "chain length {} exceeds the 254 stub subnets the octet template supports",
            length
        )));
    }

    let mut builder = TopologyBuilder::new();
    let base = scheme.base_octet;

    let recv = builder.add_node("recv", Role::Router)?;
    let mut routers = Vec::with_capacity(length);

    for i in 1..=length {
        let router = builder.add_node(&format!("r{}", i), Role::Router)?;
        let host = builder.add_node(&format!("h{}", i), Role::Host)?;
        // Stub i: 10.0.<i>.0/24, router .1, host .2
        builder.add_link(
            host,
            &format!("h{}-eth0", i),
            host_net(base, 0, i as u8, 2),
            router,
            &format!("r{}-eth1", i),
            host_net(base, 0, i as u8, 1),
        )?;
        routers.push(router);
    }

    for i in 1..length {
        // Transit between r<i> and r<i+1>: 10.<t>.0.0/24, left .1, right .2
        let transit = outer_octet(i, scheme)?;
        builder.add_link(
            routers[i - 1],
            &format!("r{}-eth2", i),
            host_net(base, transit, 0, 1),
            routers[i],
            &format!("r{}-eth3", i + 1),
            host_net(base, transit, 0, 2),
        )?;
    }

    // Sink link: 10.<reserved>.0.0/24, recv .1, r1 .2
    builder.add_link(
        recv,
        "recv-eth2",
        host_net(base, scheme.reserved_octet, 0, 1),
        routers[0],
        "r1-eth3",
        host_net(base, scheme.reserved_octet, 0, 2),
    )?;

    let topology = builder.freeze();
    info!(
        "Allocated linear chain of {} routers: {} nodes, {} subnets",
        length,
        topology.node_count(),
        topology.subnets().len()
    );
    Ok(topology)
}

/// Hub mesh: routers `r1..rK` with pairwise transit links, each hosting
/// shared-segment stub subnets numbered globally `s1..sS` with hosts named
/// `n<g>h<k>`.
fn allocate_hub_mesh(
    stub_hosts: &[Vec<usize>],
    scheme: &AddressScheme,
) -> Result<Topology, AllocationError> {
    let router_count = stub_hosts.len();
    if router_count == 0 {
        return Err(AllocationError::InvalidShape(
            "hub mesh needs at least one router".to_string(),
        ));
    }
    let pair_count = router_count * (router_count - 1) / 2;
    if pair_count > 255 {
        return Err(AllocationError::AddressSpaceExhausted(format!(
            "{} routers need {} transit pair subnets, more than the reserved block holds",
            router_count, pair_count
        )));
    }

    let mut builder = TopologyBuilder::new();
    let base = scheme.base_octet;

    let mut routers = Vec::with_capacity(router_count);
    for i in 1..=router_count {
        routers.push(builder.add_node(&format!("r{}", i), Role::Router)?);
    }

    // Per-router counter for the next eth interface number
    let mut next_eth = vec![0usize; router_count];
    let mut global_stub = 0usize;

    for (i, stubs) in stub_hosts.iter().enumerate() {
        if stubs.len() > 255 {
            return Err(AllocationError::AddressSpaceExhausted(format!(
                "router r{} hosts {} stub subnets, more than one outer octet holds",
                i + 1,
                stubs.len()
            )));
        }
        let router_octet = outer_octet(i, scheme)?;
        for (j, &host_count) in stubs.iter().enumerate() {
            if host_count > 25 {
                return Err(AllocationError::AddressSpaceExhausted(format!(
                    "{} hosts on one stub exceed the .{} step host range",
                    host_count, HOST_ADDRESS_STEP
                )));
            }
            global_stub += 1;
            next_eth[i] += 1;

            // Stub j of router i: 10.<o>.<j>.0/24, router .1, hosts .10, .20, ...
            let mut members: Vec<SegmentMemberSpec> = vec![(
                routers[i],
                format!("r{}-eth{}", i + 1, next_eth[i]),
                host_net(base, router_octet, j as u8, 1),
            )];
            for k in 1..=host_count {
                let name = format!("n{}h{}", global_stub, k);
                let host = builder.add_node(&name, Role::Host)?;
                members.push((
                    host,
                    format!("{}-eth0", name),
                    host_net(base, router_octet, j as u8, k as u8 * HOST_ADDRESS_STEP),
                ));
            }
            builder.add_segment(&format!("s{}", global_stub), &members)?;
            debug!(
                "Stub s{} on r{}: {} hosts in {}",
                global_stub,
                i + 1,
                host_count,
                host_net(base, router_octet, j as u8, 0).trunc()
            );
        }
    }

    // Pairwise transit links in lexicographic pair order, lower-index
    // router .1: 10.<reserved>.<pair>.0/24
    let mut pair = 0u8;
    for i in 0..router_count {
        for j in (i + 1)..router_count {
            next_eth[i] += 1;
            next_eth[j] += 1;
            builder.add_link(
                routers[i],
                &format!("r{}-eth{}", i + 1, next_eth[i]),
                host_net(base, scheme.reserved_octet, pair, 1),
                routers[j],
                &format!("r{}-eth{}", j + 1, next_eth[j]),
                host_net(base, scheme.reserved_octet, pair, 2),
            )?;
            pair += 1;
        }
    }

    let topology = builder.freeze();
    info!(
        "Allocated hub mesh of {} routers: {} nodes, {} subnets",
        router_count,
        topology.node_count(),
        topology.subnets().len()
    );
    Ok(topology)
}

/// Map a zero-based outer-octet slot to a concrete octet, skipping the
/// scheme's reserved octet so stub and transit blocks can never collide
/// with the sink block.
fn outer_octet(slot: usize, scheme: &AddressScheme) -> Result<u8, AllocationError> {
    let octet = if slot < scheme.reserved_octet as usize {
        slot
    } else {
        slot + 1
    };
    if octet > 254 {
        return Err(AllocationError::AddressSpaceExhausted(format!(
            "outer octet slot {} exceeds the octet template range",
            slot
        )));
    }
    Ok(octet as u8)
}

fn host_net(o1: u8, o2: u8, o3: u8, o4: u8) -> Ipv4Net {
    Ipv4Net::new(Ipv4Addr::new(o1, o2, o3, o4), SUBNET_PREFIX_LEN)
        .expect("/24 is a valid IPv4 prefix length")
}
