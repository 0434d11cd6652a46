//! Topology shape descriptors.
//!
//! This file contains the input surface of the compiler: structured
//! descriptions of the supported topology shapes, plus the octet template
//! the allocator uses to derive concrete subnets from them.

use serde::{Deserialize, Serialize};

/// Shape of the topology to generate.
///
/// A descriptor is pure data; feeding the same descriptor (and scheme) to
/// the allocator twice yields byte-identical address assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ShapeDescriptor {
    /// Routers `r1..rN` wired in a line, one stub host per router, with an
    /// aggregation sink node (`recv`) attached to `r1`.
    LinearChain {
        /// Number of routers (and therefore stub subnets) in the chain
        length: usize,
    },
    /// Mutually linked routers, each hosting a number of shared-segment
    /// stub networks. `stub_hosts[i][j]` is the host count of router `i`'s
    /// `j`-th stub subnet.
    HubMesh {
        /// Hosts per stub subnet, grouped by owning router
        stub_hosts: Vec<Vec<usize>>,
    },
}

impl ShapeDescriptor {
    /// Two-router star over a flat list of stub host counts.
    ///
    /// The stub list is split in half between the two routers, the front
    /// half (rounded up for odd lengths) going to `r1`. With
    /// `[3, 4, 3, 4]` this reproduces the classic dual-router/four-subnet
    /// mesh: two stubs of 3 and 4 hosts on each router.
    pub fn dual_router_star(stub_counts: &[usize]) -> Self {
        let mid = stub_counts.len().div_ceil(2);
        ShapeDescriptor::HubMesh {
            stub_hosts: vec![stub_counts[..mid].to_vec(), stub_counts[mid..].to_vec()],
        }
    }

    /// Number of routers the shape materializes (the sink node counts as a
    /// router: it forwards).
    pub fn router_count(&self) -> usize {
        match self {
            ShapeDescriptor::LinearChain { length } => length + 1,
            ShapeDescriptor::HubMesh { stub_hosts } => stub_hosts.len(),
        }
    }
}

/// Octet template for subnet derivation.
///
/// All generated subnets are /24 blocks carved out of
/// `<base_octet>.0.0.0/8`. The `reserved_octet` second octet is set aside
/// for the sink subnet and hub transit subnets; every other outer-octet
/// allocation skips it, so a long chain can never collide with the sink
/// block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressScheme {
    /// First octet of every generated subnet
    pub base_octet: u8,
    /// Second octet reserved for sink and hub transit subnets
    pub reserved_octet: u8,
}

impl Default for AddressScheme {
    fn default() -> Self {
        Self {
            base_octet: 10,
            reserved_octet: 100,
        }
    }
}
