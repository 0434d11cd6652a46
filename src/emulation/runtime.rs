//! External emulation runtime boundary.
//!
//! This file defines the four calls the network-emulation runtime exposes
//! to this compiler. Namespace creation, virtual interfaces, address
//! enforcement, and forwarding toggles all live behind this trait; the
//! compiler only decides what to call and in which order.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// Opaque failure propagated unchanged from the external runtime. The
/// caller owns the lifecycle of the emulation session; nothing here is
/// retried.
#[derive(Debug, thiserror::Error)]
#[error("emulation runtime failure: {0}")]
pub struct RuntimeError(#[from] pub Box<dyn std::error::Error + Send + Sync>);

impl RuntimeError {
    pub fn message(msg: impl Into<String>) -> Self {
        RuntimeError(msg.into().into())
    }
}

/// One node attachment handed to `create_segment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentAttachment {
    pub node: String,
    pub interface: String,
    pub addr: Ipv4Net,
}

/// The operations of the external network-emulation runtime.
///
/// Implementations decide what a call means (live namespaces, a recorded
/// plan, a test probe); the adapter guarantees dependency order between
/// them.
pub trait EmulationRuntime {
    fn create_node(&mut self, name: &str) -> Result<(), RuntimeError>;

    fn set_forwarding(&mut self, node: &str, enabled: bool) -> Result<(), RuntimeError>;

    #[allow(clippy::too_many_arguments)]
    fn create_link(
        &mut self,
        a: &str,
        iface_a: &str,
        addr_a: Ipv4Net,
        b: &str,
        iface_b: &str,
        addr_b: Ipv4Net,
    ) -> Result<(), RuntimeError>;

    fn create_segment(
        &mut self,
        name: &str,
        members: &[SegmentAttachment],
    ) -> Result<(), RuntimeError>;

    fn apply_route(
        &mut self,
        node: &str,
        destination: Ipv4Net,
        via: Ipv4Addr,
        out_interface: &str,
    ) -> Result<(), RuntimeError>;
}
