//! Topology model module.
//!
//! This module contains the frozen topology model (nodes, interfaces,
//! links, shared segments, subnets) and the validating builder that
//! constructs it.

pub mod types;
pub mod builder;

// Re-export key types for easier access
pub use types::{
    Attachment, Endpoint, Interface, Link, LinkId, Node, NodeId, Role, Route, Segment, SegmentId,
    Topology,
};
pub use builder::{ModelError, SegmentMemberSpec, TopologyBuilder};
