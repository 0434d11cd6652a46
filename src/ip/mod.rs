//! IP address allocation module.
//!
//! This module contains the deterministic subnet and interface address
//! allocation for the supported topology shapes.

pub mod allocator;

// Re-export key types and functions for easier access
pub use allocator::{allocate, AllocationError, SUBNET_PREFIX_LEN};
