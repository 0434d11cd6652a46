//! Route compilation module.
//!
//! This module contains the static route compiler and the forwarding
//! verification helpers used to check its output.

pub mod compiler;
pub mod verify;

// Re-export key types and functions for easier access
pub use compiler::{compile_routes, CompileError, RouteMap};
pub use verify::{diameter, trace_path, VerifyError};
