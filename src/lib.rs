//! # Toposim - Topology-to-routing-table compiler for network emulation
//!
//! This library compiles abstract topology descriptions (linear router
//! chains, hub meshes with stub networks) into concrete, loop-free static
//! routing tables, without running an emulator or touching a live network
//! stack.
//!
//! ## Overview
//!
//! Toposim turns a shape descriptor plus an octet template into a frozen
//! topology model, derives every subnet and interface address
//! deterministically, computes the minimal static route set for every node,
//! and emits the exact call sequence an external network-emulation runtime
//! needs to materialize the result. Process creation, virtual interfaces,
//! and forwarding toggles are the runtime's job; toposim only decides what
//! the runtime should be told.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - `shape`: shape descriptors and the addressing scheme
//! - `topology`: the frozen topology model and its validating builder
//! - `ip`: deterministic subnet and interface address allocation
//! - `routes`: static route compilation and forwarding verification
//! - `emulation`: the external-runtime boundary, adapter, and plan recorder
//! - `orchestrator`: high-level orchestration of plan generation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use toposim::orchestrator;
//! use toposim::shape::{AddressScheme, ShapeDescriptor};
//!
//! let shape = ShapeDescriptor::LinearChain { length: 5 };
//! let scheme = AddressScheme::default();
//!
//! // Compile the shape and record the runtime call sequence
//! let (plan, registry) = orchestrator::generate_plan(&shape, &scheme)?;
//!
//! // plan.steps now holds create_node/create_link/apply_route calls in
//! // dependency order, ready for the emulation runtime
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Core failures are distinct, inspectable `thiserror` values
//! (`ModelError`, `AllocationError`, `CompileError`, `RuntimeError`)
//! detected synchronously during construction or compilation. The
//! orchestrator wraps them in `color_eyre` reports with context for the
//! CLI surface.

pub mod shape;
pub mod topology;
pub mod ip;
pub mod routes;
pub mod emulation;
pub mod orchestrator;
