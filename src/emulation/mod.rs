//! Emulation boundary module.
//!
//! This module contains the external-runtime trait, the pure translation
//! adapter that drives it, and the serializable plan recorder used for the
//! file handoff to the emulator.

pub mod runtime;
pub mod adapter;
pub mod plan;

// Re-export key types and functions for easier access
pub use runtime::{EmulationRuntime, RuntimeError, SegmentAttachment};
pub use adapter::materialize;
pub use plan::{AddressRegistry, EmulationPlan, PlanRecorder, PlanStep};
