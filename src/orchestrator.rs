//! Compilation orchestrator.
//!
//! This module coordinates the overall flow from shape descriptor through
//! address allocation, route compilation, and plan emission, and writes
//! the handoff artifacts the CLI produces for the emulation runtime.

use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;

use crate::emulation::{materialize, AddressRegistry, EmulationPlan, PlanRecorder};
use crate::ip::allocate;
use crate::routes::{compile_routes, RouteMap};
use crate::shape::{AddressScheme, ShapeDescriptor};
use crate::topology::Topology;

/// File names written into the output directory
pub const PLAN_FILE: &str = "emulation_plan.yaml";
pub const REGISTRY_FILE: &str = "address_registry.json";

/// Allocate addresses for `shape` and compile every routing table.
pub fn compile_shape(
    shape: &ShapeDescriptor,
    scheme: &AddressScheme,
) -> Result<(Topology, RouteMap)> {
    let topology = allocate(shape, scheme).wrap_err("address allocation failed")?;
    info!(
        "Topology model frozen: {} nodes, {} links, {} segments, {} subnets",
        topology.node_count(),
        topology.links().len(),
        topology.segments().len(),
        topology.subnets().len()
    );

    let tables = compile_routes(&topology).wrap_err("route compilation failed")?;
    let total: usize = tables.values().map(Vec::len).sum();
    info!("Compiled {} routes across {} nodes", total, tables.len());
    Ok((topology, tables))
}

/// Compile `shape` and record the full runtime call sequence.
pub fn generate_plan(
    shape: &ShapeDescriptor,
    scheme: &AddressScheme,
) -> Result<(EmulationPlan, AddressRegistry)> {
    let (topology, tables) = compile_shape(shape, scheme)?;

    let mut recorder = PlanRecorder::new();
    materialize(&topology, &tables, &mut recorder).wrap_err("plan recording failed")?;
    let plan = recorder.into_plan();
    info!("Recorded emulation plan with {} steps", plan.steps.len());

    Ok((plan, AddressRegistry::from_topology(&topology)))
}

/// Write the plan YAML and address registry JSON into `output_dir`.
pub fn write_outputs(
    plan: &EmulationPlan,
    registry: &AddressRegistry,
    output_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(output_dir).wrap_err_with(|| {
        format!("Failed to create output directory '{}'", output_dir.display())
    })?;

    let plan_path = output_dir.join(PLAN_FILE);
    let yaml = serde_yaml::to_string(plan).wrap_err("Failed to serialize emulation plan")?;
    fs::write(&plan_path, yaml)
        .wrap_err_with(|| format!("Failed to write '{}'", plan_path.display()))?;

    let registry_path = output_dir.join(REGISTRY_FILE);
    let json =
        serde_json::to_string_pretty(registry).wrap_err("Failed to serialize address registry")?;
    fs::write(&registry_path, json)
        .wrap_err_with(|| format!("Failed to write '{}'", registry_path.display()))?;

    info!("Generated emulation plan: {:?}", plan_path);
    info!("Generated address registry: {:?}", registry_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_shape_end_to_end() {
        let (topology, tables) = compile_shape(
            &ShapeDescriptor::LinearChain { length: 5 },
            &AddressScheme::default(),
        )
        .unwrap();
        assert_eq!(topology.node_count(), 11);
        assert_eq!(tables.len(), 11);
    }

    #[test]
    fn test_generate_plan_is_deterministic() {
        let shape = ShapeDescriptor::dual_router_star(&[3, 4, 3, 4]);
        let scheme = AddressScheme::default();
        let (first, _) = generate_plan(&shape, &scheme).unwrap();
        let (second, _) = generate_plan(&shape, &scheme).unwrap();
        assert_eq!(
            serde_yaml::to_string(&first).unwrap(),
            serde_yaml::to_string(&second).unwrap()
        );
    }
}
