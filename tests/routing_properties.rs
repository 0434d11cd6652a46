//! Integration tests for the compiled-route guarantees: loop-free
//! forwarding within the topology diameter, exact table sizes,
//! determinism, and all-or-nothing failure on disconnected shapes.

use std::collections::HashSet;

use toposim::emulation::{materialize, PlanRecorder};
use toposim::ip::allocate;
use toposim::orchestrator;
use toposim::routes::{compile_routes, diameter, trace_path, CompileError, RouteMap};
use toposim::shape::{AddressScheme, ShapeDescriptor};
use toposim::topology::{Role, Topology, TopologyBuilder};

fn compile(shape: &ShapeDescriptor) -> (Topology, RouteMap) {
    let topology = allocate(shape, &AddressScheme::default()).unwrap();
    let tables = compile_routes(&topology).unwrap();
    (topology, tables)
}

/// Simulate forwarding between every ordered pair of hosts and check that
/// delivery happens within the topology diameter with no cycles.
fn assert_all_pairs_deliver(topology: &Topology, tables: &RouteMap) {
    let max_hops = diameter(topology);
    let hosts: Vec<_> = topology
        .nodes()
        .filter(|(_, n)| n.role == Role::Host)
        .collect();

    for &(from, _) in &hosts {
        for &(to, to_node) in &hosts {
            if from == to {
                continue;
            }
            let destination = to_node.interfaces[0].ip();
            let path = trace_path(topology, tables, from, destination)
                .unwrap_or_else(|e| panic!("forwarding failed: {}", e));

            let hops = path.len() - 1;
            assert!(
                hops <= max_hops,
                "path of {} hops exceeds diameter {}",
                hops,
                max_hops
            );

            let unique: HashSet<_> = path.iter().collect();
            assert_eq!(unique.len(), path.len(), "forwarding path revisits a node");
        }
    }
}

#[test]
fn chain_forwarding_is_loop_free() {
    let (topology, tables) = compile(&ShapeDescriptor::LinearChain { length: 5 });
    assert_all_pairs_deliver(&topology, &tables);

    // The sink reaches every host too
    let (recv, _) = topology.node_by_name("recv").unwrap();
    for i in 1..=5 {
        let (_, host) = topology.node_by_name(&format!("h{}", i)).unwrap();
        let path = trace_path(&topology, &tables, recv, host.interfaces[0].ip()).unwrap();
        assert_eq!(path.len() - 1, i, "recv to h{} crosses {} routers", i, i);
    }
}

#[test]
fn hub_mesh_forwarding_is_loop_free() {
    let (topology, tables) = compile(&ShapeDescriptor::dual_router_star(&[3, 4, 3, 4]));
    assert_all_pairs_deliver(&topology, &tables);

    let (topology, tables) = compile(&ShapeDescriptor::HubMesh {
        stub_hosts: vec![vec![2], vec![1, 1], vec![3]],
    });
    assert_all_pairs_deliver(&topology, &tables);
}

#[test]
fn router_tables_have_exact_size() {
    for length in 1..=8 {
        let (topology, tables) = compile(&ShapeDescriptor::LinearChain { length });
        let total = topology.subnets().len();
        assert_eq!(total, 2 * length, "chain of {} has 2N subnets", length);

        for &router in topology.router_order() {
            let node = topology.node(router);
            let connected: HashSet<_> = node.interfaces.iter().map(|i| i.subnet()).collect();
            assert_eq!(
                tables[&router].len(),
                total - connected.len(),
                "table size of '{}' in chain of {}",
                node.name,
                length
            );
        }
    }
}

#[test]
fn no_node_has_two_routes_to_one_destination() {
    let shapes = [
        ShapeDescriptor::LinearChain { length: 6 },
        ShapeDescriptor::dual_router_star(&[3, 4, 3, 4]),
        ShapeDescriptor::HubMesh {
            stub_hosts: vec![vec![1, 2], vec![2], vec![1, 1, 1]],
        },
    ];
    for shape in &shapes {
        let (topology, tables) = compile(shape);
        for (id, routes) in &tables {
            let destinations: HashSet<_> = routes.iter().map(|r| r.destination).collect();
            assert_eq!(
                destinations.len(),
                routes.len(),
                "duplicate destination on '{}'",
                topology.node(*id).name
            );
        }
    }
}

#[test]
fn compiled_plans_are_byte_identical() {
    let shape = ShapeDescriptor::LinearChain { length: 4 };
    let scheme = AddressScheme::default();

    let (plan_a, registry_a) = orchestrator::generate_plan(&shape, &scheme).unwrap();
    let (plan_b, registry_b) = orchestrator::generate_plan(&shape, &scheme).unwrap();

    assert_eq!(
        serde_yaml::to_string(&plan_a).unwrap(),
        serde_yaml::to_string(&plan_b).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&registry_a).unwrap(),
        serde_json::to_string(&registry_b).unwrap()
    );
}

#[test]
fn disconnected_star_raises_unreachable() {
    // Two routers with one stub each and no transit link: the compiler
    // must reject the whole shape, never emit a partial table
    let mut builder = TopologyBuilder::new();
    let r1 = builder.add_node("r1", Role::Router).unwrap();
    let r2 = builder.add_node("r2", Role::Router).unwrap();
    let h1 = builder.add_node("n1h1", Role::Host).unwrap();
    let h2 = builder.add_node("n2h1", Role::Host).unwrap();
    builder
        .add_segment(
            "s1",
            &[
                (r1, "r1-eth1".to_string(), "10.0.0.1/24".parse().unwrap()),
                (h1, "n1h1-eth0".to_string(), "10.0.0.10/24".parse().unwrap()),
            ],
        )
        .unwrap();
    builder
        .add_segment(
            "s2",
            &[
                (r2, "r2-eth1".to_string(), "10.1.0.1/24".parse().unwrap()),
                (h2, "n2h1-eth0".to_string(), "10.1.0.10/24".parse().unwrap()),
            ],
        )
        .unwrap();
    let topology = builder.freeze();

    let err = compile_routes(&topology).unwrap_err();
    assert!(matches!(err, CompileError::UnreachableSubnet { .. }));
}

#[test]
fn plan_file_roundtrip() {
    let shape = ShapeDescriptor::LinearChain { length: 3 };
    let (plan, registry) = orchestrator::generate_plan(&shape, &AddressScheme::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    orchestrator::write_outputs(&plan, &registry, dir.path()).unwrap();

    let yaml = std::fs::read_to_string(dir.path().join(orchestrator::PLAN_FILE)).unwrap();
    let parsed: toposim::emulation::EmulationPlan = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed, plan);

    let json = std::fs::read_to_string(dir.path().join(orchestrator::REGISTRY_FILE)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["nodes"].as_array().unwrap().len(), 7);
}

#[test]
fn recorded_plan_covers_whole_chain() {
    let (topology, tables) = compile(&ShapeDescriptor::LinearChain { length: 3 });

    let mut recorder = PlanRecorder::new();
    materialize(&topology, &tables, &mut recorder).unwrap();
    let plan = recorder.into_plan();

    // 7 nodes + 4 forwarding nodes + 6 links + all routes
    let route_count: usize = tables.values().map(Vec::len).sum();
    assert_eq!(plan.steps.len(), 7 + 4 + 6 + route_count);
}
