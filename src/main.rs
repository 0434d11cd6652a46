use std::path::Path;

use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;

use toposim::orchestrator;
use toposim::shape::{AddressScheme, ShapeDescriptor};

/// Topology-to-routing-table compiler for network emulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of routers (and stub hosts) in the generated linear chain
    #[arg(long, default_value_t = 5)]
    hosts: usize,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting toposim route compiler");
    info!("Chain length: {}", args.hosts);

    let shape = ShapeDescriptor::LinearChain { length: args.hosts };
    let scheme = AddressScheme::default();

    let (plan, registry) = orchestrator::generate_plan(&shape, &scheme)?;

    let output_dir = Path::new("toposim_output");
    orchestrator::write_outputs(&plan, &registry, output_dir)?;

    info!(
        "Emulation plan ready; hand {}/{} to the emulation runtime",
        output_dir.display(),
        orchestrator::PLAN_FILE
    );
    Ok(())
}
