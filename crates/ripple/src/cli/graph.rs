//! `ripple graph` command implementation.

use std::process::ExitCode;

use colored::Colorize;
use ripple::{Config, GoToolchain, GraphSource, ImpactResolver, encode};
use tracing::debug;

use super::display::print_module_list;

/// Show the cached dependency graph, one module's edges, or symmetry problems.
pub fn run(config: &Config, module: Option<&str>, check: bool) -> anyhow::Result<ExitCode> {
    let toolchain = GoToolchain::new(&config.project_root, config.failure_policy);
    let resolver = ImpactResolver::new(config, &toolchain);
    let (graph, source) = resolver.load_graph()?;
    if source == GraphSource::Rebuilt {
        debug!("No usable cache, saving rebuilt graph");
        resolver.cache().save(&graph)?;
    }

    if check {
        let asymmetric = graph.asymmetric_edges();
        if asymmetric.is_empty() {
            println!("{}: every edge is mirrored", "ok".green());
            return Ok(ExitCode::SUCCESS);
        }
        println!(
            "{}: {} edge(s) present in one direction only",
            "warning".yellow(),
            asymmetric.len()
        );
        for (dependency, importer) in &asymmetric {
            println!("    {importer} -> {dependency}");
        }
        return Ok(ExitCode::FAILURE);
    }

    if let Some(module) = module {
        if !graph.contains(module) {
            eprintln!("{}: {module} is not in the dependency graph", "warning".yellow());
            return Ok(ExitCode::FAILURE);
        }
        print_module_list("Imported by", graph.importers_of(module), "(no importers)");
        print_module_list("Imports", graph.dependencies_of(module), "(no internal imports)");
        return Ok(ExitCode::SUCCESS);
    }

    let document: serde_json::Value = serde_json::from_str(&encode(&graph)?)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(ExitCode::SUCCESS)
}
