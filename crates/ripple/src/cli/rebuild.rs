//! `ripple rebuild` command implementation.

use std::process::ExitCode;

use colored::Colorize;
use ripple::{Config, GoToolchain, ImpactResolver};

/// Discard the cached graph and build it again from `go list`.
pub fn run(config: &Config) -> anyhow::Result<ExitCode> {
    let toolchain = GoToolchain::new(&config.project_root, config.failure_policy);
    let resolver = ImpactResolver::new(config, &toolchain);
    let graph = resolver.rebuild()?;

    println!(
        "Rebuilt {} with {} modules and {} edges",
        resolver.cache().path().display().to_string().white().bold(),
        graph.module_count().to_string().cyan(),
        graph.edge_count().to_string().cyan()
    );

    Ok(ExitCode::SUCCESS)
}
