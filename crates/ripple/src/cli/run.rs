//! `ripple run` command implementation.

use std::io;
use std::process::ExitCode;
use std::time::Instant;

use ripple::{Config, GoTestRunner, GoToolchain, ImpactResolver, Outcome, run_all};
use tracing::{debug, info};

use super::display::print_impact;

/// Select the affected modules, persist the graph, then test them in order.
pub fn run(config: &Config, started: Instant) -> anyhow::Result<ExitCode> {
    let toolchain = GoToolchain::new(&config.project_root, config.failure_policy);
    let report = ImpactResolver::new(config, &toolchain).resolve()?;
    debug!(source = ?report.graph_source, "Dependency graph ready");

    print_impact(&report);

    let mut runner = GoTestRunner::new(&config.project_root, config.test_command.clone());
    let outcome = run_all(&mut runner, &report.modules, &mut io::stdout().lock())?;

    match outcome {
        Outcome::Passed { tested } => {
            info!(tested, "All selected modules passed");
            println!("time elapsed: {:.6}s", started.elapsed().as_secs_f64());
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Failed { module, tested } => {
            info!(%module, tested, "Stopping at first failing module");
            Ok(ExitCode::FAILURE)
        }
    }
}
