//! `ripple affected` command implementation.

use std::process::ExitCode;

use ripple::{Config, GoToolchain, ImpactResolver};
use tracing::debug;

/// Print the modules that would be tested, without running any tests.
///
/// The graph is still updated and saved.
pub fn run(config: &Config, json: bool) -> anyhow::Result<ExitCode> {
    let toolchain = GoToolchain::new(&config.project_root, config.failure_policy);
    let report = ImpactResolver::new(config, &toolchain).resolve()?;
    debug!(selected = report.modules.len(), "Resolved affected modules");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        // Machine-readable output: one module per line
        for module in &report.modules {
            println!("{module}");
        }
    }

    Ok(ExitCode::SUCCESS)
}
