//! Ripple CLI - test only the Go packages a change can affect.
//!
//! Ripple diffs the working tree against a base revision, maps changed files
//! to packages, and runs `go test` for those packages and their direct
//! importers, stopping at the first failure.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ripple::{Config, ConfigSource, Overrides};
use tracing_subscriber::EnvFilter;

mod cli;

/// Exit status for configuration errors, distinct from test failures.
const EXIT_CONFIG: u8 = 2;

/// Ripple: change-impact test selection for Go modules.
#[derive(Parser)]
#[command(name = "ripple")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Where configuration comes from
    #[arg(long, value_enum, default_value = "discover", global = true)]
    source: SourceArg,

    /// Project root containing go.mod (overrides discovery and RIPPLE_PROJECT_ROOT)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Revision to diff against (overrides the default and RIPPLE_BASE_REF)
    #[arg(short, long, global = true)]
    base: Option<String>,

    /// Test command argument placed before the package (repeatable, replaces `test --short`)
    #[arg(long = "test-arg", allow_hyphen_values = true, global = true)]
    test_args: Vec<String>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Select affected packages and test them (default)
    Run,

    /// Print the packages that would be tested without running tests
    Affected {
        /// Output the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Discard the dependency cache and rebuild it from `go list`
    Rebuild,

    /// Show the cached dependency graph
    Graph {
        /// Show only the importers and imports of this package
        #[arg(short, long)]
        module: Option<String>,

        /// Report edges that are not mirrored in both directions
        #[arg(long)]
        check: bool,
    },
}

/// Configuration source as a command-line value.
#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    /// RIPPLE_MODULE_NAME, RIPPLE_PROJECT_ROOT and RIPPLE_BASE_REF; command failures are fatal
    Env,
    /// git toplevel and go.mod; command failures count as empty output
    Discover,
}

impl From<SourceArg> for ConfigSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Env => Self::Env,
            SourceArg::Discover => Self::Discover,
        }
    }
}

fn main() -> ExitCode {
    let started = Instant::now();
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let overrides = Overrides {
        project_root: cli.root,
        base_ref: cli.base,
        test_args: (!cli.test_args.is_empty()).then_some(cli.test_args),
    };

    let result = Config::load(cli.source.into(), overrides)
        .context("failed to load configuration")
        .and_then(|config| match cli.command.unwrap_or(Commands::Run) {
            Commands::Run => cli::run::run(&config, started),
            Commands::Affected { json } => cli::affected::run(&config, json),
            Commands::Rebuild => cli::rebuild::run(&config),
            Commands::Graph { module, check } => cli::graph::run(&config, module.as_deref(), check),
        });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }
            if e.downcast_ref::<ripple::Error>().is_some_and(ripple::Error::is_config_error) {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
