//! Sequential, fail-fast test execution.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Command;

use colored::Colorize;
use tracing::{debug, warn};

use crate::config::TestCommand;
use crate::types::ModulePath;

/// Runs the tests of a single module.
pub trait TestRunner {
    /// Label printed before the result, e.g. `go test --short gfg/a`.
    fn describe(&self, module: &str) -> String;

    /// Run the module's tests, returning `true` if they passed.
    fn run(&mut self, module: &str) -> bool;
}

/// Runs the configured test command in the project root.
#[derive(Debug, Clone)]
pub struct GoTestRunner {
    root: PathBuf,
    command: TestCommand,
}

impl GoTestRunner {
    /// Create a runner for the given project root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, command: TestCommand) -> Self {
        Self {
            root: root.into(),
            command,
        }
    }
}

impl TestRunner for GoTestRunner {
    fn describe(&self, module: &str) -> String {
        self.command.display_for(module)
    }

    fn run(&mut self, module: &str) -> bool {
        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(module)
            .current_dir(&self.root)
            .output();

        match output {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                debug!(module, status = %output.status, "Tests failed");
                // Test output goes to stderr so stdout keeps the ok/failed lines only.
                let mut stderr = io::stderr().lock();
                if let Err(e) = stderr
                    .write_all(&output.stdout)
                    .and_then(|()| stderr.write_all(&output.stderr))
                {
                    debug!(module, error = %e, "Failed to forward test output");
                }
                false
            }
            Err(e) => {
                warn!(module, program = %self.command.program, error = %e, "Failed to start test command");
                false
            }
        }
    }
}

/// Result of running a list of modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every module passed
    Passed {
        /// Number of modules tested
        tested: usize,
    },
    /// A module failed and the run stopped there
    Failed {
        /// The failing module
        module: ModulePath,
        /// Number of modules tested, including the failing one
        tested: usize,
    },
}

impl Outcome {
    /// Returns `true` if every module passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }
}

/// Test each module in order, stopping at the first failure.
///
/// Writes `<label>: ok` or `<label>: failed` to `out` for every module run.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails.
pub fn run_all<R, W>(runner: &mut R, modules: &[ModulePath], out: &mut W) -> io::Result<Outcome>
where
    R: TestRunner + ?Sized,
    W: Write,
{
    for (index, module) in modules.iter().enumerate() {
        write!(out, "{}: ", runner.describe(module))?;
        out.flush()?;

        if !runner.run(module) {
            writeln!(out, "{}", "failed".red())?;
            return Ok(Outcome::Failed {
                module: module.clone(),
                tested: index + 1,
            });
        }
        writeln!(out, "{}", "ok".green())?;
    }

    Ok(Outcome::Passed {
        tested: modules.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runner that fails the listed modules and records every invocation.
    struct ScriptedRunner {
        failing: Vec<&'static str>,
        invoked: Vec<String>,
    }

    impl TestRunner for ScriptedRunner {
        fn describe(&self, module: &str) -> String {
            format!("go test {module}")
        }

        fn run(&mut self, module: &str) -> bool {
            self.invoked.push(module.to_string());
            !self.failing.contains(&module)
        }
    }

    fn modules(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn run_all_stops_at_first_failure() {
        colored::control::set_override(false);
        let mut runner = ScriptedRunner {
            failing: vec!["gfg/b"],
            invoked: Vec::new(),
        };
        let mut out = Vec::new();

        let outcome = run_all(&mut runner, &modules(&["gfg/a", "gfg/b", "gfg/c"]), &mut out)
            .expect("writing to a Vec cannot fail");

        assert_eq!(
            outcome,
            Outcome::Failed {
                module: "gfg/b".to_string(),
                tested: 2
            }
        );
        assert_eq!(runner.invoked, vec!["gfg/a", "gfg/b"]);
        assert_eq!(
            String::from_utf8(out).expect("utf-8"),
            "go test gfg/a: ok\ngo test gfg/b: failed\n"
        );
    }

    #[test]
    fn run_all_passes_every_module() {
        colored::control::set_override(false);
        let mut runner = ScriptedRunner {
            failing: Vec::new(),
            invoked: Vec::new(),
        };
        let mut out = Vec::new();

        let outcome = run_all(&mut runner, &modules(&["gfg/a", "gfg/b"]), &mut out).expect("write");

        assert!(outcome.is_success());
        assert_eq!(runner.invoked, vec!["gfg/a", "gfg/b"]);
    }

    #[test]
    fn run_all_with_no_modules_passes() {
        let mut runner = ScriptedRunner {
            failing: Vec::new(),
            invoked: Vec::new(),
        };
        let mut out = Vec::new();

        let outcome = run_all(&mut runner, &[], &mut out).expect("write");

        assert_eq!(outcome, Outcome::Passed { tested: 0 });
        assert!(out.is_empty());
    }

    #[test]
    fn go_runner_reports_spawn_failure_as_failed() {
        let command = TestCommand {
            program: "ripple-no-such-go".to_string(),
            args: vec!["test".to_string()],
        };
        let mut runner = GoTestRunner::new(std::env::temp_dir(), command);

        assert_eq!(runner.describe("gfg/a"), "ripple-no-such-go test gfg/a");
        assert!(!runner.run("gfg/a"));
    }
}
