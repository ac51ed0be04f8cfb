//! End-to-end tests for the resolver pipeline against an in-memory toolchain.

use std::fs;

use ripple::{
    Config, DependencyGraph, FailurePolicy, GraphCache, GraphSource, ImpactResolver, Namespace,
    Outcome, StaticToolchain, TestCommand, TestRunner, decode, run_all,
};
use tempfile::TempDir;

/// Config rooted in a fresh temporary project directory.
fn project() -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = Config {
        namespace: Namespace::new("gfg"),
        project_root: dir.path().to_path_buf(),
        base_ref: "HEAD^".to_string(),
        failure_policy: FailurePolicy::Strict,
        test_command: TestCommand::default(),
    };
    (dir, config)
}

/// The four-module codebase: a imports b and c, b imports c.
fn codebase() -> StaticToolchain {
    StaticToolchain::new()
        .with_modules(["gfg/a", "gfg/b", "gfg/c", "gfg/d"])
        .with_imports("gfg/a", ["gfg/b", "gfg/c", "fmt"])
        .with_imports("gfg/b", ["gfg/c", "strings"])
        .with_imports("gfg/e", ["gfg/c"])
}

fn read_cache(config: &Config) -> DependencyGraph {
    let contents =
        fs::read_to_string(GraphCache::in_root(&config.project_root).path()).expect("cache exists");
    decode(&contents).expect("cache should parse")
}

#[test]
fn mixed_changes_select_changed_modules_in_diff_order() {
    let (_dir, config) = project();
    let toolchain = codebase().with_changes(["M\ta/1.go", "A\te/2.go", "D\tb/3.go", "R073\tc/4.go"]);

    let report = ImpactResolver::new(&config, &toolchain)
        .resolve()
        .expect("resolve should succeed");

    assert_eq!(report.modules, vec!["gfg/a", "gfg/e", "gfg/b", "gfg/c"]);
    assert_eq!(report.graph_source, GraphSource::Rebuilt);
}

#[test]
fn importers_of_changed_module_are_tested_first() {
    let (_dir, config) = project();
    let toolchain = codebase().with_changes(["M\tc/4.go"]);

    let report = ImpactResolver::new(&config, &toolchain)
        .resolve()
        .expect("resolve should succeed");

    assert_eq!(report.modules, vec!["gfg/a", "gfg/b", "gfg/c"]);
    assert_eq!(report.changed.len(), 1);
    assert_eq!(report.changed[0].selected_importers, vec!["gfg/a", "gfg/b"]);
}

#[test]
fn added_module_edges_persist_into_next_run() {
    let (_dir, config) = project();

    let first = codebase().with_changes(["A\te/2.go"]);
    ImpactResolver::new(&config, &first)
        .resolve()
        .expect("first run should succeed");

    // Second run: only gfg/c changes, and gfg/e now imports it via the cache
    let second = codebase().with_changes(["M\tc/4.go"]);
    let report = ImpactResolver::new(&config, &second)
        .resolve()
        .expect("second run should succeed");

    assert_eq!(report.graph_source, GraphSource::Cache);
    assert_eq!(report.modules, vec!["gfg/a", "gfg/b", "gfg/e", "gfg/c"]);
}

#[test]
fn second_run_without_changes_is_idempotent() {
    let (_dir, config) = project();

    let first = codebase().with_changes(["M\ta/1.go", "A\te/2.go"]);
    ImpactResolver::new(&config, &first)
        .resolve()
        .expect("first run should succeed");
    let after_first = read_cache(&config);

    let report = ImpactResolver::new(&config, &codebase())
        .resolve()
        .expect("second run should succeed");

    assert!(report.modules.is_empty(), "nothing changed, nothing to test");
    assert_eq!(report.graph_source, GraphSource::Cache);
    assert_eq!(read_cache(&config), after_first);
}

#[test]
fn cache_is_written_even_with_no_changes() {
    let (_dir, config) = project();

    let report = ImpactResolver::new(&config, &codebase())
        .resolve()
        .expect("resolve should succeed");

    assert!(report.modules.is_empty());
    let cached = read_cache(&config);
    assert!(cached.importers_of("gfg/c").any(|m| m == "gfg/a"));
    assert!(cached.importers_of("gfg/c").any(|m| m == "gfg/b"));
    assert!(!cached.contains("fmt"));
}

#[test]
fn corrupt_cache_is_rebuilt_silently() {
    let (_dir, config) = project();
    fs::write(GraphCache::in_root(&config.project_root).path(), "{\"BottomUp\": [").expect("write");
    let toolchain = codebase().with_changes(["M\tb/3.go"]);

    let report = ImpactResolver::new(&config, &toolchain)
        .resolve()
        .expect("corrupt cache must not be an error");

    assert_eq!(report.graph_source, GraphSource::Rebuilt);
    assert_eq!(report.modules, vec!["gfg/a", "gfg/b"]);
}

#[test]
fn cached_graph_wins_over_toolchain() {
    let (_dir, config) = project();
    // The cache says gfg/x imports gfg/d; the toolchain knows nothing about gfg/x
    fs::write(
        GraphCache::in_root(&config.project_root).path(),
        r#"{"BottomUp":{"gfg/d":{"gfg/x":{}},"gfg/x":{}},"TopDown":{"gfg/d":{},"gfg/x":{"gfg/d":{}}}}"#,
    )
    .expect("write cache");
    let toolchain = codebase().with_changes(["M\td/1.go"]);

    let report = ImpactResolver::new(&config, &toolchain)
        .resolve()
        .expect("resolve should succeed");

    assert_eq!(report.graph_source, GraphSource::Cache);
    assert_eq!(report.modules, vec!["gfg/x", "gfg/d"]);
}

#[test]
fn deleted_import_leaves_stale_importer() {
    let (_dir, config) = project();
    ImpactResolver::new(&config, &codebase())
        .resolve()
        .expect("seed cache");

    // gfg/a drops its import of gfg/b
    let edited = StaticToolchain::new()
        .with_modules(["gfg/a", "gfg/b", "gfg/c", "gfg/d"])
        .with_imports("gfg/a", ["gfg/c"])
        .with_imports("gfg/b", ["gfg/c"])
        .with_changes(["M\ta/1.go"]);
    ImpactResolver::new(&config, &edited)
        .resolve()
        .expect("edit run");

    let cached = read_cache(&config);
    assert!(!cached.dependencies_of("gfg/a").any(|m| m == "gfg/b"));
    assert!(
        cached.importers_of("gfg/b").any(|m| m == "gfg/a"),
        "reverse edge is kept until the next full construction"
    );
}

#[test]
fn unknown_status_aborts_before_saving() {
    let (_dir, config) = project();
    let toolchain = codebase().with_changes(["M\ta/1.go", "C100\tb/x.go\tb/y.go"]);

    let result = ImpactResolver::new(&config, &toolchain).resolve();

    assert!(matches!(result, Err(ripple::Error::UnknownChangeStatus { .. })));
    let cached = fs::read_to_string(GraphCache::in_root(&config.project_root).path())
        .expect("load creates the cache file");
    assert!(cached.is_empty(), "an aborted run must not persist the graph");
}

#[test]
fn rebuild_replaces_cache_contents() {
    let (_dir, config) = project();
    let cache = GraphCache::in_root(&config.project_root);
    fs::write(cache.path(), r#"{"BottomUp":{"gfg/zzz":{}},"TopDown":{}}"#).expect("write");

    let graph = ImpactResolver::new(&config, &codebase())
        .rebuild()
        .expect("rebuild should succeed");

    assert!(!graph.contains("gfg/zzz"));
    assert_eq!(read_cache(&config), graph);
    assert!(graph.asymmetric_edges().is_empty());
}

/// Runner that fails the listed modules and records invocations.
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

#[test]
fn second_module_failure_stops_the_run() {
    colored::control::set_override(false);
    let (_dir, config) = project();
    let toolchain = codebase().with_changes(["M\tc/4.go"]);
    let report = ImpactResolver::new(&config, &toolchain)
        .resolve()
        .expect("resolve should succeed");
    assert_eq!(report.modules, vec!["gfg/a", "gfg/b", "gfg/c"]);

    let mut runner = ScriptedRunner {
        failing: vec!["gfg/b"],
        invoked: Vec::new(),
    };
    let mut out = Vec::new();
    let outcome = run_all(&mut runner, &report.modules, &mut out).expect("write to Vec");

    assert!(!outcome.is_success());
    assert_eq!(
        outcome,
        Outcome::Failed {
            module: "gfg/b".to_string(),
            tested: 2
        }
    );
    assert_eq!(runner.invoked, vec!["gfg/a", "gfg/b"], "gfg/c must never run");
    let printed = String::from_utf8(out).expect("utf-8");
    assert!(printed.starts_with("go test gfg/a: ok\n"));
    assert!(printed.ends_with("go test gfg/b: failed\n"));
}
