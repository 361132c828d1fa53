// SPDX-License-Identifier: MIT
//! End-to-end tests driving the full pipeline (scan → BEFORE rewrite →
//! ordering) against real files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use rcorder::order_paths;
use rcorder::report::Diagnostic;
use rcorder::resolve::KeywordFilters;
use rcorder::scan::DEFAULT_LEADER;

/// Write one unit file and return its path.
fn write_unit(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Reduce emitted path strings to bare file names for readable asserts.
fn short(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| {
            Path::new(n)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

fn run_default(paths: &[PathBuf]) -> (Vec<String>, rcorder::report::Report) {
    order_paths(paths, DEFAULT_LEADER, &KeywordFilters::default())
}

#[test]
fn chain_resolves_providers_first() {
    let dir = TempDir::new().unwrap();
    let base = write_unit(&dir, "base", "# PROVIDE: base\n");
    let mid = write_unit(&dir, "mid", "# PROVIDE: mid\n# REQUIRE: base\n");
    let top = write_unit(&dir, "top", "# REQUIRE: mid\n");

    let (order, report) = run_default(&[base, mid, top]);
    assert_eq!(short(&order), vec!["base", "mid", "top"]);
    assert!(!report.failed());
}

#[test]
fn input_order_breaks_ties_most_recent_first() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "echo a\n");
    let b = write_unit(&dir, "b", "echo b\n");
    let c = write_unit(&dir, "c", "echo c\n");

    let (order, report) = run_default(&[a, b, c]);
    assert_eq!(short(&order), vec!["c", "b", "a"]);
    assert!(!report.failed());
}

#[test]
fn every_unit_appears_even_without_directives() {
    let dir = TempDir::new().unwrap();
    let plain = write_unit(&dir, "plain", "no directives here\n");
    let provider = write_unit(&dir, "provider", "# PROVIDE: svc\n");

    let (order, _) = run_default(&[plain, provider]);
    assert!(short(&order).contains(&"plain".to_string()));
    assert_eq!(order.len(), 2);
}

#[test]
fn cycle_emits_both_units_once_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "# PROVIDE: x\n# REQUIRE: y\n");
    let b = write_unit(&dir, "b", "# PROVIDE: y\n# REQUIRE: x\n");

    let (order, report) = run_default(&[a, b]);
    let mut seen = short(&order);
    seen.sort();
    assert_eq!(seen, vec!["a", "b"]);
    assert!(report
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::UnitCycle { .. })));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn before_orders_unit_ahead_of_target_provider() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "# BEFORE: y\n");
    let b = write_unit(&dir, "b", "# PROVIDE: y\n");

    let (order, report) = run_default(&[a, b]);
    let names = short(&order);
    let pos_a = names.iter().position(|n| n == "a").unwrap();
    let pos_b = names.iter().position(|n| n == "b").unwrap();
    assert!(pos_a < pos_b, "a must precede b, got {names:?}");
    assert!(!report.failed());
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn before_unknown_target_warns_and_still_orders() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "# BEFORE: nothing_provides_this\n");

    let (order, report) = run_default(&[a]);
    assert_eq!(short(&order), vec!["a"]);
    assert!(report
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::UnknownBeforeTarget { .. })));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn missing_requirement_warns_but_unit_still_appears() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "# REQUIRE: z\n");

    let (order, report) = run_default(&[a]);
    assert_eq!(short(&order), vec!["a"]);
    assert!(report
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::MissingRequirement { .. })));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn skipped_unit_is_absorbed_but_not_printed() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "# PROVIDE: svc\n# KEYWORD: nostart\n");
    let b = write_unit(&dir, "b", "# REQUIRE: svc\n");

    let filters = KeywordFilters::new(vec!["nostart".into()], Vec::new());
    let (order, report) = order_paths(&[a, b], DEFAULT_LEADER, &filters);
    assert_eq!(short(&order), vec!["b"]);
    // Filtering is printing-only: the graph resolved cleanly.
    assert!(!report.failed());
}

#[test]
fn keep_filter_prints_only_tagged_units() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "# KEYWORD: shutdown\n");
    let b = write_unit(&dir, "b", "echo b\n");

    let filters = KeywordFilters::new(Vec::new(), vec!["shutdown".into()]);
    let (order, _) = order_paths(&[a, b], DEFAULT_LEADER, &filters);
    assert_eq!(short(&order), vec!["a"]);
}

#[test]
fn custom_leader_end_to_end() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "-- PROVIDE: db\n");
    let b = write_unit(&dir, "b", "-- REQUIRE: db\n");

    let (order, report) = order_paths(&[a, b], "-- ", &KeywordFilters::default());
    assert_eq!(short(&order), vec!["a", "b"]);
    assert!(!report.failed());
}

#[test]
fn unreadable_path_is_skipped_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    let ghost = dir.path().join("does-not-exist");
    let real = write_unit(&dir, "real", "# PROVIDE: svc\n");

    let (order, report) = run_default(&[ghost, real]);
    assert_eq!(short(&order), vec!["real"]);
    assert!(report
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::UnreadableUnit { .. })));
    assert_eq!(report.exit_code(), 1);
}

#[test]
fn directory_is_skipped_as_non_regular() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("subdir");
    fs::create_dir(&sub).unwrap();

    let (order, report) = run_default(&[sub]);
    assert!(order.is_empty());
    assert!(report
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Diagnostic::NonRegularUnit { .. })));
}

#[test]
fn lifo_provider_order_is_pinned() {
    let dir = TempDir::new().unwrap();
    let p1 = write_unit(&dir, "p1", "# PROVIDE: svc\n");
    let p2 = write_unit(&dir, "p2", "# PROVIDE: svc\n");
    let p3 = write_unit(&dir, "p3", "# PROVIDE: svc\n");
    let app = write_unit(&dir, "app", "# REQUIRE: svc\n");

    let (order, _) = run_default(&[p1, p2, p3, app]);
    assert_eq!(short(&order), vec!["p3", "p2", "p1", "app"]);
}

#[test]
fn identical_runs_produce_identical_output() {
    let dir = TempDir::new().unwrap();
    let a = write_unit(&dir, "a", "# PROVIDE: net\n");
    let b = write_unit(&dir, "b", "# REQUIRE: net\n# PROVIDE: mail\n");
    let c = write_unit(&dir, "c", "# REQUIRE: mail net\n# BEFORE: late\n");
    let d = write_unit(&dir, "d", "# PROVIDE: late\n");
    let paths = vec![a, b, c, d];

    let (first, _) = run_default(&paths);
    let (second, _) = run_default(&paths);
    assert_eq!(first, second);
}

#[test]
fn rc_style_boot_set_resolves_in_expected_order() {
    // A miniature rc.d-style collection, parsed in command-line order.
    let dir = TempDir::new().unwrap();
    let paths = vec![
        write_unit(&dir, "fsck", "# PROVIDE: fsck\n"),
        write_unit(&dir, "root", "# PROVIDE: root\n# REQUIRE: fsck\n"),
        write_unit(
            &dir,
            "mountcritlocal",
            "# PROVIDE: mountcritlocal\n# REQUIRE: root\n",
        ),
        write_unit(
            &dir,
            "networking",
            "# PROVIDE: NETWORKING\n# REQUIRE: mountcritlocal\n",
        ),
        write_unit(&dir, "sshd", "# REQUIRE: NETWORKING\n"),
    ];

    let (order, report) = run_default(&paths);
    assert_eq!(
        short(&order),
        vec!["fsck", "root", "mountcritlocal", "networking", "sshd"]
    );
    assert!(!report.failed());
}
