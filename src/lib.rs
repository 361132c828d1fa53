// SPDX-License-Identifier: MIT
//! Dependency-respecting execution-order resolution for script collections.
//!
//! Each input file ("unit") declares, in a leading block of structured
//! comment lines, the capabilities it provides and requires plus optional
//! `BEFORE` ordering constraints and `KEYWORD` tags. [`order_paths`] runs
//! the full pipeline — scan → BEFORE rewrite → topological drain — and
//! returns the unit names in an order where every unit appears after all
//! units providing anything it requires.
//!
//! The engine never executes anything and never aborts on a broken graph:
//! missing requirements and cycles are diagnosed on the run [`Report`] and
//! resolution continues, so downstream consumers always get a complete,
//! best-effort ordering.

pub mod graph;
pub mod report;
pub mod resolve;
pub mod scan;

use std::path::PathBuf;

use graph::DependencyGraph;
use report::Report;
use resolve::KeywordFilters;

/// Resolve an ordering for the given unit files.
///
/// `paths` fixes the initial active-list ordering (most-recent-first) and
/// thus the tie-breaks in the output; `leader` is the comment leader
/// introducing directive lines. Unreadable and non-regular paths are
/// diagnosed and skipped. The returned names are the paths as given, one
/// per resolved-and-emitted unit, in resolution order.
pub fn order_paths(
    paths: &[PathBuf],
    leader: &str,
    filters: &KeywordFilters,
) -> (Vec<String>, Report) {
    let mut report = Report::new();
    let mut dep_graph = DependencyGraph::new();

    for path in paths {
        if path.as_os_str().is_empty() {
            continue;
        }
        match scan::load_unit(path) {
            Ok(content) => {
                let unit = dep_graph.add_unit(path.display().to_string());
                for directive in scan::scan_content(&content, leader) {
                    dep_graph.apply(unit, &directive);
                }
            }
            Err(diagnostic) => report.record(diagnostic),
        }
    }

    dep_graph.resolve_before(&mut report);
    let order = resolve::resolve(&mut dep_graph, filters, &mut report);
    (order, report)
}
