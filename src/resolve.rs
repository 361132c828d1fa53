// SPDX-License-Identifier: MIT
//! Ordering engine: drains the dependency graph depth-first and emits unit
//! names in dependency order.
//!
//! # Traversal contract
//!
//! The traversal order is observable output, not an implementation detail:
//!
//! - the driver always visits the head of the active list (the most
//!   recently parsed still-active unit);
//! - a unit's requirements are satisfied most-recently-added first;
//! - a provision's providers are visited most-recently-declared first
//!   (LIFO by declaration).
//!
//! The walk runs on an explicit worklist instead of call-stack recursion,
//! so a pathological dependency chain is bounded by heap, not stack, while
//! reproducing the exact recursive visiting order frame for frame.
//!
//! # Soft failure
//!
//! Missing requirements and cycles (at provision or unit granularity) are
//! reported and the run keeps going; every unit is resolved exactly once no
//! matter how broken the graph is. The keep/skip keyword filters decide
//! only whether a resolved unit is *emitted* — a filtered-out unit still
//! satisfies its dependents.

use tracing::debug;

use crate::graph::{DependencyGraph, EntryId, UnitId, VisitState};
use crate::report::{Diagnostic, Report};

/// Run-wide keyword filters. Fixed for the whole run; printing-only.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilters {
    skip: Vec<String>,
    keep: Vec<String>,
}

impl KeywordFilters {
    /// Build filters from the run's skip-set and keep-set.
    pub fn new(skip: Vec<String>, keep: Vec<String>) -> Self {
        Self { skip, keep }
    }

    /// A unit is skip-matched when it carries at least one skip keyword.
    fn skip_matched(&self, keywords: &[String]) -> bool {
        keywords.iter().any(|k| self.skip.contains(k))
    }

    /// A unit is keep-matched when the keep-set is empty (keep everything)
    /// or it carries at least one keep keyword.
    fn keep_matched(&self, keywords: &[String]) -> bool {
        self.keep.is_empty() || keywords.iter().any(|k| self.keep.contains(k))
    }

    /// Whether a resolved unit with these keywords is emitted.
    pub fn emits(&self, keywords: &[String]) -> bool {
        !self.skip_matched(keywords) && self.keep_matched(keywords)
    }
}

/// One step of the depth-first walk. Frames are pushed so that popping
/// reproduces the recursive order exactly.
#[derive(Debug)]
enum Frame {
    /// Resolve a unit (the recursive entry point).
    Visit(UnitId),
    /// Satisfy one requirement of `unit`.
    Satisfy { entry: EntryId, unit: UnitId },
    /// Visit remaining providers of an in-progress entry, head first,
    /// until its provider list is empty.
    Drain(EntryId),
    /// Complete a unit: clear its lists, detach everywhere, maybe emit.
    Finish { unit: UnitId, duplicate: bool },
}

/// Drain the graph and return unit names in resolution order.
///
/// Always runs to completion; diagnostics accumulate on `report` and only
/// surface in the final exit status.
pub fn resolve(
    graph: &mut DependencyGraph,
    filters: &KeywordFilters,
    report: &mut Report,
) -> Vec<String> {
    let mut order = Vec::with_capacity(graph.unit_count());
    let mut stack: Vec<Frame> = Vec::new();

    // Each top-level visit consumes an entire reachable component, so the
    // active set strictly shrinks and the loop cannot run more iterations
    // than there are units.
    while let Some(head) = graph.active_head {
        debug!(unit = %graph.unit_name(head), "starting component");
        stack.push(Frame::Visit(head));

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit(unit) => visit(graph, unit, &mut stack, report),
                Frame::Satisfy { entry, unit } => {
                    satisfy(graph, entry, unit, &mut stack, report);
                }
                Frame::Drain(entry) => {
                    // Take the head (most-recently-added) remaining
                    // provider; its resolution detaches at least that
                    // record, so the drain makes progress every pass.
                    if let Some(pid) = graph.entries[entry.0].head {
                        let provider_unit = graph.providers[pid.0].unit;
                        stack.push(Frame::Drain(entry));
                        stack.push(Frame::Visit(provider_unit));
                    }
                }
                Frame::Finish { unit, duplicate } => {
                    finish(graph, unit, duplicate, filters, &mut order);
                }
            }
        }
    }

    order
}

/// Begin resolving a unit, or shortcut if it is already being resolved.
fn visit(graph: &mut DependencyGraph, unit: UnitId, stack: &mut Vec<Frame>, report: &mut Report) {
    match graph.units[unit.0].state {
        VisitState::InProgress => {
            // Unit-granularity cycle: report, then complete the unit
            // without reprocessing its requirements or emitting again.
            report.record(Diagnostic::UnitCycle {
                unit: graph.unit_name(unit).to_string(),
            });
            stack.push(Frame::Finish {
                unit,
                duplicate: true,
            });
        }
        VisitState::Resolved => {
            // Nothing links to a resolved unit anymore; reaching one here
            // means its provider records are gone, so there is no work.
        }
        VisitState::Unvisited => {
            debug!(unit = %graph.unit_name(unit), "visit");
            graph.units[unit.0].state = VisitState::InProgress;
            stack.push(Frame::Finish {
                unit,
                duplicate: false,
            });
            // Requirements are a fixed snapshot (nothing is added after
            // parsing). Pushed in append order so they pop — and are
            // satisfied — most-recently-added first.
            for &entry in &graph.units[unit.0].requires {
                stack.push(Frame::Satisfy { entry, unit });
            }
        }
    }
}

/// Satisfy one requirement of `unit` against the provision `entry`.
fn satisfy(
    graph: &mut DependencyGraph,
    entry: EntryId,
    unit: UnitId,
    stack: &mut Vec<Frame>,
    report: &mut Report,
) {
    if !graph.entries[entry.0].ever_provided {
        report.record(Diagnostic::MissingRequirement {
            name: graph.entries[entry.0].name.clone(),
            unit: graph.unit_name(unit).to_string(),
        });
        return;
    }
    // An empty provider list means earlier work already satisfied this
    // requirement transitively.
    if graph.entries[entry.0].head.is_none() {
        return;
    }
    if graph.entries[entry.0].in_progress {
        // Provision-granularity cycle: report and stop recursing here.
        report.record(Diagnostic::ProvisionCycle {
            name: graph.entries[entry.0].name.clone(),
            unit: graph.unit_name(unit).to_string(),
        });
        return;
    }
    debug!(
        provision = %graph.entries[entry.0].name,
        unit = %graph.unit_name(unit),
        "satisfy"
    );
    graph.entries[entry.0].in_progress = true;
    stack.push(Frame::Drain(entry));
}

/// Complete a unit's resolution: steps 4–7 of the visit.
fn finish(
    graph: &mut DependencyGraph,
    unit: UnitId,
    duplicate: bool,
    filters: &KeywordFilters,
    order: &mut Vec<String>,
) {
    if !duplicate {
        // Cleared exactly once, during the unit's own resolution.
        graph.units[unit.0].requires.clear();
    }

    // Detach every provider record the unit owns. This is what makes the
    // entry eventually report "no remaining providers" to future satisfy
    // calls — the mechanism that prevents reprocessing and ends cycles.
    let owned = std::mem::take(&mut graph.units[unit.0].provides);
    for pid in owned {
        graph.detach_provider(pid);
    }

    // Only the first (non-duplicate) resolution emits, and only when the
    // keyword filters allow it; the emission position is interleaved with
    // the traversal, not deferred.
    if !duplicate && filters.emits(&graph.units[unit.0].keywords) {
        debug!(unit = %graph.unit_name(unit), "emit");
        order.push(graph.unit_name(unit).to_string());
    }

    graph.detach_active(unit);
    graph.units[unit.0].state = VisitState::Resolved;
}
