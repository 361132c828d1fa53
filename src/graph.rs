// SPDX-License-Identifier: MIT
//! The unit/provision dependency graph.
//!
//! All nodes live in per-run arenas addressed by stable indices
//! ([`UnitId`], [`EntryId`], [`ProviderId`]); the doubly-linked structures
//! of the classic implementation become neighbor indices, so O(1) detach is
//! an index update instead of pointer surgery and nothing dangles on cyclic
//! inputs. One [`DependencyGraph`] value is built per run — there is no
//! ambient global state.
//!
//! Construction is directive-driven ([`DependencyGraph::apply`]); the
//! BEFORE pass ([`DependencyGraph::resolve_before`]) then rewrites every
//! pending `BEFORE` relation into a synthetic provision plus requirement
//! edges. After that the graph is ready for the ordering engine.

use std::collections::HashMap;

use tracing::debug;

use crate::report::{Diagnostic, Report};
use crate::scan::{Directive, DirectiveKind};

/// Index of a unit in the graph's unit arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(pub(crate) usize);

/// Index of a provision entry in the graph's entry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

/// Index of a provider record in the graph's provider arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(pub(crate) usize);

/// Resolution state of a unit. Checked before any traversal step, so cycle
/// re-entrancy is a state comparison rather than reasoning about
/// partially-consumed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// Not yet reached by the ordering engine.
    Unvisited,
    /// Resolution has started and is still on the traversal stack.
    InProgress,
    /// Fully resolved and detached from the active list.
    Resolved,
}

/// One named provision: the set of units offering a capability.
///
/// Created once per distinct name, on first mention — whether that mention
/// was a REQUIRE, a PROVIDE, or a BEFORE target. An entry whose
/// `ever_provided` flag is still false after parsing represents a
/// requirement nobody satisfies.
#[derive(Debug)]
pub(crate) struct ProvisionEntry {
    pub(crate) name: String,
    /// Head of the provider list, most-recently-added first.
    pub(crate) head: Option<ProviderId>,
    /// Whether any provider was ever attached, drained or not.
    pub(crate) ever_provided: bool,
    /// Transient marker used only during resolution; never reset.
    pub(crate) in_progress: bool,
}

/// Links one provision entry to one contributing unit.
///
/// Doubly linked within its entry's provider list; detached exactly once,
/// when the owning unit resolves.
#[derive(Debug)]
pub(crate) struct ProviderRecord {
    pub(crate) entry: EntryId,
    pub(crate) unit: UnitId,
    pub(crate) prev: Option<ProviderId>,
    pub(crate) next: Option<ProviderId>,
    pub(crate) detached: bool,
}

/// One input file subject to ordering.
#[derive(Debug)]
pub(crate) struct Unit {
    pub(crate) name: String,
    /// Requirement entries in append order; the ordering engine traverses
    /// them most-recently-added first.
    pub(crate) requires: Vec<EntryId>,
    /// Provider records this unit owns (its own contributions).
    pub(crate) provides: Vec<ProviderId>,
    pub(crate) keywords: Vec<String>,
    pub(crate) state: VisitState,
    /// Doubly-linked membership in the global active-unit list.
    pub(crate) active_prev: Option<UnitId>,
    pub(crate) active_next: Option<UnitId>,
}

/// A `BEFORE` relation waiting for [`DependencyGraph::resolve_before`].
#[derive(Debug)]
struct PendingBefore {
    unit: UnitId,
    target: String,
}

/// Per-run dependency graph: unit/entry/provider arenas, the name→entry
/// provision index, the active-unit list, and the pending BEFORE stack.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    pub(crate) units: Vec<Unit>,
    pub(crate) entries: Vec<ProvisionEntry>,
    pub(crate) providers: Vec<ProviderRecord>,
    /// Name → entry; the single source of truth for "who offers X".
    index: HashMap<String, EntryId>,
    /// Head of the active-unit list, most-recently-parsed first.
    pub(crate) active_head: Option<UnitId>,
    /// Collected during parsing, drained in reverse order (a stack).
    pending_before: Vec<PendingBefore>,
    /// Monotonic counter for synthetic provision names.
    fake_counter: u64,
}

impl DependencyGraph {
    /// Create an empty graph for a fresh run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new unit and link it at the head of the active list.
    ///
    /// Insertion order is the parse order, so the head is always the most
    /// recently parsed unit — the tie-break order the driver relies on.
    pub fn add_unit(&mut self, name: impl Into<String>) -> UnitId {
        let id = UnitId(self.units.len());
        self.units.push(Unit {
            name: name.into(),
            requires: Vec::new(),
            provides: Vec::new(),
            keywords: Vec::new(),
            state: VisitState::Unvisited,
            active_prev: None,
            active_next: self.active_head,
        });
        if let Some(old_head) = self.active_head {
            self.units[old_head.0].active_prev = Some(id);
        }
        self.active_head = Some(id);
        id
    }

    /// Apply one scanned directive to a unit: every token independently
    /// triggers one add-operation.
    pub fn apply(&mut self, unit: UnitId, directive: &Directive) {
        for token in &directive.tokens {
            match directive.kind {
                DirectiveKind::Require => self.add_require(unit, token),
                DirectiveKind::Provide => self.add_provide(unit, token),
                DirectiveKind::Before => self.add_before(unit, token),
                DirectiveKind::Keyword => self.add_keyword(unit, token),
            }
        }
    }

    /// Record that `unit` requires the provision `name`.
    pub fn add_require(&mut self, unit: UnitId, name: &str) {
        let entry = self.get_or_create(name);
        self.units[unit.0].requires.push(entry);
    }

    /// Record that `unit` provides the provision `name`.
    pub fn add_provide(&mut self, unit: UnitId, name: &str) {
        let entry = self.get_or_create(name);
        self.attach_provider(entry, unit);
    }

    /// Queue a `BEFORE` relation for [`resolve_before`](Self::resolve_before).
    pub fn add_before(&mut self, unit: UnitId, target: &str) {
        self.pending_before.push(PendingBefore {
            unit,
            target: target.to_string(),
        });
    }

    /// Tag `unit` with a keyword for the keep/skip filters.
    pub fn add_keyword(&mut self, unit: UnitId, keyword: &str) {
        self.units[unit.0].keywords.push(keyword.to_string());
    }

    /// Look up the entry for `name`, allocating an empty one on first call.
    pub fn get_or_create(&mut self, name: &str) -> EntryId {
        self.get_or_create_tracked(name).0
    }

    /// Look up the entry for `name` without creating it.
    pub fn lookup(&self, name: &str) -> Option<EntryId> {
        self.index.get(name).copied()
    }

    /// Number of units in the graph.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Name of a unit, for diagnostics and emission.
    pub fn unit_name(&self, unit: UnitId) -> &str {
        &self.units[unit.0].name
    }

    /// Rewrite every pending `BEFORE(F, S)` into ordinary graph edges.
    ///
    /// For each relation, newest first: synthesize a uniquely named fake
    /// provision `P` with `F` as its sole provider, then make every current
    /// provider of `S` require `P`. This forces `F` ahead of all providers
    /// of `S` without `F` itself requiring `S`, which would manufacture
    /// direct cycles between otherwise-unrelated units. A target name never
    /// mentioned by any directive is diagnosed (non-fatally); the fake
    /// provision is created either way so `F` is never orphaned.
    pub fn resolve_before(&mut self, report: &mut Report) {
        while let Some(PendingBefore { unit, target }) = self.pending_before.pop() {
            let fake = self.make_fake_provision(unit);
            let (entry, created) = self.get_or_create_tracked(&target);
            if created {
                report.record(Diagnostic::UnknownBeforeTarget {
                    unit: self.units[unit.0].name.clone(),
                    name: target.clone(),
                });
            }
            debug!(
                unit = %self.units[unit.0].name,
                target = %target,
                fake = %self.entries[fake.0].name,
                "rewriting BEFORE relation"
            );

            let mut cursor = self.entries[entry.0].head;
            while let Some(pid) = cursor {
                let provider_unit = self.providers[pid.0].unit;
                self.units[provider_unit.0].requires.push(fake);
                cursor = self.providers[pid.0].next;
            }
        }
    }

    /// Detach a provider record from its entry's list. O(1); idempotent so
    /// a cycle-shortcut resolution and the original resolution cannot
    /// double-unlink.
    pub(crate) fn detach_provider(&mut self, pid: ProviderId) {
        if self.providers[pid.0].detached {
            return;
        }
        self.providers[pid.0].detached = true;
        let (prev, next, entry) = {
            let record = &self.providers[pid.0];
            (record.prev, record.next, record.entry)
        };
        match prev {
            Some(p) => self.providers[p.0].next = next,
            None => self.entries[entry.0].head = next,
        }
        if let Some(n) = next {
            self.providers[n.0].prev = prev;
        }
    }

    /// Remove a unit from the active list. O(1); idempotent for the same
    /// reason as [`detach_provider`](Self::detach_provider).
    pub(crate) fn detach_active(&mut self, unit: UnitId) {
        let (prev, next) = {
            let u = &self.units[unit.0];
            (u.active_prev, u.active_next)
        };
        match prev {
            Some(p) => self.units[p.0].active_next = next,
            None => {
                if self.active_head == Some(unit) {
                    self.active_head = next;
                }
            }
        }
        if let Some(n) = next {
            self.units[n.0].active_prev = prev;
        }
        self.units[unit.0].active_prev = None;
        self.units[unit.0].active_next = None;
    }

    fn get_or_create_tracked(&mut self, name: &str) -> (EntryId, bool) {
        if let Some(&entry) = self.index.get(name) {
            return (entry, false);
        }
        let entry = EntryId(self.entries.len());
        self.entries.push(ProvisionEntry {
            name: name.to_string(),
            head: None,
            ever_provided: false,
            in_progress: false,
        });
        self.index.insert(name.to_string(), entry);
        (entry, true)
    }

    /// Prepend a provider record to an entry's list (newest-first order).
    fn attach_provider(&mut self, entry: EntryId, unit: UnitId) -> ProviderId {
        let pid = ProviderId(self.providers.len());
        let old_head = self.entries[entry.0].head;
        self.providers.push(ProviderRecord {
            entry,
            unit,
            prev: None,
            next: old_head,
            detached: false,
        });
        if let Some(h) = old_head {
            self.providers[h.0].prev = Some(pid);
        }
        self.entries[entry.0].head = Some(pid);
        self.entries[entry.0].ever_provided = true;
        self.units[unit.0].provides.push(pid);
        pid
    }

    /// Mint a synthetic provision provided solely by `unit`.
    ///
    /// Names come from a monotonic counter; the index is probed until an
    /// unused name is found, so user-declared provisions can never collide
    /// with a synthetic one.
    fn make_fake_provision(&mut self, unit: UnitId) -> EntryId {
        let entry = loop {
            let name = format!("fake_prov_{:08}", self.fake_counter);
            self.fake_counter += 1;
            let (entry, created) = self.get_or_create_tracked(&name);
            if created {
                break entry;
            }
        };
        self.attach_provider(entry, unit);
        entry
    }
}
