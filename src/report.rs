// SPDX-License-Identifier: MIT
//! Diagnostic taxonomy and run-wide failure accumulation.
//!
//! Every recoverable problem the resolver encounters — an unreadable input,
//! a requirement nobody provides, a dependency cycle — becomes a
//! [`Diagnostic`] recorded on the run's [`Report`]. Nothing here aborts the
//! run: diagnostics are logged to stderr as they are recorded, the engine
//! keeps going, and the accumulated failure flag only surfaces as the
//! process exit status at the end.

use thiserror::Error;
use tracing::warn;

/// A recoverable problem found while scanning inputs or ordering the graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Diagnostic {
    /// The input path could not be opened or read.
    #[error("could not open `{path}` for reading: {reason}")]
    UnreadableUnit {
        /// Path as given on the command line.
        path: String,
        /// OS-level failure description.
        reason: String,
    },
    /// The input path exists but is not a regular file.
    #[error("`{path}` is not a regular file")]
    NonRegularUnit {
        /// Path as given on the command line.
        path: String,
    },
    /// A required provision was never provided by any unit.
    #[error("requirement `{name}` in file `{unit}` has no providers")]
    MissingRequirement {
        /// The provision name nobody offers.
        name: String,
        /// The unit that asked for it.
        unit: String,
    },
    /// A dependency cycle detected at provision granularity.
    #[error("circular dependency on provision `{name}` in file `{unit}`")]
    ProvisionCycle {
        /// The provision already being satisfied further up the traversal.
        name: String,
        /// The unit whose requirement closed the loop.
        unit: String,
    },
    /// A dependency cycle detected at unit granularity.
    #[error("circular dependency on file `{unit}`")]
    UnitCycle {
        /// The unit that was re-entered while still being resolved.
        unit: String,
    },
    /// A BEFORE directive named a provision no directive ever mentioned.
    #[error("file `{unit}` is before unknown provision `{name}`")]
    UnknownBeforeTarget {
        /// The unit carrying the BEFORE directive.
        unit: String,
        /// The unknown target name.
        name: String,
    },
}

/// Per-run diagnostic collector.
///
/// Recording a diagnostic logs it immediately (stderr, `warn` level) and
/// latches the failure flag. The ordered list of recorded diagnostics is
/// kept for tests and callers that want more than the flag.
#[derive(Debug, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Create an empty report for a fresh run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic: log it and latch the failure flag.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    /// Whether any diagnostic was recorded during the run.
    pub fn failed(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// All diagnostics recorded so far, in the order they were raised.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Process exit status for this run: 0 clean, 1 if anything was recorded.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.failed())
    }
}
