// SPDX-License-Identifier: MIT
//! Directive scanner: extracts REQUIRE/PROVIDE/BEFORE/KEYWORD directives
//! from the leading comment block of a unit file.
//!
//! A unit declares its place in the dependency graph through structured
//! comment lines at the very top of the file:
//!
//! ```text
//! # PROVIDE: mountcritlocal
//! # REQUIRE: root fsck
//! # BEFORE:  SERVERS
//! # KEYWORD: shutdown
//! ```
//!
//! Only a contiguous leading run of directive lines is honored. The scan is
//! a three-state machine: while `Searching`, blank and whitespace-leading
//! lines are skipped; once the first directive matches (`InBlock`), the next
//! blank line ends the scan; any other non-matching, non-blank line ends the
//! scan immediately in either state. Directives appearing after ordinary
//! content are never seen.

use std::fs;
use std::path::Path;

use crate::report::Diagnostic;

/// Comment leader assumed when none is configured for the run.
pub const DEFAULT_LEADER: &str = "# ";

/// Longest line prefix considered by the scanner, in bytes.
///
/// Content beyond this limit on a single line is not reliably parsed; split
/// long directives into multiple adjacent lines with the same keyword
/// instead. This is a documented limitation, never an error.
pub const MAX_LINE_LEN: usize = 600;

/// What a directive line contributes to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `REQUIRE:` / `REQUIRES:` — one requirement per token.
    Require,
    /// `PROVIDE:` / `PROVIDES:` — one provider record per token.
    Provide,
    /// `BEFORE:` — one pending ordering constraint per token.
    Before,
    /// `KEYWORD:` / `KEYWORDS:` — one keyword tag per token.
    Keyword,
}

/// One matched directive line: its kind and its whitespace-split tokens.
///
/// Every token independently triggers one add-operation on the graph; a
/// directive line with no tokens is valid and contributes nothing beyond
/// opening the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub tokens: Vec<String>,
}

/// Directive tags in match order. Singular and plural forms are aliases.
const TAGS: [(&str, DirectiveKind); 7] = [
    ("REQUIRE:", DirectiveKind::Require),
    ("REQUIRES:", DirectiveKind::Require),
    ("PROVIDE:", DirectiveKind::Provide),
    ("PROVIDES:", DirectiveKind::Provide),
    ("BEFORE:", DirectiveKind::Before),
    ("KEYWORD:", DirectiveKind::Keyword),
    ("KEYWORDS:", DirectiveKind::Keyword),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// No directive line matched yet.
    Searching,
    /// Inside the leading directive block.
    InBlock,
}

/// Scan a unit's content for its leading directive block.
///
/// `leader` is the comment leader that must introduce every directive line
/// (for the default see [`DEFAULT_LEADER`]). Returns the matched directives
/// in file order; repeated lines of the same kind accumulate rather than
/// overwrite.
pub fn scan_content(content: &str, leader: &str) -> Vec<Directive> {
    let mut directives = Vec::new();
    let mut state = ScanState::Searching;

    for raw in content.lines() {
        let line = clip_line(raw);

        // Blank and whitespace-leading lines: skipped while searching,
        // terminate the block once inside it.
        if line.is_empty() || line.starts_with(' ') || line.starts_with('\t') {
            match state {
                ScanState::Searching => continue,
                ScanState::InBlock => break,
            }
        }

        match match_directive(line, leader) {
            Some(directive) => {
                state = ScanState::InBlock;
                directives.push(directive);
            }
            // Any other non-blank line ends the scan, even while searching:
            // only a contiguous leading run of directives is honored.
            None => break,
        }
    }

    directives
}

/// Read a unit file, verifying it is a regular file first.
///
/// Errors are returned as the diagnostics the caller records; neither kind
/// aborts the run. Content is decoded lossily — directive names are ASCII
/// in practice and the scanner never fails on stray bytes elsewhere.
pub fn load_unit(path: &Path) -> Result<String, Diagnostic> {
    let display = path.display().to_string();

    let metadata = fs::metadata(path).map_err(|err| Diagnostic::UnreadableUnit {
        path: display.clone(),
        reason: err.to_string(),
    })?;
    if !metadata.is_file() {
        return Err(Diagnostic::NonRegularUnit { path: display });
    }

    let bytes = fs::read(path).map_err(|err| Diagnostic::UnreadableUnit {
        path: display,
        reason: err.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Limit a line to [`MAX_LINE_LEN`] bytes, respecting char boundaries.
fn clip_line(line: &str) -> &str {
    if line.len() <= MAX_LINE_LEN {
        return line;
    }
    let mut end = MAX_LINE_LEN;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

/// Match one candidate line: leader immediately followed by a directive tag.
fn match_directive(line: &str, leader: &str) -> Option<Directive> {
    let after_leader = line.strip_prefix(leader)?;
    for (tag, kind) in TAGS {
        if let Some(rest) = after_leader.strip_prefix(tag) {
            let tokens = rest
                .split([' ', '\t'])
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect();
            return Some(Directive { kind, tokens });
        }
    }
    None
}
