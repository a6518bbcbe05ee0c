//! Parser for the build system's database dump.
//!
//! `make _print_db` prints every variable in the database, one per line,
//! after expansion. Package dependency variables look like:
//!
//! ```text
//! LIBSBP_DEPENDENCIES = host-pkgconf libuv
//! ```
//!
//! The variable name maps to a package by stripping the `_DEPENDENCIES`
//! suffix and lowercasing. Only packages present in the tree's package root
//! are recorded; dependency variables for host or virtual targets the tree
//! does not build directly are dropped.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn dependencies_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9_]+)_DEPENDENCIES\s*:?=(.*)$").expect("valid regex")
    })
}

/// Parse a database dump into package → dependencies.
///
/// Every name in `known` gets an entry, even when the dump never mentions
/// it. Comment lines (first non-whitespace byte `#`) are skipped.
pub fn parse_dependencies(
    db: &str,
    known: &BTreeSet<String>,
) -> BTreeMap<String, Vec<String>> {
    let mut packages: BTreeMap<String, Vec<String>> =
        known.iter().map(|p| (p.clone(), Vec::new())).collect();

    for line in db.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            continue;
        }
        let Some(caps) = dependencies_line().captures(trimmed) else {
            continue;
        };
        let name = caps[1].to_lowercase();
        let Some(entry) = packages.get_mut(&name) else {
            continue;
        };
        entry.extend(caps[2].split_whitespace().map(str::to_string));
    }

    packages
}
