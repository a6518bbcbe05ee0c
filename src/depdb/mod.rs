//! The dependency database: which package depends on which.
//!
//! The database is scraped from the build system (`make _print_db`) and
//! cached under a content-hash key so repeated CI invocations skip the
//! scrape while the package makefiles are unchanged.
//!
//! ## Architecture
//!
//! 1. **scrape** — runs the make database dump as a subprocess
//! 2. **parser** — extracts `*_DEPENDENCIES` variables from the dump
//! 3. **cache** — SHA-256-keyed JSON cache of the parsed result

pub mod cache;
pub mod parser;
pub mod scrape;

use anyhow::Result;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::BrtToml;
use crate::depgraph::DepGraph;

pub use cache::DepsCacheFile;

/// A loaded dependency database.
#[derive(Debug)]
pub struct DepDb {
    /// Package name → dependency names
    pub packages: BTreeMap<String, Vec<String>>,
    /// Content-hash key the database was loaded under
    pub makefile_hash: String,
    /// Whether the database came from the cache rather than a fresh scrape
    pub from_cache: bool,
}

impl DepDb {
    /// Build the dependency graph for this database.
    pub fn graph(&self) -> DepGraph {
        DepGraph::from_entries(
            self.packages
                .iter()
                .map(|(p, d)| (p.clone(), d.clone())),
        )
    }
}

/// The cache file location for the current tree state.
pub fn current_cache_path(tree_root: &Path, config: &BrtToml) -> Result<(PathBuf, String)> {
    let package_root = config.package_root(tree_root);
    let packages = cache::list_packages(&package_root)?;
    let digest = cache::makefile_hash(&package_root, &packages)?;
    let cache_dir = config.cache_dir()?;
    Ok((
        cache::cache_path(&cache_dir, &config.cache.prefix, &digest),
        digest,
    ))
}

/// Load the dependency database, scraping the build system on a cache miss.
///
/// `refresh` forces a scrape even when a matching cache file exists. Cache
/// write-back failures degrade to a warning; the scrape result is still
/// returned.
pub async fn load(tree_root: &Path, config: &BrtToml, refresh: bool) -> Result<DepDb> {
    let package_root = config.package_root(tree_root);
    let packages = cache::list_packages(&package_root)?;
    let digest = cache::makefile_hash(&package_root, &packages)?;
    let cache_dir = config.cache_dir()?;
    let cache_file = cache::cache_path(&cache_dir, &config.cache.prefix, &digest);

    if !refresh
        && let Some(cached) = cache::probe(&cache_file, &digest)
    {
        tracing::debug!(path = %cache_file.display(), "dependency cache hit");
        return Ok(DepDb {
            packages: cached,
            makefile_hash: digest,
            from_cache: true,
        });
    }

    tracing::info!("building cache of dependency information");
    let db = scrape::print_db(
        tree_root,
        &config.tree.make_program,
        &config.tree.print_db_target,
    )
    .await?;

    let known: BTreeSet<String> = packages.into_iter().collect();
    let parsed = parser::parse_dependencies(&db, &known);

    let payload = DepsCacheFile {
        makefile_hash: digest.clone(),
        generated_at: Utc::now().to_rfc3339(),
        packages: parsed.clone(),
    };
    if let Err(err) = payload.save(&cache_file) {
        tracing::warn!(path = %cache_file.display(), error = %err, "failed to write dependency cache");
    }

    Ok(DepDb {
        packages: parsed,
        makefile_hash: digest,
        from_cache: false,
    })
}
