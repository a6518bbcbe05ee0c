//! The changed-targets computation — `brt changed-targets`.
//!
//! Prints one rebuild target per line on stdout and nothing else, so CI
//! shell pipelines can consume the output directly:
//!
//! ```text
//! $ brt changed-targets --since origin/master
//! libsbp-rebuild
//! zmq_router-rebuild
//! ```

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

use brt::config::BrtToml;
use brt::depdb;
use brt::tracker::{ChangeTracker, changed_packages};

pub async fn cmd_changed_targets(
    tree_root: &Path,
    since: Option<&str>,
    all: bool,
    refresh: bool,
) -> Result<()> {
    let config = BrtToml::load_or_default(tree_root)?;

    let db = depdb::load(tree_root, &config, refresh).await?;
    let graph = db.graph();

    let selected: Vec<String> = if all {
        let packages: BTreeSet<String> = db.packages.keys().cloned().collect();
        graph.changed_order(&packages)?
    } else {
        let tracker = ChangeTracker::new(tree_root)?;
        let paths = tracker.changed_paths(since)?;
        let packages = changed_packages(paths.iter(), &config.tree.package_root);
        tracing::debug!(?packages, "changed packages");
        graph.changed_order(&packages)?
    };

    for package in selected {
        println!("{}{}", package, config.tree.rebuild_suffix);
    }
    Ok(())
}
