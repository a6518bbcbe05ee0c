//! Dependency-cache commands — `brt cache status` and `brt cache clear`.

use anyhow::{Context, Result};
use std::path::Path;

use brt::config::BrtToml;
use brt::depdb;

pub fn cmd_cache_status(tree_root: &Path) -> Result<()> {
    let config = BrtToml::load_or_default(tree_root)?;
    let (path, digest) = depdb::current_cache_path(tree_root, &config)?;

    println!("Cache key:  {digest}");
    println!("Cache file: {}", path.display());
    if path.exists() {
        let status = console::style("present").green();
        match depdb::DepsCacheFile::load(&path) {
            Ok(cache) => {
                println!(
                    "Status:     {} ({} packages, generated {})",
                    status,
                    cache.packages.len(),
                    cache.generated_at
                );
            }
            Err(_) => {
                println!("Status:     {} (unreadable, will re-scrape)", console::style("corrupt").red());
            }
        }
    } else {
        println!("Status:     {} (next run will scrape)", console::style("absent").yellow());
    }
    Ok(())
}

pub fn cmd_cache_clear(tree_root: &Path) -> Result<()> {
    let config = BrtToml::load_or_default(tree_root)?;
    let cache_dir = config.cache_dir()?;
    let prefix = format!("{}.", config.cache.prefix);

    let mut removed = 0usize;
    if cache_dir.exists() {
        let entries = std::fs::read_dir(&cache_dir)
            .with_context(|| format!("Failed to read cache dir: {}", cache_dir.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) {
                continue;
            }
            std::fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
            removed += 1;
        }
    }

    println!("Removed {removed} cache file(s)");
    Ok(())
}
