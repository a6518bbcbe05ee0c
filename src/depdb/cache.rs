//! Content-hash cache for the scraped dependency database.
//!
//! The cache key is a SHA-256 digest over the contents of every `*.mk` file
//! under the package root plus the package directory listing, so editing a
//! makefile, or adding or removing a package, invalidates the cache. The key
//! appears both in the cache file name and inside the payload; a mismatch in
//! either direction is a miss.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::ScrapeError;

/// The on-disk cache payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepsCacheFile {
    /// Digest of the makefile sweep this payload was scraped under
    pub makefile_hash: String,
    /// Timestamp when the scrape ran
    pub generated_at: String,
    /// Package name → dependency names
    pub packages: BTreeMap<String, Vec<String>>,
}

impl DepsCacheFile {
    /// Load a cache payload from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
        let cache: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache JSON: {}", path.display()))?;
        Ok(cache)
    }

    /// Save the payload as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize cache to JSON")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
        Ok(())
    }
}

/// List the package directory names under the package root, sorted.
pub fn list_packages(package_root: &Path) -> Result<Vec<String>, ScrapeError> {
    let entries =
        std::fs::read_dir(package_root).map_err(|source| ScrapeError::PackageRootUnreadable {
            path: package_root.to_path_buf(),
            source,
        })?;

    let mut packages = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScrapeError::PackageRootUnreadable {
            path: package_root.to_path_buf(),
            source,
        })?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            packages.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    packages.sort();
    Ok(packages)
}

/// SHA-256 digest over every `*.mk` file under the package root (walked in
/// sorted order) followed by the sorted package directory listing.
pub fn makefile_hash(package_root: &Path, packages: &[String]) -> Result<String> {
    let mut hasher = Sha256::new();

    for entry in WalkDir::new(package_root).sort_by_file_name() {
        let entry = entry.with_context(|| {
            format!("Failed to walk package root: {}", package_root.display())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("mk") {
            continue;
        }
        let content = std::fs::read(entry.path())
            .with_context(|| format!("Failed to read makefile: {}", entry.path().display()))?;
        hasher.update(&content);
    }

    for package in packages {
        hasher.update(package.as_bytes());
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Cache file location for a given digest.
pub fn cache_path(cache_dir: &Path, prefix: &str, digest: &str) -> PathBuf {
    cache_dir.join(format!("{prefix}.{digest}"))
}

/// Probe the cache: a missing, unreadable, or structurally invalid file is a
/// miss, never an error, and so is a payload recorded under a different
/// makefile hash.
pub fn probe(path: &Path, expected_hash: &str) -> Option<BTreeMap<String, Vec<String>>> {
    if !path.exists() {
        return None;
    }
    match DepsCacheFile::load(path) {
        Ok(cache) if cache.makefile_hash == expected_hash => Some(cache.packages),
        Ok(_) => {
            tracing::debug!(path = %path.display(), "cache payload hash mismatch, ignoring");
            None
        }
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "unreadable cache, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn seed_package(root: &Path, name: &str, mk: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.mk")), mk).unwrap();
    }

    #[test]
    fn test_list_packages_only_directories_sorted() {
        let dir = tempdir().unwrap();
        seed_package(dir.path(), "zmq_router", "");
        seed_package(dir.path(), "libsbp", "");
        fs::write(dir.path().join("Makefile.in"), "include").unwrap();

        let packages = list_packages(dir.path()).unwrap();
        assert_eq!(packages, vec!["libsbp".to_string(), "zmq_router".to_string()]);
    }

    #[test]
    fn test_list_packages_missing_root_is_error() {
        let dir = tempdir().unwrap();
        let result = list_packages(&dir.path().join("no-such-dir"));
        assert!(matches!(
            result,
            Err(ScrapeError::PackageRootUnreadable { .. })
        ));
    }

    #[test]
    fn test_makefile_hash_changes_when_makefile_edited() {
        let dir = tempdir().unwrap();
        seed_package(dir.path(), "libsbp", "LIBSBP_VERSION = 1\n");
        let packages = list_packages(dir.path()).unwrap();

        let before = makefile_hash(dir.path(), &packages).unwrap();
        fs::write(
            dir.path().join("libsbp/libsbp.mk"),
            "LIBSBP_VERSION = 2\n",
        )
        .unwrap();
        let after = makefile_hash(dir.path(), &packages).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_makefile_hash_changes_when_package_added() {
        let dir = tempdir().unwrap();
        seed_package(dir.path(), "libsbp", "");
        let before =
            makefile_hash(dir.path(), &list_packages(dir.path()).unwrap()).unwrap();

        seed_package(dir.path(), "nmea_daemon", "");
        let after =
            makefile_hash(dir.path(), &list_packages(dir.path()).unwrap()).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_makefile_hash_ignores_non_mk_files() {
        let dir = tempdir().unwrap();
        seed_package(dir.path(), "libsbp", "LIBSBP_VERSION = 1\n");
        let packages = list_packages(dir.path()).unwrap();

        let before = makefile_hash(dir.path(), &packages).unwrap();
        fs::write(dir.path().join("libsbp/README.md"), "notes").unwrap();
        let after = makefile_hash(dir.path(), &packages).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_makefile_hash_is_stable() {
        let dir = tempdir().unwrap();
        seed_package(dir.path(), "libsbp", "LIBSBP_VERSION = 1\n");
        seed_package(dir.path(), "zmq_router", "ZMQ_ROUTER_VERSION = 1\n");
        let packages = list_packages(dir.path()).unwrap();

        let first = makefile_hash(dir.path(), &packages).unwrap();
        let second = makefile_hash(dir.path(), &packages).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_cache_roundtrip() {
        let dir = tempdir().unwrap();
        let path = cache_path(dir.path(), "brt_deps", "abc123");

        let mut packages = BTreeMap::new();
        packages.insert("libsbp".to_string(), vec!["libuv".to_string()]);
        let cache = DepsCacheFile {
            makefile_hash: "abc123".to_string(),
            generated_at: "2018-06-14T12:00:00Z".to_string(),
            packages,
        };
        cache.save(&path).unwrap();

        let loaded = probe(&path, "abc123").unwrap();
        assert_eq!(loaded["libsbp"], vec!["libuv".to_string()]);
    }

    #[test]
    fn test_probe_missing_file_is_miss() {
        let dir = tempdir().unwrap();
        let path = cache_path(dir.path(), "brt_deps", "abc123");
        assert!(probe(&path, "abc123").is_none());
    }

    #[test]
    fn test_probe_corrupt_file_is_miss() {
        let dir = tempdir().unwrap();
        let path = cache_path(dir.path(), "brt_deps", "abc123");
        fs::write(&path, "not json at all").unwrap();
        assert!(probe(&path, "abc123").is_none());
    }

    #[test]
    fn test_probe_stale_hash_is_miss() {
        let dir = tempdir().unwrap();
        let path = cache_path(dir.path(), "brt_deps", "newhash");

        let cache = DepsCacheFile {
            makefile_hash: "oldhash".to_string(),
            generated_at: "2018-06-14T12:00:00Z".to_string(),
            packages: BTreeMap::new(),
        };
        cache.save(&path).unwrap();

        assert!(probe(&path, "newhash").is_none());
    }

    #[test]
    fn test_cache_path_format() {
        let path = cache_path(Path::new("/tmp/build"), "brt_deps", "deadbeef");
        assert_eq!(path, PathBuf::from("/tmp/build/brt_deps.deadbeef"));
    }
}
