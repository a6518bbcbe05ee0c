//! Unified configuration for the brt helpers.
//!
//! Reads `brt.toml` from the tree root. All settings have defaults matching
//! the conventional buildroot tree layout, so the file is optional. Settings
//! are layered: file, then environment, then CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [tree]
//! package_root = "package"
//! make_program = "make"
//! print_db_target = "_print_db"
//! rebuild_suffix = "-rebuild"
//!
//! [cache]
//! dir = "/tmp/build"        # falls back to $BUILD_TEMP when unset
//! prefix = "brt_deps"
//!
//! [manifests]
//! artifacts = "external-artifacts.yaml"
//! variants = "build-variants.yaml"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ScrapeError;

/// Environment variable naming the scratch directory used for the
/// dependency cache when `[cache] dir` is not configured.
pub const BUILD_TEMP_ENV: &str = "BUILD_TEMP";

/// Tree layout and build-system invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Directory holding one subdirectory per package
    #[serde(default = "default_package_root")]
    pub package_root: String,
    /// Make program used to dump the build-system database
    #[serde(default = "default_make_program")]
    pub make_program: String,
    /// Make target that prints the database
    #[serde(default = "default_print_db_target")]
    pub print_db_target: String,
    /// Suffix appended to a package name to form its rebuild target
    #[serde(default = "default_rebuild_suffix")]
    pub rebuild_suffix: String,
}

fn default_package_root() -> String {
    "package".to_string()
}

fn default_make_program() -> String {
    "make".to_string()
}

fn default_print_db_target() -> String {
    "_print_db".to_string()
}

fn default_rebuild_suffix() -> String {
    "-rebuild".to_string()
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            package_root: default_package_root(),
            make_program: default_make_program(),
            print_db_target: default_print_db_target(),
            rebuild_suffix: default_rebuild_suffix(),
        }
    }
}

/// Dependency cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory; `$BUILD_TEMP` is used when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Cache file name prefix (`<prefix>.<digest>`)
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
}

fn default_cache_prefix() -> String {
    "brt_deps".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            prefix: default_cache_prefix(),
        }
    }
}

/// Locations of the YAML manifests at the tree root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestsConfig {
    #[serde(default = "default_artifacts_file")]
    pub artifacts: String,
    #[serde(default = "default_variants_file")]
    pub variants: String,
}

fn default_artifacts_file() -> String {
    "external-artifacts.yaml".to_string()
}

fn default_variants_file() -> String {
    "build-variants.yaml".to_string()
}

impl Default for ManifestsConfig {
    fn default() -> Self {
        Self {
            artifacts: default_artifacts_file(),
            variants: default_variants_file(),
        }
    }
}

/// The parsed `brt.toml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrtToml {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub manifests: ManifestsConfig,
}

impl BrtToml {
    /// The configuration file name, looked up at the tree root.
    pub const FILE_NAME: &'static str = "brt.toml";

    /// Load configuration from `<tree_root>/brt.toml`, or defaults when the
    /// file does not exist.
    pub fn load_or_default(tree_root: &Path) -> Result<Self> {
        let path = tree_root.join(Self::FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Absolute path of the package root for a given tree root.
    pub fn package_root(&self, tree_root: &Path) -> PathBuf {
        tree_root.join(&self.tree.package_root)
    }

    /// Resolve the cache directory: `[cache] dir`, then `$BUILD_TEMP`.
    ///
    /// Missing both is an error; the dependency cache has no sensible
    /// default location inside the tree.
    pub fn cache_dir(&self) -> Result<PathBuf, ScrapeError> {
        if let Some(dir) = &self.cache.dir {
            return Ok(dir.clone());
        }
        match std::env::var_os(BUILD_TEMP_ENV) {
            Some(v) if !v.is_empty() => Ok(PathBuf::from(v)),
            _ => Err(ScrapeError::CacheDirUnset),
        }
    }

    /// Path of the artifact-set manifest for a given tree root.
    pub fn artifacts_manifest(&self, tree_root: &Path) -> PathBuf {
        tree_root.join(&self.manifests.artifacts)
    }

    /// Path of the build-variants manifest for a given tree root.
    pub fn variants_manifest(&self, tree_root: &Path) -> PathBuf {
        tree_root.join(&self.manifests.variants)
    }
}
