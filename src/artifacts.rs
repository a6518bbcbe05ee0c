//! External artifact manifest resolution.
//!
//! The tree pins the binaries it downloads at build time (firmware images,
//! bootloaders, vendored tools) in `external-artifacts.yaml`:
//!
//! ```yaml
//! artifact_sets:
//!   - artifact_set:
//!       name: firmware
//!       merge_with: [common]
//!       artifacts:
//!         - name: rtos-image
//!           s3_bucket: fw-releases
//!           s3_repository: rtos
//!           version: v2.3.1
//!           s3_object: "{name}-{version}.bin"
//! ```
//!
//! Resolving a set yields its own artifacts plus, recursively, every set
//! named in `merge_with`. String properties may reference sibling
//! properties (and `BR2_DL_DIR`) with `{placeholder}` syntax.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::ManifestError;
use crate::template::{expand, scalar_to_string};

/// Environment variable for the buildroot download directory, exposed to
/// property expansion as `BR2_DL_DIR`.
pub const BR2_DL_DIR_ENV: &str = "BR2_DL_DIR";

const DEFAULT_DL_DIR: &str = "buildroot/dl";

/// Guard against `merge_with` reference cycles.
const MAX_MERGE_DEPTH: usize = 16;

#[derive(Debug, Deserialize)]
struct ArtifactsFile {
    artifact_sets: Vec<ArtifactSetEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtifactSetEntry {
    artifact_set: ArtifactSet,
}

#[derive(Debug, Deserialize)]
struct ArtifactSet {
    name: String,
    #[serde(default)]
    merge_with: Vec<String>,
    #[serde(default)]
    artifacts: Vec<BTreeMap<String, serde_yaml::Value>>,
}

/// A fully resolved artifact: every property expanded to a plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    set: String,
    props: BTreeMap<String, String>,
}

impl ResolvedArtifact {
    /// The artifact's `name` property, when present.
    pub fn name(&self) -> Option<&str> {
        self.props.get("name").map(String::as_str)
    }

    /// Look up a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// Every property, sorted by key.
    pub fn props(&self) -> &BTreeMap<String, String> {
        &self.props
    }

    fn require(&self, key: &str) -> Result<&str, ManifestError> {
        self.get(key).ok_or_else(|| ManifestError::MissingProperty {
            set: self.set.clone(),
            property: key.to_string(),
        })
    }

    /// The artifact's S3 location:
    /// `s3://<s3_bucket>/<s3_repository>/<version>/<s3_object>`.
    pub fn s3_url(&self) -> Result<String, ManifestError> {
        Ok(format!(
            "s3://{}/{}/{}/{}",
            self.require("s3_bucket")?,
            self.require("s3_repository")?,
            self.require("version")?,
            self.require("s3_object")?,
        ))
    }
}

/// The parsed artifact manifest.
#[derive(Debug)]
pub struct ArtifactManifest {
    sets: Vec<ArtifactSet>,
    dl_dir: String,
}

impl ArtifactManifest {
    /// Load the manifest from a YAML file. `BR2_DL_DIR` comes from the
    /// environment, defaulting to `buildroot/dl`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact manifest: {}", path.display()))?;
        let file: ArtifactsFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse artifact manifest: {}", path.display()))?;
        let dl_dir = std::env::var(BR2_DL_DIR_ENV).unwrap_or_else(|_| DEFAULT_DL_DIR.to_string());
        Ok(Self {
            sets: file.artifact_sets.into_iter().map(|e| e.artifact_set).collect(),
            dl_dir,
        })
    }

    /// Override the download directory (tests, non-standard layouts).
    pub fn with_dl_dir(mut self, dl_dir: impl Into<String>) -> Self {
        self.dl_dir = dl_dir.into();
        self
    }

    /// Names of every declared set, in declaration order.
    pub fn set_names(&self) -> Vec<&str> {
        self.sets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Resolve a set by name: its own artifacts followed by the artifacts of
    /// every `merge_with` set, recursively.
    pub fn artifact_set(&self, name: &str) -> Result<Vec<ResolvedArtifact>, ManifestError> {
        self.artifact_set_at(name, 0)
    }

    fn artifact_set_at(
        &self,
        name: &str,
        depth: usize,
    ) -> Result<Vec<ResolvedArtifact>, ManifestError> {
        if depth > MAX_MERGE_DEPTH {
            return Err(ManifestError::MergeDepthExceeded {
                name: name.to_string(),
            });
        }
        let set = self
            .sets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ManifestError::SetNotFound {
                name: name.to_string(),
            })?;

        let mut resolved = Vec::with_capacity(set.artifacts.len());
        for raw in &set.artifacts {
            resolved.push(self.resolve_artifact(&set.name, raw)?);
        }
        for merged in &set.merge_with {
            resolved.extend(self.artifact_set_at(merged, depth + 1)?);
        }
        Ok(resolved)
    }

    /// Find an artifact by its `name` property within a resolved set.
    pub fn named_artifact(
        &self,
        set: &str,
        name: &str,
    ) -> Result<ResolvedArtifact, ManifestError> {
        self.artifact_set(set)?
            .into_iter()
            .find(|a| a.name() == Some(name))
            .ok_or_else(|| ManifestError::ArtifactNotFound {
                set: set.to_string(),
                name: name.to_string(),
            })
    }

    fn resolve_artifact(
        &self,
        set: &str,
        raw: &BTreeMap<String, serde_yaml::Value>,
    ) -> Result<ResolvedArtifact, ManifestError> {
        // Scalars stringify so numeric versions behave like quoted ones.
        let mut vars: BTreeMap<String, String> = raw
            .iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect();
        vars.insert("BR2_DL_DIR".to_string(), self.dl_dir.clone());

        let mut props = BTreeMap::new();
        for (key, value) in raw {
            let text = match value {
                serde_yaml::Value::String(s) => expand(s, &vars)?,
                other => scalar_to_string(other),
            };
            props.insert(key.clone(), text);
        }
        Ok(ResolvedArtifact {
            set: set.to_string(),
            props,
        })
    }
}
