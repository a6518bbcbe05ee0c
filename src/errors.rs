//! Typed error hierarchy for the brt helpers.
//!
//! Three top-level enums cover the three subsystems:
//! - `GraphError` — dependency graph construction and ordering failures
//! - `ScrapeError` — build-system database scrape failures
//! - `ManifestError` — artifact-set and build-variant manifest failures

use thiserror::Error;

/// Errors from the dependency graph subsystem.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Dependency cycle detected. Involved packages: {packages:?}")]
    Cycle { packages: Vec<String> },
}

/// Errors from the dependency database scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program} {target}' exited with code {code}, standard error:\n\n{stderr}")]
    PrintDbFailed {
        program: String,
        target: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to read package root at {path}: {source}")]
    PackageRootUnreadable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Cache directory not configured: set [cache] dir in brt.toml or the BUILD_TEMP environment variable"
    )]
    CacheDirUnset,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the YAML manifest subsystem (artifact sets and build variants).
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Artifact set not found: {name}")]
    SetNotFound { name: String },

    #[error("Named artifact not found: {name} (searched set '{set}')")]
    ArtifactNotFound { set: String, name: String },

    #[error("Variant not found: {name}")]
    VariantNotFound { name: String },

    #[error("Unknown placeholder '{{{placeholder}}}' in template '{template}'")]
    UnknownPlaceholder { template: String, placeholder: String },

    #[error("Missing property '{property}' on artifact in set '{set}'")]
    MissingProperty { set: String, property: String },

    #[error("Artifact set merge depth exceeded while resolving '{name}' (merge_with cycle?)")]
    MergeDepthExceeded { name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
