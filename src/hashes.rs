//! File digests and hash sidecars.
//!
//! Generated configuration outputs record their SHA-256 next to themselves
//! under a `hashes/` directory, so later pipeline stages can tell whether a
//! generated file is stale without regenerating it.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Hex SHA-256 digest of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Sidecar location for a file's recorded hash:
/// `<dirname>/hashes/<basename>`. The `hashes/` directory is created on
/// demand.
pub fn hash_path(file: &Path) -> Result<PathBuf> {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let basename = file
        .file_name()
        .with_context(|| format!("Path has no file name: {}", file.display()))?;
    let hashes_dir = dir.join("hashes");
    if !hashes_dir.exists() {
        std::fs::create_dir(&hashes_dir).with_context(|| {
            format!("Failed to create hashes directory: {}", hashes_dir.display())
        })?;
    }
    Ok(hashes_dir.join(basename))
}

/// Record a file's digest in its sidecar, returning the sidecar path.
pub fn store(file: &Path) -> Result<PathBuf> {
    let digest = sha256_file(file)?;
    let sidecar = hash_path(file)?;
    std::fs::write(&sidecar, &digest)
        .with_context(|| format!("Failed to write hash sidecar: {}", sidecar.display()))?;
    Ok(sidecar)
}

/// Outcome of comparing a file against its recorded hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Digest matches the sidecar
    Match,
    /// Digest differs from the sidecar
    Mismatch { recorded: String, actual: String },
    /// No sidecar has been recorded for this file
    Missing,
}

/// Recompute a file's digest and compare it with the recorded sidecar.
pub fn verify(file: &Path) -> Result<Verification> {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let basename = file
        .file_name()
        .with_context(|| format!("Path has no file name: {}", file.display()))?;
    let sidecar = dir.join("hashes").join(basename);
    if !sidecar.exists() {
        return Ok(Verification::Missing);
    }
    let recorded = std::fs::read_to_string(&sidecar)
        .with_context(|| format!("Failed to read hash sidecar: {}", sidecar.display()))?
        .trim()
        .to_string();
    let actual = sha256_file(file)?;
    if recorded == actual {
        Ok(Verification::Match)
    } else {
        Ok(Verification::Mismatch { recorded, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_file_known_digest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.cfg");
        fs::write(&path, "").unwrap();

        // SHA-256 of the empty string.
        assert_eq!(
            sha256_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_file_missing_is_error() {
        let result = sha256_file(Path::new("/no/such/file"));
        assert!(result.is_err());
    }

    #[test]
    fn test_hash_path_creates_sidecar_dir() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("image.cfg");
        fs::write(&file, "x").unwrap();

        let sidecar = hash_path(&file).unwrap();
        assert_eq!(sidecar, dir.path().join("hashes/image.cfg"));
        assert!(dir.path().join("hashes").is_dir());
    }

    #[test]
    fn test_store_then_verify_matches() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("image.cfg");
        fs::write(&file, "configured").unwrap();

        store(&file).unwrap();
        assert_eq!(verify(&file).unwrap(), Verification::Match);
    }

    #[test]
    fn test_verify_detects_mismatch() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("image.cfg");
        fs::write(&file, "v1").unwrap();
        store(&file).unwrap();

        fs::write(&file, "v2").unwrap();
        match verify(&file).unwrap() {
            Verification::Mismatch { recorded, actual } => {
                assert_ne!(recorded, actual);
            }
            other => panic!("Expected Mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_without_sidecar_is_missing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("image.cfg");
        fs::write(&file, "x").unwrap();

        assert_eq!(verify(&file).unwrap(), Verification::Missing);
    }
}
