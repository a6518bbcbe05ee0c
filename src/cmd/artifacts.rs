//! Artifact-set commands — `brt artifacts list` and `brt artifacts url`.

use anyhow::Result;
use std::path::Path;

use brt::artifacts::ArtifactManifest;
use brt::config::BrtToml;

pub fn cmd_artifacts_list(tree_root: &Path, set: Option<&str>) -> Result<()> {
    let config = BrtToml::load_or_default(tree_root)?;
    let manifest = ArtifactManifest::load(&config.artifacts_manifest(tree_root))?;

    let Some(set) = set else {
        for name in manifest.set_names() {
            println!("{name}");
        }
        return Ok(());
    };

    for artifact in manifest.artifact_set(set)? {
        match artifact.name() {
            Some(name) => println!("{name}"),
            None => println!("{}", console::style("(unnamed)").dim()),
        }
    }
    Ok(())
}

pub fn cmd_artifacts_url(tree_root: &Path, set: &str, name: &str) -> Result<()> {
    let config = BrtToml::load_or_default(tree_root)?;
    let manifest = ArtifactManifest::load(&config.artifacts_manifest(tree_root))?;

    let artifact = manifest.named_artifact(set, name)?;
    println!("{}", artifact.s3_url()?);
    Ok(())
}
