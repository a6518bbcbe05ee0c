//! Build-variant commands — `brt variants list` and `brt variants show`.

use anyhow::Result;
use std::path::Path;

use brt::config::BrtToml;
use brt::variants::VariantManifest;

pub fn cmd_variants_list(tree_root: &Path) -> Result<()> {
    let config = BrtToml::load_or_default(tree_root)?;
    let manifest = VariantManifest::load(&config.variants_manifest(tree_root))?;

    for variant in manifest.list() {
        println!("{}", variant.name());
    }
    Ok(())
}

pub fn cmd_variants_show(tree_root: &Path, name: &str) -> Result<()> {
    let config = BrtToml::load_or_default(tree_root)?;
    let manifest = VariantManifest::load(&config.variants_manifest(tree_root))?;

    let variant = manifest.find(name)?;
    for (key, value) in variant.resolved_props()? {
        println!("{key} = {value}");
    }
    Ok(())
}
