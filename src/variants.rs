//! Build-variants manifest.
//!
//! `build-variants.yaml` names the firmware build flavors the CI pipeline
//! fans out over:
//!
//! ```yaml
//! variants:
//!   - variant:
//!       variant_name: release
//!       image: "firmware-{variant_name}.img"
//!   - variant:
//!       variant_name: debug
//!       image: "firmware-{variant_name}.img"
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::ManifestError;
use crate::template::{expand, scalar_to_string};

#[derive(Debug, Deserialize)]
struct VariantsFile {
    variants: Vec<VariantEntry>,
}

#[derive(Debug, Deserialize)]
struct VariantEntry {
    variant: BTreeMap<String, serde_yaml::Value>,
}

/// One build variant: a named bag of string properties.
#[derive(Debug, Clone)]
pub struct Variant {
    name: String,
    props: BTreeMap<String, String>,
}

impl Variant {
    /// The `variant_name` property.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A property with `{placeholder}` references expanded against the
    /// variant's own properties.
    pub fn prop(&self, key: &str) -> Result<String, ManifestError> {
        let raw = self
            .props
            .get(key)
            .ok_or_else(|| ManifestError::MissingProperty {
                set: self.name.clone(),
                property: key.to_string(),
            })?;
        expand(raw, &self.props)
    }

    /// Every property, resolved, sorted by key.
    pub fn resolved_props(&self) -> Result<BTreeMap<String, String>, ManifestError> {
        let mut out = BTreeMap::new();
        for key in self.props.keys() {
            out.insert(key.clone(), self.prop(key)?);
        }
        Ok(out)
    }
}

/// The parsed build-variants manifest.
#[derive(Debug)]
pub struct VariantManifest {
    variants: Vec<Variant>,
}

impl VariantManifest {
    /// Load the manifest from a YAML file. Every variant must carry a
    /// `variant_name` property.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read variants manifest: {}", path.display()))?;
        let file: VariantsFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse variants manifest: {}", path.display()))?;

        let mut variants = Vec::with_capacity(file.variants.len());
        for entry in file.variants {
            let props: BTreeMap<String, String> = entry
                .variant
                .iter()
                .map(|(k, v)| (k.clone(), scalar_to_string(v)))
                .collect();
            let Some(name) = props.get("variant_name").cloned() else {
                bail!(
                    "Variant without a variant_name in {}",
                    path.display()
                );
            };
            variants.push(Variant { name, props });
        }
        Ok(Self { variants })
    }

    /// Every variant, in declaration order.
    pub fn list(&self) -> &[Variant] {
        &self.variants
    }

    /// Find a variant by `variant_name`.
    pub fn find(&self, name: &str) -> Result<&Variant, ManifestError> {
        self.variants
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| ManifestError::VariantNotFound {
                name: name.to_string(),
            })
    }
}
