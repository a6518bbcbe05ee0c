//! `{placeholder}` expansion for manifest properties.

use std::collections::BTreeMap;

use crate::errors::ManifestError;

/// Expand `{key}` placeholders in `template` from `vars`.
///
/// Expansion is single-pass: a substituted value is not re-scanned, so a
/// property whose value itself contains braces cannot recurse. An unknown
/// key is an error naming the placeholder.
pub fn expand(template: &str, vars: &BTreeMap<String, String>) -> Result<String, ManifestError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // Unterminated brace: keep the tail verbatim.
            out.push_str(&rest[open..]);
            return Ok(out);
        };
        let key = &after[..close];
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => {
                return Err(ManifestError::UnknownPlaceholder {
                    template: template.to_string(),
                    placeholder: key.to_string(),
                });
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Render a YAML scalar as the string it would read as in a template, so
/// numeric versions behave like quoted ones.
pub(crate) fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}
