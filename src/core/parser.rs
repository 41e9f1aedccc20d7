//! Manifest parsing.
//!
//! Parses a `stackplan.yaml` manifest into fully constructed [`Stack`]
//! values and checks the envelope:
//! - Version must be "1.0"
//! - Name must not be empty
//!
//! Reference validity (dangling refs, unknown stacks/exports, duplicates) is
//! the graph builder's job, not the parser's; the parser only reshapes
//! declarations.

use super::types::{Export, PropertyValue, ResourceNode, Stack, Suppression};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Supported manifest schema version.
pub const MANIFEST_VERSION: &str = "1.0";

/// Manifest-level error.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("version must be \"{MANIFEST_VERSION}\", got \"{0}\"")]
    UnsupportedVersion(String),

    #[error("name must not be empty")]
    EmptyName,
}

/// A parsed manifest: envelope fields plus fully constructed stacks, in
/// declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub version: String,
    pub name: String,
    pub description: Option<String>,
    pub stacks: Vec<Stack>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    version: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stacks: IndexMap<String, RawStack>,
}

#[derive(Debug, Deserialize)]
struct RawStack {
    #[serde(default)]
    resources: IndexMap<String, RawResource>,
    #[serde(default)]
    exports: IndexMap<String, PropertyValue>,
    #[serde(default)]
    suppressions: Vec<Suppression>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    kind: String,
    #[serde(default)]
    properties: IndexMap<String, PropertyValue>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    suppressions: Vec<Suppression>,
}

/// Parse a manifest file from disk.
pub fn parse_manifest_file(path: &Path) -> Result<Manifest, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_manifest(&content)
}

/// Parse a manifest from a YAML string.
pub fn parse_manifest(yaml: &str) -> Result<Manifest, ManifestError> {
    let raw: RawManifest = serde_yaml_ng::from_str(yaml)?;

    if raw.version != MANIFEST_VERSION {
        return Err(ManifestError::UnsupportedVersion(raw.version));
    }
    if raw.name.is_empty() {
        return Err(ManifestError::EmptyName);
    }

    let stacks = raw
        .stacks
        .into_iter()
        .map(|(id, stack)| Stack {
            id,
            resources: stack
                .resources
                .into_iter()
                .map(|(rid, r)| ResourceNode {
                    id: rid,
                    kind: r.kind,
                    properties: r.properties,
                    depends_on: r.depends_on,
                    suppressions: r.suppressions,
                })
                .collect(),
            exports: stack
                .exports
                .into_iter()
                .map(|(name, value)| Export { name, value })
                .collect(),
            suppressions: stack.suppressions,
        })
        .collect();

    Ok(Manifest {
        version: raw.version,
        name: raw.name,
        description: raw.description,
        stacks,
    })
}
