use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse manifest: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("palette is not set")]
    MissingPalette,
    #[error("resource #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("duplicate resource name '{0}'")]
    DuplicateName(String),
    #[error("resource '{resource}': unknown input type '{kind}'")]
    UnknownInputType { resource: String, kind: String },
    #[error("resource '{resource}': input type '{kind}' requires field '{field}'")]
    MissingField {
        resource: String,
        kind: String,
        field: &'static str,
    },
    #[error("resource '{resource}': reference '{reference}' is not declared")]
    UnknownReference { resource: String, reference: String },
}

/// The manifest document as written on disk.
///
/// Unknown keys are ignored so that manifests may carry tool-specific
/// annotations. Field validation happens in [`PackManifest::validate`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PackManifest {
    #[serde(default)]
    pub references: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
    pub resources: Vec<ResourceSection>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResourceSection {
    pub name: String,
    pub input: InputSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct InputSection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitdepth: Option<u8>,
}

pub fn parse_manifest_json(input: &str) -> Result<PackManifest, ManifestError> {
    Ok(serde_json::from_str(input)?)
}

pub fn parse_manifest_toml(input: &str) -> Result<PackManifest, ManifestError> {
    Ok(toml::from_str(input)?)
}

/// Read a manifest from disk. Files ending in `.toml` are parsed as TOML,
/// everything else as JSON.
pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<PackManifest, ManifestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if path.extension().is_some_and(|ext| ext == "toml") {
        parse_manifest_toml(&content)
    } else {
        parse_manifest_json(&content)
    }
}
