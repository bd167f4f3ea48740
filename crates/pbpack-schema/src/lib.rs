//! Manifest parsing and validation for pbpack.
//!
//! This crate defines the schema layer: the on-disk manifest document
//! (`PackManifest`), accepted as JSON or TOML, and its validated form
//! (`ValidatedManifest`), an ordered list of `ResourceDescriptor` values
//! together with the named pack references and the target palette. It
//! performs no I/O beyond reading the manifest file itself.

pub mod manifest;
pub mod types;
pub mod validate;

pub use manifest::{
    parse_manifest_file, parse_manifest_json, parse_manifest_toml, InputSection, ManifestError,
    PackManifest, ResourceSection,
};
pub use types::{ReferenceName, ResourceName};
pub use validate::{DeclaredResource, ImageSettings, ResourceDescriptor, ValidatedManifest};
