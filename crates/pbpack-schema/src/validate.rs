use crate::manifest::{InputSection, ManifestError, PackManifest};
use crate::types::{ReferenceName, ResourceName};
use std::collections::{BTreeMap, HashSet};

/// Manifest after field validation, with every resource input resolved to
/// a concrete descriptor.
///
/// `resources` keeps declaration order: position `n` becomes resource
/// index `n + 1` in the compiled pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedManifest {
    pub references: BTreeMap<ReferenceName, String>,
    pub palette: String,
    pub resources: Vec<DeclaredResource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredResource {
    pub name: ResourceName,
    pub descriptor: ResourceDescriptor,
}

/// Where a resource's bytes come from. Paths are relative to the build root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDescriptor {
    /// Raw bytes of a file on disk.
    FileImport { path: String },
    /// Entry `index` of an existing pack declared under `references`.
    ContainerExtract { pack: String, index: i32 },
    /// A truecolor image converted to the manifest palette.
    ImageImport { path: String, settings: ImageSettings },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSettings {
    pub method: Option<String>,
    pub bit_depth: Option<u8>,
}

impl PackManifest {
    /// Validate every resource entry and resolve reference names.
    ///
    /// The palette is required even when no image resource is declared.
    pub fn validate(&self) -> Result<ValidatedManifest, ManifestError> {
        let palette = self
            .palette
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(ManifestError::MissingPalette)?
            .to_owned();

        let references: BTreeMap<ReferenceName, String> = self
            .references
            .iter()
            .map(|(k, v)| (ReferenceName::new(k.as_str()), v.clone()))
            .collect();

        let mut seen = HashSet::with_capacity(self.resources.len());
        let mut resources = Vec::with_capacity(self.resources.len());
        for (position, entry) in self.resources.iter().enumerate() {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(ManifestError::EmptyName {
                    index: position + 1,
                });
            }
            if !seen.insert(name.to_owned()) {
                return Err(ManifestError::DuplicateName(name.to_owned()));
            }
            let descriptor = descriptor_for(name, &entry.input, &references)?;
            resources.push(DeclaredResource {
                name: ResourceName::new(name),
                descriptor,
            });
        }

        Ok(ValidatedManifest {
            references,
            palette,
            resources,
        })
    }
}

fn descriptor_for(
    resource: &str,
    input: &InputSection,
    references: &BTreeMap<ReferenceName, String>,
) -> Result<ResourceDescriptor, ManifestError> {
    let missing = |field: &'static str| ManifestError::MissingField {
        resource: resource.to_owned(),
        kind: input.kind.clone(),
        field,
    };

    match input.kind.as_str() {
        "file" => Ok(ResourceDescriptor::FileImport {
            path: input.file.clone().ok_or_else(|| missing("file"))?,
        }),
        "resource" => {
            let reference = input.reference.as_deref().ok_or_else(|| missing("ref"))?;
            let index = input.id.ok_or_else(|| missing("id"))?;
            let reference = ReferenceName::new(reference);
            let pack = references
                .get(&reference)
                .cloned()
                .ok_or_else(|| ManifestError::UnknownReference {
                    resource: resource.to_owned(),
                    reference: reference.to_string(),
                })?;
            Ok(ResourceDescriptor::ContainerExtract { pack, index })
        }
        "image" => Ok(ResourceDescriptor::ImageImport {
            path: input.file.clone().ok_or_else(|| missing("file"))?,
            settings: ImageSettings {
                method: input.method.clone(),
                bit_depth: input.bitdepth,
            },
        }),
        other => Err(ManifestError::UnknownInputType {
            resource: resource.to_owned(),
            kind: other.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::manifest::parse_manifest_json;
    use crate::{ManifestError, ResourceDescriptor};

    #[test]
    fn keeps_declaration_order_across_input_types() {
        let manifest = parse_manifest_json(
            r#"{
                "references": { "sys": "legacy.pbpack" },
                "palette": "pebble64",
                "resources": [
                    { "name": "C", "input": { "type": "image", "file": "c.png" } },
                    { "name": "A", "input": { "type": "file", "file": "a.bin" } },
                    { "name": "B", "input": { "type": "resource", "ref": "sys", "id": 7 } }
                ]
            }"#,
        )
        .unwrap();
        let validated = manifest.validate().unwrap();
        let names: Vec<&str> = validated.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
        assert_eq!(
            validated.resources[2].descriptor,
            ResourceDescriptor::ContainerExtract {
                pack: "legacy.pbpack".to_owned(),
                index: 7,
            }
        );
    }

    #[test]
    fn palette_is_required_without_images() {
        let manifest = parse_manifest_json(
            r#"{ "resources": [ { "name": "A", "input": { "type": "file", "file": "a" } } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::MissingPalette)
        ));
    }

    #[test]
    fn unknown_input_type_names_resource() {
        let manifest = parse_manifest_json(
            r#"{ "palette": "pebble2",
                 "resources": [ { "name": "SPLASH", "input": { "type": "framebuffer" } } ] }"#,
        )
        .unwrap();
        let err = manifest.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("SPLASH"), "{msg}");
        assert!(msg.contains("framebuffer"), "{msg}");
    }

    #[test]
    fn undeclared_reference_is_rejected() {
        let manifest = parse_manifest_json(
            r#"{ "palette": "pebble2",
                 "resources": [ { "name": "F", "input": { "type": "resource", "ref": "nope", "id": 1 } } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::UnknownReference { .. })
        ));
    }

    #[test]
    fn missing_id_is_reported() {
        let manifest = parse_manifest_json(
            r#"{ "references": { "sys": "s.pbpack" }, "palette": "pebble2",
                 "resources": [ { "name": "F", "input": { "type": "resource", "ref": "sys" } } ] }"#,
        )
        .unwrap();
        match manifest.validate() {
            Err(ManifestError::MissingField { field, .. }) => assert_eq!(field, "id"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let manifest = parse_manifest_json(
            r#"{ "palette": "pebble2", "resources": [
                 { "name": "A", "input": { "type": "file", "file": "a" } },
                 { "name": "A", "input": { "type": "file", "file": "b" } } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.validate(),
            Err(ManifestError::DuplicateName(n)) if n == "A"
        ));
    }

    #[test]
    fn image_settings_are_carried() {
        let manifest = parse_manifest_json(
            r#"{ "palette": "pebble64", "resources": [
                 { "name": "I", "input": { "type": "image", "file": "i.png",
                   "method": "truncate", "bitdepth": 8 } } ] }"#,
        )
        .unwrap();
        let validated = manifest.validate().unwrap();
        match &validated.resources[0].descriptor {
            ResourceDescriptor::ImageImport { path, settings } => {
                assert_eq!(path, "i.png");
                assert_eq!(settings.method.as_deref(), Some("truncate"));
                assert_eq!(settings.bit_depth, Some(8));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
