use crate::resolver::Resolver;
use crate::CoreError;
use pbpack_format::crc32;
use pbpack_image::{ImageCodec, PaletteFamily};
use pbpack_schema::{parse_manifest_file, PackManifest, ResourceName};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// One manifest entry, in declaration order.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub name: ResourceName,
    pub resolver: Resolver,
}

/// A resource after its resolver has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// 1-based position in the manifest.
    pub index: u32,
    pub name: ResourceName,
    pub bytes: Vec<u8>,
    pub size: usize,
    pub crc32: u32,
    pub provenance: String,
    pub dependency_paths: Vec<PathBuf>,
}

/// The resources described by one manifest.
///
/// Loading validates the manifest and builds a resolver per entry but reads
/// no resource data; that happens in [`resolve`](Self::resolve).
#[derive(Debug, Clone)]
pub struct ResourceCollection {
    manifest_path: PathBuf,
    palette: PaletteFamily,
    entries: Vec<CollectionEntry>,
}

impl ResourceCollection {
    /// Load the manifest at `manifest_path`. Resource and reference paths are
    /// taken relative to `root`.
    pub fn load(
        manifest_path: &Path,
        root: &Path,
        codec: Arc<dyn ImageCodec>,
    ) -> Result<Self, CoreError> {
        let manifest = parse_manifest_file(manifest_path)?;
        Self::from_manifest(&manifest, manifest_path, root, &codec)
    }

    pub fn from_manifest(
        manifest: &PackManifest,
        manifest_path: &Path,
        root: &Path,
        codec: &Arc<dyn ImageCodec>,
    ) -> Result<Self, CoreError> {
        let validated = manifest.validate()?;
        let palette: PaletteFamily = validated.palette.parse()?;

        let entries = validated
            .resources
            .iter()
            .enumerate()
            .map(|(position, declared)| {
                Resolver::from_descriptor(&declared.descriptor, root, palette, codec)
                    .map(|resolver| CollectionEntry {
                        name: declared.name.clone(),
                        resolver,
                    })
                    .map_err(|e| e.in_resource(position + 1, &declared.name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "loaded {} resources from {} (palette {palette})",
            entries.len(),
            manifest_path.display()
        );
        Ok(Self {
            manifest_path: manifest_path.to_path_buf(),
            palette,
            entries,
        })
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn palette(&self) -> PaletteFamily {
        self.palette
    }

    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every input file of the pack, without duplicates, in first-use order.
    pub fn dependencies(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .flat_map(|e| e.resolver.dependencies())
            .filter(|d| seen.insert(d.clone()))
            .collect()
    }

    /// Run every resolver in declaration order.
    ///
    /// Stops at the first failure, which names the offending entry.
    pub fn resolve(&self) -> Result<Vec<ResolvedResource>, CoreError> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| {
                let bytes = entry
                    .resolver
                    .resolve()
                    .map_err(|e| e.in_resource(position + 1, &entry.name))?;
                debug!(
                    "resolved {} = {} ({} bytes)",
                    entry.name,
                    position + 1,
                    bytes.len()
                );
                Ok(ResolvedResource {
                    index: (position + 1) as u32,
                    name: entry.name.clone(),
                    size: bytes.len(),
                    crc32: crc32(&bytes),
                    provenance: entry.resolver.provenance(),
                    dependency_paths: entry.resolver.dependencies(),
                    bytes,
                })
            })
            .collect()
    }
}
