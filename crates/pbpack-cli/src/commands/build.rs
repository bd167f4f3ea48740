use super::{json_pretty, spin_fail, spin_ok, spinner, Failure, EXIT_SUCCESS};
use pbpack_core::{
    write_header, write_makedeps, write_pack, CoreError, ResolvedResource, ResourceCollection,
};
use pbpack_image::PngCodec;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Which files a build writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outputs {
    pub pack: bool,
    pub header: bool,
    pub make_dep: bool,
}

impl Outputs {
    /// Selecting nothing means selecting everything.
    pub fn select(pack: bool, header: bool, make_dep: bool) -> Self {
        if pack || header || make_dep {
            Self {
                pack,
                header,
                make_dep,
            }
        } else {
            Self {
                pack: true,
                header: true,
                make_dep: true,
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct WrittenFile {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ResourceSummary {
    index: u32,
    name: String,
    size: usize,
    crc32: u32,
    source: String,
}

impl From<&ResolvedResource> for ResourceSummary {
    fn from(r: &ResolvedResource) -> Self {
        Self {
            index: r.index,
            name: r.name.to_string(),
            size: r.size,
            crc32: r.crc32,
            source: r.provenance.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BuildReport {
    resources: Vec<ResourceSummary>,
    written: Vec<WrittenFile>,
}

pub fn run(
    manifest: &Path,
    basename: &Path,
    root: &Path,
    outputs: Outputs,
    json: bool,
) -> Result<u8, Failure> {
    let pb = if json {
        None
    } else {
        Some(spinner("building resource pack..."))
    };

    let report = match build(manifest, basename, root, outputs) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, &format!("{} resources", r.resources.len()));
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "build failed");
            }
            return Err(e.into());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for file in &report.written {
            match file.bytes {
                Some(n) => println!("wrote {} ({n} bytes)", file.path.display()),
                None => println!("wrote {}", file.path.display()),
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

fn build(
    manifest: &Path,
    basename: &Path,
    root: &Path,
    outputs: Outputs,
) -> Result<BuildReport, CoreError> {
    let collection = ResourceCollection::load(manifest, root, Arc::new(PngCodec))?;
    let pack_path = with_suffix(basename, ".pbpack");
    let header_path = with_suffix(basename, ".h");
    let dep_path = with_suffix(basename, ".d");
    debug!(
        "outputs: pack={} header={} make_dep={} (base {})",
        outputs.pack,
        outputs.header,
        outputs.make_dep,
        basename.display()
    );

    let resolved = if outputs.pack || outputs.header {
        collection.resolve()?
    } else {
        Vec::new()
    };

    let mut written = Vec::new();
    if outputs.pack {
        let bytes = write_pack(&pack_path, &resolved)?;
        written.push(WrittenFile {
            path: pack_path.clone(),
            bytes: Some(bytes),
        });
    }
    if outputs.header {
        write_header(&header_path, &resolved)?;
        written.push(WrittenFile {
            path: header_path.clone(),
            bytes: None,
        });
    }
    if outputs.make_dep {
        let tool = std::env::current_exe().ok();
        write_makedeps(
            &dep_path,
            &pack_path,
            &header_path,
            manifest,
            tool.as_deref(),
            &collection.dependencies(),
        )?;
        written.push(WrittenFile {
            path: dep_path,
            bytes: None,
        });
    }

    Ok(BuildReport {
        resources: resolved.iter().map(ResourceSummary::from).collect(),
        written,
    })
}

/// `out/res` + `.h` is `out/res.h`, even when the base name has a dot in it.
fn with_suffix(basename: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(basename.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
