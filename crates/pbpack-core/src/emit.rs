//! Output writers for a resolved collection.
//!
//! The renderers are pure; the `write_*` helpers only add the file write.

use crate::{CoreError, ResolvedResource};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TOOL_NAME: &str = "pbpack";

/// Assemble the container for `resources` and write it to `path`.
///
/// Returns the number of bytes written.
pub fn write_pack(path: &Path, resources: &[ResolvedResource]) -> Result<u64, CoreError> {
    let blobs: Vec<&[u8]> = resources.iter().map(|r| r.bytes.as_slice()).collect();
    let written = pbpack_format::write_pack(path, &blobs)?;
    info!("wrote {} ({written} bytes)", path.display());
    Ok(written)
}

/// Render the C header enumerating every resource symbol.
pub fn render_header(resources: &[ResolvedResource]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "/* THIS FILE IS AUTOMATICALLY GENERATED BY {TOOL_NAME}. */");
    out.push_str("/* IF YOU MODIFY IT, YOUR CHANGES WILL BE LOST ON THE NEXT BUILD. */\n");
    out.push('\n');
    out.push_str("#pragma once\n");
    out.push('\n');
    out.push_str("typedef enum resource_id {\n");
    for r in resources {
        let _ = writeln!(out, "    {} = {}, /* (from {}) */", r.name, r.index, r.provenance);
    }
    out.push_str("} resource_id;\n");
    out
}

/// Render make rules for rebuilding `pack` and `header`.
///
/// Every dependency also gets an empty rule so that deleting an input does
/// not break make.
pub fn render_makedeps(
    pack: &Path,
    header: &Path,
    manifest: &Path,
    tool: Option<&Path>,
    deps: &[PathBuf],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# automatically generated by {TOOL_NAME}");
    out.push('\n');

    let _ = write!(out, "{}: {} ", pack.display(), manifest.display());
    if let Some(tool) = tool {
        let _ = write!(out, "{} ", tool.display());
    }
    for dep in deps {
        let _ = write!(out, "{} ", dep.display());
    }
    out.push_str("\n\n");

    let _ = writeln!(out, "{}: {}", header.display(), pack.display());
    out.push('\n');
    for dep in deps {
        let _ = writeln!(out, "{}:", dep.display());
        out.push('\n');
    }
    out.push_str("# end of generated dependencies\n");
    out
}

pub fn write_header(path: &Path, resources: &[ResolvedResource]) -> Result<(), CoreError> {
    write_text(path, &render_header(resources))
}

pub fn write_makedeps(
    path: &Path,
    pack: &Path,
    header: &Path,
    manifest: &Path,
    tool: Option<&Path>,
    deps: &[PathBuf],
) -> Result<(), CoreError> {
    write_text(path, &render_makedeps(pack, header, manifest, tool, deps))
}

fn write_text(path: &Path, text: &str) -> Result<(), CoreError> {
    fs::write(path, text).map_err(|source| CoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote {}", path.display());
    Ok(())
}
