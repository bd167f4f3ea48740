//! Resource pack compilation for pbpack.
//!
//! This crate ties the manifest schema, the container format and the image
//! quantizer together: a `ResourceCollection` turns a manifest into an
//! ordered list of `Resolver`s, resolves them into `ResolvedResource`s, and
//! the `emit` module writes the pack, the C header and the make dependency
//! file from that list.

pub mod collection;
pub mod emit;
pub mod resolver;

pub use collection::{CollectionEntry, ResolvedResource, ResourceCollection};
pub use emit::{render_header, render_makedeps, write_header, write_makedeps, write_pack};
pub use resolver::Resolver;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] pbpack_schema::ManifestError),
    #[error("pack error: {0}")]
    Format(#[from] pbpack_format::FormatError),
    #[error("image error: {0}")]
    Image(#[from] pbpack_image::ImageError),
    #[error("resource {index} ({name}): {source}")]
    Resource {
        index: usize,
        name: String,
        #[source]
        source: Box<CoreError>,
    },
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`CoreError`], used for exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manifest or a requested setting is invalid.
    Configuration,
    /// A requested resource index does not exist in a referenced pack.
    NotFound,
    /// A file could not be read, decoded or written.
    Io,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        use pbpack_format::FormatError;
        use pbpack_schema::ManifestError;

        match self {
            Self::Manifest(ManifestError::Io { .. })
            | Self::Format(FormatError::Io { .. } | FormatError::Truncated { .. })
            | Self::Read { .. }
            | Self::Write { .. } => ErrorKind::Io,
            Self::Manifest(_)
            | Self::Format(FormatError::TableFull { .. } | FormatError::TooLarge(_)) => {
                ErrorKind::Configuration
            }
            Self::Format(FormatError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Image(e) if e.is_configuration() => ErrorKind::Configuration,
            Self::Image(_) => ErrorKind::Io,
            Self::Resource { source, .. } => source.kind(),
        }
    }

    pub(crate) fn in_resource(self, index: usize, name: &str) -> Self {
        Self::Resource {
            index,
            name: name.to_owned(),
            source: Box::new(self),
        }
    }
}
