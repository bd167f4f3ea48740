use crate::CoreError;
use pbpack_format::PackReader;
use pbpack_image::{convert, BitDepth, ConvertOptions, ImageCodec, PaletteFamily, ReductionMethod};
use pbpack_schema::{ImageSettings, ResourceDescriptor};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Produces the bytes of one resource.
///
/// Every variant lists the files it reads, yields its bytes, and describes
/// where they came from. Resolution only reads files, so it can be repeated
/// for each output that needs it.
#[derive(Clone)]
pub enum Resolver {
    /// Raw file contents.
    File { path: PathBuf },
    /// Entry `index` of an existing pack.
    Extract { pack: PathBuf, index: i32 },
    /// An image quantized to the manifest palette through `codec`.
    Image {
        path: PathBuf,
        options: ConvertOptions,
        codec: Arc<dyn ImageCodec>,
    },
}

impl Resolver {
    /// Build a resolver for `descriptor`, joining its paths onto `root`.
    pub fn from_descriptor(
        descriptor: &ResourceDescriptor,
        root: &Path,
        palette: PaletteFamily,
        codec: &Arc<dyn ImageCodec>,
    ) -> Result<Self, CoreError> {
        Ok(match descriptor {
            ResourceDescriptor::FileImport { path } => Self::File {
                path: root.join(path),
            },
            ResourceDescriptor::ContainerExtract { pack, index } => Self::Extract {
                pack: root.join(pack),
                index: *index,
            },
            ResourceDescriptor::ImageImport { path, settings } => Self::Image {
                path: root.join(path),
                options: image_options(palette, settings)?,
                codec: Arc::clone(codec),
            },
        })
    }

    pub fn dependencies(&self) -> Vec<PathBuf> {
        match self {
            Self::File { path } | Self::Image { path, .. } => vec![path.clone()],
            Self::Extract { pack, .. } => vec![pack.clone()],
        }
    }

    pub fn resolve(&self) -> Result<Vec<u8>, CoreError> {
        match self {
            Self::File { path } => read(path),
            Self::Extract { pack, index } => {
                let reader = PackReader::open(pack)?;
                Ok(reader.extract(*index)?.to_vec())
            }
            Self::Image {
                path,
                options,
                codec,
            } => {
                let source = read(path)?;
                let converted = convert(codec.as_ref(), &source, options)?;
                debug!(
                    "imported image {} ({} -> {} bytes)",
                    path.display(),
                    source.len(),
                    converted.len()
                );
                Ok(converted)
            }
        }
    }

    pub fn provenance(&self) -> String {
        match self {
            Self::File { path } => path.display().to_string(),
            Self::Extract { pack, index } => {
                format!("resource ID {index} from pack {}", pack.display())
            }
            Self::Image { path, .. } => format!("imported image {}", path.display()),
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => f.debug_struct("File").field("path", path).finish(),
            Self::Extract { pack, index } => f
                .debug_struct("Extract")
                .field("pack", pack)
                .field("index", index)
                .finish(),
            Self::Image { path, options, .. } => f
                .debug_struct("Image")
                .field("path", path)
                .field("options", options)
                .finish_non_exhaustive(),
        }
    }
}

fn image_options(
    palette: PaletteFamily,
    settings: &ImageSettings,
) -> Result<ConvertOptions, CoreError> {
    let method = settings
        .method
        .as_deref()
        .map(str::parse::<ReductionMethod>)
        .transpose()?
        .unwrap_or_default();
    let bit_depth = settings.bit_depth.map(BitDepth::try_from).transpose()?;
    Ok(ConvertOptions {
        palette,
        method,
        bit_depth,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, CoreError> {
    fs::read(path).map_err(|source| CoreError::Read {
        path: path.to_path_buf(),
        source,
    })
}
