use crate::layout::{PackHeader, TableEntry, DATA_OFFSET, ENTRY_SIZE};
use crate::FormatError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view of an existing pack, used to pull individual resources
/// out of packs built by other tools.
///
/// The whole file is loaded into memory. Per-entry CRCs are carried but not
/// checked.
#[derive(Debug, Clone)]
pub struct PackReader {
    path: PathBuf,
    header: PackHeader,
    entries: Vec<TableEntry>,
    bytes: Vec<u8>,
}

impl PackReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| FormatError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, bytes)
    }

    /// Parse a pack already in memory. `path` is only used in error messages.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self, FormatError> {
        let path = path.into();
        let header = PackHeader::read_from(&bytes).ok_or_else(|| FormatError::Truncated {
            path: path.clone(),
            detail: format!("{} bytes is too short for the header", bytes.len()),
        })?;

        let mut entries = Vec::with_capacity(header.count.min(4096) as usize);
        for slot in 0..header.count as usize {
            let at = TableEntry::position(slot);
            let raw: &[u8; ENTRY_SIZE] = bytes
                .get(at..at + ENTRY_SIZE)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| FormatError::Truncated {
                    path: path.clone(),
                    detail: format!("table record {slot} of {} is missing", header.count),
                })?;
            entries.push(TableEntry::from_bytes(raw));
        }
        debug!("opened pack {} with {} resources", path.display(), entries.len());

        Ok(Self {
            path,
            header,
            entries,
            bytes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> PackHeader {
        self.header
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    /// Everything from the data offset to the end of the file.
    pub fn data_region(&self) -> &[u8] {
        self.bytes.get(DATA_OFFSET..).unwrap_or_default()
    }

    /// First table record whose stored index equals `index`.
    ///
    /// The table is scanned linearly; indices are not assumed to be dense or
    /// sorted.
    pub fn find(&self, index: i32) -> Result<&TableEntry, FormatError> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .ok_or_else(|| FormatError::NotFound {
                path: self.path.clone(),
                index,
            })
    }

    /// Raw bytes of resource `index`.
    pub fn extract(&self, index: i32) -> Result<&[u8], FormatError> {
        let entry = self.find(index)?;
        let range = usize::try_from(entry.offset)
            .ok()
            .zip(usize::try_from(entry.size).ok())
            .and_then(|(offset, size)| {
                let start = DATA_OFFSET.checked_add(offset)?;
                Some(start..start.checked_add(size)?)
            });
        range
            .and_then(|r| self.bytes.get(r))
            .ok_or_else(|| FormatError::Truncated {
                path: self.path.clone(),
                detail: format!(
                    "res {index} claims offset {} size {} beyond end of file",
                    entry.offset, entry.size
                ),
            })
    }
}
