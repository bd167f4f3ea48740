use crate::crc::crc32;
use crate::layout::{PackHeader, TableEntry, DATA_OFFSET, ENTRY_SIZE, TABLE_CAPACITY};
use crate::FormatError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A fully laid-out pack, ready to be written.
#[derive(Debug, Clone)]
pub struct PackImage {
    pub entries: Vec<TableEntry>,
    pub crc: u32,
    bytes: Vec<u8>,
}

impl PackImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the whole file, never less than [`DATA_OFFSET`].
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn resource_count(&self) -> usize {
        self.entries.len()
    }
}

/// Running index/offset state threaded through [`assemble`].
#[derive(Debug)]
struct Accumulator {
    next_index: i32,
    next_offset: i32,
    entries: Vec<TableEntry>,
}

impl Accumulator {
    fn with_capacity(n: usize) -> Self {
        Self {
            next_index: 1,
            next_offset: 0,
            entries: Vec::with_capacity(n),
        }
    }

    fn push(mut self, data: &[u8]) -> Result<Self, FormatError> {
        let size = i32::try_from(data.len()).map_err(|_| FormatError::TooLarge(data.len()))?;
        let next_offset = self
            .next_offset
            .checked_add(size)
            .ok_or(FormatError::TooLarge(self.next_offset as usize + data.len()))?;
        self.entries.push(TableEntry {
            index: self.next_index,
            offset: self.next_offset,
            size,
            crc: crc32(data),
        });
        self.next_index += 1;
        self.next_offset = next_offset;
        Ok(self)
    }
}

/// Lay out `resources` into the pack container format.
///
/// Resource `n` of the slice becomes index `n + 1`; entries and data appear
/// in slice order. The header CRC is one [`crc32`] call over the whole data
/// region.
pub fn assemble<B: AsRef<[u8]>>(resources: &[B]) -> Result<PackImage, FormatError> {
    if resources.len() > TABLE_CAPACITY {
        return Err(FormatError::TableFull {
            count: resources.len(),
            capacity: TABLE_CAPACITY,
        });
    }

    let acc = resources
        .iter()
        .try_fold(Accumulator::with_capacity(resources.len()), |acc, data| {
            acc.push(data.as_ref())
        })?;

    let data_len = acc.next_offset as usize;
    let mut bytes = vec![0u8; DATA_OFFSET + data_len];
    for (slot, entry) in acc.entries.iter().enumerate() {
        let at = TableEntry::position(slot);
        bytes[at..at + ENTRY_SIZE].copy_from_slice(&entry.to_bytes());
    }
    for (entry, data) in acc.entries.iter().zip(resources) {
        let at = DATA_OFFSET + entry.offset as usize;
        bytes[at..at + data.as_ref().len()].copy_from_slice(data.as_ref());
    }

    let crc = crc32(&bytes[DATA_OFFSET..]);
    PackHeader {
        count: acc.entries.len() as u32,
        crc,
    }
    .write_into(&mut bytes);

    Ok(PackImage {
        entries: acc.entries,
        crc,
        bytes,
    })
}

/// Assemble `resources` and write the pack to `path`, returning the number
/// of bytes written.
///
/// The file is written in place; a failure part-way may leave a partial
/// file behind.
pub fn write_pack<B: AsRef<[u8]>>(path: &Path, resources: &[B]) -> Result<u64, FormatError> {
    let image = assemble(resources)?;
    debug!(
        "writing {} resources ({} bytes, crc {:#010x}) to {}",
        image.resource_count(),
        image.byte_len(),
        image.crc,
        path.display()
    );
    fs::write(path, image.as_bytes()).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.byte_len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TABLE_OFFSET;

    #[test]
    fn assigns_sequential_indices_and_offsets() {
        let inputs: [&[u8]; 3] = [b"AA", b"BBBB", b"C"];
        let image = assemble(&inputs).unwrap();
        let layout: Vec<(i32, i32, i32)> = image
            .entries
            .iter()
            .map(|e| (e.index, e.offset, e.size))
            .collect();
        assert_eq!(layout, [(1, 0, 2), (2, 2, 4), (3, 6, 1)]);
        assert_eq!(image.entries[1].crc, crc32(b"BBBB"));
    }

    #[test]
    fn header_crc_covers_data_region_only() {
        let inputs: [&[u8]; 3] = [b"AA", b"BBBB", b"C"];
        let image = assemble(&inputs).unwrap();
        let bytes = image.as_bytes();
        assert_eq!(&bytes[0..4], &3u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &crc32(b"AABBBBC").to_le_bytes());
        assert_eq!(image.crc, 0x4300_297E);
        assert_eq!(&bytes[DATA_OFFSET..], b"AABBBBC");
    }

    #[test]
    fn unused_table_space_is_zeroed() {
        let image = assemble(&[b"x".as_slice()]).unwrap();
        let bytes = image.as_bytes();
        assert!(bytes[8..TABLE_OFFSET].iter().all(|b| *b == 0));
        assert!(bytes[TableEntry::position(1)..DATA_OFFSET]
            .iter()
            .all(|b| *b == 0));
        assert_eq!(image.byte_len(), DATA_OFFSET + 1);
        assert_eq!(image.resource_count(), 1);
    }

    #[test]
    fn empty_pack_keeps_full_layout() {
        let image = assemble::<&[u8]>(&[]).unwrap();
        assert_eq!(image.resource_count(), 0);
        assert_eq!(image.byte_len(), DATA_OFFSET);
        assert_eq!(image.crc, crc32(b""));
    }

    #[test]
    fn assembly_is_deterministic() {
        let inputs = [b"one".to_vec(), b"two".to_vec(), Vec::new()];
        let a = assemble(&inputs).unwrap();
        let b = assemble(&inputs).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.entries[2].size, 0);
        assert_eq!(a.entries[2].offset, 6);
    }

    #[test]
    fn rejects_more_than_table_capacity() {
        let inputs = vec![Vec::<u8>::new(); TABLE_CAPACITY + 1];
        assert!(matches!(
            assemble(&inputs),
            Err(FormatError::TableFull { count, .. }) if count == TABLE_CAPACITY + 1
        ));
        let full = vec![vec![0u8]; TABLE_CAPACITY];
        let image = assemble(&full).unwrap();
        assert_eq!(
            image.entries.last().map(|e| e.index),
            Some(TABLE_CAPACITY as i32)
        );
        assert_eq!(TableEntry::position(TABLE_CAPACITY - 1) + ENTRY_SIZE, DATA_OFFSET);
    }

    #[test]
    fn write_pack_reports_total_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pbpack");
        let written = write_pack(&path, &[b"hello".as_slice()]).unwrap();
        assert_eq!(written, (DATA_OFFSET + 5) as u64);
        assert_eq!(fs::metadata(&path).unwrap().len(), written);
    }

    #[test]
    fn write_pack_to_missing_directory_fails_with_path() {
        let err = write_pack(Path::new("/nonexistent/dir/out.pbpack"), &[b"x".as_slice()])
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dir/out.pbpack"));
    }
}
