use serde::Serialize;

/// Offset of the first table record.
pub const TABLE_OFFSET: usize = 0x0C;
/// Offset of the data region; table record offsets are relative to it.
pub const DATA_OFFSET: usize = 0x200C;
/// Size of one table record.
pub const ENTRY_SIZE: usize = 16;
/// Number of records that fit between the table and the data region.
pub const TABLE_CAPACITY: usize = (DATA_OFFSET - TABLE_OFFSET) / ENTRY_SIZE;

pub(crate) const COUNT_OFFSET: usize = 0;
pub(crate) const CRC_OFFSET: usize = 4;

/// Fixed header at the start of every pack.
///
/// `crc` covers the data region only; the table is not included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackHeader {
    pub count: u32,
    pub crc: u32,
}

impl PackHeader {
    pub fn write_into(&self, buf: &mut [u8]) {
        buf[COUNT_OFFSET..COUNT_OFFSET + 4].copy_from_slice(&self.count.to_le_bytes());
        buf[CRC_OFFSET..CRC_OFFSET + 4].copy_from_slice(&self.crc.to_le_bytes());
    }

    /// Parse the header from the first eight bytes of a pack.
    pub fn read_from(buf: &[u8]) -> Option<Self> {
        Some(Self {
            count: u32::from_le_bytes(buf.get(COUNT_OFFSET..COUNT_OFFSET + 4)?.try_into().ok()?),
            crc: u32::from_le_bytes(buf.get(CRC_OFFSET..CRC_OFFSET + 4)?.try_into().ok()?),
        })
    }
}

/// One 16-byte table record: `{i32 index, i32 offset, i32 size, u32 crc}`,
/// all little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub index: i32,
    pub offset: i32,
    pub size: i32,
    pub crc: u32,
}

impl TableEntry {
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut out = [0u8; ENTRY_SIZE];
        out[0..4].copy_from_slice(&self.index.to_le_bytes());
        out[4..8].copy_from_slice(&self.offset.to_le_bytes());
        out[8..12].copy_from_slice(&self.size.to_le_bytes());
        out[12..16].copy_from_slice(&self.crc.to_le_bytes());
        out
    }

    pub fn from_bytes(raw: &[u8; ENTRY_SIZE]) -> Self {
        let word = |at: usize| [raw[at], raw[at + 1], raw[at + 2], raw[at + 3]];
        Self {
            index: i32::from_le_bytes(word(0)),
            offset: i32::from_le_bytes(word(4)),
            size: i32::from_le_bytes(word(8)),
            crc: u32::from_le_bytes(word(12)),
        }
    }

    /// Absolute file offset of the `slot`-th table record.
    #[inline]
    pub fn position(slot: usize) -> usize {
        TABLE_OFFSET + slot * ENTRY_SIZE
    }
}
