//! Binary pack container format for pbpack.
//!
//! This crate provides the storage layer: the STM32-compatible CRC engine
//! (`crc32`, `Crc32`), the fixed container layout (`TableEntry`,
//! `PackHeader` and the offset constants), the pack assembler (`assemble`,
//! `write_pack`) and the legacy-extraction reader (`PackReader`).

pub mod crc;
pub mod layout;
pub mod reader;
pub mod writer;

pub use crc::{crc32, crc32_with_seed, Crc32, CRC_INIT, CRC_POLY};
pub use layout::{PackHeader, TableEntry, DATA_OFFSET, ENTRY_SIZE, TABLE_CAPACITY, TABLE_OFFSET};
pub use reader::PackReader;
pub use writer::{assemble, write_pack, PackImage};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("pack I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("res {index} not found in pack '{}'", path.display())]
    NotFound { path: PathBuf, index: i32 },
    #[error("too many resources: {count} exceeds table capacity of {capacity}")]
    TableFull { count: usize, capacity: usize },
    #[error("pack data exceeds the 32-bit offset range ({0} bytes)")]
    TooLarge(usize),
    #[error("pack '{}' is truncated: {detail}", path.display())]
    Truncated { path: PathBuf, detail: String },
}
