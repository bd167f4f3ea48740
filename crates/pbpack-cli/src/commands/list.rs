use super::{colorize_check, json_pretty, Failure, EXIT_SUCCESS};
use pbpack_format::{crc32, PackReader};
use std::path::Path;

pub fn run(pack: &Path, json: bool) -> Result<u8, Failure> {
    let reader = PackReader::open(pack)?;
    let header = reader.header();
    let data_crc = crc32(reader.data_region());

    if json {
        let payload = serde_json::json!({
            "path": reader.path(),
            "header": header,
            "data_crc": data_crc,
            "entries": reader.entries(),
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!(
        "{}: {} resources, crc 0x{:08X} ({})",
        pack.display(),
        header.count,
        header.crc,
        colorize_check(header.crc == data_crc)
    );
    if reader.entries().is_empty() {
        return Ok(EXIT_SUCCESS);
    }
    println!("{:<6} {:<10} {:<10} CRC", "INDEX", "OFFSET", "SIZE");
    for entry in reader.entries() {
        let ok = reader
            .extract(entry.index)
            .is_ok_and(|bytes| crc32(bytes) == entry.crc);
        println!(
            "{:<6} {:<10} {:<10} 0x{:08X} {}",
            entry.index,
            entry.offset,
            entry.size,
            entry.crc,
            colorize_check(ok)
        );
    }
    Ok(EXIT_SUCCESS)
}
