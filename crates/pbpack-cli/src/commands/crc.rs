use super::{io_failure, json_pretty, Failure, EXIT_SUCCESS};
use pbpack_format::Crc32;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<u8, Failure> {
    let crc = checksum(file)?;
    if json {
        let payload = serde_json::json!({
            "file": file,
            "crc": crc,
            "hex": format!("0x{crc:08X}"),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{crc} (0x{crc:08X}) {}", file.display());
    }
    Ok(EXIT_SUCCESS)
}

fn checksum(path: &Path) -> Result<u32, Failure> {
    let file = File::open(path).map_err(|e| io_failure("open", path, &e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Crc32::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| io_failure("read", path, &e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
