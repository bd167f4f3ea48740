use super::{io_failure, json_pretty, Failure, EXIT_SUCCESS};
use pbpack_image::{convert, ConvertOptions, PngCodec};
use std::fs;
use std::path::Path;

pub fn run(
    input: &Path,
    output: &Path,
    options: ConvertOptions,
    json: bool,
) -> Result<u8, Failure> {
    let source = fs::read(input).map_err(|e| io_failure("read", input, &e))?;
    let converted = convert(&PngCodec, &source, &options)?;
    fs::write(output, &converted).map_err(|e| io_failure("write", output, &e))?;

    if json {
        let payload = serde_json::json!({
            "input": input,
            "output": output,
            "palette": options.palette.as_str(),
            "method": options.method.as_str(),
            "bytes": converted.len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "wrote {} ({} bytes, {})",
            output.display(),
            converted.len(),
            options.palette
        );
    }
    Ok(EXIT_SUCCESS)
}
