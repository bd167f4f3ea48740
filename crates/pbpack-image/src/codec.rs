//! File-format boundary of the quantizer.

use crate::palette::BitDepth;
use crate::quantize::{quantize, ConvertOptions, Palette, QuantizedImage, RgbaRaster};
use crate::ImageError;
use tracing::debug;

/// Decoder/encoder pair used by [`convert`].
///
/// `decode` must yield 8-bit RGBA; `encode` must accept 1, 2, 4 and 8-bit
/// palettized or greyscale images with an optional transparent level.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<RgbaRaster, ImageError>;
    fn encode(&self, image: &QuantizedImage) -> Result<Vec<u8>, ImageError>;
}

/// PNG in, PNG out. Output is what the watch firmware loads as a
/// `GBitmap`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn decode(&self, data: &[u8]) -> Result<RgbaRaster, ImageError> {
        let rgba =
            image::load_from_memory_with_format(data, image::ImageFormat::Png)?.into_rgba8();
        let (width, height) = rgba.dimensions();
        RgbaRaster::from_rgba8(width, height, rgba.as_raw())
    }

    fn encode(&self, image: &QuantizedImage) -> Result<Vec<u8>, ImageError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
            encoder.set_depth(png_depth(image.bit_depth));
            encoder.set_compression(png::Compression::High);

            match &image.palette {
                Some(palette) if !image.greyscale => {
                    encoder.set_color(png::ColorType::Indexed);
                    match palette {
                        Palette::Rgb(entries) => {
                            encoder.set_palette(entries.concat());
                        }
                        Palette::Rgba(entries) => {
                            let rgb: Vec<u8> =
                                entries.iter().flat_map(|e| [e[0], e[1], e[2]]).collect();
                            let alpha: Vec<u8> = entries.iter().map(|e| e[3]).collect();
                            encoder.set_palette(rgb);
                            encoder.set_trns(alpha);
                        }
                    }
                }
                _ => {
                    encoder.set_color(png::ColorType::Grayscale);
                    if let Some(level) = image.transparent {
                        // 16-bit big-endian sample, as tRNS requires for greyscale.
                        encoder.set_trns(vec![0, level]);
                    }
                }
            }

            let mut writer = encoder.write_header()?;
            writer.write_image_data(&pack_rows(image))?;
            writer.finish()?;
        }
        Ok(out)
    }
}

fn png_depth(depth: BitDepth) -> png::BitDepth {
    match depth {
        BitDepth::One => png::BitDepth::One,
        BitDepth::Two => png::BitDepth::Two,
        BitDepth::Four => png::BitDepth::Four,
        BitDepth::Eight => png::BitDepth::Eight,
    }
}

/// Pack one sample per pixel into PNG scanlines, most significant bits
/// first, each row padded to a whole byte.
fn pack_rows(image: &QuantizedImage) -> Vec<u8> {
    let bits = usize::from(image.bit_depth.bits());
    let width = image.width as usize;
    if bits == 8 || width == 0 {
        return image.pixels.clone();
    }

    let per_byte = 8 / bits;
    let mask = (1u8 << bits) - 1;
    let row_bytes = width.div_ceil(per_byte);
    let mut out = vec![0u8; row_bytes * image.height as usize];
    for (y, row) in image.pixels.chunks(width).enumerate() {
        let line = &mut out[y * row_bytes..(y + 1) * row_bytes];
        for (x, px) in row.iter().enumerate() {
            let shift = 8 - bits * (x % per_byte + 1);
            line[x / per_byte] |= (px & mask) << shift;
        }
    }
    out
}

/// Decode `data`, quantize it with `options` and re-encode it.
pub fn convert(
    codec: &dyn ImageCodec,
    data: &[u8],
    options: &ConvertOptions,
) -> Result<Vec<u8>, ImageError> {
    let raster = codec.decode(data)?;
    let quantized = quantize(&raster, options)?;
    let encoded = codec.encode(&quantized)?;
    debug!(
        "converted {} byte image to {} bytes ({} palette, {} bits)",
        data.len(),
        encoded.len(),
        options.palette,
        quantized.bit_depth
    );
    Ok(encoded)
}
