//! Image quantization for Pebble displays.
//!
//! Truecolor RGBA images are reduced to one of two device palette families
//! (`pebble64`, 2 bits per channel, or `pebble2`, black and white), the
//! smallest PNG-compatible bit depth is chosen, and the result is emitted
//! either palettized or as greyscale with an optional transparent level.
//! Decoding and encoding go through the [`ImageCodec`] strategy so the
//! quantizer itself never touches a file format.

pub mod codec;
pub mod palette;
pub mod quantize;

pub use codec::{convert, ImageCodec, PngCodec};
pub use palette::{reduction_fn, BitDepth, PaletteFamily, ReductionMethod, Rgba};
pub use quantize::{
    analyze, quantize, ConvertOptions, Palette, PaletteAnalysis, QuantizedImage, RgbaRaster,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("unknown palette '{0}', expected pebble64 or pebble2")]
    UnknownPalette(String),
    #[error("unknown color reduction method '{0}', expected nearest or truncate")]
    UnknownMethod(String),
    #[error("unsupported bit depth {0}, expected 1, 2, 4 or 8")]
    InvalidBitDepth(u8),
    #[error("tried to force {forced} bits; need at least {required}")]
    ForcedDepthTooLow { forced: u8, required: u8 },
    #[error("no free grey level left to mark transparency at {0} bits")]
    NoTransparentLevel(u8),
    #[error("raster is {width}x{height} but holds {actual} pixels")]
    RasterSize {
        width: u32,
        height: u32,
        actual: usize,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[from] png::EncodingError),
}

impl ImageError {
    /// Errors caused by the requested settings rather than the image data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownPalette(_)
                | Self::UnknownMethod(_)
                | Self::InvalidBitDepth(_)
                | Self::ForcedDepthTooLow { .. }
        )
    }
}
