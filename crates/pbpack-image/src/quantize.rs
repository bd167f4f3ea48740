//! Palette discovery, bit-depth selection and pixel re-encoding.

use crate::palette::{reduction_fn, BitDepth, PaletteFamily, ReductionMethod, Rgba};
use crate::ImageError;
use std::collections::HashMap;
use tracing::debug;

/// Decoded source image, one [`Rgba`] per pixel in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaRaster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba>,
}

impl RgbaRaster {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba>) -> Result<Self, ImageError> {
        if pixels.len() as u64 != u64::from(width) * u64::from(height) {
            return Err(ImageError::RasterSize {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from packed 8-bit RGBA bytes.
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, ImageError> {
        let pixels = data
            .chunks_exact(4)
            .map(|px| Rgba::new(px[0], px[1], px[2], px[3]))
            .collect();
        Self::new(width, height, pixels)
    }

    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    pub palette: PaletteFamily,
    pub method: ReductionMethod,
    /// Minimum output depth. Rejected if below what the image needs.
    pub bit_depth: Option<BitDepth>,
}

/// Result of the palette discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteAnalysis {
    /// Distinct reduced colors in first-seen order.
    pub colors: Vec<Rgba>,
    pub is_grey: bool,
    pub has_alpha: bool,
    pub bit_depth: BitDepth,
}

impl PaletteAnalysis {
    pub fn contains(&self, color: Rgba) -> bool {
        self.colors.contains(&color)
    }
}

/// Output palette. Alpha is only carried when some pixel is not opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    Rgb(Vec<[u8; 3]>),
    Rgba(Vec<[u8; 4]>),
}

impl Palette {
    pub fn len(&self) -> usize {
        match self {
            Self::Rgb(entries) => entries.len(),
            Self::Rgba(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedImage {
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub greyscale: bool,
    /// Grey level standing in for fully transparent pixels.
    pub transparent: Option<u8>,
    /// Present iff `greyscale` is false.
    pub palette: Option<Palette>,
    /// One palette index or grey level per pixel.
    pub pixels: Vec<u8>,
}

/// Collect the reduced palette of `raster` and pick its bit depth.
///
/// An image stays greyscale only while every reduced color is an opaque
/// grey or fully transparent black, and only if the grey shades present do
/// not need more bits than indexing the palette would.
pub fn analyze(
    raster: &RgbaRaster,
    family: PaletteFamily,
    method: ReductionMethod,
) -> PaletteAnalysis {
    let reduce = reduction_fn(family, method);

    let mut colors: Vec<Rgba> = Vec::new();
    let mut is_grey = true;
    let mut has_alpha = false;
    for px in &raster.pixels {
        let px = reduce(*px);
        if colors.contains(&px) {
            continue;
        }
        colors.push(px);
        if px.a != 255 {
            has_alpha = true;
        }
        if is_grey && !(px.is_opaque_grey() || px == Rgba::TRANSPARENT) {
            is_grey = false;
        }
    }

    let mut bit_depth = BitDepth::for_colors(colors.len());
    if is_grey {
        let midtones = colors.contains(&Rgba::grey(85)) || colors.contains(&Rgba::grey(170));
        let grey_depth = match (midtones, colors.len()) {
            (true, n) if n >= 5 => BitDepth::Four,
            (true, _) => BitDepth::Two,
            (false, n) if n >= 3 => BitDepth::Two,
            (false, _) => BitDepth::One,
        };
        if grey_depth > bit_depth {
            is_grey = false;
        } else {
            bit_depth = grey_depth;
        }
    }

    PaletteAnalysis {
        colors,
        is_grey,
        has_alpha,
        bit_depth,
    }
}

/// Grey level reserved for transparent pixels.
///
/// At 4 bits all four device greys may be in use, so the otherwise unused
/// level `0xC` is taken. Below that the first of black, white, dark grey and
/// light grey that no opaque pixel uses is chosen.
fn transparent_grey(analysis: &PaletteAnalysis, depth: BitDepth) -> Result<u8, ImageError> {
    if depth == BitDepth::Four {
        return Ok(0xC);
    }
    [0u8, 255, 85, 170]
        .into_iter()
        .find(|lum| !analysis.contains(Rgba::grey(*lum)))
        .map(|lum| depth.scale(lum))
        .ok_or(ImageError::NoTransparentLevel(depth.bits()))
}

/// Reduce `raster` to the device palette and encode every pixel as a
/// palette index or grey level.
pub fn quantize(
    raster: &RgbaRaster,
    options: &ConvertOptions,
) -> Result<QuantizedImage, ImageError> {
    let analysis = analyze(raster, options.palette, options.method);
    let mut greyscale = analysis.is_grey;
    let mut bit_depth = analysis.bit_depth;

    if let Some(forced) = options.bit_depth {
        if bit_depth > forced {
            return Err(ImageError::ForcedDepthTooLow {
                forced: forced.bits(),
                required: bit_depth.bits(),
            });
        }
        // Greyscale output is only kept at exactly the depth it asked for.
        if bit_depth != forced {
            greyscale = false;
        }
        bit_depth = forced;
    }

    let transparent = if greyscale && analysis.has_alpha {
        Some(transparent_grey(&analysis, bit_depth)?)
    } else {
        None
    };

    let reduce = reduction_fn(options.palette, options.method);
    let pixels: Vec<u8> = if greyscale {
        raster
            .pixels
            .iter()
            .map(|px| {
                let px = reduce(*px);
                match transparent {
                    Some(level) if px.a == 0 => level,
                    _ => bit_depth.scale(px.r),
                }
            })
            .collect()
    } else {
        // Without alpha every reduced pixel is opaque, so the RGB triplet
        // and the full quadruplet select the same entry.
        let lookup: HashMap<Rgba, u8> = analysis
            .colors
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i as u8))
            .collect();
        raster
            .pixels
            .iter()
            .map(|px| lookup.get(&reduce(*px)).copied().unwrap_or_default())
            .collect()
    };

    let palette = if greyscale {
        None
    } else if analysis.has_alpha {
        Some(Palette::Rgba(
            analysis
                .colors
                .iter()
                .map(|c| [c.r, c.g, c.b, c.a])
                .collect(),
        ))
    } else {
        Some(Palette::Rgb(analysis.colors.iter().map(|c| c.rgb()).collect()))
    };

    debug!(
        "quantized {}x{} image to {} colours at {} bits ({})",
        raster.width,
        raster.height,
        analysis.colors.len(),
        bit_depth,
        if greyscale { "greyscale" } else { "palettized" }
    );

    Ok(QuantizedImage {
        width: raster.width,
        height: raster.height,
        bit_depth,
        greyscale,
        transparent,
        palette,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgba = Rgba::grey(0);
    const WHITE: Rgba = Rgba::grey(255);

    fn raster(pixels: &[Rgba]) -> RgbaRaster {
        RgbaRaster::new(pixels.len() as u32, 1, pixels.to_vec()).unwrap()
    }

    fn opts(palette: PaletteFamily) -> ConvertOptions {
        ConvertOptions {
            palette,
            ..ConvertOptions::default()
        }
    }

    #[test]
    fn single_opaque_color_is_one_bit() {
        let img = RgbaRaster::filled(4, 4, Rgba::new(200, 30, 90, 255));
        let analysis = analyze(&img, PaletteFamily::Pebble64, ReductionMethod::Nearest);
        assert_eq!(analysis.colors, [Rgba::new(170, 0, 85, 255)]);
        assert_eq!(analysis.bit_depth, BitDepth::One);
        assert!(!analysis.is_grey);
        assert!(!analysis.has_alpha);

        let out = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert_eq!(out.bit_depth, BitDepth::One);
        assert_eq!(out.palette, Some(Palette::Rgb(vec![[170, 0, 85]])));
        assert!(out.pixels.iter().all(|p| *p == 0));
    }

    #[test]
    fn palette_keeps_first_seen_order() {
        let red = Rgba::new(255, 0, 0, 255);
        let blue = Rgba::new(0, 0, 255, 255);
        let img = raster(&[blue, red, blue, BLACK, red]);
        let out = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert_eq!(
            out.palette,
            Some(Palette::Rgb(vec![[0, 0, 255], [255, 0, 0], [0, 0, 0]]))
        );
        assert_eq!(out.pixels, [0, 1, 0, 2, 1]);
        assert_eq!(out.bit_depth, BitDepth::Two);
    }

    #[test]
    fn black_white_transparent_is_two_bit_greyscale() {
        let img = raster(&[BLACK, WHITE, Rgba::TRANSPARENT, WHITE]);
        let out = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert!(out.greyscale);
        assert_eq!(out.bit_depth, BitDepth::Two);
        assert!(out.palette.is_none());
        // Black and white are taken, so dark grey (85 >> 6) marks transparency.
        assert_eq!(out.transparent, Some(1));
        assert_eq!(out.pixels, [0, 3, 1, 3]);
    }

    #[test]
    fn white_and_transparent_uses_black_as_sentinel() {
        let img = raster(&[WHITE, Rgba::TRANSPARENT]);
        let out = quantize(&img, &opts(PaletteFamily::Pebble2)).unwrap();
        assert!(out.greyscale);
        assert_eq!(out.bit_depth, BitDepth::One);
        assert_eq!(out.transparent, Some(0));
        assert_eq!(out.pixels, [1, 0]);
    }

    #[test]
    fn black_and_white_without_alpha_is_one_bit() {
        let img = raster(&[BLACK, WHITE, WHITE]);
        let out = quantize(&img, &opts(PaletteFamily::Pebble2)).unwrap();
        assert!(out.greyscale);
        assert_eq!(out.bit_depth, BitDepth::One);
        assert_eq!(out.transparent, None);
        assert_eq!(out.pixels, [0, 1, 1]);
    }

    #[test]
    fn all_greys_with_transparency_use_fixed_sentinel() {
        let img = raster(&[
            BLACK,
            Rgba::grey(85),
            Rgba::grey(170),
            WHITE,
            Rgba::TRANSPARENT,
        ]);
        let out = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert!(out.greyscale);
        assert_eq!(out.bit_depth, BitDepth::Four);
        assert_eq!(out.transparent, Some(0xC));
        assert_eq!(out.pixels, [0, 5, 10, 15, 0xC]);
    }

    #[test]
    fn midtones_require_two_bits() {
        let img = raster(&[Rgba::grey(85), WHITE]);
        let analysis = analyze(&img, PaletteFamily::Pebble64, ReductionMethod::Nearest);
        // Two colors index in one bit, but dark grey needs two: palettize.
        assert!(!analysis.is_grey);
        assert_eq!(analysis.bit_depth, BitDepth::One);

        let out = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert!(!out.greyscale);
        assert_eq!(out.palette, Some(Palette::Rgb(vec![[85, 85, 85], [255, 255, 255]])));
    }

    #[test]
    fn four_greys_without_alpha_stay_greyscale() {
        let img = raster(&[BLACK, Rgba::grey(85), Rgba::grey(170), WHITE]);
        let out = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert!(out.greyscale);
        assert_eq!(out.bit_depth, BitDepth::Two);
        assert_eq!(out.pixels, [0, 1, 2, 3]);
    }

    #[test]
    fn partial_alpha_disables_greyscale_and_keeps_alpha_palette() {
        let img = raster(&[WHITE, Rgba::new(255, 255, 255, 170), Rgba::new(1, 2, 3, 0)]);
        let out = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert!(!out.greyscale);
        assert_eq!(
            out.palette,
            Some(Palette::Rgba(vec![
                [255, 255, 255, 255],
                [255, 255, 255, 170],
                [0, 0, 0, 0],
            ]))
        );
        assert_eq!(out.pixels, [0, 1, 2]);
        assert_eq!(out.bit_depth, BitDepth::Two);
    }

    #[test]
    fn forced_depth_below_minimum_is_rejected() {
        let mut colors: Vec<Rgba> = (0..4u8).map(|i| Rgba::new(i * 85, 0, 0, 255)).collect();
        colors.push(Rgba::new(0, 85, 0, 255));
        let img = raster(&colors);
        let options = ConvertOptions {
            bit_depth: Some(BitDepth::Two),
            ..ConvertOptions::default()
        };
        match quantize(&img, &options) {
            Err(ImageError::ForcedDepthTooLow { forced, required }) => {
                assert_eq!(forced, 2);
                assert_eq!(required, 4);
            }
            other => panic!("expected ForcedDepthTooLow, got {other:?}"),
        }
    }

    #[test]
    fn forcing_a_larger_depth_disables_greyscale() {
        let img = raster(&[BLACK, WHITE, Rgba::TRANSPARENT]);
        let options = ConvertOptions {
            bit_depth: Some(BitDepth::Eight),
            ..ConvertOptions::default()
        };
        let out = quantize(&img, &options).unwrap();
        assert!(!out.greyscale);
        assert_eq!(out.bit_depth, BitDepth::Eight);
        assert_eq!(out.transparent, None);
        assert_eq!(
            out.palette,
            Some(Palette::Rgba(vec![
                [0, 0, 0, 255],
                [255, 255, 255, 255],
                [0, 0, 0, 0],
            ]))
        );
    }

    #[test]
    fn forcing_the_derived_depth_keeps_greyscale() {
        let img = raster(&[BLACK, WHITE, Rgba::TRANSPARENT]);
        let options = ConvertOptions {
            bit_depth: Some(BitDepth::Two),
            ..ConvertOptions::default()
        };
        let out = quantize(&img, &options).unwrap();
        assert!(out.greyscale);
        assert_eq!(out.bit_depth, BitDepth::Two);
    }

    #[test]
    fn pebble2_truncate_transparent_white_is_not_grey() {
        let img = raster(&[WHITE, Rgba::new(255, 255, 255, 10)]);
        let options = ConvertOptions {
            palette: PaletteFamily::Pebble2,
            method: ReductionMethod::Truncate,
            bit_depth: None,
        };
        let out = quantize(&img, &options).unwrap();
        assert!(!out.greyscale);
        assert_eq!(
            out.palette,
            Some(Palette::Rgba(vec![[255, 255, 255, 255], [255, 255, 255, 0]]))
        );
    }

    #[test]
    fn quantize_is_idempotent() {
        let img = raster(&[BLACK, Rgba::new(12, 200, 99, 255), Rgba::TRANSPARENT]);
        let a = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        let b = quantize(&img, &opts(PaletteFamily::Pebble64)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn raster_size_is_checked() {
        assert!(RgbaRaster::new(2, 2, vec![BLACK; 3]).is_err());
        let ok = RgbaRaster::from_rgba8(1, 2, &[0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
        assert_eq!(ok.pixels, [BLACK, WHITE]);
    }
}
