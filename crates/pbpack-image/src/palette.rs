//! Device palette families and per-pixel color reduction.
//!
//! `pebble64` is the 64-color palette of color watches: 2 bits each for red,
//! green and blue. `pebble2` is the black-and-white palette of the older
//! models. Both reduce alpha along with color.

use crate::ImageError;
use std::fmt;
use std::str::FromStr;

/// One 8-bit-per-channel pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn grey(level: u8) -> Self {
        Self::new(level, level, level, 255)
    }

    pub fn is_opaque_grey(self) -> bool {
        self.r == self.g && self.g == self.b && self.a == 255
    }

    pub fn rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PaletteFamily {
    #[default]
    Pebble64,
    Pebble2,
}

impl PaletteFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pebble64 => "pebble64",
            Self::Pebble2 => "pebble2",
        }
    }
}

impl fmt::Display for PaletteFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaletteFamily {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pebble64" => Ok(Self::Pebble64),
            "pebble2" => Ok(Self::Pebble2),
            other => Err(ImageError::UnknownPalette(other.to_owned())),
        }
    }
}

/// How a channel value is mapped onto the device levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReductionMethod {
    /// Round to the closest level.
    #[default]
    Nearest,
    /// Round down to the next lower level.
    Truncate,
}

impl ReductionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Truncate => "truncate",
        }
    }
}

impl fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReductionMethod {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearest" => Ok(Self::Nearest),
            "truncate" => Ok(Self::Truncate),
            other => Err(ImageError::UnknownMethod(other.to_owned())),
        }
    }
}

/// Per-pixel reduction for a palette family and method.
pub fn reduction_fn(family: PaletteFamily, method: ReductionMethod) -> fn(Rgba) -> Rgba {
    match (family, method) {
        (PaletteFamily::Pebble64, ReductionMethod::Nearest) => nearest_pebble64,
        (PaletteFamily::Pebble64, ReductionMethod::Truncate) => truncate_pebble64,
        (PaletteFamily::Pebble2, ReductionMethod::Nearest) => nearest_pebble2,
        (PaletteFamily::Pebble2, ReductionMethod::Truncate) => truncate_pebble2,
    }
}

#[inline]
fn nearest_level(v: u8) -> u8 {
    ((u16::from(v) + 42) / 85 * 85) as u8
}

#[inline]
fn truncate_level(v: u8) -> u8 {
    v / 85 * 85
}

fn nearest_pebble64(px: Rgba) -> Rgba {
    let a = nearest_level(px.a);
    // Fully transparent pixels collapse to black.
    if a == 0 {
        return Rgba::TRANSPARENT;
    }
    Rgba::new(nearest_level(px.r), nearest_level(px.g), nearest_level(px.b), a)
}

fn truncate_pebble64(px: Rgba) -> Rgba {
    let a = truncate_level(px.a);
    if a == 0 {
        return Rgba::TRANSPARENT;
    }
    Rgba::new(truncate_level(px.r), truncate_level(px.g), truncate_level(px.b), a)
}

#[inline]
fn round_to_1_bit(value: f64) -> u8 {
    if value > 255.0 / 2.0 {
        255
    } else {
        0
    }
}

fn nearest_pebble2(px: Rgba) -> Rgba {
    // BT.709 weights, except blue which has always been 0.11 here.
    let luma = (f64::from(px.r) * 0.2126 + f64::from(px.g) * 0.7152 + f64::from(px.b) * 0.11)
        .trunc();
    let level = round_to_1_bit(luma);
    Rgba::new(level, level, level, round_to_1_bit(f64::from(px.a)))
}

fn truncate_pebble2(px: Rgba) -> Rgba {
    let a = if px.a == 255 { 255 } else { 0 };
    if px.r == 255 && px.g == 255 && px.b == 255 {
        Rgba::new(255, 255, 255, a)
    } else {
        Rgba::new(0, 0, 0, a)
    }
}

/// Bit depths representable in both PNG and the watch's bitmap format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BitDepth {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
}

impl BitDepth {
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Smallest depth able to index `colors` palette entries.
    ///
    /// `ceil(log2(colors))`, with 0 raised to 1, 3 raised to 4 and anything
    /// above 4 raised to 8.
    pub fn for_colors(colors: usize) -> Self {
        match colors {
            0..=2 => Self::One,
            3..=4 => Self::Two,
            5..=16 => Self::Four,
            _ => Self::Eight,
        }
    }

    /// Shift a full 8-bit grey level down to this depth.
    pub fn scale(self, level: u8) -> u8 {
        level >> (8 - self.bits())
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = ImageError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            other => Err(ImageError::InvalidBitDepth(other)),
        }
    }
}

impl FromStr for BitDepth {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits: u8 = s
            .trim()
            .parse()
            .map_err(|_| ImageError::InvalidBitDepth(0))?;
        Self::try_from(bits)
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(family: PaletteFamily, method: ReductionMethod, px: Rgba) -> Rgba {
        reduction_fn(family, method)(px)
    }

    #[test]
    fn pebble64_nearest_rounds_each_channel() {
        let f = reduction_fn(PaletteFamily::Pebble64, ReductionMethod::Nearest);
        assert_eq!(f(Rgba::new(42, 43, 127, 255)), Rgba::new(0, 85, 85, 255));
        assert_eq!(f(Rgba::new(128, 212, 213, 255)), Rgba::new(170, 170, 255, 255));
        assert_eq!(f(Rgba::new(10, 20, 30, 200)), Rgba::new(0, 0, 0, 170));
    }

    #[test]
    fn pebble64_zero_alpha_forces_black() {
        for method in [ReductionMethod::Nearest, ReductionMethod::Truncate] {
            let out = reduce(PaletteFamily::Pebble64, method, Rgba::new(255, 200, 100, 20));
            assert_eq!(out, Rgba::TRANSPARENT, "{method}");
        }
    }

    #[test]
    fn pebble64_truncate_floors() {
        let f = reduction_fn(PaletteFamily::Pebble64, ReductionMethod::Truncate);
        assert_eq!(f(Rgba::new(84, 85, 254, 255)), Rgba::new(0, 85, 170, 255));
        assert_eq!(f(Rgba::new(255, 169, 170, 254)), Rgba::new(255, 85, 170, 170));
    }

    #[test]
    fn pebble2_nearest_uses_luma_threshold() {
        let f = reduction_fn(PaletteFamily::Pebble2, ReductionMethod::Nearest);
        // 0.7152 * 179 = 128.02 -> white; 0.7152 * 178 = 127.3 -> black.
        assert_eq!(f(Rgba::new(0, 179, 0, 255)), Rgba::grey(255));
        assert_eq!(f(Rgba::new(0, 178, 0, 255)), Rgba::grey(0));
        // Blue alone never reaches the threshold.
        assert_eq!(f(Rgba::new(0, 0, 255, 255)), Rgba::grey(0));
        assert_eq!(f(Rgba::new(255, 255, 255, 127)), Rgba::new(255, 255, 255, 0));
        assert_eq!(f(Rgba::new(255, 255, 255, 128)), Rgba::grey(255));
    }

    #[test]
    fn pebble2_truncate_only_keeps_pure_white() {
        let f = reduction_fn(PaletteFamily::Pebble2, ReductionMethod::Truncate);
        assert_eq!(f(Rgba::new(255, 255, 255, 255)), Rgba::grey(255));
        assert_eq!(f(Rgba::new(255, 255, 254, 255)), Rgba::grey(0));
        assert_eq!(f(Rgba::new(255, 255, 255, 254)), Rgba::new(255, 255, 255, 0));
        assert_eq!(f(Rgba::new(9, 9, 9, 100)), Rgba::new(0, 0, 0, 0));
    }

    #[test]
    fn bit_depth_for_palette_size() {
        let depths: Vec<u8> = [1, 2, 3, 4, 5, 8, 9, 16, 17, 64]
            .iter()
            .map(|n| BitDepth::for_colors(*n).bits())
            .collect();
        assert_eq!(depths, [1, 1, 2, 2, 4, 4, 4, 4, 8, 8]);
    }

    #[test]
    fn bit_depth_parsing() {
        assert_eq!("4".parse::<BitDepth>().unwrap(), BitDepth::Four);
        assert!(matches!(
            BitDepth::try_from(3),
            Err(ImageError::InvalidBitDepth(3))
        ));
        assert!("x".parse::<BitDepth>().is_err());
    }

    #[test]
    fn scale_shifts_to_depth() {
        assert_eq!(BitDepth::One.scale(255), 1);
        assert_eq!(BitDepth::Two.scale(170), 2);
        assert_eq!(BitDepth::Four.scale(85), 5);
        assert_eq!(BitDepth::Eight.scale(170), 170);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for family in [PaletteFamily::Pebble64, PaletteFamily::Pebble2] {
            assert_eq!(family.as_str().parse::<PaletteFamily>().unwrap(), family);
        }
        assert!("pebble16".parse::<PaletteFamily>().is_err());
        assert_eq!(
            "truncate".parse::<ReductionMethod>().unwrap(),
            ReductionMethod::Truncate
        );
        assert!("dither".parse::<ReductionMethod>().is_err());
    }
}
