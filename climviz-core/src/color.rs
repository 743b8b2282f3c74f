//! Colours, palettes and sequential colour scales.

use crate::dataset::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    /// Linear interpolation in RGB space, `t` clamped to `[0, 1]`
    pub fn mix(self, other: Rgb, t: FloatValue) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| {
            let (a, b) = (a as FloatValue, b as FloatValue);
            (a + (b - a) * t).round() as u8
        };
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Fill reserved for heatmap cells without data
pub const NO_DATA: Rgb = Rgb::hex(0xeeeeee);
/// Fill for map regions that have no matching dataset entry
pub const UNMATCHED: Rgb = Rgb::hex(0xcccccc);
pub const GRID: Rgb = Rgb::hex(0xe0e0e0);
pub const AXIS: Rgb = Rgb::hex(0x999999);
pub const TEXT: Rgb = Rgb::hex(0x2b2b2b);
pub const BLACK: Rgb = Rgb::hex(0x000000);
pub const WHITE: Rgb = Rgb::hex(0xffffff);

pub const GREENS_9: [Rgb; 9] = [
    Rgb::hex(0xf7fcf5),
    Rgb::hex(0xe5f5e0),
    Rgb::hex(0xc7e9c0),
    Rgb::hex(0xa1d99b),
    Rgb::hex(0x74c476),
    Rgb::hex(0x41ab5d),
    Rgb::hex(0x238b45),
    Rgb::hex(0x006d2c),
    Rgb::hex(0x00441b),
];

pub const YL_OR_RD_9: [Rgb; 9] = [
    Rgb::hex(0xffffcc),
    Rgb::hex(0xffeda0),
    Rgb::hex(0xfed976),
    Rgb::hex(0xfeb24c),
    Rgb::hex(0xfd8d3c),
    Rgb::hex(0xfc4e2a),
    Rgb::hex(0xe31a1c),
    Rgb::hex(0xbd0026),
    Rgb::hex(0x800026),
];

pub const VIRIDIS: [Rgb; 10] = [
    Rgb::hex(0x440154),
    Rgb::hex(0x482878),
    Rgb::hex(0x3e4989),
    Rgb::hex(0x31688e),
    Rgb::hex(0x26828e),
    Rgb::hex(0x1f9e89),
    Rgb::hex(0x35b779),
    Rgb::hex(0x6ece58),
    Rgb::hex(0xb5de2b),
    Rgb::hex(0xfde725),
];

pub const TABLEAU_10: [Rgb; 10] = [
    Rgb::hex(0x4e79a7),
    Rgb::hex(0xf28e2c),
    Rgb::hex(0xe15759),
    Rgb::hex(0x76b7b2),
    Rgb::hex(0x59a14f),
    Rgb::hex(0xedc949),
    Rgb::hex(0xaf7aa1),
    Rgb::hex(0xff9da7),
    Rgb::hex(0x9c755f),
    Rgb::hex(0xbab0ab),
];

pub const CATEGORY_10: [Rgb; 10] = [
    Rgb::hex(0x1f77b4),
    Rgb::hex(0xff7f0e),
    Rgb::hex(0x2ca02c),
    Rgb::hex(0xd62728),
    Rgb::hex(0x9467bd),
    Rgb::hex(0x8c564b),
    Rgb::hex(0xe377c2),
    Rgb::hex(0x7f7f7f),
    Rgb::hex(0xbcbd22),
    Rgb::hex(0x17becf),
];

/// Cycle through a categorical palette
pub fn ordinal(palette: &[Rgb], index: usize) -> Rgb {
    palette[index % palette.len()]
}

/// Maps a continuous domain onto evenly spaced colour stops
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialScale {
    domain: (FloatValue, FloatValue),
    stops: Vec<Rgb>,
}

impl SequentialScale {
    /// # Panics
    ///
    /// Panics if `stops` is empty.
    pub fn new(domain: (FloatValue, FloatValue), stops: &[Rgb]) -> Self {
        assert!(!stops.is_empty(), "A sequential scale needs at least one stop");
        Self {
            domain,
            stops: stops.to_vec(),
        }
    }

    pub fn domain(&self) -> (FloatValue, FloatValue) {
        self.domain
    }

    pub fn apply(&self, value: FloatValue) -> Rgb {
        let (d0, d1) = self.domain;
        let t = if d1 == d0 { 0.5 } else { (value - d0) / (d1 - d0) };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let segments = self.stops.len() - 1;
        if segments == 0 {
            return self.stops[0];
        }
        let position = t * segments as FloatValue;
        let index = (position.floor() as usize).min(segments - 1);
        self.stops[index].mix(self.stops[index + 1], position - index as FloatValue)
    }
}
