//! RGB pixels and gamma lookup tables

use serde::{Deserialize, Serialize};

/// A single 8-bit RGB pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// All channels off
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Create a new pixel
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack as `0x00RRGGBB`
    pub fn to_u32(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

/// Number of entries in a gamma table (one per 8-bit input level)
pub const GAMMA_TABLE_SIZE: usize = 256;

/// Per-channel gamma correction lookup tables
///
/// Tables are computed once at configuration time:
/// `out = round(255 * (in / 255) ^ gamma)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaTable {
    red: [u8; GAMMA_TABLE_SIZE],
    green: [u8; GAMMA_TABLE_SIZE],
    blue: [u8; GAMMA_TABLE_SIZE],
}

impl GammaTable {
    /// Build tables with a separate exponent per color channel
    pub fn new(gamma_red: f64, gamma_green: f64, gamma_blue: f64) -> Self {
        Self {
            red: build_table(gamma_red),
            green: build_table(gamma_green),
            blue: build_table(gamma_blue),
        }
    }

    /// Build tables with the same exponent for every channel
    pub fn uniform(gamma: f64) -> Self {
        let table = build_table(gamma);
        Self {
            red: table,
            green: table,
            blue: table,
        }
    }

    /// Correct one pixel
    #[inline]
    pub fn apply(&self, pixel: Rgb) -> Rgb {
        Rgb {
            r: self.red[pixel.r as usize],
            g: self.green[pixel.g as usize],
            b: self.blue[pixel.b as usize],
        }
    }
}

fn build_table(gamma: f64) -> [u8; GAMMA_TABLE_SIZE] {
    let mut table = [0u8; GAMMA_TABLE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
        let normalized = i as f64 / 255.0;
        *entry = (255.0 * normalized.powf(gamma)).round().clamp(0.0, 255.0) as u8;
    }
    table
}

/// Apply optional gamma correction
#[inline]
pub fn corrected(pixel: Rgb, gamma: Option<&GammaTable>) -> Rgb {
    match gamma {
        Some(table) => table.apply(pixel),
        None => pixel,
    }
}
