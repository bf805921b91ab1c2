//! LED chip wire encoders.
//!
//! Each chip family lays out RGB pixels in its own bit-exact wire format.
//! The family is a closed set chosen at configuration time (or switched by
//! the strip-type listener); [`ChipEncoder`] dispatches on it and applies the
//! optional gamma pass before the chip specific layout is built.

pub mod lpd8806;
pub mod p9813;
pub mod sk9822;
pub mod ws281x;

use serde::{Deserialize, Serialize};

use crate::color::{corrected, GammaTable, Rgb};
use crate::error::CoreError;

/// LED chip family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChipType {
    /// Single-wire timed protocol (WS2811/WS2812/WS2813)
    #[default]
    Ws281x,
    /// SPI clocked, 4 byte records with brightness (SK9822/APA102)
    Sk9822,
    /// SPI clocked, 4 byte records with checksum flag
    P9813,
    /// SPI clocked, 7 bit color with latch
    Lpd8806,
}

impl ChipType {
    /// All chip families
    pub const ALL: [ChipType; 4] = [
        ChipType::Ws281x,
        ChipType::Sk9822,
        ChipType::P9813,
        ChipType::Lpd8806,
    ];

    /// Returns the canonical chip name
    pub fn name(&self) -> &'static str {
        match self {
            ChipType::Ws281x => "WS281X",
            ChipType::Sk9822 => "SK9822",
            ChipType::P9813 => "P9813",
            ChipType::Lpd8806 => "LPD8806",
        }
    }

    /// Look up a chip family by name.
    ///
    /// Case insensitive; `APA102` is accepted as an alias for SK9822 and
    /// trailing NUL or whitespace bytes are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        match name.to_ascii_uppercase().as_str() {
            "WS281X" | "WS2811" | "WS2812" | "WS2813" => Some(ChipType::Ws281x),
            "SK9822" | "APA102" => Some(ChipType::Sk9822),
            "P9813" => Some(ChipType::P9813),
            "LPD8806" => Some(ChipType::Lpd8806),
            _ => None,
        }
    }

    /// Returns true if the chip is driven over SPI
    pub fn is_spi(&self) -> bool {
        !matches!(self, ChipType::Ws281x)
    }

    /// Compact tag for atomic storage
    pub fn to_u8(self) -> u8 {
        match self {
            ChipType::Ws281x => 0,
            ChipType::Sk9822 => 1,
            ChipType::P9813 => 2,
            ChipType::Lpd8806 => 3,
        }
    }

    /// Inverse of [`ChipType::to_u8`]
    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }
}

impl std::fmt::Display for ChipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ChipType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CoreError::UnknownChip(s.to_string()))
    }
}

impl TryFrom<String> for ChipType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChipType> for String {
    fn from(chip: ChipType) -> Self {
        chip.name().to_string()
    }
}

/// Encoded wire data for one output channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChipWireBuffer {
    /// Packed `0x00RRGGBB` words for the single-wire driver
    Words(Vec<u32>),
    /// Raw SPI byte stream
    Bytes(Vec<u8>),
}

impl Default for ChipWireBuffer {
    fn default() -> Self {
        ChipWireBuffer::Bytes(Vec::new())
    }
}

impl ChipWireBuffer {
    /// Word view, empty for SPI buffers
    pub fn words(&self) -> &[u32] {
        match self {
            ChipWireBuffer::Words(words) => words,
            ChipWireBuffer::Bytes(_) => &[],
        }
    }

    /// Byte view, empty for single-wire buffers
    pub fn bytes(&self) -> &[u8] {
        match self {
            ChipWireBuffer::Bytes(bytes) => bytes,
            ChipWireBuffer::Words(_) => &[],
        }
    }

    /// Number of wire units (words or bytes)
    pub fn len(&self) -> usize {
        match self {
            ChipWireBuffer::Words(words) => words.len(),
            ChipWireBuffer::Bytes(bytes) => bytes.len(),
        }
    }

    /// Check if nothing is encoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn words_mut(&mut self) -> &mut Vec<u32> {
        if !matches!(self, ChipWireBuffer::Words(_)) {
            *self = ChipWireBuffer::Words(Vec::new());
        }
        match self {
            ChipWireBuffer::Words(words) => words,
            ChipWireBuffer::Bytes(_) => unreachable!(),
        }
    }

    fn bytes_mut(&mut self) -> &mut Vec<u8> {
        if !matches!(self, ChipWireBuffer::Bytes(_)) {
            *self = ChipWireBuffer::Bytes(Vec::new());
        }
        match self {
            ChipWireBuffer::Bytes(bytes) => bytes,
            ChipWireBuffer::Words(_) => unreachable!(),
        }
    }
}

/// Chip encoder with optional gamma correction
#[derive(Debug, Clone)]
pub struct ChipEncoder {
    chip: ChipType,
    gamma: Option<GammaTable>,
}

impl ChipEncoder {
    /// Create an encoder for a chip family
    pub fn new(chip: ChipType, gamma: Option<GammaTable>) -> Self {
        Self { chip, gamma }
    }

    /// Current chip family
    pub fn chip(&self) -> ChipType {
        self.chip
    }

    /// Switch chip family, keeping the gamma tables
    pub fn set_chip(&mut self, chip: ChipType) {
        self.chip = chip;
    }

    /// Size of the wire buffer for `leds` LEDs, in wire units
    pub fn wire_len(&self, leds: usize) -> usize {
        match self.chip {
            ChipType::Ws281x => leds,
            ChipType::Sk9822 => sk9822::wire_len(leds),
            ChipType::P9813 => p9813::wire_len(leds),
            ChipType::Lpd8806 => lpd8806::wire_len(leds),
        }
    }

    /// Encode `pixels` into `out`, reusing its allocation
    pub fn encode(&self, pixels: &[Rgb], out: &mut ChipWireBuffer) {
        let gamma = self.gamma.as_ref();
        let pixels = pixels.iter().map(|&p| corrected(p, gamma));
        match self.chip {
            ChipType::Ws281x => ws281x::encode(pixels, out.words_mut()),
            ChipType::Sk9822 => sk9822::encode(pixels, out.bytes_mut()),
            ChipType::P9813 => p9813::encode(pixels, out.bytes_mut()),
            ChipType::Lpd8806 => lpd8806::encode(pixels, out.bytes_mut()),
        }
    }
}
