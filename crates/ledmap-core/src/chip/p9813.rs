//! P9813 encoding
//!
//! Two zero records open the stream, then per LED a flag byte followed by
//! B, G, R. There is no end frame. The flag carries the inverted top two bits
//! of each color as a checksum.

use crate::color::Rgb;

const START_FRAME: [u8; 8] = [0x00; 8];

/// Wire size in bytes for `leds` LEDs
pub fn wire_len(leds: usize) -> usize {
    (leds + 2) * 4
}

/// Checksum flag byte for one pixel
#[inline]
pub fn flag(p: Rgb) -> u8 {
    0xC0 | ((!p.b & 0xC0) >> 2) | ((!p.g & 0xC0) >> 4) | ((!p.r & 0xC0) >> 6)
}

/// Encode pixels after the two-record start frame
pub fn encode<I>(pixels: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = Rgb>,
{
    out.clear();
    out.extend_from_slice(&START_FRAME);
    for p in pixels {
        out.extend_from_slice(&[flag(p), p.b, p.g, p.r]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_extremes() {
        assert_eq!(flag(Rgb::BLACK), 0xFF);
        assert_eq!(flag(Rgb::new(255, 255, 255)), 0xC0);
    }

    #[test]
    fn test_flag_per_channel() {
        // Only red set: red bits cleared, blue and green bits set
        assert_eq!(flag(Rgb::new(0xFF, 0, 0)), 0xFC);
        assert_eq!(flag(Rgb::new(0, 0, 0xFF)), 0xCF);
        assert_eq!(flag(Rgb::new(0x40, 0x80, 0)), 0xC0 | 0x30 | 0x04 | 0x02);
    }

    #[test]
    fn test_layout() {
        let mut out = Vec::new();
        encode([Rgb::new(0x11, 0x22, 0x33), Rgb::BLACK], &mut out);
        assert_eq!(out.len(), wire_len(2));
        assert_eq!(&out[..8], &[0; 8]);
        assert_eq!(&out[8..12], &[flag(Rgb::new(0x11, 0x22, 0x33)), 0x33, 0x22, 0x11]);
        assert_eq!(&out[12..], &[0xFF, 0, 0, 0]);
    }

    #[test]
    fn test_first_pixel_after_two_zero_records() {
        let p = Rgb::new(0x11, 0x22, 0x33);
        let mut out = Vec::new();
        encode([p], &mut out);
        assert_eq!(out, vec![0, 0, 0, 0, 0, 0, 0, 0, flag(p), 0x33, 0x22, 0x11]);
    }
}
