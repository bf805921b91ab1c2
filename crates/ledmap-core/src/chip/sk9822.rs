//! SK9822 / APA102 encoding
//!
//! `[0x00 x4] [0xFF B G R] per LED [0xFF x4]`

use crate::color::Rgb;

const START_FRAME: [u8; 4] = [0x00; 4];
const END_FRAME: [u8; 4] = [0xFF; 4];
/// Global brightness byte: 3 marker bits plus full 5 bit brightness
const LED_HEADER: u8 = 0xFF;

/// Wire size in bytes for `leds` LEDs
pub fn wire_len(leds: usize) -> usize {
    (leds + 2) * 4
}

/// Encode pixels with start and end frames
pub fn encode<I>(pixels: I, out: &mut Vec<u8>)
where
    I: IntoIterator<Item = Rgb>,
{
    out.clear();
    out.extend_from_slice(&START_FRAME);
    for p in pixels {
        out.extend_from_slice(&[LED_HEADER, p.b, p.g, p.r]);
    }
    out.extend_from_slice(&END_FRAME);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_shape() {
        for k in [0usize, 1, 7, 1020] {
            let mut out = Vec::new();
            encode(std::iter::repeat(Rgb::new(1, 2, 3)).take(k), &mut out);
            assert_eq!(out.len(), wire_len(k));
            assert_eq!(&out[..4], &[0, 0, 0, 0]);
            assert_eq!(&out[out.len() - 4..], &[0xFF; 4]);
        }
    }

    #[test]
    fn test_record_layout() {
        let mut out = Vec::new();
        encode([Rgb::new(0x11, 0x22, 0x33)], &mut out);
        assert_eq!(&out[4..8], &[0xFF, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_start_frame_rewritten() {
        let mut out = vec![0xAB; 64];
        encode([Rgb::BLACK], &mut out);
        assert_eq!(out, vec![0, 0, 0, 0, 0xFF, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
