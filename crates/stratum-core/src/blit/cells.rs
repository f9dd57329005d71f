//! Cell-sized glyph blitting: colour quantization and block-element tables.

use crate::blend::distance_sq;

/// Quadrant glyphs indexed by mask (bit 0 upper-left, 1 upper-right,
/// 2 lower-left, 3 lower-right).
pub(crate) const QUADRANTS: [char; 16] = [
    ' ', '▘', '▝', '▀', '▖', '▌', '▞', '▛', '▗', '▚', '▐', '▜', '▄', '▙', '▟', '█',
];

/// Half-block glyphs indexed by mask (bit 0 top, bit 1 bottom).
pub(crate) const HALVES: [char; 4] = [' ', '▀', '▄', '█'];

/// Sextant glyph for a mask (bits row-major from top-left, two per row).
///
/// The left and right halves and the full block predate the sextant range
/// and are skipped by it.
pub(crate) const fn sextant(mask: u8) -> char {
    match mask & 0x3f {
        0 => ' ',
        21 => '▌',
        42 => '▐',
        63 => '█',
        m => {
            let m = m as u32;
            let offset = m - 1 - (m > 21) as u32 - (m > 42) as u32;
            match char::from_u32(0x1FB00 + offset) {
                Some(c) => c,
                None => ' ',
            }
        }
    }
}

/// Two-colour approximation of one cell's samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Quantized {
    /// Sample positions drawn in the foreground colour.
    pub mask: u8,
    pub fg: u32,
    /// `None` when the background must stay transparent.
    pub bg: Option<u32>,
}

/// Most frequent colour; ties go to the earliest sample.
fn majority(colors: &[u32]) -> u32 {
    let mut best = colors[0];
    let mut best_count = 0;
    for &c in colors {
        let count = colors.iter().filter(|&&o| o == c).count();
        if count > best_count {
            best = c;
            best_count = count;
        }
    }
    best
}

/// Reduce up to eight samples (`None` = transparent) to a mask and two colours.
///
/// Returns `None` when every sample is transparent.
pub(crate) fn quantize(samples: &[Option<u32>]) -> Option<Quantized> {
    let mut opaque = [0u32; 8];
    let mut n = 0;
    let mut opaque_mask = 0u8;
    for (i, s) in samples.iter().enumerate() {
        if let Some(rgb) = *s {
            opaque[n] = rgb;
            n += 1;
            opaque_mask |= 1 << i;
        }
    }
    if n == 0 {
        return None;
    }
    let opaque = &opaque[..n];
    let a = majority(opaque);

    if n < samples.len() {
        return Some(Quantized {
            mask: opaque_mask,
            fg: a,
            bg: None,
        });
    }

    let b = opaque
        .iter()
        .copied()
        .max_by_key(|&c| distance_sq(c, a))
        .unwrap_or(a);
    let full = ((1u16 << samples.len()) - 1) as u8;
    if b == a {
        return Some(Quantized {
            mask: full,
            fg: a,
            bg: Some(a),
        });
    }

    let mut mask = 0u8;
    for (i, &c) in opaque.iter().enumerate() {
        if distance_sq(c, b) < distance_sq(c, a) {
            mask |= 1 << i;
        }
    }
    Some(Quantized {
        mask,
        fg: b,
        bg: Some(a),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sextant_table() {
        assert_eq!(sextant(0), ' ');
        assert_eq!(sextant(1), '\u{1FB00}');
        assert_eq!(sextant(20), '\u{1FB13}');
        assert_eq!(sextant(21), '▌');
        assert_eq!(sextant(22), '\u{1FB14}');
        assert_eq!(sextant(42), '▐');
        assert_eq!(sextant(62), '\u{1FB3B}');
        assert_eq!(sextant(63), '█');
    }

    #[test]
    fn test_quadrant_table_shape() {
        assert_eq!(QUADRANTS[0b0011], '▀');
        assert_eq!(QUADRANTS[0b1100], '▄');
        assert_eq!(QUADRANTS[0b0101], '▌');
        assert_eq!(QUADRANTS[0b1010], '▐');
    }

    #[test]
    fn test_quantize_uniform() {
        let q = quantize(&[Some(0xff0000); 4]).unwrap();
        assert_eq!(q.mask, 0b1111);
        assert_eq!(q.fg, 0xff0000);
        assert_eq!(q.bg, Some(0xff0000));
    }

    #[test]
    fn test_quantize_two_colours() {
        let q = quantize(&[Some(0), Some(0), Some(0xffffff), Some(0)]).unwrap();
        assert_eq!(q.bg, Some(0));
        assert_eq!(q.fg, 0xffffff);
        assert_eq!(q.mask, 0b0100);
    }

    #[test]
    fn test_quantize_nearest_group() {
        let q = quantize(&[Some(0x000000), Some(0x101010), Some(0xf0f0f0), Some(0xffffff)]).unwrap();
        assert_eq!(q.bg, Some(0x000000));
        assert_eq!(q.fg, 0xffffff);
        assert_eq!(q.mask, 0b1100);
    }

    #[test]
    fn test_quantize_transparent() {
        assert_eq!(quantize(&[None, None]), None);
        let q = quantize(&[None, Some(0x00ff00), Some(0x00ff00), None]).unwrap();
        assert_eq!(q.mask, 0b0110);
        assert_eq!(q.fg, 0x00ff00);
        assert_eq!(q.bg, None);
    }
}
