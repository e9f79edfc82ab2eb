//! Hex codec and RGB metrics.
//!
//! Colors are plain 8-bit sRGB triples ([`Rgb`]). Every hex string produced
//! here is lowercase `#rrggbb`; parsing accepts either case, with or without
//! the leading `#`.

use palette::Srgb;

use crate::error::{Error, Result};

/// An 8-bit sRGB color.
pub type Rgb = Srgb<u8>;

/// Format a color as a 7-character lowercase `#rrggbb` string.
pub fn to_hex(color: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

/// Parse `#rrggbb` or `rrggbb` (either case) into a color.
pub fn from_hex(s: &str) -> Result<Rgb> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidColorFormat(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColorFormat(s.to_string()))
    };
    Ok(Srgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Build a color from fractional channels, rounding to nearest and clamping to `[0, 255]`.
pub fn from_f64(r: f64, g: f64, b: f64) -> Rgb {
    let clamp = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Srgb::new(clamp(r), clamp(g), clamp(b))
}

/// Euclidean distance in RGB space, in `[0, ~441.67]`.
#[inline]
pub fn distance(a: Rgb, b: Rgb) -> f64 {
    (squared_distance(a, b) as f64).sqrt()
}

/// Squared Euclidean distance; orders exactly like [`distance`] without the root.
#[inline]
pub fn squared_distance(a: Rgb, b: Rgb) -> u32 {
    let dr = a.red as i32 - b.red as i32;
    let dg = a.green as i32 - b.green as i32;
    let db = a.blue as i32 - b.blue as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Per-channel tolerance gate: every channel differs by at most `tolerance` (inclusive).
#[inline]
pub fn matches(a: Rgb, b: Rgb, tolerance: u8) -> bool {
    let within = |x: u8, y: u8| x.abs_diff(y) <= tolerance;
    within(a.red, b.red) && within(a.green, b.green) && within(a.blue, b.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(to_hex(Srgb::new(255, 0, 10)), "#ff000a");
        assert_eq!(to_hex(Srgb::new(0, 0, 0)), "#000000");
    }

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(from_hex("#FF8800").unwrap(), Srgb::new(255, 136, 0));
        assert_eq!(from_hex("ff8800").unwrap(), Srgb::new(255, 136, 0));
    }

    #[test]
    fn rejects_malformed_hex() {
        for bad in ["", "#", "#fff", "#ff00001", "#gg0000", "##ff0000", "ff 000"] {
            assert!(
                matches!(from_hex(bad), Err(Error::InvalidColorFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn hex_round_trips_every_channel_value() {
        for v in 0..=255u8 {
            let c = Srgb::new(v, 255 - v, v / 2);
            assert_eq!(from_hex(&to_hex(c)).unwrap(), c);
        }
    }

    #[test]
    fn fractional_channels_round_and_clamp() {
        assert_eq!(from_f64(12.5, 300.0, -4.0), Srgb::new(13, 255, 0));
        assert_eq!(from_f64(0.49, 254.6, 7.0), Srgb::new(0, 255, 7));
    }

    #[test]
    fn distance_is_euclidean_and_symmetric() {
        let a = Srgb::new(0, 0, 0);
        let b = Srgb::new(3, 4, 0);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(distance(b, a), 5.0);
        assert_eq!(distance(a, a), 0.0);
        let max = distance(Srgb::new(0, 0, 0), Srgb::new(255, 255, 255));
        assert!((max - 441.673).abs() < 1e-3);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let grey = Srgb::new(100, 100, 100);
        assert!(matches(grey, Srgb::new(115, 115, 115), 15));
        assert!(!matches(grey, Srgb::new(116, 116, 116), 15));
        assert!(!matches(grey, Srgb::new(100, 100, 116), 15));
        assert!(matches(Srgb::new(115, 85, 100), grey, 15));
    }

    #[test]
    fn zero_tolerance_is_equality() {
        let a = Srgb::new(1, 2, 3);
        assert!(matches(a, a, 0));
        assert!(!matches(a, Srgb::new(1, 2, 4), 0));
    }
}
