//! Frequency histogram over the opaque pixels of a buffer.

use std::collections::HashMap;

use palette::Srgb;

use crate::color::{self, Rgb};
use crate::pixels::{PixelBuffer, is_transparent};

/// An observed color with its pixel count and share of the opaque pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorEntry {
    pub color: Rgb,
    pub count: u64,
    pub percentage: f64,
}

impl ColorEntry {
    pub fn hex(&self) -> String {
        color::to_hex(self.color)
    }
}

/// Result of one histogram pass, entries sorted by count descending.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorAnalysis {
    pub entries: Vec<ColorEntry>,
    pub total_opaque: u64,
}

impl ColorAnalysis {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn colors(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.entries.iter().map(|e| e.color)
    }

    pub fn position(&self, color: Rgb) -> Option<usize> {
        self.entries.iter().position(|e| e.color == color)
    }
}

#[inline]
fn pack(px: [u8; 4]) -> u32 {
    (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32
}

#[inline]
fn unpack(key: u32) -> Rgb {
    Srgb::new((key >> 16) as u8, (key >> 8) as u8, key as u8)
}

fn count_slice(bytes: &[u8], table: &mut HashMap<u32, u64>) {
    for px in bytes.chunks_exact(4) {
        let px = [px[0], px[1], px[2], px[3]];
        if is_transparent(px) {
            continue;
        }
        *table.entry(pack(px)).or_insert(0) += 1;
    }
}

#[cfg(not(feature = "rayon"))]
fn count_colors(buffer: &PixelBuffer) -> HashMap<u32, u64> {
    let mut table = HashMap::new();
    count_slice(buffer.data(), &mut table);
    table
}

#[cfg(feature = "rayon")]
fn count_colors(buffer: &PixelBuffer) -> HashMap<u32, u64> {
    use rayon::prelude::*;

    let row = (buffer.width() as usize * 4).max(4);
    buffer
        .data()
        .par_chunks(row)
        .fold(HashMap::new, |mut table, bytes| {
            count_slice(bytes, &mut table);
            table
        })
        .reduce(HashMap::new, |mut a, b| {
            for (key, n) in b {
                *a.entry(key).or_insert(0) += n;
            }
            a
        })
}

/// Count every opaque color in `buffer`.
///
/// Pixels with alpha below the transparency threshold are left out of both the
/// counts and the percentage denominator. Ties in count are ordered by
/// ascending color value so repeated runs agree.
pub fn analyze(buffer: &PixelBuffer) -> ColorAnalysis {
    let table = count_colors(buffer);
    let total_opaque: u64 = table.values().sum();

    let mut keyed: Vec<(u32, u64)> = table.into_iter().collect();
    keyed.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let entries: Vec<ColorEntry> = keyed
        .into_iter()
        .map(|(key, count)| ColorEntry {
            color: unpack(key),
            count,
            percentage: if total_opaque > 0 {
                count as f64 / total_opaque as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    tracing::debug!(
        colors = entries.len(),
        opaque = total_opaque,
        pixels = buffer.pixel_count(),
        "analyzed pixel buffer"
    );

    ColorAnalysis {
        entries,
        total_opaque,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(pixels: &[[u8; 4]], width: u32) -> PixelBuffer {
        let height = pixels.len() as u32 / width;
        PixelBuffer::new(width, height, pixels.concat()).unwrap()
    }

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: [u8; 4] = [255, 0, 0, 5];

    #[test]
    fn single_color_buffer() {
        let analysis = analyze(&buffer(&[RED; 4], 2));
        assert_eq!(analysis.total_opaque, 4);
        assert_eq!(analysis.len(), 1);
        assert_eq!(analysis.entries[0].hex(), "#ff0000");
        assert_eq!(analysis.entries[0].count, 4);
        assert_eq!(analysis.entries[0].percentage, 100.0);
    }

    #[test]
    fn transparent_pixels_leave_the_denominator() {
        let analysis = analyze(&buffer(&[RED, RED, CLEAR, CLEAR], 2));
        assert_eq!(analysis.total_opaque, 2);
        assert_eq!(analysis.len(), 1);
        assert_eq!(analysis.entries[0].count, 2);
        assert_eq!(analysis.entries[0].percentage, 100.0);
    }

    #[test]
    fn alpha_at_threshold_counts_as_opaque() {
        let analysis = analyze(&buffer(&[[1, 2, 3, 10], [1, 2, 3, 9]], 2));
        assert_eq!(analysis.total_opaque, 1);
    }

    #[test]
    fn alpha_is_ignored_when_keying() {
        let analysis = analyze(&buffer(&[[9, 9, 9, 255], [9, 9, 9, 40]], 2));
        assert_eq!(analysis.len(), 1);
        assert_eq!(analysis.entries[0].count, 2);
    }

    #[test]
    fn all_transparent_yields_empty_analysis() {
        let analysis = analyze(&buffer(&[CLEAR; 4], 2));
        assert!(analysis.is_empty());
        assert_eq!(analysis.total_opaque, 0);
        assert!(analyze(&PixelBuffer::transparent(0, 0).unwrap()).is_empty());
    }

    #[test]
    fn sorted_by_count_and_sums_to_total() {
        let pixels = [BLUE, RED, BLUE, [0, 255, 0, 255], BLUE, RED];
        let analysis = analyze(&buffer(&pixels, 3));
        let counts: Vec<u64> = analysis.entries.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![3, 2, 1]);
        assert_eq!(analysis.entries[0].hex(), "#0000ff");
        assert_eq!(counts.iter().sum::<u64>(), analysis.total_opaque);
        let pct: f64 = analysis.entries.iter().map(|e| e.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ties_order_by_color_value() {
        let analysis = analyze(&buffer(&[RED, BLUE], 2));
        assert_eq!(analysis.entries[0].hex(), "#0000ff");
        assert_eq!(analysis.entries[1].hex(), "#ff0000");
    }
}
