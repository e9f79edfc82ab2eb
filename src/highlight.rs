//! "Spotlight" overlay that keeps a set of colors at full strength and dims the rest.

use crate::color::{self, Rgb};
use crate::config::DIM_FACTOR;
use crate::histogram::ColorEntry;
use crate::pixels::{PixelBuffer, is_transparent, rgb_of};

/// Which colors a highlight keeps visible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HighlightMode {
    /// Only this color.
    SingleColor(Rgb),
    /// Every analysed color up to and including this index.
    CumulativePrefix(usize),
}

impl HighlightMode {
    /// Resolve the mode against an analysis into the concrete visible set.
    ///
    /// A prefix index past the end covers the whole list.
    pub fn visible_set(&self, colors: &[ColorEntry]) -> Vec<Rgb> {
        match *self {
            HighlightMode::SingleColor(c) => vec![c],
            HighlightMode::CumulativePrefix(index) => colors
                .iter()
                .take(index.saturating_add(1))
                .map(|e| e.color)
                .collect(),
        }
    }

    /// Number of colors the mode shows against a list of `total` colors.
    pub fn visible_count(&self, total: usize) -> usize {
        match *self {
            HighlightMode::SingleColor(_) => 1,
            HighlightMode::CumulativePrefix(index) => index.saturating_add(1).min(total),
        }
    }

    /// True when the mode shows every color, so no overlay is needed.
    pub fn covers_all(&self, total: usize) -> bool {
        matches!(*self, HighlightMode::CumulativePrefix(index) if index.saturating_add(1) >= total)
    }
}

#[inline]
fn dim(v: u8) -> u8 {
    (v as f32 * DIM_FACTOR).round() as u8
}

#[inline]
fn shade(px: [u8; 4], visible: &[Rgb], tolerance: u8) -> [u8; 4] {
    if is_transparent(px) {
        return [0, 0, 0, 0];
    }
    let rgb = rgb_of(px);
    if visible.iter().any(|v| color::matches(rgb, *v, tolerance)) {
        [px[0], px[1], px[2], 255]
    } else {
        [dim(px[0]), dim(px[1]), dim(px[2]), 255]
    }
}

/// Build an overlay the size of `source`.
///
/// Transparent source pixels become fully transparent. Opaque pixels that match
/// any visible color within `tolerance` keep their color; the rest are dimmed.
/// Both are written fully opaque.
#[cfg(not(feature = "rayon"))]
pub fn compose(source: &PixelBuffer, visible: &[Rgb], tolerance: u8) -> PixelBuffer {
    source.map_pixels(|px| shade(px, visible, tolerance))
}

#[cfg(feature = "rayon")]
pub fn compose(source: &PixelBuffer, visible: &[Rgb], tolerance: u8) -> PixelBuffer {
    use rayon::prelude::*;

    let mut out = vec![0u8; source.data().len()];
    out.par_chunks_exact_mut(4)
        .zip(source.data().par_chunks_exact(4))
        .for_each(|(dst, src)| {
            dst.copy_from_slice(&shade([src[0], src[1], src[2], src[3]], visible, tolerance));
        });
    source.same_size(out)
}

/// Overlay for the current selection, or `None` when there is nothing to draw.
///
/// No cached buffer or no selection yields `None`, as does a cumulative
/// selection reaching the last color (the plain rendering is already what it
/// would show).
pub fn overlay(
    source: Option<&PixelBuffer>,
    selection: Option<&HighlightMode>,
    colors: &[ColorEntry],
    tolerance: u8,
) -> Option<PixelBuffer> {
    let (source, mode) = (source?, selection?);
    if mode.covers_all(colors.len()) {
        tracing::debug!("selection covers every color, no overlay");
        return None;
    }
    let visible = mode.visible_set(colors);
    tracing::debug!(visible = visible.len(), tolerance, "composing highlight overlay");
    Some(compose(source, &visible, tolerance))
}
