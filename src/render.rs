//! Rasterization boundary.
//!
//! The analysis pipeline only needs "document text in, RGBA pixels out". In a
//! browser the canvas does this and hands the bytes over; natively the
//! `resvg` feature provides a renderer.

use crate::error::Result;
use crate::pixels::PixelBuffer;

/// Turns document text into a straight-alpha RGBA buffer of the requested size.
pub trait Rasterizer {
    fn rasterize(&self, doc: &str, width: u32, height: u32) -> Result<PixelBuffer>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn rasterize(&self, doc: &str, width: u32, height: u32) -> Result<PixelBuffer> {
        (**self).rasterize(doc, width, height)
    }
}

#[cfg(feature = "resvg")]
pub use self::resvg_backend::ResvgRasterizer;

#[cfg(feature = "resvg")]
mod resvg_backend {
    use std::sync::Arc;

    use resvg::tiny_skia::{Pixmap, Transform};
    use resvg::usvg;

    use super::Rasterizer;
    use crate::error::{Error, Result};
    use crate::pixels::PixelBuffer;

    /// Renders with `resvg`, stretching the document to fill the target size on
    /// a transparent background.
    pub struct ResvgRasterizer {
        fontdb: Arc<usvg::fontdb::Database>,
    }

    impl ResvgRasterizer {
        pub fn new() -> Self {
            let mut fontdb = usvg::fontdb::Database::new();
            fontdb.load_system_fonts();
            tracing::debug!(font_count = fontdb.len(), "loaded fonts for rasterization");
            Self {
                fontdb: Arc::new(fontdb),
            }
        }
    }

    impl Default for ResvgRasterizer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Rasterizer for ResvgRasterizer {
        fn rasterize(&self, doc: &str, width: u32, height: u32) -> Result<PixelBuffer> {
            let options = usvg::Options {
                fontdb: self.fontdb.clone(),
                ..Default::default()
            };
            let tree = usvg::Tree::from_str(doc, &options)
                .map_err(|e| Error::Render(format!("cannot parse document: {e}")))?;

            let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
                Error::Render(format!("cannot allocate a {width}x{height} pixmap"))
            })?;

            let size = tree.size();
            let transform = Transform::from_scale(
                width as f32 / size.width(),
                height as f32 / size.height(),
            );
            resvg::render(&tree, transform, &mut pixmap.as_mut());

            // tiny-skia stores premultiplied alpha.
            let mut data = Vec::with_capacity(width as usize * height as usize * 4);
            for px in pixmap.pixels() {
                let c = px.demultiply();
                data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
            }
            PixelBuffer::new(width, height, data)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::histogram;

        const HALF_RED: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
  <rect width="20" height="10" fill="#ff0000"/>
</svg>"##;

        #[test]
        fn solid_fill_renders_straight_alpha() {
            let buffer = ResvgRasterizer::new().rasterize(HALF_RED, 20, 20).unwrap();
            assert_eq!((buffer.width(), buffer.height()), (20, 20));
            let analysis = histogram::analyze(&buffer);
            let found: Vec<_> = analysis.entries.iter().map(|e| (e.hex(), e.count)).collect();
            assert_eq!(found, vec![("#ff0000".to_string(), 200)]);
            assert_eq!(&buffer.data()[..4], &[255, 0, 0, 255]);
            assert_eq!(&buffer.data()[buffer.data().len() - 4..], &[0, 0, 0, 0]);
        }

        #[test]
        fn malformed_markup_is_a_render_error() {
            let err = ResvgRasterizer::new().rasterize("<notsvg>", 4, 4).unwrap_err();
            assert!(matches!(err, Error::Render(_)));
        }

        #[test]
        fn zero_sized_target_is_a_render_error() {
            let err = ResvgRasterizer::new().rasterize(HALF_RED, 0, 4).unwrap_err();
            assert!(matches!(err, Error::Render(_)));
        }
    }
}
